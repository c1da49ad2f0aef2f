//! Centralized logging for the SM83 engine.
//!
//! Instruction tracing is far too hot to go through a formatting macro
//! unconditionally, so every call site hands [`log`] a closure that is only
//! evaluated when its category and level are enabled.
//!
//! - **LogLevel**: Off < Error < Warn < Info < Debug < Trace
//! - **LogCategory**: Cpu (instruction trace), Dispatch (decode failures),
//!   Interrupts (IME latch), Stubs (behaviour this core does not model)
//! - **LogConfig**: process-wide levels, rate limit and optional file sink
//!
//! Each category is capped at 200 messages per second by default; a limit of
//! 0 disables the cap. Suppressed messages are counted and reported when the
//! next window opens or when [`LogConfig::clear_log_file`] closes the sink.
//!
//! ```rust
//! use sm83_core::logging::{log, LogCategory, LogLevel};
//!
//! log(LogCategory::Cpu, LogLevel::Trace, || {
//!     format!("{:04X}: NOP", 0x0100)
//! });
//! ```

use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU8, AtomicUsize, Ordering};
use std::sync::mpsc::{channel, Sender};
use std::sync::{Mutex, OnceLock};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Log level for controlling verbosity
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u8)]
pub enum LogLevel {
    Off = 0,
    Error = 1,
    Warn = 2,
    Info = 3,
    Debug = 4,
    Trace = 5,
}

impl LogLevel {
    /// Parse a level name or digit (case-insensitive)
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "off" | "0" => Some(LogLevel::Off),
            "error" | "err" | "1" => Some(LogLevel::Error),
            "warn" | "warning" | "2" => Some(LogLevel::Warn),
            "info" | "3" => Some(LogLevel::Info),
            "debug" | "4" => Some(LogLevel::Debug),
            "trace" | "5" => Some(LogLevel::Trace),
            _ => None,
        }
    }

    fn from_u8(val: u8) -> Self {
        match val {
            1 => LogLevel::Error,
            2 => LogLevel::Warn,
            3 => LogLevel::Info,
            4 => LogLevel::Debug,
            5 => LogLevel::Trace,
            _ => LogLevel::Off,
        }
    }
}

/// Log category for the parts of the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogCategory {
    /// Executed instructions
    Cpu,
    /// Opcode decoding
    Dispatch,
    /// IME latch transitions
    Interrupts,
    /// Instructions whose hardware side effects are not modelled
    Stubs,
}

const CATEGORY_COUNT: usize = 4;

impl LogCategory {
    const ALL: [LogCategory; CATEGORY_COUNT] = [
        LogCategory::Cpu,
        LogCategory::Dispatch,
        LogCategory::Interrupts,
        LogCategory::Stubs,
    ];

    fn index(self) -> usize {
        match self {
            LogCategory::Cpu => 0,
            LogCategory::Dispatch => 1,
            LogCategory::Interrupts => 2,
            LogCategory::Stubs => 3,
        }
    }
}

/// One-second window of emitted and suppressed messages for a category.
#[derive(Debug, Clone, Copy)]
struct Window {
    started: Option<Instant>,
    emitted: usize,
    dropped: usize,
}

/// Fixed-window limiter; a new window reports how many messages the
/// previous one swallowed.
struct RateLimiter {
    /// 0 means unlimited
    max_per_window: AtomicUsize,
    window: Duration,
    windows: Mutex<[Window; CATEGORY_COUNT]>,
}

impl RateLimiter {
    fn new(max_per_window: usize) -> Self {
        Self {
            max_per_window: AtomicUsize::new(max_per_window),
            window: Duration::from_secs(1),
            windows: Mutex::new(
                [Window {
                    started: None,
                    emitted: 0,
                    dropped: 0,
                }; CATEGORY_COUNT],
            ),
        }
    }

    fn windows(&self) -> std::sync::MutexGuard<'_, [Window; CATEGORY_COUNT]> {
        match self.windows.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Returns (allowed, dropped messages to report).
    fn admit(&self, category: LogCategory) -> (bool, Option<usize>) {
        let now = Instant::now();
        let max = self.max_per_window.load(Ordering::Relaxed);
        let mut windows = self.windows();
        let w = &mut windows[category.index()];

        let mut report = None;
        let expired = w
            .started
            .map_or(true, |start| now.duration_since(start) >= self.window);
        if expired {
            if w.dropped > 0 {
                report = Some(w.dropped);
            }
            *w = Window {
                started: Some(now),
                emitted: 0,
                dropped: 0,
            };
        }

        if max == 0 || w.emitted < max {
            w.emitted += 1;
            (true, report)
        } else {
            w.dropped += 1;
            (false, report)
        }
    }

    /// Drop counts not yet reported, zeroed as they are taken.
    fn take_dropped(&self) -> Vec<(LogCategory, usize)> {
        let mut windows = self.windows();
        LogCategory::ALL
            .into_iter()
            .filter_map(|category| {
                let w = &mut windows[category.index()];
                let dropped = std::mem::take(&mut w.dropped);
                (dropped > 0).then_some((category, dropped))
            })
            .collect()
    }
}

fn dropped_notice(category: LogCategory, count: usize) -> String {
    format!(
        "[{:?}] rate limit exceeded, {} message(s) dropped",
        category, count
    )
}

struct FileSink {
    sender: Sender<String>,
    writer: JoinHandle<()>,
}

impl FileSink {
    /// Hang up and wait for the writer to drain the channel.
    fn close(self) {
        drop(self.sender);
        if self.writer.join().is_err() {
            eprintln!("log writer thread panicked");
        }
    }
}

/// Global logging configuration
pub struct LogConfig {
    global_level: AtomicU8,
    category_levels: [AtomicU8; CATEGORY_COUNT],
    sink: Mutex<Option<FileSink>>,
    file_enabled: AtomicBool,
    limiter: RateLimiter,
}

impl LogConfig {
    /// Everything off; 200 messages per category per second.
    fn new() -> Self {
        Self {
            global_level: AtomicU8::new(LogLevel::Off as u8),
            category_levels: [
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
                AtomicU8::new(LogLevel::Off as u8),
            ],
            sink: Mutex::new(None),
            file_enabled: AtomicBool::new(false),
            limiter: RateLimiter::new(200),
        }
    }

    /// Process-wide instance
    pub fn global() -> &'static Self {
        static INSTANCE: OnceLock<LogConfig> = OnceLock::new();
        INSTANCE.get_or_init(LogConfig::new)
    }

    pub fn set_global_level(&self, level: LogLevel) {
        self.global_level.store(level as u8, Ordering::Relaxed);
    }

    pub fn global_level(&self) -> LogLevel {
        LogLevel::from_u8(self.global_level.load(Ordering::Relaxed))
    }

    pub fn set_level(&self, category: LogCategory, level: LogLevel) {
        self.category_levels[category.index()].store(level as u8, Ordering::Relaxed);
    }

    pub fn level(&self, category: LogCategory) -> LogLevel {
        LogLevel::from_u8(self.category_levels[category.index()].load(Ordering::Relaxed))
    }

    /// A category level other than Off overrides the global level.
    pub fn should_log(&self, category: LogCategory, level: LogLevel) -> bool {
        let category_level = self.level(category);
        let effective = if category_level != LogLevel::Off {
            category_level
        } else {
            self.global_level()
        };
        level != LogLevel::Off && level <= effective
    }

    /// Turn everything back off
    pub fn reset(&self) {
        self.set_global_level(LogLevel::Off);
        for category in LogCategory::ALL {
            self.set_level(category, LogLevel::Off);
        }
    }

    /// Messages per category per second; 0 removes the cap.
    pub fn set_rate_limit(&self, max_per_second: usize) {
        self.limiter
            .max_per_window
            .store(max_per_second, Ordering::Relaxed);
    }

    pub fn rate_limit(&self) -> usize {
        self.limiter.max_per_window.load(Ordering::Relaxed)
    }

    /// Append messages to `path` from a background writer thread.
    pub fn set_log_file(&self, path: PathBuf) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        let (sender, receiver) = channel::<String>();

        let writer = thread::Builder::new()
            .name("sm83-log-writer".to_string())
            .spawn(move || {
                while let Ok(message) = receiver.recv() {
                    let _ = writeln!(file, "{}", message);
                }
                let _ = file.flush();
            })?;

        let previous = match self.sink.lock() {
            Ok(mut sink) => sink.replace(FileSink { sender, writer }),
            Err(_) => None,
        };
        self.file_enabled.store(true, Ordering::Relaxed);
        if let Some(previous) = previous {
            previous.close();
        }
        Ok(())
    }

    /// Report outstanding drop counts, then close the log file once every
    /// queued message is written. Output returns to stderr.
    pub fn clear_log_file(&self) {
        self.report_dropped();

        let sink = match self.sink.lock() {
            Ok(mut sink) => sink.take(),
            Err(_) => None,
        };
        self.file_enabled.store(false, Ordering::Relaxed);
        if let Some(sink) = sink {
            sink.close();
        }
    }

    /// Write a notice for every category that suppressed messages since its
    /// last report.
    pub fn report_dropped(&self) {
        for (category, count) in self.limiter.take_dropped() {
            self.write_message(dropped_notice(category, count));
        }
    }

    /// Log through this configuration; see [`log`].
    pub fn log<F>(&self, category: LogCategory, level: LogLevel, message_fn: F)
    where
        F: FnOnce() -> String,
    {
        if !self.should_log(category, level) {
            return;
        }

        let (allowed, dropped) = self.limiter.admit(category);
        if let Some(count) = dropped {
            self.write_message(dropped_notice(category, count));
        }
        if allowed {
            self.write_message(message_fn());
        }
    }

    fn write_message(&self, message: String) {
        if self.file_enabled.load(Ordering::Relaxed) {
            if let Ok(sink) = self.sink.lock() {
                if let Some(sink) = sink.as_ref() {
                    if let Err(failed) = sink.sender.send(message) {
                        eprintln!("{}", failed.0);
                    }
                    return;
                }
            }
        }
        eprintln!("{}", message);
    }
}

/// Log a lazily-built message under `category` at `level`.
///
/// The closure never runs when the category is filtered out or the rate
/// limit for the current second is exhausted.
pub fn log<F>(category: LogCategory, level: LogLevel, message_fn: F)
where
    F: FnOnce() -> String,
{
    LogConfig::global().log(category, level, message_fn);
}
