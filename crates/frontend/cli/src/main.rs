use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sm83_core::cpu_sm83::{ArrayMemory, CpuSm83};
use sm83_core::fixture;
use sm83_core::logging::{LogCategory, LogConfig, LogLevel};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sm83", about = "Sharp SM83 instruction engine host")]
struct Args {
    /// Global engine log level: off, error, warn, info, debug, trace
    #[arg(long, global = true, value_parser = parse_level)]
    log_level: Option<LogLevel>,

    /// Level for the per-instruction CPU category (trace prints every step,
    /// subject to --log-rate-limit)
    #[arg(long, global = true, value_parser = parse_level)]
    log_cpu: Option<LogLevel>,

    /// Messages per category per second; 0 disables the cap [default: 200]
    #[arg(long, global = true)]
    log_rate_limit: Option<usize>,

    /// Send engine logs to this file instead of stderr
    #[arg(long, global = true)]
    log_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run single-step JSON fixtures (one file, or every *.json in a directory)
    Fixtures {
        path: PathBuf,

        /// Print at most this many failures per file
        #[arg(long, default_value_t = 5)]
        max_failures: usize,
    },
    /// Load a raw program image and execute it from the boot profile
    Run {
        binary: PathBuf,

        /// Load address (decimal or 0x-prefixed hex)
        #[arg(long, default_value = "0x0100", value_parser = parse_u16)]
        origin: u16,

        /// Number of instructions to execute
        #[arg(long, default_value_t = 1000)]
        steps: u64,

        /// Dump save-state to this file as JSON
        #[arg(long, default_value = "state.json")]
        save: PathBuf,
    },
}

fn parse_level(s: &str) -> Result<LogLevel, String> {
    LogLevel::from_str(s).ok_or_else(|| format!("unknown log level '{}'", s))
}

fn parse_u16(s: &str) -> Result<u16, String> {
    let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u16::from_str_radix(hex, 16),
        None => s.parse::<u16>(),
    };
    parsed.map_err(|e| format!("invalid address '{}': {}", s, e))
}

fn configure_logging(args: &Args) -> Result<()> {
    let config = LogConfig::global();
    if let Some(level) = args.log_level {
        config.set_global_level(level);
    }
    if let Some(level) = args.log_cpu {
        config.set_level(LogCategory::Cpu, level);
    }
    if let Some(limit) = args.log_rate_limit {
        config.set_rate_limit(limit);
    }
    if let Some(path) = &args.log_file {
        config
            .set_log_file(path.clone())
            .with_context(|| format!("opening log file {}", path.display()))?;
    }
    Ok(())
}

fn run_fixtures(path: &Path, max_failures: usize) -> Result<bool> {
    let files = if path.is_dir() {
        fixture::fixture_files(path)?
    } else {
        vec![path.to_path_buf()]
    };
    if files.is_empty() {
        anyhow::bail!("no fixture files found in {}", path.display());
    }

    let mut total = 0;
    let mut failed = 0;
    let mut failed_files = 0;

    for file in &files {
        let report = fixture::run_file(file)?;
        total += report.total;
        failed += report.failures.len();

        if report.failures.is_empty() {
            log::info!("{}: {} passed", file.display(), report.total);
            continue;
        }

        failed_files += 1;
        println!(
            "{}: {} of {} failed",
            file.display(),
            report.failures.len(),
            report.total
        );
        for err in report.failures.iter().take(max_failures) {
            println!("  {}", err);
        }
    }

    println!(
        "SM83 fixtures: {} passed, {} failed across {} files ({} with failures)",
        total - failed,
        failed,
        files.len(),
        failed_files
    );
    Ok(failed == 0)
}

fn run_binary(binary: &Path, origin: u16, steps: u64, save: &Path) -> Result<()> {
    let image =
        std::fs::read(binary).with_context(|| format!("reading {}", binary.display()))?;
    if image.len() > 0x10000 {
        log::warn!(
            "{} is {} bytes; only 64 KiB fits, the rest wraps",
            binary.display(),
            image.len()
        );
    }

    let mut memory = ArrayMemory::new();
    memory.load(origin, &image);
    let mut cpu = CpuSm83::new(memory);

    for _ in 0..steps {
        if let Err(e) = cpu.step() {
            log::error!("stopped after {} instructions: {}", cpu.instructions, e);
            break;
        }
    }

    let r = &cpu.regs;
    println!(
        "A={:02X} F={:02X} B={:02X} C={:02X} D={:02X} E={:02X} H={:02X} L={:02X} SP={:04X} PC={:04X} IME={}",
        r.a,
        r.f,
        r.b,
        r.c,
        r.d,
        r.e,
        r.h,
        r.l,
        r.sp,
        r.pc,
        cpu.ime() as u8
    );
    println!(
        "{} instructions, {} T-cycles",
        cpu.instructions, cpu.cycles
    );

    let state = cpu.save_state();
    let mut f =
        File::create(save).with_context(|| format!("creating {}", save.display()))?;
    write!(f, "{}", serde_json::to_string_pretty(&state)?)?;
    Ok(())
}

/// Returns whether the command succeeded.
fn run(args: &Args) -> Result<bool> {
    match &args.command {
        Command::Fixtures { path, max_failures } => run_fixtures(path, *max_failures),
        Command::Run {
            binary,
            origin,
            steps,
            save,
        } => run_binary(binary, *origin, *steps, save).map(|()| true),
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();
    configure_logging(&args)?;

    let outcome = run(&args);
    // Flush the log file and any pending drop notices before exiting
    LogConfig::global().clear_log_file();

    if !outcome? {
        std::process::exit(1);
    }
    Ok(())
}
