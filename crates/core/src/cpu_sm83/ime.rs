//! Interrupt master enable latch.
//!
//! EI takes effect only once the instruction after it has completed, so the
//! latch has a third, pending state between disabled and enabled.

use serde::{Deserialize, Serialize};

use crate::logging::{log, LogCategory, LogLevel};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Ime {
    #[default]
    Disabled,
    /// EI executed; becomes `Enabled` after the next instruction.
    Pending,
    Enabled,
}

impl Ime {
    pub fn from_flag(enabled: bool) -> Self {
        if enabled {
            Ime::Enabled
        } else {
            Ime::Disabled
        }
    }

    /// IME as written by software, including a pending EI.
    pub fn is_set(self) -> bool {
        self != Ime::Disabled
    }

    /// What an interrupt controller sees at this instruction boundary.
    pub fn is_enabled(self) -> bool {
        self == Ime::Enabled
    }

    /// Called after each instruction with the state it started in.
    pub(crate) fn settle(&mut self, before: Ime) {
        if before == Ime::Pending && *self == Ime::Pending {
            *self = Ime::Enabled;
            log(LogCategory::Interrupts, LogLevel::Debug, || {
                "IME: pending -> enabled".to_string()
            });
        }
    }
}

/// DI
pub(crate) fn di(ime: &mut Ime) {
    if *ime != Ime::Disabled {
        log(LogCategory::Interrupts, LogLevel::Debug, || {
            format!("IME: {:?} -> disabled", ime)
        });
    }
    *ime = Ime::Disabled;
}

/// EI
pub(crate) fn ei(ime: &mut Ime) {
    if *ime == Ime::Disabled {
        *ime = Ime::Pending;
        log(LogCategory::Interrupts, LogLevel::Debug, || {
            "IME: disabled -> pending".to_string()
        });
    }
}
