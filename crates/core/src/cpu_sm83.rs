//! Sharp SM83 CPU core (Game Boy CPU)
//!
//! An 8080/Z80-derived accumulator machine: seven 8-bit registers plus F,
//! pairable as AF/BC/DE/HL, a 16-bit SP and PC, and the IME latch. Every
//! opcode is decoded through two static 256-entry tables (base and `0xCB`
//! prefixed) into an [`Op`](dispatch::Op) with its operands bound, then run
//! through a small set of shared semantics functions so that register,
//! `[HL]` and immediate forms of an operation cannot drift apart.
//!
//! Timing is per instruction: `step()` returns T-cycles (4 per M-cycle).
//! Interrupt servicing and HALT/STOP low-power behaviour belong to the host.

pub mod dispatch;
pub mod ime;
pub mod operand;
pub mod registers;
pub mod stack;

mod alu;
mod bits;
mod control;
mod load;

#[cfg(test)]
mod tests;

use serde_json::{json, Value};

use crate::logging::{log, LogCategory, LogLevel};
use dispatch::{Entry, Op, ShiftOp};
pub use ime::Ime;
pub use registers::{Flag, Reg16, Reg8, Registers, FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

/// Memory interface trait for the SM83 CPU
///
/// Address decoding, mirroring and open-bus behaviour are the
/// implementation's business; the CPU never range-checks.
pub trait MemorySm83 {
    /// Read a byte from memory
    fn read8(&self, addr: u16) -> u8;

    /// Write a byte to memory
    fn write8(&mut self, addr: u16, val: u8);

    /// Little-endian word: low byte at `addr`, high byte at `addr + 1`.
    fn read16(&self, addr: u16) -> u16 {
        let lo = self.read8(addr);
        let hi = self.read8(addr.wrapping_add(1));
        u16::from_le_bytes([lo, hi])
    }

    fn write16(&mut self, addr: u16, val: u16) {
        let [lo, hi] = val.to_le_bytes();
        self.write8(addr, lo);
        self.write8(addr.wrapping_add(1), hi);
    }
}

/// Flat 64 KiB of RAM with no mapping.
#[derive(Clone)]
pub struct ArrayMemory {
    pub data: Box<[u8; 0x10000]>,
}

impl ArrayMemory {
    pub fn new() -> Self {
        Self {
            data: Box::new([0; 0x10000]),
        }
    }

    /// Copy `bytes` in at `addr`, wrapping past 0xFFFF.
    pub fn load(&mut self, addr: u16, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.data[addr.wrapping_add(i as u16) as usize] = b;
        }
    }
}

impl Default for ArrayMemory {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ArrayMemory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArrayMemory").finish_non_exhaustive()
    }
}

impl MemorySm83 for ArrayMemory {
    fn read8(&self, addr: u16) -> u8 {
        self.data[addr as usize]
    }

    fn write8(&mut self, addr: u16, val: u8) {
        self.data[addr as usize] = val;
    }
}

#[derive(thiserror::Error, Debug)]
pub enum Sm83Error {
    #[error("illegal opcode {opcode:#04X} at {pc:#06X}")]
    IllegalOpcode { opcode: u8, pc: u16 },
    #[error("invalid save state: {0}")]
    InvalidState(String),
    #[error("malformed save state: {0}")]
    StateJson(#[from] serde_json::Error),
}

/// Sharp SM83 CPU state
#[derive(Debug)]
pub struct CpuSm83<M: MemorySm83> {
    pub regs: Registers,
    /// Interrupt Master Enable latch
    pub ime: Ime,
    /// Total T-cycles executed
    pub cycles: u64,
    /// Total instructions executed
    pub instructions: u64,
    /// Memory interface
    pub memory: M,
}

impl<M: MemorySm83> CpuSm83<M> {
    /// Create a CPU with the DMG post-boot register profile
    pub fn new(memory: M) -> Self {
        Self::with_registers(memory, Registers::boot())
    }

    /// Create a CPU from an explicit register snapshot
    pub fn with_registers(memory: M, mut regs: Registers) -> Self {
        regs.f &= 0xF0;
        Self {
            regs,
            ime: Ime::Disabled,
            cycles: 0,
            instructions: 0,
            memory,
        }
    }

    /// Reinstall the boot profile; memory is left alone.
    pub fn reset(&mut self) {
        self.regs = Registers::boot();
        self.ime = Ime::Disabled;
        self.cycles = 0;
        self.instructions = 0;
    }

    /// IME register as last written (a pending EI counts as set).
    pub fn ime(&self) -> bool {
        self.ime.is_set()
    }

    /// Whether an interrupt could be taken at this instruction boundary.
    pub fn interrupts_enabled(&self) -> bool {
        self.ime.is_enabled()
    }

    /// Execute one instruction, returning the T-cycles it took.
    ///
    /// An unused opcode is an error; PC is rewound to it and nothing else
    /// has changed.
    pub fn step(&mut self) -> Result<u32, Sm83Error> {
        let start_pc = self.regs.pc;
        let ime_before = self.ime;

        let opcode = operand::fetch8(&mut self.regs, &mut self.memory);
        let entry = if opcode == 0xCB {
            let sub = operand::fetch8(&mut self.regs, &mut self.memory);
            dispatch::lookup_cb(sub)
        } else {
            match dispatch::lookup(opcode) {
                Some(entry) => entry,
                None => {
                    self.regs.pc = start_pc;
                    log(LogCategory::Dispatch, LogLevel::Error, || {
                        format!("SM83: illegal opcode {:02X} at {:04X}", opcode, start_pc)
                    });
                    return Err(Sm83Error::IllegalOpcode {
                        opcode,
                        pc: start_pc,
                    });
                }
            }
        };

        log(LogCategory::Cpu, LogLevel::Trace, || {
            let len = self.regs.pc.wrapping_sub(start_pc) + entry.op.operand_len();
            let bytes: Vec<String> = (0..len)
                .map(|i| format!("{:02X}", self.memory.read8(start_pc.wrapping_add(i))))
                .collect();
            format!(
                "{:04X}: {:<8} {:<14} A={:02X} F={:02X} BC={:04X} DE={:04X} HL={:04X} SP={:04X}",
                start_pc,
                bytes.join(" "),
                entry.op.to_string(),
                self.regs.a,
                self.regs.f,
                self.regs.bc(),
                self.regs.de(),
                self.regs.hl(),
                self.regs.sp
            )
        });

        let m_cycles = self.execute(entry);
        self.ime.settle(ime_before);

        let t_cycles = m_cycles * 4;
        self.cycles += t_cycles as u64;
        self.instructions += 1;
        Ok(t_cycles)
    }

    /// Run the semantics bound in `entry`; returns M-cycles.
    fn execute(&mut self, entry: &Entry) -> u32 {
        let regs = &mut self.regs;
        let mem = &mut self.memory;

        match entry.op {
            Op::Jp(cond) => return entry.m_cycles(control::jp(regs, mem, cond)),
            Op::Jr(cond) => return entry.m_cycles(control::jr(regs, mem, cond)),
            Op::Call(cond) => return entry.m_cycles(control::call(regs, mem, cond)),
            Op::Ret(cond) => return entry.m_cycles(control::ret(regs, mem, cond)),

            Op::Nop => {}
            Op::Halt => {
                log(LogCategory::Stubs, LogLevel::Debug, || {
                    format!("SM83: HALT at {:04X} executed as NOP", regs.pc.wrapping_sub(1))
                });
            }
            Op::Stop => {
                // Second byte is padding
                operand::fetch8(regs, mem);
                log(LogCategory::Stubs, LogLevel::Debug, || {
                    format!("SM83: STOP at {:04X} executed as NOP", regs.pc.wrapping_sub(2))
                });
            }
            Op::Di => ime::di(&mut self.ime),
            Op::Ei => ime::ei(&mut self.ime),

            Op::Ld8 { dst, src } => load::ld8(regs, mem, dst, src),
            Op::LdIndA(ind) => load::ld_ind_a(regs, mem, ind),
            Op::LdAInd(ind) => load::ld_a_ind(regs, mem, ind),
            Op::Ld16Imm(reg) => load::ld16_imm(regs, mem, reg),
            Op::LdAbsSp => load::ld_abs_sp(regs, mem),
            Op::LdAbsA => load::ld_abs_a(regs, mem),
            Op::LdAAbs => load::ld_a_abs(regs, mem),
            Op::LdhImmA => load::ldh_imm_a(regs, mem),
            Op::LdhAImm => load::ldh_a_imm(regs, mem),
            Op::LdhCA => load::ldh_c_a(regs, mem),
            Op::LdhAC => load::ldh_a_c(regs, mem),
            Op::LdSpHl => load::ld_sp_hl(regs),
            Op::LdHlSpE8 => load::ld_hl_sp_e8(regs, mem),
            Op::Push(reg) => load::push(regs, mem, reg),
            Op::Pop(reg) => load::pop(regs, mem, reg),

            Op::Alu(op, src) => alu::alu8(regs, mem, op, src),
            Op::Inc8(loc) => alu::inc8(regs, mem, loc),
            Op::Dec8(loc) => alu::dec8(regs, mem, loc),
            Op::Inc16(reg) => alu::inc16(regs, reg),
            Op::Dec16(reg) => alu::dec16(regs, reg),
            Op::AddHl(reg) => alu::add_hl(regs, reg),
            Op::AddSpE8 => alu::add_sp_e8(regs, mem),
            Op::Daa => alu::daa(regs),
            Op::Cpl => alu::cpl(regs),
            Op::Scf => alu::scf(regs),
            Op::Ccf => alu::ccf(regs),

            Op::Rlca => bits::rotate_a(regs, ShiftOp::Rlc),
            Op::Rrca => bits::rotate_a(regs, ShiftOp::Rrc),
            Op::Rla => bits::rotate_a(regs, ShiftOp::Rl),
            Op::Rra => bits::rotate_a(regs, ShiftOp::Rr),

            Op::JpHl => control::jp_hl(regs),
            Op::Reti => control::reti(regs, mem, &mut self.ime),
            Op::Rst(vector) => control::rst(regs, mem, vector),

            Op::Shift(op, loc) => bits::shift_loc(regs, mem, op, loc),
            Op::Bit(n, loc) => bits::bit(regs, mem, n, loc),
            Op::Res(n, loc) => bits::res(regs, mem, n, loc),
            Op::Set(n, loc) => bits::set(regs, mem, n, loc),
        }

        entry.m_cycles(false)
    }

    /// Decode the instruction at `addr` without executing it.
    ///
    /// Returns the mnemonic and total length in bytes (prefix included), or
    /// `None` for an unused opcode.
    pub fn disassemble(&self, addr: u16) -> Option<(String, u16)> {
        disassemble(&self.memory, addr)
    }

    /// JSON snapshot of registers, IME and counters (memory excluded).
    pub fn save_state(&self) -> Value {
        json!({
            "cpu": "sm83",
            "version": 1,
            "registers": self.regs,
            "ime": self.ime,
            "cycles": self.cycles,
            "instructions": self.instructions,
        })
    }

    pub fn load_state(&mut self, v: &Value) -> Result<(), Sm83Error> {
        match v.get("cpu").and_then(Value::as_str) {
            Some("sm83") => {}
            other => {
                return Err(Sm83Error::InvalidState(format!(
                    "expected an sm83 state, found {:?}",
                    other
                )))
            }
        }

        let registers = v
            .get("registers")
            .ok_or_else(|| Sm83Error::InvalidState("missing registers".to_string()))?;
        let mut regs: Registers = serde_json::from_value(registers.clone())?;
        regs.f &= 0xF0;

        let ime = match v.get("ime") {
            Some(ime) => serde_json::from_value(ime.clone())?,
            None => Ime::Disabled,
        };

        let cycles = state_counter(v, "cycles")?;
        let instructions = state_counter(v, "instructions")?;

        self.regs = regs;
        self.ime = ime;
        self.cycles = cycles;
        self.instructions = instructions;
        Ok(())
    }
}

/// Absent counters restore as 0; anything but an unsigned integer is rejected.
fn state_counter(v: &Value, field: &str) -> Result<u64, Sm83Error> {
    match v.get(field) {
        None => Ok(0),
        Some(n) => n.as_u64().ok_or_else(|| {
            Sm83Error::InvalidState(format!(
                "{} must be an unsigned integer, found {}",
                field, n
            ))
        }),
    }
}

/// Decode the instruction at `addr` in `memory`; see [`CpuSm83::disassemble`].
pub fn disassemble<M: MemorySm83>(memory: &M, addr: u16) -> Option<(String, u16)> {
    let opcode = memory.read8(addr);
    let (entry, opcode_len) = if opcode == 0xCB {
        (dispatch::lookup_cb(memory.read8(addr.wrapping_add(1))), 2)
    } else {
        (dispatch::lookup(opcode)?, 1)
    };
    Some((entry.op.to_string(), opcode_len + entry.op.operand_len()))
}

impl<M: MemorySm83> crate::Cpu for CpuSm83<M> {
    type Error = Sm83Error;

    fn reset(&mut self) {
        self.reset();
    }

    fn step(&mut self) -> Result<u32, Sm83Error> {
        self.step()
    }
}
