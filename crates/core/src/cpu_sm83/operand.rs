//! Operand selectors bound into the dispatch tables, and the helpers that
//! resolve them against the register file and bus.

use std::fmt;

use super::registers::{Flag, Reg16, Reg8, Registers};
use super::MemorySm83;

/// A readable and writable 8-bit location.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loc {
    Reg(Reg8),
    /// Byte at the address in HL
    IndHL,
}

/// An 8-bit source: a location or the immediate byte after the opcode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Src {
    Loc(Loc),
    Imm,
}

/// Pair-addressed accumulator transfer (`LD [BC],A`, `LD A,[HL+]`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Indirect {
    BC,
    DE,
    /// HL, incremented after the access
    HLI,
    /// HL, decremented after the access
    HLD,
}

/// Branch condition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cond {
    NZ,
    Z,
    NC,
    C,
}

impl Cond {
    pub fn holds(self, regs: &Registers) -> bool {
        match self {
            Cond::NZ => !regs.get_flag(Flag::Z),
            Cond::Z => regs.get_flag(Flag::Z),
            Cond::NC => !regs.get_flag(Flag::C),
            Cond::C => regs.get_flag(Flag::C),
        }
    }
}

/// Unconditional forms pass `None`.
pub(crate) fn condition_holds(cond: Option<Cond>, regs: &Registers) -> bool {
    cond.map_or(true, |c| c.holds(regs))
}

pub(crate) fn fetch8<M: MemorySm83>(regs: &mut Registers, mem: &mut M) -> u8 {
    let val = mem.read8(regs.pc);
    regs.pc = regs.pc.wrapping_add(1);
    val
}

pub(crate) fn fetch16<M: MemorySm83>(regs: &mut Registers, mem: &mut M) -> u16 {
    let lo = fetch8(regs, mem);
    let hi = fetch8(regs, mem);
    u16::from_le_bytes([lo, hi])
}

pub(crate) fn read_loc<M: MemorySm83>(regs: &Registers, mem: &M, loc: Loc) -> u8 {
    match loc {
        Loc::Reg(r) => regs.get8(r),
        Loc::IndHL => mem.read8(regs.hl()),
    }
}

pub(crate) fn write_loc<M: MemorySm83>(regs: &mut Registers, mem: &mut M, loc: Loc, val: u8) {
    match loc {
        Loc::Reg(r) => regs.set8(r, val),
        Loc::IndHL => mem.write8(regs.hl(), val),
    }
}

pub(crate) fn read_src<M: MemorySm83>(regs: &mut Registers, mem: &mut M, src: Src) -> u8 {
    match src {
        Src::Loc(loc) => read_loc(regs, mem, loc),
        Src::Imm => fetch8(regs, mem),
    }
}

/// Resolve the address and apply the HL post-increment/decrement.
pub(crate) fn indirect_addr(regs: &mut Registers, ind: Indirect) -> u16 {
    match ind {
        Indirect::BC => regs.bc(),
        Indirect::DE => regs.de(),
        Indirect::HLI => {
            let addr = regs.hl();
            regs.set_hl(addr.wrapping_add(1));
            addr
        }
        Indirect::HLD => {
            let addr = regs.hl();
            regs.set_hl(addr.wrapping_sub(1));
            addr
        }
    }
}

impl fmt::Display for Reg8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg8::A => "A",
            Reg8::F => "F",
            Reg8::B => "B",
            Reg8::C => "C",
            Reg8::D => "D",
            Reg8::E => "E",
            Reg8::H => "H",
            Reg8::L => "L",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Reg16 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Reg16::AF => "AF",
            Reg16::BC => "BC",
            Reg16::DE => "DE",
            Reg16::HL => "HL",
            Reg16::SP => "SP",
            Reg16::PC => "PC",
        };
        f.write_str(name)
    }
}

impl fmt::Display for Loc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Loc::Reg(r) => write!(f, "{}", r),
            Loc::IndHL => f.write_str("[HL]"),
        }
    }
}

impl fmt::Display for Src {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Src::Loc(loc) => write!(f, "{}", loc),
            Src::Imm => f.write_str("n8"),
        }
    }
}

impl fmt::Display for Indirect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Indirect::BC => "[BC]",
            Indirect::DE => "[DE]",
            Indirect::HLI => "[HL+]",
            Indirect::HLD => "[HL-]",
        };
        f.write_str(text)
    }
}

impl fmt::Display for Cond {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Cond::NZ => "NZ",
            Cond::Z => "Z",
            Cond::NC => "NC",
            Cond::C => "C",
        };
        f.write_str(text)
    }
}
