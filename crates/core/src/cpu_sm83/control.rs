//! Jumps, calls, returns and restarts.
//!
//! Conditional forms always consume their operand bytes and return whether
//! the branch was taken so the step engine can charge the longer timing.

use super::ime::Ime;
use super::operand::{self, Cond};
use super::registers::Registers;
use super::stack;
use super::MemorySm83;

pub(crate) fn jp<M: MemorySm83>(regs: &mut Registers, mem: &mut M, cond: Option<Cond>) -> bool {
    let target = operand::fetch16(regs, mem);
    let taken = operand::condition_holds(cond, regs);
    if taken {
        regs.pc = target;
    }
    taken
}

pub(crate) fn jp_hl(regs: &mut Registers) {
    regs.pc = regs.hl();
}

/// Displacement is relative to the address after the operand byte.
pub(crate) fn jr<M: MemorySm83>(regs: &mut Registers, mem: &mut M, cond: Option<Cond>) -> bool {
    let offset = operand::fetch8(regs, mem) as i8;
    let taken = operand::condition_holds(cond, regs);
    if taken {
        regs.pc = regs.pc.wrapping_add_signed(offset as i16);
    }
    taken
}

pub(crate) fn call<M: MemorySm83>(regs: &mut Registers, mem: &mut M, cond: Option<Cond>) -> bool {
    let target = operand::fetch16(regs, mem);
    let taken = operand::condition_holds(cond, regs);
    if taken {
        let ret = regs.pc;
        stack::push16(regs, mem, ret);
        regs.pc = target;
    }
    taken
}

pub(crate) fn ret<M: MemorySm83>(regs: &mut Registers, mem: &mut M, cond: Option<Cond>) -> bool {
    let taken = operand::condition_holds(cond, regs);
    if taken {
        regs.pc = stack::pop16(regs, mem);
    }
    taken
}

/// `RETI` enables interrupts without the EI delay.
pub(crate) fn reti<M: MemorySm83>(regs: &mut Registers, mem: &mut M, ime: &mut Ime) {
    regs.pc = stack::pop16(regs, mem);
    *ime = Ime::Enabled;
}

pub(crate) fn rst<M: MemorySm83>(regs: &mut Registers, mem: &mut M, vector: u8) {
    let ret = regs.pc;
    stack::push16(regs, mem, ret);
    regs.pc = vector as u16;
}
