//! Stack unit: the region of the bus addressed by SP.
//!
//! Push pre-decrements, pop post-increments, both wrapping at the ends of
//! the address space.

use super::registers::Registers;
use super::MemorySm83;

pub fn push8<M: MemorySm83>(regs: &mut Registers, mem: &mut M, val: u8) {
    regs.sp = regs.sp.wrapping_sub(1);
    mem.write8(regs.sp, val);
}

pub fn pop8<M: MemorySm83>(regs: &mut Registers, mem: &mut M) -> u8 {
    let val = mem.read8(regs.sp);
    regs.sp = regs.sp.wrapping_add(1);
    val
}

/// High byte goes in first so the low byte ends up at the lower address.
pub fn push16<M: MemorySm83>(regs: &mut Registers, mem: &mut M, val: u16) {
    let [hi, lo] = val.to_be_bytes();
    push8(regs, mem, hi);
    push8(regs, mem, lo);
}

pub fn pop16<M: MemorySm83>(regs: &mut Registers, mem: &mut M) -> u16 {
    let lo = pop8(regs, mem);
    let hi = pop8(regs, mem);
    u16::from_be_bytes([hi, lo])
}
