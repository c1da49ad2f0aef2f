//! Rotates, shifts and single-bit instructions.

use super::dispatch::ShiftOp;
use super::operand::{self, Loc};
use super::registers::{Flag, Registers};
use super::MemorySm83;

/// Shared rotate/shift primitive: returns (result, bit shifted out).
fn shift(op: ShiftOp, val: u8, carry_in: bool) -> (u8, bool) {
    let msb = val & 0x80 != 0;
    let lsb = val & 0x01 != 0;
    match op {
        ShiftOp::Rlc => (val.rotate_left(1), msb),
        ShiftOp::Rrc => (val.rotate_right(1), lsb),
        ShiftOp::Rl => ((val << 1) | carry_in as u8, msb),
        ShiftOp::Rr => ((val >> 1) | ((carry_in as u8) << 7), lsb),
        ShiftOp::Sla => (val << 1, msb),
        ShiftOp::Sra => ((val >> 1) | (val & 0x80), lsb),
        ShiftOp::Swap => (val.rotate_left(4), false),
        ShiftOp::Srl => (val >> 1, lsb),
    }
}

/// `RLCA`/`RRCA`/`RLA`/`RRA`: Z is always cleared, whatever the result.
pub(crate) fn rotate_a(regs: &mut Registers, op: ShiftOp) {
    let (result, carry) = shift(op, regs.a, regs.get_flag(Flag::C));
    regs.a = result;
    regs.set_znhc(false, false, false, carry);
}

/// CB `RLC`..`SRL` on a register or `[HL]`.
pub(crate) fn shift_loc<M: MemorySm83>(regs: &mut Registers, mem: &mut M, op: ShiftOp, loc: Loc) {
    let val = operand::read_loc(regs, mem, loc);
    let (result, carry) = shift(op, val, regs.get_flag(Flag::C));
    regs.set_znhc(result == 0, false, false, carry);
    operand::write_loc(regs, mem, loc, result);
}

/// `BIT n,loc`; carry untouched, operand unchanged.
pub(crate) fn bit<M: MemorySm83>(regs: &mut Registers, mem: &mut M, n: u8, loc: Loc) {
    let val = operand::read_loc(regs, mem, loc);
    regs.set_flag(Flag::Z, val & (1 << n) == 0);
    regs.set_flag(Flag::N, false);
    regs.set_flag(Flag::H, true);
}

pub(crate) fn res<M: MemorySm83>(regs: &mut Registers, mem: &mut M, n: u8, loc: Loc) {
    let val = operand::read_loc(regs, mem, loc);
    operand::write_loc(regs, mem, loc, val & !(1 << n));
}

pub(crate) fn set<M: MemorySm83>(regs: &mut Registers, mem: &mut M, n: u8, loc: Loc) {
    let val = operand::read_loc(regs, mem, loc);
    operand::write_loc(regs, mem, loc, val | (1 << n));
}
