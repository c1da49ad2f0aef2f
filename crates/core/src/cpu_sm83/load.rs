//! Load and stack-transfer instructions. None of these touch flags except
//! `LD HL,SP+e8`.

use super::alu;
use super::operand::{self, Indirect, Loc, Src};
use super::registers::{Reg16, Registers};
use super::stack;
use super::MemorySm83;

/// Base of the high page used by the `LDH` forms.
const HIGH_PAGE: u16 = 0xFF00;

pub(crate) fn ld8<M: MemorySm83>(regs: &mut Registers, mem: &mut M, dst: Loc, src: Src) {
    let val = operand::read_src(regs, mem, src);
    operand::write_loc(regs, mem, dst, val);
}

/// `LD [BC]/[DE]/[HL+]/[HL-],A`
pub(crate) fn ld_ind_a<M: MemorySm83>(regs: &mut Registers, mem: &mut M, ind: Indirect) {
    let addr = operand::indirect_addr(regs, ind);
    mem.write8(addr, regs.a);
}

/// `LD A,[BC]/[DE]/[HL+]/[HL-]`
pub(crate) fn ld_a_ind<M: MemorySm83>(regs: &mut Registers, mem: &mut M, ind: Indirect) {
    let addr = operand::indirect_addr(regs, ind);
    regs.a = mem.read8(addr);
}

pub(crate) fn ld16_imm<M: MemorySm83>(regs: &mut Registers, mem: &mut M, reg: Reg16) {
    let val = operand::fetch16(regs, mem);
    regs.set16(reg, val);
}

/// `LD [n16],SP`
pub(crate) fn ld_abs_sp<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    let addr = operand::fetch16(regs, mem);
    mem.write16(addr, regs.sp);
}

pub(crate) fn ld_abs_a<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    let addr = operand::fetch16(regs, mem);
    mem.write8(addr, regs.a);
}

pub(crate) fn ld_a_abs<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    let addr = operand::fetch16(regs, mem);
    regs.a = mem.read8(addr);
}

pub(crate) fn ldh_imm_a<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    let offset = operand::fetch8(regs, mem);
    mem.write8(HIGH_PAGE | offset as u16, regs.a);
}

pub(crate) fn ldh_a_imm<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    let offset = operand::fetch8(regs, mem);
    regs.a = mem.read8(HIGH_PAGE | offset as u16);
}

pub(crate) fn ldh_c_a<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    mem.write8(HIGH_PAGE | regs.c as u16, regs.a);
}

pub(crate) fn ldh_a_c<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    regs.a = mem.read8(HIGH_PAGE | regs.c as u16);
}

pub(crate) fn ld_sp_hl(regs: &mut Registers) {
    regs.sp = regs.hl();
}

/// `LD HL,SP+e8`, flags as `ADD SP,e8`.
pub(crate) fn ld_hl_sp_e8<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    let offset = operand::fetch8(regs, mem);
    let result = alu::sp_plus_e8(regs, offset);
    regs.set_hl(result);
}

pub(crate) fn push<M: MemorySm83>(regs: &mut Registers, mem: &mut M, reg: Reg16) {
    let val = regs.get16(reg);
    stack::push16(regs, mem, val);
}

/// `POP AF` drops the low nibble of F through `set16`.
pub(crate) fn pop<M: MemorySm83>(regs: &mut Registers, mem: &mut M, reg: Reg16) {
    let val = stack::pop16(regs, mem);
    regs.set16(reg, val);
}
