//! Arithmetic and logic instructions.

use super::dispatch::AluOp;
use super::operand::{self, Loc, Src};
use super::registers::{Flag, Reg16, Registers};
use super::MemorySm83;

/// `ADD/ADC/SUB/SBC/AND/XOR/OR/CP A,src`
pub(crate) fn alu8<M: MemorySm83>(regs: &mut Registers, mem: &mut M, op: AluOp, src: Src) {
    let val = operand::read_src(regs, mem, src);
    apply(regs, op, val);
}

pub(crate) fn apply(regs: &mut Registers, op: AluOp, val: u8) {
    match op {
        AluOp::Add => regs.a = add(regs, val, 0),
        AluOp::Adc => {
            let carry = regs.carry_bit();
            regs.a = add(regs, val, carry);
        }
        AluOp::Sub => regs.a = sub(regs, val, 0),
        AluOp::Sbc => {
            let carry = regs.carry_bit();
            regs.a = sub(regs, val, carry);
        }
        AluOp::Cp => {
            sub(regs, val, 0);
        }
        AluOp::And => {
            regs.a &= val;
            regs.set_znhc(regs.a == 0, false, true, false);
        }
        AluOp::Xor => {
            regs.a ^= val;
            regs.set_znhc(regs.a == 0, false, false, false);
        }
        AluOp::Or => {
            regs.a |= val;
            regs.set_znhc(regs.a == 0, false, false, false);
        }
    }
}

fn add(regs: &mut Registers, val: u8, carry: u8) -> u8 {
    let a = regs.a;
    let sum = a as u16 + val as u16 + carry as u16;
    let half = (a & 0x0F) + (val & 0x0F) + carry > 0x0F;
    let result = sum as u8;
    regs.set_znhc(result == 0, false, half, sum > 0xFF);
    result
}

fn sub(regs: &mut Registers, val: u8, carry: u8) -> u8 {
    let a = regs.a;
    let result = a.wrapping_sub(val).wrapping_sub(carry);
    let half = (a & 0x0F) < (val & 0x0F) + carry;
    let borrow = (a as u16) < val as u16 + carry as u16;
    regs.set_znhc(result == 0, true, half, borrow);
    result
}

/// `INC r8` / `INC [HL]`; carry is preserved.
pub(crate) fn inc8<M: MemorySm83>(regs: &mut Registers, mem: &mut M, loc: Loc) {
    let val = operand::read_loc(regs, mem, loc);
    let result = val.wrapping_add(1);
    regs.set_flag(Flag::Z, result == 0);
    regs.set_flag(Flag::N, false);
    regs.set_flag(Flag::H, val & 0x0F == 0x0F);
    operand::write_loc(regs, mem, loc, result);
}

/// `DEC r8` / `DEC [HL]`; carry is preserved.
pub(crate) fn dec8<M: MemorySm83>(regs: &mut Registers, mem: &mut M, loc: Loc) {
    let val = operand::read_loc(regs, mem, loc);
    let result = val.wrapping_sub(1);
    regs.set_flag(Flag::Z, result == 0);
    regs.set_flag(Flag::N, true);
    regs.set_flag(Flag::H, val & 0x0F == 0x00);
    operand::write_loc(regs, mem, loc, result);
}

pub(crate) fn inc16(regs: &mut Registers, reg: Reg16) {
    regs.set16(reg, regs.get16(reg).wrapping_add(1));
}

pub(crate) fn dec16(regs: &mut Registers, reg: Reg16) {
    regs.set16(reg, regs.get16(reg).wrapping_sub(1));
}

/// `ADD HL,r16`: half carry out of bit 11, carry out of bit 15, Z untouched.
pub(crate) fn add_hl(regs: &mut Registers, reg: Reg16) {
    let hl = regs.hl();
    let val = regs.get16(reg);
    let (result, carry) = hl.overflowing_add(val);
    regs.set_flag(Flag::N, false);
    regs.set_flag(Flag::H, (hl & 0x0FFF) + (val & 0x0FFF) > 0x0FFF);
    regs.set_flag(Flag::C, carry);
    regs.set_hl(result);
}

/// SP plus a signed displacement. H and C come from the unsigned add of
/// the displacement byte to SP's low byte; Z and N are cleared.
pub(crate) fn sp_plus_e8(regs: &mut Registers, offset: u8) -> u16 {
    let sp = regs.sp;
    let half = (sp & 0x000F) + (offset as u16 & 0x000F) > 0x000F;
    let carry = (sp & 0x00FF) + offset as u16 > 0x00FF;
    regs.set_znhc(false, false, half, carry);
    sp.wrapping_add(offset as i8 as u16)
}

/// `ADD SP,e8`
pub(crate) fn add_sp_e8<M: MemorySm83>(regs: &mut Registers, mem: &mut M) {
    let offset = operand::fetch8(regs, mem);
    regs.sp = sp_plus_e8(regs, offset);
}

/// `DAA`, driven by N/H/C left over from the previous operation.
pub(crate) fn daa(regs: &mut Registers) {
    let mut a = regs.a;
    let mut carry = regs.get_flag(Flag::C);

    if !regs.get_flag(Flag::N) {
        if carry || a > 0x99 {
            a = a.wrapping_add(0x60);
            carry = true;
        }
        if regs.get_flag(Flag::H) || a & 0x0F > 0x09 {
            a = a.wrapping_add(0x06);
        }
    } else {
        if carry {
            a = a.wrapping_sub(0x60);
        }
        if regs.get_flag(Flag::H) {
            a = a.wrapping_sub(0x06);
        }
    }

    regs.a = a;
    regs.set_flag(Flag::Z, a == 0);
    regs.set_flag(Flag::H, false);
    regs.set_flag(Flag::C, carry);
}

pub(crate) fn cpl(regs: &mut Registers) {
    regs.a = !regs.a;
    regs.set_flag(Flag::N, true);
    regs.set_flag(Flag::H, true);
}

pub(crate) fn scf(regs: &mut Registers) {
    regs.set_flag(Flag::N, false);
    regs.set_flag(Flag::H, false);
    regs.set_flag(Flag::C, true);
}

pub(crate) fn ccf(regs: &mut Registers) {
    let carry = regs.get_flag(Flag::C);
    regs.set_flag(Flag::N, false);
    regs.set_flag(Flag::H, false);
    regs.set_flag(Flag::C, !carry);
}
