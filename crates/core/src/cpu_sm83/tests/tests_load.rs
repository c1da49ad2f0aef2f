//! Load, LDH and stack transfer tests

use super::{cpu_with, step};
use crate::cpu_sm83::{FLAG_C, FLAG_H, FLAG_N, FLAG_Z};

#[test]
fn test_ld_hli_a_stores_and_increments() {
    let mut cpu = cpu_with(&[0x22]); // LD [HL+],A
    cpu.regs.set_hl(0xC000);
    cpu.regs.a = 0x42;
    cpu.regs.f = FLAG_Z | FLAG_C;

    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.memory.data[0xC000], 0x42);
    assert_eq!(cpu.regs.hl(), 0xC001);
    assert_eq!(cpu.regs.f, FLAG_Z | FLAG_C);
    assert_eq!(cpu.regs.pc, 0x0101);
}

#[test]
fn test_ld_a_hld_reads_and_decrements() {
    let mut cpu = cpu_with(&[0x3A]); // LD A,[HL-]
    cpu.regs.set_hl(0x0000);
    cpu.memory.data[0x0000] = 0x99;
    step(&mut cpu);
    assert_eq!(cpu.regs.a, 0x99);
    assert_eq!(cpu.regs.hl(), 0xFFFF);
}

#[test]
fn test_ld_bc_de_indirect() {
    let mut cpu = cpu_with(&[0x02, 0x1A]); // LD [BC],A ; LD A,[DE]
    cpu.regs.set_bc(0xC010);
    cpu.regs.set_de(0xC020);
    cpu.regs.a = 0x5A;
    cpu.memory.data[0xC020] = 0xA5;

    step(&mut cpu);
    assert_eq!(cpu.memory.data[0xC010], 0x5A);
    step(&mut cpu);
    assert_eq!(cpu.regs.a, 0xA5);
}

#[test]
fn test_ld_register_forms() {
    // LD B,C ; LD D,[HL] ; LD [HL],E ; LD [HL],0x77 ; LD L,0x10
    let mut cpu = cpu_with(&[0x41, 0x56, 0x73, 0x36, 0x77, 0x2E, 0x10]);
    cpu.regs.c = 0x11;
    cpu.regs.e = 0x33;
    cpu.regs.set_hl(0xC000);
    cpu.memory.data[0xC000] = 0x22;

    assert_eq!(step(&mut cpu), 4);
    assert_eq!(cpu.regs.b, 0x11);
    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.regs.d, 0x22);
    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.memory.data[0xC000], 0x33);
    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.memory.data[0xC000], 0x77);
    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.regs.l, 0x10);
    assert_eq!(cpu.regs.pc, 0x0107);
}

#[test]
fn test_ld16_immediate() {
    let mut cpu = cpu_with(&[0x01, 0x34, 0x12, 0x31, 0xFE, 0xFF]); // LD BC,0x1234 ; LD SP,0xFFFE
    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.regs.bc(), 0x1234);
    step(&mut cpu);
    assert_eq!(cpu.regs.sp, 0xFFFE);
}

#[test]
fn test_ld_abs_sp_little_endian() {
    let mut cpu = cpu_with(&[0x08, 0x00, 0xC1]); // LD [0xC100],SP
    cpu.regs.sp = 0xBEEF;
    assert_eq!(step(&mut cpu), 20);
    assert_eq!(cpu.memory.data[0xC100], 0xEF);
    assert_eq!(cpu.memory.data[0xC101], 0xBE);
}

#[test]
fn test_ld_abs_a_round_trip() {
    let mut cpu = cpu_with(&[0xEA, 0x00, 0xD0, 0xAF, 0xFA, 0x00, 0xD0]); // LD [0xD000],A ; XOR A ; LD A,[0xD000]
    cpu.regs.a = 0x3C;
    assert_eq!(step(&mut cpu), 16);
    step(&mut cpu);
    assert_eq!(cpu.regs.a, 0);
    assert_eq!(step(&mut cpu), 16);
    assert_eq!(cpu.regs.a, 0x3C);
}

#[test]
fn test_ldh_high_page() {
    // LDH [0x80],A ; LDH A,[C] ; LDH [C],A ; LDH A,[0x81]
    let mut cpu = cpu_with(&[0xE0, 0x80, 0xF2, 0xE2, 0xF0, 0x81]);
    cpu.regs.a = 0x12;
    cpu.regs.c = 0x80;

    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.memory.data[0xFF80], 0x12);

    cpu.regs.a = 0;
    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.regs.a, 0x12);

    cpu.regs.c = 0x81;
    step(&mut cpu);
    assert_eq!(cpu.memory.data[0xFF81], 0x12);

    cpu.regs.a = 0;
    step(&mut cpu);
    assert_eq!(cpu.regs.a, 0x12);
}

#[test]
fn test_ld_hl_sp_e8_flags() {
    let mut cpu = cpu_with(&[0xF8, 0x01, 0xF8, 0xFE]); // LD HL,SP+1 ; LD HL,SP-2
    cpu.regs.sp = 0x00FF;
    cpu.regs.f = FLAG_Z | FLAG_N;

    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.regs.hl(), 0x0100);
    assert_eq!(cpu.regs.sp, 0x00FF);
    assert_eq!(cpu.regs.f, FLAG_H | FLAG_C);

    cpu.regs.sp = 0x1000;
    step(&mut cpu);
    assert_eq!(cpu.regs.hl(), 0x0FFE);
    assert_eq!(cpu.regs.f, 0);
}

#[test]
fn test_ld_sp_hl() {
    let mut cpu = cpu_with(&[0xF9]);
    cpu.regs.set_hl(0xD000);
    assert_eq!(step(&mut cpu), 8);
    assert_eq!(cpu.regs.sp, 0xD000);
}

#[test]
fn test_push_pop_bc_de() {
    let mut cpu = cpu_with(&[0xC5, 0xD1]); // PUSH BC ; POP DE
    cpu.regs.set_bc(0x1234);

    assert_eq!(step(&mut cpu), 16);
    assert_eq!(cpu.regs.sp, 0xFFFC);
    assert_eq!(cpu.memory.data[0xFFFD], 0x12);
    assert_eq!(cpu.memory.data[0xFFFC], 0x34);

    assert_eq!(step(&mut cpu), 12);
    assert_eq!(cpu.regs.de(), 0x1234);
    assert_eq!(cpu.regs.sp, 0xFFFE);
}

#[test]
fn test_pop_af_masks_low_nibble() {
    let mut cpu = cpu_with(&[0xF1]); // POP AF
    cpu.memory.data[0xFFFE] = 0xFF;
    cpu.memory.data[0xFFFF] = 0x12;
    step(&mut cpu);
    assert_eq!(cpu.regs.a, 0x12);
    assert_eq!(cpu.regs.f, 0xF0);
    assert_eq!(cpu.regs.sp, 0x0000);
}

#[test]
fn test_push_af() {
    let mut cpu = cpu_with(&[0xF5]);
    cpu.regs.a = 0x01;
    cpu.regs.f = FLAG_Z | FLAG_C;
    step(&mut cpu);
    assert_eq!(cpu.memory.data[0xFFFD], 0x01);
    assert_eq!(cpu.memory.data[0xFFFC], 0x90);
}
