//! Opcode tables.
//!
//! Both tables are evaluated at compile time from the opcode bit fields
//! (`xx yyy zzz`), so a step is a single array index. The base table has no
//! entry for the eleven unused opcodes; the `0xCB` slot is empty too because
//! the step engine consumes the prefix before any lookup.

use std::fmt;

use super::operand::{Cond, Indirect, Loc, Src};
use super::registers::{Reg16, Reg8};

/// Accumulator ALU operation (`x = 2` block and the `n8` column).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AluOp {
    Add,
    Adc,
    Sub,
    Sbc,
    And,
    Xor,
    Or,
    Cp,
}

/// Rotate/shift operation of the CB-prefixed `x = 0` block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShiftOp {
    Rlc,
    Rrc,
    Rl,
    Rr,
    Sla,
    Sra,
    Swap,
    Srl,
}

/// A decoded instruction with its operands bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    Nop,
    Stop,
    Halt,
    Di,
    Ei,

    // Loads
    Ld8 { dst: Loc, src: Src },
    LdIndA(Indirect),
    LdAInd(Indirect),
    Ld16Imm(Reg16),
    LdAbsSp,
    LdAbsA,
    LdAAbs,
    LdhImmA,
    LdhAImm,
    LdhCA,
    LdhAC,
    LdSpHl,
    LdHlSpE8,
    Push(Reg16),
    Pop(Reg16),

    // Arithmetic and logic
    Alu(AluOp, Src),
    Inc8(Loc),
    Dec8(Loc),
    Inc16(Reg16),
    Dec16(Reg16),
    AddHl(Reg16),
    AddSpE8,
    Daa,
    Cpl,
    Scf,
    Ccf,

    // Accumulator rotates
    Rlca,
    Rrca,
    Rla,
    Rra,

    // Control flow
    Jp(Option<Cond>),
    JpHl,
    Jr(Option<Cond>),
    Call(Option<Cond>),
    Ret(Option<Cond>),
    Reti,
    Rst(u8),

    // CB-prefixed
    Shift(ShiftOp, Loc),
    Bit(u8, Loc),
    Res(u8, Loc),
    Set(u8, Loc),
}

impl Op {
    /// Bytes following the opcode (or the CB sub-opcode).
    pub const fn operand_len(self) -> u16 {
        match self {
            Op::Ld8 { src: Src::Imm, .. } | Op::Alu(_, Src::Imm) => 1,
            Op::LdhImmA | Op::LdhAImm | Op::AddSpE8 | Op::LdHlSpE8 | Op::Jr(_) | Op::Stop => 1,
            Op::Ld16Imm(_) | Op::LdAbsSp | Op::LdAbsA | Op::LdAAbs => 2,
            Op::Jp(_) | Op::Call(_) => 2,
            _ => 0,
        }
    }
}

/// One table slot: the operation and its cost in M-cycles.
///
/// `taken_cycles` differs from `cycles` only for conditional branches,
/// where `cycles` is the not-taken cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Entry {
    pub op: Op,
    pub cycles: u8,
    pub taken_cycles: u8,
}

impl Entry {
    const fn new(op: Op, cycles: u8) -> Self {
        Self {
            op,
            cycles,
            taken_cycles: cycles,
        }
    }

    pub fn m_cycles(&self, branched: bool) -> u32 {
        u32::from(if branched { self.taken_cycles } else { self.cycles })
    }
}

static BASE_TABLE: [Option<Entry>; 256] = build_base_table();
static CB_TABLE: [Entry; 256] = build_cb_table();

/// Look up an unprefixed opcode. `None` for unused opcodes and for `0xCB`.
pub fn lookup(opcode: u8) -> Option<&'static Entry> {
    BASE_TABLE[opcode as usize].as_ref()
}

/// Look up the byte following a `0xCB` prefix. Every value is defined.
pub fn lookup_cb(opcode: u8) -> &'static Entry {
    &CB_TABLE[opcode as usize]
}

const fn build_base_table() -> [Option<Entry>; 256] {
    let mut table = [None; 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode_base(i as u8);
        i += 1;
    }
    table
}

const fn build_cb_table() -> [Entry; 256] {
    let mut table = [Entry::new(Op::Nop, 0); 256];
    let mut i = 0;
    while i < 256 {
        table[i] = decode_cb(i as u8);
        i += 1;
    }
    table
}

const fn loc(idx: u8) -> Loc {
    match idx & 0x07 {
        0 => Loc::Reg(Reg8::B),
        1 => Loc::Reg(Reg8::C),
        2 => Loc::Reg(Reg8::D),
        3 => Loc::Reg(Reg8::E),
        4 => Loc::Reg(Reg8::H),
        5 => Loc::Reg(Reg8::L),
        6 => Loc::IndHL,
        _ => Loc::Reg(Reg8::A),
    }
}

/// Pair column used by loads and 16-bit arithmetic.
const fn rp(idx: u8) -> Reg16 {
    match idx & 0x03 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::SP,
    }
}

/// Pair column used by PUSH/POP.
const fn rp_stack(idx: u8) -> Reg16 {
    match idx & 0x03 {
        0 => Reg16::BC,
        1 => Reg16::DE,
        2 => Reg16::HL,
        _ => Reg16::AF,
    }
}

const fn indirect(idx: u8) -> Indirect {
    match idx & 0x03 {
        0 => Indirect::BC,
        1 => Indirect::DE,
        2 => Indirect::HLI,
        _ => Indirect::HLD,
    }
}

const fn cond(idx: u8) -> Cond {
    match idx & 0x03 {
        0 => Cond::NZ,
        1 => Cond::Z,
        2 => Cond::NC,
        _ => Cond::C,
    }
}

const fn alu_op(idx: u8) -> AluOp {
    match idx & 0x07 {
        0 => AluOp::Add,
        1 => AluOp::Adc,
        2 => AluOp::Sub,
        3 => AluOp::Sbc,
        4 => AluOp::And,
        5 => AluOp::Xor,
        6 => AluOp::Or,
        _ => AluOp::Cp,
    }
}

const fn shift_op(idx: u8) -> ShiftOp {
    match idx & 0x07 {
        0 => ShiftOp::Rlc,
        1 => ShiftOp::Rrc,
        2 => ShiftOp::Rl,
        3 => ShiftOp::Rr,
        4 => ShiftOp::Sla,
        5 => ShiftOp::Sra,
        6 => ShiftOp::Swap,
        _ => ShiftOp::Srl,
    }
}

const fn is_ind_hl(l: Loc) -> bool {
    matches!(l, Loc::IndHL)
}

const fn entry(op: Op, cycles: u8) -> Option<Entry> {
    Some(Entry::new(op, cycles))
}

const fn branch(op: Op, not_taken: u8, taken: u8) -> Option<Entry> {
    Some(Entry {
        op,
        cycles: not_taken,
        taken_cycles: taken,
    })
}

const fn decode_base(opcode: u8) -> Option<Entry> {
    let x = opcode >> 6;
    let y = (opcode >> 3) & 0x07;
    let z = opcode & 0x07;

    match opcode {
        0x00 => entry(Op::Nop, 1),
        0x08 => entry(Op::LdAbsSp, 5),
        0x10 => entry(Op::Stop, 1),
        0x18 => entry(Op::Jr(None), 3),
        0x20 | 0x28 | 0x30 | 0x38 => branch(Op::Jr(Some(cond(y))), 2, 3),

        0x01 | 0x11 | 0x21 | 0x31 => entry(Op::Ld16Imm(rp(y >> 1)), 3),
        0x09 | 0x19 | 0x29 | 0x39 => entry(Op::AddHl(rp(y >> 1)), 2),
        0x02 | 0x12 | 0x22 | 0x32 => entry(Op::LdIndA(indirect(y >> 1)), 2),
        0x0A | 0x1A | 0x2A | 0x3A => entry(Op::LdAInd(indirect(y >> 1)), 2),
        0x03 | 0x13 | 0x23 | 0x33 => entry(Op::Inc16(rp(y >> 1)), 2),
        0x0B | 0x1B | 0x2B | 0x3B => entry(Op::Dec16(rp(y >> 1)), 2),

        0x07 => entry(Op::Rlca, 1),
        0x0F => entry(Op::Rrca, 1),
        0x17 => entry(Op::Rla, 1),
        0x1F => entry(Op::Rra, 1),
        0x27 => entry(Op::Daa, 1),
        0x2F => entry(Op::Cpl, 1),
        0x37 => entry(Op::Scf, 1),
        0x3F => entry(Op::Ccf, 1),

        _ if x == 0 && z == 4 => {
            let l = loc(y);
            entry(Op::Inc8(l), if is_ind_hl(l) { 3 } else { 1 })
        }
        _ if x == 0 && z == 5 => {
            let l = loc(y);
            entry(Op::Dec8(l), if is_ind_hl(l) { 3 } else { 1 })
        }
        _ if x == 0 && z == 6 => {
            let l = loc(y);
            entry(Op::Ld8 { dst: l, src: Src::Imm }, if is_ind_hl(l) { 3 } else { 2 })
        }

        0x76 => entry(Op::Halt, 1),
        0x40..=0x7F => {
            let dst = loc(y);
            let src = loc(z);
            let cycles = if is_ind_hl(dst) || is_ind_hl(src) { 2 } else { 1 };
            entry(Op::Ld8 { dst, src: Src::Loc(src) }, cycles)
        }
        0x80..=0xBF => {
            let src = loc(z);
            entry(Op::Alu(alu_op(y), Src::Loc(src)), if is_ind_hl(src) { 2 } else { 1 })
        }

        0xC0 | 0xC8 | 0xD0 | 0xD8 => branch(Op::Ret(Some(cond(y))), 2, 5),
        0xC1 | 0xD1 | 0xE1 | 0xF1 => entry(Op::Pop(rp_stack(y >> 1)), 3),
        0xC5 | 0xD5 | 0xE5 | 0xF5 => entry(Op::Push(rp_stack(y >> 1)), 4),
        0xC2 | 0xCA | 0xD2 | 0xDA => branch(Op::Jp(Some(cond(y))), 3, 4),
        0xC4 | 0xCC | 0xD4 | 0xDC => branch(Op::Call(Some(cond(y))), 3, 6),
        0xC3 => entry(Op::Jp(None), 4),
        0xC9 => entry(Op::Ret(None), 4),
        0xCD => entry(Op::Call(None), 6),
        0xD9 => entry(Op::Reti, 4),
        0xE9 => entry(Op::JpHl, 1),
        0xF9 => entry(Op::LdSpHl, 2),

        0xE0 => entry(Op::LdhImmA, 3),
        0xF0 => entry(Op::LdhAImm, 3),
        0xE2 => entry(Op::LdhCA, 2),
        0xF2 => entry(Op::LdhAC, 2),
        0xEA => entry(Op::LdAbsA, 4),
        0xFA => entry(Op::LdAAbs, 4),
        0xE8 => entry(Op::AddSpE8, 4),
        0xF8 => entry(Op::LdHlSpE8, 3),

        0xF3 => entry(Op::Di, 1),
        0xFB => entry(Op::Ei, 1),

        _ if x == 3 && z == 6 => entry(Op::Alu(alu_op(y), Src::Imm), 2),
        _ if x == 3 && z == 7 => entry(Op::Rst(y * 8), 4),

        // 0xCB prefix and the unused D3 DB DD E3 E4 EB EC ED F4 FC FD
        _ => None,
    }
}

const fn decode_cb(opcode: u8) -> Entry {
    let y = (opcode >> 3) & 0x07;
    let l = loc(opcode);
    let mem = is_ind_hl(l);

    match opcode >> 6 {
        0 => Entry::new(Op::Shift(shift_op(y), l), if mem { 4 } else { 2 }),
        1 => Entry::new(Op::Bit(y, l), if mem { 3 } else { 2 }),
        2 => Entry::new(Op::Res(y, l), if mem { 4 } else { 2 }),
        _ => Entry::new(Op::Set(y, l), if mem { 4 } else { 2 }),
    }
}

impl fmt::Display for AluOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AluOp::Add => "ADD",
            AluOp::Adc => "ADC",
            AluOp::Sub => "SUB",
            AluOp::Sbc => "SBC",
            AluOp::And => "AND",
            AluOp::Xor => "XOR",
            AluOp::Or => "OR",
            AluOp::Cp => "CP",
        };
        f.write_str(name)
    }
}

impl fmt::Display for ShiftOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShiftOp::Rlc => "RLC",
            ShiftOp::Rrc => "RRC",
            ShiftOp::Rl => "RL",
            ShiftOp::Rr => "RR",
            ShiftOp::Sla => "SLA",
            ShiftOp::Sra => "SRA",
            ShiftOp::Swap => "SWAP",
            ShiftOp::Srl => "SRL",
        };
        f.write_str(name)
    }
}

fn write_cond(f: &mut fmt::Formatter<'_>, mnemonic: &str, cond: Option<Cond>, arg: &str) -> fmt::Result {
    match cond {
        Some(c) => write!(f, "{} {},{}", mnemonic, c, arg),
        None => write!(f, "{} {}", mnemonic, arg),
    }
}

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Op::Nop => f.write_str("NOP"),
            Op::Stop => f.write_str("STOP"),
            Op::Halt => f.write_str("HALT"),
            Op::Di => f.write_str("DI"),
            Op::Ei => f.write_str("EI"),

            Op::Ld8 { dst, src } => write!(f, "LD {},{}", dst, src),
            Op::LdIndA(ind) => write!(f, "LD {},A", ind),
            Op::LdAInd(ind) => write!(f, "LD A,{}", ind),
            Op::Ld16Imm(r) => write!(f, "LD {},n16", r),
            Op::LdAbsSp => f.write_str("LD [n16],SP"),
            Op::LdAbsA => f.write_str("LD [n16],A"),
            Op::LdAAbs => f.write_str("LD A,[n16]"),
            Op::LdhImmA => f.write_str("LDH [n8],A"),
            Op::LdhAImm => f.write_str("LDH A,[n8]"),
            Op::LdhCA => f.write_str("LDH [C],A"),
            Op::LdhAC => f.write_str("LDH A,[C]"),
            Op::LdSpHl => f.write_str("LD SP,HL"),
            Op::LdHlSpE8 => f.write_str("LD HL,SP+e8"),
            Op::Push(r) => write!(f, "PUSH {}", r),
            Op::Pop(r) => write!(f, "POP {}", r),

            Op::Alu(op, src) => write!(f, "{} A,{}", op, src),
            Op::Inc8(l) => write!(f, "INC {}", l),
            Op::Dec8(l) => write!(f, "DEC {}", l),
            Op::Inc16(r) => write!(f, "INC {}", r),
            Op::Dec16(r) => write!(f, "DEC {}", r),
            Op::AddHl(r) => write!(f, "ADD HL,{}", r),
            Op::AddSpE8 => f.write_str("ADD SP,e8"),
            Op::Daa => f.write_str("DAA"),
            Op::Cpl => f.write_str("CPL"),
            Op::Scf => f.write_str("SCF"),
            Op::Ccf => f.write_str("CCF"),

            Op::Rlca => f.write_str("RLCA"),
            Op::Rrca => f.write_str("RRCA"),
            Op::Rla => f.write_str("RLA"),
            Op::Rra => f.write_str("RRA"),

            Op::Jp(c) => write_cond(f, "JP", c, "n16"),
            Op::JpHl => f.write_str("JP HL"),
            Op::Jr(c) => write_cond(f, "JR", c, "e8"),
            Op::Call(c) => write_cond(f, "CALL", c, "n16"),
            Op::Ret(Some(c)) => write!(f, "RET {}", c),
            Op::Ret(None) => f.write_str("RET"),
            Op::Reti => f.write_str("RETI"),
            Op::Rst(vec) => write!(f, "RST ${:02X}", vec),

            Op::Shift(op, l) => write!(f, "{} {}", op, l),
            Op::Bit(n, l) => write!(f, "BIT {},{}", n, l),
            Op::Res(n, l) => write!(f, "RES {},{}", n, l),
            Op::Set(n, l) => write!(f, "SET {},{}", n, l),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const UNUSED: [u8; 11] = [
        0xD3, 0xDB, 0xDD, 0xE3, 0xE4, 0xEB, 0xEC, 0xED, 0xF4, 0xFC, 0xFD,
    ];

    #[test]
    fn test_only_unused_opcodes_and_prefix_are_missing() {
        for opcode in 0..=255u8 {
            let expect_missing = opcode == 0xCB || UNUSED.contains(&opcode);
            assert_eq!(
                lookup(opcode).is_none(),
                expect_missing,
                "opcode {:02X}",
                opcode
            );
        }
    }

    #[test]
    fn test_block_decoding() {
        assert_eq!(
            lookup(0x41).map(|e| e.op),
            Some(Op::Ld8 { dst: Loc::Reg(Reg8::B), src: Src::Loc(Loc::Reg(Reg8::C)) })
        );
        assert_eq!(lookup(0x76).map(|e| e.op), Some(Op::Halt));
        assert_eq!(
            lookup(0xA9).map(|e| e.op),
            Some(Op::Alu(AluOp::Xor, Src::Loc(Loc::Reg(Reg8::C))))
        );
        assert_eq!(lookup(0xFE).map(|e| e.op), Some(Op::Alu(AluOp::Cp, Src::Imm)));
        assert_eq!(lookup(0xEF).map(|e| e.op), Some(Op::Rst(0x28)));
        assert_eq!(lookup(0xF1).map(|e| e.op), Some(Op::Pop(Reg16::AF)));
        assert_eq!(lookup(0x31).map(|e| e.op), Some(Op::Ld16Imm(Reg16::SP)));
        assert_eq!(lookup(0x3A).map(|e| e.op), Some(Op::LdAInd(Indirect::HLD)));
        assert_eq!(lookup(0x38).map(|e| e.op), Some(Op::Jr(Some(Cond::C))));
    }

    #[test]
    fn test_cb_decoding() {
        assert_eq!(lookup_cb(0x00).op, Op::Shift(ShiftOp::Rlc, Loc::Reg(Reg8::B)));
        assert_eq!(lookup_cb(0x36).op, Op::Shift(ShiftOp::Swap, Loc::IndHL));
        assert_eq!(lookup_cb(0x7E).op, Op::Bit(7, Loc::IndHL));
        assert_eq!(lookup_cb(0x87).op, Op::Res(0, Loc::Reg(Reg8::A)));
        assert_eq!(lookup_cb(0xFF).op, Op::Set(7, Loc::Reg(Reg8::A)));
    }

    #[test]
    fn test_cycle_costs() {
        let cost = |op: u8| lookup(op).map(|e| (e.cycles, e.taken_cycles));
        assert_eq!(cost(0x00), Some((1, 1)));
        assert_eq!(cost(0x34), Some((3, 3)));
        assert_eq!(cost(0x36), Some((3, 3)));
        assert_eq!(cost(0x46), Some((2, 2)));
        assert_eq!(cost(0x08), Some((5, 5)));
        assert_eq!(cost(0x20), Some((2, 3)));
        assert_eq!(cost(0xC0), Some((2, 5)));
        assert_eq!(cost(0xC4), Some((3, 6)));
        assert_eq!(cost(0xCA), Some((3, 4)));
        assert_eq!(cost(0xCD), Some((6, 6)));
        assert_eq!(cost(0xE8), Some((4, 4)));
        assert_eq!(cost(0xF8), Some((3, 3)));

        assert_eq!(lookup_cb(0x06).cycles, 4);
        assert_eq!(lookup_cb(0x46).cycles, 3);
        assert_eq!(lookup_cb(0xC6).cycles, 4);
        assert_eq!(lookup_cb(0x11).cycles, 2);
    }

    #[test]
    fn test_mnemonics() {
        let text = |op: u8| lookup(op).map(|e| e.op.to_string()).unwrap_or_default();
        assert_eq!(text(0x22), "LD [HL+],A");
        assert_eq!(text(0x7E), "LD A,[HL]");
        assert_eq!(text(0x36), "LD [HL],n8");
        assert_eq!(text(0xC2), "JP NZ,n16");
        assert_eq!(text(0xC9), "RET");
        assert_eq!(text(0xD8), "RET C");
        assert_eq!(text(0xFF), "RST $38");
        assert_eq!(text(0x8E), "ADC A,[HL]");
        assert_eq!(lookup_cb(0x7E).op.to_string(), "BIT 7,[HL]");
    }

    #[test]
    fn test_operand_lengths() {
        let len = |op: u8| lookup(op).map(|e| e.op.operand_len());
        assert_eq!(len(0x00), Some(0));
        assert_eq!(len(0x06), Some(1));
        assert_eq!(len(0x01), Some(2));
        assert_eq!(len(0xC3), Some(2));
        assert_eq!(len(0x18), Some(1));
        assert_eq!(len(0xE0), Some(1));
        assert_eq!(len(0xE2), Some(0));
    }
}
