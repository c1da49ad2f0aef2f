//! Tests for the SM83 CPU, organised by instruction family:
//! - `tests_alu`: 8/16-bit arithmetic, logic, DAA and the flag oddities
//! - `tests_bits`: rotates, shifts, BIT/RES/SET
//! - `tests_load`: LD family, LDH, PUSH/POP
//! - `tests_control`: jumps, calls, returns, RST, DI/EI/RETI
//! - `tests_engine`: fetch/decode, prefix handling, errors, save states

mod tests_load;

use super::{ArrayMemory, CpuSm83, Registers};

/// CPU with zeroed registers, PC at 0x0100, and `program` loaded there.
pub(super) fn cpu_with(program: &[u8]) -> CpuSm83<ArrayMemory> {
    let mut mem = ArrayMemory::new();
    mem.load(0x0100, program);
    CpuSm83::with_registers(
        mem,
        Registers {
            pc: 0x0100,
            sp: 0xFFFE,
            ..Default::default()
        },
    )
}

/// Execute one instruction, panicking on an illegal opcode.
pub(super) fn step(cpu: &mut CpuSm83<ArrayMemory>) -> u32 {
    cpu.step().expect("opcode should be implemented")
}
