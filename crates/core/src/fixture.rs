//! Single-step conformance fixtures.
//!
//! Each fixture file is a JSON array of cases. A case seeds registers and
//! memory from `initial`, executes exactly one instruction and compares
//! every register, the IME latch and every listed memory byte against
//! `final`. When the case carries a per-bus-cycle list its length is the
//! expected M-cycle count.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::cpu_sm83::{ArrayMemory, CpuSm83, Ime, MemorySm83, Registers, Sm83Error};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestCase {
    pub name: String,
    pub initial: CpuState,
    #[serde(rename = "final")]
    pub final_state: CpuState,
    /// Bus activity per M-cycle; entries are `[addr, data, kind]` or null.
    #[serde(default)]
    pub cycles: Vec<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CpuState {
    pub pc: u16,
    pub sp: u16,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub d: u8,
    pub e: u8,
    pub f: u8,
    pub h: u8,
    pub l: u8,
    #[serde(default)]
    pub ime: u8,
    /// Interrupt-enable register; recorded by the corpus, not modelled here.
    #[serde(default)]
    pub ie: Option<u8>,
    pub ram: Vec<(u16, u8)>,
}

#[derive(thiserror::Error, Debug)]
pub enum FixtureError {
    #[error("cannot read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("cannot parse {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("{case}: {source}")]
    Step { case: String, source: Sm83Error },
    #[error("{case}: {field} (got {got:#X} exp {expected:#X})")]
    Register {
        case: String,
        field: &'static str,
        got: u16,
        expected: u16,
    },
    #[error("{case}: RAM[{addr:#06X}] (got {got:#04X} exp {expected:#04X})")]
    Memory {
        case: String,
        addr: u16,
        got: u8,
        expected: u8,
    },
    #[error("{case}: cycles (got {got} exp {expected})")]
    Cycles {
        case: String,
        got: usize,
        expected: usize,
    },
}

/// Outcome of running every case in one fixture file.
#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    pub total: usize,
    pub failures: Vec<FixtureError>,
}

impl FileReport {
    pub fn passed(&self) -> usize {
        self.total - self.failures.len()
    }
}

pub fn parse_cases(json: &str, path: &Path) -> Result<Vec<TestCase>, FixtureError> {
    serde_json::from_str(json).map_err(|source| FixtureError::Json {
        path: path.to_path_buf(),
        source,
    })
}

pub fn load_cases(path: &Path) -> Result<Vec<TestCase>, FixtureError> {
    let json = std::fs::read_to_string(path).map_err(|source| FixtureError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_cases(&json, path)
}

/// `*.json` files directly inside `dir`, sorted by name.
pub fn fixture_files(dir: &Path) -> Result<Vec<PathBuf>, FixtureError> {
    let entries = std::fs::read_dir(dir).map_err(|source| FixtureError::Io {
        path: dir.to_path_buf(),
        source,
    })?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry
            .map_err(|source| FixtureError::Io {
                path: dir.to_path_buf(),
                source,
            })?
            .path();
        if path.extension().map_or(false, |ext| ext == "json") {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Build a CPU in the `initial` snapshot.
pub fn prepare(state: &CpuState) -> CpuSm83<ArrayMemory> {
    let mut memory = ArrayMemory::new();
    for &(addr, val) in &state.ram {
        memory.write8(addr, val);
    }

    let regs = Registers {
        a: state.a,
        f: state.f,
        b: state.b,
        c: state.c,
        d: state.d,
        e: state.e,
        h: state.h,
        l: state.l,
        sp: state.sp,
        pc: state.pc,
    };
    let mut cpu = CpuSm83::with_registers(memory, regs);
    cpu.ime = Ime::from_flag(state.ime != 0);
    cpu
}

/// Execute one case, returning the first mismatch.
pub fn run_case(tc: &TestCase) -> Result<(), FixtureError> {
    let mut cpu = prepare(&tc.initial);
    let t_cycles = cpu.step().map_err(|source| FixtureError::Step {
        case: tc.name.clone(),
        source,
    })?;

    let fs = &tc.final_state;

    macro_rules! check {
        ($got:expr, $exp:expr, $name:expr) => {
            if $got != $exp {
                return Err(FixtureError::Register {
                    case: tc.name.clone(),
                    field: $name,
                    got: $got as u16,
                    expected: $exp as u16,
                });
            }
        };
    }

    check!(cpu.regs.a, fs.a, "A");
    check!(cpu.regs.f, fs.f, "F");
    check!(cpu.regs.b, fs.b, "B");
    check!(cpu.regs.c, fs.c, "C");
    check!(cpu.regs.d, fs.d, "D");
    check!(cpu.regs.e, fs.e, "E");
    check!(cpu.regs.h, fs.h, "H");
    check!(cpu.regs.l, fs.l, "L");
    check!(cpu.regs.sp, fs.sp, "SP");
    check!(cpu.regs.pc, fs.pc, "PC");
    check!(cpu.ime() as u8, (fs.ime != 0) as u8, "IME");

    for &(addr, expected) in &fs.ram {
        let got = cpu.memory.read8(addr);
        if got != expected {
            return Err(FixtureError::Memory {
                case: tc.name.clone(),
                addr,
                got,
                expected,
            });
        }
    }

    if !tc.cycles.is_empty() {
        let got = (t_cycles / 4) as usize;
        if got != tc.cycles.len() {
            return Err(FixtureError::Cycles {
                case: tc.name.clone(),
                got,
                expected: tc.cycles.len(),
            });
        }
    }

    Ok(())
}

/// Run every case in `cases`, keeping all failures.
pub fn run_cases(path: &Path, cases: &[TestCase]) -> FileReport {
    let failures = cases.iter().filter_map(|tc| run_case(tc).err()).collect();
    FileReport {
        path: path.to_path_buf(),
        total: cases.len(),
        failures,
    }
}

pub fn run_file(path: &Path) -> Result<FileReport, FixtureError> {
    let cases = load_cases(path)?;
    Ok(run_cases(path, &cases))
}

#[cfg(test)]
mod tests {
    use super::*;

    const LD_HLI_A: &str = r#"[
        {
            "name": "22 0000",
            "initial": {
                "a": 66, "b": 0, "c": 0, "d": 0, "e": 0, "f": 176, "h": 192, "l": 0,
                "pc": 256, "sp": 65534, "ime": 0, "ie": 0,
                "ram": [[256, 34]]
            },
            "final": {
                "a": 66, "b": 0, "c": 0, "d": 0, "e": 0, "f": 176, "h": 192, "l": 1,
                "pc": 257, "sp": 65534, "ime": 0, "ie": 0,
                "ram": [[256, 34], [49152, 66]]
            },
            "cycles": [[256, 34, "r-m"], [49152, 66, "-wm"]]
        }
    ]"#;

    fn cases() -> Vec<TestCase> {
        parse_cases(LD_HLI_A, Path::new("22.json")).expect("fixture parses")
    }

    #[test]
    fn test_passing_case() {
        let cases = cases();
        assert_eq!(cases[0].final_state.l, 1);
        run_case(&cases[0]).expect("case should pass");
    }

    #[test]
    fn test_register_mismatch_is_reported() {
        let mut tc = cases().remove(0);
        tc.final_state.l = 2;
        match run_case(&tc) {
            Err(FixtureError::Register {
                field,
                got,
                expected,
                ..
            }) => {
                assert_eq!(field, "L");
                assert_eq!(got, 1);
                assert_eq!(expected, 2);
            }
            other => panic!("expected register mismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_memory_mismatch_is_reported() {
        let mut tc = cases().remove(0);
        tc.final_state.ram[1].1 = 0;
        let err = run_case(&tc).unwrap_err();
        assert_eq!(
            err.to_string(),
            "22 0000: RAM[0xC000] (got 0x42 exp 0x00)"
        );
    }

    #[test]
    fn test_cycle_count_checked_only_when_listed() {
        let mut tc = cases().remove(0);
        tc.cycles.push(serde_json::Value::Null);
        assert!(matches!(
            run_case(&tc),
            Err(FixtureError::Cycles {
                got: 2,
                expected: 3,
                ..
            })
        ));

        tc.cycles.clear();
        run_case(&tc).expect("no cycle list means no cycle check");
    }

    #[test]
    fn test_illegal_opcode_is_step_error() {
        let mut tc = cases().remove(0);
        tc.initial.ram[0].1 = 0xD3;
        assert!(matches!(run_case(&tc), Err(FixtureError::Step { .. })));
    }

    #[test]
    fn test_ime_field_seeds_latch() {
        let mut tc = cases().remove(0);
        tc.initial.ime = 1;
        let cpu = prepare(&tc.initial);
        assert!(cpu.interrupts_enabled());

        // IME unchanged by LD, so final must agree
        assert!(run_case(&tc).is_err());
        tc.final_state.ime = 1;
        run_case(&tc).expect("ime carried through");
    }

    #[test]
    fn test_run_cases_collects_failures() {
        let good = cases().remove(0);
        let mut bad = good.clone();
        bad.final_state.a = 0;
        let report = run_cases(Path::new("22.json"), &[good, bad]);
        assert_eq!(report.total, 2);
        assert_eq!(report.passed(), 1);
        assert_eq!(report.failures.len(), 1);
    }

    #[test]
    fn test_fixture_files_lists_json_sorted() {
        let dir = std::env::temp_dir().join(format!("sm83_listing_{}", std::process::id()));
        std::fs::create_dir_all(&dir).expect("create temp dir");
        for name in ["b.json", "a.json", "notes.txt"] {
            std::fs::write(dir.join(name), "[]").expect("write file");
        }

        let files = fixture_files(&dir).expect("listing");
        let names: Vec<_> = files
            .iter()
            .filter_map(|p| p.file_name())
            .map(|n| n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, ["a.json", "b.json"]);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_fixture_files_unreadable_dir_is_io_error() {
        let missing = std::env::temp_dir().join(format!("sm83_missing_{}", std::process::id()));
        match fixture_files(&missing) {
            Err(FixtureError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected io error, got {:?}", other),
        }
    }

    #[test]
    fn test_malformed_json() {
        let err = parse_cases("[{\"name\": 1}]", Path::new("bad.json")).unwrap_err();
        assert!(matches!(err, FixtureError::Json { .. }));
    }
}
