//! The bytecode virtual machine: a fixed tape of wrapping byte cells,
//! a pointer, and a program counter stepping through a translated
//! program. Single-threaded and synchronous; the only things that
//! block are the caller-supplied input and output streams.

use crate::bytecode::Op;
use std::fmt;
use std::io::{self, Read, Write};
use std::num::Wrapping;

/// A cell is one tape slot: exactly one unsigned byte, wrapping on
/// overflow and underflow.
pub type Cell = Wrapping<u8>;

/// Number of cells on the tape.
pub const TAPE_SIZE: usize = 30_000;

/// Why a run stopped without an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Halt {
    /// The program counter ran off the end of the program.
    Finished,
    /// The step budget ran out first. Only test harnesses bound their
    /// runs; production callers pass `u64::MAX` and never see this.
    StepLimitReached,
}

/// A fatal execution failure. All of these abort the run; output
/// already written stays written.
#[derive(Debug)]
pub enum RuntimeError {
    /// Reading program input failed, including EOF while the program
    /// still wanted a byte.
    Read(io::Error),
    /// Writing program output failed.
    Write(io::Error),
    /// The pointer was moved outside the tape. Bounds policy: trap.
    PointerOutOfRange { pc: usize, pointer: isize },
    /// A jump target outside the program, which a correct translator
    /// never produces.
    InternalConsistency { pc: usize, target: usize },
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RuntimeError::Read(err) => write!(f, "reading input failed: {}", err),
            RuntimeError::Write(err) => write!(f, "writing output failed: {}", err),
            RuntimeError::PointerOutOfRange { pc, pointer } => write!(
                f,
                "pointer moved off the tape (pc={}, pointer={})",
                pc, pointer
            ),
            RuntimeError::InternalConsistency { pc, target } => write!(
                f,
                "jump to {} is outside the program (pc={}); this is a translator defect",
                target, pc
            ),
        }
    }
}

/// The mutable state of one run: the tape, the pointer, and the
/// program counter. Tests preload cells and inspect them afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionState {
    pub cells: Vec<Cell>,
    pub pointer: usize,
    pub pc: usize,
}

impl ExecutionState {
    pub fn new() -> Self {
        ExecutionState {
            cells: vec![Wrapping(0); TAPE_SIZE],
            pointer: 0,
            pc: 0,
        }
    }

    fn current_cell(&self) -> Cell {
        self.cells[self.pointer]
    }

    /// Move the pointer by a signed offset, trapping if it leaves the
    /// tape.
    fn move_pointer(&mut self, offset: isize) -> Result<(), RuntimeError> {
        let target = self.pointer as isize + offset;
        if target < 0 || target >= self.cells.len() as isize {
            return Err(RuntimeError::PointerOutOfRange {
                pc: self.pc,
                pointer: target,
            });
        }
        self.pointer = target as usize;
        Ok(())
    }

    /// Resolve `pointer + offset` to a tape index, trapping if it
    /// falls outside the tape.
    fn offset_index(&self, offset: isize) -> Result<usize, RuntimeError> {
        let target = self.pointer as isize + offset;
        if target < 0 || target >= self.cells.len() as isize {
            return Err(RuntimeError::PointerOutOfRange {
                pc: self.pc,
                pointer: target,
            });
        }
        Ok(target as usize)
    }

    fn jump_target(&self, target: usize, len: usize) -> Result<usize, RuntimeError> {
        if target >= len {
            return Err(RuntimeError::InternalConsistency {
                pc: self.pc,
                target,
            });
        }
        Ok(target)
    }
}

impl Default for ExecutionState {
    fn default() -> Self {
        ExecutionState::new()
    }
}

/// Execute a translated program to completion, a fatal error, or the
/// step budget. One dispatched op is one step. After every op the
/// program counter advances by one; a taken jump first sets it to the
/// matching jump's index, so the next step lands just past the pair.
pub fn execute<R: Read, W: Write>(
    ops: &[Op],
    state: &mut ExecutionState,
    input: &mut R,
    output: &mut W,
    max_steps: u64,
) -> Result<Halt, RuntimeError> {
    let mut steps = 0u64;

    while state.pc < ops.len() {
        if steps == max_steps {
            return Ok(Halt::StepLimitReached);
        }
        steps += 1;

        match ops[state.pc] {
            Op::MovePointer(offset) => {
                state.move_pointer(offset)?;
            }
            Op::AdjustCell(amount) => {
                // Truncating to u8 is exactly reduction modulo 256.
                state.cells[state.pointer] += Wrapping(amount as u8);
            }
            Op::WriteOutput(count) => {
                let byte = state.current_cell().0;
                for _ in 0..count {
                    output.write_all(&[byte]).map_err(RuntimeError::Write)?;
                }
            }
            Op::ReadInput(count) => {
                let mut byte = [0u8; 1];
                for _ in 0..count {
                    input.read_exact(&mut byte).map_err(RuntimeError::Read)?;
                    state.cells[state.pointer] = Wrapping(byte[0]);
                }
            }
            Op::JumpIfZero(target) => {
                if state.current_cell().0 == 0 {
                    state.pc = state.jump_target(target, ops.len())?;
                }
            }
            Op::JumpIfNotZero(target) => {
                if state.current_cell().0 != 0 {
                    state.pc = state.jump_target(target, ops.len())?;
                }
            }
            Op::ClearCell => {
                state.cells[state.pointer] = Wrapping(0);
            }
            Op::ScanPointer(stride) => {
                while state.current_cell().0 != 0 {
                    state.move_pointer(stride)?;
                }
            }
            Op::MoveCellAdd(offset) => {
                if state.current_cell().0 != 0 {
                    let target = state.offset_index(offset)?;
                    let amount = state.current_cell();
                    state.cells[target] += amount;
                    state.cells[state.pointer] = Wrapping(0);
                }
            }
        }

        state.pc += 1;
    }

    output.flush().map_err(RuntimeError::Write)?;
    Ok(Halt::Finished)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::peephole::OptimisationsFlags;
    use crate::source::parse;
    use crate::translate::translate;
    use pretty_assertions::assert_eq;

    fn run(source: &str, input: &[u8]) -> (ExecutionState, Vec<u8>) {
        let ops = translate(&parse(source), OptimisationsFlags::all()).unwrap();
        let mut state = ExecutionState::new();
        let mut output = Vec::new();
        let halt = execute(&ops, &mut state, &mut &input[..], &mut output, u64::MAX).unwrap();
        assert_eq!(halt, Halt::Finished);
        (state, output)
    }

    #[test]
    fn empty_program_is_a_noop() {
        let (state, output) = run("just a comment", &[]);
        assert_eq!(output, b"");
        assert_eq!(state.pointer, 0);
        assert!(state.cells.iter().all(|cell| cell.0 == 0));
    }

    #[test]
    fn increments_then_output() {
        for &n in &[0usize, 1, 7, 64, 255] {
            let source = format!("{}.", "+".repeat(n));
            let (_, output) = run(&source, &[]);
            assert_eq!(output, [n as u8]);
        }
    }

    #[test]
    fn cell_wraps_modulo_256() {
        let source = format!("{}.", "+".repeat(300));
        let (_, output) = run(&source, &[]);
        assert_eq!(output, [44]);
    }

    #[test]
    fn cell_wraps_under_zero() {
        let (_, output) = run("-.", &[]);
        assert_eq!(output, [255]);
    }

    #[test]
    fn clear_loop_fires_regardless_of_magnitude() {
        let (_, output) = run("+++[-].", &[]);
        assert_eq!(output, [0]);
    }

    #[test]
    fn move_loop_transfers_whole_cell() {
        let (state, _) = run("+++++[->+<]", &[]);
        assert_eq!(state.cells[0].0, 0);
        assert_eq!(state.cells[1].0, 5);
        assert_eq!(state.pointer, 0);
    }

    #[test]
    fn move_loop_on_zero_cell_does_nothing() {
        let (state, _) = run("[->+<]", &[]);
        assert_eq!(state.cells[0].0, 0);
        assert_eq!(state.cells[1].0, 0);
    }

    #[test]
    fn move_loop_adds_into_nonzero_target() {
        // Target already holds 2; source holds 3.
        let (state, _) = run(">++<+++[->+<]", &[]);
        assert_eq!(state.cells[0].0, 0);
        assert_eq!(state.cells[1].0, 5);
    }

    #[test]
    fn scan_loop_finds_nearest_zero() {
        // Cells 0..3 nonzero, cell 3 zero; [>] stops there.
        let (state, _) = run("+>+>+<<[>]", &[]);
        assert_eq!(state.pointer, 3);
    }

    #[test]
    fn scan_loop_with_stride_two() {
        // Cells 0 and 2 nonzero; scanning by 2 skips the zero at 1.
        let (state, _) = run("+>>+<<[>>]", &[]);
        assert_eq!(state.pointer, 4);
    }

    #[test]
    fn reads_store_fresh_bytes() {
        let (state, _) = run(",,,", b"abc");
        assert_eq!(state.cells[0].0, b'c');
    }

    #[test]
    fn read_echoes_through_output() {
        let (_, output) = run(",.>,.", b"hi");
        assert_eq!(output, b"hi");
    }

    #[test]
    fn repeated_output_emits_same_byte() {
        let (_, output) = run("++...", &[]);
        assert_eq!(output, [2, 2, 2]);
    }

    #[test]
    fn unoptimized_loop_counts_down() {
        // [>+<-] is the operand order the move-loop pattern also
        // covers; force the generic jump path with empty flags.
        let ops = translate(&parse("+++++[>+<-]"), OptimisationsFlags::empty()).unwrap();
        let mut state = ExecutionState::new();
        let mut output = Vec::new();
        execute(&ops, &mut state, &mut &b""[..], &mut output, u64::MAX).unwrap();
        assert_eq!(state.cells[0].0, 0);
        assert_eq!(state.cells[1].0, 5);
    }

    #[test]
    fn read_at_eof_is_an_error() {
        let ops = translate(&parse(","), OptimisationsFlags::all()).unwrap();
        let mut state = ExecutionState::new();
        let mut output = Vec::new();
        let err = execute(&ops, &mut state, &mut &b""[..], &mut output, u64::MAX).unwrap_err();
        match err {
            RuntimeError::Read(_) => {}
            other => panic!("expected a read error, got {:?}", other),
        }
    }

    #[test]
    fn pointer_escapes_left() {
        let ops = translate(&parse("<"), OptimisationsFlags::all()).unwrap();
        let mut state = ExecutionState::new();
        let mut output = Vec::new();
        let err = execute(&ops, &mut state, &mut &b""[..], &mut output, u64::MAX).unwrap_err();
        match err {
            RuntimeError::PointerOutOfRange { pc: 0, pointer: -1 } => {}
            other => panic!("expected a pointer trap, got {:?}", other),
        }
    }

    #[test]
    fn pointer_escapes_right() {
        let source = ">".repeat(TAPE_SIZE);
        let ops = translate(&parse(&source), OptimisationsFlags::all()).unwrap();
        let mut state = ExecutionState::new();
        let mut output = Vec::new();
        let err = execute(&ops, &mut state, &mut &b""[..], &mut output, u64::MAX).unwrap_err();
        match err {
            RuntimeError::PointerOutOfRange { .. } => {}
            other => panic!("expected a pointer trap, got {:?}", other),
        }
    }

    #[test]
    fn unresolved_jump_is_internal_error() {
        // A leaked placeholder can only come from a translator bug;
        // the VM refuses to follow it.
        let ops = [Op::JumpIfZero(crate::bytecode::UNRESOLVED_JUMP)];
        let mut state = ExecutionState::new();
        let mut output = Vec::new();
        let err = execute(&ops, &mut state, &mut &b""[..], &mut output, u64::MAX).unwrap_err();
        match err {
            RuntimeError::InternalConsistency { pc: 0, .. } => {}
            other => panic!("expected an internal-consistency error, got {:?}", other),
        }
    }

    #[test]
    fn step_limit_stops_divergent_program() {
        let ops = translate(&parse("+[]"), OptimisationsFlags::all()).unwrap();
        let mut state = ExecutionState::new();
        let mut output = Vec::new();
        let halt = execute(&ops, &mut state, &mut &b""[..], &mut output, 1_000).unwrap();
        assert_eq!(halt, Halt::StepLimitReached);
    }
}
