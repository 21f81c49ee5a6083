//! Translating a source program into bytecode in one linear pass:
//! maximal runs of identical symbols fold into a single counted op,
//! and brackets resolve into direct jump targets through an explicit
//! stack of pending loop-open indices. Each time a loop closes, the
//! peephole optimizer gets a chance to replace the whole loop before
//! the jump pair is committed.

use crate::bytecode::{Op, UNRESOLVED_JUMP};
use crate::diagnostics::Position;
use crate::peephole::{optimize_loop, OptimisationsFlags};
use crate::source::{SourceProgram, SymbolKind};
use itertools::Itertools;
use std::fmt;

#[cfg(test)]
use pretty_assertions::assert_eq;

/// A loop-open without a matching loop-close, or the reverse. Carries
/// the raw-stream position of every offending bracket.
#[derive(Debug, PartialEq, Eq)]
pub struct UnmatchedBracketError {
    pub message: String,
    pub positions: Vec<Position>,
}

impl UnmatchedBracketError {
    fn unmatched_close(position: Position) -> Self {
        UnmatchedBracketError {
            message: "this ] has no matching [".to_owned(),
            positions: vec![position],
        }
    }

    fn unmatched_opens(positions: Vec<Position>) -> Self {
        UnmatchedBracketError {
            message: "this [ has no matching ]".to_owned(),
            positions,
        }
    }
}

impl fmt::Display for UnmatchedBracketError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let positions = self
            .positions
            .iter()
            .map(|position| position.to_string())
            .join(", ");
        write!(f, "{} (position {})", self.message, positions)
    }
}

/// Translate a source program into bytecode, or fail on unbalanced
/// brackets. The result upholds the jump invariant: every `JumpIfZero`
/// carries the index of its matching `JumpIfNotZero` and vice versa.
pub fn translate(
    program: &SourceProgram,
    flags: OptimisationsFlags,
) -> Result<Vec<Op>, UnmatchedBracketError> {
    let mut ops: Vec<Op> = Vec::new();
    // Pending loop-opens: bytecode index of the placeholder jump, plus
    // the source position for error reporting.
    let mut bracket_stack: Vec<(usize, Position)> = Vec::new();

    for (kind, group) in &program.symbols.iter().group_by(|symbol| symbol.kind) {
        match kind {
            SymbolKind::LoopOpen => {
                for symbol in group {
                    bracket_stack.push((ops.len(), symbol.position));
                    ops.push(Op::JumpIfZero(UNRESOLVED_JUMP));
                }
            }
            SymbolKind::LoopClose => {
                for symbol in group {
                    let (open_index, _) = bracket_stack
                        .pop()
                        .ok_or_else(|| UnmatchedBracketError::unmatched_close(symbol.position))?;

                    let replacement = optimize_loop(&ops[open_index + 1..], flags);
                    if replacement.is_empty() {
                        // Resolve the pair: the placeholder gets the
                        // index the closing jump is about to occupy.
                        ops[open_index] = Op::JumpIfZero(ops.len());
                        ops.push(Op::JumpIfNotZero(open_index));
                    } else {
                        // The optimizer swallowed the loop whole,
                        // pending jump included.
                        ops.truncate(open_index);
                        ops.extend(replacement);
                    }
                }
            }
            kind => {
                ops.push(fold_run(kind, group.count()));
            }
        }
    }

    if !bracket_stack.is_empty() {
        let positions = bracket_stack
            .into_iter()
            .map(|(_, position)| position)
            .collect();
        return Err(UnmatchedBracketError::unmatched_opens(positions));
    }

    Ok(ops)
}

/// Fold a maximal run of `count` identical non-bracket symbols into
/// one counted op. Runs of different symbols never merge.
fn fold_run(kind: SymbolKind, count: usize) -> Op {
    let n = count as isize;
    match kind {
        SymbolKind::MoveRight => Op::MovePointer(n),
        SymbolKind::MoveLeft => Op::MovePointer(-n),
        SymbolKind::Increment => Op::AdjustCell(n),
        SymbolKind::Decrement => Op::AdjustCell(-n),
        SymbolKind::Output => Op::WriteOutput(count),
        SymbolKind::Input => Op::ReadInput(count),
        SymbolKind::LoopOpen | SymbolKind::LoopClose => {
            unreachable!("brackets are handled before run folding")
        }
    }
}

#[cfg(test)]
fn translate_source(source: &str) -> Result<Vec<Op>, UnmatchedBracketError> {
    translate(&crate::source::parse(source), OptimisationsFlags::all())
}

#[test]
fn fold_identical_runs() {
    assert_eq!(
        translate_source("+++>>--<.").unwrap(),
        [
            Op::AdjustCell(3),
            Op::MovePointer(2),
            Op::AdjustCell(-2),
            Op::MovePointer(-1),
            Op::WriteOutput(1),
        ]
    );
}

#[test]
fn fold_never_merges_different_symbols() {
    // +- is two ops with opposite signs, not a net zero op.
    assert_eq!(
        translate_source("+-").unwrap(),
        [Op::AdjustCell(1), Op::AdjustCell(-1)]
    );
}

#[test]
fn fold_io_runs() {
    assert_eq!(
        translate_source("..,,,").unwrap(),
        [Op::WriteOutput(2), Op::ReadInput(3)]
    );
}

#[test]
fn resolve_jump_pair() {
    // [.] cannot be optimized, so the pair resolves to mutual indices.
    assert_eq!(
        translate_source("[.]").unwrap(),
        [Op::JumpIfZero(2), Op::WriteOutput(1), Op::JumpIfNotZero(0)]
    );
}

#[test]
fn resolve_nested_jumps() {
    assert_eq!(
        translate_source("[[.].]").unwrap(),
        [
            Op::JumpIfZero(5),
            Op::JumpIfZero(3),
            Op::WriteOutput(1),
            Op::JumpIfNotZero(1),
            Op::WriteOutput(1),
            Op::JumpIfNotZero(0),
        ]
    );
}

#[test]
fn empty_loop_keeps_jump_pair() {
    assert_eq!(
        translate_source("[]").unwrap(),
        [Op::JumpIfZero(1), Op::JumpIfNotZero(0)]
    );
}

#[test]
fn optimized_loop_replaces_pending_jump() {
    assert_eq!(
        translate_source("+[-]").unwrap(),
        [Op::AdjustCell(1), Op::ClearCell]
    );
}

#[test]
fn optimization_respects_flags() {
    assert_eq!(
        translate(&crate::source::parse("[-]"), OptimisationsFlags::empty()).unwrap(),
        [Op::JumpIfZero(2), Op::AdjustCell(-1), Op::JumpIfNotZero(0)]
    );
}

#[test]
fn unmatched_close_reports_position() {
    let err = translate_source("+]").unwrap_err();
    assert_eq!(err.positions, [Position::at(1)]);
}

#[test]
fn unmatched_open_reports_position() {
    let err = translate_source("[+").unwrap_err();
    assert_eq!(err.positions, [Position::at(0)]);
}

#[test]
fn unmatched_opens_report_every_position() {
    let err = translate_source("[[[").unwrap_err();
    assert_eq!(
        err.positions,
        [Position::at(0), Position::at(1), Position::at(2)]
    );
}

#[test]
fn unmatched_positions_count_commentary() {
    let err = translate_source("comment ]").unwrap_err();
    assert_eq!(err.positions, [Position::at(8)]);
}

#[test]
fn empty_source_is_empty_program() {
    assert_eq!(translate_source("no instructions here!").unwrap(), []);
}
