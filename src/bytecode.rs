//! The closed bytecode instruction set the translator emits and the
//! virtual machine dispatches on. Because `Op` is a closed enum, a
//! kind outside this set cannot exist at runtime; the reachable shape
//! of a translator defect is a jump target pointing outside the
//! program, which the VM reports as an internal-consistency error.

use std::fmt;

/// A single bytecode operation.
///
/// Jump targets hold the index of the *matching* jump: a `JumpIfZero`
/// at index `i` carries the index of its `JumpIfNotZero` and vice
/// versa. A taken jump lands on its partner and the program counter
/// then advances past it, so the pair behaves as "skip the loop" and
/// "restart the body".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    /// Move the pointer by a signed offset (a folded run of `>`/`<`).
    MovePointer(isize),
    /// Add a signed amount to the current cell, wrapping modulo 256
    /// (a folded run of `+`/`-`).
    AdjustCell(isize),
    /// Read one input byte into the current cell, `n` times. Every
    /// iteration consumes a fresh byte.
    ReadInput(usize),
    /// Write the current cell to output, `n` times.
    WriteOutput(usize),
    /// If the current cell is zero, jump to the matching `JumpIfNotZero`.
    JumpIfZero(usize),
    /// If the current cell is nonzero, jump back to the matching
    /// `JumpIfZero`.
    JumpIfNotZero(usize),
    /// Set the current cell to zero.
    ClearCell,
    /// Advance the pointer by the stride until the current cell is zero.
    ScanPointer(isize),
    /// Add the current cell's value to the cell at the offset and zero
    /// the current cell. No-op when the current cell is already zero.
    MoveCellAdd(isize),
}

/// Placeholder jump target used while a loop is still open. It can
/// never be a valid index, so a placeholder leaking out of the
/// translator trips the VM's bounds check instead of executing.
pub const UNRESOLVED_JUMP: usize = usize::MAX;

impl fmt::Display for Op {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match *self {
            Op::MovePointer(n) => write!(f, "move-pointer {}", n),
            Op::AdjustCell(n) => write!(f, "adjust-cell {}", n),
            Op::ReadInput(n) => write!(f, "read-input {}", n),
            Op::WriteOutput(n) => write!(f, "write-output {}", n),
            Op::JumpIfZero(target) => write!(f, "jump-if-zero {}", target),
            Op::JumpIfNotZero(target) => write!(f, "jump-if-not-zero {}", target),
            Op::ClearCell => write!(f, "clear-cell"),
            Op::ScanPointer(k) => write!(f, "scan-pointer {}", k),
            Op::MoveCellAdd(k) => write!(f, "move-cell-add {}", k),
        }
    }
}
