#![warn(trivial_numeric_casts)]

//! bfvm is a bytecode translator, peephole optimizer, and virtual
//! machine for BF programs: source text is parsed into symbols,
//! translated into jump-resolved bytecode with run-length folding and
//! loop rewriting, and executed against a fixed tape of wrapping byte
//! cells.

pub use bytecode::Op;
pub use diagnostics::Position;
pub use execution::{execute, Cell, ExecutionState, Halt, RuntimeError, TAPE_SIZE};
pub use peephole::{optimize_loop, OptimisationsFlags};
pub use source::{parse, parse_from_reader, SourceProgram, Symbol, SymbolKind};
pub use translate::{translate, UnmatchedBracketError};

mod bytecode;
mod diagnostics;
mod execution;
mod peephole;
mod source;
mod translate;
