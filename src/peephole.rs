//! Peephole rewriting of whole loops. The translator hands us the
//! body of a loop that just closed (the ops between the jump pair,
//! excluding the jumps themselves) and we either return a replacement
//! that is observably equivalent for every starting state, or an empty
//! vec to tell the caller to resolve the jump pair as usual.
//!
//! Equivalence has to hold even when the loop would run zero times,
//! which is why `MoveCellAdd` is guarded on a nonzero cell at
//! execution time and why nothing here fires on bodies with reads,
//! writes, or inner loops.

use crate::bytecode::Op;
use bitflags::bitflags;

bitflags! {
    /// Which loop shapes the optimizer may rewrite. Tests and the
    /// `--no-optimize` CLI flag use subsets; everything else passes
    /// `all()`.
    pub struct OptimisationsFlags: u8 {
        const CLEAR_CELL = 1 << 0;
        const SCAN_POINTER = 1 << 1;
        const MOVE_CELL_ADD = 1 << 2;
    }
}

impl Default for OptimisationsFlags {
    fn default() -> Self {
        OptimisationsFlags::all()
    }
}

/// Try to rewrite one just-closed loop body. Returns the replacement
/// ops, or an empty vec if no rewrite applies.
pub fn optimize_loop(body: &[Op], flags: OptimisationsFlags) -> Vec<Op> {
    match *body {
        // [-], [+], and any other fixed nonzero step: stepping a cell
        // modulo 256 until it hits zero ends at zero, so the loop is an
        // unconditional clear.
        [Op::AdjustCell(n)] if n != 0 && flags.contains(OptimisationsFlags::CLEAR_CELL) => {
            vec![Op::ClearCell]
        }
        // [>], [<<], ...: scan along a fixed stride for the nearest
        // zero cell. Same scan, minus the jump-pair overhead per hop.
        [Op::MovePointer(k)] if k != 0 && flags.contains(OptimisationsFlags::SCAN_POINTER) => {
            vec![Op::ScanPointer(k)]
        }
        // [->+<] and friends: each iteration carries one unit from the
        // current cell to the cell at offset k, so the whole loop adds
        // the current cell's value there and zeroes the current cell.
        // Both operand orders the translator can emit are accepted; the
        // step must be exactly one and the strides exact opposites.
        [Op::AdjustCell(-1), Op::MovePointer(k), Op::AdjustCell(1), Op::MovePointer(back)]
        | [Op::MovePointer(k), Op::AdjustCell(1), Op::MovePointer(back), Op::AdjustCell(-1)]
            if k != 0 && back == -k && flags.contains(OptimisationsFlags::MOVE_CELL_ADD) =>
        {
            vec![Op::MoveCellAdd(k)]
        }
        _ => vec![],
    }
}
