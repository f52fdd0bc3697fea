//! Immutable lookup data shared by every component of one engine instance.

use crate::bitboard::AttackTables;
use crate::zobrist::ZobristKeys;

/// Attack tables plus Zobrist keys. Built once; passed by reference to
/// board, generator and search code.
#[derive(Default)]
pub struct Tables {
    pub attacks: AttackTables,
    pub zobrist: ZobristKeys,
}

impl Tables {
    pub fn new() -> Self {
        Tables {
            attacks: AttackTables::new(),
            zobrist: ZobristKeys::new(),
        }
    }
}
