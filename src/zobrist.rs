//! OxideChess - Zobrist Keys
//!
//! A position hash is the XOR of one key per (piece, square) pair on the
//! board, the key for the current castling-rights mask, the en passant file
//! key when a target square exists, and the side key when Black is to move.

use crate::types::EMPTY;
use rand::prelude::*;

const DEFAULT_SEED: u64 = 12345;

pub struct ZobristKeys {
    piece_keys: [[u64; 64]; 12],
    castling_keys: [u64; 16],
    ep_keys: [u64; 8],
    side_key: u64,
}

impl ZobristKeys {
    pub fn new() -> Self {
        Self::with_seed(DEFAULT_SEED)
    }

    /// Keys drawn from a seeded generator, so a given seed always yields
    /// the same hashes.
    pub fn with_seed(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let mut piece_keys = [[0u64; 64]; 12];
        for piece in piece_keys.iter_mut() {
            for key in piece.iter_mut() {
                *key = rng.gen();
            }
        }

        let mut castling_keys = [0u64; 16];
        for key in castling_keys.iter_mut() {
            *key = rng.gen();
        }

        let mut ep_keys = [0u64; 8];
        for key in ep_keys.iter_mut() {
            *key = rng.gen();
        }

        let side_key = rng.gen();

        ZobristKeys {
            piece_keys,
            castling_keys,
            ep_keys,
            side_key,
        }
    }

    /// Key for a piece on a square; the empty marker hashes to zero.
    #[inline]
    pub fn piece(&self, piece: u8, sq: usize) -> u64 {
        if piece == EMPTY {
            0
        } else {
            self.piece_keys[piece as usize][sq]
        }
    }

    #[inline]
    pub fn castling(&self, rights: u8) -> u64 {
        self.castling_keys[(rights & 15) as usize]
    }

    /// En passant keys are per file.
    #[inline]
    pub fn en_passant(&self, sq: usize) -> u64 {
        self.ep_keys[sq & 7]
    }

    #[inline]
    pub fn side(&self) -> u64 {
        self.side_key
    }
}

impl Default for ZobristKeys {
    fn default() -> Self {
        ZobristKeys::new()
    }
}
