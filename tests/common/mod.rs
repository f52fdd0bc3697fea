//! Shared helpers for the integration tests

#![allow(dead_code)]

use oxide_chess::board::Board;
use oxide_chess::tables::Tables;
use std::sync::{Arc, OnceLock};

/// Tables are expensive to build; share one set per test binary
pub fn tables() -> Arc<Tables> {
    static TABLES: OnceLock<Arc<Tables>> = OnceLock::new();
    Arc::clone(TABLES.get_or_init(|| Arc::new(Tables::new())))
}

pub fn board_from_fen(fen: &str) -> Board {
    Board::from_fen(fen, &tables().zobrist).unwrap()
}

/// Standard test positions with known properties
pub mod positions {
    pub const STARTING: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
    pub const KIWIPETE: &str = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
    pub const ENDGAME: &str = "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1";
    pub const PROMOTIONS: &str = "r2q1rk1/pP1p2pp/Q4n2/bbp1p3/Np6/1B3NBn/pPPP1PPP/R3K2R b KQ - 0 1";
    pub const CHECKS: &str = "rnbq1k1r/pp1Pbppp/2p5/8/2B5/8/PPP1NnPP/RNBQK2R w KQ - 1 8";

    pub const MATE_IN_1: &str = "6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1"; // Ra8#
    pub const MATE_IN_2: &str = "7k/8/8/8/8/8/R7/1R5K w - - 0 1"; // rook ladder
    pub const STALEMATE: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
}
