//! OxideChess - UCI Chess Engine
//!
//! A bitboard chess engine core with support for:
//! - Magic bitboard attack tables
//! - Zobrist hashed positions with make/unmake and null moves
//! - Pseudo-legal move generation with make-time legality checks
//! - Principal variation search with iterative deepening
//! - Transposition table and evaluation cache
//! - Null move pruning, razoring, reverse futility, IID and LMR
//! - Tapered handcrafted evaluation behind the `Evaluator` trait
//! - UCI protocol
//!
//! Shared lookup data lives in [`tables::Tables`], built once and passed by
//! reference, so several engines can coexist in one process.

pub mod types;
pub mod error;
pub mod bitboard;
mod magics;
pub mod zobrist;
pub mod tables;
pub mod chess_move;
pub mod board;
pub mod move_generator;
pub mod ordering;
pub mod transposition;
pub mod evaluation;
pub mod time_manager;
pub mod search;
pub mod perft;
pub mod uci;

pub use board::Board;
pub use chess_move::Move;
pub use error::{EngineError, Result};
pub use tables::Tables;
