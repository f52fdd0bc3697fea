//! OxideChess - Perft
//!
//! Leaf counts of the legal move tree. Generation is pseudo-legal and
//! illegal moves are rejected by `make_move`, the same path the search
//! takes, so a matching count checks both halves together.

use crate::board::Board;
use crate::chess_move::{Move, ScoredMove};
use crate::move_generator::MoveGenerator;
use crate::tables::Tables;

/// Number of legal move sequences of length `depth`
pub fn perft(board: &mut Board, tables: &Tables, depth: u32) -> u64 {
    if depth == 0 {
        return 1;
    }

    let mut moves = Vec::with_capacity(64);
    MoveGenerator::new(tables).generate_moves(board, &mut moves);
    count(board, tables, &moves, depth)
}

/// Per root move counts, in generation order
pub fn divide(board: &mut Board, tables: &Tables, depth: u32) -> Vec<(Move, u64)> {
    let mut moves = Vec::with_capacity(64);
    MoveGenerator::new(tables).generate_moves(board, &mut moves);

    let mut split = Vec::with_capacity(moves.len());
    for sm in moves {
        if let Some(undo) = board.make_move(sm.mv, tables) {
            let nodes = perft(board, tables, depth.saturating_sub(1));
            board.unmake_move(sm.mv, &undo);
            split.push((sm.mv, nodes));
        }
    }
    split
}

fn count(board: &mut Board, tables: &Tables, moves: &[ScoredMove], depth: u32) -> u64 {
    let mut nodes = 0;
    for sm in moves {
        if let Some(undo) = board.make_move(sm.mv, tables) {
            nodes += if depth == 1 { 1 } else { perft(board, tables, depth - 1) };
            board.unmake_move(sm.mv, &undo);
        }
    }
    nodes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::STARTING_FEN;

    #[test]
    fn start_position_shallow_counts() {
        let tables = Tables::new();
        let mut board = Board::from_fen(STARTING_FEN, &tables.zobrist).unwrap();
        assert_eq!(perft(&mut board, &tables, 0), 1);
        assert_eq!(perft(&mut board, &tables, 1), 20);
        assert_eq!(perft(&mut board, &tables, 2), 400);
        assert_eq!(perft(&mut board, &tables, 3), 8_902);
        assert_eq!(board, Board::startpos(&tables.zobrist));
    }

    #[test]
    fn divide_sums_to_perft() {
        let tables = Tables::new();
        let fen = "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1";
        let mut board = Board::from_fen(fen, &tables.zobrist).unwrap();
        let split = divide(&mut board, &tables, 2);
        assert_eq!(split.len(), 48);
        assert_eq!(split.iter().map(|(_, n)| n).sum::<u64>(), 2_039);
        assert_eq!(perft(&mut board, &tables, 2), 2_039);
    }
}
