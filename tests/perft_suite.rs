//! Leaf counts against the published reference values

mod common;

use common::{board_from_fen, positions, tables};
use oxide_chess::perft::{divide, perft};

fn check(fen: &str, expected: &[u64]) {
    let tables = tables();
    let mut board = board_from_fen(fen);
    let original = board.clone();

    for (i, &nodes) in expected.iter().enumerate() {
        let depth = i as u32 + 1;
        assert_eq!(perft(&mut board, &tables, depth), nodes, "{} at depth {}", fen, depth);
    }
    assert_eq!(board, original, "perft must leave the board untouched");
}

#[test]
fn start_position() {
    check(positions::STARTING, &[20, 400, 8_902, 197_281]);
}

#[test]
fn kiwipete() {
    check(positions::KIWIPETE, &[48, 2_039, 97_862]);
}

#[test]
fn rook_and_pawn_endgame() {
    check(positions::ENDGAME, &[14, 191, 2_812, 43_238]);
}

#[test]
fn promotions_and_castling_rights() {
    check(positions::PROMOTIONS, &[6, 264, 9_467]);
}

#[test]
fn discovered_checks_and_underpromotion() {
    check(positions::CHECKS, &[44, 1_486, 62_379]);
}

#[test]
fn divide_matches_perft() {
    let tables = tables();
    let mut board = board_from_fen(positions::ENDGAME);
    let split = divide(&mut board, &tables, 3);
    assert_eq!(split.len(), 14);
    assert_eq!(split.iter().map(|(_, n)| n).sum::<u64>(), 2_812);
}
