//! OxideChess - Position Evaluation Module
//!
//! Static evaluation behind the `Evaluator` trait. The classical evaluator
//! sums, separately for middlegame and endgame:
//! - Material and piece-square tables
//! - Pawn structure (doubled, isolated, passed pawns), from file fills
//! - Rooks on open and semi-open files
//! - Bishop pair and piece mobility
//!
//! and blends the two by the material left on the board. Scores are in
//! centipawns relative to the side to move.

use crate::bitboard::{east_one, north_one, south_one, squares, west_one};
use crate::board::Board;
use crate::tables::Tables;
use crate::types::*;
use std::ops::{AddAssign, SubAssign};
use std::sync::Arc;

/// Static evaluation seam used by the search
pub trait Evaluator: Send {
    /// Score of `board` for the side to move, far inside the mate bounds
    fn evaluate(&self, board: &Board) -> i32;
}

// ============================================================================
// PIECE VALUES
// ============================================================================

/// Middlegame material, indexed by piece kind
pub const MG_MATERIAL: [i32; 6] = [95, 300, 320, 460, 920, 0];
/// Endgame material, indexed by piece kind; also drives the phase blend
pub const EG_MATERIAL: [i32; 6] = [100, 280, 290, 500, 930, 0];

/// Total endgame material at or below which the endgame score is used alone
const EG_THRESHOLD: i32 = 2580;
/// Total endgame material at or above which the middlegame score is used alone
const MG_THRESHOLD: i32 = 5480;

// ============================================================================
// PIECE-SQUARE TABLES (white's view, a1 first)
// ============================================================================

#[rustfmt::skip]
const PAWN_PST: [i32; 64] = [
    0,   0,   0,   0,   0,   0,   0,   0,
    5,  10,  10, -20, -20,  10,  10,   5,
    5,  -5, -10,   0,   0, -10,  -5,   5,
    0,   0,   0,  20,  20,   0,   0,   0,
    5,   5,  10,  25,  25,  10,   5,   5,
   10,  10,  20,  30,  30,  20,  10,  10,
   50,  50,  50,  50,  50,  50,  50,  50,
    0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const KNIGHT_PST: [i32; 64] = [
   -50, -40, -30, -30, -30, -30, -40, -50,
   -40, -20,   0,   5,   5,   0, -20, -40,
   -30,   5,  10,  15,  15,  10,   5, -30,
   -30,   0,  15,  20,  20,  15,   0, -30,
   -30,   5,  15,  20,  20,  15,   5, -30,
   -30,   0,  10,  15,  15,  10,   0, -30,
   -40, -20,   0,   0,   0,   0, -20, -40,
   -50, -40, -30, -30, -30, -30, -40, -50,
];

#[rustfmt::skip]
const BISHOP_PST: [i32; 64] = [
   -20, -10, -10, -10, -10, -10, -10, -20,
   -10,   5,   0,   0,   0,   0,   5, -10,
   -10,  10,  10,  10,  10,  10,  10, -10,
   -10,   0,  10,  10,  10,  10,   0, -10,
   -10,   5,   5,  10,  10,   5,   5, -10,
   -10,   0,   5,  10,  10,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10, -10, -10, -10, -10, -20,
];

#[rustfmt::skip]
const ROOK_PST: [i32; 64] = [
    0,   0,   0,   5,   5,   0,   0,   0,
   -5,   0,   0,   0,   0,   0,   0,  -5,
   -5,   0,   0,   0,   0,   0,   0,  -5,
   -5,   0,   0,   0,   0,   0,   0,  -5,
   -5,   0,   0,   0,   0,   0,   0,  -5,
   -5,   0,   0,   0,   0,   0,   0,  -5,
    5,  10,  10,  10,  10,  10,  10,   5,
    0,   0,   0,   0,   0,   0,   0,   0,
];

#[rustfmt::skip]
const QUEEN_PST: [i32; 64] = [
   -20, -10, -10,  -5,  -5, -10, -10, -20,
   -10,   0,   5,   0,   0,   0,   0, -10,
   -10,   5,   5,   5,   5,   5,   0, -10,
     0,   0,   5,   5,   5,   5,   0,  -5,
    -5,   0,   5,   5,   5,   5,   0,  -5,
   -10,   0,   5,   5,   5,   5,   0, -10,
   -10,   0,   0,   0,   0,   0,   0, -10,
   -20, -10, -10,  -5,  -5, -10, -10, -20,
];

#[rustfmt::skip]
const KING_MIDDLEGAME_PST: [i32; 64] = [
    20,  30,  10,   0,   0,  10,  30,  20,
    20,  20,   0,   0,   0,   0,  20,  20,
   -10, -20, -20, -20, -20, -20, -20, -10,
   -20, -30, -30, -40, -40, -30, -30, -20,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
   -30, -40, -40, -50, -50, -40, -40, -30,
];

#[rustfmt::skip]
const KING_ENDGAME_PST: [i32; 64] = [
   -50, -30, -30, -30, -30, -30, -30, -50,
   -30, -30,   0,   0,   0,   0, -30, -30,
   -30, -10,  20,  30,  30,  20, -10, -30,
   -30, -10,  30,  40,  40,  30, -10, -30,
   -30, -10,  30,  40,  40,  30, -10, -30,
   -30, -10,  20,  30,  30,  20, -10, -30,
   -30, -20, -10,   0,   0, -10, -20, -30,
   -50, -40, -30, -20, -20, -30, -40, -50,
];

const MG_PST: [&[i32; 64]; 6] = [
    &PAWN_PST,
    &KNIGHT_PST,
    &BISHOP_PST,
    &ROOK_PST,
    &QUEEN_PST,
    &KING_MIDDLEGAME_PST,
];

const EG_PST: [&[i32; 64]; 6] = [
    &PAWN_PST,
    &KNIGHT_PST,
    &BISHOP_PST,
    &ROOK_PST,
    &QUEEN_PST,
    &KING_ENDGAME_PST,
];

// ============================================================================
// EVALUATION BONUSES/PENALTIES
// ============================================================================

const DOUBLED_PAWN_PENALTY: Score = Score::new(13, 18);
const ISOLATED_PAWN_PENALTY: Score = Score::new(15, 12);
/// Endgame bonus by relative rank
const PASSED_PAWN_BONUS: [i32; 8] = [0, 10, 20, 40, 60, 80, 100, 0];
const NO_PAWN_PENALTY: i32 = 150;

const ROOK_OPEN_FILE_BONUS: Score = Score::new(20, 20);
const ROOK_SEMI_OPEN_FILE_BONUS: Score = Score::new(12, 12);
const BISHOP_PAIR_BONUS: Score = Score::new(30, 50);

/// Per reachable square, indexed by piece kind
const MOBILITY_BONUS: [i32; 6] = [0, 4, 5, 3, 2, 0];

// ============================================================================
// HELPERS
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Score {
    mg: i32,
    eg: i32,
}

impl Score {
    const fn new(mg: i32, eg: i32) -> Self {
        Score { mg, eg }
    }

    fn times(self, n: u32) -> Self {
        Score::new(self.mg * n as i32, self.eg * n as i32)
    }
}

impl AddAssign for Score {
    fn add_assign(&mut self, other: Score) {
        self.mg += other.mg;
        self.eg += other.eg;
    }
}

impl SubAssign for Score {
    fn sub_assign(&mut self, other: Score) {
        self.mg -= other.mg;
        self.eg -= other.eg;
    }
}

fn north_fill(mut bb: u64) -> u64 {
    bb |= bb << 8;
    bb |= bb << 16;
    bb |= bb << 32;
    bb
}

fn south_fill(mut bb: u64) -> u64 {
    bb |= bb >> 8;
    bb |= bb >> 16;
    bb |= bb >> 32;
    bb
}

/// Every file holding at least one bit of `bb`
fn file_fill(bb: u64) -> u64 {
    north_fill(bb) | south_fill(bb)
}

/// Pawns with a friendly pawn somewhere behind them on the same file
fn doubled_pawns(pawns: u64, side: usize) -> u64 {
    if side == WHITE {
        pawns & north_one(north_fill(pawns))
    } else {
        pawns & south_one(south_fill(pawns))
    }
}

/// Pawns with no friendly pawn on either neighbouring file
fn isolated_pawns(pawns: u64) -> u64 {
    let files = file_fill(pawns);
    pawns & !(east_one(files) | west_one(files))
}

/// Pawns with no enemy pawn ahead on the same or a neighbouring file
fn passed_pawns(own: u64, enemy: u64, side: usize) -> u64 {
    let mut spans = if side == WHITE {
        south_one(south_fill(enemy))
    } else {
        north_one(north_fill(enemy))
    };
    spans |= east_one(spans) | west_one(spans);
    own & !spans
}

/// Linear blend between the middlegame and endgame scores
fn taper(mg: i32, eg: i32, material: i32) -> i32 {
    if material >= MG_THRESHOLD {
        mg
    } else if material <= EG_THRESHOLD {
        eg
    } else {
        (mg * (material - EG_THRESHOLD) + eg * (MG_THRESHOLD - material))
            / (MG_THRESHOLD - EG_THRESHOLD)
    }
}

// ============================================================================
// CLASSICAL EVALUATOR
// ============================================================================

pub struct ClassicalEvaluator {
    tables: Arc<Tables>,
}

impl ClassicalEvaluator {
    pub fn new(tables: Arc<Tables>) -> Self {
        ClassicalEvaluator { tables }
    }

    /// Terms for one side plus its endgame material
    fn side_terms(&self, board: &Board, side: usize) -> (Score, i32) {
        let attacks = &self.tables.attacks;
        let them = side ^ 1;
        let occupied = board.occupancy[BOTH];
        let own_pawns = board.piece_bb(side, PAWN);
        let enemy_pawns = board.piece_bb(them, PAWN);

        let mut score = Score::default();
        let mut material = 0;

        for kind in PAWN..=KING {
            for sq in squares(board.piece_bb(side, kind)) {
                let rel = if side == WHITE { sq } else { sq ^ 56 };
                material += EG_MATERIAL[kind];
                score.mg += MG_MATERIAL[kind] + MG_PST[kind][rel];
                score.eg += EG_MATERIAL[kind] + EG_PST[kind][rel];

                let reach = match kind {
                    KNIGHT => attacks.knight(sq),
                    BISHOP => attacks.bishop(sq, occupied),
                    ROOK => attacks.rook(sq, occupied),
                    QUEEN => attacks.queen(sq, occupied),
                    _ => 0,
                };
                let mobility = MOBILITY_BONUS[kind] * (reach & !board.occupancy[side]).count_ones() as i32;
                score.mg += mobility;
                score.eg += mobility;
            }
        }

        // Pawn structure
        score -= DOUBLED_PAWN_PENALTY.times(doubled_pawns(own_pawns, side).count_ones());
        score -= ISOLATED_PAWN_PENALTY.times(isolated_pawns(own_pawns).count_ones());
        for sq in squares(passed_pawns(own_pawns, enemy_pawns, side)) {
            let rank = if side == WHITE { sq / 8 } else { 7 - sq / 8 };
            score.eg += PASSED_PAWN_BONUS[rank];
        }
        if own_pawns == 0 {
            score.eg -= NO_PAWN_PENALTY;
        }

        // Rook files
        let rooks = board.piece_bb(side, ROOK);
        let open = !file_fill(own_pawns | enemy_pawns);
        let semi_open = !file_fill(own_pawns) & !open;
        score += ROOK_OPEN_FILE_BONUS.times((rooks & open).count_ones());
        score += ROOK_SEMI_OPEN_FILE_BONUS.times((rooks & semi_open).count_ones());

        if board.piece_bb(side, BISHOP).count_ones() >= 2 {
            score += BISHOP_PAIR_BONUS;
        }

        (score, material)
    }
}

impl Evaluator for ClassicalEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        let (white, white_material) = self.side_terms(board, WHITE);
        let (black, black_material) = self.side_terms(board, BLACK);

        let score = taper(
            white.mg - black.mg,
            white.eg - black.eg,
            white_material + black_material,
        );

        if board.side == WHITE {
            score
        } else {
            -score
        }
    }
}

/// Material-only evaluator, handy as a baseline
pub struct MaterialEvaluator;

impl Evaluator for MaterialEvaluator {
    fn evaluate(&self, board: &Board) -> i32 {
        let count = |side: usize| -> i32 {
            (PAWN..KING)
                .map(|kind| EG_MATERIAL[kind] * board.piece_bb(side, kind).count_ones() as i32)
                .sum()
        };
        let score = count(WHITE) - count(BLACK);
        if board.side == WHITE {
            score
        } else {
            -score
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::parse_square;

    fn bb(names: &[&str]) -> u64 {
        names
            .iter()
            .fold(0, |acc, n| acc | 1u64 << parse_square(n).unwrap())
    }

    fn eval(fen: &str) -> i32 {
        let tables = Arc::new(Tables::new());
        let board = Board::from_fen(fen, &tables.zobrist).unwrap();
        ClassicalEvaluator::new(tables).evaluate(&board)
    }

    #[test]
    fn start_position_is_balanced() {
        assert_eq!(eval(STARTING_FEN), 0);
    }

    #[test]
    fn score_is_relative_to_side_to_move() {
        let white = eval("4k3/8/8/8/3P4/8/8/4K3 w - - 0 1");
        let black = eval("4k3/8/8/8/3P4/8/8/4K3 b - - 0 1");
        assert!(white > 0);
        assert_eq!(white, -black);
    }

    #[test]
    fn mirrored_positions_score_the_same() {
        let a = eval("r3k2r/pp3ppp/2n5/3p4/3P4/2N5/PP3PPP/R3K2R w KQkq - 0 1");
        let b = eval("r3k2r/pp3ppp/2n5/3p4/3P4/2N5/PP3PPP/R3K2R b KQkq - 0 1");
        assert_eq!(a, b);
        let c = eval("4k3/1p6/8/8/8/8/6P1/4K3 w - - 0 1");
        let d = eval("4k3/6p1/8/8/8/8/1P6/4K3 b - - 0 1");
        assert_eq!(c, d);
    }

    #[test]
    fn pawn_structure_masks() {
        let pawns = bb(&["a2", "a3", "c2", "e4", "f5"]);
        assert_eq!(doubled_pawns(pawns, WHITE), bb(&["a3"]));
        assert_eq!(doubled_pawns(pawns, BLACK), bb(&["a2"]));
        assert_eq!(isolated_pawns(pawns), bb(&["a2", "a3", "c2"]));

        let enemy = bb(&["b4", "h7"]);
        assert_eq!(passed_pawns(pawns, enemy, WHITE), bb(&["e4", "f5"]));
        assert_eq!(passed_pawns(enemy, pawns, BLACK), bb(&["h7"]));
    }

    #[test]
    fn advanced_passer_is_worth_more() {
        let far = eval("4k3/8/1P6/8/8/8/8/4K3 w - - 0 1");
        let near = eval("4k3/8/8/8/8/1P6/8/4K3 w - - 0 1");
        assert!(far > near);
    }

    #[test]
    fn taper_blends_linearly() {
        assert_eq!(taper(100, 0, MG_THRESHOLD), 100);
        assert_eq!(taper(100, 0, EG_THRESHOLD), 0);
        let mid = (MG_THRESHOLD + EG_THRESHOLD) / 2;
        assert_eq!(taper(100, 0, mid), 50);
    }

    #[test]
    fn material_evaluator_counts_pieces() {
        let tables = Tables::new();
        let board = Board::from_fen("4k3/8/8/8/8/8/8/3QK3 b - - 0 1", &tables.zobrist).unwrap();
        assert_eq!(MaterialEvaluator.evaluate(&board), -EG_MATERIAL[QUEEN]);
    }
}
