//! OxideChess - Move Ordering
//!
//! Scores are layered so that each class of move sorts strictly above the
//! next: principal-variation move, hash move, winning captures, queen
//! promotions, the two killers, losing captures and under-promotions, then
//! quiet moves by history. Selection is lazy; the search pulls the best
//! remaining move one at a time.

use crate::bitboard::square_bb;
use crate::bitboard::AttackTables;
use crate::board::Board;
use crate::chess_move::{Move, ScoredMove};
use crate::search::MAX_PLY;
use crate::types::*;

pub const SCORE_PV: i32 = 900_000_000;
pub const SCORE_HASH: i32 = 890_000_000;
pub const SCORE_CAPTURE: i32 = 850_000_000;
pub const SCORE_PROMOTE: i32 = 840_000_000;
pub const SCORE_KILLER1: i32 = 830_000_000;
pub const SCORE_KILLER2: i32 = 820_000_000;
pub const SCORE_LOSING_CAPTURE: i32 = 800_000_000;
pub const SCORE_UNDERPROMOTE: i32 = 800_000_000;
/// History scores stay below every other class.
pub const HISTORY_MAX: i32 = 800_000_000;

/// Coarse piece values used only for capture classification
const SIMPLE_VALUES: [i32; 6] = [100, 300, 300, 500, 900, 10_000];

/// Most valuable victim first, least valuable attacker as tie-break.
/// Indexed `[victim kind][attacker kind]`.
#[rustfmt::skip]
const MVV_LVA: [[i32; 6]; 6] = [
    [15, 14, 13, 12, 11, 10],
    [25, 24, 23, 22, 21, 20],
    [35, 34, 33, 32, 31, 30],
    [45, 44, 43, 42, 41, 40],
    [55, 54, 53, 52, 51, 50],
    [65, 64, 63, 62, 61, 60],
];

/// Killer and history state carried between nodes of one search
pub struct MoveOrderer {
    killers: [[Move; 2]; MAX_PLY],
    history: Box<[[[i32; 64]; 64]; 2]>,
}

impl MoveOrderer {
    pub fn new() -> Self {
        MoveOrderer {
            killers: [[Move::NULL; 2]; MAX_PLY],
            history: Box::new([[[0; 64]; 64]; 2]),
        }
    }

    pub fn clear(&mut self) {
        self.clear_killers();
        for table in self.history.iter_mut() {
            for row in table.iter_mut() {
                row.fill(0);
            }
        }
    }

    pub fn clear_killers(&mut self) {
        self.killers = [[Move::NULL; 2]; MAX_PLY];
    }

    /// Decay history so older searches weigh less (applied at search start)
    pub fn age_history(&mut self) {
        self.scale_history(3);
    }

    fn scale_history(&mut self, shift: u32) {
        for table in self.history.iter_mut() {
            for row in table.iter_mut() {
                for score in row.iter_mut() {
                    *score >>= shift;
                }
            }
        }
    }

    #[inline]
    pub fn is_killer(&self, mv: Move, ply: usize) -> bool {
        self.killers[ply][0] == mv || self.killers[ply][1] == mv
    }

    pub fn killers(&self, ply: usize) -> [Move; 2] {
        self.killers[ply]
    }

    pub fn history_score(&self, side: usize, mv: Move) -> i32 {
        self.history[side][mv.from()][mv.to()]
    }

    /// Record a quiet move that caused a beta cutoff
    pub fn record_cutoff(&mut self, side: usize, mv: Move, ply: usize, depth: i32) {
        if self.killers[ply][0] != mv {
            self.killers[ply][1] = self.killers[ply][0];
            self.killers[ply][0] = mv;
        }

        let entry = &mut self.history[side][mv.from()][mv.to()];
        *entry += depth.max(1);
        if *entry >= HISTORY_MAX {
            self.scale_history(1);
        }
    }

    /// Assign an ordering score to every move in `moves`
    pub fn score_moves(
        &self,
        board: &Board,
        attacks: &AttackTables,
        moves: &mut [ScoredMove],
        hash_move: Move,
        ply: usize,
    ) {
        let side = board.side;
        for sm in moves.iter_mut() {
            let mv = sm.mv;
            sm.score = if !hash_move.is_null() && mv == hash_move {
                SCORE_HASH
            } else if mv.is_capture() {
                let victim = if mv.is_en_passant() {
                    PAWN
                } else {
                    piece_type(board.squares[mv.to()])
                };
                let attacker = piece_type(board.squares[mv.from()]);
                let base = if is_good_capture(board, attacks, mv) {
                    SCORE_CAPTURE
                } else {
                    SCORE_LOSING_CAPTURE
                };
                base + MVV_LVA[victim][attacker]
            } else if mv.is_promotion() {
                if mv.promotion_kind() == Some(QUEEN) {
                    SCORE_PROMOTE
                } else {
                    SCORE_UNDERPROMOTE
                }
            } else if self.killers[ply][0] == mv {
                SCORE_KILLER1
            } else if self.killers[ply][1] == mv {
                SCORE_KILLER2
            } else {
                self.history[side][mv.from()][mv.to()]
            };
        }
    }
}

impl Default for MoveOrderer {
    fn default() -> Self {
        MoveOrderer::new()
    }
}

/// A capture is good unless the victim is worth less than the mover and the
/// destination stays defended once the mover has left its square.
pub fn is_good_capture(board: &Board, attacks: &AttackTables, mv: Move) -> bool {
    let attacker = piece_type(board.squares[mv.from()]);
    if attacker == PAWN || mv.is_en_passant() {
        return true;
    }
    let victim = piece_type(board.squares[mv.to()]);
    if SIMPLE_VALUES[victim] >= SIMPLE_VALUES[attacker] {
        return true;
    }
    let occupied = board.occupancy[BOTH] & !square_bb(mv.from());
    !board.is_square_attacked_with(mv.to(), board.side ^ 1, occupied, attacks)
}

/// Boost `pv_move` to the top if present. Returns whether it was found.
pub fn score_pv(moves: &mut [ScoredMove], pv_move: Move) -> bool {
    if pv_move.is_null() {
        return false;
    }
    match moves.iter_mut().find(|sm| sm.mv == pv_move) {
        Some(sm) => {
            sm.score = SCORE_PV;
            true
        }
        None => false,
    }
}

/// Swap the best-scored move of `moves[start..]` into `start` and return it
pub fn pick_move(moves: &mut [ScoredMove], start: usize) -> Option<Move> {
    let best = (start..moves.len()).max_by_key(|&i| (moves[i].score, std::cmp::Reverse(i)))?;
    moves.swap(start, best);
    Some(moves[start].mv)
}
