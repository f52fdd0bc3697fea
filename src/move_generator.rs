//! OxideChess - Move Generator Module
//!
//! Pseudo-legal generation from the attack tables. Moves are appended to a
//! caller-owned list so the search can reuse one arena for every ply;
//! legality (own king not left attacked) is settled by `Board::make_move`.

use crate::bitboard::{square_bb, squares, RANK_2, RANK_7};
use crate::board::Board;
use crate::chess_move::{Move, ScoredMove};
use crate::error::{EngineError, Result};
use crate::tables::Tables;
use crate::types::*;

/// Squares between king and rook that must be empty, white side
const KINGSIDE_GAP: u64 = 0x60;
const QUEENSIDE_GAP: u64 = 0x0E;

/// Move generator for chess positions
pub struct MoveGenerator<'a> {
    tables: &'a Tables,
}

impl<'a> MoveGenerator<'a> {
    pub fn new(tables: &'a Tables) -> Self {
        MoveGenerator { tables }
    }

    /// Append every pseudo-legal move for the side to move
    pub fn generate_moves(&self, board: &Board, list: &mut Vec<ScoredMove>) {
        let targets = !board.occupancy[board.side];
        self.generate_pawn_moves(board, list, false);
        self.generate_castling(board, list);
        self.generate_piece_moves(board, list, targets);
    }

    /// Append captures, capture-promotions and en passant only
    pub fn generate_captures(&self, board: &Board, list: &mut Vec<ScoredMove>) {
        let targets = board.occupancy[board.side ^ 1];
        self.generate_pawn_moves(board, list, true);
        self.generate_piece_moves(board, list, targets);
    }

    /// Generate all legal moves for the current position
    pub fn generate_legal_moves(&self, board: &Board) -> Vec<Move> {
        let mut pseudo_legal = Vec::with_capacity(64);
        self.generate_moves(board, &mut pseudo_legal);

        let mut scratch = board.clone();
        let mut legal_moves = Vec::with_capacity(pseudo_legal.len());
        for sm in pseudo_legal {
            if let Some(undo) = scratch.make_move(sm.mv, self.tables) {
                scratch.unmake_move(sm.mv, &undo);
                legal_moves.push(sm.mv);
            }
        }

        legal_moves
    }

    pub fn is_checkmate(&self, board: &Board) -> bool {
        board.in_check(&self.tables.attacks) && self.generate_legal_moves(board).is_empty()
    }

    pub fn is_stalemate(&self, board: &Board) -> bool {
        !board.in_check(&self.tables.attacks) && self.generate_legal_moves(board).is_empty()
    }

    /// Resolve UCI text like "e2e4" or "e7e8q" to a legal move
    pub fn parse_uci_move(&self, board: &Board, text: &str) -> Result<Move> {
        let text = text.trim().to_ascii_lowercase();
        let well_formed = (text.len() == 4 || text.len() == 5)
            && text.is_char_boundary(2)
            && parse_square(&text[0..2]).is_some()
            && text.is_char_boundary(4)
            && parse_square(&text[2..4]).is_some()
            && text[4..].chars().all(|c| "nbrq".contains(c));
        if !well_formed {
            return Err(EngineError::InvalidMove(text));
        }

        self.generate_legal_moves(board)
            .into_iter()
            .find(|mv| mv.to_uci() == text)
            .ok_or(EngineError::IllegalMove(text))
    }

    fn generate_pawn_moves(&self, board: &Board, list: &mut Vec<ScoredMove>, captures_only: bool) {
        let attacks = &self.tables.attacks;
        let side = board.side;
        let them = side ^ 1;
        let pawns = board.piece_bb(side, PAWN);
        let empty = !board.occupancy[BOTH];
        let enemy = board.occupancy[them];
        let (start_rank, last_rank) = if side == WHITE {
            (RANK_2, RANK_7)
        } else {
            (RANK_7, RANK_2)
        };

        for from in squares(pawns) {
            let forward = if side == WHITE { from + 8 } else { from - 8 };
            let captures = attacks.pawn(side, from) & enemy;

            if square_bb(from) & last_rank != 0 {
                for to in squares(captures) {
                    for flag in (Move::PROMO_CAPTURE_KNIGHT..=Move::PROMO_CAPTURE_QUEEN).rev() {
                        list.push(ScoredMove::new(Move::new(from, to, flag)));
                    }
                }
                if !captures_only && empty & square_bb(forward) != 0 {
                    for flag in (Move::PROMO_KNIGHT..=Move::PROMO_QUEEN).rev() {
                        list.push(ScoredMove::new(Move::new(from, forward, flag)));
                    }
                }
                continue;
            }

            for to in squares(captures) {
                list.push(ScoredMove::new(Move::new(from, to, Move::CAPTURE)));
            }
            if captures_only || empty & square_bb(forward) == 0 {
                continue;
            }
            list.push(ScoredMove::new(Move::new(from, forward, Move::QUIET)));
            if square_bb(from) & start_rank != 0 {
                let double = if side == WHITE { forward + 8 } else { forward - 8 };
                if empty & square_bb(double) != 0 {
                    list.push(ScoredMove::new(Move::new(from, double, Move::DOUBLE_PUSH)));
                }
            }
        }

        if let Some(ep) = board.en_passant_square {
            for from in squares(attacks.pawn(them, ep) & pawns) {
                list.push(ScoredMove::new(Move::new(from, ep, Move::EN_PASSANT)));
            }
        }
    }

    /// Castling needs the right, an empty gap and a king that neither
    /// starts on nor crosses an attacked square. The destination is left to
    /// the make-time legality check.
    fn generate_castling(&self, board: &Board, list: &mut Vec<ScoredMove>) {
        let attacks = &self.tables.attacks;
        let side = board.side;
        let them = side ^ 1;
        let shift = 56 * side;
        let king_sq = E1 + shift;
        let occupied = board.occupancy[BOTH];

        if board.castling_rights & kingside_right(side) != 0
            && occupied & (KINGSIDE_GAP << shift) == 0
            && !board.is_square_attacked(king_sq, them, attacks)
            && !board.is_square_attacked(king_sq + 1, them, attacks)
        {
            list.push(ScoredMove::new(Move::new(king_sq, G1 + shift, Move::KING_CASTLE)));
        }

        if board.castling_rights & queenside_right(side) != 0
            && occupied & (QUEENSIDE_GAP << shift) == 0
            && !board.is_square_attacked(king_sq, them, attacks)
            && !board.is_square_attacked(king_sq - 1, them, attacks)
        {
            list.push(ScoredMove::new(Move::new(king_sq, C1 + shift, Move::QUEEN_CASTLE)));
        }
    }

    /// Knight, slider and king moves onto `targets`
    fn generate_piece_moves(&self, board: &Board, list: &mut Vec<ScoredMove>, targets: u64) {
        let attacks = &self.tables.attacks;
        let side = board.side;
        let enemy = board.occupancy[side ^ 1];
        let occupied = board.occupancy[BOTH];

        for kind in [KNIGHT, BISHOP, ROOK, QUEEN, KING] {
            for from in squares(board.piece_bb(side, kind)) {
                let reach = match kind {
                    KNIGHT => attacks.knight(from),
                    BISHOP => attacks.bishop(from, occupied),
                    ROOK => attacks.rook(from, occupied),
                    QUEEN => attacks.queen(from, occupied),
                    _ => attacks.king(from),
                };
                for to in squares(reach & targets) {
                    let flag = if enemy & square_bb(to) != 0 {
                        Move::CAPTURE
                    } else {
                        Move::QUIET
                    };
                    list.push(ScoredMove::new(Move::new(from, to, flag)));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn setup(fen: &str) -> (Tables, Board) {
        let tables = Tables::new();
        let board = Board::from_fen(fen, &tables.zobrist).unwrap();
        (tables, board)
    }

    fn uci_list(moves: &[Move]) -> Vec<String> {
        let mut list: Vec<String> = moves.iter().map(|m| m.to_uci()).collect();
        list.sort();
        list
    }

    #[test]
    fn twenty_moves_from_start() {
        let (tables, board) = setup(STARTING_FEN);
        let generator = MoveGenerator::new(&tables);
        assert_eq!(generator.generate_legal_moves(&board).len(), 20);

        let mut captures = Vec::new();
        generator.generate_captures(&board, &mut captures);
        assert!(captures.is_empty());
    }

    #[test]
    fn promotions_come_in_fours() {
        let (tables, board) = setup("1n2k3/P7/8/8/8/8/8/4K3 w - - 0 1");
        let generator = MoveGenerator::new(&tables);
        let legal = uci_list(&generator.generate_legal_moves(&board));
        for promo in ["a7a8q", "a7a8r", "a7a8b", "a7a8n", "a7b8q", "a7b8r", "a7b8b", "a7b8n"] {
            assert!(legal.contains(&promo.to_string()), "missing {}", promo);
        }

        let mut captures = Vec::new();
        generator.generate_captures(&board, &mut captures);
        assert_eq!(captures.len(), 4);
        assert!(captures.iter().all(|sm| sm.mv.is_capture() && sm.mv.is_promotion()));
    }

    #[test]
    fn en_passant_is_generated_for_both_neighbours() {
        let (tables, board) = setup("4k3/8/8/2PpP3/8/8/8/4K3 w - d6 0 1");
        let generator = MoveGenerator::new(&tables);
        let mut captures = Vec::new();
        generator.generate_captures(&board, &mut captures);
        let ep: Vec<String> = captures
            .iter()
            .filter(|sm| sm.mv.is_en_passant())
            .map(|sm| sm.mv.to_uci())
            .collect();
        assert_eq!(ep.len(), 2);
        assert!(ep.contains(&"c5d6".to_string()) && ep.contains(&"e5d6".to_string()));
    }

    #[test]
    fn castling_through_attack_is_refused() {
        // black rook on f8 covers f1
        let (tables, board) = setup("4kr2/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let generator = MoveGenerator::new(&tables);
        let legal = uci_list(&generator.generate_legal_moves(&board));
        assert!(!legal.contains(&"e1g1".to_string()));
        assert!(legal.contains(&"e1c1".to_string()));
    }

    #[test]
    fn castling_out_of_check_is_refused() {
        let (tables, board) = setup("4r1k1/8/8/8/8/8/8/R3K2R w KQ - 0 1");
        let generator = MoveGenerator::new(&tables);
        let legal = uci_list(&generator.generate_legal_moves(&board));
        assert!(!legal.contains(&"e1g1".to_string()));
        assert!(!legal.contains(&"e1c1".to_string()));
    }

    #[test]
    fn mate_and_stalemate_detection() {
        let (tables, mate) = setup("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1");
        let generator = MoveGenerator::new(&tables);
        assert!(generator.is_checkmate(&mate));
        assert!(!generator.is_stalemate(&mate));

        let stale = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", &tables.zobrist).unwrap();
        assert!(generator.is_stalemate(&stale));
        assert!(!generator.is_checkmate(&stale));
    }

    #[test]
    fn uci_move_parsing() {
        let (tables, board) = setup(STARTING_FEN);
        let generator = MoveGenerator::new(&tables);
        let mv = generator.parse_uci_move(&board, "e2e4").unwrap();
        assert!(mv.is_double_push());
        assert_eq!(
            generator.parse_uci_move(&board, "e2e5"),
            Err(EngineError::IllegalMove("e2e5".to_string()))
        );
        assert_eq!(
            generator.parse_uci_move(&board, "zz"),
            Err(EngineError::InvalidMove("zz".to_string()))
        );
        assert!(matches!(
            generator.parse_uci_move(&board, "e2e4x"),
            Err(EngineError::InvalidMove(_))
        ));
    }
}
