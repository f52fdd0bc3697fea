//! OxideChess - Board Representation Module
//!
//! Twelve piece bitboards, three occupancy sets and a square-to-piece
//! mailbox, kept in agreement with each other and with an incrementally
//! updated Zobrist hash. Moves are applied and reverted in place.

use crate::bitboard::{lsb, square_bb, AttackTables, RANK_1, RANK_8};
use crate::chess_move::Move;
use crate::error::{EngineError, Result};
use crate::tables::Tables;
use crate::types::*;
use crate::zobrist::ZobristKeys;

/// Castling rights surviving a move that touches each square. A move is
/// applied as `rights &= CASTLING_UPDATE[from] & CASTLING_UPDATE[to]`.
#[rustfmt::skip]
const CASTLING_UPDATE: [u8; 64] = [
    13, 15, 15, 15, 12, 15, 15, 14,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
    15, 15, 15, 15, 15, 15, 15, 15,
     7, 15, 15, 15,  3, 15, 15, 11,
];

/// Snapshot needed to revert a move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UndoInfo {
    pub captured: u8,
    pub castling_rights: u8,
    pub en_passant_square: Option<usize>,
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    pub hash: u64,
}

/// Chess board representation
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Board {
    /// One bitboard per piece code
    pub pieces: [u64; 12],
    /// White, black and combined occupancy
    pub occupancy: [u64; 3],
    /// Piece code per square (0=a1, 1=b1, ..., 63=h8), EMPTY if vacant
    pub squares: [u8; 64],
    pub side: usize,
    /// Bitmask for castling rights (1=K, 2=Q, 4=k, 8=q)
    pub castling_rights: u8,
    pub en_passant_square: Option<usize>,
    /// Plies since the last pawn move or capture
    pub halfmove_clock: u16,
    pub fullmove_number: u16,
    pub hash: u64,
    /// Hashes of every earlier position in the game and current search line
    pub history: Vec<u64>,
}

impl Board {
    fn empty() -> Self {
        Board {
            pieces: [0; 12],
            occupancy: [0; 3],
            squares: [EMPTY; 64],
            side: WHITE,
            castling_rights: 0,
            en_passant_square: None,
            halfmove_clock: 0,
            fullmove_number: 1,
            hash: 0,
            history: Vec::with_capacity(1024),
        }
    }

    /// The standard starting position
    pub fn startpos(keys: &ZobristKeys) -> Self {
        Board::from_fen(STARTING_FEN, keys).expect("STARTING_FEN is well-formed")
    }

    /// Create a board from a FEN string. The halfmove clock and fullmove
    /// number may be omitted and default to 0 and 1.
    pub fn from_fen(fen: &str, keys: &ZobristKeys) -> Result<Self> {
        let parts: Vec<&str> = fen.split_whitespace().collect();
        if parts.len() < 4 || parts.len() > 6 {
            return Err(EngineError::fen(fen, "expected 4 to 6 fields"));
        }

        let mut board = Board::empty();

        // Piece placement
        let ranks: Vec<&str> = parts[0].split('/').collect();
        if ranks.len() != 8 {
            return Err(EngineError::fen(fen, "placement must have 8 ranks"));
        }
        for (i, rank_text) in ranks.iter().enumerate() {
            let rank = 7 - i;
            let mut file = 0usize;
            for c in rank_text.chars() {
                if let Some(skip) = c.to_digit(10) {
                    if !(1..=8).contains(&skip) {
                        return Err(EngineError::fen(fen, format!("bad empty count '{}'", c)));
                    }
                    file += skip as usize;
                } else if let Some(piece) = fen_to_piece(c) {
                    if file >= 8 {
                        return Err(EngineError::fen(fen, format!("rank {} overflows", rank + 1)));
                    }
                    board.put_piece(piece, rank * 8 + file);
                    file += 1;
                } else {
                    return Err(EngineError::fen(fen, format!("unknown piece '{}'", c)));
                }
            }
            if file != 8 {
                return Err(EngineError::fen(fen, format!("rank {} does not cover 8 files", rank + 1)));
            }
        }
        for side in [WHITE, BLACK] {
            if board.pieces[make_piece(side, KING) as usize].count_ones() != 1 {
                return Err(EngineError::fen(fen, "each side needs exactly one king"));
            }
        }
        if (board.pieces[WHITE_PAWN as usize] | board.pieces[BLACK_PAWN as usize])
            & (RANK_1 | RANK_8)
            != 0
        {
            return Err(EngineError::fen(fen, "pawn on first or last rank"));
        }

        // Active color
        board.side = match parts[1] {
            "w" => WHITE,
            "b" => BLACK,
            other => return Err(EngineError::fen(fen, format!("bad side to move '{}'", other))),
        };

        // Castling rights, only accepted with king and rook on their home squares
        if parts[2] != "-" {
            for c in parts[2].chars() {
                let (right, king_sq, rook_sq, rook) = match c {
                    'K' => (CASTLE_WK, E1, H1, WHITE_ROOK),
                    'Q' => (CASTLE_WQ, E1, A1, WHITE_ROOK),
                    'k' => (CASTLE_BK, E8, H8, BLACK_ROOK),
                    'q' => (CASTLE_BQ, E8, A8, BLACK_ROOK),
                    _ => return Err(EngineError::fen(fen, format!("bad castling flag '{}'", c))),
                };
                let king = make_piece(piece_color(rook), KING);
                if board.squares[king_sq] != king || board.squares[rook_sq] != rook {
                    return Err(EngineError::fen(
                        fen,
                        format!("castling right '{}' without king and rook at home", c),
                    ));
                }
                board.castling_rights |= right;
            }
        }

        // En passant square
        if parts[3] != "-" {
            let sq = parse_square(parts[3])
                .ok_or_else(|| EngineError::fen(fen, format!("bad en passant square '{}'", parts[3])))?;
            let expected_rank = if board.side == WHITE { 5 } else { 2 };
            if sq / 8 != expected_rank {
                return Err(EngineError::fen(fen, "en passant square on the wrong rank"));
            }
            board.en_passant_square = Some(sq);
        }

        if let Some(text) = parts.get(4) {
            board.halfmove_clock = text
                .parse()
                .map_err(|_| EngineError::fen(fen, format!("bad halfmove clock '{}'", text)))?;
        }
        if let Some(text) = parts.get(5) {
            board.fullmove_number = text
                .parse()
                .map_err(|_| EngineError::fen(fen, format!("bad fullmove number '{}'", text)))?;
        }

        board.hash = board.compute_hash(keys);
        Ok(board)
    }

    /// Generate FEN string from current board state
    pub fn to_fen(&self) -> String {
        let mut fen = String::new();

        for rank in (0..8).rev() {
            let mut empty_count = 0;
            for file in 0..8 {
                let piece = self.squares[rank * 8 + file];
                if piece == EMPTY {
                    empty_count += 1;
                } else {
                    if empty_count > 0 {
                        fen.push_str(&empty_count.to_string());
                        empty_count = 0;
                    }
                    if let Some(c) = piece_to_fen(piece) {
                        fen.push(c);
                    }
                }
            }
            if empty_count > 0 {
                fen.push_str(&empty_count.to_string());
            }
            if rank > 0 {
                fen.push('/');
            }
        }

        fen.push(' ');
        fen.push(if self.side == WHITE { 'w' } else { 'b' });

        fen.push(' ');
        if self.castling_rights == 0 {
            fen.push('-');
        } else {
            for (right, c) in [(CASTLE_WK, 'K'), (CASTLE_WQ, 'Q'), (CASTLE_BK, 'k'), (CASTLE_BQ, 'q')] {
                if self.castling_rights & right != 0 {
                    fen.push(c);
                }
            }
        }

        fen.push(' ');
        match self.en_passant_square {
            Some(sq) => fen.push_str(&square_name(sq)),
            None => fen.push('-'),
        }

        fen.push_str(&format!(" {} {}", self.halfmove_clock, self.fullmove_number));
        fen
    }

    /// Hash of the current position computed from scratch
    pub fn compute_hash(&self, keys: &ZobristKeys) -> u64 {
        let mut hash = 0u64;
        for (sq, &piece) in self.squares.iter().enumerate() {
            hash ^= keys.piece(piece, sq);
        }
        hash ^= keys.castling(self.castling_rights);
        if let Some(ep) = self.en_passant_square {
            hash ^= keys.en_passant(ep);
        }
        if self.side == BLACK {
            hash ^= keys.side();
        }
        hash
    }

    fn put_piece(&mut self, piece: u8, sq: usize) {
        self.toggle(piece, square_bb(sq));
        self.squares[sq] = piece;
    }

    /// Flip `mask` in a piece bitboard and the matching occupancy sets
    #[inline]
    fn toggle(&mut self, piece: u8, mask: u64) {
        self.pieces[piece as usize] ^= mask;
        self.occupancy[piece_color(piece)] ^= mask;
        self.occupancy[BOTH] ^= mask;
    }

    #[inline]
    fn relocate(&mut self, piece: u8, from: usize, to: usize) {
        self.toggle(piece, square_bb(from) | square_bb(to));
        self.squares[from] = EMPTY;
        self.squares[to] = piece;
    }

    /// Rook origin and destination for a castling move by `side`
    #[inline]
    fn castling_rook_squares(flag: u16, side: usize) -> (usize, usize) {
        let offset = 56 * side;
        if flag == Move::KING_CASTLE {
            (H1 + offset, F1 + offset)
        } else {
            (A1 + offset, D1 + offset)
        }
    }

    /// Apply a pseudo-legal move. If it leaves the mover's king attacked the
    /// board is restored and `None` is returned.
    pub fn make_move(&mut self, mv: Move, tables: &Tables) -> Option<UndoInfo> {
        let keys = &tables.zobrist;
        let side = self.side;
        let them = side ^ 1;
        let from = mv.from();
        let to = mv.to();
        let flag = mv.flag();
        let moved = self.squares[from];
        let captured = if mv.is_en_passant() { EMPTY } else { self.squares[to] };

        let undo = UndoInfo {
            captured,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
        };
        self.history.push(self.hash);

        let mut hash = self.hash;

        if captured != EMPTY {
            self.toggle(captured, square_bb(to));
            hash ^= keys.piece(captured, to);
        }

        self.relocate(moved, from, to);
        hash ^= keys.piece(moved, from) ^ keys.piece(moved, to);

        if flag == Move::EN_PASSANT {
            let victim_sq = if side == WHITE { to - 8 } else { to + 8 };
            let victim = make_piece(them, PAWN);
            self.toggle(victim, square_bb(victim_sq));
            self.squares[victim_sq] = EMPTY;
            hash ^= keys.piece(victim, victim_sq);
        }

        if let Some(kind) = mv.promotion_kind() {
            let promoted = make_piece(side, kind);
            self.pieces[moved as usize] ^= square_bb(to);
            self.pieces[promoted as usize] ^= square_bb(to);
            self.squares[to] = promoted;
            hash ^= keys.piece(moved, to) ^ keys.piece(promoted, to);
        }

        if mv.is_castle() {
            let (rook_from, rook_to) = Self::castling_rook_squares(flag, side);
            let rook = make_piece(side, ROOK);
            self.relocate(rook, rook_from, rook_to);
            hash ^= keys.piece(rook, rook_from) ^ keys.piece(rook, rook_to);
        }

        if let Some(ep) = self.en_passant_square {
            hash ^= keys.en_passant(ep);
        }
        self.en_passant_square = None;
        if flag == Move::DOUBLE_PUSH {
            let ep = if side == WHITE { from + 8 } else { from - 8 };
            self.en_passant_square = Some(ep);
            hash ^= keys.en_passant(ep);
        }

        hash ^= keys.castling(self.castling_rights);
        self.castling_rights &= CASTLING_UPDATE[from] & CASTLING_UPDATE[to];
        hash ^= keys.castling(self.castling_rights);

        if mv.is_capture() || piece_type(moved) == PAWN {
            self.halfmove_clock = 0;
        } else {
            // counters stick at the top instead of wrapping past u16::MAX
            self.halfmove_clock = self.halfmove_clock.saturating_add(1);
        }

        if side == BLACK {
            self.fullmove_number = self.fullmove_number.saturating_add(1);
        }
        self.side = them;
        hash ^= keys.side();
        self.hash = hash;

        if self.is_square_attacked(self.king_square(side), them, &tables.attacks) {
            self.unmake_move(mv, &undo);
            return None;
        }

        Some(undo)
    }

    /// Revert a move applied by `make_move`
    pub fn unmake_move(&mut self, mv: Move, undo: &UndoInfo) {
        self.side ^= 1;
        let side = self.side;
        let from = mv.from();
        let to = mv.to();

        if let Some(kind) = mv.promotion_kind() {
            let pawn = make_piece(side, PAWN);
            self.pieces[make_piece(side, kind) as usize] ^= square_bb(to);
            self.pieces[pawn as usize] ^= square_bb(to);
            self.squares[to] = pawn;
        }

        let moved = self.squares[to];
        self.relocate(moved, to, from);

        if undo.captured != EMPTY {
            self.put_piece(undo.captured, to);
        }

        if mv.is_en_passant() {
            let victim_sq = if side == WHITE { to - 8 } else { to + 8 };
            self.put_piece(make_piece(side ^ 1, PAWN), victim_sq);
        }

        if mv.is_castle() {
            let (rook_from, rook_to) = Self::castling_rook_squares(mv.flag(), side);
            self.relocate(make_piece(side, ROOK), rook_to, rook_from);
        }

        self.castling_rights = undo.castling_rights;
        self.en_passant_square = undo.en_passant_square;
        self.halfmove_clock = undo.halfmove_clock;
        self.fullmove_number = undo.fullmove_number;
        self.hash = undo.hash;
        self.history.pop();
    }

    /// Pass the turn without moving a piece
    pub fn make_null_move(&mut self, keys: &ZobristKeys) -> UndoInfo {
        let undo = UndoInfo {
            captured: EMPTY,
            castling_rights: self.castling_rights,
            en_passant_square: self.en_passant_square,
            halfmove_clock: self.halfmove_clock,
            fullmove_number: self.fullmove_number,
            hash: self.hash,
        };
        self.history.push(self.hash);

        if let Some(ep) = self.en_passant_square.take() {
            self.hash ^= keys.en_passant(ep);
        }
        self.hash ^= keys.side();
        self.side ^= 1;

        undo
    }

    pub fn unmake_null_move(&mut self, undo: &UndoInfo) {
        self.side ^= 1;
        self.en_passant_square = undo.en_passant_square;
        self.hash = undo.hash;
        self.history.pop();
    }

    #[inline]
    pub fn piece_bb(&self, side: usize, kind: usize) -> u64 {
        self.pieces[make_piece(side, kind) as usize]
    }

    #[inline]
    pub fn king_square(&self, side: usize) -> usize {
        lsb(self.piece_bb(side, KING))
    }

    /// Is `sq` attacked by any piece of `by`, given the board's occupancy
    #[inline]
    pub fn is_square_attacked(&self, sq: usize, by: usize, attacks: &AttackTables) -> bool {
        self.is_square_attacked_with(sq, by, self.occupancy[BOTH], attacks)
    }

    /// Same as `is_square_attacked`, but sliders see `occupied` as blockers
    pub fn is_square_attacked_with(
        &self,
        sq: usize,
        by: usize,
        occupied: u64,
        attacks: &AttackTables,
    ) -> bool {
        if attacks.king(sq) & self.piece_bb(by, KING) != 0 {
            return true;
        }
        if attacks.knight(sq) & self.piece_bb(by, KNIGHT) != 0 {
            return true;
        }
        if attacks.pawn(by ^ 1, sq) & self.piece_bb(by, PAWN) != 0 {
            return true;
        }
        let queens = self.piece_bb(by, QUEEN);
        if attacks.bishop(sq, occupied) & (self.piece_bb(by, BISHOP) | queens) != 0 {
            return true;
        }
        attacks.rook(sq, occupied) & (self.piece_bb(by, ROOK) | queens) != 0
    }

    #[inline]
    pub fn in_check(&self, attacks: &AttackTables) -> bool {
        self.is_square_attacked(self.king_square(self.side), self.side ^ 1, attacks)
    }

    /// Anything besides king and pawns for the given side
    pub fn has_non_pawn_material(&self, side: usize) -> bool {
        self.occupancy[side] & !(self.piece_bb(side, PAWN) | self.piece_bb(side, KING)) != 0
    }

    pub fn is_fifty_move_draw(&self) -> bool {
        self.halfmove_clock >= 100
    }

    /// Current position already occurred since the last irreversible move.
    /// Only positions with the same side to move are compared.
    pub fn is_repetition(&self) -> bool {
        self.earlier_occurrences().next().is_some()
    }

    /// How many times the current position has occurred, this one included
    pub fn repetition_count(&self) -> usize {
        1 + self.earlier_occurrences().count()
    }

    fn earlier_occurrences(&self) -> impl Iterator<Item = &u64> + '_ {
        let window = (self.halfmove_clock as usize).min(self.history.len());
        let start = self.history.len() - window;
        self.history[start..]
            .iter()
            .rev()
            .skip(1)
            .step_by(2)
            .filter(move |&&h| h == self.hash)
    }

    pub fn is_draw(&self) -> bool {
        self.is_fifty_move_draw() || self.is_repetition()
    }

    /// Display the board as a string
    pub fn display(&self) -> String {
        let mut lines = Vec::new();
        lines.push("  +---+---+---+---+---+---+---+---+".to_string());

        for rank in (0..8).rev() {
            let mut row = format!("{} |", rank + 1);
            for file in 0..8 {
                match piece_to_fen(self.squares[rank * 8 + file]) {
                    Some(c) => row.push_str(&format!(" {} |", c)),
                    None => row.push_str("   |"),
                }
            }
            lines.push(row);
            lines.push("  +---+---+---+---+---+---+---+---+".to_string());
        }
        lines.push("    a   b   c   d   e   f   g   h".to_string());
        lines.push(String::new());
        lines.push(format!("Fen: {}", self.to_fen()));
        lines.push(format!("Key: {:016X}", self.hash));

        lines.join("\n")
    }
}

impl std::fmt::Display for Board {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display())
    }
}
