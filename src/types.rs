//! OxideChess - Type definitions and constants
//!
//! Pieces are small integers laid out as `colour * 6 + kind`, so a piece
//! code indexes the per-piece bitboard array directly. Squares run from
//! a1 = 0 to h8 = 63, rank-major.

/// Side constants, also used to index occupancy arrays
pub const WHITE: usize = 0;
pub const BLACK: usize = 1;
pub const BOTH: usize = 2;

/// Piece kinds
pub const PAWN: usize = 0;
pub const KNIGHT: usize = 1;
pub const BISHOP: usize = 2;
pub const ROOK: usize = 3;
pub const QUEEN: usize = 4;
pub const KING: usize = 5;

/// Complete piece codes
pub const WHITE_PAWN: u8 = 0;
pub const WHITE_KNIGHT: u8 = 1;
pub const WHITE_BISHOP: u8 = 2;
pub const WHITE_ROOK: u8 = 3;
pub const WHITE_QUEEN: u8 = 4;
pub const WHITE_KING: u8 = 5;

pub const BLACK_PAWN: u8 = 6;
pub const BLACK_KNIGHT: u8 = 7;
pub const BLACK_BISHOP: u8 = 8;
pub const BLACK_ROOK: u8 = 9;
pub const BLACK_QUEEN: u8 = 10;
pub const BLACK_KING: u8 = 11;

/// Marker for an empty mailbox square
pub const EMPTY: u8 = 12;

/// Castling rights bitmasks
pub const CASTLE_WK: u8 = 1;
pub const CASTLE_WQ: u8 = 2;
pub const CASTLE_BK: u8 = 4;
pub const CASTLE_BQ: u8 = 8;

/// Squares referenced by castling and en passant logic
pub const A1: usize = 0;
pub const C1: usize = 2;
pub const D1: usize = 3;
pub const E1: usize = 4;
pub const F1: usize = 5;
pub const G1: usize = 6;
pub const H1: usize = 7;
pub const A8: usize = 56;
pub const E8: usize = 60;
pub const H8: usize = 63;

/// File and rank names for UCI notation
pub const FILE_NAMES: &[u8; 8] = b"abcdefgh";
pub const RANK_NAMES: &[u8; 8] = b"12345678";

pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Build a piece code from side and kind
#[inline]
pub const fn make_piece(color: usize, kind: usize) -> u8 {
    (color * 6 + kind) as u8
}

/// Extract piece kind from piece code
#[inline]
pub const fn piece_type(piece: u8) -> usize {
    piece as usize % 6
}

/// Extract side from piece code
#[inline]
pub const fn piece_color(piece: u8) -> usize {
    piece as usize / 6
}

/// Kingside castling right for a side
#[inline]
pub const fn kingside_right(side: usize) -> u8 {
    1 << (2 * side)
}

/// Queenside castling right for a side
#[inline]
pub const fn queenside_right(side: usize) -> u8 {
    1 << (2 * side + 1)
}

/// Convert square index (0-63) to algebraic notation (e.g., "e4")
pub fn square_name(sq: usize) -> String {
    format!(
        "{}{}",
        FILE_NAMES[sq % 8] as char,
        RANK_NAMES[sq / 8] as char
    )
}

/// Convert a two-character algebraic name to a square index
pub fn parse_square(name: &str) -> Option<usize> {
    let bytes = name.as_bytes();
    if bytes.len() != 2 {
        return None;
    }

    let file = match bytes[0] {
        b'a'..=b'h' => (bytes[0] - b'a') as usize,
        _ => return None,
    };
    let rank = match bytes[1] {
        b'1'..=b'8' => (bytes[1] - b'1') as usize,
        _ => return None,
    };

    Some(rank * 8 + file)
}

/// FEN piece character to piece code
pub fn fen_to_piece(c: char) -> Option<u8> {
    let kind = match c.to_ascii_lowercase() {
        'p' => PAWN,
        'n' => KNIGHT,
        'b' => BISHOP,
        'r' => ROOK,
        'q' => QUEEN,
        'k' => KING,
        _ => return None,
    };
    let color = if c.is_ascii_uppercase() { WHITE } else { BLACK };
    Some(make_piece(color, kind))
}

/// Piece code to FEN character
pub fn piece_to_fen(piece: u8) -> Option<char> {
    if piece >= EMPTY {
        return None;
    }
    let c = b"pnbrqk"[piece_type(piece)] as char;
    Some(if piece_color(piece) == WHITE {
        c.to_ascii_uppercase()
    } else {
        c
    })
}
