//! OxideChess - Move encoding
//!
//! A move packs into 16 bits: origin square in bits 0-5, destination in
//! bits 6-11 and a 4-bit flag in bits 12-15. Bit 2 of the flag marks a
//! capture and bit 3 a promotion, so both tests are a single mask.

use crate::types::{square_name, KNIGHT};
use std::fmt;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Move(u16);

impl Move {
    pub const NULL: Move = Move(0);

    pub const QUIET: u16 = 0;
    pub const DOUBLE_PUSH: u16 = 1;
    pub const KING_CASTLE: u16 = 2;
    pub const QUEEN_CASTLE: u16 = 3;
    pub const CAPTURE: u16 = 4;
    pub const EN_PASSANT: u16 = 5;
    pub const PROMO_KNIGHT: u16 = 8;
    pub const PROMO_BISHOP: u16 = 9;
    pub const PROMO_ROOK: u16 = 10;
    pub const PROMO_QUEEN: u16 = 11;
    pub const PROMO_CAPTURE_KNIGHT: u16 = 12;
    pub const PROMO_CAPTURE_BISHOP: u16 = 13;
    pub const PROMO_CAPTURE_ROOK: u16 = 14;
    pub const PROMO_CAPTURE_QUEEN: u16 = 15;

    const CAPTURE_BIT: u16 = 0x4000;
    const PROMOTION_BIT: u16 = 0x8000;

    #[inline]
    pub const fn new(from: usize, to: usize, flag: u16) -> Self {
        Move((from as u16) | ((to as u16) << 6) | (flag << 12))
    }

    #[inline]
    pub const fn from(self) -> usize {
        (self.0 & 0x3F) as usize
    }

    #[inline]
    pub const fn to(self) -> usize {
        ((self.0 >> 6) & 0x3F) as usize
    }

    #[inline]
    pub const fn flag(self) -> u16 {
        self.0 >> 12
    }

    #[inline]
    pub const fn is_null(self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn is_capture(self) -> bool {
        self.0 & Self::CAPTURE_BIT != 0
    }

    #[inline]
    pub const fn is_promotion(self) -> bool {
        self.0 & Self::PROMOTION_BIT != 0
    }

    /// Captures and promotions; everything else is quiet.
    #[inline]
    pub const fn is_tactical(self) -> bool {
        self.0 & (Self::CAPTURE_BIT | Self::PROMOTION_BIT) != 0
    }

    #[inline]
    pub const fn is_en_passant(self) -> bool {
        self.flag() == Self::EN_PASSANT
    }

    #[inline]
    pub const fn is_double_push(self) -> bool {
        self.flag() == Self::DOUBLE_PUSH
    }

    #[inline]
    pub const fn is_castle(self) -> bool {
        matches!(self.flag(), Self::KING_CASTLE | Self::QUEEN_CASTLE)
    }

    /// Piece kind the pawn becomes, if this is a promotion
    #[inline]
    pub const fn promotion_kind(self) -> Option<usize> {
        if self.is_promotion() {
            Some(KNIGHT + (self.flag() & 3) as usize)
        } else {
            None
        }
    }

    /// Convert move to UCI notation (e.g., "e2e4", "e7e8q")
    pub fn to_uci(self) -> String {
        let mut uci = format!("{}{}", square_name(self.from()), square_name(self.to()));
        if self.is_promotion() {
            uci.push(b"nbrq"[(self.flag() & 3) as usize] as char);
        }
        uci
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_null() {
            write!(f, "0000")
        } else {
            write!(f, "{}", self.to_uci())
        }
    }
}

/// A move with its ordering score, as stored in the search move arena.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ScoredMove {
    pub mv: Move,
    pub score: i32,
}

impl ScoredMove {
    #[inline]
    pub const fn new(mv: Move) -> Self {
        ScoredMove { mv, score: 0 }
    }
}
