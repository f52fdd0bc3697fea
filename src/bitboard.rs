//! OxideChess - Bitboard Module
//!
//! A bitboard is a 64-bit integer where bit `i` stands for square `i`
//! (a1 = 0, h8 = 63). This module holds the shift helpers, the leaper
//! tables (king, knight, pawn) and the magic-indexed slider tables.

use crate::magics::{BISHOP_BITS, BISHOP_MAGICS, ROOK_BITS, ROOK_MAGICS};
use crate::types::{BLACK, WHITE};

// ============================================================================
// CONSTANTS - Files and Ranks
// ============================================================================

pub const FILE_A: u64 = 0x0101010101010101;
pub const FILE_B: u64 = 0x0202020202020202;
pub const FILE_G: u64 = 0x4040404040404040;
pub const FILE_H: u64 = 0x8080808080808080;

pub const RANK_1: u64 = 0x00000000000000FF;
pub const RANK_2: u64 = 0x000000000000FF00;
pub const RANK_7: u64 = 0x00FF000000000000;
pub const RANK_8: u64 = 0xFF00000000000000;

pub const NOT_FILE_A: u64 = !FILE_A;
pub const NOT_FILE_H: u64 = !FILE_H;
pub const NOT_FILE_AB: u64 = !(FILE_A | FILE_B);
pub const NOT_FILE_GH: u64 = !(FILE_G | FILE_H);

// ============================================================================
// SHIFTS
// ============================================================================

#[inline]
pub const fn north_one(bb: u64) -> u64 {
    bb << 8
}

#[inline]
pub const fn south_one(bb: u64) -> u64 {
    bb >> 8
}

#[inline]
pub const fn north_two(bb: u64) -> u64 {
    bb << 16
}

#[inline]
pub const fn south_two(bb: u64) -> u64 {
    bb >> 16
}

#[inline]
pub const fn east_one(bb: u64) -> u64 {
    (bb << 1) & NOT_FILE_A
}

#[inline]
pub const fn west_one(bb: u64) -> u64 {
    (bb >> 1) & NOT_FILE_H
}

#[inline]
pub const fn east_two(bb: u64) -> u64 {
    (bb << 2) & NOT_FILE_AB
}

#[inline]
pub const fn west_two(bb: u64) -> u64 {
    (bb >> 2) & NOT_FILE_GH
}

// ============================================================================
// BITBOARD UTILITIES
// ============================================================================

/// Extract and clear the least significant bit, returning its index
#[inline]
pub fn pop_lsb(bb: &mut u64) -> usize {
    let idx = bb.trailing_zeros() as usize;
    *bb &= *bb - 1;
    idx
}

/// Get the index of the least significant bit
#[inline]
pub fn lsb(bb: u64) -> usize {
    bb.trailing_zeros() as usize
}

/// Create a bitboard with a single bit set at the given square
#[inline]
pub const fn square_bb(sq: usize) -> u64 {
    1u64 << sq
}

#[inline]
pub const fn file_of(sq: usize) -> usize {
    sq & 7
}

#[inline]
pub const fn rank_of(sq: usize) -> usize {
    sq >> 3
}

/// Iterate over the set squares of a bitboard, lowest first
pub fn squares(mut bb: u64) -> impl Iterator<Item = usize> {
    std::iter::from_fn(move || if bb == 0 { None } else { Some(pop_lsb(&mut bb)) })
}

// ============================================================================
// LEAPER ATTACKS
// ============================================================================

pub const fn knight_attacks_from(bb: u64) -> u64 {
    let one = east_one(bb) | west_one(bb);
    let two = east_two(bb) | west_two(bb);
    north_two(one) | south_two(one) | north_one(two) | south_one(two)
}

pub const fn king_attacks_from(bb: u64) -> u64 {
    let sideways = east_one(bb) | west_one(bb);
    let row = sideways | bb;
    sideways | north_one(row) | south_one(row)
}

pub const fn pawn_attacks_from(bb: u64, side: usize) -> u64 {
    let sideways = east_one(bb) | west_one(bb);
    if side == WHITE {
        north_one(sideways)
    } else {
        south_one(sideways)
    }
}

// ============================================================================
// SLIDER RAYS (used to fill the magic tables and to check them)
// ============================================================================

const ROOK_DIRECTIONS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];
const BISHOP_DIRECTIONS: [(i32, i32); 4] = [(1, 1), (1, -1), (-1, 1), (-1, -1)];

fn ray_attacks(sq: usize, blockers: u64, directions: &[(i32, i32)]) -> u64 {
    let mut attacks = 0u64;
    let (rank, file) = (rank_of(sq) as i32, file_of(sq) as i32);

    for &(dr, df) in directions {
        let (mut r, mut f) = (rank + dr, file + df);
        while (0..8).contains(&r) && (0..8).contains(&f) {
            let target = square_bb((r * 8 + f) as usize);
            attacks |= target;
            if target & blockers != 0 {
                break;
            }
            r += dr;
            f += df;
        }
    }

    attacks
}

/// Rook attacks computed by walking rays, stopping at the first blocker
pub fn rook_ray_attacks(sq: usize, blockers: u64) -> u64 {
    ray_attacks(sq, blockers, &ROOK_DIRECTIONS)
}

/// Bishop attacks computed by walking rays, stopping at the first blocker
pub fn bishop_ray_attacks(sq: usize, blockers: u64) -> u64 {
    ray_attacks(sq, blockers, &BISHOP_DIRECTIONS)
}

/// Squares whose occupancy can change a rook's attacks (board edges excluded)
pub fn rook_relevant_mask(sq: usize) -> u64 {
    let (rank, file) = (rank_of(sq), file_of(sq));
    let mut mask = 0u64;
    for r in (rank + 1)..7 {
        mask |= square_bb(r * 8 + file);
    }
    for r in 1..rank {
        mask |= square_bb(r * 8 + file);
    }
    for f in (file + 1)..7 {
        mask |= square_bb(rank * 8 + f);
    }
    for f in 1..file {
        mask |= square_bb(rank * 8 + f);
    }
    mask
}

/// Squares whose occupancy can change a bishop's attacks (board edges excluded)
pub fn bishop_relevant_mask(sq: usize) -> u64 {
    bishop_ray_attacks(sq, 0) & !(RANK_1 | RANK_8 | FILE_A | FILE_H)
}

/// Spread the low `bits` bits of `index` over the set squares of `mask`
pub fn index_to_occupancy(index: usize, bits: u32, mask: u64) -> u64 {
    let mut occupancy = 0u64;
    let mut remaining = mask;
    for i in 0..bits {
        let sq = pop_lsb(&mut remaining);
        if index & (1 << i) != 0 {
            occupancy |= square_bb(sq);
        }
    }
    occupancy
}

// ============================================================================
// ATTACK TABLES
// ============================================================================

#[derive(Clone, Copy, Debug, Default)]
struct Magic {
    mask: u64,
    magic: u64,
    shift: u32,
    offset: usize,
}

impl Magic {
    #[inline]
    fn index(&self, occupied: u64) -> usize {
        self.offset + ((occupied & self.mask).wrapping_mul(self.magic) >> self.shift) as usize
    }
}

/// Precomputed attack sets for every piece kind and square.
///
/// Built once per engine instance and shared read-only afterwards. Slider
/// lookups cost one mask, one multiply and one shift.
pub struct AttackTables {
    king: [u64; 64],
    knight: [u64; 64],
    pawn: [[u64; 64]; 2],
    rook_magics: [Magic; 64],
    bishop_magics: [Magic; 64],
    slider_attacks: Vec<u64>,
}

impl AttackTables {
    pub fn new() -> Self {
        let mut king = [0u64; 64];
        let mut knight = [0u64; 64];
        let mut pawn = [[0u64; 64]; 2];
        for sq in 0..64 {
            let bb = square_bb(sq);
            king[sq] = king_attacks_from(bb);
            knight[sq] = knight_attacks_from(bb);
            pawn[WHITE][sq] = pawn_attacks_from(bb, WHITE);
            pawn[BLACK][sq] = pawn_attacks_from(bb, BLACK);
        }

        let mut slider_attacks = Vec::with_capacity(107_648);
        let mut rook_magics = [Magic::default(); 64];
        let mut bishop_magics = [Magic::default(); 64];
        for sq in 0..64 {
            rook_magics[sq] = fill_slider(
                sq,
                rook_relevant_mask(sq),
                ROOK_MAGICS[sq],
                ROOK_BITS[sq],
                rook_ray_attacks,
                &mut slider_attacks,
            );
        }
        for sq in 0..64 {
            bishop_magics[sq] = fill_slider(
                sq,
                bishop_relevant_mask(sq),
                BISHOP_MAGICS[sq],
                BISHOP_BITS[sq],
                bishop_ray_attacks,
                &mut slider_attacks,
            );
        }

        Self {
            king,
            knight,
            pawn,
            rook_magics,
            bishop_magics,
            slider_attacks,
        }
    }

    #[inline]
    pub fn king(&self, sq: usize) -> u64 {
        self.king[sq]
    }

    #[inline]
    pub fn knight(&self, sq: usize) -> u64 {
        self.knight[sq]
    }

    /// Squares a pawn of `side` standing on `sq` attacks
    #[inline]
    pub fn pawn(&self, side: usize, sq: usize) -> u64 {
        self.pawn[side][sq]
    }

    #[inline]
    pub fn rook(&self, sq: usize, occupied: u64) -> u64 {
        self.slider_attacks[self.rook_magics[sq].index(occupied)]
    }

    #[inline]
    pub fn bishop(&self, sq: usize, occupied: u64) -> u64 {
        self.slider_attacks[self.bishop_magics[sq].index(occupied)]
    }

    #[inline]
    pub fn queen(&self, sq: usize, occupied: u64) -> u64 {
        self.rook(sq, occupied) | self.bishop(sq, occupied)
    }
}

impl Default for AttackTables {
    fn default() -> Self {
        Self::new()
    }
}

/// Enumerate every blocker subset of `mask` and write its attack set at the
/// magic index. Returns the lookup descriptor for the square.
fn fill_slider(
    sq: usize,
    mask: u64,
    magic: u64,
    bits: u32,
    rays: fn(usize, u64) -> u64,
    table: &mut Vec<u64>,
) -> Magic {
    let entry = Magic {
        mask,
        magic,
        shift: 64 - bits,
        offset: table.len(),
    };
    table.resize(table.len() + (1 << bits), 0);

    for index in 0..(1usize << bits) {
        let occupancy = index_to_occupancy(index, bits, mask);
        table[entry.index(occupancy)] = rays(sq, occupancy);
    }

    entry
}
