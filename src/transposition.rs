//! OxideChess - Transposition Table
//!
//! Direct-mapped tables indexed by the low bits of the position hash. The
//! full hash is kept in every entry to reject index collisions. Mate scores
//! are stored relative to the node and converted back on probe, so a mate
//! found through a transposition keeps the right distance from the root.

use crate::chess_move::Move;
use crate::search::MATE_THRESHOLD;
use std::mem::size_of;
use tracing::info;

/// How a stored score relates to the true value
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Bound {
    /// Score is exact
    Exact,
    /// Search failed high: true value >= score
    Lower,
    /// Search failed low: true value <= score
    Upper,
}

#[derive(Clone, Copy, Debug)]
struct TTEntry {
    hash: u64,
    best_move: Move,
    score: i32,
    depth: i32,
    bound: Bound,
}

/// Probe outcome: a usable cutoff score if any, plus the stored best move
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TTProbe {
    pub score: Option<i32>,
    pub best_move: Move,
}

impl TTProbe {
    const MISS: TTProbe = TTProbe {
        score: None,
        best_move: Move::NULL,
    };
}

/// Largest power of two not above `max(1, size_mb MB / entry_size)`
fn entry_count(size_mb: usize, entry_size: usize) -> usize {
    let budget = (size_mb.max(1) * 1024 * 1024 / entry_size).max(1);
    1usize << (usize::BITS - 1 - budget.leading_zeros())
}

pub struct TranspositionTable {
    entries: Vec<Option<TTEntry>>,
    mask: usize,
    pub hits: u64,
    pub writes: u64,
}

impl TranspositionTable {
    pub fn new(size_mb: usize) -> Self {
        let size = entry_count(size_mb, size_of::<Option<TTEntry>>());
        info!(size_mb, entries = size, "allocating transposition table");

        TranspositionTable {
            entries: vec![None; size],
            mask: size - 1,
            hits: 0,
            writes: 0,
        }
    }

    #[inline]
    fn slot(&self, hash: u64) -> usize {
        (hash as usize) & self.mask
    }

    /// Look up a position. The score is only returned when the entry was
    /// searched at least `depth` deep and its bound settles the window.
    pub fn probe(&mut self, hash: u64, ply: usize, depth: i32, alpha: i32, beta: i32) -> TTProbe {
        let entry = match self.entries[self.slot(hash)] {
            Some(e) if e.hash == hash => e,
            _ => return TTProbe::MISS,
        };
        self.hits += 1;

        let mut probe = TTProbe {
            score: None,
            best_move: entry.best_move,
        };
        if entry.depth < depth {
            return probe;
        }

        let mut score = entry.score;
        if score > MATE_THRESHOLD {
            score -= ply as i32;
        } else if score < -MATE_THRESHOLD {
            score += ply as i32;
        }

        probe.score = match entry.bound {
            Bound::Exact => Some(score),
            Bound::Upper if score <= alpha => Some(alpha),
            Bound::Lower if score >= beta => Some(beta),
            _ => None,
        };
        probe
    }

    /// Store a result. An entry for the same position searched deeper is
    /// kept; anything else in the slot is overwritten.
    pub fn store(&mut self, hash: u64, depth: i32, ply: usize, score: i32, bound: Bound, best_move: Move) {
        let slot = self.slot(hash);
        if let Some(existing) = self.entries[slot] {
            if existing.hash == hash && existing.depth > depth {
                return;
            }
        }

        let mut score = score;
        if score > MATE_THRESHOLD {
            score += ply as i32;
        } else if score < -MATE_THRESHOLD {
            score -= ply as i32;
        }

        self.entries[slot] = Some(TTEntry {
            hash,
            best_move,
            score,
            depth,
            bound,
        });
        self.writes += 1;
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
        self.hits = 0;
        self.writes = 0;
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Occupancy in permille, sampled from the first thousand slots
    pub fn hashfull(&self) -> usize {
        let sample = self.entries.len().min(1000);
        let used = self.entries[..sample].iter().filter(|e| e.is_some()).count();
        used * 1000 / sample
    }
}

/// Static evaluations keyed by position hash. Always overwrites.
pub struct EvalCache {
    entries: Vec<Option<(u64, i32)>>,
    mask: usize,
}

impl EvalCache {
    pub fn new(size_mb: usize) -> Self {
        let size = entry_count(size_mb, size_of::<Option<(u64, i32)>>());
        info!(size_mb, entries = size, "allocating evaluation cache");

        EvalCache {
            entries: vec![None; size],
            mask: size - 1,
        }
    }

    #[inline]
    pub fn probe(&self, hash: u64) -> Option<i32> {
        match self.entries[(hash as usize) & self.mask] {
            Some((key, score)) if key == hash => Some(score),
            _ => None,
        }
    }

    #[inline]
    pub fn store(&mut self, hash: u64, score: i32) {
        self.entries[(hash as usize) & self.mask] = Some((hash, score));
    }

    pub fn clear(&mut self) {
        self.entries.fill(None);
    }
}
