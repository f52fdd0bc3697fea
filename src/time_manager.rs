//! OxideChess - Search limits and time control
//!
//! Turns the `go` parameters into a soft limit (no new iteration once half
//! of it is spent) and a hard limit (abort the running iteration). The
//! shared stop flag lets another thread end the search at any time.

use crate::types::WHITE;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

/// Moves assumed left in the game when the GUI does not say
const DEFAULT_MOVES_TO_GO: u64 = 30;
/// Kept in reserve for communication lag
const MOVE_OVERHEAD_MS: u64 = 50;
/// Hard limit as a multiple of the soft limit
const HARD_LIMIT_FACTOR: u64 = 3;

/// Limits given to one search
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchLimits {
    pub depth: Option<i32>,
    pub nodes: Option<u64>,
    pub movetime: Option<u64>,
    pub wtime: Option<u64>,
    pub btime: Option<u64>,
    pub winc: Option<u64>,
    pub binc: Option<u64>,
    pub movestogo: Option<u64>,
    pub infinite: bool,
}

impl SearchLimits {
    pub fn depth(depth: i32) -> Self {
        SearchLimits {
            depth: Some(depth),
            ..Default::default()
        }
    }

    pub fn movetime(ms: u64) -> Self {
        SearchLimits {
            movetime: Some(ms),
            ..Default::default()
        }
    }

    /// True when no depth, node or clock limit was given
    pub fn is_unbounded(&self) -> bool {
        self.depth.is_none()
            && self.nodes.is_none()
            && self.movetime.is_none()
            && self.wtime.is_none()
            && self.btime.is_none()
            && !self.infinite
    }
}

pub struct TimeManager {
    start: Instant,
    soft_limit: Option<Duration>,
    hard_limit: Option<Duration>,
    node_limit: Option<u64>,
    stop: Arc<AtomicBool>,
}

impl TimeManager {
    pub fn new(limits: &SearchLimits, side: usize, stop: Arc<AtomicBool>) -> Self {
        let (soft_ms, hard_ms) = if limits.infinite {
            (None, None)
        } else if let Some(ms) = limits.movetime {
            (Some(ms), Some(ms))
        } else {
            let (remaining, increment) = if side == WHITE {
                (limits.wtime, limits.winc)
            } else {
                (limits.btime, limits.binc)
            };
            match remaining {
                Some(remaining) => {
                    let (soft, hard) =
                        allot(remaining, increment.unwrap_or(0), limits.movestogo);
                    (Some(soft), Some(hard))
                }
                None => (None, None),
            }
        };

        TimeManager {
            start: Instant::now(),
            soft_limit: soft_ms.map(Duration::from_millis),
            hard_limit: hard_ms.map(Duration::from_millis),
            node_limit: if limits.infinite { None } else { limits.nodes },
            stop,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    pub fn elapsed_ms(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    pub fn soft_limit(&self) -> Option<Duration> {
        self.soft_limit
    }

    pub fn hard_limit(&self) -> Option<Duration> {
        self.hard_limit
    }

    /// Polled periodically from inside the search
    pub fn should_stop(&self, nodes: u64) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return true;
        }
        if self.node_limit.is_some_and(|limit| nodes >= limit) {
            return true;
        }
        self.hard_limit.is_some_and(|limit| self.elapsed() >= limit)
    }

    /// An iteration that starts after half the soft limit rarely finishes
    pub fn should_start_iteration(&self) -> bool {
        if self.stop.load(Ordering::Relaxed) {
            return false;
        }
        match self.soft_limit {
            Some(limit) => self.elapsed() < limit / 2,
            None => true,
        }
    }
}

/// Soft and hard allotment in milliseconds for a clock of `remaining`
fn allot(remaining: u64, increment: u64, movestogo: Option<u64>) -> (u64, u64) {
    let moves = movestogo.unwrap_or(DEFAULT_MOVES_TO_GO).max(1);
    let cap = remaining.saturating_sub(MOVE_OVERHEAD_MS).max(1);
    let soft = (remaining / moves + increment * 3 / 4).clamp(1, cap);
    let hard = (soft * HARD_LIMIT_FACTOR).min(cap);
    (soft, hard)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BLACK;

    fn flag() -> Arc<AtomicBool> {
        Arc::new(AtomicBool::new(false))
    }

    #[test]
    fn allotment_follows_the_clock() {
        assert_eq!(allot(60_000, 0, None), (2_000, 6_000));
        assert_eq!(allot(60_000, 1_000, Some(10)), (6_750, 20_250));
        // never more than the clock minus the overhead
        assert_eq!(allot(100, 0, Some(1)), (50, 50));
        assert_eq!(allot(10, 0, None), (1, 1));
    }

    #[test]
    fn movetime_is_exact() {
        let tm = TimeManager::new(&SearchLimits::movetime(250), WHITE, flag());
        assert_eq!(tm.soft_limit(), Some(Duration::from_millis(250)));
        assert_eq!(tm.hard_limit(), Some(Duration::from_millis(250)));
    }

    #[test]
    fn clock_of_the_side_to_move_is_used() {
        let limits = SearchLimits {
            wtime: Some(60_000),
            btime: Some(3_000),
            ..Default::default()
        };
        let tm = TimeManager::new(&limits, BLACK, flag());
        assert_eq!(tm.soft_limit(), Some(Duration::from_millis(100)));
    }

    #[test]
    fn infinite_and_depth_only_have_no_clock() {
        let limits = SearchLimits {
            infinite: true,
            movetime: Some(10),
            ..Default::default()
        };
        let tm = TimeManager::new(&limits, WHITE, flag());
        assert_eq!(tm.hard_limit(), None);
        assert!(!tm.should_stop(u64::MAX));

        let tm = TimeManager::new(&SearchLimits::depth(5), WHITE, flag());
        assert!(tm.should_start_iteration());
        assert!(!tm.should_stop(1_000_000));
    }

    #[test]
    fn node_limit_and_stop_flag() {
        let limits = SearchLimits {
            nodes: Some(1_000),
            ..Default::default()
        };
        let stop = flag();
        let tm = TimeManager::new(&limits, WHITE, stop.clone());
        assert!(!tm.should_stop(999));
        assert!(tm.should_stop(1_000));

        stop.store(true, Ordering::Relaxed);
        assert!(tm.should_stop(0));
        assert!(!tm.should_start_iteration());
    }

    #[test]
    fn unbounded_detection() {
        assert!(SearchLimits::default().is_unbounded());
        assert!(!SearchLimits::depth(3).is_unbounded());
        assert!(!SearchLimits {
            infinite: true,
            ..Default::default()
        }
        .is_unbounded());
    }
}
