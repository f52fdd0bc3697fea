//! OxideChess - Search Engine Module
//!
//! This module implements the chess search algorithm using:
//! - Principal variation search with alpha-beta pruning (fail-hard)
//! - Iterative deepening with aspiration windows
//! - Transposition table and evaluation cache
//! - Razoring, reverse futility and null move pruning
//! - Internal iterative deepening
//! - Late Move Reductions
//! - Check extensions
//! - Quiescence search over captures
//!
//! Moves for every ply live in one pre-sized arena; a node owns the slice
//! between the arena length on entry and the length after generation.

use crate::board::Board;
use crate::chess_move::{Move, ScoredMove};
use crate::evaluation::{ClassicalEvaluator, Evaluator};
use crate::move_generator::MoveGenerator;
use crate::ordering::{pick_move, score_pv, MoveOrderer};
use crate::tables::Tables;
use crate::time_manager::{SearchLimits, TimeManager};
use crate::transposition::{Bound, EvalCache, TranspositionTable};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::{debug, info};

// Constants for search
pub const INF: i32 = 60_000;
pub const MATE: i32 = 50_000;
/// Scores beyond this are mates; stays clear of any static evaluation
pub const MATE_THRESHOLD: i32 = 49_900;
/// Recursion ceiling
pub const MAX_PLY: usize = 64;
/// Move arena capacity, above any reachable branching factor times depth
pub const MAX_MOVES: usize = 10_000;

pub const DEFAULT_HASH_MB: usize = 64;
/// 2^19 evaluation entries
pub const DEFAULT_EVAL_HASH_MB: usize = 8;

const ASPIRATION_WINDOW: i32 = 75;
/// Nodes between two polls of the clock and stop flag
const POLL_INTERVAL: u64 = 2048;

// Razoring
const RAZOR_MARGIN: i32 = 300;

// Reverse futility
const RFP_MAX_DEPTH: i32 = 6;
const RFP_MARGIN: i32 = 120;
const RFP_BETA_LIMIT: i32 = 19_000;

// Null Move Pruning
const NULL_MOVE_MIN_DEPTH: i32 = 3;
const NULL_MOVE_DEEP: i32 = 8;

// Internal Iterative Deepening
const IID_MIN_DEPTH: i32 = 6;

// Late Move Reductions
const LMR_MIN_MOVES: usize = 3;
const LMR_DEEP_MOVES: usize = 6;
const LMR_MIN_DEPTH: i32 = 3;

/// Feature switches. Turning one off changes node counts only.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SearchOptions {
    pub use_tt: bool,
    pub use_null_move: bool,
    pub use_lmr: bool,
    pub use_iid: bool,
    pub use_razoring: bool,
    pub use_reverse_futility: bool,
}

impl Default for SearchOptions {
    fn default() -> Self {
        SearchOptions {
            use_tt: true,
            use_null_move: true,
            use_lmr: true,
            use_iid: true,
            use_razoring: true,
            use_reverse_futility: true,
        }
    }
}

/// Progress report after a completed iteration
#[derive(Clone, Debug)]
pub struct SearchInfo {
    pub depth: i32,
    pub score: i32,
    pub nodes: u64,
    pub time_ms: u64,
    pub nps: u64,
    pub hashfull: usize,
    pub pv: Vec<Move>,
}

/// Outcome of the last iteration that finished
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SearchResult {
    pub best_move: Option<Move>,
    pub score: i32,
    pub depth: i32,
    pub nodes: u64,
    pub pv: Vec<Move>,
}

impl SearchResult {
    pub fn ponder_move(&self) -> Option<Move> {
        self.pv.get(1).copied()
    }
}

/// Moves to mate for a mate score, negative when being mated
pub fn mate_in(score: i32) -> Option<i32> {
    if score > MATE_THRESHOLD {
        Some((MATE - score + 1) / 2)
    } else if score < -MATE_THRESHOLD {
        Some(-(MATE + score + 1) / 2)
    } else {
        None
    }
}

// ============================================================================
// SEARCH ENGINE
// ============================================================================

pub struct SearchEngine {
    tables: Arc<Tables>,
    evaluator: Box<dyn Evaluator>,
    tt: TranspositionTable,
    eval_cache: EvalCache,
    orderer: MoveOrderer,

    // Triangular principal variation
    pv_table: Box<[[Move; MAX_PLY]; MAX_PLY]>,
    pv_length: [usize; MAX_PLY],
    prev_pv: Vec<Move>,
    follow_pv: bool,

    move_stack: Vec<ScoredMove>,
    ply: usize,
    nodes: u64,
    next_poll: u64,
    stopped: bool,
    timer: Option<TimeManager>,
    stop_flag: Arc<AtomicBool>,

    pub options: SearchOptions,
}

impl SearchEngine {
    pub fn new(tables: Arc<Tables>, hash_mb: usize) -> Self {
        let evaluator = Box::new(ClassicalEvaluator::new(Arc::clone(&tables)));
        SearchEngine::with_evaluator(tables, evaluator, hash_mb)
    }

    pub fn with_evaluator(tables: Arc<Tables>, evaluator: Box<dyn Evaluator>, hash_mb: usize) -> Self {
        SearchEngine {
            tables,
            evaluator,
            tt: TranspositionTable::new(hash_mb),
            eval_cache: EvalCache::new(DEFAULT_EVAL_HASH_MB),
            orderer: MoveOrderer::new(),
            pv_table: Box::new([[Move::NULL; MAX_PLY]; MAX_PLY]),
            pv_length: [0; MAX_PLY],
            prev_pv: Vec::new(),
            follow_pv: false,
            move_stack: Vec::with_capacity(MAX_MOVES),
            ply: 0,
            nodes: 0,
            next_poll: 0,
            stopped: false,
            timer: None,
            stop_flag: Arc::new(AtomicBool::new(false)),
            options: SearchOptions::default(),
        }
    }

    /// Flag another thread can raise to end the running search
    pub fn stop_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.stop_flag)
    }

    pub fn resize_tt(&mut self, size_mb: usize) {
        self.tt = TranspositionTable::new(size_mb);
    }

    pub fn resize_eval_cache(&mut self, size_mb: usize) {
        self.eval_cache = EvalCache::new(size_mb);
    }

    pub fn clear_tt(&mut self) {
        self.tt.clear();
        info!("transposition table cleared");
    }

    /// Forget everything learned from earlier games
    pub fn clear(&mut self) {
        self.tt.clear();
        self.eval_cache.clear();
        self.orderer.clear();
        info!("search state cleared");
    }

    /// Iterative deepening driver. `on_iteration` is called after every
    /// completed depth; the result always comes from a completed depth.
    pub fn search<F>(&mut self, board: &Board, limits: &SearchLimits, mut on_iteration: F) -> SearchResult
    where
        F: FnMut(&SearchInfo),
    {
        let tables = Arc::clone(&self.tables);
        let timer = TimeManager::new(limits, board.side, Arc::clone(&self.stop_flag));
        let max_depth = limits
            .depth
            .unwrap_or(MAX_PLY as i32 - 1)
            .clamp(1, MAX_PLY as i32 - 1);

        self.prepare();
        self.timer = Some(timer);

        let mut board = board.clone();
        let mut result = SearchResult::default();

        for depth in 1..=max_depth {
            if depth > 1 && !self.timer.as_ref().is_some_and(|t| t.should_start_iteration()) {
                break;
            }

            let score = if depth == 1 {
                self.search_root(&mut board, &tables, depth, -INF, INF)
            } else {
                self.aspiration_window(&mut board, &tables, depth, result.score)
            };
            if self.stopped {
                debug!(depth, "iteration aborted");
                break;
            }

            let pv: Vec<Move> = self.pv_table[0][..self.pv_length[0]].to_vec();
            result = SearchResult {
                best_move: pv.first().copied(),
                score,
                depth,
                nodes: self.nodes,
                pv: pv.clone(),
            };
            self.prev_pv = pv;

            let time_ms = self.timer.as_ref().map_or(0, |t| t.elapsed_ms());
            let info = SearchInfo {
                depth,
                score,
                nodes: self.nodes,
                time_ms,
                nps: if time_ms > 0 { self.nodes * 1000 / time_ms } else { 0 },
                hashfull: self.tt.hashfull(),
                pv: result.pv.clone(),
            };
            debug!(
                depth,
                score,
                nodes = self.nodes,
                tt_hits = self.tt.hits,
                tt_writes = self.tt.writes,
                pv = %result.pv.iter().map(|m| m.to_uci()).collect::<Vec<_>>().join(" "),
                "iteration complete"
            );
            on_iteration(&info);

            if result.best_move.is_none() {
                // mated or stalemated at the root
                break;
            }
        }

        if result.best_move.is_none() {
            // nothing completed; any legal move beats none
            result.best_move = MoveGenerator::new(&tables).generate_legal_moves(&board).first().copied();
            if let Some(mv) = result.best_move {
                result.pv = vec![mv];
            }
        }
        result.nodes = self.nodes;
        self.timer = None;
        result
    }

    fn prepare(&mut self) {
        self.nodes = 0;
        self.next_poll = 0;
        self.ply = 0;
        self.stopped = false;
        self.follow_pv = false;
        self.pv_length = [0; MAX_PLY];
        for line in self.pv_table.iter_mut() {
            line.fill(Move::NULL);
        }
        self.prev_pv.clear();
        self.move_stack.clear();
        self.orderer.clear_killers();
        self.orderer.age_history();
    }

    fn search_root(&mut self, board: &mut Board, tables: &Tables, depth: i32, alpha: i32, beta: i32) -> i32 {
        self.follow_pv = !self.prev_pv.is_empty();
        self.negamax(board, tables, depth, alpha, beta, true)
    }

    /// Narrow window around the last score, full window if it misses
    fn aspiration_window(&mut self, board: &mut Board, tables: &Tables, depth: i32, last: i32) -> i32 {
        let alpha = last - ASPIRATION_WINDOW;
        let beta = last + ASPIRATION_WINDOW;
        let score = self.search_root(board, tables, depth, alpha, beta);

        if !self.stopped && (score <= alpha || score >= beta) {
            debug!(depth, score, alpha, beta, "aspiration window missed");
            return self.search_root(board, tables, depth, -INF, INF);
        }
        score
    }

    fn poll(&mut self) {
        if self.nodes >= self.next_poll {
            self.next_poll = self.nodes + POLL_INTERVAL;
            if let Some(timer) = &self.timer {
                if timer.should_stop(self.nodes) {
                    self.stopped = true;
                }
            }
        }
    }

    /// Static evaluation through the evaluation cache
    fn evaluate(&mut self, board: &Board) -> i32 {
        if let Some(score) = self.eval_cache.probe(board.hash) {
            return score;
        }
        let score = self.evaluator.evaluate(board);
        self.eval_cache.store(board.hash, score);
        score
    }

    fn update_pv(&mut self, mv: Move) {
        let ply = self.ply;
        let child_len = self.pv_length[ply + 1].max(ply + 1);
        let child = self.pv_table[ply + 1];
        self.pv_table[ply][ply] = mv;
        self.pv_table[ply][ply + 1..child_len].copy_from_slice(&child[ply + 1..child_len]);
        self.pv_length[ply] = child_len;
    }

    /// Search a child node with the window negated
    fn search_child(&mut self, board: &mut Board, tables: &Tables, depth: i32, alpha: i32, beta: i32) -> i32 {
        self.ply += 1;
        let score = -self.negamax(board, tables, depth, -beta, -alpha, true);
        self.ply -= 1;
        score
    }

    fn negamax(
        &mut self,
        board: &mut Board,
        tables: &Tables,
        mut depth: i32,
        mut alpha: i32,
        beta: i32,
        allow_null: bool,
    ) -> i32 {
        let ply = self.ply;
        self.pv_length[ply] = ply;

        if alpha >= beta {
            return alpha;
        }
        let pv_node = beta - alpha > 1;

        if ply > 0 && board.is_draw() {
            self.nodes += 1;
            return 0;
        }

        let mut hash_move = Move::NULL;
        if self.options.use_tt {
            let probe = self.tt.probe(board.hash, ply, depth, alpha, beta);
            if ply > 0 {
                if let Some(score) = probe.score {
                    return score;
                }
            }
            hash_move = probe.best_move;
        }

        self.poll();
        if self.stopped {
            return 0;
        }

        if depth <= 0 {
            return self.quiescence(board, tables, alpha, beta);
        }
        if ply >= MAX_PLY - 1 {
            self.nodes += 1;
            return self.evaluate(board);
        }

        self.nodes += 1;

        let in_check = board.in_check(&tables.attacks);
        if in_check {
            depth += 1;
        }

        if !in_check && ply > 0 {
            let eval = self.evaluate(board);

            // Razoring
            if self.options.use_razoring && depth == 1 && eval <= alpha - RAZOR_MARGIN {
                return self.quiescence(board, tables, alpha, beta);
            }

            // Reverse futility
            if self.options.use_reverse_futility
                && depth <= RFP_MAX_DEPTH
                && beta.abs() < RFP_BETA_LIMIT
                && eval - RFP_MARGIN * depth >= beta
            {
                return beta;
            }

            // Null move
            if self.options.use_null_move
                && allow_null
                && depth >= NULL_MOVE_MIN_DEPTH
                && board.has_non_pawn_material(board.side)
            {
                let reduction = if depth >= NULL_MOVE_DEEP { 3 } else { 2 };
                let following = std::mem::replace(&mut self.follow_pv, false);
                let undo = board.make_null_move(&tables.zobrist);
                self.ply += 1;
                let score = -self.negamax(board, tables, depth - 1 - reduction, -beta, -beta + 1, false);
                self.ply -= 1;
                board.unmake_null_move(&undo);
                self.follow_pv = following;

                if self.stopped {
                    return 0;
                }
                if score >= beta {
                    return beta;
                }
            }
        }

        // Internal iterative deepening
        if self.options.use_iid && hash_move.is_null() && pv_node && depth >= IID_MIN_DEPTH {
            let following = std::mem::replace(&mut self.follow_pv, false);
            let score = self.negamax(board, tables, depth - depth / 4 - 1, alpha, beta, allow_null);
            self.follow_pv = following;
            if self.stopped {
                return 0;
            }
            if score > alpha && score < beta {
                hash_move = self.pv_table[ply][ply];
            }
            self.pv_length[ply] = ply;
        }

        let start = self.move_stack.len();
        MoveGenerator::new(tables).generate_moves(board, &mut self.move_stack);
        let end = self.move_stack.len();

        self.orderer
            .score_moves(board, &tables.attacks, &mut self.move_stack[start..end], hash_move, ply);
        if self.follow_pv {
            let pv_move = self.prev_pv.get(ply).copied().unwrap_or(Move::NULL);
            self.follow_pv = score_pv(&mut self.move_stack[start..end], pv_move);
        }

        let mut bound = Bound::Upper;
        let mut best_move = Move::NULL;
        let mut found_pv = false;
        let mut legal = 0usize;

        for i in 0..end - start {
            let mv = match pick_move(&mut self.move_stack[start..end], i) {
                Some(mv) => mv,
                None => break,
            };
            let undo = match board.make_move(mv, tables) {
                Some(undo) => undo,
                None => continue,
            };
            legal += 1;

            let mut new_depth = depth - 1;
            let mut reduction = 0;
            if self.options.use_lmr
                && found_pv
                && new_depth > LMR_MIN_DEPTH
                && legal > LMR_MIN_MOVES
                && !mv.is_tactical()
                && !in_check
            {
                reduction = 1;
                if legal > LMR_DEEP_MOVES {
                    reduction += 1;
                }
                if self.orderer.is_killer(mv, ply) {
                    reduction -= 1;
                }
                new_depth -= reduction;
            }

            let mut score;
            if !found_pv {
                score = self.search_child(board, tables, new_depth, alpha, beta);
            } else {
                score = self.search_child(board, tables, new_depth, alpha, alpha + 1);
                if reduction > 0 && score > alpha {
                    score = self.search_child(board, tables, depth - 1, alpha, alpha + 1);
                }
                if score > alpha && score < beta {
                    score = self.search_child(board, tables, depth - 1, alpha, beta);
                }
            }

            board.unmake_move(mv, &undo);
            // once the previous line has been searched, stop steering
            self.follow_pv = false;

            if self.stopped {
                self.move_stack.truncate(start);
                return 0;
            }

            if score > alpha {
                alpha = score;
                bound = Bound::Exact;
                best_move = mv;
                found_pv = true;
                self.update_pv(mv);

                if score >= beta {
                    bound = Bound::Lower;
                    alpha = beta;
                    if !mv.is_tactical() {
                        self.orderer.record_cutoff(board.side, mv, ply, depth);
                    }
                    break;
                }
            }
        }
        self.move_stack.truncate(start);

        if legal == 0 {
            return if in_check { -MATE + ply as i32 } else { 0 };
        }

        if self.options.use_tt {
            self.tt.store(board.hash, depth, ply, alpha, bound, best_move);
        }
        alpha
    }

    /// Captures only, with the static evaluation as a floor
    fn quiescence(&mut self, board: &mut Board, tables: &Tables, mut alpha: i32, beta: i32) -> i32 {
        let ply = self.ply;
        self.pv_length[ply] = ply;

        if alpha >= beta {
            return alpha;
        }

        let stand_pat = self.evaluate(board);
        if stand_pat >= beta {
            return beta;
        }
        if stand_pat > alpha {
            alpha = stand_pat;
        }

        self.poll();
        if self.stopped {
            return 0;
        }
        self.nodes += 1;

        if ply >= MAX_PLY - 1 {
            return alpha;
        }

        let start = self.move_stack.len();
        MoveGenerator::new(tables).generate_captures(board, &mut self.move_stack);
        let end = self.move_stack.len();
        self.orderer
            .score_moves(board, &tables.attacks, &mut self.move_stack[start..end], Move::NULL, ply);

        for i in 0..end - start {
            let mv = match pick_move(&mut self.move_stack[start..end], i) {
                Some(mv) => mv,
                None => break,
            };
            let undo = match board.make_move(mv, tables) {
                Some(undo) => undo,
                None => continue,
            };

            self.ply += 1;
            let score = -self.quiescence(board, tables, -beta, -alpha);
            self.ply -= 1;
            board.unmake_move(mv, &undo);

            if self.stopped {
                alpha = 0;
                break;
            }
            if score > alpha {
                alpha = score;
                if score >= beta {
                    alpha = beta;
                    break;
                }
            }
        }
        self.move_stack.truncate(start);
        alpha
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluation::MaterialEvaluator;
    use std::sync::atomic::Ordering;

    fn engine() -> (Arc<Tables>, SearchEngine) {
        let tables = Arc::new(Tables::new());
        let engine = SearchEngine::new(Arc::clone(&tables), 4);
        (tables, engine)
    }

    #[test]
    fn mate_score_conversion() {
        assert_eq!(mate_in(MATE - 1), Some(1));
        assert_eq!(mate_in(MATE - 3), Some(2));
        assert_eq!(mate_in(-MATE + 2), Some(-1));
        assert_eq!(mate_in(-MATE + 4), Some(-2));
        assert_eq!(mate_in(250), None);
    }

    #[test]
    fn finds_back_rank_mate() {
        let (tables, mut engine) = engine();
        let board = Board::from_fen("6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1", &tables.zobrist).unwrap();
        let result = engine.search(&board, &SearchLimits::depth(3), |_| {});
        assert_eq!(result.best_move.map(|m| m.to_uci()), Some("a1a8".to_string()));
        assert_eq!(result.score, MATE - 1);
    }

    #[test]
    fn reports_every_completed_depth() {
        let (tables, mut engine) = engine();
        let board = Board::startpos(&tables.zobrist);
        let mut depths = Vec::new();
        let result = engine.search(&board, &SearchLimits::depth(4), |info| {
            assert!(!info.pv.is_empty());
            depths.push(info.depth);
        });
        assert_eq!(depths, vec![1, 2, 3, 4]);
        assert_eq!(result.depth, 4);
        assert_eq!(result.pv.first().copied(), result.best_move);
        // search works on a copy
        assert_eq!(board, Board::startpos(&tables.zobrist));
    }

    #[test]
    fn mated_and_stalemated_roots_have_no_move() {
        let (tables, mut engine) = engine();
        let mated = Board::from_fen("R5k1/5ppp/8/8/8/8/5PPP/6K1 b - - 0 1", &tables.zobrist).unwrap();
        let result = engine.search(&mated, &SearchLimits::depth(3), |_| {});
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, -MATE);

        let stale = Board::from_fen("7k/5Q2/6K1/8/8/8/8/8 b - - 0 1", &tables.zobrist).unwrap();
        let result = engine.search(&stale, &SearchLimits::depth(3), |_| {});
        assert_eq!(result.best_move, None);
        assert_eq!(result.score, 0);
    }

    #[test]
    fn raised_stop_flag_still_yields_a_legal_move() {
        let (tables, mut engine) = engine();
        let board = Board::startpos(&tables.zobrist);
        engine.stop_handle().store(true, Ordering::Relaxed);
        let result = engine.search(&board, &SearchLimits::depth(8), |_| {});
        assert_eq!(result.depth, 0);
        let legal = MoveGenerator::new(&tables).generate_legal_moves(&board);
        assert!(result.best_move.is_some_and(|m| legal.contains(&m)));
    }

    #[test]
    fn node_limit_ends_the_search() {
        let (tables, mut engine) = engine();
        let board = Board::startpos(&tables.zobrist);
        let limits = SearchLimits {
            nodes: Some(5_000),
            ..Default::default()
        };
        let result = engine.search(&board, &limits, |_| {});
        assert!(result.best_move.is_some());
        assert!(result.nodes < 5_000 + POLL_INTERVAL);
    }

    #[test]
    fn aspiration_miss_falls_back_to_the_full_window() {
        // plain alpha-beta so the root value does not depend on move order
        let tables = Arc::new(Tables::new());
        let mut board = Board::from_fen("4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 1", &tables.zobrist).unwrap();
        let mut engine = SearchEngine::with_evaluator(Arc::clone(&tables), Box::new(MaterialEvaluator), 1);
        engine.options = SearchOptions {
            use_tt: false,
            use_null_move: false,
            use_lmr: false,
            use_iid: false,
            use_razoring: false,
            use_reverse_futility: false,
        };

        engine.prepare();
        let full = engine.search_root(&mut board, &tables, 3, -INF, INF);
        assert!(full > 0);

        // guesses far above and far below the true score both miss the window
        for guess in [full + 1_000, full - 1_000] {
            engine.clear();
            engine.prepare();
            let score = engine.aspiration_window(&mut board, &tables, 3, guess);
            assert!(!engine.stopped);
            assert_eq!(score, full);
            assert_eq!(engine.pv_table[0][0].to_uci(), "d2d5");
        }
    }

    #[test]
    fn pruning_switches_keep_the_material_win() {
        // the rook hangs; every configuration must take it
        let tables = Arc::new(Tables::new());
        let board = Board::from_fen("4k3/8/8/3r4/8/8/3Q4/4K3 w - - 0 1", &tables.zobrist).unwrap();
        for all_on in [true, false] {
            let mut engine = SearchEngine::with_evaluator(Arc::clone(&tables), Box::new(MaterialEvaluator), 1);
            engine.options = SearchOptions {
                use_tt: all_on,
                use_null_move: all_on,
                use_lmr: all_on,
                use_iid: all_on,
                use_razoring: all_on,
                use_reverse_futility: all_on,
            };
            let result = engine.search(&board, &SearchLimits::depth(4), |_| {});
            assert_eq!(result.best_move.map(|m| m.to_uci()), Some("d2d5".to_string()));
        }
    }
}
