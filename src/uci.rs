//! OxideChess - UCI Protocol Module
//!
//! This module implements the Universal Chess Interface (UCI) protocol,
//! allowing the engine to communicate with chess GUIs.
//!
//! Input is read on its own thread so that `stop` and `quit` reach the
//! search through the shared stop flag while the main thread is busy
//! searching. Every line is then handled in order on the main thread.

use crate::board::Board;
use crate::move_generator::MoveGenerator;
use crate::perft::{divide, perft};
use crate::search::{mate_in, SearchEngine, SearchInfo, DEFAULT_EVAL_HASH_MB, DEFAULT_HASH_MB};
use crate::tables::Tables;
use crate::time_manager::SearchLimits;
use std::io::{self, BufRead, Stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Instant;
use tracing::{debug, info, trace, warn};

// Engine identification
const ENGINE_NAME: &str = "OxideChess";
const ENGINE_AUTHOR: &str = "the OxideChess developers";
const ENGINE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default depth ceiling for a `go` without limits
const DEFAULT_DEPTH: i32 = 10;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum OptionKind {
    Spin { min: i32, max: i32 },
    Check,
    Button,
}

/// UCI option representation
#[derive(Clone, Debug)]
pub struct UCIOption {
    pub name: String,
    pub kind: OptionKind,
    pub default: String,
    pub value: String,
}

impl UCIOption {
    pub fn spin(name: &str, default: i32, min: i32, max: i32) -> Self {
        UCIOption {
            name: name.to_string(),
            kind: OptionKind::Spin { min, max },
            default: default.to_string(),
            value: default.to_string(),
        }
    }

    pub fn check(name: &str, default: bool) -> Self {
        UCIOption {
            name: name.to_string(),
            kind: OptionKind::Check,
            default: default.to_string(),
            value: default.to_string(),
        }
    }

    pub fn button(name: &str) -> Self {
        UCIOption {
            name: name.to_string(),
            kind: OptionKind::Button,
            default: String::new(),
            value: String::new(),
        }
    }

    pub fn to_uci_string(&self) -> String {
        match self.kind {
            OptionKind::Spin { min, max } => format!(
                "option name {} type spin default {} min {} max {}",
                self.name, self.default, min, max
            ),
            OptionKind::Check => format!("option name {} type check default {}", self.name, self.default),
            OptionKind::Button => format!("option name {} type button", self.name),
        }
    }

    /// Returns false and keeps the old value when `value_str` does not fit
    pub fn set_value(&mut self, value_str: &str) -> bool {
        match self.kind {
            OptionKind::Spin { min, max } => match value_str.trim().parse::<i32>() {
                Ok(val) if (min..=max).contains(&val) => {
                    self.value = val.to_string();
                    true
                }
                _ => false,
            },
            OptionKind::Check => match value_str.trim().to_ascii_lowercase().as_str() {
                "true" | "false" => {
                    self.value = value_str.trim().to_ascii_lowercase();
                    true
                }
                _ => false,
            },
            OptionKind::Button => true,
        }
    }

    pub fn get_int(&self) -> i32 {
        self.value.parse().unwrap_or(0)
    }

    pub fn get_bool(&self) -> bool {
        self.value == "true"
    }
}

/// Split `setoption` arguments into the option name and optional value
pub fn parse_setoption(args: &[&str]) -> Option<(String, Option<String>)> {
    if args.first() != Some(&"name") {
        return None;
    }
    let rest = &args[1..];
    let (name, value) = match rest.iter().position(|&a| a == "value") {
        Some(i) => (&rest[..i], Some(rest[i + 1..].join(" "))),
        None => (rest, None),
    };
    if name.is_empty() {
        return None;
    }
    Some((name.join(" "), value))
}

/// Read the limits of a `go` command. Unknown tokens are skipped.
pub fn parse_go(args: &[&str]) -> SearchLimits {
    let mut limits = SearchLimits::default();
    let mut iter = args.iter();

    while let Some(&token) = iter.next() {
        match token {
            "infinite" => limits.infinite = true,
            "depth" | "nodes" | "movetime" | "wtime" | "btime" | "winc" | "binc" | "movestogo" => {
                let value = iter.next().and_then(|v| v.parse::<i64>().ok());
                let Some(value) = value else {
                    warn!(token, "missing or malformed go parameter");
                    continue;
                };
                let ms = Some(value.max(0) as u64);
                match token {
                    "depth" => limits.depth = Some(value.clamp(1, i32::MAX as i64) as i32),
                    "nodes" => limits.nodes = ms,
                    "movetime" => limits.movetime = ms,
                    "wtime" => limits.wtime = ms,
                    "btime" => limits.btime = ms,
                    "winc" => limits.winc = ms,
                    "binc" => limits.binc = ms,
                    _ => limits.movestogo = ms,
                }
            }
            _ => {}
        }
    }
    limits
}

/// Score as `cp N` or `mate N`
pub fn format_score(score: i32) -> String {
    match mate_in(score) {
        Some(moves) => format!("mate {}", moves),
        None => format!("cp {}", score),
    }
}

pub fn format_info(info: &SearchInfo) -> String {
    let pv: Vec<String> = info.pv.iter().map(|m| m.to_uci()).collect();
    format!(
        "info depth {} score {} nodes {} time {} nps {} hashfull {} pv {}",
        info.depth,
        format_score(info.score),
        info.nodes,
        info.time_ms,
        info.nps,
        info.hashfull,
        pv.join(" ")
    )
}

/// UCI protocol handler
pub struct UCIProtocol<W: Write = Stdout> {
    tables: Arc<Tables>,
    board: Board,
    search_engine: SearchEngine,
    stop: Arc<AtomicBool>,
    running: bool,
    debug_mode: bool,
    options: Vec<UCIOption>,
    out: W,
}

impl UCIProtocol<Stdout> {
    pub fn new() -> Self {
        UCIProtocol::with_output(io::stdout())
    }

    /// Main loop: a reader thread feeds lines, this thread handles them
    pub fn run(&mut self) {
        let (tx, rx) = mpsc::channel::<String>();
        let stop = Arc::clone(&self.stop);

        thread::spawn(move || {
            let stdin = io::stdin();
            for line in stdin.lock().lines() {
                let Ok(line) = line else { break };
                if matches!(line.trim(), "stop" | "quit") {
                    stop.store(true, Ordering::Relaxed);
                }
                if tx.send(line).is_err() {
                    break;
                }
            }
        });

        for line in rx {
            let line = line.trim();
            if !line.is_empty() {
                self.process_command(line);
            }
            if !self.running {
                break;
            }
        }
    }
}

impl Default for UCIProtocol<Stdout> {
    fn default() -> Self {
        UCIProtocol::new()
    }
}

impl<W: Write> UCIProtocol<W> {
    pub fn with_output(out: W) -> Self {
        let tables = Arc::new(Tables::new());
        let search_engine = SearchEngine::new(Arc::clone(&tables), DEFAULT_HASH_MB);
        let stop = search_engine.stop_handle();

        UCIProtocol {
            board: Board::startpos(&tables.zobrist),
            tables,
            search_engine,
            stop,
            running: true,
            debug_mode: false,
            options: default_options(),
            out,
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn process_command(&mut self, line: &str) {
        trace!(command = line, "received");
        let parts: Vec<&str> = line.split_whitespace().collect();
        let Some((&command, args)) = parts.split_first() else {
            return;
        };

        match command {
            "uci" => self.cmd_uci(),
            "isready" => self.cmd_isready(),
            "setoption" => self.cmd_setoption(args),
            "ucinewgame" => self.cmd_ucinewgame(),
            "position" => self.cmd_position(args),
            "go" => self.cmd_go(args),
            "stop" => self.cmd_stop(),
            "quit" => self.cmd_quit(),
            "debug" => self.cmd_debug(args),
            "d" => self.cmd_display(),
            "perft" => self.cmd_perft(args),
            "divide" => self.cmd_divide(args),
            _ => {
                warn!(command, "unknown command");
                if self.debug_mode {
                    self.send(&format!("info string Unknown command: {}", command));
                }
            }
        }
    }

    fn send(&mut self, message: &str) {
        writeln!(self.out, "{}", message).ok();
        self.out.flush().ok();
    }

    fn option(&self, name: &str) -> Option<&UCIOption> {
        self.options.iter().find(|o| o.name.eq_ignore_ascii_case(name))
    }

    fn cmd_uci(&mut self) {
        self.send(&format!("id name {} {}", ENGINE_NAME, ENGINE_VERSION));
        self.send(&format!("id author {}", ENGINE_AUTHOR));

        let lines: Vec<String> = self.options.iter().map(|o| o.to_uci_string()).collect();
        for line in lines {
            self.send(&line);
        }

        self.send("uciok");
    }

    fn cmd_isready(&mut self) {
        self.send("readyok");
    }

    fn cmd_setoption(&mut self, args: &[&str]) {
        let Some((name, value)) = parse_setoption(args) else {
            warn!(?args, "malformed setoption");
            return;
        };
        let Some(opt) = self.options.iter_mut().find(|o| o.name.eq_ignore_ascii_case(&name)) else {
            warn!(name = %name, "unknown option");
            return;
        };

        if opt.kind != OptionKind::Button {
            let Some(value) = value else {
                warn!(name = %name, "setoption without a value");
                return;
            };
            if !opt.set_value(&value) {
                warn!(name = %name, value = %value, "rejected option value");
                return;
            }
        }
        let opt = opt.clone();
        self.apply_option(&opt);

        if self.debug_mode {
            self.send(&format!("info string Option {} set to {}", opt.name, opt.value));
        }
    }

    /// Push a changed option into the engine
    fn apply_option(&mut self, opt: &UCIOption) {
        let engine = &mut self.search_engine;
        match opt.name.as_str() {
            "Hash" => engine.resize_tt(opt.get_int().max(1) as usize),
            "EvalHash" => engine.resize_eval_cache(opt.get_int().max(1) as usize),
            "Clear Hash" => engine.clear_tt(),
            "UseTranspositionTable" => engine.options.use_tt = opt.get_bool(),
            "UseNullMove" => engine.options.use_null_move = opt.get_bool(),
            "UseLMR" => engine.options.use_lmr = opt.get_bool(),
            "UseIID" => engine.options.use_iid = opt.get_bool(),
            "UseRazoring" => engine.options.use_razoring = opt.get_bool(),
            "UseReverseFutility" => engine.options.use_reverse_futility = opt.get_bool(),
            _ => {}
        }
    }

    fn cmd_ucinewgame(&mut self) {
        self.board = Board::startpos(&self.tables.zobrist);
        self.search_engine.clear();
    }

    fn cmd_position(&mut self, args: &[&str]) {
        let moves_at = args.iter().position(|&a| a == "moves");
        let setup = &args[..moves_at.unwrap_or(args.len())];

        let board = match setup.split_first() {
            Some((&"startpos", _)) => Board::startpos(&self.tables.zobrist),
            Some((&"fen", fields)) => match Board::from_fen(&fields.join(" "), &self.tables.zobrist) {
                Ok(board) => board,
                Err(err) => {
                    warn!(%err, "position rejected");
                    return;
                }
            },
            _ => {
                warn!(?args, "malformed position command");
                return;
            }
        };
        self.board = board;

        let Some(at) = moves_at else { return };
        let generator = MoveGenerator::new(&self.tables);
        for text in &args[at + 1..] {
            let mv = match generator.parse_uci_move(&self.board, text) {
                Ok(mv) => mv,
                Err(err) => {
                    warn!(%err, "stopped applying position moves");
                    return;
                }
            };
            if self.board.make_move(mv, &self.tables).is_none() {
                warn!(mv = %mv, "move leaves the king in check");
                return;
            }
        }
    }

    fn cmd_go(&mut self, args: &[&str]) {
        let mut limits = parse_go(args);
        if limits.is_unbounded() {
            limits.depth = Some(self.option("Depth").map_or(DEFAULT_DEPTH, |o| o.get_int()));
        }
        debug!(?limits, "search started");

        let out = &mut self.out;
        let result = self.search_engine.search(&self.board, &limits, |info| {
            writeln!(out, "{}", format_info(info)).ok();
            out.flush().ok();
        });

        let reply = match (result.best_move, result.ponder_move()) {
            (Some(best), Some(ponder)) => format!("bestmove {} ponder {}", best, ponder),
            (Some(best), None) => format!("bestmove {}", best),
            (None, _) => "bestmove 0000".to_string(),
        };
        self.send(&reply);
    }

    /// The reader thread raised the flag; lower it for the next search
    fn cmd_stop(&mut self) {
        self.stop.store(false, Ordering::Relaxed);
    }

    fn cmd_quit(&mut self) {
        self.running = false;
    }

    fn cmd_debug(&mut self, args: &[&str]) {
        if let Some(&mode) = args.first() {
            self.debug_mode = mode == "on";
        }
    }

    fn cmd_display(&mut self) {
        let generator = MoveGenerator::new(&self.tables);
        let legal_moves = generator.generate_legal_moves(&self.board);
        let in_check = self.board.in_check(&self.tables.attacks);

        let text = self.board.display();
        self.send(&text);
        self.send(&format!("In check: {}", in_check));
        self.send(&format!("Legal moves: {}", legal_moves.len()));

        let list: Vec<String> = legal_moves.iter().map(|m| m.to_uci()).collect();
        self.send(&format!("Moves: {}", list.join(" ")));
    }

    fn parse_depth(args: &[&str]) -> u32 {
        args.first().and_then(|s| s.parse::<u32>().ok()).unwrap_or(1)
    }

    fn cmd_perft(&mut self, args: &[&str]) {
        let depth = Self::parse_depth(args);
        let mut board = self.board.clone();
        let start = Instant::now();
        let nodes = perft(&mut board, &self.tables, depth);
        let ms = start.elapsed().as_millis() as u64;
        let nps = if ms > 0 { nodes * 1000 / ms } else { 0 };

        info!(depth, nodes, ms, "perft finished");
        self.send(&format!("info string perft {} nodes {} time {} nps {}", depth, nodes, ms, nps));
        self.send(&format!("Nodes searched: {}", nodes));
    }

    fn cmd_divide(&mut self, args: &[&str]) {
        let depth = Self::parse_depth(args);
        let mut board = self.board.clone();
        let split = divide(&mut board, &self.tables, depth);

        let mut total = 0;
        for (mv, nodes) in split {
            total += nodes;
            self.send(&format!("{}: {}", mv, nodes));
        }
        self.send("");
        self.send(&format!("Nodes searched: {}", total));
    }
}

fn default_options() -> Vec<UCIOption> {
    vec![
        UCIOption::spin("Hash", DEFAULT_HASH_MB as i32, 1, 1024),
        UCIOption::spin("EvalHash", DEFAULT_EVAL_HASH_MB as i32, 1, 256),
        UCIOption::spin("Depth", DEFAULT_DEPTH, 1, 63),
        UCIOption::check("UseTranspositionTable", true),
        UCIOption::check("UseNullMove", true),
        UCIOption::check("UseLMR", true),
        UCIOption::check("UseIID", true),
        UCIOption::check("UseRazoring", true),
        UCIOption::check("UseReverseFutility", true),
        UCIOption::button("Clear Hash"),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::MATE;
    use crate::types::STARTING_FEN;

    fn protocol() -> UCIProtocol<Vec<u8>> {
        UCIProtocol::with_output(Vec::new())
    }

    fn lines(uci: &UCIProtocol<Vec<u8>>) -> Vec<String> {
        String::from_utf8_lossy(uci.output()).lines().map(str::to_string).collect()
    }

    #[test]
    fn handshake() {
        let mut uci = protocol();
        uci.process_command("uci");
        uci.process_command("isready");
        let out = lines(&uci);
        assert!(out[0].starts_with("id name OxideChess"));
        assert!(out.contains(&"option name Hash type spin default 64 min 1 max 1024".to_string()));
        assert!(out.contains(&"option name Clear Hash type button".to_string()));
        assert!(out.contains(&"option name UseLMR type check default true".to_string()));
        assert_eq!(out[out.len() - 2], "uciok");
        assert_eq!(out[out.len() - 1], "readyok");
    }

    #[test]
    fn position_with_moves() {
        let mut uci = protocol();
        uci.process_command("position startpos moves e2e4 e7e5 g1f3");
        assert_eq!(
            uci.board().to_fen(),
            "rnbqkbnr/pppp1ppp/8/4p3/4P3/5N2/PPPP1PPP/RNBQKB1R b KQkq - 1 2"
        );

        let fen = "4k3/8/8/8/8/8/4P3/4K3 w - - 0 1";
        uci.process_command(&format!("position fen {} moves e2e4", fen));
        assert_eq!(uci.board().to_fen(), "4k3/8/8/8/4P3/8/8/4K3 b - e3 0 1");
    }

    #[test]
    fn bad_position_input_is_contained() {
        let mut uci = protocol();
        uci.process_command("position startpos moves e2e4");
        let before = uci.board().clone();
        uci.process_command("position fen not a fen");
        assert_eq!(uci.board(), &before);

        // moves stop at the first illegal one
        uci.process_command("position startpos moves e2e4 e2e4 e7e5");
        assert_eq!(uci.board().fullmove_number, 1);
        assert_eq!(uci.board().halfmove_clock, 0);
        assert_ne!(uci.board().to_fen(), STARTING_FEN);
    }

    #[test]
    fn go_prints_info_and_bestmove() {
        let mut uci = protocol();
        uci.process_command("position startpos");
        uci.process_command("go depth 3");
        let out = lines(&uci);
        let infos: Vec<&String> = out.iter().filter(|l| l.starts_with("info depth")).collect();
        assert_eq!(infos.len(), 3);
        assert!(infos[2].starts_with("info depth 3 score cp "));
        assert!(out.last().is_some_and(|l| l.starts_with("bestmove ")));
    }

    #[test]
    fn go_reports_mate() {
        let mut uci = protocol();
        uci.process_command("position fen 6k1/5ppp/8/8/8/8/5PPP/R5K1 w - - 0 1");
        uci.process_command("go depth 2");
        let out = lines(&uci);
        assert!(out.iter().any(|l| l.contains("score mate 1")));
        assert!(out.last().is_some_and(|l| l.starts_with("bestmove a1a8")));
    }

    #[test]
    fn setoption_validates_values() {
        let mut uci = protocol();
        uci.process_command("setoption name Depth value 5");
        assert_eq!(uci.option("Depth").map(|o| o.get_int()), Some(5));
        uci.process_command("setoption name Depth value 500");
        assert_eq!(uci.option("Depth").map(|o| o.get_int()), Some(5));
        uci.process_command("setoption name UseNullMove value false");
        assert!(!uci.search_engine.options.use_null_move);
        uci.process_command("setoption name UseNullMove value maybe");
        assert!(!uci.search_engine.options.use_null_move);
        uci.process_command("setoption name Clear Hash");
        uci.process_command("setoption name Hash value 2");
        assert_eq!(uci.option("Hash").map(|o| o.get_int()), Some(2));
    }

    #[test]
    fn setoption_arguments() {
        assert_eq!(
            parse_setoption(&["name", "Clear", "Hash"]),
            Some(("Clear Hash".to_string(), None))
        );
        assert_eq!(
            parse_setoption(&["name", "Hash", "value", "128"]),
            Some(("Hash".to_string(), Some("128".to_string())))
        );
        assert_eq!(parse_setoption(&["Hash", "value", "1"]), None);
        assert_eq!(parse_setoption(&["name"]), None);
    }

    #[test]
    fn go_arguments() {
        let limits = parse_go(&["wtime", "60000", "btime", "55000", "winc", "1000", "movestogo", "20"]);
        assert_eq!(limits.wtime, Some(60_000));
        assert_eq!(limits.btime, Some(55_000));
        assert_eq!(limits.winc, Some(1_000));
        assert_eq!(limits.binc, None);
        assert_eq!(limits.movestogo, Some(20));

        let limits = parse_go(&["depth", "7", "ponder", "nodes", "x"]);
        assert_eq!(limits.depth, Some(7));
        assert_eq!(limits.nodes, None);
        assert!(parse_go(&["infinite"]).infinite);
        assert!(parse_go(&[]).is_unbounded());
    }

    #[test]
    fn score_formatting() {
        assert_eq!(format_score(35), "cp 35");
        assert_eq!(format_score(-120), "cp -120");
        assert_eq!(format_score(MATE - 3), "mate 2");
        assert_eq!(format_score(-MATE + 2), "mate -1");
    }

    #[test]
    fn divide_and_quit() {
        let mut uci = protocol();
        uci.process_command("divide 1");
        let out = lines(&uci);
        assert_eq!(out.iter().filter(|l| l.contains(": ")).count(), 21);
        assert_eq!(out.last().map(String::as_str), Some("Nodes searched: 20"));

        uci.process_command("quit");
        assert!(!uci.is_running());
    }
}
