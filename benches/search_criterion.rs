use std::sync::Arc;
use std::time::Duration;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

use oxide_chess::board::Board;
use oxide_chess::search::SearchEngine;
use oxide_chess::tables::Tables;
use oxide_chess::time_manager::SearchLimits;

const POSITIONS: &[(&str, &str)] = &[
    ("startpos", "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"),
    ("kiwipete", "r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"),
    ("endgame", "8/2p5/3p4/KP5r/1R3p1k/8/4P1P1/8 w - - 0 1"),
];

const DEPTH: i32 = 5;

fn bench_search(c: &mut Criterion) {
    let tables = Arc::new(Tables::new());

    let mut group = c.benchmark_group("search_fixed_depth");
    group.warm_up_time(Duration::from_secs(1));
    group.measurement_time(Duration::from_secs(6));
    group.sample_size(10);

    for (name, fen) in POSITIONS {
        let board = Board::from_fen(fen, &tables.zobrist).expect("benchmark FEN should parse");

        group.bench_with_input(BenchmarkId::from_parameter(name), &board, |b, board| {
            b.iter(|| {
                // fresh tables every run so iterations are comparable
                let mut engine = SearchEngine::new(Arc::clone(&tables), 16);
                let result = engine.search(black_box(board), &SearchLimits::depth(DEPTH), |_| {});
                assert!(result.best_move.is_some());
                black_box(result.nodes)
            });
        });
    }

    group.finish();
}

criterion_group!(search_benches, bench_search);
criterion_main!(search_benches);
