//! OxideChess - UCI Chess Engine
//!
//! Usage:
//!     oxide_chess
//!
//! The engine reads UCI commands from stdin and writes responses to stdout.
//! Logs go to stderr; set `RUST_LOG` (default `warn`) to see more.

use oxide_chess::uci::UCIProtocol;
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .init();

    let mut uci = UCIProtocol::new();
    uci.run();
}
