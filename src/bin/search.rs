//! A minimal CLI driving the demo kernel end to end, so the engine is
//! runnable without wiring up a real game: `search [maxFrames]`.

use kwirk_search::cache::hashtable::HashTableCache;
use kwirk_search::config::{CacheMode, Config, SearchMode};
use kwirk_search::kernel::demo::{open_board, DemoState};
use kwirk_search::node::NodeBfs;
use kwirk_search::path;
use kwirk_search::search::{bfs, SearchOutcome};
use kwirk_search::store::NodeStore;
use kwirk_search::swap::RamSwap;
use kwirk_search::SearchError;

fn parse_args() -> Result<Option<u32>, SearchError> {
    let args: Vec<String> = std::env::args().skip(1).collect();
    match args.as_slice() {
        [] => Ok(None),
        [only] => only
            .parse::<u32>()
            .map(Some)
            .map_err(|e| SearchError::BadArguments(format!("maxFrames {only:?}: {e}"))),
        _ => Err(SearchError::BadArguments(format!("expected at most one argument, got {}", args.len()))),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt::init();

    let max_frames = parse_args()?;
    let mut config = Config::from_env()?;
    if let Some(limit) = max_frames {
        config.max_frames = Some(limit);
    }

    tracing::info!(?config.search_mode, ?config.cache_mode, ?config.swap_mode, "starting search");

    let device: RamSwap<NodeBfs<DemoState>> = RamSwap::open(config.node_capacity)?;
    let store: NodeStore<DemoState, NodeBfs<DemoState>, HashTableCache<_, _>, _> =
        NodeStore::new(device, config.cache_capacity, config.bucket_count, config.node_capacity);

    // `search` ships with only the demo kernel wired in; a real deployment
    // would source the root state and puzzle kernel from its own loader
    // here instead of `kernel::demo::open_board()`.
    let root = open_board();

    let flush_on_exit = scopeguard::guard(&store, |store| {
        if let Err(err) = store.flush() {
            tracing::error!(%err, "failed to flush node store on exit");
        }
    });

    let outcome = match config.search_mode {
        SearchMode::Bfs => bfs::run(&store, root, config.thread_count, config.max_frames)?,
        SearchMode::Dfs => {
            return Err("the `search` binary is wired to the BFS-friendly NodeBfs record; \
                        run with KWIRK_SEARCH_MODE unset or \"bfs\""
                .into())
        }
    };

    match outcome {
        SearchOutcome::Found { goal, stats } => {
            let solution = path::reconstruct(&store, goal)?;
            tracing::info!(
                steps = solution.steps.len(),
                total_frames = solution.total_frames,
                nodes = store.node_count(),
                expanded = stats.total.states_expanded,
                cache_hits = stats.total.hits,
                cache_misses = stats.total.misses,
                collisions = stats.collisions,
                "solution found"
            );
            println!("solved in {} steps, {} frames", solution.steps.len(), solution.total_frames);
            if config.dump_nodes {
                let dump_path = config.dump_nodes_path();
                store.dump_nodes(&dump_path)?;
                tracing::info!(path = %dump_path.display(), nodes = store.node_count(), "dumped nodes to disk");
            }
        }
        SearchOutcome::Exhausted { stats } => {
            tracing::info!(nodes = store.node_count(), expanded = stats.total.states_expanded, "search space exhausted without finding a goal");
            println!("no solution exists");
            drop(flush_on_exit);
            std::process::exit(1);
        }
        SearchOutcome::FrameBudgetExceeded { frames_searched, stats } => {
            tracing::info!(frames_searched, expanded = stats.total.states_expanded, "frame budget exceeded");
            println!("no solution found within {frames_searched} frames");
            drop(flush_on_exit);
            std::process::exit(1);
        }
        SearchOutcome::ShutdownRequested { stats } => {
            // `bfs::run`/`dfs::run` never pass a shutdown flag, so this
            // binary can't observe this outcome today; matched here so the
            // arm stays exhaustive for embedders that switch to
            // `run_cancellable`.
            tracing::info!(nodes = store.node_count(), expanded = stats.total.states_expanded, "search cancelled");
            println!("search cancelled before a solution was found");
            drop(flush_on_exit);
            std::process::exit(1);
        }
    }

    drop(flush_on_exit);
    Ok(())
}
