//! Compiled-in tunables plus an environment-variable override layer, so
//! the engine's run parameters can be flipped with `KWIRK_*` environment
//! variables instead of recompiling for every run.

use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchMode {
    Bfs,
    Dfs,
}

impl FromStr for SearchMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bfs" => Ok(SearchMode::Bfs),
            "dfs" => Ok(SearchMode::Dfs),
            other => Err(format!("unknown search mode {other:?}, expected \"bfs\" or \"dfs\"")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheMode {
    HashTable,
    Splay,
}

impl FromStr for CacheMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hash" | "hashtable" => Ok(CacheMode::HashTable),
            "splay" => Ok(CacheMode::Splay),
            other => Err(format!("unknown cache mode {other:?}, expected \"hash\" or \"splay\"")),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapMode {
    Ram,
    File,
    Mmap,
}

impl FromStr for SwapMode {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ram" => Ok(SwapMode::Ram),
            "file" => Ok(SwapMode::File),
            "mmap" => Ok(SwapMode::Mmap),
            other => Err(format!("unknown swap mode {other:?}, expected \"ram\", \"file\" or \"mmap\"")),
        }
    }
}

/// Every tunable the search engine reads before starting a run. `Default`
/// gives the compiled-in values; `from_env` layers `KWIRK_*` environment
/// variables on top of those, matching unset variables to the default
/// rather than erroring.
#[derive(Debug, Clone)]
pub struct Config {
    pub search_mode: SearchMode,
    pub cache_mode: CacheMode,
    pub swap_mode: SwapMode,
    pub cache_capacity: usize,
    pub node_capacity: u32,
    pub bucket_count: usize,
    pub thread_count: usize,
    pub max_frames: Option<u32>,
    /// The puzzle identifier selecting which board to load; also names the
    /// default node-dump file, `nodes-<LEVEL>.bin`.
    pub level: u32,
    /// Whether to dump every allocated node to `nodes-<LEVEL>.bin` after the
    /// run. Off by default since the dump is the size of the whole node
    /// store; the original only wrote it when explicitly invoked.
    pub dump_nodes: bool,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            search_mode: SearchMode::Bfs,
            cache_mode: CacheMode::HashTable,
            swap_mode: SwapMode::Ram,
            cache_capacity: 1 << 16,
            node_capacity: 1 << 24,
            bucket_count: (1 << 20) + 7,
            thread_count: num_cpus::get(),
            max_frames: None,
            level: 1,
            dump_nodes: false,
        }
    }
}

impl Config {
    /// The default path an end-of-run node dump is written to:
    /// `nodes-<LEVEL>.bin`, matching the original's `dumpNodesToDisk()`.
    pub fn dump_nodes_path(&self) -> std::path::PathBuf {
        std::path::PathBuf::from(format!("nodes-{}.bin", self.level))
    }
}

impl Config {
    /// Starts from `Default::default()` and overrides each field whose
    /// `KWIRK_*` variable is set and parses; an unset variable keeps the
    /// default, a set-but-unparseable one returns a `BadArguments` error
    /// naming the offending variable.
    pub fn from_env() -> Result<Config, crate::error::SearchError> {
        let mut config = Config::default();

        if let Some(v) = env_var("KWIRK_SEARCH_MODE")? {
            config.search_mode = parse_env("KWIRK_SEARCH_MODE", &v)?;
        }
        if let Some(v) = env_var("KWIRK_CACHE_MODE")? {
            config.cache_mode = parse_env("KWIRK_CACHE_MODE", &v)?;
        }
        if let Some(v) = env_var("KWIRK_SWAP_MODE")? {
            config.swap_mode = parse_env("KWIRK_SWAP_MODE", &v)?;
        }
        if let Some(v) = env_var("KWIRK_CACHE_CAPACITY")? {
            config.cache_capacity = parse_env("KWIRK_CACHE_CAPACITY", &v)?;
        }
        if let Some(v) = env_var("KWIRK_NODE_CAPACITY")? {
            config.node_capacity = parse_env("KWIRK_NODE_CAPACITY", &v)?;
        }
        if let Some(v) = env_var("KWIRK_BUCKET_COUNT")? {
            config.bucket_count = parse_env("KWIRK_BUCKET_COUNT", &v)?;
        }
        if let Some(v) = env_var("KWIRK_THREADS")? {
            config.thread_count = parse_env("KWIRK_THREADS", &v)?;
        }
        if let Some(v) = env_var("KWIRK_MAX_FRAMES")? {
            config.max_frames = Some(parse_env("KWIRK_MAX_FRAMES", &v)?);
        }
        if let Some(v) = env_var("KWIRK_LEVEL")? {
            config.level = parse_env("KWIRK_LEVEL", &v)?;
        }
        if let Some(v) = env_var("KWIRK_DUMP_NODES")? {
            config.dump_nodes = parse_env("KWIRK_DUMP_NODES", &v)?;
        }

        Ok(config)
    }
}

fn env_var(name: &str) -> Result<Option<String>, crate::error::SearchError> {
    match std::env::var(name) {
        Ok(v) => Ok(Some(v)),
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(std::env::VarError::NotUnicode(_)) => {
            Err(crate::error::SearchError::BadArguments(format!("{name} is not valid UTF-8")))
        }
    }
}

fn parse_env<T: FromStr>(name: &str, value: &str) -> Result<T, crate::error::SearchError>
where
    T::Err: std::fmt::Display,
{
    value
        .parse()
        .map_err(|e| crate::error::SearchError::BadArguments(format!("{name}={value:?}: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_has_bfs_and_hash_cache() {
        let config = Config::default();
        assert_eq!(config.search_mode, SearchMode::Bfs);
        assert_eq!(config.cache_mode, CacheMode::HashTable);
    }

    #[test]
    fn search_mode_parses_case_insensitively() {
        assert_eq!("BFS".parse::<SearchMode>().unwrap(), SearchMode::Bfs);
        assert_eq!("dfs".parse::<SearchMode>().unwrap(), SearchMode::Dfs);
        assert!("bogus".parse::<SearchMode>().is_err());
    }

    #[test]
    fn swap_mode_rejects_unknown_values() {
        assert!("bogus".parse::<SwapMode>().is_err());
    }

    #[test]
    fn dump_nodes_path_is_named_after_the_level() {
        let mut config = Config::default();
        config.level = 7;
        assert_eq!(config.dump_nodes_path(), std::path::PathBuf::from("nodes-7.bin"));
    }
}
