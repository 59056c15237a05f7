//! Processing modes and engine configuration errors

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// How an [`Engine`](crate::Engine) schedules per-partition work
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingMode {
    /// Single-threaded processing ("local mode")
    Sequential,
    /// Parallel processing on rayon's global pool
    Parallel,
    /// Parallel processing on a dedicated pool with this many threads
    ParallelWith(usize),
}

impl Default for ProcessingMode {
    fn default() -> Self {
        ProcessingMode::Parallel
    }
}

impl fmt::Display for ProcessingMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProcessingMode::Sequential => f.write_str("local"),
            ProcessingMode::Parallel => f.write_str("parallel"),
            ProcessingMode::ParallelWith(n) => write!(f, "parallel[{}]", n),
        }
    }
}

impl FromStr for ProcessingMode {
    type Err = EngineError;

    /// Accepts `local`, `parallel` or a thread count
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" | "sequential" => Ok(ProcessingMode::Sequential),
            "parallel" | "auto" => Ok(ProcessingMode::Parallel),
            other => other
                .parse::<usize>()
                .map(ProcessingMode::ParallelWith)
                .map_err(|_| EngineError::UnknownMode(s.to_string())),
        }
    }
}

/// Failures while configuring the execution engine
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("thread count must be at least 1")]
    ZeroThreads,

    #[error("failed to build a {threads}-thread pool: {source}")]
    PoolBuild {
        threads: usize,
        #[source]
        source: rayon::ThreadPoolBuildError,
    },

    #[error("unknown processing mode '{0}' (expected local, parallel or a thread count)")]
    UnknownMode(String),
}
