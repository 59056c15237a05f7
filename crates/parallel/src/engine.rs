//! Data-parallel primitives over keyed collections
//!
//! Every operation takes ownership of its input and returns a fresh output,
//! so partitions never share mutable state.

use crate::strategy::{EngineError, ProcessingMode};
use rayon::prelude::*;
use std::collections::HashMap;
use std::hash::Hash;
use std::sync::Arc;
use tracing::debug;

/// Execution handle passed explicitly to every stage that fans out work.
#[derive(Debug, Clone)]
pub struct Engine {
    mode: ProcessingMode,
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl Default for Engine {
    fn default() -> Self {
        Self {
            mode: ProcessingMode::Parallel,
            pool: None,
        }
    }
}

impl Engine {
    /// Create an engine, building a dedicated pool for `ParallelWith`
    pub fn new(mode: ProcessingMode) -> Result<Self, EngineError> {
        let pool = match mode {
            ProcessingMode::ParallelWith(0) => return Err(EngineError::ZeroThreads),
            ProcessingMode::ParallelWith(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .thread_name(|i| format!("tilestack-{}", i))
                    .build()
                    .map_err(|source| EngineError::PoolBuild { threads, source })?;
                debug!(threads, "built dedicated thread pool");
                Some(Arc::new(pool))
            }
            ProcessingMode::Sequential | ProcessingMode::Parallel => None,
        };
        Ok(Self { mode, pool })
    }

    /// Single-threaded engine; never fails to build
    pub fn local() -> Self {
        Self {
            mode: ProcessingMode::Sequential,
            pool: None,
        }
    }

    pub fn mode(&self) -> ProcessingMode {
        self.mode
    }

    /// Number of worker threads work is spread over
    pub fn threads(&self) -> usize {
        match (&self.mode, &self.pool) {
            (ProcessingMode::Sequential, _) => 1,
            (_, Some(pool)) => pool.current_num_threads(),
            (_, None) => rayon::current_num_threads(),
        }
    }

    fn is_sequential(&self) -> bool {
        self.mode == ProcessingMode::Sequential
    }

    fn install<R, F>(&self, f: F) -> R
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        match &self.pool {
            Some(pool) => pool.install(f),
            None => f(),
        }
    }

    /// Per-element map
    pub fn map<T, U, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        F: Fn(T) -> U + Sync + Send,
    {
        if self.is_sequential() {
            return items.into_iter().map(f).collect();
        }
        self.install(|| items.into_par_iter().map(f).collect())
    }

    /// Per-element fallible map; the first error wins
    pub fn try_map<T, U, E, F>(&self, items: Vec<T>, f: F) -> Result<Vec<U>, E>
    where
        T: Send,
        U: Send,
        E: Send,
        F: Fn(T) -> Result<U, E> + Sync + Send,
    {
        if self.is_sequential() {
            return items.into_iter().map(f).collect();
        }
        self.install(|| items.into_par_iter().map(f).collect())
    }

    /// Per-element flat-map; output order follows input order
    pub fn flat_map<T, U, I, F>(&self, items: Vec<T>, f: F) -> Vec<U>
    where
        T: Send,
        U: Send,
        I: IntoIterator<Item = U>,
        F: Fn(T) -> I + Sync + Send,
    {
        if self.is_sequential() {
            return items.into_iter().flat_map(f).collect();
        }
        self.install(|| items.into_par_iter().flat_map_iter(f).collect())
    }

    /// Inner join by key.
    ///
    /// Left entries without a matching right key are dropped, and so are right
    /// entries without a matching left key. Output follows left order.
    pub fn join_by_key<K, A, B>(&self, left: Vec<(K, A)>, right: Vec<(K, B)>) -> Vec<(K, (A, B))>
    where
        K: Eq + Hash + Clone + Send + Sync,
        A: Clone + Send,
        B: Clone + Send + Sync,
    {
        let mut index: HashMap<K, Vec<B>> = HashMap::with_capacity(right.len());
        for (k, b) in right {
            index.entry(k).or_default().push(b);
        }
        let index = &index;
        let probe = move |(k, a): (K, A)| -> Vec<(K, (A, B))> {
            let Some((last, rest)) = index.get(&k).and_then(|bs| bs.split_last()) else {
                return Vec::new();
            };
            let mut out = Vec::with_capacity(rest.len() + 1);
            for b in rest {
                out.push((k.clone(), (a.clone(), b.clone())));
            }
            out.push((k, (a, last.clone())));
            out
        };
        self.flat_map(left, probe)
    }

    /// Group values by key; group order is unspecified, value order within a
    /// group follows input order
    pub fn group_by_key<K, V>(&self, items: Vec<(K, V)>) -> Vec<(K, Vec<V>)>
    where
        K: Eq + Hash + Send,
        V: Send,
    {
        if self.is_sequential() {
            let mut groups: HashMap<K, Vec<V>> = HashMap::new();
            for (k, v) in items {
                groups.entry(k).or_default().push(v);
            }
            return groups.into_iter().collect();
        }
        self.install(|| {
            items
                .into_par_iter()
                .fold(HashMap::new, |mut acc: HashMap<K, Vec<V>>, (k, v)| {
                    acc.entry(k).or_default().push(v);
                    acc
                })
                .reduce(HashMap::new, |mut a, b| {
                    for (k, mut vs) in b {
                        a.entry(k).or_default().append(&mut vs);
                    }
                    a
                })
                .into_iter()
                .collect()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engines() -> Vec<Engine> {
        vec![
            Engine::local(),
            Engine::default(),
            Engine::new(ProcessingMode::ParallelWith(2)).unwrap(),
        ]
    }

    #[test]
    fn test_zero_threads_rejected() {
        assert!(matches!(
            Engine::new(ProcessingMode::ParallelWith(0)),
            Err(EngineError::ZeroThreads)
        ));
    }

    #[test]
    fn test_map_preserves_order() {
        for engine in engines() {
            let out = engine.map((0..100).collect(), |x: i32| x * 2);
            assert_eq!(out, (0..100).map(|x| x * 2).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_try_map_propagates_error() {
        let engine = Engine::local();
        let out: Result<Vec<i32>, String> =
            engine.try_map(vec![1, 2, 3], |x| if x == 2 { Err("two".to_string()) } else { Ok(x) });
        assert_eq!(out.unwrap_err(), "two");
    }

    #[test]
    fn test_flat_map() {
        for engine in engines() {
            let out = engine.flat_map(vec![1usize, 2, 3], |n| vec![n; n]);
            assert_eq!(out, vec![1, 2, 2, 3, 3, 3]);
        }
    }

    #[test]
    fn test_join_is_inner() {
        for engine in engines() {
            let left = vec![(1, "a"), (2, "b"), (3, "c")];
            let right = vec![(2, 20), (3, 30), (4, 40)];
            let joined = engine.join_by_key(left, right);
            assert_eq!(joined, vec![(2, ("b", 20)), (3, ("c", 30))]);
        }
    }

    #[test]
    fn test_group_by_key() {
        for engine in engines() {
            let items: Vec<(u32, u32)> = (0..1000).map(|i| (i % 7, i)).collect();
            let mut groups = engine.group_by_key(items);
            groups.sort_by_key(|(k, _)| *k);
            assert_eq!(groups.len(), 7);
            let total: usize = groups.iter().map(|(_, v)| v.len()).sum();
            assert_eq!(total, 1000);
            assert!(groups[3].1.iter().all(|v| v % 7 == 3));
        }
    }
}
