//! Execution context for bucketing.
//!
//! [`Parallelism`] is passed explicitly into the operations that may run in
//! parallel. Components never consult global state to decide; they only
//! respect this flag. The thread pool itself is set up by the caller, or by
//! [`run_with_threads`].

use rayon::prelude::*;

use crate::error::{DiscretizeError, Result};

/// Inputs smaller than this are always bucketed sequentially.
pub const PARALLEL_MIN_ELEMENTS: usize = 16 * 1024;

// =============================================================================
// Parallelism
// =============================================================================

/// Whether parallel execution is allowed.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Parallelism {
    #[default]
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if the rayon pool has multiple threads)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map `f` over `iter`, in parallel when allowed. Output order matches
    /// input order in both modes.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool)
/// - `n > 1` = use exactly `n` threads
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T> {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()
                .map_err(|e| DiscretizeError::config(format!("failed to create thread pool: {e}")))?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_threads() {
        assert!(!Parallelism::from_threads(1).is_parallel());
        assert!(Parallelism::from_threads(2).is_parallel());
        assert!(Parallelism::from_threads(8).is_parallel());
    }

    #[test]
    fn maybe_par_map_keeps_order() {
        let data: Vec<u32> = (0..1000).collect();
        let seq = Parallelism::Sequential.maybe_par_map(&data[..], |&v| v * 3);
        let par = Parallelism::Parallel.maybe_par_map(&data[..], |&v| v * 3);
        assert_eq!(seq, par);
        assert_eq!(seq[10], 30);
    }

    #[test]
    fn run_with_threads_sequential() {
        assert_eq!(run_with_threads(1, |p| p).unwrap(), Parallelism::Sequential);
    }

    #[test]
    fn run_with_threads_explicit() {
        let n = run_with_threads(2, |_| rayon::current_num_threads()).unwrap();
        assert_eq!(n, 2);
    }
}
