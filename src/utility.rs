#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// Maps `op` over `0..len` and collects the results in index order.
///
/// Every multi-child combination point of the traversal (action fan-out,
/// chance fan-out, all-in enumeration) goes through this helper: each child
/// is one unit of work, and the call returns only after all of them have
/// completed, which is the join barrier the combination step relies on.
/// With the `rayon` feature the children run on the global work-stealing
/// pool; without it they run sequentially with identical results.
#[cfg(feature = "rayon")]
#[inline]
pub(crate) fn map_indices<R: Send>(len: usize, op: impl Fn(usize) -> R + Sync + Send) -> Vec<R> {
    (0..len).into_par_iter().map(op).collect()
}

#[cfg(not(feature = "rayon"))]
#[inline]
pub(crate) fn map_indices<R>(len: usize, op: impl Fn(usize) -> R) -> Vec<R> {
    (0..len).map(op).collect()
}
