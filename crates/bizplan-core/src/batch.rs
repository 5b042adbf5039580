#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// Evaluates `f` over independent inputs, returning results in input order.
///
/// With the `parallel` feature the map runs on the rayon pool; results
/// are identical either way because every evaluation is a pure function
/// of its input.
#[cfg(feature = "parallel")]
pub fn evaluate_batch<I, O, F>(inputs: &[I], f: F) -> Vec<O>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> O + Sync + Send,
{
    tracing::debug!(items = inputs.len(), "evaluating batch in parallel");
    inputs.par_iter().map(f).collect()
}

#[cfg(not(feature = "parallel"))]
pub fn evaluate_batch<I, O, F>(inputs: &[I], f: F) -> Vec<O>
where
    I: Sync,
    O: Send,
    F: Fn(&I) -> O + Sync + Send,
{
    tracing::debug!(items = inputs.len(), "evaluating batch sequentially");
    inputs.iter().map(f).collect()
}
