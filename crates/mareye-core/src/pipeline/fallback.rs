use std::path::Path;

use tracing::{info, warn};

use crate::error::Result;
use crate::quality::Metrics;

/// An enhancement result the fallback controller can judge and discard.
pub trait Evaluated {
    fn metrics(&self) -> &Metrics;

    /// On-disk artifact to delete before retrying, if any.
    fn artifact(&self) -> Option<&Path>;
}

/// Controller states. A run goes `Evaluated` then either `Accepted`, or
/// `Retrying` followed by `Final`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FallbackState {
    Evaluated,
    Accepted,
    Retrying,
    Final,
}

/// Outcome of [`ensure_improvement`].
#[derive(Debug)]
pub struct FallbackOutcome<R> {
    pub result: R,
    /// `Accepted` or `Final`.
    pub state: FallbackState,
}

impl<R> FallbackOutcome<R> {
    pub fn retried(&self) -> bool {
        self.state == FallbackState::Final
    }
}

/// Accept `result` unless its UIQM improvement is negative, in which case
/// its artifact is deleted and `rerun` is invoked exactly once. The rerun's
/// result is final whatever its own improvement.
pub fn ensure_improvement<R, F>(result: R, rerun: F) -> Result<FallbackOutcome<R>>
where
    R: Evaluated,
    F: FnOnce() -> Result<R>,
{
    let mut state = FallbackState::Evaluated;
    let improvement = result.metrics().uiqm_improvement();

    if improvement >= 0.0 {
        state = advance(state, FallbackState::Accepted);
        return Ok(FallbackOutcome { result, state });
    }

    warn!(
        uiqm_improvement = improvement,
        "Enhancement degraded quality, retrying with classical operator"
    );
    if let Some(path) = result.artifact() {
        if path.exists() {
            std::fs::remove_file(path)?;
        }
    }
    drop(result);
    state = advance(state, FallbackState::Retrying);

    let rerun_result = rerun()?;
    info!(
        uiqm_improvement = rerun_result.metrics().uiqm_improvement(),
        "Classical re-run complete"
    );
    state = advance(state, FallbackState::Final);
    Ok(FallbackOutcome {
        result: rerun_result,
        state,
    })
}

fn advance(from: FallbackState, to: FallbackState) -> FallbackState {
    debug_assert!(matches!(
        (from, to),
        (FallbackState::Evaluated, FallbackState::Accepted)
            | (FallbackState::Evaluated, FallbackState::Retrying)
            | (FallbackState::Retrying, FallbackState::Final)
    ));
    to
}
