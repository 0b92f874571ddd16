use serde::{Deserialize, Serialize};

/// Identifies one scheduled tick. A tick whose token is no longer the
/// pending one is dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TickToken(pub u64);

/// External timer that drives the animation.
/// The controller holds no timing logic of its own; it asks the scheduler
/// for a callback and expects `AnimationController::tick(token)` in return.
pub trait TickScheduler {
    /// Requests a tick carrying `token` after `delay_ms`.
    fn schedule(&mut self, token: TickToken, delay_ms: u32);

    /// Cancels a previously scheduled tick. Must be idempotent.
    fn cancel(&mut self, token: TickToken);
}

/// Receives the new step index after every observable state change.
pub trait StepObserver {
    fn on_step_change(&mut self, step_index: usize);
}

impl<F: FnMut(usize)> StepObserver for F {
    fn on_step_change(&mut self, step_index: usize) {
        self(step_index)
    }
}
