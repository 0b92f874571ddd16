//! Decomposition animation state machine.
//!
//! The machine is a pure function [`transition`] from `(state, event)` to the
//! next state, the step indices observers must be told about, and a timer
//! command. [`AnimationController`] applies transitions, talks to a
//! [`TickScheduler`] and fans notifications out to observers.
//!
//! Playback is one-shot: after `start`, each tick advances one stage; the
//! tick that reaches the final stage also stops the machine and returns it
//! to stage 0.

use crate::error::{CoreError, CoreResult};
use crate::frame::{AnimationStage, FINAL_STEP};
use crate::traits::{StepObserver, TickScheduler, TickToken};
use log::{debug, trace, warn};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationSettings {
    pub step_duration_ms: u32,
    pub min_step_duration_ms: u32,
    pub max_step_duration_ms: u32,
}

impl Default for AnimationSettings {
    fn default() -> Self {
        Self {
            step_duration_ms: 1000,
            min_step_duration_ms: 500,
            max_step_duration_ms: 3000,
        }
    }
}

impl AnimationSettings {
    pub fn check_duration(&self, ms: u32) -> CoreResult<()> {
        if ms < self.min_step_duration_ms || ms > self.max_step_duration_ms {
            return Err(CoreError::invalid_setting(
                "step_duration_ms",
                ms as f64,
                format!(
                    "must be in [{}, {}]",
                    self.min_step_duration_ms, self.max_step_duration_ms
                ),
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnimationState {
    /// In `[0, 4]`.
    pub step_index: usize,
    pub running: bool,
    pub step_duration_ms: u32,
}

impl AnimationState {
    pub fn new(step_duration_ms: u32) -> Self {
        Self {
            step_index: 0,
            running: false,
            step_duration_ms,
        }
    }

    pub fn stage(&self) -> AnimationStage {
        AnimationStage::ALL[self.step_index.min(FINAL_STEP)]
    }

    fn describe(&self) -> &'static str {
        if self.running {
            "running"
        } else {
            "stopped"
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnimationEvent {
    Start,
    Tick,
    Stop,
    Reset,
    StepForward,
    StepBackward,
    SetSpeed(u32),
    /// The input matrix was edited; any playback belongs to the old matrix.
    MatrixChanged,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    Keep,
    /// Schedule the next tick after `step_duration_ms`.
    Schedule,
    Cancel,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub state: AnimationState,
    /// Step indices to announce, in order.
    pub notify: Vec<usize>,
    pub timer: TimerCommand,
}

impl Transition {
    fn unchanged(state: AnimationState) -> Self {
        Self {
            state,
            notify: Vec::new(),
            timer: TimerCommand::Keep,
        }
    }
}

fn misuse(action: &'static str, state: &AnimationState) -> CoreError {
    CoreError::AnimationMisuse {
        action,
        state: state.describe(),
    }
}

/// Applies `event` to `state`. Rejected events leave the state untouched.
pub fn transition(
    state: AnimationState,
    event: AnimationEvent,
    settings: &AnimationSettings,
) -> CoreResult<Transition> {
    let mut next = state;
    let mut notify = Vec::new();

    let timer = match event {
        AnimationEvent::Start => {
            if state.running {
                return Err(misuse("start", &state));
            }
            next.running = true;
            next.step_index = 0;
            if state.step_index != 0 {
                notify.push(0);
            }
            TimerCommand::Schedule
        }
        AnimationEvent::Tick => {
            if !state.running {
                return Ok(Transition::unchanged(state));
            }
            next.step_index = (state.step_index + 1).min(FINAL_STEP);
            notify.push(next.step_index);
            if next.step_index == FINAL_STEP {
                next.running = false;
                next.step_index = 0;
                notify.push(0);
                TimerCommand::Keep
            } else {
                TimerCommand::Schedule
            }
        }
        AnimationEvent::Stop => {
            next.running = false;
            next.step_index = 0;
            TimerCommand::Cancel
        }
        AnimationEvent::Reset | AnimationEvent::MatrixChanged => {
            next.running = false;
            next.step_index = 0;
            notify.push(0);
            TimerCommand::Cancel
        }
        AnimationEvent::StepForward | AnimationEvent::StepBackward => {
            if state.running {
                let action = if event == AnimationEvent::StepForward {
                    "step forward"
                } else {
                    "step backward"
                };
                return Err(misuse(action, &state));
            }
            next.step_index = if event == AnimationEvent::StepForward {
                (state.step_index + 1).min(FINAL_STEP)
            } else {
                state.step_index.saturating_sub(1)
            };
            if next.step_index != state.step_index {
                notify.push(next.step_index);
            }
            TimerCommand::Keep
        }
        AnimationEvent::SetSpeed(ms) => {
            if state.running {
                return Err(misuse("change speed", &state));
            }
            settings.check_duration(ms)?;
            next.step_duration_ms = ms;
            TimerCommand::Keep
        }
    };

    Ok(Transition {
        state: next,
        notify,
        timer,
    })
}

/// Stateful driver around [`transition`].
pub struct AnimationController<S: TickScheduler> {
    state: AnimationState,
    settings: AnimationSettings,
    scheduler: S,
    observers: Vec<Box<dyn StepObserver>>,
    pending: Option<TickToken>,
    next_token: u64,
}

impl<S: TickScheduler> AnimationController<S> {
    pub fn new(settings: AnimationSettings, scheduler: S) -> CoreResult<Self> {
        if settings.min_step_duration_ms > settings.max_step_duration_ms {
            return Err(CoreError::invalid_setting(
                "min_step_duration_ms",
                settings.min_step_duration_ms as f64,
                "must not exceed max_step_duration_ms",
            ));
        }
        settings.check_duration(settings.step_duration_ms)?;
        Ok(Self {
            state: AnimationState::new(settings.step_duration_ms),
            settings,
            scheduler,
            observers: Vec::new(),
            pending: None,
            next_token: 0,
        })
    }

    pub fn state(&self) -> AnimationState {
        self.state
    }

    pub fn stage(&self) -> AnimationStage {
        self.state.stage()
    }

    pub fn settings(&self) -> &AnimationSettings {
        &self.settings
    }

    pub fn scheduler(&self) -> &S {
        &self.scheduler
    }

    pub fn pending_tick(&self) -> Option<TickToken> {
        self.pending
    }

    pub fn on_step_change(&mut self, observer: impl StepObserver + 'static) {
        self.observers.push(Box::new(observer));
    }

    pub fn start(&mut self) -> CoreResult<()> {
        self.dispatch(AnimationEvent::Start)
    }

    pub fn stop(&mut self) -> CoreResult<()> {
        self.dispatch(AnimationEvent::Stop)
    }

    pub fn reset(&mut self) -> CoreResult<()> {
        self.dispatch(AnimationEvent::Reset)
    }

    pub fn step_forward(&mut self) -> CoreResult<()> {
        self.dispatch(AnimationEvent::StepForward)
    }

    pub fn step_backward(&mut self) -> CoreResult<()> {
        self.dispatch(AnimationEvent::StepBackward)
    }

    pub fn set_speed(&mut self, ms: u32) -> CoreResult<()> {
        self.dispatch(AnimationEvent::SetSpeed(ms))
    }

    pub fn matrix_changed(&mut self) -> CoreResult<()> {
        self.dispatch(AnimationEvent::MatrixChanged)
    }

    /// Delivers a scheduled tick. Returns false if the token is stale
    /// (cancelled or superseded) and the tick was dropped.
    pub fn tick(&mut self, token: TickToken) -> bool {
        if self.pending != Some(token) {
            trace!("dropping stale tick {:?}", token);
            return false;
        }
        self.pending = None;
        // Ticks are never rejected by `transition`.
        if let Err(err) = self.dispatch(AnimationEvent::Tick) {
            warn!("tick rejected: {err}");
        }
        true
    }

    fn dispatch(&mut self, event: AnimationEvent) -> CoreResult<()> {
        let transition = transition(self.state, event, &self.settings).map_err(|err| {
            warn!("{:?} rejected: {}", event, err);
            err
        })?;

        debug!(
            "{:?}: step {} -> {}, running {} -> {}",
            event,
            self.state.step_index,
            transition.state.step_index,
            self.state.running,
            transition.state.running
        );
        self.state = transition.state;

        match transition.timer {
            TimerCommand::Keep => {}
            TimerCommand::Cancel => self.cancel_pending(),
            TimerCommand::Schedule => {
                self.cancel_pending();
                let token = TickToken(self.next_token);
                self.next_token += 1;
                self.pending = Some(token);
                self.scheduler.schedule(token, self.state.step_duration_ms);
            }
        }

        for step in transition.notify {
            for observer in &mut self.observers {
                observer.on_step_change(step);
            }
        }
        Ok(())
    }

    fn cancel_pending(&mut self) {
        if let Some(token) = self.pending.take() {
            self.scheduler.cancel(token);
        }
    }
}

/// Virtual-time scheduler: ticks fire only when the owner advances the clock.
#[derive(Debug, Default, Clone)]
pub struct ManualScheduler {
    now_ms: u64,
    queue: Vec<(u64, TickToken)>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn now_ms(&self) -> u64 {
        self.now_ms
    }

    pub fn pending_count(&self) -> usize {
        self.queue.len()
    }

    /// Removes the earliest tick due at or before `deadline` and moves the
    /// clock to its due time.
    fn pop_due(&mut self, deadline: u64) -> Option<TickToken> {
        let (pos, &(due, token)) = self
            .queue
            .iter()
            .enumerate()
            .filter(|(_, (due, _))| *due <= deadline)
            .min_by_key(|(_, (due, token))| (*due, token.0))?;
        self.queue.remove(pos);
        self.now_ms = due;
        Some(token)
    }
}

impl TickScheduler for ManualScheduler {
    fn schedule(&mut self, token: TickToken, delay_ms: u32) {
        self.queue.push((self.now_ms + delay_ms as u64, token));
    }

    fn cancel(&mut self, token: TickToken) {
        self.queue.retain(|(_, t)| *t != token);
    }
}

impl AnimationController<ManualScheduler> {
    /// Advances virtual time by `ms`, delivering every tick that falls due.
    /// Returns the number of ticks delivered.
    pub fn advance(&mut self, ms: u64) -> usize {
        let deadline = self.scheduler.now_ms + ms;
        let mut delivered = 0;
        while let Some(token) = self.scheduler.pop_due(deadline) {
            if self.tick(token) {
                delivered += 1;
            }
        }
        self.scheduler.now_ms = deadline;
        delivered
    }
}
