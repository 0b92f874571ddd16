//! Animation controller driven by JS timers.
//!
//! JS owns the clock: the controller calls `schedule(token, delayMs)` and
//! `cancel(token)`, and expects `tick(token)` back when a timer fires. Both
//! callbacks must not call back into the controller synchronously.
//!
//! Step observers are never called while a controller method is running.
//! Notifications are queued during the call and handed to `defer`
//! (`queueMicrotask` unless another is given) once the call returns, so an
//! observer may freely call `get_state`, `stop` and the rest.

use crate::shared::{from_js, js_error, to_js};
use js_sys::{Function, Reflect};
use linviz_core::animation::{AnimationController, AnimationSettings, AnimationState};
use linviz_core::error::CoreError;
use linviz_core::traits::{TickScheduler, TickToken};
use log::warn;
use std::cell::RefCell;
use std::rc::Rc;
use wasm_bindgen::prelude::*;
use wasm_bindgen::JsCast;

struct JsScheduler {
    schedule: Function,
    cancel: Function,
}

impl TickScheduler for JsScheduler {
    fn schedule(&mut self, token: TickToken, delay_ms: u32) {
        let result = self.schedule.call2(
            &JsValue::NULL,
            &JsValue::from_f64(token.0 as f64),
            &JsValue::from(delay_ms),
        );
        if let Err(err) = result {
            warn!("schedule callback threw: {:?}", err);
        }
    }

    fn cancel(&mut self, token: TickToken) {
        if let Err(err) = self.cancel.call1(&JsValue::NULL, &JsValue::from_f64(token.0 as f64)) {
            warn!("cancel callback threw: {:?}", err);
        }
    }
}

fn control_error(action: &str, err: CoreError) -> JsValue {
    js_error(&format!("{} failed", action), err)
}

fn queue_microtask() -> Result<Function, JsValue> {
    Reflect::get(&js_sys::global(), &JsValue::from_str("queueMicrotask"))?
        .dyn_into::<Function>()
        .map_err(|_| JsValue::from_str("queueMicrotask is not available"))
}

#[wasm_bindgen]
pub struct WasmAnimationController {
    controller: AnimationController<JsScheduler>,
    /// Steps announced by the core during the current call.
    queued: Rc<RefCell<Vec<usize>>>,
    observers: Vec<Function>,
    defer: Function,
}

#[wasm_bindgen]
impl WasmAnimationController {
    /// `settings` may be `undefined` for the defaults (1000ms steps,
    /// 500..=3000ms range).
    #[wasm_bindgen(constructor)]
    pub fn new(
        schedule: Function,
        cancel: Function,
        settings: JsValue,
        defer: Option<Function>,
    ) -> Result<WasmAnimationController, JsValue> {
        console_error_panic_hook::set_once();

        let settings: AnimationSettings = if settings.is_undefined() || settings.is_null() {
            AnimationSettings::default()
        } else {
            from_js(settings, "animation settings")?
        };
        let defer = match defer {
            Some(defer) => defer,
            None => queue_microtask()?,
        };
        let mut controller = AnimationController::new(settings, JsScheduler { schedule, cancel })
            .map_err(|e| control_error("Controller setup", e))?;

        let queued = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&queued);
        controller.on_step_change(move |step: usize| sink.borrow_mut().push(step));

        Ok(WasmAnimationController {
            controller,
            queued,
            observers: Vec::new(),
            defer,
        })
    }

    /// `callback(stepIndex, state)` runs after the triggering call has
    /// returned. `state` is the controller state at the end of that call.
    pub fn on_step_change(&mut self, callback: Function) {
        self.observers.push(callback);
    }

    pub fn start(&mut self) -> Result<(), JsValue> {
        let result = self.controller.start().map_err(|e| control_error("Start", e));
        self.deliver();
        result
    }

    pub fn stop(&mut self) -> Result<(), JsValue> {
        let result = self.controller.stop().map_err(|e| control_error("Stop", e));
        self.deliver();
        result
    }

    pub fn reset(&mut self) -> Result<(), JsValue> {
        let result = self.controller.reset().map_err(|e| control_error("Reset", e));
        self.deliver();
        result
    }

    pub fn step_forward(&mut self) -> Result<(), JsValue> {
        let result = self
            .controller
            .step_forward()
            .map_err(|e| control_error("Step forward", e));
        self.deliver();
        result
    }

    pub fn step_backward(&mut self) -> Result<(), JsValue> {
        let result = self
            .controller
            .step_backward()
            .map_err(|e| control_error("Step backward", e));
        self.deliver();
        result
    }

    pub fn set_speed(&mut self, step_duration_ms: u32) -> Result<(), JsValue> {
        self.controller
            .set_speed(step_duration_ms)
            .map_err(|e| control_error("Set speed", e))
    }

    pub fn matrix_changed(&mut self) -> Result<(), JsValue> {
        let result = self
            .controller
            .matrix_changed()
            .map_err(|e| control_error("Matrix change", e));
        self.deliver();
        result
    }

    /// Returns false when the token is stale and the tick was ignored.
    pub fn tick(&mut self, token: f64) -> bool {
        let delivered = self.controller.tick(TickToken(token as u64));
        self.deliver();
        delivered
    }

    pub fn get_state(&self) -> Result<JsValue, JsValue> {
        to_js(&self.controller.state())
    }

    pub fn stage_label(&self) -> String {
        self.controller.stage().label().to_string()
    }
}

impl WasmAnimationController {
    /// Hands queued notifications to `defer`; observers run after the
    /// current call has released the controller.
    fn deliver(&mut self) {
        let steps: Vec<usize> = self.queued.borrow_mut().drain(..).collect();
        if steps.is_empty() || self.observers.is_empty() {
            return;
        }
        let state: AnimationState = self.controller.state();
        let state = match to_js(&state) {
            Ok(state) => state,
            Err(err) => {
                warn!("could not serialise animation state: {:?}", err);
                return;
            }
        };
        let observers = self.observers.clone();
        let callback = Closure::once_into_js(move || {
            for step in steps {
                for observer in &observers {
                    if let Err(err) =
                        observer.call2(&JsValue::NULL, &JsValue::from(step as u32), &state)
                    {
                        warn!("step observer threw: {:?}", err);
                    }
                }
            }
        });
        if let Err(err) = self.defer.call1(&JsValue::NULL, &callback) {
            warn!("deferring step notifications failed: {:?}", err);
        }
    }
}
