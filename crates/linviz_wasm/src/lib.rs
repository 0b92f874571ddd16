//! WASM bridge for `linviz_core`.
//!
//! Matrices cross the boundary as nested arrays of rows. Results come back as
//! plain JS objects through `serde_wasm_bindgen`.

mod analysis;
mod animation;
mod remote;
mod shared;

pub use analysis::*;
pub use animation::WasmAnimationController;
pub use remote::*;
