//! Stateless analysis, frame and projection entry points.

use crate::shared::{from_js, js_error, matrix2_from_js, square_from_js, to_js};
use linviz_core::analysis::{
    analyze_matrix as core_analyze_matrix, analyze_square as core_analyze_square,
};
use linviz_core::frame::{compute_frame_with, AnimationStage, FrameOptions};
use linviz_core::svd::svd_result;
use linviz_core::viewport::Viewport;
use wasm_bindgen::prelude::*;

fn frame_options(options: JsValue) -> Result<FrameOptions, JsValue> {
    if options.is_undefined() || options.is_null() {
        return Ok(FrameOptions::default());
    }
    from_js(options, "frame options")
}

/// Eigen-decomposition and invariants of a 2×2 matrix.
#[wasm_bindgen]
pub fn analyze_matrix(rows: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let matrix = matrix2_from_js(rows)?;
    to_js(&core_analyze_matrix(&matrix))
}

/// Like `analyze_matrix`, also accepting 3×3 input.
#[wasm_bindgen]
pub fn analyze_square(rows: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let matrix = square_from_js(rows)?;
    let analysis =
        core_analyze_square(&matrix).map_err(|e| js_error("Matrix analysis failed", e))?;
    to_js(&analysis)
}

#[wasm_bindgen]
pub fn compute_svd(rows: JsValue) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let matrix = square_from_js(rows)?;
    to_js(&svd_result(&matrix))
}

#[wasm_bindgen]
pub fn compute_frame(
    rows: JsValue,
    step_index: u32,
    progress: f64,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let matrix = matrix2_from_js(rows)?;
    let options = frame_options(options)?;
    let frame = compute_frame_with(&matrix, step_index as usize, progress, &options)
        .map_err(|e| js_error("Frame computation failed", e))?;
    to_js(&frame)
}

/// Computes a frame and projects it into screen space in one call.
#[wasm_bindgen]
pub fn compute_screen_frame(
    rows: JsValue,
    step_index: u32,
    progress: f64,
    viewport: JsValue,
    options: JsValue,
) -> Result<JsValue, JsValue> {
    console_error_panic_hook::set_once();
    let matrix = matrix2_from_js(rows)?;
    let viewport: Viewport = from_js(viewport, "viewport")?;
    let options = frame_options(options)?;
    let frame = compute_frame_with(&matrix, step_index as usize, progress, &options)
        .map_err(|e| js_error("Frame computation failed", e))?;
    to_js(&viewport.project(&frame))
}

#[wasm_bindgen]
pub fn fit_viewport(container_width: Option<f64>, window_width: f64) -> Result<JsValue, JsValue> {
    let viewport = Viewport::fit(container_width, window_width)
        .map_err(|e| js_error("Viewport sizing failed", e))?;
    to_js(&viewport)
}

#[wasm_bindgen]
pub fn stage_label(step_index: u32) -> Result<String, JsValue> {
    AnimationStage::from_index(step_index as usize)
        .map(|stage| stage.label().to_string())
        .map_err(|e| JsValue::from_str(&e.to_string()))
}
