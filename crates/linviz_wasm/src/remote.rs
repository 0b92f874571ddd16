//! Compute-service payload helpers. The network call itself stays in JS.

use crate::shared::{from_js, js_error, square_from_js, to_js};
use linviz_core::remote::{
    describe_failure, ComputeRequest, Operation, RemoteEigenPayload, RemoteSvdPayload,
};
use wasm_bindgen::prelude::*;

/// Builds the JSON body for `/api/compute`. `matrix_b` is required for
/// `add`, `subtract` and `multiply` and must be absent otherwise.
#[wasm_bindgen]
pub fn build_compute_request(
    operation: JsValue,
    matrix: JsValue,
    matrix_b: JsValue,
) -> Result<JsValue, JsValue> {
    let operation: Operation = from_js(operation, "operation")?;
    let a = square_from_js(matrix)?;
    let request = if matrix_b.is_undefined() || matrix_b.is_null() {
        ComputeRequest::unary(operation, a)
    } else {
        ComputeRequest::binary(operation, a, square_from_js(matrix_b)?)
    }
    .map_err(|e| js_error("Invalid request", e))?;
    to_js(&request)
}

/// Converts the service's eigen result into the local `EigenResult` shape.
#[wasm_bindgen]
pub fn normalize_remote_eigen(result: JsValue) -> Result<JsValue, JsValue> {
    let payload: RemoteEigenPayload = from_js(result, "eigen result")?;
    let eigen = payload
        .into_eigen_result()
        .map_err(|e| js_error("Eigen result rejected", e))?;
    to_js(&eigen)
}

#[wasm_bindgen]
pub fn normalize_remote_svd(result: JsValue) -> Result<JsValue, JsValue> {
    let payload: RemoteSvdPayload = from_js(result, "SVD result")?;
    let svd = payload
        .into_svd_result()
        .map_err(|e| js_error("SVD result rejected", e))?;
    to_js(&svd)
}

#[wasm_bindgen]
pub fn failure_message(status: u16, body: &str) -> String {
    describe_failure(status, body)
}
