//! Conversions shared by the bridge functions.

use linviz_core::matrix::{Matrix2, SquareMatrix};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_wasm_bindgen::{from_value, to_value};
use wasm_bindgen::prelude::*;

pub(crate) fn js_error(context: &str, err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{}: {}", context, err))
}

pub(crate) fn to_js<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    to_value(value).map_err(|e| js_error("Serialization error", e))
}

pub(crate) fn from_js<T: DeserializeOwned>(value: JsValue, what: &str) -> Result<T, JsValue> {
    from_value(value).map_err(|e| js_error(&format!("Invalid {}", what), e))
}

pub(crate) fn rows_from_js(rows: JsValue) -> Result<Vec<Vec<f64>>, JsValue> {
    from_js(rows, "matrix rows")
}

pub(crate) fn matrix2_from_js(rows: JsValue) -> Result<Matrix2, JsValue> {
    let rows = rows_from_js(rows)?;
    Matrix2::from_rows(&rows).map_err(|e| JsValue::from_str(&e.to_string()))
}

pub(crate) fn square_from_js(rows: JsValue) -> Result<SquareMatrix, JsValue> {
    let rows = rows_from_js(rows)?;
    SquareMatrix::from_rows(&rows).map_err(|e| JsValue::from_str(&e.to_string()))
}
