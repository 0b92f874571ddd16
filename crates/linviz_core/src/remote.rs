//! Request and response shapes of the remote matrix compute service.
//!
//! Only serialisation lives here. Remote eigen results are normalised into
//! the same [`EigenResult`] the local 2×2 solver produces, so callers can
//! treat both sources alike.

use crate::eigen::{ComplexNumber, EigenResult, EIGEN_EPSILON};
use crate::matrix::SquareMatrix;
use crate::svd::SvdResult;
use anyhow::{anyhow, bail, Context, Result};
use log::warn;
use nalgebra::Vector2;
use serde::{Deserialize, Serialize};

/// Message used when the service gives no usable error text.
pub const FALLBACK_FAILURE: &str = "Computation failed";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Operation {
    Add,
    Subtract,
    Multiply,
    Transpose,
    Determinant,
    Inverse,
    Eigenvalues,
    Svd,
}

impl Operation {
    /// Operations that take `matrixA` and `matrixB` instead of `matrix`.
    pub fn is_binary(self) -> bool {
        matches!(
            self,
            Operation::Add | Operation::Subtract | Operation::Multiply
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeRequest {
    pub operation: Operation,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub matrix: Option<SquareMatrix>,
    #[serde(rename = "matrixA", default, skip_serializing_if = "Option::is_none")]
    pub matrix_a: Option<SquareMatrix>,
    #[serde(rename = "matrixB", default, skip_serializing_if = "Option::is_none")]
    pub matrix_b: Option<SquareMatrix>,
}

impl ComputeRequest {
    pub fn unary(operation: Operation, matrix: SquareMatrix) -> Result<Self> {
        if operation.is_binary() {
            bail!("{:?} needs two matrices", operation);
        }
        Ok(Self {
            operation,
            matrix: Some(matrix),
            matrix_a: None,
            matrix_b: None,
        })
    }

    pub fn binary(operation: Operation, a: SquareMatrix, b: SquareMatrix) -> Result<Self> {
        if !operation.is_binary() {
            bail!("{:?} takes a single matrix", operation);
        }
        if a.size() != b.size() {
            bail!(
                "Matrix size mismatch: {}x{} and {}x{}",
                a.size(),
                a.size(),
                b.size(),
                b.size()
            );
        }
        Ok(Self {
            operation,
            matrix: None,
            matrix_a: Some(a),
            matrix_b: Some(b),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComputeResponse<T> {
    pub result: T,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceError {
    pub error: String,
}

/// Human-readable message for a failed call: the service's own `error`
/// field when present, the fallback otherwise.
pub fn describe_failure(status: u16, body: &str) -> String {
    match serde_json::from_str::<ServiceError>(body) {
        Ok(ServiceError { error }) if !error.trim().is_empty() => error,
        _ => {
            warn!("compute service failed with status {} and no error text", status);
            FALLBACK_FAILURE.to_string()
        }
    }
}

/// A scalar as the service may encode it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RemoteScalar {
    Number(f64),
    Complex { re: f64, im: f64 },
    Text(String),
}

impl RemoteScalar {
    pub fn to_complex(&self) -> Result<ComplexNumber> {
        let value = match self {
            RemoteScalar::Number(re) => ComplexNumber { re: *re, im: 0.0 },
            RemoteScalar::Complex { re, im } => ComplexNumber { re: *re, im: *im },
            RemoteScalar::Text(text) => parse_complex(text)?,
        };
        if !value.re.is_finite() || !value.im.is_finite() {
            bail!("Non-finite value {:?}", self);
        }
        Ok(value)
    }
}

/// Parses `"2"`, `"-1.5"`, `"3i"`, `"-i"`, `"1+2i"`, `"1 - 2j"` and the like.
pub fn parse_complex(text: &str) -> Result<ComplexNumber> {
    let compact: String = text.chars().filter(|c| !c.is_whitespace()).collect();
    let s = compact.trim_start_matches('(').trim_end_matches(')');
    if s.is_empty() {
        bail!("Empty complex number");
    }

    let Some(body) = s.strip_suffix('i').or_else(|| s.strip_suffix('j')) else {
        let re = s
            .parse::<f64>()
            .with_context(|| format!("Invalid number '{}'", text))?;
        return Ok(ComplexNumber { re, im: 0.0 });
    };

    // Split at the last sign that is not part of an exponent.
    let bytes = body.as_bytes();
    let split = (1..bytes.len())
        .rev()
        .find(|&i| {
            (bytes[i] == b'+' || bytes[i] == b'-') && !matches!(bytes[i - 1], b'e' | b'E')
        });

    let (re_part, im_part) = match split {
        Some(i) => (&body[..i], &body[i..]),
        None => ("", body),
    };
    let im = match im_part {
        "" | "+" => 1.0,
        "-" => -1.0,
        other => other
            .parse::<f64>()
            .with_context(|| format!("Invalid imaginary part in '{}'", text))?,
    };
    let re = if re_part.is_empty() {
        0.0
    } else {
        re_part
            .parse::<f64>()
            .with_context(|| format!("Invalid real part in '{}'", text))?
    };
    Ok(ComplexNumber { re, im })
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteEigenPayload {
    pub eigenvalues: Vec<RemoteScalar>,
    /// One vector per eigenvalue, in the same order.
    #[serde(default)]
    pub eigenvectors: Vec<Vec<RemoteScalar>>,
}

impl RemoteEigenPayload {
    pub fn into_eigen_result(self) -> Result<EigenResult> {
        if self.eigenvalues.len() != 2 {
            bail!(
                "Expected 2 eigenvalues for a 2x2 matrix, got {}",
                self.eigenvalues.len()
            );
        }
        let values = self
            .eigenvalues
            .iter()
            .map(RemoteScalar::to_complex)
            .collect::<Result<Vec<_>>>()?;
        if values.iter().any(|v| !v.is_real()) {
            return Ok(EigenResult::ComplexPair);
        }
        if self.eigenvectors.len() != 2 {
            bail!(
                "Expected 2 eigenvectors for real eigenvalues, got {}",
                self.eigenvectors.len()
            );
        }

        let mut pairs = values
            .iter()
            .zip(&self.eigenvectors)
            .enumerate()
            .map(|(i, (value, vector))| Ok((value.re, real_unit_vector(i, vector)?)))
            .collect::<Result<Vec<_>>>()?;
        pairs.sort_by(|a, b| b.0.total_cmp(&a.0));

        let (lambda1, v1) = pairs[0];
        let (lambda2, v2) = pairs[1];
        Ok(EigenResult::RealPair {
            lambda1,
            lambda2,
            v1,
            v2,
        })
    }
}

fn real_unit_vector(index: usize, entries: &[RemoteScalar]) -> Result<Vector2<f64>> {
    if entries.len() != 2 {
        bail!("Eigenvector {} has {} entries, expected 2", index + 1, entries.len());
    }
    let mut v = Vector2::zeros();
    for (k, entry) in entries.iter().enumerate() {
        let c = entry.to_complex()?;
        if !c.is_real() {
            bail!("Eigenvector {} has a complex entry", index + 1);
        }
        v[k] = c.re;
    }
    let norm = v.norm();
    if !norm.is_finite() || norm <= EIGEN_EPSILON {
        return Err(anyhow!("Eigenvector {} has zero length", index + 1));
    }
    Ok(v / norm)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemoteSvdPayload {
    #[serde(rename = "U")]
    pub u: Vec<Vec<f64>>,
    #[serde(rename = "S")]
    pub s: Vec<f64>,
    #[serde(rename = "V")]
    pub v: Vec<Vec<f64>>,
}

impl RemoteSvdPayload {
    pub fn into_svd_result(self) -> Result<SvdResult> {
        let n = self.s.len();
        if n == 0 {
            bail!("SVD result has no singular values");
        }
        for (name, m) in [("U", &self.u), ("V", &self.v)] {
            if m.len() != n || m.iter().any(|row| row.len() != n) {
                bail!("{} must be {}x{}", name, n, n);
            }
        }
        Ok(SvdResult {
            u: self.u,
            s: self.s,
            v: self.v,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::{
        describe_failure, parse_complex, ComputeRequest, ComputeResponse, Operation,
        RemoteEigenPayload, RemoteSvdPayload,
    };
    use crate::eigen::{self, EigenResult};
    use crate::matrix::{Matrix2, SquareMatrix};
    use nalgebra::Vector2;
    use serde_json::json;

    fn assert_err_contains<T: std::fmt::Debug>(result: anyhow::Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        assert!(
            err.to_string().contains(needle),
            "expected '{}' in '{}'",
            needle,
            err
        );
    }

    fn square(rows: [[f64; 2]; 2]) -> SquareMatrix {
        SquareMatrix::Two(Matrix2::new(rows).unwrap())
    }

    #[test]
    fn request_shapes_match_the_service() {
        let req = ComputeRequest::unary(Operation::Eigenvalues, square([[2.0, 0.0], [0.0, 0.5]]))
            .unwrap();
        assert_eq!(
            serde_json::to_value(&req).unwrap(),
            json!({"operation": "eigenvalues", "matrix": [[2.0, 0.0], [0.0, 0.5]]})
        );

        let req = ComputeRequest::binary(
            Operation::Multiply,
            square([[1.0, 2.0], [3.0, 4.0]]),
            SquareMatrix::Two(Matrix2::identity()),
        )
        .unwrap();
        let value = serde_json::to_value(&req).unwrap();
        assert_eq!(value["operation"], "multiply");
        assert_eq!(value["matrixB"], json!([[1.0, 0.0], [0.0, 1.0]]));
        assert!(value.get("matrix").is_none());
    }

    #[test]
    fn request_builder_checks_arity() {
        let m = square([[1.0, 0.0], [0.0, 1.0]]);
        assert_err_contains(
            ComputeRequest::unary(Operation::Add, m),
            "needs two matrices",
        );
        assert_err_contains(
            ComputeRequest::binary(Operation::Inverse, m, m),
            "single matrix",
        );
    }

    #[test]
    fn parses_complex_strings() {
        let c = parse_complex("1+2i").unwrap();
        assert_eq!((c.re, c.im), (1.0, 2.0));
        let c = parse_complex("-0.5 - 1.5i").unwrap();
        assert_eq!((c.re, c.im), (-0.5, -1.5));
        let c = parse_complex("-i").unwrap();
        assert_eq!((c.re, c.im), (0.0, -1.0));
        let c = parse_complex("(3+0j)").unwrap();
        assert_eq!((c.re, c.im), (3.0, 0.0));
        let c = parse_complex("1e-3+2e+1i").unwrap();
        assert_eq!((c.re, c.im), (1e-3, 20.0));
        assert!(parse_complex("abc").is_err());
    }

    #[test]
    fn remote_eigen_matches_local_solver() {
        let m = Matrix2::new([[2.0, 1.0], [1.0, 2.0]]).unwrap();
        let payload: RemoteEigenPayload = serde_json::from_value(json!({
            "eigenvalues": [1.0, 3.0],
            "eigenvectors": [[-0.7071067811865475, 0.7071067811865475], [2.0, 2.0]]
        }))
        .unwrap();
        let remote = payload.into_eigen_result().unwrap();
        let local = eigen::solve(&m);

        for ((rl, rv), (ll, lv)) in remote.real_pairs().into_iter().zip(local.real_pairs()) {
            assert!((rl - ll).abs() < 1e-12);
            // Eigenvectors are defined up to sign.
            assert!((rv.dot(&lv).abs() - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn remote_complex_values_become_complex_pair() {
        for values in [
            json!(["1+2i", "1-2i"]),
            json!([{"re": 0.0, "im": 1.0}, {"re": 0.0, "im": -1.0}]),
        ] {
            let payload: RemoteEigenPayload =
                serde_json::from_value(json!({ "eigenvalues": values })).unwrap();
            assert_eq!(payload.into_eigen_result().unwrap(), EigenResult::ComplexPair);
        }
    }

    #[test]
    fn remote_eigen_rejects_bad_shapes() {
        let payload: RemoteEigenPayload = serde_json::from_value(json!({
            "eigenvalues": [1.0, 2.0],
            "eigenvectors": [[0.0, 0.0], [0.0, 1.0]]
        }))
        .unwrap();
        assert_err_contains(payload.into_eigen_result(), "zero length");

        let payload: RemoteEigenPayload =
            serde_json::from_value(json!({ "eigenvalues": [1.0] })).unwrap();
        assert_err_contains(payload.into_eigen_result(), "Expected 2 eigenvalues");
    }

    #[test]
    fn remote_eigen_rejects_non_finite_values() {
        let payload: RemoteEigenPayload = serde_json::from_value(json!({
            "eigenvalues": ["NaN", "inf"],
            "eigenvectors": [[1.0, 0.0], [0.0, 1.0]]
        }))
        .unwrap();
        assert_err_contains(payload.into_eigen_result(), "Non-finite");

        let payload: RemoteEigenPayload = serde_json::from_value(json!({
            "eigenvalues": [1.0, "2-infi"],
        }))
        .unwrap();
        assert_err_contains(payload.into_eigen_result(), "Non-finite");

        let payload: RemoteEigenPayload = serde_json::from_value(json!({
            "eigenvalues": [2.0, 1.0],
            "eigenvectors": [["-inf", 0.0], [0.0, 1.0]]
        }))
        .unwrap();
        assert_err_contains(payload.into_eigen_result(), "Non-finite");
    }

    #[test]
    fn remote_real_pair_is_normalised() {
        let payload: RemoteEigenPayload = serde_json::from_value(json!({
            "eigenvalues": ["2", 0.5],
            "eigenvectors": [[3.0, 0.0], [0.0, -4.0]]
        }))
        .unwrap();
        assert_eq!(
            payload.into_eigen_result().unwrap(),
            EigenResult::RealPair {
                lambda1: 2.0,
                lambda2: 0.5,
                v1: Vector2::new(1.0, 0.0),
                v2: Vector2::new(0.0, -1.0),
            }
        );
    }

    #[test]
    fn svd_payload_round_trips_into_result() {
        let response: ComputeResponse<RemoteSvdPayload> = serde_json::from_value(json!({
            "result": {"U": [[1.0, 0.0], [0.0, 1.0]], "S": [3.0, 2.0], "V": [[1.0, 0.0], [0.0, 1.0]]}
        }))
        .unwrap();
        let svd = response.result.into_svd_result().unwrap();
        assert_eq!(svd.s, vec![3.0, 2.0]);

        let bad = RemoteSvdPayload {
            u: vec![vec![1.0]],
            s: vec![3.0, 2.0],
            v: vec![vec![1.0, 0.0], vec![0.0, 1.0]],
        };
        assert_err_contains(bad.into_svd_result(), "U must be 2x2");
    }

    #[test]
    fn failure_messages_prefer_service_text() {
        assert_eq!(
            describe_failure(400, r#"{"error": "Matrix is singular"}"#),
            "Matrix is singular"
        );
        assert_eq!(describe_failure(500, "<html>oops</html>"), "Computation failed");
        assert_eq!(describe_failure(502, r#"{"error": ""}"#), "Computation failed");
    }
}
