//! Embedding vector arithmetic.
//!
//! Tracks and taste profiles live in the same fixed-dimensional space. The
//! engine never derives embeddings itself; it only combines the vectors the
//! catalog supplies. All functions here are pure and defined for every input,
//! including the zero vector.

use crate::{Error, Result};

/// Euclidean (L2) norm.
#[must_use]
pub fn l2_norm(v: &[f32]) -> f32 {
    v.iter().map(|x| x * x).sum::<f32>().sqrt()
}

/// Dot product of two equal-length vectors.
///
/// Callers are responsible for checking lengths; see [`check_dimension`].
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

/// Scales `v` to unit length.
///
/// A vector whose norm is exactly zero is returned unchanged, so the zero
/// vector stays zero. The guard is an exact comparison rather than an
/// epsilon so results are reproducible bit for bit.
#[must_use]
pub fn normalize(v: &[f32]) -> Vec<f32> {
    let norm = l2_norm(v);
    if norm > 0.0 {
        v.iter().map(|x| x / norm).collect()
    } else {
        v.to_vec()
    }
}

/// Returns `a + b` component-wise.
#[must_use]
pub fn add(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x + y).collect()
}

/// Returns `a - b` component-wise.
#[must_use]
pub fn sub(a: &[f32], b: &[f32]) -> Vec<f32> {
    a.iter().zip(b).map(|(x, y)| x - y).collect()
}

/// Returns `factor * v`.
#[must_use]
pub fn scale(v: &[f32], factor: f32) -> Vec<f32> {
    v.iter().map(|x| x * factor).collect()
}

/// Returns true if every component is exactly zero.
#[must_use]
pub fn is_zero(v: &[f32]) -> bool {
    v.iter().all(|x| *x == 0.0)
}

/// Checks that a vector has the expected dimension.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] naming `what` on mismatch.
pub fn check_dimension(v: &[f32], expected: usize, what: &str) -> Result<()> {
    if v.len() == expected {
        Ok(())
    } else {
        Err(Error::InvalidInput(format!(
            "{what} has dimension {}, expected {expected}",
            v.len()
        )))
    }
}

/// Validates an incoming track embedding and returns its normalized form.
///
/// # Errors
///
/// Returns [`Error::InvalidInput`] if the dimension is wrong or any
/// component is NaN or infinite.
pub fn prepare_embedding(v: &[f32], dim: usize) -> Result<Vec<f32>> {
    check_dimension(v, dim, "embedding")?;
    if let Some(pos) = v.iter().position(|x| !x.is_finite()) {
        return Err(Error::InvalidInput(format!(
            "embedding component {pos} is not finite"
        )));
    }
    Ok(normalize(v))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_unit_length() {
        let v = normalize(&[3.0, 4.0]);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
        assert!((l2_norm(&v) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_normalize_zero_stays_zero() {
        let v = normalize(&[0.0, 0.0, 0.0]);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
        assert!(v.iter().all(|x| !x.is_nan()));
    }

    #[test]
    fn test_normalize_empty() {
        assert!(normalize(&[]).is_empty());
    }

    #[test]
    fn test_dot() {
        assert!((dot(&[1.0, 2.0, 3.0], &[4.0, 5.0, 6.0]) - 32.0).abs() < f32::EPSILON);
        assert_eq!(dot(&[0.0, 0.0], &[0.7, -0.7]), 0.0);
    }

    #[test]
    fn test_add_sub_scale() {
        assert_eq!(add(&[1.0, 2.0], &[0.5, -2.0]), vec![1.5, 0.0]);
        assert_eq!(sub(&[1.0, 2.0], &[0.5, -2.0]), vec![0.5, 4.0]);
        assert_eq!(scale(&[1.0, -2.0], -0.5), vec![-0.5, 1.0]);
    }

    #[test]
    fn test_sub_self_is_exactly_zero() {
        let v = normalize(&[0.3, -1.7, 2.2]);
        assert!(is_zero(&sub(&v, &v)));
    }

    #[test]
    fn test_check_dimension() {
        assert!(check_dimension(&[1.0, 2.0], 2, "taste").is_ok());
        let err = check_dimension(&[1.0], 2, "taste").unwrap_err();
        assert!(err.to_string().contains("taste has dimension 1, expected 2"));
    }

    #[test]
    fn test_prepare_embedding_normalizes() {
        let v = prepare_embedding(&[0.0, 2.0], 2).unwrap();
        assert_eq!(v, vec![0.0, 1.0]);
    }

    #[test]
    fn test_prepare_embedding_rejects_non_finite() {
        assert!(prepare_embedding(&[f32::NAN, 1.0], 2).is_err());
        assert!(prepare_embedding(&[f32::INFINITY, 1.0], 2).is_err());
    }
}
