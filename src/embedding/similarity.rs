//! Similarity kernel for embedding vectors.
//!
//! The table is assumed to hold pre-normalized vectors, so the raw dot
//! product is the similarity score; no cosine normalization happens here.

/// Computes the dot product of two equal-length vectors.
///
/// Callers validate dimensions before reaching this kernel; the debug
/// assertion catches internal misuse without taxing release builds.
#[must_use]
pub fn dot(a: &[f32], b: &[f32]) -> f32 {
    debug_assert_eq!(a.len(), b.len(), "dot product requires equal lengths");
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dot_identical_unit_vectors() {
        let a = vec![1.0, 0.0, 0.0];
        assert!((dot(&a, &a) - 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dot_orthogonal_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![0.0, 1.0];
        assert!(dot(&a, &b).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dot_opposite_vectors() {
        let a = vec![1.0, 0.0];
        let b = vec![-1.0, 0.0];
        assert!((dot(&a, &b) + 1.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dot_is_raw_product_not_cosine() {
        // Unnormalized input stays unnormalized: 2*3 = 6, not 1.
        let a = vec![2.0];
        let b = vec![3.0];
        assert!((dot(&a, &b) - 6.0).abs() < f32::EPSILON);
    }

    #[test]
    fn test_dot_empty_vectors() {
        assert_eq!(dot(&[], &[]), 0.0);
    }
}
