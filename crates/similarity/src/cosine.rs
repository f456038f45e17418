//! Cosine similarity with an explicit zero-norm policy.

use catalog::FeatureVector;

/// Cosine similarity of two feature vectors.
///
/// `dot(u, v) / (|u| * |v|)`, clamped to [-1, 1]. Defined as 0 when
/// either vector has zero norm, so the result is never NaN.
pub fn cosine_similarity(u: &FeatureVector, v: &FeatureVector) -> f64 {
    let nu = norm(u);
    let nv = norm(v);
    cosine_with_norms(u, nu, v, nv)
}

/// Euclidean norm
pub fn norm(v: &FeatureVector) -> f64 {
    dot(v, v).sqrt()
}

pub(crate) fn dot(u: &FeatureVector, v: &FeatureVector) -> f64 {
    u.iter().zip(v.iter()).map(|(a, b)| a * b).sum()
}

/// Cosine similarity when both norms are already known
pub(crate) fn cosine_with_norms(u: &FeatureVector, nu: f64, v: &FeatureVector, nv: f64) -> f64 {
    if nu == 0.0 || nv == 0.0 {
        return 0.0;
    }
    (dot(u, v) / (nu * nv)).clamp(-1.0, 1.0)
}
