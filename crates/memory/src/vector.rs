//! Vector similarity utilities.
//!
//! Pure-Rust implementations of:
//! - Cosine similarity
//! - L2 normalisation

/// Compute cosine similarity between two vectors.
///
/// Returns a value in [-1, 1] where 1 = identical, 0 = orthogonal, -1 = opposite.
/// Returns 0.0 if either vector is zero-length, empty, or the lengths differ.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut norm_a = 0.0f64;
    let mut norm_b = 0.0f64;

    for (x, y) in a.iter().zip(b.iter()) {
        let x = *x as f64;
        let y = *y as f64;
        dot += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    let denom = norm_a.sqrt() * norm_b.sqrt();
    if denom < 1e-10 {
        return 0.0;
    }

    (dot / denom) as f32
}

/// Scale a vector to unit length in place. Zero vectors are left untouched.
pub fn l2_normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| (*x as f64) * (*x as f64)).sum::<f64>().sqrt();
    if norm < 1e-10 {
        return;
    }
    for x in v.iter_mut() {
        *x = (*x as f64 / norm) as f32;
    }
}
