//! Vector similarity functions

/// Compute cosine similarity between two vectors
///
/// Defined as 0 when the dimensions differ, either vector has zero norm, or
/// a component is NaN.
#[inline]
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }

    let mut dot_product = 0.0_f32;
    let mut norm_a = 0.0_f32;
    let mut norm_b = 0.0_f32;

    for (x, y) in a.iter().zip(b.iter()) {
        dot_product += x * y;
        norm_a += x * x;
        norm_b += y * y;
    }

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }

    let similarity = dot_product / (norm_a.sqrt() * norm_b.sqrt());
    if similarity.is_nan() { 0.0 } else { similarity }
}

/// L2-normalize in place; zero vectors are left untouched
pub fn normalize(vector: &mut [f32]) {
    let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in vector.iter_mut() {
            *x /= norm;
        }
    }
}

/// Truncate to `dimensions` and L2-normalize
///
/// Matryoshka-trained models (nomic v1.5, OpenAI v3) keep a usable
/// representation in their leading dimensions.
pub fn matryoshka_truncate(mut vector: Vec<f32>, dimensions: usize) -> Vec<f32> {
    if vector.len() > dimensions {
        vector.truncate(dimensions);
    }
    normalize(&mut vector);
    vector
}
