use fxhash::hash64;

use crate::normalize::l2_normalize_in_place;

/// Deterministic pseudo-embedding for `text` in the space named `model_name`.
///
/// Every component is drawn from a hash of (model, text, position), so two models
/// never share a space and the same input always yields the same vector.
pub(crate) fn make_stub_vector(
    model_name: &str,
    text: &str,
    dimension: usize,
    normalize: bool,
) -> Vec<f32> {
    let seed = hash64(model_name.as_bytes()) ^ hash64(text.as_bytes()).rotate_left(17);
    let mut v: Vec<f32> = (0..dimension as u64)
        .map(|idx| {
            let mixed = hash64(&(seed, idx));
            // top 24 bits -> [-1, 1)
            ((mixed >> 40) as f32 / (1u64 << 23) as f32) - 1.0
        })
        .collect();
    if normalize {
        l2_normalize_in_place(&mut v);
    }
    v
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stub_is_deterministic() {
        let a = make_stub_vector("base", "big cat", 384, true);
        let b = make_stub_vector("base", "big cat", 384, true);
        assert_eq!(a, b);
        assert_eq!(a.len(), 384);
    }

    #[test]
    fn different_models_are_different_spaces() {
        let base = make_stub_vector("base", "graph networks", 64, false);
        let custom = make_stub_vector("custom", "graph networks", 64, false);
        assert_ne!(base, custom);
    }

    #[test]
    fn different_texts_differ() {
        let a = make_stub_vector("base", "hello", 64, false);
        let b = make_stub_vector("base", "world", 64, false);
        assert_ne!(a, b);
    }

    #[test]
    fn raw_values_stay_in_range() {
        for value in make_stub_vector("base", "Hello 世界 🌍", 256, false) {
            assert!((-1.0..1.0).contains(&value), "{value} out of range");
        }
    }

    #[test]
    fn normalized_stub_has_unit_length() {
        let v = make_stub_vector("custom", "", 384, true);
        let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
        assert!((norm - 1.0).abs() < 1e-4, "norm={norm}");
    }
}
