/// Scales `v` to unit length in place. Zero vectors are left untouched.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn three_four_five() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize_in_place(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn result_has_unit_length() {
        let mut v: Vec<f32> = (0..384).map(|i| (i as f32 * 0.37).sin()).collect();
        l2_normalize_in_place(&mut v);
        assert!((norm(&v) - 1.0).abs() < 1e-5);
    }

    #[test]
    fn zero_vector_stays_zero() {
        let mut v = vec![0.0f32; 4];
        l2_normalize_in_place(&mut v);
        assert_eq!(v, vec![0.0; 4]);
    }

    #[test]
    fn normalizing_twice_is_stable() {
        let mut v = vec![-1.0f32, 2.0, -3.0, 4.0];
        l2_normalize_in_place(&mut v);
        let once = v.clone();
        l2_normalize_in_place(&mut v);
        for (a, b) in v.iter().zip(once.iter()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
