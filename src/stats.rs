//! Small descriptive-statistics helpers shared by the detector and scorer.

/// Arithmetic mean; 0.0 for an empty slice.
pub fn mean(xs: &[f64]) -> f64 {
    if xs.is_empty() {
        return 0.0;
    }
    xs.iter().sum::<f64>() / xs.len() as f64
}

/// Mean and population standard deviation; (0.0, 0.0) for an empty input.
pub fn mean_std<'a, I>(xs: I) -> (f64, f64)
where
    I: IntoIterator<Item = &'a f64>,
    I::IntoIter: Clone,
{
    let iter = xs.into_iter();
    let mut n = 0usize;
    let mut sum = 0.0;
    for &x in iter.clone() {
        sum += x;
        n += 1;
    }
    if n == 0 {
        return (0.0, 0.0);
    }
    let m = sum / n as f64;
    let var = iter.map(|&x| (x - m).powi(2)).sum::<f64>() / n as f64;
    (m, var.sqrt())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    #[test]
    fn mean_of_empty_is_zero() {
        assert_eq!(mean(&[]), 0.0);
        assert_eq!(mean_std(&[] as &[f64]), (0.0, 0.0));
    }

    #[test]
    fn population_std() {
        let (m, s) = mean_std(&[2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]);
        assert!((m - 5.0).abs() < 1e-12);
        assert!((s - 2.0).abs() < 1e-12);
    }

    #[test]
    fn works_over_deque() {
        let d: VecDeque<f64> = vec![1.0, 1.0, 1.0].into();
        let (m, s) = mean_std(&d);
        assert_eq!(m, 1.0);
        assert_eq!(s, 0.0);
    }
}
