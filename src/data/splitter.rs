// ============================================================
// Layer 4 — Sample Limiter
// ============================================================
// Caps a split at `limit` randomly chosen samples, used for
// quick smoke-test runs on a fraction of CIFAR-10.
//
// Uses a Fisher-Yates shuffle via rand::seq::SliceRandom so the
// retained subset keeps the class mix of the full split.

use rand::seq::SliceRandom;

/// Keep at most `limit` samples. `None` keeps everything and
/// leaves the order untouched.
pub fn limit_samples<T>(mut samples: Vec<T>, limit: Option<usize>) -> Vec<T> {
    let Some(limit) = limit else { return samples };
    if limit >= samples.len() {
        return samples;
    }

    samples.shuffle(&mut rand::thread_rng());
    samples.truncate(limit);

    tracing::debug!("Limited split to {} samples", samples.len());
    samples
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_limit_truncates() {
        let items: Vec<usize> = (0..100).collect();
        let kept = limit_samples(items, Some(10));
        assert_eq!(kept.len(), 10);
        assert!(kept.iter().all(|&v| v < 100));
    }

    #[test]
    fn test_no_limit_preserves_order() {
        let items: Vec<usize> = (0..5).collect();
        assert_eq!(limit_samples(items, None), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn test_limit_larger_than_split() {
        let items: Vec<usize> = (0..3).collect();
        assert_eq!(limit_samples(items, Some(8)).len(), 3);
    }

    #[test]
    fn test_empty_split() {
        let items: Vec<usize> = Vec::new();
        assert!(limit_samples(items, Some(4)).is_empty());
    }
}
