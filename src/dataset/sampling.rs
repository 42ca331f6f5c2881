use rand::seq::index;
use rand::Rng;

/// Indices of the items to analyze, in ascending order. Collections no larger
/// than `max_samples` are kept whole; larger ones get a uniform sample without
/// replacement.
pub fn sample_indices<R: Rng + ?Sized>(len: usize, max_samples: usize, rng: &mut R) -> Vec<usize> {
    if len <= max_samples {
        return (0..len).collect();
    }

    let mut picked = index::sample(rng, len, max_samples).into_vec();
    picked.sort_unstable();
    picked
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::collections::HashSet;

    #[test]
    fn test_small_collection_is_kept_whole() {
        let mut rng = StdRng::seed_from_u64(0);
        assert_eq!(sample_indices(3, 10, &mut rng), vec![0, 1, 2]);
        assert_eq!(sample_indices(10, 10, &mut rng).len(), 10);
    }

    #[test]
    fn test_sample_is_unique_sorted_and_bounded() {
        let mut rng = StdRng::seed_from_u64(42);
        let picked = sample_indices(1000, 25, &mut rng);

        assert_eq!(picked.len(), 25);
        assert!(picked.windows(2).all(|w| w[0] < w[1]));
        assert!(picked.iter().all(|i| *i < 1000));
        assert_eq!(picked.iter().collect::<HashSet<_>>().len(), 25);
    }

    #[test]
    fn test_same_seed_same_sample() {
        let a = sample_indices(500, 20, &mut StdRng::seed_from_u64(7));
        let b = sample_indices(500, 20, &mut StdRng::seed_from_u64(7));
        let c = sample_indices(500, 20, &mut StdRng::seed_from_u64(8));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
