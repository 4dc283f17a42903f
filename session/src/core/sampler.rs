//! Sampling of contexts without replacement.

use rand::Rng;

use crate::config::ConfigError;
use crate::core::context::Context;

/// Select `n` distinct contexts from the pool without replacement.
///
/// The returned order is the presentation order the participant will see.
/// Fails with [`ConfigError`] if `n` exceeds the pool size; this is checked
/// before any step executes.
pub fn sample_contexts<R: Rng>(
    pool: &[Context],
    n: usize,
    rng: &mut R,
) -> Result<Vec<Context>, ConfigError> {
    if n > pool.len() {
        return Err(ConfigError::new(format!(
            "contexts_shown ({n}) exceeds pool size ({})",
            pool.len()
        )));
    }
    let picked = rand::seq::index::sample(rng, pool.len(), n);
    Ok(picked.iter().map(|i| pool[i].clone()).collect())
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::test_support::context_pool;

    #[test]
    fn samples_are_distinct_for_every_size() {
        let pool = context_pool(10);
        for n in 0..=10 {
            let mut rng = StdRng::seed_from_u64(7);
            let sampled = sample_contexts(&pool, n, &mut rng).expect("sample");
            assert_eq!(sampled.len(), n);
            let ids: HashSet<&str> = sampled.iter().map(|c| c.id.as_str()).collect();
            assert_eq!(ids.len(), n, "ids must not repeat");
        }
    }

    #[test]
    fn oversized_sample_is_a_config_error() {
        let pool = context_pool(4);
        let mut rng = StdRng::seed_from_u64(0);
        let err = sample_contexts(&pool, 5, &mut rng).expect_err("must fail");
        assert!(err.to_string().contains("exceeds pool size"));
    }

    #[test]
    fn identical_seeds_sample_identically() {
        let pool = context_pool(10);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        let first = sample_contexts(&pool, 6, &mut a).expect("sample");
        let second = sample_contexts(&pool, 6, &mut b).expect("sample");
        assert_eq!(first, second);
    }
}
