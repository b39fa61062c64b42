//! Randomness used for presentation shuffling and hub assignment

use rand::Rng;
use rand::seq::SliceRandom;

/// Source of random orderings and picks
///
/// Injected into the services so tests can pin the outcome.
pub trait Randomizer: Send + Sync {
    /// A permutation of `0..len`
    fn permutation(&self, len: usize) -> Vec<usize>;

    /// An index in `0..len`; `len` is never zero
    fn pick(&self, len: usize) -> usize;
}

/// Thread-local RNG backed randomizer
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRandomizer;

impl Randomizer for ThreadRandomizer {
    fn permutation(&self, len: usize) -> Vec<usize> {
        let mut order: Vec<usize> = (0..len).collect();
        order.shuffle(&mut rand::thread_rng());
        order
    }

    fn pick(&self, len: usize) -> usize {
        rand::thread_rng().gen_range(0..len)
    }
}

/// Reorder `items` by a permutation drawn from `randomizer`
///
/// Indices that are out of range or repeated are skipped, and anything the
/// permutation missed keeps its relative order at the end.
pub fn shuffled<T>(randomizer: &dyn Randomizer, items: Vec<T>) -> Vec<T> {
    let order = randomizer.permutation(items.len());
    let mut slots: Vec<Option<T>> = items.into_iter().map(Some).collect();

    let mut result: Vec<T> = order
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect();
    result.extend(slots.into_iter().flatten());
    result
}

#[cfg(test)]
pub(crate) mod testing {
    use super::Randomizer;

    /// Deterministic randomizer: reverses every sequence, always picks `pick % len`
    #[derive(Debug, Clone, Copy, Default)]
    pub struct FixedRandomizer {
        pub pick: usize,
    }

    impl Randomizer for FixedRandomizer {
        fn permutation(&self, len: usize) -> Vec<usize> {
            (0..len).rev().collect()
        }

        fn pick(&self, len: usize) -> usize {
            self.pick % len
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::FixedRandomizer;
    use super::*;

    struct Broken;

    impl Randomizer for Broken {
        fn permutation(&self, _len: usize) -> Vec<usize> {
            vec![2, 2, 9]
        }

        fn pick(&self, _len: usize) -> usize {
            0
        }
    }

    #[test]
    fn applies_the_permutation() {
        let items = vec!['a', 'b', 'c'];
        assert_eq!(shuffled(&FixedRandomizer::default(), items), vec!['c', 'b', 'a']);
    }

    #[test]
    fn tolerates_bad_permutations_without_losing_items() {
        let items = vec!['a', 'b', 'c'];
        assert_eq!(shuffled(&Broken, items), vec!['c', 'a', 'b']);
    }

    #[test]
    fn thread_randomizer_yields_a_permutation() {
        let mut order = ThreadRandomizer.permutation(10);
        order.sort_unstable();
        assert_eq!(order, (0..10).collect::<Vec<_>>());
        assert!(ThreadRandomizer.pick(3) < 3);
    }
}
