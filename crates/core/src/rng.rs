//! Injectable random seed source
//!
//! Map-entry packets carry three random seeds. Production uses the thread
//! RNG; tests plug in a fixed sequence.

use parking_lot::Mutex;
use rand::Rng;

/// Source of 32-bit random values
pub trait SeedSource: Send + Sync {
    fn next_i32(&self) -> i32;
}

/// Seeds from `rand::thread_rng`
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRngSeeds;

impl SeedSource for ThreadRngSeeds {
    fn next_i32(&self) -> i32 {
        rand::thread_rng().gen()
    }
}

/// Replays a fixed list of values, cycling when exhausted
#[derive(Debug)]
pub struct FixedSeeds {
    values: Vec<i32>,
    cursor: Mutex<usize>,
}

impl FixedSeeds {
    pub fn new(values: Vec<i32>) -> Self {
        Self {
            values,
            cursor: Mutex::new(0),
        }
    }
}

impl SeedSource for FixedSeeds {
    fn next_i32(&self) -> i32 {
        if self.values.is_empty() {
            return 0;
        }
        let mut cursor = self.cursor.lock();
        let value = self.values[*cursor % self.values.len()];
        *cursor += 1;
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_seeds_cycle() {
        let seeds = FixedSeeds::new(vec![7, 8]);
        assert_eq!(seeds.next_i32(), 7);
        assert_eq!(seeds.next_i32(), 8);
        assert_eq!(seeds.next_i32(), 7);
    }

    #[test]
    fn test_empty_fixed_seeds() {
        assert_eq!(FixedSeeds::new(vec![]).next_i32(), 0);
    }
}
