//! Random key and value sources.
use crossbeam::queue::SegQueue;
use rand::Rng;

use crate::traits::RandomSource;

/// Draws from the calling thread's generator, so concurrent tasks never contend on shared state.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadRandom;

impl RandomSource for ThreadRandom {
    #[inline]
    fn next_key(&self, upper: i32) -> i32 {
        rand::rng().random_range(1..=upper)
    }
}

/// Replays predefined keys and values in order. Once a queue is drained, draws fall back to [`ThreadRandom`].
///
/// Meant for tests and reproducible workloads.
#[derive(Debug, Default)]
pub struct ScriptedRandom {
    keys:   SegQueue<i32>,
    values: SegQueue<i32>,
}

impl ScriptedRandom {
    pub fn new<K, V>(keys: K, values: V) -> Self
    where
        K: IntoIterator<Item = i32>,
        V: IntoIterator<Item = i32>,
    {
        let scripted = Self::default();
        scripted.push_keys(keys);
        scripted.push_values(values);
        scripted
    }

    pub fn push_keys<K: IntoIterator<Item = i32>>(&self, keys: K) {
        for key in keys {
            self.keys.push(key);
        }
    }

    pub fn push_values<V: IntoIterator<Item = i32>>(&self, values: V) {
        for value in values {
            self.values.push(value);
        }
    }

    pub fn remaining_keys(&self) -> usize {
        self.keys.len()
    }
}

impl RandomSource for ScriptedRandom {
    fn next_key(&self, upper: i32) -> i32 {
        self.keys.pop().unwrap_or_else(|| ThreadRandom.next_key(upper))
    }

    fn next_value(&self, upper: i32) -> i32 {
        self.values.pop().unwrap_or_else(|| ThreadRandom.next_value(upper))
    }
}
