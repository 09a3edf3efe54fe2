#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic spawn driver that releases queued wave slots on a cadence.

use std::time::Duration;

use digi_defence_core::{SpawnQueue, SpawnSlot};

/// Pure system that pops one queue slot per elapsed spawn interval.
///
/// The first slot of a wave is released on the first tick after
/// [`Spawning::start`]; later slots follow every `spawn_interval`.
#[derive(Debug, Default)]
pub struct Spawning {
    queue: SpawnQueue,
    spawn_interval: Duration,
    accumulator: Duration,
}

impl Spawning {
    /// Creates an idle spawning system.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a wave's queue, replacing anything still pending.
    pub fn start(&mut self, queue: SpawnQueue, spawn_interval: Duration) {
        self.queue = queue;
        self.spawn_interval = spawn_interval;
        self.accumulator = spawn_interval;
    }

    /// Drops every pending slot.
    pub fn clear(&mut self) {
        self.queue = SpawnQueue::default();
        self.accumulator = Duration::ZERO;
    }

    /// Advances the cadence by `dt` and emits the slots that became due.
    pub fn handle(&mut self, dt: Duration, out: &mut Vec<SpawnSlot>) {
        if self.queue.is_empty() {
            return;
        }

        if self.spawn_interval.is_zero() {
            while let Some(slot) = self.queue.pop_front() {
                out.push(slot);
            }
            return;
        }

        self.accumulator = self.accumulator.saturating_add(dt);
        while self.accumulator >= self.spawn_interval {
            let Some(slot) = self.queue.pop_front() else {
                break;
            };
            self.accumulator -= self.spawn_interval;
            out.push(slot);
        }

        if self.queue.is_empty() {
            self.accumulator = Duration::ZERO;
        }
    }

    /// Slots not yet released.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.queue.len()
    }

    /// Reports whether every slot of the current wave was released.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.queue.is_empty()
    }
}
