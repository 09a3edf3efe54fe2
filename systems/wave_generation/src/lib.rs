#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic wave generation: authored lookups, endless synthesis, health
//! scaling and spawn queues.
//!
//! Endless waves draw from a random stream derived from the global seed and
//! the wave number, so the content of a wave never depends on which waves were
//! generated before it.

use digi_defence_core::{
    EnemyKindId, HpScalingTuning, SpawnQueue, SpawnSlot, WaveEntry, WaveSpec, WaveTuning,
};
use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use sha2::{Digest, Sha256};

/// Label of the stream that picks endless wave composition.
pub const RNG_STREAM_COMPOSITION: &str = "composition";

/// Label of the stream that shuffles a wave's spawn queue.
pub const RNG_STREAM_QUEUE: &str = "queue";

/// Wave generator bound to wave tuning and a global seed.
#[derive(Clone, Debug, Default)]
pub struct WaveGeneration {
    tuning: WaveTuning,
    seed: u64,
}

impl WaveGeneration {
    /// Creates a generator for the provided tuning and seed.
    #[must_use]
    pub fn new(tuning: WaveTuning, seed: u64) -> Self {
        Self { tuning, seed }
    }

    /// Tuning in use.
    #[must_use]
    pub fn tuning(&self) -> &WaveTuning {
        &self.tuning
    }

    /// Highest authored wave number.
    #[must_use]
    pub fn last_authored_wave(&self) -> u32 {
        self.tuning.authored.last_wave()
    }

    /// Authored spec for the wave, verbatim.
    #[must_use]
    pub fn generate_fixed_wave(&self, wave: u32) -> Option<WaveSpec> {
        self.tuning.authored.get(wave).cloned()
    }

    /// Synthesizes a procedural wave.
    ///
    /// The enemy count grows with the wave number up to the cap, the interval
    /// shrinks down to the floor, at most `max_distinct` kinds are drawn from
    /// the pool and a boss appears exactly on every `boss_every`-th wave.
    pub fn generate_endless_wave<R: Rng + ?Sized>(&self, wave: u32, rng: &mut R) -> WaveSpec {
        let endless = &self.tuning.endless;

        let growth = (f64::from(wave) * f64::from(endless.count_per_wave)).floor();
        let count = (f64::from(endless.base_count) + growth.max(0.0))
            .min(f64::from(endless.max_count)) as u32;
        let spawn_interval_ms = endless
            .base_interval_ms
            .saturating_sub(wave.saturating_mul(endless.interval_step_ms))
            .max(endless.min_interval_ms);

        let distinct = endless
            .max_distinct
            .min(endless.pool.len())
            .min(count as usize);
        let kinds: Vec<&EnemyKindId> = endless.pool.choose_multiple(rng, distinct).collect();
        let entries = split_count(&kinds, count);

        let boss_wave = endless.boss_every > 0 && wave % endless.boss_every == 0;
        let boss = if boss_wave {
            endless.bosses.choose(rng).cloned()
        } else {
            None
        };

        let reward = endless
            .reward_base
            .saturating_add(endless.reward_per_wave.saturating_mul(wave));

        tracing::debug!(
            wave,
            count,
            spawn_interval_ms,
            kinds = entries.len(),
            boss = boss.as_ref().map(EnemyKindId::as_str),
            "endless wave synthesized"
        );

        WaveSpec {
            wave,
            entries,
            spawn_interval_ms,
            boss,
            reward: Some(reward),
        }
    }

    /// Authored spec when one exists, otherwise an endless wave drawn from `rng`.
    pub fn wave_spec<R: Rng + ?Sized>(&self, wave: u32, rng: &mut R) -> WaveSpec {
        match self.generate_fixed_wave(wave) {
            Some(spec) => spec,
            None => self.generate_endless_wave(wave, rng),
        }
    }

    /// Spec for the wave using the wave's own derived composition stream.
    #[must_use]
    pub fn planned_wave(&self, wave: u32) -> WaveSpec {
        let mut rng = self.wave_rng(wave, RNG_STREAM_COMPOSITION);
        self.wave_spec(wave, &mut rng)
    }

    /// Random stream dedicated to one purpose within one wave.
    #[must_use]
    pub fn wave_rng(&self, wave: u32, label: &str) -> ChaCha8Rng {
        let base = derive_base_seed(self.seed, wave);
        ChaCha8Rng::seed_from_u64(derive_labeled_seed(base, label))
    }

    /// Health multiplier for the wave.
    #[must_use]
    pub fn hp_scaling(&self, wave: u32) -> f64 {
        hp_scaling(wave, &self.tuning.scaling)
    }

    /// Expands, shuffles and closes the spec with its boss.
    pub fn build_spawn_queue<R: Rng + ?Sized>(&self, spec: &WaveSpec, rng: &mut R) -> SpawnQueue {
        build_spawn_queue(spec, self.hp_scaling(spec.wave), rng)
    }
}

/// Health multiplier for the wave.
///
/// Linear up to `linear_until`, then exponential from that baseline.
/// Saturates at the largest finite value instead of overflowing.
#[must_use]
pub fn hp_scaling(wave: u32, tuning: &HpScalingTuning) -> f64 {
    let linear = |wave: u32| 1.0 + tuning.linear_step * f64::from(wave.max(1) - 1);

    let scaling = if wave <= tuning.linear_until {
        linear(wave)
    } else {
        let extra = f64::from(wave - tuning.linear_until);
        linear(tuning.linear_until) * tuning.endless_growth.powf(extra)
    };

    if scaling.is_finite() {
        scaling
    } else {
        f64::MAX
    }
}

/// Expands each entry into individual slots, shuffles them and appends the
/// boss so it always spawns last.
pub fn build_spawn_queue<R: Rng + ?Sized>(spec: &WaveSpec, hp_scaling: f64, rng: &mut R) -> SpawnQueue {
    let mut slots = Vec::with_capacity(spec.enemy_count() as usize + 1);
    for entry in &spec.entries {
        for _ in 0..entry.count {
            slots.push(SpawnSlot {
                enemy: entry.enemy.clone(),
                hp_scaling,
                boss: false,
            });
        }
    }

    slots.shuffle(rng);

    if let Some(boss) = &spec.boss {
        slots.push(SpawnSlot {
            enemy: boss.clone(),
            hp_scaling,
            boss: true,
        });
    }

    SpawnQueue::from_slots(slots)
}

fn split_count(kinds: &[&EnemyKindId], count: u32) -> Vec<WaveEntry> {
    if kinds.is_empty() {
        return Vec::new();
    }
    let share = count / kinds.len() as u32;
    let remainder = count as usize % kinds.len();
    kinds
        .iter()
        .enumerate()
        .map(|(index, kind)| {
            let extra = u32::from(index < remainder);
            WaveEntry::new((*kind).clone(), share + extra)
        })
        .collect()
}

fn derive_base_seed(global_seed: u64, wave: u32) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(global_seed.to_le_bytes());
    hasher.update(wave.to_le_bytes());
    finalize_seed(hasher)
}

fn derive_labeled_seed(base: u64, label: &str) -> u64 {
    let mut hasher = Sha256::new();
    hasher.update(base.to_le_bytes());
    hasher.update(label.as_bytes());
    finalize_seed(hasher)
}

fn finalize_seed(hasher: Sha256) -> u64 {
    let digest = hasher.finalize();
    let mut bytes = [0u8; 8];
    bytes.copy_from_slice(&digest[..8]);
    u64::from_le_bytes(bytes)
}
