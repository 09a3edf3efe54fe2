use std::collections::VecDeque;

use serde::{Deserialize, Serialize};

use crate::EnemyKindId;

/// Number of enemies of one kind within a wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveEntry {
    /// Enemy kind to spawn.
    pub enemy: EnemyKindId,
    /// How many to spawn.
    pub count: u32,
}

impl WaveEntry {
    /// Creates an entry.
    #[must_use]
    pub fn new(enemy: impl Into<EnemyKindId>, count: u32) -> Self {
        Self {
            enemy: enemy.into(),
            count,
        }
    }
}

/// Composition and pacing of a single wave.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveSpec {
    /// One-based wave number.
    pub wave: u32,
    /// Ordered enemy entries.
    pub entries: Vec<WaveEntry>,
    /// Milliseconds between consecutive spawns.
    pub spawn_interval_ms: u32,
    /// Boss spawned after every other enemy.
    #[serde(default)]
    pub boss: Option<EnemyKindId>,
    /// Currency granted when the wave is cleared.
    #[serde(default)]
    pub reward: Option<u32>,
}

impl WaveSpec {
    /// Number of regular enemies, boss excluded.
    #[must_use]
    pub fn enemy_count(&self) -> u32 {
        self.entries
            .iter()
            .fold(0u32, |total, entry| total.saturating_add(entry.count))
    }
}

/// Enemy kinds and boss of a ten-wave campaign chapter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CampaignChapter {
    /// Enemy kinds introduced one after another through the chapter.
    pub enemies: Vec<EnemyKindId>,
    /// Boss closing the chapter.
    pub boss: EnemyKindId,
}

/// Number of waves in a campaign chapter; the last one carries the boss.
pub const WAVES_PER_CHAPTER: u32 = 10;

const MAX_DISTINCT_PER_WAVE: usize = 5;

/// Authored waves, looked up by wave number.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTable {
    waves: Vec<WaveSpec>,
}

impl WaveTable {
    /// Creates a table from explicit waves.
    #[must_use]
    pub fn new(waves: Vec<WaveSpec>) -> Self {
        Self { waves }
    }

    /// Lays chapters out back to back, ten waves each.
    ///
    /// Within a chapter the wave introduces one more enemy kind every second
    /// wave (at most five), every kind gains a spawn per chapter, and the
    /// chapter boss closes wave ten.
    #[must_use]
    pub fn campaign(chapters: &[CampaignChapter]) -> Self {
        let mut waves = Vec::with_capacity(chapters.len() * WAVES_PER_CHAPTER as usize);
        for (chapter_index, chapter) in chapters.iter().enumerate() {
            let chapter_index = chapter_index as u32;
            for step in 1..=WAVES_PER_CHAPTER {
                let wave = chapter_index * WAVES_PER_CHAPTER + step;
                let distinct = (1 + step as usize / 2)
                    .min(MAX_DISTINCT_PER_WAVE)
                    .min(chapter.enemies.len());
                let count = 4 + step / 2 + chapter_index;
                let entries = chapter.enemies[..distinct]
                    .iter()
                    .map(|enemy| WaveEntry::new(enemy.clone(), count))
                    .collect();
                waves.push(WaveSpec {
                    wave,
                    entries,
                    spawn_interval_ms: 1_200u32.saturating_sub(8 * wave).max(400),
                    boss: (step == WAVES_PER_CHAPTER).then(|| chapter.boss.clone()),
                    reward: Some(10 + 2 * wave),
                });
            }
        }
        Self { waves }
    }

    /// Authored spec for the wave number.
    #[must_use]
    pub fn get(&self, wave: u32) -> Option<&WaveSpec> {
        self.waves.iter().find(|spec| spec.wave == wave)
    }

    /// Highest authored wave number, zero when empty.
    #[must_use]
    pub fn last_wave(&self) -> u32 {
        self.waves.iter().map(|spec| spec.wave).max().unwrap_or(0)
    }
}

impl Default for WaveTable {
    fn default() -> Self {
        Self::campaign(&default_chapters())
    }
}

const CAMPAIGN_ENEMIES: [&str; 16] = [
    "goblimon",
    "betamon",
    "biyomon",
    "elecmon",
    "kunemon",
    "gotsumon",
    "floramon",
    "dokunemon",
    "penguinmon",
    "mushroomon",
    "tentomon",
    "solarmon",
    "tyrannomon",
    "airdramon",
    "ogremon",
    "kabuterimon",
];

const CAMPAIGN_BOSSES: [&str; 5] = ["devidramon", "etemon", "megadramon", "machinedramon", "piedmon"];

fn default_chapters() -> Vec<CampaignChapter> {
    (0..10)
        .map(|chapter: usize| CampaignChapter {
            enemies: (0..MAX_DISTINCT_PER_WAVE)
                .map(|offset| {
                    let index = (chapter * 11 / 10 + offset) % CAMPAIGN_ENEMIES.len();
                    EnemyKindId::new(CAMPAIGN_ENEMIES[index])
                })
                .collect(),
            boss: EnemyKindId::new(CAMPAIGN_BOSSES[chapter % CAMPAIGN_BOSSES.len()]),
        })
        .collect()
}

/// Parameters of the wave health curve.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HpScalingTuning {
    /// Linear growth per wave up to `linear_until`.
    pub linear_step: f64,
    /// Last wave on the linear curve.
    pub linear_until: u32,
    /// Per-wave exponential growth beyond `linear_until`.
    pub endless_growth: f64,
}

impl Default for HpScalingTuning {
    fn default() -> Self {
        Self {
            linear_step: 0.05,
            linear_until: 100,
            endless_growth: 1.05,
        }
    }
}

/// Parameters for procedurally generated endless waves.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EndlessTuning {
    /// Enemy count at wave zero.
    pub base_count: u32,
    /// Additional enemies per wave number.
    pub count_per_wave: f32,
    /// Hard cap on enemies per wave.
    pub max_count: u32,
    /// Spawn interval at wave zero.
    pub base_interval_ms: u32,
    /// Interval reduction per wave number.
    pub interval_step_ms: u32,
    /// Interval floor.
    pub min_interval_ms: u32,
    /// Maximum distinct enemy kinds per wave.
    pub max_distinct: usize,
    /// A boss appears on every wave divisible by this number.
    pub boss_every: u32,
    /// Enemy kinds endless waves draw from.
    pub pool: Vec<EnemyKindId>,
    /// Boss kinds endless waves draw from.
    pub bosses: Vec<EnemyKindId>,
    /// Clear reward at wave zero.
    pub reward_base: u32,
    /// Clear reward growth per wave.
    pub reward_per_wave: u32,
}

impl Default for EndlessTuning {
    fn default() -> Self {
        Self {
            base_count: 10,
            count_per_wave: 0.5,
            max_count: 100,
            base_interval_ms: 1_000,
            interval_step_ms: 5,
            min_interval_ms: 300,
            max_distinct: MAX_DISTINCT_PER_WAVE,
            boss_every: WAVES_PER_CHAPTER,
            pool: CAMPAIGN_ENEMIES.iter().copied().map(EnemyKindId::new).collect(),
            bosses: CAMPAIGN_BOSSES.iter().copied().map(EnemyKindId::new).collect(),
            reward_base: 50,
            reward_per_wave: 2,
        }
    }
}

/// Everything wave generation is tuned by.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaveTuning {
    /// Authored campaign waves.
    pub authored: WaveTable,
    /// Health curve.
    pub scaling: HpScalingTuning,
    /// Endless synthesis parameters.
    pub endless: EndlessTuning,
}

/// One pending spawn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpawnSlot {
    /// Enemy kind to instantiate.
    pub enemy: EnemyKindId,
    /// Multiplier applied to the kind's base health.
    pub hp_scaling: f64,
    /// Marks the boss slot.
    pub boss: bool,
}

/// Ordered spawns of a wave.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SpawnQueue {
    slots: VecDeque<SpawnSlot>,
}

impl SpawnQueue {
    /// Wraps already ordered slots.
    #[must_use]
    pub fn from_slots(slots: Vec<SpawnSlot>) -> Self {
        Self {
            slots: slots.into(),
        }
    }

    /// Removes the next slot.
    pub fn pop_front(&mut self) -> Option<SpawnSlot> {
        self.slots.pop_front()
    }

    /// Slots still pending.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Reports whether every slot was consumed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Iterates pending slots in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = &SpawnSlot> {
        self.slots.iter()
    }

    /// Last pending slot.
    #[must_use]
    pub fn back(&self) -> Option<&SpawnSlot> {
        self.slots.back()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn campaign_authors_one_hundred_waves() {
        let table = WaveTable::default();
        assert_eq!(table.last_wave(), 100);
        for wave in 1..=100 {
            let spec = table.get(wave).expect("authored wave");
            assert_eq!(spec.wave, wave);
            assert!(!spec.entries.is_empty());
            assert!(spec.entries.len() <= 5);
            assert_eq!(spec.boss.is_some(), wave % 10 == 0);
        }
        assert!(table.get(0).is_none());
        assert!(table.get(101).is_none());
    }

    #[test]
    fn campaign_intervals_stay_above_floor() {
        let table = WaveTable::default();
        assert_eq!(table.get(1).map(|spec| spec.spawn_interval_ms), Some(1_192));
        assert_eq!(table.get(100).map(|spec| spec.spawn_interval_ms), Some(400));
    }
}
