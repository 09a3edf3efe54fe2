use serde::{Deserialize, Serialize};

use crate::EnemyKindId;

/// When a boss ability fires.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "trigger")]
pub enum BossTrigger {
    /// Fires every `seconds`.
    Cooldown {
        /// Interval between firings.
        seconds: f32,
    },
    /// Evaluated every tick.
    Passive,
    /// Fires once when the health fraction drops to `fraction` or below.
    HpThreshold {
        /// Health fraction in `[0, 1]`.
        fraction: f32,
    },
}

/// What a boss ability does.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "action")]
pub enum BossAbilityKind {
    /// Stuns the closest tower within `range`.
    StunNearestTower {
        /// Search radius around the boss.
        range: f32,
    },
    /// Multiplies the boss's speed for `duration` seconds.
    SpeedBoost {
        /// Speed multiplier while active.
        multiplier: f32,
        /// Seconds the boost lasts.
        duration: f32,
    },
    /// Heals a fraction of maximum health.
    Heal {
        /// Fraction of maximum health restored.
        fraction: f32,
    },
    /// Spawns minions at the boss's position.
    SpawnMinions {
        /// Minion kind.
        enemy: EnemyKindId,
        /// Minions per firing.
        count: u32,
    },
    /// Reduces incoming damage for `duration` seconds.
    DamageShield {
        /// Fraction of incoming damage absorbed.
        reduction: f32,
        /// Seconds the shield lasts.
        duration: f32,
    },
    /// Drains player currency continuously.
    DrainCurrency {
        /// Currency removed per second.
        per_second: f32,
    },
    /// Shrinks the range of towers near the boss while it lives.
    RangeReduction {
        /// Aura radius.
        radius: f32,
        /// Range multiplier applied to affected towers.
        factor: f32,
    },
}

/// Named ability attached to a boss.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossAbilityDefinition {
    /// Display name.
    pub name: String,
    /// Trigger kind.
    pub trigger: BossTrigger,
    /// Action performed.
    pub kind: BossAbilityKind,
}

impl BossAbilityDefinition {
    /// Creates a definition.
    #[must_use]
    pub fn new(name: impl Into<String>, trigger: BossTrigger, kind: BossAbilityKind) -> Self {
        Self {
            name: name.into(),
            trigger,
            kind,
        }
    }
}

/// Abilities of one boss kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BossProfile {
    /// Boss enemy kind.
    pub boss: EnemyKindId,
    /// Abilities, each with independent state.
    pub abilities: Vec<BossAbilityDefinition>,
}

/// Injected registry of boss abilities.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BossTable {
    profiles: Vec<BossProfile>,
}

impl BossTable {
    /// Creates a table from explicit profiles.
    #[must_use]
    pub fn new(profiles: Vec<BossProfile>) -> Self {
        Self { profiles }
    }

    /// Abilities of the boss kind; empty for unknown kinds.
    #[must_use]
    pub fn abilities(&self, boss: &EnemyKindId) -> &[BossAbilityDefinition] {
        self.profiles
            .iter()
            .find(|profile| &profile.boss == boss)
            .map_or(&[][..], |profile| profile.abilities.as_slice())
    }
}

impl Default for BossTable {
    fn default() -> Self {
        use BossAbilityKind::{
            DamageShield, DrainCurrency, Heal, RangeReduction, SpawnMinions, SpeedBoost,
            StunNearestTower,
        };
        use BossTrigger::{Cooldown, HpThreshold, Passive};

        let profile = |boss: &str, abilities: Vec<BossAbilityDefinition>| BossProfile {
            boss: EnemyKindId::new(boss),
            abilities,
        };

        Self::new(vec![
            profile(
                "devidramon",
                vec![BossAbilityDefinition::new(
                    "Crimson Claw",
                    Cooldown { seconds: 8.0 },
                    StunNearestTower { range: 4.0 },
                )],
            ),
            profile(
                "etemon",
                vec![
                    BossAbilityDefinition::new(
                        "Dark Network",
                        Passive,
                        DrainCurrency { per_second: 2.0 },
                    ),
                    BossAbilityDefinition::new(
                        "Love Serenade",
                        HpThreshold { fraction: 0.5 },
                        Heal { fraction: 0.2 },
                    ),
                ],
            ),
            profile(
                "megadramon",
                vec![BossAbilityDefinition::new(
                    "Afterburner",
                    Cooldown { seconds: 10.0 },
                    SpeedBoost {
                        multiplier: 1.8,
                        duration: 3.0,
                    },
                )],
            ),
            profile(
                "machinedramon",
                vec![
                    BossAbilityDefinition::new(
                        "Infinity Armor",
                        Cooldown { seconds: 12.0 },
                        DamageShield {
                            reduction: 0.5,
                            duration: 4.0,
                        },
                    ),
                    BossAbilityDefinition::new(
                        "Jamming Field",
                        Passive,
                        RangeReduction {
                            radius: 4.0,
                            factor: 0.7,
                        },
                    ),
                ],
            ),
            profile(
                "piedmon",
                vec![
                    BossAbilityDefinition::new(
                        "Trump Sword",
                        Cooldown { seconds: 9.0 },
                        SpawnMinions {
                            enemy: EnemyKindId::new("minion_bakemon"),
                            count: 3,
                        },
                    ),
                    BossAbilityDefinition::new(
                        "Clown Trick",
                        HpThreshold { fraction: 0.25 },
                        SpeedBoost {
                            multiplier: 1.5,
                            duration: 5.0,
                        },
                    ),
                ],
            ),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_boss_has_no_abilities() {
        let table = BossTable::default();
        assert!(table.abilities(&EnemyKindId::new("goblimon")).is_empty());
        assert_eq!(table.abilities(&EnemyKindId::new("etemon")).len(), 2);
    }
}
