#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-boss ability timers that turn elapsed time and health into actions.
//!
//! The engine never touches the world. Each tick returns [`FiredAbility`]
//! values that the caller resolves against towers, currency and the enemy
//! list.

use std::time::Duration;

use digi_defence_core::{BossAbilityDefinition, BossAbilityKind, BossTrigger, EnemyKindId};

/// Side effect requested by a boss ability.
#[derive(Clone, Debug, PartialEq)]
pub enum BossAction {
    /// Stun the tower closest to the boss within `range`.
    StunNearestTower {
        /// Search radius.
        range: f32,
    },
    /// A speed boost became active.
    SpeedBoostStarted {
        /// Speed multiplier while active.
        multiplier: f32,
    },
    /// A speed boost ran out.
    SpeedBoostEnded,
    /// Restore `amount` health to the boss.
    Heal {
        /// Absolute health restored.
        amount: f32,
    },
    /// Spawn minions at the boss's position.
    SpawnMinions {
        /// Minion kind.
        enemy: EnemyKindId,
        /// Number of minions.
        count: u32,
    },
    /// A damage shield went up.
    ShieldRaised {
        /// Fraction of incoming damage absorbed.
        reduction: f32,
    },
    /// A damage shield dropped.
    ShieldDropped,
    /// Remove whole currency units from the player.
    DrainCurrency {
        /// Currency to remove.
        amount: u32,
    },
    /// Shrink tower range around the boss for this frame.
    RangeReduction {
        /// Aura radius.
        radius: f32,
        /// Range multiplier for towers inside the aura.
        factor: f32,
    },
}

/// Action tagged with the index of the ability that produced it.
#[derive(Clone, Debug, PartialEq)]
pub struct FiredAbility {
    /// Index into the boss's ability list.
    pub ability: usize,
    /// Requested side effect.
    pub action: BossAction,
}

/// Inputs observed by the engine each frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BossContext {
    /// Time elapsed since the previous tick.
    pub dt: Duration,
    /// Current health over maximum health.
    pub health_fraction: f32,
    /// Maximum health, used to size heals.
    pub max_health: f32,
}

/// Mutable state of one ability.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct BossAbilityState {
    cooldown_elapsed: f32,
    triggered: bool,
    active: bool,
    effect_elapsed: f32,
    accumulator: f32,
}

impl BossAbilityState {
    /// Seconds elapsed since the cooldown last reset.
    #[must_use]
    pub fn cooldown_elapsed(&self) -> f32 {
        self.cooldown_elapsed
    }

    /// Whether a one-shot threshold ability already fired.
    #[must_use]
    pub fn has_triggered(&self) -> bool {
        self.triggered
    }

    /// Whether a timed state is running.
    #[must_use]
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Seconds the running timed state has lasted.
    #[must_use]
    pub fn effect_elapsed(&self) -> f32 {
        self.effect_elapsed
    }

    /// Fractional carry-over of a passive drain.
    #[must_use]
    pub fn accumulator(&self) -> f32 {
        self.accumulator
    }
}

/// Active shield fraction for the ability, or zero.
#[must_use]
pub fn damage_reduction(definition: &BossAbilityDefinition, state: &BossAbilityState) -> f32 {
    match definition.kind {
        BossAbilityKind::DamageShield { reduction, .. } if state.active => reduction.clamp(0.0, 1.0),
        _ => 0.0,
    }
}

/// Active speed multiplier for the ability, or one.
#[must_use]
pub fn speed_multiplier(definition: &BossAbilityDefinition, state: &BossAbilityState) -> f32 {
    match definition.kind {
        BossAbilityKind::SpeedBoost { multiplier, .. } if state.active => multiplier.max(0.0),
        _ => 1.0,
    }
}

/// Elapsed over total cooldown in `[0, 1]`; zero for non-cooldown triggers.
#[must_use]
pub fn cooldown_progress(definition: &BossAbilityDefinition, state: &BossAbilityState) -> f32 {
    match definition.trigger {
        BossTrigger::Cooldown { seconds } if seconds > 0.0 => {
            (state.cooldown_elapsed / seconds).clamp(0.0, 1.0)
        }
        _ => 0.0,
    }
}

#[derive(Clone, Debug, PartialEq)]
struct Ability {
    definition: BossAbilityDefinition,
    state: BossAbilityState,
}

/// Ability set of one living boss.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BossAbilityEngine {
    abilities: Vec<Ability>,
}

impl BossAbilityEngine {
    /// Creates fresh state for every definition.
    #[must_use]
    pub fn new(definitions: &[BossAbilityDefinition]) -> Self {
        Self {
            abilities: definitions
                .iter()
                .map(|definition| Ability {
                    definition: definition.clone(),
                    state: BossAbilityState::default(),
                })
                .collect(),
        }
    }

    /// Number of abilities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.abilities.len()
    }

    /// Whether the boss has no abilities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.abilities.is_empty()
    }

    /// Name of the ability at `index`.
    #[must_use]
    pub fn name(&self, index: usize) -> Option<&str> {
        self.abilities
            .get(index)
            .map(|ability| ability.definition.name.as_str())
    }

    /// Definitions paired with their current state.
    pub fn iter(&self) -> impl Iterator<Item = (&BossAbilityDefinition, &BossAbilityState)> {
        self.abilities
            .iter()
            .map(|ability| (&ability.definition, &ability.state))
    }

    /// Strongest active shield.
    #[must_use]
    pub fn damage_reduction(&self) -> f32 {
        self.iter()
            .map(|(definition, state)| damage_reduction(definition, state))
            .fold(0.0, f32::max)
    }

    /// Product of every active speed boost.
    #[must_use]
    pub fn speed_multiplier(&self) -> f32 {
        self.iter()
            .map(|(definition, state)| speed_multiplier(definition, state))
            .product()
    }

    /// Advances every ability and appends the actions they fire.
    pub fn tick(&mut self, context: BossContext, out: &mut Vec<FiredAbility>) {
        let dt = context.dt.as_secs_f32();

        for (index, ability) in self.abilities.iter_mut().enumerate() {
            let Ability { definition, state } = ability;

            if state.active {
                state.effect_elapsed += dt;
                if let Some((duration, ended)) = timed_window(&definition.kind) {
                    if state.effect_elapsed >= duration {
                        state.active = false;
                        state.effect_elapsed = 0.0;
                        tracing::trace!(ability = %definition.name, "boss timed state ended");
                        out.push(FiredAbility {
                            ability: index,
                            action: ended,
                        });
                    }
                }
            }

            let fires = match definition.trigger {
                BossTrigger::Cooldown { seconds } => {
                    if seconds > 0.0 {
                        state.cooldown_elapsed += dt;
                        if state.cooldown_elapsed >= seconds {
                            state.cooldown_elapsed = 0.0;
                            true
                        } else {
                            false
                        }
                    } else {
                        false
                    }
                }
                BossTrigger::Passive => {
                    if let BossAbilityKind::DrainCurrency { per_second } = definition.kind {
                        state.accumulator += per_second.max(0.0) * dt;
                        let whole = state.accumulator.floor();
                        if whole >= 1.0 {
                            state.accumulator -= whole;
                            out.push(FiredAbility {
                                ability: index,
                                action: BossAction::DrainCurrency {
                                    amount: whole as u32,
                                },
                            });
                        }
                        false
                    } else if timed_window(&definition.kind).is_some() {
                        // A passive boost or shield is raised once and then runs out.
                        !std::mem::replace(&mut state.triggered, true)
                    } else {
                        true
                    }
                }
                BossTrigger::HpThreshold { fraction } => {
                    if !state.triggered && context.health_fraction <= fraction {
                        state.triggered = true;
                        true
                    } else {
                        false
                    }
                }
            };

            if fires {
                if !matches!(definition.trigger, BossTrigger::Passive) {
                    tracing::debug!(ability = %definition.name, "boss ability fired");
                }
                let action = fire(&definition.kind, state, context.max_health);
                out.push(FiredAbility {
                    ability: index,
                    action,
                });
            }
        }
    }
}

fn timed_window(kind: &BossAbilityKind) -> Option<(f32, BossAction)> {
    match kind {
        BossAbilityKind::SpeedBoost { duration, .. } => {
            Some((*duration, BossAction::SpeedBoostEnded))
        }
        BossAbilityKind::DamageShield { duration, .. } => {
            Some((*duration, BossAction::ShieldDropped))
        }
        _ => None,
    }
}

fn fire(kind: &BossAbilityKind, state: &mut BossAbilityState, max_health: f32) -> BossAction {
    match kind {
        BossAbilityKind::StunNearestTower { range } => {
            BossAction::StunNearestTower { range: *range }
        }
        BossAbilityKind::SpeedBoost { multiplier, .. } => {
            state.active = true;
            state.effect_elapsed = 0.0;
            BossAction::SpeedBoostStarted {
                multiplier: *multiplier,
            }
        }
        BossAbilityKind::Heal { fraction } => BossAction::Heal {
            amount: fraction.max(0.0) * max_health,
        },
        BossAbilityKind::SpawnMinions { enemy, count } => BossAction::SpawnMinions {
            enemy: enemy.clone(),
            count: *count,
        },
        BossAbilityKind::DamageShield { reduction, .. } => {
            state.active = true;
            state.effect_elapsed = 0.0;
            BossAction::ShieldRaised {
                reduction: *reduction,
            }
        }
        BossAbilityKind::DrainCurrency { per_second } => BossAction::DrainCurrency {
            amount: per_second.max(0.0).floor() as u32,
        },
        BossAbilityKind::RangeReduction { radius, factor } => BossAction::RangeReduction {
            radius: *radius,
            factor: *factor,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context(seconds: f32, health_fraction: f32) -> BossContext {
        BossContext {
            dt: Duration::from_secs_f32(seconds),
            health_fraction,
            max_health: 200.0,
        }
    }

    fn run(engine: &mut BossAbilityEngine, seconds: f32, health_fraction: f32) -> Vec<BossAction> {
        let mut out = Vec::new();
        engine.tick(context(seconds, health_fraction), &mut out);
        out.into_iter().map(|fired| fired.action).collect()
    }

    #[test]
    fn cooldown_fires_and_resets() {
        let mut engine = BossAbilityEngine::new(&[BossAbilityDefinition::new(
            "claw",
            BossTrigger::Cooldown { seconds: 2.0 },
            BossAbilityKind::StunNearestTower { range: 4.0 },
        )]);

        assert!(run(&mut engine, 1.5, 1.0).is_empty());
        let (definition, state) = engine.iter().next().expect("one ability");
        assert_eq!(cooldown_progress(definition, state), 0.75);

        assert_eq!(
            run(&mut engine, 0.5, 1.0),
            vec![BossAction::StunNearestTower { range: 4.0 }]
        );
        let (definition, state) = engine.iter().next().expect("one ability");
        assert_eq!(cooldown_progress(definition, state), 0.0);
    }

    #[test]
    fn threshold_fires_once() {
        let mut engine = BossAbilityEngine::new(&[BossAbilityDefinition::new(
            "serenade",
            BossTrigger::HpThreshold { fraction: 0.5 },
            BossAbilityKind::Heal { fraction: 0.2 },
        )]);

        assert!(run(&mut engine, 0.1, 0.6).is_empty());
        assert_eq!(run(&mut engine, 0.1, 0.5), vec![BossAction::Heal { amount: 40.0 }]);
        assert!(run(&mut engine, 0.1, 0.7).is_empty());
        assert!(run(&mut engine, 0.1, 0.2).is_empty());

        let (definition, state) = engine.iter().next().expect("one ability");
        assert!(state.has_triggered());
        assert_eq!(cooldown_progress(definition, state), 0.0);
    }

    #[test]
    fn passive_shield_ends_after_its_window() {
        let mut engine = BossAbilityEngine::new(&[BossAbilityDefinition::new(
            "aegis",
            BossTrigger::Passive,
            BossAbilityKind::DamageShield {
                reduction: 0.5,
                duration: 1.0,
            },
        )]);

        assert_eq!(
            run(&mut engine, 0.1, 1.0),
            vec![BossAction::ShieldRaised { reduction: 0.5 }]
        );
        assert_eq!(engine.damage_reduction(), 0.5);
        assert!(run(&mut engine, 0.5, 1.0).is_empty());
        assert_eq!(run(&mut engine, 0.5, 1.0), vec![BossAction::ShieldDropped]);
        assert_eq!(engine.damage_reduction(), 0.0);

        assert!(run(&mut engine, 1.0, 1.0).is_empty());
        let (_, state) = engine.iter().next().expect("one ability");
        assert!(!state.is_active());
        assert!(state.has_triggered());
    }

    #[test]
    fn passive_drain_fires_whole_units() {
        let mut engine = BossAbilityEngine::new(&[BossAbilityDefinition::new(
            "network",
            BossTrigger::Passive,
            BossAbilityKind::DrainCurrency { per_second: 2.0 },
        )]);

        assert!(run(&mut engine, 0.25, 1.0).is_empty());
        assert_eq!(run(&mut engine, 0.25, 1.0), vec![BossAction::DrainCurrency { amount: 1 }]);
        assert_eq!(run(&mut engine, 1.5, 1.0), vec![BossAction::DrainCurrency { amount: 3 }]);
        let (_, state) = engine.iter().next().expect("one ability");
        assert_eq!(state.accumulator(), 0.0);
    }

    #[test]
    fn passive_aura_fires_every_frame() {
        let mut engine = BossAbilityEngine::new(&[BossAbilityDefinition::new(
            "jamming",
            BossTrigger::Passive,
            BossAbilityKind::RangeReduction {
                radius: 4.0,
                factor: 0.7,
            },
        )]);

        for _ in 0..3 {
            assert_eq!(
                run(&mut engine, 0.016, 1.0),
                vec![BossAction::RangeReduction {
                    radius: 4.0,
                    factor: 0.7
                }]
            );
        }
    }

    #[test]
    fn shield_clears_exactly_at_duration() {
        let mut engine = BossAbilityEngine::new(&[BossAbilityDefinition::new(
            "armor",
            BossTrigger::Cooldown { seconds: 1.0 },
            BossAbilityKind::DamageShield {
                reduction: 0.5,
                duration: 0.5,
            },
        )]);

        assert_eq!(
            run(&mut engine, 1.0, 1.0),
            vec![BossAction::ShieldRaised { reduction: 0.5 }]
        );
        assert_eq!(engine.damage_reduction(), 0.5);

        assert!(run(&mut engine, 0.25, 1.0).is_empty());
        assert_eq!(engine.damage_reduction(), 0.5);

        assert_eq!(run(&mut engine, 0.25, 1.0), vec![BossAction::ShieldDropped]);
        assert_eq!(engine.damage_reduction(), 0.0);
    }

    #[test]
    fn speed_boost_multiplies_until_it_ends() {
        let mut engine = BossAbilityEngine::new(&[BossAbilityDefinition::new(
            "afterburner",
            BossTrigger::HpThreshold { fraction: 0.25 },
            BossAbilityKind::SpeedBoost {
                multiplier: 1.5,
                duration: 1.0,
            },
        )]);
        assert_eq!(engine.speed_multiplier(), 1.0);

        assert_eq!(
            run(&mut engine, 0.1, 0.2),
            vec![BossAction::SpeedBoostStarted { multiplier: 1.5 }]
        );
        assert_eq!(engine.speed_multiplier(), 1.5);

        assert_eq!(run(&mut engine, 1.0, 0.2), vec![BossAction::SpeedBoostEnded]);
        assert_eq!(engine.speed_multiplier(), 1.0);
    }

    #[test]
    fn spawn_minions_carry_kind_and_count() {
        let mut engine = BossAbilityEngine::new(&[BossAbilityDefinition::new(
            "trump sword",
            BossTrigger::Cooldown { seconds: 3.0 },
            BossAbilityKind::SpawnMinions {
                enemy: EnemyKindId::new("minion_bakemon"),
                count: 3,
            },
        )]);

        let mut out = Vec::new();
        engine.tick(context(3.0, 1.0), &mut out);
        assert_eq!(
            out,
            vec![FiredAbility {
                ability: 0,
                action: BossAction::SpawnMinions {
                    enemy: EnemyKindId::new("minion_bakemon"),
                    count: 3,
                },
            }]
        );
        assert_eq!(engine.name(0), Some("trump sword"));
        assert_eq!(engine.name(1), None);
    }

    #[test]
    fn unknown_boss_has_no_abilities() {
        let table = digi_defence_core::BossTable::default();
        let engine = BossAbilityEngine::new(table.abilities(&EnemyKindId::new("goblimon")));
        assert!(engine.is_empty());
        assert_eq!(engine.len(), 0);
        assert_eq!(engine.damage_reduction(), 0.0);
    }
}
