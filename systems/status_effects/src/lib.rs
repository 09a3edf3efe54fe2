#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Status effect engine: application, stacking, periodic damage and expiry.
//!
//! The engine owns only the injected effect table. Every piece of per-unit
//! state lives in the unit's own [`ActiveEffects`] map, so one engine serves
//! every enemy and tower in the world.

use std::time::Duration;

use digi_defence_core::{
    ActiveEffect, ActiveEffects, EffectCategory, EffectId, EffectKind, EffectScaling,
    EffectTable, Unit,
};

/// Seconds the slow left behind by an expired freeze lasts.
pub const THAW_DURATION: f32 = 1.0;

/// Speed factor of the slow left behind by an expired freeze.
pub const THAW_STRENGTH: f32 = 0.5;

/// Observable outcome of ticking a unit's effects.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum EffectEvent {
    /// A periodic effect dealt damage.
    PeriodicDamage {
        /// Effect that ticked.
        kind: EffectKind,
        /// Health actually removed.
        amount: f32,
    },
    /// An effect ran out and was removed.
    Expired {
        /// Effect that expired.
        kind: EffectKind,
    },
    /// A freeze expired and left a thaw slow behind.
    Thawed,
    /// A periodic hit reduced the unit to zero health.
    Died {
        /// Effect that dealt the final hit.
        kind: EffectKind,
    },
}

/// Status effect engine bound to an effect table.
#[derive(Clone, Debug, Default)]
pub struct StatusEffects {
    table: EffectTable,
    expired: Vec<EffectKind>,
}

impl StatusEffects {
    /// Creates an engine for the provided definitions.
    #[must_use]
    pub fn new(table: EffectTable) -> Self {
        Self {
            table,
            expired: Vec::new(),
        }
    }

    /// Definitions the engine resolves against.
    #[must_use]
    pub fn table(&self) -> &EffectTable {
        &self.table
    }

    /// Applies an effect to the unit.
    ///
    /// Returns the base effect that was applied or refreshed, or `None` when
    /// the identifier has no definition or the unit is already dead.
    pub fn apply(&self, unit: &mut Unit, effect: &EffectId, source_damage: f32) -> Option<EffectKind> {
        if !unit.is_alive() {
            return None;
        }
        let definition = self.table.resolve(effect)?;
        let source_damage = if source_damage.is_finite() {
            source_damage.max(0.0)
        } else {
            0.0
        };
        let max_stacks = definition.max_stacks.max(1);

        match unit.effects.get_mut(definition.kind) {
            Some(entry) => {
                entry.remaining = definition.duration;
                entry.source_damage = entry.source_damage.max(source_damage);
                if entry.stacks < max_stacks {
                    entry.stacks += 1;
                }
                debug_assert!(entry.stacks <= max_stacks);
                tracing::trace!(
                    unit = unit.id.get(),
                    effect = definition.kind.name(),
                    stacks = entry.stacks,
                    "effect refreshed"
                );
            }
            None => {
                let _ = unit
                    .effects
                    .insert(ActiveEffect::from_definition(definition, source_damage));
                tracing::trace!(
                    unit = unit.id.get(),
                    effect = definition.kind.name(),
                    "effect applied"
                );
            }
        }

        Some(definition.kind)
    }

    /// Advances every active effect on the unit by `dt`.
    ///
    /// Periodic hits bypass armor. A hit that kills the unit stops processing
    /// for the rest of the frame, including expiry.
    pub fn tick(&mut self, unit: &mut Unit, dt: Duration, out: &mut Vec<EffectEvent>) {
        if !unit.is_alive() || unit.effects.is_empty() {
            return;
        }
        let elapsed = dt.as_secs_f32();
        let unit_id = unit.id;
        let Unit {
            health, effects, ..
        } = unit;

        for entry in effects.iter_mut() {
            entry.remaining -= elapsed;

            let Some(definition) = self.table.definition(entry.kind) else {
                continue;
            };
            let Some(interval) = definition.tick_interval.filter(|interval| *interval > 0.0) else {
                continue;
            };

            entry.tick_accumulator += elapsed;
            while entry.tick_accumulator >= interval {
                entry.tick_accumulator -= interval;
                let basis = match definition.scaling {
                    EffectScaling::SourceDamage => entry.source_damage,
                    EffectScaling::MaxHealth => health.max(),
                };
                let amount = health.apply_raw_damage(entry.strength * entry.stacks as f32 * basis);
                out.push(EffectEvent::PeriodicDamage {
                    kind: entry.kind,
                    amount,
                });

                if !health.is_alive() {
                    tracing::debug!(
                        unit = unit_id.get(),
                        effect = entry.kind.name(),
                        "unit died to periodic damage"
                    );
                    out.push(EffectEvent::Died { kind: entry.kind });
                    return;
                }
            }
        }

        self.expired.clear();
        self.expired.extend(
            effects
                .iter()
                .filter(|entry| entry.remaining <= 0.0)
                .map(|entry| entry.kind),
        );

        for kind in self.expired.drain(..) {
            let _ = effects.remove(kind);
            out.push(EffectEvent::Expired { kind });
            tracing::trace!(unit = unit_id.get(), effect = kind.name(), "effect expired");

            if kind == EffectKind::Freeze {
                let _ = effects.insert(thaw());
                out.push(EffectEvent::Thawed);
            }
        }
    }
}

fn thaw() -> ActiveEffect {
    ActiveEffect {
        kind: EffectKind::Thaw,
        category: EffectCategory::CrowdControl,
        remaining: THAW_DURATION,
        tick_accumulator: 0.0,
        strength: THAW_STRENGTH,
        stacks: 1,
        source_damage: 0.0,
    }
}

/// Movement factor from every active crowd-control effect; 1.0 when none.
///
/// Factors multiply, so a slow during a thaw compounds.
#[must_use]
pub fn speed_multiplier(effects: &ActiveEffects) -> f32 {
    effects
        .iter()
        .filter(|entry| entry.category == EffectCategory::CrowdControl)
        .map(|entry| entry.strength)
        .product::<f32>()
        .clamp(0.0, 1.0)
}

/// Armor factor from every active debuff, each raised to its stack count.
#[must_use]
pub fn armor_multiplier(effects: &ActiveEffects) -> f32 {
    effects
        .iter()
        .filter(|entry| entry.category == EffectCategory::Debuff)
        .map(|entry| entry.strength.powi(entry.stacks as i32))
        .product::<f32>()
        .clamp(0.0, 1.0)
}

/// Attack speed factor from every active support effect.
#[must_use]
pub fn attack_speed_multiplier(effects: &ActiveEffects) -> f32 {
    effects
        .iter()
        .filter(|entry| entry.category == EffectCategory::Support)
        .map(|entry| entry.strength)
        .product::<f32>()
        .max(0.0)
}

/// Reports whether the unit can neither move nor attack.
#[must_use]
pub fn is_stunned(effects: &ActiveEffects) -> bool {
    effects.contains(EffectKind::Stun) || effects.contains(EffectKind::Freeze)
}

/// Reports whether the unit walks backwards.
#[must_use]
pub fn is_feared(effects: &ActiveEffects) -> bool {
    effects.contains(EffectKind::Fear)
}
