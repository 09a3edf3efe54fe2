//! Enemy bodies walking the lane.

use digi_defence_core::{EnemyDefinition, EnemyKindId, Point, Unit, UnitId, UnitSnapshot};
use digi_defence_system_boss_abilities::BossAbilityEngine;
use digi_defence_system_status_effects::{is_stunned, speed_multiplier};
use digi_defence_system_tower_targeting::TargetCandidate;

/// Enemy stored inside the world.
#[derive(Clone, Debug)]
pub(crate) struct Enemy {
    pub(crate) unit: Unit,
    pub(crate) kind: EnemyKindId,
    pub(crate) reward: u32,
    pub(crate) leak_damage: u32,
    /// Present for bosses only; dropped together with the enemy.
    pub(crate) abilities: Option<BossAbilityEngine>,
}

impl Enemy {
    /// Creates an enemy at `progress` along the lane with scaled health.
    pub(crate) fn spawn(
        id: UnitId,
        definition: &EnemyDefinition,
        hp_scaling: f64,
        progress: f32,
        lane_y: f32,
        abilities: Option<BossAbilityEngine>,
    ) -> Self {
        let scaled = (f64::from(definition.max_health) * hp_scaling).min(f64::from(f32::MAX));
        let mut unit = Unit::new(
            id,
            definition.attribute,
            scaled as f32,
            definition.speed,
            definition.armor,
        )
        .at(Point::new(progress, lane_y))
        .flying(definition.flying);
        unit.path_progress = progress;

        Self {
            unit,
            kind: definition.id.clone(),
            reward: definition.reward,
            leak_damage: definition.leak_damage,
            abilities,
        }
    }

    pub(crate) fn is_boss(&self) -> bool {
        self.abilities.is_some()
    }

    /// Fraction of incoming tower damage absorbed by boss shields.
    pub(crate) fn shield(&self) -> f32 {
        self.abilities
            .as_ref()
            .map_or(0.0, BossAbilityEngine::damage_reduction)
    }

    /// Lane speed after crowd control and boss boosts.
    pub(crate) fn current_speed(&self) -> f32 {
        if is_stunned(&self.unit.effects) {
            return 0.0;
        }
        let boost = self
            .abilities
            .as_ref()
            .map_or(1.0, BossAbilityEngine::speed_multiplier);
        self.unit.base_speed * speed_multiplier(&self.unit.effects) * boost
    }

    /// Targeting view ranked by the speed the enemy actually walks at.
    pub(crate) fn target_candidate(&self) -> TargetCandidate {
        TargetCandidate::from_unit(&self.unit).with_speed(self.current_speed())
    }

    /// Moves the enemy to `progress` along the lane.
    pub(crate) fn move_to(&mut self, progress: f32) {
        self.unit.path_progress = progress;
        self.unit.position.x = progress;
    }

    pub(crate) fn snapshot(&self) -> UnitSnapshot {
        UnitSnapshot {
            id: self.unit.id,
            enemy: self.kind.clone(),
            attribute: self.unit.attribute,
            health_fraction: self.unit.health.fraction(),
            position: self.unit.position,
            path_progress: self.unit.path_progress,
            effects: self.unit.effects.kinds().collect(),
            boss: self.is_boss(),
        }
    }
}
