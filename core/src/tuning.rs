use serde::{Deserialize, Serialize};

use crate::{AttributeTable, BossTable, EffectTable, EnemyTable, Roster, Stage, WaveTuning};

/// Level scaling of tower stats and reach of effect modifiers.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CombatTuning {
    /// Damage bonus per level.
    pub damage_per_level: f32,
    /// Attack speed bonus per level.
    pub attack_speed_per_level: f32,
    /// Splash radius of area-modified effects.
    pub area_radius: f32,
    /// Jump range of chain-modified effects.
    pub chain_range: f32,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            damage_per_level: 0.02,
            attack_speed_per_level: 0.01,
            area_radius: 1.5,
            chain_range: 3.0,
        }
    }
}

/// Cost curves, level ceilings and merge constants.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressionTuning {
    /// Currency per level before the stage multiplier.
    pub base_cost_per_level: f64,
    /// Level cost multiplier per stage, strictly increasing.
    pub stage_cost_multipliers: [f64; Stage::COUNT],
    /// Level ceiling per stage before DP and origin bonuses.
    pub base_max_levels: [u32; Stage::COUNT],
    /// Extra levels per DP, per stage.
    pub dp_bonus: [u32; Stage::COUNT],
    /// Extra levels per stage climbed above the origin.
    pub origin_bonus_per_stage: u32,
    /// Highest reachable stage per origin stage.
    pub evolution_ceilings: [Stage; Stage::COUNT],
    /// Digivolve cost indexed by the current stage; missing entries forbid the step.
    pub digivolve_costs: Vec<u32>,
    /// Chance added when a merge repeats an inherited effect.
    pub merge_stack_bonus: f32,
    /// Fraction of the sacrificed tower's chance that is inherited.
    pub inherited_chance_factor: f32,
    /// Maximum number of inherited effects.
    pub max_bonus_effects: usize,
}

impl Default for ProgressionTuning {
    fn default() -> Self {
        use Stage::{Champion, Mega, Ultimate, Ultra};

        Self {
            base_cost_per_level: 3.0,
            stage_cost_multipliers: [1.0, 1.5, 2.0, 3.0, 4.0, 5.0],
            base_max_levels: [10, 20, 35, 50, 70, 100],
            dp_bonus: [1, 2, 2, 3, 3, 5],
            origin_bonus_per_stage: 5,
            evolution_ceilings: [Champion, Ultimate, Mega, Ultra, Ultra, Ultra],
            digivolve_costs: vec![100, 150, 250, 400],
            merge_stack_bonus: 0.1,
            inherited_chance_factor: 0.5,
            max_bonus_effects: 2,
        }
    }
}

impl ProgressionTuning {
    /// Level cost multiplier of the stage.
    #[must_use]
    pub fn stage_cost_multiplier(&self, stage: Stage) -> f64 {
        self.stage_cost_multipliers[stage.index()]
    }

    /// Level ceiling of the stage before bonuses.
    #[must_use]
    pub fn base_max_level(&self, stage: Stage) -> u32 {
        self.base_max_levels[stage.index()]
    }

    /// Extra levels granted per DP at the stage.
    #[must_use]
    pub fn dp_bonus(&self, stage: Stage) -> u32 {
        self.dp_bonus[stage.index()]
    }

    /// Highest stage a tower created at `origin` may reach.
    #[must_use]
    pub fn evolution_ceiling(&self, origin: Stage) -> Stage {
        self.evolution_ceilings[origin.index()]
    }

    /// Cost of digivolving out of `stage`; `None` when no cost is defined.
    #[must_use]
    pub fn digivolve_cost(&self, stage: Stage) -> Option<u32> {
        self.digivolve_costs.get(stage.index()).copied()
    }
}

/// Every injected table the simulation runs on.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    /// Attribute multipliers.
    pub attributes: AttributeTable,
    /// Status effect definitions.
    pub effects: EffectTable,
    /// Combat scaling.
    pub combat: CombatTuning,
    /// Progression curves.
    pub progression: ProgressionTuning,
    /// Tower Digimon.
    pub roster: Roster,
    /// Enemy kinds.
    pub enemies: EnemyTable,
    /// Wave tables and curves.
    pub waves: WaveTuning,
    /// Boss abilities.
    pub bosses: BossTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_cost_multipliers_strictly_increase() {
        let tuning = ProgressionTuning::default();
        for pair in tuning.stage_cost_multipliers.windows(2) {
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn ceilings_never_fall_below_origin() {
        let tuning = ProgressionTuning::default();
        for stage in Stage::ALL {
            assert!(tuning.evolution_ceiling(stage) >= stage);
        }
        assert_eq!(tuning.evolution_ceiling(Stage::InTraining), Stage::Champion);
        assert_eq!(tuning.evolution_ceiling(Stage::Rookie), Stage::Ultimate);
    }

    #[test]
    fn digivolve_cost_beyond_table_is_undefined() {
        let tuning = ProgressionTuning::default();
        assert_eq!(tuning.digivolve_cost(Stage::InTraining), Some(100));
        assert_eq!(tuning.digivolve_cost(Stage::Mega), None);
    }
}
