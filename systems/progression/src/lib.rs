#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Tower progression: level costs, level ceilings, digivolution and merges.
//!
//! Every rule reads its constants from an injected [`ProgressionTuning`].
//! Operations that spend currency validate first and only mutate the tower
//! and the run once every precondition holds.

use digi_defence_core::{
    Attribute, BonusEffect, DigimonId, DigivolveError, EffectId, LevelUpError, MergeError,
    ProgressionTuning, Roster, RunState, Stage, Tower,
};

/// Progression-relevant view of a tower taking part in a merge.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeCandidate {
    /// Level.
    pub level: u32,
    /// Digivolution points.
    pub dp: u32,
    /// Combat attribute.
    pub attribute: Attribute,
    /// Current stage.
    pub stage: Stage,
    /// Innate effect and its proc chance.
    pub effect: Option<(EffectId, f32)>,
    /// Effects already inherited from earlier merges.
    pub bonus_effects: Vec<BonusEffect>,
}

impl MergeCandidate {
    /// Captures the merge-relevant state of a tower.
    #[must_use]
    pub fn from_tower(tower: &Tower) -> Self {
        Self {
            level: tower.level,
            dp: tower.dp,
            attribute: tower.unit.attribute,
            stage: tower.stage,
            effect: tower
                .innate_effect
                .as_ref()
                .map(|innate| (innate.effect.clone(), innate.chance)),
            bonus_effects: tower.bonus_effects.clone(),
        }
    }
}

/// State the survivor takes on after a merge.
#[derive(Clone, Debug, PartialEq)]
pub struct MergeResult {
    /// Higher of the two levels.
    pub level: u32,
    /// Higher of the two DP values plus one.
    pub dp: u32,
    /// Survivor bonus effects after inheritance.
    pub bonus_effects: Vec<BonusEffect>,
}

/// Levels bought by a level-up.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct LevelUp {
    /// Level before the purchase.
    pub from: u32,
    /// Level after the purchase.
    pub to: u32,
    /// Currency spent.
    pub cost: u32,
}

/// Progression rules bound to a tuning table.
#[derive(Clone, Debug, Default)]
pub struct Progression {
    tuning: ProgressionTuning,
}

impl Progression {
    /// Creates the rules for the provided tuning.
    #[must_use]
    pub fn new(tuning: ProgressionTuning) -> Self {
        Self { tuning }
    }

    /// Constants in use.
    #[must_use]
    pub fn tuning(&self) -> &ProgressionTuning {
        &self.tuning
    }

    /// Currency needed to go from `level` to `level + 1`.
    #[must_use]
    pub fn level_up_cost(&self, level: u32, stage: Stage) -> u32 {
        let cost = self.tuning.base_cost_per_level
            * f64::from(level)
            * self.tuning.stage_cost_multiplier(stage);
        cost.ceil().max(0.0) as u32
    }

    /// Currency needed to go from `from` to `to`; zero when `to <= from`.
    #[must_use]
    pub fn total_level_up_cost(&self, from: u32, to: u32, stage: Stage) -> u32 {
        (from..to).fold(0u32, |total, level| {
            total.saturating_add(self.level_up_cost(level, stage))
        })
    }

    /// Highest level reachable from `from`, capped at `max`, within `budget`.
    #[must_use]
    pub fn max_affordable_level(&self, from: u32, max: u32, budget: u32, stage: Stage) -> u32 {
        let mut level = from;
        let mut spent = 0u32;
        while level < max {
            let next = spent.saturating_add(self.level_up_cost(level, stage));
            if next > budget {
                break;
            }
            spent = next;
            level += 1;
        }
        level
    }

    /// Level ceiling of a tower at `stage` with `dp` points created at `origin`.
    #[must_use]
    pub fn max_level(&self, stage: Stage, dp: u32, origin: Stage) -> u32 {
        self.tuning
            .base_max_level(stage)
            .saturating_add(dp.saturating_mul(self.tuning.dp_bonus(stage)))
            .saturating_add(
                stage
                    .steps_above(origin)
                    .saturating_mul(self.tuning.origin_bonus_per_stage),
            )
    }

    /// Level ceiling of the tower.
    #[must_use]
    pub fn tower_max_level(&self, tower: &Tower) -> u32 {
        self.max_level(tower.stage, tower.dp, tower.origin_stage())
    }

    /// Reports whether a tower at `current` created at `origin` may evolve.
    #[must_use]
    pub fn can_evolve(&self, current: Stage, origin: Stage) -> bool {
        current
            .next()
            .is_some_and(|next| next <= self.tuning.evolution_ceiling(origin))
    }

    /// Cost of digivolving out of `stage`; `None` forbids the step.
    #[must_use]
    pub fn digivolve_cost(&self, stage: Stage) -> Option<u32> {
        self.tuning.digivolve_cost(stage)
    }

    /// Validates a digivolution and returns its cost.
    ///
    /// Checks run in order: level ceiling reached, origin ceiling, cost
    /// defined, currency sufficient.
    pub fn check_digivolve(&self, tower: &Tower, currency: u32) -> Result<u32, DigivolveError> {
        let max_level = self.tower_max_level(tower);
        if tower.level < max_level {
            return Err(DigivolveError::NotAtMaxLevel {
                level: tower.level,
                max_level,
            });
        }

        let origin = tower.origin_stage();
        if !self.can_evolve(tower.stage, origin) {
            return Err(DigivolveError::EvolutionCeiling {
                origin,
                ceiling: self.tuning.evolution_ceiling(origin),
            });
        }

        let cost = self
            .digivolve_cost(tower.stage)
            .ok_or(DigivolveError::CostUndefined { stage: tower.stage })?;
        if currency < cost {
            return Err(DigivolveError::CannotAfford {
                needed: cost,
                available: currency,
            });
        }

        Ok(cost)
    }

    /// Evolves the tower into `into`, paying from the run.
    ///
    /// The target must be one of the roster's evolutions for the tower and sit
    /// exactly one stage higher. The level resets to one; DP and origin stay.
    pub fn digivolve(
        &self,
        tower: &mut Tower,
        into: &DigimonId,
        roster: &Roster,
        run: &mut RunState,
    ) -> Result<u32, DigivolveError> {
        let cost = self.check_digivolve(tower, run.currency)?;

        if !roster.evolutions(&tower.digimon).contains(into) {
            return Err(DigivolveError::InvalidEvolution);
        }
        let definition = roster
            .get(into)
            .filter(|definition| Some(definition.stage) == tower.stage.next())
            .ok_or(DigivolveError::InvalidEvolution)?;

        run.spend(cost).map_err(|_| DigivolveError::CannotAfford {
            needed: cost,
            available: run.currency,
        })?;

        tracing::debug!(
            tower = tower.id.get(),
            from = tower.digimon.as_str(),
            into = into.as_str(),
            cost,
            "tower digivolved"
        );
        tower.evolve_into(definition);
        Ok(cost)
    }

    /// Buys up to `levels` levels, as many as the ceiling and currency allow.
    pub fn level_up(
        &self,
        tower: &mut Tower,
        levels: u32,
        run: &mut RunState,
    ) -> Result<LevelUp, LevelUpError> {
        let max_level = self.tower_max_level(tower);
        if tower.level >= max_level {
            return Err(LevelUpError::AtMaxLevel { max_level });
        }

        let from = tower.level;
        let target = from.saturating_add(levels.max(1)).min(max_level);
        let to = self.max_affordable_level(from, target, run.currency, tower.stage);
        if to == from {
            return Err(LevelUpError::CannotAfford {
                needed: self.level_up_cost(from, tower.stage),
                available: run.currency,
            });
        }

        let cost = self.total_level_up_cost(from, to, tower.stage);
        run.spend(cost).map_err(|_| LevelUpError::CannotAfford {
            needed: cost,
            available: run.currency,
        })?;
        tower.level = to;

        Ok(LevelUp { from, to, cost })
    }

    /// Validates that two candidates may merge.
    pub fn check_merge(&self, a: &MergeCandidate, b: &MergeCandidate) -> Result<(), MergeError> {
        if a.stage != b.stage {
            return Err(MergeError::StageMismatch);
        }
        let compatible = a.attribute == b.attribute
            || a.attribute == Attribute::Free
            || b.attribute == Attribute::Free;
        if !compatible {
            return Err(MergeError::AttributeMismatch);
        }
        Ok(())
    }

    /// Reports whether two candidates may merge; symmetric.
    #[must_use]
    pub fn can_merge(&self, a: &MergeCandidate, b: &MergeCandidate) -> bool {
        self.check_merge(a, b).is_ok()
    }

    /// Computes the survivor's state after absorbing `sacrifice`.
    pub fn merge(
        &self,
        survivor: &MergeCandidate,
        sacrifice: &MergeCandidate,
    ) -> Result<MergeResult, MergeError> {
        self.check_merge(survivor, sacrifice)?;

        let mut bonus_effects = survivor.bonus_effects.clone();
        if let Some((effect, chance)) = &sacrifice.effect {
            self.inherit(&mut bonus_effects, effect, *chance);
        }

        Ok(MergeResult {
            level: survivor.level.max(sacrifice.level),
            dp: survivor.dp.max(sacrifice.dp).saturating_add(1),
            bonus_effects,
        })
    }

    /// Merges `sacrifice` into `survivor` in place; the caller removes the
    /// sacrificed tower.
    pub fn merge_towers(&self, survivor: &mut Tower, sacrifice: &Tower) -> Result<MergeResult, MergeError> {
        if survivor.id == sacrifice.id {
            return Err(MergeError::SameTower);
        }
        let result = self.merge(
            &MergeCandidate::from_tower(survivor),
            &MergeCandidate::from_tower(sacrifice),
        )?;

        survivor.level = result.level;
        survivor.dp = result.dp;
        survivor.bonus_effects = result.bonus_effects.clone();
        tracing::debug!(
            survivor = survivor.id.get(),
            sacrifice = sacrifice.id.get(),
            level = result.level,
            dp = result.dp,
            "towers merged"
        );
        Ok(result)
    }

    fn inherit(&self, bonus_effects: &mut Vec<BonusEffect>, effect: &EffectId, chance: f32) {
        if !(chance > 0.0) {
            return;
        }

        if let Some(existing) = bonus_effects.iter_mut().find(|bonus| &bonus.effect == effect) {
            existing.chance = (existing.chance + self.tuning.merge_stack_bonus).min(1.0);
            return;
        }

        if bonus_effects.len() < self.tuning.max_bonus_effects {
            bonus_effects.push(BonusEffect {
                effect: effect.clone(),
                chance: (chance * self.tuning.inherited_chance_factor).min(1.0),
            });
        }
    }
}

/// Roster entries `digimon` may evolve into; empty for unknown identifiers.
#[must_use]
pub fn evolution_options<'a>(roster: &'a Roster, digimon: &DigimonId) -> &'a [DigimonId] {
    roster.evolutions(digimon)
}
