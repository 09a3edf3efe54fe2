#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Combat resolution: level-scaled stats, attribute multipliers, armor and
//! effect procs.

use digi_defence_core::{
    Attribute, AttributeTable, CombatTuning, EffectCategory, EffectId, EffectModifier, Point,
    Tower, Unit, UnitId, MAX_ARMOR,
};
use digi_defence_system_status_effects::{armor_multiplier, attack_speed_multiplier, StatusEffects};
use rand::Rng;

/// Health removed by a single damage application.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct DamageOutcome {
    /// Health actually removed.
    pub dealt: f32,
    /// Whether this application reduced the unit to zero.
    pub killed: bool,
}

/// Result of one tower attack.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AttackOutcome {
    /// Health removed from the target.
    pub damage: f32,
    /// Whether the hit killed the target.
    pub killed: bool,
    /// Damage of the hit before armor, used as the procs' source damage.
    pub hit: f32,
    /// Effects whose proc roll succeeded, in roll order.
    pub procs: Vec<EffectId>,
    /// Support effects whose proc roll succeeded; applied to the tower itself.
    pub buffs: Vec<EffectId>,
}

/// Damage per hit after level and attribute scaling.
#[must_use]
pub fn final_damage(
    base_damage: f32,
    level: u32,
    attacker: Attribute,
    defender: Attribute,
    attributes: &AttributeTable,
    tuning: &CombatTuning,
) -> f32 {
    base_damage * (1.0 + level as f32 * tuning.damage_per_level) * attributes.multiplier(attacker, defender)
}

/// Attacks per second after level scaling.
#[must_use]
pub fn final_attacks_per_second(base: f32, level: u32, tuning: &CombatTuning) -> f32 {
    base * (1.0 + level as f32 * tuning.attack_speed_per_level)
}

/// Armor after debuffs; effects only ever lower it.
#[must_use]
pub fn effective_armor(unit: &Unit) -> f32 {
    (unit.armor * armor_multiplier(&unit.effects)).clamp(0.0, MAX_ARMOR)
}

/// Applies damage reduced by the unit's effective armor.
pub fn apply_damage(unit: &mut Unit, raw: f32) -> DamageOutcome {
    let reduced = raw * (1.0 - effective_armor(unit));
    apply_raw_damage(unit, reduced)
}

/// Applies damage without armor; a dead unit takes nothing.
pub fn apply_raw_damage(unit: &mut Unit, raw: f32) -> DamageOutcome {
    let was_alive = unit.is_alive();
    let dealt = unit.health.apply_raw_damage(raw);
    DamageOutcome {
        dealt,
        killed: was_alive && !unit.is_alive(),
    }
}

/// Combat resolver bound to attribute and scaling tables.
#[derive(Clone, Debug, Default)]
pub struct TowerCombat {
    attributes: AttributeTable,
    tuning: CombatTuning,
}

impl TowerCombat {
    /// Creates a resolver for the provided tables.
    #[must_use]
    pub fn new(attributes: AttributeTable, tuning: CombatTuning) -> Self {
        Self { attributes, tuning }
    }

    /// Attribute multipliers in use.
    #[must_use]
    pub fn attributes(&self) -> &AttributeTable {
        &self.attributes
    }

    /// Scaling constants in use.
    #[must_use]
    pub fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    /// Damage the tower deals per hit against `defender`.
    #[must_use]
    pub fn tower_damage(&self, tower: &Tower, defender: Attribute) -> f32 {
        final_damage(
            tower.base_damage,
            tower.level,
            tower.unit.attribute,
            defender,
            &self.attributes,
            &self.tuning,
        )
    }

    /// Seconds between attacks including support buffs; infinite when the
    /// tower cannot attack at all.
    #[must_use]
    pub fn attack_interval(&self, tower: &Tower) -> f32 {
        let rate = final_attacks_per_second(tower.base_attacks_per_second, tower.level, &self.tuning)
            * attack_speed_multiplier(&tower.unit.effects);
        if rate > 0.0 {
            1.0 / rate
        } else {
            f32::INFINITY
        }
    }

    /// Counts the tower's cooldown down and reports whether it may fire.
    pub fn tick_cooldown(&self, tower: &mut Tower, elapsed: f32) -> bool {
        tower.cooldown = (tower.cooldown - elapsed).max(0.0);
        tower.cooldown <= 0.0
    }

    /// Restarts the tower's cooldown after an attack.
    pub fn reset_cooldown(&self, tower: &mut Tower) {
        tower.cooldown = self.attack_interval(tower);
    }

    /// Resolves one attack of `tower` on `target`.
    ///
    /// `shield` is the fraction of damage absorbed by an active boss shield.
    /// The innate effect is rolled first, then each bonus effect in order; a
    /// roll happens for every proc with a positive chance whether or not the
    /// hit killed, so the number of draws only depends on the tower.
    pub fn resolve_attack<R: Rng + ?Sized>(
        &self,
        tower: &mut Tower,
        target: &mut Unit,
        effects: &StatusEffects,
        shield: f32,
        rng: &mut R,
    ) -> AttackOutcome {
        let shield = if shield.is_finite() { shield.clamp(0.0, 1.0) } else { 0.0 };
        let hit = self.tower_damage(tower, target.attribute) * (1.0 - shield);
        let damage = apply_damage(target, hit);

        tower.damage_dealt += f64::from(damage.dealt);
        if damage.killed {
            tower.kills = tower.kills.saturating_add(1);
        }

        let mut procs = Vec::new();
        let mut buffs = Vec::new();
        let rolls = tower
            .innate_effect
            .iter()
            .map(|innate| (&innate.effect, innate.chance))
            .chain(tower.bonus_effects.iter().map(|bonus| (&bonus.effect, bonus.chance)));
        for (effect, chance) in rolls {
            if !roll(rng, chance) {
                continue;
            }
            let support = effects
                .table()
                .resolve(effect)
                .is_some_and(|definition| definition.category == EffectCategory::Support);
            if support {
                buffs.push(effect.clone());
            } else {
                procs.push(effect.clone());
            }
        }

        for effect in &procs {
            let _ = effects.apply(target, effect, hit);
        }
        for effect in &buffs {
            let _ = effects.apply(&mut tower.unit, effect, hit);
        }

        tracing::trace!(
            tower = tower.id.get(),
            target = target.id.get(),
            damage = damage.dealt,
            killed = damage.killed,
            procs = procs.len(),
            buffs = buffs.len(),
            "tower attack resolved"
        );

        AttackOutcome {
            damage: damage.dealt,
            killed: damage.killed,
            hit,
            procs,
            buffs,
        }
    }

    /// Collects the additional units a proc reaches through its modifiers.
    ///
    /// Area reaches every other unit within the splash radius of the struck
    /// unit. Chain jumps to the single nearest other unit within chain range;
    /// ties keep input order. The struck unit itself is never included.
    pub fn spread_targets(
        &self,
        effect: &EffectId,
        struck: UnitId,
        at: Point,
        others: &[(UnitId, Point)],
        out: &mut Vec<UnitId>,
    ) {
        out.clear();

        if effect.has(EffectModifier::Area) {
            out.extend(
                others
                    .iter()
                    .filter(|(id, position)| {
                        *id != struck && at.distance(*position) <= self.tuning.area_radius
                    })
                    .map(|(id, _)| *id),
            );
        }

        if effect.has(EffectModifier::Chain) {
            let nearest = others
                .iter()
                .filter(|(id, _)| *id != struck && !out.contains(id))
                .map(|(id, position)| (*id, at.distance(*position)))
                .filter(|(_, distance)| *distance <= self.tuning.chain_range)
                .fold(None::<(UnitId, f32)>, |best, current| match best {
                    Some(best) if best.1 <= current.1 => Some(best),
                    _ => Some(current),
                });
            if let Some((id, _)) = nearest {
                out.push(id);
            }
        }
    }
}

fn roll<R: Rng + ?Sized>(rng: &mut R, chance: f32) -> bool {
    if !(chance > 0.0) {
        return false;
    }
    rng.gen_bool(f64::from(chance.min(1.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use digi_defence_core::{
        BonusEffect, CellCoord, DigimonDefinition, DigimonId, EffectKind, EffectProc, EffectTable,
        Stage, TowerId,
    };
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn tower(attribute: Attribute, base_damage: f32, effect: Option<EffectProc>) -> Tower {
        let definition = DigimonDefinition {
            id: DigimonId::new("test"),
            stage: Stage::Rookie,
            attribute,
            base_damage,
            attacks_per_second: 2.0,
            range: 3.0,
            effect,
            cost: 100,
            evolutions: Vec::new(),
        };
        Tower::spawn(TowerId::new(1), UnitId::new(100), &definition, CellCoord::new(0, 0))
    }

    fn enemy(attribute: Attribute, health: f32, armor: f32) -> Unit {
        Unit::new(UnitId::new(1), attribute, health, 1.0, armor)
    }

    fn combat() -> TowerCombat {
        TowerCombat::default()
    }

    #[test]
    fn level_one_vaccine_hits_virus_for_fifteen_point_three() {
        let combat = combat();
        let mut tower = tower(Attribute::Vaccine, 10.0, None);
        let mut target = enemy(Attribute::Virus, 100.0, 0.0);
        let effects = StatusEffects::new(EffectTable::default());
        let mut rng = ChaCha8Rng::seed_from_u64(1);

        let outcome = combat.resolve_attack(&mut tower, &mut target, &effects, 0.0, &mut rng);

        assert!((outcome.damage - 15.3).abs() < 1e-4);
        assert!((target.health.current() - 84.7).abs() < 1e-4);
        assert!((tower.damage_dealt - 15.3).abs() < 1e-4);
    }

    #[test]
    fn armor_reduces_and_debuffs_weaken_armor() {
        let effects = StatusEffects::new(EffectTable::default());
        let mut target = enemy(Attribute::Data, 100.0, 0.5);

        assert_eq!(apply_damage(&mut target, 10.0).dealt, 5.0);

        let _ = effects.apply(&mut target, &EffectKind::ArmorBreak.into(), 0.0);
        assert!((effective_armor(&target) - 0.375).abs() < 1e-6);
    }

    #[test]
    fn heavy_armor_uses_the_exact_reduction() {
        let mut target = enemy(Attribute::Data, 100.0, 0.97);
        let outcome = apply_damage(&mut target, 100.0);
        assert!((outcome.dealt - 3.0).abs() < 1e-4);
        assert!((target.health.current() - 97.0).abs() < 1e-4);
    }

    #[test]
    fn raw_damage_ignores_armor() {
        let mut target = enemy(Attribute::Data, 100.0, 0.9);
        assert_eq!(apply_raw_damage(&mut target, 10.0).dealt, 10.0);
    }

    #[test]
    fn damage_on_a_dead_unit_is_a_no_op() {
        let mut target = enemy(Attribute::Data, 5.0, 0.0);
        let first = apply_damage(&mut target, 50.0);
        assert_eq!(first, DamageOutcome { dealt: 5.0, killed: true });

        let second = apply_damage(&mut target, 50.0);
        assert_eq!(second, DamageOutcome::default());
        assert_eq!(target.health.current(), 0.0);
    }

    #[test]
    fn kills_are_credited_once() {
        let combat = combat();
        let mut tower = tower(Attribute::Free, 100.0, None);
        let mut target = enemy(Attribute::Data, 10.0, 0.0);
        let effects = StatusEffects::default();
        let mut rng = ChaCha8Rng::seed_from_u64(2);

        let first = combat.resolve_attack(&mut tower, &mut target, &effects, 0.0, &mut rng);
        let second = combat.resolve_attack(&mut tower, &mut target, &effects, 0.0, &mut rng);

        assert!(first.killed);
        assert!(!second.killed);
        assert_eq!(tower.kills, 1);
        assert_eq!(tower.damage_dealt, 10.0);
    }

    #[test]
    fn shields_absorb_a_fraction_of_the_hit() {
        let combat = combat();
        let mut tower = tower(Attribute::Free, 10.0, None);
        let mut target = enemy(Attribute::Free, 100.0, 0.0);
        let effects = StatusEffects::default();
        let mut rng = ChaCha8Rng::seed_from_u64(3);

        let outcome = combat.resolve_attack(&mut tower, &mut target, &effects, 0.5, &mut rng);

        assert!((outcome.damage - 5.1).abs() < 1e-4);
    }

    #[test]
    fn certain_procs_always_apply_and_impossible_ones_never_do() {
        let combat = combat();
        let mut tower = tower(
            Attribute::Vaccine,
            1.0,
            Some(EffectProc::new(EffectKind::Burn, 1.0)),
        );
        tower.bonus_effects.push(BonusEffect {
            effect: EffectKind::Slow.into(),
            chance: 0.0,
        });
        let mut target = enemy(Attribute::Data, 1_000.0, 0.0);
        let effects = StatusEffects::new(EffectTable::default());
        let mut rng = ChaCha8Rng::seed_from_u64(4);

        for _ in 0..20 {
            let outcome = combat.resolve_attack(&mut tower, &mut target, &effects, 0.0, &mut rng);
            assert_eq!(outcome.procs, vec![EffectId::new(EffectKind::Burn)]);
        }
        assert!(target.effects.contains(EffectKind::Burn));
        assert!(!target.effects.contains(EffectKind::Slow));
    }

    #[test]
    fn support_procs_buff_the_attacking_tower() {
        let combat = combat();
        let mut tower = tower(
            Attribute::Vaccine,
            1.0,
            Some(EffectProc::new(EffectKind::Haste, 1.0)),
        );
        let mut target = enemy(Attribute::Data, 1_000.0, 0.0);
        let effects = StatusEffects::new(EffectTable::default());
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let before = combat.attack_interval(&tower);

        let outcome = combat.resolve_attack(&mut tower, &mut target, &effects, 0.0, &mut rng);

        assert!(outcome.procs.is_empty());
        assert_eq!(outcome.buffs, vec![EffectId::new(EffectKind::Haste)]);
        assert!(tower.unit.effects.contains(EffectKind::Haste));
        assert!(!target.effects.contains(EffectKind::Haste));
        assert!(combat.attack_interval(&tower) < before);
    }

    #[test]
    fn proc_rolls_are_reproducible_from_a_seed() {
        let combat = combat();
        let run = |seed: u64| {
            let mut tower = tower(
                Attribute::Virus,
                1.0,
                Some(EffectProc::new(EffectKind::Poison, 0.4)),
            );
            let mut target = enemy(Attribute::Data, 10_000.0, 0.0);
            let effects = StatusEffects::new(EffectTable::default());
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            (0..64)
                .map(|_| {
                    !combat
                        .resolve_attack(&mut tower, &mut target, &effects, 0.0, &mut rng)
                        .procs
                        .is_empty()
                })
                .collect::<Vec<_>>()
        };

        let first = run(9);
        assert_eq!(first, run(9));
        assert!(first.iter().any(|hit| *hit));
        assert!(first.iter().any(|hit| !*hit));
    }

    #[test]
    fn level_and_haste_shorten_the_attack_interval() {
        let combat = combat();
        let mut tower = tower(Attribute::Data, 1.0, None);
        tower.level = 0;
        assert!((combat.attack_interval(&tower) - 0.5).abs() < 1e-6);

        let effects = StatusEffects::new(EffectTable::default());
        let _ = effects.apply(&mut tower.unit, &EffectKind::Haste.into(), 0.0);
        assert!((combat.attack_interval(&tower) - 0.4).abs() < 1e-6);
    }

    #[test]
    fn cooldown_counts_down_to_readiness() {
        let combat = combat();
        let mut tower = tower(Attribute::Data, 1.0, None);
        combat.reset_cooldown(&mut tower);
        assert!(!combat.tick_cooldown(&mut tower, 0.1));
        assert!(combat.tick_cooldown(&mut tower, 1.0));
        assert_eq!(tower.cooldown, 0.0);
    }

    #[test]
    fn area_and_chain_reach_neighbours() {
        let combat = combat();
        let struck = UnitId::new(1);
        let at = Point::new(0.0, 0.0);
        let others = [
            (struck, at),
            (UnitId::new(2), Point::new(1.0, 0.0)),
            (UnitId::new(3), Point::new(2.5, 0.0)),
            (UnitId::new(4), Point::new(10.0, 0.0)),
        ];
        let mut out = Vec::new();

        combat.spread_targets(
            &EffectId::new(EffectKind::Burn).with(EffectModifier::Area),
            struck,
            at,
            &others,
            &mut out,
        );
        assert_eq!(out, vec![UnitId::new(2)]);

        combat.spread_targets(
            &EffectId::new(EffectKind::Burn).with(EffectModifier::Chain),
            struck,
            at,
            &others,
            &mut out,
        );
        assert_eq!(out, vec![UnitId::new(2)]);

        combat.spread_targets(
            &EffectId::new(EffectKind::Burn)
                .with(EffectModifier::Area)
                .with(EffectModifier::Chain),
            struck,
            at,
            &others,
            &mut out,
        );
        assert_eq!(out, vec![UnitId::new(2), UnitId::new(3)]);

        combat.spread_targets(&EffectKind::Burn.into(), struck, at, &others, &mut out);
        assert!(out.is_empty());
    }
}
