#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state management for Digi Defence.
//!
//! The world owns the run, the towers and the enemies on the lane. Adapters
//! drive it exclusively through [`apply`] and observe it through [`query`]
//! and the emitted [`Event`]s.

mod enemies;
mod towers;

use std::time::Duration;

use digi_defence_core::{
    BossTable, CellCoord, Command, CommandRejection, DigimonId, EffectId, EffectKind, EnemyKindId,
    EnemyTable, Event, GameMode, MergeError, PlacementError, Point, Roster, RunState, SpawnSlot,
    SpendError, TargetPriority, Tower, TowerId, TowerRecord, Tuning, UnitId, WELCOME_BANNER,
};
use digi_defence_system_boss_abilities::{BossAbilityEngine, BossAction, BossContext, FiredAbility};
use digi_defence_system_progression::Progression;
use digi_defence_system_spawning::Spawning;
use digi_defence_system_status_effects::{is_feared, is_stunned, EffectEvent, StatusEffects};
use digi_defence_system_tower_combat::TowerCombat;
use digi_defence_system_tower_targeting::{TargetCandidate, TowerAim, TowerTarget, TowerTargeting};
use digi_defence_system_wave_generation::{WaveGeneration, RNG_STREAM_QUEUE};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

use enemies::Enemy;
use towers::TowerRegistry;

/// Label of the stream that rolls effect procs for the whole run.
pub const RNG_STREAM_PROCS: &str = "procs";

/// Static layout and starting conditions of a run.
///
/// The lane runs horizontally through `lane_row`, from column zero to the
/// right edge of the playfield.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorldConfig {
    /// Playfield width in cells; also the lane length.
    pub columns: u32,
    /// Playfield height in cells.
    pub rows: u32,
    /// Row occupied by the lane.
    pub lane_row: u32,
    /// Currency at the start of the run.
    pub starting_currency: u32,
    /// Lives at the start of the run.
    pub starting_lives: u32,
    /// Global seed for wave composition, queue shuffles and proc rolls.
    pub seed: u64,
    /// Campaign or endless.
    pub mode: GameMode,
}

impl Default for WorldConfig {
    fn default() -> Self {
        Self {
            columns: 20,
            rows: 5,
            lane_row: 2,
            starting_currency: 300,
            starting_lives: 20,
            seed: 0x5eed_d161_0000_0001,
            mode: GameMode::Campaign,
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct ActiveWave {
    number: u32,
    reward: u32,
    hp_scaling: f64,
}

#[derive(Clone, Copy, Debug)]
struct Aura {
    center: Point,
    radius: f32,
    factor: f32,
}

#[derive(Debug, Default)]
struct Scratch {
    slots: Vec<SpawnSlot>,
    effect_events: Vec<EffectEvent>,
    fired: Vec<FiredAbility>,
    auras: Vec<Aura>,
    aims: Vec<TowerAim>,
    candidates: Vec<TargetCandidate>,
    assignments: Vec<TowerTarget>,
    positions: Vec<(UnitId, Point)>,
    spread: Vec<UnitId>,
}

/// Represents the authoritative Digi Defence world state.
#[derive(Debug)]
pub struct World {
    banner: &'static str,
    config: WorldConfig,
    roster: Roster,
    enemy_table: EnemyTable,
    bosses: BossTable,
    effects: StatusEffects,
    targeting: TowerTargeting,
    combat: TowerCombat,
    progression: Progression,
    waves: WaveGeneration,
    spawning: Spawning,
    rng: ChaCha8Rng,
    run: RunState,
    towers: TowerRegistry,
    enemies: Vec<Enemy>,
    next_unit_id: u32,
    wave: Option<ActiveWave>,
    game_over: bool,
    tick_index: u64,
    scratch: Scratch,
}

impl World {
    /// Creates a fresh run with the provided layout and tuning.
    #[must_use]
    pub fn new(config: WorldConfig, tuning: Tuning) -> Self {
        let Tuning {
            attributes,
            effects,
            combat,
            progression,
            roster,
            enemies,
            waves,
            bosses,
        } = tuning;

        let waves = WaveGeneration::new(waves, config.seed);
        let rng = waves.wave_rng(0, RNG_STREAM_PROCS);
        let run = RunState::new(config.starting_currency, config.starting_lives, config.mode);

        Self {
            banner: WELCOME_BANNER,
            roster,
            enemy_table: enemies,
            bosses,
            effects: StatusEffects::new(effects),
            targeting: TowerTargeting::new(),
            combat: TowerCombat::new(attributes, combat),
            progression: Progression::new(progression),
            waves,
            spawning: Spawning::new(),
            rng,
            run,
            towers: TowerRegistry::new(),
            enemies: Vec::new(),
            next_unit_id: 0,
            wave: None,
            game_over: false,
            tick_index: 0,
            scratch: Scratch::default(),
            config,
        }
    }

    /// Rebuilds a run between waves from persisted records.
    ///
    /// Records naming unknown Digimon or unusable cells are skipped.
    #[must_use]
    pub fn restore(
        config: WorldConfig,
        tuning: Tuning,
        run: RunState,
        records: &[TowerRecord],
    ) -> Self {
        let mut world = Self::new(config, tuning);
        world.run = run;

        for record in records {
            if world.validate_cell(record.cell).is_err() {
                tracing::warn!(
                    digimon = record.digimon.as_str(),
                    column = record.cell.column(),
                    row = record.cell.row(),
                    "skipping tower record on an unusable cell"
                );
                continue;
            }
            let Some(definition) = world.roster.get(&record.digimon) else {
                tracing::warn!(
                    digimon = record.digimon.as_str(),
                    "skipping tower record for an unknown Digimon"
                );
                continue;
            };
            let id = world.towers.allocate();
            let unit = next_unit(&mut world.next_unit_id);
            if let Some(tower) = Tower::from_record(id, unit, record, definition) {
                world.towers.insert(tower);
            }
        }

        world
    }

    fn lane_y(&self) -> f32 {
        self.config.lane_row as f32 + 0.5
    }

    fn path_length(&self) -> f32 {
        self.config.columns as f32
    }

    fn validate_cell(&self, cell: CellCoord) -> Result<(), PlacementError> {
        if cell.column() >= self.config.columns || cell.row() >= self.config.rows {
            return Err(PlacementError::OutOfBounds);
        }
        if cell.row() == self.config.lane_row {
            return Err(PlacementError::OnLane);
        }
        if self.towers.occupant(cell).is_some() {
            return Err(PlacementError::Occupied);
        }
        Ok(())
    }

    fn spawn_enemy(
        &mut self,
        kind: &EnemyKindId,
        hp_scaling: f64,
        boss: bool,
        progress: f32,
        out_events: &mut Vec<Event>,
    ) {
        let lane_y = self.lane_y();
        let Some(definition) = self.enemy_table.get(kind) else {
            tracing::warn!(enemy = kind.as_str(), "unknown enemy kind skipped");
            return;
        };
        let abilities = boss.then(|| BossAbilityEngine::new(self.bosses.abilities(kind)));
        let id = next_unit(&mut self.next_unit_id);
        let enemy = Enemy::spawn(id, definition, hp_scaling, progress, lane_y, abilities);

        out_events.push(Event::EnemySpawned {
            unit: id,
            enemy: kind.clone(),
            max_health: enemy.unit.health.max(),
            boss,
        });
        self.enemies.push(enemy);
    }

    fn tick(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        self.tick_index = self.tick_index.saturating_add(1);
        out_events.push(Event::TimeAdvanced { dt });

        if self.game_over {
            return;
        }

        self.spawn_due(dt, out_events);
        self.tick_tower_effects(dt, out_events);
        self.tick_enemy_effects(dt, out_events);
        self.enemies.retain(|enemy| enemy.unit.is_alive());
        self.tick_bosses(dt, out_events);
        self.advance_enemies(dt, out_events);
        if self.game_over {
            return;
        }
        self.resolve_combat(dt, out_events);
        self.enemies.retain(|enemy| enemy.unit.is_alive());
        self.check_wave_cleared(out_events);
    }

    fn spawn_due(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut slots = std::mem::take(&mut self.scratch.slots);
        slots.clear();
        self.spawning.handle(dt, &mut slots);
        for slot in slots.drain(..) {
            self.spawn_enemy(&slot.enemy, slot.hp_scaling, slot.boss, 0.0, out_events);
        }
        self.scratch.slots = slots;
    }

    fn tick_tower_effects(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let events = &mut self.scratch.effect_events;
        for tower in self.towers.iter_mut() {
            events.clear();
            self.effects.tick(&mut tower.unit, dt, events);
            for event in events.iter() {
                if let EffectEvent::Expired { kind } = *event {
                    out_events.push(Event::EffectExpired {
                        unit: tower.unit.id,
                        kind,
                    });
                }
            }
        }
    }

    fn tick_enemy_effects(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let events = &mut self.scratch.effect_events;
        for enemy in &mut self.enemies {
            events.clear();
            self.effects.tick(&mut enemy.unit, dt, events);
            for event in events.iter() {
                match *event {
                    EffectEvent::PeriodicDamage { .. } => {}
                    EffectEvent::Expired { kind } => out_events.push(Event::EffectExpired {
                        unit: enemy.unit.id,
                        kind,
                    }),
                    EffectEvent::Thawed => out_events.push(Event::EffectApplied {
                        unit: enemy.unit.id,
                        kind: EffectKind::Thaw,
                    }),
                    EffectEvent::Died { .. } => {
                        self.run.earn(enemy.reward);
                        out_events.push(Event::EnemyKilled {
                            unit: enemy.unit.id,
                            tower: None,
                            reward: enemy.reward,
                        });
                    }
                }
            }
        }
    }

    fn tick_bosses(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let mut fired = std::mem::take(&mut self.scratch.fired);
        self.scratch.auras.clear();
        let mut minions: Vec<(EnemyKindId, u32, f32)> = Vec::new();
        let stun = EffectId::new(EffectKind::Stun);

        for enemy in &mut self.enemies {
            let Some(engine) = enemy.abilities.as_mut() else {
                continue;
            };
            let boss = enemy.unit.id;
            fired.clear();
            engine.tick(
                BossContext {
                    dt,
                    health_fraction: enemy.unit.health.fraction(),
                    max_health: enemy.unit.health.max(),
                },
                &mut fired,
            );

            for FiredAbility { ability, action } in fired.drain(..) {
                if announces(&action) {
                    if let Some(name) = engine.name(ability) {
                        tracing::debug!(boss = boss.get(), ability = name, "boss ability triggered");
                        out_events.push(Event::BossAbilityTriggered {
                            boss,
                            ability: name.to_owned(),
                        });
                    }
                }

                match action {
                    BossAction::StunNearestTower { range } => {
                        let origin = enemy.unit.position;
                        let nearest = self
                            .towers
                            .iter()
                            .map(|tower| (tower.id, origin.distance(tower.unit.position)))
                            .filter(|(_, distance)| *distance <= range)
                            .fold(None::<(TowerId, f32)>, |best, current| match best {
                                Some(best) if best.1 <= current.1 => Some(best),
                                _ => Some(current),
                            });
                        if let Some(tower) = nearest.and_then(|(id, _)| self.towers.get_mut(id)) {
                            let _ = self.effects.apply(&mut tower.unit, &stun, 0.0);
                            out_events.push(Event::TowerStunned {
                                tower: tower.id,
                                boss,
                            });
                        }
                    }
                    BossAction::Heal { amount } => {
                        let _ = enemy.unit.health.heal(amount);
                    }
                    BossAction::SpawnMinions { enemy: kind, count } => {
                        minions.push((kind, count, enemy.unit.path_progress));
                    }
                    BossAction::DrainCurrency { amount } => {
                        let taken = self.run.drain(amount);
                        if taken > 0 {
                            out_events.push(Event::CurrencyDrained { boss, amount: taken });
                        }
                    }
                    BossAction::RangeReduction { radius, factor } => {
                        self.scratch.auras.push(Aura {
                            center: enemy.unit.position,
                            radius,
                            factor,
                        });
                    }
                    BossAction::SpeedBoostStarted { .. }
                    | BossAction::SpeedBoostEnded
                    | BossAction::ShieldRaised { .. }
                    | BossAction::ShieldDropped => {}
                }
            }
        }
        self.scratch.fired = fired;

        let hp_scaling = self.wave.map_or(1.0, |wave| wave.hp_scaling);
        for (kind, count, progress) in minions {
            for _ in 0..count {
                self.spawn_enemy(&kind, hp_scaling, false, progress, out_events);
            }
        }
    }

    fn advance_enemies(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let elapsed = dt.as_secs_f32();
        let path_length = self.path_length();

        for enemy in &mut self.enemies {
            let step = enemy.current_speed() * elapsed;
            let progress = if is_feared(&enemy.unit.effects) {
                (enemy.unit.path_progress - step).max(0.0)
            } else {
                enemy.unit.path_progress + step
            };
            enemy.move_to(progress);
        }

        let mut index = 0;
        while index < self.enemies.len() {
            if self.enemies[index].unit.path_progress < path_length {
                index += 1;
                continue;
            }
            let leaked = self.enemies.remove(index);
            out_events.push(Event::EnemyLeaked {
                unit: leaked.unit.id,
                lives_lost: leaked.leak_damage,
            });
            if !self.run.lose_lives(leaked.leak_damage) && !self.game_over {
                self.game_over = true;
                self.spawning.clear();
                tracing::info!(wave = self.run.wave, "run lost");
                out_events.push(Event::GameOver {
                    wave: self.run.wave,
                });
            }
        }
    }

    fn resolve_combat(&mut self, dt: Duration, out_events: &mut Vec<Event>) {
        let elapsed = dt.as_secs_f32();
        let scratch = &mut self.scratch;

        scratch.aims.clear();
        for tower in self.towers.iter() {
            if is_stunned(&tower.unit.effects) {
                continue;
            }
            let range = scratch
                .auras
                .iter()
                .filter(|aura| aura.center.distance(tower.unit.position) <= aura.radius)
                .fold(tower.range, |range, aura| range * aura.factor.clamp(0.0, 1.0));
            scratch.aims.push(TowerAim {
                tower: tower.id,
                origin: Some(tower.unit.position),
                range,
                priority: tower.priority,
            });
        }

        scratch.candidates.clear();
        scratch.candidates.extend(
            self.enemies
                .iter()
                .map(Enemy::target_candidate),
        );
        scratch.positions.clear();
        scratch.positions.extend(
            self.enemies
                .iter()
                .map(|enemy| (enemy.unit.id, enemy.unit.position)),
        );
        self.targeting
            .handle(&scratch.aims, &scratch.candidates, &mut scratch.assignments);

        for tower in self.towers.iter_mut() {
            if !self.combat.tick_cooldown(tower, elapsed) || is_stunned(&tower.unit.effects) {
                continue;
            }
            let Some(target) = scratch
                .assignments
                .iter()
                .find(|assignment| assignment.tower == tower.id)
                .map(|assignment| assignment.target)
            else {
                continue;
            };
            let Some(index) = self
                .enemies
                .iter()
                .position(|enemy| enemy.unit.id == target && enemy.unit.is_alive())
            else {
                continue;
            };

            let enemy = &mut self.enemies[index];
            let shield = enemy.shield();
            let outcome =
                self.combat
                    .resolve_attack(tower, &mut enemy.unit, &self.effects, shield, &mut self.rng);
            self.combat.reset_cooldown(tower);

            out_events.push(Event::TowerAttacked {
                tower: tower.id,
                target,
                damage: outcome.damage,
            });
            if outcome.killed {
                self.run.earn(enemy.reward);
                out_events.push(Event::EnemyKilled {
                    unit: target,
                    tower: Some(tower.id),
                    reward: enemy.reward,
                });
            } else {
                for effect in &outcome.procs {
                    if enemy.unit.effects.contains(effect.base) {
                        out_events.push(Event::EffectApplied {
                            unit: target,
                            kind: effect.base,
                        });
                    }
                }
            }

            for effect in &outcome.buffs {
                if tower.unit.effects.contains(effect.base) {
                    out_events.push(Event::EffectApplied {
                        unit: tower.unit.id,
                        kind: effect.base,
                    });
                }
            }

            let struck_at = enemy.unit.position;
            for effect in &outcome.procs {
                self.combat.spread_targets(
                    effect,
                    target,
                    struck_at,
                    &scratch.positions,
                    &mut scratch.spread,
                );
                for unit in &scratch.spread {
                    let Some(other) = self.enemies.iter_mut().find(|enemy| enemy.unit.id == *unit)
                    else {
                        continue;
                    };
                    if let Some(kind) = self.effects.apply(&mut other.unit, effect, outcome.hit) {
                        out_events.push(Event::EffectApplied { unit: *unit, kind });
                    }
                }
            }
        }
    }

    fn check_wave_cleared(&mut self, out_events: &mut Vec<Event>) {
        let Some(wave) = self.wave else {
            return;
        };
        if !self.spawning.is_finished() || !self.enemies.is_empty() {
            return;
        }

        self.wave = None;
        self.run.earn(wave.reward);
        tracing::debug!(wave = wave.number, reward = wave.reward, "wave cleared");
        out_events.push(Event::WaveCleared {
            wave: wave.number,
            reward: wave.reward,
        });
    }

    fn start_wave(&mut self) -> Result<Event, CommandRejection> {
        if self.wave.is_some() {
            return Err(CommandRejection::WaveInProgress);
        }

        let number = self.run.wave.saturating_add(1);
        let spec = match self.run.mode {
            GameMode::Campaign => self
                .waves
                .generate_fixed_wave(number)
                .ok_or(CommandRejection::NoMoreWaves)?,
            GameMode::Endless => self.waves.planned_wave(number),
        };

        let mut rng = self.waves.wave_rng(number, RNG_STREAM_QUEUE);
        let queue = self.waves.build_spawn_queue(&spec, &mut rng);
        let spawns = u32::try_from(queue.len()).unwrap_or(u32::MAX);
        self.spawning.start(
            queue,
            Duration::from_millis(u64::from(spec.spawn_interval_ms)),
        );

        self.run.wave = number;
        self.wave = Some(ActiveWave {
            number,
            reward: spec.reward.unwrap_or(0),
            hp_scaling: self.waves.hp_scaling(number),
        });
        tracing::debug!(wave = number, spawns, "wave started");

        Ok(Event::WaveStarted {
            wave: number,
            spawns,
            boss: spec.boss,
        })
    }

    fn place_tower(&mut self, digimon: DigimonId, cell: CellCoord) -> Result<Event, CommandRejection> {
        self.validate_cell(cell)?;
        let definition = self
            .roster
            .get(&digimon)
            .ok_or(PlacementError::UnknownDigimon)?;
        if definition.cost == 0 {
            return Err(PlacementError::NotPlaceable.into());
        }
        self.run
            .spend(definition.cost)
            .map_err(|SpendError::InsufficientFunds { needed, available }| {
                PlacementError::CannotAfford { needed, available }
            })?;

        let id = self.towers.allocate();
        let unit = next_unit(&mut self.next_unit_id);
        self.towers.insert(Tower::spawn(id, unit, definition, cell));

        Ok(Event::TowerPlaced {
            tower: id,
            digimon,
            cell,
        })
    }

    fn level_up_tower(&mut self, id: TowerId, levels: u32) -> Result<Event, CommandRejection> {
        let tower = self
            .towers
            .get_mut(id)
            .ok_or(CommandRejection::UnknownTower(id))?;
        let level_up = self.progression.level_up(tower, levels, &mut self.run)?;
        Ok(Event::TowerLeveled {
            tower: id,
            level: level_up.to,
            cost: level_up.cost,
        })
    }

    fn merge_towers(&mut self, survivor: TowerId, sacrifice: TowerId) -> Result<Event, CommandRejection> {
        if survivor == sacrifice {
            return Err(MergeError::SameTower.into());
        }
        let sacrificed = self
            .towers
            .get(sacrifice)
            .cloned()
            .ok_or(CommandRejection::UnknownTower(sacrifice))?;
        let tower = self
            .towers
            .get_mut(survivor)
            .ok_or(CommandRejection::UnknownTower(survivor))?;
        let result = self.progression.merge_towers(tower, &sacrificed)?;
        let _ = self.towers.remove(sacrifice);

        Ok(Event::TowersMerged {
            survivor,
            sacrifice,
            level: result.level,
            dp: result.dp,
        })
    }

    fn digivolve_tower(&mut self, id: TowerId, into: DigimonId) -> Result<Event, CommandRejection> {
        let tower = self
            .towers
            .get_mut(id)
            .ok_or(CommandRejection::UnknownTower(id))?;
        let cost = self
            .progression
            .digivolve(tower, &into, &self.roster, &mut self.run)?;
        Ok(Event::TowerDigivolved {
            tower: id,
            digimon: tower.digimon.clone(),
            stage: tower.stage,
            cost,
        })
    }

    fn set_target_priority(
        &mut self,
        id: TowerId,
        priority: TargetPriority,
    ) -> Result<Event, CommandRejection> {
        let tower = self
            .towers
            .get_mut(id)
            .ok_or(CommandRejection::UnknownTower(id))?;
        tower.priority = priority;
        Ok(Event::TargetPriorityChanged {
            tower: id,
            priority,
        })
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new(WorldConfig::default(), Tuning::default())
    }
}

/// Applies the provided command to the world, mutating state deterministically.
///
/// Rejected commands leave the world untouched and emit
/// [`Event::CommandRejected`] with the reason.
pub fn apply(world: &mut World, command: Command, out_events: &mut Vec<Event>) {
    let outcome = match command {
        Command::Tick { dt } => {
            world.tick(dt, out_events);
            return;
        }
        _ if world.game_over => Err(CommandRejection::GameOver),
        Command::StartWave => world.start_wave(),
        Command::PlaceTower { digimon, cell } => world.place_tower(digimon, cell),
        Command::LevelUpTower { tower, levels } => world.level_up_tower(tower, levels),
        Command::MergeTowers {
            survivor,
            sacrifice,
        } => world.merge_towers(survivor, sacrifice),
        Command::DigivolveTower { tower, into } => world.digivolve_tower(tower, into),
        Command::SetTargetPriority { tower, priority } => world.set_target_priority(tower, priority),
    };

    match outcome {
        Ok(event) => out_events.push(event),
        Err(reason) => {
            tracing::debug!(%reason, "command rejected");
            out_events.push(Event::CommandRejected { reason });
        }
    }
}

fn next_unit(counter: &mut u32) -> UnitId {
    let id = UnitId::new(*counter);
    *counter = counter.saturating_add(1);
    id
}

fn announces(action: &BossAction) -> bool {
    matches!(
        action,
        BossAction::StunNearestTower { .. }
            | BossAction::SpeedBoostStarted { .. }
            | BossAction::Heal { .. }
            | BossAction::SpawnMinions { .. }
            | BossAction::ShieldRaised { .. }
    )
}

/// Query functions that provide read-only access to the world state.
pub mod query {
    use super::{World, WorldConfig};
    use digi_defence_core::{
        DigimonId, RunState, TowerId, TowerRecord, TowerSnapshot, UnitId, UnitSnapshot, WaveSpec,
    };
    use digi_defence_system_boss_abilities::cooldown_progress;
    use digi_defence_system_progression::{evolution_options, MergeCandidate};

    /// Retrieves the welcome banner that adapters may display to players.
    #[must_use]
    pub fn welcome_banner(world: &World) -> &'static str {
        world.banner
    }

    /// Layout and starting conditions of the run.
    #[must_use]
    pub fn config(world: &World) -> &WorldConfig {
        &world.config
    }

    /// Currency, lives, wave and mode.
    #[must_use]
    pub fn run_state(world: &World) -> RunState {
        world.run
    }

    /// Whether a wave is spawning or still has enemies on the lane.
    #[must_use]
    pub fn is_wave_active(world: &World) -> bool {
        world.wave.is_some()
    }

    /// Whether the run ran out of lives.
    #[must_use]
    pub fn is_game_over(world: &World) -> bool {
        world.game_over
    }

    /// Number of ticks applied so far.
    #[must_use]
    pub fn tick_index(world: &World) -> u64 {
        world.tick_index
    }

    /// Queue slots of the current wave that have not spawned yet.
    #[must_use]
    pub fn remaining_spawns(world: &World) -> usize {
        world.spawning.remaining()
    }

    /// Snapshots of every tower in identifier order.
    #[must_use]
    pub fn towers(world: &World) -> Vec<TowerSnapshot> {
        world.towers.iter().map(TowerSnapshot::capture).collect()
    }

    /// Snapshot of one tower.
    #[must_use]
    pub fn tower(world: &World, id: TowerId) -> Option<TowerSnapshot> {
        world.towers.get(id).map(TowerSnapshot::capture)
    }

    /// Snapshots of every enemy in spawn order.
    #[must_use]
    pub fn enemies(world: &World) -> Vec<UnitSnapshot> {
        world.enemies.iter().map(|enemy| enemy.snapshot()).collect()
    }

    /// Persisted form of every tower.
    #[must_use]
    pub fn tower_records(world: &World) -> Vec<TowerRecord> {
        world.towers.iter().map(|tower| tower.to_record()).collect()
    }

    /// Number of towers on the field.
    #[must_use]
    pub fn tower_count(world: &World) -> usize {
        world.towers.len()
    }

    /// Spec the next or any later wave will use.
    #[must_use]
    pub fn planned_wave(world: &World, wave: u32) -> WaveSpec {
        world.waves.planned_wave(wave)
    }

    /// Upgrade options shown by a tower info panel.
    #[derive(Clone, Debug, PartialEq, Eq)]
    pub struct UpgradePreview {
        /// Current level.
        pub level: u32,
        /// Level ceiling from stage, DP and origin.
        pub max_level: u32,
        /// Price of the next level; `None` at the ceiling.
        pub next_level_cost: Option<u32>,
        /// Price of digivolving; `None` while not allowed.
        pub digivolve_cost: Option<u32>,
        /// Roster entries the tower may evolve into.
        pub evolutions: Vec<DigimonId>,
    }

    /// Level and evolution options of a tower.
    #[must_use]
    pub fn upgrade_preview(world: &World, id: TowerId) -> Option<UpgradePreview> {
        let tower = world.towers.get(id)?;
        let progression = &world.progression;
        let max_level = progression.tower_max_level(tower);
        Some(UpgradePreview {
            level: tower.level,
            max_level,
            next_level_cost: (tower.level < max_level)
                .then(|| progression.level_up_cost(tower.level, tower.stage)),
            digivolve_cost: progression.check_digivolve(tower, u32::MAX).ok(),
            evolutions: evolution_options(&world.roster, &tower.digimon).to_vec(),
        })
    }

    /// Towers that could be merged into `id`.
    #[must_use]
    pub fn merge_partners(world: &World, id: TowerId) -> Vec<TowerId> {
        let Some(tower) = world.towers.get(id) else {
            return Vec::new();
        };
        let candidate = MergeCandidate::from_tower(tower);
        world
            .towers
            .iter()
            .filter(|other| other.id != id)
            .filter(|other| {
                world
                    .progression
                    .can_merge(&candidate, &MergeCandidate::from_tower(other))
            })
            .map(|other| other.id)
            .collect()
    }

    /// Display state of one boss ability.
    #[derive(Clone, Debug, PartialEq)]
    pub struct BossAbilityStatus {
        /// Ability name.
        pub name: String,
        /// Cooldown fill in `[0, 1]`; zero for non-cooldown triggers.
        pub cooldown_progress: f32,
        /// Whether a timed state is running.
        pub active: bool,
    }

    /// Ability states of a living boss; empty for other units.
    #[must_use]
    pub fn boss_abilities(world: &World, unit: UnitId) -> Vec<BossAbilityStatus> {
        world
            .enemies
            .iter()
            .find(|enemy| enemy.unit.id == unit)
            .and_then(|enemy| enemy.abilities.as_ref())
            .map(|engine| {
                engine
                    .iter()
                    .map(|(definition, state)| BossAbilityStatus {
                        name: definition.name.clone(),
                        cooldown_progress: cooldown_progress(definition, state),
                        active: state.is_active(),
                    })
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digi_defence_core::{Stage, WaveEntry, WaveSpec, WaveTable, WaveTuning};

    fn world() -> World {
        World::default()
    }

    fn place(world: &mut World, digimon: &str, column: u32, row: u32) -> Vec<Event> {
        let mut events = Vec::new();
        apply(
            world,
            Command::PlaceTower {
                digimon: DigimonId::new(digimon),
                cell: CellCoord::new(column, row),
            },
            &mut events,
        );
        events
    }

    fn rejection(events: &[Event]) -> Option<CommandRejection> {
        events.iter().find_map(|event| match event {
            Event::CommandRejected { reason } => Some(*reason),
            _ => None,
        })
    }

    fn single_wave_tuning(entries: Vec<WaveEntry>, boss: Option<&str>) -> Tuning {
        Tuning {
            waves: WaveTuning {
                authored: WaveTable::new(vec![WaveSpec {
                    wave: 1,
                    entries,
                    spawn_interval_ms: 100,
                    boss: boss.map(EnemyKindId::new),
                    reward: Some(25),
                }]),
                ..WaveTuning::default()
            },
            ..Tuning::default()
        }
    }

    #[test]
    fn placement_spends_currency_and_occupies_the_cell() {
        let mut world = world();
        let events = place(&mut world, "agumon", 4, 1);

        assert_eq!(
            events,
            vec![Event::TowerPlaced {
                tower: TowerId::new(0),
                digimon: DigimonId::new("agumon"),
                cell: CellCoord::new(4, 1),
            }]
        );
        assert_eq!(query::run_state(&world).currency, 200);

        let again = place(&mut world, "gabumon", 4, 1);
        assert_eq!(
            rejection(&again),
            Some(CommandRejection::Placement(PlacementError::Occupied))
        );
        assert_eq!(query::run_state(&world).currency, 200);
    }

    #[test]
    fn placement_rejections_are_structured() {
        let mut world = world();
        assert_eq!(
            rejection(&place(&mut world, "agumon", 4, 2)),
            Some(CommandRejection::Placement(PlacementError::OnLane))
        );
        assert_eq!(
            rejection(&place(&mut world, "agumon", 40, 1)),
            Some(CommandRejection::Placement(PlacementError::OutOfBounds))
        );
        assert_eq!(
            rejection(&place(&mut world, "missingno", 1, 1)),
            Some(CommandRejection::Placement(PlacementError::UnknownDigimon))
        );
        assert_eq!(
            rejection(&place(&mut world, "greymon", 1, 1)),
            Some(CommandRejection::Placement(PlacementError::NotPlaceable))
        );

        let _ = place(&mut world, "agumon", 0, 0);
        let _ = place(&mut world, "agumon", 1, 0);
        let _ = place(&mut world, "agumon", 2, 0);
        assert_eq!(
            rejection(&place(&mut world, "agumon", 3, 0)),
            Some(CommandRejection::Placement(PlacementError::CannotAfford {
                needed: 100,
                available: 0,
            }))
        );
        assert_eq!(query::tower_count(&world), 3);
    }

    #[test]
    fn merge_consumes_the_sacrifice() {
        let mut world = world();
        let _ = place(&mut world, "agumon", 0, 0);
        let _ = place(&mut world, "agumon", 1, 0);
        assert_eq!(
            query::merge_partners(&world, TowerId::new(0)),
            vec![TowerId::new(1)]
        );

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::MergeTowers {
                survivor: TowerId::new(0),
                sacrifice: TowerId::new(1),
            },
            &mut events,
        );

        assert_eq!(
            events,
            vec![Event::TowersMerged {
                survivor: TowerId::new(0),
                sacrifice: TowerId::new(1),
                level: 1,
                dp: 1,
            }]
        );
        assert!(query::tower(&world, TowerId::new(1)).is_none());

        events.clear();
        apply(
            &mut world,
            Command::MergeTowers {
                survivor: TowerId::new(0),
                sacrifice: TowerId::new(0),
            },
            &mut events,
        );
        assert_eq!(
            rejection(&events),
            Some(CommandRejection::Merge(MergeError::SameTower))
        );
    }

    #[test]
    fn level_up_and_digivolve_flow_through_the_run() {
        let config = WorldConfig {
            starting_currency: 10_000,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, Tuning::default());
        let _ = place(&mut world, "agumon", 0, 0);
        let tower = TowerId::new(0);

        let preview = query::upgrade_preview(&world, tower).expect("tower exists");
        assert_eq!(preview.evolutions, vec![DigimonId::new("greymon")]);
        assert_eq!(preview.digivolve_cost, None);

        let mut events = Vec::new();
        apply(
            &mut world,
            Command::LevelUpTower {
                tower,
                levels: preview.max_level,
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::TowerLeveled { level, .. }] if *level == preview.max_level
        ));

        events.clear();
        apply(
            &mut world,
            Command::DigivolveTower {
                tower,
                into: DigimonId::new("greymon"),
            },
            &mut events,
        );
        assert!(matches!(
            events.as_slice(),
            [Event::TowerDigivolved { stage: Stage::Champion, .. }]
        ));
        let snapshot = query::tower(&world, tower).expect("tower exists");
        assert_eq!(snapshot.level, 1);
        assert_eq!(snapshot.digimon, DigimonId::new("greymon"));
    }

    #[test]
    fn unknown_towers_are_rejected() {
        let mut world = world();
        let mut events = Vec::new();
        apply(
            &mut world,
            Command::SetTargetPriority {
                tower: TowerId::new(7),
                priority: TargetPriority::Strongest,
            },
            &mut events,
        );
        assert_eq!(
            rejection(&events),
            Some(CommandRejection::UnknownTower(TowerId::new(7)))
        );
    }

    #[test]
    fn starting_a_wave_twice_is_rejected() {
        let mut world = world();
        let mut events = Vec::new();
        apply(&mut world, Command::StartWave, &mut events);
        assert!(matches!(events[0], Event::WaveStarted { wave: 1, .. }));

        events.clear();
        apply(&mut world, Command::StartWave, &mut events);
        assert_eq!(rejection(&events), Some(CommandRejection::WaveInProgress));
    }

    #[test]
    fn campaign_stops_after_the_last_authored_wave() {
        let tuning = single_wave_tuning(Vec::new(), None);
        let mut world = World::new(WorldConfig::default(), tuning);
        let mut events = Vec::new();

        apply(&mut world, Command::StartWave, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(16),
            },
            &mut events,
        );
        assert!(events.contains(&Event::WaveCleared { wave: 1, reward: 25 }));

        events.clear();
        apply(&mut world, Command::StartWave, &mut events);
        assert_eq!(rejection(&events), Some(CommandRejection::NoMoreWaves));
    }

    #[test]
    fn leaks_cost_lives_and_end_the_run() {
        let tuning = single_wave_tuning(vec![WaveEntry::new("tyrannomon", 1)], None);
        let config = WorldConfig {
            columns: 2,
            starting_lives: 2,
            ..WorldConfig::default()
        };
        let mut world = World::new(config, tuning);
        let mut events = Vec::new();

        apply(&mut world, Command::StartWave, &mut events);
        for _ in 0..4 {
            apply(
                &mut world,
                Command::Tick {
                    dt: Duration::from_secs(1),
                },
                &mut events,
            );
        }

        assert!(events
            .iter()
            .any(|event| matches!(event, Event::EnemyLeaked { lives_lost: 2, .. })));
        assert!(events.contains(&Event::GameOver { wave: 1 }));
        assert!(query::is_game_over(&world));
        assert_eq!(query::run_state(&world).lives, 0);

        events.clear();
        apply(&mut world, Command::StartWave, &mut events);
        assert_eq!(rejection(&events), Some(CommandRejection::GameOver));
    }

    #[test]
    fn boss_spawns_last_with_abilities() {
        let tuning = single_wave_tuning(vec![WaveEntry::new("goblimon", 2)], Some("devidramon"));
        let mut world = World::new(WorldConfig::default(), tuning);
        let mut events = Vec::new();

        apply(&mut world, Command::StartWave, &mut events);
        apply(
            &mut world,
            Command::Tick {
                dt: Duration::from_millis(300),
            },
            &mut events,
        );

        let spawned: Vec<bool> = events
            .iter()
            .filter_map(|event| match event {
                Event::EnemySpawned { boss, .. } => Some(*boss),
                _ => None,
            })
            .collect();
        assert_eq!(spawned, vec![false, false, true]);

        let boss = query::enemies(&world)
            .into_iter()
            .find(|enemy| enemy.boss)
            .expect("boss on the lane");
        let abilities = query::boss_abilities(&world, boss.id);
        assert_eq!(abilities.len(), 1);
        assert_eq!(abilities[0].name, "Crimson Claw");
        assert!(query::boss_abilities(&world, UnitId::new(0)).is_empty());
    }

    #[test]
    fn welcome_banner_is_exposed() {
        assert_eq!(query::welcome_banner(&world()), WELCOME_BANNER);
    }
}
