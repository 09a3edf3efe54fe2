#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Digi Defence engine.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative world, and pure systems. Adapters submit [`Command`] values
//! describing desired mutations, the world executes those commands via its
//! `apply` entry point, and then broadcasts [`Event`] values describing what
//! happened. Every registry the simulation consults (attribute multipliers,
//! effect definitions, stage curves, the roster, waves and boss abilities) is
//! an injected value collected in [`Tuning`], so several simulations with
//! different tuning can coexist.

use std::time::Duration;

use serde::{Deserialize, Serialize};

mod attributes;
mod bosses;
mod effects;
mod errors;
mod records;
mod roster;
mod stage;
mod tuning;
mod unit;
mod waves;

pub use attributes::{Attribute, AttributeEdge, AttributeTable, Matchup};
pub use bosses::{BossAbilityDefinition, BossAbilityKind, BossProfile, BossTable, BossTrigger};
pub use effects::{
    ActiveEffect, ActiveEffects, EffectCategory, EffectDefinition, EffectId, EffectKind,
    EffectModifier, EffectProc, EffectScaling, EffectTable,
};
pub use errors::{
    CommandRejection, DigivolveError, LevelUpError, MergeError, PlacementError, SpendError,
};
pub use records::{BonusEffect, GameMode, RunState, TowerRecord};
pub use roster::{DigimonDefinition, DigimonId, EnemyDefinition, EnemyKindId, EnemyTable, Roster};
pub use stage::Stage;
pub use tuning::{CombatTuning, ProgressionTuning, Tuning};
pub use unit::{cell_center, Health, Point, TargetPriority, Tower, Unit, MAX_ARMOR};
pub use waves::{
    CampaignChapter, EndlessTuning, HpScalingTuning, SpawnQueue, SpawnSlot, WaveEntry, WaveSpec,
    WaveTable, WaveTuning, WAVES_PER_CHAPTER,
};

/// Canonical banner emitted when the experience boots.
pub const WELCOME_BANNER: &str = "Welcome to Digi Defence.";

/// Commands that express all permissible world mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Advances the simulation clock by the provided delta time.
    Tick {
        /// Duration of simulated time that elapsed since the previous tick.
        dt: Duration,
    },
    /// Starts the next wave once the field is clear.
    StartWave,
    /// Places a new level-one tower.
    PlaceTower {
        /// Roster entry to place.
        digimon: DigimonId,
        /// Cell the tower occupies.
        cell: CellCoord,
    },
    /// Buys up to `levels` levels for a tower, as many as currency allows.
    LevelUpTower {
        /// Tower to level.
        tower: TowerId,
        /// Requested number of levels.
        levels: u32,
    },
    /// Merges `sacrifice` into `survivor`.
    MergeTowers {
        /// Tower that remains on the field.
        survivor: TowerId,
        /// Tower consumed by the merge.
        sacrifice: TowerId,
    },
    /// Evolves a tower into the next stage.
    DigivolveTower {
        /// Tower to evolve.
        tower: TowerId,
        /// Roster entry to evolve into.
        into: DigimonId,
    },
    /// Changes the rule a tower uses to pick targets.
    SetTargetPriority {
        /// Tower to reconfigure.
        tower: TowerId,
        /// New priority.
        priority: TargetPriority,
    },
}

/// Events broadcast by the world after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Indicates that the simulation clock advanced.
    TimeAdvanced {
        /// Duration of simulated time that elapsed in the tick.
        dt: Duration,
    },
    /// A wave began spawning.
    WaveStarted {
        /// One-based wave number.
        wave: u32,
        /// Number of queued spawns, boss included.
        spawns: u32,
        /// Boss closing the wave.
        boss: Option<EnemyKindId>,
    },
    /// An enemy entered the lane.
    EnemySpawned {
        /// Identifier of the new enemy.
        unit: UnitId,
        /// Enemy kind.
        enemy: EnemyKindId,
        /// Maximum health after wave scaling.
        max_health: f32,
        /// Whether the enemy is a boss.
        boss: bool,
    },
    /// An enemy's health reached zero.
    EnemyKilled {
        /// Identifier of the enemy.
        unit: UnitId,
        /// Tower credited with the kill; `None` for effect ticks.
        tower: Option<TowerId>,
        /// Currency granted.
        reward: u32,
    },
    /// An enemy reached the goal.
    EnemyLeaked {
        /// Identifier of the enemy.
        unit: UnitId,
        /// Lives removed.
        lives_lost: u32,
    },
    /// A status effect was applied or refreshed on a unit.
    EffectApplied {
        /// Affected unit.
        unit: UnitId,
        /// Base effect.
        kind: EffectKind,
    },
    /// A status effect ran out on a unit.
    EffectExpired {
        /// Affected unit.
        unit: UnitId,
        /// Base effect.
        kind: EffectKind,
    },
    /// A tower was placed.
    TowerPlaced {
        /// Identifier assigned to the tower.
        tower: TowerId,
        /// Roster entry.
        digimon: DigimonId,
        /// Occupied cell.
        cell: CellCoord,
    },
    /// A tower hit an enemy.
    TowerAttacked {
        /// Attacking tower.
        tower: TowerId,
        /// Struck enemy.
        target: UnitId,
        /// Damage dealt after armor and shields.
        damage: f32,
    },
    /// A tower gained levels.
    TowerLeveled {
        /// Tower that levelled.
        tower: TowerId,
        /// New level.
        level: u32,
        /// Currency spent.
        cost: u32,
    },
    /// Two towers merged.
    TowersMerged {
        /// Tower that remained.
        survivor: TowerId,
        /// Tower that was consumed.
        sacrifice: TowerId,
        /// Survivor level after the merge.
        level: u32,
        /// Survivor DP after the merge.
        dp: u32,
    },
    /// A tower evolved.
    TowerDigivolved {
        /// Evolved tower.
        tower: TowerId,
        /// New roster entry.
        digimon: DigimonId,
        /// New stage.
        stage: Stage,
        /// Currency spent.
        cost: u32,
    },
    /// A tower switched target priority.
    TargetPriorityChanged {
        /// Reconfigured tower.
        tower: TowerId,
        /// New priority.
        priority: TargetPriority,
    },
    /// A boss ability fired.
    BossAbilityTriggered {
        /// Boss that owns the ability.
        boss: UnitId,
        /// Name of the ability.
        ability: String,
    },
    /// A boss stunned a tower.
    TowerStunned {
        /// Stunned tower.
        tower: TowerId,
        /// Boss responsible.
        boss: UnitId,
    },
    /// A boss drained player currency.
    CurrencyDrained {
        /// Boss responsible.
        boss: UnitId,
        /// Currency removed.
        amount: u32,
    },
    /// Every enemy of the wave was spawned and resolved.
    WaveCleared {
        /// Cleared wave.
        wave: u32,
        /// Currency granted.
        reward: u32,
    },
    /// The last life was lost.
    GameOver {
        /// Wave during which the run ended.
        wave: u32,
    },
    /// A command was refused.
    CommandRejected {
        /// Structured reason.
        reason: CommandRejection,
    },
}

/// Unique identifier assigned to a combat unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new unit identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Unique identifier assigned to a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TowerId(u32);

impl TowerId {
    /// Creates a new tower identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the tower identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Location of a single grid cell expressed as column and row coordinates.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CellCoord {
    column: u32,
    row: u32,
}

impl CellCoord {
    /// Creates a new grid cell coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the cell.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the cell.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }
}

/// Immutable view of an enemy used by renderers.
#[derive(Clone, Debug, PartialEq)]
pub struct UnitSnapshot {
    /// Identifier of the enemy.
    pub id: UnitId,
    /// Enemy kind, for sprite selection.
    pub enemy: EnemyKindId,
    /// Combat attribute.
    pub attribute: Attribute,
    /// Current health as a fraction of the maximum.
    pub health_fraction: f32,
    /// Current position.
    pub position: Point,
    /// Distance travelled along the lane.
    pub path_progress: f32,
    /// Active effects, for indicator icons.
    pub effects: Vec<EffectKind>,
    /// Whether the enemy is a boss.
    pub boss: bool,
}

/// Immutable view of a tower used by renderers and panels.
#[derive(Clone, Debug, PartialEq)]
pub struct TowerSnapshot {
    /// Identifier allocated to the tower by the world.
    pub id: TowerId,
    /// Roster entry.
    pub digimon: DigimonId,
    /// Level.
    pub level: u32,
    /// Digivolution points.
    pub dp: u32,
    /// Current stage.
    pub stage: Stage,
    /// Combat attribute.
    pub attribute: Attribute,
    /// Occupied cell.
    pub cell: CellCoord,
    /// Target priority.
    pub priority: TargetPriority,
    /// Active effects, for indicator icons.
    pub effects: Vec<EffectKind>,
    /// Enemies finished off.
    pub kills: u32,
    /// Lifetime damage.
    pub damage_dealt: f64,
}

impl TowerSnapshot {
    /// Captures the renderer-facing state of a tower.
    #[must_use]
    pub fn capture(tower: &Tower) -> Self {
        Self {
            id: tower.id,
            digimon: tower.digimon.clone(),
            level: tower.level,
            dp: tower.dp,
            stage: tower.stage,
            attribute: tower.unit.attribute,
            cell: tower.cell,
            priority: tower.priority,
            effects: tower.unit.effects.kinds().collect(),
            kills: tower.kills,
            damage_dealt: tower.damage_dealt,
        }
    }
}
