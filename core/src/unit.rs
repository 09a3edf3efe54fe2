use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{
    ActiveEffects, Attribute, BonusEffect, CellCoord, DigimonDefinition, DigimonId, EffectProc,
    Stage, TowerId, TowerRecord, UnitId,
};

/// Highest armor a unit may carry: the largest value below one, so damage
/// reduction never reaches 100%.
pub const MAX_ARMOR: f32 = 1.0 - f32::EPSILON;

/// Position on the playfield, used only for range and distance checks.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Point {
    /// Horizontal coordinate in world units.
    pub x: f32,
    /// Vertical coordinate in world units.
    pub y: f32,
}

impl Point {
    /// Creates a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to `other`.
    #[must_use]
    pub fn distance(self, other: Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }
}

/// Health pool that never drops below zero.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Health {
    current: f32,
    max: f32,
}

impl Health {
    /// Full health pool with the provided maximum.
    #[must_use]
    pub fn new(max: f32) -> Self {
        let max = if max.is_finite() { max.max(0.0) } else { f32::MAX };
        Self { current: max, max }
    }

    /// Remaining health.
    #[must_use]
    pub const fn current(&self) -> f32 {
        self.current
    }

    /// Maximum health.
    #[must_use]
    pub const fn max(&self) -> f32 {
        self.max
    }

    /// Remaining health as a fraction of the maximum.
    #[must_use]
    pub fn fraction(&self) -> f32 {
        if self.max <= 0.0 {
            0.0
        } else {
            (self.current / self.max).clamp(0.0, 1.0)
        }
    }

    /// Reports whether the pool is above zero.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.current > 0.0
    }

    /// Removes health without any mitigation and returns the amount removed.
    ///
    /// A depleted pool is terminal: further calls remove nothing.
    pub fn apply_raw_damage(&mut self, amount: f32) -> f32 {
        if !self.is_alive() || !(amount > 0.0) {
            return 0.0;
        }
        let dealt = amount.min(self.current);
        self.current = (self.current - dealt).max(0.0);
        dealt
    }

    /// Restores health up to the maximum and returns the amount restored.
    pub fn heal(&mut self, amount: f32) -> f32 {
        if !self.is_alive() || !(amount > 0.0) {
            return 0.0;
        }
        let restored = amount.min(self.max - self.current);
        self.current += restored;
        restored
    }
}

/// Mutable combat body shared by enemies and towers.
#[derive(Clone, Debug, PartialEq)]
pub struct Unit {
    /// Identifier assigned by the world.
    pub id: UnitId,
    /// Combat attribute.
    pub attribute: Attribute,
    /// Health pool.
    pub health: Health,
    /// Movement speed in world units per second before effects.
    pub base_speed: f32,
    /// Fractional damage reduction in `[0, MAX_ARMOR]`.
    pub armor: f32,
    /// Current position.
    pub position: Point,
    /// Distance travelled along the lane; higher is closer to the goal.
    pub path_progress: f32,
    /// Flying units are preferred by the flying priority.
    pub flying: bool,
    /// Active status effects.
    pub effects: ActiveEffects,
}

impl Unit {
    /// Creates a unit at full health with no active effects.
    #[must_use]
    pub fn new(id: UnitId, attribute: Attribute, max_health: f32, base_speed: f32, armor: f32) -> Self {
        Self {
            id,
            attribute,
            health: Health::new(max_health),
            base_speed: base_speed.max(0.0),
            armor: armor.clamp(0.0, MAX_ARMOR),
            position: Point::default(),
            path_progress: 0.0,
            flying: false,
            effects: ActiveEffects::default(),
        }
    }

    /// Places the unit at `position`.
    #[must_use]
    pub fn at(mut self, position: Point) -> Self {
        self.position = position;
        self
    }

    /// Marks the unit as flying.
    #[must_use]
    pub fn flying(mut self, flying: bool) -> Self {
        self.flying = flying;
        self
    }

    /// Reports whether the unit still has health.
    #[must_use]
    pub fn is_alive(&self) -> bool {
        self.health.is_alive()
    }
}

/// Rule a tower uses to pick among enemies in range.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetPriority {
    /// Furthest along the path.
    #[default]
    First,
    /// Least far along the path.
    Last,
    /// Most current health.
    Strongest,
    /// Least current health.
    Weakest,
    /// Highest current speed.
    Fastest,
    /// Flying units first, then furthest along the path.
    Flying,
    /// Nearest to the tower.
    Closest,
}

impl TargetPriority {
    /// Parses a priority name, falling back to [`TargetPriority::First`].
    #[must_use]
    pub fn parse_or_first(text: &str) -> Self {
        text.parse().unwrap_or_default()
    }
}

impl FromStr for TargetPriority {
    type Err = ();

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        match text.trim().to_ascii_lowercase().as_str() {
            "first" => Ok(Self::First),
            "last" => Ok(Self::Last),
            "strongest" => Ok(Self::Strongest),
            "weakest" => Ok(Self::Weakest),
            "fastest" => Ok(Self::Fastest),
            "flying" => Ok(Self::Flying),
            "closest" => Ok(Self::Closest),
            _ => Err(()),
        }
    }
}

/// Placed tower: a combat body plus progression state.
#[derive(Clone, Debug, PartialEq)]
pub struct Tower {
    /// Identifier assigned by the world.
    pub id: TowerId,
    /// Roster entry currently represented by the tower.
    pub digimon: DigimonId,
    /// Combat body; towers can be stunned and buffed like any unit.
    pub unit: Unit,
    /// Level, at least one.
    pub level: u32,
    /// Digivolution points gathered from merges.
    pub dp: u32,
    /// Current evolution stage.
    pub stage: Stage,
    origin_stage: Stage,
    /// Target selection rule.
    pub priority: TargetPriority,
    /// Effects inherited from merges, at most two.
    pub bonus_effects: Vec<BonusEffect>,
    /// Grid cell the tower occupies.
    pub cell: CellCoord,
    /// Damage per hit before level and attribute scaling.
    pub base_damage: f32,
    /// Attacks per second before level scaling.
    pub base_attacks_per_second: f32,
    /// Targeting range in world units.
    pub range: f32,
    /// Innate effect of the current roster entry.
    pub innate_effect: Option<EffectProc>,
    /// Enemies finished off by the tower.
    pub kills: u32,
    /// Damage dealt over the tower's lifetime.
    pub damage_dealt: f64,
    /// Seconds until the tower may attack again.
    pub cooldown: f32,
}

impl Tower {
    /// Creates a level-one tower whose origin is the roster entry's stage.
    #[must_use]
    pub fn spawn(id: TowerId, unit_id: UnitId, definition: &DigimonDefinition, cell: CellCoord) -> Self {
        let unit = Unit::new(unit_id, definition.attribute, 1.0, 0.0, 0.0).at(cell_center(cell));
        Self {
            id,
            digimon: definition.id.clone(),
            unit,
            level: 1,
            dp: 0,
            stage: definition.stage,
            origin_stage: definition.stage,
            priority: TargetPriority::default(),
            bonus_effects: Vec::new(),
            cell,
            base_damage: definition.base_damage,
            base_attacks_per_second: definition.attacks_per_second,
            range: definition.range,
            innate_effect: definition.effect.clone(),
            kills: 0,
            damage_dealt: 0.0,
            cooldown: 0.0,
        }
    }

    /// Rebuilds a tower from a persisted record and its roster entry.
    ///
    /// Returns `None` when the record names a different Digimon than the entry.
    #[must_use]
    pub fn from_record(
        id: TowerId,
        unit_id: UnitId,
        record: &TowerRecord,
        definition: &DigimonDefinition,
    ) -> Option<Self> {
        if record.digimon != definition.id {
            return None;
        }
        let mut tower = Self::spawn(id, unit_id, definition, record.cell);
        tower.level = record.level.max(1);
        tower.dp = record.dp;
        tower.origin_stage = record.origin_stage.min(definition.stage);
        tower.priority = record.priority;
        tower.bonus_effects = record.bonus_effects.clone();
        tower.kills = record.kills;
        tower.damage_dealt = record.damage_dealt;
        Some(tower)
    }

    /// Captures the persisted form of the tower.
    #[must_use]
    pub fn to_record(&self) -> TowerRecord {
        TowerRecord {
            digimon: self.digimon.clone(),
            level: self.level,
            dp: self.dp,
            origin_stage: self.origin_stage,
            cell: self.cell,
            priority: self.priority,
            bonus_effects: self.bonus_effects.clone(),
            kills: self.kills,
            damage_dealt: self.damage_dealt,
        }
    }

    /// Stage the tower was created at.
    #[must_use]
    pub const fn origin_stage(&self) -> Stage {
        self.origin_stage
    }

    /// Swaps in the evolved roster entry, keeping origin, DP and history.
    pub fn evolve_into(&mut self, definition: &DigimonDefinition) {
        self.digimon = definition.id.clone();
        self.stage = definition.stage;
        self.unit.attribute = definition.attribute;
        self.base_damage = definition.base_damage;
        self.base_attacks_per_second = definition.attacks_per_second;
        self.range = definition.range;
        self.innate_effect = definition.effect.clone();
        self.level = 1;
    }
}

/// World-space centre of a grid cell.
#[must_use]
pub fn cell_center(cell: CellCoord) -> Point {
    Point::new(cell.column() as f32 + 0.5, cell.row() as f32 + 0.5)
}
