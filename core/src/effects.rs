use std::{collections::BTreeMap, collections::BTreeSet, fmt};

use serde::{Deserialize, Serialize};

/// Base identifier of a status effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectKind {
    /// Fire damage scaled by the applying hit.
    Burn,
    /// Stacking damage scaled by the victim's maximum health.
    Poison,
    /// Stacking damage scaled by the applying hit.
    Bleed,
    /// Full immobilisation that thaws into a short slow.
    Freeze,
    /// Slow left behind when a freeze expires.
    Thaw,
    /// Movement slow.
    Slow,
    /// Full stop of movement and attacks.
    Stun,
    /// Armor reduction.
    ArmorBreak,
    /// Reverses an enemy's walking direction.
    Fear,
    /// Attack speed increase for towers.
    Haste,
}

impl EffectKind {
    /// Canonical lowercase name used in textual identifiers.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Burn => "burn",
            Self::Poison => "poison",
            Self::Bleed => "bleed",
            Self::Freeze => "freeze",
            Self::Thaw => "thaw",
            Self::Slow => "slow",
            Self::Stun => "stun",
            Self::ArmorBreak => "armor_break",
            Self::Fear => "fear",
            Self::Haste => "haste",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        const KINDS: [EffectKind; 10] = [
            EffectKind::Burn,
            EffectKind::Poison,
            EffectKind::Bleed,
            EffectKind::Freeze,
            EffectKind::Thaw,
            EffectKind::Slow,
            EffectKind::Stun,
            EffectKind::ArmorBreak,
            EffectKind::Fear,
            EffectKind::Haste,
        ];
        KINDS.into_iter().find(|kind| kind.name() == name)
    }
}

/// Delivery modifier fused onto a base effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectModifier {
    /// Also applies to enemies around the struck target.
    Area,
    /// Also jumps to the nearest other enemy.
    Chain,
}

impl EffectModifier {
    const fn name(self) -> &'static str {
        match self {
            Self::Area => "area",
            Self::Chain => "chain",
        }
    }

    fn from_name(name: &str) -> Option<Self> {
        match name {
            "area" => Some(Self::Area),
            "chain" => Some(Self::Chain),
            _ => None,
        }
    }
}

/// Compound effect identifier: a base effect plus delivery modifiers.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EffectId {
    /// Base effect that owns the definition.
    pub base: EffectKind,
    /// Delivery modifiers; they never change which definition applies.
    #[serde(default)]
    pub modifiers: BTreeSet<EffectModifier>,
}

impl EffectId {
    /// Identifier for a bare base effect.
    #[must_use]
    pub fn new(base: EffectKind) -> Self {
        Self {
            base,
            modifiers: BTreeSet::new(),
        }
    }

    /// Adds a delivery modifier.
    #[must_use]
    pub fn with(mut self, modifier: EffectModifier) -> Self {
        let _ = self.modifiers.insert(modifier);
        self
    }

    /// Reports whether the identifier carries the modifier.
    #[must_use]
    pub fn has(&self, modifier: EffectModifier) -> bool {
        self.modifiers.contains(&modifier)
    }

    /// Parses `base[+modifier...]`, e.g. `burn+area`. Unknown names yield `None`.
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        let mut parts = text.trim().split('+');
        let base = EffectKind::from_name(parts.next()?.trim())?;
        let mut id = Self::new(base);
        for part in parts {
            id = id.with(EffectModifier::from_name(part.trim())?);
        }
        Some(id)
    }
}

impl From<EffectKind> for EffectId {
    fn from(base: EffectKind) -> Self {
        Self::new(base)
    }
}

impl fmt::Display for EffectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.base.name())?;
        for modifier in &self.modifiers {
            write!(f, "+{}", modifier.name())?;
        }
        Ok(())
    }
}

/// Broad family an effect belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectCategory {
    /// Periodic damage.
    DamageOverTime,
    /// Movement impairment; strength is a speed factor.
    CrowdControl,
    /// Armor reduction; strength is an armor factor per stack.
    Debuff,
    /// Behavioural effects with no numeric factor.
    Special,
    /// Beneficial tower effects; strength is an attack speed factor.
    Support,
}

/// What a periodic effect's strength is multiplied by.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectScaling {
    /// Damage of the hit that applied the effect.
    #[default]
    SourceDamage,
    /// Victim's maximum health.
    MaxHealth,
}

/// Static description of an effect.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectDefinition {
    /// Base effect described by the definition.
    pub kind: EffectKind,
    /// Family of the effect.
    pub category: EffectCategory,
    /// Full duration in seconds.
    pub duration: f32,
    /// Seconds between periodic hits; `None` for non-damaging effects.
    #[serde(default)]
    pub tick_interval: Option<f32>,
    /// Effect-specific magnitude.
    pub strength: f32,
    /// Maximum number of stacks.
    #[serde(default = "default_max_stacks")]
    pub max_stacks: u32,
    /// Scaling used by periodic hits.
    #[serde(default)]
    pub scaling: EffectScaling,
}

fn default_max_stacks() -> u32 {
    1
}

impl EffectDefinition {
    const fn timed(kind: EffectKind, category: EffectCategory, duration: f32, strength: f32) -> Self {
        Self {
            kind,
            category,
            duration,
            tick_interval: None,
            strength,
            max_stacks: 1,
            scaling: EffectScaling::SourceDamage,
        }
    }

    const fn periodic(
        kind: EffectKind,
        duration: f32,
        interval: f32,
        strength: f32,
        max_stacks: u32,
        scaling: EffectScaling,
    ) -> Self {
        Self {
            kind,
            category: EffectCategory::DamageOverTime,
            duration,
            tick_interval: Some(interval),
            strength,
            max_stacks,
            scaling,
        }
    }

    const fn stacking(mut self, max_stacks: u32) -> Self {
        self.max_stacks = max_stacks;
        self
    }
}

/// Injected registry of effect definitions.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectTable {
    definitions: Vec<EffectDefinition>,
}

impl Default for EffectTable {
    fn default() -> Self {
        use EffectCategory::{CrowdControl, Debuff, Special, Support};
        use EffectKind::{ArmorBreak, Bleed, Burn, Fear, Freeze, Haste, Poison, Slow, Stun};
        use EffectScaling::{MaxHealth, SourceDamage};

        Self::new(vec![
            EffectDefinition::periodic(Burn, 3.0, 0.5, 0.1, 1, SourceDamage),
            EffectDefinition::periodic(Poison, 5.0, 1.0, 0.02, 5, MaxHealth),
            EffectDefinition::periodic(Bleed, 4.0, 0.5, 0.05, 3, SourceDamage),
            EffectDefinition::timed(Freeze, CrowdControl, 1.5, 0.0),
            EffectDefinition::timed(Slow, CrowdControl, 2.0, 0.6),
            EffectDefinition::timed(Stun, CrowdControl, 1.0, 0.0),
            EffectDefinition::timed(ArmorBreak, Debuff, 4.0, 0.75).stacking(2),
            EffectDefinition::timed(Fear, Special, 1.5, 1.0),
            EffectDefinition::timed(Haste, Support, 3.0, 1.25),
        ])
    }
}

impl EffectTable {
    /// Creates a table from explicit definitions. Later duplicates are ignored.
    #[must_use]
    pub fn new(definitions: Vec<EffectDefinition>) -> Self {
        Self { definitions }
    }

    /// Definition registered for a base effect.
    #[must_use]
    pub fn definition(&self, kind: EffectKind) -> Option<&EffectDefinition> {
        self.definitions
            .iter()
            .find(|definition| definition.kind == kind)
    }

    /// Resolves a compound identifier to its base definition.
    #[must_use]
    pub fn resolve(&self, effect: &EffectId) -> Option<&EffectDefinition> {
        self.definition(effect.base)
    }
}

/// Effect proc carried by a tower: an effect and its chance per hit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectProc {
    /// Effect applied when the proc succeeds.
    pub effect: EffectId,
    /// Probability in `[0, 1]` that a hit applies the effect.
    pub chance: f32,
}

impl EffectProc {
    /// Creates a proc description.
    #[must_use]
    pub fn new(effect: impl Into<EffectId>, chance: f32) -> Self {
        Self {
            effect: effect.into(),
            chance,
        }
    }
}

/// Live status effect entry on a unit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ActiveEffect {
    /// Base effect of the entry.
    pub kind: EffectKind,
    /// Family copied from the definition when applied.
    pub category: EffectCategory,
    /// Seconds left before removal.
    pub remaining: f32,
    /// Seconds accumulated toward the next periodic hit.
    pub tick_accumulator: f32,
    /// Magnitude copied from the definition.
    pub strength: f32,
    /// Current stack count, at least one.
    pub stacks: u32,
    /// Highest damage of the hits that applied the effect.
    pub source_damage: f32,
}

impl ActiveEffect {
    /// Fresh single-stack entry at the definition's full duration.
    #[must_use]
    pub fn from_definition(definition: &EffectDefinition, source_damage: f32) -> Self {
        Self {
            kind: definition.kind,
            category: definition.category,
            remaining: definition.duration,
            tick_accumulator: 0.0,
            strength: definition.strength,
            stacks: 1,
            source_damage,
        }
    }
}

/// Effect map owned by a unit, one entry per base effect.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveEffects {
    entries: BTreeMap<EffectKind, ActiveEffect>,
}

impl ActiveEffects {
    /// Entry for the base effect, if active.
    #[must_use]
    pub fn get(&self, kind: EffectKind) -> Option<&ActiveEffect> {
        self.entries.get(&kind)
    }

    /// Mutable entry for the base effect, if active.
    pub fn get_mut(&mut self, kind: EffectKind) -> Option<&mut ActiveEffect> {
        self.entries.get_mut(&kind)
    }

    /// Stores an entry, replacing any entry with the same base effect.
    pub fn insert(&mut self, effect: ActiveEffect) -> Option<ActiveEffect> {
        self.entries.insert(effect.kind, effect)
    }

    /// Removes the entry for the base effect.
    pub fn remove(&mut self, kind: EffectKind) -> Option<ActiveEffect> {
        self.entries.remove(&kind)
    }

    /// Reports whether the base effect is active.
    #[must_use]
    pub fn contains(&self, kind: EffectKind) -> bool {
        self.entries.contains_key(&kind)
    }

    /// Iterates entries in [`EffectKind`] order.
    pub fn iter(&self) -> impl Iterator<Item = &ActiveEffect> {
        self.entries.values()
    }

    /// Mutably iterates entries in [`EffectKind`] order.
    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut ActiveEffect> {
        self.entries.values_mut()
    }

    /// Active base effects, for indicator icons.
    pub fn kinds(&self) -> impl Iterator<Item = EffectKind> + '_ {
        self.entries.keys().copied()
    }

    /// Number of active entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Reports whether no effect is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drops every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compound_identifiers_resolve_to_base_definition() {
        let table = EffectTable::default();
        let id = EffectId::new(EffectKind::Burn).with(EffectModifier::Area);
        let definition = table.resolve(&id).expect("burn is defined");
        assert_eq!(definition.kind, EffectKind::Burn);
    }

    #[test]
    fn textual_identifiers_parse_and_display() {
        let id = EffectId::parse("freeze+chain+area").expect("valid identifier");
        assert_eq!(id.base, EffectKind::Freeze);
        assert!(id.has(EffectModifier::Area));
        assert!(id.has(EffectModifier::Chain));
        assert_eq!(id.to_string(), "freeze+area+chain");
        assert_eq!(EffectId::parse("armor_break"), Some(EffectKind::ArmorBreak.into()));
    }

    #[test]
    fn unknown_identifiers_resolve_to_nothing() {
        assert_eq!(EffectId::parse("lightning"), None);
        assert_eq!(EffectId::parse("burn+homing"), None);
        let table = EffectTable::new(Vec::new());
        assert!(table.resolve(&EffectKind::Burn.into()).is_none());
    }

    #[test]
    fn default_table_has_no_thaw_definition() {
        assert!(EffectTable::default().definition(EffectKind::Thaw).is_none());
    }
}
