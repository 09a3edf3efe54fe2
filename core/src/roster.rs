use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{Attribute, EffectId, EffectKind, EffectModifier, EffectProc, Stage};

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Creates an identifier from its textual form.
            #[must_use]
            pub fn new(value: impl Into<String>) -> Self {
                Self(value.into())
            }

            /// Textual form of the identifier.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self::new(value)
            }
        }
    };
}

string_id!(
    /// Roster identifier of a tower Digimon.
    DigimonId
);

string_id!(
    /// Identifier of an enemy kind, bosses included.
    EnemyKindId
);

/// Static description of a tower Digimon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DigimonDefinition {
    /// Roster identifier.
    pub id: DigimonId,
    /// Stage of the Digimon.
    pub stage: Stage,
    /// Combat attribute.
    pub attribute: Attribute,
    /// Damage per hit at level zero.
    pub base_damage: f32,
    /// Attacks per second at level zero.
    pub attacks_per_second: f32,
    /// Targeting range in world units.
    pub range: f32,
    /// Innate effect proc.
    #[serde(default)]
    pub effect: Option<EffectProc>,
    /// Currency needed to place the Digimon directly.
    pub cost: u32,
    /// Roster entries this Digimon may digivolve into.
    #[serde(default)]
    pub evolutions: Vec<DigimonId>,
}

/// Injected registry of tower Digimon.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Roster {
    digimon: Vec<DigimonDefinition>,
}

impl Roster {
    /// Creates a roster from explicit definitions.
    #[must_use]
    pub fn new(digimon: Vec<DigimonDefinition>) -> Self {
        Self { digimon }
    }

    /// Definition for the identifier, if known.
    #[must_use]
    pub fn get(&self, id: &DigimonId) -> Option<&DigimonDefinition> {
        self.digimon.iter().find(|definition| &definition.id == id)
    }

    /// Evolution options; empty for unknown identifiers.
    #[must_use]
    pub fn evolutions(&self, id: &DigimonId) -> &[DigimonId] {
        self.get(id)
            .map_or(&[][..], |definition| definition.evolutions.as_slice())
    }

    /// Iterates every definition in roster order.
    pub fn iter(&self) -> impl Iterator<Item = &DigimonDefinition> {
        self.digimon.iter()
    }
}

impl Default for Roster {
    fn default() -> Self {
        use Attribute::{Data, Free, Vaccine, Virus};
        use Stage::{Champion, InTraining, Mega, Rookie, Ultimate, Ultra};

        let entry = |id: &str,
                     stage: Stage,
                     attribute: Attribute,
                     stats: (f32, f32, f32),
                     effect: Option<EffectProc>,
                     cost: u32,
                     evolutions: &[&str]| DigimonDefinition {
            id: DigimonId::new(id),
            stage,
            attribute,
            base_damage: stats.0,
            attacks_per_second: stats.1,
            range: stats.2,
            effect,
            cost,
            evolutions: evolutions.iter().copied().map(DigimonId::new).collect(),
        };
        let innate = |kind: EffectKind, chance: f32| Some(EffectProc::new(kind, chance));
        let area = |kind: EffectKind, chance: f32| {
            Some(EffectProc::new(
                EffectId::new(kind).with(EffectModifier::Area),
                chance,
            ))
        };
        let chain = |kind: EffectKind, chance: f32| {
            Some(EffectProc::new(
                EffectId::new(kind).with(EffectModifier::Chain),
                chance,
            ))
        };

        Self::new(vec![
            entry("koromon", InTraining, Vaccine, (4.0, 1.0, 2.5), None, 50, &["agumon"]),
            entry("tsunomon", InTraining, Data, (3.5, 1.2, 2.5), None, 50, &["gabumon"]),
            entry("pagumon", InTraining, Virus, (4.0, 1.1, 2.4), None, 50, &["gazimon"]),
            entry("agumon", Rookie, Vaccine, (10.0, 1.0, 3.0), innate(EffectKind::Burn, 0.2), 100, &["greymon"]),
            entry("gabumon", Rookie, Data, (9.0, 1.1, 3.0), innate(EffectKind::Freeze, 0.1), 100, &["garurumon"]),
            entry("gazimon", Rookie, Virus, (8.0, 1.3, 2.8), innate(EffectKind::Poison, 0.25), 100, &["devimon"]),
            entry("patamon", Rookie, Vaccine, (7.0, 1.2, 3.0), innate(EffectKind::Haste, 0.3), 100, &["angemon"]),
            entry("armadillomon", Rookie, Free, (8.0, 0.9, 2.6), innate(EffectKind::Stun, 0.1), 100, &["ankylomon"]),
            entry("greymon", Champion, Vaccine, (22.0, 0.9, 3.2), area(EffectKind::Burn, 0.25), 0, &["metalgreymon"]),
            entry("garurumon", Champion, Data, (20.0, 1.2, 3.2), innate(EffectKind::Freeze, 0.15), 0, &["weregarurumon"]),
            entry("devimon", Champion, Virus, (21.0, 1.0, 3.0), innate(EffectKind::ArmorBreak, 0.2), 0, &["myotismon"]),
            entry("angemon", Champion, Vaccine, (18.0, 1.2, 3.2), innate(EffectKind::Haste, 0.35), 0, &[]),
            entry("ankylomon", Champion, Free, (18.0, 0.8, 2.8), innate(EffectKind::Stun, 0.15), 0, &[]),
            entry("metalgreymon", Ultimate, Vaccine, (45.0, 0.9, 3.5), area(EffectKind::Burn, 0.3), 0, &["wargreymon"]),
            entry("weregarurumon", Ultimate, Data, (40.0, 1.5, 3.0), innate(EffectKind::Bleed, 0.3), 0, &["metalgarurumon"]),
            entry("myotismon", Ultimate, Virus, (42.0, 1.1, 3.4), chain(EffectKind::Fear, 0.15), 0, &["venommyotismon"]),
            entry("wargreymon", Mega, Vaccine, (90.0, 1.2, 3.6), area(EffectKind::Burn, 0.35), 0, &["omnimon"]),
            entry("metalgarurumon", Mega, Data, (80.0, 1.4, 4.0), area(EffectKind::Freeze, 0.25), 0, &["omnimon"]),
            entry("venommyotismon", Mega, Virus, (95.0, 1.0, 3.4), chain(EffectKind::Poison, 0.35), 0, &[]),
            entry("omnimon", Ultra, Vaccine, (180.0, 1.5, 4.5), area(EffectKind::ArmorBreak, 0.4), 0, &[]),
        ])
    }
}

/// Static description of an enemy kind.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyDefinition {
    /// Identifier of the enemy kind.
    pub id: EnemyKindId,
    /// Combat attribute.
    pub attribute: Attribute,
    /// Health before wave scaling.
    pub max_health: f32,
    /// Movement speed in world units per second.
    pub speed: f32,
    /// Fractional damage reduction.
    #[serde(default)]
    pub armor: f32,
    /// Flying enemies are preferred by the flying priority.
    #[serde(default)]
    pub flying: bool,
    /// Currency granted on kill.
    pub reward: u32,
    /// Lives lost when the enemy reaches the goal.
    #[serde(default = "default_leak_damage")]
    pub leak_damage: u32,
}

fn default_leak_damage() -> u32 {
    1
}

/// Injected registry of enemy kinds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EnemyTable {
    enemies: Vec<EnemyDefinition>,
}

impl EnemyTable {
    /// Creates a table from explicit definitions.
    #[must_use]
    pub fn new(enemies: Vec<EnemyDefinition>) -> Self {
        Self { enemies }
    }

    /// Definition for the identifier, if known.
    #[must_use]
    pub fn get(&self, id: &EnemyKindId) -> Option<&EnemyDefinition> {
        self.enemies.iter().find(|definition| &definition.id == id)
    }
}

impl Default for EnemyTable {
    fn default() -> Self {
        use Attribute::{Data, Free, Vaccine, Virus};

        let enemy = |id: &str,
                     attribute: Attribute,
                     max_health: f32,
                     speed: f32,
                     armor: f32,
                     flying: bool,
                     reward: u32,
                     leak_damage: u32| {
            EnemyDefinition {
                id: EnemyKindId::new(id),
                attribute,
                max_health,
                speed,
                armor,
                flying,
                reward,
                leak_damage,
            }
        };

        Self::new(vec![
            enemy("goblimon", Virus, 30.0, 1.0, 0.0, false, 3, 1),
            enemy("gotsumon", Data, 45.0, 0.7, 0.2, false, 4, 1),
            enemy("betamon", Virus, 28.0, 1.1, 0.0, false, 3, 1),
            enemy("biyomon", Vaccine, 24.0, 1.4, 0.0, true, 3, 1),
            enemy("elecmon", Data, 32.0, 1.2, 0.05, false, 3, 1),
            enemy("kunemon", Virus, 22.0, 1.6, 0.0, false, 3, 1),
            enemy("mushroomon", Virus, 40.0, 0.8, 0.1, false, 4, 1),
            enemy("floramon", Data, 36.0, 0.9, 0.05, false, 4, 1),
            enemy("dokunemon", Virus, 26.0, 1.5, 0.0, false, 3, 1),
            enemy("penguinmon", Data, 38.0, 0.9, 0.1, false, 4, 1),
            enemy("tentomon", Vaccine, 34.0, 1.0, 0.15, true, 4, 1),
            enemy("solarmon", Data, 55.0, 0.6, 0.3, false, 5, 1),
            enemy("tyrannomon", Data, 70.0, 0.8, 0.1, false, 6, 2),
            enemy("airdramon", Vaccine, 50.0, 1.3, 0.05, true, 6, 2),
            enemy("ogremon", Virus, 80.0, 0.9, 0.15, false, 7, 2),
            enemy("kabuterimon", Vaccine, 75.0, 1.0, 0.2, true, 7, 2),
            enemy("devidramon", Virus, 500.0, 0.7, 0.2, false, 50, 5),
            enemy("etemon", Virus, 650.0, 0.6, 0.25, false, 60, 5),
            enemy("megadramon", Virus, 550.0, 0.9, 0.15, true, 60, 5),
            enemy("machinedramon", Virus, 900.0, 0.5, 0.35, false, 80, 10),
            enemy("piedmon", Virus, 800.0, 0.8, 0.3, false, 80, 10),
            enemy("minion_bakemon", Free, 20.0, 1.2, 0.0, false, 1, 1),
        ])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evolution_chains_point_at_higher_stages() {
        let roster = Roster::default();
        for definition in roster.iter() {
            for target in &definition.evolutions {
                let evolved = roster.get(target).expect("evolution target exists");
                assert_eq!(Some(evolved.stage), definition.stage.next());
            }
        }
    }

    #[test]
    fn unknown_digimon_has_no_evolutions() {
        let roster = Roster::default();
        assert!(roster.evolutions(&DigimonId::new("missingno")).is_empty());
        assert_eq!(
            roster.evolutions(&DigimonId::new("agumon")),
            &[DigimonId::new("greymon")]
        );
    }
}
