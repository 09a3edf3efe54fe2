use serde::{Deserialize, Serialize};

/// Combat attribute carried by every unit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    /// Strong against Virus, weak against Data.
    Vaccine,
    /// Strong against Vaccine, weak against Virus.
    Data,
    /// Strong against Data, weak against Vaccine.
    Virus,
    /// Neutral against everything and merge-compatible with every attribute.
    Free,
}

impl Attribute {
    /// Every attribute in declaration order.
    pub const ALL: [Attribute; 4] = [
        Attribute::Vaccine,
        Attribute::Data,
        Attribute::Virus,
        Attribute::Free,
    ];
}

/// Classification of an attacker/defender pairing.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Matchup {
    /// The attacker deals bonus damage.
    Strong,
    /// The attacker deals reduced damage.
    Weak,
    /// The pairing has no modifier.
    Neutral,
}

/// Single attacker/defender entry of the attribute table.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AttributeEdge {
    /// Attribute of the attacking unit.
    pub attacker: Attribute,
    /// Attribute of the defending unit.
    pub defender: Attribute,
    /// Damage multiplier applied to the pairing.
    pub multiplier: f32,
}

impl AttributeEdge {
    const fn new(attacker: Attribute, defender: Attribute, multiplier: f32) -> Self {
        Self {
            attacker,
            defender,
            multiplier,
        }
    }
}

/// Rock-paper-scissors multiplier lookup between attributes.
///
/// Pairings absent from the table are neutral, so a tuning file only needs to
/// list the edges it wants to change.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeTable {
    edges: Vec<AttributeEdge>,
}

impl Default for AttributeTable {
    fn default() -> Self {
        use Attribute::{Data, Vaccine, Virus};

        Self::new(vec![
            AttributeEdge::new(Vaccine, Virus, 1.5),
            AttributeEdge::new(Vaccine, Data, 0.75),
            AttributeEdge::new(Data, Vaccine, 1.5),
            AttributeEdge::new(Data, Virus, 0.75),
            AttributeEdge::new(Virus, Data, 1.5),
            AttributeEdge::new(Virus, Vaccine, 0.75),
        ])
    }
}

impl AttributeTable {
    /// Creates a table from explicit edges.
    #[must_use]
    pub fn new(edges: Vec<AttributeEdge>) -> Self {
        Self { edges }
    }

    /// Damage multiplier for `attacker` hitting `defender`; 1.0 when unlisted.
    #[must_use]
    pub fn multiplier(&self, attacker: Attribute, defender: Attribute) -> f32 {
        self.edges
            .iter()
            .find(|edge| edge.attacker == attacker && edge.defender == defender)
            .map_or(1.0, |edge| edge.multiplier)
    }

    /// Classifies the pairing as strong, weak or neutral.
    #[must_use]
    pub fn matchup(&self, attacker: Attribute, defender: Attribute) -> Matchup {
        let multiplier = self.multiplier(attacker, defender);
        if multiplier > 1.0 {
            Matchup::Strong
        } else if multiplier < 1.0 {
            Matchup::Weak
        } else {
            Matchup::Neutral
        }
    }
}
