use serde::{Deserialize, Serialize};

/// Ordered evolution tier of a Digimon.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    /// Lowest tier.
    InTraining,
    /// Second tier.
    Rookie,
    /// Third tier.
    Champion,
    /// Fourth tier.
    Ultimate,
    /// Fifth tier.
    Mega,
    /// Absolute top tier.
    Ultra,
}

impl Stage {
    /// Number of stages.
    pub const COUNT: usize = 6;

    /// Every stage from lowest to highest.
    pub const ALL: [Stage; Stage::COUNT] = [
        Stage::InTraining,
        Stage::Rookie,
        Stage::Champion,
        Stage::Ultimate,
        Stage::Mega,
        Stage::Ultra,
    ];

    /// Zero-based position of the stage within [`Stage::ALL`].
    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    /// Stage at the provided index, if any.
    #[must_use]
    pub fn from_index(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }

    /// The following stage, or `None` at the top tier.
    #[must_use]
    pub fn next(self) -> Option<Self> {
        Self::from_index(self.index() + 1)
    }

    /// Number of stages climbed from `origin` to `self`; zero when below.
    #[must_use]
    pub const fn steps_above(self, origin: Stage) -> u32 {
        (self as u32).saturating_sub(origin as u32)
    }
}
