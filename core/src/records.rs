use serde::{Deserialize, Serialize};

use crate::{CellCoord, DigimonId, EffectId, SpendError, Stage, TargetPriority};

/// Effect inherited through a merge.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BonusEffect {
    /// Inherited effect.
    pub effect: EffectId,
    /// Proc chance in `[0, 1]`.
    pub chance: f32,
}

/// Persisted form of a tower; enough to rebuild it with the roster.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TowerRecord {
    /// Roster entry.
    pub digimon: DigimonId,
    /// Level.
    pub level: u32,
    /// Digivolution points.
    pub dp: u32,
    /// Stage the tower was created at.
    pub origin_stage: Stage,
    /// Grid cell.
    pub cell: CellCoord,
    /// Target selection rule.
    pub priority: TargetPriority,
    /// Inherited effects.
    pub bonus_effects: Vec<BonusEffect>,
    /// Enemies finished off.
    pub kills: u32,
    /// Lifetime damage.
    pub damage_dealt: f64,
}

/// Wave progression rule of a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GameMode {
    /// Authored campaign only.
    #[default]
    Campaign,
    /// Campaign followed by unbounded generated waves.
    Endless,
}

/// Persisted run counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunState {
    /// Spendable currency.
    pub currency: u32,
    /// Remaining lives.
    pub lives: u32,
    /// Last wave started, zero before the first.
    pub wave: u32,
    /// Game mode.
    pub mode: GameMode,
}

impl RunState {
    /// Fresh run before the first wave.
    #[must_use]
    pub const fn new(currency: u32, lives: u32, mode: GameMode) -> Self {
        Self {
            currency,
            lives,
            wave: 0,
            mode,
        }
    }

    /// Removes `amount` if affordable.
    pub fn spend(&mut self, amount: u32) -> Result<(), SpendError> {
        if amount > self.currency {
            return Err(SpendError::InsufficientFunds {
                needed: amount,
                available: self.currency,
            });
        }
        self.currency -= amount;
        Ok(())
    }

    /// Adds currency, saturating.
    pub fn earn(&mut self, amount: u32) {
        self.currency = self.currency.saturating_add(amount);
    }

    /// Removes up to `amount` and returns what was actually taken.
    pub fn drain(&mut self, amount: u32) -> u32 {
        let taken = amount.min(self.currency);
        self.currency -= taken;
        taken
    }

    /// Removes lives and reports whether any remain.
    pub fn lose_lives(&mut self, amount: u32) -> bool {
        self.lives = self.lives.saturating_sub(amount);
        self.lives > 0
    }
}
