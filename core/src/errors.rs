use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{Stage, TowerId};

/// Reasons a currency spend is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum SpendError {
    /// The run holds less currency than required.
    #[error("cannot afford {needed}, only {available} available")]
    InsufficientFunds {
        /// Currency required.
        needed: u32,
        /// Currency held.
        available: u32,
    },
}

/// Reasons a level-up request is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum LevelUpError {
    /// The tower already sits at its level ceiling.
    #[error("tower is already at its maximum level {max_level}")]
    AtMaxLevel {
        /// Current ceiling.
        max_level: u32,
    },
    /// Not even one level is affordable.
    #[error("cannot afford the next level: need {needed}, have {available}")]
    CannotAfford {
        /// Cost of the next level.
        needed: u32,
        /// Currency held.
        available: u32,
    },
}

/// Reasons two towers cannot merge.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum MergeError {
    /// A tower cannot be merged with itself.
    #[error("a tower cannot merge with itself")]
    SameTower,
    /// The towers sit at different stages.
    #[error("towers must share a stage")]
    StageMismatch,
    /// The attributes differ and neither is Free.
    #[error("towers must share an attribute unless one is Free")]
    AttributeMismatch,
}

/// Reasons a digivolve request is refused, in the order they are checked.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum DigivolveError {
    /// The tower has not reached its level ceiling.
    #[error("tower must reach level {max_level} first (currently {level})")]
    NotAtMaxLevel {
        /// Current level.
        level: u32,
        /// Required level.
        max_level: u32,
    },
    /// The origin stage does not allow climbing further.
    #[error("a tower from {origin:?} cannot evolve past {ceiling:?}")]
    EvolutionCeiling {
        /// Origin stage of the tower.
        origin: Stage,
        /// Highest reachable stage.
        ceiling: Stage,
    },
    /// No cost is defined for leaving the current stage.
    #[error("no digivolve cost is defined for {stage:?}")]
    CostUndefined {
        /// Current stage.
        stage: Stage,
    },
    /// The run cannot pay the digivolve cost.
    #[error("cannot afford digivolution: need {needed}, have {available}")]
    CannotAfford {
        /// Digivolve cost.
        needed: u32,
        /// Currency held.
        available: u32,
    },
    /// The requested Digimon is not an evolution option of the tower.
    #[error("requested Digimon is not an evolution of this tower")]
    InvalidEvolution,
}

/// Reasons a tower placement is refused.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum PlacementError {
    /// The cell lies outside the playfield.
    #[error("cell is outside the playfield")]
    OutOfBounds,
    /// Another tower occupies the cell.
    #[error("cell is occupied")]
    Occupied,
    /// The cell overlaps the enemy lane.
    #[error("cell lies on the enemy lane")]
    OnLane,
    /// The Digimon is missing from the roster.
    #[error("unknown Digimon")]
    UnknownDigimon,
    /// The Digimon can only be reached by digivolving.
    #[error("Digimon cannot be placed directly")]
    NotPlaceable,
    /// The run cannot pay the placement cost.
    #[error("cannot afford placement: need {needed}, have {available}")]
    CannotAfford {
        /// Placement cost.
        needed: u32,
        /// Currency held.
        available: u32,
    },
}

/// Structured reason attached to a rejected command.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, Error)]
pub enum CommandRejection {
    /// Placement refused.
    #[error(transparent)]
    Placement(#[from] PlacementError),
    /// Level-up refused.
    #[error(transparent)]
    LevelUp(#[from] LevelUpError),
    /// Merge refused.
    #[error(transparent)]
    Merge(#[from] MergeError),
    /// Digivolve refused.
    #[error(transparent)]
    Digivolve(#[from] DigivolveError),
    /// The command referenced a tower that does not exist.
    #[error("tower {0:?} does not exist")]
    UnknownTower(TowerId),
    /// A wave is still running.
    #[error("a wave is already in progress")]
    WaveInProgress,
    /// The campaign has no further waves.
    #[error("no further waves are available")]
    NoMoreWaves,
    /// The run is over.
    #[error("the run is over")]
    GameOver,
}
