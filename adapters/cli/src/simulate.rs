use std::{str::FromStr, time::Duration};

use anyhow::{anyhow, Context as _};
use digi_defence_core::{CellCoord, Command, CommandRejection, DigimonId, Event, RunState, TowerSnapshot};
use digi_defence_world::{apply, query, World};

/// Tower requested on the command line as `digimon@column,row`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct TowerPlacement {
    pub(crate) digimon: DigimonId,
    pub(crate) cell: CellCoord,
}

impl FromStr for TowerPlacement {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let (digimon, cell) = value
            .split_once('@')
            .ok_or_else(|| anyhow!("expected digimon@column,row, got '{value}'"))?;
        let (column, row) = cell
            .split_once(',')
            .ok_or_else(|| anyhow!("expected column,row after '@', got '{cell}'"))?;
        let column = column
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid column in '{value}'"))?;
        let row = row
            .trim()
            .parse::<u32>()
            .with_context(|| format!("invalid row in '{value}'"))?;
        let digimon = digimon.trim();
        if digimon.is_empty() {
            return Err(anyhow!("missing digimon in '{value}'"));
        }

        Ok(Self {
            digimon: DigimonId::new(digimon),
            cell: CellCoord::new(column, row),
        })
    }
}

/// Pacing of a headless run.
#[derive(Clone, Copy, Debug)]
pub(crate) struct SimulationOptions {
    pub(crate) waves: u32,
    pub(crate) frame: Duration,
    pub(crate) wave_timeout: Duration,
    pub(crate) print_events: bool,
}

/// Totals gathered while the simulation ran.
#[derive(Clone, Debug, Default, PartialEq)]
pub(crate) struct SimulationReport {
    pub(crate) waves_cleared: u32,
    pub(crate) kills: u32,
    pub(crate) leaks: u32,
    pub(crate) rejections: u32,
    pub(crate) boss_abilities: u32,
    pub(crate) game_over: bool,
}

impl SimulationReport {
    fn record(&mut self, events: &[Event], print_events: bool) {
        for event in events {
            if print_events {
                println!("{event:?}");
            }
            match event {
                Event::WaveCleared { .. } => self.waves_cleared += 1,
                Event::EnemyKilled { .. } => self.kills += 1,
                Event::EnemyLeaked { .. } => self.leaks += 1,
                Event::BossAbilityTriggered { .. } => self.boss_abilities += 1,
                Event::GameOver { .. } => self.game_over = true,
                Event::CommandRejected { reason } => {
                    self.rejections += 1;
                    tracing::warn!(%reason, "command rejected");
                }
                _ => {}
            }
        }
    }
}

/// Places the towers, then plays up to `options.waves` waves.
pub(crate) fn run(
    world: &mut World,
    placements: &[TowerPlacement],
    options: SimulationOptions,
) -> SimulationReport {
    let mut report = SimulationReport::default();
    let mut events = Vec::new();

    for placement in placements {
        apply(
            world,
            Command::PlaceTower {
                digimon: placement.digimon.clone(),
                cell: placement.cell,
            },
            &mut events,
        );
    }
    report.record(&events, options.print_events);

    let frames_per_wave = if options.frame.is_zero() {
        0
    } else {
        options.wave_timeout.as_nanos() / options.frame.as_nanos()
    };

    for _ in 0..options.waves {
        events.clear();
        apply(world, Command::StartWave, &mut events);
        let stop = events.iter().any(|event| {
            matches!(
                event,
                Event::CommandRejected {
                    reason: CommandRejection::NoMoreWaves | CommandRejection::GameOver
                }
            )
        });
        report.record(&events, options.print_events);
        if stop {
            break;
        }

        let mut frame = 0;
        while query::is_wave_active(world) && !query::is_game_over(world) && frame < frames_per_wave {
            events.clear();
            apply(world, Command::Tick { dt: options.frame }, &mut events);
            report.record(&events, options.print_events);
            frame += 1;
        }

        if query::is_game_over(world) {
            break;
        }
        if query::is_wave_active(world) {
            tracing::warn!(
                wave = query::run_state(world).wave,
                "wave did not finish before the timeout"
            );
            break;
        }
    }

    report
}

/// Human-readable summary printed after a run.
pub(crate) fn summary(run: &RunState, report: &SimulationReport, towers: &[TowerSnapshot]) -> String {
    let mut lines = vec![
        format!(
            "wave {} ({:?}): {} cleared, {} kills, {} leaks, {} boss abilities",
            run.wave, run.mode, report.waves_cleared, report.kills, report.leaks, report.boss_abilities
        ),
        format!("currency {}, lives {}", run.currency, run.lives),
    ];
    if report.game_over {
        lines.push("the run was lost".to_owned());
    }
    for tower in towers {
        lines.push(format!(
            "  #{} {} ({:?}, {:?}) level {} dp {} at {},{}: {} kills, {:.1} damage",
            tower.id.get(),
            tower.digimon,
            tower.stage,
            tower.attribute,
            tower.level,
            tower.dp,
            tower.cell.column(),
            tower.cell.row(),
            tower.kills,
            tower.damage_dealt
        ));
    }
    lines.join("\n")
}
