use std::time::Duration;

use digi_defence_core::{
    CellCoord, Command, DigimonId, EffectKind, EnemyKindId, Event, TowerId, Tuning, WaveSpec,
    WaveTable, WaveTuning,
};
use digi_defence_world::{apply, query, World, WorldConfig};

fn tick(world: &mut World, dt: Duration, frames: usize, events: &mut Vec<Event>) {
    for _ in 0..frames {
        apply(world, Command::Tick { dt }, events);
    }
}

fn place(world: &mut World, digimon: &str, column: u32, row: u32, events: &mut Vec<Event>) {
    apply(
        world,
        Command::PlaceTower {
            digimon: DigimonId::new(digimon),
            cell: CellCoord::new(column, row),
        },
        events,
    );
}

#[test]
fn towers_clear_the_first_wave() {
    let mut world = World::default();
    let mut events = Vec::new();
    place(&mut world, "agumon", 1, 1, &mut events);
    place(&mut world, "agumon", 1, 3, &mut events);
    apply(&mut world, Command::StartWave, &mut events);

    tick(&mut world, Duration::from_millis(50), 1_200, &mut events);

    let kills = events
        .iter()
        .filter(|event| matches!(event, Event::EnemyKilled { .. }))
        .count();
    assert_eq!(kills, 4);
    assert!(!events
        .iter()
        .any(|event| matches!(event, Event::EnemyLeaked { .. })));
    assert!(events.contains(&Event::WaveCleared { wave: 1, reward: 12 }));

    let run = query::run_state(&world);
    assert_eq!(run.currency, 100 + 4 * 3 + 12);
    assert_eq!(run.lives, 20);
    assert!(!query::is_wave_active(&world));

    let credited: u32 = query::towers(&world).iter().map(|tower| tower.kills).sum();
    assert!(credited <= 4);
    assert!(query::towers(&world)
        .iter()
        .any(|tower| tower.damage_dealt > 0.0));
}

#[test]
fn restored_run_matches_the_saved_towers() {
    let mut world = World::default();
    let mut events = Vec::new();
    place(&mut world, "agumon", 1, 1, &mut events);
    place(&mut world, "gabumon", 2, 3, &mut events);
    apply(&mut world, Command::StartWave, &mut events);
    tick(&mut world, Duration::from_millis(50), 1_200, &mut events);
    assert!(!query::is_wave_active(&world));

    let restored = World::restore(
        WorldConfig::default(),
        Tuning::default(),
        query::run_state(&world),
        &query::tower_records(&world),
    );

    assert_eq!(query::towers(&restored), query::towers(&world));
    assert_eq!(query::run_state(&restored), query::run_state(&world));
}

#[test]
fn restore_skips_records_it_cannot_place() {
    let mut world = World::default();
    let mut events = Vec::new();
    place(&mut world, "agumon", 1, 1, &mut events);

    let mut records = query::tower_records(&world);
    let mut unknown = records[0].clone();
    unknown.digimon = DigimonId::new("missingno");
    unknown.cell = CellCoord::new(5, 1);
    let duplicate = records[0].clone();
    records.push(unknown);
    records.push(duplicate);

    let restored = World::restore(
        WorldConfig::default(),
        Tuning::default(),
        query::run_state(&world),
        &records,
    );
    assert_eq!(query::tower_count(&restored), 1);
}

#[test]
fn boss_stuns_the_nearest_tower() {
    let tuning = Tuning {
        waves: WaveTuning {
            authored: WaveTable::new(vec![WaveSpec {
                wave: 1,
                entries: Vec::new(),
                spawn_interval_ms: 100,
                boss: Some(EnemyKindId::new("devidramon")),
                reward: Some(50),
            }]),
            ..WaveTuning::default()
        },
        ..Tuning::default()
    };
    let mut world = World::new(WorldConfig::default(), tuning);
    let mut events = Vec::new();
    place(&mut world, "agumon", 5, 1, &mut events);
    place(&mut world, "koromon", 15, 0, &mut events);
    apply(&mut world, Command::StartWave, &mut events);

    tick(&mut world, Duration::from_millis(500), 16, &mut events);

    assert!(events.iter().any(|event| matches!(
        event,
        Event::BossAbilityTriggered { ability, .. } if ability == "Crimson Claw"
    )));
    assert!(events.iter().any(|event| matches!(
        event,
        Event::TowerStunned { tower, .. } if *tower == TowerId::new(0)
    )));
    let stunned = query::tower(&world, TowerId::new(0)).expect("tower placed");
    assert!(stunned.effects.contains(&EffectKind::Stun));
    let untouched = query::tower(&world, TowerId::new(1)).expect("tower placed");
    assert!(untouched.effects.is_empty());
}
