#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Pure system that picks one enemy per tower according to its priority.

use std::cmp::Ordering;

use digi_defence_core::{Point, TargetPriority, TowerId, Unit, UnitId};
use digi_defence_system_status_effects::speed_multiplier;

/// Read-only view of an enemy considered for targeting.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TargetCandidate {
    /// Identifier of the enemy.
    pub id: UnitId,
    /// Current position.
    pub position: Point,
    /// Distance travelled along the lane.
    pub path_progress: f32,
    /// Current health.
    pub health: f32,
    /// Current speed after movement effects.
    pub speed: f32,
    /// Whether the enemy flies.
    pub flying: bool,
    /// Whether the enemy is still alive.
    pub alive: bool,
}

impl TargetCandidate {
    /// Captures the targeting-relevant state of a unit.
    #[must_use]
    pub fn from_unit(unit: &Unit) -> Self {
        Self {
            id: unit.id,
            position: unit.position,
            path_progress: unit.path_progress,
            health: unit.health.current(),
            speed: unit.base_speed * speed_multiplier(&unit.effects),
            flying: unit.flying,
            alive: unit.is_alive(),
        }
    }

    /// Replaces the speed with one that includes modifiers the unit does not carry.
    #[must_use]
    pub fn with_speed(mut self, speed: f32) -> Self {
        self.speed = speed;
        self
    }
}

/// Tower parameters required to select a target.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TowerAim {
    /// Tower looking for a target.
    pub tower: TowerId,
    /// Tower position; `None` disables the range filter.
    pub origin: Option<Point>,
    /// Targeting range in world units.
    pub range: f32,
    /// Selection rule.
    pub priority: TargetPriority,
}

/// Target assignment produced for a tower.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TowerTarget {
    /// Tower that fires.
    pub tower: TowerId,
    /// Enemy it fires at.
    pub target: UnitId,
}

/// Tower targeting system that reuses a scratch buffer between queries.
#[derive(Debug, Default)]
pub struct TowerTargeting {
    workspace: Vec<Ranked>,
}

impl TowerTargeting {
    /// Creates a new tower targeting system with an empty scratch buffer.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes a target for every tower that has one.
    ///
    /// The output buffer is cleared before populating it with the latest
    /// assignments; towers without a valid target are omitted.
    pub fn handle(
        &mut self,
        towers: &[TowerAim],
        candidates: &[TargetCandidate],
        out: &mut Vec<TowerTarget>,
    ) {
        out.clear();

        if towers.is_empty() || candidates.is_empty() {
            return;
        }

        for aim in towers {
            if let Some(target) = self.find_target(candidates, aim.origin, aim.range, aim.priority) {
                out.push(TowerTarget {
                    tower: aim.tower,
                    target,
                });
            }
        }
    }

    /// Selects the best candidate for a single tower.
    ///
    /// Candidates that are dead or farther than `range` from `origin` are
    /// skipped; the boundary is inclusive. Without an origin no range filter
    /// applies and [`TargetPriority::Closest`] behaves like
    /// [`TargetPriority::First`]. Equal keys keep their input order.
    pub fn find_target(
        &mut self,
        candidates: &[TargetCandidate],
        origin: Option<Point>,
        range: f32,
        priority: TargetPriority,
    ) -> Option<UnitId> {
        self.workspace.clear();

        for candidate in candidates.iter().filter(|candidate| candidate.alive) {
            let distance = origin.map(|origin| origin.distance(candidate.position));
            if let Some(distance) = distance {
                if !(distance <= range) {
                    continue;
                }
            }
            self.workspace.push(Ranked {
                candidate: *candidate,
                distance,
            });
        }

        if self.workspace.is_empty() {
            return None;
        }

        self.workspace.sort_by(|a, b| compare(a, b, priority));
        self.workspace.first().map(|ranked| ranked.candidate.id)
    }
}

/// Convenience wrapper around [`TowerTargeting::find_target`].
#[must_use]
pub fn find_target(
    candidates: &[TargetCandidate],
    origin: Option<Point>,
    range: f32,
    priority: TargetPriority,
) -> Option<UnitId> {
    TowerTargeting::new().find_target(candidates, origin, range, priority)
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Ranked {
    candidate: TargetCandidate,
    distance: Option<f32>,
}

fn compare(a: &Ranked, b: &Ranked, priority: TargetPriority) -> Ordering {
    let first = || {
        b.candidate
            .path_progress
            .total_cmp(&a.candidate.path_progress)
    };

    match priority {
        TargetPriority::First => first(),
        TargetPriority::Last => a
            .candidate
            .path_progress
            .total_cmp(&b.candidate.path_progress),
        TargetPriority::Strongest => b.candidate.health.total_cmp(&a.candidate.health),
        TargetPriority::Weakest => a.candidate.health.total_cmp(&b.candidate.health),
        TargetPriority::Fastest => b.candidate.speed.total_cmp(&a.candidate.speed),
        TargetPriority::Flying => b
            .candidate
            .flying
            .cmp(&a.candidate.flying)
            .then_with(first),
        TargetPriority::Closest => match (a.distance, b.distance) {
            (Some(left), Some(right)) => left.total_cmp(&right),
            _ => first(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: u32, x: f32, progress: f32, health: f32) -> TargetCandidate {
        TargetCandidate {
            id: UnitId::new(id),
            position: Point::new(x, 0.0),
            path_progress: progress,
            health,
            speed: 1.0,
            flying: false,
            alive: true,
        }
    }

    const ORIGIN: Option<Point> = Some(Point::new(0.0, 0.0));

    #[test]
    fn nothing_in_range_yields_none() {
        let candidates = [candidate(1, 5.0, 1.0, 10.0)];
        assert_eq!(find_target(&candidates, ORIGIN, 4.0, TargetPriority::First), None);
        assert_eq!(find_target(&[], ORIGIN, 4.0, TargetPriority::First), None);
    }

    #[test]
    fn range_boundary_is_inclusive() {
        let candidates = [candidate(1, 3.0, 1.0, 10.0)];
        assert_eq!(
            find_target(&candidates, ORIGIN, 3.0, TargetPriority::First),
            Some(UnitId::new(1))
        );
    }

    #[test]
    fn dead_candidates_are_skipped() {
        let mut dead = candidate(1, 1.0, 9.0, 0.0);
        dead.alive = false;
        let candidates = [dead, candidate(2, 1.0, 1.0, 5.0)];
        assert_eq!(
            find_target(&candidates, ORIGIN, 3.0, TargetPriority::First),
            Some(UnitId::new(2))
        );
    }

    #[test]
    fn progress_priorities_pick_extremes() {
        let candidates = [
            candidate(1, 1.0, 4.0, 10.0),
            candidate(2, 1.0, 9.0, 10.0),
            candidate(3, 1.0, 2.0, 10.0),
        ];
        assert_eq!(
            find_target(&candidates, ORIGIN, 3.0, TargetPriority::First),
            Some(UnitId::new(2))
        );
        assert_eq!(
            find_target(&candidates, ORIGIN, 3.0, TargetPriority::Last),
            Some(UnitId::new(3))
        );
    }

    #[test]
    fn health_priorities_pick_extremes() {
        let candidates = [
            candidate(1, 1.0, 1.0, 40.0),
            candidate(2, 1.0, 1.0, 80.0),
            candidate(3, 1.0, 1.0, 20.0),
        ];
        assert_eq!(
            find_target(&candidates, ORIGIN, 3.0, TargetPriority::Strongest),
            Some(UnitId::new(2))
        );
        assert_eq!(
            find_target(&candidates, ORIGIN, 3.0, TargetPriority::Weakest),
            Some(UnitId::new(3))
        );
    }

    #[test]
    fn fastest_uses_current_speed() {
        let mut slow = candidate(1, 1.0, 1.0, 10.0);
        slow.speed = 0.5;
        let mut quick = candidate(2, 1.0, 1.0, 10.0);
        quick.speed = 2.0;
        assert_eq!(
            find_target(&[slow, quick], ORIGIN, 3.0, TargetPriority::Fastest),
            Some(UnitId::new(2))
        );
    }

    #[test]
    fn flying_first_then_progress() {
        let ground = candidate(1, 1.0, 9.0, 10.0);
        let mut low_flyer = candidate(2, 1.0, 2.0, 10.0);
        low_flyer.flying = true;
        let mut high_flyer = candidate(3, 1.0, 5.0, 10.0);
        high_flyer.flying = true;
        assert_eq!(
            find_target(
                &[ground, low_flyer, high_flyer],
                ORIGIN,
                3.0,
                TargetPriority::Flying
            ),
            Some(UnitId::new(3))
        );
        assert_eq!(
            find_target(&[ground], ORIGIN, 3.0, TargetPriority::Flying),
            Some(UnitId::new(1))
        );
    }

    #[test]
    fn closest_without_origin_falls_back_to_first() {
        let candidates = [candidate(1, 1.0, 2.0, 10.0), candidate(2, 50.0, 7.0, 10.0)];
        assert_eq!(
            find_target(&candidates, ORIGIN, 3.0, TargetPriority::Closest),
            Some(UnitId::new(1))
        );
        assert_eq!(
            find_target(&candidates, None, 3.0, TargetPriority::Closest),
            Some(UnitId::new(2))
        );
    }

    #[test]
    fn equal_keys_keep_input_order() {
        let candidates = [
            candidate(7, 1.0, 3.0, 10.0),
            candidate(4, 2.0, 3.0, 10.0),
            candidate(9, 0.5, 3.0, 10.0),
        ];
        for priority in [
            TargetPriority::First,
            TargetPriority::Last,
            TargetPriority::Strongest,
            TargetPriority::Weakest,
            TargetPriority::Fastest,
            TargetPriority::Flying,
        ] {
            assert_eq!(
                find_target(&candidates, ORIGIN, 3.0, priority),
                Some(UnitId::new(7)),
                "{priority:?}"
            );
        }
    }

    #[test]
    fn handle_assigns_each_tower_independently() {
        let mut system = TowerTargeting::new();
        let candidates = [candidate(1, 1.0, 1.0, 10.0), candidate(2, 10.0, 5.0, 10.0)];
        let towers = [
            TowerAim {
                tower: TowerId::new(1),
                origin: ORIGIN,
                range: 2.0,
                priority: TargetPriority::First,
            },
            TowerAim {
                tower: TowerId::new(2),
                origin: Some(Point::new(20.0, 0.0)),
                range: 2.0,
                priority: TargetPriority::First,
            },
        ];
        let mut out = vec![TowerTarget {
            tower: TowerId::new(99),
            target: UnitId::new(99),
        }];

        system.handle(&towers, &candidates, &mut out);

        assert_eq!(
            out,
            vec![TowerTarget {
                tower: TowerId::new(1),
                target: UnitId::new(1),
            }]
        );
    }
}
