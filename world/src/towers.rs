//! Authoritative tower storage and identifier allocation.

use std::collections::BTreeMap;

use digi_defence_core::{CellCoord, Tower, TowerId};

/// Registry that stores towers in identifier order.
#[derive(Clone, Debug)]
pub(crate) struct TowerRegistry {
    entries: BTreeMap<TowerId, Tower>,
    next_tower_id: TowerId,
}

impl TowerRegistry {
    /// Creates an empty tower registry with a reset identifier counter.
    pub(crate) fn new() -> Self {
        Self {
            entries: BTreeMap::new(),
            next_tower_id: TowerId::new(0),
        }
    }

    /// Reserves the next identifier.
    pub(crate) fn allocate(&mut self) -> TowerId {
        let id = self.next_tower_id;
        self.next_tower_id = TowerId::new(id.get().saturating_add(1));
        id
    }

    /// Stores a tower under its own identifier.
    pub(crate) fn insert(&mut self, tower: Tower) {
        let _ = self.entries.insert(tower.id, tower);
    }

    pub(crate) fn remove(&mut self, id: TowerId) -> Option<Tower> {
        self.entries.remove(&id)
    }

    pub(crate) fn get(&self, id: TowerId) -> Option<&Tower> {
        self.entries.get(&id)
    }

    pub(crate) fn get_mut(&mut self, id: TowerId) -> Option<&mut Tower> {
        self.entries.get_mut(&id)
    }

    /// Tower standing on the cell, if any.
    pub(crate) fn occupant(&self, cell: CellCoord) -> Option<TowerId> {
        self.entries
            .values()
            .find(|tower| tower.cell == cell)
            .map(|tower| tower.id)
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = &Tower> {
        self.entries.values()
    }

    pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Tower> {
        self.entries.values_mut()
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use digi_defence_core::{DigimonId, Roster, UnitId};

    fn tower(registry: &mut TowerRegistry, cell: CellCoord) -> Tower {
        let roster = Roster::default();
        let definition = roster
            .get(&DigimonId::new("agumon"))
            .expect("agumon is in the default roster");
        let id = registry.allocate();
        Tower::spawn(id, UnitId::new(1_000 + id.get()), definition, cell)
    }

    #[test]
    fn registry_starts_empty_with_zero_identifier() {
        let registry = TowerRegistry::new();
        assert_eq!(registry.len(), 0);
        assert_eq!(registry.next_tower_id.get(), 0);
    }

    #[test]
    fn identifiers_are_never_reused() {
        let mut registry = TowerRegistry::new();
        let first = tower(&mut registry, CellCoord::new(0, 0));
        registry.insert(first);
        assert!(registry.remove(TowerId::new(0)).is_some());

        let second = tower(&mut registry, CellCoord::new(0, 0));
        assert_eq!(second.id, TowerId::new(1));
    }

    #[test]
    fn occupant_reports_the_tower_on_a_cell() {
        let mut registry = TowerRegistry::new();
        let placed = tower(&mut registry, CellCoord::new(3, 1));
        registry.insert(placed);

        assert_eq!(registry.occupant(CellCoord::new(3, 1)), Some(TowerId::new(0)));
        assert_eq!(registry.occupant(CellCoord::new(1, 3)), None);
    }
}
