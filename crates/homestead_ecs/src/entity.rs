//! Entity handles, identity stamps, and the fixed-capacity slot table.
//!
//! An [`Entity`] is a bare `u32` index into a world's slot table. Indices
//! are reused after removal, so the slot table also mints a [`Stamp`] per
//! creation — a token that is never reused within a world. Code that must
//! tell "the same id" apart from "the same logical entity" (enter/exit
//! tracking, replication bookkeeping) compares stamps, not ids.

use serde::{Deserialize, Serialize};

use crate::error::EcsError;

/// A handle to one entity slot within a world.
///
/// Valid handles lie in `[0, capacity)`. The handle alone does not prove
/// the entity is alive, nor that it is the same logical entity as an
/// earlier occupant of the slot — see [`Stamp`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Entity(pub u32);

impl Entity {
    /// Create an entity handle from a raw slot index.
    #[must_use]
    pub const fn from_index(index: u32) -> Self {
        Self(index)
    }

    /// Returns the slot index as a `usize`, ready for column indexing.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for Entity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

/// An identity token minted once per entity creation.
///
/// Stamps are world-local and strictly increasing: re-creating an entity
/// at a previously-freed slot yields the same [`Entity`] id but a new
/// stamp, which is how trackers detect destroy-and-recreate at one slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Stamp(pub u64);

impl std::fmt::Display for Stamp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Stamp({})", self.0)
    }
}

/// One occupied slot: its stamp and the component membership list
/// (store indices, in attach order).
#[derive(Debug, Clone)]
pub(crate) struct Slot {
    pub(crate) stamp: Stamp,
    pub(crate) attached: Vec<usize>,
}

/// Fixed-capacity entity allocator.
///
/// Slots are assigned first-fit, lowest index first, so a fresh world
/// hands out ids 0, 1, 2, ... and a freed slot is the next one reused.
/// The table never grows; allocation past capacity is a hard error the
/// caller must handle (typically by rejecting whatever prompted the
/// allocation).
#[derive(Debug)]
pub struct SlotTable {
    slots: Vec<Option<Slot>>,
    live: usize,
    next_stamp: u64,
}

impl SlotTable {
    /// Create a table with `capacity` slots, all free.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            live: 0,
            next_stamp: 1,
        }
    }

    /// Returns the fixed slot capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    /// Returns the number of currently live entities.
    #[must_use]
    pub fn live(&self) -> usize {
        self.live
    }

    /// Occupy the lowest free slot.
    ///
    /// # Errors
    ///
    /// [`EcsError::WorldFull`] when every slot is occupied.
    pub fn allocate(&mut self) -> Result<Entity, EcsError> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(EcsError::WorldFull {
                capacity: self.slots.len(),
            })?;
        self.occupy(index);
        Ok(Entity(index as u32))
    }

    /// Occupy a caller-chosen slot.
    ///
    /// Used for ids assigned elsewhere (e.g. by an authoritative peer)
    /// that must land on a specific index locally.
    ///
    /// # Errors
    ///
    /// [`EcsError::OutOfRange`] if the id is past capacity,
    /// [`EcsError::SlotOccupied`] if a live entity already holds it.
    pub fn allocate_at(&mut self, entity: Entity) -> Result<Entity, EcsError> {
        let index = entity.index();
        if index >= self.slots.len() {
            return Err(EcsError::OutOfRange {
                entity,
                capacity: self.slots.len(),
            });
        }
        if self.slots[index].is_some() {
            return Err(EcsError::SlotOccupied(entity));
        }
        self.occupy(index);
        Ok(entity)
    }

    fn occupy(&mut self, index: usize) {
        let stamp = Stamp(self.next_stamp);
        self.next_stamp += 1;
        self.slots[index] = Some(Slot {
            stamp,
            attached: Vec::new(),
        });
        self.live += 1;
    }

    /// Free a slot, returning its final state.
    ///
    /// # Errors
    ///
    /// [`EcsError::NoSuchEntity`] if the slot is free or out of range.
    pub(crate) fn free(&mut self, entity: Entity) -> Result<Slot, EcsError> {
        let slot = self
            .slots
            .get_mut(entity.index())
            .and_then(Option::take)
            .ok_or(EcsError::NoSuchEntity(entity))?;
        self.live -= 1;
        Ok(slot)
    }

    /// Free every slot. Stamps keep counting up, so entities created
    /// after a clear are still distinguishable from pre-clear ones.
    pub fn clear(&mut self) {
        for slot in &mut self.slots {
            *slot = None;
        }
        self.live = 0;
    }

    /// Returns `true` if the slot holds a live entity.
    #[must_use]
    pub fn contains(&self, entity: Entity) -> bool {
        matches!(self.slots.get(entity.index()), Some(Some(_)))
    }

    /// Returns the stamp of a live entity, or `None`.
    #[must_use]
    pub fn stamp(&self, entity: Entity) -> Option<Stamp> {
        self.slots.get(entity.index())?.as_ref().map(|s| s.stamp)
    }

    /// Add a store index to the entity's membership list.
    ///
    /// Returns `true` if it was newly added, `false` if already present.
    ///
    /// # Errors
    ///
    /// [`EcsError::NoSuchEntity`] if the entity is not alive.
    pub(crate) fn attach(&mut self, entity: Entity, store: usize) -> Result<bool, EcsError> {
        let slot = self
            .slots
            .get_mut(entity.index())
            .and_then(Option::as_mut)
            .ok_or(EcsError::NoSuchEntity(entity))?;
        if slot.attached.contains(&store) {
            return Ok(false);
        }
        slot.attached.push(store);
        Ok(true)
    }

    /// Remove a store index from the entity's membership list.
    ///
    /// Returns `true` if it was present, `false` for a no-op.
    ///
    /// # Errors
    ///
    /// [`EcsError::NoSuchEntity`] if the entity is not alive.
    pub(crate) fn detach(&mut self, entity: Entity, store: usize) -> Result<bool, EcsError> {
        let slot = self
            .slots
            .get_mut(entity.index())
            .and_then(Option::as_mut)
            .ok_or(EcsError::NoSuchEntity(entity))?;
        match slot.attached.iter().position(|&s| s == store) {
            Some(pos) => {
                slot.attached.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Membership test by store index. Dead entities have nothing attached.
    #[must_use]
    pub(crate) fn has(&self, entity: Entity, store: usize) -> bool {
        match self.slots.get(entity.index()) {
            Some(Some(slot)) => slot.attached.contains(&store),
            _ => false,
        }
    }

    /// Store indices attached to a live entity, in attach order.
    #[must_use]
    pub(crate) fn attached(&self, entity: Entity) -> Option<&[usize]> {
        self.slots
            .get(entity.index())?
            .as_ref()
            .map(|s| s.attached.as_slice())
    }

    /// Iterate live entities in ascending id order.
    pub fn iter_live(&self) -> impl Iterator<Item = Entity> + '_ {
        self.slots
            .iter()
            .enumerate()
            .filter(|(_, s)| s.is_some())
            .map(|(i, _)| Entity(i as u32))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_first_fit_ids() {
        let mut table = SlotTable::new(8);
        for expected in 0..8u32 {
            assert_eq!(table.allocate().unwrap(), Entity(expected));
        }
    }

    #[test]
    fn test_capacity_exhaustion() {
        let mut table = SlotTable::new(3);
        for _ in 0..3 {
            table.allocate().unwrap();
        }
        assert_eq!(
            table.allocate(),
            Err(EcsError::WorldFull { capacity: 3 })
        );
    }

    #[test]
    fn test_freed_slot_is_reused_first() {
        let mut table = SlotTable::new(4);
        let a = table.allocate().unwrap();
        let _b = table.allocate().unwrap();
        table.free(a).unwrap();
        assert_eq!(table.allocate().unwrap(), a);
    }

    #[test]
    fn test_stamps_never_repeat_across_reuse() {
        let mut table = SlotTable::new(2);
        let a = table.allocate().unwrap();
        let first = table.stamp(a).unwrap();
        table.free(a).unwrap();
        let again = table.allocate().unwrap();
        assert_eq!(a, again);
        assert_ne!(first, table.stamp(again).unwrap());
    }

    #[test]
    fn test_allocate_at_collision() {
        let mut table = SlotTable::new(4);
        table.allocate_at(Entity(2)).unwrap();
        assert_eq!(
            table.allocate_at(Entity(2)),
            Err(EcsError::SlotOccupied(Entity(2)))
        );
        assert_eq!(
            table.allocate_at(Entity(9)),
            Err(EcsError::OutOfRange {
                entity: Entity(9),
                capacity: 4
            })
        );
    }

    #[test]
    fn test_allocate_skips_reserved_slot() {
        let mut table = SlotTable::new(4);
        table.allocate_at(Entity(0)).unwrap();
        assert_eq!(table.allocate().unwrap(), Entity(1));
    }

    #[test]
    fn test_membership_list() {
        let mut table = SlotTable::new(2);
        let e = table.allocate().unwrap();
        assert!(table.attach(e, 0).unwrap());
        assert!(!table.attach(e, 0).unwrap());
        assert!(table.has(e, 0));
        assert!(table.detach(e, 0).unwrap());
        assert!(!table.detach(e, 0).unwrap());
        assert!(!table.has(e, 0));
    }

    #[test]
    fn test_clear_keeps_minting_fresh_stamps() {
        let mut table = SlotTable::new(2);
        let e = table.allocate().unwrap();
        let before = table.stamp(e).unwrap();
        table.clear();
        assert_eq!(table.live(), 0);
        let e2 = table.allocate().unwrap();
        assert_eq!(e, e2);
        assert_ne!(before, table.stamp(e2).unwrap());
    }
}
