use std::collections::VecDeque;

use bitvec::prelude::*;

use crate::{
    entity::Entity,
    error::{EcsError, Result},
    signature::Signature,
};

/// Hands out entity ids from a bounded pool and stores the signature of every entity.
///
/// Freed ids are recycled in FIFO order, so an id is reused as late as possible after it was
/// released.
pub struct Entities {
    /// Ids available for allocation, oldest release first.
    free: VecDeque<Entity>,
    /// Signature per id. Index 0 belongs to the null entity and is never touched.
    signatures: Vec<Signature>,
    /// Which ids are currently handed out.
    allocated: BitVec<u64, Lsb0>,
    /// Number of allocated ids.
    living: u32,
    max_entities: u32,
}

impl Entities {
    /// Creates an allocator for ids `1..=max_entities`.
    pub fn new(max_entities: u32) -> Entities {
        let slots = max_entities as usize + 1;
        Entities {
            free: (1..=max_entities).map(Entity::new).collect(),
            signatures: vec![Signature::EMPTY; slots],
            allocated: bitvec![u64, Lsb0; 0; slots],
            living: 0,
            max_entities,
        }
    }

    /// Number of live entities.
    #[inline]
    pub fn len(&self) -> u32 {
        self.living
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.living == 0
    }

    /// Maximum number of entities that can be alive at once.
    #[inline]
    pub fn capacity(&self) -> u32 {
        self.max_entities
    }

    /// Allocates a new entity with an empty signature.
    pub fn create(&mut self) -> Result<Entity> {
        if self.living >= self.max_entities {
            return Err(EcsError::CapacityExhausted(self.max_entities));
        }

        let entity = self
            .free
            .pop_front()
            .ok_or(EcsError::CapacityExhausted(self.max_entities))?;
        self.allocated.set(entity.index(), true);
        self.living += 1;
        Ok(entity)
    }

    /// Releases an entity. Its signature is cleared and the id goes to the back of the free queue.
    pub fn destroy(&mut self, entity: Entity) -> Result<()> {
        self.check_allocated(entity)?;

        let ind = entity.index();
        self.signatures[ind].clear();
        self.allocated.set(ind, false);
        self.free.push_back(entity);
        self.living -= 1;
        Ok(())
    }

    #[inline]
    pub fn signature(&self, entity: Entity) -> Result<Signature> {
        self.check_range(entity)?;
        Ok(self.signatures[entity.index()])
    }

    #[inline]
    pub fn set_signature(&mut self, entity: Entity, signature: Signature) -> Result<()> {
        self.check_range(entity)?;
        self.signatures[entity.index()] = signature;
        Ok(())
    }

    /// Returns `true` if the id is in range and currently handed out.
    #[inline]
    pub fn is_allocated(&self, entity: Entity) -> bool {
        self.in_range(entity) && self.allocated[entity.index()]
    }

    /// Iterates over every allocated entity in ascending id order.
    pub fn allocated(&self) -> impl Iterator<Item = Entity> + '_ {
        self.allocated.iter_ones().map(|id| Entity::new(id as u32))
    }

    /// Fails unless the entity id lies in `[1, max_entities]`.
    #[inline]
    pub fn check_range(&self, entity: Entity) -> Result<()> {
        if self.in_range(entity) {
            Ok(())
        } else {
            Err(EcsError::EntityOutOfRange {
                entity,
                max: self.max_entities,
            })
        }
    }

    /// Fails unless the entity is in range and currently allocated.
    #[inline]
    pub fn check_allocated(&self, entity: Entity) -> Result<()> {
        self.check_range(entity)?;
        if self.allocated[entity.index()] {
            Ok(())
        } else {
            Err(EcsError::EntityNotAllocated(entity))
        }
    }

    #[inline]
    fn in_range(&self, entity: Entity) -> bool {
        !entity.is_null() && entity.id() <= self.max_entities
    }
}
