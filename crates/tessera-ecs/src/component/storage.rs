use std::any::Any;

use rustc_hash::FxHashMap;

use crate::{
    component::Component,
    entity::Entity,
    error::{EcsError, Result},
};

/// Dense storage for every instance of one component type.
///
/// Values are kept contiguous. `index_to_entity[i]` owns `values[i]` and `entity_to_index` is its
/// exact inverse. Removal swaps the last value into the hole, so insertion order is not preserved.
#[derive(Debug)]
pub struct ComponentStorage<T> {
    values: Vec<T>,
    index_to_entity: Vec<Entity>,
    entity_to_index: FxHashMap<Entity, usize>,
}

/// Interface the component registry uses to talk to storages without knowing their type.
pub trait AnyComponentStorage {
    /// Converts the type into an any reference.
    fn as_any(&self) -> &dyn Any;

    /// Converts the type into a mutable any reference.
    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Name of the stored component type.
    fn name(&self) -> &'static str;

    /// Number of stored components.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Removes the component belonging to `entity`, if there is one. Returns `true` if a component
    /// was removed.
    fn entity_destroyed(&mut self, entity: Entity) -> bool;
}

impl<T> Default for ComponentStorage<T> {
    fn default() -> Self {
        Self {
            values: Vec::default(),
            index_to_entity: Vec::default(),
            entity_to_index: FxHashMap::default(),
        }
    }
}

impl<T: Component + 'static> ComponentStorage<T> {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a component for `entity`.
    ///
    /// Fails if the entity already has a component in this storage.
    pub fn insert(&mut self, entity: Entity, value: T) -> Result<()> {
        if self.entity_to_index.contains_key(&entity) {
            return Err(EcsError::DuplicateComponent {
                entity,
                component: T::NAME,
            });
        }

        let index = self.values.len();
        self.entity_to_index.insert(entity, index);
        self.index_to_entity.push(entity);
        self.values.push(value);
        Ok(())
    }

    /// Removes and returns the component of `entity`. The last component in the buffer is moved
    /// into the freed slot.
    ///
    /// Fails if the entity has no component in this storage.
    pub fn remove(&mut self, entity: Entity) -> Result<T> {
        let removed = self
            .entity_to_index
            .remove(&entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })?;

        // `swap_remove` moves the tail into `removed`. Repoint the moved entity if there was one.
        let value = self.values.swap_remove(removed);
        self.index_to_entity.swap_remove(removed);
        if let Some(&moved) = self.index_to_entity.get(removed) {
            self.entity_to_index.insert(moved, removed);
        }

        Ok(value)
    }

    #[inline]
    pub fn get(&self, entity: Entity) -> Option<&T> {
        self.entity_to_index.get(&entity).map(|i| &self.values[*i])
    }

    #[inline]
    pub fn get_mut(&mut self, entity: Entity) -> Option<&mut T> {
        match self.entity_to_index.get(&entity) {
            Some(i) => Some(&mut self.values[*i]),
            None => None,
        }
    }

    #[inline]
    pub fn has(&self, entity: Entity) -> bool {
        self.entity_to_index.contains_key(&entity)
    }
}

impl<T> ComponentStorage<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Entity owning the component at `index` in the dense buffer.
    #[inline]
    pub fn entity(&self, index: usize) -> Option<Entity> {
        self.index_to_entity.get(index).copied()
    }

    /// Owners of the dense buffer, in buffer order.
    #[inline]
    pub fn entities(&self) -> &[Entity] {
        &self.index_to_entity
    }

    /// The dense component buffer.
    #[inline]
    pub fn data(&self) -> &[T] {
        &self.values
    }

    #[inline]
    pub fn data_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Iterates over every component along with its owner, in buffer order.
    pub fn iter(&self) -> impl Iterator<Item = (Entity, &T)> + '_ {
        self.index_to_entity.iter().copied().zip(self.values.iter())
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (Entity, &mut T)> + '_ {
        self.index_to_entity
            .iter()
            .copied()
            .zip(self.values.iter_mut())
    }

    /// Checks that the dense buffer and both index maps agree with each other.
    pub fn is_consistent(&self) -> bool {
        self.values.len() == self.index_to_entity.len()
            && self.entity_to_index.len() == self.index_to_entity.len()
            && self
                .index_to_entity
                .iter()
                .enumerate()
                .all(|(i, entity)| self.entity_to_index.get(entity) == Some(&i))
    }
}

impl<T: Component + 'static> AnyComponentStorage for ComponentStorage<T> {
    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    #[inline]
    fn name(&self) -> &'static str {
        T::NAME
    }

    #[inline]
    fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    fn entity_destroyed(&mut self, entity: Entity) -> bool {
        self.remove(entity).is_ok()
    }
}
