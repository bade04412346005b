pub mod storage;

use std::any::TypeId;

pub use tessera_ecs_derive::Component;

use rustc_hash::FxHashMap;
use tessera_log::debug;

use crate::{
    component::storage::{AnyComponentStorage, ComponentStorage},
    entity::Entity,
    error::{EcsError, Result},
    signature::{ComponentBit, Signature},
    MAX_COMPONENT_TYPES,
};

/// A component represents a unique piece of data in an ECS. Components are associated with a
/// particular entity within a world, at most one of each type per entity.
pub trait Component: 'static {
    const NAME: &'static str;
}

/// Registered component types and their storages.
///
/// Each type receives the next free [`ComponentBit`] when it is registered. Storages are kept in
/// registration order, so a type's bit doubles as the index of its storage.
#[derive(Default)]
pub struct Components {
    storages: Vec<Box<dyn AnyComponentStorage>>,
    to_bit: FxHashMap<TypeId, ComponentBit>,
}

/// A list of component types, written as a tuple, that can be turned into a [`Signature`].
pub trait ComponentSet {
    fn signature(components: &Components) -> Result<Signature>;
}

impl Components {
    pub fn new() -> Components {
        Components::default()
    }

    /// Number of registered component types.
    #[inline]
    pub fn len(&self) -> usize {
        self.storages.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.storages.is_empty()
    }

    /// Assigns the component type the next free bit and creates its storage.
    pub fn register<T: Component>(&mut self) -> Result<ComponentBit> {
        if self.to_bit.contains_key(&TypeId::of::<T>()) {
            return Err(EcsError::ComponentAlreadyRegistered(T::NAME));
        }

        if self.storages.len() == MAX_COMPONENT_TYPES {
            return Err(EcsError::TooManyComponentTypes {
                name: T::NAME,
                max: MAX_COMPONENT_TYPES,
            });
        }

        let bit = ComponentBit::from(self.storages.len());
        self.storages.push(Box::new(ComponentStorage::<T>::new()));
        self.to_bit.insert(TypeId::of::<T>(), bit);
        debug!("registered component `{}` with bit {}", T::NAME, bit);
        Ok(bit)
    }

    #[inline]
    pub fn is_registered<T: Component>(&self) -> bool {
        self.to_bit.contains_key(&TypeId::of::<T>())
    }

    /// Gets the bit assigned to a component type.
    #[inline]
    pub fn bit<T: Component>(&self) -> Result<ComponentBit> {
        self.to_bit
            .get(&TypeId::of::<T>())
            .copied()
            .ok_or(EcsError::ComponentNotRegistered(T::NAME))
    }

    /// Builds the signature of a set of registered component types.
    #[inline]
    pub fn make_signature<S: ComponentSet>(&self) -> Result<Signature> {
        S::signature(self)
    }

    /// Gets the storage of a component.
    pub fn storage<T: Component>(&self) -> Result<&ComponentStorage<T>> {
        let bit = self.bit::<T>()?;
        Ok(self.storages[usize::from(bit)]
            .as_any()
            .downcast_ref::<ComponentStorage<T>>()
            .expect("Mismatched storage type"))
    }

    /// Gets mutable access to the storage of a component.
    pub fn storage_mut<T: Component>(&mut self) -> Result<&mut ComponentStorage<T>> {
        let bit = self.bit::<T>()?;
        Ok(self.storages[usize::from(bit)]
            .as_any_mut()
            .downcast_mut::<ComponentStorage<T>>()
            .expect("Mismatched storage type"))
    }

    /// Storage of the component type assigned to `bit`, without knowing the type.
    #[inline]
    pub fn storage_by_bit(&self, bit: ComponentBit) -> Option<&dyn AnyComponentStorage> {
        self.storages.get(usize::from(bit)).map(|s| s.as_ref())
    }

    #[inline]
    pub fn add<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        self.storage_mut::<T>()?.insert(entity, component)
    }

    #[inline]
    pub fn remove<T: Component>(&mut self, entity: Entity) -> Result<T> {
        self.storage_mut::<T>()?.remove(entity)
    }

    #[inline]
    pub fn has<T: Component>(&self, entity: Entity) -> Result<bool> {
        Ok(self.storage::<T>()?.has(entity))
    }

    #[inline]
    pub fn get<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.storage::<T>()?
            .get(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    #[inline]
    pub fn get_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.storage_mut::<T>()?
            .get_mut(entity)
            .ok_or(EcsError::MissingComponent {
                entity,
                component: T::NAME,
            })
    }

    /// Purges the entity from every storage that holds one of its components. Returns the number
    /// of components removed.
    pub fn entity_destroyed(&mut self, entity: Entity) -> usize {
        self.storages
            .iter_mut()
            .map(|storage| storage.entity_destroyed(entity))
            .filter(|removed| *removed)
            .count()
    }
}

impl ComponentSet for () {
    #[inline]
    fn signature(_: &Components) -> Result<Signature> {
        Ok(Signature::EMPTY)
    }
}

macro_rules! component_set_impl {
    ( $( $name:ident )+ ) => {
        impl<$($name: Component,)*> ComponentSet for ($($name,)*) {
            #[inline]
            fn signature(components: &Components) -> Result<Signature> {
                let mut signature = Signature::EMPTY;
                $(
                    signature.set(components.bit::<$name>()?);
                )*
                Ok(signature)
            }
        }
    }
}

component_set_impl! { A }
component_set_impl! { A B }
component_set_impl! { A B C }
component_set_impl! { A B C D }
component_set_impl! { A B C D E }
component_set_impl! { A B C D E F }
component_set_impl! { A B C D E F G }
component_set_impl! { A B C D E F G H }
component_set_impl! { A B C D E F G H I }
component_set_impl! { A B C D E F G H I J }
component_set_impl! { A B C D E F G H I J K }
component_set_impl! { A B C D E F G H I J K L }
