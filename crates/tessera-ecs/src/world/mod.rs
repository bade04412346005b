pub mod entities;

use std::collections::BTreeSet;

use tessera_log::trace;

use crate::{
    component::{storage::ComponentStorage, Component, ComponentSet, Components},
    entity::Entity,
    error::{fatal, EcsError, Result},
    settings::WorldSettings,
    signature::{ComponentBit, Signature},
    system::{System, SystemId, SystemInfo, Systems},
    world::entities::Entities,
};

/// A world contains the data of the ECS. It is used to create entities, add and remove
/// components from those entities and run systems over them.
///
/// Every mutation goes through the world so that each system's membership set stays equal to
/// the set of entities whose signature contains the system's signature.
///
/// Operations whose preconditions are violated (unregistered component types, duplicate or
/// missing components, invalid entities, exhausted capacity) are programmer errors. The plain
/// methods panic with the error. The `try_` variants return it instead.
pub struct World {
    /// Entity ids and signatures.
    pub(crate) entities: Entities,
    /// Component types and their storages.
    pub(crate) components: Components,
    /// Systems in update order.
    pub(crate) systems: Systems,
    /// Reused buffer holding the members of the running system.
    pub(crate) members: Vec<Entity>,
}

impl Default for World {
    fn default() -> Self {
        World::with_settings(&WorldSettings::default())
    }
}

impl World {
    pub fn new() -> World {
        World::default()
    }

    /// Creates a world with the given settings.
    ///
    /// # Panics
    /// Panics if the settings don't pass [`WorldSettings::validate`].
    #[track_caller]
    pub fn with_settings(settings: &WorldSettings) -> World {
        fatal(World::try_with_settings(settings))
    }

    pub fn try_with_settings(settings: &WorldSettings) -> Result<World> {
        if settings.validate().is_err() {
            return Err(EcsError::InvalidCapacity(settings.max_entities));
        }

        Ok(World {
            entities: Entities::new(settings.max_entities),
            components: Components::new(),
            systems: Systems::new(),
            members: Vec::default(),
        })
    }

    #[inline]
    pub fn entities(&self) -> &Entities {
        &self.entities
    }

    #[inline]
    pub fn components(&self) -> &Components {
        &self.components
    }

    #[inline]
    pub fn systems(&self) -> &Systems {
        &self.systems
    }

    /// Number of live entities.
    #[inline]
    pub fn entity_count(&self) -> u32 {
        self.entities.len()
    }

    /// Creates a new entity with no components.
    ///
    /// # Panics
    /// Panics if every entity id is in use.
    #[track_caller]
    pub fn create_entity(&mut self) -> Entity {
        fatal(self.try_create_entity())
    }

    pub fn try_create_entity(&mut self) -> Result<Entity> {
        let entity = self.entities.create()?;

        // Only systems without requirements can match a component-less entity.
        self.systems
            .entity_signature_changed(entity, Signature::EMPTY);

        trace!("created {entity}");
        Ok(entity)
    }

    /// Destroys an entity. It is removed from every system, its components are dropped and its id
    /// is queued for reuse.
    ///
    /// # Panics
    /// Panics if the entity is out of range or not alive.
    #[track_caller]
    pub fn destroy_entity(&mut self, entity: Entity) {
        fatal(self.try_destroy_entity(entity))
    }

    pub fn try_destroy_entity(&mut self, entity: Entity) -> Result<()> {
        self.entities.check_allocated(entity)?;

        self.systems.entity_destroyed(entity);
        let removed = self.components.entity_destroyed(entity);
        self.entities.destroy(entity)?;

        trace!("destroyed {entity} along with {removed} components");
        Ok(())
    }

    /// Returns `true` if the entity is in range and has at least one component.
    ///
    /// An allocated entity without components is indistinguishable from a destroyed one.
    #[inline]
    pub fn is_alive(&self, entity: Entity) -> bool {
        self.entities
            .signature(entity)
            .map(|signature| !signature.is_empty())
            .unwrap_or(false)
    }

    /// Current signature of an entity.
    ///
    /// # Panics
    /// Panics if the entity is out of range.
    #[track_caller]
    pub fn signature(&self, entity: Entity) -> Signature {
        fatal(self.entities.signature(entity))
    }

    /// Registers a component type, assigning it the next free bit.
    ///
    /// # Panics
    /// Panics if the type is already registered or all component bits are taken.
    #[track_caller]
    pub fn register_component<T: Component>(&mut self) -> ComponentBit {
        fatal(self.try_register_component::<T>())
    }

    #[inline]
    pub fn try_register_component<T: Component>(&mut self) -> Result<ComponentBit> {
        self.components.register::<T>()
    }

    /// Bit assigned to a component type.
    ///
    /// # Panics
    /// Panics if the type is not registered.
    #[track_caller]
    pub fn component_bit<T: Component>(&self) -> ComponentBit {
        fatal(self.components.bit::<T>())
    }

    /// Builds the signature for a tuple of registered component types.
    ///
    /// ```
    /// # use tessera_ecs::prelude::*;
    /// #[derive(Component)]
    /// struct Position(f32, f32);
    ///
    /// #[derive(Component)]
    /// struct Velocity(f32, f32);
    ///
    /// let mut world = World::new();
    /// world.register_component::<Position>();
    /// world.register_component::<Velocity>();
    ///
    /// let signature = world.make_signature::<(Position, Velocity)>();
    /// assert_eq!(signature.count(), 2);
    /// ```
    ///
    /// # Panics
    /// Panics if any of the types is not registered.
    #[track_caller]
    pub fn make_signature<S: ComponentSet>(&self) -> Signature {
        fatal(self.try_make_signature::<S>())
    }

    #[inline]
    pub fn try_make_signature<S: ComponentSet>(&self) -> Result<Signature> {
        self.components.make_signature::<S>()
    }

    /// Attaches a component to an entity and updates system membership.
    ///
    /// # Panics
    /// Panics if the entity is invalid, the type is not registered or the entity already has a
    /// component of this type.
    #[track_caller]
    pub fn add_component<T: Component>(&mut self, entity: Entity, component: T) {
        fatal(self.try_add_component(entity, component))
    }

    pub fn try_add_component<T: Component>(&mut self, entity: Entity, component: T) -> Result<()> {
        self.entities.check_allocated(entity)?;
        let bit = self.components.bit::<T>()?;
        self.components.add(entity, component)?;

        let mut signature = self.entities.signature(entity)?;
        signature.set(bit);
        self.entities.set_signature(entity, signature)?;
        self.systems.entity_signature_changed(entity, signature);
        Ok(())
    }

    /// Detaches a component from an entity, updates system membership and returns the component.
    ///
    /// # Panics
    /// Panics if the entity is invalid, the type is not registered or the entity has no
    /// component of this type.
    #[track_caller]
    pub fn remove_component<T: Component>(&mut self, entity: Entity) -> T {
        fatal(self.try_remove_component(entity))
    }

    pub fn try_remove_component<T: Component>(&mut self, entity: Entity) -> Result<T> {
        self.entities.check_allocated(entity)?;
        let bit = self.components.bit::<T>()?;
        let component = self.components.remove::<T>(entity)?;

        let mut signature = self.entities.signature(entity)?;
        signature.reset(bit);
        self.entities.set_signature(entity, signature)?;
        self.systems.entity_signature_changed(entity, signature);
        Ok(component)
    }

    /// # Panics
    /// Panics if the type is not registered.
    #[track_caller]
    pub fn has_component<T: Component>(&self, entity: Entity) -> bool {
        fatal(self.components.has::<T>(entity))
    }

    #[inline]
    pub fn try_has_component<T: Component>(&self, entity: Entity) -> Result<bool> {
        self.components.has::<T>(entity)
    }

    /// # Panics
    /// Panics if the type is not registered or the entity has no component of this type.
    #[track_caller]
    pub fn get_component<T: Component>(&self, entity: Entity) -> &T {
        fatal(self.components.get::<T>(entity))
    }

    #[inline]
    pub fn try_get_component<T: Component>(&self, entity: Entity) -> Result<&T> {
        self.components.get::<T>(entity)
    }

    /// # Panics
    /// Panics if the type is not registered or the entity has no component of this type.
    #[track_caller]
    pub fn get_component_mut<T: Component>(&mut self, entity: Entity) -> &mut T {
        fatal(self.components.get_mut::<T>(entity))
    }

    #[inline]
    pub fn try_get_component_mut<T: Component>(&mut self, entity: Entity) -> Result<&mut T> {
        self.components.get_mut::<T>(entity)
    }

    /// Dense storage of a component type, for systems that scan every component of one type.
    ///
    /// # Panics
    /// Panics if the type is not registered.
    #[track_caller]
    pub fn storage<T: Component>(&self) -> &ComponentStorage<T> {
        fatal(self.components.storage::<T>())
    }

    /// Mutable access to the dense values of a component type. Membership can't change through
    /// this handle, only component values.
    ///
    /// # Panics
    /// Panics if the type is not registered.
    #[track_caller]
    pub fn storage_values_mut<T: Component>(&mut self) -> &mut [T] {
        fatal(self.components.storage_mut::<T>()).data_mut()
    }

    /// Constructs a system with `Default` and appends it to the update order.
    ///
    /// # Panics
    /// Panics if a system with the same name is already registered.
    #[track_caller]
    pub fn register_system<S: System + Default>(
        &mut self,
        name: &str,
        signature: Signature,
    ) -> SystemId {
        fatal(self.try_register_system_with(name, signature, S::default()))
    }

    /// Appends an already constructed system to the update order.
    ///
    /// # Panics
    /// Panics if a system with the same name is already registered.
    #[track_caller]
    pub fn register_system_with<S: System>(
        &mut self,
        name: &str,
        signature: Signature,
        system: S,
    ) -> SystemId {
        fatal(self.try_register_system_with(name, signature, system))
    }

    /// Registers a system. Entities that already match `signature` become members immediately.
    pub fn try_register_system_with<S: System>(
        &mut self,
        name: &str,
        signature: Signature,
        system: S,
    ) -> Result<SystemId> {
        let members = self
            .entities
            .allocated()
            .filter(|entity| {
                self.entities
                    .signature(*entity)
                    .map(|owned| owned.contains(&signature))
                    .unwrap_or(false)
            })
            .collect::<BTreeSet<_>>();

        self.systems.register(name, signature, system, members)
    }

    /// Looks up a system by name. Returns `None` if the name is unknown, the system is not of
    /// type `S` or it is the system currently running.
    #[inline]
    pub fn get_system<S: System>(&self, name: &str) -> Option<&S> {
        self.systems.get::<S>(name)
    }

    #[inline]
    pub fn get_system_mut<S: System>(&mut self, name: &str) -> Option<&mut S> {
        self.systems.get_mut::<S>(name)
    }

    #[inline]
    pub fn system_info(&self, name: &str) -> Option<&SystemInfo> {
        self.systems.info_by_name(name)
    }

    /// Current members of a system.
    #[inline]
    pub fn system_entities(&self, name: &str) -> Option<&BTreeSet<Entity>> {
        self.systems.info_by_name(name).map(|info| info.entities())
    }

    /// Enables or disables a system by name. Returns `false` if no system has that name.
    pub fn set_system_enabled(&mut self, name: &str, enabled: bool) -> bool {
        match self.systems.id(name) {
            Some(id) => self.systems.set_enabled(id, enabled),
            None => false,
        }
    }
}
