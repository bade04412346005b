use std::{any::Any, collections::BTreeSet};

use rustc_hash::FxHashMap;
use tessera_log::debug;

use crate::{
    entity::Entity,
    error::{EcsError, Result},
    signature::Signature,
    world::World,
};

/// A system is the logical component of the ECS. Every tick it operates on the entities whose
/// signature contains the signature the system was registered with.
///
/// Systems run one after another in registration order, so a system observes everything the
/// systems registered before it wrote during the same tick.
pub trait System: 'static {
    fn update(&mut self, ctx: Context<'_>, dt: f64);
}

/// What a system gets to work with during its update.
pub struct Context<'a> {
    /// The world the system belongs to. Components are read and written through it.
    pub world: &'a mut World,
    /// Members of the system when its update began, in ascending id order.
    ///
    /// This is a snapshot. Entities destroyed or stripped of components during the update are
    /// still listed, so systems that mutate their own members should check
    /// [`World::has_component`] before touching them.
    pub entities: &'a [Entity],
    /// Id of the running system.
    pub id: SystemId,
}

/// Unique ID for a registered system. IDs follow registration order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SystemId(u32);

/// Bookkeeping the world keeps for every registered system.
#[derive(Debug)]
pub struct SystemInfo {
    name: String,
    signature: Signature,
    entities: BTreeSet<Entity>,
    enabled: bool,
}

/// Registered systems in registration order, with lookup by name.
#[derive(Default)]
pub struct Systems {
    slots: Vec<SystemSlot>,
    to_id: FxHashMap<String, SystemId>,
}

struct SystemSlot {
    info: SystemInfo,
    /// `None` while the system is running.
    state: Option<Box<dyn SystemExt>>,
}

trait SystemExt {
    fn run(&mut self, ctx: Context<'_>, dt: f64);

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<S: System> SystemExt for S {
    #[inline]
    fn run(&mut self, ctx: Context<'_>, dt: f64) {
        self.update(ctx, dt);
    }

    #[inline]
    fn as_any(&self) -> &dyn Any {
        self
    }

    #[inline]
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

impl SystemInfo {
    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Components an entity needs to be a member of the system.
    #[inline]
    pub fn signature(&self) -> Signature {
        self.signature
    }

    /// Current members of the system.
    #[inline]
    pub fn entities(&self) -> &BTreeSet<Entity> {
        &self.entities
    }

    #[inline]
    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Determines if an entity with the given signature belongs in this system.
    #[inline]
    pub fn matches(&self, entity_signature: &Signature) -> bool {
        entity_signature.contains(&self.signature)
    }
}

impl Systems {
    pub fn new() -> Systems {
        Systems::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Appends a system to the update order. `entities` is the initial membership set.
    ///
    /// Fails if a system with the same name is already registered.
    pub fn register<S: System>(
        &mut self,
        name: &str,
        signature: Signature,
        system: S,
        entities: BTreeSet<Entity>,
    ) -> Result<SystemId> {
        if self.to_id.contains_key(name) {
            return Err(EcsError::DuplicateSystem(name.to_owned()));
        }

        let id = SystemId::from(self.slots.len());
        self.slots.push(SystemSlot {
            info: SystemInfo {
                name: name.to_owned(),
                signature,
                entities,
                enabled: true,
            },
            state: Some(Box::new(system)),
        });
        self.to_id.insert(name.to_owned(), id);
        debug!(
            "registered system `{}` requiring {:?} as #{}",
            name,
            signature,
            u32::from(id)
        );
        Ok(id)
    }

    #[inline]
    pub fn id(&self, name: &str) -> Option<SystemId> {
        self.to_id.get(name).copied()
    }

    #[inline]
    pub fn info(&self, id: SystemId) -> Option<&SystemInfo> {
        self.slots.get(usize::from(id)).map(|slot| &slot.info)
    }

    #[inline]
    pub fn info_by_name(&self, name: &str) -> Option<&SystemInfo> {
        self.id(name).and_then(|id| self.info(id))
    }

    /// Iterates over all systems in update order.
    pub fn iter(&self) -> impl Iterator<Item = (SystemId, &SystemInfo)> + '_ {
        self.slots
            .iter()
            .enumerate()
            .map(|(i, slot)| (SystemId::from(i), &slot.info))
    }

    /// System names in update order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.slots.iter().map(|slot| slot.info.name())
    }

    /// Gets a system by name, provided it is of type `S`.
    ///
    /// Returns `None` if no system has the name, if it has a different type, or if the system is
    /// currently running.
    pub fn get<S: System>(&self, name: &str) -> Option<&S> {
        let id = self.id(name)?;
        self.slots[usize::from(id)]
            .state
            .as_ref()?
            .as_any()
            .downcast_ref::<S>()
    }

    /// Mutable version of [`Systems::get`].
    pub fn get_mut<S: System>(&mut self, name: &str) -> Option<&mut S> {
        let id = self.id(name)?;
        self.slots[usize::from(id)]
            .state
            .as_mut()?
            .as_any_mut()
            .downcast_mut::<S>()
    }

    /// Enables or disables a system. Disabled systems keep their membership up to date but are
    /// skipped during updates. Returns `false` if the id is invalid.
    pub fn set_enabled(&mut self, id: SystemId, enabled: bool) -> bool {
        match self.slots.get_mut(usize::from(id)) {
            Some(slot) => {
                slot.info.enabled = enabled;
                true
            }
            None => false,
        }
    }

    /// Re-evaluates membership of `entity` in every system after its signature changed.
    pub fn entity_signature_changed(&mut self, entity: Entity, signature: Signature) {
        for slot in &mut self.slots {
            if slot.info.matches(&signature) {
                slot.info.entities.insert(entity);
            } else {
                slot.info.entities.remove(&entity);
            }
        }
    }

    /// Removes `entity` from every system.
    pub fn entity_destroyed(&mut self, entity: Entity) {
        for slot in &mut self.slots {
            slot.info.entities.remove(&entity);
        }
    }

    /// Checks the system out for an update. Fills `members` with its current entities.
    ///
    /// Returns `None` if the system is disabled or already running.
    fn begin_update(
        &mut self,
        id: SystemId,
        members: &mut Vec<Entity>,
    ) -> Option<Box<dyn SystemExt>> {
        let slot = self.slots.get_mut(usize::from(id))?;
        if !slot.info.enabled {
            return None;
        }

        let state = slot.state.take()?;
        members.clear();
        members.extend(slot.info.entities.iter().copied());
        Some(state)
    }

    fn end_update(&mut self, id: SystemId, state: Box<dyn SystemExt>) {
        self.slots[usize::from(id)].state = Some(state);
    }
}

impl World {
    /// Runs every enabled system once, in registration order.
    ///
    /// Systems registered while the pass is running are first updated on the next call.
    ///
    /// A system is checked out of the world while it runs. If its update panics it is never
    /// returned, so a caller that catches the unwind is left with a world that no longer runs or
    /// finds that system.
    pub fn update_systems(&mut self, dt: f64) {
        let mut members = std::mem::take(&mut self.members);
        let count = self.systems.len();

        for i in 0..count {
            let id = SystemId::from(i);
            let mut state = match self.systems.begin_update(id, &mut members) {
                Some(state) => state,
                None => continue,
            };

            state.run(
                Context {
                    world: self,
                    entities: &members,
                    id,
                },
                dt,
            );

            self.systems.end_update(id, state);
        }

        self.members = members;
    }
}

impl From<u32> for SystemId {
    #[inline]
    fn from(item: u32) -> Self {
        SystemId(item)
    }
}

impl From<usize> for SystemId {
    #[inline]
    fn from(item: usize) -> Self {
        SystemId(item as u32)
    }
}

impl From<SystemId> for u32 {
    #[inline]
    fn from(item: SystemId) -> Self {
        item.0
    }
}

impl From<SystemId> for usize {
    #[inline]
    fn from(item: SystemId) -> Self {
        item.0 as usize
    }
}
