use std::fmt;

/// An entity is an identifier that is associated with a set of components in a world.
///
/// Handles are drawn from `[1, max_entities]` and recycled once destroyed. There is no generation
/// counter, so a recycled handle is indistinguishable from the entity that previously used the
/// same id. Code that keeps handles around across destruction must check
/// [`World::is_alive`](crate::world::World::is_alive) itself.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Entity(u32);

impl Entity {
    /// The reserved "no entity" handle.
    pub const NULL: Entity = Entity(0);

    #[inline]
    pub const fn new(id: u32) -> Entity {
        Entity(id)
    }

    /// Creates a handle to an entity that doesn't exist.
    #[inline]
    pub const fn null() -> Entity {
        Entity::NULL
    }

    /// Determines if this entity is null or not.
    #[inline]
    pub const fn is_null(&self) -> bool {
        self.0 == 0
    }

    #[inline]
    pub const fn id(&self) -> u32 {
        self.0
    }

    /// Position of this entity inside id-indexed tables.
    #[inline]
    pub(crate) const fn index(&self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Entity({})", self.0)
    }
}

impl From<u32> for Entity {
    #[inline]
    fn from(id: u32) -> Self {
        Entity(id)
    }
}

impl From<Entity> for u32 {
    #[inline]
    fn from(entity: Entity) -> Self {
        entity.0
    }
}
