//! A small, single-threaded entity component system.
//!
//! Entities are plain integer handles. Components of each registered type live in their own dense
//! [`ComponentStorage`](component::storage::ComponentStorage), and every entity carries a
//! [`Signature`](signature::Signature) with one bit per component type it owns. Systems declare
//! the signature they require and the [`World`](world::World) keeps each system's set of matching
//! entities up to date as components come and go.

extern crate self as tessera_ecs;

pub mod component;
pub mod entity;
pub mod error;
pub mod settings;
pub mod signature;
pub mod system;
pub mod world;

#[cfg(test)]
mod tests;

pub mod prelude {
    pub use crate::component::storage::ComponentStorage;
    pub use crate::component::Component;
    pub use crate::component::ComponentSet;
    pub use crate::entity::Entity;
    pub use crate::error::EcsError;
    pub use crate::settings::WorldSettings;
    pub use crate::signature::ComponentBit;
    pub use crate::signature::Signature;
    pub use crate::system::Context;
    pub use crate::system::System;
    pub use crate::system::SystemId;
    pub use crate::system::SystemInfo;
    pub use crate::world::World;
}

/// Maximum number of component types a world can register. One bit per type in a `Signature`.
pub const MAX_COMPONENT_TYPES: usize = 64;

/// Entity capacity used when a world is created without explicit settings.
pub const DEFAULT_MAX_ENTITIES: u32 = 4096;
