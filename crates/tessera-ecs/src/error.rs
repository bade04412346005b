use thiserror::Error;

use crate::entity::Entity;

/// Precondition violations reported by the ECS. None of these are recoverable runtime conditions:
/// the plain (non-`try_`) world operations log them and panic.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EcsError {
    #[error("too many entities: all {0} entity ids are in use")]
    CapacityExhausted(u32),
    #[error("{entity} is out of range, valid ids are 1..={max}")]
    EntityOutOfRange { entity: Entity, max: u32 },
    #[error("{0} is not a live entity")]
    EntityNotAllocated(Entity),
    #[error("component `{0}` registered more than once")]
    ComponentAlreadyRegistered(&'static str),
    #[error("component `{0}` used before registration")]
    ComponentNotRegistered(&'static str),
    #[error("unable to register component `{name}`, all {max} component slots are taken")]
    TooManyComponentTypes { name: &'static str, max: usize },
    #[error("component `{component}` added to {entity} twice")]
    DuplicateComponent {
        entity: Entity,
        component: &'static str,
    },
    #[error("{entity} has no component `{component}`")]
    MissingComponent {
        entity: Entity,
        component: &'static str,
    },
    #[error("a system named `{0}` is already registered")]
    DuplicateSystem(String),
    #[error("unable to create a world holding {0} entities, capacity must be in 1..{}", u32::MAX)]
    InvalidCapacity(u32),
}

pub type Result<T> = std::result::Result<T, EcsError>;

/// Unwraps the result of an ECS operation, treating an error as a fatal programmer error.
///
/// The panic message reaches the log through the panic hook installed by `tessera_log`.
#[track_caller]
pub(crate) fn fatal<T>(result: Result<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
