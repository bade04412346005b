use std::collections::BTreeSet;

use rand::{rngs::StdRng, Rng, SeedableRng};

use crate::prelude::*;

#[derive(Component, Debug, Default, Copy, Clone, PartialEq, Eq)]
struct ComponentA {
    x: u32,
    y: u32,
}

#[derive(Component, Debug, Default, Copy, Clone, PartialEq, Eq)]
struct ComponentB {
    x: u32,
    y: u32,
}

#[derive(Component, Debug, Default, Copy, Clone, PartialEq, Eq)]
struct ComponentC {
    x: u32,
    y: u32,
}

#[derive(Component, Debug, Default, Clone, PartialEq, Eq)]
struct Text(String);

/// Records the members it is given every update.
#[derive(Default)]
struct Recorder {
    seen: Vec<Vec<Entity>>,
}

impl System for Recorder {
    fn update(&mut self, ctx: Context<'_>, _: f64) {
        self.seen.push(ctx.entities.to_vec());
    }
}

/// Records the value of `ComponentA::x` for each member, then increments it.
#[derive(Default)]
struct Incrementer {
    observed: Vec<u32>,
}

impl System for Incrementer {
    fn update(&mut self, ctx: Context<'_>, _: f64) {
        for entity in ctx.entities {
            let a = ctx.world.get_component_mut::<ComponentA>(*entity);
            self.observed.push(a.x);
            a.x += 1;
        }
    }
}

/// Records the value of `ComponentA::x` for each member.
#[derive(Default)]
struct Observer {
    observed: Vec<u32>,
}

impl System for Observer {
    fn update(&mut self, ctx: Context<'_>, _: f64) {
        for entity in ctx.entities {
            self.observed
                .push(ctx.world.get_component::<ComponentA>(*entity).x);
        }
    }
}

/// Destroys every member whose `ComponentA::x` is zero.
#[derive(Default)]
struct Reaper {
    reaped: usize,
}

impl System for Reaper {
    fn update(&mut self, ctx: Context<'_>, _: f64) {
        for entity in ctx.entities {
            if ctx.world.get_component::<ComponentA>(*entity).x == 0 {
                ctx.world.destroy_entity(*entity);
                self.reaped += 1;
            }
        }
    }
}

/// Remembers whether it could see itself through the world while running.
#[derive(Default)]
struct Introspector {
    saw_self: Option<bool>,
    dt: f64,
}

impl System for Introspector {
    fn update(&mut self, ctx: Context<'_>, dt: f64) {
        self.saw_self = Some(ctx.world.get_system::<Introspector>("introspector").is_some());
        self.dt = dt;
    }
}

/// Moves every `ComponentA` along by its `y` by scanning the dense storage directly.
#[derive(Default)]
struct Integrator;

impl System for Integrator {
    fn update(&mut self, ctx: Context<'_>, _: f64) {
        for a in ctx.world.storage_values_mut::<ComponentA>() {
            a.x += a.y;
        }
    }
}

/// Panics on its first update.
#[derive(Default)]
struct Faulty;

impl System for Faulty {
    fn update(&mut self, _: Context<'_>, _: f64) {
        panic!("faulty system");
    }
}

fn registered_world(max_entities: u32) -> World {
    let mut world = World::with_settings(&WorldSettings { max_entities });
    world.register_component::<ComponentA>();
    world.register_component::<ComponentB>();
    world.register_component::<ComponentC>();
    world
}

/// Checks every structural invariant of the world against a brute force recomputation.
fn verify(world: &World) {
    let allocated = world.entities.allocated().collect::<Vec<_>>();
    assert_eq!(allocated.len() as u32, world.entity_count());

    // Signatures agree with storage contents.
    for entity in &allocated {
        let signature = world.signature(*entity);
        assert_eq!(
            signature.test(world.component_bit::<ComponentA>()),
            world.has_component::<ComponentA>(*entity)
        );
        assert_eq!(
            signature.test(world.component_bit::<ComponentB>()),
            world.has_component::<ComponentB>(*entity)
        );
        assert_eq!(
            signature.test(world.component_bit::<ComponentC>()),
            world.has_component::<ComponentC>(*entity)
        );
    }

    // Storages are dense and only hold live entities.
    assert!(world.storage::<ComponentA>().is_consistent());
    assert!(world.storage::<ComponentB>().is_consistent());
    assert!(world.storage::<ComponentC>().is_consistent());
    for entity in world.storage::<ComponentA>().entities() {
        assert!(world.entities.is_allocated(*entity));
    }

    // Membership is exactly the set of matching entities.
    for (_, info) in world.systems().iter() {
        let expected = allocated
            .iter()
            .copied()
            .filter(|entity| world.signature(*entity).contains(&info.signature()))
            .collect::<BTreeSet<_>>();
        assert_eq!(info.entities(), &expected, "system `{}`", info.name());
    }
}

#[test]
fn component_bits_are_unique_and_ordered() {
    let mut world = World::new();
    let a = world.register_component::<ComponentA>();
    let b = world.register_component::<ComponentB>();
    let c = world.register_component::<ComponentC>();

    assert_eq!(usize::from(a), 0);
    assert_eq!(usize::from(b), 1);
    assert_eq!(usize::from(c), 2);
    assert_eq!(world.component_bit::<ComponentB>(), b);
    assert_eq!(world.components().len(), 3);
    assert_eq!(world.components().storage_by_bit(c).unwrap().name(), "ComponentC");
}

#[test]
fn registration_queries() {
    let mut world = registered_world(4);
    assert_eq!(world.entities().capacity(), 4);
    assert!(world.components().is_registered::<ComponentA>());
    assert!(!world.components().is_registered::<Text>());

    world.register_component::<Text>();
    assert!(world.components().is_registered::<Text>());
}

#[test]
fn signature_from_bits() {
    let world = registered_world(4);
    let signature = [
        world.component_bit::<ComponentA>(),
        world.component_bit::<ComponentC>(),
    ]
    .into_iter()
    .collect::<Signature>();

    assert_eq!(signature, world.make_signature::<(ComponentA, ComponentC)>());
    assert_eq!(
        signature.bits().collect::<Vec<_>>(),
        vec![
            world.component_bit::<ComponentA>(),
            world.component_bit::<ComponentC>()
        ]
    );
}

#[test]
fn make_signature_sets_listed_bits() {
    let world = registered_world(16);
    let signature = world.make_signature::<(ComponentA, ComponentC)>();

    assert_eq!(signature.count(), 2);
    assert!(signature.test(world.component_bit::<ComponentA>()));
    assert!(!signature.test(world.component_bit::<ComponentB>()));
    assert!(signature.test(world.component_bit::<ComponentC>()));
    assert!(world.make_signature::<()>().is_empty());
}

#[test]
fn add_get_remove_round_trip() {
    let mut world = registered_world(16);
    world.register_component::<Text>();
    let entity = world.create_entity();

    world.add_component(entity, ComponentA { x: 1, y: 2 });
    world.add_component(entity, Text(String::from("hello")));
    assert!(world.is_alive(entity));
    assert_eq!(*world.get_component::<ComponentA>(entity), ComponentA { x: 1, y: 2 });

    world.get_component_mut::<ComponentA>(entity).y = 7;
    assert_eq!(world.remove_component::<ComponentA>(entity), ComponentA { x: 1, y: 7 });
    assert!(!world.has_component::<ComponentA>(entity));
    assert_eq!(world.get_component::<Text>(entity).0, "hello");
    verify(&world);
}

#[test]
fn removal_keeps_storage_dense() {
    let mut world = registered_world(16);
    let entities = (0..4)
        .map(|i| {
            let entity = world.create_entity();
            world.add_component(entity, ComponentA { x: i, y: 0 });
            entity
        })
        .collect::<Vec<_>>();

    // Removing the first moves the last into its slot.
    world.remove_component::<ComponentA>(entities[0]);

    let storage = world.storage::<ComponentA>();
    assert_eq!(storage.len(), 3);
    assert_eq!(storage.entity(0), Some(entities[3]));
    assert_eq!(storage.data()[0].x, 3);
    assert!(storage.is_consistent());

    for (i, entity) in entities.iter().enumerate().skip(1) {
        assert_eq!(world.get_component::<ComponentA>(*entity).x, i as u32);
    }
}

#[test]
fn storage_iteration_pairs_owners_with_values() {
    let mut storage = ComponentStorage::<ComponentB>::new();
    let entities = (1..=3).map(Entity::new).collect::<Vec<_>>();
    for entity in &entities {
        storage
            .insert(*entity, ComponentB { x: entity.id(), y: 0 })
            .unwrap();
    }

    for (entity, b) in storage.iter_mut() {
        b.y = entity.id() * 10;
    }
    storage.remove(entities[0]).unwrap();

    let mut pairs = storage
        .iter()
        .map(|(entity, b)| (entity, b.x, b.y))
        .collect::<Vec<_>>();
    pairs.sort();
    assert_eq!(pairs, vec![(entities[1], 2, 20), (entities[2], 3, 30)]);
    assert!(storage.is_consistent());
}

#[test]
fn systems_can_scan_storage_in_bulk() {
    let mut world = registered_world(16);
    let signature = world.make_signature::<(ComponentA,)>();
    world.register_system::<Integrator>("integrator", signature);
    world.register_system::<Observer>("observer", signature);

    let slow = world.create_entity();
    world.add_component(slow, ComponentA { x: 0, y: 1 });
    let fast = world.create_entity();
    world.add_component(fast, ComponentA { x: 10, y: 5 });

    world.update_systems(1.0);
    world.update_systems(1.0);

    // The later system reads what the bulk scan wrote in the same tick.
    assert_eq!(
        world.get_system::<Observer>("observer").unwrap().observed,
        vec![1, 15, 2, 20]
    );
    assert_eq!(world.get_component::<ComponentA>(fast).x, 20);

    let total = world
        .storage::<ComponentA>()
        .iter()
        .map(|(_, a)| a.x)
        .sum::<u32>();
    assert_eq!(total, 22);
}

#[test]
fn panicking_system_stays_checked_out() {
    let mut world = registered_world(4);
    world.register_system::<Faulty>("faulty", Signature::EMPTY);

    let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
        world.update_systems(1.0);
    }));

    assert!(result.is_err());
    assert!(world.get_system::<Faulty>("faulty").is_none());
    world.update_systems(1.0);
}

#[test]
fn invalid_capacity_is_rejected() {
    assert_eq!(
        World::try_with_settings(&WorldSettings { max_entities: 0 }).err(),
        Some(EcsError::InvalidCapacity(0))
    );
    assert_eq!(
        World::try_with_settings(&WorldSettings {
            max_entities: u32::MAX
        })
        .err(),
        Some(EcsError::InvalidCapacity(u32::MAX))
    );
    assert!(World::try_with_settings(&WorldSettings { max_entities: 1 }).is_ok());
}

#[test]
#[should_panic(expected = "capacity must be in")]
fn invalid_capacity_is_fatal() {
    World::with_settings(&WorldSettings { max_entities: 0 });
}

#[test]
fn entity_ids_are_recycled_in_fifo_order() {
    let mut world = registered_world(3);
    let e1 = world.create_entity();
    let e2 = world.create_entity();
    let e3 = world.create_entity();
    assert_eq!((e1.id(), e2.id(), e3.id()), (1, 2, 3));

    world.destroy_entity(e2);
    world.destroy_entity(e1);

    assert_eq!(world.create_entity(), e2);
    assert_eq!(world.create_entity(), e1);
    assert_eq!(world.entity_count(), 3);
}

#[test]
fn is_alive_requires_components() {
    let mut world = registered_world(4);
    let entity = world.create_entity();

    assert!(!world.is_alive(Entity::NULL));
    assert!(!world.is_alive(Entity::new(5)));
    assert!(!world.is_alive(entity));

    world.add_component(entity, ComponentB::default());
    assert!(world.is_alive(entity));

    world.destroy_entity(entity);
    assert!(!world.is_alive(entity));
}

#[test]
fn membership_matches_signatures() {
    let mut world = registered_world(16);
    let sig_a = world.make_signature::<(ComponentA,)>();
    let sig_ab = world.make_signature::<(ComponentA, ComponentB)>();
    world.register_system::<Recorder>("a", sig_a);
    world.register_system::<Recorder>("ab", sig_ab);

    let e1 = world.create_entity();
    let e2 = world.create_entity();
    world.add_component(e1, ComponentA::default());
    verify(&world);
    world.add_component(e2, ComponentB::default());
    verify(&world);
    world.add_component(e2, ComponentA::default());
    verify(&world);

    assert_eq!(
        world.system_entities("a").unwrap(),
        &[e1, e2].into_iter().collect::<BTreeSet<_>>()
    );
    assert_eq!(
        world.system_entities("ab").unwrap(),
        &[e2].into_iter().collect::<BTreeSet<_>>()
    );

    world.destroy_entity(e1);
    verify(&world);
    assert!(world.system_entities("a").unwrap().contains(&e2));
    assert!(!world.system_entities("a").unwrap().contains(&e1));
}

#[test]
fn invariants_hold_under_random_churn() {
    const MAX: u32 = 64;

    let mut rng = StdRng::seed_from_u64(0x7e55e7a);
    let mut world = registered_world(MAX);
    let sig_a = world.make_signature::<(ComponentA,)>();
    let sig_bc = world.make_signature::<(ComponentB, ComponentC)>();
    world.register_system::<Recorder>("a", sig_a);
    world.register_system::<Recorder>("bc", sig_bc);
    world.register_system::<Recorder>("all", Signature::EMPTY);

    let mut live = Vec::new();
    for _ in 0..2000 {
        match rng.gen_range(0..6) {
            0 if world.entity_count() < MAX => live.push(world.create_entity()),
            1 if !live.is_empty() => {
                let entity = live.swap_remove(rng.gen_range(0..live.len()));
                world.destroy_entity(entity);
            }
            2 if !live.is_empty() => {
                let entity = live[rng.gen_range(0..live.len())];
                if !world.has_component::<ComponentA>(entity) {
                    world.add_component(entity, ComponentA { x: entity.id(), y: 0 });
                }
            }
            3 if !live.is_empty() => {
                let entity = live[rng.gen_range(0..live.len())];
                if world.has_component::<ComponentB>(entity) {
                    world.remove_component::<ComponentB>(entity);
                } else {
                    world.add_component(entity, ComponentB::default());
                }
            }
            4 if !live.is_empty() => {
                let entity = live[rng.gen_range(0..live.len())];
                if world.has_component::<ComponentC>(entity) {
                    world.remove_component::<ComponentC>(entity);
                } else {
                    world.add_component(entity, ComponentC::default());
                }
            }
            5 if !live.is_empty() => {
                let entity = live[rng.gen_range(0..live.len())];
                if world.has_component::<ComponentA>(entity) {
                    let a = world.remove_component::<ComponentA>(entity);
                    assert_eq!(a.x, entity.id());
                }
            }
            _ => {}
        }
        verify(&world);
    }

    assert_eq!(world.entity_count() as usize, live.len());
}

#[test]
fn scenario_membership_after_attach() {
    let mut world = registered_world(16);
    let e1 = world.create_entity();
    world.add_component(e1, ComponentA::default());
    let e2 = world.create_entity();
    world.add_component(e2, ComponentA::default());
    world.add_component(e2, ComponentB::default());

    let signature = world.make_signature::<(ComponentA, ComponentB)>();
    world.register_system::<Recorder>("ab", signature);
    assert_eq!(
        world.system_entities("ab").unwrap(),
        &[e2].into_iter().collect::<BTreeSet<_>>()
    );

    // Detaching a required component drops the entity from the system.
    world.remove_component::<ComponentB>(e2);
    assert!(world.system_entities("ab").unwrap().is_empty());
    verify(&world);
}

#[test]
fn scenario_capacity_fills_up() {
    let mut world = registered_world(4);
    for i in 1..=4 {
        assert_eq!(world.create_entity().id(), i);
    }
    assert_eq!(
        world.try_create_entity(),
        Err(EcsError::CapacityExhausted(4))
    );
}

#[test]
#[should_panic]
fn scenario_capacity_exhaustion_is_fatal() {
    let mut world = registered_world(4);
    for _ in 0..4 {
        world.create_entity();
    }
    world.create_entity();
}

#[test]
fn scenario_destroy_purges_components() {
    let mut world = registered_world(16);
    let entity = world.create_entity();
    world.add_component(entity, ComponentC { x: 4, y: 2 });
    world.destroy_entity(entity);

    let storage = world.storage::<ComponentC>();
    assert!(!storage.has(entity));
    assert_eq!(storage.len(), 0);
    assert!(world.signature(entity).is_empty());
}

#[test]
fn scenario_systems_run_in_registration_order() {
    let mut world = registered_world(16);
    let signature = world.make_signature::<(ComponentA,)>();
    world.register_system::<Incrementer>("first", signature);
    world.register_system::<Observer>("second", signature);
    assert_eq!(
        world.systems().names().collect::<Vec<_>>(),
        vec!["first", "second"]
    );

    let entity = world.create_entity();
    world.add_component(entity, ComponentA::default());

    world.update_systems(0.016);
    world.update_systems(0.016);

    // The later system sees the earlier system's writes from the same tick.
    assert_eq!(world.get_system::<Incrementer>("first").unwrap().observed, vec![0, 1]);
    assert_eq!(world.get_system::<Observer>("second").unwrap().observed, vec![1, 2]);
}

#[test]
fn system_can_destroy_its_own_members() {
    let mut world = registered_world(16);
    let signature = world.make_signature::<(ComponentA,)>();
    world.register_system::<Reaper>("reaper", signature);
    world.register_system::<Recorder>("after", signature);

    let doomed = world.create_entity();
    world.add_component(doomed, ComponentA { x: 0, y: 0 });
    let spared = world.create_entity();
    world.add_component(spared, ComponentA { x: 1, y: 0 });

    world.update_systems(1.0);

    assert_eq!(world.get_system::<Reaper>("reaper").unwrap().reaped, 1);
    assert_eq!(world.get_system::<Recorder>("after").unwrap().seen, vec![vec![spared]]);
    assert!(!world.is_alive(doomed));
    verify(&world);
}

#[test]
fn disabled_systems_are_skipped() {
    let mut world = registered_world(16);
    world.register_system::<Recorder>("rec", Signature::EMPTY);

    assert!(world.set_system_enabled("rec", false));
    world.update_systems(1.0);
    assert!(world.get_system::<Recorder>("rec").unwrap().seen.is_empty());

    // Membership is still tracked while disabled.
    let entity = world.create_entity();
    assert!(world.system_entities("rec").unwrap().contains(&entity));

    assert!(world.set_system_enabled("rec", true));
    world.update_systems(1.0);
    assert_eq!(world.get_system::<Recorder>("rec").unwrap().seen, vec![vec![entity]]);
    assert!(!world.set_system_enabled("missing", true));
}

#[test]
fn empty_signature_matches_every_entity() {
    let mut world = registered_world(16);
    let before = world.create_entity();
    world.register_system::<Recorder>("all", Signature::EMPTY);
    let after = world.create_entity();
    world.add_component(after, ComponentA::default());

    assert_eq!(
        world.system_entities("all").unwrap(),
        &[before, after].into_iter().collect::<BTreeSet<_>>()
    );
    verify(&world);
}

#[test]
fn system_lookup() {
    let mut world = registered_world(16);
    let id = world.register_system_with(
        "introspector",
        Signature::EMPTY,
        Introspector::default(),
    );

    assert_eq!(world.systems().id("introspector"), Some(id));
    assert_eq!(world.system_info("introspector").unwrap().name(), "introspector");
    assert!(world.get_system::<Recorder>("introspector").is_none());
    assert!(world.get_system::<Introspector>("missing").is_none());

    world.update_systems(0.5);

    // A running system is checked out of the world.
    let system = world.get_system::<Introspector>("introspector").unwrap();
    assert_eq!(system.saw_self, Some(false));
    assert_eq!(system.dt, 0.5);

    world.get_system_mut::<Introspector>("introspector").unwrap().dt = 0.0;
    assert_eq!(world.get_system::<Introspector>("introspector").unwrap().dt, 0.0);
}

#[test]
fn try_variants_report_errors() {
    let mut world = World::with_settings(&WorldSettings { max_entities: 2 });
    world.register_component::<ComponentA>();

    assert_eq!(
        world.try_register_component::<ComponentA>(),
        Err(EcsError::ComponentAlreadyRegistered("ComponentA"))
    );

    let entity = world.create_entity();
    assert_eq!(
        world.try_add_component(entity, ComponentB::default()),
        Err(EcsError::ComponentNotRegistered("ComponentB"))
    );

    world.add_component(entity, ComponentA::default());
    assert_eq!(
        world.try_add_component(entity, ComponentA::default()),
        Err(EcsError::DuplicateComponent {
            entity,
            component: "ComponentA"
        })
    );

    world.remove_component::<ComponentA>(entity);
    assert_eq!(
        world.try_remove_component::<ComponentA>(entity),
        Err(EcsError::MissingComponent {
            entity,
            component: "ComponentA"
        })
    );
    assert!(world.try_get_component::<ComponentA>(entity).is_err());

    assert_eq!(
        world.try_destroy_entity(Entity::new(3)),
        Err(EcsError::EntityOutOfRange {
            entity: Entity::new(3),
            max: 2
        })
    );
    assert_eq!(
        world.try_destroy_entity(Entity::new(2)),
        Err(EcsError::EntityNotAllocated(Entity::new(2)))
    );

    world.register_system::<Recorder>("rec", Signature::EMPTY);
    assert_eq!(
        world.try_register_system_with("rec", Signature::EMPTY, Recorder::default()),
        Err(EcsError::DuplicateSystem(String::from("rec")))
    );
}

#[test]
fn too_many_component_types() {
    macro_rules! filler {
        ($($name:ident)*) => {
            $(
                #[derive(Component)]
                struct $name;
            )*

            fn register_fillers(world: &mut World) {
                $(
                    world.register_component::<$name>();
                )*
            }
        };
    }

    filler! {
        F00 F01 F02 F03 F04 F05 F06 F07 F08 F09 F10 F11 F12 F13 F14 F15
        F16 F17 F18 F19 F20 F21 F22 F23 F24 F25 F26 F27 F28 F29 F30 F31
        F32 F33 F34 F35 F36 F37 F38 F39 F40 F41 F42 F43 F44 F45 F46 F47
        F48 F49 F50 F51 F52 F53 F54 F55 F56 F57 F58 F59 F60 F61 F62 F63
    }

    let mut world = World::new();
    register_fillers(&mut world);
    assert_eq!(world.components().len(), crate::MAX_COMPONENT_TYPES);
    assert_eq!(
        world.try_register_component::<ComponentA>(),
        Err(EcsError::TooManyComponentTypes {
            name: "ComponentA",
            max: crate::MAX_COMPONENT_TYPES
        })
    );
}

#[test]
#[should_panic]
fn unregistered_component_is_fatal() {
    let mut world = World::new();
    let entity = world.create_entity();
    world.add_component(entity, ComponentA::default());
}

#[test]
#[should_panic(expected = "component `ComponentA` added to Entity(1) twice")]
fn duplicate_component_is_fatal() {
    let mut world = registered_world(4);
    let entity = world.create_entity();
    world.add_component(entity, ComponentA::default());
    world.add_component(entity, ComponentA::default());
}

#[test]
#[should_panic]
fn missing_component_is_fatal() {
    let mut world = registered_world(4);
    let entity = world.create_entity();
    world.remove_component::<ComponentA>(entity);
}

#[test]
#[should_panic]
fn get_missing_component_is_fatal() {
    let mut world = registered_world(4);
    let entity = world.create_entity();
    world.get_component::<ComponentB>(entity);
}

#[test]
#[should_panic]
fn duplicate_registration_is_fatal() {
    let mut world = registered_world(4);
    world.register_component::<ComponentA>();
}

#[test]
#[should_panic]
fn destroying_out_of_range_entity_is_fatal() {
    let mut world = registered_world(4);
    world.destroy_entity(Entity::new(5));
}

#[test]
#[should_panic]
fn double_destroy_is_fatal() {
    let mut world = registered_world(4);
    let entity = world.create_entity();
    world.destroy_entity(entity);
    world.destroy_entity(entity);
}

#[test]
#[should_panic]
fn duplicate_system_is_fatal() {
    let mut world = registered_world(4);
    world.register_system::<Recorder>("rec", Signature::EMPTY);
    world.register_system::<Recorder>("rec", Signature::EMPTY);
}
