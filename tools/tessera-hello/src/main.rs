use std::time::{Duration, Instant};

use tessera::ecs::prelude::*;
use tessera::log::*;

/// Frames the demo runs before exiting.
const FRAMES: usize = 90;

const FRAME_TIME: Duration = Duration::from_micros(1_000_000 / 90);

#[derive(Component, Debug, Clone)]
struct TextComponent {
    text: String,
}

#[derive(Component, Debug, Default, Clone, Copy)]
struct MessageStatusComponent {
    printed: bool,
}

/// Prints the text of every message exactly once.
#[derive(Default)]
struct TerminalSystem;

impl System for TerminalSystem {
    fn update(&mut self, ctx: Context<'_>, _: f64) {
        for entity in ctx.entities {
            if ctx
                .world
                .get_component::<MessageStatusComponent>(*entity)
                .printed
            {
                continue;
            }

            println!("\n{}\n", ctx.world.get_component::<TextComponent>(*entity).text);
            ctx.world
                .get_component_mut::<MessageStatusComponent>(*entity)
                .printed = true;
        }
    }
}

fn main() {
    tessera::log::init(LevelFilter::Info);

    // An optional settings file may be passed as the first argument.
    let settings = match std::env::args().nth(1) {
        Some(path) => WorldSettings::load(&path).unwrap_or_else(|err| {
            warn!("using default world settings: {err}");
            WorldSettings::default()
        }),
        None => WorldSettings::default(),
    };

    let mut world = World::with_settings(&settings);
    world.register_component::<TextComponent>();
    world.register_component::<MessageStatusComponent>();

    let signature = world.make_signature::<(TextComponent, MessageStatusComponent)>();
    world.register_system::<TerminalSystem>("TerminalSystem", signature);

    let message = world.create_entity();
    world.add_component(
        message,
        TextComponent {
            text: String::from("Hello World!"),
        },
    );
    world.add_component(message, MessageStatusComponent::default());

    let mut last = Instant::now();
    for _ in 0..FRAMES {
        let now = Instant::now();
        let dt = now.duration_since(last).as_secs_f64();
        last = now;

        world.update_systems(dt);

        if let Some(remaining) = FRAME_TIME.checked_sub(now.elapsed()) {
            std::thread::sleep(remaining);
        }
    }

    info!("ran {FRAMES} frames with {} entities", world.entity_count());
}
