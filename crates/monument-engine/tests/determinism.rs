//! Determinism property test (spec §8): replaying the same journal
//! against the same initial `World` must resolve identically every time.

use std::collections::BTreeSet;

use chrono::Utc;
use monument_engine::resolve_tick;
use monument_world::{Actor, ActorId, Direction, Intent, JournalEntry, Scope, TileColor, Visibility, World};
use proptest::prelude::*;

const ACTOR_IDS: [&str; 5] = ["alice", "bob", "carol", "dave", "erin"];
const GRID: u32 = 6;
const COLORS: [&str; 3] = ["#FF0000", "#00FF00", "#0000FF"];

fn initial_world(actor_count: usize) -> World {
    let mut world = World::new(GRID, GRID, 1_000_000, Visibility::FullGrid);
    for (i, id) in ACTOR_IDS.iter().take(actor_count).enumerate() {
        world.insert_actor(Actor {
            id: ActorId::new(*id),
            secret: "s".into(),
            x: (i as i32) % (GRID as i32),
            y: (i as i32) / (GRID as i32),
            facing: Direction::N,
            scopes: BTreeSet::from([Scope::Move, Scope::Paint, Scope::Speak, Scope::Wait, Scope::Skip]),
            custom_instructions: String::new(),
            eliminated_at: None,
        });
    }
    world
}

fn intent_strategy() -> impl Strategy<Value = Intent> {
    prop_oneof![
        (0..4usize).prop_map(|i| Intent::Move {
            direction: [Direction::N, Direction::S, Direction::E, Direction::W][i],
        }),
        (0..3usize, 0..GRID as i32, 0..GRID as i32).prop_map(|(c, x, y)| Intent::Paint {
            color: TileColor::parse(COLORS[c]).unwrap(),
            target: Some((x, y)),
        }),
        Just(Intent::Wait),
        Just(Intent::Skip),
        "[a-z]{1,12}".prop_map(|message| Intent::Speak { message }),
    ]
}

fn journal_strategy(actor_count: usize) -> impl Strategy<Value = Vec<JournalEntry>> {
    let intents: Vec<_> = (0..actor_count).map(|_| intent_strategy()).collect();
    intents.prop_map(move |intents| {
        intents
            .into_iter()
            .enumerate()
            .map(|(i, intent)| {
                JournalEntry::pending(7, ActorId::new(ACTOR_IDS[i]), intent, Utc::now(), None, None)
            })
            .collect()
    })
}

fn scenario_strategy() -> impl Strategy<Value = (usize, Vec<JournalEntry>)> {
    (2usize..=5).prop_flat_map(|actor_count| {
        journal_strategy(actor_count).prop_map(move |entries| (actor_count, entries))
    })
}

proptest! {
    #[test]
    fn replaying_the_same_journal_resolves_identically(
        (actor_count, entries) in scenario_strategy(),
    ) {
        let world = initial_world(actor_count);

        let first = resolve_tick(&world, &entries, &[]);
        let second = resolve_tick(&world, &entries, &[]);

        prop_assert_eq!(first.effects.len(), second.effects.len());
        for (a, b) in first.effects.iter().zip(second.effects.iter()) {
            prop_assert_eq!(a, b);
        }

        // Applying both resolutions to a fresh copy of the world must
        // also leave tiles and actor positions byte-identical.
        let mut w1 = initial_world(actor_count);
        let mut w2 = initial_world(actor_count);
        apply(&mut w1, &first);
        apply(&mut w2, &second);
        prop_assert_eq!(w1.tiles().clone(), w2.tiles().clone());
        for id in ACTOR_IDS.iter().take(actor_count) {
            let id = ActorId::new(*id);
            prop_assert_eq!(w1.actor(&id).map(Actor::position), w2.actor(&id).map(Actor::position));
        }
    }
}

fn apply(world: &mut World, result: &monument_engine::MergeResult) {
    for effect in &result.effects {
        if let Some((target, color, _)) = effect.paint {
            world.set_tile(target, color);
        }
        if let Some((position, facing)) = effect.move_to {
            if let Some(actor) = world.actor_mut(&effect.actor_id) {
                actor.x = position.0;
                actor.y = position.1;
                actor.facing = facing;
            }
        }
    }
}
