//! The merge/resolver: deterministic conflict resolution over one tick's
//! journal rows, executed once per tick (spec §4.6).
//!
//! `resolve_tick` is a pure function over an immutable `&World` — it
//! decides outcomes and describes their effects without mutating
//! anything. The namespace actor applies the returned effects inside one
//! `Store::unit_of_work` transaction, keeping resolution itself trivially
//! unit-testable and deterministic.

use std::collections::BTreeMap;

use monument_world::{ActorId, Coord, Direction, Intent, JournalEntry, Outcome, TileColor, World};

/// `(supertick_id, actor_id)` under lexicographic ordering of `actor_id`
/// (spec §4.6, §9: "priority as a tagged tuple"). `supertick_id` is
/// retained even though it is constant within one merge, so the rule
/// stays stable if it is ever extended to span ticks.
#[must_use]
pub fn priority_key(supertick_id: u64, actor_id: &ActorId) -> (u64, &str) {
    (supertick_id, actor_id.as_str())
}

/// The resolved effect of one actor's journal row for this tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ActorEffect {
    pub actor_id: ActorId,
    pub intent: Intent,
    pub outcome: Outcome,
    pub reason: Option<String>,
    /// Set iff a `MOVE` succeeded: new position and facing.
    pub move_to: Option<(Coord, Direction)>,
    /// Set iff a `PAINT` succeeded: tile, new color, previous color.
    pub paint: Option<(Coord, TileColor, Option<TileColor>)>,
    /// Set iff a `SPEAK` succeeded: the message to append to chat_log.
    pub speak: Option<String>,
}

impl ActorEffect {
    fn plain(actor_id: ActorId, intent: Intent, outcome: Outcome, reason: Option<&str>) -> Self {
        Self {
            actor_id,
            intent,
            outcome,
            reason: reason.map(str::to_string),
            move_to: None,
            paint: None,
            speak: None,
        }
    }
}

/// The full resolution of one tick: one effect per actor that had a
/// journal row (submitted or timed out), per spec §4.6's completeness
/// requirement.
#[derive(Debug, Clone, Default)]
pub struct MergeResult {
    pub effects: Vec<ActorEffect>,
}

/// Resolve tick `world.supertick_id()` given its submitted journal rows
/// plus the ids the namespace actor synthesized `TIMEOUT` rows for.
#[must_use]
pub fn resolve_tick(world: &World, submitted: &[JournalEntry], timed_out: &[ActorId]) -> MergeResult {
    let mut effects = Vec::with_capacity(submitted.len() + timed_out.len());

    for actor_id in timed_out {
        effects.push(ActorEffect::plain(
            actor_id.clone(),
            Intent::Wait,
            Outcome::Timeout,
            None,
        ));
    }

    let moves: Vec<&JournalEntry> = submitted
        .iter()
        .filter(|e| matches!(e.intent, Intent::Move { .. }))
        .collect();
    effects.extend(resolve_moves(world, &moves));

    let paints: Vec<&JournalEntry> = submitted
        .iter()
        .filter(|e| matches!(e.intent, Intent::Paint { .. }))
        .collect();
    effects.extend(resolve_paints(world, &paints));

    for entry in submitted {
        match &entry.intent {
            Intent::Move { .. } | Intent::Paint { .. } => {}
            Intent::Speak { message } => effects.push(ActorEffect {
                actor_id: entry.actor_id.clone(),
                intent: entry.intent.clone(),
                outcome: Outcome::Success,
                reason: None,
                move_to: None,
                paint: None,
                speak: Some(message.clone()),
            }),
            Intent::Wait => effects.push(ActorEffect::plain(
                entry.actor_id.clone(),
                Intent::Wait,
                Outcome::Success,
                None,
            )),
            Intent::Skip => effects.push(ActorEffect::plain(
                entry.actor_id.clone(),
                Intent::Skip,
                Outcome::Success,
                None,
            )),
        }
    }

    MergeResult { effects }
}

fn resolve_moves(world: &World, moves: &[&JournalEntry]) -> Vec<ActorEffect> {
    let mut by_target: BTreeMap<Coord, Vec<&JournalEntry>> = BTreeMap::new();
    for entry in moves {
        let Intent::Move { direction } = &entry.intent else { continue };
        let actor = match world.actor(&entry.actor_id) {
            Some(a) => a,
            None => continue,
        };
        let target = direction.apply(actor.position());
        by_target.entry(target).or_default().push(*entry);
    }

    let mut out = Vec::new();
    for (target, contenders) in by_target {
        if let Some(occupant_id) = world.actor_at(target) {
            let occupied_by_mover = contenders.iter().any(|e| &e.actor_id == occupant_id);
            if !occupied_by_mover {
                for entry in contenders {
                    out.push(ActorEffect::plain(
                        entry.actor_id.clone(),
                        entry.intent.clone(),
                        Outcome::ConflictLost,
                        Some("target cell occupied in S(n)"),
                    ));
                }
                continue;
            }
        }

        let winner = contenders
            .iter()
            .min_by_key(|e| priority_key(e.supertick_id, &e.actor_id))
            .expect("bucket is non-empty");

        for entry in &contenders {
            if entry.actor_id == winner.actor_id {
                let Intent::Move { direction } = &entry.intent else { unreachable!() };
                let facing = *direction;
                out.push(ActorEffect {
                    actor_id: entry.actor_id.clone(),
                    intent: entry.intent.clone(),
                    outcome: Outcome::Success,
                    reason: None,
                    move_to: Some((target, facing)),
                    paint: None,
                    speak: None,
                });
            } else {
                out.push(ActorEffect::plain(
                    entry.actor_id.clone(),
                    entry.intent.clone(),
                    Outcome::ConflictLost,
                    Some("destination collision"),
                ));
            }
        }
    }
    out
}

fn resolve_paints(world: &World, paints: &[&JournalEntry]) -> Vec<ActorEffect> {
    let mut by_target: BTreeMap<Coord, Vec<&JournalEntry>> = BTreeMap::new();
    for entry in paints {
        let Intent::Paint { target, .. } = &entry.intent else { continue };
        let actor = match world.actor(&entry.actor_id) {
            Some(a) => a,
            None => continue,
        };
        let target = target.unwrap_or_else(|| actor.position());
        by_target.entry(target).or_default().push(*entry);
    }

    let mut out = Vec::new();
    for (target, contenders) in by_target {
        let winner = contenders
            .iter()
            .min_by_key(|e| priority_key(e.supertick_id, &e.actor_id))
            .expect("bucket is non-empty");

        for entry in &contenders {
            if entry.actor_id != winner.actor_id {
                out.push(ActorEffect::plain(
                    entry.actor_id.clone(),
                    entry.intent.clone(),
                    Outcome::ConflictLost,
                    Some("paint collision"),
                ));
                continue;
            }

            let Intent::Paint { color, .. } = &entry.intent else { unreachable!() };
            let color = *color;
            let previous = world.tile_at(target);
            if previous == Some(color) {
                out.push(ActorEffect::plain(
                    entry.actor_id.clone(),
                    entry.intent.clone(),
                    Outcome::NoOp,
                    None,
                ));
            } else {
                out.push(ActorEffect {
                    actor_id: entry.actor_id.clone(),
                    intent: entry.intent.clone(),
                    outcome: Outcome::Success,
                    reason: None,
                    move_to: None,
                    paint: Some((target, color, previous)),
                    speak: None,
                });
            }
        }
    }
    out
}
