//! Action intake validation (spec §4.4).
//!
//! Namespace-format validity (check 1) is enforced by `Namespace::parse`
//! before a request ever reaches here; phase validity (check 2) is
//! enforced by the namespace actor, which only calls `validate_submission`
//! while it is in `Phase::Collect`. This module implements checks 3–9,
//! consulting only the frozen snapshot and the tick's in-progress
//! submission set — never live mutable state (spec §4.4, closing
//! sentence).

use std::collections::BTreeSet;

use monument_world::{ActorId, Intent, MAX_MESSAGE_LEN};

use crate::error::EngineError;
use crate::snapshot::FrozenSnapshot;

/// A validated action request body (spec §6: `POST /sim/{ns}/agent/{id}/action`).
#[derive(Debug, Clone)]
pub struct ActionSubmission {
    pub actor_id: ActorId,
    pub secret: String,
    pub supertick_id: u64,
    pub context_hash: String,
    pub intent: Intent,
    pub llm_input: Option<String>,
    pub llm_output: Option<String>,
}

/// Run checks 3–9 of spec §4.4 against `frozen`, the tick's frozen
/// snapshot. `submitted_this_tick` is the namespace actor's in-memory set
/// of actors that have already staged a journal row for this tick (check
/// 7's uniqueness, maintained by the single-consumer actor rather than
/// re-queried from the store on every submission).
pub fn validate_submission(
    frozen: &FrozenSnapshot,
    submitted_this_tick: &BTreeSet<ActorId>,
    sub: &ActionSubmission,
) -> Result<(), EngineError> {
    // 3. Actor exists and is non-eliminated.
    let actor = frozen
        .actor(&sub.actor_id)
        .filter(|a| a.is_active())
        .ok_or(EngineError::UnknownActor)?;

    // 4. Secret matches actor's credential.
    if actor.secret != sub.secret {
        return Err(EngineError::AuthFailed);
    }

    // 5. supertick_id equals current tick.
    if sub.supertick_id != frozen.supertick_id {
        return Err(EngineError::SupertickMismatch {
            submitted: sub.supertick_id,
            current: frozen.supertick_id,
        });
    }

    // 6. context_hash equals current context hash.
    if sub.context_hash != frozen.context_hash {
        return Err(EngineError::ContextHashMismatch);
    }

    // 7. No journal row exists for (supertick_id, actor_id).
    if submitted_this_tick.contains(&sub.actor_id) {
        return Err(EngineError::AlreadySubmitted);
    }

    // 8. Intent in actor's scopes.
    if !actor.permits(sub.intent.required_scope()) {
        return Err(EngineError::ScopeDenied);
    }

    // 9. Intent-specific parameter validation (spec §4.5).
    validate_intent_params(frozen, actor, &sub.intent)?;

    Ok(())
}

fn validate_intent_params(
    frozen: &FrozenSnapshot,
    actor: &monument_world::Actor,
    intent: &Intent,
) -> Result<(), EngineError> {
    match intent {
        Intent::Move { direction } => {
            let target = direction.apply(actor.position());
            if !frozen_in_bounds(frozen, target) {
                return Err(EngineError::MalformedAction(format!(
                    "MOVE target {target:?} is out of bounds"
                )));
            }
        }
        Intent::Paint { target, .. } => {
            let target = target.unwrap_or_else(|| actor.position());
            if !frozen_in_bounds(frozen, target) {
                return Err(EngineError::MalformedAction(format!(
                    "PAINT target {target:?} is out of bounds"
                )));
            }
        }
        Intent::Speak { message } => {
            if message.is_empty() {
                return Err(EngineError::MalformedAction("SPEAK message is empty".into()));
            }
            if message.len() > MAX_MESSAGE_LEN {
                return Err(EngineError::MalformedAction(format!(
                    "SPEAK message exceeds {MAX_MESSAGE_LEN} bytes"
                )));
            }
        }
        Intent::Wait | Intent::Skip => {}
    }
    Ok(())
}

fn frozen_in_bounds(frozen: &FrozenSnapshot, (x, y): monument_world::Coord) -> bool {
    x >= 0 && y >= 0 && (x as u32) < frozen.width && (y as u32) < frozen.height
}

#[cfg(test)]
mod tests {
    use super::*;
    use monument_world::{Actor, Direction, Scope, TileColor, Visibility, World};
    use std::collections::BTreeSet;

    fn frozen_with_actor(scopes: &[Scope]) -> (FrozenSnapshot, ActorId) {
        let mut world = World::new(4, 4, 1000, Visibility::FullGrid);
        let id = ActorId::new("a");
        world.insert_actor(Actor {
            id: id.clone(),
            secret: "s3cret".into(),
            x: 1,
            y: 1,
            facing: Direction::N,
            scopes: scopes.iter().copied().collect(),
            custom_instructions: String::new(),
            eliminated_at: None,
        });
        (FrozenSnapshot::freeze(&world), id)
    }

    fn base_submission(frozen: &FrozenSnapshot, actor_id: ActorId, intent: Intent) -> ActionSubmission {
        ActionSubmission {
            actor_id,
            secret: "s3cret".into(),
            supertick_id: frozen.supertick_id,
            context_hash: frozen.context_hash.clone(),
            intent,
            llm_input: None,
            llm_output: None,
        }
    }

    #[test]
    fn rejects_unknown_actor() {
        let (frozen, _) = frozen_with_actor(&[Scope::Wait]);
        let sub = base_submission(&frozen, ActorId::new("ghost"), Intent::Wait);
        assert!(matches!(
            validate_submission(&frozen, &BTreeSet::new(), &sub),
            Err(EngineError::UnknownActor)
        ));
    }

    #[test]
    fn rejects_wrong_secret() {
        let (frozen, id) = frozen_with_actor(&[Scope::Wait]);
        let mut sub = base_submission(&frozen, id, Intent::Wait);
        sub.secret = "nope".into();
        assert!(matches!(
            validate_submission(&frozen, &BTreeSet::new(), &sub),
            Err(EngineError::AuthFailed)
        ));
    }

    #[test]
    fn rejects_stale_supertick() {
        let (frozen, id) = frozen_with_actor(&[Scope::Wait]);
        let mut sub = base_submission(&frozen, id, Intent::Wait);
        sub.supertick_id += 1;
        assert!(matches!(
            validate_submission(&frozen, &BTreeSet::new(), &sub),
            Err(EngineError::SupertickMismatch { .. })
        ));
    }

    #[test]
    fn rejects_stale_context_hash() {
        let (frozen, id) = frozen_with_actor(&[Scope::Wait]);
        let mut sub = base_submission(&frozen, id, Intent::Wait);
        sub.context_hash = "stale".into();
        assert!(matches!(
            validate_submission(&frozen, &BTreeSet::new(), &sub),
            Err(EngineError::ContextHashMismatch)
        ));
    }

    #[test]
    fn rejects_duplicate_submission() {
        let (frozen, id) = frozen_with_actor(&[Scope::Wait]);
        let sub = base_submission(&frozen, id.clone(), Intent::Wait);
        let mut already = BTreeSet::new();
        already.insert(id);
        assert!(matches!(
            validate_submission(&frozen, &already, &sub),
            Err(EngineError::AlreadySubmitted)
        ));
    }

    #[test]
    fn rejects_out_of_scope_intent() {
        let (frozen, id) = frozen_with_actor(&[Scope::Speak, Scope::Wait, Scope::Skip]);
        let sub = base_submission(
            &frozen,
            id,
            Intent::Paint { color: TileColor::parse("#000000").unwrap(), target: None },
        );
        assert!(matches!(
            validate_submission(&frozen, &BTreeSet::new(), &sub),
            Err(EngineError::ScopeDenied)
        ));
    }

    #[test]
    fn rejects_out_of_bounds_move() {
        let (frozen, id) = frozen_with_actor(&[Scope::Move]);
        let sub = base_submission(&frozen, id, Intent::Move { direction: Direction::N });
        // actor sits at (1,1) with Move scope only; moving N stays in bounds,
        // so use an actor pinned at the edge instead.
        let mut world = World::new(4, 4, 1000, Visibility::FullGrid);
        let edge_id = ActorId::new("edge");
        world.insert_actor(Actor {
            id: edge_id.clone(),
            secret: "s3cret".into(),
            x: 0,
            y: 0,
            facing: Direction::N,
            scopes: [Scope::Move].into_iter().collect(),
            custom_instructions: String::new(),
            eliminated_at: None,
        });
        let frozen_edge = FrozenSnapshot::freeze(&world);
        let edge_sub = base_submission(&frozen_edge, edge_id, Intent::Move { direction: Direction::N });
        assert!(matches!(
            validate_submission(&frozen_edge, &BTreeSet::new(), &edge_sub),
            Err(EngineError::MalformedAction(_))
        ));
        // the in-bounds move for the original actor should pass validation
        assert!(validate_submission(&frozen, &BTreeSet::new(), &sub).is_ok());
    }

    #[test]
    fn rejects_empty_speak_message() {
        let (frozen, id) = frozen_with_actor(&[Scope::Speak]);
        let sub = base_submission(&frozen, id, Intent::Speak { message: String::new() });
        assert!(matches!(
            validate_submission(&frozen, &BTreeSet::new(), &sub),
            Err(EngineError::MalformedAction(_))
        ));
    }
}
