//! The namespace actor: a single-consumer Tokio task that owns one
//! namespace's `World`, `Store`, and `Phase`, serializing every mutating
//! operation through one inbound channel (spec §4.3, §9: "tick
//! serializer"). Modeled on this codebase's coordinator tick loop, which
//! likewise drains a pending-change queue once per tick before
//! recomputing state.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use monument_store::{NamespaceDefaults, Store};
use monument_world::{Actor, ActorId, AuditRecord, JournalEntry, Outcome, Phase, ScoringRound};
use tokio::sync::{broadcast, mpsc, oneshot, watch};
use tracing::{info, instrument, warn};

use crate::context::{build_hud, HudPayload};
use crate::error::EngineError;
use crate::merge::resolve_tick;
use crate::snapshot::FrozenSnapshot;
use crate::validator::{validate_submission, ActionSubmission};

/// Namespace-wide configuration the actor needs at startup and between
/// ticks (independent of any one request).
#[derive(Debug, Clone)]
pub struct NamespaceConfig {
    pub collect_timeout: Duration,
    pub scoring_interval: u64,
    pub chat_length: usize,
}

/// A discrete event fanned out to `WS /sim/{ns}/ws/live` subscribers
/// (spec §6). Fire-and-forget: a lagging or dropped receiver is simply
/// closed.
#[derive(Debug, Clone, serde::Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum NamespaceEvent {
    TickStarted { supertick_id: u64 },
    SubmissionReceived { actor_id: String },
    TickResolved { supertick_id: u64, outcomes: Vec<(String, Outcome)> },
    PausedForScoring { supertick_id: u64 },
    ScoringCommitted { supertick_id: u64 },
}

enum Message {
    RegisterActor { actor: Actor, reply: oneshot::Sender<Result<(), EngineError>> },
    EliminateActor { id: ActorId, reply: oneshot::Sender<Result<(), EngineError>> },
    Submit { submission: ActionSubmission, reply: oneshot::Sender<Result<(), EngineError>> },
    ForceAdvance { reply: oneshot::Sender<Result<(), EngineError>> },
    AdvanceEpoch { epoch: u64, reply: oneshot::Sender<Result<(), EngineError>> },
    SubmitScoring { round: ScoringRoundInput, reply: oneshot::Sender<Result<(), EngineError>> },
    FetchHud {
        actor_id: ActorId,
        chat_length: usize,
        history_length: usize,
        reply: oneshot::Sender<Result<HudPayload, EngineError>>,
    },
    Replay {
        from: u64,
        to: u64,
        reply: oneshot::Sender<Result<Vec<AuditRecord>, EngineError>>,
    },
}

/// The scoring-round payload submitted by the adjudicator (spec §4.8).
#[derive(Debug, Clone)]
pub struct ScoringRoundInput {
    pub selected_tiles: Vec<monument_world::Coord>,
    pub contributions_by_actor: std::collections::BTreeMap<ActorId, i64>,
    pub rationale: String,
    pub feedback: String,
    /// A new objective to set alongside this round, if the adjudicator
    /// chose to update it (spec §3).
    pub goal: Option<String>,
}

/// A cheaply cloneable handle to a running namespace actor. Mutating
/// calls round-trip through the actor's channel; `snapshot()` and
/// `subscribe()` never touch it.
#[derive(Clone)]
pub struct NamespaceHandle {
    tx: mpsc::Sender<Message>,
    snapshot_rx: watch::Receiver<Arc<FrozenSnapshot>>,
    events: broadcast::Sender<NamespaceEvent>,
}

impl NamespaceHandle {
    /// The frozen snapshot published at the start of the namespace's
    /// current COLLECT. Never blocks on the actor's channel (spec §5).
    #[must_use]
    pub fn snapshot(&self) -> Arc<FrozenSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<NamespaceEvent> {
        self.events.subscribe()
    }

    pub async fn register_actor(&self, actor: Actor) -> Result<(), EngineError> {
        self.call(|reply| Message::RegisterActor { actor, reply }).await
    }

    pub async fn eliminate_actor(&self, id: ActorId) -> Result<(), EngineError> {
        self.call(|reply| Message::EliminateActor { id, reply }).await
    }

    pub async fn submit_action(&self, submission: ActionSubmission) -> Result<(), EngineError> {
        self.call(|reply| Message::Submit { submission, reply }).await
    }

    pub async fn force_advance(&self) -> Result<(), EngineError> {
        self.call(|reply| Message::ForceAdvance { reply }).await
    }

    /// Raise the namespace's auto-pause tick and, if it is currently
    /// `PAUSED`, resume it into `COLLECT` (spec §4.3: "PAUSED | epoch
    /// advanced | COLLECT").
    pub async fn advance_epoch(&self, epoch: u64) -> Result<(), EngineError> {
        self.call(|reply| Message::AdvanceEpoch { epoch, reply }).await
    }

    pub async fn submit_scoring(&self, round: ScoringRoundInput) -> Result<(), EngineError> {
        self.call(|reply| Message::SubmitScoring { round, reply }).await
    }

    pub async fn fetch_hud(
        &self,
        actor_id: ActorId,
        chat_length: usize,
        history_length: usize,
    ) -> Result<HudPayload, EngineError> {
        self.call(|reply| Message::FetchHud { actor_id, chat_length, history_length, reply }).await
    }

    /// The tick-range audit export behind `GET /sim/{ns}/replay` (spec §6).
    pub async fn replay(&self, from: u64, to: u64) -> Result<Vec<AuditRecord>, EngineError> {
        self.call(|reply| Message::Replay { from, to, reply }).await
    }

    async fn call<T>(&self, build: impl FnOnce(oneshot::Sender<Result<T, EngineError>>) -> Message) -> Result<T, EngineError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.tx
            .send(build(reply_tx))
            .await
            .map_err(|_| EngineError::Internal("namespace actor is gone".into()))?;
        reply_rx
            .await
            .map_err(|_| EngineError::Internal("namespace actor dropped the reply".into()))?
    }
}

/// Spawn a namespace actor owning `store` and return a handle to it.
pub fn spawn(namespace: String, mut store: Store, config: NamespaceConfig) -> NamespaceHandle {
    let mut world = store.load_world().expect("store was just opened successfully");
    if world.phase() == Phase::Setup {
        // SETUP -> COLLECT on engine start (spec §4.3): a namespace whose
        // store was just created has never run a tick loop before.
        store
            .unit_of_work(|txn| txn.set_phase(Phase::Collect))
            .expect("initial SETUP->COLLECT transition");
        world.set_phase(Phase::Collect);
    }
    let frozen = Arc::new(FrozenSnapshot::freeze(&world));
    let (snapshot_tx, snapshot_rx) = watch::channel(frozen);
    let (events, _) = broadcast::channel(256);
    let (tx, rx) = mpsc::channel(256);

    let actor = NamespaceActor {
        namespace,
        store,
        world,
        config,
        submitted_this_tick: BTreeSet::new(),
        snapshot_tx,
        events: events.clone(),
        rx,
    };
    tokio::spawn(actor.run());

    NamespaceHandle { tx, snapshot_rx, events }
}

struct NamespaceActor {
    namespace: String,
    store: Store,
    world: monument_world::World,
    config: NamespaceConfig,
    submitted_this_tick: BTreeSet<ActorId>,
    snapshot_tx: watch::Sender<Arc<FrozenSnapshot>>,
    events: broadcast::Sender<NamespaceEvent>,
    rx: mpsc::Receiver<Message>,
}

impl NamespaceActor {
    #[instrument(skip(self), fields(namespace = %self.namespace))]
    async fn run(mut self) {
        self.events.send(NamespaceEvent::TickStarted { supertick_id: self.world.supertick_id() }).ok();
        loop {
            let deadline = tokio::time::sleep(self.config.collect_timeout);
            tokio::pin!(deadline);

            tokio::select! {
                maybe_msg = self.rx.recv() => {
                    let Some(msg) = maybe_msg else {
                        info!(namespace = %self.namespace, "namespace actor channel closed, shutting down");
                        return;
                    };
                    self.handle(msg);
                }
                () = &mut deadline, if self.world.phase() == Phase::Collect => {
                    info!(namespace = %self.namespace, supertick = self.world.supertick_id(), "collect deadline elapsed");
                    if let Err(e) = self.advance_tick() {
                        warn!(namespace = %self.namespace, error = %e, "tick advance failed on deadline");
                    }
                }
            }
        }
    }

    fn handle(&mut self, msg: Message) {
        match msg {
            Message::RegisterActor { actor, reply } => {
                let result = self.register_actor(actor);
                reply.send(result).ok();
            }
            Message::EliminateActor { id, reply } => {
                let result = self.eliminate_actor(id);
                reply.send(result).ok();
            }
            Message::Submit { submission, reply } => {
                let result = self.submit(submission);
                reply.send(result).ok();
            }
            Message::ForceAdvance { reply } => {
                let result = self.advance_tick();
                reply.send(result).ok();
            }
            Message::AdvanceEpoch { epoch, reply } => {
                let result = self.advance_epoch(epoch);
                reply.send(result).ok();
            }
            Message::SubmitScoring { round, reply } => {
                let result = self.submit_scoring(round);
                reply.send(result).ok();
            }
            Message::FetchHud { actor_id, chat_length, history_length, reply } => {
                let frozen = self.snapshot_tx.borrow().clone();
                let result =
                    build_hud(&self.namespace, &frozen, &self.store, &actor_id, chat_length, history_length);
                reply.send(result).ok();
            }
            Message::Replay { from, to, reply } => {
                let result = self.store.audit_records_in_range(from, to).map_err(EngineError::from);
                reply.send(result).ok();
            }
        }
    }

    fn register_actor(&mut self, actor: Actor) -> Result<(), EngineError> {
        self.store.insert_actor(&actor)?;
        self.world.insert_actor(actor);
        self.publish_snapshot();
        Ok(())
    }

    fn eliminate_actor(&mut self, id: ActorId) -> Result<(), EngineError> {
        let now = Utc::now();
        self.store.eliminate_actor(&id, now)?;
        if let Some(actor) = self.world.actor_mut(&id) {
            actor.eliminated_at = Some(now);
        }
        self.publish_snapshot();
        Ok(())
    }

    fn submit(&mut self, submission: ActionSubmission) -> Result<(), EngineError> {
        if self.world.phase() != Phase::Collect {
            return Err(EngineError::PhaseMismatch);
        }
        let frozen = self.snapshot_tx.borrow().clone();
        validate_submission(&frozen, &self.submitted_this_tick, &submission)?;

        let entry = JournalEntry::pending(
            submission.supertick_id,
            submission.actor_id.clone(),
            submission.intent,
            Utc::now(),
            submission.llm_input,
            submission.llm_output,
        );
        self.store.submit_journal_entry(&entry)?;
        self.submitted_this_tick.insert(submission.actor_id.clone());
        self.events
            .send(NamespaceEvent::SubmissionReceived { actor_id: submission.actor_id.to_string() })
            .ok();

        if self.all_active_actors_submitted() {
            self.advance_tick()?;
        }
        Ok(())
    }

    fn all_active_actors_submitted(&self) -> bool {
        self.world
            .active_actor_ids()
            .all(|id| self.submitted_this_tick.contains(id))
    }

    /// SNAPSHOT→MERGE→BROADCAST for the current tick (spec §4.3, §4.6).
    fn advance_tick(&mut self) -> Result<(), EngineError> {
        let supertick_id = self.world.supertick_id();
        let active: Vec<ActorId> = self.world.active_actor_ids().cloned().collect();
        let timed_out: Vec<ActorId> = active
            .iter()
            .filter(|id| !self.submitted_this_tick.contains(id))
            .cloned()
            .collect();

        let now = Utc::now();
        let timeout_entries: Vec<JournalEntry> = timed_out
            .iter()
            .map(|id| JournalEntry::synthesize_timeout(supertick_id, id.clone(), now))
            .collect();

        let submitted = self.store.load_journal_for_tick(supertick_id)?;
        let submitted: Vec<JournalEntry> = submitted
            .into_iter()
            .filter(|e| !timed_out.contains(&e.actor_id))
            .collect();

        let merge_result = resolve_tick(&self.world, &submitted, &timed_out);

        let result = self.store.unit_of_work(|txn| {
            for entry in &timeout_entries {
                txn.insert_synthesized_journal(entry)?;
            }
            for effect in &merge_result.effects {
                txn.finalize_journal(supertick_id, &effect.actor_id, effect.outcome)?;

                if let Some((target, color, previous)) = effect.paint {
                    txn.set_tile(target, color)?;
                    txn.append_tile_history(&monument_world::TileHistoryEntry {
                        x: target.0,
                        y: target.1,
                        supertick_id,
                        actor_id: effect.actor_id.clone(),
                        old_color: previous.map(|c| c.to_hex()),
                        new_color: color.to_hex(),
                        action_type: effect.intent.type_name().to_string(),
                        created_at: now,
                    })?;
                }

                if let Some((position, facing)) = effect.move_to {
                    txn.update_actor_position(&effect.actor_id, position, facing)?;
                }

                if let Some(message) = &effect.speak {
                    txn.append_chat(&monument_world::ChatMessage {
                        supertick_id,
                        from_id: effect.actor_id.clone(),
                        message: message.clone(),
                        created_at: now,
                    })?;
                }

                txn.append_audit(&monument_world::AuditRecord {
                    supertick_id,
                    actor_id: effect.actor_id.clone(),
                    action_type: effect.intent.type_name().to_string(),
                    params: serde_json::to_string(&effect.intent).unwrap_or_default(),
                    result: effect.outcome,
                    reason: effect.reason.clone(),
                    context_hash: self.snapshot_tx.borrow().context_hash.clone(),
                    submitted_at: now,
                })?;
            }
            txn.set_supertick_and_phase(supertick_id + 1, Phase::Collect)?;
            Ok(())
        });

        if let Err(e) = result {
            let engine_err = EngineError::from(e);
            if engine_err.is_fatal() {
                self.store.mark_poisoned().ok();
            }
            return Err(engine_err);
        }

        for effect in &merge_result.effects {
            if let Some((position, facing)) = effect.move_to {
                if let Some(actor) = self.world.actor_mut(&effect.actor_id) {
                    actor.x = position.0;
                    actor.y = position.1;
                    actor.facing = facing;
                }
            }
            if let Some((target, color, _)) = effect.paint {
                self.world.set_tile(target, color);
            }
        }
        self.world.set_supertick_id(supertick_id + 1);
        self.submitted_this_tick.clear();

        self.events
            .send(NamespaceEvent::TickResolved {
                supertick_id,
                outcomes: merge_result
                    .effects
                    .iter()
                    .map(|e| (e.actor_id.to_string(), e.outcome))
                    .collect(),
            })
            .ok();

        let next_tick = supertick_id + 1;
        if self.config.scoring_interval > 0 && next_tick > 0 && next_tick % self.config.scoring_interval == 0 {
            self.world.set_phase(Phase::PausedForScoring);
            self.store.unit_of_work(|txn| txn.set_phase(Phase::PausedForScoring))?;
            self.events.send(NamespaceEvent::PausedForScoring { supertick_id: next_tick }).ok();
        } else if next_tick >= self.world.epoch() {
            self.world.set_phase(Phase::Paused);
            self.store.unit_of_work(|txn| txn.set_phase(Phase::Paused))?;
        } else {
            self.events.send(NamespaceEvent::TickStarted { supertick_id: next_tick }).ok();
        }

        self.publish_snapshot();
        Ok(())
    }

    /// Raise `epoch` and, if the namespace is currently `PAUSED` on the
    /// epoch boundary, resume it into `COLLECT` (spec §4.3).
    fn advance_epoch(&mut self, epoch: u64) -> Result<(), EngineError> {
        self.store.set_epoch(epoch)?;
        self.world.set_epoch(epoch);

        if self.world.phase() == Phase::Paused && self.world.supertick_id() < epoch {
            self.store.unit_of_work(|txn| txn.set_phase(Phase::Collect))?;
            self.world.set_phase(Phase::Collect);
            self.submitted_this_tick.clear();
            self.publish_snapshot();
            self.events
                .send(NamespaceEvent::TickStarted { supertick_id: self.world.supertick_id() })
                .ok();
        }
        Ok(())
    }

    fn submit_scoring(&mut self, round: ScoringRoundInput) -> Result<(), EngineError> {
        if self.world.phase() != Phase::PausedForScoring {
            return Err(EngineError::PhaseMismatch);
        }

        let scoring_round = ScoringRound {
            supertick_id: self.world.supertick_id(),
            selected_tiles: round.selected_tiles,
            contributions_by_actor: round.contributions_by_actor.clone(),
            rationale: round.rationale,
            feedback: round.feedback,
            created_at: Utc::now(),
        };

        let points_enabled = self.world.points_enabled();
        self.store.unit_of_work(|txn| {
            txn.insert_scoring_round(&scoring_round)?;
            if points_enabled {
                for (actor_id, delta) in &round.contributions_by_actor {
                    txn.adjust_actor_points(actor_id, *delta)?;
                }
            }
            if let Some(goal) = &round.goal {
                txn.set_goal(goal)?;
            }
            txn.set_phase(Phase::Collect)?;
            Ok(())
        })?;

        self.world.set_last_adjudication(monument_world::LastAdjudication::from(&scoring_round));
        if let Some(goal) = round.goal {
            self.world.set_goal(goal);
        }
        self.world.set_phase(Phase::Collect);
        self.publish_snapshot();
        self.events
            .send(NamespaceEvent::ScoringCommitted { supertick_id: scoring_round.supertick_id })
            .ok();
        Ok(())
    }

    fn publish_snapshot(&self) {
        self.snapshot_tx.send_replace(Arc::new(FrozenSnapshot::freeze(&self.world)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monument_world::{Direction, Scope, Visibility};
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn defaults(epoch: u64) -> NamespaceDefaults {
        NamespaceDefaults {
            width: 4,
            height: 4,
            epoch,
            visibility: Visibility::FullGrid,
            points_enabled: false,
        }
    }

    fn config() -> NamespaceConfig {
        NamespaceConfig {
            collect_timeout: Duration::from_secs(30),
            scoring_interval: 0,
            chat_length: 10,
        }
    }

    #[tokio::test]
    async fn spawning_a_fresh_namespace_starts_in_collect() {
        let dir = tempdir().unwrap();
        let ns = monument_world::Namespace::parse("arena").unwrap();
        let store = Store::open(dir.path(), ns, Duration::from_secs(1), defaults(1_000)).unwrap();
        let handle = spawn("arena".to_string(), store, config());

        // A brand-new store's `meta.phase` defaults to SETUP; `spawn` must
        // drive the SETUP->COLLECT transition on engine start (spec §4.3)
        // or no actor could ever submit an action.
        assert_eq!(handle.snapshot().phase, Phase::Collect);
    }

    #[tokio::test]
    async fn advancing_epoch_resumes_a_paused_namespace() {
        let dir = tempdir().unwrap();
        let ns = monument_world::Namespace::parse("arena").unwrap();
        let store = Store::open(dir.path(), ns, Duration::from_secs(1), defaults(1)).unwrap();
        let handle = spawn("arena".to_string(), store, config());

        handle
            .register_actor(Actor {
                id: ActorId::new("solo"),
                secret: "s".into(),
                x: 0,
                y: 0,
                facing: Direction::N,
                scopes: BTreeSet::from([Scope::Wait]),
                custom_instructions: String::new(),
                eliminated_at: None,
            })
            .await
            .unwrap();

        let frozen = handle.snapshot();
        handle
            .submit_action(ActionSubmission {
                actor_id: ActorId::new("solo"),
                secret: "s".into(),
                supertick_id: frozen.supertick_id,
                context_hash: frozen.context_hash.clone(),
                intent: monument_world::Intent::Wait,
                llm_input: None,
                llm_output: None,
            })
            .await
            .unwrap();

        // epoch was 1: the lone tick commit pushed supertick_id to 1, so
        // the namespace auto-paused instead of starting tick 1's COLLECT.
        assert_eq!(handle.snapshot().phase, Phase::Paused);

        handle.advance_epoch(100).await.unwrap();
        assert_eq!(handle.snapshot().phase, Phase::Collect);
        assert_eq!(handle.snapshot().supertick_id, 1);
    }
}
