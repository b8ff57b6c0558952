//! The per-namespace embedded relational store.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use monument_world::{
    Actor, ActorId, AuditRecord, ChatMessage, Coord, Intent, JournalEntry, JournalStatus,
    LastAdjudication, Namespace, Outcome, Phase, ScoringRound, TileColor, TileHistoryEntry,
    Visibility, World,
};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{info, warn};

use crate::convert::{
    actor_from_row, color_from_str, color_to_str, direction_from_str, direction_to_str,
    intent_from_json, intent_to_json, outcome_from_str, outcome_to_str, scopes_to_json,
    timestamp_from_str, timestamp_to_str,
};
use crate::error::StoreError;
use crate::schema::{SCHEMA_SQL, SCHEMA_VERSION};

/// Values used to initialize a namespace's `meta` row the first time its
/// store file is created. Ignored when reopening an existing store.
#[derive(Debug, Clone, Copy)]
pub struct NamespaceDefaults {
    pub width: u32,
    pub height: u32,
    pub epoch: u64,
    pub visibility: Visibility,
    pub points_enabled: bool,
}

/// A namespace's embedded relational store.
///
/// One `Store` exclusively owns one SQLite connection to one
/// `{namespace}.db` file under the configured data directory (spec §4.1).
pub struct Store {
    conn: Connection,
    namespace: Namespace,
}

fn visibility_to_str(v: Visibility) -> String {
    match v {
        Visibility::Radius(r) => format!("radius:{r}"),
        Visibility::FullGrid => "full_grid".to_string(),
    }
}

fn visibility_from_str(s: &str) -> Result<Visibility, StoreError> {
    if s == "full_grid" {
        return Ok(Visibility::FullGrid);
    }
    if let Some(rest) = s.strip_prefix("radius:") {
        return rest
            .parse::<u32>()
            .map(Visibility::Radius)
            .map_err(|_| StoreError::Corrupt(format!("visibility {s:?}")));
    }
    Err(StoreError::Corrupt(format!("visibility {s:?}")))
}

fn phase_to_str(p: Phase) -> &'static str {
    match p {
        Phase::Setup => "SETUP",
        Phase::Collect => "COLLECT",
        Phase::Merge => "MERGE",
        Phase::Broadcast => "BROADCAST",
        Phase::PausedForScoring => "PAUSED_FOR_SCORING",
        Phase::Paused => "PAUSED",
    }
}

fn phase_from_str(s: &str) -> Result<Phase, StoreError> {
    Ok(match s {
        "SETUP" => Phase::Setup,
        "COLLECT" => Phase::Collect,
        "MERGE" => Phase::Merge,
        "BROADCAST" => Phase::Broadcast,
        "PAUSED_FOR_SCORING" => Phase::PausedForScoring,
        "PAUSED" => Phase::Paused,
        other => return Err(StoreError::Corrupt(format!("phase {other:?}"))),
    })
}

fn journal_status_to_str(s: JournalStatus) -> &'static str {
    match s {
        JournalStatus::Pending => "pending",
        JournalStatus::Committed => "committed",
        JournalStatus::Rejected => "rejected",
    }
}

fn journal_status_from_str(s: &str) -> Result<JournalStatus, StoreError> {
    Ok(match s {
        "pending" => JournalStatus::Pending,
        "committed" => JournalStatus::Committed,
        "rejected" => JournalStatus::Rejected,
        other => return Err(StoreError::Corrupt(format!("journal status {other:?}"))),
    })
}

/// Classify a `rusqlite::Error` as [`StoreError::Busy`] when it represents
/// SQLite reporting the database locked past the busy timeout.
fn classify(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(e, _) = &err {
        if e.code == rusqlite::ErrorCode::DatabaseBusy {
            return StoreError::Busy;
        }
    }
    StoreError::Io(err)
}

impl Store {
    /// Path of the store file for `namespace` under `data_dir`. Always
    /// built from an already-validated [`Namespace`]; never from raw
    /// caller input.
    #[must_use]
    pub fn path_for(data_dir: &Path, namespace: &Namespace) -> PathBuf {
        data_dir.join(namespace.store_file_name())
    }

    /// Open (creating if necessary) the store file for `namespace`.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::SchemaMismatch`] if an existing store's
    /// `user_version` does not match [`SCHEMA_VERSION`], or
    /// [`StoreError::Io`]/[`StoreError::Busy`] on SQLite failures.
    pub fn open(
        data_dir: &Path,
        namespace: Namespace,
        busy_timeout: Duration,
        defaults: NamespaceDefaults,
    ) -> Result<Self, StoreError> {
        std::fs::create_dir_all(data_dir).map_err(|e| {
            StoreError::Corrupt(format!("could not create data dir {}: {e}", data_dir.display()))
        })?;
        let path = Self::path_for(data_dir, &namespace);
        let conn = Connection::open(&path).map_err(classify)?;

        conn.pragma_update(None, "journal_mode", "WAL")
            .map_err(classify)?;
        conn.pragma_update(None, "synchronous", "NORMAL")
            .map_err(classify)?;
        conn.pragma_update(None, "foreign_keys", "ON")
            .map_err(classify)?;
        conn.busy_timeout(busy_timeout).map_err(classify)?;

        let user_version: i64 = conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))
            .map_err(classify)?;

        if user_version == 0 {
            info!(namespace = %namespace, path = %path.display(), "initializing new namespace store");
            conn.execute_batch(SCHEMA_SQL).map_err(classify)?;
            conn.execute(
                "INSERT INTO meta (id, width, height, epoch, visibility, points_enabled) \
                 VALUES (0, ?1, ?2, ?3, ?4, ?5)",
                params![
                    defaults.width,
                    defaults.height,
                    defaults.epoch,
                    visibility_to_str(defaults.visibility),
                    defaults.points_enabled,
                ],
            )
            .map_err(classify)?;
            conn.pragma_update(None, "user_version", SCHEMA_VERSION)
                .map_err(classify)?;
        } else if user_version != SCHEMA_VERSION {
            warn!(
                namespace = %namespace,
                found = user_version,
                expected = SCHEMA_VERSION,
                "refusing namespace: schema version mismatch"
            );
            return Err(StoreError::SchemaMismatch {
                found: user_version,
                expected: SCHEMA_VERSION,
            });
        }

        Ok(Self { conn, namespace })
    }

    #[must_use]
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Reconstruct the full [`World`] from this namespace's tables
    /// (spec §4.2: the store is authoritative; `World` is its projection).
    pub fn load_world(&self) -> Result<World, StoreError> {
        let (width, height, epoch, visibility, goal, supertick_id, phase, points_enabled): (
            u32,
            u32,
            u64,
            String,
            String,
            u64,
            String,
            bool,
        ) = self
            .conn
            .query_row(
                "SELECT width, height, epoch, visibility, goal, supertick_id, phase, points_enabled \
                 FROM meta WHERE id = 0",
                [],
                |row| {
                    Ok((
                        row.get(0)?,
                        row.get(1)?,
                        row.get(2)?,
                        row.get(3)?,
                        row.get(4)?,
                        row.get(5)?,
                        row.get(6)?,
                        row.get(7)?,
                    ))
                },
            )
            .map_err(classify)?;

        let mut world = World::new(width, height, epoch, visibility_from_str(&visibility)?);
        world.set_supertick_id(supertick_id);
        world.set_phase(phase_from_str(&phase)?);
        world.set_goal(goal);
        world.set_points_enabled(points_enabled);

        let mut stmt = self.conn.prepare(
            "SELECT id, secret, x, y, facing, scopes, custom_instructions, eliminated_at FROM actors",
        ).map_err(classify)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, i32>(2)?,
                    row.get::<_, i32>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            })
            .map_err(classify)?;
        for row in rows {
            let (id, secret, x, y, facing, scopes, custom_instructions, eliminated_at) =
                row.map_err(classify)?;
            world.insert_actor(actor_from_row(
                id,
                secret,
                x,
                y,
                facing,
                scopes,
                custom_instructions,
                eliminated_at,
            )?);
        }
        drop(stmt);

        let mut stmt = self
            .conn
            .prepare("SELECT x, y, color FROM tiles")
            .map_err(classify)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, i32>(0)?,
                    row.get::<_, i32>(1)?,
                    row.get::<_, String>(2)?,
                ))
            })
            .map_err(classify)?;
        for row in rows {
            let (x, y, color) = row.map_err(classify)?;
            world.set_tile((x, y), color_from_str(&color)?);
        }
        drop(stmt);

        let last_round = self
            .conn
            .query_row(
                "SELECT supertick_id, rationale, feedback FROM scoring_round \
                 ORDER BY supertick_id DESC LIMIT 1",
                [],
                |row| {
                    Ok(LastAdjudication {
                        supertick_id: row.get(0)?,
                        rationale: row.get(1)?,
                        feedback: row.get(2)?,
                    })
                },
            )
            .optional()
            .map_err(classify)?;
        if let Some(adjudication) = last_round {
            world.set_last_adjudication(adjudication);
        }

        Ok(world)
    }

    /// Register a new actor (admin surface, spec §6 EXPANDED).
    pub fn insert_actor(&self, actor: &Actor) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO actors (id, secret, x, y, facing, scopes, custom_instructions, eliminated_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    actor.id.as_str(),
                    actor.secret,
                    actor.x,
                    actor.y,
                    direction_to_str(actor.facing),
                    scopes_to_json(&actor.scopes),
                    actor.custom_instructions,
                    actor.eliminated_at.map(timestamp_to_str),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    /// Mark an actor eliminated (admin surface, spec §9 open question).
    pub fn eliminate_actor(&self, id: &ActorId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.conn
            .execute(
                "UPDATE actors SET eliminated_at = ?1 WHERE id = ?2",
                params![timestamp_to_str(at), id.as_str()],
            )
            .map_err(classify)?;
        Ok(())
    }

    /// Stage a validated submission (spec §4.4: "the write is committed
    /// immediately", independent of the tick's later merge transaction).
    pub fn submit_journal_entry(&self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.conn
            .execute(
                "INSERT INTO journal \
                 (supertick_id, actor_id, intent, status, result, reason, submitted_at, llm_input, llm_output) \
                 VALUES (?1, ?2, ?3, ?4, NULL, NULL, ?5, ?6, ?7)",
                params![
                    entry.supertick_id as i64,
                    entry.actor_id.as_str(),
                    intent_to_json(&entry.intent),
                    journal_status_to_str(entry.status),
                    timestamp_to_str(entry.submitted_at),
                    entry.llm_input,
                    entry.llm_output,
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    /// `true` if a journal row already exists for `(supertick_id,
    /// actor_id)` — the uniqueness check in spec §4.4 step 7.
    pub fn journal_row_exists(&self, supertick_id: u64, actor_id: &ActorId) -> Result<bool, StoreError> {
        let count: i64 = self
            .conn
            .query_row(
                "SELECT COUNT(*) FROM journal WHERE supertick_id = ?1 AND actor_id = ?2",
                params![supertick_id as i64, actor_id.as_str()],
                |row| row.get(0),
            )
            .map_err(classify)?;
        Ok(count > 0)
    }

    /// Load every journal row staged for `supertick_id`.
    pub fn load_journal_for_tick(&self, supertick_id: u64) -> Result<Vec<JournalEntry>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT actor_id, intent, status, result, submitted_at, llm_input, llm_output \
                 FROM journal WHERE supertick_id = ?1",
            )
            .map_err(classify)?;
        let rows = stmt
            .query_map(params![supertick_id as i64], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, Option<String>>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, Option<String>>(6)?,
                ))
            })
            .map_err(classify)?;

        let mut out = Vec::new();
        for row in rows {
            let (actor_id, intent, status, result, submitted_at, llm_input, llm_output) =
                row.map_err(classify)?;
            out.push(JournalEntry {
                supertick_id,
                actor_id: ActorId::new(actor_id),
                intent: intent_from_json(&intent)?,
                status: journal_status_from_str(&status)?,
                result: result.map(|r| outcome_from_str(&r)).transpose()?,
                submitted_at: timestamp_from_str(&submitted_at)?,
                llm_input,
                llm_output,
            });
        }
        Ok(out)
    }

    /// The most recent audit row for `actor_id` at exactly `supertick_id`
    /// — the `LAST_TICK_RESULT` HUD section reads this for `supertick_id -
    /// 1` of the tick being presented (spec §4.7).
    pub fn audit_record_for(
        &self,
        supertick_id: u64,
        actor_id: &ActorId,
    ) -> Result<Option<AuditRecord>, StoreError> {
        self.conn
            .query_row(
                "SELECT actor_id, action_type, params, result, reason, context_hash, submitted_at \
                 FROM audit_log WHERE supertick_id = ?1 AND actor_id = ?2",
                params![supertick_id as i64, actor_id.as_str()],
                |row| {
                    Ok((
                        row.get::<_, String>(0)?,
                        row.get::<_, String>(1)?,
                        row.get::<_, String>(2)?,
                        row.get::<_, String>(3)?,
                        row.get::<_, Option<String>>(4)?,
                        row.get::<_, String>(5)?,
                        row.get::<_, String>(6)?,
                    ))
                },
            )
            .optional()
            .map_err(classify)?
            .map(|(actor_id, action_type, params, result, reason, context_hash, submitted_at)| {
                Ok(AuditRecord {
                    supertick_id,
                    actor_id: ActorId::new(actor_id),
                    action_type,
                    params,
                    result: outcome_from_str(&result)?,
                    reason,
                    context_hash,
                    submitted_at: timestamp_from_str(&submitted_at)?,
                })
            })
            .transpose()
    }

    /// Every audit row with `from <= supertick_id <= to`, ordered by tick
    /// then actor id — the tick-range audit export behind `GET
    /// /sim/{ns}/replay` (spec §6).
    pub fn audit_records_in_range(&self, from: u64, to: u64) -> Result<Vec<AuditRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT supertick_id, actor_id, action_type, params, result, reason, context_hash, submitted_at \
                 FROM audit_log WHERE supertick_id >= ?1 AND supertick_id <= ?2 \
                 ORDER BY supertick_id, actor_id",
            )
            .map_err(classify)?;
        let rows = stmt
            .query_map(params![from as i64, to as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, Option<String>>(5)?,
                    row.get::<_, String>(6)?,
                    row.get::<_, String>(7)?,
                ))
            })
            .map_err(classify)?;

        let mut out = Vec::new();
        for row in rows {
            let (supertick_id, actor_id, action_type, params, result, reason, context_hash, submitted_at) =
                row.map_err(classify)?;
            out.push(AuditRecord {
                supertick_id: supertick_id as u64,
                actor_id: ActorId::new(actor_id),
                action_type,
                params,
                result: outcome_from_str(&result)?,
                reason,
                context_hash,
                submitted_at: timestamp_from_str(&submitted_at)?,
            });
        }
        Ok(out)
    }

    /// The most recent `chat_log` rows, oldest first, bounded to `limit`
    /// — the `RECENT CHAT` HUD section (spec §4.7).
    pub fn recent_chat(&self, limit: usize) -> Result<Vec<ChatMessage>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT supertick_id, from_id, message, created_at FROM chat_log \
                 ORDER BY id DESC LIMIT ?1",
            )
            .map_err(classify)?;
        let rows = stmt
            .query_map(params![limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            })
            .map_err(classify)?;

        let mut out = Vec::new();
        for row in rows {
            let (supertick_id, from_id, message, created_at) = row.map_err(classify)?;
            out.push(ChatMessage {
                supertick_id: supertick_id as u64,
                from_id: ActorId::new(from_id),
                message,
                created_at: timestamp_from_str(&created_at)?,
            });
        }
        out.reverse();
        Ok(out)
    }

    /// The most recent `audit_log` rows for `actor_id` at or before
    /// `before_supertick`, oldest first, bounded to `limit` — the trailing
    /// tick-result history behind `history_length` on context fetch
    /// (spec §6's `GET .../context` query params).
    pub fn recent_tick_results(
        &self,
        actor_id: &ActorId,
        before_supertick: u64,
        limit: usize,
    ) -> Result<Vec<AuditRecord>, StoreError> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT supertick_id, action_type, params, result, reason, context_hash, submitted_at \
                 FROM audit_log WHERE actor_id = ?1 AND supertick_id < ?2 \
                 ORDER BY supertick_id DESC LIMIT ?3",
            )
            .map_err(classify)?;
        let rows = stmt
            .query_map(params![actor_id.as_str(), before_supertick as i64, limit as i64], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, Option<String>>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .map_err(classify)?;

        let mut out = Vec::new();
        for row in rows {
            let (supertick_id, action_type, params, result, reason, context_hash, submitted_at) =
                row.map_err(classify)?;
            out.push(AuditRecord {
                supertick_id: supertick_id as u64,
                actor_id: actor_id.clone(),
                action_type,
                params,
                result: outcome_from_str(&result)?,
                reason,
                context_hash,
                submitted_at: timestamp_from_str(&submitted_at)?,
            });
        }
        out.reverse();
        Ok(out)
    }

    /// Run `f` inside one atomic transaction — the unit-of-work primitive
    /// used by the merge/resolver to commit a whole tick's effects
    /// (spec §4.1, §4.6). On any `Err`, the transaction rolls back and no
    /// partial state is observable.
    pub fn unit_of_work<T, F>(&mut self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&mut TickTxn<'_>) -> Result<T, StoreError>,
    {
        let tx = self.conn.transaction().map_err(classify)?;
        let mut txn = TickTxn { tx: &tx };
        let result = f(&mut txn)?;
        tx.commit().map_err(classify)?;
        Ok(result)
    }

    /// Raise the namespace's auto-pause tick (spec §4.3: "PAUSED | epoch
    /// advanced | COLLECT"). Persists the new epoch outside the tick
    /// commit transaction — it is an operator action, not a merge effect.
    pub fn set_epoch(&self, epoch: u64) -> Result<(), StoreError> {
        self.conn
            .execute("UPDATE meta SET epoch = ?1 WHERE id = 0", params![epoch as i64])
            .map_err(classify)?;
        Ok(())
    }

    /// Mark the namespace poisoned after an `Internal` error escapes a
    /// tick commit (spec §7: fatal for that namespace).
    pub fn mark_poisoned(&self) -> Result<(), StoreError> {
        self.conn
            .execute("UPDATE meta SET poisoned = 1 WHERE id = 0", [])
            .map_err(classify)?;
        Ok(())
    }

    #[must_use]
    pub fn is_poisoned(&self) -> bool {
        self.conn
            .query_row("SELECT poisoned FROM meta WHERE id = 0", [], |row| {
                row.get::<_, i64>(0)
            })
            .map(|v| v != 0)
            .unwrap_or(false)
    }
}

/// A handle to the single transaction backing one tick's atomic commit.
///
/// Every method here is only ever called from inside
/// [`Store::unit_of_work`]; none of them commits on its own.
pub struct TickTxn<'a> {
    tx: &'a rusqlite::Transaction<'a>,
}

impl TickTxn<'_> {
    pub fn finalize_journal(
        &mut self,
        supertick_id: u64,
        actor_id: &ActorId,
        result: Outcome,
    ) -> Result<(), StoreError> {
        self.tx
            .execute(
                "UPDATE journal SET status = 'committed', result = ?1 \
                 WHERE supertick_id = ?2 AND actor_id = ?3",
                params![outcome_to_str(result), supertick_id as i64, actor_id.as_str()],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn insert_synthesized_journal(&mut self, entry: &JournalEntry) -> Result<(), StoreError> {
        self.tx
            .execute(
                "INSERT INTO journal (supertick_id, actor_id, intent, status, result, submitted_at) \
                 VALUES (?1, ?2, ?3, 'committed', ?4, ?5)",
                params![
                    entry.supertick_id as i64,
                    entry.actor_id.as_str(),
                    intent_to_json(&entry.intent),
                    entry.result.map(outcome_to_str),
                    timestamp_to_str(entry.submitted_at),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn append_audit(&mut self, record: &AuditRecord) -> Result<(), StoreError> {
        self.tx
            .execute(
                "INSERT INTO audit_log \
                 (supertick_id, actor_id, action_type, params, result, reason, context_hash, submitted_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    record.supertick_id as i64,
                    record.actor_id.as_str(),
                    record.action_type,
                    record.params,
                    outcome_to_str(record.result),
                    record.reason,
                    record.context_hash,
                    timestamp_to_str(record.submitted_at),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn append_tile_history(&mut self, entry: &TileHistoryEntry) -> Result<(), StoreError> {
        self.tx
            .execute(
                "INSERT INTO tile_history \
                 (x, y, supertick_id, actor_id, old_color, new_color, action_type, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                params![
                    entry.x,
                    entry.y,
                    entry.supertick_id as i64,
                    entry.actor_id.as_str(),
                    entry.old_color,
                    entry.new_color,
                    entry.action_type,
                    timestamp_to_str(entry.created_at),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn set_tile(&mut self, coord: Coord, color: TileColor) -> Result<(), StoreError> {
        self.tx
            .execute(
                "INSERT INTO tiles (x, y, color) VALUES (?1, ?2, ?3) \
                 ON CONFLICT(x, y) DO UPDATE SET color = excluded.color",
                params![coord.0, coord.1, color_to_str(color)],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn update_actor_position(
        &mut self,
        id: &ActorId,
        coord: Coord,
        facing: monument_world::Direction,
    ) -> Result<(), StoreError> {
        self.tx
            .execute(
                "UPDATE actors SET x = ?1, y = ?2, facing = ?3 WHERE id = ?4",
                params![coord.0, coord.1, direction_to_str(facing), id.as_str()],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn append_chat(&mut self, message: &ChatMessage) -> Result<(), StoreError> {
        self.tx
            .execute(
                "INSERT INTO chat_log (supertick_id, from_id, message, created_at) \
                 VALUES (?1, ?2, ?3, ?4)",
                params![
                    message.supertick_id as i64,
                    message.from_id.as_str(),
                    message.message,
                    timestamp_to_str(message.created_at),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn set_supertick_and_phase(&mut self, supertick_id: u64, phase: Phase) -> Result<(), StoreError> {
        self.tx
            .execute(
                "UPDATE meta SET supertick_id = ?1, phase = ?2 WHERE id = 0",
                params![supertick_id as i64, phase_to_str(phase)],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn set_phase(&mut self, phase: Phase) -> Result<(), StoreError> {
        self.tx
            .execute(
                "UPDATE meta SET phase = ?1 WHERE id = 0",
                params![phase_to_str(phase)],
            )
            .map_err(classify)?;
        Ok(())
    }

    /// Record a new free-text objective (spec §3: "goal: free-text
    /// objective set by adjudicator").
    pub fn set_goal(&mut self, goal: &str) -> Result<(), StoreError> {
        self.tx
            .execute("UPDATE meta SET goal = ?1 WHERE id = 0", params![goal])
            .map_err(classify)?;
        Ok(())
    }

    pub fn insert_scoring_round(&mut self, round: &ScoringRound) -> Result<(), StoreError> {
        let selected_tiles = serde_json::to_string(&round.selected_tiles)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        let contributions = serde_json::to_string(&round.contributions_by_actor)
            .map_err(|e| StoreError::Corrupt(e.to_string()))?;
        self.tx
            .execute(
                "INSERT INTO scoring_round \
                 (supertick_id, selected_tiles, contributions_by_actor, rationale, feedback, created_at) \
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![
                    round.supertick_id as i64,
                    selected_tiles,
                    contributions,
                    round.rationale,
                    round.feedback,
                    timestamp_to_str(round.created_at),
                ],
            )
            .map_err(classify)?;
        Ok(())
    }

    pub fn adjust_actor_points(&mut self, id: &ActorId, delta: i64) -> Result<(), StoreError> {
        self.tx
            .execute(
                "UPDATE actors SET points = points + ?1 WHERE id = ?2",
                params![delta, id.as_str()],
            )
            .map_err(classify)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use monument_world::Scope;
    use std::collections::BTreeSet;
    use tempfile::tempdir;

    fn defaults() -> NamespaceDefaults {
        NamespaceDefaults {
            width: 8,
            height: 8,
            epoch: 1000,
            visibility: Visibility::FullGrid,
            points_enabled: false,
        }
    }

    #[test]
    fn open_creates_store_with_fresh_meta_row() {
        let dir = tempdir().unwrap();
        let ns = Namespace::parse("arena").unwrap();
        let store = Store::open(dir.path(), ns, Duration::from_secs(1), defaults()).unwrap();
        let world = store.load_world().unwrap();
        assert_eq!(world.width(), 8);
        assert_eq!(world.height(), 8);
        assert_eq!(world.supertick_id(), 0);
        assert_eq!(world.phase(), Phase::Setup);
    }

    #[test]
    fn reopen_preserves_state_and_detects_matching_version() {
        let dir = tempdir().unwrap();
        let ns = Namespace::parse("arena").unwrap();
        {
            let store = Store::open(dir.path(), ns.clone(), Duration::from_secs(1), defaults()).unwrap();
            store
                .insert_actor(&Actor {
                    id: ActorId::new("a"),
                    secret: "s".into(),
                    x: 1,
                    y: 1,
                    facing: monument_world::Direction::N,
                    scopes: BTreeSet::from([Scope::Move, Scope::Wait]),
                    custom_instructions: String::new(),
                    eliminated_at: None,
                })
                .unwrap();
        }
        let store2 = Store::open(dir.path(), ns, Duration::from_secs(1), defaults()).unwrap();
        let world = store2.load_world().unwrap();
        assert_eq!(world.actors().len(), 1);
        assert!(world.actor(&ActorId::new("a")).unwrap().permits(Scope::Move));
    }

    #[test]
    fn reopen_with_wrong_version_is_refused() {
        let dir = tempdir().unwrap();
        let ns = Namespace::parse("arena").unwrap();
        {
            let _store = Store::open(dir.path(), ns.clone(), Duration::from_secs(1), defaults()).unwrap();
        }
        let path = Store::path_for(dir.path(), &ns);
        let conn = Connection::open(&path).unwrap();
        conn.pragma_update(None, "user_version", 99).unwrap();
        drop(conn);

        let err = Store::open(dir.path(), ns, Duration::from_secs(1), defaults()).unwrap_err();
        assert!(matches!(err, StoreError::SchemaMismatch { found: 99, .. }));
    }

    #[test]
    fn journal_uniqueness_is_enforced_by_the_primary_key() {
        let dir = tempdir().unwrap();
        let ns = Namespace::parse("arena").unwrap();
        let store = Store::open(dir.path(), ns, Duration::from_secs(1), defaults()).unwrap();
        let entry = JournalEntry::pending(1, ActorId::new("a"), Intent::Wait, Utc::now(), None, None);
        store.submit_journal_entry(&entry).unwrap();
        assert!(store.journal_row_exists(1, &ActorId::new("a")).unwrap());
        assert!(store.submit_journal_entry(&entry).is_err());
    }

    #[test]
    fn unit_of_work_rolls_back_on_error() {
        let dir = tempdir().unwrap();
        let ns = Namespace::parse("arena").unwrap();
        let mut store = Store::open(dir.path(), ns, Duration::from_secs(1), defaults()).unwrap();

        let red = TileColor::parse("#FF0000").unwrap();
        let result: Result<(), StoreError> = store.unit_of_work(|txn| {
            txn.set_tile((0, 0), red)?;
            Err(StoreError::Corrupt("forced rollback".into()))
        });
        assert!(result.is_err());

        let world = store.load_world().unwrap();
        assert_eq!(world.tile_at((0, 0)), None);
    }

    #[test]
    fn unit_of_work_commits_all_effects_together() {
        let dir = tempdir().unwrap();
        let ns = Namespace::parse("arena").unwrap();
        let mut store = Store::open(dir.path(), ns, Duration::from_secs(1), defaults()).unwrap();

        let red = TileColor::parse("#FF0000").unwrap();
        store
            .unit_of_work(|txn| {
                txn.set_tile((2, 2), red)?;
                txn.set_supertick_and_phase(1, Phase::Collect)?;
                Ok(())
            })
            .unwrap();

        let world = store.load_world().unwrap();
        assert_eq!(world.tile_at((2, 2)), Some(red));
        assert_eq!(world.supertick_id(), 1);
        assert_eq!(world.phase(), Phase::Collect);
    }

    #[test]
    fn set_epoch_persists_across_reopen() {
        let dir = tempdir().unwrap();
        let ns = Namespace::parse("arena").unwrap();
        {
            let store = Store::open(dir.path(), ns.clone(), Duration::from_secs(1), defaults()).unwrap();
            store.set_epoch(5_000).unwrap();
        }
        let store2 = Store::open(dir.path(), ns, Duration::from_secs(1), defaults()).unwrap();
        assert_eq!(store2.load_world().unwrap().epoch(), 5_000);
    }

    #[test]
    fn audit_records_in_range_is_bounded_and_ordered() {
        let dir = tempdir().unwrap();
        let ns = Namespace::parse("arena").unwrap();
        let mut store = Store::open(dir.path(), ns, Duration::from_secs(1), defaults()).unwrap();

        for tick in 1..=3u64 {
            store
                .unit_of_work(|txn| {
                    txn.append_audit(&AuditRecord {
                        supertick_id: tick,
                        actor_id: ActorId::new("b"),
                        action_type: "WAIT".into(),
                        params: "{}".into(),
                        result: Outcome::Success,
                        reason: None,
                        context_hash: "h".into(),
                        submitted_at: Utc::now(),
                    })?;
                    txn.append_audit(&AuditRecord {
                        supertick_id: tick,
                        actor_id: ActorId::new("a"),
                        action_type: "WAIT".into(),
                        params: "{}".into(),
                        result: Outcome::Success,
                        reason: None,
                        context_hash: "h".into(),
                        submitted_at: Utc::now(),
                    })?;
                    Ok(())
                })
                .unwrap();
        }

        let rows = store.audit_records_in_range(2, 3).unwrap();
        assert_eq!(rows.len(), 4);
        assert!(rows.iter().all(|r| r.supertick_id == 2 || r.supertick_id == 3));
        assert_eq!(rows[0].supertick_id, 2);
        assert_eq!(rows[0].actor_id.as_str(), "a");
        assert_eq!(rows[1].actor_id.as_str(), "b");
    }
}
