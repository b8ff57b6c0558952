//! The fixed, versioned schema script.
//!
//! Monument does not migrate schemas: a store whose `user_version` does
//! not match [`SCHEMA_VERSION`] is refused at open time (spec §4.1).
//! Bumping this constant is a breaking change for existing namespace
//! files.

/// The schema version this build of the server expects.
pub const SCHEMA_VERSION: i64 = 1;

/// DDL executed once, the first time a namespace's store file is created.
pub const SCHEMA_SQL: &str = r"
CREATE TABLE meta (
    id               INTEGER PRIMARY KEY CHECK (id = 0),
    width            INTEGER NOT NULL,
    height           INTEGER NOT NULL,
    epoch            INTEGER NOT NULL,
    visibility       TEXT NOT NULL,
    goal             TEXT NOT NULL DEFAULT '',
    supertick_id     INTEGER NOT NULL DEFAULT 0,
    phase            TEXT NOT NULL DEFAULT 'SETUP',
    points_enabled   INTEGER NOT NULL DEFAULT 0,
    poisoned         INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE actors (
    id                   TEXT PRIMARY KEY,
    secret               TEXT NOT NULL,
    x                    INTEGER NOT NULL,
    y                    INTEGER NOT NULL,
    facing               TEXT NOT NULL,
    scopes               TEXT NOT NULL,
    custom_instructions  TEXT NOT NULL DEFAULT '',
    points               INTEGER NOT NULL DEFAULT 0,
    eliminated_at        TEXT
);

CREATE TABLE tiles (
    x       INTEGER NOT NULL,
    y       INTEGER NOT NULL,
    color   TEXT NOT NULL,
    PRIMARY KEY (x, y)
);

CREATE TABLE tile_history (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    x              INTEGER NOT NULL,
    y              INTEGER NOT NULL,
    supertick_id   INTEGER NOT NULL,
    actor_id       TEXT NOT NULL,
    old_color      TEXT,
    new_color      TEXT NOT NULL,
    action_type    TEXT NOT NULL,
    created_at     TEXT NOT NULL
);
CREATE INDEX idx_tile_history_coord ON tile_history(x, y, supertick_id);
CREATE INDEX idx_tile_history_tick ON tile_history(supertick_id);

CREATE TABLE journal (
    supertick_id   INTEGER NOT NULL,
    actor_id       TEXT NOT NULL,
    intent         TEXT NOT NULL,
    status         TEXT NOT NULL,
    result         TEXT,
    reason         TEXT,
    submitted_at   TEXT NOT NULL,
    llm_input      TEXT,
    llm_output     TEXT,
    PRIMARY KEY (supertick_id, actor_id)
);

CREATE TABLE audit_log (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    supertick_id   INTEGER NOT NULL,
    actor_id       TEXT NOT NULL,
    action_type    TEXT NOT NULL,
    params         TEXT NOT NULL,
    result         TEXT NOT NULL,
    reason         TEXT,
    context_hash   TEXT NOT NULL,
    submitted_at   TEXT NOT NULL
);
CREATE INDEX idx_audit_tick ON audit_log(supertick_id);
CREATE INDEX idx_audit_actor ON audit_log(actor_id);

CREATE TABLE chat_log (
    id             INTEGER PRIMARY KEY AUTOINCREMENT,
    supertick_id   INTEGER NOT NULL,
    from_id        TEXT NOT NULL,
    message        TEXT NOT NULL,
    created_at     TEXT NOT NULL
);
CREATE INDEX idx_chat_tick ON chat_log(supertick_id);

CREATE TABLE scoring_round (
    supertick_id             INTEGER PRIMARY KEY,
    selected_tiles           TEXT NOT NULL,
    contributions_by_actor   TEXT NOT NULL,
    rationale                TEXT NOT NULL,
    feedback                 TEXT NOT NULL,
    created_at               TEXT NOT NULL
);
";
