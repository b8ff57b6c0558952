//! The action string grammar (spec §6):
//!
//! ```text
//! action   := "MOVE " dir | "PAINT " color [" " int " " int] | "SPEAK " text | "WAIT" | "SKIP"
//! dir      := "N" | "S" | "E" | "W"
//! color    := "#" HEX{6}
//! ```
//!
//! Parsing happens once, at the API boundary, into a typed
//! [`monument_world::Intent`] — the validator and resolver downstream
//! never re-parse a string.

use monument_world::{Direction, Intent, TileColor};

use crate::ApiError;

/// Parse one action string per the grammar above.
///
/// # Errors
///
/// Returns [`ApiError::MalformedAction`] if `raw` does not match the
/// grammar for any keyword, including an unrecognized keyword.
pub fn parse_action(raw: &str) -> Result<Intent, ApiError> {
    let raw = raw.trim();
    let (keyword, rest) = match raw.split_once(' ') {
        Some((k, r)) => (k, r.trim()),
        None => (raw, ""),
    };

    match keyword {
        "MOVE" => parse_move(rest),
        "PAINT" => parse_paint(rest),
        "SPEAK" => parse_speak(rest),
        "WAIT" if rest.is_empty() => Ok(Intent::Wait),
        "SKIP" if rest.is_empty() => Ok(Intent::Skip),
        "WAIT" | "SKIP" => Err(ApiError::MalformedAction(format!(
            "{keyword} takes no arguments, got {raw:?}"
        ))),
        other => Err(ApiError::MalformedAction(format!("unknown action keyword {other:?}"))),
    }
}

fn parse_move(rest: &str) -> Result<Intent, ApiError> {
    let direction = match rest {
        "N" => Direction::N,
        "S" => Direction::S,
        "E" => Direction::E,
        "W" => Direction::W,
        other => return Err(ApiError::MalformedAction(format!("invalid MOVE direction {other:?}"))),
    };
    Ok(Intent::Move { direction })
}

fn parse_paint(rest: &str) -> Result<Intent, ApiError> {
    let mut fields = rest.split_whitespace();
    let color_raw = fields
        .next()
        .ok_or_else(|| ApiError::MalformedAction("PAINT requires a color".into()))?;
    let color = TileColor::parse(color_raw)
        .map_err(|e| ApiError::MalformedAction(e.to_string()))?;

    let target = match (fields.next(), fields.next()) {
        (None, None) => None,
        (Some(x), Some(y)) => {
            let x: i32 = x
                .parse()
                .map_err(|_| ApiError::MalformedAction(format!("invalid PAINT x coordinate {x:?}")))?;
            let y: i32 = y
                .parse()
                .map_err(|_| ApiError::MalformedAction(format!("invalid PAINT y coordinate {y:?}")))?;
            Some((x, y))
        }
        _ => {
            return Err(ApiError::MalformedAction(
                "PAINT target requires both x and y, or neither".into(),
            ))
        }
    };

    if fields.next().is_some() {
        return Err(ApiError::MalformedAction(format!("too many arguments to PAINT {rest:?}")));
    }

    Ok(Intent::Paint { color, target })
}

fn parse_speak(rest: &str) -> Result<Intent, ApiError> {
    if rest.is_empty() {
        return Err(ApiError::MalformedAction("SPEAK requires a message".into()));
    }
    Ok(Intent::Speak { message: rest.to_string() })
}
