//! Human-readable error descriptions and structured JSON error formatting.

use serde_json::{Value, json};
use turntable_core::error::{BuildError, InitFault, TurntableError};

/// Map an eyre::Report to a human-readable explanation with likely causes and fix hints.
pub fn humanize(err: &eyre::Report) -> String {
    // Typed matches first
    if let Some(be) = err.downcast_ref::<BuildError>() {
        return match be {
            BuildError::InvalidConfig(msg) => format!(
                "What happened: Invalid configuration ({msg}).\nLikely causes: Out-of-range values in the TOML.\nHow to fix: Edit the config file, then rerun. See etc/turntable.toml for a sample."
            ),
            BuildError::Inventory(msg) => format!(
                "What happened: The starting inventory could not be used ({msg}).\nLikely causes: Duplicate or out-of-range slot numbers in the CSV.\nHow to fix: List each slot 0..9 at most once."
            ),
        };
    }

    if let Some(te) = find_turntable_error(err) {
        return match te {
            TurntableError::Init(InitFault::HomeTimeout(ms)) => format!(
                "What happened: Homing gave up after {ms} ms without seeing the home position.\nLikely causes: The table never wrapped past the home band, or the timeout is shorter than one revolution.\nHow to fix: Raise timing.home_timeout_ms (0 disables it) and check motion.round/step."
            ),
            TurntableError::MoveTimeout { target, after_ms } => format!(
                "What happened: The table did not reach qei {target} within {after_ms} ms.\nLikely causes: timing.move_timeout_ms is shorter than the travel time for one revolution.\nHow to fix: Raise timing.move_timeout_ms (0 disables it)."
            ),
            TurntableError::Rejected(why) => format!(
                "What happened: Operation refused ({why}).\nLikely causes: The slot's card state does not allow it, or the slot is not parked at the matching station.\nHow to fix: Check the inventory in the event log and pick another slot."
            ),
            TurntableError::SlotOutOfRange(n) => format!(
                "What happened: Slot {n} does not exist.\nHow to fix: Use a slot index from 0 to 9."
            ),
            TurntableError::UnknownStation(s) => format!(
                "What happened: Unknown station '{s}'.\nHow to fix: Use one of refill, 1p, 2p, reject."
            ),
            other => format!(
                "What happened: {other}.\nLikely causes: See logs.\nHow to fix: Re-run with --log-level=debug or set RUST_LOG for more detail."
            ),
        };
    }

    // String-based heuristics for errors coming from config loading
    let msg = err
        .chain()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(": ");
    let lower = msg.to_ascii_lowercase();

    if lower.contains("inventory csv must have headers") {
        return "Invalid headers in inventory CSV. Expected 'slot,has_card,qr_data'.".to_string();
    }

    if lower.contains("parse config") || lower.contains("invalid configuration") {
        let cause = err
            .chain()
            .nth(1)
            .map(|c| format!(" Cause: {c}"))
            .unwrap_or_default();
        return format!(
            "What happened: Configuration is invalid.{cause}\nHow to fix: Edit the TOML config and try again."
        );
    }

    // Generic fallback
    let mut cause = String::new();
    if let Some(src) = err.source() {
        cause = format!(" Cause: {src}");
    }
    format!(
        "Something went wrong.{cause}\nHow to fix: Re-run with --log-level=debug for details. Original: {msg}"
    )
}

fn find_turntable_error(err: &eyre::Report) -> Option<&TurntableError> {
    err.chain().find_map(|e| e.downcast_ref::<TurntableError>())
}

/// Stable exit codes for operational failures; everything else returns 1.
pub fn exit_code_for_error(err: &eyre::Report) -> i32 {
    match find_turntable_error(err) {
        Some(TurntableError::Init(_)) => 3,
        Some(TurntableError::MoveTimeout { .. }) => 4,
        Some(TurntableError::Rejected(_)) => 5,
        _ => 1,
    }
}

pub fn reason_name(err: &eyre::Report) -> &'static str {
    match find_turntable_error(err) {
        Some(TurntableError::Init(InitFault::HomeTimeout(_))) => "HomeTimeout",
        Some(TurntableError::MoveTimeout { .. }) => "MoveTimeout",
        Some(TurntableError::Rejected(_)) => "Rejected",
        _ => "Error",
    }
}

/// Structured error value; `details` carries the fault's numbers when it has any.
pub fn error_value(err: &eyre::Report) -> Value {
    let details = match find_turntable_error(err) {
        Some(TurntableError::Init(InitFault::HomeTimeout(ms))) => {
            Some(json!({ "home_timeout_ms": ms }))
        }
        Some(TurntableError::MoveTimeout { target, after_ms }) => {
            Some(json!({ "target_qei": target, "after_ms": after_ms }))
        }
        Some(TurntableError::Rejected(why)) => Some(json!({ "why": why })),
        _ => None,
    };
    let mut obj = json!({ "reason": reason_name(err), "message": humanize(err) });
    if let Some(d) = details {
        obj["details"] = d;
    }
    obj
}

/// Structured JSON for errors when --json is enabled.
pub fn format_error_json(err: &eyre::Report) -> String {
    json!({ "ok": false, "error": error_value(err) }).to_string()
}
