//! Object key generation.
//!
//! Keys have the shape `{prefix}-{ticket}-{epochMillis}.pdf`. The timestamp
//! keeps repeated submissions of the same ticket from overwriting each other.

use std::sync::atomic::{AtomicI64, Ordering};

/// Last timestamp handed out by [`object_key_now`].
static LAST_MILLIS: AtomicI64 = AtomicI64::new(0);

/// Ticket segment used when a submission carries no ticket identifier.
pub const UNKNOWN_TICKET: &str = "Unknown";

/// Build the object key for a form document.
pub fn object_key(prefix: &str, ticket_id: Option<&str>, epoch_millis: i64) -> String {
    let ticket = ticket_id
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(sanitize_segment)
        .unwrap_or_else(|| UNKNOWN_TICKET.to_string());
    format!("{prefix}-{ticket}-{epoch_millis}.pdf")
}

/// Object key stamped with the current time.
///
/// Timestamps are strictly increasing within the process, so two keys for the
/// same ticket never collide even when requested in the same millisecond.
pub fn object_key_now(prefix: &str, ticket_id: Option<&str>) -> String {
    object_key(
        prefix,
        ticket_id,
        next_millis(chrono::Utc::now().timestamp_millis()),
    )
}

/// `now`, or one past the last issued timestamp if that is not behind it.
fn next_millis(now: i64) -> i64 {
    let previous = match LAST_MILLIS.fetch_update(Ordering::AcqRel, Ordering::Acquire, |last| {
        Some(now.max(last + 1))
    }) {
        Ok(last) | Err(last) => last,
    };
    now.max(previous + 1)
}

/// Replace characters that would create path segments or need escaping.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
