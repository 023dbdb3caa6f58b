//! Common time helpers for turntable_core.

/// Number of milliseconds in one second.
pub const MILLIS_PER_SEC: u64 = 1_000;

/// Render simulated milliseconds as `HH:MM:SS.mmm`.
/// Hours keep counting past 99 rather than wrapping.
pub fn format_timestamp(ms: u64) -> String {
    let millis = ms % MILLIS_PER_SEC;
    let total_secs = ms / MILLIS_PER_SEC;
    let secs = total_secs % 60;
    let mins = (total_secs / 60) % 60;
    let hours = total_secs / 3600;
    format!("{hours:02}:{mins:02}:{secs:02}.{millis:03}")
}

/// True once `now_ms` has reached `deadline_ms`.
#[inline]
pub fn deadline_passed(now_ms: u64, deadline_ms: u64) -> bool {
    now_ms >= deadline_ms
}

/// True when a watchdog of `limit_ms` armed at `since_ms` has expired.
/// A zero limit disables the watchdog.
#[inline]
pub fn watchdog_expired(now_ms: u64, since_ms: u64, limit_ms: u64) -> bool {
    limit_ms > 0 && now_ms.saturating_sub(since_ms) >= limit_ms
}
