//! System-wide monotonic clock.
//!
//! A pending entry is written by one process and consumed by another, so the
//! reading must come from a clock shared by every process on the host.
//! `std::time::Instant` is opaque and cannot be persisted.

/// Current `CLOCK_MONOTONIC` reading in nanoseconds.
#[cfg(unix)]
pub fn monotonic_ns() -> u64 {
    let mut ts = libc::timespec {
        tv_sec: 0,
        tv_nsec: 0,
    };
    // SAFETY: `clock_gettime(CLOCK_MONOTONIC, ...)` is thread-safe and only
    // needs a valid pointer.
    if unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, &mut ts) } == 0 {
        (ts.tv_sec as u64)
            .saturating_mul(1_000_000_000)
            .saturating_add(ts.tv_nsec as u64)
    } else {
        wall_clock_ns()
    }
}

/// Wall-clock fallback where no shared monotonic clock is available.
#[cfg(not(unix))]
pub fn monotonic_ns() -> u64 {
    wall_clock_ns()
}

fn wall_clock_ns() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos()).unwrap_or(u64::MAX))
        .unwrap_or(0)
}

/// Milliseconds elapsed since a [`monotonic_ns`] reading, rounded to 0.1 ms.
///
/// Returns `None` when the reading lies in the future, which happens after a
/// reboot between start and end.
pub fn elapsed_ms_since(started_ns: u64) -> Option<f64> {
    let now = monotonic_ns();
    let elapsed = now.checked_sub(started_ns)?;
    Some(round_tenths(elapsed as f64 / 1_000_000.0))
}

/// Round to one decimal place.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}
