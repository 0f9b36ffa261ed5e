//! Pure decision logic: `(config, now, online) → Action`.
//!
//! Trigger decisions are exact-minute matches — there is no "inside the
//! window" state, only "this is the boot minute" and "this is the shutdown
//! minute". The optional `grace_minutes` tolerance widens a match to N
//! minutes *after* the configured time, so a tick that lands a minute late
//! (or a stalled online probe) does not silently lose the whole day.

use chrono::{DateTime, Datelike, Duration, Local, NaiveTime, Timelike};
use tracing::{debug, warn};

use crate::types::{Action, Frequency, ScheduleConfig};

const MINUTES_PER_DAY: i64 = 24 * 60;

/// Decide what must happen at `now`.
///
/// Mutates `config` in place: a `Boot` decision records the cycle start
/// (`lastRun`, `startedBySchedule`), and the eligibility check may close an
/// expired cycle. The caller persists the config when it changed.
pub fn decide(
    config: &mut ScheduleConfig,
    now: DateTime<Local>,
    host_online: bool,
    credential_set: bool,
    grace_minutes: u32,
) -> Action {
    if !config.enabled {
        return Action::None;
    }

    // The verify pass disables configs with malformed times; if one slips
    // through mid-repair, decline to act rather than guess.
    let (Some(start), Some(end)) = (config.start(), config.end()) else {
        warn!(
            start = %config.start_time,
            end = %config.end_time,
            "schedule enabled but times do not parse, skipping evaluation"
        );
        return Action::None;
    };

    if end < start {
        debug!("schedule window spans midnight");
    }

    // Runs every tick, not just at the boot minute: the same-day reset in
    // should_run has to fire on ordinary ticks after endTime.
    let eligible = should_run(config, now);
    let now_time = now.time();

    if minute_matches(now_time, start, grace_minutes) && eligible && !host_online {
        config.mark_started(now);
        return Action::Boot;
    }

    if minute_matches(now_time, end, grace_minutes)
        && host_online
        && config.auto_shutdown
        && credential_set
        && config.started_by_schedule
    {
        return Action::Shutdown;
    }

    Action::None
}

/// Whether the cycle is eligible to start at `now`.
///
/// May mutate `config`: when `lastRun` is from earlier today and `now` is
/// past `endTime`, the cycle is closed (`lastRun`/`startedBySchedule`
/// cleared) and this call still returns `false` — the reset takes effect on
/// the next evaluation.
pub fn should_run(config: &mut ScheduleConfig, now: DateTime<Local>) -> bool {
    let Some(last) = config.last_run_at() else {
        // Empty or unparsable lastRun: first run, or the cycle was reset.
        if !config.last_run.is_empty() {
            warn!(last_run = %config.last_run, "unparsable lastRun, treating as never ran");
        }
        return true;
    };

    if last.date_naive() == now.date_naive() {
        if let Some(end) = config.end() {
            if now.time() > end {
                debug!("past end time, closing cycle for the next run");
                config.clear_cycle();
                return false;
            }
        }
        // Already started today.
        return false;
    }

    let elapsed = now.signed_duration_since(last);
    match config.freq() {
        Frequency::Daily => true,
        Frequency::Every2Days => elapsed >= Duration::hours(48),
        Frequency::Weekly => elapsed >= Duration::hours(7 * 24),
        Frequency::Monthly => (last.year(), last.month()) != (now.year(), now.month()),
    }
}

/// Minute-granularity match with an optional forward tolerance.
///
/// With `grace_minutes == 0` this is exact equality of the HH:MM pair. With
/// N > 0 it also matches the N minutes after `target`, wrapping across
/// midnight.
pub fn minute_matches(now: NaiveTime, target: NaiveTime, grace_minutes: u32) -> bool {
    let now_min = (now.hour() * 60 + now.minute()) as i64;
    let target_min = (target.hour() * 60 + target.minute()) as i64;
    (now_min - target_min).rem_euclid(MINUTES_PER_DAY) <= grace_minutes as i64
}
