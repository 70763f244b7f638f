/*
Session packing.
Turns per-subject allocated minutes into concrete daily sessions
using three greedy passes, each looser than the one before.
*/

use std::collections::BTreeMap;

use tracing::debug;

use crate::logic::AllocatedSubject;
use crate::models::{DailySchedule, Day, StudySession};

pub const MIN_SESSION_LENGTH: i64 = 30;
pub const MAX_SESSIONS_PER_DAY: usize = 3;
pub const MAX_SESSION_CAP: i64 = 60;

#[derive(Debug, Clone, PartialEq)]
pub struct PackOutcome {
    pub schedule: DailySchedule,
    pub unplaced_minutes: i64, // allocated minutes that did not fit anywhere
}

// Result of trying one (subject, day) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placement {
    Skipped,
    Placed(i64),
    // top-up pass only: extended an existing session for the subject
    Merged(i64),
    // top-up pass only: day was at the session cap, minutes consumed anyway
    Dropped(i64),
}

impl Placement {
    fn placed_minutes(self) -> i64 {
        match self {
            Placement::Placed(m) | Placement::Merged(m) => m,
            Placement::Skipped | Placement::Dropped(_) => 0,
        }
    }
}

// Working tables shared by all passes.
// Invariants: remaining >= 0, capacity >= 0, sessions per day <= MAX_SESSIONS_PER_DAY.
struct PackingState<'a> {
    subjects: &'a [AllocatedSubject],
    remaining: Vec<i64>,
    capacity: BTreeMap<Day, i64>,
    schedule: DailySchedule,
}

impl<'a> PackingState<'a> {
    fn new(subjects: &'a [AllocatedSubject], daily_minutes: &BTreeMap<Day, i64>) -> Self {
        Self {
            subjects,
            remaining: subjects.iter().map(|s| s.allocated_minutes.max(0)).collect(),
            capacity: Day::ALL
                .into_iter()
                .map(|d| (d, daily_minutes.get(&d).copied().unwrap_or(0).max(0)))
                .collect(),
            schedule: DailySchedule::new(),
        }
    }

    fn capacity(&self, day: Day) -> i64 {
        self.capacity.get(&day).copied().unwrap_or(0)
    }

    fn consume(&mut self, idx: usize, day: Day, minutes: i64) {
        self.remaining[idx] -= minutes;
        *self.capacity.entry(day).or_insert(0) -= minutes;
    }

    // Passes 1 and 2: a fresh session of MIN..=MAX_SESSION_CAP minutes or nothing.
    fn place_standard(&mut self, idx: usize, day: Day) -> Placement {
        if self.schedule.sessions(day).len() >= MAX_SESSIONS_PER_DAY {
            return Placement::Skipped;
        }
        let capacity = self.capacity(day);
        if capacity < MIN_SESSION_LENGTH {
            return Placement::Skipped;
        }

        let length = self.remaining[idx].min(capacity).min(MAX_SESSION_CAP);
        if length < MIN_SESSION_LENGTH {
            return Placement::Skipped;
        }

        let subjects = self.subjects;
        let subject = &subjects[idx];
        let session = StudySession::new(subject.name(), length, subject.confidence_level());
        self.schedule.sessions_mut(day).push(session);
        self.consume(idx, day, length);
        Placement::Placed(length)
    }

    // Pass 3: any leftover capacity, no minimum length.
    fn place_top_up(&mut self, idx: usize, day: Day) -> Placement {
        let capacity = self.capacity(day);
        if self.remaining[idx] <= 0 || capacity <= 0 {
            return Placement::Skipped;
        }

        let length = self.remaining[idx].min(capacity);
        let subjects = self.subjects;
        let subject = &subjects[idx];
        let sessions = self.schedule.sessions_mut(day);

        let outcome = if let Some(existing) = sessions.iter_mut().find(|s| s.subject_name == subject.name()) {
            existing.extend(length);
            Placement::Merged(length)
        } else if sessions.len() < MAX_SESSIONS_PER_DAY {
            sessions.push(StudySession::new(subject.name(), length, subject.confidence_level()));
            Placement::Placed(length)
        } else {
            Placement::Dropped(length)
        };

        self.consume(idx, day, length);
        outcome
    }
}

// Subjects ordered by descending priority; ties keep input order.
fn priority_order(subjects: &[AllocatedSubject]) -> Vec<usize> {
    let mut order: Vec<usize> = (0..subjects.len()).collect();
    order.sort_by(|&a, &b| {
        subjects[b]
            .priority_score()
            .partial_cmp(&subjects[a].priority_score())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    order
}

// Days ordered by descending original capacity; ties keep weekday order.
// Computed once, not re-sorted while capacity drains.
fn days_by_capacity(daily_minutes: &BTreeMap<Day, i64>) -> Vec<Day> {
    let mut days = Day::ALL.to_vec();
    days.sort_by_key(|d| std::cmp::Reverse(daily_minutes.get(d).copied().unwrap_or(0)));
    days
}

// Pass 1: urgent / weak subjects onto the most spacious days.
fn priority_first_pass(state: &mut PackingState<'_>, order: &[usize], days: &[Day]) -> i64 {
    let mut placed = 0;
    for &idx in order {
        if state.remaining[idx] <= 0 {
            continue;
        }
        for &day in days {
            placed += state.place_standard(idx, day).placed_minutes();
        }
    }
    placed
}

// Pass 2: same rules, weekday order, for subjects that lost the capacity race.
fn remaining_time_pass(state: &mut PackingState<'_>, order: &[usize]) -> i64 {
    let mut placed = 0;
    for &idx in order {
        if state.remaining[idx] <= 0 {
            continue;
        }
        for day in Day::ALL {
            placed += state.place_standard(idx, day).placed_minutes();
        }
    }
    placed
}

// Pass 3: squeeze leftovers into any remaining capacity.
fn top_up_pass(state: &mut PackingState<'_>, order: &[usize]) -> i64 {
    let mut placed = 0;
    for &idx in order {
        if state.remaining[idx] <= 0 {
            continue;
        }
        for day in Day::ALL {
            let outcome = state.place_top_up(idx, day);
            if let Placement::Dropped(minutes) = outcome {
                debug!(
                    subject = %state.subjects[idx].name(),
                    day = %day,
                    minutes,
                    "session cap reached, minutes dropped"
                );
            }
            placed += outcome.placed_minutes();
        }
    }
    placed
}

/// Pack allocated minutes into a weekly schedule.
///
/// Per-day totals never exceed `daily_minutes`. Fresh sessions are created at
/// most once per pass per (subject, day); the top-up pass extends an existing
/// session for the same subject instead of adding a second one. Minutes that
/// cannot be placed are reported in `unplaced_minutes`, not as an error.
pub fn pack_sessions(subjects: &[AllocatedSubject], daily_minutes: &BTreeMap<Day, i64>) -> PackOutcome {
    let order = priority_order(subjects);
    let days = days_by_capacity(daily_minutes);
    let mut state = PackingState::new(subjects, daily_minutes);

    let first = priority_first_pass(&mut state, &order, &days);
    let second = remaining_time_pass(&mut state, &order);
    let top_up = top_up_pass(&mut state, &order);
    debug!(first, second, top_up, "packing passes placed minutes");

    let total: i64 = subjects.iter().map(|s| s.allocated_minutes.max(0)).sum();
    let placed: i64 = Day::ALL.into_iter().map(|d| state.schedule.minutes_on(d)).sum();

    PackOutcome {
        schedule: state.schedule,
        unplaced_minutes: total - placed,
    }
}
