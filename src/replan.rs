/*
Incremental re-planning on an existing timetable.
Operations never touch their input; they return an edited copy so the
caller keeps the previous timetable for comparison or undo.
*/

use chrono::NaiveDate;
use tracing::info;

use crate::models::{Day, LockedDays, Timetable};

#[derive(Debug, Clone, PartialEq)]
pub struct LockToggle {
    pub timetable: Timetable,
    pub locked_days: LockedDays,
}

// Move every session on `from` to `candidates`, round-robin by index.
//
// Not capacity aware: a target may end up over its original availability
// or session count. Returns None when there is nothing to move or nowhere
// to move it.
fn redistribute(timetable: &Timetable, from: Day, candidates: &[Day]) -> Option<Timetable> {
    if candidates.is_empty() || timetable.daily_schedule.sessions(from).is_empty() {
        return None;
    }

    let mut updated = timetable.clone();
    let displaced = updated.daily_schedule.take(from);
    let moved = displaced.len();

    for (i, session) in displaced.into_iter().enumerate() {
        let target = candidates[i % candidates.len()];
        updated.daily_schedule.sessions_mut(target).push(session);
    }

    info!(from = %from, moved, targets = candidates.len(), "redistributed sessions");
    Some(updated)
}

/// Spread the sessions of the day `reference_date` falls on across every
/// other unlocked day.
///
/// Returns an unchanged copy when that day has no sessions or every other day
/// is locked.
pub fn reschedule_missed_day(timetable: &Timetable, reference_date: NaiveDate, locked: &LockedDays) -> Timetable {
    let missed = Day::from_date(reference_date);
    let candidates: Vec<Day> = Day::ALL
        .into_iter()
        .filter(|d| *d != missed && !locked.is_locked(*d))
        .collect();

    redistribute(timetable, missed, &candidates).unwrap_or_else(|| timetable.clone())
}

// Flip the lock flag for `day`.
//
// Locking moves the day's sessions onto the days still unlocked afterwards.
// Unlocking moves nothing. With every day locked the sessions stay put.
pub fn toggle_day_lock(timetable: &Timetable, day: Day, locked: &LockedDays) -> LockToggle {
    let locked_days = locked.toggled(day);

    let timetable = if locked_days.is_locked(day) {
        redistribute(timetable, day, &locked_days.unlocked_days()).unwrap_or_else(|| timetable.clone())
    } else {
        timetable.clone()
    };

    LockToggle {
        timetable,
        locked_days,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DailySchedule, StudySession};
    use crate::packing::MAX_SESSIONS_PER_DAY;
    use chrono::DateTime;

    // 2026-10-19 is a Monday
    fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
    }

    fn timetable(days: Vec<(Day, Vec<(&str, i64)>)>) -> Timetable {
        let mut schedule = DailySchedule::new();
        for (day, sessions) in days {
            for (name, minutes) in sessions {
                schedule.sessions_mut(day).push(StudySession::new(name, minutes, 3));
            }
        }
        Timetable {
            daily_schedule: schedule,
            subject_breakdown: Vec::new(),
            total_study_hours: 0,
            total_study_minutes: 0,
            generated_date: DateTime::parse_from_rfc3339("2026-10-19T08:00:00+09:00").unwrap(),
        }
    }

    fn names(t: &Timetable, day: Day) -> Vec<&str> {
        t.daily_schedule
            .sessions(day)
            .iter()
            .map(|s| s.subject_name.as_str())
            .collect()
    }

    #[test]
    fn missed_single_session_goes_to_first_candidate() {
        let before = timetable(vec![(Day::Monday, vec![("Math", 60)])]);
        let after = reschedule_missed_day(&before, monday(), &LockedDays::default());

        assert!(after.daily_schedule.sessions(Day::Monday).is_empty());
        assert_eq!(names(&after, Day::Tuesday), vec!["Math"]);
        for day in [Day::Wednesday, Day::Thursday, Day::Friday, Day::Saturday, Day::Sunday] {
            assert!(after.daily_schedule.sessions(day).is_empty());
        }

        // input untouched
        assert_eq!(names(&before, Day::Monday), vec!["Math"]);
    }

    #[test]
    fn missed_sessions_skip_locked_days_round_robin() {
        let before = timetable(vec![
            (Day::Wednesday, vec![("A", 60), ("B", 45), ("C", 30), ("D", 30), ("E", 20)]),
            (Day::Friday, vec![("X", 60)]),
        ]);
        let locked = LockedDays::default().toggled(Day::Tuesday).toggled(Day::Thursday);
        let wednesday = monday() + chrono::Duration::days(2);

        let after = reschedule_missed_day(&before, wednesday, &locked);

        // candidates: Mon, Fri, Sat, Sun
        assert_eq!(names(&after, Day::Monday), vec!["A", "E"]);
        assert_eq!(names(&after, Day::Friday), vec!["X", "B"]);
        assert_eq!(names(&after, Day::Saturday), vec!["C"]);
        assert_eq!(names(&after, Day::Sunday), vec!["D"]);
        assert!(after.daily_schedule.sessions(Day::Tuesday).is_empty());
        assert!(after.daily_schedule.sessions(Day::Wednesday).is_empty());
    }

    #[test]
    fn missed_day_without_targets_or_sessions_is_a_no_op() {
        let before = timetable(vec![(Day::Monday, vec![("Math", 60)])]);
        let mut locked = LockedDays::default();
        for day in Day::ALL.into_iter().filter(|d| *d != Day::Monday) {
            locked = locked.toggled(day);
        }
        assert_eq!(reschedule_missed_day(&before, monday(), &locked), before);

        let empty_monday = timetable(vec![(Day::Tuesday, vec![("Math", 60)])]);
        assert_eq!(
            reschedule_missed_day(&empty_monday, monday(), &LockedDays::default()),
            empty_monday
        );
    }

    #[test]
    fn redistribution_may_exceed_session_cap() {
        let before = timetable(vec![
            (Day::Monday, vec![("A", 60), ("B", 60), ("C", 60)]),
            (Day::Tuesday, vec![("D", 60), ("E", 60), ("F", 60)]),
        ]);
        let mut locked = LockedDays::default();
        for day in [Day::Wednesday, Day::Thursday, Day::Friday, Day::Saturday, Day::Sunday] {
            locked = locked.toggled(day);
        }

        let after = reschedule_missed_day(&before, monday(), &locked);
        assert_eq!(after.daily_schedule.sessions(Day::Tuesday).len(), 6);
        assert!(after.daily_schedule.sessions(Day::Tuesday).len() > MAX_SESSIONS_PER_DAY);
    }

    #[test]
    fn locking_a_day_moves_its_sessions() {
        let before = timetable(vec![(Day::Saturday, vec![("Math", 60), ("Art", 30)])]);
        let result = toggle_day_lock(&before, Day::Saturday, &LockedDays::default());

        assert!(result.locked_days.is_locked(Day::Saturday));
        assert!(result.timetable.daily_schedule.sessions(Day::Saturday).is_empty());
        assert_eq!(names(&result.timetable, Day::Monday), vec!["Math"]);
        assert_eq!(names(&result.timetable, Day::Tuesday), vec!["Art"]);
        assert_eq!(names(&before, Day::Saturday), vec!["Math", "Art"]);
    }

    #[test]
    fn unlocking_moves_nothing_and_flags_round_trip() {
        let before = timetable(vec![(Day::Friday, vec![("Math", 60)])]);
        let locked = toggle_day_lock(&before, Day::Friday, &LockedDays::default());
        let unlocked = toggle_day_lock(&locked.timetable, Day::Friday, &locked.locked_days);

        assert!(!unlocked.locked_days.is_locked(Day::Friday));
        assert_eq!(unlocked.locked_days.unlocked_days(), Day::ALL.to_vec());
        assert_eq!(unlocked.timetable, locked.timetable);
    }

    #[test]
    fn toggling_an_empty_day_keeps_timetable() {
        let before = timetable(vec![(Day::Monday, vec![("Math", 60)])]);
        let result = toggle_day_lock(&before, Day::Sunday, &LockedDays::default());

        assert!(result.locked_days.is_locked(Day::Sunday));
        assert_eq!(result.timetable, before);
    }

    #[test]
    fn locking_last_open_day_strands_sessions() {
        let before = timetable(vec![(Day::Thursday, vec![("Math", 60)])]);
        let mut locked = LockedDays::default();
        for day in Day::ALL.into_iter().filter(|d| *d != Day::Thursday) {
            locked = locked.toggled(day);
        }

        let result = toggle_day_lock(&before, Day::Thursday, &locked);
        assert!(result.locked_days.unlocked_days().is_empty());
        assert_eq!(names(&result.timetable, Day::Thursday), vec!["Math"]);
    }
}
