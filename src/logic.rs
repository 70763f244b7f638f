/*
Scoring, allocation and timetable assembly.
Module was independently written from HTTP / Axum for testing.
Every function takes "now" explicitly so results are deterministic.
*/

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime};
use tracing::{debug, info};

use crate::error::PlannerError;
use crate::models::{DailySchedule, Day, Subject, SubjectSummary, Timetable, WeeklyAvailability};
use crate::packing;

const CONFIDENCE_WEIGHT: f64 = 0.6;
const URGENCY_WEIGHT: f64 = 0.4;

// Subject after scoring
//     derived on every run, never persisted
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredSubject {
    pub subject: Subject,
    pub days_until_exam: i64, // >= 1
    pub priority_score: f64,
}

// Scored subject with its share of the weekly minutes
#[derive(Debug, Clone, PartialEq)]
pub struct AllocatedSubject {
    pub scored: ScoredSubject,
    pub allocated_minutes: i64,
}

impl AllocatedSubject {
    pub fn name(&self) -> &str {
        &self.scored.subject.name
    }

    pub fn confidence_level(&self) -> i64 {
        self.scored.subject.confidence_level
    }

    pub fn priority_score(&self) -> f64 {
        self.scored.priority_score
    }
}

// Weekly time budget: total plus per-day capacity in minutes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeBudget {
    pub total_minutes: i64,
    pub daily_minutes: BTreeMap<Day, i64>,
}

// Whole days from now until local midnight of the exam date, rounded up.
// Exams today or in the past count as 1 day away.
pub fn days_until_exam(exam_date: NaiveDate, now: DateTime<FixedOffset>) -> i64 {
    // Both sides share now's offset, so the naive local difference is exact
    let exam_start = exam_date.and_time(NaiveTime::MIN);
    let millis = (exam_start - now.naive_local()).num_milliseconds();
    let day = 24 * 60 * 60 * 1000;
    let mut days = millis.div_euclid(day);
    if millis.rem_euclid(day) > 0 {
        days += 1;
    }
    days.max(1)
}

// priority = 0.6 * (6 - confidence) + 0.4 * (100 / days_until_exam)
//
// Weak confidence and close exams both push the score up.
// Confidence is not range-checked here.
pub fn score_subject(subject: &Subject, now: DateTime<FixedOffset>) -> ScoredSubject {
    let days = days_until_exam(subject.exam_date, now);
    let confidence_factor = 6.0 - subject.confidence_level as f64;
    let urgency_factor = 100.0 / days as f64;

    ScoredSubject {
        subject: subject.clone(),
        days_until_exam: days,
        priority_score: CONFIDENCE_WEIGHT * confidence_factor + URGENCY_WEIGHT * urgency_factor,
    }
}

/// Score every subject, keeping input order.
pub fn score_subjects(subjects: &[Subject], now: DateTime<FixedOffset>) -> Vec<ScoredSubject> {
    subjects.iter().map(|s| score_subject(s, now)).collect()
}

// Sum availability into minutes. Days absent from the map count as zero.
pub fn time_budget(availability: &WeeklyAvailability) -> TimeBudget {
    let daily_minutes: BTreeMap<Day, i64> = Day::ALL
        .into_iter()
        .map(|d| (d, availability.get(d).map(|a| a.total_minutes()).unwrap_or(0)))
        .collect();
    let total_minutes = daily_minutes.values().fold(0i64, |acc, m| acc.saturating_add(*m));

    TimeBudget {
        total_minutes,
        daily_minutes,
    }
}

/// Split `total_minutes` across subjects proportionally to priority score.
///
/// Each share is rounded on its own, so the sum may be off by up to one
/// minute per subject. Returns an empty allocation when the total priority
/// is zero (no subjects).
pub fn allocate_study_time(scored: Vec<ScoredSubject>, total_minutes: i64) -> Vec<AllocatedSubject> {
    let total_priority: f64 = scored.iter().map(|s| s.priority_score).sum();
    if total_priority.is_nan() || total_priority <= 0.0 {
        return Vec::new();
    }

    scored
        .into_iter()
        .map(|s| {
            let share = total_minutes as f64 * (s.priority_score / total_priority);
            AllocatedSubject {
                allocated_minutes: share.round() as i64,
                scored: s,
            }
        })
        .collect()
}

// Build the final timetable object.
//
// Breakdown uses allocated minutes, not what the packer actually placed.
pub fn assemble_timetable(
    daily_schedule: DailySchedule,
    allocated: &[AllocatedSubject],
    generated_at: DateTime<FixedOffset>,
) -> Timetable {
    let total_allocated: i64 = allocated.iter().map(|a| a.allocated_minutes).sum();

    let subject_breakdown = allocated
        .iter()
        .map(|a| {
            let percentage = if total_allocated == 0 {
                0
            } else {
                (a.allocated_minutes as f64 / total_allocated as f64 * 100.0).round() as i64
            };
            SubjectSummary {
                name: a.name().to_string(),
                confidence_level: a.confidence_level(),
                exam_date: a.scored.subject.exam_date,
                allocated_hours: a.allocated_minutes / 60,
                allocated_minutes: a.allocated_minutes % 60,
                percentage,
            }
        })
        .collect();

    Timetable {
        daily_schedule,
        subject_breakdown,
        total_study_hours: total_allocated / 60,
        total_study_minutes: total_allocated % 60,
        generated_date: generated_at,
    }
}

// Reject input whose shape the arithmetic downstream depends on.
pub fn validate_input(subjects: &[Subject], availability: &WeeklyAvailability) -> Result<(), PlannerError> {
    for day in Day::ALL {
        let Some(a) = availability.get(day) else {
            return Err(PlannerError::InvalidInput(format!("availability missing {day}")));
        };
        if !(0..=24).contains(&a.hours) {
            return Err(PlannerError::InvalidInput(format!(
                "{day}: hours must be 0..=24, got {}",
                a.hours
            )));
        }
        if !(0..=59).contains(&a.minutes) {
            return Err(PlannerError::InvalidInput(format!(
                "{day}: minutes must be 0..=59, got {}",
                a.minutes
            )));
        }
    }

    for s in subjects {
        if !(1..=5).contains(&s.confidence_level) {
            return Err(PlannerError::InvalidInput(format!(
                "subject '{}': confidence level must be 1..=5, got {}",
                s.name, s.confidence_level
            )));
        }
    }

    Ok(())
}

/// Generate a full weekly timetable.
///
/// Process:
/// - Score subjects by confidence and exam urgency
/// - Sum weekly availability
/// - Allocate minutes proportionally to score
/// - Pack allocations into daily sessions
/// - Assemble breakdown and totals
pub fn generate_timetable(
    subjects: &[Subject],
    availability: &WeeklyAvailability,
    now: DateTime<FixedOffset>,
) -> Result<Timetable, PlannerError> {
    validate_input(subjects, availability)?;

    let scored = score_subjects(subjects, now);
    let budget = time_budget(availability);
    let allocated = allocate_study_time(scored, budget.total_minutes);

    for a in &allocated {
        debug!(
            subject = %a.name(),
            priority = a.priority_score(),
            days_until_exam = a.scored.days_until_exam,
            minutes = a.allocated_minutes,
            "allocated study time"
        );
    }

    let packed = packing::pack_sessions(&allocated, &budget.daily_minutes);
    let sessions: usize = packed.schedule.iter().map(|(_, s)| s.len()).sum();
    info!(
        subjects = subjects.len(),
        sessions,
        total_minutes = budget.total_minutes,
        unplaced_minutes = packed.unplaced_minutes,
        "generated timetable"
    );

    Ok(assemble_timetable(packed.schedule, &allocated, now))
}
