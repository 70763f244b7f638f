use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::PlannerError;

// Fixed weekday enumeration.
// Ord follows calendar order Monday..Sunday, which is the "natural" day order
// used by the packer and the replanner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Day {
    Monday,
    Tuesday,
    Wednesday,
    Thursday,
    Friday,
    Saturday,
    Sunday,
}

impl Day {
    pub const ALL: [Day; 7] = [
        Day::Monday,
        Day::Tuesday,
        Day::Wednesday,
        Day::Thursday,
        Day::Friday,
        Day::Saturday,
        Day::Sunday,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Day::Monday => "Monday",
            Day::Tuesday => "Tuesday",
            Day::Wednesday => "Wednesday",
            Day::Thursday => "Thursday",
            Day::Friday => "Friday",
            Day::Saturday => "Saturday",
            Day::Sunday => "Sunday",
        }
    }

    pub fn from_weekday(weekday: Weekday) -> Self {
        match weekday {
            Weekday::Mon => Day::Monday,
            Weekday::Tue => Day::Tuesday,
            Weekday::Wed => Day::Wednesday,
            Weekday::Thu => Day::Thursday,
            Weekday::Fri => Day::Friday,
            Weekday::Sat => Day::Saturday,
            Weekday::Sun => Day::Sunday,
        }
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self::from_weekday(date.weekday())
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// Accepts "monday", "Monday", "MON", ...
impl FromStr for Day {
    type Err = PlannerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase();
        Day::ALL
            .into_iter()
            .find(|d| {
                let name = d.name().to_lowercase();
                name == needle || name[..3] == needle
            })
            .ok_or_else(|| PlannerError::InvalidInput(format!("unknown day: {s}")))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub name: String,
    pub confidence_level: i64, // 1..=5, 1 = weak
    pub exam_date: NaiveDate,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct DayAvailability {
    pub hours: i64,   // 0..=24
    pub minutes: i64, // 0..=59
}

impl DayAvailability {
    pub fn new(hours: i64, minutes: i64) -> Self {
        Self { hours, minutes }
    }

    pub fn total_minutes(&self) -> i64 {
        self.hours.saturating_mul(60).saturating_add(self.minutes)
    }

    // Same bounds the availability form applies to each field.
    pub fn clamped(&self) -> Self {
        Self {
            hours: self.hours.clamp(0, 24),
            minutes: self.minutes.clamp(0, 59),
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct WeeklyAvailability(pub BTreeMap<Day, DayAvailability>);

impl WeeklyAvailability {
    /// Same availability on every day of the week.
    #[cfg(test)]
    pub fn uniform(hours: i64, minutes: i64) -> Self {
        Self(
            Day::ALL
                .into_iter()
                .map(|d| (d, DayAvailability::new(hours, minutes)))
                .collect(),
        )
    }

    pub fn get(&self, day: Day) -> Option<&DayAvailability> {
        self.0.get(&day)
    }

    #[cfg(test)]
    pub fn set(&mut self, day: Day, availability: DayAvailability) {
        self.0.insert(day, availability);
    }

    /// Clamp every field and fill absent days with zero.
    pub fn normalized(&self) -> Self {
        Self(
            Day::ALL
                .into_iter()
                .map(|d| (d, self.get(d).map(|a| a.clamped()).unwrap_or_default()))
                .collect(),
        )
    }
}

// A single block of study time for one subject on one day.
//
// `duration_minutes` is canonical; `hours` / `minutes` are the display split
// and are refreshed whenever the duration changes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub subject_name: String,
    pub duration_minutes: i64,
    pub confidence_level: i64,
    pub hours: i64,
    pub minutes: i64,
}

impl StudySession {
    pub fn new(subject_name: impl Into<String>, duration_minutes: i64, confidence_level: i64) -> Self {
        let mut session = Self {
            subject_name: subject_name.into(),
            duration_minutes,
            confidence_level,
            hours: 0,
            minutes: 0,
        };
        session.refresh_display();
        session
    }

    pub fn extend(&mut self, minutes: i64) {
        self.duration_minutes += minutes;
        self.refresh_display();
    }

    pub fn refresh_display(&mut self) {
        self.hours = self.duration_minutes / 60;
        self.minutes = self.duration_minutes % 60;
    }
}

// Day -> ordered sessions (placement order, not time of day).
// Always holds an entry for each of the seven days.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct DailySchedule(BTreeMap<Day, Vec<StudySession>>);

impl DailySchedule {
    pub fn new() -> Self {
        Self(Day::ALL.into_iter().map(|d| (d, Vec::new())).collect())
    }

    pub fn sessions(&self, day: Day) -> &[StudySession] {
        self.0.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn sessions_mut(&mut self, day: Day) -> &mut Vec<StudySession> {
        self.0.entry(day).or_default()
    }

    pub fn take(&mut self, day: Day) -> Vec<StudySession> {
        std::mem::take(self.sessions_mut(day))
    }

    pub fn minutes_on(&self, day: Day) -> i64 {
        self.sessions(day).iter().map(|s| s.duration_minutes).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Day, &[StudySession])> {
        self.0.iter().map(|(d, s)| (*d, s.as_slice()))
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.0.values().all(Vec::is_empty)
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    pub name: String,
    pub confidence_level: i64,
    pub exam_date: NaiveDate,
    pub allocated_hours: i64,
    pub allocated_minutes: i64, // remainder after hours, 0..=59
    pub percentage: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Timetable {
    pub daily_schedule: DailySchedule,
    pub subject_breakdown: Vec<SubjectSummary>,
    pub total_study_hours: i64,
    pub total_study_minutes: i64,
    pub generated_date: DateTime<FixedOffset>,
}

// Days the user marked unavailable. Absent = unlocked.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct LockedDays(pub BTreeMap<Day, bool>);

impl LockedDays {
    pub fn is_locked(&self, day: Day) -> bool {
        self.0.get(&day).copied().unwrap_or(false)
    }

    pub fn toggled(&self, day: Day) -> Self {
        let mut next = self.clone();
        next.0.insert(day, !self.is_locked(day));
        next
    }

    pub fn unlocked_days(&self) -> Vec<Day> {
        Day::ALL.into_iter().filter(|d| !self.is_locked(*d)).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SubjectEntry {
    pub id: Uuid,
    #[serde(flatten)]
    pub subject: Subject,
    pub created_at: DateTime<FixedOffset>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Db {
    pub subjects: Vec<SubjectEntry>,
    pub availability: WeeklyAvailability,
    pub timetable: Option<Timetable>,
    pub locked_days: LockedDays,
}

impl Db {
    pub fn subject_list(&self) -> Vec<Subject> {
        self.subjects.iter().map(|e| e.subject.clone()).collect()
    }
}
