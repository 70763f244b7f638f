// --------------------------------------------------
// Handles API endpoints for planner inputs.
//
// Responsibilities:
// - Add / list / remove subjects
// - Get / replace weekly availability
// - Keep an existing timetable in sync with its inputs
// --------------------------------------------------

use axum::{
    extract::{Path, State},
    Json,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Deserialize;
use tracing::info;
use uuid::Uuid;

use crate::error::PlannerError;
use crate::logic;
use crate::models::{Db, Subject, SubjectEntry, WeeklyAvailability};
use crate::routes_plan::now_fixed_offset;
use crate::store;
use crate::AppState;

// Regenerate the timetable after an input change, if one exists.
// Removing the last subject drops the timetable entirely.
fn regenerate_if_present(db: &mut Db, now: DateTime<FixedOffset>) -> Result<(), PlannerError> {
    if db.timetable.is_none() {
        return Ok(());
    }
    if db.subjects.is_empty() {
        db.timetable = None;
        return Ok(());
    }
    let availability = db.availability.normalized();
    db.timetable = Some(logic::generate_timetable(&db.subject_list(), &availability, now)?);
    info!(subjects = db.subjects.len(), "timetable regenerated");
    Ok(())
}

// -----------------------------
// GET /api/subjects
// -----------------------------
pub async fn get_subjects(State(state): State<AppState>) -> Result<Json<Vec<SubjectEntry>>, PlannerError> {
    let db = store::load_db(&state.config.db_path)?;
    Ok(Json(db.subjects))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSubjectInput {
    pub name: String,
    pub confidence_level: i64, // 1..=5
    pub exam_date: String,     // "YYYY-MM-DD"
}

// -----------------------------
// POST /api/subjects
// Validates and stores a new subject, refreshing any timetable
// -----------------------------
pub async fn create_subject(
    State(state): State<AppState>,
    Json(input): Json<CreateSubjectInput>,
) -> Result<Json<SubjectEntry>, PlannerError> {
    if input.name.trim().is_empty() {
        return Err(PlannerError::InvalidInput("name required".into()));
    }
    if !(1..=5).contains(&input.confidence_level) {
        return Err(PlannerError::InvalidInput("confidence level must be 1..=5".into()));
    }
    let exam_date = NaiveDate::parse_from_str(&input.exam_date, "%Y-%m-%d")
        .map_err(|_| PlannerError::InvalidInput("invalid exam date".into()))?;

    let _guard = state.write_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;

    let entry = SubjectEntry {
        id: Uuid::new_v4(),
        subject: Subject {
            name: input.name,
            confidence_level: input.confidence_level,
            exam_date,
        },
        created_at: now_fixed_offset(),
    };
    db.subjects.push(entry.clone());
    regenerate_if_present(&mut db, now_fixed_offset())?;
    store::save_db(&state.config.db_path, &db)?;

    info!(id = %entry.id, name = %entry.subject.name, "subject added");
    Ok(Json(entry))
}

// -----------------------------
// DELETE /api/subjects/:id
// -----------------------------
pub async fn delete_subject(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<serde_json::Value>, PlannerError> {
    let id = Uuid::parse_str(&id).map_err(|_| PlannerError::InvalidInput("invalid id".into()))?;

    let _guard = state.write_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;

    let before = db.subjects.len();
    db.subjects.retain(|s| s.id != id);
    if db.subjects.len() == before {
        return Err(PlannerError::NotFound("subject not found".into()));
    }

    regenerate_if_present(&mut db, now_fixed_offset())?;
    store::save_db(&state.config.db_path, &db)?;

    info!(id = %id, "subject removed");
    Ok(Json(serde_json::json!({ "ok": true })))
}

// -----------------------------
// GET /api/availability
// -----------------------------
pub async fn get_availability(State(state): State<AppState>) -> Result<Json<WeeklyAvailability>, PlannerError> {
    let db = store::load_db(&state.config.db_path)?;
    Ok(Json(db.availability.normalized()))
}

// -----------------------------
// PUT /api/availability
// Clamps each day into range and fills absent days with zero
// -----------------------------
pub async fn put_availability(
    State(state): State<AppState>,
    Json(availability): Json<WeeklyAvailability>,
) -> Result<Json<WeeklyAvailability>, PlannerError> {
    let _guard = state.write_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;

    db.availability = availability.normalized();
    regenerate_if_present(&mut db, now_fixed_offset())?;
    store::save_db(&state.config.db_path, &db)?;

    Ok(Json(db.availability))
}
