// --------------------------------------------------
// Handles API endpoints for the generated timetable.
//
// Responsibilities:
// - Generate / fetch / reset the timetable
// - Reschedule a missed day
// - Lock / unlock days
// --------------------------------------------------

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::PlannerError;
use crate::logic;
use crate::models::{Day, LockedDays, Timetable};
use crate::replan;
use crate::store;
use crate::AppState;

// Minimum weekly availability accepted before generating
const MIN_TOTAL_MINUTES: i64 = 60;

// Local time with its current offset
pub fn now_fixed_offset() -> DateTime<FixedOffset> {
    chrono::Local::now().fixed_offset()
}

// -----------------------------
// POST /api/timetable
// Generates a timetable from the stored subjects and availability
// -----------------------------
pub async fn create_timetable(State(state): State<AppState>) -> Result<Json<Timetable>, PlannerError> {
    let _guard = state.write_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;

    if db.subjects.is_empty() {
        return Err(PlannerError::InvalidInput("add at least one subject".into()));
    }
    if logic::time_budget(&db.availability).total_minutes < MIN_TOTAL_MINUTES {
        return Err(PlannerError::InvalidInput(
            "add some weekly availability (at least 1 hour total)".into(),
        ));
    }

    let availability = db.availability.normalized();
    let timetable = logic::generate_timetable(&db.subject_list(), &availability, now_fixed_offset())?;
    db.timetable = Some(timetable.clone());
    store::save_db(&state.config.db_path, &db)?;

    Ok(Json(timetable))
}

// -----------------------------
// GET /api/timetable
// -----------------------------
pub async fn get_timetable(State(state): State<AppState>) -> Result<Json<Timetable>, PlannerError> {
    let db = store::load_db(&state.config.db_path)?;
    db.timetable
        .map(Json)
        .ok_or_else(|| PlannerError::NotFound("no timetable generated".into()))
}

// -----------------------------
// DELETE /api/timetable
// Back to the input stage; subjects and locks are kept
// -----------------------------
pub async fn reset_timetable(State(state): State<AppState>) -> Result<Json<serde_json::Value>, PlannerError> {
    let _guard = state.write_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;
    db.timetable = None;
    store::save_db(&state.config.db_path, &db)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

#[derive(Debug, Deserialize)]
pub struct RescheduleQuery {
    pub date: Option<String>, // "YYYY-MM-DD", defaults to today
}

// -----------------------------
// POST /api/timetable/reschedule
// Moves the missed day's sessions onto the other unlocked days
// -----------------------------
pub async fn reschedule(
    State(state): State<AppState>,
    Query(q): Query<RescheduleQuery>,
) -> Result<Json<Timetable>, PlannerError> {
    let date = match q.date.as_deref() {
        Some(text) => NaiveDate::parse_from_str(text, "%Y-%m-%d")
            .map_err(|_| PlannerError::InvalidInput("invalid date".into()))?,
        None => now_fixed_offset().date_naive(),
    };

    let _guard = state.write_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;
    let Some(current) = db.timetable.as_ref() else {
        return Err(PlannerError::NotFound("no timetable generated".into()));
    };

    let updated = replan::reschedule_missed_day(current, date, &db.locked_days);
    db.timetable = Some(updated.clone());
    store::save_db(&state.config.db_path, &db)?;

    Ok(Json(updated))
}

// -----------------------------
// GET /api/locks
// -----------------------------
pub async fn get_locks(State(state): State<AppState>) -> Result<Json<LockedDays>, PlannerError> {
    let db = store::load_db(&state.config.db_path)?;
    Ok(Json(db.locked_days))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LockResponse {
    pub locked_days: LockedDays,
    pub timetable: Option<Timetable>,
}

// -----------------------------
// POST /api/locks/:day/toggle
// Flips a day's lock; locking moves its sessions elsewhere
// -----------------------------
pub async fn toggle_lock(
    State(state): State<AppState>,
    Path(day): Path<String>,
) -> Result<Json<LockResponse>, PlannerError> {
    let day: Day = day.parse()?;

    let _guard = state.write_lock.lock().await;
    let mut db = store::load_db(&state.config.db_path)?;

    match db.timetable.as_ref() {
        Some(current) => {
            let toggled = replan::toggle_day_lock(current, day, &db.locked_days);
            db.timetable = Some(toggled.timetable);
            db.locked_days = toggled.locked_days;
        }
        None => db.locked_days = db.locked_days.toggled(day),
    }
    store::save_db(&state.config.db_path, &db)?;

    info!(day = %day, locked = db.locked_days.is_locked(day), "day lock toggled");
    Ok(Json(LockResponse {
        locked_days: db.locked_days,
        timetable: db.timetable,
    }))
}
