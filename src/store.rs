use std::{fs, io, path::Path};

use crate::error::PlannerError;
use crate::models::Db;

// Missing file = fresh, empty planner.
pub fn load_db(path: &Path) -> Result<Db, PlannerError> {
    let text = match fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Db::default()),
        Err(e) => return Err(e.into()),
    };
    let db: Db = serde_json::from_str(&text)?;
    Ok(db)
}

// Write to a temp file first, then rename over the real one.
pub fn save_db(path: &Path, db: &Db) -> Result<(), PlannerError> {
    let tmp_path = path.with_extension("json.tmp");
    let text = serde_json::to_string_pretty(db)?;

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&tmp_path, text)?;
    fs::rename(&tmp_path, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logic::generate_timetable;
    use crate::models::{Day, Subject, SubjectEntry, WeeklyAvailability};
    use chrono::{DateTime, NaiveDate};
    use uuid::Uuid;

    #[test]
    fn missing_file_loads_default() {
        let dir = tempfile::tempdir().unwrap();
        let db = load_db(&dir.path().join("absent.json")).unwrap();
        assert_eq!(db, Db::default());
    }

    #[test]
    fn saves_and_reloads_state() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("db.json");
        let now = DateTime::parse_from_rfc3339("2026-10-19T09:30:00+02:00").unwrap();

        let subject = Subject {
            name: "Chemistry".to_string(),
            confidence_level: 2,
            exam_date: NaiveDate::from_ymd_opt(2026, 11, 2).unwrap(),
        };
        let availability = WeeklyAvailability::uniform(1, 30);
        let mut db = Db {
            subjects: vec![SubjectEntry {
                id: Uuid::new_v4(),
                subject: subject.clone(),
                created_at: now,
            }],
            availability: availability.clone(),
            ..Db::default()
        };
        db.timetable = Some(generate_timetable(&[subject], &availability, now).unwrap());
        db.locked_days = db.locked_days.toggled(Day::Sunday);

        save_db(&path, &db).unwrap();
        assert!(!path.with_extension("json.tmp").exists());
        assert_eq!(load_db(&path).unwrap(), db);
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(load_db(&path), Err(PlannerError::Json(_))));
    }
}
