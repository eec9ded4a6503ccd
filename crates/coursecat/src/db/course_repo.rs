//! Course repository — reads and category writes for the `courses` table.

use chrono::{DateTime, Utc};
use rusqlite::{params, Row};

use super::{format_timestamp, parse_timestamp, Database, DatabaseError};
use crate::course::{CategorySource, CategoryUpdate, CourseRecord, CORRECTED_CONFIDENCE};

const SELECT_COLUMNS: &str = "id, title, original_title, description, original_description,
     course_name, category, category_source, category_confidence, category_generated_at,
     category_fixed_at, category_version";

fn from_row(row: &Row<'_>) -> Result<CourseRecord, DatabaseError> {
    let generated_at: Option<String> = row.get("category_generated_at")?;
    let fixed_at: Option<String> = row.get("category_fixed_at")?;
    let source: Option<String> = row.get("category_source")?;

    Ok(CourseRecord {
        id: row.get("id")?,
        title: row.get("title")?,
        original_title: row.get("original_title")?,
        description: row.get("description")?,
        original_description: row.get("original_description")?,
        course_name: row.get("course_name")?,
        category: row.get("category")?,
        category_source: source.as_deref().map(CategorySource::parse),
        category_confidence: row.get("category_confidence")?,
        category_generated_at: generated_at
            .map(|s| parse_timestamp("category_generated_at", &s))
            .transpose()?,
        category_fixed_at: fixed_at
            .map(|s| parse_timestamp("category_fixed_at", &s))
            .transpose()?,
        category_version: row.get("category_version")?,
    })
}

fn collect_rows(
    stmt: &mut rusqlite::Statement<'_>,
    params: impl rusqlite::Params,
) -> Result<Vec<CourseRecord>, DatabaseError> {
    let mut rows = stmt.query(params)?;
    let mut records = Vec::new();
    while let Some(row) = rows.next()? {
        records.push(from_row(row)?);
    }
    Ok(records)
}

/// Inserts a record, or replaces every field of an existing one.
pub fn upsert(db: &Database, record: &CourseRecord) -> Result<(), DatabaseError> {
    db.with_conn(|conn| {
        conn.execute(
            "INSERT INTO courses (id, title, original_title, description, original_description,
             course_name, category, category_source, category_confidence,
             category_generated_at, category_fixed_at, category_version)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
             ON CONFLICT(id) DO UPDATE SET
               title = excluded.title,
               original_title = excluded.original_title,
               description = excluded.description,
               original_description = excluded.original_description,
               course_name = excluded.course_name,
               category = excluded.category,
               category_source = excluded.category_source,
               category_confidence = excluded.category_confidence,
               category_generated_at = excluded.category_generated_at,
               category_fixed_at = excluded.category_fixed_at,
               category_version = excluded.category_version",
            params![
                record.id,
                record.title,
                record.original_title,
                record.description,
                record.original_description,
                record.course_name,
                record.category,
                record.category_source.map(|s| s.as_str()),
                record.category_confidence,
                record.category_generated_at.map(format_timestamp),
                record.category_fixed_at.map(format_timestamp),
                record.category_version,
            ],
        )?;
        Ok(())
    })
}

/// Finds a course by its ID.
pub fn find_by_id(db: &Database, id: &str) -> Result<Option<CourseRecord>, DatabaseError> {
    db.with_conn(|conn| {
        let sql = format!("SELECT {} FROM courses WHERE id = ?1", SELECT_COLUMNS);
        let mut stmt = conn.prepare(&sql)?;
        let mut records = collect_rows(&mut stmt, params![id])?;
        Ok(records.pop())
    })
}

/// Lists courses in key order, starting after `after_id`.
///
/// `limit = None` reads everything that remains.
pub fn list_page(
    db: &Database,
    after_id: Option<&str>,
    limit: Option<u64>,
) -> Result<Vec<CourseRecord>, DatabaseError> {
    db.with_conn(|conn| {
        // SQLite treats a negative LIMIT as "no limit".
        let limit = limit.map(|l| l as i64).unwrap_or(-1);
        let sql = format!(
            "SELECT {} FROM courses WHERE (?1 IS NULL OR id > ?1) ORDER BY id LIMIT ?2",
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        collect_rows(&mut stmt, params![after_id, limit])
    })
}

/// Counts all courses.
pub fn count(db: &Database) -> Result<u64, DatabaseError> {
    db.with_conn(|conn| {
        let count: u64 = conn.query_row("SELECT COUNT(*) FROM courses", [], |r| r.get(0))?;
        Ok(count)
    })
}

/// Applies category updates atomically: all rows change or none do.
///
/// `now` is stamped into `category_generated_at` or `category_fixed_at`
/// depending on the update kind. Returns the number of rows touched.
pub fn apply_updates(
    db: &Database,
    updates: &[CategoryUpdate],
    now: DateTime<Utc>,
) -> Result<usize, DatabaseError> {
    let stamp = format_timestamp(now);
    db.with_conn_mut(|conn| {
        let tx = conn.transaction()?;
        let mut touched = 0;
        for update in updates {
            touched += match update {
                CategoryUpdate::Generated {
                    record_id,
                    category,
                    confidence,
                    version,
                } => tx.execute(
                    "UPDATE courses SET category = ?2, category_source = ?3,
                     category_confidence = ?4, category_generated_at = ?5,
                     category_version = ?6
                     WHERE id = ?1",
                    params![
                        record_id,
                        category,
                        update.source().as_str(),
                        confidence,
                        stamp,
                        version,
                    ],
                )?,
                CategoryUpdate::Corrected {
                    record_id,
                    category,
                } => tx.execute(
                    "UPDATE courses SET category = ?2, category_source = ?3,
                     category_confidence = ?4, category_fixed_at = ?5
                     WHERE id = ?1",
                    params![
                        record_id,
                        category,
                        update.source().as_str(),
                        CORRECTED_CONFIDENCE,
                        stamp,
                    ],
                )?,
            };
        }
        tx.commit()?;
        Ok(touched)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn test_db() -> Database {
        Database::open_in_memory().expect("Failed to create test database")
    }

    fn sample_course(id: &str) -> CourseRecord {
        CourseRecord {
            title: Some(format!("Course {}", id)),
            course_name: Some("Internal Medicine".to_string()),
            ..CourseRecord::new(id)
        }
    }

    fn generated(id: &str, category: &str) -> CategoryUpdate {
        CategoryUpdate::Generated {
            record_id: id.to_string(),
            category: category.to_string(),
            confidence: "high".to_string(),
            version: "1.0".to_string(),
        }
    }

    #[test]
    fn test_upsert_and_find() {
        let db = test_db();
        upsert(&db, &sample_course("c-1")).unwrap();

        let found = find_by_id(&db, "c-1").unwrap().unwrap();
        assert_eq!(found.title.as_deref(), Some("Course c-1"));
        assert!(found.category.is_none());
        assert!(found.category_source.is_none());
    }

    #[test]
    fn test_upsert_replaces_existing() {
        let db = test_db();
        upsert(&db, &sample_course("c-1")).unwrap();

        let mut changed = sample_course("c-1");
        changed.title = Some("Renamed".to_string());
        changed.category = Some("Cardiology".to_string());
        changed.category_source = Some(CategorySource::Unknown);
        upsert(&db, &changed).unwrap();

        assert_eq!(count(&db).unwrap(), 1);
        let found = find_by_id(&db, "c-1").unwrap().unwrap();
        assert_eq!(found, changed);
    }

    #[test]
    fn test_find_nonexistent() {
        let db = test_db();
        assert!(find_by_id(&db, "missing").unwrap().is_none());
    }

    #[test]
    fn test_list_page_keyset() {
        let db = test_db();
        for id in ["c", "a", "e", "b", "d"] {
            upsert(&db, &sample_course(id)).unwrap();
        }

        let all = list_page(&db, None, None).unwrap();
        let ids: Vec<_> = all.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["a", "b", "c", "d", "e"]);

        let first = list_page(&db, None, Some(2)).unwrap();
        assert_eq!(first.len(), 2);
        let next = list_page(&db, Some(&first[1].id), Some(2)).unwrap();
        let ids: Vec<_> = next.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, ["c", "d"]);

        assert!(list_page(&db, Some("e"), Some(2)).unwrap().is_empty());
    }

    #[test]
    fn test_apply_generated_update() {
        let db = test_db();
        upsert(&db, &sample_course("g-1")).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();

        let touched = apply_updates(&db, &[generated("g-1", "Cardiology")], now).unwrap();
        assert_eq!(touched, 1);

        let found = find_by_id(&db, "g-1").unwrap().unwrap();
        assert_eq!(found.category.as_deref(), Some("Cardiology"));
        assert_eq!(found.category_source, Some(CategorySource::OpenAi));
        assert_eq!(found.category_confidence.as_deref(), Some("high"));
        assert_eq!(found.category_version.as_deref(), Some("1.0"));
        assert_eq!(found.category_generated_at, Some(now));
        assert!(found.category_fixed_at.is_none());
    }

    #[test]
    fn test_apply_corrected_update() {
        let db = test_db();
        let mut course = sample_course("f-1");
        course.category = Some("cardio stuff".to_string());
        upsert(&db, &course).unwrap();
        let now = Utc.with_ymd_and_hms(2026, 3, 2, 8, 30, 0).unwrap();

        apply_updates(
            &db,
            &[CategoryUpdate::Corrected {
                record_id: "f-1".to_string(),
                category: "Cardiology".to_string(),
            }],
            now,
        )
        .unwrap();

        let found = find_by_id(&db, "f-1").unwrap().unwrap();
        assert_eq!(found.category.as_deref(), Some("Cardiology"));
        assert_eq!(found.category_source, Some(CategorySource::ValidationFix));
        assert_eq!(found.category_confidence.as_deref(), Some("corrected"));
        assert_eq!(found.category_fixed_at, Some(now));
        assert!(found.category_generated_at.is_none());
    }

    #[test]
    fn test_apply_updates_unknown_id_touches_nothing() {
        let db = test_db();
        upsert(&db, &sample_course("x")).unwrap();

        let touched = apply_updates(
            &db,
            &[generated("x", "Neurology"), generated("ghost", "Neurology")],
            Utc::now(),
        )
        .unwrap();
        assert_eq!(touched, 1);
    }

    #[test]
    fn test_corrupt_timestamp_is_reported() {
        let db = test_db();
        db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO courses (id, category_generated_at) VALUES ('bad', 'not-a-date')",
                [],
            )?;
            Ok(())
        })
        .unwrap();

        let err = find_by_id(&db, "bad").unwrap_err();
        assert!(matches!(err, DatabaseError::Decode { column, .. } if column == "category_generated_at"));
    }
}
