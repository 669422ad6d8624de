//! Startup seeding of the `events` table.
//!
//! Events come from a JSON fixture when one is present, otherwise from the
//! built-in list below (only into an empty table). Stale years are rolled
//! forward so the demo calendar always has something upcoming.

use std::collections::HashSet;
use std::path::Path;

use anyhow::{Context, Result};
use campus_types::models::Event;
use chrono::Datelike;
use tracing::{debug, info};

use crate::Database;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub added: usize,
    pub rolled_forward: usize,
}

/// Seed using the local clock's current year.
pub fn run(db: &Database, fixture: &Path) -> Result<SeedReport> {
    seed_events(db, fixture, chrono::Local::now().year())
}

pub fn seed_events(db: &Database, fixture: &Path, current_year: i32) -> Result<SeedReport> {
    let mut report = SeedReport::default();

    let source = match load_fixture(fixture)? {
        Some(events) => {
            debug!("Loaded {} events from {}", events.len(), fixture.display());
            Some(events)
        }
        None if db.count_events()? == 0 => {
            debug!("No fixture at {}, using built-in events", fixture.display());
            Some(default_events())
        }
        None => None,
    };

    if let Some(events) = source {
        let mut existing: HashSet<String> = db.event_names()?.into_iter().collect();
        for event in events {
            if existing.insert(event.name.clone()) {
                db.insert_event(&event)?;
                report.added += 1;
            }
        }
    }

    for row in db.list_events()? {
        if let Some(date) = roll_forward_year(&row.date, current_year) {
            db.update_event_date(row.id, &date)?;
            report.rolled_forward += 1;
        }
    }

    if report.added > 0 {
        info!("Seeded {} new events", report.added);
    }
    if report.rolled_forward > 0 {
        info!("Moved {} past events to {}", report.rolled_forward, current_year);
    }

    Ok(report)
}

/// Returns `Ok(None)` when the file does not exist.
pub fn load_fixture(path: &Path) -> Result<Option<Vec<Event>>> {
    if !path.exists() {
        return Ok(None);
    }

    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("reading event fixture {}", path.display()))?;
    let events: Vec<Event> = serde_json::from_str(&raw)
        .with_context(|| format!("parsing event fixture {}", path.display()))?;

    Ok(Some(events))
}

/// Rewrites the leading four-digit year of `date` when it is before
/// `current_year`. Anything without a leading year is left alone.
pub fn roll_forward_year(date: &str, current_year: i32) -> Option<String> {
    let prefix = date.get(..4)?;
    if !prefix.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    if date.as_bytes().get(4).is_some_and(u8::is_ascii_digit) {
        return None;
    }

    let year: i32 = prefix.parse().ok()?;
    if year >= current_year {
        return None;
    }

    Some(format!("{current_year}{}", &date[4..]))
}

pub fn default_events() -> Vec<Event> {
    let events = [
        (
            "Research Symposium",
            "2025-03-14",
            "Central Library, Room 204",
            "Undergraduate researchers present posters and short talks across all departments.",
        ),
        (
            "Career Fair",
            "2025-03-20",
            "Student Center Ballroom",
            "Meet recruiters from over fifty companies. Bring printed copies of your resume.",
        ),
        (
            "Spring Basketball Tournament",
            "2025-04-02",
            "Recreation Center Gym",
            "Three-on-three tournament open to all students. Register your team at the door.",
        ),
        (
            "Jazz Ensemble Concert",
            "2025-04-11",
            "Fine Arts Auditorium",
            "The university jazz ensemble performs standards and original compositions.",
        ),
        (
            "Machine Learning Workshop",
            "2025-04-18",
            "Engineering Lab 3",
            "Hands-on introduction to training and evaluating models in Python.",
        ),
        (
            "Earth Day Cleanup",
            "2025-04-22",
            "North Quad",
            "Help keep campus green. Gloves, bags and snacks are provided.",
        ),
        (
            "Alumni Networking Night",
            "2025-05-06",
            "Downtown Conference Suite",
            "Connect with alumni working in tech, finance, healthcare and the arts.",
        ),
    ];

    events
        .into_iter()
        .map(|(name, date, location, description)| Event {
            name: name.to_string(),
            date: date.to_string(),
            location: location.to_string(),
            description: description.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture_path(name: &str) -> std::path::PathBuf {
        std::env::temp_dir().join(format!("campus_seed_{}_{}.json", name, std::process::id()))
    }

    #[test]
    fn roll_forward_only_touches_past_years() {
        assert_eq!(roll_forward_year("2024-05-01", 2026).as_deref(), Some("2026-05-01"));
        assert_eq!(roll_forward_year("2026-05-01", 2026), None);
        assert_eq!(roll_forward_year("2031-05-01", 2026), None);
        assert_eq!(roll_forward_year("TBA", 2026), None);
        assert_eq!(roll_forward_year("20245-01-01", 2026), None);
        assert_eq!(roll_forward_year("", 2026), None);
    }

    #[test]
    fn empty_table_gets_builtin_events_without_fixture() {
        let db = Database::open_in_memory().unwrap();
        let report = seed_events(&db, &fixture_path("missing"), 2025).unwrap();

        assert_eq!(report.added, default_events().len());
        assert_eq!(report.rolled_forward, 0);
        assert_eq!(db.count_events().unwrap() as usize, default_events().len());
    }

    #[test]
    fn builtin_events_are_not_reinserted() {
        let db = Database::open_in_memory().unwrap();
        seed_events(&db, &fixture_path("missing-twice"), 2025).unwrap();
        let second = seed_events(&db, &fixture_path("missing-twice"), 2025).unwrap();

        assert_eq!(second.added, 0);
    }

    #[test]
    fn fixture_adds_only_new_names_and_rolls_dates() {
        let path = fixture_path("fixture");
        std::fs::write(
            &path,
            r#"[
                {"name": "Open Mic", "date": "2024-09-01", "location": "Union Lounge", "description": "Bring a song."},
                {"name": "Chess Club", "date": "2030-01-01", "location": "Library", "description": "Weekly games."}
            ]"#,
        )
        .unwrap();

        let db = Database::open_in_memory().unwrap();
        db.insert_event(&Event {
            name: "Chess Club".into(),
            date: "2030-01-01".into(),
            location: "Library".into(),
            description: "Weekly games.".into(),
        })
        .unwrap();

        let report = seed_events(&db, &path, 2026).unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(report, SeedReport { added: 1, rolled_forward: 1 });
        let dates: Vec<String> = db.list_events().unwrap().into_iter().map(|e| e.date).collect();
        assert_eq!(dates, vec!["2026-09-01", "2030-01-01"]);
    }

    #[test]
    fn malformed_fixture_is_an_error() {
        let path = fixture_path("broken");
        std::fs::write(&path, "{ not json").unwrap();

        let db = Database::open_in_memory().unwrap();
        let result = seed_events(&db, &path, 2026);
        std::fs::remove_file(&path).ok();

        assert!(result.is_err());
    }
}
