use crate::models::{ChatMessageRow, EventRow, UserRow};
use crate::Database;
use anyhow::Result;
use campus_types::models::Event;
use rusqlite::{Connection, Row};

const USER_COLUMNS: &str =
    "id, email, username, hashed_password, full_name, is_active, created_at";
const EVENT_COLUMNS: &str = "id, name, date, location, description, created_at";

impl Database {
    // -- Users --

    pub fn create_user(
        &self,
        email: &str,
        username: &str,
        password_hash: &str,
        full_name: Option<&str>,
    ) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO users (email, username, hashed_password, full_name, is_active)
                 VALUES (?1, ?2, ?3, ?4, 1)",
                rusqlite::params![email, username, password_hash, full_name],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "email", email))
    }

    pub fn get_user_by_username(&self, username: &str) -> Result<Option<UserRow>> {
        self.with_conn(|conn| query_user(conn, "username", username))
    }

    // -- Events --

    pub fn insert_event(&self, event: &Event) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO events (name, date, location, description) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![event.name, event.date, event.location, event.description],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// All events, soonest first.
    pub fn list_events(&self) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            query_events(
                conn,
                &format!("SELECT {EVENT_COLUMNS} FROM events ORDER BY date, id"),
                rusqlite::params![],
            )
        })
    }

    /// Events on or after `today` (`YYYY-MM-DD`), soonest first.
    ///
    /// Dates are free text, so this is a lexical comparison. It is correct for
    /// ISO dates, which is what the seed data uses.
    pub fn upcoming_events(&self, today: &str, limit: u32) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            query_events(
                conn,
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE date >= ?1 ORDER BY date, id LIMIT ?2"
                ),
                rusqlite::params![today, limit],
            )
        })
    }

    /// Events with `from <= date <= to`, both bounds inclusive.
    pub fn events_between(&self, from: &str, to: &str) -> Result<Vec<EventRow>> {
        self.with_conn(|conn| {
            query_events(
                conn,
                &format!(
                    "SELECT {EVENT_COLUMNS} FROM events WHERE date >= ?1 AND date <= ?2 ORDER BY date, id"
                ),
                rusqlite::params![from, to],
            )
        })
    }

    pub fn event_names(&self) -> Result<Vec<String>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare("SELECT name FROM events")?;
            let names = stmt
                .query_map([], |row| row.get(0))?
                .collect::<std::result::Result<Vec<String>, _>>()?;
            Ok(names)
        })
    }

    pub fn count_events(&self) -> Result<u64> {
        self.with_conn(|conn| {
            let count: i64 = conn.query_row("SELECT COUNT(*) FROM events", [], |row| row.get(0))?;
            Ok(count as u64)
        })
    }

    pub fn update_event_date(&self, id: i64, date: &str) -> Result<()> {
        self.with_conn(|conn| {
            conn.execute("UPDATE events SET date = ?1 WHERE id = ?2", rusqlite::params![date, id])?;
            Ok(())
        })
    }

    // -- Chat history --

    pub fn insert_chat_message(&self, user_id: i64, message: &str, response: &str) -> Result<i64> {
        self.with_conn(|conn| {
            conn.execute(
                "INSERT INTO chat_messages (user_id, message, response) VALUES (?1, ?2, ?3)",
                rusqlite::params![user_id, message, response],
            )?;
            Ok(conn.last_insert_rowid())
        })
    }

    /// Most recent exchanges for a user, newest first.
    pub fn recent_chat_messages(&self, user_id: i64, limit: u32) -> Result<Vec<ChatMessageRow>> {
        self.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, user_id, message, response, timestamp
                 FROM chat_messages
                 WHERE user_id = ?1
                 ORDER BY timestamp DESC, id DESC
                 LIMIT ?2",
            )?;

            let rows = stmt
                .query_map(rusqlite::params![user_id, limit], |row| {
                    Ok(ChatMessageRow {
                        id: row.get(0)?,
                        user_id: row.get(1)?,
                        message: row.get(2)?,
                        response: row.get(3)?,
                        timestamp: row.get(4)?,
                    })
                })?
                .collect::<std::result::Result<Vec<_>, _>>()?;

            Ok(rows)
        })
    }
}

fn query_user(conn: &Connection, column: &str, value: &str) -> Result<Option<UserRow>> {
    // `column` is always one of our own literals, never user input.
    let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users WHERE {column} = ?1"))?;

    let row = stmt.query_row([value], user_from_row).optional()?;

    Ok(row)
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<UserRow> {
    Ok(UserRow {
        id: row.get(0)?,
        email: row.get(1)?,
        username: row.get(2)?,
        hashed_password: row.get(3)?,
        full_name: row.get(4)?,
        is_active: row.get::<_, i64>(5)? != 0,
        created_at: row.get(6)?,
    })
}

fn query_events<P: rusqlite::Params>(conn: &Connection, sql: &str, params: P) -> Result<Vec<EventRow>> {
    let mut stmt = conn.prepare(sql)?;

    let rows = stmt
        .query_map(params, |row| {
            Ok(EventRow {
                id: row.get(0)?,
                name: row.get(1)?,
                date: row.get(2)?,
                location: row.get(3)?,
                description: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;

    Ok(rows)
}

/// Extension trait for optional query results
trait OptionalExt<T> {
    fn optional(self) -> Result<Option<T>>;
}

impl<T> OptionalExt<T> for std::result::Result<T, rusqlite::Error> {
    fn optional(self) -> Result<Option<T>> {
        match self {
            Ok(val) => Ok(Some(val)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

/// True when `err` came from a UNIQUE (or other) constraint rejecting a write.
pub fn is_constraint_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _)) if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, date: &str) -> Event {
        Event {
            name: name.to_string(),
            date: date.to_string(),
            location: "Main Library".to_string(),
            description: "Test event".to_string(),
        }
    }

    #[test]
    fn user_lookup_by_email_and_username() {
        let db = Database::open_in_memory().unwrap();
        let id = db.create_user("ada@campus.edu", "ada", "hash", Some("Ada L")).unwrap();

        let by_email = db.get_user_by_email("ada@campus.edu").unwrap().unwrap();
        assert_eq!(by_email.id, id);
        assert_eq!(by_email.full_name.as_deref(), Some("Ada L"));
        assert!(by_email.is_active);

        let by_name = db.get_user_by_username("ada").unwrap().unwrap();
        assert_eq!(by_name.email, "ada@campus.edu");

        assert!(db.get_user_by_email("nobody@campus.edu").unwrap().is_none());
    }

    #[test]
    fn duplicate_email_violates_unique_constraint() {
        let db = Database::open_in_memory().unwrap();
        db.create_user("ada@campus.edu", "ada", "hash", None).unwrap();

        let err = db.create_user("ada@campus.edu", "ada2", "hash", None).unwrap_err();
        assert!(is_constraint_violation(&err));
        assert!(!is_constraint_violation(&anyhow::anyhow!("unrelated")));
    }

    #[test]
    fn upcoming_events_are_filtered_ordered_and_limited() {
        let db = Database::open_in_memory().unwrap();
        db.insert_event(&event("Past", "2020-01-01")).unwrap();
        db.insert_event(&event("Later", "2030-06-01")).unwrap();
        db.insert_event(&event("Sooner", "2030-01-01")).unwrap();
        db.insert_event(&event("Today", "2029-12-31")).unwrap();

        let names: Vec<String> = db
            .upcoming_events("2029-12-31", 2)
            .unwrap()
            .into_iter()
            .map(|e| e.name)
            .collect();
        assert_eq!(names, vec!["Today", "Sooner"]);
    }

    #[test]
    fn events_between_is_inclusive() {
        let db = Database::open_in_memory().unwrap();
        db.insert_event(&event("A", "2030-01-01")).unwrap();
        db.insert_event(&event("B", "2030-01-08")).unwrap();
        db.insert_event(&event("C", "2030-01-09")).unwrap();

        let rows = db.events_between("2030-01-01", "2030-01-08").unwrap();
        assert_eq!(rows.len(), 2);
    }

    #[test]
    fn chat_history_is_newest_first() {
        let db = Database::open_in_memory().unwrap();
        db.insert_chat_message(7, "first?", "one").unwrap();
        db.insert_chat_message(7, "second?", "two").unwrap();
        db.insert_chat_message(8, "other", "three").unwrap();

        let rows = db.recent_chat_messages(7, 10).unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].message, "second?");
        assert_eq!(rows[1].response, "one");
    }
}
