use anyhow::Result;
use campus_db::Database;
use campus_types::models::Event;
use chrono::{Days, NaiveDate};
use tracing::{info, warn};

use crate::messages;
use crate::{Mailer, SubscriberStore};

/// How far ahead the reminder job looks.
pub const LOOKAHEAD_DAYS: u64 = 7;

const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReminderReport {
    pub events: usize,
    pub sent: usize,
    pub failed: usize,
}

/// Events taking place exactly one day after `today`.
/// Dates that are not `YYYY-MM-DD` are skipped.
pub fn due_tomorrow(events: &[Event], today: NaiveDate) -> Vec<&Event> {
    let Some(tomorrow) = today.checked_add_days(Days::new(1)) else {
        return vec![];
    };

    events
        .iter()
        .filter(|event| {
            NaiveDate::parse_from_str(&event.date, DATE_FORMAT).is_ok_and(|date| date == tomorrow)
        })
        .collect()
}

/// Emails every subscriber about each event happening tomorrow.
pub async fn send_due_reminders(
    db: &Database,
    mailer: &Mailer,
    subscribers: &SubscriberStore,
    today: NaiveDate,
) -> Result<ReminderReport> {
    let horizon = today
        .checked_add_days(Days::new(LOOKAHEAD_DAYS))
        .unwrap_or(today);
    let window: Vec<Event> = db
        .events_between(
            &today.format(DATE_FORMAT).to_string(),
            &horizon.format(DATE_FORMAT).to_string(),
        )?
        .iter()
        .map(|row| row.to_event())
        .collect();

    let due = due_tomorrow(&window, today);
    let mut report = ReminderReport {
        events: due.len(),
        ..ReminderReport::default()
    };
    if due.is_empty() {
        return Ok(report);
    }

    let recipients = subscribers.list().await?;
    if recipients.is_empty() {
        warn!("{} events due tomorrow but nobody is subscribed", due.len());
        return Ok(report);
    }

    for event in due {
        let email = messages::event_reminder(event);
        for to in &recipients {
            if mailer.send(to, &email).await {
                report.sent += 1;
            } else {
                report.failed += 1;
            }
        }
        info!("Reminder for '{}' on {} processed", event.name, event.date);
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(name: &str, date: &str) -> Event {
        Event {
            name: name.into(),
            date: date.into(),
            location: "Quad".into(),
            description: String::new(),
        }
    }

    fn day(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, DATE_FORMAT).unwrap()
    }

    #[test]
    fn only_tomorrows_events_are_due() {
        let events = vec![
            event("Today", "2030-01-10"),
            event("Tomorrow", "2030-01-11"),
            event("Later", "2030-01-14"),
            event("Unknown", "sometime"),
        ];

        let due = due_tomorrow(&events, day("2030-01-10"));
        assert_eq!(due.len(), 1);
        assert_eq!(due[0].name, "Tomorrow");
    }

    #[test]
    fn month_boundaries_are_handled() {
        let events = vec![event("New Year", "2031-01-01")];
        assert_eq!(due_tomorrow(&events, day("2030-12-31")).len(), 1);
    }

    #[tokio::test]
    async fn disabled_mailer_counts_failures() {
        let db = Database::open_in_memory().unwrap();
        db.insert_event(&event("Tomorrow", "2030-01-11")).unwrap();
        db.insert_event(&event("Next Week", "2030-01-16")).unwrap();

        let path = std::env::temp_dir().join(format!("campus_reminders_{}.txt", std::process::id()));
        std::fs::write(&path, "a@x.edu\nb@x.edu\n").unwrap();
        let subscribers = SubscriberStore::new(path.clone());

        let report = send_due_reminders(&db, &Mailer::disabled(), &subscribers, day("2030-01-10"))
            .await
            .unwrap();
        std::fs::remove_file(&path).ok();

        assert_eq!(report, ReminderReport { events: 1, sent: 0, failed: 2 });
    }
}
