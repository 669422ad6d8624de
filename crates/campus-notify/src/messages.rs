use campus_types::models::Event;

/// A plain-text email ready to hand to the [`Mailer`](crate::Mailer).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Email {
    pub subject: String,
    pub body: String,
}

pub fn welcome_subscriber() -> Email {
    Email {
        subject: "Welcome to Campus Events!".into(),
        body: "\
Thank you for subscribing to Campus Events!

You'll now receive notifications about:
- New campus events
- Event updates and changes
- Upcoming event reminders

Stay tuned for exciting events!

Best regards,
The Campus Events Team"
            .into(),
    }
}

pub fn welcome_registered() -> Email {
    Email {
        subject: "Welcome!".into(),
        body: "You have successfully registered for Campus Event Notifier!".into(),
    }
}

pub fn event_reminder(event: &Event) -> Email {
    Email {
        subject: format!("Upcoming Event: {}", event.name),
        body: format!(
            "\
Hello!

We have an exciting event coming up:

Event: {}
Date: {}
Location: {}

Don't miss out! Mark your calendar and join us.

Best regards,
Campus Event Notifier Team",
            event.name, event.date, event.location
        ),
    }
}
