pub mod mailer;
pub mod messages;
pub mod reminders;
pub mod subscribers;

pub use mailer::{Mailer, SmtpSettings, is_valid_address};
pub use subscribers::SubscriberStore;
