//! Database row types. These map directly to SQLite rows and stay separate
//! from the campus-types view models.

use campus_types::models::{CurrentUser, Event};

pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub hashed_password: String,
    pub full_name: Option<String>,
    pub is_active: bool,
    pub created_at: String,
}

impl UserRow {
    pub fn to_current_user(&self) -> CurrentUser {
        CurrentUser {
            id: self.id,
            email: self.email.clone(),
            username: self.username.clone(),
            full_name: self.full_name.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct EventRow {
    pub id: i64,
    pub name: String,
    pub date: String,
    pub location: String,
    pub description: String,
    pub created_at: String,
}

impl EventRow {
    pub fn to_event(&self) -> Event {
        Event {
            name: self.name.clone(),
            date: self.date.clone(),
            location: self.location.clone(),
            description: self.description.clone(),
        }
    }
}

pub struct ChatMessageRow {
    pub id: i64,
    pub user_id: i64,
    pub message: String,
    pub response: String,
    pub timestamp: String,
}
