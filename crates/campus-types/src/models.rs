use serde::{Deserialize, Serialize};

/// A campus activity as it appears in the fixture file and in prompts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub name: String,
    pub date: String,
    pub location: String,
    pub description: String,
}

/// Display bucket an event is sorted into on the listing pages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Academic,
    Sports,
    Arts,
    Social,
    General,
}

impl Category {
    /// Listing order on the pages.
    pub const ALL: [Category; 5] = [
        Category::Academic,
        Category::Sports,
        Category::Arts,
        Category::Social,
        Category::General,
    ];

    pub fn label(self) -> &'static str {
        match self {
            Category::Academic => "Academic Events",
            Category::Sports => "Sports & Fitness",
            Category::Arts => "Arts & Culture",
            Category::Social => "Social Gatherings",
            Category::General => "Other Events",
        }
    }
}

/// An event prepared for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventCard {
    pub name: String,
    pub date: String,
    pub display_date: String,
    pub location: String,
    pub description: String,
    pub category: Category,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventGroup {
    pub category: Category,
    pub label: String,
    pub events: Vec<EventCard>,
}

/// The signed-in user as handlers see it. Never carries the password hash.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentUser {
    pub id: i64,
    pub email: String,
    pub username: String,
    pub full_name: Option<String>,
}

impl CurrentUser {
    pub fn display_name(&self) -> &str {
        self.full_name.as_deref().unwrap_or(&self.username)
    }
}
