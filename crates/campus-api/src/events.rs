use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use axum::{
    Json,
    extract::{Query, State},
};
use campus_db::Database;
use campus_db::models::EventRow;
use campus_types::api::SuggestionQuery;
use campus_types::models::{Category, EventCard, EventGroup};
use chrono::NaiveDate;
use tracing::debug;

use crate::AppState;
use crate::cache::TtlCache;
use crate::error::AppError;

/// Location keywords per category, checked in order. First match wins.
const CATEGORY_KEYWORDS: &[(Category, &[&str])] = &[
    (
        Category::Academic,
        &["library", "lecture", "classroom", "lab", "seminar", "department"],
    ),
    (Category::Sports, &["stadium", "gym", "field", "court", "arena", "pool"]),
    (
        Category::Arts,
        &["auditorium", "theater", "theatre", "gallery", "studio", "music"],
    ),
    (
        Category::Social,
        &["student center", "union", "quad", "cafeteria", "lounge", "plaza"],
    ),
];

const SUGGESTION_POOL: u32 = 20;
const MAX_SUGGESTIONS: usize = 5;
const CACHE_CAPACITY: usize = 16;

pub fn categorize(location: &str) -> Category {
    let location = location.to_lowercase();
    CATEGORY_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| location.contains(k)))
        .map(|(category, _)| *category)
        .unwrap_or(Category::General)
}

/// `2025-03-15` becomes `Saturday, March 15, 2025`. Anything else is shown as is.
pub fn display_date(date: &str) -> String {
    NaiveDate::parse_from_str(date.trim(), "%Y-%m-%d")
        .map(|d| d.format("%A, %B %-d, %Y").to_string())
        .unwrap_or_else(|_| date.to_string())
}

pub fn to_card(row: &EventRow) -> EventCard {
    EventCard {
        name: row.name.clone(),
        date: row.date.clone(),
        display_date: display_date(&row.date),
        location: row.location.clone(),
        description: row.description.clone(),
        category: categorize(&row.location),
    }
}

/// Cards bucketed by category in listing order. Empty buckets are left out.
pub fn group_by_category(cards: &[EventCard]) -> Vec<EventGroup> {
    Category::ALL
        .iter()
        .filter_map(|&category| {
            let events: Vec<EventCard> = cards
                .iter()
                .filter(|card| card.category == category)
                .cloned()
                .collect();
            (!events.is_empty()).then(|| EventGroup {
                category,
                label: category.label().to_string(),
                events,
            })
        })
        .collect()
}

/// Ranks events by how many interest words appear in their name or
/// description. Events matching nothing are dropped; ties keep date order.
pub fn suggest(cards: &[EventCard], interests: &str) -> Vec<EventCard> {
    let words: Vec<String> = interests.split_whitespace().map(str::to_lowercase).collect();
    if words.is_empty() {
        return vec![];
    }

    let mut scored: Vec<(usize, &EventCard)> = cards
        .iter()
        .map(|card| {
            let text = format!("{} {}", card.name, card.description).to_lowercase();
            let score = words.iter().filter(|w| text.contains(w.as_str())).count();
            (score, card)
        })
        .filter(|(score, _)| *score > 0)
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0));
    scored
        .into_iter()
        .take(MAX_SUGGESTIONS)
        .map(|(_, card)| card.clone())
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum CatalogKey {
    All,
    Upcoming { today: NaiveDate, limit: u32 },
}

/// Event queries memoized for a fixed window. Events only change at
/// startup, so entries are never invalidated early.
pub struct EventCatalog {
    db: Arc<Database>,
    cache: TtlCache<CatalogKey, Arc<Vec<EventCard>>>,
}

impl EventCatalog {
    pub fn new(db: Arc<Database>, ttl: Duration) -> Self {
        Self {
            db,
            cache: TtlCache::new(ttl, CACHE_CAPACITY),
        }
    }

    pub fn all(&self) -> Result<Arc<Vec<EventCard>>> {
        self.cached(CatalogKey::All, |db| db.list_events())
    }

    pub fn upcoming(&self, today: NaiveDate, limit: u32) -> Result<Arc<Vec<EventCard>>> {
        let day = today.format("%Y-%m-%d").to_string();
        self.cached(CatalogKey::Upcoming { today, limit }, move |db| {
            db.upcoming_events(&day, limit)
        })
    }

    fn cached<F>(&self, key: CatalogKey, load: F) -> Result<Arc<Vec<EventCard>>>
    where
        F: FnOnce(&Database) -> Result<Vec<EventRow>>,
    {
        if let Some(hit) = self.cache.get(&key) {
            return Ok(hit);
        }

        let cards: Arc<Vec<EventCard>> = Arc::new(load(&self.db)?.iter().map(to_card).collect());
        debug!("Event cache miss for {:?}, loaded {} events", key, cards.len());
        self.cache.insert(key, cards.clone());
        Ok(cards)
    }
}

pub fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

// -- Handlers --

/// GET /api/events
pub async fn list_events(State(state): State<AppState>) -> Result<Json<Vec<EventCard>>, AppError> {
    let cards = state.events.all()?;
    Ok(Json(cards.as_ref().clone()))
}

/// GET /api/events/suggestions?interests=...
pub async fn suggestions(
    State(state): State<AppState>,
    Query(query): Query<SuggestionQuery>,
) -> Result<Json<Vec<EventCard>>, AppError> {
    let pool = state.events.upcoming(today(), SUGGESTION_POOL)?;
    Ok(Json(suggest(&pool, &query.interests)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use campus_types::models::Event;

    fn card(name: &str, description: &str, location: &str) -> EventCard {
        EventCard {
            name: name.into(),
            date: "2030-01-01".into(),
            display_date: String::new(),
            location: location.into(),
            description: description.into(),
            category: categorize(location),
        }
    }

    #[test]
    fn library_events_are_academic() {
        assert_eq!(categorize("Main Library, Room 2"), Category::Academic);
        assert_eq!(categorize("LIBRARY steps"), Category::Academic);
    }

    #[test]
    fn categories_follow_keyword_table() {
        assert_eq!(categorize("Memorial Stadium"), Category::Sports);
        assert_eq!(categorize("Fine Arts Auditorium"), Category::Arts);
        assert_eq!(categorize("North Quad"), Category::Social);
        assert_eq!(categorize("Downtown Conference Suite"), Category::General);
        assert_eq!(categorize(""), Category::General);
    }

    #[test]
    fn first_matching_category_wins() {
        // "lab" (Academic) is listed before "gym" (Sports).
        assert_eq!(categorize("Gym Lab Annex"), Category::Academic);
    }

    #[test]
    fn iso_dates_are_spelled_out() {
        assert_eq!(display_date("2025-03-15"), "Saturday, March 15, 2025");
        assert_eq!(display_date("next Tuesday"), "next Tuesday");
    }

    #[test]
    fn groups_keep_listing_order_and_skip_empty() {
        let cards = vec![
            card("Game", "", "Stadium"),
            card("Talk", "", "Library"),
            card("Mixer", "", "Somewhere"),
        ];
        let groups = group_by_category(&cards);

        let order: Vec<Category> = groups.iter().map(|g| g.category).collect();
        assert_eq!(order, vec![Category::Academic, Category::Sports, Category::General]);
        assert_eq!(groups[0].label, "Academic Events");
    }

    #[test]
    fn suggestions_rank_by_matched_interests() {
        let cards = vec![
            card("Jazz Night", "live music", "Hall"),
            card("Coding Club", "python and music tech", "Lab"),
            card("Chess", "board games", "Union"),
        ];

        let picks = suggest(&cards, "Python music");
        let names: Vec<&str> = picks.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Coding Club", "Jazz Night"]);

        assert!(suggest(&cards, "   ").is_empty());
    }

    #[test]
    fn suggestions_are_capped() {
        let cards: Vec<EventCard> = (0..8).map(|i| card(&format!("Music {i}"), "", "Hall")).collect();
        assert_eq!(suggest(&cards, "music").len(), MAX_SUGGESTIONS);
    }

    #[test]
    fn catalog_memoizes_within_ttl() {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let catalog = EventCatalog::new(db.clone(), Duration::from_secs(300));

        assert!(catalog.all().unwrap().is_empty());
        db.insert_event(&Event {
            name: "Late Addition".into(),
            date: "2030-01-01".into(),
            location: "Library".into(),
            description: String::new(),
        })
        .unwrap();

        // Still served from the cache.
        assert!(catalog.all().unwrap().is_empty());

        let fresh = EventCatalog::new(db, Duration::ZERO);
        assert_eq!(fresh.all().unwrap().len(), 1);
    }
}
