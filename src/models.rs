use serde::{Deserialize, Serialize};

/// Status badge text shown on open listings (also the default when the badge is absent).
pub const STATUS_OPEN: &str = "เปิดรับสมัคร";
/// Status badge text shown on closed listings.
pub const STATUS_CLOSED: &str = "ปิดรับสมัครแล้ว";

/// One contest as seen on a listing page. `url` is the natural key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListingSummary {
    pub title: String,
    pub description: String,
    pub url: String,
    pub image: String,
    pub status: String,
    pub details: Option<ContestDetail>,
}

impl ListingSummary {
    pub fn is_closed(&self) -> bool {
        self.status == STATUS_CLOSED
    }
}

/// Fields scraped from a listing's own detail page. Every field defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContestDetail {
    pub title: String,
    pub categories: Vec<String>,
    pub closing_in_days: String,
    pub event_format: String,
    pub event_date: String,
    pub application_deadline: String,
    pub max_participants: String,
    pub fee: String,
    pub qualifications: String,
    pub organizer: String,
    pub poster_image: String,
}
