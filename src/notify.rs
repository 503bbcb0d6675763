use chrono::{SecondsFormat, Utc};
use serde_json::{json, Value};
use tracing::{info, warn};

use crate::models::{ContestDetail, ListingSummary};
use crate::net::Fetcher;

const DESCRIPTION_LIMIT: usize = 200;
const NOT_SPECIFIED: &str = "ไม่ระบุ";
const FOOTER: &str = "ส่งจาก Camphub Scraper API";
/// Webhook acknowledgement: 204 No Content.
const ACCEPTED: u16 = 204;

/// Post one listing to the webhook. Any failure is logged and reported as `false`.
pub async fn notify(fetcher: &dyn Fetcher, listing: &ListingSummary, webhook: &str) -> bool {
    let payload = build_payload(listing, &Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true));
    match fetcher.post_json(webhook, &payload).await {
        Ok(ACCEPTED) => {
            info!(title = %listing.title, "Notification sent");
            true
        }
        Ok(status) => {
            warn!(title = %listing.title, status, "Webhook rejected notification");
            false
        }
        Err(e) => {
            warn!(title = %listing.title, error = %e, "Webhook post failed");
            false
        }
    }
}

/// Embed payload for one listing.
pub fn build_payload(listing: &ListingSummary, timestamp: &str) -> Value {
    let empty = ContestDetail::default();
    let d = listing.details.as_ref().unwrap_or(&empty);

    let fields: Vec<Value> = [
        ("สถานะ", listing.status.as_str()),
        ("วันปิดรับสมัคร", d.application_deadline.as_str()),
        ("จำนวนที่รับ", d.max_participants.as_str()),
        ("ค่าใช้จ่าย", d.fee.as_str()),
        ("ผู้จัดงาน", d.organizer.as_str()),
        ("รูปแบบกิจกรรม", d.event_format.as_str()),
        ("วันที่จัดกิจกรรม", d.event_date.as_str()),
    ]
    .into_iter()
    .map(|(name, value)| json!({ "name": name, "value": or_not_specified(value), "inline": true }))
    .collect();

    json!({
        "embeds": [{
            "title": listing.title,
            "description": truncate(&listing.description, DESCRIPTION_LIMIT),
            "url": listing.url,
            "thumbnail": { "url": listing.image },
            "fields": fields,
            "footer": { "text": FOOTER },
            "timestamp": timestamp,
        }]
    })
}

fn or_not_specified(value: &str) -> &str {
    if value.trim().is_empty() {
        NOT_SPECIFIED
    } else {
        value
    }
}

/// First `max` characters, with "..." appended only when something was cut.
fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let truncated: String = s.chars().take(max).collect();
        format!("{}...", truncated)
    }
}

// ── Tests ──
