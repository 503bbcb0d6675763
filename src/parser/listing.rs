use std::sync::LazyLock;

use scraper::{Html, Selector};
use url::Url;

use super::fields::{self, FieldSource};
use crate::models::{ListingSummary, STATUS_OPEN};

static CARD_SEL: LazyLock<Selector> =
    LazyLock::new(|| Selector::parse("article.vce-post").unwrap());

const CARD_FIELDS: &[(&str, FieldSource)] = &[
    ("title", FieldSource::Text("h2.entry-title a")),
    ("href", FieldSource::Attr("h2.entry-title a", "href")),
    ("description", FieldSource::Text(".entry-content")),
    ("image", FieldSource::Attr("img", "data-src")),
    ("status", FieldSource::Text("span.closedate")),
];

/// Parse every listing card on an index page, in document order.
///
/// `url` is resolved against `base`; a card without an href keeps an empty url.
/// Details are left unset.
pub fn parse_listings(html: &str, base: &Url) -> Vec<ListingSummary> {
    let doc = Html::parse_document(html);
    doc.select(&CARD_SEL)
        .map(|card| {
            let f = fields::extract(card, CARD_FIELDS);
            let status = f.text("status");
            ListingSummary {
                title: f.text("title"),
                description: collapse_whitespace(&f.text("description")),
                url: resolve(base, &f.text("href")),
                image: f.text("image"),
                status: if status.is_empty() {
                    STATUS_OPEN.to_string()
                } else {
                    status
                },
                details: None,
            }
        })
        .collect()
}

fn resolve(base: &Url, href: &str) -> String {
    if href.is_empty() {
        return String::new();
    }
    base.join(href)
        .map(String::from)
        .unwrap_or_else(|_| href.to_string())
}

fn collapse_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

// ── Tests ──
