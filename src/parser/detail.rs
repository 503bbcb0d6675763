use scraper::Html;

use super::fields::{self, FieldSource};
use crate::models::ContestDetail;

const fn labeled(label: &'static str) -> FieldSource {
    FieldSource::AfterHeading {
        heading: "h6",
        label,
        sibling: "h4",
    }
}

// The detail page has no field ids; values follow an h6 caption.
const DETAIL_FIELDS: &[(&str, FieldSource)] = &[
    ("title", FieldSource::Text("h1.entry-title")),
    ("categories", FieldSource::AllText(".meta-category a")),
    ("closing_in_days", FieldSource::Text(".closedate")),
    ("event_format", labeled("รูปแบบกิจกรรม")),
    ("event_date", labeled("วันที่จัดกิจกรรม")),
    ("application_deadline", labeled("วันที่รับสมัครวันสุดท้าย")),
    ("max_participants", labeled("จำนวนที่รับ")),
    ("fee", labeled("ค่าใช้จ่าย")),
    ("qualifications", labeled("คุณสมบัติ")),
    ("organizer", labeled("กิจกรรมนี้จัดโดย")),
    ("poster_image", FieldSource::Attr("img[data-src]", "data-src")),
];

pub fn parse_detail(html: &str) -> ContestDetail {
    let doc = Html::parse_document(html);
    let f = fields::extract(doc.root_element(), DETAIL_FIELDS);
    ContestDetail {
        title: f.text("title"),
        categories: f.list("categories"),
        closing_in_days: f.text("closing_in_days"),
        event_format: f.text("event_format"),
        event_date: f.text("event_date"),
        application_deadline: f.text("application_deadline"),
        max_participants: f.text("max_participants"),
        fee: f.text("fee"),
        qualifications: f.text("qualifications"),
        organizer: f.text("organizer"),
        poster_image: f.text("poster_image"),
    }
}

// ── Tests ──
