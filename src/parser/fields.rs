//! Declarative field extraction over a parsed HTML fragment.
//!
//! A field map pairs names with [`FieldSource`]s. Lookups never fail: a
//! selector that does not parse, matches nothing, or lacks the requested
//! attribute yields an empty string (or an empty list).

use std::collections::HashMap;

use scraper::{ElementRef, Selector};

#[derive(Debug, Clone, Copy)]
pub enum FieldSource {
    /// Trimmed text of the first match.
    Text(&'static str),
    /// Attribute value of the first match.
    Attr(&'static str, &'static str),
    /// Trimmed text of every match, in document order.
    AllText(&'static str),
    /// Text of the element immediately after the first `heading` whose text
    /// contains `label`, provided that element is a `sibling`.
    AfterHeading {
        heading: &'static str,
        label: &'static str,
        sibling: &'static str,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Text(String),
    List(Vec<String>),
}

/// Extracted values keyed by field name.
#[derive(Debug, Default)]
pub struct Fields(HashMap<&'static str, FieldValue>);

impl Fields {
    pub fn text(&self, name: &str) -> String {
        match self.0.get(name) {
            Some(FieldValue::Text(t)) => t.clone(),
            Some(FieldValue::List(items)) => items.first().cloned().unwrap_or_default(),
            None => String::new(),
        }
    }

    pub fn list(&self, name: &str) -> Vec<String> {
        match self.0.get(name) {
            Some(FieldValue::List(items)) => items.clone(),
            Some(FieldValue::Text(t)) if !t.is_empty() => vec![t.clone()],
            _ => Vec::new(),
        }
    }
}

pub fn extract(node: ElementRef<'_>, map: &[(&'static str, FieldSource)]) -> Fields {
    let values = map
        .iter()
        .map(|(name, source)| (*name, extract_one(node, source)))
        .collect();
    Fields(values)
}

fn extract_one(node: ElementRef<'_>, source: &FieldSource) -> FieldValue {
    match *source {
        FieldSource::Text(sel) => FieldValue::Text(get_or_default(node, sel, None)),
        FieldSource::Attr(sel, attr) => FieldValue::Text(get_or_default(node, sel, Some(attr))),
        FieldSource::AllText(sel) => FieldValue::List(all_text(node, sel)),
        FieldSource::AfterHeading {
            heading,
            label,
            sibling,
        } => FieldValue::Text(text_after_heading(node, heading, label, sibling)),
    }
}

/// Text (or `attr`) of the first element matching `selector`, or "".
pub fn get_or_default(node: ElementRef<'_>, selector: &str, attr: Option<&str>) -> String {
    let Some(sel) = parse(selector) else {
        return String::new();
    };
    let Some(el) = node.select(&sel).next() else {
        return String::new();
    };
    match attr {
        Some(name) => el.value().attr(name).unwrap_or_default().to_string(),
        None => element_text(el),
    }
}

fn all_text(node: ElementRef<'_>, selector: &str) -> Vec<String> {
    parse(selector)
        .map(|sel| node.select(&sel).map(element_text).collect())
        .unwrap_or_default()
}

fn text_after_heading(node: ElementRef<'_>, heading: &str, label: &str, sibling: &str) -> String {
    let Some(sel) = parse(heading) else {
        return String::new();
    };
    node.select(&sel)
        .filter(|h| h.text().collect::<String>().contains(label))
        .find_map(|h| {
            let next = h.next_siblings().find_map(ElementRef::wrap)?;
            (next.value().name() == sibling).then(|| element_text(next))
        })
        .unwrap_or_default()
}

pub fn element_text(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn parse(selector: &str) -> Option<Selector> {
    Selector::parse(selector).ok()
}

// ── Tests ──

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::Html;

    const FRAGMENT: &str = r#"
        <div>
          <h2 class="t"><a href="/x">  Hello  </a></h2>
          <img data-src="pic.jpg">
          <ul><li>a</li><li> b </li></ul>
          <h6>Fee (THB)</h6><h4> Free </h4>
          <h6>Organizer</h6><p>not a h4</p><h4>late</h4>
        </div>"#;

    #[test]
    fn text_and_attr_lookups() {
        let doc = Html::parse_fragment(FRAGMENT);
        let root = doc.root_element();
        assert_eq!(get_or_default(root, "h2.t a", None), "Hello");
        assert_eq!(get_or_default(root, "h2.t a", Some("href")), "/x");
        assert_eq!(get_or_default(root, "img", Some("data-src")), "pic.jpg");
    }

    #[test]
    fn misses_degrade_to_empty() {
        let doc = Html::parse_fragment(FRAGMENT);
        let root = doc.root_element();
        assert_eq!(get_or_default(root, "span.none", None), "");
        assert_eq!(get_or_default(root, "img", Some("alt")), "");
        assert_eq!(get_or_default(root, "::not a selector::", None), "");
    }

    #[test]
    fn field_map_extraction() {
        let doc = Html::parse_fragment(FRAGMENT);
        let map = [
            ("items", FieldSource::AllText("li")),
            (
                "fee",
                FieldSource::AfterHeading {
                    heading: "h6",
                    label: "Fee",
                    sibling: "h4",
                },
            ),
            (
                "organizer",
                FieldSource::AfterHeading {
                    heading: "h6",
                    label: "Organizer",
                    sibling: "h4",
                },
            ),
            ("missing", FieldSource::Text("table")),
        ];
        let fields = extract(doc.root_element(), &map);
        assert_eq!(fields.list("items"), vec!["a", "b"]);
        assert_eq!(fields.text("fee"), "Free");
        // Only the directly adjacent element counts
        assert_eq!(fields.text("organizer"), "");
        assert_eq!(fields.text("missing"), "");
        assert_eq!(fields.text("never_declared"), "");
    }
}
