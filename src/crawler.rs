use anyhow::{bail, Context, Result};
use tracing::{debug, info, warn};
use url::Url;

use crate::models::{ContestDetail, ListingSummary};
use crate::net::{Fetcher, Page};
use crate::parser::{detail, listing};

/// What to do when a closed listing shows up.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopPolicy {
    /// End the crawl at the first closed listing.
    StopImmediately,
    /// Drop closed listings, finish the current page, then stop.
    SkipAndContinue,
}

#[derive(Debug, Clone, Copy)]
pub struct CrawlOptions {
    pub policy: StopPolicy,
    /// Fetch each listing's detail page while crawling.
    pub with_details: bool,
}

/// Which section of the site a slug belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CategoryKind {
    Default,
    Type,
    Tag,
    Medical,
    Private,
}

impl CategoryKind {
    /// Unknown discriminators fall back to `Default`.
    pub fn parse(s: &str) -> Self {
        match s {
            "type" => CategoryKind::Type,
            "tag" => CategoryKind::Tag,
            "medical" => CategoryKind::Medical,
            "private" => CategoryKind::Private,
            _ => CategoryKind::Default,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            CategoryKind::Default => "default",
            CategoryKind::Type => "type",
            CategoryKind::Tag => "tag",
            CategoryKind::Medical => "medical",
            CategoryKind::Private => "private",
        }
    }
}

/// Paginated index for one category.
#[derive(Debug, Clone)]
pub struct CategoryPath {
    base: Url,
    path: String,
}

impl CategoryPath {
    pub fn new(base: Url, kind: CategoryKind, slug: &str) -> Self {
        let slug = slug.trim_matches('/');
        let path = match kind {
            CategoryKind::Default => format!("{slug}/"),
            CategoryKind::Type => format!("type/{slug}/"),
            CategoryKind::Tag => format!("tag/{slug}/"),
            CategoryKind::Medical => format!("medical-health/{slug}/"),
            CategoryKind::Private => "private-university/".to_string(),
        };
        Self { base, path }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Page 1 is the bare category path; later pages append `page/<n>/`.
    pub fn page_url(&self, page: u32) -> String {
        let mut url = format!("{}{}", self.base, self.path);
        if page > 1 {
            url.push_str(&format!("page/{page}/"));
        }
        url
    }
}

/// Walk the category's pages in order until an empty page, a failed fetch,
/// or a closed listing (per `opts.policy`).
///
/// A failed page fetch only ends pagination. A listing without a link, or a
/// failed detail fetch, fails the whole crawl.
pub async fn crawl(
    fetcher: &dyn Fetcher,
    category: &CategoryPath,
    opts: CrawlOptions,
) -> Result<Vec<ListingSummary>> {
    let mut listings = Vec::new();
    let mut page = 1;

    loop {
        let url = category.page_url(page);
        info!(url = %url, page, "Fetching page");

        let body = match fetcher.get(&url).await.and_then(Page::into_body) {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %url, error = %e, "Page fetch failed, stopping");
                break;
            }
        };

        let cards = listing::parse_listings(&body, category.base());
        if cards.is_empty() {
            info!(page, "No listings, end of pagination");
            break;
        }

        let mut saw_closed = false;
        for mut card in cards {
            if card.is_closed() {
                match opts.policy {
                    StopPolicy::StopImmediately => {
                        info!(page, title = %card.title, "Closed listing, stopping");
                        return Ok(listings);
                    }
                    StopPolicy::SkipAndContinue => {
                        debug!(title = %card.title, "Skipping closed listing");
                        saw_closed = true;
                        continue;
                    }
                }
            }

            if card.url.is_empty() {
                bail!("Listing {:?} on {} has no link", card.title, url);
            }
            if opts.with_details {
                card.details = Some(fetch_detail(fetcher, &card.url).await?);
            }
            listings.push(card);
        }

        if saw_closed {
            info!(page, "Closed listing seen, not advancing");
            break;
        }
        page += 1;
    }

    info!(count = listings.len(), "Crawl finished");
    Ok(listings)
}

/// Fetch and parse one detail page. Never cached.
pub async fn fetch_detail(fetcher: &dyn Fetcher, url: &str) -> Result<ContestDetail> {
    let body = fetcher
        .get(url)
        .await
        .and_then(Page::into_body)
        .with_context(|| format!("Failed to fetch details for {url}"))?;
    Ok(detail::parse_detail(&body))
}

// ── Tests ──

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::STATUS_CLOSED;
    use crate::net::testing::FakeFetcher;

    pub const BASE: &str = "https://www.camphub.in.th/";

    pub fn card(slug: &str, closed: bool) -> String {
        let status = if closed {
            format!(r#"<span class="closedate">{STATUS_CLOSED}</span>"#)
        } else {
            String::new()
        };
        format!(
            r#"<article class="vce-post">{status}
                 <h2 class="entry-title"><a href="{BASE}{slug}/">Title {slug}</a></h2>
                 <div class="entry-content">About {slug}</div>
               </article>"#
        )
    }

    pub fn index(cards: &[String]) -> String {
        format!("<html><body>{}</body></html>", cards.concat())
    }

    pub fn detail_page(organizer: &str) -> String {
        format!(r#"<h1 class="entry-title">T</h1><h6>กิจกรรมนี้จัดโดย</h6><h4>{organizer}</h4>"#)
    }

    fn category() -> CategoryPath {
        CategoryPath::new(Url::parse(BASE).unwrap(), CategoryKind::Default, "contest")
    }

    fn opts(policy: StopPolicy) -> CrawlOptions {
        CrawlOptions {
            policy,
            with_details: true,
        }
    }

    fn detail_url(slug: &str) -> String {
        format!("{BASE}{slug}/")
    }

    #[test]
    fn page_urls_per_kind() {
        let base = Url::parse(BASE).unwrap();
        let p = |kind, slug| CategoryPath::new(base.clone(), kind, slug);

        assert_eq!(
            p(CategoryKind::Default, "/engineer/").page_url(1),
            "https://www.camphub.in.th/engineer/"
        );
        assert_eq!(
            p(CategoryKind::Default, "engineer").page_url(3),
            "https://www.camphub.in.th/engineer/page/3/"
        );
        assert_eq!(
            p(CategoryKind::Type, "tutor").page_url(2),
            "https://www.camphub.in.th/type/tutor/page/2/"
        );
        assert_eq!(
            p(CategoryKind::Tag, "khon-kaen-university").page_url(1),
            "https://www.camphub.in.th/tag/khon-kaen-university/"
        );
        assert_eq!(
            p(CategoryKind::Medical, "vet").page_url(1),
            "https://www.camphub.in.th/medical-health/vet/"
        );
        assert_eq!(
            p(CategoryKind::Private, "ignored").page_url(2),
            "https://www.camphub.in.th/private-university/page/2/"
        );
    }

    #[test]
    fn kind_parse_defaults() {
        assert_eq!(CategoryKind::parse("tag"), CategoryKind::Tag);
        assert_eq!(CategoryKind::parse("whatever"), CategoryKind::Default);
        assert_eq!(CategoryKind::parse("medical").as_str(), "medical");
    }

    #[tokio::test]
    async fn empty_first_page_single_fetch() {
        let fetcher = FakeFetcher::new().page(&category().page_url(1), index(&[]));
        let items = crawl(&fetcher, &category(), opts(StopPolicy::StopImmediately))
            .await
            .unwrap();
        assert!(items.is_empty());
        assert_eq!(fetcher.get_count(), 1);
    }

    #[tokio::test]
    async fn stop_immediately_halts_at_closed() {
        let fetcher = FakeFetcher::new()
            .page(
                &category().page_url(1),
                index(&[card("a", false), card("b", true), card("c", false)]),
            )
            .page(&detail_url("a"), detail_page("Org A"))
            .page(&detail_url("c"), detail_page("Org C"));

        let items = crawl(&fetcher, &category(), opts(StopPolicy::StopImmediately))
            .await
            .unwrap();

        assert_eq!(items.len(), 1);
        assert_eq!(items[0].url, detail_url("a"));
        assert_eq!(items[0].details.as_ref().unwrap().organizer, "Org A");
        assert!(!fetcher.fetched(&detail_url("c")));
        assert!(!fetcher.fetched(&category().page_url(2)));
    }

    #[tokio::test]
    async fn skip_and_continue_finishes_page_only() {
        let fetcher = FakeFetcher::new()
            .page(
                &category().page_url(1),
                index(&[card("a", false), card("b", true), card("c", false)]),
            )
            .page(&category().page_url(2), index(&[card("d", false)]))
            .page(&detail_url("a"), detail_page("Org A"))
            .page(&detail_url("c"), detail_page("Org C"));

        let items = crawl(&fetcher, &category(), opts(StopPolicy::SkipAndContinue))
            .await
            .unwrap();

        let urls: Vec<_> = items.iter().map(|l| l.url.as_str()).collect();
        assert_eq!(urls, vec![detail_url("a"), detail_url("c")]);
        assert!(!fetcher.fetched(&category().page_url(2)));
        assert!(!fetcher.fetched(&detail_url("b")));
    }

    #[tokio::test]
    async fn follows_pages_in_order() {
        let fetcher = FakeFetcher::new()
            .page(&category().page_url(1), index(&[card("a", false), card("b", false)]))
            .page(&category().page_url(2), index(&[card("c", false)]))
            .page(&category().page_url(3), index(&[]));

        let items = crawl(
            &fetcher,
            &category(),
            CrawlOptions {
                policy: StopPolicy::StopImmediately,
                with_details: false,
            },
        )
        .await
        .unwrap();

        let titles: Vec<_> = items.iter().map(|l| l.title.as_str()).collect();
        assert_eq!(titles, vec!["Title a", "Title b", "Title c"]);
        assert!(items.iter().all(|l| l.details.is_none()));
        assert_eq!(fetcher.get_count(), 3);
    }

    #[tokio::test]
    async fn failed_page_keeps_partial_results() {
        let fetcher = FakeFetcher::new()
            .page(&category().page_url(1), index(&[card("a", false)]))
            .status(&category().page_url(2), 503)
            .page(&detail_url("a"), detail_page("Org A"));

        let items = crawl(&fetcher, &category(), opts(StopPolicy::StopImmediately))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
    }

    #[tokio::test]
    async fn failed_detail_fails_crawl() {
        let fetcher = FakeFetcher::new()
            .page(&category().page_url(1), index(&[card("a", false)]))
            .status(&detail_url("a"), 500);

        let err = crawl(&fetcher, &category(), opts(StopPolicy::StopImmediately))
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("HTTP 500"));
    }

    #[tokio::test]
    async fn listing_without_link_fails_crawl() {
        let page = r#"<article class="vce-post"><h2 class="entry-title">Nameless</h2></article>"#;
        let fetcher = FakeFetcher::new().page(&category().page_url(1), page);

        let result = crawl(&fetcher, &category(), opts(StopPolicy::SkipAndContinue)).await;
        assert!(result.is_err());
        assert_eq!(fetcher.get_count(), 1);
    }
}
