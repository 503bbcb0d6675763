use anyhow::{bail, Context, Result};
use chrono::Local;
use serde::Serialize;
use tracing::{error, info, warn};
use url::Url;

use crate::config::Settings;
use crate::crawler::{self, CategoryKind, CategoryPath, CrawlOptions, StopPolicy};
use crate::models::{ContestDetail, ListingSummary};
use crate::net::Fetcher;
use crate::notify;
use crate::seen::{Identity, SeenSet, SeenStore};

const SUCCESS: &str = "success";

/// Result of a flow: its payload, or a uniform error body.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum Response<T> {
    Ok(T),
    Err(ErrorResponse),
}

impl<T> Response<T> {
    pub fn is_ok(&self) -> bool {
        matches!(self, Response::Ok(_))
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub status: &'static str,
    pub message: String,
}

impl ErrorResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            status: "error",
            message: message.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ListResponse {
    pub status: &'static str,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub total: usize,
    pub datetime: String,
    pub data: Vec<ListingSummary>,
}

#[derive(Debug, Serialize)]
pub struct DetailResponse {
    pub status: &'static str,
    pub url: String,
    pub data: ContestDetail,
}

#[derive(Debug, Serialize)]
pub struct NotifyResponse {
    pub status: &'static str,
    pub new_count: usize,
    pub datetime: String,
    pub notifications: Vec<Delivery>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent,
    Failed,
}

#[derive(Debug, Serialize)]
pub struct Delivery {
    pub title: String,
    pub status: DeliveryStatus,
}

impl Delivery {
    fn new(listing: &ListingSummary, sent: bool) -> Self {
        Self {
            title: listing.title.clone(),
            status: if sent {
                DeliveryStatus::Sent
            } else {
                DeliveryStatus::Failed
            },
        }
    }
}

/// The three flows over one fetcher and one seen-set file.
pub struct Pipeline {
    fetcher: Box<dyn Fetcher>,
    base: Url,
    site_domain: String,
    seen: SeenStore,
}

impl Pipeline {
    pub fn new(settings: &Settings, fetcher: Box<dyn Fetcher>) -> Result<Self> {
        let base = Url::parse(&settings.base_url)
            .with_context(|| format!("Invalid base_url {:?}", settings.base_url))?;
        Ok(Self {
            fetcher,
            base,
            site_domain: settings.site_domain.clone(),
            seen: SeenStore::new(&settings.seen_path),
        })
    }

    /// Crawl one category (stopping at the first closed listing), with details.
    pub async fn run_list(&self, kind: CategoryKind, slug: &str) -> Response<ListResponse> {
        envelope(self.list(kind, slug).await)
    }

    /// Scrape a single detail page on the expected site.
    pub async fn run_detail(&self, url: &str) -> Response<DetailResponse> {
        envelope(self.detail(url).await)
    }

    /// Notify every listing in `category` not yet in the seen set.
    pub async fn run_notify(&self, category: &str, webhook: &str) -> Response<NotifyResponse> {
        envelope(self.notify(category, webhook).await)
    }

    async fn list(&self, kind: CategoryKind, slug: &str) -> Result<ListResponse> {
        let path = CategoryPath::new(self.base.clone(), kind, slug);
        let opts = CrawlOptions {
            policy: StopPolicy::StopImmediately,
            with_details: true,
        };
        let data = crawler::crawl(self.fetcher.as_ref(), &path, opts).await?;
        Ok(ListResponse {
            status: SUCCESS,
            category: slug.to_string(),
            kind: kind.as_str(),
            total: data.len(),
            datetime: now(),
            data,
        })
    }

    async fn detail(&self, url: &str) -> Result<DetailResponse> {
        if !self.on_site(url) {
            bail!("Invalid Camphub URL");
        }
        let data = crawler::fetch_detail(self.fetcher.as_ref(), url).await?;
        Ok(DetailResponse {
            status: SUCCESS,
            url: url.to_string(),
            data,
        })
    }

    async fn notify(&self, category: &str, webhook: &str) -> Result<NotifyResponse> {
        let mut seen = self.seen.load();
        if seen.is_empty() {
            info!("Seen set empty, every listing counts as new");
        }
        let path = CategoryPath::new(self.base.clone(), CategoryKind::Default, category);
        let opts = CrawlOptions {
            policy: StopPolicy::SkipAndContinue,
            with_details: false,
        };
        let listings = crawler::crawl(self.fetcher.as_ref(), &path, opts).await?;

        // Repeats within one crawl count once.
        let mut queued = SeenSet::default();
        let fresh: Vec<ListingSummary> = listings
            .into_iter()
            .filter(|l| {
                let id = Identity::of(&l.url);
                !seen.contains(&id) && queued.insert(id)
            })
            .collect();
        info!(new = fresh.len(), seen = seen.len(), "Partitioned listings");

        let mut notifications = Vec::with_capacity(fresh.len());
        let mut attempted = 0;
        for mut listing in fresh {
            // A listing whose details can't be fetched is not posted and stays
            // out of the seen set, so the next run retries it.
            if listing.details.is_none() {
                match crawler::fetch_detail(self.fetcher.as_ref(), &listing.url).await {
                    Ok(details) => listing.details = Some(details),
                    Err(e) => {
                        let error = format!("{e:#}");
                        warn!(url = %listing.url, error = %error, "Skipping notification");
                        notifications.push(Delivery::new(&listing, false));
                        continue;
                    }
                }
            }
            let sent = notify::notify(self.fetcher.as_ref(), &listing, webhook).await;
            notifications.push(Delivery::new(&listing, sent));
            seen.insert(Identity::of(&listing.url));
            attempted += 1;
        }

        if attempted > 0 {
            self.seen.save(&seen)?;
        }

        Ok(NotifyResponse {
            status: SUCCESS,
            new_count: notifications.len(),
            datetime: now(),
            notifications,
        })
    }

    /// Host is the site domain or one of its subdomains.
    fn on_site(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        match parsed.host_str() {
            Some(host) => {
                host == self.site_domain || host.ends_with(&format!(".{}", self.site_domain))
            }
            None => false,
        }
    }
}

fn envelope<T>(result: Result<T>) -> Response<T> {
    match result {
        Ok(body) => Response::Ok(body),
        Err(e) => {
            let message = format!("{e:#}");
            error!(error = %message, "Flow failed");
            Response::Err(ErrorResponse::new(message))
        }
    }
}

fn now() -> String {
    Local::now().to_rfc3339()
}

// ── Tests ──
