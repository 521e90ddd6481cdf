use async_trait::async_trait;
use chrono::NaiveDate;
use tracing::{debug, warn};
use url::Url;

use super::html::{html_to_text, looks_like_html};
use crate::domain::provider::PageSource;
use crate::domain::{District, DomainError};
use crate::infrastructure::llm::HttpClientTrait;

/// Fetches a page from a URL template with `{district}` and `{date}` slots
#[derive(Debug)]
pub struct HttpPageSource<C: HttpClientTrait> {
    client: C,
    url_template: String,
}

impl<C: HttpClientTrait> HttpPageSource<C> {
    pub fn new(client: C, url_template: impl Into<String>) -> Self {
        Self {
            client,
            url_template: url_template.into(),
        }
    }

    /// Fill the template. `{district}` must be a whole path segment and is
    /// percent-encoded by the URL parser.
    pub fn url_for(&self, district: &District, date: NaiveDate) -> Result<Url, DomainError> {
        let template = self
            .url_template
            .replace("{date}", &date.format("%Y-%m-%d").to_string());

        let (head, tail) = template.split_once("{district}").ok_or_else(|| {
            DomainError::configuration("page URL template has no {district} slot")
        })?;

        let invalid = |e: url::ParseError| {
            DomainError::configuration(format!(
                "Invalid page URL template '{}': {}",
                self.url_template, e
            ))
        };
        let not_a_path = || {
            DomainError::configuration(format!(
                "{{district}} must be a path segment in '{}'",
                self.url_template
            ))
        };

        if !head.ends_with('/') {
            return Err(not_a_path());
        }

        let mut url = Url::parse(head).map_err(invalid)?;
        url.path_segments_mut()
            .map_err(|_| not_a_path())?
            .pop_if_empty()
            .push(district.as_str());

        if let Some(rest) = tail.strip_prefix('/') {
            url.path_segments_mut().map_err(|_| not_a_path())?.push("");
            url = url.join(rest).map_err(invalid)?;
        } else if tail.starts_with('?') || tail.starts_with('#') {
            url = url.join(tail).map_err(invalid)?;
        } else if !tail.is_empty() {
            return Err(not_a_path());
        }

        Ok(url)
    }
}

#[async_trait]
impl<C: HttpClientTrait> PageSource for HttpPageSource<C> {
    async fn fetch_text(&self, district: &District, date: NaiveDate) -> Option<String> {
        let url = match self.url_for(district, date) {
            Ok(url) => url,
            Err(e) => {
                warn!(error = %e, "Cannot build page URL");
                return None;
            }
        };
        debug!(url = %url, "Fetching page");

        let body = match self.client.get_text(url.as_str()).await {
            Ok(body) => body,
            Err(e) => {
                warn!(url = %url, error = %e, "Page fetch failed");
                return None;
            }
        };

        let text = if looks_like_html(&body) {
            html_to_text(&body)
        } else {
            body.trim().to_string()
        };

        if text.is_empty() {
            warn!(url = %url, "Page has no visible text");
            None
        } else {
            Some(text)
        }
    }
}
