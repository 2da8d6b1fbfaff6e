//! HTTP fetching for the two source feeds.
//!
//! The [`HttpClient`] trait is the test seam: production code uses
//! [`BasicClient`] over a shared `reqwest::Client`, tests can substitute a
//! canned responder.

mod basic;
mod client;

pub use basic::BasicClient;
pub use client::HttpClient;

use anyhow::{Context, Result, bail};

/// Fetches a feed URL and returns its body as UTF-8 text.
///
/// # Errors
///
/// Fails on an invalid URL, a transport error, a non-success status, or a
/// non-UTF-8 body. Any of these is terminal for the load: the caller never
/// aggregates a partial dataset.
pub async fn fetch_text<C: HttpClient>(client: &C, url: &str) -> Result<String> {
    let req = reqwest::Request::new(
        reqwest::Method::GET,
        url.parse().with_context(|| format!("invalid feed URL {url}"))?,
    );

    let resp = client.execute(req).await?;
    let status = resp.status();
    if !status.is_success() {
        bail!("feed {url} returned HTTP {status}");
    }
    Ok(resp.text().await?)
}
