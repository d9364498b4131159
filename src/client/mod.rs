//! HTTP client for talking to a running vote service.

mod basic;
mod transport;

pub use basic::BasicClient;
pub use transport::HttpClient;

use anyhow::{Result, bail};
use reqwest::header::{CONTENT_TYPE, HeaderValue};
use serde::Deserialize;
use serde_json::Value;

use crate::tally::Leaderboard;

/// Body returned by `POST /submit_vote`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SubmitResponse {
    pub ok: bool,
    #[serde(default)]
    pub path: Option<String>,
    #[serde(default)]
    pub error: Option<String>,
}

fn endpoint(base_url: &str, path: &str) -> String {
    format!("{}/{}", base_url.trim_end_matches('/'), path)
}

/// Posts `payload` to the service's submission endpoint.
///
/// Rejections (4xx/5xx with a JSON body) come back as `ok: false` rather
/// than as errors; transport failures are errors.
#[tracing::instrument(skip(client, payload))]
pub async fn submit_vote<C: HttpClient>(
    client: &C,
    base_url: &str,
    payload: &Value,
) -> Result<SubmitResponse> {
    let mut req = reqwest::Request::new(
        reqwest::Method::POST,
        endpoint(base_url, "submit_vote").parse()?,
    );
    req.headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    *req.body_mut() = Some(serde_json::to_vec(payload)?.into());

    let resp = client.execute(req).await?;
    let status = resp.status();
    let body: SubmitResponse = resp.json().await?;

    tracing::debug!(%status, ok = body.ok, "Submission answered");
    Ok(body)
}

/// Fetches the current leaderboard from the service.
#[tracing::instrument(skip(client))]
pub async fn fetch_leaderboard<C: HttpClient>(client: &C, base_url: &str) -> Result<Leaderboard> {
    let req = reqwest::Request::new(reqwest::Method::GET, endpoint(base_url, "results").parse()?);

    let resp = client.execute(req).await?;
    if !resp.status().is_success() {
        let status = resp.status();
        let body = resp.text().await.unwrap_or_default();
        bail!("results request failed with status {status}: {body}");
    }

    Ok(resp.json().await?)
}
