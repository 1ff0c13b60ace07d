use reqwest::StatusCode;
use std::time::Duration;

pub const CONNECT_TIMEOUT: Duration = Duration::from_secs(15);
pub const READ_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, thiserror::Error)]
pub enum FetchError {
    #[error("invalid feed url {url}: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("unexpected status code: {0}")]
    HttpStatus(u16),
}

pub fn build_client(
    connect_timeout: Duration,
    read_timeout: Duration,
) -> Result<reqwest::Client, FetchError> {
    let client = reqwest::Client::builder()
        .connect_timeout(connect_timeout)
        .read_timeout(read_timeout)
        .build()?;
    Ok(client)
}

/// Issues one GET and returns the body. Anything but `200 OK` is an error.
pub async fn fetch(client: &reqwest::Client, url: &str) -> Result<String, FetchError> {
    let parsed = reqwest::Url::parse(url).map_err(|error| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: error.to_string(),
    })?;

    let response = client.get(parsed).send().await?;
    let status = response.status();
    if status != StatusCode::OK {
        return Err(FetchError::HttpStatus(status.as_u16()));
    }

    Ok(response.text().await?)
}

/// Like [`fetch`], but logs the failure and hands back an empty body.
pub async fn fetch_body(client: &reqwest::Client, url: &str) -> String {
    match fetch(client, url).await {
        Ok(body) => body,
        Err(error) => {
            tracing::warn!(%url, %error, "problem retrieving the earthquake feed");
            String::new()
        }
    }
}
