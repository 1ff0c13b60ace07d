use std::path::PathBuf;

use super::fetcher::fetch_body;
use super::parser::parse;
use super::types::EarthquakeEvent;

/// Where a refresh reads its feed document from.
#[derive(Debug, Clone)]
pub enum FeedSource {
    Network { client: reqwest::Client, url: String },
    FixtureFile(PathBuf),
    FixtureText(String),
}

impl FeedSource {
    pub fn describe(&self) -> String {
        match self {
            Self::Network { url, .. } => url.clone(),
            Self::FixtureFile(path) => format!("fixture {}", path.display()),
            Self::FixtureText(_) => "inline fixture".to_string(),
        }
    }

    /// Raw document text, or an empty string when it cannot be read.
    pub async fn load_raw(&self) -> String {
        match self {
            Self::Network { client, url } => fetch_body(client, url).await,
            Self::FixtureFile(path) => match tokio::fs::read_to_string(path).await {
                Ok(text) => text,
                Err(error) => {
                    tracing::warn!(path = %path.display(), %error, "problem reading feed fixture");
                    String::new()
                }
            },
            Self::FixtureText(text) => text.clone(),
        }
    }

    pub async fn load(&self) -> Vec<EarthquakeEvent> {
        let raw = self.load_raw().await;
        parse(&raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[tokio::test]
    async fn fixture_file_is_parsed() {
        let mut file = tempfile::NamedTempFile::new().expect("temp file should be created");
        file.write_all(include_bytes!("../../../fixtures/usgs-samples/two-features.geojson"))
            .expect("fixture should be written");

        let source = FeedSource::FixtureFile(file.path().to_path_buf());
        let events = source.load().await;
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].location(), "Anytown");
    }

    #[tokio::test]
    async fn missing_fixture_file_loads_nothing() {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let source = FeedSource::FixtureFile(dir.path().join("absent.geojson"));
        assert!(source.load_raw().await.is_empty());
        assert!(source.load().await.is_empty());
    }

    #[tokio::test]
    async fn inline_fixture_is_parsed() {
        let source = FeedSource::FixtureText(
            include_str!("../../../fixtures/usgs-samples/sample.geojson").to_string(),
        );
        assert_eq!(source.load().await.len(), 3);
        assert_eq!(source.describe(), "inline fixture");
    }
}
