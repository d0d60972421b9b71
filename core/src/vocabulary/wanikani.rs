//! WaniKani progress source
//!
//! Three calls against the v2 API, all with bearer authentication:
//!
//! 1. `GET /v2/user` for the level
//! 2. `GET /v2/assignments`, every page, keeping vocabulary subjects that
//!    are not burned (SRS stage 9)
//! 3. `GET /v2/subjects?types=vocabulary&ids=…`, every page, for the
//!    characters of those subjects
//!
//! Pages are followed through `pages.next_url` until it is null.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::Deserialize;

use super::{VocabularySnapshot, VocabularySource};

/// WaniKani API root
pub const WANIKANI_API_BASE: &str = "https://api.wanikani.com/v2";

/// SRS stage of a burned item
const BURNED_SRS_STAGE: u32 = 9;

/// Subject ids per `/subjects` request
const SUBJECT_BATCH: usize = 500;

#[derive(Debug, Deserialize)]
struct Pages {
    next_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Page<T> {
    data: Vec<Resource<T>>,
    pages: Pages,
}

#[derive(Debug, Deserialize)]
struct Resource<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct UserEnvelope {
    data: UserData,
}

#[derive(Debug, Deserialize)]
struct UserData {
    level: i32,
}

#[derive(Debug, Deserialize)]
struct AssignmentData {
    subject_id: u64,
    subject_type: String,
    srs_stage: u32,
}

#[derive(Debug, Deserialize)]
struct SubjectData {
    characters: Option<String>,
}

/// Progress from a WaniKani account
#[derive(Clone)]
pub struct WaniKaniSource {
    api_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for WaniKaniSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaniKaniSource")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl WaniKaniSource {
    /// Create a source for the account owning `api_key`
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> anyhow::Result<Self> {
        Self::with_base_url(api_key, WANIKANI_API_BASE)
    }

    /// Create a source against another API root
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn with_base_url(
        api_key: impl Into<String>,
        base_url: impl Into<String>,
    ) -> anyhow::Result<Self> {
        Ok(Self {
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client: reqwest::Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .context("Failed to create HTTP client")?,
        })
    }

    async fn get_json(&self, url: &str) -> anyhow::Result<serde_json::Value> {
        let response = self
            .http_client
            .get(url)
            .bearer_auth(&self.api_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            anyhow::bail!("WaniKani returned {status} for {url}");
        }

        Ok(response.json().await?)
    }

    /// Follow `pages.next_url` from `first_url`, collecting every resource
    async fn get_all<T: serde::de::DeserializeOwned>(&self, first_url: String) -> anyhow::Result<Vec<T>> {
        let mut items = Vec::new();
        let mut next = Some(first_url);

        while let Some(url) = next {
            let value = self.get_json(&url).await?;
            let (mut page, next_url) = parse_page::<T>(value)?;
            items.append(&mut page);
            next = next_url;
        }

        Ok(items)
    }

    async fn fetch_level(&self) -> anyhow::Result<i32> {
        let value = self.get_json(&format!("{}/user", self.base_url)).await?;
        parse_level(value)
    }

    async fn fetch_in_progress(&self) -> anyhow::Result<Vec<String>> {
        let assignments: Vec<AssignmentData> = self
            .get_all(format!("{}/assignments", self.base_url))
            .await?;
        let ids = unburned_vocabulary_ids(&assignments);

        let mut words = Vec::new();
        for batch in ids.chunks(SUBJECT_BATCH) {
            let ids: Vec<String> = batch.iter().map(u64::to_string).collect();
            let url = format!(
                "{}/subjects?types=vocabulary&ids={}",
                self.base_url,
                ids.join(",")
            );
            let subjects: Vec<SubjectData> = self.get_all(url).await?;
            words.extend(subjects.into_iter().filter_map(|s| s.characters));
        }

        Ok(words)
    }

    async fn try_fetch(&self) -> anyhow::Result<VocabularySnapshot> {
        let level = self.fetch_level().await?;
        let in_progress = self.fetch_in_progress().await?;
        Ok(VocabularySnapshot::new(level, in_progress))
    }
}

fn parse_level(value: serde_json::Value) -> anyhow::Result<i32> {
    let envelope: UserEnvelope =
        serde_json::from_value(value).context("Unexpected WaniKani user payload")?;
    Ok(envelope.data.level)
}

fn parse_page<T: serde::de::DeserializeOwned>(
    value: serde_json::Value,
) -> anyhow::Result<(Vec<T>, Option<String>)> {
    let page: Page<T> =
        serde_json::from_value(value).context("Unexpected WaniKani collection payload")?;
    let items = page.data.into_iter().map(|r| r.data).collect();
    Ok((items, page.pages.next_url))
}

fn unburned_vocabulary_ids(assignments: &[AssignmentData]) -> Vec<u64> {
    assignments
        .iter()
        .filter(|a| a.subject_type == "vocabulary" && a.srs_stage != BURNED_SRS_STAGE)
        .map(|a| a.subject_id)
        .collect()
}

#[async_trait]
impl VocabularySource for WaniKaniSource {
    fn name(&self) -> &str {
        "WaniKani"
    }

    async fn fetch(&self) -> VocabularySnapshot {
        match self.try_fetch().await {
            Ok(snapshot) => {
                tracing::info!(
                    level = snapshot.level,
                    words = snapshot.in_progress.len(),
                    "Fetched WaniKani progress"
                );
                snapshot
            }
            Err(e) => {
                tracing::warn!(error = %e, "WaniKani progress unavailable");
                VocabularySnapshot::unavailable()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_level() {
        let value = serde_json::json!({
            "object": "user",
            "data": { "username": "x", "level": 14, "subscription": { "active": true } }
        });
        assert_eq!(parse_level(value).unwrap(), 14);
        assert!(parse_level(serde_json::json!({ "data": {} })).is_err());
    }

    #[test]
    fn test_parse_assignment_page_and_filter() {
        let value = serde_json::json!({
            "object": "collection",
            "pages": { "next_url": "https://api.wanikani.com/v2/assignments?page_after_id=3" },
            "data": [
                { "id": 1, "data": { "subject_id": 10, "subject_type": "vocabulary", "srs_stage": 4 } },
                { "id": 2, "data": { "subject_id": 11, "subject_type": "vocabulary", "srs_stage": 9 } },
                { "id": 3, "data": { "subject_id": 12, "subject_type": "kanji", "srs_stage": 2 } },
                { "id": 4, "data": { "subject_id": 13, "subject_type": "vocabulary", "srs_stage": 0 } }
            ]
        });

        let (assignments, next) = parse_page::<AssignmentData>(value).unwrap();
        assert_eq!(assignments.len(), 4);
        assert_eq!(
            next.as_deref(),
            Some("https://api.wanikani.com/v2/assignments?page_after_id=3")
        );
        assert_eq!(unburned_vocabulary_ids(&assignments), vec![10, 13]);
    }

    #[test]
    fn test_parse_subject_page() {
        let value = serde_json::json!({
            "pages": { "next_url": null },
            "data": [
                { "id": 10, "data": { "characters": "食べる", "meanings": [] } },
                { "id": 13, "data": { "characters": null } }
            ]
        });
        let (subjects, next) = parse_page::<SubjectData>(value).unwrap();
        assert!(next.is_none());
        let words: Vec<_> = subjects.into_iter().filter_map(|s| s.characters).collect();
        assert_eq!(words, vec!["食べる".to_string()]);
    }

    #[tokio::test]
    async fn test_unreachable_api_is_unavailable() {
        let source = WaniKaniSource::with_base_url("key", "http://127.0.0.1:9/v2").unwrap();
        assert_eq!(source.fetch().await, VocabularySnapshot::unavailable());
    }
}
