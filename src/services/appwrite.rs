use crate::error::GameError;
use crate::models::{Profile, ScoreWindow};
use crate::services::catalog::ProfileCatalog;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;
use thiserror::Error;

/// Errors that can occur when interacting with Appwrite
#[derive(Debug, Error)]
pub enum AppwriteError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

impl From<AppwriteError> for GameError {
    fn from(err: AppwriteError) -> Self {
        GameError::Catalog(err.to_string())
    }
}

/// Collection IDs in Appwrite
#[derive(Debug, Clone)]
pub struct AppwriteCollections {
    pub profiles: String,
}

/// Appwrite API client acting as the profile catalog
///
/// Handles:
/// - Listing active profiles for a new deck
/// - Atomic score increments on the profile documents
/// - Writing the today-rank cache
pub struct AppwriteClient {
    base_url: String,
    api_key: String,
    project_id: String,
    database_id: String,
    client: Client,
    collections: AppwriteCollections,
}

/// Profile document attribute that mirrors a leaderboard window
pub fn score_attribute(window: ScoreWindow) -> &'static str {
    match window {
        ScoreWindow::Today => "todayPoints",
        ScoreWindow::Week => "weekPoints",
        ScoreWindow::AllTime => "allTimePoints",
    }
}

impl AppwriteClient {
    /// Create a new Appwrite client
    pub fn new(
        base_url: String,
        api_key: String,
        project_id: String,
        database_id: String,
        collections: AppwriteCollections,
    ) -> Result<Self, AppwriteError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            base_url,
            api_key,
            project_id,
            database_id,
            client,
            collections,
        })
    }

    fn documents_url(&self) -> String {
        format!(
            "{}/databases/{}/collections/{}/documents",
            self.base_url.trim_end_matches('/'),
            self.database_id,
            self.collections.profiles
        )
    }

    fn document_url(&self, profile_id: &str) -> String {
        format!("{}/{}", self.documents_url(), urlencoding::encode(profile_id))
    }

    /// Build the `queries[]` string for a deck request
    fn deck_queries(exclude_ids: &[String], limit: usize) -> String {
        let mut queries = vec![
            r#"equal("isActive", [true])"#.to_string(),
            r#"orderDesc("isFeatured")"#.to_string(),
            format!("limit({})", limit),
        ];

        if !exclude_ids.is_empty() {
            let ids = exclude_ids
                .iter()
                .map(|id| serde_json::to_string(id).unwrap_or_default())
                .collect::<Vec<_>>()
                .join(",");
            queries.push(format!(r#"notEqual("$id", [{}])"#, ids));
        }

        queries
            .iter()
            .map(|q| format!("queries[]={}", urlencoding::encode(q)))
            .collect::<Vec<_>>()
            .join("&")
    }

    async fn check_status(response: reqwest::Response, what: &str) -> Result<reqwest::Response, AppwriteError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        if status == reqwest::StatusCode::NOT_FOUND {
            return Err(AppwriteError::NotFound(what.to_string()));
        }
        let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
        tracing::error!("Appwrite request failed for {}: {} - {}", what, status, body);
        Err(AppwriteError::ApiError(format!("Failed to {}: {}", what, status)))
    }

    /// Query active profiles, skipping `exclude_ids`
    pub async fn query_profiles(&self, exclude_ids: &[String], limit: usize) -> Result<Vec<Profile>, AppwriteError> {
        // Over-fetch so a stale exclusion list on the Appwrite side still fills the deck
        let fetch = limit + exclude_ids.len().min(limit);
        let full_url = format!("{}?{}", self.documents_url(), Self::deck_queries(exclude_ids, fetch));

        let response = self
            .client
            .get(&full_url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .send()
            .await?;
        let response = Self::check_status(response, "query profiles").await?;

        let json: Value = response.json().await?;

        let total = json.get("total").and_then(|t| t.as_u64()).unwrap_or(0);

        let documents = json
            .get("documents")
            .and_then(|d| d.as_array())
            .ok_or_else(|| AppwriteError::InvalidResponse("Missing documents array".into()))?;

        let profiles: Vec<Profile> = documents
            .iter()
            .filter_map(|doc| {
                let data = doc.get("data").unwrap_or(doc);
                match serde_json::from_value::<Profile>(data.clone()) {
                    Ok(profile) => Some(profile),
                    Err(e) => {
                        tracing::warn!("Skipping malformed profile document: {}", e);
                        None
                    }
                }
            })
            .filter(|p| !exclude_ids.contains(&p.profile_id))
            .take(limit)
            .collect();

        tracing::debug!("Queried {} profiles (total: {})", profiles.len(), total);

        Ok(profiles)
    }

    /// Atomically add `amount` to one score attribute of a profile document
    pub async fn increment_attribute(
        &self,
        profile_id: &str,
        attribute: &str,
        amount: i64,
    ) -> Result<(), AppwriteError> {
        let url = format!("{}/{}/increment", self.document_url(profile_id), attribute);

        let response = self
            .client
            .patch(&url)
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .json(&json!({ "value": amount }))
            .send()
            .await?;
        Self::check_status(response, "increment score").await?;

        tracing::debug!("Incremented {}.{} by {}", profile_id, attribute, amount);
        Ok(())
    }

    /// Write the cached today-rank on a profile document, `null` when unranked
    pub async fn update_rank(&self, profile_id: &str, rank: Option<u32>) -> Result<(), AppwriteError> {
        let response = self
            .client
            .patch(self.document_url(profile_id))
            .header("X-Appwrite-Key", &self.api_key)
            .header("X-Appwrite-Project", &self.project_id)
            .json(&json!({ "data": { "todayRank": rank } }))
            .send()
            .await?;
        Self::check_status(response, "update rank").await?;
        Ok(())
    }
}

impl ProfileCatalog for AppwriteClient {
    async fn list_unseen_profiles(
        &self,
        identity: &str,
        exclude: &[String],
        limit: usize,
    ) -> Result<Vec<Profile>, GameError> {
        tracing::debug!("Dealing up to {} profiles for {}", limit, identity);
        Ok(self.query_profiles(exclude, limit).await?)
    }

    async fn increment_score(&self, profile_id: &str, window: ScoreWindow, amount: i64) -> Result<(), GameError> {
        Ok(self.increment_attribute(profile_id, score_attribute(window), amount).await?)
    }

    async fn set_today_rank(&self, profile_id: &str, rank: Option<u32>) -> Result<(), GameError> {
        Ok(self.update_rank(profile_id, rank).await?)
    }
}
