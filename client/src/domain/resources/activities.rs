//! Activity and stage reads.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use super::resource_id;
use crate::domain::{AccessError, AccessLayer, RequestDescriptor};

/// Filters for `GET /activities`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivityQuery {
    /// One-based page number.
    pub page: Option<u32>,
    /// Page size requested from the backend.
    pub per_page: Option<u32>,
    /// Free-text search term.
    pub search: Option<String>,
}

impl ActivityQuery {
    fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(page) = self.page {
            pairs.push(("page".to_owned(), page.to_string()));
        }
        if let Some(per_page) = self.per_page {
            pairs.push(("perPage".to_owned(), per_page.to_string()));
        }
        if let Some(search) = self.search.as_deref().map(str::trim) {
            if !search.is_empty() {
                pairs.push(("search".to_owned(), search.to_owned()));
            }
        }
        pairs
    }
}

/// One page of results.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    /// Items on this page.
    pub items: Vec<T>,
    /// Next page number, absent on the last page.
    #[serde(default)]
    pub next_page: Option<u32>,
}

/// Listing entry for an activity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySummary {
    /// Activity identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Short teaser text.
    #[serde(default)]
    pub summary: Option<String>,
    /// Cover image address.
    #[serde(default)]
    pub cover_image_url: Option<String>,
}

/// Full activity. `content` is passed through untouched.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Activity {
    /// Activity identifier.
    pub id: String,
    /// Display title.
    pub title: String,
    /// Backend-defined body, never interpreted here.
    #[serde(default)]
    pub content: Value,
}

/// One stage of an activity.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stage {
    /// Stage identifier.
    pub id: String,
    /// Owning activity.
    pub activity_id: String,
    /// Display title.
    pub title: String,
    /// Zero-based order within the activity.
    #[serde(default)]
    pub position: u32,
    /// Backend-defined body, never interpreted here.
    #[serde(default)]
    pub content: Value,
}

/// An activity together with whatever stages could be loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityOverview {
    /// The activity itself.
    pub activity: Activity,
    /// Its stages; empty when they could not be loaded.
    pub stages: Vec<Stage>,
}

impl AccessLayer {
    /// List activities, public-first.
    ///
    /// # Errors
    ///
    /// Returns the classified [`AccessError`] of the call.
    pub async fn list_activities(
        &self,
        query: &ActivityQuery,
        cancel: &CancellationToken,
    ) -> Result<Page<ActivitySummary>, AccessError> {
        let descriptor = query
            .to_pairs()
            .into_iter()
            .fold(RequestDescriptor::get("/activities"), |descriptor, (name, value)| {
                descriptor.with_query(name, value)
            });
        self.fetch_json(&descriptor, cancel).await
    }

    /// Fetch one activity.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unusable id, otherwise the classified
    /// [`AccessError`] of the call.
    pub async fn get_activity(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Activity, AccessError> {
        let id = resource_id("activity", id)?;
        let descriptor = RequestDescriptor::get(format!("/activities/{id}"));
        self.fetch_json(&descriptor, cancel).await
    }

    /// List the stages of an activity.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unusable id, otherwise the classified
    /// [`AccessError`] of the call.
    pub async fn list_stages(
        &self,
        activity_id: &str,
        cancel: &CancellationToken,
    ) -> Result<Vec<Stage>, AccessError> {
        let id = resource_id("activity", activity_id)?;
        let descriptor = RequestDescriptor::get(format!("/activities/{id}/stages"));
        self.fetch_json(&descriptor, cancel).await
    }

    /// Best-effort variant of [`list_stages`](Self::list_stages).
    ///
    /// Any failure is logged and degrades to an empty list.
    pub async fn list_stages_or_empty(
        &self,
        activity_id: &str,
        cancel: &CancellationToken,
    ) -> Vec<Stage> {
        match self.list_stages(activity_id, cancel).await {
            Ok(stages) => stages,
            Err(error) => {
                warn!(
                    activity_id,
                    kind = error.kind().as_str(),
                    status = ?error.status(),
                    "stage listing unavailable; continuing without stages"
                );
                Vec::new()
            }
        }
    }

    /// Fetch one stage.
    ///
    /// # Errors
    ///
    /// Returns `Validation` for an unusable id, otherwise the classified
    /// [`AccessError`] of the call.
    pub async fn get_stage(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<Stage, AccessError> {
        let id = resource_id("stage", id)?;
        let descriptor = RequestDescriptor::get(format!("/stages/{id}"));
        self.fetch_json(&descriptor, cancel).await
    }

    /// Fetch an activity and, best-effort, its stages.
    ///
    /// # Errors
    ///
    /// Fails only when the activity itself cannot be fetched.
    pub async fn activity_overview(
        &self,
        id: &str,
        cancel: &CancellationToken,
    ) -> Result<ActivityOverview, AccessError> {
        let activity = self.get_activity(id, cancel).await?;
        let stages = self.list_stages_or_empty(&activity.id, cancel).await;
        Ok(ActivityOverview { activity, stages })
    }
}
