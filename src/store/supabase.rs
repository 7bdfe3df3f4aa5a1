//! Supabase PostgREST storage.
//!
//! Expects `goals`, `pillars` and `tasks` tables where the database mints
//! `id`, `share_token` and timestamps, and foreign keys cascade on delete.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde_json::json;
use uuid::Uuid;

use super::{GoalStore, StoreError, StoreResult};
use crate::grid::{Goal, Pillar, PillarDraft, Task, TaskDraft};

/// Supabase client for the grid tables.
pub struct SupabaseStore {
    client: Client,
    url: String,
    service_role_key: String,
}

impl SupabaseStore {
    /// Create a new Supabase store.
    pub fn new(url: &str, service_role_key: &str) -> Self {
        Self {
            client: Client::new(),
            url: url.trim_end_matches('/').to_string(),
            service_role_key: service_role_key.to_string(),
        }
    }

    /// Get the PostgREST URL.
    fn rest_url(&self) -> String {
        format!("{}/rest/v1", self.url)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("apikey", &self.service_role_key)
            .header("Authorization", format!("Bearer {}", self.service_role_key))
    }

    /// Send a write and decode the returned representation.
    async fn write<T: DeserializeOwned>(
        &self,
        operation: &'static str,
        request: RequestBuilder,
        body: &serde_json::Value,
    ) -> StoreResult<Vec<T>> {
        let resp = self
            .authorized(request)
            .header("Content-Type", "application/json")
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        Self::decode(operation, resp).await
    }

    async fn read<T: DeserializeOwned>(&self, operation: &'static str, path: String) -> StoreResult<Vec<T>> {
        let resp = self
            .authorized(self.client.get(format!("{}/{}", self.rest_url(), path)))
            .send()
            .await?;
        Self::decode(operation, resp).await
    }

    async fn decode<T: DeserializeOwned>(operation: &'static str, resp: Response) -> StoreResult<Vec<T>> {
        let status = resp.status();
        let text = resp.text().await?;

        if !status.is_success() {
            return Err(StoreError::Http {
                operation,
                status: status.as_u16(),
                body: text,
            });
        }

        Ok(serde_json::from_str(&text)?)
    }

    // ==================== Goals ====================

    async fn first_goal(&self, filter: String) -> StoreResult<Option<Goal>> {
        let goals: Vec<Goal> = self
            .read("Get goal", format!("goals?{}&limit=1", filter))
            .await?;
        Ok(goals.into_iter().next())
    }
}

#[async_trait]
impl GoalStore for SupabaseStore {
    fn name(&self) -> &'static str {
        "supabase"
    }

    async fn insert_goal(&self, goal_text: &str) -> StoreResult<Goal> {
        let goals: Vec<Goal> = self
            .write(
                "Create goal",
                self.client.post(format!("{}/goals", self.rest_url())),
                &json!({ "goal_text": goal_text }),
            )
            .await?;
        goals
            .into_iter()
            .next()
            .ok_or_else(|| StoreError::Unexpected("No goal returned".to_string()))
    }

    async fn insert_pillars(&self, goal_id: Uuid, pillars: &[PillarDraft]) -> StoreResult<Vec<Pillar>> {
        let rows: Vec<serde_json::Value> = pillars
            .iter()
            .map(|p| {
                json!({
                    "goal_id": goal_id,
                    "pillar_text": p.pillar_text,
                    "position": p.position,
                })
            })
            .collect();

        self.write(
            "Create pillars",
            self.client.post(format!("{}/pillars", self.rest_url())),
            &serde_json::Value::Array(rows),
        )
        .await
    }

    async fn insert_tasks(&self, pillar_id: Uuid, tasks: &[TaskDraft]) -> StoreResult<Vec<Task>> {
        let rows: Vec<serde_json::Value> = tasks
            .iter()
            .map(|t| {
                json!({
                    "pillar_id": pillar_id,
                    "task_text": t.task_text,
                    "position": t.position,
                })
            })
            .collect();

        self.write(
            "Create tasks",
            self.client.post(format!("{}/tasks", self.rest_url())),
            &serde_json::Value::Array(rows),
        )
        .await
    }

    async fn goal_by_share_token(&self, share_token: &str) -> StoreResult<Option<Goal>> {
        self.first_goal(format!("share_token=eq.{}", urlencoding::encode(share_token)))
            .await
    }

    async fn pillars_for_goal(&self, goal_id: Uuid) -> StoreResult<Vec<Pillar>> {
        self.read(
            "Get pillars",
            format!("pillars?goal_id=eq.{}&order=position", goal_id),
        )
        .await
    }

    async fn tasks_for_pillar(&self, pillar_id: Uuid) -> StoreResult<Vec<Task>> {
        self.read(
            "Get tasks",
            format!("tasks?pillar_id=eq.{}&order=position", pillar_id),
        )
        .await
    }

    async fn public_goals(&self, limit: usize) -> StoreResult<Vec<Goal>> {
        self.read(
            "List public goals",
            format!("goals?is_public=eq.true&order=created_at.desc&limit={}", limit),
        )
        .await
    }

    async fn set_public(&self, goal_id: Uuid, is_public: bool) -> StoreResult<Option<Goal>> {
        let goals: Vec<Goal> = self
            .write(
                "Update goal",
                self.client
                    .patch(format!("{}/goals?id=eq.{}", self.rest_url(), goal_id)),
                &json!({
                    "is_public": is_public,
                    "updated_at": chrono::Utc::now(),
                }),
            )
            .await?;
        Ok(goals.into_iter().next())
    }

    async fn delete_goal(&self, goal_id: Uuid) -> StoreResult<bool> {
        let resp = self
            .authorized(
                self.client
                    .delete(format!("{}/goals?id=eq.{}", self.rest_url(), goal_id)),
            )
            .header("Prefer", "return=representation")
            .send()
            .await?;
        let deleted: Vec<serde_json::Value> = Self::decode("Delete goal", resp).await?;
        Ok(!deleted.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rest_url_trims_slash() {
        let store = SupabaseStore::new("https://abc.supabase.co/", "key");
        assert_eq!(store.rest_url(), "https://abc.supabase.co/rest/v1");
    }

    #[test]
    fn test_goal_row_decoding() {
        let body = r#"[{
            "id": "6f1c1b4e-8d0a-4c55-9f0e-2b9a3c1d7e11",
            "goal_text": "Run a marathon",
            "is_public": false,
            "share_token": "a1b2c3",
            "created_at": "2024-05-01T12:00:00.123456+00:00",
            "updated_at": "2024-05-01T12:00:00.123456+00:00"
        }]"#;
        let goals: Vec<Goal> = serde_json::from_str(body).unwrap();
        assert_eq!(goals[0].share_token, "a1b2c3");
        assert!(!goals[0].is_public);
    }

    #[tokio::test]
    async fn test_unreachable_is_request_error() {
        let store = SupabaseStore::new("http://127.0.0.1:9", "key");
        let err = store.public_goals(6).await.unwrap_err();
        assert!(matches!(err, StoreError::Request(_)));
    }
}
