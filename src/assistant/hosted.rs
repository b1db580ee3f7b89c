//! Hosted assistants API driver.
//!
//! Implements [`AssistantGateway`] against the assistants REST surface:
//! threads, thread messages, and runs. Requests carry bearer auth plus the
//! `OpenAI-Beta: assistants=v2` header the hosted API requires.

use serde_json::Value;

use super::{AssistantGateway, GatewayError, RunPollStatus};

const BETA_HEADER: (&str, &str) = ("OpenAI-Beta", "assistants=v2");

/// Driver for the hosted assistants REST API.
#[derive(Clone)]
pub struct HostedAssistantGateway {
    http: reqwest::Client,
    base_url: String,
}

impl std::fmt::Debug for HostedAssistantGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedAssistantGateway")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl HostedAssistantGateway {
    /// Create a new gateway against the given API base URL
    /// (e.g. `https://api.openai.com/v1`).
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url.trim_end_matches('/'), path)
    }

    /// POST a JSON body and decode the JSON response.
    async fn post_json(
        &self,
        api_key: &str,
        path: &str,
        body: &Value,
    ) -> Result<Value, GatewayError> {
        let resp = self
            .http
            .post(self.url(path))
            .bearer_auth(api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .json(body)
            .send()
            .await?;
        Self::decode(resp).await
    }

    /// GET and decode the JSON response.
    async fn get_json(&self, api_key: &str, path: &str) -> Result<Value, GatewayError> {
        let resp = self
            .http
            .get(self.url(path))
            .bearer_auth(api_key)
            .header(BETA_HEADER.0, BETA_HEADER.1)
            .send()
            .await?;
        Self::decode(resp).await
    }

    async fn decode(resp: reqwest::Response) -> Result<Value, GatewayError> {
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(GatewayError::RemoteStatus {
                status: status.as_u16(),
                body,
            });
        }
        Ok(resp.json().await?)
    }

    fn require_id(v: &Value, what: &str) -> Result<String, GatewayError> {
        v.get("id")
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| GatewayError::MalformedResponse(format!("{what} response missing 'id'")))
    }
}

#[async_trait::async_trait]
impl AssistantGateway for HostedAssistantGateway {
    async fn create_thread(&self, api_key: &str) -> Result<String, GatewayError> {
        let v = self
            .post_json(api_key, "threads", &serde_json::json!({}))
            .await?;
        Self::require_id(&v, "thread")
    }

    async fn post_message(
        &self,
        api_key: &str,
        thread_id: &str,
        text: &str,
    ) -> Result<(), GatewayError> {
        let body = serde_json::json!({ "role": "user", "content": text });
        self.post_json(api_key, &format!("threads/{thread_id}/messages"), &body)
            .await?;
        Ok(())
    }

    async fn start_run(
        &self,
        api_key: &str,
        thread_id: &str,
        assistant_id: &str,
    ) -> Result<String, GatewayError> {
        let body = serde_json::json!({ "assistant_id": assistant_id });
        let v = self
            .post_json(api_key, &format!("threads/{thread_id}/runs"), &body)
            .await?;
        Self::require_id(&v, "run")
    }

    async fn poll_run(
        &self,
        api_key: &str,
        thread_id: &str,
        run_id: &str,
    ) -> Result<RunPollStatus, GatewayError> {
        let v = self
            .get_json(api_key, &format!("threads/{thread_id}/runs/{run_id}"))
            .await?;
        let status = v.get("status").and_then(Value::as_str).ok_or_else(|| {
            GatewayError::MalformedResponse("run response missing 'status'".to_string())
        })?;

        Ok(match status {
            "completed" => RunPollStatus::Completed,
            "failed" | "cancelled" | "expired" | "incomplete" => {
                // Prefer the remote error message when one is attached.
                let reason = v
                    .get("last_error")
                    .and_then(|e| e.get("message"))
                    .and_then(Value::as_str)
                    .map_or_else(|| format!("run {status}"), ToString::to_string);
                RunPollStatus::Failed { reason }
            }
            _ => RunPollStatus::InProgress,
        })
    }

    async fn cancel_run(
        &self,
        api_key: &str,
        thread_id: &str,
        run_id: &str,
    ) -> Result<(), GatewayError> {
        self.post_json(
            api_key,
            &format!("threads/{thread_id}/runs/{run_id}/cancel"),
            &serde_json::json!({}),
        )
        .await?;
        Ok(())
    }

    async fn latest_message(
        &self,
        api_key: &str,
        thread_id: &str,
    ) -> Result<String, GatewayError> {
        let v = self
            .get_json(api_key, &format!("threads/{thread_id}/messages"))
            .await?;

        // The listing is newest-first; the reply is data[0].content[0].text.value.
        v.get("data")
            .and_then(|d| d.get(0))
            .and_then(|m| m.get("content"))
            .and_then(|c| c.get(0))
            .and_then(|p| p.get("text"))
            .and_then(|t| t.get("value"))
            .and_then(Value::as_str)
            .map(ToString::to_string)
            .ok_or_else(|| {
                GatewayError::MalformedResponse(
                    "message listing missing 'data[0].content[0].text.value'".to_string(),
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_building_trims_trailing_slash() {
        let gw = HostedAssistantGateway::new("https://api.example.test/v1/");
        assert_eq!(
            gw.url("threads/t_1/runs"),
            "https://api.example.test/v1/threads/t_1/runs"
        );
    }
}
