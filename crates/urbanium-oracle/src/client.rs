//! HTTP decision oracle backed by an OpenAI-compatible chat completions API.
//!
//! [`LlmOracle`] renders a prompt, posts it to `{api_base}/chat/completions`,
//! and parses the first choice's message into an [`OracleProposal`]. The
//! core oracle trait is synchronous because a tick runs under exclusive
//! access to the world; the client bridges into the surrounding Tokio
//! runtime with `block_in_place` and bounds the whole call with
//! `tokio::time::timeout`.

use std::time::Duration;

use tokio::runtime::{Handle, RuntimeFlavor};
use tracing::debug;
use urbanium_core::{DecisionOracle, OracleError, OracleProposal, OracleRequest};

use crate::config::OracleConfig;
use crate::error::OracleClientError;
use crate::parse::parse_reply;
use crate::prompt::{PromptEngine, RenderedPrompt};

/// Decision oracle that asks a language model.
pub struct LlmOracle {
    client: reqwest::Client,
    config: OracleConfig,
    api_key: String,
    prompts: PromptEngine,
}

impl LlmOracle {
    /// Build an oracle from configuration.
    ///
    /// Reads the API key from the environment and loads the prompt
    /// templates.
    pub fn new(config: OracleConfig) -> Result<Self, OracleClientError> {
        let api_key = config.api_key()?;
        Self::with_api_key(config, api_key)
    }

    /// Build an oracle with an explicit API key.
    pub fn with_api_key(config: OracleConfig, api_key: String) -> Result<Self, OracleClientError> {
        config.validate()?;
        let prompts = PromptEngine::load(config.template_dir.as_deref())?;
        Ok(Self {
            client: reqwest::Client::new(),
            config,
            api_key,
            prompts,
        })
    }

    /// The model this oracle asks.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Send a rendered prompt and return the reply text.
    pub async fn complete(&self, prompt: &RenderedPrompt) -> Result<String, OracleClientError> {
        let body = serde_json::json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": prompt.system},
                {"role": "user", "content": prompt.user}
            ],
            "temperature": self.config.temperature,
            "max_tokens": self.config.max_tokens,
            "response_format": {"type": "json_object"}
        });

        let response = self
            .client
            .post(self.config.completions_url())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleClientError::Http {
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "unable to read error body".to_owned());
            return Err(OracleClientError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let json: serde_json::Value =
            response
                .json()
                .await
                .map_err(|e| OracleClientError::Response {
                    message: format!("completion body is not JSON: {e}"),
                })?;

        extract_message_content(&json)
    }

    /// Render, send, and parse one request within `timeout`.
    pub async fn propose(
        &self,
        prompt: &RenderedPrompt,
        timeout: Duration,
    ) -> Result<OracleProposal, OracleClientError> {
        let timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        let Ok(reply) = tokio::time::timeout(timeout, self.complete(prompt)).await else {
            return Err(OracleClientError::Timeout { timeout_ms });
        };
        parse_reply(&reply?)
    }
}

impl DecisionOracle for LlmOracle {
    fn propose_action(
        &mut self,
        request: &OracleRequest<'_>,
        timeout: Duration,
    ) -> Result<OracleProposal, OracleError> {
        let prompt = self.prompts.render(request)?;
        let handle = Handle::try_current().map_err(|e| OracleClientError::Unavailable {
            message: format!("no Tokio runtime: {e}"),
        })?;
        // `block_in_place` needs a worker thread it can hand off.
        if handle.runtime_flavor() != RuntimeFlavor::MultiThread {
            return Err(OracleClientError::Unavailable {
                message: String::from("the oracle needs a multi-threaded Tokio runtime"),
            }
            .into());
        }

        let this = &*self;
        let proposal =
            tokio::task::block_in_place(|| handle.block_on(this.propose(&prompt, timeout)))?;
        debug!(
            tick = request.tick,
            citizen_id = %request.citizen.id,
            action = %proposal.action,
            model = this.model(),
            "Oracle proposal received"
        );
        Ok(proposal)
    }
}

/// Extract `choices[0].message.content` from a completion body.
fn extract_message_content(json: &serde_json::Value) -> Result<String, OracleClientError> {
    json.get("choices")
        .and_then(|c| c.get(0))
        .and_then(|c| c.get("message"))
        .and_then(|m| m.get("content"))
        .and_then(serde_json::Value::as_str)
        .map(ToOwned::to_owned)
        .ok_or_else(|| OracleClientError::Response {
            message: String::from("missing choices[0].message.content"),
        })
}
