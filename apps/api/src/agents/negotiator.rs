use async_trait::async_trait;
use tracing::info;

use crate::agents::prompts::{NEGOTIATION_PROMPT_TEMPLATE, NEGOTIATION_SYSTEM};
use crate::agents::{AgentError, NegotiationRequest, NegotiationSynthesizer};
use crate::decision::negotiation::{parse_negotiation, NegotiationResult};
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::{LlmClient, LlmError};

pub struct LlmNegotiator {
    client: LlmClient,
}

impl LlmNegotiator {
    pub fn new(client: LlmClient) -> Self {
        Self { client }
    }
}

fn build_prompt(request: &NegotiationRequest<'_>) -> Result<String, AgentError> {
    let evaluations = serde_json::json!({
        "technical": request.technical,
        "culture": request.culture,
        "business": request.business,
    });
    let evaluations = serde_json::to_string_pretty(&evaluations).map_err(LlmError::Parse)?;

    Ok(NEGOTIATION_PROMPT_TEMPLATE
        .replace("{name}", &request.candidate.name)
        .replace("{role}", &request.candidate.role_applying)
        .replace("{evaluations}", &evaluations)
        .replace("{gap}", &format!("{:.1}", request.gap)))
}

#[async_trait]
impl NegotiationSynthesizer for LlmNegotiator {
    async fn negotiate(
        &self,
        request: &NegotiationRequest<'_>,
    ) -> Result<NegotiationResult, AgentError> {
        info!(
            "Negotiating for candidate {} (gap {:.2})",
            request.candidate.id, request.gap
        );
        let prompt = build_prompt(request)?;
        let system = format!("{NEGOTIATION_SYSTEM}\n{JSON_ONLY_SYSTEM}");

        let response = self.client.call(&prompt, &system).await?;
        let text = response.text().ok_or(LlmError::EmptyContent)?;
        Ok(parse_negotiation(text)?)
    }
}
