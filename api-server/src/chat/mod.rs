//! Supportive chat surface
//!
//! The backend is picked once at startup: an OpenAI-compatible provider when
//! a key is configured, the rule-based responder otherwise. Provider errors
//! fall back to the rules.

pub mod llm;
pub mod rules;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use mindbloom_core::RiskLevel;

use crate::config::LlmConfig;
use llm::LlmClient;
use rules::RuleResponder;

pub const RULE_PROVIDER: &str = "rule-based";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatReply {
    pub response: String,
    pub provider: String,
    pub timestamp: DateTime<Utc>,
}

pub enum ChatBackend {
    RuleBased(RuleResponder),
    Llm { client: LlmClient, fallback: RuleResponder },
}

impl ChatBackend {
    pub fn from_config(config: &LlmConfig) -> Self {
        if !config.is_enabled() {
            tracing::info!("Chat backend: rule-based");
            return ChatBackend::RuleBased(RuleResponder::new());
        }
        match LlmClient::from_config(config) {
            Ok(client) => {
                tracing::info!("Chat backend: {} ({})", client.provider(), client.model());
                ChatBackend::Llm {
                    client,
                    fallback: RuleResponder::new(),
                }
            }
            Err(e) => {
                tracing::warn!("LLM client unavailable, using rule-based chat: {}", e);
                ChatBackend::RuleBased(RuleResponder::new())
            }
        }
    }

    pub fn provider(&self) -> &str {
        match self {
            ChatBackend::RuleBased(_) => RULE_PROVIDER,
            ChatBackend::Llm { client, .. } => client.provider(),
        }
    }

    pub async fn reply(&self, messages: &[ChatMessage], risk_level: Option<RiskLevel>) -> ChatReply {
        let last_user = messages
            .iter()
            .rev()
            .find(|m| m.role == "user")
            .map(|m| m.content.as_str())
            .unwrap_or("");

        let (response, provider) = match self {
            ChatBackend::RuleBased(rules) => (rules.respond(last_user, risk_level), RULE_PROVIDER.to_string()),
            ChatBackend::Llm { fallback, .. } if RuleResponder::is_crisis(last_user) => {
                (fallback.respond(last_user, risk_level), RULE_PROVIDER.to_string())
            }
            ChatBackend::Llm { client, fallback } => {
                let mut prompt = vec![ChatMessage {
                    role: "system".to_string(),
                    content: system_prompt(risk_level),
                }];
                prompt.extend(messages.iter().filter(|m| m.role != "system").cloned());

                match client.complete(&prompt).await {
                    Ok(text) => (text, client.provider().to_string()),
                    Err(e) => {
                        tracing::warn!("LLM chat failed, falling back to rules: {}", e);
                        (fallback.respond(last_user, risk_level), RULE_PROVIDER.to_string())
                    }
                }
            }
        };

        ChatReply {
            response,
            provider,
            timestamp: Utc::now(),
        }
    }
}

fn system_prompt(risk_level: Option<RiskLevel>) -> String {
    let mut prompt = String::from(
        "You are a compassionate mental health assistant for MindBloom, a postpartum depression risk \
screening service for mothers in Bangladesh. Be empathetic, supportive and non-judgmental. Do not \
diagnose and do not invent facts about the user. Offer practical coping suggestions when appropriate, \
encourage professional help when risk is elevated, and always put the user's safety first. Be \
culturally sensitive.",
    );
    if let Some(level) = risk_level {
        prompt.push_str(&format!(" The user's latest screening result was {} risk.", level));
    }
    prompt
}
