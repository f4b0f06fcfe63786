// SPDX-License-Identifier: MIT
// SPDX-FileCopyrightText: 2025 Jonathan D. A. Jewell <hyperpolymath>

//! Conversations with the Dr. Rock geologist persona

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, error};

use crate::ollama::{ChatMessage, OllamaClient};
use crate::{AppConfig, Result, RockhoundError};

pub const WELCOME_MESSAGE: &str = "Greetings, aspiring geologist! I'm Dr. Rock, your guide to the \
    fascinating world beneath your feet. Ask me anything about rocks, minerals, or geological wonders!";

const OFFLINE_REPLY: &str = "My geological sensors seem to be offline! Please make sure the AI engine is running.";
const MISCONFIGURED_REPLY: &str = "It seems there's an issue with my connection to the geological \
    data-banks. Please check the configuration.";
const INTERFERENCE_REPLY: &str = "Apologies, my seismograph is picking up some interference! \
    I couldn't process that. Could you try rephrasing or asking again?";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    User,
    DrRock,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Turn {
    pub speaker: Speaker,
    pub text: String,
    pub at: DateTime<Utc>,
}

/// Produces the persona's next message for a transcript
#[async_trait]
pub trait ChatBackend: Send + Sync {
    async fn reply(&self, messages: &[ChatMessage]) -> Result<String>;
}

/// [`ChatBackend`] backed by an Ollama chat model
pub struct OllamaChat {
    client: OllamaClient,
    model: String,
}

impl OllamaChat {
    pub fn new(client: OllamaClient, model: impl Into<String>) -> Self {
        Self { client, model: model.into() }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(
            OllamaClient::new(&config.ai_engine)?,
            config.ai_engine.models.chat.clone(),
        ))
    }
}

#[async_trait]
impl ChatBackend for OllamaChat {
    async fn reply(&self, messages: &[ChatMessage]) -> Result<String> {
        self.client.chat_with_retry(&self.model, messages).await
    }
}

/// In-character text shown in place of a reply that failed
pub fn reply_or_apology(result: Result<String>) -> String {
    match result {
        Ok(text) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => INTERFERENCE_REPLY.to_string(),
        Err(e) => {
            error!("Error getting Dr. Rock chat response: {}", e);
            match e {
                RockhoundError::ServiceUnavailable(_) => OFFLINE_REPLY.to_string(),
                RockhoundError::Api(ref inner) if inner.is_connect() || inner.is_timeout() => {
                    OFFLINE_REPLY.to_string()
                }
                RockhoundError::Config(_) => MISCONFIGURED_REPLY.to_string(),
                other => format!(
                    "Apologies, an unexpected geological tremor occurred: {}. Could you try again?",
                    other
                ),
            }
        }
    }
}

/// A transcript that opens with the welcome message
pub struct Conversation {
    persona: String,
    turns: Vec<Turn>,
}

impl Conversation {
    pub fn new(persona: impl Into<String>) -> Self {
        Self {
            persona: persona.into(),
            turns: vec![Turn {
                speaker: Speaker::DrRock,
                text: WELCOME_MESSAGE.to_string(),
                at: Utc::now(),
            }],
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    /// Persona prompt followed by every turn, in model message form
    pub fn messages(&self) -> Vec<ChatMessage> {
        std::iter::once(ChatMessage::system(self.persona.as_str()))
            .chain(self.turns.iter().map(|turn| match turn.speaker {
                Speaker::User => ChatMessage::user(turn.text.as_str()),
                Speaker::DrRock => ChatMessage::assistant(turn.text.as_str()),
            }))
            .collect()
    }

    /// Send a user message and record the reply
    ///
    /// Blank messages are ignored and return `None`. Backend failures are
    /// recorded as an in-character apology rather than surfaced.
    pub async fn ask<B: ChatBackend + ?Sized>(&mut self, backend: &B, utterance: &str) -> Option<&Turn> {
        let utterance = utterance.trim();
        if utterance.is_empty() {
            return None;
        }

        self.push(Speaker::User, utterance.to_string());
        debug!("Asking Dr. Rock ({} turns so far)", self.turns.len());

        let text = reply_or_apology(backend.reply(&self.messages()).await);
        self.push(Speaker::DrRock, text);
        self.turns.last()
    }

    fn push(&mut self, speaker: Speaker, text: String) {
        self.turns.push(Turn { speaker, text, at: Utc::now() });
    }
}
