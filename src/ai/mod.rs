//! AI coach - suggestions and progression reports from a chat-completion API
//!
//! The model's answer is free text. Suggestions are pulled out of list lines;
//! progression reports are shown as-is.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::Deserialize;
use serde_json::json;
use tracing::{info, warn};

use crate::model::{HistorySession, WorkoutState};

/// Sessions embedded in a prompt
const PROMPT_HISTORY: usize = 10;

#[derive(Debug, thiserror::Error)]
pub enum AiError {
    #[error("Une requête est déjà en cours")]
    Busy,
    #[error("Clé API manquante (CARNET_AI_KEY)")]
    NotConfigured,
    #[error("Erreur réseau : {0}")]
    Http(#[from] reqwest::Error),
    #[error("Erreur de l'API ({status}) : {body}")]
    Api { status: u16, body: String },
    #[error("Réponse vide du modèle")]
    EmptyResponse,
    #[error("Sérialisation impossible : {0}")]
    Json(#[from] serde_json::Error),
}

/// API configuration
#[derive(Debug, Clone)]
pub struct AiConfig {
    pub api_url: String,
    pub api_key: Option<String>,
    pub model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletionResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    content: String,
}

/// Clears the loading flag on every exit path
struct LoadingGuard<'a>(&'a AtomicBool);

impl<'a> LoadingGuard<'a> {
    fn acquire(flag: &'a AtomicBool) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(flag))
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

pub struct AiClient {
    config: AiConfig,
    client: reqwest::Client,
    loading: AtomicBool,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            loading: AtomicBool::new(false),
        }
    }

    pub fn is_loading(&self) -> bool {
        self.loading.load(Ordering::Acquire)
    }

    /// Exercise suggestions as a list of lines
    pub async fn suggest(
        &self,
        state: &WorkoutState,
        history: &[HistorySession],
    ) -> Result<Vec<String>, AiError> {
        let prompt = build_suggestion_prompt(state, history)?;
        let text = self.complete(&prompt).await?;
        Ok(parse_suggestions(&text))
    }

    /// Free-form progression report
    pub async fn analyze(&self, history: &[HistorySession]) -> Result<String, AiError> {
        let prompt = build_progression_prompt(history)?;
        self.complete(&prompt).await
    }

    async fn complete(&self, prompt: &str) -> Result<String, AiError> {
        let api_key = self.config.api_key.as_deref().ok_or(AiError::NotConfigured)?;
        let _guard = LoadingGuard::acquire(&self.loading).ok_or(AiError::Busy)?;

        let request_body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
            "temperature": 0.7,
        });

        info!("Sending prompt to {} ({} chars)", self.config.model, prompt.len());
        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.api_url.trim_end_matches('/')))
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&request_body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!("AI API error {}: {}", status, body);
            return Err(AiError::Api { status, body });
        }

        let completion: ChatCompletionResponse = response.json().await?;
        completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .filter(|text| !text.trim().is_empty())
            .ok_or(AiError::EmptyResponse)
    }
}

fn recent(history: &[HistorySession]) -> Vec<&HistorySession> {
    let mut sessions: Vec<&HistorySession> = history.iter().collect();
    sessions.sort_by(|a, b| b.date.cmp(&a.date));
    sessions.truncate(PROMPT_HISTORY);
    sessions
}

pub fn build_suggestion_prompt(
    state: &WorkoutState,
    history: &[HistorySession],
) -> Result<String, serde_json::Error> {
    Ok(format!(
        "Tu es un coach de musculation. Voici mon programme actuel (JSON) :\n{}\n\n\
         Et mes dernières séances :\n{}\n\n\
         Propose 5 exercices ou ajustements pour équilibrer ce programme. \
         Réponds uniquement par une liste numérotée, une idée par ligne.",
        serde_json::to_string(state)?,
        serde_json::to_string(&recent(history))?,
    ))
}

pub fn build_progression_prompt(history: &[HistorySession]) -> Result<String, serde_json::Error> {
    Ok(format!(
        "Tu es un coach de musculation. Voici l'historique de mes séances (JSON) :\n{}\n\n\
         Analyse ma progression : exercices en progrès, stagnations, volume, \
         et donne des conseils concrets pour les prochaines semaines.",
        serde_json::to_string(&recent(history))?,
    ))
}

/// Keep list lines (1. / 1) / - / * / •) and strip their markers
pub fn parse_suggestions(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| strip_marker(line.trim()))
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect()
}

fn strip_marker(line: &str) -> Option<&str> {
    for bullet in ["-", "*", "•"] {
        if let Some(rest) = line.strip_prefix(bullet) {
            return Some(rest);
        }
    }

    let digits = line.chars().take_while(char::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let rest = &line[digits..];
    rest.strip_prefix('.').or_else(|| rest.strip_prefix(')'))
}
