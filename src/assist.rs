//! Optional AI assistance over the Gemini HTTP API.
//!
//! Every call here is decorative: address autocomplete, product copy,
//! daily report prose, price estimates. A missing key, timeout, or
//! malformed response degrades to a static fallback and the caller keeps
//! going. Nothing in checkout waits on this module succeeding.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use tracing::warn;

use crate::models::{Address, Order, ProductCategory};

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const MODEL: &str = "gemini-2.5-flash";
const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Env var holding the Gemini API key. Unset means assistance is off.
pub const API_KEY_ENV: &str = "GEMINI_API_KEY";

pub struct AssistClient {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
}

#[derive(Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

#[derive(Deserialize)]
struct Part {
    text: Option<String>,
}

impl AssistClient {
    /// Build a client from the environment. Never fails; a missing key
    /// just disables assistance.
    pub fn from_env() -> Self {
        AssistClient::new(std::env::var(API_KEY_ENV).ok(), DEFAULT_BASE_URL.to_string())
    }

    pub fn new(api_key: Option<String>, base_url: String) -> Self {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_TIMEOUT)
            .build()
            .unwrap_or_default();
        AssistClient {
            client,
            api_key,
            base_url,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.api_key.is_some()
    }

    /// One generateContent round trip, returning the first candidate's
    /// text. `None` covers every failure mode.
    async fn generate(&self, prompt: &str) -> Option<String> {
        let api_key = self.api_key.as_ref()?;
        let url = format!(
            "{}/models/{}:generateContent?key={}",
            self.base_url, MODEL, api_key
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": prompt }] }]
        });

        let response = match self.client.post(&url).json(&body).send().await {
            Ok(r) => r,
            Err(e) => {
                warn!(error = %e, "Assist request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            warn!(status = %response.status(), "Assist request rejected");
            return None;
        }

        let parsed: GenerateResponse = match response.json().await {
            Ok(p) => p,
            Err(e) => {
                warn!(error = %e, "Assist response unreadable");
                return None;
            }
        };

        parsed
            .candidates?
            .into_iter()
            .next()?
            .content?
            .parts?
            .into_iter()
            .next()?
            .text
    }

    /// Suggest a structured address from free-form text. `None` simply
    /// means the form stays manual.
    pub async fn suggest_address(&self, free_text: &str) -> Option<Address> {
        let prompt = format!(
            "Extraia o endereço do texto a seguir e responda apenas com JSON \
             no formato {{\"street\":\"\",\"number\":\"\",\"neighborhood\":\"\",\"city\":\"\"}}. \
             Texto: {free_text}"
        );
        let text = self.generate(&prompt).await?;
        let cleaned = text
            .trim()
            .trim_start_matches("```json")
            .trim_start_matches("```")
            .trim_end_matches("```")
            .trim();
        match serde_json::from_str::<Address>(cleaned) {
            Ok(address) => Some(address),
            Err(e) => {
                warn!(error = %e, "Address suggestion unparseable");
                None
            }
        }
    }

    /// Marketing copy for a product card.
    pub async fn product_description(
        &self,
        name: &str,
        category: ProductCategory,
        ingredients: &[String],
    ) -> String {
        if !self.is_enabled() {
            return "Description unavailable (API Key missing).".to_string();
        }
        let prompt = format!(
            "Escreva uma descrição curta e apetitosa (máximo 2 frases, em português) \
             para o produto \"{name}\" da categoria {} com os ingredientes: {}.",
            category.label(),
            ingredients.join(", ")
        );
        match self.generate(&prompt).await {
            Some(text) => text.trim().to_string(),
            None => "Error generating description.".to_string(),
        }
    }

    /// Prose summary of the day's orders for the operator dashboard.
    pub async fn daily_report(&self, orders: &[Order]) -> String {
        if !self.is_enabled() {
            return "AI Insights unavailable.".to_string();
        }
        let revenue: f64 = orders.iter().map(|o| o.total).sum();
        let prompt = format!(
            "Resuma em português, em tópicos curtos, o desempenho do dia de uma loja de \
             delivery: {} pedidos, faturamento total de R$ {revenue:.2}.",
            orders.len()
        );
        match self.generate(&prompt).await {
            Some(text) => text.trim().to_string(),
            None => "Could not generate report.".to_string(),
        }
    }

    /// Rough market price estimate for an ingredient or product.
    pub async fn market_price_estimate(&self, item: &str) -> String {
        if !self.is_enabled() {
            return "Estimativa indisponível.".to_string();
        }
        let prompt = format!(
            "Estime em uma frase, em português, o preço médio de mercado no Brasil para: {item}."
        );
        match self.generate(&prompt).await {
            Some(text) => text.trim().to_string(),
            None => "Erro ao consultar mercado.".to_string(),
        }
    }
}

// ===========================================================================
// Tests
// ===========================================================================
