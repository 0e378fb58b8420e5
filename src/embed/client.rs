//! Embedding client for HTTP model providers

use crate::config::{EmbedBackend, EmbedConfig};
use crate::embed::{EmbedError, EmbedResult, EmbeddingProvider};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Calls an Ollama or OpenAI-compatible embeddings endpoint, one text per request
pub struct HttpEmbeddingProvider {
    client: Client,
    provider: EmbedBackend,
    model: String,
    api_key: Option<String>,
    api_base_url: String,
    dimensions: usize,
    name: String,
}

impl HttpEmbeddingProvider {
    /// Create a new embedding client based on configuration
    pub fn new(config: &EmbedConfig) -> EmbedResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| EmbedError::ConfigError(e.to_string()))?;

        let api_base_url = match (&config.api_base_url, config.provider) {
            (Some(url), _) => url.trim_end_matches('/').to_string(),
            (None, EmbedBackend::OpenAI) => "https://api.openai.com/v1".to_string(),
            (None, EmbedBackend::Ollama) => "http://localhost:11434".to_string(),
            (None, EmbedBackend::Hashing) => {
                return Err(EmbedError::ConfigError(
                    "hashing provider does not use an HTTP endpoint".to_string(),
                ))
            }
        };

        if config.provider == EmbedBackend::OpenAI && config.api_key.is_none() {
            return Err(EmbedError::ConfigError("OpenAI requires API key".to_string()));
        }

        Ok(Self {
            client,
            provider: config.provider,
            model: config.model.clone(),
            api_key: config.api_key.clone(),
            api_base_url,
            dimensions: config.dimensions,
            name: format!("{:?}:{}", config.provider, config.model).to_lowercase(),
        })
    }

    fn openai_embedding(&self, text: &str) -> EmbedResult<Vec<f32>> {
        #[derive(Serialize)]
        struct OpenAIRequest<'a> {
            input: &'a str,
            model: &'a str,
        }

        #[derive(Deserialize)]
        struct OpenAIResponse {
            data: Vec<OpenAIData>,
        }

        #[derive(Deserialize)]
        struct OpenAIData {
            embedding: Vec<f32>,
        }

        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| EmbedError::ConfigError("OpenAI requires API key".to_string()))?;

        let url = format!("{}/embeddings", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .header("Authorization", format!("Bearer {}", api_key))
            .json(&OpenAIRequest {
                input: text,
                model: &self.model,
            })
            .send()
            .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let error_text = resp.text().unwrap_or_default();
            return Err(EmbedError::ApiError(format!("OpenAI returned error: {}", error_text)));
        }

        let result: OpenAIResponse = resp
            .json()
            .map_err(|e| EmbedError::SerializationError(e.to_string()))?;
        result
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbedError::ApiError("OpenAI returned no embedding".to_string()))
    }

    fn ollama_embedding(&self, text: &str) -> EmbedResult<Vec<f32>> {
        #[derive(Serialize)]
        struct OllamaRequest<'a> {
            model: &'a str,
            prompt: &'a str,
        }

        #[derive(Deserialize)]
        struct OllamaResponse {
            embedding: Vec<f32>,
        }

        let url = format!("{}/api/embeddings", self.api_base_url);
        let resp = self
            .client
            .post(&url)
            .json(&OllamaRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .map_err(|e| EmbedError::NetworkError(e.to_string()))?;

        if !resp.status().is_success() {
            let error_text = resp.text().unwrap_or_default();
            return Err(EmbedError::ApiError(format!("Ollama returned error: {}", error_text)));
        }

        let result: OllamaResponse = resp
            .json()
            .map_err(|e| EmbedError::SerializationError(e.to_string()))?;
        Ok(result.embedding)
    }
}

impl EmbeddingProvider for HttpEmbeddingProvider {
    fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        debug!("Embedding {} chars with {}", text.len(), self.name);
        let vector = match self.provider {
            EmbedBackend::OpenAI => self.openai_embedding(text)?,
            EmbedBackend::Ollama => self.ollama_embedding(text)?,
            EmbedBackend::Hashing => {
                return Err(EmbedError::ConfigError(
                    "hashing provider does not use an HTTP endpoint".to_string(),
                ))
            }
        };

        if vector.len() != self.dimensions {
            return Err(EmbedError::DimensionMismatch {
                expected: self.dimensions,
                got: vector.len(),
            });
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.name
    }
}
