//! Embedding generation
//!
//! The model is consumed through [`EmbeddingProvider`]. Backends:
//! - [`client::HttpEmbeddingProvider`]: Ollama or OpenAI-compatible endpoints
//! - [`hashing::HashingEmbedder`]: offline feature hashing
//! - [`fixed::FixedEmbeddings`]: vectors keyed by text, for tests

pub mod client;
pub mod fixed;
pub mod hashing;

use crate::config::{EmbedBackend, EmbedConfig};
use crate::model::Describe;
use std::sync::Arc;
use thiserror::Error;

/// Embed errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EmbedError {
    /// API error from the model provider
    #[error("Embedding API error: {0}")]
    ApiError(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Network error
    #[error("Network error: {0}")]
    NetworkError(String),

    /// Serialization/Deserialization error
    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Embedding has {got} dimensions, expected {expected}")]
    DimensionMismatch { expected: usize, got: usize },
}

pub type EmbedResult<T> = Result<T, EmbedError>;

/// A text embedding model
///
/// `embed` must be a pure function of its input for a fixed model.
pub trait EmbeddingProvider: Send + Sync {
    fn embed(&self, text: &str) -> EmbedResult<Vec<f32>>;

    /// Length of every vector returned by `embed`
    fn dimensions(&self) -> usize;

    fn name(&self) -> &str;
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Box<T> {
    fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        (**self).embed(text)
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

impl<T: EmbeddingProvider + ?Sized> EmbeddingProvider for Arc<T> {
    fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        (**self).embed(text)
    }

    fn dimensions(&self) -> usize {
        (**self).dimensions()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Text embedded for an entity: the title, then a newline and the
/// description unless the two are identical. An empty description still
/// gets its newline.
pub fn embedding_text(title: &str, description: &str) -> String {
    if description == title {
        title.to_string()
    } else {
        format!("{}\n{}", title, description)
    }
}

/// Embed an entity's title and description
pub fn embed_entity<P, D>(provider: &P, entity: &D) -> EmbedResult<Vec<f32>>
where
    P: EmbeddingProvider + ?Sized,
    D: Describe + ?Sized,
{
    let text = embedding_text(entity.title(), entity.description());
    let vector = provider.embed(&text)?;
    if vector.len() != provider.dimensions() {
        return Err(EmbedError::DimensionMismatch {
            expected: provider.dimensions(),
            got: vector.len(),
        });
    }
    Ok(vector)
}

/// Build the provider selected by configuration
pub fn provider_from_config(config: &EmbedConfig) -> EmbedResult<Box<dyn EmbeddingProvider>> {
    if config.dimensions == 0 {
        return Err(EmbedError::ConfigError("dimensions must be greater than zero".to_string()));
    }
    match config.provider {
        EmbedBackend::Hashing => Ok(Box::new(hashing::HashingEmbedder::new(config.dimensions))),
        EmbedBackend::Ollama | EmbedBackend::OpenAI => {
            Ok(Box::new(client::HttpEmbeddingProvider::new(config)?))
        }
    }
}
