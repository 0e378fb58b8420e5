//! Embeddings looked up by exact text
//!
//! Stands in for a model where results must be chosen up front. Texts that
//! were not registered fail, unless a fallback embedder is set.

use crate::embed::{EmbedError, EmbedResult, EmbeddingProvider};
use crate::embed::hashing::HashingEmbedder;
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub struct FixedEmbeddings {
    dimensions: usize,
    vectors: HashMap<String, Vec<f32>>,
    failing: HashSet<String>,
    fallback: Option<HashingEmbedder>,
    calls: AtomicUsize,
}

impl FixedEmbeddings {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            ..Self::default()
        }
    }

    /// Register the vector returned for `text`
    pub fn with(mut self, text: impl Into<String>, vector: Vec<f32>) -> Self {
        self.vectors.insert(text.into(), vector);
        self
    }

    /// Make `text` fail with an API error
    pub fn failing_on(mut self, text: impl Into<String>) -> Self {
        self.failing.insert(text.into());
        self
    }

    /// Hash unregistered texts instead of failing
    pub fn with_hashing_fallback(mut self) -> Self {
        self.fallback = Some(HashingEmbedder::new(self.dimensions));
        self
    }

    /// Number of `embed` calls so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl EmbeddingProvider for FixedEmbeddings {
    fn embed(&self, text: &str) -> EmbedResult<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.failing.contains(text) {
            return Err(EmbedError::ApiError(format!("model failed on {:?}", text)));
        }
        match (self.vectors.get(text), &self.fallback) {
            (Some(vector), _) => Ok(vector.clone()),
            (None, Some(fallback)) => fallback.embed(text),
            (None, None) => Err(EmbedError::ApiError(format!("no embedding registered for {:?}", text))),
        }
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        "fixed"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_and_failures() {
        let provider = FixedEmbeddings::new(2)
            .with("a", vec![1.0, 0.0])
            .failing_on("boom");

        assert_eq!(provider.embed("a").unwrap(), vec![1.0, 0.0]);
        assert!(matches!(provider.embed("boom"), Err(EmbedError::ApiError(_))));
        assert!(provider.embed("unknown").is_err());
        assert_eq!(provider.calls(), 3);

        let provider = provider.with_hashing_fallback();
        assert_eq!(provider.embed("unknown").unwrap().len(), 2);
    }
}
