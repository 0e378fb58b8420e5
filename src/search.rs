//! Semantic search over the entity graph
//!
//! Every mode embeds the query, takes the nearest entities from the vector
//! index and post-processes them. Each call opens its own store session.
//!
//! Searching by kind filters a fixed pool of global candidates
//! (`SearchConfig::type_pool`), so it can return fewer than `k` rows even
//! when more entities of that kind exist further down the ranking.

use crate::config::SearchConfig;
use crate::embed::{EmbedError, EmbeddingProvider};
use crate::error::{CatalogError, CatalogResult};
use crate::model::EntityKind;
use crate::store::{GraphStore, ScoredNode};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Row returned by `search_all` and `search_by_type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub kind: EntityKind,
    pub score: f32,
}

/// Row returned by `search_by_children`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerHit {
    pub parent_title: String,
    /// `"<Kind>: <title>"` of the matching child
    pub child: String,
    pub score: f32,
}

pub struct SearchService<'a> {
    store: &'a dyn GraphStore,
    embedder: &'a dyn EmbeddingProvider,
    config: SearchConfig,
}

impl<'a> SearchService<'a> {
    pub fn new(store: &'a dyn GraphStore, embedder: &'a dyn EmbeddingProvider) -> Self {
        Self::with_config(store, embedder, SearchConfig::default())
    }

    pub fn with_config(
        store: &'a dyn GraphStore,
        embedder: &'a dyn EmbeddingProvider,
        config: SearchConfig,
    ) -> Self {
        Self {
            store,
            embedder,
            config,
        }
    }

    pub fn config(&self) -> &SearchConfig {
        &self.config
    }

    /// Top `k` entities of any kind
    pub fn search_all(&self, query: &str, k: usize) -> CatalogResult<Vec<SearchHit>> {
        let hits = self.nearest(query, k, k)?;
        debug!("search_all k={} returned {} hits", k, hits.len());
        Ok(hits.into_iter().map(Self::to_hit).collect())
    }

    /// Up to `k` entities of `kind`, taken from the global candidate pool
    pub fn search_by_type(&self, query: &str, k: usize, kind: EntityKind) -> CatalogResult<Vec<SearchHit>> {
        let pool = self.config.type_pool.max(k);
        let hits: Vec<SearchHit> = self
            .nearest(query, k, pool)?
            .into_iter()
            .filter(|hit| hit.entity.kind == kind)
            .take(k)
            .map(Self::to_hit)
            .collect();
        debug!(
            "search_by_type kind={} k={} pool={} returned {} hits",
            kind,
            k,
            pool,
            hits.len()
        );
        Ok(hits)
    }

    /// Datasets containing the top `k` entities; hits without a parent are dropped
    pub fn search_by_children(&self, query: &str, k: usize) -> CatalogResult<Vec<ContainerHit>> {
        let vector = self.embed_query(query, k)?;
        let session = self.store.connect()?;
        let hits = session.query_vector_index(&self.config.index_name, k, &vector)?;

        let mut rows = Vec::with_capacity(hits.len());
        for hit in hits {
            if let Some(parent) = session.parent_of(hit.entity.node_id)? {
                rows.push(ContainerHit {
                    parent_title: parent.title,
                    child: format!("{}: {}", hit.entity.kind, hit.entity.title),
                    score: hit.score,
                });
            }
        }
        debug!("search_by_children k={} returned {} rows", k, rows.len());
        Ok(rows)
    }

    fn nearest(&self, query: &str, k: usize, fetch: usize) -> CatalogResult<Vec<ScoredNode>> {
        let vector = self.embed_query(query, k)?;
        let session = self.store.connect()?;
        Ok(session.query_vector_index(&self.config.index_name, fetch, &vector)?)
    }

    fn embed_query(&self, query: &str, k: usize) -> CatalogResult<Vec<f32>> {
        if query.trim().is_empty() {
            return Err(CatalogError::InvalidQuery("query text is empty".to_string()));
        }
        if k == 0 || k > self.config.max_k {
            return Err(CatalogError::InvalidQuery(format!(
                "k must be between 1 and {}, got {}",
                self.config.max_k, k
            )));
        }

        let vector = self.embedder.embed(query)?;
        if vector.len() != self.embedder.dimensions() {
            return Err(EmbedError::DimensionMismatch {
                expected: self.embedder.dimensions(),
                got: vector.len(),
            }
            .into());
        }
        Ok(vector)
    }

    fn to_hit(hit: ScoredNode) -> SearchHit {
        SearchHit {
            title: hit.entity.title,
            kind: hit.entity.kind,
            score: hit.score,
        }
    }
}
