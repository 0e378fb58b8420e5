//! Crate-level errors

use crate::config::ConfigError;
use crate::embed::EmbedError;
use crate::store::StoreError;
use std::fmt;
use thiserror::Error;

/// Ingestion step that failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestStage {
    Connect,
    Dataset(String),
    Fact { dataset: String, fact: String },
    Attribute { dataset: String, attribute: String },
    Reference { from: String, to: String },
    VectorIndex(String),
    Commit,
}

impl fmt::Display for IngestStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IngestStage::Connect => write!(f, "connect"),
            IngestStage::Dataset(id) => write!(f, "dataset `{}`", id),
            IngestStage::Fact { dataset, fact } => write!(f, "fact `{}` of dataset `{}`", fact, dataset),
            IngestStage::Attribute { dataset, attribute } => {
                write!(f, "attribute `{}` of dataset `{}`", attribute, dataset)
            }
            IngestStage::Reference { from, to } => write!(f, "reference `{}` -> `{}`", from, to),
            IngestStage::VectorIndex(name) => write!(f, "vector index `{}`", name),
            IngestStage::Commit => write!(f, "commit"),
        }
    }
}

#[derive(Error, Debug)]
pub enum CatalogError {
    /// Store or catalog unreachable
    #[error("Connectivity error: {0}")]
    Connectivity(String),

    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbedError),

    #[error("Entity `{id}` already exists; run teardown before ingesting again")]
    DuplicateEntity { id: String },

    #[error("Vector index `{0}` already exists; run teardown before ingesting again")]
    IndexAlreadyExists(String),

    #[error("Store query failed: {0}")]
    StoreQuery(#[source] StoreError),

    /// Catalog model could not be read or parsed
    #[error("Catalog source error: {0}")]
    Source(String),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Invalid query: {0}")]
    InvalidQuery(String),

    #[error("Ingestion failed at {stage}: {source}")]
    Ingestion {
        stage: IngestStage,
        #[source]
        source: Box<CatalogError>,
    },
}

pub type CatalogResult<T> = Result<T, CatalogError>;

impl CatalogError {
    pub fn at(self, stage: IngestStage) -> Self {
        CatalogError::Ingestion {
            stage,
            source: Box::new(self),
        }
    }

    /// The error underneath any ingestion-stage wrapping
    pub fn root(&self) -> &CatalogError {
        match self {
            CatalogError::Ingestion { source, .. } => source.root(),
            other => other,
        }
    }

    /// Stage an ingestion error was raised at
    pub fn stage(&self) -> Option<&IngestStage> {
        match self {
            CatalogError::Ingestion { stage, .. } => Some(stage),
            _ => None,
        }
    }
}

impl From<StoreError> for CatalogError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(msg) => CatalogError::Connectivity(msg),
            StoreError::DuplicateEntity { id } => CatalogError::DuplicateEntity { id },
            StoreError::IndexAlreadyExists(name) => CatalogError::IndexAlreadyExists(name),
            other => CatalogError::StoreQuery(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::EntityKind;

    #[test]
    fn test_store_error_mapping() {
        let err: CatalogError = StoreError::DuplicateEntity { id: "d1".into() }.into();
        assert!(matches!(err, CatalogError::DuplicateEntity { .. }));

        let err: CatalogError = StoreError::Unavailable("down".into()).into();
        assert!(matches!(err, CatalogError::Connectivity(_)));

        let err: CatalogError = StoreError::EntityNotFound {
            kind: EntityKind::Dataset,
            id: "x".into(),
        }
        .into();
        assert!(matches!(err, CatalogError::StoreQuery(_)));
    }

    #[test]
    fn test_stage_wrapping() {
        let err = CatalogError::IndexAlreadyExists("idx".into())
            .at(IngestStage::VectorIndex("idx".into()));
        assert!(matches!(err.root(), CatalogError::IndexAlreadyExists(_)));
        assert_eq!(err.stage(), Some(&IngestStage::VectorIndex("idx".into())));
        assert!(err.to_string().contains("vector index `idx`"));

        let fact = IngestStage::Fact {
            dataset: "d1".into(),
            fact: "f1".into(),
        };
        assert_eq!(fact.to_string(), "fact `f1` of dataset `d1`");
    }
}
