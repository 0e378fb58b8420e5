//! Full reset of the store
//!
//! Deletes every node and relationship and drops the vector index. No
//! confirmation, no dry run; running it on an empty store changes nothing.

use crate::config::DEFAULT_INDEX_NAME;
use crate::error::CatalogResult;
use crate::store::GraphStore;
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeardownReport {
    pub nodes_deleted: usize,
    pub relationships_deleted: usize,
    pub index_dropped: bool,
}

pub struct TeardownTool<'a> {
    store: &'a dyn GraphStore,
    index_name: String,
}

impl<'a> TeardownTool<'a> {
    pub fn new(store: &'a dyn GraphStore) -> Self {
        Self {
            store,
            index_name: DEFAULT_INDEX_NAME.to_string(),
        }
    }

    pub fn with_index_name(mut self, name: impl Into<String>) -> Self {
        self.index_name = name.into();
        self
    }

    pub fn run(&self) -> CatalogResult<TeardownReport> {
        self.store.verify_connectivity()?;
        let mut session = self.store.connect()?;

        let (nodes_deleted, relationships_deleted) = session.delete_all()?;
        let index_dropped = session.drop_vector_index(&self.index_name)?;
        session.commit()?;

        info!(
            "Deleted {} nodes and {} relationships; index {} {}",
            nodes_deleted,
            relationships_deleted,
            self.index_name,
            if index_dropped { "dropped" } else { "was absent" }
        );
        Ok(TeardownReport {
            nodes_deleted,
            relationships_deleted,
            index_dropped,
        })
    }
}
