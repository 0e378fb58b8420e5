//! Catalog sources
//!
//! The logical model is read once per ingestion run, either from a
//! declarative layout file or from the catalog service.

use crate::config::CatalogConfig;
use crate::error::{CatalogError, CatalogResult};
use crate::model::{DeclarativeModel, LogicalModel};
use reqwest::blocking::Client;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

/// Read-only provider of the dataset tree
pub trait CatalogSource {
    fn load(&self) -> CatalogResult<LogicalModel>;

    /// Where the model comes from, for logs
    fn describe(&self) -> String;
}

/// An already loaded model
impl CatalogSource for LogicalModel {
    fn load(&self) -> CatalogResult<LogicalModel> {
        Ok(self.clone())
    }

    fn describe(&self) -> String {
        format!("in-memory model ({} datasets)", self.datasets.len())
    }
}

/// Declarative layout document on disk, JSON or YAML by extension
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn is_yaml(&self) -> bool {
        matches!(
            self.path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        )
    }
}

impl CatalogSource for FileSource {
    fn load(&self) -> CatalogResult<LogicalModel> {
        let content = fs::read_to_string(&self.path)
            .map_err(|e| CatalogError::Source(format!("cannot read {:?}: {}", self.path, e)))?;
        let model = parse_model(&content, self.is_yaml())?;
        info!(
            "Loaded {} datasets from {:?}",
            model.datasets.len(),
            self.path
        );
        Ok(model)
    }

    fn describe(&self) -> String {
        format!("file {}", self.path.display())
    }
}

/// Parse a declarative layout document
pub fn parse_model(content: &str, yaml: bool) -> CatalogResult<LogicalModel> {
    let document: DeclarativeModel = if yaml {
        serde_yaml::from_str(content).map_err(|e| CatalogError::Source(e.to_string()))?
    } else {
        serde_json::from_str(content).map_err(|e| CatalogError::Source(e.to_string()))?
    };
    Ok(document.ldm)
}

/// Logical model of a workspace, fetched from the catalog service
#[derive(Debug, Clone)]
pub struct HttpCatalogSource {
    client: Client,
    host: String,
    token: String,
    workspace: String,
}

impl HttpCatalogSource {
    pub fn new(
        host: impl Into<String>,
        token: impl Into<String>,
        workspace: impl Into<String>,
    ) -> CatalogResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| CatalogError::Connectivity(e.to_string()))?;
        Ok(Self {
            client,
            host: host.into().trim_end_matches('/').to_string(),
            token: token.into(),
            workspace: workspace.into(),
        })
    }

    pub fn from_config(config: &CatalogConfig) -> CatalogResult<Self> {
        let (host, token, workspace) = config.require()?;
        Self::new(host, token, workspace)
    }

    pub fn url(&self) -> String {
        format!(
            "{}/api/v1/layout/workspaces/{}/logicalModel",
            self.host, self.workspace
        )
    }
}

impl CatalogSource for HttpCatalogSource {
    fn load(&self) -> CatalogResult<LogicalModel> {
        let url = self.url();
        let resp = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.token))
            .header("Accept", "application/json")
            .send()
            .map_err(|e| CatalogError::Connectivity(format!("{}: {}", url, e)))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let error_text = resp.text().unwrap_or_default();
            return Err(CatalogError::Source(format!(
                "catalog returned {}: {}",
                status, error_text
            )));
        }

        let body = resp
            .text()
            .map_err(|e| CatalogError::Connectivity(e.to_string()))?;
        let model = parse_model(&body, false)?;
        info!(
            "Fetched {} datasets from workspace {}",
            model.datasets.len(),
            self.workspace
        );
        Ok(model)
    }

    fn describe(&self) -> String {
        format!("workspace {} at {}", self.workspace, self.host)
    }
}
