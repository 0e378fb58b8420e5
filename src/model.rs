//! Catalog data model
//!
//! Datasets, facts and attributes share one record shape and are told apart
//! by [`EntityKind`]. The source tree types mirror the declarative logical
//! model served by the catalog.

use crate::graph::Label;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Label carried by every entity node that has an embedding
pub const EMBEDDED_LABEL: &str = "Embedded";

/// Kind of catalog entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Dataset,
    Fact,
    Attribute,
}

impl EntityKind {
    pub const ALL: [EntityKind; 3] = [EntityKind::Dataset, EntityKind::Fact, EntityKind::Attribute];

    /// Graph label for this kind
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::Dataset => "Dataset",
            EntityKind::Fact => "Fact",
            EntityKind::Attribute => "Attribute",
        }
    }

    /// Kind named by an exact graph label
    pub fn from_label(label: &Label) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.label() == label.as_str())
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Error parsing an [`EntityKind`]
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown entity kind `{0}` (expected Dataset, Fact or Attribute)")]
pub struct ParseKindError(pub String);

impl FromStr for EntityKind {
    type Err = ParseKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.label().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseKindError(s.to_string()))
    }
}

/// A catalog entity as stored in the graph
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub kind: EntityKind,
    pub id: String,
    pub title: String,
    pub description: String,
}

impl Entity {
    pub fn new(
        kind: EntityKind,
        id: impl Into<String>,
        title: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            id: id.into(),
            title: title.into(),
            description: description.into(),
        }
    }
}

/// Anything with a title and a description can be embedded
pub trait Describe {
    fn title(&self) -> &str;
    fn description(&self) -> &str;
}

impl Describe for Entity {
    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }
}

/// Relationship types between entity nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationshipKind {
    /// Dataset to the fact or attribute it holds
    Contains,
    /// Dataset to a dataset it refers to
    References,
}

impl RelationshipKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationshipKind::Contains => "CONTAINS",
            RelationshipKind::References => "REFERENCES",
        }
    }
}

impl fmt::Display for RelationshipKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================
// Source tree
// ============================================================

/// Declarative layout document: `{ "ldm": { "datasets": [...] } }`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeclarativeModel {
    pub ldm: LogicalModel,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogicalModel {
    #[serde(default)]
    pub datasets: Vec<SourceDataset>,
}

impl LogicalModel {
    pub fn fact_count(&self) -> usize {
        self.datasets.iter().map(|d| d.facts.len()).sum()
    }

    pub fn attribute_count(&self) -> usize {
        self.datasets.iter().map(|d| d.attributes.len()).sum()
    }

    pub fn reference_count(&self) -> usize {
        self.datasets.iter().map(|d| d.references.len()).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceDataset {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub facts: Vec<SourceField>,
    #[serde(default)]
    pub attributes: Vec<SourceField>,
    #[serde(default)]
    pub references: Vec<SourceReference>,
}

impl SourceDataset {
    pub fn entity(&self) -> Entity {
        Entity::new(EntityKind::Dataset, &self.id, &self.title, &self.description)
    }
}

/// A fact or attribute
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SourceField {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl SourceField {
    pub fn entity(&self, kind: EntityKind) -> Entity {
        Entity::new(kind, &self.id, &self.title, &self.description)
    }
}

/// Reference from one dataset to another
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceReference {
    pub identifier: ReferenceIdentifier,
    #[serde(default)]
    pub multivalue: bool,
}

impl SourceReference {
    pub fn to(dataset_id: impl Into<String>) -> Self {
        Self {
            identifier: ReferenceIdentifier {
                id: dataset_id.into(),
                kind: "dataset".to_string(),
            },
            multivalue: false,
        }
    }

    /// Id of the referenced dataset
    pub fn target_id(&self) -> &str {
        &self.identifier.id
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceIdentifier {
    pub id: String,
    #[serde(rename = "type", default = "default_reference_type")]
    pub kind: String,
}

fn default_reference_type() -> String {
    "dataset".to_string()
}
