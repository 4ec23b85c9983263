//! Catalog TOML schema type definitions

use serde::{Deserialize, Serialize};

/// Root structure of a catalog document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogFile {
    pub catalog: CatalogHeader,
    #[serde(default)]
    pub phases: Vec<PhaseDefinition>,
    #[serde(default)]
    pub tasks: Vec<TaskDefinition>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogHeader {
    pub version: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PhaseDefinition {
    pub number: u32,
    pub name: String,
}

/// Task definition as written in the catalog, before validation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskDefinition {
    pub id: String,
    pub name: String,
    pub phase: u32,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub parallel_group: Option<String>,
    /// Verification command run by the verification runner
    #[serde(default)]
    pub verify: String,
    #[serde(default)]
    pub files: Vec<String>,
    #[serde(default)]
    pub requires_docker: bool,
}
