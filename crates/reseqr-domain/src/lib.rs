use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const SCHEMA_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct FindingMsg {
    pub schema_version: u32,
    pub kind: String,
    pub group: Option<String>,
    pub files: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct RenameOpMsg {
    pub source: String,
    pub destination: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlanMsg {
    pub schema_version: u32,
    pub batch: String,
    pub operations: Vec<RenameOpMsg>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ApplySummary {
    pub schema_version: u32,
    pub batch: String,
    pub renamed: usize,
    pub total: usize,
}
