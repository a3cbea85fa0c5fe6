use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use utoipa::ToSchema;

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SaveStoryResponse {
    pub ok: bool,
    pub id: String,
    pub rev: String,
    /// Original upload names mapped to the names they were stored under.
    pub binary_rename_map: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
pub struct DeleteStoryResponse {
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct BrowseResponse {
    pub total_results: usize,
    pub offset: usize,
    /// Story summaries keyed by story id.
    #[schema(value_type = Object)]
    pub stories: Map<String, Value>,
}
