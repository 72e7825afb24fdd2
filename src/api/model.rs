use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: String,
    pub label: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl Entity {
    pub fn property(&self, key: &str) -> Option<&str> {
        self.properties
            .get(key)
            .map(String::as_str)
            .filter(|value| !value.trim().is_empty())
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Relationship {
    pub from_id: String,
    pub to_id: String,
    pub rel_type: String,
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphData {
    #[serde(default)]
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub relationships: Vec<Relationship>,
}

impl GraphData {
    pub fn entity_ids(&self) -> Vec<String> {
        self.entities.iter().map(|entity| entity.id.clone()).collect()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KnowledgeStats {
    #[serde(default)]
    pub documents: u64,
    #[serde(default)]
    pub entities: u64,
    #[serde(default)]
    pub relationships: u64,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub doc_id: String,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentList {
    #[serde(default)]
    pub documents: Vec<DocumentSummary>,
    #[serde(default)]
    pub count: u64,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedResponse {
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub documents_ingested: Option<u64>,
    #[serde(default)]
    pub message: Option<String>,
}

impl SeedResponse {
    pub fn summary(&self) -> String {
        if let Some(message) = &self.message {
            return message.clone();
        }

        match (self.documents_ingested, self.status.as_deref()) {
            (Some(count), _) => format!("Seeded {count} documents"),
            (None, Some(status)) => format!("Seed finished: {status}"),
            (None, None) => "Sample data seeded".to_owned(),
        }
    }
}
