//! Task asset representation

use serde::{Serialize, Deserialize};

use super::doc_types;

/// A task asset of the task contract, stored at key `ID`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Task identifier
    #[serde(rename = "ID")]
    pub id: String,

    /// Title
    #[serde(rename = "Title")]
    pub title: String,

    /// Description
    #[serde(rename = "Description")]
    pub description: String,

    /// Whether the task is done
    #[serde(rename = "Done")]
    pub done: bool,

    /// Current owner
    #[serde(rename = "Owner")]
    pub owner: String,

    /// Document type discriminator
    #[serde(rename = "docType", default = "default_doc_type")]
    pub doc_type: String,
}

fn default_doc_type() -> String {
    doc_types::TASK.to_string()
}

impl Task {
    /// Create a new task
    pub fn new(id: &str, title: &str, description: &str, done: bool, owner: &str) -> Self {
        Task {
            id: id.to_string(),
            title: title.to_string(),
            description: description.to_string(),
            done,
            owner: owner.to_string(),
            doc_type: default_doc_type(),
        }
    }
}
