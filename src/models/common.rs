use serde::Deserialize;

/// One entry of `GET /status/models`.
#[derive(Debug, Clone, Deserialize)]
pub struct ModelInfo {
    pub name: String,
    /// Number of workers currently serving the model.
    #[serde(default)]
    pub count: u32,
    #[serde(default)]
    pub queued: f64,
    #[serde(default)]
    pub eta: u32,
    #[serde(rename = "type", default)]
    pub category: Option<ModelCategory>,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum ModelCategory {
    Image,
    Text,
}
