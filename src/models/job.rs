use super::image::GenerationRequest;
use serde::Deserialize;

/// A submission the Horde accepted.
#[derive(Debug, Clone)]
pub struct Job {
    pub id: String,
    pub request: GenerationRequest,
}

/// Response of `GET /generate/status/{id}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatus {
    #[serde(default)]
    pub done: bool,
    #[serde(default)]
    pub faulted: bool,
    #[serde(default)]
    pub wait_time: u32,
    #[serde(default)]
    pub queue_position: u32,
    #[serde(default)]
    pub generations: Option<Vec<HordeGeneration>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HordeGeneration {
    /// Either a hosted URL or a base64 payload.
    pub img: String,
    #[serde(default)]
    pub mime_type: Option<String>,
    #[serde(default)]
    pub worker_name: Option<String>,
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub seed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageRef {
    Url(String),
    Inline {
        mime_type: Option<String>,
        base64: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationResult {
    pub image: ImageRef,
    pub worker_name: Option<String>,
    pub model: Option<String>,
    pub seed: Option<String>,
}

impl From<HordeGeneration> for GenerationResult {
    fn from(generation: HordeGeneration) -> Self {
        let image = if generation.img.starts_with("http") {
            ImageRef::Url(generation.img)
        } else {
            ImageRef::Inline {
                mime_type: generation.mime_type,
                base64: generation.img,
            }
        };

        Self {
            image,
            worker_name: generation.worker_name,
            model: generation.model,
            seed: generation.seed,
        }
    }
}

impl JobStatus {
    /// Results of a finished job. A missing `generations` list counts as empty.
    pub fn into_results(self) -> Vec<GenerationResult> {
        self.generations
            .unwrap_or_default()
            .into_iter()
            .map(GenerationResult::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_parses_with_missing_fields() {
        let status: JobStatus = serde_json::from_str(r#"{"done": false}"#).unwrap();
        assert!(!status.done);
        assert!(status.into_results().is_empty());
    }

    #[test]
    fn generations_are_split_by_scheme() {
        let status: JobStatus = serde_json::from_str(
            r#"{
                "done": true,
                "generations": [
                    {"img": "https://cdn.example/x.webp", "worker_name": "w1", "seed": "42"},
                    {"img": "iVBORw0KGgo=", "mime_type": "image/webp"}
                ]
            }"#,
        )
        .unwrap();

        let results = status.into_results();
        assert_eq!(
            results[0].image,
            ImageRef::Url("https://cdn.example/x.webp".to_string())
        );
        assert_eq!(results[0].seed.as_deref(), Some("42"));
        assert_eq!(
            results[1].image,
            ImageRef::Inline {
                mime_type: Some("image/webp".to_string()),
                base64: "iVBORw0KGgo=".to_string(),
            }
        );
    }
}
