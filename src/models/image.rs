use crate::config::HordeConfig;
use crate::size::{AspectRatio, ImageSize};
use serde::{Deserialize, Serialize};

/// What the user filled in when pressing "generate".
#[derive(Debug, Clone)]
pub struct GenerationForm {
    pub prompt: String,
    pub model: String,
    pub count: usize,
    pub aspect_ratio: AspectRatio,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: String,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    pub sampler: String,
    pub negative_prompt: Option<String>,
}

impl GenerationRequest {
    /// A request at `size` with the configured defaults for everything else.
    pub fn new(
        prompt: impl Into<String>,
        model: impl Into<String>,
        size: ImageSize,
        config: &HordeConfig,
    ) -> Self {
        Self {
            prompt: prompt.into(),
            model: model.into(),
            width: size.width,
            height: size.height,
            steps: config.default_steps,
            cfg_scale: config.cfg_scale,
            sampler: config.sampler.clone(),
            negative_prompt: config.negative_prompt.clone(),
        }
    }

    pub fn size(&self) -> ImageSize {
        ImageSize::new(self.width, self.height)
    }

    /// Same request, shrunk to the cheap tier. Width, height and steps only ever go down.
    pub fn cheaper(&self, max_side: u32, max_steps: u32) -> Self {
        let size = self.size().clamp(max_side);
        Self {
            width: size.width,
            height: size.height,
            steps: self.steps.min(max_steps),
            ..self.clone()
        }
    }
}

/// Body of `POST /generate/async`.
#[derive(Debug, Serialize)]
pub struct HordeGenerateRequest {
    pub prompt: String,
    pub nsfw: bool,
    pub params: HordeGenerateParams,
}

#[derive(Debug, Serialize)]
pub struct HordeGenerateParams {
    /// One image per request; the orchestrator loops for the count.
    pub n: u32,
    pub width: u32,
    pub height: u32,
    pub steps: u32,
    pub cfg_scale: f32,
    pub sampler_name: String,
    pub models: Vec<String>,
}

impl HordeGenerateRequest {
    pub fn from_request(request: &GenerationRequest, nsfw: bool) -> Self {
        // The Horde reads everything after "###" as the negative prompt.
        let prompt = match request.negative_prompt.as_deref() {
            Some(negative) if !negative.trim().is_empty() => {
                format!("{} ### {}", request.prompt, negative)
            }
            _ => request.prompt.clone(),
        };

        Self {
            prompt,
            nsfw,
            params: HordeGenerateParams {
                n: 1,
                width: request.width,
                height: request.height,
                steps: request.steps,
                cfg_scale: request.cfg_scale,
                sampler_name: request.sampler.clone(),
                models: vec![request.model.clone()],
            },
        }
    }
}

/// 202 response of `POST /generate/async`.
#[derive(Debug, Deserialize)]
pub struct HordeGenerateAsyncResponse {
    pub id: String,
    pub message: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest::new(
            "a red fox",
            "stable_diffusion",
            ImageSize::new(704, 396),
            &HordeConfig::default(),
        )
    }

    #[test]
    fn cheaper_clamps_and_never_grows() {
        let cheap = request().cheaper(640, 20);
        assert_eq!((cheap.width, cheap.height, cheap.steps), (640, 396, 20));
        assert_eq!(cheap.prompt, "a red fox");

        let mut small = request();
        small.width = 320;
        small.height = 320;
        small.steps = 12;
        let cheap = small.cheaper(640, 20);
        assert_eq!((cheap.width, cheap.height, cheap.steps), (320, 320, 12));
    }

    #[test]
    fn payload_matches_horde_shape() {
        let body = serde_json::to_value(HordeGenerateRequest::from_request(&request(), false))
            .unwrap();
        assert_eq!(
            body,
            serde_json::json!({
                "prompt": "a red fox",
                "nsfw": false,
                "params": {
                    "n": 1,
                    "width": 704,
                    "height": 396,
                    "steps": 28,
                    "cfg_scale": 7.0,
                    "sampler_name": "k_euler_a",
                    "models": ["stable_diffusion"]
                }
            })
        );
    }

    #[test]
    fn negative_prompt_uses_separator() {
        let mut req = request();
        req.negative_prompt = Some("blurry".to_string());
        let body = HordeGenerateRequest::from_request(&req, false);
        assert_eq!(body.prompt, "a red fox ### blurry");
    }
}
