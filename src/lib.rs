//! Client for the Stable Horde image generation queue.
//!
//! Sizes are kept inside the anonymous free tier, jobs run one at a time, and a
//! kudos rejection gets exactly one cheaper retry before the slot is marked failed.

pub mod config;
pub mod error;
pub mod horde;
pub mod logger;
pub mod models;
pub mod orchestrator;
pub mod prompts;
pub mod render;
pub mod size;

pub use config::HordeConfig;
pub use error::{HordeError, Result};
pub use horde::{HordeClient, JobClient};
pub use models::{
    GenerationForm, GenerationRequest, GenerationResult, ImageRef, Job, JobStatus, ModelInfo,
};
pub use orchestrator::{JobPhase, LogSink, Orchestrator, Slot, SlotSink, SlotState};
pub use prompts::pick_example_prompt;
pub use render::RenderedImage;
pub use size::{safe_size, AspectRatio, ImageSize};
