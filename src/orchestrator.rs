use crate::{
    config::HordeConfig,
    error::{HordeError, Result},
    horde::JobClient,
    models::{GenerationForm, GenerationRequest, Job},
    render::RenderedImage,
    size::safe_size,
};
use std::fmt;

/// Slot message after the cheaper retry was also refused.
pub const KUDOS_RETRY_FAILED: &str =
    "Needs more kudos at this size/steps. Reduced size & steps and retried, but failed.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobPhase {
    Submitting,
    /// Second and last attempt, at the cheap tier.
    SubmittingCheap,
    Polling,
}

impl fmt::Display for JobPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            JobPhase::Submitting => "submitting",
            JobPhase::SubmittingCheap => "submitting (cheaper)",
            JobPhase::Polling => "generating",
        };
        f.write_str(label)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotState {
    Loading,
    Ready(RenderedImage),
    Failed(String),
}

/// Placeholder for one requested image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slot {
    pub index: usize,
    pub state: SlotState,
}

impl Slot {
    fn loading(index: usize) -> Self {
        Self {
            index,
            state: SlotState::Loading,
        }
    }

    pub fn image(&self) -> Option<&RenderedImage> {
        match &self.state {
            SlotState::Ready(image) => Some(image),
            _ => None,
        }
    }
}

/// Receives slot updates as they happen, e.g. to draw cards.
pub trait SlotSink: Send + Sync {
    fn slot_created(&self, index: usize);

    fn slot_progress(&self, _index: usize, _phase: JobPhase) {}

    fn slot_ready(&self, index: usize, image: &RenderedImage);

    fn slot_failed(&self, index: usize, message: &str);
}

/// Sink that only writes to the log.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

impl SlotSink for LogSink {
    fn slot_created(&self, index: usize) {
        log::debug!("Slot {} created", index + 1);
    }

    fn slot_progress(&self, index: usize, phase: JobPhase) {
        log::info!("Slot {}: {}", index + 1, phase);
    }

    fn slot_ready(&self, index: usize, image: &RenderedImage) {
        if image.is_remote() {
            log::info!("Slot {} ready: {}", index + 1, image.src());
        } else {
            log::info!("Slot {} ready (inline {})", index + 1, image.extension());
        }
    }

    // the orchestrator already logs the error itself
    fn slot_failed(&self, index: usize, message: &str) {
        log::debug!("Slot {} marked failed: {}", index + 1, message);
    }
}

/// Runs a form's worth of jobs, one after another.
pub struct Orchestrator<C> {
    client: C,
    config: HordeConfig,
}

impl<C: JobClient> Orchestrator<C> {
    pub fn new(client: C, config: HordeConfig) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    /// Create `form.count` slots up front, then fill them strictly in order.
    ///
    /// Only an incomplete form is an error here; a failing job is recorded on
    /// its own slot and the next slot still runs.
    pub async fn run(&self, form: &GenerationForm, sink: &dyn SlotSink) -> Result<Vec<Slot>> {
        let prompt = form.prompt.trim();
        if prompt.is_empty() {
            return Err(HordeError::InvalidInput("prompt is empty".into()));
        }
        if form.model.trim().is_empty() {
            return Err(HordeError::InvalidInput("no model selected".into()));
        }
        if form.count == 0 {
            return Err(HordeError::InvalidInput("image count must be at least 1".into()));
        }

        let size = safe_size(form.aspect_ratio, self.config.safe_max_side);
        let request = GenerationRequest::new(prompt, form.model.trim(), size, &self.config);
        log::info!(
            "Generating {} image(s) at {} ({}) with {}",
            form.count,
            size,
            form.aspect_ratio,
            request.model
        );

        let mut slots: Vec<Slot> = (0..form.count)
            .map(|index| {
                sink.slot_created(index);
                Slot::loading(index)
            })
            .collect();

        for slot in slots.iter_mut() {
            slot.state = match self.run_slot(slot.index, &request, sink).await {
                Ok(image) => {
                    sink.slot_ready(slot.index, &image);
                    SlotState::Ready(image)
                }
                Err(err) => {
                    let message = failure_message(&err);
                    log::error!("Slot {} failed: {}", slot.index + 1, err);
                    sink.slot_failed(slot.index, &message);
                    SlotState::Failed(message)
                }
            };
        }

        Ok(slots)
    }

    async fn run_slot(
        &self,
        index: usize,
        request: &GenerationRequest,
        sink: &dyn SlotSink,
    ) -> Result<RenderedImage> {
        let job = self.submit_with_fallback(index, request, sink).await?;

        sink.slot_progress(index, JobPhase::Polling);
        let results = self
            .client
            .wait_for_result(&job.id, self.config.poll_timeout, self.config.poll_interval)
            .await?;

        // One image is requested per job, anything past the first is ignored.
        let first = results.into_iter().next().ok_or(HordeError::EmptyResult)?;
        Ok(RenderedImage::from_result(&first))
    }

    /// Submit `request`; on a kudos rejection retry exactly once at the cheap tier.
    async fn submit_with_fallback(
        &self,
        index: usize,
        request: &GenerationRequest,
        sink: &dyn SlotSink,
    ) -> Result<Job> {
        sink.slot_progress(index, JobPhase::Submitting);
        match self.client.submit(request).await {
            Err(err) if err.is_insufficient_credit() => {
                let cheap = request.cheaper(self.config.cheap_max_side, self.config.cheap_steps);
                log::warn!(
                    "Slot {}: kudos upfront required, retrying at {} / {} steps",
                    index + 1,
                    cheap.size(),
                    cheap.steps
                );
                sink.slot_progress(index, JobPhase::SubmittingCheap);
                self.client.submit(&cheap).await
            }
            other => other,
        }
    }
}

/// Text shown on a failed slot.
pub fn failure_message(err: &HordeError) -> String {
    match err {
        HordeError::InsufficientCredit(_) => KUDOS_RETRY_FAILED.to_string(),
        other => other.to_string(),
    }
}
