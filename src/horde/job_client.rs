use super::HordeClient;
use crate::{
    error::{HordeError, Result},
    models::{
        GenerationRequest, GenerationResult, HordeGenerateAsyncResponse, HordeGenerateRequest,
        Job, JobStatus,
    },
};
use async_trait::async_trait;
use reqwest::StatusCode;
use std::time::Duration;
use tokio::time::Instant;

#[async_trait]
pub trait JobClient: Send + Sync {
    /// Queue one single-image generation.
    ///
    /// A 403 from the Horde means the request needs kudos upfront and comes back
    /// as [`HordeError::InsufficientCredit`]; every other non-202 answer is
    /// [`HordeError::SubmitFailed`].
    async fn submit(&self, request: &GenerationRequest) -> Result<Job>;

    async fn check_status(&self, job_id: &str) -> Result<JobStatus>;

    /// Poll `job_id` every `poll_interval` until the Horde reports it done.
    ///
    /// Gives up with [`HordeError::TimedOut`] once more than `timeout` has
    /// passed. A status request still in flight at `timeout + poll_interval`
    /// is dropped, so the total wait never exceeds that.
    async fn wait_for_result(
        &self,
        job_id: &str,
        timeout: Duration,
        poll_interval: Duration,
    ) -> Result<Vec<GenerationResult>> {
        let start = Instant::now();
        let deadline = start + timeout + poll_interval;

        loop {
            if start.elapsed() > timeout {
                return Err(HordeError::TimedOut(timeout));
            }

            let status = match tokio::time::timeout_at(deadline, self.check_status(job_id)).await {
                Ok(status) => status?,
                Err(_) => {
                    log::warn!("Status request for job {} hung past the deadline", job_id);
                    return Err(HordeError::TimedOut(timeout));
                }
            };
            if status.done {
                log::debug!("Job {} done after {:?}", job_id, start.elapsed());
                return Ok(status.into_results());
            }

            log::debug!(
                "Job {} waiting: queue position {}, eta {}s",
                job_id,
                status.queue_position,
                status.wait_time
            );
            tokio::time::sleep(poll_interval).await;
        }
    }
}

#[async_trait]
impl JobClient for HordeClient {
    async fn submit(&self, request: &GenerationRequest) -> Result<Job> {
        let payload = HordeGenerateRequest::from_request(request, self.config().nsfw);

        log::info!(
            "Submitting {}x{} / {} steps with model: {}",
            request.width,
            request.height,
            request.steps,
            request.model
        );

        let response = self
            .http()
            .post(self.endpoint("generate/async"))
            .headers(self.build_headers()?)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        if status == StatusCode::FORBIDDEN {
            let body = response.text().await.unwrap_or_default();
            log::warn!("Horde wants kudos upfront: {}", body);
            return Err(HordeError::InsufficientCredit(body));
        }
        if status != StatusCode::ACCEPTED {
            let body = response.text().await.unwrap_or_default();
            return Err(HordeError::SubmitFailed {
                status: status.as_u16(),
                body,
            });
        }

        let accepted: HordeGenerateAsyncResponse = response
            .json()
            .await
            .map_err(|e| HordeError::Response(e.to_string()))?;

        if let Some(message) = &accepted.message {
            log::debug!("Horde says: {}", message);
        }
        log::info!("Job queued: {}", accepted.id);

        Ok(Job {
            id: accepted.id,
            request: request.clone(),
        })
    }

    async fn check_status(&self, job_id: &str) -> Result<JobStatus> {
        let response = self
            .http()
            .get(self.endpoint(&format!("generate/status/{}", job_id)))
            .headers(self.build_headers()?)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HordeError::StatusQueryFailed {
                status: status.as_u16(),
                body,
            });
        }

        response
            .json()
            .await
            .map_err(|e| HordeError::Response(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::HordeGeneration;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Reports "not done" until `done_after` polls have happened.
    struct ScriptedStatus {
        polls: AtomicUsize,
        done_after: Option<usize>,
        generations: Vec<HordeGeneration>,
    }

    #[async_trait]
    impl JobClient for ScriptedStatus {
        async fn submit(&self, _request: &GenerationRequest) -> Result<Job> {
            unreachable!("only polling is exercised here")
        }

        async fn check_status(&self, _job_id: &str) -> Result<JobStatus> {
            let n = self.polls.fetch_add(1, Ordering::SeqCst) + 1;
            let done = self.done_after.map_or(false, |d| n >= d);
            Ok(JobStatus {
                done,
                generations: done.then(|| self.generations.clone()),
                ..Default::default()
            })
        }
    }

    #[tokio::test(start_paused = true)]
    async fn times_out_within_one_interval_of_budget() {
        let client = ScriptedStatus {
            polls: AtomicUsize::new(0),
            done_after: None,
            generations: vec![],
        };
        let timeout = Duration::from_secs(180);
        let interval = Duration::from_secs(4);

        let start = Instant::now();
        let err = client
            .wait_for_result("job", timeout, interval)
            .await
            .unwrap_err();

        assert!(matches!(err, HordeError::TimedOut(t) if t == timeout));
        let elapsed = start.elapsed();
        assert!(elapsed > timeout);
        assert!(elapsed <= timeout + interval, "{:?}", elapsed);
        // fixed interval: one poll at t = 0, 4, ..., 180
        assert_eq!(client.polls.load(Ordering::SeqCst), 46);
    }

    #[tokio::test(start_paused = true)]
    async fn returns_generations_once_done() {
        let client = ScriptedStatus {
            polls: AtomicUsize::new(0),
            done_after: Some(3),
            generations: vec![HordeGeneration {
                img: "https://img.example/a.webp".to_string(),
                mime_type: None,
                worker_name: None,
                model: None,
                seed: None,
            }],
        };

        let start = Instant::now();
        let results = client
            .wait_for_result("job", Duration::from_secs(60), Duration::from_secs(4))
            .await
            .unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(client.polls.load(Ordering::SeqCst), 3);
        assert_eq!(start.elapsed(), Duration::from_secs(8));
    }

    /// Status request that never answers.
    struct Hanging {
        polls: AtomicUsize,
    }

    #[async_trait]
    impl JobClient for Hanging {
        async fn submit(&self, _request: &GenerationRequest) -> Result<Job> {
            unreachable!("only polling is exercised here")
        }

        async fn check_status(&self, _job_id: &str) -> Result<JobStatus> {
            self.polls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(JobStatus::default())
        }
    }

    #[tokio::test(start_paused = true)]
    async fn hung_status_request_still_times_out() {
        let client = Hanging {
            polls: AtomicUsize::new(0),
        };
        let timeout = Duration::from_secs(20);
        let interval = Duration::from_secs(4);

        let start = Instant::now();
        let err = client
            .wait_for_result("job", timeout, interval)
            .await
            .unwrap_err();

        assert!(matches!(err, HordeError::TimedOut(t) if t == timeout));
        assert_eq!(start.elapsed(), timeout + interval);
        assert_eq!(client.polls.load(Ordering::SeqCst), 1);
    }
}
