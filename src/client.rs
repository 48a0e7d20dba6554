use std::time::{Duration, Instant};

use log::{debug, info};
use reqwest::blocking::Client;
use serde_json::Value;

use crate::config::Flux2Config;
use crate::error::{Flux2Error, Result};
use crate::request::GenerationRequest;
use crate::types::{JobOutcome, JobStatus, PollResponse, SubmittedJob};

/// Per-call HTTP timeout. The overall wait is bounded by the config's
/// wait budget, not by this.
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Blocking client for the FLUX.2 generation API.
///
/// Owns request submission, result polling, and signed-URL download. All
/// calls block the current thread; [`Flux2Client::wait`] blocks for up to
/// the configured wait budget.
///
/// # Example
/// ```no_run
/// use flux2_nodes::{Flux2Client, Flux2Config, GenerationRequest, JobOutcome};
///
/// # fn example() -> flux2_nodes::Result<()> {
/// let client = Flux2Client::new(Flux2Config::from_env());
/// let request = GenerationRequest::new("a lighthouse at dusk").size(1024, 768);
///
/// let (job, outcome) = client.run(&request)?;
/// if let JobOutcome::Ready { sample_url } = outcome {
///     let bytes = client.download(&sample_url)?;
///     std::fs::write("out.jpg", &bytes).unwrap();
///     println!("seed {} cost {:?}", job.seed, job.cost);
/// }
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct Flux2Client {
    http: Client,
    config: Flux2Config,
}

impl Flux2Client {
    /// Create a client with the given configuration.
    pub fn new(config: Flux2Config) -> Self {
        Self {
            http: Client::new(),
            config,
        }
    }

    /// Use a custom `reqwest::blocking::Client` (for proxies, TLS, pooling).
    pub fn with_http_client(mut self, client: Client) -> Self {
        self.http = client;
        self
    }

    /// Returns the active configuration.
    pub fn config(&self) -> &Flux2Config {
        &self.config
    }

    // ── Submission ──────────────────────────────────────────────────

    /// Submit a generation request. Returns the job handle with the
    /// polling URL and the resolved seed.
    pub fn submit(&self, request: &GenerationRequest) -> Result<SubmittedJob> {
        let key = self.config.require_key()?;
        let (payload, seed) = request.to_payload()?;

        let url = format!("{}/{}", self.config.base_url, request.model.slug());
        let resp = self
            .http
            .post(&url)
            .timeout(HTTP_TIMEOUT)
            .header("accept", "application/json")
            .header("x-key", key)
            .json(&payload)
            .send()
            .map_err(|e| Flux2Error::Network {
                context: format!("Cannot reach the FLUX.2 API at {}", url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().unwrap_or_default();
            return Err(Flux2Error::Http { status, body });
        }

        let json: Value = resp.json().map_err(|e| Flux2Error::Network {
            context: "Failed to parse the FLUX.2 submission response".into(),
            source: e,
        })?;

        let id = json
            .get("id")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| Flux2Error::InvalidResponse("Response missing request id".into()))?;
        let polling_url = json
            .get("polling_url")
            .and_then(|v| v.as_str())
            .map(String::from)
            .ok_or_else(|| Flux2Error::InvalidResponse("Response missing polling_url".into()))?;
        let cost = json.get("cost").and_then(|v| v.as_f64());

        info!("Submitted FLUX.2 request {} (seed {})", id, seed);
        Ok(SubmittedJob {
            id,
            polling_url,
            seed,
            cost,
        })
    }

    // ── Polling ─────────────────────────────────────────────────────

    /// Issue a single poll against the job's polling URL.
    pub fn poll(&self, job: &SubmittedJob) -> Result<PollResponse> {
        let key = self.config.require_key()?;

        let resp = self
            .http
            .get(&job.polling_url)
            .timeout(HTTP_TIMEOUT)
            .header("accept", "application/json")
            .header("x-key", key)
            .query(&[("id", job.id.as_str())])
            .send()
            .map_err(|e| Flux2Error::Network {
                context: format!("Failed to poll {}", job.polling_url),
                source: e,
            })?;

        if !resp.status().is_success() {
            let status = resp.status().as_u16();
            let body = resp.text().unwrap_or_default();
            return Err(Flux2Error::Http { status, body });
        }

        let raw: Value = resp.json().map_err(|e| Flux2Error::Network {
            context: "Failed to parse the FLUX.2 poll response".into(),
            source: e,
        })?;

        let status = raw
            .get("status")
            .and_then(|v| v.as_str())
            .map(JobStatus::parse)
            .ok_or_else(|| Flux2Error::InvalidResponse("Poll response missing status".into()))?;
        let sample = raw
            .pointer("/result/sample")
            .and_then(|v| v.as_str())
            .map(String::from);

        Ok(PollResponse {
            status,
            sample,
            raw,
        })
    }

    /// Poll the job at the configured interval until it reaches a terminal
    /// status or the wait budget elapses.
    ///
    /// The outcome of waiting is data: `Ready`, `Failed`, and `TimedOut` are
    /// all `Ok`. Transport and decode problems remain `Err`.
    pub fn wait(&self, job: &SubmittedJob) -> Result<JobOutcome> {
        let start = Instant::now();
        let mut last_status: Option<JobStatus> = None;

        loop {
            if start.elapsed() > self.config.wait_budget {
                info!(
                    "FLUX.2 request {} timed out after {:?}",
                    job.id, self.config.wait_budget
                );
                return Ok(JobOutcome::TimedOut);
            }

            let poll = self.poll(job)?;
            if last_status.as_ref() != Some(&poll.status) {
                info!("FLUX.2 request {} status: {}", job.id, poll.status);
                last_status = Some(poll.status.clone());
            } else {
                debug!("FLUX.2 request {} still {}", job.id, poll.status);
            }

            if poll.status == JobStatus::Ready {
                let sample_url = poll.sample.ok_or_else(|| {
                    Flux2Error::InvalidResponse(
                        "Ready response did not include a sample URL".into(),
                    )
                })?;
                return Ok(JobOutcome::Ready { sample_url });
            }

            if poll.status.is_failure() {
                return Ok(JobOutcome::Failed {
                    status: poll.status,
                    detail: poll.raw.to_string(),
                });
            }

            std::thread::sleep(self.config.poll_interval);
        }
    }

    /// Submit a request and wait for completion.
    pub fn run(&self, request: &GenerationRequest) -> Result<(SubmittedJob, JobOutcome)> {
        let job = self.submit(request)?;
        let outcome = self.wait(&job)?;
        Ok((job, outcome))
    }

    // ── Download ────────────────────────────────────────────────────

    /// Download the produced image from its signed URL. Returns raw bytes.
    pub fn download(&self, url: &str) -> Result<Vec<u8>> {
        let resp = self
            .http
            .get(url)
            .timeout(HTTP_TIMEOUT)
            .send()
            .map_err(|e| Flux2Error::Network {
                context: format!("Failed to download the result from {}", url),
                source: e,
            })?;

        if !resp.status().is_success() {
            return Err(Flux2Error::Http {
                status: resp.status().as_u16(),
                body: format!("Failed to download the result from {}", url),
            });
        }

        let bytes = resp.bytes().map_err(|e| Flux2Error::Network {
            context: "Failed to read result bytes".into(),
            source: e,
        })?;
        Ok(bytes.to_vec())
    }
}
