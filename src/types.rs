use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// FLUX.2 model endpoints supported by the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Model {
    /// `flux-2-pro` — the production endpoint. No guidance/steps controls.
    Pro,
    /// `flux-2-flex` — exposes guidance and steps, accepts more references.
    Flex,
}

impl Model {
    /// URL slug appended to the API base URL.
    pub fn slug(&self) -> &'static str {
        match self {
            Model::Pro => "flux-2-pro",
            Model::Flex => "flux-2-flex",
        }
    }

    /// Parse a model slug. Case-insensitive.
    pub fn from_slug(slug: &str) -> Option<Model> {
        match slug.trim().to_ascii_lowercase().as_str() {
            "flux-2-pro" => Some(Model::Pro),
            "flux-2-flex" => Some(Model::Flex),
            _ => None,
        }
    }

    /// Maximum number of reference images the endpoint accepts, the base
    /// image included. Pro takes 8, flex takes 10.
    pub fn max_reference_images(&self) -> usize {
        match self {
            Model::Pro => 8,
            Model::Flex => 10,
        }
    }

    /// Whether the endpoint accepts `guidance` and `steps`.
    pub fn has_flex_controls(&self) -> bool {
        matches!(self, Model::Flex)
    }
}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

/// Output encoding for the generated image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
}

impl OutputFormat {
    /// The string the API expects in the `output_format` field.
    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::Jpeg => "jpeg",
            OutputFormat::Png => "png",
        }
    }

    /// Parse an `output_format` value. Case-insensitive.
    pub fn from_str_opt(s: &str) -> Option<OutputFormat> {
        match s.trim().to_ascii_lowercase().as_str() {
            "jpeg" | "jpg" => Some(OutputFormat::Jpeg),
            "png" => Some(OutputFormat::Png),
            _ => None,
        }
    }
}

/// Job status reported by the polling endpoint.
///
/// The API uses a small fixed set of strings; anything unrecognized is kept
/// verbatim in [`JobStatus::Other`] and treated as non-terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    Pending,
    Ready,
    Error,
    Failed,
    ContentModerated,
    RequestModerated,
    TaskNotFound,
    Other(String),
}

impl JobStatus {
    /// Parse a status string from a poll response. Case-insensitive.
    pub fn parse(s: &str) -> JobStatus {
        match s.trim().to_ascii_lowercase().as_str() {
            "pending" => JobStatus::Pending,
            "ready" => JobStatus::Ready,
            "error" => JobStatus::Error,
            "failed" => JobStatus::Failed,
            "content moderated" => JobStatus::ContentModerated,
            "request moderated" => JobStatus::RequestModerated,
            "task not found" => JobStatus::TaskNotFound,
            _ => JobStatus::Other(s.to_string()),
        }
    }

    /// Whether polling should stop on this status.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobStatus::Pending | JobStatus::Other(_))
    }

    /// Whether this is a terminal failure (moderation included).
    pub fn is_failure(&self) -> bool {
        self.is_terminal() && *self != JobStatus::Ready
    }
}

impl fmt::Display for JobStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobStatus::Pending => "Pending",
            JobStatus::Ready => "Ready",
            JobStatus::Error => "Error",
            JobStatus::Failed => "Failed",
            JobStatus::ContentModerated => "Content Moderated",
            JobStatus::RequestModerated => "Request Moderated",
            JobStatus::TaskNotFound => "Task not found",
            JobStatus::Other(s) => s,
        };
        f.write_str(s)
    }
}

/// A successfully submitted generation job.
#[derive(Debug, Clone)]
pub struct SubmittedJob {
    /// Request id assigned by the API.
    pub id: String,
    /// Endpoint to poll for the result.
    pub polling_url: String,
    /// Seed the request was submitted with. Resolved locally when the
    /// caller asked for a random seed, so results stay reproducible.
    pub seed: u32,
    /// Credit cost reported at submission, when present.
    pub cost: Option<f64>,
}

/// One parsed response from the polling endpoint.
#[derive(Debug, Clone)]
pub struct PollResponse {
    pub status: JobStatus,
    /// Signed delivery URL from `result.sample`, present once ready.
    pub sample: Option<String>,
    /// The raw response payload, for failure details.
    pub raw: Value,
}

/// Outcome of waiting for a job to finish.
#[derive(Debug, Clone)]
pub enum JobOutcome {
    /// The job completed; `sample_url` is the signed download link.
    Ready { sample_url: String },
    /// The API reported a terminal failure (error or moderation).
    Failed { status: JobStatus, detail: String },
    /// The wait budget elapsed before a terminal status.
    TimedOut,
}
