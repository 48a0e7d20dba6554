use log::warn;
use rand::Rng;
use serde_json::{json, Map, Value};

use crate::error::{Flux2Error, Result};
use crate::types::{Model, OutputFormat};

/// Builder for a FLUX.2 generation or editing request.
///
/// Reference images are URLs or base64 strings; the first one becomes the
/// `input_image` payload key and the rest `input_image_2`, `input_image_3`,
/// and so on, up to the model's cap.
///
/// # Example
/// ```
/// use flux2_nodes::{GenerationRequest, Model};
///
/// let request = GenerationRequest::new("a lighthouse at dusk")
///     .model(Model::Flex)
///     .size(1024, 768)
///     .seed(42)
///     .guidance(5.0)
///     .steps(28);
///
/// let (payload, seed) = request.to_payload().unwrap();
/// assert_eq!(seed, 42);
/// assert_eq!(payload["width"], 1024);
/// ```
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub prompt: String,
    pub model: Model,
    /// Reference images as URLs or base64 strings, base image first.
    pub references: Vec<String>,
    /// Output width in pixels. 0 = use default / match input.
    pub width: u32,
    /// Output height in pixels. 0 = use default / match input.
    pub height: u32,
    /// Seed. Negative = resolve to a random value at submission.
    pub seed: i64,
    /// Moderation level, 0 (strict) to 6 (most permissive).
    pub safety_tolerance: u8,
    pub output_format: OutputFormat,
    /// Prompt adherence, 1.5 to 10. Flex only.
    pub guidance: Option<f64>,
    /// Inference steps, 1 to 50. Flex only.
    pub steps: Option<u32>,
}

impl GenerationRequest {
    /// Create a request with the given prompt and the pro model. Dimensions
    /// default to 0 (let the API decide), seed to random.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            model: Model::Pro,
            references: Vec::new(),
            width: 0,
            height: 0,
            seed: -1,
            safety_tolerance: 2,
            output_format: OutputFormat::default(),
            guidance: None,
            steps: None,
        }
    }

    /// Set the target model endpoint.
    pub fn model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Set output dimensions. 0 means "use default / match input".
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    /// Set a specific seed. Use -1 (the default) for random.
    pub fn seed(mut self, seed: i64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the moderation level (0 = strict, 6 = most permissive).
    pub fn safety_tolerance(mut self, tolerance: u8) -> Self {
        self.safety_tolerance = tolerance;
        self
    }

    /// Set the output image format.
    pub fn output_format(mut self, format: OutputFormat) -> Self {
        self.output_format = format;
        self
    }

    /// Append a reference image (URL or base64 string). The first reference
    /// is the base image for edits.
    pub fn reference(mut self, image: impl Into<String>) -> Self {
        self.references.push(image.into());
        self
    }

    /// Set the guidance scale (flex only).
    pub fn guidance(mut self, guidance: f64) -> Self {
        self.guidance = Some(guidance);
        self
    }

    /// Set the number of inference steps (flex only).
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }

    /// Check all parameters against the API's documented ranges.
    ///
    /// Runs before any network call so bad inputs never cost a round trip.
    pub fn validate(&self) -> Result<()> {
        for (name, dim) in [("width", self.width), ("height", self.height)] {
            if dim == 0 {
                continue; // 0 means "use default / match input"
            }
            if dim % 16 != 0 {
                return Err(Flux2Error::InvalidParameter(format!(
                    "{} must be a multiple of 16 (got {})",
                    name, dim
                )));
            }
            if !(64..=2048).contains(&dim) {
                return Err(Flux2Error::InvalidParameter(format!(
                    "{} must be between 64 and 2048 pixels (got {})",
                    name, dim
                )));
            }
        }

        if self.seed > u32::MAX as i64 {
            return Err(Flux2Error::InvalidParameter(format!(
                "seed must fit in 32 bits (got {})",
                self.seed
            )));
        }

        if self.safety_tolerance > 6 {
            return Err(Flux2Error::InvalidParameter(format!(
                "safety_tolerance must be between 0 and 6 (got {})",
                self.safety_tolerance
            )));
        }

        if !self.model.has_flex_controls() && (self.guidance.is_some() || self.steps.is_some()) {
            return Err(Flux2Error::InvalidParameter(format!(
                "guidance and steps are not accepted by the {} endpoint",
                self.model
            )));
        }

        if let Some(guidance) = self.guidance {
            if !(1.5..=10.0).contains(&guidance) {
                return Err(Flux2Error::InvalidParameter(format!(
                    "guidance must be between 1.5 and 10.0 (got {})",
                    guidance
                )));
            }
        }

        if let Some(steps) = self.steps {
            if !(1..=50).contains(&steps) {
                return Err(Flux2Error::InvalidParameter(format!(
                    "steps must be between 1 and 50 (got {})",
                    steps
                )));
            }
        }

        Ok(())
    }

    /// Build the API JSON payload and resolve the seed.
    ///
    /// Returns `(payload, actual_seed)`. When `seed` is negative, a random
    /// u32 seed is drawn and returned so it can be stored with the image.
    /// Unset optional fields and empty reference strings are omitted;
    /// references beyond the model's cap are dropped with a warning.
    pub fn to_payload(&self) -> Result<(Value, u32)> {
        self.validate()?;

        let seed = if self.seed < 0 {
            rand::rng().random::<u32>()
        } else {
            self.seed as u32
        };

        let mut payload = Map::new();
        if !self.prompt.trim().is_empty() {
            payload.insert("prompt".into(), json!(self.prompt));
        }

        let cap = self.model.max_reference_images();
        let mut slot = 0usize;
        for image in &self.references {
            let image = image.trim();
            if image.is_empty() {
                continue;
            }
            if slot >= cap {
                warn!(
                    "Dropping reference image beyond the {} cap of {}",
                    self.model, cap
                );
                continue;
            }
            let key = if slot == 0 {
                "input_image".to_string()
            } else {
                format!("input_image_{}", slot + 1)
            };
            payload.insert(key, json!(image));
            slot += 1;
        }

        if self.width > 0 {
            payload.insert("width".into(), json!(self.width));
        }
        if self.height > 0 {
            payload.insert("height".into(), json!(self.height));
        }
        payload.insert("seed".into(), json!(seed));
        payload.insert("safety_tolerance".into(), json!(self.safety_tolerance));
        payload.insert("output_format".into(), json!(self.output_format.as_str()));

        if let Some(guidance) = self.guidance {
            payload.insert("guidance".into(), json!(guidance));
        }
        if let Some(steps) = self.steps {
            payload.insert("steps".into(), json!(steps));
        }

        Ok((Value::Object(payload), seed))
    }
}
