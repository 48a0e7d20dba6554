use log::warn;
use serde::Serialize;

use crate::client::Flux2Client;
use crate::error::Result;
use crate::request::GenerationRequest;
use crate::tensor::ImageTensor;
use crate::types::{JobOutcome, Model, OutputFormat};

/// The four FLUX.2 node types exposed to the Floyo editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeType {
    /// FLUX.2 [pro] text-to-image.
    Flux2ProTextToImage,
    /// FLUX.2 [pro] image editing with up to 7 extra references.
    Flux2ProImageEdit,
    /// FLUX.2 [flex] text-to-image with guidance/steps controls.
    Flux2FlexTextToImage,
    /// FLUX.2 [flex] image editing with up to 9 extra references.
    Flux2FlexImageEdit,
}

/// All node types, in registry order.
pub fn node_types() -> &'static [NodeType] {
    &[
        NodeType::Flux2ProTextToImage,
        NodeType::Flux2ProImageEdit,
        NodeType::Flux2FlexTextToImage,
        NodeType::Flux2FlexImageEdit,
    ]
}

/// Look up a node type by its registry name.
pub fn resolve_node_type(name: &str) -> Option<NodeType> {
    node_types()
        .iter()
        .copied()
        .find(|node| node.type_name() == name)
}

/// Editor-facing descriptors for every node type, in registry order.
pub fn node_specs() -> Vec<NodeSpec> {
    node_types().iter().map(|node| node.spec()).collect()
}

impl NodeType {
    /// The registry name the editor instantiates nodes by.
    pub fn type_name(&self) -> &'static str {
        match self {
            NodeType::Flux2ProTextToImage => "Flux2ProTextToImage",
            NodeType::Flux2ProImageEdit => "Flux2ProImageEdit",
            NodeType::Flux2FlexTextToImage => "Flux2FlexTextToImage",
            NodeType::Flux2FlexImageEdit => "Flux2FlexImageEdit",
        }
    }

    /// Human-readable name shown in the editor.
    pub fn display_name(&self) -> &'static str {
        match self {
            NodeType::Flux2ProTextToImage => "FLUX.2 [pro] Text-to-Image",
            NodeType::Flux2ProImageEdit => "FLUX.2 [pro] Image Edit",
            NodeType::Flux2FlexTextToImage => "FLUX.2 [flex] Text-to-Image",
            NodeType::Flux2FlexImageEdit => "FLUX.2 [flex] Image Edit",
        }
    }

    /// Node menu category in the editor.
    pub fn category(&self) -> &'static str {
        match self.model() {
            Model::Pro => "Floyo/Flux2 Pro",
            Model::Flex => "Floyo/Flux2 Flex",
        }
    }

    /// The API endpoint this node targets.
    pub fn model(&self) -> Model {
        match self {
            NodeType::Flux2ProTextToImage | NodeType::Flux2ProImageEdit => Model::Pro,
            NodeType::Flux2FlexTextToImage | NodeType::Flux2FlexImageEdit => Model::Flex,
        }
    }

    /// Whether this node edits an input image (as opposed to pure text-to-image).
    pub fn is_edit(&self) -> bool {
        matches!(
            self,
            NodeType::Flux2ProImageEdit | NodeType::Flux2FlexImageEdit
        )
    }

    /// Run the node against the API. Every failure (bad inputs, API
    /// errors, moderation, timeout) comes back as a user-visible
    /// rejection string instead of an `Err`.
    pub fn execute(&self, client: &Flux2Client, inputs: &NodeInputs) -> NodeOutcome {
        let request = match self.build_request(inputs) {
            Ok(request) => request,
            Err(e) => return NodeOutcome::Rejected(format!("Error: {}", e)),
        };

        let (job, outcome) = match client.run(&request) {
            Ok(run) => run,
            Err(e) => {
                return NodeOutcome::Rejected(format!(
                    "Error running {}: {}",
                    self.display_name(),
                    e
                ))
            }
        };

        match outcome {
            JobOutcome::Ready { sample_url } => {
                let bytes = match client.download(&sample_url) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        return NodeOutcome::Rejected(format!(
                            "Error downloading the FLUX.2 result: {}",
                            e
                        ))
                    }
                };
                match ImageTensor::from_bytes(&bytes) {
                    Ok(tensor) => NodeOutcome::Image {
                        tensor,
                        url: sample_url,
                        seed: job.seed,
                    },
                    Err(e) => NodeOutcome::Rejected(format!(
                        "Error decoding the FLUX.2 result: {}",
                        e
                    )),
                }
            }
            JobOutcome::Failed { status, detail } => NodeOutcome::Rejected(format!(
                "FLUX.2 request failed with status '{}': {}",
                status, detail
            )),
            JobOutcome::TimedOut => NodeOutcome::Rejected(format!(
                "Timed out after {:?} waiting for the FLUX.2 result",
                client.config().wait_budget
            )),
        }
    }

    /// Translate node inputs into an API request for this node's endpoint.
    ///
    /// Edit nodes require a base image; reference tensors that fail base64
    /// conversion are skipped with a warning.
    fn build_request(&self, inputs: &NodeInputs) -> Result<GenerationRequest> {
        let mut request = GenerationRequest::new(inputs.prompt.clone())
            .model(self.model())
            .size(inputs.width, inputs.height)
            .seed(inputs.seed)
            .safety_tolerance(inputs.safety_tolerance)
            .output_format(inputs.output_format);

        if self.is_edit() {
            let base = inputs.base_image.as_ref().ok_or_else(|| {
                crate::error::Flux2Error::InvalidParameter(
                    "input_image is required for image editing".into(),
                )
            })?;
            request = request.reference(base.to_base64(inputs.output_format)?);

            for (idx, reference) in inputs.references.iter().enumerate() {
                match reference.to_base64(inputs.output_format) {
                    Ok(encoded) => request = request.reference(encoded),
                    Err(e) => {
                        warn!("Skipping reference image #{}: {}", idx + 2, e);
                    }
                }
            }
        }

        if self.model().has_flex_controls() {
            request = request
                .guidance(inputs.guidance.unwrap_or(DEFAULT_GUIDANCE))
                .steps(inputs.steps.unwrap_or(DEFAULT_STEPS));
        }

        Ok(request)
    }

    /// The editor-facing input/output descriptor for this node.
    pub fn spec(&self) -> NodeSpec {
        let mut inputs = vec![InputSpec {
            name: "prompt".into(),
            required: true,
            tooltip: if self.is_edit() {
                "Describe the edit you want (what to change/keep).".into()
            } else {
                "Describe what to generate.".into()
            },
            kind: InputKind::String {
                multiline: true,
                default: "",
            },
        }];

        if self.is_edit() {
            inputs.push(InputSpec {
                name: "input_image".into(),
                required: true,
                tooltip: "Base image to edit.".into(),
                kind: InputKind::Image,
            });
            // input_image_2 .. up to the endpoint's total cap
            for idx in 2..=self.model().max_reference_images() {
                inputs.push(InputSpec {
                    name: format!("input_image_{}", idx),
                    required: false,
                    tooltip: format!("Optional reference image #{}.", idx),
                    kind: InputKind::Image,
                });
            }
        }

        let dim_default = if self.is_edit() { 0 } else { 1024 };
        let dim_min = if self.is_edit() { 0 } else { 64 };
        let dim_tooltip = if self.is_edit() {
            "Optional override. 0 = keep input size. Multiple of 16; 64-2048 if set."
        } else {
            "Output size in pixels. Multiple of 16; 64-2048."
        };
        for name in ["width", "height"] {
            inputs.push(InputSpec {
                name: name.into(),
                required: !self.is_edit(),
                tooltip: dim_tooltip.into(),
                kind: InputKind::Int {
                    default: dim_default,
                    min: dim_min,
                    max: 2048,
                    step: 16,
                },
            });
        }

        if self.model().has_flex_controls() {
            inputs.push(InputSpec {
                name: "guidance".into(),
                required: true,
                tooltip: "Prompt adherence (1.5-10).".into(),
                kind: InputKind::Float {
                    default: DEFAULT_GUIDANCE,
                    min: 1.5,
                    max: 10.0,
                    step: 0.1,
                },
            });
            inputs.push(InputSpec {
                name: "steps".into(),
                required: true,
                tooltip: "Inference steps (1-50).".into(),
                kind: InputKind::Int {
                    default: DEFAULT_STEPS_I64,
                    min: 1,
                    max: 50,
                    step: 1,
                },
            });
        }

        inputs.push(InputSpec {
            name: "seed".into(),
            required: false,
            tooltip: "-1 = random. Any other integer gives reproducible results.".into(),
            kind: InputKind::Int {
                default: -1,
                min: -1,
                max: u32::MAX as i64,
                step: 1,
            },
        });
        inputs.push(InputSpec {
            name: "safety_tolerance".into(),
            required: false,
            tooltip: "Moderation level. 0 = strict, 6 = most permissive.".into(),
            kind: InputKind::Int {
                default: 2,
                min: 0,
                max: 6,
                step: 1,
            },
        });
        inputs.push(InputSpec {
            name: "output_format".into(),
            required: false,
            tooltip: "Output format for the generated image.".into(),
            kind: InputKind::Choice {
                options: &["jpeg", "png"],
                default: "jpeg",
            },
        });

        NodeSpec {
            type_name: self.type_name(),
            display_name: self.display_name(),
            category: self.category(),
            inputs,
            output: match self.model() {
                // Pro nodes hand the signed URL downstream; flex nodes
                // resolve to an in-memory image.
                Model::Pro => OutputKind::ImageUrl,
                Model::Flex => OutputKind::Image,
            },
        }
    }
}

const DEFAULT_GUIDANCE: f64 = 4.5;
const DEFAULT_STEPS: u32 = 50;
const DEFAULT_STEPS_I64: i64 = DEFAULT_STEPS as i64;

/// Inputs for one node run, matching the editor's widget values.
#[derive(Debug, Clone)]
pub struct NodeInputs {
    pub prompt: String,
    /// Output width. 0 = use default / match input.
    pub width: u32,
    /// Output height. 0 = use default / match input.
    pub height: u32,
    /// -1 = random.
    pub seed: i64,
    pub safety_tolerance: u8,
    pub output_format: OutputFormat,
    /// Base image for edit nodes.
    pub base_image: Option<ImageTensor>,
    /// Extra reference images for edit nodes.
    pub references: Vec<ImageTensor>,
    /// Flex nodes only; edit/pro nodes ignore it.
    pub guidance: Option<f64>,
    /// Flex nodes only.
    pub steps: Option<u32>,
}

impl NodeInputs {
    /// Inputs with a prompt and every other widget at its default.
    pub fn new(prompt: impl Into<String>) -> Self {
        Self {
            prompt: prompt.into(),
            width: 0,
            height: 0,
            seed: -1,
            safety_tolerance: 2,
            output_format: OutputFormat::default(),
            base_image: None,
            references: Vec::new(),
            guidance: None,
            steps: None,
        }
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

    /// Set the base image for edit nodes.
    pub fn base_image(mut self, tensor: ImageTensor) -> Self {
        self.base_image = Some(tensor);
        self
    }

    /// Append an extra reference image for edit nodes.
    pub fn reference(mut self, tensor: ImageTensor) -> Self {
        self.references.push(tensor);
        self
    }

    /// Set the guidance scale (flex nodes).
    pub fn guidance(mut self, guidance: f64) -> Self {
        self.guidance = Some(guidance);
        self
    }

    /// Set the number of inference steps (flex nodes).
    pub fn steps(mut self, steps: u32) -> Self {
        self.steps = Some(steps);
        self
    }
}

/// Result of one node run.
#[derive(Debug, Clone)]
pub enum NodeOutcome {
    /// The run produced an image.
    Image {
        tensor: ImageTensor,
        /// Signed delivery URL the tensor was downloaded from.
        url: String,
        /// Seed the image was generated with.
        seed: u32,
    },
    /// The run failed; the string is shown to the user.
    Rejected(String),
}

impl NodeOutcome {
    /// Flatten to a tensor, swallowing a rejection into the blank fallback.
    /// This is what the editor renders after a failed run.
    pub fn into_tensor(self) -> ImageTensor {
        match self {
            NodeOutcome::Image { tensor, .. } => tensor,
            NodeOutcome::Rejected(reason) => {
                warn!("Node run rejected, returning blank image: {}", reason);
                ImageTensor::default()
            }
        }
    }

    /// The rejection string, when the run failed.
    pub fn rejection(&self) -> Option<&str> {
        match self {
            NodeOutcome::Rejected(reason) => Some(reason),
            NodeOutcome::Image { .. } => None,
        }
    }
}

/// Editor-facing descriptor for one node type.
///
/// Serializes to JSON for the editor process.
#[derive(Debug, Clone, Serialize)]
pub struct NodeSpec {
    pub type_name: &'static str,
    pub display_name: &'static str,
    pub category: &'static str,
    pub inputs: Vec<InputSpec>,
    pub output: OutputKind,
}

/// One typed input widget of a node.
#[derive(Debug, Clone, Serialize)]
pub struct InputSpec {
    pub name: String,
    pub required: bool,
    pub tooltip: String,
    #[serde(flatten)]
    pub kind: InputKind,
}

/// Widget type with defaults and ranges.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum InputKind {
    String {
        multiline: bool,
        default: &'static str,
    },
    Int {
        default: i64,
        min: i64,
        max: i64,
        step: i64,
    },
    Float {
        default: f64,
        min: f64,
        max: f64,
        step: f64,
    },
    Choice {
        options: &'static [&'static str],
        default: &'static str,
    },
    Image,
}

/// What a node hands downstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum OutputKind {
    /// An in-memory image tensor.
    Image,
    /// The signed delivery URL as a string.
    ImageUrl,
}
