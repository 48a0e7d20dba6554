//! # flux2-nodes
//!
//! FLUX.2 generation nodes for [Floyo] — a typed binding over the
//! Black Forest Labs hosted text-to-image / image-editing API.
//!
//! Provides a blocking client for request submission, result polling, and
//! signed-URL download, a request builder with parameter validation, image
//! tensor ↔ base64 conversion, and the four editor node types with their
//! input/output descriptors.
//!
//! [Floyo]: https://floyo.app
//!
//! ## Quick Start
//!
//! ```no_run
//! use flux2_nodes::{
//!     Flux2Client, Flux2Config, GenerationRequest, JobOutcome, Model,
//! };
//!
//! # fn example() -> flux2_nodes::Result<()> {
//! let config = Flux2Config::from_env();
//! let client = Flux2Client::new(config);
//!
//! let request = GenerationRequest::new("a lighthouse at dusk, oil painting")
//!     .model(Model::Flex)
//!     .size(1024, 768)
//!     .guidance(5.0)
//!     .steps(28);
//!
//! let (job, outcome) = client.run(&request)?;
//! match outcome {
//!     JobOutcome::Ready { sample_url } => {
//!         let bytes = client.download(&sample_url)?;
//!         std::fs::write("out.jpg", &bytes).unwrap();
//!         println!("done, seed {}", job.seed);
//!     }
//!     JobOutcome::Failed { status, .. } => eprintln!("failed: {}", status),
//!     JobOutcome::TimedOut => eprintln!("timed out"),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Running a node
//!
//! The node layer never returns `Err`: every failure becomes a user-visible
//! rejection string, and a rejected run can be flattened into the blank
//! fallback image the editor renders.
//!
//! ```no_run
//! use flux2_nodes::{Flux2Client, Flux2Config, NodeInputs, NodeType};
//!
//! let client = Flux2Client::new(Flux2Config::from_env());
//! let inputs = NodeInputs::new("a red bicycle").size(1024, 1024);
//!
//! let outcome = NodeType::Flux2ProTextToImage.execute(&client, &inputs);
//! let image = outcome.into_tensor();
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod nodes;
pub mod request;
pub mod tensor;
pub mod types;

pub use client::Flux2Client;
pub use config::Flux2Config;
pub use error::{Flux2Error, Result};
pub use nodes::{
    node_specs, node_types, resolve_node_type, InputKind, InputSpec, NodeInputs, NodeOutcome,
    NodeSpec, NodeType, OutputKind,
};
pub use request::GenerationRequest;
pub use tensor::ImageTensor;
pub use types::{JobOutcome, JobStatus, Model, OutputFormat, PollResponse, SubmittedJob};
