//! Generate a single image from a text prompt with FLUX.2 [pro].
//!
//! Requires `BFL_API_KEY` in the environment or a `.env` file.
//!
//! ```sh
//! BFL_API_KEY=... cargo run --example text_to_image
//! ```

use flux2_nodes::{Flux2Client, Flux2Config, GenerationRequest, JobOutcome};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = Flux2Config::from_env_file(".env");
    let client = Flux2Client::new(config);

    let request = GenerationRequest::new("a lighthouse at dusk, oil painting")
        .size(1024, 768)
        .safety_tolerance(2);

    let job = client.submit(&request)?;
    println!("Submitted {} (seed {}, cost {:?})", job.id, job.seed, job.cost);

    match client.wait(&job)? {
        JobOutcome::Ready { sample_url } => {
            println!("Ready: {}", sample_url);
            let bytes = client.download(&sample_url)?;
            std::fs::write("flux2_out.jpg", &bytes)?;
            println!("Saved: flux2_out.jpg");
        }
        JobOutcome::Failed { status, detail } => {
            eprintln!("Generation failed ({}): {}", status, detail)
        }
        JobOutcome::TimedOut => eprintln!("Generation timed out"),
    }

    Ok(())
}
