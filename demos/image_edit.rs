//! Edit a local image through the FLUX.2 [pro] edit node.
//!
//! Requires `BFL_API_KEY` and a path to the base image.
//!
//! ```sh
//! BFL_API_KEY=... cargo run --example image_edit -- photo.jpg "make the sky stormy"
//! ```

use flux2_nodes::{Flux2Client, Flux2Config, ImageTensor, NodeInputs, NodeOutcome, NodeType};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let mut args = std::env::args().skip(1);
    let path = args.next().unwrap_or_else(|| "photo.jpg".to_string());
    let prompt = args
        .next()
        .unwrap_or_else(|| "make the sky stormy".to_string());

    let base = ImageTensor::from_bytes(&std::fs::read(&path)?)?;
    println!("Editing {} ({}x{})", path, base.width, base.height);

    let client = Flux2Client::new(Flux2Config::from_env_file(".env"));
    let inputs = NodeInputs::new(prompt).base_image(base);

    match NodeType::Flux2ProImageEdit.execute(&client, &inputs) {
        NodeOutcome::Image { tensor, url, seed } => {
            println!("Edited image: {}x{} (seed {})", tensor.width, tensor.height, seed);
            println!("Signed URL: {}", url);
        }
        NodeOutcome::Rejected(reason) => eprintln!("{}", reason),
    }

    Ok(())
}
