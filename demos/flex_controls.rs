//! Drive the FLUX.2 [flex] endpoint with guidance and steps, then print
//! the node registry the editor consumes.
//!
//! ```sh
//! BFL_API_KEY=... cargo run --example flex_controls
//! ```

use flux2_nodes::{node_specs, Flux2Client, Flux2Config, NodeInputs, NodeOutcome, NodeType};

fn main() -> std::result::Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    // What the editor sees for each node type.
    for spec in node_specs() {
        println!(
            "{} ({}) — {} inputs",
            spec.type_name,
            spec.display_name,
            spec.inputs.len()
        );
    }
    println!("{}", serde_json::to_string_pretty(&node_specs())?);

    let client = Flux2Client::new(Flux2Config::from_env_file(".env"));
    let inputs = NodeInputs::new("a clockwork hummingbird, macro photo")
        .size(1024, 1024)
        .guidance(6.0)
        .steps(28);

    match NodeType::Flux2FlexTextToImage.execute(&client, &inputs) {
        NodeOutcome::Image { tensor, url, seed } => {
            println!("Got {}x{} image (seed {})", tensor.width, tensor.height, seed);
            println!("Signed URL: {}", url);
        }
        NodeOutcome::Rejected(reason) => eprintln!("{}", reason),
    }

    Ok(())
}
