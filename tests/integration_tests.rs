use std::io::{Read, Write};
use std::net::TcpListener;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use flux2_nodes::{
    Flux2Client, Flux2Config, Flux2Error, GenerationRequest, ImageTensor, JobOutcome, JobStatus,
    Model, NodeInputs, NodeType, OutputFormat,
};

/// Minimal in-process HTTP fixture.
///
/// Binds a listener up front (so the polling URL can point back at it),
/// then serves one canned response per connection, in order. Extra
/// connections past the scripted responses keep receiving the last one,
/// which is how the timeout tests stay alive.
struct MockApi {
    base_url: String,
    listener: Option<TcpListener>,
}

impl MockApi {
    fn bind() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind fixture listener");
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        Self {
            base_url,
            listener: Some(listener),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Start serving. `responses` are `(content_type, body)` pairs.
    fn serve(mut self, responses: Vec<(&'static str, Vec<u8>)>) -> JoinHandle<()> {
        let listener = self.listener.take().unwrap();
        thread::spawn(move || {
            let last = responses.len().saturating_sub(1);
            let mut served = 0usize;
            loop {
                let (mut stream, _) = match listener.accept() {
                    Ok(conn) => conn,
                    Err(_) => return,
                };
                // Drain the request headers; bodies are small enough to ignore.
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);

                let (content_type, body) = &responses[served.min(last)];
                let header = format!(
                    "HTTP/1.1 200 OK\r\nContent-Type: {}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                    content_type,
                    body.len()
                );
                let _ = stream.write_all(header.as_bytes());
                let _ = stream.write_all(body);
                served += 1;
            }
        })
    }

    /// Serve a single response with a non-200 status.
    fn serve_error(mut self, status_line: &'static str, body: &'static str) -> JoinHandle<()> {
        let listener = self.listener.take().unwrap();
        thread::spawn(move || {
            if let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; 8192];
                let _ = stream.read(&mut buf);
                let response = format!(
                    "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status_line,
                    body.len(),
                    body
                );
                let _ = stream.write_all(response.as_bytes());
            }
        })
    }
}

fn json(body: String) -> (&'static str, Vec<u8>) {
    ("application/json", body.into_bytes())
}

fn test_config(base_url: &str) -> Flux2Config {
    Flux2Config::default()
        .with_api_key("sk-test")
        .with_base_url(base_url)
        .with_poll_interval(Duration::from_millis(10))
        .with_wait_budget(Duration::from_secs(5))
}

fn submit_body(polling_url: &str) -> String {
    format!(
        r#"{{"id": "req-1", "polling_url": "{}", "cost": 0.06}}"#,
        polling_url
    )
}

// --- Polling loop termination ---

#[test]
fn test_run_terminates_on_ready() {
    let api = MockApi::bind();
    let polling_url = api.url("/result");
    let _server = api.serve(vec![
        json(submit_body(&polling_url)),
        json(r#"{"id": "req-1", "status": "Pending"}"#.to_string()),
        json(r#"{"id": "req-1", "status": "Pending"}"#.to_string()),
        json(
            r#"{"id": "req-1", "status": "Ready", "result": {"sample": "https://delivery.example/x.jpg"}}"#
                .to_string(),
        ),
    ]);

    let client = Flux2Client::new(test_config(&polling_url.replace("/result", "")));
    let request = GenerationRequest::new("a cat").seed(11);

    let (job, outcome) = client.run(&request).unwrap();
    assert_eq!(job.id, "req-1");
    assert_eq!(job.seed, 11);
    assert_eq!(job.cost, Some(0.06));
    match outcome {
        JobOutcome::Ready { sample_url } => {
            assert_eq!(sample_url, "https://delivery.example/x.jpg")
        }
        other => panic!("expected Ready, got {:?}", other),
    }
}

#[test]
fn test_run_terminates_on_moderation() {
    let api = MockApi::bind();
    let polling_url = api.url("/result");
    let _server = api.serve(vec![
        json(submit_body(&polling_url)),
        json(r#"{"id": "req-1", "status": "Pending"}"#.to_string()),
        json(r#"{"id": "req-1", "status": "Content Moderated", "details": "nope"}"#.to_string()),
    ]);

    let client = Flux2Client::new(test_config(&polling_url.replace("/result", "")));
    let (_, outcome) = client.run(&GenerationRequest::new("a cat")).unwrap();

    match outcome {
        JobOutcome::Failed { status, detail } => {
            assert_eq!(status, JobStatus::ContentModerated);
            assert!(detail.contains("nope"));
        }
        other => panic!("expected Failed, got {:?}", other),
    }
}

#[test]
fn test_run_terminates_on_wait_budget() {
    let api = MockApi::bind();
    let polling_url = api.url("/result");
    // Last response repeats, so the job never leaves Pending.
    let _server = api.serve(vec![
        json(submit_body(&polling_url)),
        json(r#"{"id": "req-1", "status": "Pending"}"#.to_string()),
    ]);

    let config = test_config(&polling_url.replace("/result", ""))
        .with_wait_budget(Duration::from_millis(100));
    let client = Flux2Client::new(config);

    let (_, outcome) = client.run(&GenerationRequest::new("a cat")).unwrap();
    assert!(matches!(outcome, JobOutcome::TimedOut));
}

#[test]
fn test_unknown_status_keeps_polling() {
    let api = MockApi::bind();
    let polling_url = api.url("/result");
    let _server = api.serve(vec![
        json(submit_body(&polling_url)),
        json(r#"{"id": "req-1", "status": "Warming Up"}"#.to_string()),
        json(
            r#"{"id": "req-1", "status": "Ready", "result": {"sample": "https://delivery.example/y.png"}}"#
                .to_string(),
        ),
    ]);

    let client = Flux2Client::new(test_config(&polling_url.replace("/result", "")));
    let (_, outcome) = client.run(&GenerationRequest::new("a cat")).unwrap();
    assert!(matches!(outcome, JobOutcome::Ready { .. }));
}

#[test]
fn test_ready_without_sample_is_invalid_response() {
    let api = MockApi::bind();
    let polling_url = api.url("/result");
    let _server = api.serve(vec![
        json(submit_body(&polling_url)),
        json(r#"{"id": "req-1", "status": "Ready", "result": {}}"#.to_string()),
    ]);

    let client = Flux2Client::new(test_config(&polling_url.replace("/result", "")));
    let err = client.run(&GenerationRequest::new("a cat"));
    assert!(matches!(err, Err(Flux2Error::InvalidResponse(_))));
}

// --- Submission ---

#[test]
fn test_submit_missing_polling_url() {
    let api = MockApi::bind();
    let base = api.base_url.clone();
    let _server = api.serve(vec![json(r#"{"id": "req-1"}"#.to_string())]);

    let client = Flux2Client::new(test_config(&base));
    let err = client.submit(&GenerationRequest::new("a cat"));
    assert!(matches!(err, Err(Flux2Error::InvalidResponse(_))));
}

#[test]
fn test_submit_auth_failure_surfaces_status() {
    let api = MockApi::bind();
    let base = api.base_url.clone();
    let _server = api.serve_error("403 Forbidden", r#"{"detail": "invalid key"}"#);

    let client = Flux2Client::new(test_config(&base));
    let err = client.submit(&GenerationRequest::new("a cat"));
    match err {
        Err(Flux2Error::Http { status, body }) => {
            assert_eq!(status, 403);
            assert!(body.contains("invalid key"));
        }
        other => panic!("expected Http error, got {:?}", other),
    }
}

#[test]
fn test_submit_network_failure() {
    // Nothing is listening on this port.
    let config = test_config("http://127.0.0.1:9");
    let client = Flux2Client::new(config);
    let err = client.submit(&GenerationRequest::new("a cat"));
    assert!(matches!(err, Err(Flux2Error::Network { .. })));
}

// --- Download + tensor decode ---

#[test]
fn test_download_and_decode_result() {
    let png = ImageTensor::blank(4, 4).to_bytes(OutputFormat::Png).unwrap();

    let api = MockApi::bind();
    let url = api.url("/signed/x.png");
    let _server = api.serve(vec![("image/png", png)]);

    let client = Flux2Client::new(test_config("http://unused.example"));
    let bytes = client.download(&url).unwrap();
    let tensor = ImageTensor::from_bytes(&bytes).unwrap();
    assert_eq!((tensor.width, tensor.height), (4, 4));
}

#[test]
fn test_download_http_error() {
    let api = MockApi::bind();
    let url = api.url("/signed/gone.png");
    let _server = api.serve_error("404 Not Found", "expired");

    let client = Flux2Client::new(test_config("http://unused.example"));
    let err = client.download(&url);
    assert!(matches!(err, Err(Flux2Error::Http { status: 404, .. })));
}

// --- Node layer end to end ---

#[test]
fn test_node_run_yields_image() {
    let png = ImageTensor::blank(8, 8).to_bytes(OutputFormat::Png).unwrap();

    let api = MockApi::bind();
    let polling_url = api.url("/result");
    let sample_url = api.url("/signed/out.png");
    let _server = api.serve(vec![
        json(submit_body(&polling_url)),
        json(format!(
            r#"{{"id": "req-1", "status": "Ready", "result": {{"sample": "{}"}}}}"#,
            sample_url
        )),
        ("image/png", png),
    ]);

    let client = Flux2Client::new(test_config(&polling_url.replace("/result", "")));
    let inputs = NodeInputs::new("a red bicycle").size(1024, 1024).seed(3);

    let outcome = NodeType::Flux2FlexTextToImage.execute(&client, &inputs);
    match outcome {
        flux2_nodes::NodeOutcome::Image { tensor, url, seed } => {
            assert_eq!((tensor.width, tensor.height), (8, 8));
            assert_eq!(url, sample_url);
            assert_eq!(seed, 3);
        }
        flux2_nodes::NodeOutcome::Rejected(reason) => panic!("rejected: {}", reason),
    }
}

#[test]
fn test_node_moderation_becomes_rejection_string() {
    let api = MockApi::bind();
    let polling_url = api.url("/result");
    let _server = api.serve(vec![
        json(submit_body(&polling_url)),
        json(r#"{"id": "req-1", "status": "Request Moderated"}"#.to_string()),
    ]);

    let client = Flux2Client::new(test_config(&polling_url.replace("/result", "")));
    let outcome = NodeType::Flux2ProTextToImage.execute(&client, &NodeInputs::new("a cat"));

    let reason = outcome.rejection().expect("should be rejected").to_string();
    assert!(reason.contains("Request Moderated"));

    // The editor renders the blank fallback after a swallowed failure.
    let tensor = outcome.into_tensor();
    assert_eq!((tensor.width, tensor.height), (512, 512));
}

#[test]
fn test_node_invalid_inputs_rejected_without_network() {
    // Base URL points nowhere; validation must reject before any call.
    let client = Flux2Client::new(test_config("http://127.0.0.1:9"));
    let inputs = NodeInputs::new("a cat").size(100, 512);

    let outcome = NodeType::Flux2ProTextToImage.execute(&client, &inputs);
    let reason = outcome.rejection().expect("should be rejected");
    assert!(reason.contains("multiple of 16"));
}

#[test]
fn test_node_missing_key_rejected() {
    let config = Flux2Config::default().with_base_url("http://127.0.0.1:9");
    let client = Flux2Client::new(config);

    let outcome = NodeType::Flux2ProTextToImage.execute(&client, &NodeInputs::new("a cat"));
    let reason = outcome.rejection().expect("should be rejected");
    assert!(reason.contains("BFL_API_KEY"));
}

// --- Request/registry sanity shared with the editor ---

#[test]
fn test_flex_edit_request_carries_references_and_controls() {
    let inputs = NodeInputs::new("blend these")
        .base_image(ImageTensor::blank(16, 16))
        .reference(ImageTensor::blank(16, 16))
        .guidance(6.0)
        .steps(30);

    // Build through the public request path the node uses.
    let request = GenerationRequest::new(inputs.prompt.clone())
        .model(Model::Flex)
        .reference(inputs.base_image.as_ref().unwrap().to_base64(OutputFormat::Jpeg).unwrap())
        .reference(inputs.references[0].to_base64(OutputFormat::Jpeg).unwrap())
        .guidance(6.0)
        .steps(30);

    let (payload, _) = request.to_payload().unwrap();
    assert!(payload.get("input_image").is_some());
    assert!(payload.get("input_image_2").is_some());
    assert_eq!(payload["guidance"], 6.0);
    assert_eq!(payload["steps"], 30);
}

#[test]
fn test_registry_matches_specs() {
    let specs = flux2_nodes::node_specs();
    for spec in &specs {
        let node = flux2_nodes::resolve_node_type(spec.type_name).unwrap();
        assert_eq!(node.type_name(), spec.type_name);
        assert_eq!(node.display_name(), spec.display_name);
    }
}
