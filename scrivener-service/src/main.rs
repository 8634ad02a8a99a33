use tracing::info;

mod config;
mod error;
mod events;
mod pipeline;
mod queue;
mod store;
mod textract;

use crate::config::StaticConfig;
use crate::pipeline::results::ResultHandler;
use crate::pipeline::submission::SubmissionHandler;
use crate::pipeline::workers;
use crate::queue::SqsEventQueue;
use crate::store::S3ArtifactStore;
use crate::textract::client::TextractClient;

// Re-export config crate types to avoid namespace collision
use ::config::{Config as ConfigBuilder, Environment, File};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    init_logging();

    info!(
        "Starting Scrivener extraction pipeline v{}",
        env!("CARGO_PKG_VERSION")
    );

    // Load configuration; a missing required value aborts here, before any
    // queue message is touched.
    let static_config: StaticConfig = ConfigBuilder::builder()
        .add_source(File::with_name("config").required(false))
        .add_source(
            Environment::with_prefix("SCRIVENER")
                .separator("__")
                .try_parsing(true),
        )
        .build()?
        .try_deserialize()?;

    info!(
        api = %static_config.pipeline.api,
        upload_queue = %static_config.queues.upload_queue_url,
        job_status_queue = %static_config.queues.job_status_queue_url,
        "Configuration loaded"
    );

    // Shared AWS clients
    let aws_config = aws_config::load_from_env().await;
    let textract = TextractClient::new(&aws_config);
    let sqs = aws_sdk_sqs::Client::new(&aws_config);
    let store = S3ArtifactStore::new(&aws_config);

    let submission_handler = SubmissionHandler::new(
        static_config.pipeline.clone(),
        textract.clone(),
        SqsEventQueue::new(sqs.clone(), &static_config.queues.upload_queue_url),
    );
    let result_handler = ResultHandler::new(
        textract,
        SqsEventQueue::new(sqs, &static_config.queues.job_status_queue_url),
        store,
    );

    // Start the two pipeline stages
    workers::start_submission_worker(submission_handler, static_config.worker.clone());
    workers::start_result_worker(result_handler, static_config.worker.clone());

    tokio::signal::ctrl_c().await?;
    info!("Shutting down");

    Ok(())
}

fn init_logging() {
    use tracing_subscriber::{EnvFilter, fmt, prelude::*};

    let format = fmt::format()
        .with_target(true)
        .with_thread_ids(true)
        .compact();

    // Use RUST_LOG if set, otherwise default to info level for our crate
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scrivener_service=info"));

    tracing_subscriber::registry()
        .with(fmt::layer().event_format(format))
        .with(filter)
        .init();
}
