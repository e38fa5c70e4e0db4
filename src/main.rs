use std::process::ExitCode;

use chatkit_session::broker::{CredentialBroker, HttpCredentialBroker, NegotiationOutcome};
use chatkit_session::{logging, SessionConfig};

/// Performs one credential negotiation against the configured endpoint.
#[tokio::main]
async fn main() -> ExitCode {
    logging::init();

    let config = match SessionConfig::from_env() {
        Ok(config) => config,
        Err(error) => {
            eprintln!("configuration error: {error}");
            return ExitCode::FAILURE;
        }
    };

    let broker = HttpCredentialBroker::new(&config);
    tracing::info!(
        endpoint = %config.endpoint,
        workflow_id = broker.request().workflow_id(),
        "negotiating session"
    );

    match broker.negotiate(None).await {
        NegotiationOutcome::Success { credential } => {
            println!("session issued ({} byte client secret)", credential.as_str().len());
            ExitCode::SUCCESS
        }
        NegotiationOutcome::Failure { error } => {
            eprintln!("{} error: {error}", error.kind());
            ExitCode::FAILURE
        }
    }
}
