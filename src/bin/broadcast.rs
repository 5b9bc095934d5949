//! Sends the GitHub timeline digest to every subscriber, then exits. Meant to be run from cron.
use chrono::Utc;
use std::process::ExitCode;
use timeline_digest::broadcast::Broadcaster;
use timeline_digest::configuration::get_configuration;
use timeline_digest::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> ExitCode {
    // Stdout is reserved for the run summary.
    let subscriber = get_subscriber("broadcast".into(), "info".into(), std::io::stderr);
    init_subscriber(subscriber);

    let configuration = get_configuration().expect("Failed to read configuration.");
    let broadcaster = match Broadcaster::from_settings(&configuration) {
        Ok(broadcaster) => broadcaster,
        Err(e) => {
            eprintln!("Failed to start the broadcast: {e:?}");
            return ExitCode::FAILURE;
        }
    };

    match broadcaster.run(Utc::now()).await {
        Ok(report) => {
            println!("Finished. {} emails sent.", report.sent);
            if report.failed > 0 {
                println!("{} deliveries failed.", report.failed);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Broadcast aborted: {e}");
            tracing::error!(error.cause_chain = ?e, "Broadcast aborted");
            ExitCode::FAILURE
        }
    }
}
