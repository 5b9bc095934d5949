use timeline_digest::configuration::get_configuration;
use timeline_digest::startup::Application;
use timeline_digest::telemetry::{get_subscriber, init_subscriber};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("timeline_digest".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber);

    // Panic if we can't read configuration
    let configuration = get_configuration().expect("Failed to read configuration.");
    let application = Application::build(configuration).await?;
    tracing::info!(port = application.port(), "Serving the subscription pages");
    application.run_until_stopped().await?;
    Ok(())
}
