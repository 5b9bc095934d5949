use crate::configuration::Settings;
use crate::notifier::LogNotifier;
use crate::routes::{health_check, subscribe, subscribe_form, unsubscribe, unsubscribe_form};
use crate::store::{FileStore, Store};
use crate::subscriptions::SubscriptionStore;
use crate::templates::build_templates;
use crate::verification::VerificationService;
use actix_web::dev::Server;
use actix_web::{web, App, HttpServer};
use anyhow::Context;
use std::net::TcpListener;
use std::sync::Arc;
use tera::Tera;
use tracing_actix_web::TracingLogger;

pub struct Application {
    port: u16,
    server: Server,
}

impl Application {
    pub async fn build(configuration: Settings) -> Result<Self, anyhow::Error> {
        let store: Arc<dyn Store> = Arc::new(
            FileStore::open(&configuration.storage.data_dir)
                .context("Failed to open the data directory")?,
        );
        let sender = configuration
            .notifier
            .sender()
            .map_err(anyhow::Error::msg)
            .context("Invalid sender email address")?;
        let notifier = Arc::new(LogNotifier::new(sender, &configuration.notifier.log_file));
        let templates =
            Arc::new(build_templates().context("Failed to compile the page templates")?);

        let address = format!(
            "{}:{}",
            configuration.application.host, configuration.application.port
        );
        let listener = TcpListener::bind(&address)?;
        // Retrieve the port assigned to us by the OS
        let port = listener.local_addr()?.port();
        let server = run(
            listener,
            VerificationService::new(store.clone(), notifier, templates.clone()),
            SubscriptionStore::new(store),
            templates,
        )?;

        Ok(Self { port, server })
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// A more expressive name that makes it clear that this function only returns when the application
    /// is stopped.
    pub async fn run_until_stopped(self) -> Result<(), std::io::Error> {
        self.server.await
    }
}

pub fn run(
    listener: TcpListener,
    verification: VerificationService,
    subscriptions: SubscriptionStore,
    templates: Arc<Tera>,
) -> Result<Server, std::io::Error> {
    let verification = web::Data::new(verification);
    let subscriptions = web::Data::new(subscriptions);
    let templates = web::Data::from(templates);
    let server = HttpServer::new(move || {
        App::new()
            .wrap(TracingLogger::default())
            .route("/", web::get().to(subscribe_form))
            .route("/", web::post().to(subscribe))
            .route("/unsubscribe", web::get().to(unsubscribe_form))
            .route("/unsubscribe", web::post().to(unsubscribe))
            .route("/health_check", web::get().to(health_check))
            .app_data(verification.clone())
            .app_data(subscriptions.clone())
            .app_data(templates.clone())
    })
    .listen(listener)?
    .run();

    Ok(server)
}
