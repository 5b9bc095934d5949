use crate::domain::SubscriberEmail;
use crate::github_client::GitHubClient;
use secrecy::Secret;
use serde_aux::field_attributes::deserialize_number_from_string;
use std::path::PathBuf;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub application: ApplicationSettings,
    pub storage: StorageSettings,
    pub github: GitHubSettings,
    pub notifier: NotifierSettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    // Environment variables are strings for the `config` crate: `serde-aux` lets `APP_APPLICATION__PORT`
    // override the port without failing deserialization.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    /// Public address of the web front end, used to build unsubscribe links in the digest.
    pub base_url: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct StorageSettings {
    /// Directory holding the subscriber list, the pending-verification document and the lock file.
    pub data_dir: PathBuf,
}

#[derive(serde::Deserialize, Clone)]
pub struct GitHubSettings {
    pub base_url: String,
    pub user_agent: String,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub timeout_milliseconds: u64,
    /// Unauthenticated requests are fine for the public timeline, a token only raises the rate limit.
    pub authorization_token: Option<Secret<String>>,
}

impl GitHubSettings {
    pub fn timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.timeout_milliseconds)
    }

    pub fn client(&self) -> Result<GitHubClient, reqwest::Error> {
        GitHubClient::new(
            self.base_url.clone(),
            &self.user_agent,
            self.authorization_token.clone(),
            self.timeout(),
        )
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct NotifierSettings {
    pub sender_email: String,
    pub log_file: PathBuf,
    /// Pause between two digest deliveries of the same broadcast run.
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub delay_milliseconds: u64,
}

impl NotifierSettings {
    pub fn sender(&self) -> Result<SubscriberEmail, String> {
        SubscriberEmail::parse(self.sender_email.clone())
    }

    pub fn delay(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.delay_milliseconds)
    }
}

/// Layered configuration: `base.yaml`, then the environment specific file picked by
/// `APP_ENVIRONMENT`, then `APP_`-prefixed environment variables (e.g. `APP_STORAGE__DATA_DIR`).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment. Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(
            configuration_directory.join("base.yaml"),
        ))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
