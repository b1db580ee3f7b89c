use clap::Parser;
use config::{Config, Environment, File};
use serde::Deserialize;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file path
    #[arg(short, long, env = "CONFIG_FILE")]
    pub config: Option<String>,

    /// Port to listen on
    #[arg(long, env = "PORT")]
    pub port: Option<u16>,

    /// Path to the client credentials CSV
    #[arg(long, env = "CREDENTIALS_FILE")]
    pub credentials: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub credentials: CredentialsConfig,
    pub gateway: GatewayConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub host: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CredentialsConfig {
    /// CSV file with `client_id,assistant_id,api_key` rows.
    pub path: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct GatewayConfig {
    /// Base URL of the hosted assistants API.
    pub base_url: String,
    /// Fixed delay between run polls, in milliseconds.
    pub poll_interval_ms: u64,
}

impl AppConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        Self::load_from_args(std::env::args())
    }

    pub fn load_from_args<I, T>(args: I) -> Result<Self, config::ConfigError>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        let cli =
            Cli::try_parse_from(args).map_err(|e| config::ConfigError::Message(e.to_string()))?;

        let mut builder = Config::builder();

        // Defaults
        builder = builder
            .set_default("server.port", 3000)?
            .set_default("server.host", "0.0.0.0")?
            .set_default("credentials.path", "assistants.csv")?
            .set_default("gateway.base_url", "https://api.openai.com/v1")?
            .set_default("gateway.poll_interval_ms", 500)?;

        // Config file (CLI flag or CONFIG_FILE env, handled by clap)
        if let Some(path) = &cli.config {
            builder = builder.add_source(File::with_name(path));
        }

        // Environment variables prefixed with RELAY_, e.g. RELAY_SERVER__PORT=8000
        builder = builder.add_source(
            Environment::with_prefix("RELAY")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        // CLI overrides win over everything else
        if let Some(port) = cli.port {
            builder = builder.set_override("server.port", i64::from(port))?;
        }
        if let Some(credentials) = cli.credentials {
            builder = builder.set_override("credentials.path", credentials)?;
        }

        let cfg = builder.build()?;
        cfg.try_deserialize()
    }
}
