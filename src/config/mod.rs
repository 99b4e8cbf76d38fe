use std::env;

use clap::ValueEnum;

const APP_ID_VAR: &str = "VE_APP_ID";
const API_ROOT_VAR: &str = "VE_API2_ROOT_URL";

/// Launcher environment, selected with `--env`. Controls which build
/// configuration is requested from the API and which binary suffix the
/// entrypoint search looks for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, ValueEnum)]
pub enum Environment {
    Debug,
    #[default]
    Dev,
    Test,
    Prod,
}

impl Environment {
    /// Build configuration name the release API expects.
    pub fn configuration(self) -> &'static str {
        match self {
            Environment::Test => "Test",
            Environment::Prod => "Shipping",
            Environment::Debug | Environment::Dev => "Development",
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Environment::Debug => "debug",
            Environment::Dev => "dev",
            Environment::Test => "test",
            Environment::Prod => "prod",
        }
    }
}

/// Resolved launcher configuration. Built once at startup; the pipeline
/// never mutates it.
#[derive(Clone, Debug)]
pub struct Config {
    pub environment: Environment,
    pub app_id: String,
    pub api_root: String,
    /// How many path components to ascend from the entrypoint to the
    /// process working directory. Release archives nest the binary four
    /// levels deep; `--depth` overrides this for differently shaped trees.
    pub depth: usize,
}

impl Config {
    /// Resolve configuration from the process environment.
    ///
    /// # Errors
    /// Returns an error when either required variable is missing or empty;
    /// there is no sensible default app identity or API endpoint.
    pub fn from_env(environment: Environment, depth: usize) -> Result<Self, String> {
        let app_id = require_var(APP_ID_VAR)?;
        let api_root = require_var(API_ROOT_VAR)?;
        Ok(Self {
            environment,
            app_id,
            api_root,
            depth,
        })
    }
}

fn require_var(name: &str) -> Result<String, String> {
    match env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(format!("invalid {name} env")),
    }
}

/// Login credentials, read only when the auth call is made. Missing
/// variables become empty strings and are rejected by the API instead.
pub fn credentials() -> (String, String) {
    (
        env::var("USER_EMAIL").unwrap_or_default(),
        env::var("USER_PASSWORD").unwrap_or_default(),
    )
}
