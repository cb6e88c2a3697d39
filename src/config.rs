use anyhow::{Result, bail};
use clap::Parser;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_INDEX_PATH: &str = "../Frontend/build/index.html";
pub const DEFAULT_API_PREFIX: &str = "/api";

#[derive(Parser, Debug)]
#[command(name = "spa-fallback")]
#[command(about = "Runs an API server that hands unmatched routes to a compiled SPA", long_about = None)]
pub struct Cli {
    #[arg(short = 'c', long = "config")]
    pub config_path: Option<String>,
}

pub fn default_config_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".spa-fallback")
}

pub fn default_config_path() -> PathBuf {
    default_config_dir().join("config.yaml")
}

#[derive(Debug, Deserialize, Clone)]
pub struct App {
    port: u16,
    base_dir: PathBuf,
    #[serde(default = "default_index_path")]
    pub index_path: PathBuf,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
}

fn default_index_path() -> PathBuf {
    PathBuf::from(DEFAULT_INDEX_PATH)
}

fn default_api_prefix() -> String {
    DEFAULT_API_PREFIX.to_string()
}

impl App {
    pub fn get_port(&self) -> u16 {
        self.port
    }

    pub fn get_base_dir(&self) -> &PathBuf {
        &self.base_dir
    }

    // The prefix is mounted with `Router::nest` and matched against every path.
    fn validate(&self) -> Result<()> {
        if !self.api_prefix.starts_with('/') || self.api_prefix == "/" {
            bail!(
                "api_prefix must start with '/' and name a path segment, got {:?}",
                self.api_prefix
            );
        }
        Ok(())
    }
}

#[derive(Debug, Deserialize)]
pub struct Config {
    pub app: App,
}

impl Config {
    pub fn new(path: impl AsRef<Path>) -> Result<Self> {
        let yaml_str = fs::read_to_string(path)?;
        Config::from_yaml(&yaml_str)
    }

    pub fn from_yaml(yaml_str: &str) -> Result<Self> {
        let yaml_with_env = Config::substitute_env_vars(yaml_str)?;
        let config: Config = serde_yaml::from_str(&yaml_with_env)?;
        config.app.validate()?;
        Ok(config)
    }

    fn substitute_env_vars(yaml_str: &str) -> Result<String> {
        let mut result = yaml_str.to_string();
        let mut offset = 0;

        while let Some(start) = result[offset..].find("${") {
            let actual_start = offset + start;
            if let Some(end) = result[actual_start..].find('}') {
                let var_name = &result[actual_start + 2..actual_start + end];

                // ${VAR:-default}
                let env_value = if let Some(default_start) = var_name.find(":-") {
                    let actual_var = &var_name[..default_start];
                    let default_val = &var_name[default_start + 2..];
                    env::var(actual_var).unwrap_or_else(|_| default_val.to_string())
                } else {
                    env::var(var_name).unwrap_or_else(|_| {
                        tracing::warn!(var = %var_name, "environment variable not found");
                        String::new()
                    })
                };

                result.replace_range(actual_start..actual_start + end + 1, &env_value);
                offset = actual_start + env_value.len();
            } else {
                break;
            }
        }

        Ok(result)
    }
}
