//! application entry point

use crate::assistant::model::config::ClientConfig;
use clap::Parser;
use derive_more::Display;
use log::{info, warn};
use std::env;
use std::path::Path;
use std::str::FromStr;

mod assistant;
mod cli;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    // bootstrap
    // a. env
    let env = env::var("APP_ENV")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(Env::Dev); // default dev env if absent

    let dotenv = match env {
        Env::Prod | Env::Stg => Ok(()), // provided by the deployment
        Env::Dev => dotenvy::from_path(Path::new(".env.dev")),
    };

    // b. logging
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    if let Err(e) = dotenv {
        warn!("failed to load envs from .env.dev, using process env only, {}", e);
    }

    // c. config
    let config = ClientConfig::from_env()?;
    info!("waiter assistant starting in env={}, backend={}", env, config.base_url);

    // d. run command
    cli::run(cli::Cli::parse(), config).await
}

#[derive(Debug, Display)]
#[non_exhaustive]
enum Env {
    Dev,
    Stg,
    Prod,
}

impl FromStr for Env {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "dev" => Ok(Self::Dev),
            "stg" => Ok(Self::Stg),
            "prod" => Ok(Self::Prod),
            s => Err(format!("Invalid Env: {s}")),
        }
    }
}
