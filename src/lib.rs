pub mod cli;
pub mod core;
pub mod providers;
pub mod store;

use crate::cli::compare::CompareArgs;
use crate::cli::performance::PerformanceArgs;
use crate::core::config::AppConfig;
use crate::core::{MarketData, SystemClock, TargetCurrency};
use crate::providers::yahoo_finance::YahooFinanceProvider;
use anyhow::Result;
use std::sync::Arc;
use tracing::{debug, info};

pub enum AppCommand {
    Performance(PerformanceArgs),
    Compare(CompareArgs),
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("weidash starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let provider = YahooFinanceProvider::new(config.yahoo_base_url(), config.request_timeout())?;
    let market = MarketData::new(Arc::new(provider), Arc::new(SystemClock), config.cache_ttl());

    match command {
        AppCommand::Performance(args) => {
            let target = resolve_target(args.currency.as_ref(), &config)?;
            cli::performance::run(&market, &target, &args).await
        }
        AppCommand::Compare(args) => {
            let target = resolve_target(args.currency.as_ref(), &config)?;
            cli::compare::run(&market, &target, &args).await
        }
    }
}

/// Command line currency first, then the configured one.
fn resolve_target(
    requested: Option<&TargetCurrency>,
    config: &AppConfig,
) -> Result<TargetCurrency> {
    match requested {
        Some(target) => Ok(target.clone()),
        None => config.default_target(),
    }
}
