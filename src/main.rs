#![forbid(unsafe_code)]
#![warn(clippy::pedantic)]

use argh::FromArgs;
use failover_cache::command::{self, cache, rate_limit};
use failover_cache::configuration::{Configuration, ObservabilityConfig};
use std::process::ExitCode;
use tracing::warn;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{layer::SubscriberExt, EnvFilter};

fn set_tracing(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.log_level));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_writer(std::io::stderr),
        )
        .try_init();
}

#[derive(FromArgs, PartialEq, Debug)]
/// A key-value cache with automatic failover and token bucket rate limiting
struct GlobalArguments {
    #[argh(option, short = 'c', default = "String::from(\"config.toml\")")]
    /// the path to the configuration file, defaults to `config.toml`
    config: String,

    #[argh(subcommand)]
    subcommand: SubCommand,
}

#[derive(FromArgs, PartialEq, Debug)]
#[argh(subcommand)]
enum SubCommand {
    Status(cache::StatusOptions),
    Get(cache::GetOptions),
    Set(cache::SetOptions),
    Delete(cache::DeleteOptions),
    Incr(cache::IncrOptions),
    Decr(cache::DecrOptions),
    Clean(cache::CleanOptions),
    Check(rate_limit::CheckOptions),
    Remnant(rate_limit::RemnantOptions),
    Purge(rate_limit::PurgeOptions),
}

fn main() -> Result<ExitCode, command::Error> {
    let cli_args: GlobalArguments = argh::from_env();

    let config = Configuration::load(&cli_args.config)?;
    set_tracing(&config.observability);

    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?
        .block_on(run_command(cli_args.subcommand, config))
}

async fn run_command(
    subcommand: SubCommand,
    config: Configuration,
) -> Result<ExitCode, command::Error> {
    if config.cache.driver.is_volatile() {
        warn!("The failover driver keeps nothing between invocations, use redis or files to share state");
    }
    let cache = config.cache_manager()?;

    let output = match subcommand {
        SubCommand::Status(options) => options.run(&cache).await?,
        SubCommand::Get(options) => options.run(&cache).await?,
        SubCommand::Set(options) => options.run(&cache).await?,
        SubCommand::Delete(options) => options.run(&cache).await?,
        SubCommand::Incr(options) => options.run(&cache).await?,
        SubCommand::Decr(options) => options.run(&cache).await?,
        SubCommand::Clean(options) => options.run(&cache).await?,
        SubCommand::Check(options) => {
            let allowed = options.run(&config, cache).await?;
            println!("{}", if allowed { "allowed" } else { "rejected" });
            return Ok(if allowed {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            });
        }
        SubCommand::Remnant(options) => options.run(&config, cache).await?,
        SubCommand::Purge(options) => options.run(&config, cache).await?,
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(ExitCode::SUCCESS)
}
