//! # Agent Trust CLI
//!
//! This crate provides a CLI interface to use the `agent-trust` library.

#![warn(trivial_casts)]
#![deny(
	absolute_paths_not_starting_with_crate, deprecated, future_incompatible, missing_docs,
	nonstandard_style, unreachable_code, unreachable_patterns
)]
#![forbid(unsafe_code)]
#![deny(
	// Complexity
 	clippy::unnecessary_cast,
	clippy::needless_question_mark,
	// Pedantic
 	clippy::cast_lossless,
 	clippy::cast_possible_wrap,
	// Perf
	clippy::redundant_clone,
	// Restriction
 	clippy::panic,
	// Style
 	clippy::let_and_return,
 	clippy::needless_borrow
)]

mod cli;
mod fs;

use agent_trust::{error::TrustError, ClientConfig};
use clap::Parser;
use cli::*;
use dotenv::dotenv;
use env_logger::{init_from_env, Env};
use fs::load_config;
use log::info;

#[tokio::main]
async fn main() -> Result<(), TrustError> {
	dotenv().ok();
	init_from_env(Env::default().filter_or("LOG_LEVEL", "info"));
	let mut config: ClientConfig = load_config()?;

	match Cli::parse().mode {
		Mode::Connect => handle_connect(config).await?,
		Mode::Deploy => handle_deploy(config).await?,
		Mode::Query(query_data) => handle_query(config, query_data).await?,
		Mode::Rate(rate_data) => handle_rate(config, rate_data).await?,
		Mode::Show => info!("Client config:\n{:#?}", config),
		Mode::Update(update_data) => handle_update(&mut config, update_data)?,
	};

	Ok(())
}
