//! # CLI Module.
//!
//! This module contains all CLI related data handling and conversions.

use crate::fs::{
	get_file_path, load_artifact, load_mnemonic, FileType, CONFIG_FILENAME, RATINGS_FILENAME,
};
use agent_trust::{
	error::TrustError,
	eth::{deploy_reputation, signer_from_mnemonic},
	reputation::Score,
	session::Session,
	storage::{CSVFileStorage, JSONFileStorage, RatingRecord, Storage},
	wallet::MnemonicConnector,
	Client, ClientConfig,
};
use clap::{Args, Parser, Subcommand};
use ethers::{providers::Http, types::Address};
use log::{info, warn};
use std::str::FromStr;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
	#[command(subcommand)]
	pub mode: Mode,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Mode {
	/// Connect the wallet and align it with the configured network.
	Connect,
	/// Deploy the AgentReputation contract.
	Deploy,
	/// Query the reputation of an agent. Requires 'QueryData'.
	Query(QueryData),
	/// Submit a rating for an agent. Requires 'RateData'.
	Rate(RateData),
	/// Display the current configuration.
	Show,
	/// Update the configuration. Requires 'UpdateData'.
	Update(UpdateData),
}

/// Query subcommand input.
#[derive(Args, Debug)]
pub struct QueryData {
	/// Agent address (20-byte ethereum address).
	#[clap(long = "agent")]
	agent: Option<String>,
}

/// Rate subcommand input.
#[derive(Args, Debug)]
pub struct RateData {
	/// Agent address (20-byte ethereum address).
	#[clap(long = "agent")]
	agent: Option<String>,
	/// Given score (1-5).
	#[clap(long = "score")]
	score: Option<String>,
}

/// Configuration update subcommand input.
#[derive(Args, Debug)]
pub struct UpdateData {
	/// Network chain ID.
	#[clap(long = "chain-id")]
	chain_id: Option<String>,
	/// Rating confirmation timeout in seconds; an empty value waits forever.
	#[clap(long = "confirmation-timeout")]
	confirmation_timeout: Option<String>,
	/// AgentReputation contract address (20-byte ethereum address); an empty
	/// value clears it.
	#[clap(long = "contract-address")]
	contract_address: Option<String>,
	/// Native currency decimals.
	#[clap(long = "currency-decimals")]
	currency_decimals: Option<String>,
	/// Native currency name.
	#[clap(long = "currency-name")]
	currency_name: Option<String>,
	/// Native currency symbol.
	#[clap(long = "currency-symbol")]
	currency_symbol: Option<String>,
	/// Block explorer base URL.
	#[clap(long = "explorer")]
	explorer_url: Option<String>,
	/// Human readable network name.
	#[clap(long = "network-name")]
	network_name: Option<String>,
	/// Ethereum node URL.
	#[clap(long = "node")]
	node_url: Option<String>,
}

impl RateData {
	/// Parses the score argument.
	pub fn score(&self) -> Result<Score, TrustError> {
		self.score
			.as_deref()
			.ok_or_else(|| TrustError::ValidationError("Missing score.".to_string()))?
			.parse()
	}
}

/// Handles the `connect` command.
pub async fn handle_connect(config: ClientConfig) -> Result<(), TrustError> {
	let mnemonic = load_mnemonic()?;
	let connector = MnemonicConnector::new(&mnemonic, &config.node_url)?;
	let client = Client::new(config.clone())?;
	let mut session = Session::new(Some(connector), client, config);

	let address = session.connect_wallet().await?;

	info!("Connected wallet: {:?}", address);

	Ok(())
}

/// Handles the `query` command. Runs without a wallet; reads only need the
/// node.
pub async fn handle_query(config: ClientConfig, data: QueryData) -> Result<(), TrustError> {
	let client = Client::new(config.clone())?;
	let mut session: Session<MnemonicConnector, Client> = Session::new(None, client, config);

	session.set_agent(data.agent.unwrap_or_default());
	let reputation = session.query_reputation().await?;

	info!("Reputation: {}", reputation);

	Ok(())
}

/// Handles the `rate` command.
pub async fn handle_rate(config: ClientConfig, data: RateData) -> Result<(), TrustError> {
	let score = data.score()?;

	let mnemonic = load_mnemonic()?;
	let connector = MnemonicConnector::new(&mnemonic, &config.node_url)?;
	let client = Client::new(config.clone())?;
	let mut session = Session::new(Some(connector), client, config.clone());

	session.set_agent(data.agent.unwrap_or_default());
	session.connect_wallet().await?;

	let tx_hash = session.rate(score).await?;

	// Append to the local rating history.
	let filepath = get_file_path(RATINGS_FILENAME, FileType::Csv)?;
	let mut storage = CSVFileStorage::<RatingRecord>::new(filepath);
	let mut records = if storage.filepath().exists() {
		match storage.load() {
			Ok(records) => records,
			Err(e) => {
				warn!("Could not read the rating history ({}); starting a new one.", e);
				Vec::new()
			},
		}
	} else {
		Vec::new()
	};

	let record = RatingRecord::new(session.state().agent_address.clone(), score, tx_hash);
	info!("Recorded score {} for agent {}.", record.score(), record.agent());
	records.push(record);
	storage.save(records)?;

	info!("Rating saved at \"{}\".", storage.filepath().display());
	info!("Transaction: {}/tx/{:?}", config.explorer_url, tx_hash);

	if let Some(reputation) = &session.state().reputation {
		info!("Updated reputation: {}", reputation);
	}

	Ok(())
}

/// Handles the `deploy` command.
pub async fn handle_deploy(config: ClientConfig) -> Result<(), TrustError> {
	let mnemonic = load_mnemonic()?;
	let chain_id = config.target_chain_id()?;
	let signer = signer_from_mnemonic(&mnemonic, &config.node_url, chain_id)?;
	let artifact = load_artifact()?;

	let address = deploy_reputation(signer, artifact).await?;

	info!("AgentReputation deployed at {:?}", address);

	Ok(())
}

/// Handles the CLI project configuration update.
pub fn handle_update(config: &mut ClientConfig, data: UpdateData) -> Result<(), TrustError> {
	if let Some(chain_id) = data.chain_id {
		chain_id.parse::<u64>().map_err(|e| TrustError::ParsingError(e.to_string()))?;
		config.chain_id = chain_id;
	}

	if let Some(confirmation_timeout) = data.confirmation_timeout {
		if !confirmation_timeout.is_empty() {
			confirmation_timeout
				.parse::<u64>()
				.map_err(|e| TrustError::ParsingError(e.to_string()))?;
		}
		config.confirmation_timeout = confirmation_timeout;
	}

	if let Some(contract_address) = data.contract_address {
		// An empty value clears the address and puts queries and ratings
		// back behind the not-configured guard.
		if !contract_address.is_empty() {
			Address::from_str(&contract_address)
				.map_err(|e| TrustError::ParsingError(e.to_string()))?;
		}
		config.contract_address = contract_address;
	}

	if let Some(currency_decimals) = data.currency_decimals {
		currency_decimals.parse::<u8>().map_err(|e| TrustError::ParsingError(e.to_string()))?;
		config.currency_decimals = currency_decimals;
	}

	if let Some(currency_name) = data.currency_name {
		config.currency_name = currency_name;
	}

	if let Some(currency_symbol) = data.currency_symbol {
		config.currency_symbol = currency_symbol;
	}

	if let Some(explorer_url) = data.explorer_url {
		Http::from_str(&explorer_url).map_err(|e| TrustError::ParsingError(e.to_string()))?;
		config.explorer_url = explorer_url;
	}

	if let Some(network_name) = data.network_name {
		config.network_name = network_name;
	}

	if let Some(node_url) = data.node_url {
		Http::from_str(&node_url).map_err(|e| TrustError::ParsingError(e.to_string()))?;
		config.node_url = node_url;
	}

	let filepath = get_file_path(CONFIG_FILENAME, FileType::Json)?;
	let mut json_storage = JSONFileStorage::<ClientConfig>::new(filepath);

	json_storage.save(config.clone())
}
