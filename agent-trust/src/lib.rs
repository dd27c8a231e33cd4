//! # Agent Trust
//!
//! A client library for on-chain agent reputation: connect a wallet, query
//! the reputation score of an AI agent and submit 1-5 ratings through the
//! `AgentReputation` contract.
//!
//! ## Components
//!
//! **Session** - the view-model. Holds the per-session state (connected
//! wallet, agent under inspection, last fetched reputation, rating progress)
//! and drives the connect, query and rate flows.
//!
//! **Client** - the chain collaborator. Reads go over a bare JSON-RPC
//! provider; writes go through a wallet-derived signer.
//!
//! **MnemonicConnector** - a local wallet with its own network registry,
//! standing in for a browser wallet extension.

// Rustc
#![warn(trivial_casts)]
#![deny(
	absolute_paths_not_starting_with_crate, deprecated, future_incompatible, missing_docs,
	nonstandard_style, unreachable_code, unreachable_patterns
)]
#![forbid(unsafe_code)]
// Clippy
#![allow(clippy::tabs_in_doc_comments)]
#![deny(
	// Complexity
 	clippy::unnecessary_cast,
	clippy::needless_question_mark,
	clippy::clone_on_copy,
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

pub mod agent_reputation;
pub mod error;
pub mod eth;
pub mod reputation;
pub mod session;
pub mod storage;
pub mod wallet;

use agent_reputation::AgentReputation;
use async_trait::async_trait;
use error::TrustError;
use ethers::{
	middleware::SignerMiddleware,
	providers::{Http, PendingTransaction, Provider},
	signers::LocalWallet,
	types::{Address, TxHash, U64},
};
use log::info;
use reputation::{Reputation, Score};
use serde::{Deserialize, Serialize};
use session::ReputationClient;
use std::{sync::Arc, time::Duration};
use tokio::time::timeout;
use wallet::NetworkParams;

/// Client Signer.
pub type ClientSigner = SignerMiddleware<Provider<Http>, LocalWallet>;

/// Client configuration settings.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ClientConfig {
	/// Network chain id.
	pub chain_id: String,
	/// Seconds to wait for a rating confirmation; empty means wait forever.
	pub confirmation_timeout: String,
	/// AgentReputation contract address; empty until the contract is
	/// deployed and configured.
	pub contract_address: String,
	/// Native currency decimals.
	pub currency_decimals: String,
	/// Native currency name.
	pub currency_name: String,
	/// Native currency symbol.
	pub currency_symbol: String,
	/// Block explorer base URL.
	pub explorer_url: String,
	/// Human readable network name.
	pub network_name: String,
	/// Ethereum node URL.
	pub node_url: String,
}

impl ClientConfig {
	/// Parses the configured chain id.
	pub fn target_chain_id(&self) -> Result<u64, TrustError> {
		self.chain_id
			.parse::<u64>()
			.map_err(|e| TrustError::ConfigurationError(format!("Invalid chain id: {}", e)))
	}

	/// Whether a contract address has been configured. An empty value is a
	/// valid state: the client runs, but queries and ratings are refused
	/// before any chain call.
	pub fn is_contract_configured(&self) -> bool {
		!self.contract_address.is_empty()
	}

	/// Parses the configured contract address.
	pub fn contract(&self) -> Result<Address, TrustError> {
		if !self.is_contract_configured() {
			return Err(TrustError::ContractNotConfigured(
				"Contract address is not configured.".to_string(),
			));
		}

		self.contract_address.parse::<Address>().map_err(|e| {
			TrustError::ConfigurationError(format!("Invalid contract address: {}", e))
		})
	}

	/// Parses the optional confirmation timeout, in seconds.
	pub fn confirmation_timeout(&self) -> Result<Option<u64>, TrustError> {
		if self.confirmation_timeout.is_empty() {
			return Ok(None);
		}

		self.confirmation_timeout.parse::<u64>().map(Some).map_err(|e| {
			TrustError::ConfigurationError(format!("Invalid confirmation timeout: {}", e))
		})
	}

	/// Builds the add-network payload for the configured chain.
	pub fn network_params(&self) -> Result<NetworkParams, TrustError> {
		let currency_decimals = self.currency_decimals.parse::<u8>().map_err(|e| {
			TrustError::ConfigurationError(format!("Invalid currency decimals: {}", e))
		})?;

		Ok(NetworkParams {
			chain_id: self.target_chain_id()?,
			chain_name: self.network_name.clone(),
			currency_name: self.currency_name.clone(),
			currency_symbol: self.currency_symbol.clone(),
			currency_decimals,
			rpc_url: self.node_url.clone(),
			explorer_url: self.explorer_url.clone(),
		})
	}
}

/// Client struct.
pub struct Client {
	provider: Arc<Provider<Http>>,
	config: ClientConfig,
}

impl Client {
	/// Creates a new Client instance from the given configuration.
	pub fn new(config: ClientConfig) -> Result<Self, TrustError> {
		// Setup provider
		let provider = Provider::<Http>::try_from(config.node_url.as_str())
			.map_err(|e| TrustError::ConnectionError(e.to_string()))?;

		Ok(Self { provider: Arc::new(provider), config })
	}

	/// Gets config.
	pub fn get_config(&self) -> &ClientConfig {
		&self.config
	}
}

#[async_trait]
impl ReputationClient for Client {
	async fn reputation_of(&self, agent: &str) -> Result<Reputation, TrustError> {
		// Malformed input is not pre-validated; it surfaces from the call
		// boundary like any other read failure.
		let agent = agent
			.parse::<Address>()
			.map_err(|e| TrustError::ChainCallFailed(format!("Invalid agent address: {}", e)))?;
		let contract_address = self.config.contract()?;

		// Reads go through the bare provider; no wallet involved.
		let contract = AgentReputation::new(contract_address, self.provider.clone());
		let (average_score, total_ratings) = contract
			.get_reputation(agent)
			.call()
			.await
			.map_err(|e| TrustError::ChainCallFailed(e.to_string()))?;

		Reputation::from_raw(average_score, total_ratings)
	}

	async fn submit_rating(
		&mut self, signer: Arc<ClientSigner>, agent: &str, score: Score,
	) -> Result<TxHash, TrustError> {
		let agent = agent
			.parse::<Address>()
			.map_err(|e| TrustError::TransactionError(format!("Invalid agent address: {}", e)))?;
		let contract_address = self.config.contract()?;

		let contract = AgentReputation::new(contract_address, signer);
		let call = contract.rate_agent(agent, score.into());
		let pending =
			call.send().await.map_err(|e| TrustError::TransactionError(e.to_string()))?;

		// The pending transaction derefs to the submitted hash.
		Ok(*pending)
	}

	async fn await_confirmation(&mut self, tx_hash: TxHash) -> Result<(), TrustError> {
		let wait = PendingTransaction::new(tx_hash, &self.provider);

		let resolved = match self.config.confirmation_timeout()? {
			Some(secs) => timeout(Duration::from_secs(secs), wait).await.map_err(|_| {
				TrustError::TransactionTimedOut(format!(
					"No confirmation within {} seconds.",
					secs
				))
			})?,
			None => wait.await,
		};

		let receipt = resolved
			.map_err(|e| TrustError::TransactionError(e.to_string()))?
			.ok_or_else(|| {
				TrustError::TransactionError(
					"Transaction was dropped before inclusion.".to_string(),
				)
			})?;

		if receipt.status == Some(U64::from(0u64)) {
			return Err(TrustError::TransactionError(format!(
				"Transaction {:?} reverted.",
				tx_hash
			)));
		}

		info!("Transaction status: {:?}", receipt.status);

		Ok(())
	}
}
