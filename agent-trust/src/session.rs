//! # Session Module.
//!
//! This module contains the reputation view-model: the ephemeral state a
//! frontend holds for one session (connected wallet, agent under inspection,
//! last fetched reputation, rating progress) and the operations that drive
//! it. The wallet and the chain stay behind collaborator traits; the session
//! owns every state transition.

use crate::{
	error::TrustError,
	reputation::{Reputation, Score},
	wallet::WalletConnector,
	ClientConfig, ClientSigner,
};
use async_trait::async_trait;
use ethers::types::{Address, TxHash};
use log::{info, warn};
use std::sync::Arc;

/// Chain surface the view-model depends on: one read and the two halves of
/// a write (submission, then confirmation) against the reputation contract.
#[async_trait]
pub trait ReputationClient {
	/// Reads the reputation of the given agent. The address string is parsed
	/// here, at the call boundary; malformed input surfaces as a call
	/// failure like any other.
	async fn reputation_of(&self, agent: &str) -> Result<Reputation, TrustError>;

	/// Submits a rating transaction and returns its hash without waiting for
	/// inclusion.
	async fn submit_rating(
		&mut self, signer: Arc<ClientSigner>, agent: &str, score: Score,
	) -> Result<TxHash, TrustError>;

	/// Waits until the transaction with the given hash is confirmed.
	async fn await_confirmation(&mut self, tx_hash: TxHash) -> Result<(), TrustError>;
}

/// Progress of the rating flow.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RatingFlow {
	/// No rating in progress.
	Idle,
	/// Transaction is being built and submitted.
	Submitting,
	/// Transaction was accepted and awaits confirmation.
	Pending {
		/// Hash of the submitted transaction.
		tx_hash: TxHash,
	},
}

/// Per-session view state. Recreated with every session; nothing here
/// survives the process, even if a submitted transaction is still pending
/// on chain.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewState {
	/// Connected wallet address, if any.
	pub wallet: Option<Address>,
	/// Agent address under inspection, as entered. Empty means unset; the
	/// string is not validated beyond non-emptiness.
	pub agent_address: String,
	/// Last successfully fetched reputation.
	pub reputation: Option<Reputation>,
	/// Whether an operation is in flight.
	pub busy: bool,
	/// Score picked for the rating in progress.
	pub selected_score: Option<Score>,
	/// Progress of the rating flow.
	pub flow: RatingFlow,
}

impl ViewState {
	fn new() -> Self {
		Self {
			wallet: None,
			agent_address: String::new(),
			reputation: None,
			busy: false,
			selected_score: None,
			flow: RatingFlow::Idle,
		}
	}

	/// Returns the pending transaction hash, if a rating awaits
	/// confirmation.
	pub fn pending_tx(&self) -> Option<TxHash> {
		match self.flow {
			RatingFlow::Pending { tx_hash } => Some(tx_hash),
			_ => None,
		}
	}
}

/// The reputation view-model. Operations take `&mut self`, so a session
/// admits one operation at a time; there is no response reordering to
/// guard against.
pub struct Session<C, R> {
	connector: Option<C>,
	chain: R,
	config: ClientConfig,
	state: ViewState,
}

impl<C: WalletConnector, R: ReputationClient> Session<C, R> {
	/// Creates a new session. `connector` is `None` when no wallet is
	/// available at all.
	pub fn new(connector: Option<C>, chain: R, config: ClientConfig) -> Self {
		Self { connector, chain, config, state: ViewState::new() }
	}

	/// Returns the current view state.
	pub fn state(&self) -> &ViewState {
		&self.state
	}

	/// Returns the wallet connector.
	pub fn connector(&self) -> Option<&C> {
		self.connector.as_ref()
	}

	/// Returns the chain client.
	pub fn chain(&self) -> &R {
		&self.chain
	}

	/// Sets the agent address under inspection.
	pub fn set_agent(&mut self, address: impl Into<String>) {
		self.state.agent_address = address.into();
	}

	/// Connects the wallet and aligns it with the configured network.
	/// Network alignment failures are warnings; the connection stands and
	/// the address is retained. Calling again while connected re-requests
	/// the accounts and re-checks the network.
	pub async fn connect_wallet(&mut self) -> Result<Address, TrustError> {
		self.state.busy = true;
		let result = self.connect_inner().await;
		self.state.busy = false;

		result
	}

	async fn connect_inner(&mut self) -> Result<Address, TrustError> {
		let connector = self.connector.as_mut().ok_or_else(|| {
			TrustError::WalletUnavailable("No wallet connector is available.".to_string())
		})?;

		let accounts = connector.request_accounts().await?;
		let address = accounts.first().copied().ok_or_else(|| {
			TrustError::WalletUnavailable("Wallet returned no accounts.".to_string())
		})?;
		self.state.wallet = Some(address);

		if let Err(e) = self.align_network().await {
			warn!("Network alignment failed: {}", e);
		}

		Ok(address)
	}

	/// Brings the wallet onto the configured chain: switch if the chain is
	/// already registered, otherwise offer it as a new network.
	async fn align_network(&mut self) -> Result<(), TrustError> {
		let target = self.config.target_chain_id()?;
		let params = self.config.network_params()?;
		let connector = match self.connector.as_mut() {
			Some(connector) => connector,
			None => return Ok(()),
		};

		let current = connector.active_chain_id().await?;
		if current == target {
			return Ok(());
		}

		match connector.switch_chain(target).await {
			Err(TrustError::UnrecognizedChain(_)) => connector.add_chain(&params).await,
			other => other,
		}
	}

	/// Queries the on-chain reputation of the agent under inspection and, on
	/// success, replaces the displayed record. The previous record stays in
	/// place when the query fails.
	pub async fn query_reputation(&mut self) -> Result<Reputation, TrustError> {
		if self.state.agent_address.is_empty() {
			return Err(TrustError::ValidationError(
				"Please enter an agent address.".to_string(),
			));
		}
		if !self.config.is_contract_configured() {
			return Err(contract_not_configured());
		}

		self.state.busy = true;
		let result = self.chain.reputation_of(&self.state.agent_address).await;
		self.state.busy = false;

		let reputation = result?;
		self.state.reputation = Some(reputation.clone());

		Ok(reputation)
	}

	/// Submits a rating for the agent under inspection and drives it through
	/// confirmation. Preconditions fail fast, each with its own message and
	/// without touching the chain. Exactly one transaction is sent per
	/// successful call; after confirmation the displayed reputation is
	/// refreshed.
	pub async fn rate(&mut self, score: Score) -> Result<TxHash, TrustError> {
		if self.state.agent_address.is_empty() {
			return Err(TrustError::ValidationError(
				"Please enter an agent address first.".to_string(),
			));
		}
		if !self.config.is_contract_configured() {
			return Err(contract_not_configured());
		}
		if self.state.wallet.is_none() {
			return Err(TrustError::ValidationError(
				"Please connect your wallet first.".to_string(),
			));
		}

		self.state.busy = true;
		self.state.selected_score = Some(score);
		self.state.flow = RatingFlow::Submitting;

		let result = self.rate_inner(score).await;

		self.state.busy = false;
		self.state.selected_score = None;
		if result.is_err() {
			// No hash stays behind after a failed flow.
			self.state.flow = RatingFlow::Idle;
		}

		result
	}

	async fn rate_inner(&mut self, score: Score) -> Result<TxHash, TrustError> {
		let connector = self.connector.as_mut().ok_or_else(|| {
			TrustError::ValidationError("Please connect your wallet first.".to_string())
		})?;
		let signer = connector.signer().await?;

		let tx_hash =
			self.chain.submit_rating(signer, &self.state.agent_address, score).await?;

		self.state.flow = RatingFlow::Pending { tx_hash };
		info!("Transaction pending: {:?}", tx_hash);

		self.chain.await_confirmation(tx_hash).await?;

		self.state.flow = RatingFlow::Idle;
		info!("Rating submitted successfully.");

		// The rating already stands; a refresh failure is its own warning,
		// not a rate failure.
		if let Err(e) = self.query_reputation().await {
			warn!("Could not refresh reputation: {}", e);
		}

		Ok(tx_hash)
	}
}

fn contract_not_configured() -> TrustError {
	TrustError::ContractNotConfigured(
		"Contract address is not configured. Deploy the contract and set it first.".to_string(),
	)
}

#[cfg(test)]
mod tests {
	use crate::{
		error::TrustError,
		reputation::{Reputation, Score, SCORE_SCALE},
		session::{RatingFlow, ReputationClient, Session},
		wallet::{NetworkParams, WalletConnector},
		ClientConfig, ClientSigner,
	};
	use async_trait::async_trait;
	use ethers::{
		middleware::SignerMiddleware,
		providers::{Http, Provider},
		signers::{LocalWallet, Signer},
		types::{Address, TxHash, H256},
	};
	use std::sync::{
		atomic::{AtomicUsize, Ordering},
		Arc,
	};

	const TARGET_CHAIN_ID: u64 = 16602;
	const CONTRACT_ADDRESS: &str = "0x5fbdb2315678afecb367f032d93f642f64180aa3";
	const AGENT_ADDRESS: &str = "0x70997970c51812dc3a010c7d01b50e0d17dc7666";

	struct StubConnector {
		accounts: Vec<Address>,
		chain_id: u64,
		known_chains: Vec<u64>,
		reject_requests: bool,
		fail_switch: bool,
		added: Vec<NetworkParams>,
		switched: Vec<u64>,
	}

	impl StubConnector {
		fn new(chain_id: u64) -> Self {
			Self {
				accounts: vec![Address::repeat_byte(0x11)],
				chain_id,
				known_chains: vec![chain_id],
				reject_requests: false,
				fail_switch: false,
				added: Vec::new(),
				switched: Vec::new(),
			}
		}
	}

	#[async_trait]
	impl WalletConnector for StubConnector {
		async fn request_accounts(&mut self) -> Result<Vec<Address>, TrustError> {
			if self.reject_requests {
				return Err(TrustError::WalletRequestRejected(
					"User rejected the request.".to_string(),
				));
			}
			Ok(self.accounts.clone())
		}

		async fn active_chain_id(&mut self) -> Result<u64, TrustError> {
			Ok(self.chain_id)
		}

		async fn switch_chain(&mut self, chain_id: u64) -> Result<(), TrustError> {
			self.switched.push(chain_id);
			if self.fail_switch {
				return Err(TrustError::NetworkSwitchFailed("Switch refused.".to_string()));
			}
			if !self.known_chains.contains(&chain_id) {
				return Err(TrustError::UnrecognizedChain(format!(
					"Chain {} unknown.",
					chain_id
				)));
			}
			self.chain_id = chain_id;
			Ok(())
		}

		async fn add_chain(&mut self, params: &NetworkParams) -> Result<(), TrustError> {
			self.added.push(params.clone());
			self.known_chains.push(params.chain_id);
			self.chain_id = params.chain_id;
			Ok(())
		}

		async fn signer(&self) -> Result<Arc<ClientSigner>, TrustError> {
			// Construction only parses the URL; nothing is dialled.
			let provider = Provider::<Http>::try_from("http://localhost:8545").unwrap();
			let wallet: LocalWallet =
				"ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80"
					.parse()
					.unwrap();
			Ok(Arc::new(SignerMiddleware::new(
				provider,
				wallet.with_chain_id(self.chain_id),
			)))
		}
	}

	/// In-memory contract double holding one agent's reputation and applying
	/// the same accumulation the contract would.
	struct StubChain {
		average_score: u64,
		total_ratings: u64,
		read_calls: AtomicUsize,
		fail_reads_after: Option<usize>,
		fail_confirm: bool,
		next_hash: TxHash,
		submitted: Vec<(String, Score)>,
		confirmed: Vec<TxHash>,
	}

	impl StubChain {
		fn new(average_score: u64, total_ratings: u64) -> Self {
			Self {
				average_score,
				total_ratings,
				read_calls: AtomicUsize::new(0),
				fail_reads_after: None,
				fail_confirm: false,
				next_hash: H256::from_low_u64_be(0xdead_beef),
				submitted: Vec::new(),
				confirmed: Vec::new(),
			}
		}

		fn read_calls(&self) -> usize {
			self.read_calls.load(Ordering::SeqCst)
		}
	}

	#[async_trait]
	impl ReputationClient for StubChain {
		async fn reputation_of(&self, _agent: &str) -> Result<Reputation, TrustError> {
			let seen = self.read_calls.fetch_add(1, Ordering::SeqCst);
			if let Some(after) = self.fail_reads_after {
				if seen >= after {
					return Err(TrustError::ChainCallFailed("Read refused.".to_string()));
				}
			}
			Ok(Reputation::new(self.average_score, self.total_ratings))
		}

		async fn submit_rating(
			&mut self, _signer: Arc<ClientSigner>, agent: &str, score: Score,
		) -> Result<TxHash, TrustError> {
			self.submitted.push((agent.to_string(), score));

			// Same accumulation rule the contract applies.
			let sum = self.average_score * self.total_ratings
				+ u64::from(score.value()) * SCORE_SCALE;
			self.total_ratings += 1;
			self.average_score = sum / self.total_ratings;

			Ok(self.next_hash)
		}

		async fn await_confirmation(&mut self, tx_hash: TxHash) -> Result<(), TrustError> {
			self.confirmed.push(tx_hash);
			if self.fail_confirm {
				return Err(TrustError::TransactionError("Execution reverted.".to_string()));
			}
			Ok(())
		}
	}

	fn test_config(contract_address: &str) -> ClientConfig {
		ClientConfig {
			chain_id: TARGET_CHAIN_ID.to_string(),
			confirmation_timeout: String::new(),
			contract_address: contract_address.to_string(),
			currency_decimals: "18".to_string(),
			currency_name: "0G".to_string(),
			currency_symbol: "0G".to_string(),
			explorer_url: "https://explorer.0g.ai".to_string(),
			network_name: "0G Testnet".to_string(),
			node_url: "http://localhost:8545".to_string(),
		}
	}

	fn test_session(
		connector: Option<StubConnector>, chain: StubChain, contract_address: &str,
	) -> Session<StubConnector, StubChain> {
		Session::new(connector, chain, test_config(contract_address))
	}

	#[tokio::test]
	async fn test_connect_without_wallet() {
		let mut session = test_session(None, StubChain::new(0, 0), CONTRACT_ADDRESS);

		let result = session.connect_wallet().await;

		assert!(matches!(result, Err(TrustError::WalletUnavailable(_))));
		assert_eq!(session.state().wallet, None);
		assert!(!session.state().busy);
	}

	#[tokio::test]
	async fn test_connect_rejected_by_wallet() {
		let mut connector = StubConnector::new(TARGET_CHAIN_ID);
		connector.reject_requests = true;
		let mut session = test_session(Some(connector), StubChain::new(0, 0), CONTRACT_ADDRESS);

		let result = session.connect_wallet().await;

		assert!(matches!(result, Err(TrustError::WalletRequestRejected(_))));
		assert_eq!(session.state().wallet, None);
	}

	#[tokio::test]
	async fn test_connect_on_target_chain() {
		let connector = StubConnector::new(TARGET_CHAIN_ID);
		let mut session = test_session(Some(connector), StubChain::new(0, 0), CONTRACT_ADDRESS);

		let address = session.connect_wallet().await.unwrap();

		assert_eq!(session.state().wallet, Some(address));
		let connector = session.connector().unwrap();
		assert!(connector.switched.is_empty());
		assert!(connector.added.is_empty());
	}

	#[tokio::test]
	async fn test_connect_is_repeatable() {
		let connector = StubConnector::new(TARGET_CHAIN_ID);
		let mut session = test_session(Some(connector), StubChain::new(0, 0), CONTRACT_ADDRESS);

		let first = session.connect_wallet().await.unwrap();
		let second = session.connect_wallet().await.unwrap();

		assert_eq!(first, second);
		assert_eq!(session.state().wallet, Some(second));
	}

	#[tokio::test]
	async fn test_connect_switches_to_known_chain() {
		let mut connector = StubConnector::new(1);
		connector.known_chains.push(TARGET_CHAIN_ID);
		let mut session = test_session(Some(connector), StubChain::new(0, 0), CONTRACT_ADDRESS);

		session.connect_wallet().await.unwrap();

		let connector = session.connector().unwrap();
		assert_eq!(connector.switched, vec![TARGET_CHAIN_ID]);
		assert_eq!(connector.chain_id, TARGET_CHAIN_ID);
		assert!(connector.added.is_empty());
	}

	#[tokio::test]
	async fn test_connect_adds_unrecognized_chain() {
		// Wallet only knows chain 1: the switch is refused as unrecognized
		// and the configured network is offered instead.
		let connector = StubConnector::new(1);
		let mut session = test_session(Some(connector), StubChain::new(0, 0), CONTRACT_ADDRESS);

		session.connect_wallet().await.unwrap();

		let connector = session.connector().unwrap();
		assert_eq!(connector.added.len(), 1);
		assert_eq!(connector.added[0].chain_id, TARGET_CHAIN_ID);
		assert_eq!(connector.added[0].chain_name, "0G Testnet");
		assert_eq!(connector.added[0].rpc_url, "http://localhost:8545");
		assert_eq!(connector.chain_id, TARGET_CHAIN_ID);
	}

	#[tokio::test]
	async fn test_connect_switch_failure_is_non_fatal() {
		let mut connector = StubConnector::new(1);
		connector.known_chains.push(TARGET_CHAIN_ID);
		connector.fail_switch = true;
		let mut session = test_session(Some(connector), StubChain::new(0, 0), CONTRACT_ADDRESS);

		// The wallet stays on the wrong chain, but the connection stands.
		let address = session.connect_wallet().await.unwrap();

		assert_eq!(session.state().wallet, Some(address));
		assert_eq!(session.connector().unwrap().chain_id, 1);
	}

	#[tokio::test]
	async fn test_query_requires_agent_address() {
		let mut session = test_session(None, StubChain::new(350, 4), CONTRACT_ADDRESS);

		let result = session.query_reputation().await;

		assert!(matches!(result, Err(TrustError::ValidationError(_))));
		assert_eq!(session.chain().read_calls(), 0);
	}

	#[tokio::test]
	async fn test_query_without_configured_contract() {
		let mut session = test_session(None, StubChain::new(350, 4), "");
		session.set_agent(AGENT_ADDRESS);

		let result = session.query_reputation().await;

		assert!(matches!(result, Err(TrustError::ContractNotConfigured(_))));
		assert_eq!(session.chain().read_calls(), 0);
		assert_eq!(session.state().reputation, None);
	}

	#[tokio::test]
	async fn test_query_formats_reputation() {
		let mut session = test_session(None, StubChain::new(350, 4), CONTRACT_ADDRESS);
		session.set_agent(AGENT_ADDRESS);

		let reputation = session.query_reputation().await.unwrap();

		assert_eq!(reputation.formatted_average(), "3.50");
		assert_eq!(reputation.total_ratings, 4);
		assert_eq!(reputation.to_string(), "3.50 (based on 4 ratings)");
		assert_eq!(session.state().reputation, Some(Reputation::new(350, 4)));
		assert!(!session.state().busy);
	}

	#[tokio::test]
	async fn test_query_is_idempotent() {
		let mut session = test_session(None, StubChain::new(350, 4), CONTRACT_ADDRESS);
		session.set_agent(AGENT_ADDRESS);

		let first = session.query_reputation().await.unwrap();
		let second = session.query_reputation().await.unwrap();

		assert_eq!(first, second);
		assert_eq!(session.chain().read_calls(), 2);
		assert_eq!(session.state().reputation, Some(first));
	}

	#[tokio::test]
	async fn test_query_failure_keeps_previous_result() {
		let mut chain = StubChain::new(350, 4);
		chain.fail_reads_after = Some(1);
		let mut session = test_session(None, chain, CONTRACT_ADDRESS);
		session.set_agent(AGENT_ADDRESS);

		session.query_reputation().await.unwrap();
		let result = session.query_reputation().await;

		assert!(matches!(result, Err(TrustError::ChainCallFailed(_))));
		assert_eq!(session.state().reputation, Some(Reputation::new(350, 4)));
		assert!(!session.state().busy);
	}

	#[tokio::test]
	async fn test_rate_round_trip() {
		let connector = StubConnector::new(TARGET_CHAIN_ID);
		let chain = StubChain::new(350, 4);
		let mut session = test_session(Some(connector), chain, CONTRACT_ADDRESS);
		session.set_agent(AGENT_ADDRESS);
		session.connect_wallet().await.unwrap();

		let tx_hash = session.rate(Score::Five).await.unwrap();

		let chain = session.chain();
		assert_eq!(chain.submitted, vec![(AGENT_ADDRESS.to_string(), Score::Five)]);
		assert_eq!(chain.confirmed, vec![tx_hash]);

		// Confirmation cleared the pending hash and the refresh picked up
		// the accumulated values.
		assert_eq!(session.state().flow, RatingFlow::Idle);
		assert_eq!(session.state().pending_tx(), None);
		assert_eq!(session.state().selected_score, None);
		assert!(!session.state().busy);
		assert_eq!(session.state().reputation, Some(Reputation::new(380, 5)));
		assert_eq!(session.chain().read_calls(), 1);
	}

	#[tokio::test]
	async fn test_rate_fail_fast_guards() {
		let connector = StubConnector::new(TARGET_CHAIN_ID);
		let mut session = test_session(Some(connector), StubChain::new(0, 0), CONTRACT_ADDRESS);

		// Empty agent address is caught first.
		let no_agent = session.rate(Score::Three).await.unwrap_err();
		assert!(matches!(no_agent, TrustError::ValidationError(_)));

		// Disconnected wallet is caught next, with its own message.
		session.set_agent(AGENT_ADDRESS);
		let no_wallet = session.rate(Score::Three).await.unwrap_err();
		assert!(matches!(no_wallet, TrustError::ValidationError(_)));
		assert_ne!(no_agent.to_string(), no_wallet.to_string());

		assert!(session.chain().submitted.is_empty());
		assert_eq!(session.state().flow, RatingFlow::Idle);
	}

	#[tokio::test]
	async fn test_rate_without_configured_contract() {
		let connector = StubConnector::new(TARGET_CHAIN_ID);
		let mut session = test_session(Some(connector), StubChain::new(0, 0), "");
		session.set_agent(AGENT_ADDRESS);
		session.connect_wallet().await.unwrap();

		let result = session.rate(Score::One).await;

		assert!(matches!(result, Err(TrustError::ContractNotConfigured(_))));
		assert!(session.chain().submitted.is_empty());
	}

	#[tokio::test]
	async fn test_rate_failure_clears_pending_state() {
		let connector = StubConnector::new(TARGET_CHAIN_ID);
		let mut chain = StubChain::new(0, 0);
		chain.fail_confirm = true;
		let mut session = test_session(Some(connector), chain, CONTRACT_ADDRESS);
		session.set_agent(AGENT_ADDRESS);
		session.connect_wallet().await.unwrap();

		let result = session.rate(Score::Two).await;

		assert!(matches!(result, Err(TrustError::TransactionError(_))));
		assert_eq!(session.chain().confirmed.len(), 1);
		assert_eq!(session.state().flow, RatingFlow::Idle);
		assert_eq!(session.state().pending_tx(), None);
		assert_eq!(session.state().selected_score, None);
		assert!(!session.state().busy);
		// No refresh ran, so nothing is displayed.
		assert_eq!(session.state().reputation, None);
	}

	#[tokio::test]
	async fn test_rate_refresh_failure_is_non_fatal() {
		let connector = StubConnector::new(TARGET_CHAIN_ID);
		let mut chain = StubChain::new(350, 4);
		chain.fail_reads_after = Some(0);
		let mut session = test_session(Some(connector), chain, CONTRACT_ADDRESS);
		session.set_agent(AGENT_ADDRESS);
		session.connect_wallet().await.unwrap();

		// The rating succeeded even though the follow-up refresh could not.
		let result = session.rate(Score::Four).await;

		assert!(result.is_ok());
		assert_eq!(session.chain().submitted.len(), 1);
		assert_eq!(session.state().reputation, None);
	}
}
