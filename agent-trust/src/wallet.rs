//! # Wallet Module.
//!
//! This module contains the wallet connector: the surface the view-model
//! uses to request accounts, negotiate the active network and obtain a
//! signing capability. The native implementation derives a local wallet
//! from a BIP-39 mnemonic and keeps its own registry of known networks.

use crate::{error::TrustError, ClientSigner};
use async_trait::async_trait;
use ethers::{
	middleware::SignerMiddleware,
	providers::{Http, Middleware, Provider},
	signers::{coins_bip39::English, LocalWallet, MnemonicBuilder, Signer},
	types::{Address, U256},
};
use std::{collections::HashMap, sync::Arc};

/// Parameters identifying a network to the wallet, shaped like an
/// add-network request: chain identity, native currency metadata and
/// endpoints.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NetworkParams {
	/// Chain id.
	pub chain_id: u64,
	/// Human readable network name.
	pub chain_name: String,
	/// Native currency name.
	pub currency_name: String,
	/// Native currency symbol.
	pub currency_symbol: String,
	/// Native currency decimals.
	pub currency_decimals: u8,
	/// RPC endpoint of the network.
	pub rpc_url: String,
	/// Block explorer base URL.
	pub explorer_url: String,
}

/// Wallet surface the view-model depends on.
#[async_trait]
pub trait WalletConnector {
	/// Requests the wallet accounts. The first entry is the active account.
	async fn request_accounts(&mut self) -> Result<Vec<Address>, TrustError>;

	/// Returns the chain id of the currently selected network, as reported
	/// by the network itself rather than by configuration.
	async fn active_chain_id(&mut self) -> Result<u64, TrustError>;

	/// Selects an already registered network. Fails with
	/// [`TrustError::UnrecognizedChain`] when the chain is not registered,
	/// which callers resolve through [`WalletConnector::add_chain`].
	async fn switch_chain(&mut self, chain_id: u64) -> Result<(), TrustError>;

	/// Registers a new network and selects it.
	async fn add_chain(&mut self, params: &NetworkParams) -> Result<(), TrustError>;

	/// Returns the signing capability bound to the selected network.
	async fn signer(&self) -> Result<Arc<ClientSigner>, TrustError>;
}

/// Local wallet connector backed by a mnemonic-derived key and an owned
/// network registry (chain id to RPC URL).
pub struct MnemonicConnector {
	wallet: LocalWallet,
	networks: HashMap<u64, String>,
	active_url: String,
	provider: Provider<Http>,
	chain_id: Option<u64>,
}

impl MnemonicConnector {
	/// Creates a new connector from a mnemonic phrase, initially pointed at
	/// the given node URL. The chain id stays unknown until the network is
	/// first observed.
	pub fn new(mnemonic: &str, node_url: &str) -> Result<Self, TrustError> {
		let wallet = MnemonicBuilder::<English>::default()
			.phrase(mnemonic)
			.build()
			.map_err(|e| TrustError::KeysError(e.to_string()))?;

		let provider = Provider::<Http>::try_from(node_url)
			.map_err(|e| TrustError::ConnectionError(e.to_string()))?;

		Ok(Self {
			wallet,
			networks: HashMap::new(),
			active_url: node_url.to_string(),
			provider,
			chain_id: None,
		})
	}
}

#[async_trait]
impl WalletConnector for MnemonicConnector {
	async fn request_accounts(&mut self) -> Result<Vec<Address>, TrustError> {
		// A local keystore has nobody to prompt; the request always grants.
		Ok(vec![self.wallet.address()])
	}

	async fn active_chain_id(&mut self) -> Result<u64, TrustError> {
		let reported = self
			.provider
			.get_chainid()
			.await
			.map_err(|e| TrustError::ConnectionError(e.to_string()))?;
		let chain_id = chain_id_to_u64(reported)?;

		// The network under the boot URL is now known; remember it so a
		// later switch can come back to it.
		self.networks.insert(chain_id, self.active_url.clone());
		self.chain_id = Some(chain_id);

		Ok(chain_id)
	}

	async fn switch_chain(&mut self, chain_id: u64) -> Result<(), TrustError> {
		let url = self.networks.get(&chain_id).cloned().ok_or_else(|| {
			TrustError::UnrecognizedChain(format!(
				"Chain {} is not registered in this wallet.",
				chain_id
			))
		})?;

		let provider = Provider::<Http>::try_from(url.as_str())
			.map_err(|e| TrustError::NetworkSwitchFailed(e.to_string()))?;
		let reported = provider
			.get_chainid()
			.await
			.map_err(|e| TrustError::NetworkSwitchFailed(e.to_string()))?;
		let reported = chain_id_to_u64(reported)?;

		if reported != chain_id {
			return Err(TrustError::NetworkSwitchFailed(format!(
				"RPC endpoint reports chain {} instead of {}.",
				reported, chain_id
			)));
		}

		self.provider = provider;
		self.active_url = url;
		self.chain_id = Some(chain_id);

		Ok(())
	}

	async fn add_chain(&mut self, params: &NetworkParams) -> Result<(), TrustError> {
		let provider = Provider::<Http>::try_from(params.rpc_url.as_str())
			.map_err(|e| TrustError::NetworkSwitchFailed(e.to_string()))?;
		let reported = provider
			.get_chainid()
			.await
			.map_err(|e| TrustError::NetworkSwitchFailed(e.to_string()))?;
		let reported = chain_id_to_u64(reported)?;

		// Refuse to register an endpoint that contradicts the declared id.
		if reported != params.chain_id {
			return Err(TrustError::NetworkSwitchFailed(format!(
				"RPC endpoint for \"{}\" reports chain {} instead of {}.",
				params.chain_name, reported, params.chain_id
			)));
		}

		self.networks.insert(params.chain_id, params.rpc_url.clone());
		self.provider = provider;
		self.active_url = params.rpc_url.clone();
		self.chain_id = Some(params.chain_id);

		Ok(())
	}

	async fn signer(&self) -> Result<Arc<ClientSigner>, TrustError> {
		let chain_id = self.chain_id.ok_or_else(|| {
			TrustError::ConnectionError(
				"Wallet is not connected to a verified network.".to_string(),
			)
		})?;

		let wallet = self.wallet.clone().with_chain_id(chain_id);
		let signer = SignerMiddleware::new(self.provider.clone(), wallet);

		Ok(Arc::new(signer))
	}
}

fn chain_id_to_u64(chain_id: U256) -> Result<u64, TrustError> {
	if chain_id > U256::from(u64::MAX) {
		return Err(TrustError::ConnectionError(
			"Chain id exceeds u64 range.".to_string(),
		));
	}

	Ok(chain_id.as_u64())
}
