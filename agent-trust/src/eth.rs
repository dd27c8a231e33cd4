//! # Ethereum Module.
//!
//! This module provides helpers for general ethereum interactions: signer
//! construction and contract deployment from a compiled artifact.

use crate::{error::TrustError, ClientSigner};
use ethers::{
	abi::Abi,
	contract::ContractFactory,
	middleware::SignerMiddleware,
	providers::{Http, Provider},
	signers::{coins_bip39::English, MnemonicBuilder, Signer},
	types::{Address, Bytes},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Compiled contract artifact: the `abi` and `bytecode` subset of the JSON
/// emitted by the contract build. The contract itself is built outside this
/// repository; deployment consumes its artifact.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ContractArtifact {
	/// Contract ABI.
	pub abi: Abi,
	/// Creation bytecode.
	pub bytecode: Bytes,
}

/// Builds a signer from a mnemonic phrase against the given node.
pub fn signer_from_mnemonic(
	mnemonic: &str, node_url: &str, chain_id: u64,
) -> Result<Arc<ClientSigner>, TrustError> {
	let provider = Provider::<Http>::try_from(node_url)
		.map_err(|e| TrustError::ConnectionError(e.to_string()))?;

	let wallet = MnemonicBuilder::<English>::default()
		.phrase(mnemonic)
		.build()
		.map_err(|e| TrustError::KeysError(e.to_string()))?;

	let signer = SignerMiddleware::new(provider, wallet.with_chain_id(chain_id));

	Ok(Arc::new(signer))
}

/// Deploys the AgentReputation contract from its compiled artifact and
/// returns the deployed address once the transaction is mined.
pub async fn deploy_reputation(
	signer: Arc<ClientSigner>, artifact: ContractArtifact,
) -> Result<Address, TrustError> {
	let factory = ContractFactory::new(artifact.abi, artifact.bytecode, signer);

	let deployer = factory.deploy(()).map_err(|e| TrustError::ContractError(e.to_string()))?;
	let contract =
		deployer.send().await.map_err(|e| TrustError::TransactionError(e.to_string()))?;

	Ok(contract.address())
}
