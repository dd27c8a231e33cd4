//! # Filesystem Actions Module.
//!
//! This module provides functionalities for filesystem actions.

use agent_trust::{
	error::TrustError,
	eth::ContractArtifact,
	storage::{JSONFileStorage, Storage},
	ClientConfig,
};
use dotenv::{dotenv, var};
use std::{env::current_dir, path::PathBuf};

/// Library configuration file name.
pub const CONFIG_FILENAME: &str = "config";
/// Contract build artifact file name.
pub const ARTIFACT_FILENAME: &str = "AgentReputation";
/// Rating history file name.
pub const RATINGS_FILENAME: &str = "ratings";

/// Enum representing the possible file extensions.
pub enum FileType {
	/// CSV file.
	Csv,
	/// JSON file.
	Json,
}

impl FileType {
	/// Converts the enum variant into its corresponding file extension.
	fn as_str(&self) -> &'static str {
		match self {
			FileType::Csv => "csv",
			FileType::Json => "json",
		}
	}
}

/// Loads the mnemonic from the environment file. Signing operations are
/// refused without it; read-only commands never call this.
pub fn load_mnemonic() -> Result<String, TrustError> {
	dotenv().ok();
	var("MNEMONIC").map_err(|_| {
		TrustError::WalletUnavailable("MNEMONIC environment variable is not set.".to_string())
	})
}

/// Retrieves the path to the `assets` directory.
pub fn get_assets_path() -> Result<PathBuf, TrustError> {
	current_dir().map_err(TrustError::IOError).map(|current_dir| {
		// Workaround for the tests running in the crate directory.
		#[cfg(test)]
		{
			current_dir.join("assets")
		}

		#[cfg(not(test))]
		{
			current_dir.join("agent-trust-cli/assets")
		}
	})
}

/// Helper function to get the path of a file in the `assets` directory.
pub fn get_file_path(file_name: &str, file_type: FileType) -> Result<PathBuf, TrustError> {
	let assets_path = get_assets_path()?;
	Ok(assets_path.join(format!("{}.{}", file_name, file_type.as_str())))
}

/// Loads the configuration file. The contract address can be overridden from
/// the environment without touching the file.
pub fn load_config() -> Result<ClientConfig, TrustError> {
	let filepath = get_file_path(CONFIG_FILENAME, FileType::Json)?;
	let mut config = JSONFileStorage::<ClientConfig>::new(filepath).load()?;

	dotenv().ok();
	if let Ok(contract_address) = var("CONTRACT_ADDRESS") {
		config.contract_address = contract_address;
	}

	Ok(config)
}

/// Loads the contract build artifact. The artifact is a build product of
/// the contract repository; the error names the expected location so a
/// missing file is actionable.
pub fn load_artifact() -> Result<ContractArtifact, TrustError> {
	let filepath = get_file_path(ARTIFACT_FILENAME, FileType::Json)?;
	JSONFileStorage::<ContractArtifact>::new(filepath.clone()).load().map_err(|e| {
		TrustError::FileIOError(format!(
			"Could not load the contract artifact at \"{}\": {}",
			filepath.display(),
			e
		))
	})
}

#[cfg(test)]
mod tests {
	use crate::fs::load_config;

	#[test]
	fn test_load_config() {
		let config = load_config().unwrap();

		assert_eq!(config.target_chain_id().unwrap(), 16602);
		assert!(!config.node_url.is_empty());
		assert!(config.network_params().is_ok());
	}
}
