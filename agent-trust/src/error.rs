//! # Error Module.
//!
//! This module features the `TrustError` enum for error handling throughout the project.

use thiserror::Error;

/// The crate-wide error variants.
#[derive(Debug, Error)]
pub enum TrustError {
	/// Reputation read call failure, including malformed agent addresses
	#[error("ChainCallFailed: {0}")]
	ChainCallFailed(String),

	/// Configuration error
	#[error("ConfigurationError: {0}")]
	ConfigurationError(String),

	/// Connection error
	#[error("ConnectionError: {0}")]
	ConnectionError(String),

	/// Contract deployment error
	#[error("ContractError: {0}")]
	ContractError(String),

	/// No contract address configured
	#[error("ContractNotConfigured: {0}")]
	ContractNotConfigured(String),

	/// Conversion error
	#[error("ConversionError: {0}")]
	ConversionError(String),

	/// File read/write error
	#[error("FileIOError: {0}")]
	FileIOError(String),

	/// Input/output error
	#[error("IOError: {0}")]
	IOError(std::io::Error),

	/// Keys Error
	#[error("KeysError: {0}")]
	KeysError(String),

	/// Network switch failure, non-fatal during wallet connection
	#[error("NetworkSwitchFailed: {0}")]
	NetworkSwitchFailed(String),

	/// Parsing error
	#[error("ParsingError: {0}")]
	ParsingError(String),

	/// Transaction submission or confirmation error
	#[error("TransactionError: {0}")]
	TransactionError(String),

	/// Transaction confirmation wait exceeded the configured bound
	#[error("TransactionTimedOut: {0}")]
	TransactionTimedOut(String),

	/// Switch target chain is not registered in the wallet
	#[error("UnrecognizedChain: {0}")]
	UnrecognizedChain(String),

	/// Validation error
	#[error("ValidationError: {0}")]
	ValidationError(String),

	/// Wallet refused the request
	#[error("WalletRequestRejected: {0}")]
	WalletRequestRejected(String),

	/// No wallet available
	#[error("WalletUnavailable: {0}")]
	WalletUnavailable(String),
}
