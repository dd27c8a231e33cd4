//! # Agent Reputation Contract Module.
//!
//! Bindings for the `AgentReputation` contract interface consumed by this
//! client. The contract itself is deployed separately; only the two functions
//! below are relied upon. `averageScore` is a fixed-point integer scaled by
//! 100 and is only meaningful while `totalRatings` is non-zero.

pub use agent_reputation::*;

#[allow(
	clippy::enum_variant_names, clippy::too_many_arguments, clippy::upper_case_acronyms,
	clippy::type_complexity, dead_code, non_camel_case_types, missing_docs,
	clippy::useless_conversion
)]
pub mod agent_reputation {
	use ethers::contract::abigen;

	abigen!(
		AgentReputation,
		r#"[
			function rateAgent(address _agent, uint256 _score)
			function getReputation(address _agent) view returns (uint256 averageScore, uint256 totalRatings)
		]"#
	);
}
