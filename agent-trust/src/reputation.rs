//! # Reputation Module.
//!
//! This module contains the reputation domain types: the on-chain reputation
//! record of an agent and the closed set of submittable scores.

use crate::error::TrustError;
use ethers::types::U256;
use std::{fmt, str::FromStr};

/// Scaling factor applied to the average score stored on chain.
pub const SCORE_SCALE: u64 = 100;

/// A rating score. The rating control offers exactly these five values;
/// anything outside the 1-5 range is unrepresentable.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Score {
	/// Poor.
	One = 1,
	/// Below average.
	Two = 2,
	/// Average.
	Three = 3,
	/// Good.
	Four = 4,
	/// Excellent.
	Five = 5,
}

impl Score {
	/// All submittable scores, in ascending order.
	pub const ALL: [Score; 5] = [Score::One, Score::Two, Score::Three, Score::Four, Score::Five];

	/// Returns the numeric value of the score.
	pub fn value(self) -> u8 {
		self as u8
	}
}

impl TryFrom<u8> for Score {
	type Error = TrustError;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		match value {
			1 => Ok(Score::One),
			2 => Ok(Score::Two),
			3 => Ok(Score::Three),
			4 => Ok(Score::Four),
			5 => Ok(Score::Five),
			_ => Err(TrustError::ValidationError(format!(
				"Score must be between 1 and 5, got {}.",
				value
			))),
		}
	}
}

impl FromStr for Score {
	type Err = TrustError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let value = s.parse::<u8>().map_err(|e| TrustError::ParsingError(e.to_string()))?;
		Score::try_from(value)
	}
}

impl From<Score> for U256 {
	fn from(score: Score) -> Self {
		U256::from(score.value())
	}
}

impl fmt::Display for Score {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.value())
	}
}

/// On-chain reputation of an agent.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reputation {
	/// Average score as stored on chain: a fixed-point integer scaled by
	/// [`SCORE_SCALE`]. Kept unscaled until rendering.
	pub average_score: u64,
	/// Number of ratings the average is based on.
	pub total_ratings: u64,
}

impl Reputation {
	/// Creates a new reputation record.
	pub fn new(average_score: u64, total_ratings: u64) -> Self {
		Self { average_score, total_ratings }
	}

	/// Parses the raw `getReputation` return values into a typed record.
	/// Called at the chain boundary, before any arithmetic on the score.
	pub fn from_raw(average_score: U256, total_ratings: U256) -> Result<Self, TrustError> {
		if average_score > U256::from(u64::MAX) {
			return Err(TrustError::ConversionError(
				"Average score exceeds u64 range".to_string(),
			));
		}
		if total_ratings > U256::from(u64::MAX) {
			return Err(TrustError::ConversionError(
				"Total ratings exceeds u64 range".to_string(),
			));
		}

		Ok(Self::new(average_score.as_u64(), total_ratings.as_u64()))
	}

	/// Whether the agent has received any rating. The average is meaningless
	/// otherwise.
	pub fn has_ratings(&self) -> bool {
		self.total_ratings > 0
	}

	/// Renders the descaled average with two decimal places, e.g. `350` as
	/// `"3.50"`.
	pub fn formatted_average(&self) -> String {
		format!(
			"{}.{:02}",
			self.average_score / SCORE_SCALE,
			self.average_score % SCORE_SCALE
		)
	}
}

impl fmt::Display for Reputation {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if !self.has_ratings() {
			return write!(f, "No ratings yet");
		}

		let plural = if self.total_ratings == 1 { "" } else { "s" };
		write!(
			f,
			"{} (based on {} rating{})",
			self.formatted_average(),
			self.total_ratings,
			plural
		)
	}
}

#[cfg(test)]
mod tests {
	use crate::reputation::{Reputation, Score};
	use ethers::types::U256;

	#[test]
	fn test_score_rejects_out_of_range_values() {
		// Exactly the five control values convert, nothing else does.
		for value in 0..=u8::MAX {
			let result = Score::try_from(value);
			if (1..=5).contains(&value) {
				assert_eq!(result.unwrap().value(), value);
			} else {
				assert!(result.is_err());
			}
		}

		let reachable: Vec<u8> = Score::ALL.iter().map(|score| score.value()).collect();
		assert_eq!(reachable, vec![1, 2, 3, 4, 5]);
	}

	#[test]
	fn test_score_from_str() {
		assert_eq!("5".parse::<Score>().unwrap(), Score::Five);
		assert!("0".parse::<Score>().is_err());
		assert!("6".parse::<Score>().is_err());
		assert!("five".parse::<Score>().is_err());
		assert_eq!(U256::from(Score::Three), U256::from(3u64));
	}

	#[test]
	fn test_reputation_from_raw() {
		let reputation = Reputation::from_raw(U256::from(350u64), U256::from(4u64)).unwrap();

		assert_eq!(reputation.average_score, 350);
		assert_eq!(reputation.total_ratings, 4);
		assert_eq!(reputation.formatted_average(), "3.50");
		assert_eq!(reputation.to_string(), "3.50 (based on 4 ratings)");
	}

	#[test]
	fn test_reputation_from_raw_out_of_range() {
		let too_big = U256::from(u64::MAX) + U256::from(1u64);

		assert!(Reputation::from_raw(too_big, U256::from(1u64)).is_err());
		assert!(Reputation::from_raw(U256::from(1u64), too_big).is_err());
	}

	#[test]
	fn test_reputation_display_gates_on_rating_count() {
		// A fresh contract reports (0, 0): rendered as unrated, not as 0.00.
		let unrated = Reputation::new(0, 0);
		assert_eq!(unrated.to_string(), "No ratings yet");
		assert!(!unrated.has_ratings());

		let single = Reputation::new(500, 1);
		assert_eq!(single.to_string(), "5.00 (based on 1 rating)");

		let uneven = Reputation::new(467, 3);
		assert_eq!(uneven.formatted_average(), "4.67");
	}
}
