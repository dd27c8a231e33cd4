//! # Storage Module.
//!
//! This module contains generic storage traits and implementations.

use crate::{error::TrustError, reputation::Score};
use csv::{ReaderBuilder, WriterBuilder};
use ethers::types::H256;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{from_reader, to_string};
use std::{
	fs::File,
	io::{BufReader, Write},
	marker::PhantomData,
	path::PathBuf,
};

/// The main trait to be implemented by different storage types.
pub trait Storage<T> {
	/// The error type.
	type Err;

	/// Loads data from storage.
	fn load(&self) -> Result<T, Self::Err>;
	/// Saves data to storage.
	fn save(&mut self, data: T) -> Result<(), Self::Err>;
}

/// The `CSVFileStorage` struct provides a mechanism for persisting
/// and retrieving structured data to and from CSV files.
///
/// # Examples
///
/// ```no_run
/// use serde::{Serialize, Deserialize};
/// use std::path::PathBuf;
/// use agent_trust::storage::{CSVFileStorage, Storage};
///
/// #[derive(Serialize, Deserialize, Clone, PartialEq, Debug)]
/// struct Record {
///    agent: String,
///    score: u8,
/// }
///
/// let filepath = PathBuf::from("/path/to/your/file.csv");
/// let mut storage = CSVFileStorage::<Record>::new(filepath);
///
/// let data = vec![Record { agent: "0x0".into(), score: 5 }];
///
/// // Save the data to the CSV file.
/// storage.save(data.clone()).unwrap();
///
/// // Load the data from the CSV file.
/// let loaded_data = storage.load().unwrap();
/// assert_eq!(data, loaded_data);
/// ```
pub struct CSVFileStorage<T> {
	filepath: PathBuf,
	phantom: PhantomData<T>,
}

impl<T> CSVFileStorage<T> {
	/// Creates a new CSVFileStorage.
	pub fn new(filepath: PathBuf) -> Self {
		Self { filepath, phantom: PhantomData }
	}

	/// Returns the path to the file.
	pub fn filepath(&self) -> &PathBuf {
		&self.filepath
	}
}

impl<T: Serialize + DeserializeOwned + Clone> Storage<Vec<T>> for CSVFileStorage<T> {
	type Err = TrustError;

	fn load(&self) -> Result<Vec<T>, TrustError> {
		let file = File::open(&self.filepath).map_err(TrustError::IOError)?;
		let mut reader = ReaderBuilder::new().from_reader(BufReader::new(file));

		reader
			.deserialize()
			.map(|result| result.map_err(|e| TrustError::FileIOError(e.to_string())))
			.collect()
	}

	fn save(&mut self, data: Vec<T>) -> Result<(), TrustError> {
		let mut writer = WriterBuilder::new()
			.from_path(&self.filepath)
			.map_err(|e| TrustError::FileIOError(e.to_string()))?;

		// Loop over content and write each item
		for record in &data {
			writer.serialize(record).map_err(|e| TrustError::FileIOError(e.to_string()))?;
		}

		// Flush buffer
		writer.flush().map_err(|e| TrustError::FileIOError(e.to_string()))?;

		Ok(())
	}
}

/// The `JSONFileStorage` struct provides a mechanism for persisting
/// and retrieving structured data to and from JSON files.
pub struct JSONFileStorage<T> {
	filepath: PathBuf,
	phantom: PhantomData<T>,
}

impl<T> JSONFileStorage<T> {
	/// Creates a new JSONFileStorage.
	pub fn new(filepath: PathBuf) -> Self {
		Self { filepath, phantom: PhantomData }
	}

	/// Returns the path to the file.
	pub fn filepath(&self) -> &PathBuf {
		&self.filepath
	}
}

impl<T: Serialize + DeserializeOwned + Clone> Storage<T> for JSONFileStorage<T> {
	type Err = TrustError;

	fn load(&self) -> Result<T, Self::Err> {
		let file = File::open(&self.filepath).map_err(TrustError::IOError)?;
		let reader = BufReader::new(file);
		from_reader(reader).map_err(|e| TrustError::ParsingError(e.to_string()))
	}

	fn save(&mut self, data: T) -> Result<(), Self::Err> {
		let json_str = to_string(&data).map_err(|e| TrustError::ParsingError(e.to_string()))?;

		let mut file = File::create(&self.filepath).map_err(TrustError::IOError)?;
		file.write_all(json_str.as_bytes()).map_err(TrustError::IOError)
	}
}

/// Row in the local ratings history: one submitted and confirmed rating.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct RatingRecord {
	/// The rated agent address.
	agent: String,
	/// The submitted score.
	score: String,
	/// Hash of the confirming transaction.
	tx_hash: String,
}

impl RatingRecord {
	/// Creates a new rating record.
	pub fn new(agent: String, score: Score, tx_hash: H256) -> Self {
		Self { agent, score: score.to_string(), tx_hash: format!("{:?}", tx_hash) }
	}

	/// Returns the rated agent address.
	pub fn agent(&self) -> &String {
		&self.agent
	}

	/// Returns the submitted score.
	pub fn score(&self) -> &String {
		&self.score
	}

	/// Returns the confirming transaction hash.
	pub fn tx_hash(&self) -> &String {
		&self.tx_hash
	}
}
