//! Error types for dataset and configuration loading.

use thiserror::Error;

/// Data layer result type alias.
pub type Result<T> = std::result::Result<T, DataError>;

/// Failures while fetching or decoding a dataset. None of these are retried:
/// the component that asked for the data stays in its "no data" state.
#[derive(Error, Debug)]
pub enum DataError {
	/// The request could not be sent or its body could not be read.
	#[error("fetch failed: {0}")]
	Fetch(String),

	/// The server answered with a non-success status.
	#[error("{url} answered with HTTP {status}")]
	Status { url: String, status: u16 },

	/// The body was not the JSON shape we expect.
	#[error("decode error: {0}")]
	Decode(#[from] serde_json::Error),
}

impl From<gloo_net::Error> for DataError {
	fn from(e: gloo_net::Error) -> Self {
		DataError::Fetch(e.to_string())
	}
}
