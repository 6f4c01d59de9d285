use gloo_net::http::Request;
use log::{info, warn};

use super::types::{NetworkDataset, ProductRecord, ScatterPoint};
use crate::error::{DataError, Result};

/// One-shot GET of a text body.
pub async fn fetch_text(url: &str) -> Result<String> {
	let resp = Request::get(url).send().await?;
	if !resp.ok() {
		return Err(DataError::Status {
			url: url.to_string(),
			status: resp.status(),
		});
	}
	Ok(resp.text().await?)
}

pub fn parse_products(text: &str) -> Result<Vec<ProductRecord>> {
	Ok(serde_json::from_str(text)?)
}

pub fn parse_network(text: &str) -> Result<NetworkDataset> {
	Ok(serde_json::from_str(text)?)
}

pub fn parse_scatter(text: &str) -> Result<Vec<ScatterPoint>> {
	Ok(serde_json::from_str(text)?)
}

/// Fetches and decodes a dataset, logging the outcome. `None` means the
/// caller keeps its loading placeholder.
async fn load_with<T>(url: &str, parse: fn(&str) -> Result<T>) -> Option<T> {
	let result = match fetch_text(url).await {
		Ok(text) => parse(&text),
		Err(e) => Err(e),
	};
	match result {
		Ok(data) => {
			info!("loaded {url}");
			Some(data)
		}
		Err(e) => {
			warn!("could not load {url}: {e}");
			None
		}
	}
}

pub async fn load_products(url: &str) -> Option<Vec<ProductRecord>> {
	load_with(url, parse_products).await
}

pub async fn load_network(url: &str) -> Option<NetworkDataset> {
	load_with(url, parse_network).await
}

pub async fn load_scatter(url: &str) -> Option<Vec<ScatterPoint>> {
	load_with(url, parse_scatter).await
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn products_decode_from_array() {
		let text = r#"[{"id": 1, "grade": "a", "energy": 120},
			{"id": 2, "grade": "E", "sugars": "30.5"}]"#;
		let products = parse_products(text).unwrap();
		assert_eq!(products.len(), 2);
		assert_eq!(products[1].sugar, 30.5);
	}

	#[test]
	fn wrong_shape_is_a_decode_error() {
		let err = parse_products(r#"{"not": "an array"}"#).unwrap_err();
		assert!(matches!(err, DataError::Decode(_)));
	}

	#[test]
	fn empty_network_object() {
		let data = parse_network("{}").unwrap();
		assert!(data.nodes.is_empty());
		assert!(data.links.is_empty());
	}

	#[test]
	fn scatter_points_decode() {
		let points = parse_scatter(r#"[{"position": [0.5, 1.0], "nova": "1"}]"#).unwrap();
		assert_eq!(points[0].nova_group(), Some(1));
		assert!(points[0].nutriscore.is_none());
	}
}
