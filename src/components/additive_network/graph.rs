use std::collections::HashMap;

use crate::data::{BrandRecord, Grade, NetworkDataset};

use super::types::{AdditiveLink, AdditiveNode, BrandOption};

pub const MIN_RADIUS: f64 = 20.0;
pub const MAX_RADIUS: f64 = 55.0;
/// Domain top when no node reports a frequency.
const DEFAULT_MAX_FREQ: f64 = 5000.0;
const MAX_BRANDS: usize = 50;

/// Square-root scale from frequency to node radius.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RadiusScale {
	max_freq: f64,
}

impl Default for RadiusScale {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_FREQ)
	}
}

impl RadiusScale {
	pub fn new(max_freq: f64) -> Self {
		let max_freq = if max_freq > 0.0 { max_freq } else { DEFAULT_MAX_FREQ };
		Self { max_freq }
	}

	pub fn from_freqs(freqs: impl IntoIterator<Item = f64>) -> Self {
		Self::new(freqs.into_iter().fold(0.0, f64::max))
	}

	pub fn radius(&self, freq: f64) -> f64 {
		let t = (freq.max(0.0) / self.max_freq).sqrt();
		MIN_RADIUS + (MAX_RADIUS - MIN_RADIUS) * t
	}
}

/// Lowercase, whitespace runs to `-`, anything else outside `[a-z0-9-]`
/// dropped.
pub fn brand_slug(label: &str) -> String {
	let mut slug = String::with_capacity(label.len());
	let mut in_space = false;
	for c in label.to_lowercase().chars() {
		if c.is_whitespace() {
			if !in_space {
				slug.push('-');
			}
			in_space = true;
			continue;
		}
		in_space = false;
		if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
			slug.push(c);
		}
	}
	slug
}

/// The dataset's own brand list when it ships one, otherwise the 50 brands
/// carried by the most nodes.
pub fn available_brands(dataset: &NetworkDataset) -> Vec<BrandOption> {
	if let Some(brands) = &dataset.brands {
		return brands
			.iter()
			.map(|BrandRecord { id, label, count }| BrandOption {
				id: id.clone(),
				label: label.clone(),
				count: *count,
			})
			.collect();
	}

	let mut counts: HashMap<&str, usize> = HashMap::new();
	for brand in dataset.nodes.iter().flat_map(|n| &n.brands) {
		let brand = brand.as_str();
		if !brand.trim().is_empty() {
			*counts.entry(brand).or_default() += 1;
		}
	}
	let mut brands: Vec<BrandOption> = counts
		.into_iter()
		.map(|(label, count)| BrandOption {
			id: brand_slug(label),
			label: label.to_string(),
			count,
		})
		.collect();
	brands.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.label.cmp(&b.label)));
	brands.truncate(MAX_BRANDS);
	brands
}

/// Resolved nodes and links, optionally narrowed to one brand.
#[derive(Clone, Debug, Default)]
pub struct NetworkGraph {
	pub nodes: Vec<AdditiveNode>,
	pub links: Vec<AdditiveLink>,
	neighbors: Vec<Vec<usize>>,
	pub scale: RadiusScale,
}

impl NetworkGraph {
	/// `brand` is a brand label. Links whose endpoints are missing are dropped.
	pub fn build(dataset: &NetworkDataset, brand: Option<&str>) -> Self {
		let records: Vec<_> = dataset
			.nodes
			.iter()
			.filter(|n| brand.is_none_or(|b| n.brands.iter().any(|nb| nb == b)))
			.collect();
		let scale = RadiusScale::from_freqs(records.iter().map(|r| r.freq));

		let mut index = HashMap::new();
		let mut nodes = Vec::with_capacity(records.len());
		for record in records {
			if index.contains_key(record.id.as_str()) {
				continue;
			}
			index.insert(record.id.as_str(), nodes.len());
			nodes.push(AdditiveNode {
				radius: scale.radius(record.freq),
				grade: record.score.unwrap_or(Grade::C),
				boxes: record.box_plot_data.iter().filter_map(|b| b.complete()).collect(),
				record: record.clone(),
			});
		}

		let mut neighbors = vec![Vec::new(); nodes.len()];
		let links: Vec<AdditiveLink> = dataset
			.links
			.iter()
			.filter_map(|l| {
				let source = *index.get(l.source.as_str())?;
				let target = *index.get(l.target.as_str())?;
				(source != target).then_some(AdditiveLink {
					source,
					target,
					weight: l.effective_weight(),
				})
			})
			.collect();
		for link in &links {
			neighbors[link.source].push(link.target);
			neighbors[link.target].push(link.source);
		}

		Self {
			nodes,
			links,
			neighbors,
			scale,
		}
	}

	pub fn neighbors(&self, idx: usize) -> &[usize] {
		self.neighbors.get(idx).map_or(&[], Vec::as_slice)
	}

	pub fn degree(&self, idx: usize) -> usize {
		self.neighbors(idx).len()
	}

	pub fn index_of(&self, id: &str) -> Option<usize> {
		self.nodes.iter().position(|n| n.id() == id)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{AdditiveRecord, LinkRecord};

	fn node(id: &str, freq: f64, brands: &[&str]) -> AdditiveRecord {
		AdditiveRecord {
			id: id.into(),
			freq,
			brands: brands.iter().map(|b| b.to_string()).collect(),
			..Default::default()
		}
	}

	fn link(s: &str, t: &str, weight: f64) -> LinkRecord {
		LinkRecord {
			source: s.into(),
			target: t.into(),
			weight,
		}
	}

	fn dataset() -> NetworkDataset {
		NetworkDataset {
			nodes: vec![
				node("E250", 5000.0, &["Acme", "Fresh Co"]),
				node("E330", 1250.0, &["Acme"]),
				node("E412", 0.0, &["Fresh Co"]),
			],
			links: vec![
				link("E250", "E330", 4.0),
				link("E330", "E412", 0.0),
				link("E250", "E999", 2.0),
			],
			brands: None,
		}
	}

	#[test]
	fn radius_spans_twenty_to_fifty_five() {
		let scale = RadiusScale::new(5000.0);
		assert_eq!(scale.radius(5000.0), 55.0);
		assert_eq!(scale.radius(0.0), 20.0);
		assert!((scale.radius(1250.0) - 37.5).abs() < 1e-12);
		assert_eq!(RadiusScale::from_freqs([0.0, 0.0]), RadiusScale::new(5000.0));
	}

	#[test]
	fn dangling_links_are_dropped() {
		let graph = NetworkGraph::build(&dataset(), None);
		assert_eq!(graph.nodes.len(), 3);
		assert_eq!(graph.links.len(), 2);
		assert_eq!(graph.links[1].weight, 1.0);
		assert_eq!(graph.neighbors(1), &[0, 2]);
		assert_eq!(graph.nodes[0].radius, 55.0);
		assert_eq!(graph.nodes[2].grade, Grade::C);
	}

	#[test]
	fn brand_filter_keeps_matching_nodes() {
		let graph = NetworkGraph::build(&dataset(), Some("Fresh Co"));
		let ids: Vec<_> = graph.nodes.iter().map(|n| n.id()).collect();
		assert_eq!(ids, ["E250", "E412"]);
		assert!(graph.links.is_empty());
		assert_eq!(graph.degree(0), 0);
	}

	#[test]
	fn brands_fall_back_to_node_counts() {
		let brands = available_brands(&dataset());
		assert_eq!(brands[0].label, "Acme");
		assert_eq!(brands[0].count, 2);
		assert_eq!(brands[1].id, "fresh-co");
	}

	#[test]
	fn slug_strips_punctuation() {
		assert_eq!(brand_slug("Ben & Jerry's"), "ben--jerrys");
		assert_eq!(brand_slug("  Café  Noir "), "-caf-noir-");
	}
}
