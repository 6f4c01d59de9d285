//! Application configuration.
//!
//! Every value has a default matching the published story. An optional
//! `config.json` served next to the page can override any subset of them.

use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::data::load::fetch_text;
use crate::scroll::{DEFAULT_SEGMENTS, Segment};

pub const CONFIG_URL: &str = "config.json";

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AppConfig {
	#[serde(default)]
	pub data: DataConfig,
	#[serde(default)]
	pub morph: MorphConfig,
	#[serde(default)]
	pub network: NetworkConfig,
	#[serde(default)]
	pub zoom: ZoomConfig,
}

impl AppConfig {
	pub fn from_json_str(text: &str) -> serde_json::Result<Self> {
		serde_json::from_str(text)
	}
}

/// Falls back to defaults when the file is absent or unreadable.
pub async fn load_config(url: &str) -> AppConfig {
	let text = match fetch_text(url).await {
		Ok(text) => text,
		Err(e) => {
			info!("no config override at {url} ({e}), using defaults");
			return AppConfig::default();
		}
	};
	match AppConfig::from_json_str(&text) {
		Ok(config) => {
			info!("config loaded from {url}");
			config
		}
		Err(e) => {
			warn!("ignoring malformed {url}: {e}");
			AppConfig::default()
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DataConfig {
	#[serde(default = "default_products_url")]
	pub products_url: String,
	#[serde(default = "default_additives_url")]
	pub additives_url: String,
	#[serde(default = "default_scatter_url")]
	pub scatter_url: String,
}

fn default_products_url() -> String {
	"data/products.json".to_string()
}

fn default_additives_url() -> String {
	"data/additives.json".to_string()
}

fn default_scatter_url() -> String {
	"data/food_umap.json".to_string()
}

impl Default for DataConfig {
	fn default() -> Self {
		Self {
			products_url: default_products_url(),
			additives_url: default_additives_url(),
			scatter_url: default_scatter_url(),
		}
	}
}

/// Radial → Sankey → parallel-coordinates morph.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MorphConfig {
	/// Scroll slices, one per marker element.
	#[serde(default = "default_segments")]
	pub segments: Vec<Segment>,
	/// Story progress [0, 1] is stretched to [0, stages].
	#[serde(default = "default_stages")]
	pub stages: f64,
	#[serde(default = "default_max_products")]
	pub max_products: usize,
	/// Minimum vertical gap between products in the linear layout, in px.
	#[serde(default = "default_min_gap")]
	pub min_gap: f64,
	/// Logical drawing width; the canvas scales it to fit.
	#[serde(default = "default_canvas_width")]
	pub canvas_width: f64,
	#[serde(default = "default_complete_at")]
	pub complete_at: f64,
}

fn default_segments() -> Vec<Segment> {
	DEFAULT_SEGMENTS.to_vec()
}

fn default_stages() -> f64 {
	2.5
}

fn default_max_products() -> usize {
	80
}

fn default_min_gap() -> f64 {
	10.0
}

fn default_canvas_width() -> f64 {
	2000.0
}

fn default_complete_at() -> f64 {
	2.4
}

impl Default for MorphConfig {
	fn default() -> Self {
		Self {
			segments: default_segments(),
			stages: default_stages(),
			max_products: default_max_products(),
			min_gap: default_min_gap(),
			canvas_width: default_canvas_width(),
			complete_at: default_complete_at(),
		}
	}
}

/// Additive network simulation and level of detail.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NetworkConfig {
	/// Pin deadline for the first layout, in ms.
	#[serde(default = "default_initial_timeout")]
	pub initial_timeout_ms: u64,
	#[serde(default = "default_cluster_timeout")]
	pub cluster_timeout_ms: u64,
	#[serde(default = "default_grade_timeout")]
	pub grade_timeout_ms: u64,
	#[serde(default = "default_initial_decay")]
	pub initial_alpha_decay: f64,
	#[serde(default = "default_mode_decay")]
	pub mode_alpha_decay: f64,
	/// Scale above which nodes switch to detail/simplified forms.
	#[serde(default = "default_lod_threshold")]
	pub lod_threshold: f64,
	/// How many nodes nearest the viewport center get box-plot detail.
	#[serde(default = "default_detail_count")]
	pub detail_count: usize,
}

fn default_initial_timeout() -> u64 {
	3000
}

fn default_cluster_timeout() -> u64 {
	3000
}

fn default_grade_timeout() -> u64 {
	2000
}

fn default_initial_decay() -> f64 {
	0.1
}

fn default_mode_decay() -> f64 {
	0.05
}

fn default_lod_threshold() -> f64 {
	1.5
}

fn default_detail_count() -> usize {
	5
}

impl Default for NetworkConfig {
	fn default() -> Self {
		Self {
			initial_timeout_ms: default_initial_timeout(),
			cluster_timeout_ms: default_cluster_timeout(),
			grade_timeout_ms: default_grade_timeout(),
			initial_alpha_decay: default_initial_decay(),
			mode_alpha_decay: default_mode_decay(),
			lod_threshold: default_lod_threshold(),
			detail_count: default_detail_count(),
		}
	}
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ZoomConfig {
	#[serde(default = "default_max_scale")]
	pub max_scale: f64,
	/// Clicking a node zooms to at least this scale.
	#[serde(default = "default_min_click_zoom")]
	pub min_click_zoom: f64,
	/// ... or this multiple of the current scale, whichever is larger.
	#[serde(default = "default_click_zoom_factor")]
	pub click_zoom_factor: f64,
	#[serde(default = "default_transition_ms")]
	pub transition_ms: f64,
	#[serde(default)]
	pub panels: PanelLayout,
}

fn default_max_scale() -> f64 {
	8.0
}

fn default_min_click_zoom() -> f64 {
	5.0
}

fn default_click_zoom_factor() -> f64 {
	2.5
}

fn default_transition_ms() -> f64 {
	750.0
}

impl Default for ZoomConfig {
	fn default() -> Self {
		Self {
			max_scale: default_max_scale(),
			min_click_zoom: default_min_click_zoom(),
			click_zoom_factor: default_click_zoom_factor(),
			transition_ms: default_transition_ms(),
			panels: PanelLayout::default(),
		}
	}
}

/// Geometry of the two overlays flanking the network: a detail popup on the
/// left and an info panel on the right. Clicked nodes are centered in the gap.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PanelLayout {
	/// Right edge of the left popup, in container px.
	#[serde(default = "default_left_panel_end")]
	pub left_panel_end: f64,
	#[serde(default = "default_right_panel_max")]
	pub right_panel_max: f64,
	/// Right panel width as a fraction of the viewport, capped by `right_panel_max`.
	#[serde(default = "default_right_panel_fraction")]
	pub right_panel_fraction: f64,
	/// Below this viewport width the narrow panel rule applies.
	#[serde(default = "default_narrow_breakpoint")]
	pub narrow_breakpoint: f64,
	#[serde(default = "default_narrow_panel_max")]
	pub narrow_panel_max: f64,
	#[serde(default = "default_narrow_margin")]
	pub narrow_margin: f64,
}

fn default_left_panel_end() -> f64 {
	420.0
}

fn default_right_panel_max() -> f64 {
	400.0
}

fn default_right_panel_fraction() -> f64 {
	0.35
}

fn default_narrow_breakpoint() -> f64 {
	768.0
}

fn default_narrow_panel_max() -> f64 {
	320.0
}

fn default_narrow_margin() -> f64 {
	40.0
}

impl Default for PanelLayout {
	fn default() -> Self {
		Self {
			left_panel_end: default_left_panel_end(),
			right_panel_max: default_right_panel_max(),
			right_panel_fraction: default_right_panel_fraction(),
			narrow_breakpoint: default_narrow_breakpoint(),
			narrow_panel_max: default_narrow_panel_max(),
			narrow_margin: default_narrow_margin(),
		}
	}
}

impl PanelLayout {
	pub fn right_panel_width(&self, viewport_width: f64) -> f64 {
		if viewport_width < self.narrow_breakpoint {
			self.narrow_panel_max.min(viewport_width - self.narrow_margin)
		} else {
			self.right_panel_max
				.min(viewport_width * self.right_panel_fraction)
		}
	}

	/// Screen x halfway between the two panels.
	pub fn center_x(&self, container_width: f64, viewport_width: f64) -> f64 {
		let right_start = container_width - self.right_panel_width(viewport_width);
		(self.left_panel_end + right_start) / 2.0
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_object_is_all_defaults() {
		let config = AppConfig::from_json_str("{}").unwrap();
		assert_eq!(config, AppConfig::default());
		assert_eq!(config.morph.segments.len(), 5);
		assert_eq!(config.zoom.max_scale, 8.0);
	}

	#[test]
	fn partial_override_keeps_other_defaults() {
		let config = AppConfig::from_json_str(
			r#"{"network": {"detail_count": 3}, "zoom": {"panels": {"left_panel_end": 300}}}"#,
		)
		.unwrap();
		assert_eq!(config.network.detail_count, 3);
		assert_eq!(config.network.lod_threshold, 1.5);
		assert_eq!(config.zoom.panels.left_panel_end, 300.0);
		assert_eq!(config.zoom.panels.right_panel_max, 400.0);
	}

	#[test]
	fn panel_center() {
		let panels = PanelLayout::default();
		// wide: right panel is min(400, 0.35 * 1600) = 400
		assert_eq!(panels.center_x(1600.0, 1600.0), (420.0 + 1200.0) / 2.0);
		// medium: 0.35 * 1000 = 350
		assert!((panels.right_panel_width(1000.0) - 350.0).abs() < 1e-9);
		// narrow: min(320, 700 - 40)
		assert_eq!(panels.right_panel_width(700.0), 320.0);
	}
}
