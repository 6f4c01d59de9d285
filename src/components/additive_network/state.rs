use std::collections::HashSet;

use log::info;

use crate::config::{AppConfig, NetworkConfig, ZoomConfig};
use crate::data::NetworkDataset;
use crate::geometry::{Point, ease_cubic_out, lerp};
use crate::viewport::{Viewport, ZoomController, fit_scale};

use super::graph::{NetworkGraph, available_brands};
use super::hull::{ClusterHull, cluster_hulls};
use super::lod::LevelOfDetail;
use super::simulation::NetworkSimulation;
use super::types::{AdditiveLink, BrandOption, NodeForm, ViewMode};

/// Screen px a pointer may travel before a press on a node becomes a drag.
const CLICK_SLOP: f64 = 3.0;
/// Longest frame step fed to the simulation, in ms.
const MAX_FRAME_MS: f64 = 100.0;
const DIMMED_NODE_OPACITY: f64 = 0.15;
const LINK_OPACITY: f64 = 0.4;
const DIMMED_LINK_OPACITY: f64 = 0.05;
/// Approach rate of the hover highlight, per second.
const HIGHLIGHT_SPEED: f64 = 10.0;
const PANEL_PRODUCTS: usize = 20;
const PRODUCT_LABEL_MAX: usize = 50;
/// Shorter queries match nothing.
const SEARCH_MIN_CHARS: usize = 2;

pub const LINK_COLOR: &str = "#cbd5e1";
pub const LINK_HIGHLIGHT_COLOR: &str = "#f59e0b";

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<usize>,
	pub neighbors: HashSet<usize>,
	pub highlight_t: f64,
	pub prev_node: Option<usize>,
	pub prev_neighbors: HashSet<usize>,
}

#[derive(Clone, Copy, Debug)]
struct Drag {
	node: usize,
	start: Point,
	node_start: Point,
	moved: bool,
}

/// What a released pointer did, for the component to mirror into signals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PointerRelease {
	None,
	Dragged,
	Clicked(usize),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinkStroke {
	pub color: &'static str,
	pub opacity: f64,
	pub width: f64,
}

/// Side panel contents for the current selection.
#[derive(Clone, Debug, PartialEq)]
pub struct SelectionSummary {
	pub count: usize,
	/// Set when exactly one node is selected.
	pub primary: Option<usize>,
	pub names: Vec<String>,
	/// First products across the selection, deduplicated and shortened.
	pub products: Vec<String>,
	pub product_total: usize,
	/// Names of the primary node's neighbours.
	pub pairings: Vec<String>,
}

fn shorten(label: &str) -> String {
	if label.chars().count() > PRODUCT_LABEL_MAX {
		let head: String = label.chars().take(PRODUCT_LABEL_MAX - 3).collect();
		format!("{head}...")
	} else {
		label.to_string()
	}
}

pub struct NetworkState {
	dataset: NetworkDataset,
	pub graph: NetworkGraph,
	pub sim: NetworkSimulation,
	pub zoom: ZoomController,
	pub lod: LevelOfDetail,
	pub hover: HoverState,
	pub selection: Vec<usize>,
	pub popup: Option<usize>,
	mode: ViewMode,
	brands: Vec<BrandOption>,
	brand: Option<BrandOption>,
	drag: Option<Drag>,
	last_frame: Option<f64>,
	config: NetworkConfig,
	zoom_config: ZoomConfig,
	pub width: f64,
	pub height: f64,
}

impl NetworkState {
	pub fn new(dataset: NetworkDataset, config: &AppConfig, width: f64, height: f64, mode: ViewMode) -> Self {
		let viewport = Viewport { width, height };
		let graph = NetworkGraph::build(&dataset, None);
		let mut sim = NetworkSimulation::new(&graph, viewport, config.network.clone());
		sim.request_mode(mode);
		let min_scale = fit_scale(viewport, width, height);
		let zoom = ZoomController::new(viewport, viewport.center(), min_scale, config.zoom.max_scale);
		let brands = available_brands(&dataset);
		info!(
			"additive network ready: {} nodes, {} links, {} brands",
			graph.nodes.len(),
			graph.links.len(),
			brands.len()
		);
		Self {
			dataset,
			graph,
			sim,
			zoom,
			lod: LevelOfDetail::default(),
			hover: HoverState::default(),
			selection: Vec::new(),
			popup: None,
			mode,
			brands,
			brand: None,
			drag: None,
			last_frame: None,
			config: config.network.clone(),
			zoom_config: config.zoom.clone(),
			width,
			height,
		}
	}

	pub fn viewport(&self) -> Viewport {
		Viewport {
			width: self.width,
			height: self.height,
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
		let viewport = self.viewport();
		self.zoom.resize(viewport, viewport.center());
		self.sim.resize(viewport);
	}

	pub fn mode(&self) -> ViewMode {
		self.mode
	}

	pub fn set_mode(&mut self, mode: ViewMode) {
		if mode == self.mode {
			return;
		}
		self.mode = mode;
		self.sim.request_mode(mode);
	}

	pub fn brands(&self) -> &[BrandOption] {
		&self.brands
	}

	pub fn brand(&self) -> Option<&BrandOption> {
		self.brand.as_ref()
	}

	/// Narrows the network to nodes carrying the brand with id `brand_id`
	/// (`None` clears the filter) and lays it out again.
	pub fn set_brand(&mut self, brand_id: Option<&str>) -> bool {
		let next = brand_id.and_then(|id| self.brands.iter().find(|b| b.id == id).cloned());
		if next == self.brand {
			return false;
		}
		self.brand = next;
		self.graph = NetworkGraph::build(&self.dataset, self.brand.as_ref().map(|b| b.label.as_str()));
		self.sim.dispose();
		self.sim = NetworkSimulation::new(&self.graph, self.viewport(), self.config.clone());
		self.sim.request_mode(self.mode);
		self.selection.clear();
		self.popup = None;
		self.hover = HoverState::default();
		self.drag = None;
		self.lod = LevelOfDetail::default();
		info!(
			"brand filter {:?}: {} nodes",
			self.brand.as_ref().map(|b| b.label.as_str()),
			self.graph.nodes.len()
		);
		true
	}

	/// Topmost node under a screen point.
	pub fn node_at(&self, screen: Point) -> Option<usize> {
		let world = self.zoom.to_world(screen);
		(0..self.graph.nodes.len()).rev().find(|&i| {
			self.sim
				.position(i)
				.is_some_and(|p| p.distance(world) <= self.graph.nodes[i].radius)
		})
	}

	pub fn set_hover(&mut self, node: Option<usize>) -> bool {
		if self.hover.node == node {
			return false;
		}
		if self.hover.node.is_some() && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		}
		self.hover.node = node;
		self.hover.neighbors.clear();
		if let Some(idx) = node {
			self.hover.neighbors.extend(self.graph.neighbors(idx).iter().copied());
		}
		true
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn is_highlighted(&self, idx: usize) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	fn hovered(&self) -> Option<usize> {
		self.hover.node.or(self.hover.prev_node)
	}

	pub fn node_opacity(&self, idx: usize) -> f64 {
		if !self.has_active_highlight() || self.is_highlighted(idx) {
			return 1.0;
		}
		lerp(1.0, DIMMED_NODE_OPACITY, ease_cubic_out(self.hover.highlight_t))
	}

	pub fn link_stroke(&self, link: &AdditiveLink) -> LinkStroke {
		let t = ease_cubic_out(self.hover.highlight_t);
		let base_width = link.weight.sqrt() * 0.5;
		let incident = self
			.hovered()
			.is_some_and(|h| link.source == h || link.target == h);
		let lod = self.lod.edge_opacity();
		if incident {
			LinkStroke {
				color: LINK_HIGHLIGHT_COLOR,
				opacity: lerp(LINK_OPACITY, 1.0, t) * lod,
				width: lerp(base_width, 2.0, t),
			}
		} else {
			let opacity = if self.has_active_highlight() {
				lerp(LINK_OPACITY, DIMMED_LINK_OPACITY, t)
			} else {
				LINK_OPACITY
			};
			LinkStroke {
				color: LINK_COLOR,
				opacity: opacity * lod,
				width: base_width,
			}
		}
	}

	/// Form a node is drawn in. The node open in the popup keeps its macro
	/// circle instead of a duplicate box plot.
	pub fn form(&self, idx: usize) -> NodeForm {
		match self.lod.form(idx) {
			NodeForm::Micro if self.popup == Some(idx) => NodeForm::Macro,
			form => form,
		}
	}

	pub fn hulls(&self) -> Vec<ClusterHull> {
		if self.mode != ViewMode::Cluster {
			return Vec::new();
		}
		let groups: Vec<_> = self.graph.nodes.iter().map(|n| n.record.group).collect();
		cluster_hulls(&groups, &self.sim.positions())
	}

	pub fn pointer_down(&mut self, screen: Point) {
		match self.node_at(screen) {
			Some(node) => {
				self.drag = Some(Drag {
					node,
					start: screen,
					node_start: self.sim.position(node).unwrap_or_default(),
					moved: false,
				});
			}
			None => self.zoom.begin_pan(screen),
		}
	}

	/// Drags, pans or updates hover. Returns whether the hovered node changed.
	pub fn pointer_move(&mut self, screen: Point) -> bool {
		if let Some(drag) = self.drag.as_mut() {
			if !drag.moved && screen.distance(drag.start) <= CLICK_SLOP {
				return false;
			}
			drag.moved = true;
			let k = self.zoom.transform().k;
			let world = Point::new(
				drag.node_start.x + (screen.x - drag.start.x) / k,
				drag.node_start.y + (screen.y - drag.start.y) / k,
			);
			let node = drag.node;
			self.sim.drag_to(node, world);
			return false;
		}
		if self.zoom.is_panning() {
			self.zoom.pan_to(screen);
			return false;
		}
		let hit = self.node_at(screen);
		self.set_hover(hit)
	}

	/// `toggle` is a Ctrl/Meta click.
	pub fn pointer_up(&mut self, toggle: bool, now_ms: f64, viewport_width: f64) -> PointerRelease {
		self.zoom.end_pan();
		match self.drag.take() {
			Some(drag) if drag.moved => PointerRelease::Dragged,
			Some(drag) => {
				self.click(drag.node, toggle, now_ms, viewport_width);
				PointerRelease::Clicked(drag.node)
			}
			None => PointerRelease::None,
		}
	}

	pub fn pointer_leave(&mut self) -> bool {
		self.drag = None;
		self.zoom.end_pan();
		self.set_hover(None)
	}

	/// Plain click selects, opens the popup and flies to the node; a toggle
	/// click adds or removes the node from the selection in place.
	pub fn click(&mut self, idx: usize, toggle: bool, now_ms: f64, viewport_width: f64) {
		if idx >= self.graph.nodes.len() {
			return;
		}
		if toggle {
			match self.selection.iter().position(|&s| s == idx) {
				Some(pos) => {
					self.selection.remove(pos);
				}
				None => self.selection.push(idx),
			}
			return;
		}
		self.selection = vec![idx];
		self.popup = Some(idx);
		if let Some(p) = self.sim.position(idx) {
			self.zoom.center_on(p, &self.zoom_config, viewport_width, now_ms);
		}
	}

	/// Nodes whose id or name contains `query`, ignoring case, in graph order.
	pub fn search(&self, query: &str) -> Vec<usize> {
		if query.chars().count() < SEARCH_MIN_CHARS {
			return Vec::new();
		}
		let needle = query.to_lowercase();
		self.graph
			.nodes
			.iter()
			.enumerate()
			.filter(|(_, n)| n.id().to_lowercase().contains(&needle) || n.name().to_lowercase().contains(&needle))
			.map(|(i, _)| i)
			.collect()
	}

	pub fn close_selection(&mut self) {
		self.selection.clear();
		self.popup = None;
	}

	pub fn close_popup(&mut self) {
		self.popup = None;
	}

	pub fn reset_view(&mut self, now_ms: f64) {
		self.zoom.reset(now_ms, self.zoom_config.transition_ms);
	}

	pub fn wheel(&mut self, screen: Point, delta_y: f64) -> bool {
		self.zoom.wheel(screen, delta_y)
	}

	/// One animation frame: steps the simulation, any zoom transition and the
	/// hover fade, then recomputes level of detail if the view or layout
	/// moved.
	pub fn frame(&mut self, now_ms: f64) {
		let dt_ms = self
			.last_frame
			.map_or(0.0, |last| (now_ms - last).clamp(0.0, MAX_FRAME_MS));
		self.last_frame = Some(now_ms);

		let moved = self.sim.tick(dt_ms);
		self.zoom.advance(now_ms);
		self.step_highlight(dt_ms / 1000.0);

		if self.zoom.take_dirty() || moved {
			let next = LevelOfDetail::compute(
				&self.sim.positions(),
				&self.zoom.transform(),
				self.viewport(),
				&self.config,
			);
			self.lod.update(next);
		}
	}

	fn step_highlight(&mut self, dt_s: f64) {
		let target = if self.hover.node.is_some() { 1.0 } else { 0.0 };
		let step = (HIGHLIGHT_SPEED * dt_s).min(1.0);
		self.hover.highlight_t += (target - self.hover.highlight_t) * step;
		if self.hover.node.is_none() && self.hover.highlight_t < 0.01 {
			self.hover.highlight_t = 0.0;
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}
	}

	pub fn selection_summary(&self) -> Option<SelectionSummary> {
		if self.selection.is_empty() {
			return None;
		}
		let nodes: Vec<_> = self.selection.iter().filter_map(|&i| self.graph.nodes.get(i)).collect();
		let mut seen = HashSet::new();
		let unique: Vec<&String> = nodes
			.iter()
			.flat_map(|n| &n.record.products)
			.filter(|p| seen.insert(p.as_str()))
			.collect();
		let primary = (self.selection.len() == 1).then(|| self.selection[0]);
		let pairings = primary
			.map(|p| {
				self.graph
					.neighbors(p)
					.iter()
					.filter_map(|&n| self.graph.nodes.get(n))
					.map(|n| n.name().to_string())
					.collect()
			})
			.unwrap_or_default();
		Some(SelectionSummary {
			count: self.selection.len(),
			primary,
			names: nodes.iter().map(|n| n.name().to_string()).collect(),
			products: unique.iter().take(PANEL_PRODUCTS).map(|p| shorten(p)).collect(),
			product_total: unique.len(),
			pairings,
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{AdditiveRecord, LinkRecord};

	fn dataset() -> NetworkDataset {
		let nodes = (0..8)
			.map(|i| AdditiveRecord {
				id: format!("E{}", 200 + i),
				name: format!("Additive {i}"),
				freq: 100.0 * (i + 1) as f64,
				products: vec![format!("Product {}", i % 3), "Shared product".into()],
				brands: if i < 3 { vec!["Acme".into()] } else { vec!["Other".into()] },
				..Default::default()
			})
			.collect();
		let links = (1..8)
			.map(|i| LinkRecord {
				source: "E200".into(),
				target: format!("E{}", 200 + i),
				weight: 2.0,
			})
			.collect();
		NetworkDataset {
			nodes,
			links,
			brands: None,
		}
	}

	fn state() -> NetworkState {
		NetworkState::new(dataset(), &AppConfig::default(), 1600.0, 900.0, ViewMode::Cluster)
	}

	fn settle(s: &mut NetworkState) {
		let mut now = 0.0;
		while s.sim.is_settling() && now < 60_000.0 {
			now += 16.0;
			s.frame(now);
		}
	}

	fn screen_of(s: &NetworkState, idx: usize) -> Point {
		s.zoom.to_screen(s.sim.position(idx).unwrap())
	}

	#[test]
	fn starts_at_fit_scale() {
		let s = state();
		assert!((s.zoom.transform().k - 0.95).abs() < 1e-12);
		assert_eq!(s.mode(), ViewMode::Cluster);
	}

	#[test]
	fn click_selects_and_zooms_in() {
		let mut s = state();
		settle(&mut s);
		let before = s.zoom.transform().k;
		let at = screen_of(&s, 3);
		s.pointer_down(at);
		assert_eq!(s.pointer_up(false, 0.0, 1600.0), PointerRelease::Clicked(3));
		assert_eq!(s.selection, vec![3]);
		assert_eq!(s.popup, Some(3));
		assert!(s.zoom.is_animating());
		s.frame(100_000.0);
		assert!(s.zoom.transform().k > before);
	}

	#[test]
	fn toggle_click_keeps_view() {
		let mut s = state();
		settle(&mut s);
		let before = s.zoom.transform();
		s.click(1, true, 0.0, 1600.0);
		s.click(2, true, 0.0, 1600.0);
		s.click(1, true, 0.0, 1600.0);
		assert_eq!(s.selection, vec![2]);
		assert_eq!(s.popup, None);
		assert_eq!(s.zoom.transform(), before);
	}

	#[test]
	fn dragging_pins_the_node() {
		let mut s = state();
		settle(&mut s);
		let at = screen_of(&s, 4);
		s.pointer_down(at);
		s.pointer_move(Point::new(at.x + 1.0, at.y));
		s.pointer_move(Point::new(at.x + 95.0, at.y));
		assert_eq!(s.pointer_up(false, 0.0, 1600.0), PointerRelease::Dragged);
		assert!(s.selection.is_empty());
		let moved = s.sim.position(4).unwrap();
		assert!((screen_of(&s, 4).x - (at.x + 95.0)).abs() < 1e-6);
		assert_eq!(s.sim.pin_of(4), Some(moved));
	}

	#[test]
	fn background_drag_pans() {
		let mut s = state();
		settle(&mut s);
		let empty = Point::new(5.0, 5.0);
		assert!(s.node_at(empty).is_none());
		let before = s.zoom.transform();
		s.pointer_down(empty);
		s.pointer_move(Point::new(45.0, 25.0));
		s.pointer_up(false, 0.0, 1600.0);
		assert_eq!(s.zoom.transform().x, before.x + 40.0);
		assert_eq!(s.zoom.transform().y, before.y + 20.0);
	}

	#[test]
	fn hover_dims_unrelated_nodes() {
		let mut s = state();
		settle(&mut s);
		// hub 0 touches every node, so hover a leaf instead
		let leaf = 5;
		assert!(s.set_hover(Some(leaf)));
		for t in 1..=20 {
			s.frame(100_000.0 + t as f64 * 16.0);
		}
		assert_eq!(s.node_opacity(leaf), 1.0);
		assert_eq!(s.node_opacity(0), 1.0);
		assert!((s.node_opacity(2) - DIMMED_NODE_OPACITY).abs() < 0.05);

		let incident = s.graph.links.iter().find(|l| l.target == leaf).copied().unwrap();
		let other = s.graph.links.iter().find(|l| l.target == 2).copied().unwrap();
		assert_eq!(s.link_stroke(&incident).color, LINK_HIGHLIGHT_COLOR);
		assert_eq!(s.link_stroke(&other).color, LINK_COLOR);
		assert!(s.link_stroke(&other).opacity < 0.1);
	}

	#[test]
	fn zooming_in_switches_forms() {
		let mut s = state();
		settle(&mut s);
		assert!((0..8).all(|i| s.form(i) == NodeForm::Macro));
		s.zoom.set_transform(crate::viewport::ViewTransform::scaled(3.0));
		s.frame(200_000.0);
		let micro = (0..8).filter(|&i| s.form(i) == NodeForm::Micro).count();
		assert_eq!(micro, 5);
		assert_eq!((0..8).filter(|&i| s.form(i) == NodeForm::Simplified).count(), 3);
		assert_eq!(s.link_stroke(&s.graph.links[0]).opacity, LINK_OPACITY * 0.05);
	}

	#[test]
	fn brand_filter_rebuilds_network() {
		let mut s = state();
		assert_eq!(s.brands()[0].label, "Other");
		assert!(s.set_brand(Some("acme")));
		assert_eq!(s.graph.nodes.len(), 3);
		assert_eq!(s.graph.links.len(), 2);
		assert!(!s.set_brand(Some("acme")));
		assert!(s.set_brand(None));
		assert_eq!(s.graph.nodes.len(), 8);
	}

	#[test]
	fn summary_merges_products() {
		let mut s = state();
		s.click(0, true, 0.0, 1600.0);
		s.click(1, true, 0.0, 1600.0);
		let summary = s.selection_summary().unwrap();
		assert_eq!(summary.count, 2);
		assert_eq!(summary.primary, None);
		assert_eq!(summary.products, ["Product 0", "Shared product", "Product 1"]);
		assert!(summary.pairings.is_empty());

		s.close_selection();
		s.click(0, true, 0.0, 1600.0);
		let summary = s.selection_summary().unwrap();
		assert_eq!(summary.primary, Some(0));
		assert_eq!(summary.pairings.len(), 7);
	}

	#[test]
	fn search_matches_id_or_name() {
		let s = state();
		assert!(s.search("").is_empty());
		assert!(s.search("e").is_empty());
		assert_eq!(s.search("e203"), vec![3]);
		assert_eq!(s.search("ADDITIVE 5"), vec![5]);
		assert_eq!(s.search("e20").len(), 8);
		assert!(s.search("xyz").is_empty());
	}

	#[test]
	fn search_pick_flies_to_the_node() {
		let mut s = state();
		settle(&mut s);
		let before = s.zoom.transform().k;
		let hit = s.search("additive 6")[0];
		s.click(hit, false, 0.0, 1600.0);
		assert_eq!(s.selection, vec![6]);
		assert_eq!(s.popup, Some(6));
		s.frame(100_000.0);
		assert!(s.zoom.transform().k > before);
		let target = s.zoom_config.panels.center_x(1600.0, 1600.0);
		assert!((screen_of(&s, 6).x - target).abs() < 1e-6);
	}

	#[test]
	fn search_follows_brand_filter() {
		let mut s = state();
		assert!(s.set_brand(Some("acme")));
		assert_eq!(s.search("additive"), vec![0, 1, 2]);
	}

	#[test]
	fn long_product_names_are_shortened() {
		let long = "x".repeat(60);
		assert_eq!(shorten(&long).chars().count(), 50);
		assert!(shorten(&long).ends_with("..."));
		assert_eq!(shorten("Soup"), "Soup");
	}
}
