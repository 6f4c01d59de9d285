//! Force layout for the additive network.
//!
//! Charge repulsion and the base spring run on `force_graph`; link distances,
//! collision, cluster/grade positioning and bounds are applied on top as
//! velocity forces. Everything is scaled by a cooling `alpha`. Once the layout
//! cools (or its deadline passes) every node is pinned where it stands.

use std::f64::consts::PI;

use force_graph::{EdgeData, ForceGraph, NodeData, SimulationParameters};
use log::{debug, info};

use crate::config::NetworkConfig;
use crate::data::{ClusterGroup, Grade};
use crate::geometry::Point;
use crate::viewport::Viewport;

use super::forces::{self, Body, Bounds, Spring};
use super::graph::NetworkGraph;
use super::types::ViewMode;

pub const ALPHA_MIN: f64 = 0.001;
/// Distance kept from the canvas edge.
const EDGE_PADDING: f64 = 50.0;
/// Extra vertical room for the zone labels.
const LABEL_BAND: f64 = 60.0;
const CLUSTER_SPREAD: f64 = 0.35;

/// Force set in effect.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Layout {
	/// First layout after load, before a mode is applied.
	Initial,
	Cluster,
	Grade,
}

impl From<ViewMode> for Layout {
	fn from(mode: ViewMode) -> Self {
		match mode {
			ViewMode::Cluster => Layout::Cluster,
			ViewMode::Grade => Layout::Grade,
		}
	}
}

impl Layout {
	fn charge(self) -> f64 {
		match self {
			Layout::Cluster => -800.0,
			Layout::Initial | Layout::Grade => -300.0,
		}
	}

	fn collide_padding(self) -> f64 {
		match self {
			Layout::Cluster => 25.0,
			Layout::Initial | Layout::Grade => 10.0,
		}
	}

	/// Rest distance and strength of a link.
	fn link(self, weight: f64, same_cluster: bool) -> (f64, f64) {
		let w = weight.sqrt();
		match self {
			Layout::Initial => (100.0 + w * 10.0, 0.5),
			Layout::Cluster if same_cluster => (40.0 + w * 6.0, 0.8),
			Layout::Cluster => (120.0 + w * 15.0, 0.15),
			Layout::Grade => (100.0 + w * 10.0, 0.3),
		}
	}

	fn timeout_ms(self, config: &NetworkConfig) -> f64 {
		match self {
			Layout::Initial => config.initial_timeout_ms as f64,
			Layout::Cluster => config.cluster_timeout_ms as f64,
			Layout::Grade => config.grade_timeout_ms as f64,
		}
	}

	fn alpha_decay(self, config: &NetworkConfig) -> f64 {
		match self {
			Layout::Initial => config.initial_alpha_decay,
			Layout::Cluster | Layout::Grade => config.mode_alpha_decay,
		}
	}
}

/// Horizontal band of the grade columns.
pub fn grade_zone(grade: Grade, width: f64) -> (f64, f64) {
	let zone = width / 5.0;
	let left = -width / 2.0 + zone * grade.index() as f64;
	(left, left + zone)
}

pub fn grade_center(grade: Grade, width: f64) -> f64 {
	let (left, right) = grade_zone(grade, width);
	(left + right) / 2.0
}

pub fn cluster_target(group: ClusterGroup, extent: Viewport) -> Point {
	let (ax, ay) = group.anchor();
	Point::new(ax * extent.width * CLUSTER_SPREAD, ay * extent.height * CLUSTER_SPREAD)
}

/// Vertical band free of the zone labels.
fn vertical_bounds(extent: Viewport) -> (f64, f64) {
	let half = extent.height / 2.0 - EDGE_PADDING - LABEL_BAND;
	(-half, half)
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Phase {
	Settling { alpha: f64, elapsed_ms: f64 },
	Pinned,
	Disposed,
}

struct NodeInfo {
	group: ClusterGroup,
	grade: Grade,
}

struct LinkInfo {
	source: usize,
	target: usize,
	weight: f64,
}

pub struct NetworkSimulation {
	graph: ForceGraph<usize, ()>,
	bodies: Vec<Body>,
	nodes: Vec<NodeInfo>,
	links: Vec<LinkInfo>,
	springs: Vec<Spring>,
	layout: Layout,
	/// Mode to switch to once the initial layout has pinned.
	queued: Option<ViewMode>,
	phase: Phase,
	extent: Viewport,
	config: NetworkConfig,
}

/// Sunflower spiral, the usual seed for a force layout.
fn phyllotaxis(i: usize) -> Point {
	let radius = 10.0 * (0.5 + i as f64).sqrt();
	let angle = i as f64 * PI * (3.0 - 5f64.sqrt());
	Point::new(radius * angle.cos(), radius * angle.sin())
}

fn base_graph(layout: Layout, bodies: &[Body], links: &[LinkInfo]) -> ForceGraph<usize, ()> {
	let mut graph = ForceGraph::new(SimulationParameters {
		force_charge: (layout.charge().abs() * 0.5) as f32,
		force_spring: 0.05,
		force_max: 100.0,
		node_speed: 3000.0,
		damping_factor: 0.9,
	});
	let indices: Vec<_> = bodies
		.iter()
		.enumerate()
		.map(|(i, b)| {
			graph.add_node(NodeData {
				x: b.x as f32,
				y: b.y as f32,
				mass: 10.0,
				is_anchor: b.pin.is_some(),
				user_data: i,
			})
		})
		.collect();
	for link in links {
		graph.add_edge(indices[link.source], indices[link.target], EdgeData::default());
	}
	graph
}

impl NetworkSimulation {
	/// Starts settling the initial layout, centered on the origin.
	pub fn new(network: &NetworkGraph, extent: Viewport, config: NetworkConfig) -> Self {
		let bodies: Vec<Body> = network
			.nodes
			.iter()
			.enumerate()
			.map(|(i, n)| Body::at(phyllotaxis(i), n.radius))
			.collect();
		let nodes = network
			.nodes
			.iter()
			.map(|n| NodeInfo {
				group: n.record.group,
				grade: n.grade,
			})
			.collect();
		let links: Vec<LinkInfo> = network
			.links
			.iter()
			.map(|l| LinkInfo {
				source: l.source,
				target: l.target,
				weight: l.weight,
			})
			.collect();
		let layout = Layout::Initial;
		let mut sim = Self {
			graph: base_graph(layout, &bodies, &links),
			bodies,
			nodes,
			links,
			springs: Vec::new(),
			layout,
			queued: None,
			phase: Phase::Settling {
				alpha: 1.0,
				elapsed_ms: 0.0,
			},
			extent,
			config,
		};
		sim.springs = sim.build_springs();
		info!(
			"network simulation started: {} nodes, {} links",
			sim.bodies.len(),
			sim.links.len()
		);
		sim
	}

	fn build_springs(&self) -> Vec<Spring> {
		forces::springs(
			self.bodies.len(),
			self.links.iter().map(|l| {
				let same = self.nodes[l.source].group == self.nodes[l.target].group;
				let (distance, strength) = self.layout.link(l.weight, same);
				(l.source, l.target, distance, strength)
			}),
		)
	}

	pub fn phase(&self) -> Phase {
		self.phase
	}

	pub fn layout(&self) -> Layout {
		self.layout
	}

	pub fn is_settling(&self) -> bool {
		matches!(self.phase, Phase::Settling { .. })
	}

	pub fn len(&self) -> usize {
		self.bodies.len()
	}

	pub fn is_empty(&self) -> bool {
		self.bodies.is_empty()
	}

	pub fn position(&self, idx: usize) -> Option<Point> {
		self.bodies.get(idx).map(Body::position)
	}

	pub fn positions(&self) -> Vec<Point> {
		self.bodies.iter().map(Body::position).collect()
	}

	pub fn pin_of(&self, idx: usize) -> Option<Point> {
		self.bodies.get(idx)?.pin
	}

	pub fn extent(&self) -> Viewport {
		self.extent
	}

	/// Targets and bounds follow the new extent from the next tick on.
	pub fn resize(&mut self, extent: Viewport) {
		self.extent = extent;
	}

	/// Like `set_mode`, but lets a still-settling initial layout finish first.
	pub fn request_mode(&mut self, mode: ViewMode) {
		if self.layout == Layout::Initial && self.is_settling() {
			self.queued = Some(mode);
		} else {
			self.set_mode(mode);
		}
	}

	/// Releases every pin and reheats the layout under the new force set.
	pub fn set_mode(&mut self, mode: ViewMode) {
		if self.phase == Phase::Disposed {
			return;
		}
		self.queued = None;
		self.layout = mode.into();
		for b in &mut self.bodies {
			b.pin = None;
			b.vx = 0.0;
			b.vy = 0.0;
		}
		self.springs = self.build_springs();
		self.graph = base_graph(self.layout, &self.bodies, &self.links);
		self.phase = Phase::Settling {
			alpha: 1.0,
			elapsed_ms: 0.0,
		};
		info!("network layout switched to {:?}", self.layout);
	}

	fn bounds(&self, idx: usize) -> Bounds {
		let (min_y, max_y) = vertical_bounds(self.extent);
		let (min_x, max_x) = match self.layout {
			Layout::Grade => {
				let (left, right) = grade_zone(self.nodes[idx].grade, self.extent.width);
				(left + EDGE_PADDING, right - EDGE_PADDING)
			}
			Layout::Initial | Layout::Cluster => (
				-self.extent.width / 2.0 + EDGE_PADDING,
				self.extent.width / 2.0 - EDGE_PADDING,
			),
		};
		Bounds {
			min_x,
			max_x,
			min_y,
			max_y,
		}
	}

	fn run_base_physics(&mut self, dt_s: f64) {
		let bodies = &self.bodies;
		self.graph.visit_nodes_mut(|node| {
			let b = &bodies[node.data.user_data];
			node.data.x = b.x as f32;
			node.data.y = b.y as f32;
			node.data.is_anchor = b.pin.is_some();
		});
		self.graph.update(dt_s as f32);
		let bodies = &mut self.bodies;
		self.graph.visit_nodes(|node| {
			let b = &mut bodies[node.data.user_data];
			let (x, y) = (node.x() as f64, node.y() as f64);
			if b.pin.is_none() && x.is_finite() && y.is_finite() {
				b.x = x;
				b.y = y;
			}
		});
	}

	fn apply_mode_forces(&mut self, alpha: f64) {
		let extent = self.extent;
		match self.layout {
			Layout::Initial => {}
			Layout::Cluster => {
				let targets: Vec<Point> = self
					.nodes
					.iter()
					.map(|n| cluster_target(n.group, extent))
					.collect();
				forces::apply_position_x(&mut self.bodies, |i| targets[i].x, 0.9, alpha);
				forces::apply_position_y(&mut self.bodies, |i| targets[i].y, 0.9, alpha);
			}
			Layout::Grade => {
				let columns: Vec<f64> = self
					.nodes
					.iter()
					.map(|n| grade_center(n.grade, extent.width))
					.collect();
				forces::apply_position_x(&mut self.bodies, |i| columns[i], 0.8, alpha);
				forces::apply_position_y(&mut self.bodies, |_| 0.0, 0.3, alpha);
			}
		}
	}

	/// Advances by `dt_ms`. Returns whether anything moved.
	pub fn tick(&mut self, dt_ms: f64) -> bool {
		let Phase::Settling { alpha, elapsed_ms } = self.phase else {
			return false;
		};
		let alpha = alpha * (1.0 - self.layout.alpha_decay(&self.config));
		let elapsed_ms = elapsed_ms + dt_ms.max(0.0);

		self.run_base_physics(dt_ms.max(0.0) / 1000.0 * alpha);
		forces::apply_springs(&mut self.bodies, &self.springs, alpha);
		forces::apply_collide(&mut self.bodies, self.layout.collide_padding(), 1.0);
		self.apply_mode_forces(alpha);
		forces::integrate(&mut self.bodies);
		for i in 0..self.bodies.len() {
			if self.bodies[i].pin.is_some() {
				continue;
			}
			let bounds = self.bounds(i);
			let b = &mut self.bodies[i];
			let p = bounds.clamp(b.position(), b.radius);
			b.x = p.x;
			b.y = p.y;
		}

		if alpha < ALPHA_MIN || elapsed_ms >= self.layout.timeout_ms(&self.config) {
			self.pin();
			if let Some(mode) = self.queued.take() {
				self.set_mode(mode);
			}
		} else {
			self.phase = Phase::Settling { alpha, elapsed_ms };
		}
		true
	}

	/// Freezes every node at its current position.
	pub fn pin(&mut self) {
		if self.phase == Phase::Disposed {
			return;
		}
		for b in &mut self.bodies {
			b.pin = Some(b.position());
			b.vx = 0.0;
			b.vy = 0.0;
		}
		self.graph.visit_nodes_mut(|node| node.data.is_anchor = true);
		self.phase = Phase::Pinned;
		info!("network layout pinned ({:?})", self.layout);
	}

	/// Moves a node and pins it there.
	pub fn drag_to(&mut self, idx: usize, world: Point) {
		let Some(b) = self.bodies.get_mut(idx) else {
			return;
		};
		b.x = world.x;
		b.y = world.y;
		b.vx = 0.0;
		b.vy = 0.0;
		b.pin = Some(world);
		self.graph.visit_nodes_mut(|node| {
			if node.data.user_data == idx {
				node.data.x = world.x as f32;
				node.data.y = world.y as f32;
				node.data.is_anchor = true;
			}
		});
	}

	/// Stops the simulation for good.
	pub fn dispose(&mut self) {
		if self.phase != Phase::Disposed {
			self.phase = Phase::Disposed;
			debug!("network simulation disposed");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::{AdditiveRecord, LinkRecord, NetworkDataset};

	fn network() -> NetworkGraph {
		let groups = ["GENERAL", "MEAT", "TEXTURE", "COLORS", "SWEETENERS"];
		let nodes = (0..12)
			.map(|i| AdditiveRecord {
				id: format!("E{}", 100 + i),
				group: ClusterGroup::from_key(groups[i % 5]),
				score: Some(Grade::ALL[i % 5]),
				freq: (i * 300) as f64,
				..Default::default()
			})
			.collect();
		let links = (1..12)
			.map(|i| LinkRecord {
				source: format!("E{}", 100 + i),
				target: format!("E{}", 100 + i / 2),
				weight: i as f64,
			})
			.collect();
		NetworkGraph::build(
			&NetworkDataset {
				nodes,
				links,
				brands: None,
			},
			None,
		)
	}

	fn extent() -> Viewport {
		Viewport {
			width: 1600.0,
			height: 900.0,
		}
	}

	fn settle(sim: &mut NetworkSimulation) -> usize {
		let mut ticks = 0;
		while sim.is_settling() && ticks < 10_000 {
			sim.tick(16.0);
			ticks += 1;
		}
		ticks
	}

	#[test]
	fn starts_on_a_spiral() {
		let sim = NetworkSimulation::new(&network(), extent(), NetworkConfig::default());
		assert_eq!(sim.len(), 12);
		assert_eq!(sim.position(0), Some(phyllotaxis(0)));
		assert!(sim.is_settling());
	}

	#[test]
	fn settled_layout_is_pinned_in_place() {
		let mut sim = NetworkSimulation::new(&network(), extent(), NetworkConfig::default());
		sim.set_mode(ViewMode::Cluster);
		settle(&mut sim);
		assert_eq!(sim.phase(), Phase::Pinned);
		for i in 0..sim.len() {
			assert_eq!(sim.pin_of(i), sim.position(i));
		}

		let before = sim.positions();
		assert!(!sim.tick(16.0));
		assert_eq!(sim.positions(), before);
	}

	#[test]
	fn deadline_pins_before_cooling() {
		let mut sim = NetworkSimulation::new(&network(), extent(), NetworkConfig::default());
		sim.set_mode(ViewMode::Grade);
		sim.tick(1000.0);
		assert!(sim.is_settling());
		sim.tick(1000.0);
		assert_eq!(sim.phase(), Phase::Pinned);
	}

	#[test]
	fn mode_switch_releases_pins() {
		let mut sim = NetworkSimulation::new(&network(), extent(), NetworkConfig::default());
		settle(&mut sim);
		assert!(sim.pin_of(3).is_some());
		sim.set_mode(ViewMode::Grade);
		assert_eq!(sim.layout(), Layout::Grade);
		assert_eq!(
			sim.phase(),
			Phase::Settling {
				alpha: 1.0,
				elapsed_ms: 0.0
			}
		);
		assert!((0..sim.len()).all(|i| sim.pin_of(i).is_none()));
	}

	#[test]
	fn grade_mode_keeps_nodes_in_their_column() {
		let net = network();
		let mut sim = NetworkSimulation::new(&net, extent(), NetworkConfig::default());
		sim.set_mode(ViewMode::Grade);
		settle(&mut sim);
		let (min_y, max_y) = vertical_bounds(extent());
		for (i, node) in net.nodes.iter().enumerate() {
			let p = sim.position(i).unwrap();
			let (left, right) = grade_zone(node.grade, 1600.0);
			assert!(p.x >= left + EDGE_PADDING + node.radius - 1e-9, "{} left of its zone", node.id());
			assert!(p.x <= right - EDGE_PADDING - node.radius + 1e-9, "{} right of its zone", node.id());
			assert!(p.y >= min_y + node.radius - 1e-9 && p.y <= max_y - node.radius + 1e-9);
		}
	}

	#[test]
	fn dragged_node_stays_put() {
		let mut sim = NetworkSimulation::new(&network(), extent(), NetworkConfig::default());
		let target = Point::new(120.0, -40.0);
		sim.drag_to(2, target);
		for _ in 0..5 {
			sim.tick(16.0);
		}
		assert_eq!(sim.position(2), Some(target));
	}

	#[test]
	fn requested_mode_waits_for_initial_layout() {
		let mut sim = NetworkSimulation::new(&network(), extent(), NetworkConfig::default());
		sim.request_mode(ViewMode::Grade);
		assert_eq!(sim.layout(), Layout::Initial);
		let mut ticks = 0;
		while sim.layout() == Layout::Initial && ticks < 10_000 {
			sim.tick(16.0);
			ticks += 1;
		}
		// initial decay 0.1 cools below alpha_min well inside the 3 s deadline
		assert!(ticks < 100);
		assert_eq!(sim.layout(), Layout::Grade);
		assert!(sim.is_settling());
		settle(&mut sim);
		assert_eq!(sim.phase(), Phase::Pinned);

		// once past the initial layout a request applies at once
		sim.request_mode(ViewMode::Cluster);
		assert_eq!(sim.layout(), Layout::Cluster);
	}

	#[test]
	fn disposed_simulation_is_inert() {
		let mut sim = NetworkSimulation::new(&network(), extent(), NetworkConfig::default());
		sim.dispose();
		assert!(!sim.tick(16.0));
		sim.set_mode(ViewMode::Cluster);
		assert_eq!(sim.phase(), Phase::Disposed);
	}

	#[test]
	fn zones_tile_the_canvas() {
		assert_eq!(grade_zone(Grade::A, 1000.0), (-500.0, -300.0));
		assert_eq!(grade_center(Grade::E, 1000.0), 400.0);
		let p = cluster_target(ClusterGroup::MeatProcessors, extent());
		assert!((p.x + 280.0).abs() < 1e-9 && (p.y + 157.5).abs() < 1e-9);
	}
}
