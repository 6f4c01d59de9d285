use crate::config::MorphConfig;
use crate::data::ProductRecord;
use crate::geometry::Point;
use crate::scroll::staged;
use crate::viewport::{ViewTransform, Viewport, letterbox};

use super::flows::{ProductFlow, node_at, product_flows, trace_at};
use super::layout::{StageLayout, stage_index};
use super::types::{Hover, MorphNode, NodeFrame};

/// Screen px within which a trace counts as hovered.
const TRACE_TOLERANCE: f64 = 6.0;

pub struct MorphState {
	pub layout: StageLayout,
	records: Vec<ProductRecord>,
	config: MorphConfig,
	/// Staged progress in [0, stages].
	progress: f64,
	pub hover: Hover,
	complete: bool,
	/// Logical canvas to screen.
	pub view: ViewTransform,
	pub width: f64,
	pub height: f64,
}

impl MorphState {
	pub fn new(records: Vec<ProductRecord>, config: MorphConfig, width: f64, height: f64) -> Self {
		let layout = StageLayout::from_dataset(&records, height, &config);
		let view = letterbox(Viewport { width, height }, layout.width(), layout.height());
		Self {
			layout,
			records,
			config,
			progress: 0.0,
			hover: Hover::None,
			complete: false,
			view,
			width,
			height,
		}
	}

	/// The layout height follows the container, so a height change rebuilds it.
	pub fn resize(&mut self, width: f64, height: f64) {
		if height != self.height {
			self.layout = StageLayout::from_dataset(&self.records, height, &self.config);
			self.hover = Hover::None;
		}
		self.width = width;
		self.height = height;
		self.view = letterbox(Viewport { width, height }, self.layout.width(), self.layout.height());
	}

	pub fn progress(&self) -> f64 {
		self.progress
	}

	/// Takes story progress in [0, 1]. Returns `true` the first time the morph
	/// reaches its end.
	pub fn set_progress(&mut self, story_progress: f64) -> bool {
		self.progress = staged(story_progress, self.config.stages);
		if !self.complete && self.progress >= self.config.complete_at {
			self.complete = true;
			return true;
		}
		false
	}

	pub fn stage(&self) -> usize {
		stage_index(self.progress)
	}

	pub fn is_complete(&self) -> bool {
		self.complete
	}

	/// No products to chart. Grade buckets alone are not drawn.
	pub fn is_empty(&self) -> bool {
		self.records.is_empty()
	}

	pub fn frames(&self) -> Vec<NodeFrame> {
		if self.is_empty() {
			return Vec::new();
		}
		self.layout.frames(self.progress)
	}

	pub fn flows(&self, frames: &[NodeFrame]) -> Vec<ProductFlow> {
		product_flows(&self.layout, frames, self.progress, self.hover)
	}

	/// Nodes win over traces. Returns whether the hover target changed.
	pub fn pointer_move(&mut self, screen: Point) -> bool {
		let p = self.view.invert(screen);
		let frames = self.frames();
		let hover = match node_at(&frames, p) {
			Some(idx) => Hover::Node(idx),
			None => {
				let flows = product_flows(&self.layout, &frames, self.progress, Hover::None);
				trace_at(&flows, p, TRACE_TOLERANCE / self.view.k)
					.map(Hover::Trace)
					.unwrap_or_default()
			}
		};
		let changed = hover != self.hover;
		self.hover = hover;
		changed
	}

	pub fn clear_hover(&mut self) -> bool {
		std::mem::take(&mut self.hover) != Hover::None
	}

	/// Product under the pointer, through its node or its trace.
	pub fn hovered_product(&self) -> Option<&ProductRecord> {
		let (Hover::Node(idx) | Hover::Trace(idx)) = self.hover else {
			return None;
		};
		match self.layout.nodes().get(idx)? {
			MorphNode::Product { record, .. } => Some(record),
			MorphNode::Grade { .. } => None,
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::data::Grade;

	fn state() -> MorphState {
		let records: Vec<_> = (0..12)
			.map(|i| ProductRecord {
				id: i.to_string(),
				product_name: Some(format!("Item {i}")),
				grade: Some(Grade::ALL[i % 3]),
				energy: 50.0 * i as f64,
				..Default::default()
			})
			.collect();
		MorphState::new(records, MorphConfig::default(), 1000.0, 800.0)
	}

	#[test]
	fn completion_fires_once() {
		let mut s = state();
		assert!(!s.set_progress(0.5));
		assert_eq!(s.stage(), 1);
		assert!(s.set_progress(0.97));
		assert!(s.is_complete());
		assert!(!s.set_progress(1.0));
		assert!(!s.set_progress(0.2));
		assert!(s.is_complete());
		assert_eq!(s.stage(), 0);
	}

	#[test]
	fn hover_node_then_trace() {
		let mut s = state();
		s.set_progress(1.0);
		let frames = s.frames();
		let f = frames[6];
		let screen = s.view.apply(Point::new(f.x, f.y));
		assert!(s.pointer_move(screen));
		assert_eq!(s.hover, Hover::Node(6));
		let MorphNode::Product { record, .. } = &s.layout.nodes()[6] else {
			panic!("expected a product node");
		};
		assert_eq!(s.hovered_product().map(|p| p.id.clone()), Some(record.id.clone()));
		assert!(!s.pointer_move(screen));

		let flows = s.flows(&frames);
		let (points, _) = flows[0].trace.as_ref().unwrap();
		let mid = Point::new((points[3].x + points[4].x) / 2.0, (points[3].y + points[4].y) / 2.0);
		s.pointer_move(s.view.apply(mid));
		assert!(matches!(s.hover, Hover::Trace(_)));
		assert!(s.hovered_product().is_some());

		assert!(s.clear_hover());
		assert!(s.hovered_product().is_none());
	}

	#[test]
	fn resize_rebuilds_for_new_height() {
		let mut s = state();
		assert_eq!(s.layout.height(), 880.0);
		s.resize(1200.0, 600.0);
		assert_eq!(s.layout.height(), 680.0);
		assert_eq!(s.layout.nodes().len(), 17);
	}

	#[test]
	fn empty_dataset_draws_nothing() {
		let mut s = MorphState::new(Vec::new(), MorphConfig::default(), 1200.0, 800.0);
		assert!(s.is_empty());
		for p in [0.0, 0.5, 1.0] {
			s.set_progress(p);
			assert_eq!(s.frames().iter().filter(|f| f.is_visible()).count(), 0);
		}
		assert!(!s.pointer_move(Point::new(600.0, 400.0)));
		assert!(!state().is_empty());
	}
}
