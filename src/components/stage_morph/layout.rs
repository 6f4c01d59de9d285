//! Radial, linear (Sankey) and parallel-coordinate placements of the grade
//! buckets and sampled products, and the blend between them for a given
//! scroll progress.
//!
//! Progress runs over [0, 2.5]. Below 1 nodes slide from the radial circle to
//! the linear columns. From 1 on, the scene rotates -90 degrees about a
//! vertical axis whose pivot slides from 0.6w to 0.15w: the grade column turns
//! away and fades while the nutrient axes swing in to face the viewer.

use crate::config::MorphConfig;
use crate::data::{Grade, Nutrient, NutrientRanges, ProductRecord, grade_counts, sample_products};
use crate::geometry::{Point, ease_cubic_in_out, lerp, polar_to_cartesian, project_3d};

use super::types::{LayoutPosition, MorphNode, NodeFrame};

/// The canvas is taller than its container by this much.
pub const HEIGHT_PAD: f64 = 80.0;
pub const MAX_PROGRESS: f64 = 2.5;

const GRADE_RADIAL_R: f64 = 40.0;
const PRODUCT_RADIAL_R: f64 = 16.0;
const GRADE_LINEAR_R: f64 = 30.0;
const PRODUCT_LINEAR_R: f64 = 18.0;

/// Pre-projection position in the linear layout.
#[derive(Clone, Copy, Debug, PartialEq)]
struct LinearSlot {
	lx: f64,
	ly: f64,
	r: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AxisLine {
	pub nutrient: Nutrient,
	pub top: Point,
	pub bottom: Point,
}

pub struct StageLayout {
	width: f64,
	height: f64,
	nodes: Vec<MorphNode>,
	radial: Vec<LayoutPosition>,
	linear: Vec<LinearSlot>,
	/// Band y of each axis value, for product nodes only (offset by the five
	/// grade nodes).
	axis_ys: Vec<[f64; 9]>,
}

impl StageLayout {
	/// Samples the dataset and builds the layout for a container of the given
	/// height.
	pub fn from_dataset(records: &[ProductRecord], container_height: f64, config: &MorphConfig) -> Self {
		let sampled = sample_products(records, config.max_products);
		let ranges = NutrientRanges::from_records(records);
		Self::build(
			sampled,
			grade_counts(records),
			&ranges,
			config.canvas_width,
			container_height + HEIGHT_PAD,
			config.min_gap,
		)
	}

	pub fn build(
		products: Vec<ProductRecord>,
		counts: [usize; 5],
		ranges: &NutrientRanges,
		width: f64,
		height: f64,
		min_gap: f64,
	) -> Self {
		let mut nodes: Vec<MorphNode> = Grade::ALL
			.iter()
			.map(|&grade| MorphNode::Grade {
				grade,
				count: counts[grade.index()],
			})
			.collect();
		nodes.extend(products.into_iter().filter_map(MorphNode::product));

		let grades = Grade::ALL.len();
		let n_products = nodes.len() - grades;
		let center = (width / 2.0, height / 2.0);
		let max_r = width.min(height) * 0.8;

		let mut radial = Vec::with_capacity(nodes.len());
		for i in 0..grades {
			let angle = i as f64 / grades as f64 * 360.0;
			let p = polar_to_cartesian(center.0, center.1, max_r * 0.25, angle);
			radial.push(LayoutPosition {
				x: p.x,
				y: p.y,
				r: GRADE_RADIAL_R,
				opacity: 1.0,
			});
		}
		for i in 0..n_products {
			let angle = i as f64 / n_products as f64 * 360.0;
			let p = polar_to_cartesian(center.0, center.1, max_r * 0.85, angle);
			radial.push(LayoutPosition {
				x: p.x,
				y: p.y,
				r: PRODUCT_RADIAL_R,
				opacity: 1.0,
			});
		}

		let product_gap = ((height + 100.0) / n_products.saturating_sub(1).max(1) as f64).max(min_gap);
		let grade_gap = (height - 40.0) / (grades - 1) as f64;
		let mut linear = Vec::with_capacity(nodes.len());
		for i in 0..grades {
			linear.push(LinearSlot {
				lx: -width * 0.5,
				ly: 20.0 + i as f64 * grade_gap,
				r: GRADE_LINEAR_R,
			});
		}
		for i in 0..n_products {
			linear.push(LinearSlot {
				lx: 0.0,
				ly: 15.0 + i as f64 * product_gap,
				r: PRODUCT_LINEAR_R,
			});
		}

		let (top, visible) = band(height);
		let axis_ys = nodes[grades..]
			.iter()
			.map(|node| {
				let MorphNode::Product { record, .. } = node else {
					return [top + visible / 2.0; 9];
				};
				Nutrient::ALL.map(|key| {
					let norm = ranges.normalize(key, record.nutrient(key));
					top + (1.0 - norm) * visible
				})
			})
			.collect();

		Self {
			width,
			height,
			nodes,
			radial,
			linear,
			axis_ys,
		}
	}

	pub fn width(&self) -> f64 {
		self.width
	}

	pub fn height(&self) -> f64 {
		self.height
	}

	pub fn nodes(&self) -> &[MorphNode] {
		&self.nodes
	}

	/// Node index of a grade bucket.
	pub fn grade_node(grade: Grade) -> usize {
		grade.index()
	}

	/// Node indices of the sampled products.
	pub fn product_nodes(&self) -> std::ops::Range<usize> {
		Grade::ALL.len()..self.nodes.len()
	}

	pub fn radial(&self, idx: usize) -> LayoutPosition {
		self.radial[idx]
	}

	/// Linear placement after the flat projection onto the Sankey plane.
	pub fn linear(&self, idx: usize) -> LayoutPosition {
		let slot = self.linear[idx];
		let p = project_3d(slot.lx, slot.ly, 0.0, 0.0, self.width * 0.6, 0.0);
		LayoutPosition {
			x: p.x,
			y: p.y,
			r: slot.r,
			opacity: 1.0,
		}
	}

	pub fn frame(&self, idx: usize, progress: f64) -> NodeFrame {
		let p = progress.clamp(0.0, MAX_PROGRESS);
		if p < 1.0 {
			let t = ease_cubic_in_out(p);
			let (from, to) = (self.radial[idx], self.linear(idx));
			return NodeFrame {
				x: lerp(from.x, to.x, t),
				y: lerp(from.y, to.y, t),
				r: lerp(from.r, to.r, t),
				opacity: 1.0,
				scale: 1.0,
			};
		}

		let t = phase_b(p);
		let angle = -90.0 * t;
		let pivot = self.pivot_x(p);
		let slot = self.linear[idx];
		let (projected, opacity) = match &self.nodes[idx] {
			MorphNode::Grade { .. } => (project_3d(slot.lx, slot.ly, 0.0, angle, pivot, 0.0), 1.0 - t),
			MorphNode::Product { .. } => (project_3d(0.0, slot.ly, 0.0, angle, pivot, 0.0), 1.0),
		};
		NodeFrame {
			x: projected.x,
			y: projected.y,
			r: slot.r * projected.scale,
			opacity,
			scale: projected.scale,
		}
	}

	pub fn frames(&self, progress: f64) -> Vec<NodeFrame> {
		(0..self.nodes.len()).map(|i| self.frame(i, progress)).collect()
	}

	pub fn pivot_x(&self, progress: f64) -> f64 {
		let p = progress.min(MAX_PROGRESS);
		if p <= 1.0 {
			return self.width * 0.6;
		}
		lerp(self.width * 0.6, self.width * 0.15, phase_b(p))
	}

	fn axis_depth(&self, axis: usize) -> f64 {
		self.width * 0.1 + axis as f64 * self.width * 0.08
	}

	/// The nine projected axis points of a product's trace, in axis order.
	pub fn trace_points(&self, idx: usize, progress: f64) -> Vec<Point> {
		let Some(ys) = idx
			.checked_sub(Grade::ALL.len())
			.and_then(|i| self.axis_ys.get(i))
		else {
			return Vec::new();
		};
		let p = progress.clamp(0.0, MAX_PROGRESS);
		let angle = -90.0 * phase_b(p);
		let pivot = self.pivot_x(p);
		ys.iter()
			.enumerate()
			.map(|(axis, &ly)| project_3d(0.0, ly, self.axis_depth(axis), angle, pivot, 0.0).point())
			.collect()
	}

	/// Parallel-coordinate placement: the product's points on the fully
	/// rotated axes.
	pub fn parallel(&self, idx: usize) -> Vec<Point> {
		self.trace_points(idx, MAX_PROGRESS)
	}

	pub fn axis_lines(&self, progress: f64) -> Vec<AxisLine> {
		let p = progress.clamp(0.0, MAX_PROGRESS);
		let angle = -90.0 * phase_b(p);
		let pivot = self.pivot_x(p);
		let (top, visible) = band(self.height);
		Nutrient::ALL
			.iter()
			.enumerate()
			.map(|(axis, &nutrient)| {
				let z = self.axis_depth(axis);
				AxisLine {
					nutrient,
					top: project_3d(0.0, top, z, angle, pivot, 0.0).point(),
					bottom: project_3d(0.0, top + visible, z, angle, pivot, 0.0).point(),
				}
			})
			.collect()
	}
}

/// Top and height of the parallel-coordinates band.
fn band(height: f64) -> (f64, f64) {
	let top = height * 0.05;
	(top, height - 2.0 * top)
}

/// Eased progress of the corner turn; 0 until progress passes 1.
pub fn phase_b(progress: f64) -> f64 {
	if progress <= 1.0 {
		0.0
	} else {
		ease_cubic_in_out((progress - 1.0).min(1.0))
	}
}

/// 0 radial, 1 Sankey, 2 parallel coordinates.
pub fn stage_index(progress: f64) -> usize {
	progress.clamp(0.0, MAX_PROGRESS).floor() as usize
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const EPS: f64 = 1e-9;

	fn product(id: usize, grade: Grade, sugar: f64) -> ProductRecord {
		ProductRecord {
			id: id.to_string(),
			grade: Some(grade),
			sugar,
			..Default::default()
		}
	}

	/// Grades A, B, C with two products each.
	fn scenario() -> StageLayout {
		let products: Vec<_> = (0..6)
			.map(|i| product(i, Grade::ALL[i / 2], 5.0 + i as f64))
			.collect();
		let ranges = NutrientRanges::from_records(&products);
		let counts = grade_counts(&products);
		StageLayout::build(products, counts, &ranges, 2000.0, 880.0, 10.0)
	}

	#[test]
	fn nodes_are_grades_then_products() {
		let layout = scenario();
		assert_eq!(layout.nodes().len(), 11);
		assert!(layout.nodes()[..5].iter().all(MorphNode::is_grade));
		assert_eq!(layout.product_nodes(), 5..11);
		let MorphNode::Grade { count, .. } = layout.nodes()[StageLayout::grade_node(Grade::B)] else {
			panic!("expected a grade node");
		};
		assert_eq!(count, 2);
	}

	#[test]
	fn progress_zero_is_radial() {
		let layout = scenario();
		let (cx, cy) = (1000.0, 440.0);
		let product_r = 880.0 * 0.8 * 0.85;
		for i in 0..layout.nodes().len() {
			let frame = layout.frame(i, 0.0);
			let radial = layout.radial(i);
			assert_eq!((frame.x, frame.y, frame.r), (radial.x, radial.y, radial.r));
			assert_eq!(frame.opacity, 1.0);
		}
		for i in layout.product_nodes() {
			let f = layout.frame(i, 0.0);
			let d = Point::new(f.x, f.y).distance(Point::new(cx, cy));
			assert!((d - product_r).abs() < 1e-6);
		}
	}

	#[test]
	fn progress_one_is_linear() {
		let layout = scenario();
		for i in 0..layout.nodes().len() {
			let frame = layout.frame(i, 1.0);
			let linear = layout.linear(i);
			assert!((frame.x - linear.x).abs() < EPS);
			assert!((frame.y - linear.y).abs() < EPS);
			assert!((frame.r - linear.r).abs() < EPS);
			assert_eq!(frame.opacity, 1.0);
		}
		let ys: Vec<f64> = layout.product_nodes().map(|i| layout.frame(i, 1.0).y).collect();
		let gaps: Vec<f64> = ys.windows(2).map(|w| w[1] - w[0]).collect();
		assert!(gaps.iter().all(|g| (g - gaps[0]).abs() < EPS));
		assert!(gaps[0] >= 10.0);
		// (880 + 100) / 5
		assert!((gaps[0] - 196.0).abs() < EPS);
	}

	#[test]
	fn fully_turned_at_max_progress() {
		let layout = scenario();
		for g in Grade::ALL {
			assert_eq!(layout.frame(StageLayout::grade_node(g), 2.5).opacity, 0.0);
			assert!(!layout.frame(StageLayout::grade_node(g), 2.5).is_visible());
		}
		for i in layout.product_nodes() {
			let frame = layout.frame(i, 2.5);
			assert!((frame.x - 300.0).abs() < EPS);
			assert!((frame.y - layout.linear(i).y).abs() < EPS);
			assert_eq!(frame.opacity, 1.0);
		}
		// past the end the scene is frozen
		assert_eq!(layout.frames(2.5), layout.frames(7.0));
		assert_eq!(layout.frames(2.0), layout.frames(2.5));
	}

	#[test]
	fn axes_face_the_viewer_after_the_turn() {
		let layout = scenario();
		let axes = layout.axis_lines(2.5);
		assert_eq!(axes.len(), 9);
		for (i, axis) in axes.iter().enumerate() {
			let expected_x = 300.0 + 200.0 + i as f64 * 160.0;
			assert!((axis.top.x - expected_x).abs() < 1e-6);
			assert!((axis.bottom.x - expected_x).abs() < 1e-6);
			assert!((axis.top.y - 44.0).abs() < 1e-6);
			assert!((axis.bottom.y - 836.0).abs() < 1e-6);
		}
	}

	#[test]
	fn trace_maps_values_into_band() {
		let layout = scenario();
		let first = layout.parallel(5);
		let last = layout.parallel(10);
		assert_eq!(first.len(), 9);
		// sugar is the fourth axis; lower sugar sits lower on the axis
		assert!(first[3].y > last[3].y);
		// nothing else was reported: both sit on the same low point of the
		// fallback [0, 1] range
		assert_eq!(first[0].y, last[0].y);
		assert!(first[0].y > 440.0);
		assert!(layout.trace_points(0, 2.5).is_empty());
	}

	#[test]
	fn stages() {
		assert_eq!(stage_index(0.3), 0);
		assert_eq!(stage_index(1.0), 1);
		assert_eq!(stage_index(2.4), 2);
		assert_eq!(stage_index(9.0), 2);
		assert_eq!(phase_b(0.7), 0.0);
		assert_eq!(phase_b(2.0), 1.0);
	}

	#[test]
	fn single_product_does_not_divide_by_zero() {
		let products = vec![product(1, Grade::D, 1.0)];
		let ranges = NutrientRanges::from_records(&products);
		let layout = StageLayout::build(products, [0, 0, 0, 1, 0], &ranges, 2000.0, 880.0, 10.0);
		let frame = layout.frame(5, 1.0);
		assert!(frame.y.is_finite());
		assert!((frame.y - 15.0).abs() < EPS);
	}

	proptest! {
		#[test]
		fn first_phase_is_a_convex_blend(p in 0f64..1.0) {
			let layout = scenario();
			for i in 0..layout.nodes().len() {
				let f = layout.frame(i, p);
				let (a, b) = (layout.radial(i), layout.linear(i));
				prop_assert!(f.x >= a.x.min(b.x) - EPS && f.x <= a.x.max(b.x) + EPS);
				prop_assert!(f.y >= a.y.min(b.y) - EPS && f.y <= a.y.max(b.y) + EPS);
				prop_assert!(f.r > 0.0);
			}
		}

		#[test]
		fn frames_stay_well_formed(p in -1f64..4.0) {
			let layout = scenario();
			for f in layout.frames(p) {
				prop_assert!((0.0..=1.0).contains(&f.opacity));
				prop_assert!(f.r > 0.0);
			}
		}
	}
}
