//! Sankey ribbons (grade to product) and parallel-coordinate traces (product
//! through the nine nutrient axes).

use crate::geometry::Point;

use super::layout::{StageLayout, phase_b};
use super::types::{Hover, NodeFrame};

const BASE_OPACITY: f64 = 0.15;
const HOVER_OPACITY: f64 = 0.9;
const BASE_WIDTH: f64 = 2.5;
const HOVER_WIDTH: f64 = 5.0;
const TRACE_HOVER_WIDTH: f64 = 4.0;
/// Traces appear once progress passes this.
const TRACE_START: f64 = 0.1;
const MIN_OPACITY: f64 = 0.01;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stroke {
	pub color: &'static str,
	pub width: f64,
	pub opacity: f64,
}

/// Cubic Bézier from a grade to a product, bending through the horizontal
/// midpoint.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Ribbon {
	pub start: Point,
	pub c1: Point,
	pub c2: Point,
	pub end: Point,
}

impl Ribbon {
	pub fn between(from: Point, to: Point) -> Self {
		let mid_x = (from.x + to.x) / 2.0;
		Self {
			start: from,
			c1: Point::new(mid_x, from.y),
			c2: Point::new(mid_x, to.y),
			end: to,
		}
	}

	pub fn at(&self, t: f64) -> Point {
		let u = 1.0 - t;
		let (a, b, c, d) = (u * u * u, 3.0 * u * u * t, 3.0 * u * t * t, t * t * t);
		Point::new(
			a * self.start.x + b * self.c1.x + c * self.c2.x + d * self.end.x,
			a * self.start.y + b * self.c1.y + c * self.c2.y + d * self.end.y,
		)
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct ProductFlow {
	/// Node index of the product.
	pub product: usize,
	pub ribbon: Option<(Ribbon, Stroke)>,
	/// Product node followed by its nine axis points.
	pub trace: Option<(Vec<Point>, Stroke)>,
}

/// Flows for every visible product at `progress`. `frames` must come from
/// the same layout and progress.
pub fn product_flows(layout: &StageLayout, frames: &[NodeFrame], progress: f64, hover: Hover) -> Vec<ProductFlow> {
	let t = phase_b(progress);
	let (sankey_opacity, parallel_opacity) = (1.0 - t, t);

	layout
		.product_nodes()
		.filter_map(|idx| {
			let frame = frames[idx];
			if frame.opacity < MIN_OPACITY {
				return None;
			}
			let node = &layout.nodes()[idx];
			let grade_idx = StageLayout::grade_node(node.grade());
			let hovered = hover == Hover::Node(idx) || hover == Hover::Node(grade_idx);
			let (opacity, width) = if hovered {
				(HOVER_OPACITY, HOVER_WIDTH)
			} else {
				(BASE_OPACITY, BASE_WIDTH)
			};
			let color = node.color();
			let end = Point::new(frame.x, frame.y);

			let ribbon = (sankey_opacity > MIN_OPACITY).then(|| {
				let g = frames[grade_idx];
				(
					Ribbon::between(Point::new(g.x, g.y), end),
					Stroke {
						color,
						width,
						opacity: opacity * sankey_opacity,
					},
				)
			});

			let trace = (progress > TRACE_START && parallel_opacity > MIN_OPACITY).then(|| {
				let mut points = Vec::with_capacity(10);
				points.push(end);
				points.extend(layout.trace_points(idx, progress));
				let stroke = if hover == Hover::Trace(idx) {
					Stroke {
						color,
						width: TRACE_HOVER_WIDTH,
						opacity: 1.0,
					}
				} else {
					Stroke {
						color,
						width,
						opacity: opacity * parallel_opacity,
					}
				};
				(points, stroke)
			});

			Some(ProductFlow {
				product: idx,
				ribbon,
				trace,
			})
		})
		.collect()
}

/// Distance from `p` to the segment `a`-`b`.
fn segment_distance(p: Point, a: Point, b: Point) -> f64 {
	let (dx, dy) = (b.x - a.x, b.y - a.y);
	let len2 = dx * dx + dy * dy;
	if len2 == 0.0 {
		return p.distance(a);
	}
	let t = (((p.x - a.x) * dx + (p.y - a.y) * dy) / len2).clamp(0.0, 1.0);
	p.distance(Point::new(a.x + t * dx, a.y + t * dy))
}

/// Product whose trace passes within `tolerance` of `p`, nearest first.
pub fn trace_at(flows: &[ProductFlow], p: Point, tolerance: f64) -> Option<usize> {
	flows
		.iter()
		.filter_map(|flow| {
			let (points, _) = flow.trace.as_ref()?;
			let d = points
				.windows(2)
				.map(|w| segment_distance(p, w[0], w[1]))
				.fold(f64::INFINITY, f64::min);
			(d <= tolerance).then_some((flow.product, d))
		})
		.min_by(|a, b| a.1.total_cmp(&b.1))
		.map(|(idx, _)| idx)
}

/// Topmost visible node under `p`. Later nodes are drawn on top.
pub fn node_at(frames: &[NodeFrame], p: Point) -> Option<usize> {
	frames
		.iter()
		.enumerate()
		.rev()
		.find(|(_, f)| f.is_visible() && p.distance(Point::new(f.x, f.y)) <= f.r)
		.map(|(i, _)| i)
}
