//! Pure state for the linked scatter panels: data → pixel scale, hit
//! testing, brush selection, box zoom and selection statistics.

use std::collections::{BTreeSet, HashMap};

use crate::data::ScatterPoint;
use crate::geometry::Point;
use crate::viewport::ViewTransform;

/// Domain padding on each side, as a fraction of the extent.
const DOMAIN_PAD: f64 = 0.05;
/// Hover search radius in screen px.
const HOVER_RADIUS: f64 = 10.0;
/// Brushes thinner than this (px) on either axis are ignored by box zoom.
pub const MIN_BRUSH: f64 = 5.0;
const MIN_SCALE: f64 = 1.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InteractionMode {
	#[default]
	Select,
	Zoom,
}

impl InteractionMode {
	pub fn label(self) -> &'static str {
		match self {
			InteractionMode::Select => "Box Select",
			InteractionMode::Zoom => "Zoom",
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
struct Linear {
	d0: f64,
	d1: f64,
	r0: f64,
	r1: f64,
}

impl Linear {
	/// Padded extent of `values` onto `[r0, r1]`.
	fn padded(values: impl Iterator<Item = f64>, r0: f64, r1: f64) -> Self {
		let (lo, hi) = values
			.filter(|v| v.is_finite())
			.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| (lo.min(v), hi.max(v)));
		let (lo, hi) = if lo > hi { (0.0, 0.0) } else { (lo, hi) };
		let pad = (hi - lo) * DOMAIN_PAD;
		Self {
			d0: lo - pad,
			d1: hi + pad,
			r0,
			r1,
		}
	}

	/// A collapsed domain maps to the middle of the range.
	fn map(&self, v: f64) -> f64 {
		let span = self.d1 - self.d0;
		if span.abs() < f64::EPSILON {
			return (self.r0 + self.r1) / 2.0;
		}
		self.r0 + (v - self.d0) / span * (self.r1 - self.r0)
	}
}

/// Maps embedding coordinates to untransformed panel pixels, y up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DataScale {
	x: Linear,
	y: Linear,
}

impl DataScale {
	pub fn fit(points: &[ScatterPoint], width: f64, height: f64) -> Self {
		Self {
			x: Linear::padded(points.iter().map(|p| p.position[0]), 0.0, width),
			y: Linear::padded(points.iter().map(|p| p.position[1]), height, 0.0),
		}
	}

	pub fn project(&self, p: &ScatterPoint) -> Point {
		Point::new(self.x.map(p.position[0]), self.y.map(p.position[1]))
	}
}

/// Screen-space rectangle from two drag corners.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Brush {
	pub start: Point,
	pub end: Point,
}

impl Brush {
	pub fn at(p: Point) -> Self {
		Self { start: p, end: p }
	}

	/// `(x0, y0, x1, y1)` with `x0 <= x1`, `y0 <= y1`.
	pub fn bounds(&self) -> (f64, f64, f64, f64) {
		(
			self.start.x.min(self.end.x),
			self.start.y.min(self.end.y),
			self.start.x.max(self.end.x),
			self.start.y.max(self.end.y),
		)
	}

	pub fn is_click(&self) -> bool {
		self.start == self.end
	}
}

/// One panel's projected points. Both panels project the same data, so they
/// agree on indices and on what a transform means.
#[derive(Clone, Debug, Default)]
pub struct ScatterLayout {
	pub points: Vec<Point>,
	pub width: f64,
	pub height: f64,
}

impl ScatterLayout {
	pub fn new(data: &[ScatterPoint], width: f64, height: f64) -> Self {
		let scale = DataScale::fit(data, width, height);
		Self {
			points: data.iter().map(|p| scale.project(p)).collect(),
			width,
			height,
		}
	}

	/// Nearest point within 10 screen px of `screen`.
	pub fn nearest(&self, t: &ViewTransform, screen: Point) -> Option<usize> {
		let target = t.invert(screen);
		let radius = HOVER_RADIUS / t.k;
		self.points
			.iter()
			.enumerate()
			.map(|(i, p)| (p.distance(target), i))
			.filter(|(d, _)| *d <= radius)
			.min_by(|a, b| a.0.total_cmp(&b.0))
			.map(|(_, i)| i)
	}

	/// Indices of the points inside a screen-space brush, half-open on the
	/// far edges.
	pub fn select(&self, t: &ViewTransform, brush: &Brush) -> BTreeSet<usize> {
		let (x0, y0, x1, y1) = brush.bounds();
		let a = t.invert(Point::new(x0, y0));
		let b = t.invert(Point::new(x1, y1));
		self.points
			.iter()
			.enumerate()
			.filter(|(_, p)| p.x >= a.x && p.x < b.x && p.y >= a.y && p.y < b.y)
			.map(|(i, _)| i)
			.collect()
	}

	/// Transform that fills the panel with the brushed region, or `None` for
	/// a brush under 5 px on either axis. The scale stays in `[1, max_scale]`;
	/// the brush corner lands on the panel origin either way.
	pub fn box_zoom(&self, t: &ViewTransform, brush: &Brush, max_scale: f64) -> Option<ViewTransform> {
		let (x0, y0, x1, y1) = brush.bounds();
		let (dx, dy) = (x1 - x0, y1 - y0);
		if dx < MIN_BRUSH || dy < MIN_BRUSH {
			return None;
		}
		let fill = (self.width / dx).min(self.height / dy);
		let k = (t.k * fill).clamp(MIN_SCALE, max_scale.max(MIN_SCALE));
		let s = k / t.k;
		Some(ViewTransform {
			x: t.x * s - x0 * s,
			y: t.y * s - y0 * s,
			k,
		})
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct SelectionStats {
	pub total: usize,
	pub top_category: String,
	pub top_category_count: usize,
	/// NOVA 4 share, rounded percent.
	pub ultra_processed_pct: u32,
}

/// `None` for an empty selection. Ties for the top category go to the one
/// that reached the count first.
pub fn selection_stats(data: &[ScatterPoint], selection: &BTreeSet<usize>) -> Option<SelectionStats> {
	let mut total = 0usize;
	let mut ultra = 0usize;
	let mut counts: HashMap<&str, usize> = HashMap::new();
	let (mut top, mut top_count) = ("", 0usize);
	for p in selection.iter().filter_map(|&i| data.get(i)) {
		total += 1;
		if p.nova_group() == Some(4) {
			ultra += 1;
		}
		let count = counts.entry(p.category.as_str()).or_default();
		*count += 1;
		if *count > top_count {
			top_count = *count;
			top = p.category.as_str();
		}
	}
	(total > 0).then(|| SelectionStats {
		total,
		top_category: top.to_string(),
		top_category_count: top_count,
		ultra_processed_pct: ((ultra as f64 / total as f64) * 100.0).round() as u32,
	})
}
