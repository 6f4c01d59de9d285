//! Geometry for the Nutri-Score box plots, one box per NOVA group. The same
//! layout feeds the in-node micro chart and the large popup.

use crate::data::BoxStats;

/// Nutri-Score points axis, best at the bottom.
pub const SCORE_MIN: f64 = -15.0;
pub const SCORE_MAX: f64 = 40.0;

pub fn nova_color(nova: u8) -> &'static str {
	match nova {
		1 => "#16a34a",
		2 => "#f59e0b",
		3 => "#f97316",
		4 => "#ef4444",
		_ => "#475569",
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
	pub x: f64,
	pub y: f64,
	pub width: f64,
	pub height: f64,
}

impl Rect {
	pub fn bottom(&self) -> f64 {
		self.y + self.height
	}

	pub fn right(&self) -> f64 {
		self.x + self.width
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Margin {
	pub top: f64,
	pub right: f64,
	pub bottom: f64,
	pub left: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxPlotStyle {
	pub margin: Margin,
	/// Band padding, inner and outer.
	pub padding: f64,
	pub ticks: &'static [f64],
	pub min_box_height: f64,
}

impl BoxPlotStyle {
	pub const MICRO: BoxPlotStyle = BoxPlotStyle {
		margin: Margin {
			top: 18.0,
			right: 8.0,
			bottom: 18.0,
			left: 22.0,
		},
		padding: 0.3,
		ticks: &[-15.0, 0.0, 20.0, 40.0],
		min_box_height: 2.0,
	};

	/// The right margin leaves room for the color legend.
	pub const POPUP: BoxPlotStyle = BoxPlotStyle {
		margin: Margin {
			top: 45.0,
			right: 45.0,
			bottom: 55.0,
			left: 50.0,
		},
		padding: 0.4,
		ticks: &[-15.0, -10.0, 0.0, 10.0, 20.0, 30.0, 40.0],
		min_box_height: 3.0,
	};
}

pub const POPUP_SIZE: (f64, f64) = (400.0, 300.0);

/// Square the micro chart occupies inside a node of radius `r`, centered on
/// the node.
pub fn micro_frame(r: f64) -> Rect {
	let size = ((r - 2.0) * 2.2).max(0.0);
	Rect {
		x: -size / 2.0,
		y: -size / 2.0,
		width: size,
		height: size,
	}
}

pub fn popup_frame() -> Rect {
	Rect {
		x: 0.0,
		y: 0.0,
		width: POPUP_SIZE.0,
		height: POPUP_SIZE.1,
	}
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxGlyph {
	pub nova: u8,
	pub color: &'static str,
	pub x: f64,
	pub width: f64,
	pub center_x: f64,
	/// Whisker end points (min, max) in px.
	pub whisker: (f64, f64),
	pub box_top: f64,
	pub box_height: f64,
	pub median_y: f64,
	pub outlier_ys: Vec<f64>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct BoxPlotGeometry {
	pub plot: Rect,
	/// `(value, y)` for each grid line.
	pub ticks: Vec<(f64, f64)>,
	pub boxes: Vec<BoxGlyph>,
}

#[derive(Clone, Copy, Debug)]
struct ScoreScale {
	top: f64,
	bottom: f64,
}

impl ScoreScale {
	fn y(&self, v: f64) -> f64 {
		self.bottom - (v - SCORE_MIN) / (SCORE_MAX - SCORE_MIN) * (self.bottom - self.top)
	}
}

/// `(start, bandwidth, step)` of a band scale with equal inner and outer
/// padding, centered in `[x0, x0 + width]`.
fn band(n: usize, x0: f64, width: f64, padding: f64) -> (f64, f64, f64) {
	let n = n as f64;
	let step = width / (n + padding).max(1.0);
	let start = x0 + (width - step * (n - padding)) / 2.0;
	(start, step * (1.0 - padding), step)
}

/// Lays out every NOVA group with complete statistics, sorted by group.
/// `None` when there is nothing to draw and the caller should fall back to
/// the name/id label.
pub fn layout(stats: &[BoxStats], frame: Rect, style: &BoxPlotStyle) -> Option<BoxPlotGeometry> {
	if stats.is_empty() {
		return None;
	}
	let mut stats: Vec<&BoxStats> = stats.iter().collect();
	stats.sort_by_key(|s| s.nova);

	let m = style.margin;
	let plot = Rect {
		x: frame.x + m.left,
		y: frame.y + m.top,
		width: (frame.width - m.left - m.right).max(0.0),
		height: (frame.height - m.top - m.bottom).max(0.0),
	};
	let scale = ScoreScale {
		top: plot.y,
		bottom: plot.bottom(),
	};
	let (start, bandwidth, step) = band(stats.len(), plot.x, plot.width, style.padding);

	let boxes = stats
		.iter()
		.enumerate()
		.map(|(i, s)| {
			let x = start + step * i as f64;
			let (q1, q3) = (scale.y(s.q1), scale.y(s.q3));
			BoxGlyph {
				nova: s.nova,
				color: nova_color(s.nova),
				x,
				width: bandwidth,
				center_x: x + bandwidth / 2.0,
				whisker: (scale.y(s.min), scale.y(s.max)),
				box_top: q1.min(q3),
				box_height: (q1 - q3).abs().max(style.min_box_height),
				median_y: scale.y(s.median),
				outlier_ys: s.outliers.iter().map(|&o| scale.y(o)).collect(),
			}
		})
		.collect();

	Some(BoxPlotGeometry {
		plot,
		ticks: style.ticks.iter().map(|&v| (v, scale.y(v))).collect(),
		boxes,
	})
}

/// Name shown when a node has no box plot, clipped to 15 characters.
pub fn fallback_name(name: &str) -> String {
	name.chars().take(15).collect()
}
