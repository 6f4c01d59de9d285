use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::boxplot::{self, BoxPlotGeometry, BoxPlotStyle};
use super::hull::ClusterHull;
use super::simulation::grade_zone;
use super::state::NetworkState;
use super::types::{AdditiveNode, NodeForm, ViewMode};
use crate::data::Grade;
use crate::geometry::Point;

const BACKGROUND: &str = "#f8fafc";
const INK: &str = "#1e293b";
const BRAND_STROKE: &str = "#6366f1";
const MICRO_BORDER: &str = "#cbd5e1";
const ZONE_TOP: f64 = 60.0;
const ZONE_LABEL_Y: f64 = 40.0;

/// Node fill by Nutri-Score.
pub fn grade_fill(grade: Grade) -> &'static str {
	match grade {
		Grade::A => "#16a34a",
		Grade::B => "#84cc16",
		Grade::C => "#eab308",
		Grade::D => "#f97316",
		Grade::E => "#ef4444",
	}
}

fn zone_fill(grade: Grade) -> &'static str {
	match grade {
		Grade::A => "#166534",
		Grade::B => "#65a30d",
		Grade::C => "#ca8a04",
		Grade::D => "#ea580c",
		Grade::E => "#dc2626",
	}
}

fn dash(ctx: &CanvasRenderingContext2d, on: f64, off: f64) {
	let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off)));
}

fn solid(ctx: &CanvasRenderingContext2d) {
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn circle(ctx: &CanvasRenderingContext2d, x: f64, y: f64, r: f64) {
	ctx.begin_path();
	let _ = ctx.arc(x, y, r.max(0.0), 0.0, 2.0 * PI);
}

pub fn render(state: &NetworkState, ctx: &CanvasRenderingContext2d) {
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	let origin = state.zoom.origin();
	let t = state.zoom.transform();
	ctx.save();
	let _ = ctx.translate(origin.x + t.x, origin.y + t.y);
	let _ = ctx.scale(t.k, t.k);

	let positions = state.sim.positions();
	match state.mode() {
		ViewMode::Grade => draw_grade_zones(state, ctx),
		ViewMode::Cluster => draw_hulls(&state.hulls(), ctx),
	}
	draw_links(state, &positions, ctx);
	draw_nodes(state, &positions, ctx);

	ctx.restore();
}

fn draw_grade_zones(state: &NetworkState, ctx: &CanvasRenderingContext2d) {
	let (w, h) = (state.width, state.height);
	ctx.set_text_align("center");
	ctx.set_font("800 16px sans-serif");
	for grade in Grade::ALL {
		let (left, right) = grade_zone(grade, w);
		ctx.set_global_alpha(0.12);
		ctx.set_fill_style_str(zone_fill(grade));
		ctx.fill_rect(left, -h / 2.0 + ZONE_TOP, right - left, (h - 2.0 * ZONE_TOP).max(0.0));
		ctx.set_global_alpha(1.0);
		let _ = ctx.fill_text(
			&format!("Grade {}", grade.letter()),
			(left + right) / 2.0,
			-h / 2.0 + ZONE_LABEL_Y,
		);
	}
}

/// Closed Catmull-Rom curve through the hull vertices.
fn smooth_ring(ctx: &CanvasRenderingContext2d, points: &[Point]) {
	let n = points.len();
	let Some(first) = points.first() else {
		return;
	};
	ctx.begin_path();
	ctx.move_to(first.x, first.y);
	for i in 0..n {
		let p0 = points[(i + n - 1) % n];
		let p1 = points[i];
		let p2 = points[(i + 1) % n];
		let p3 = points[(i + 2) % n];
		ctx.bezier_curve_to(
			p1.x + (p2.x - p0.x) / 6.0,
			p1.y + (p2.y - p0.y) / 6.0,
			p2.x - (p3.x - p1.x) / 6.0,
			p2.y - (p3.y - p1.y) / 6.0,
			p2.x,
			p2.y,
		);
	}
	ctx.close_path();
}

fn draw_hulls(hulls: &[ClusterHull], ctx: &CanvasRenderingContext2d) {
	ctx.set_line_width(3.0);
	ctx.set_line_join("round");
	for hull in hulls {
		let color = hull.group.color();
		smooth_ring(ctx, &hull.points);
		ctx.set_global_alpha(0.2);
		ctx.set_fill_style_str(color);
		ctx.fill();
		ctx.set_global_alpha(0.6);
		ctx.set_stroke_style_str(color);
		dash(ctx, 8.0, 4.0);
		ctx.stroke();
	}
	solid(ctx);
	ctx.set_global_alpha(1.0);
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	ctx.set_font("900 18px sans-serif");
	for hull in hulls {
		ctx.set_fill_style_str(hull.group.color());
		let _ = ctx.fill_text(&hull.group.label().to_uppercase(), hull.centroid.x, hull.centroid.y);
	}
	ctx.set_text_baseline("alphabetic");
}

fn draw_links(state: &NetworkState, positions: &[Point], ctx: &CanvasRenderingContext2d) {
	for link in &state.graph.links {
		let (Some(a), Some(b)) = (positions.get(link.source), positions.get(link.target)) else {
			continue;
		};
		let stroke = state.link_stroke(link);
		ctx.set_global_alpha(stroke.opacity);
		ctx.set_stroke_style_str(stroke.color);
		ctx.set_line_width(stroke.width);
		ctx.begin_path();
		ctx.move_to(a.x, a.y);
		ctx.line_to(b.x, b.y);
		ctx.stroke();
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &NetworkState, positions: &[Point], ctx: &CanvasRenderingContext2d) {
	let brand_active = state.brand().is_some();
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	for (idx, node) in state.graph.nodes.iter().enumerate() {
		let Some(&p) = positions.get(idx) else {
			continue;
		};
		ctx.set_global_alpha(state.node_opacity(idx));
		match state.form(idx) {
			NodeForm::Macro => draw_macro(node, p, brand_active, ctx),
			NodeForm::Simplified => draw_simplified(node, p, ctx),
			NodeForm::Micro => draw_micro(node, p, ctx),
		}
	}
	ctx.set_global_alpha(1.0);
	ctx.set_text_baseline("alphabetic");
}

fn draw_macro(node: &AdditiveNode, p: Point, brand_active: bool, ctx: &CanvasRenderingContext2d) {
	let r = node.radius;
	circle(ctx, p.x, p.y, r);
	ctx.set_fill_style_str(grade_fill(node.grade));
	ctx.fill();
	if brand_active {
		ctx.set_stroke_style_str(BRAND_STROKE);
		ctx.set_line_width(4.0);
	} else {
		ctx.set_stroke_style_str("#ffffff");
		ctx.set_line_width(2.0);
	}
	ctx.stroke();

	ctx.set_fill_style_str("#ffffff");
	ctx.set_font(&format!("bold {}px sans-serif", (r / 2.0).min(12.0)));
	let _ = ctx.fill_text(node.id(), p.x, p.y);
}

fn draw_simplified(node: &AdditiveNode, p: Point, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(INK);
	ctx.set_font(&format!("800 {}px monospace", (node.radius / 2.5).min(14.0)));
	let _ = ctx.fill_text(node.id(), p.x, p.y);
}

fn draw_micro(node: &AdditiveNode, p: Point, ctx: &CanvasRenderingContext2d) {
	let r = node.radius;
	let frame = boxplot::micro_frame(r);
	ctx.save();
	let _ = ctx.translate(p.x, p.y);
	circle(ctx, 0.0, 0.0, r - 2.0);
	ctx.clip();

	ctx.set_fill_style_str("#ffffff");
	ctx.fill_rect(frame.x, frame.y, frame.width, frame.height);
	ctx.set_stroke_style_str(MICRO_BORDER);
	ctx.set_line_width(1.5);
	ctx.stroke_rect(frame.x, frame.y, frame.width, frame.height);

	match boxplot::layout(&node.boxes, frame, &BoxPlotStyle::MICRO) {
		Some(geometry) => draw_boxes(&geometry, r, ctx),
		None => {
			ctx.set_fill_style_str(INK);
			ctx.set_font(&format!("700 {}px sans-serif", (r / 4.0).min(10.0)));
			let _ = ctx.fill_text(&boxplot::fallback_name(node.name()), 0.0, -8.0);
			ctx.set_font(&format!("800 {}px monospace", (r / 3.0).min(12.0)));
			let _ = ctx.fill_text(node.id(), 0.0, 8.0);
		}
	}
	ctx.restore();
}

fn draw_boxes(geometry: &BoxPlotGeometry, r: f64, ctx: &CanvasRenderingContext2d) {
	let line = (r / 15.0).max(2.0);
	let frame_line = (r / 20.0).max(1.5);
	let dot = (r / 20.0).max(2.0);
	let alpha = ctx.global_alpha();

	ctx.set_stroke_style_str("#e2e8f0");
	ctx.set_line_width(0.5);
	for &(_, y) in &geometry.ticks {
		ctx.begin_path();
		ctx.move_to(geometry.plot.x, y);
		ctx.line_to(geometry.plot.right(), y);
		ctx.stroke();
	}

	for b in &geometry.boxes {
		ctx.set_stroke_style_str(b.color);
		ctx.set_line_width(line);
		ctx.begin_path();
		ctx.move_to(b.center_x, b.whisker.0);
		ctx.line_to(b.center_x, b.whisker.1);
		ctx.stroke();

		ctx.set_global_alpha(alpha * 0.7);
		ctx.set_fill_style_str(b.color);
		ctx.fill_rect(b.x, b.box_top, b.width, b.box_height);
		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(INK);
		ctx.set_line_width(frame_line);
		ctx.stroke_rect(b.x, b.box_top, b.width, b.box_height);

		ctx.set_line_width(line);
		ctx.begin_path();
		ctx.move_to(b.x, b.median_y);
		ctx.line_to(b.x + b.width, b.median_y);
		ctx.stroke();

		ctx.set_fill_style_str(b.color);
		ctx.set_line_width(0.8);
		for &y in &b.outlier_ys {
			circle(ctx, b.center_x, y, dot);
			ctx.fill();
			ctx.stroke();
		}
	}
}
