use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::flows::ProductFlow;
use super::layout::phase_b;
use super::state::MorphState;
use super::types::{Hover, MorphNode, NodeFrame};
use crate::data::sample::grade_label;

const BACKGROUND: &str = "#f8fafc";
const AXIS_COLOR: &str = "#94a3b8";
const AXIS_LABEL_COLOR: &str = "#64748b";
const PRODUCT_LABEL_COLOR: &str = "#475569";
/// Axes fade in once the turn has started.
const AXES_FROM: f64 = 1.05;

pub fn render(state: &MorphState, ctx: &CanvasRenderingContext2d) {
	ctx.set_global_alpha(1.0);
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);

	ctx.save();
	let _ = ctx.translate(state.view.x, state.view.y);
	let _ = ctx.scale(state.view.k, state.view.k);

	let frames = state.frames();
	draw_axes(state, ctx);
	draw_flows(&state.flows(&frames), ctx);
	draw_nodes(state, &frames, ctx);

	ctx.restore();
}

fn dash(ctx: &CanvasRenderingContext2d, on: f64, off: f64) {
	let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(on), &JsValue::from_f64(off)));
}

fn solid(ctx: &CanvasRenderingContext2d) {
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn draw_axes(state: &MorphState, ctx: &CanvasRenderingContext2d) {
	let p = state.progress();
	if p <= AXES_FROM {
		return;
	}
	ctx.set_global_alpha(phase_b(p));
	ctx.set_stroke_style_str(AXIS_COLOR);
	ctx.set_line_width(2.5);
	dash(ctx, 4.0, 4.0);
	ctx.set_fill_style_str(AXIS_LABEL_COLOR);
	ctx.set_font("600 18px sans-serif");
	ctx.set_text_align("center");

	for axis in state.layout.axis_lines(p) {
		ctx.begin_path();
		ctx.move_to(axis.top.x, axis.top.y);
		ctx.line_to(axis.bottom.x, axis.bottom.y);
		ctx.stroke();
		let _ = ctx.fill_text(axis.nutrient.label(), axis.top.x, axis.top.y - 15.0);
	}
	solid(ctx);
	ctx.set_global_alpha(1.0);
}

fn draw_flows(flows: &[ProductFlow], ctx: &CanvasRenderingContext2d) {
	for flow in flows {
		if let Some((ribbon, stroke)) = &flow.ribbon {
			ctx.set_global_alpha(stroke.opacity);
			ctx.set_stroke_style_str(stroke.color);
			ctx.set_line_width(stroke.width);
			ctx.begin_path();
			ctx.move_to(ribbon.start.x, ribbon.start.y);
			ctx.bezier_curve_to(
				ribbon.c1.x,
				ribbon.c1.y,
				ribbon.c2.x,
				ribbon.c2.y,
				ribbon.end.x,
				ribbon.end.y,
			);
			ctx.stroke();
		}
		if let Some((points, stroke)) = &flow.trace {
			let Some((first, rest)) = points.split_first() else {
				continue;
			};
			ctx.set_global_alpha(stroke.opacity);
			ctx.set_stroke_style_str(stroke.color);
			ctx.set_line_width(stroke.width);
			ctx.begin_path();
			ctx.move_to(first.x, first.y);
			for p in rest {
				ctx.line_to(p.x, p.y);
			}
			ctx.stroke();
		}
	}
	ctx.set_global_alpha(1.0);
}

fn draw_nodes(state: &MorphState, frames: &[NodeFrame], ctx: &CanvasRenderingContext2d) {
	let progress = state.progress();
	ctx.set_text_align("center");

	for (idx, (node, frame)) in state.layout.nodes().iter().zip(frames).enumerate() {
		if !frame.is_visible() {
			continue;
		}
		let hovered = state.hover == Hover::Node(idx);
		let r = if hovered { frame.r * 1.4 } else { frame.r };
		let outline = match (node.is_grade(), hovered) {
			(true, true) => 5.0,
			(true, false) => 3.0,
			(false, true) => 4.0,
			(false, false) => 2.0,
		};

		ctx.set_global_alpha(frame.opacity * if hovered { 1.0 } else { 0.9 });
		ctx.begin_path();
		let _ = ctx.arc(frame.x, frame.y, r, 0.0, 2.0 * PI);
		ctx.set_fill_style_str(node.color());
		ctx.fill();
		ctx.set_global_alpha(frame.opacity);
		ctx.set_stroke_style_str("#ffffff");
		ctx.set_line_width(outline);
		ctx.stroke();

		match node {
			MorphNode::Grade { grade, count } => {
				ctx.set_fill_style_str("#ffffff");
				ctx.set_font("bold 20px sans-serif");
				let _ = ctx.fill_text(&count.to_string(), frame.x, frame.y + 4.0);
				ctx.set_fill_style_str(PRODUCT_LABEL_COLOR);
				ctx.set_font("bold 18px sans-serif");
				let _ = ctx.fill_text(&grade_label(*grade).to_uppercase(), frame.x, frame.y + frame.r + 18.0);
			}
			MorphNode::Product { label, .. } if frame.opacity > 0.5 => {
				// labels tuck in closer once the radial layout starts unrolling
				let offset = if progress >= 0.3 { frame.r + 8.0 } else { frame.r + 20.0 };
				ctx.set_global_alpha(frame.opacity.max(0.9));
				ctx.set_fill_style_str(PRODUCT_LABEL_COLOR);
				ctx.set_font("600 14px sans-serif");
				let _ = ctx.fill_text(label, frame.x, frame.y + offset);
			}
			MorphNode::Product { .. } => {}
		}
	}
	ctx.set_global_alpha(1.0);
}
