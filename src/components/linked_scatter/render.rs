use std::collections::BTreeSet;
use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{Brush, ScatterLayout};
use crate::data::{Grade, ScatterPoint};
use crate::viewport::ViewTransform;

const UNKNOWN: &str = "#94a3b8";

/// Which attribute a panel colors its points by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColorBy {
	NutriScore,
	Nova,
}

fn nova_fill(group: u8) -> &'static str {
	match group {
		1 => "#00aa00",
		2 => "#ffcc00",
		3 => "#ff6600",
		_ => "#ff0000",
	}
}

impl ColorBy {
	pub fn title(self) -> &'static str {
		match self {
			ColorBy::NutriScore => "Nutri-Score",
			ColorBy::Nova => "NOVA Group",
		}
	}

	pub fn color(self, p: &ScatterPoint) -> &'static str {
		match self {
			ColorBy::NutriScore => p.nutriscore.map_or(UNKNOWN, Grade::color),
			ColorBy::Nova => p.nova_group().map_or(UNKNOWN, nova_fill),
		}
	}

	pub fn legend(self) -> Vec<(String, &'static str)> {
		match self {
			ColorBy::NutriScore => Grade::ALL
				.iter()
				.map(|g| (g.letter().to_string(), g.color()))
				.collect(),
			ColorBy::Nova => (1..=4).map(|n| (n.to_string(), nova_fill(n))).collect(),
		}
	}
}

pub fn render(
	layout: &ScatterLayout,
	data: &[ScatterPoint],
	color_by: ColorBy,
	t: &ViewTransform,
	selection: &BTreeSet<usize>,
	brush: Option<&Brush>,
	ctx: &CanvasRenderingContext2d,
) {
	ctx.set_global_alpha(1.0);
	ctx.clear_rect(0.0, 0.0, layout.width, layout.height);

	ctx.save();
	let _ = ctx.translate(t.x, t.y);
	let _ = ctx.scale(t.k, t.k);
	let r = 3.0 / t.k;
	let has_selection = !selection.is_empty();

	ctx.set_global_alpha(if has_selection { 0.1 } else { 0.6 });
	for (i, (p, d)) in layout.points.iter().zip(data).enumerate() {
		if selection.contains(&i) {
			continue;
		}
		ctx.set_fill_style_str(color_by.color(d));
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, r, 0.0, 2.0 * PI);
		ctx.fill();
	}

	ctx.set_global_alpha(1.0);
	ctx.set_stroke_style_str("#333333");
	ctx.set_line_width(0.5 / t.k);
	for &i in selection {
		let (Some(p), Some(d)) = (layout.points.get(i), data.get(i)) else {
			continue;
		};
		ctx.set_fill_style_str(color_by.color(d));
		ctx.begin_path();
		let _ = ctx.arc(p.x, p.y, r, 0.0, 2.0 * PI);
		ctx.fill();
		ctx.stroke();
	}
	ctx.restore();

	if let Some(brush) = brush {
		let (x0, y0, x1, y1) = brush.bounds();
		ctx.set_fill_style_str("rgba(59, 130, 246, 0.1)");
		ctx.fill_rect(x0, y0, x1 - x0, y1 - y0);
		ctx.set_stroke_style_str("#3b82f6");
		ctx.set_line_width(1.0);
		let _ = ctx.set_line_dash(&js_sys::Array::of2(&JsValue::from_f64(4.0), &JsValue::from_f64(3.0)));
		ctx.stroke_rect(x0, y0, x1 - x0, y1 - y0);
		let _ = ctx.set_line_dash(&js_sys::Array::new());
	}
}
