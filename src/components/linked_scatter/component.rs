use std::cell::RefCell;
use std::collections::BTreeSet;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, info, warn};
use web_sys::{HtmlCanvasElement, MouseEvent};

use super::render::{self, ColorBy};
use super::state::{Brush, InteractionMode, ScatterLayout, selection_stats};
use crate::config::AppConfig;
use crate::data::{Grade, ScatterPoint};
use crate::dom::{AnimationLoop, WindowListener, context_2d, local_point, parent_size, resize_canvas};
use crate::viewport::ViewTransform;

const PANEL_SIZE: (f64, f64) = (600.0, 550.0);

#[derive(Clone, Copy, Debug, PartialEq)]
struct HoverInfo {
	index: usize,
	client_x: i32,
	client_y: i32,
}

/// Two embeddings of the same products, colored by Nutri-Score and by NOVA,
/// sharing one pan/zoom transform and one selection.
#[component]
pub fn LinkedScatter(#[prop(into)] data: Signal<Option<Vec<ScatterPoint>>>) -> impl IntoView {
	let transform = RwSignal::new(ViewTransform::IDENTITY);
	let selection = RwSignal::new(BTreeSet::<usize>::new());
	let hover = RwSignal::new(None::<HoverInfo>);
	let mode = RwSignal::new(InteractionMode::default());

	let on_zoom = Callback::new(move |t: ViewTransform| {
		debug!("scatter transform -> k={:.2} x={:.1} y={:.1}", t.k, t.x, t.y);
		transform.set(t);
	});

	let stats = Memo::new(move |_| {
		data.with(|d| {
			d.as_ref()
				.and_then(|d| selection.with(|s| selection_stats(d, s)))
		})
	});

	let tooltip = move || {
		let h = hover.get()?;
		let point = data.with(|d| d.as_ref()?.get(h.index).cloned())?;
		let grade = point.nutriscore.map_or("?", Grade::letter);
		Some(view! {
			<div
				class="scatter-tooltip"
				style:left=format!("{}px", h.client_x + 20)
				style:top=format!("{}px", h.client_y + 20)
			>
				<strong>{point.name.clone()}</strong>
				<div class="muted">{point.brand.clone()}</div>
				<div>
					<span>"Nutri-Score: " <b>{grade}</b></span>
					<span>"NOVA: " <b>{point.nova.clone()}</b></span>
				</div>
			</div>
		})
	};

	let mode_button = move |m: InteractionMode| {
		view! {
			<button class:active=move || mode.get() == m on:click=move |_| mode.set(m)>
				{m.label()}
			</button>
		}
	};

	view! {
		<div class="linked-scatter">
			<header class="linked-scatter__controls">
				<div class="mode-toggle">
					{mode_button(InteractionMode::Select)} {mode_button(InteractionMode::Zoom)}
				</div>
				{move || {
					stats
						.get()
						.map(|s| {
							let upf_class = if s.ultra_processed_pct > 50 { "bad" } else { "good" };
							view! {
								<div class="selection-stats">
									<div>
										<span class="label">"Count"</span>
										<span class="value">{s.total}</span>
									</div>
									<div>
										<span class="label">"Top Cat"</span>
										<span class="value">{s.top_category}</span>
									</div>
									<div>
										<span class="label">"Ultra-Processed"</span>
										<span class=format!("value {upf_class}")>{format!("{}%", s.ultra_processed_pct)}</span>
									</div>
									<button on:click=move |_| selection.set(BTreeSet::new())>"Clear Selection"</button>
								</div>
							}
						})
				}}
			</header>
			<div class="linked-scatter__panels">
				<ScatterPanel
					data=data
					color_by=ColorBy::NutriScore
					transform=transform
					on_zoom=on_zoom
					selection=selection
					hover=hover
					mode=mode
				/>
				<ScatterPanel
					data=data
					color_by=ColorBy::Nova
					transform=transform
					on_zoom=on_zoom
					selection=selection
					hover=hover
					mode=mode
				/>
			</div>
			{tooltip}
		</div>
	}
}

struct PanelState {
	layout: ScatterLayout,
	data: Vec<ScatterPoint>,
	brush: Option<Brush>,
	dirty: bool,
}

struct PanelHandles {
	_frames: AnimationLoop,
	_resize: Option<WindowListener>,
}

#[component]
fn ScatterPanel(
	data: Signal<Option<Vec<ScatterPoint>>>,
	color_by: ColorBy,
	#[prop(into)] transform: Signal<ViewTransform>,
	on_zoom: Callback<ViewTransform>,
	selection: RwSignal<BTreeSet<usize>>,
	hover: RwSignal<Option<HoverInfo>>,
	#[prop(into)] mode: Signal<InteractionMode>,
) -> impl IntoView {
	let max_scale = use_context::<AppConfig>().unwrap_or_default().zoom.max_scale;
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<PanelState>>> = Rc::new(RefCell::new(None));
	let handles = StoredValue::new_local(None::<PanelHandles>);

	let state_init = state.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(points) = data.get().filter(|p| !p.is_empty()) else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h) = parent_size(&canvas, PANEL_SIZE);
		resize_canvas(&canvas, w, h);
		let Some(ctx) = context_2d(&canvas) else {
			warn!("scatter panel: no 2d context");
			return;
		};
		info!("{} panel: {} points", color_by.title(), points.len());
		*state_init.borrow_mut() = Some(PanelState {
			layout: ScatterLayout::new(&points, w, h),
			data: points,
			brush: None,
			dirty: true,
		});

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		let resize = WindowListener::new("resize", move || {
			let (nw, nh) = parent_size(&canvas_resize, PANEL_SIZE);
			resize_canvas(&canvas_resize, nw, nh);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.layout = ScatterLayout::new(&s.data, nw, nh);
				s.dirty = true;
			}
		});

		let state_anim = state_init.clone();
		let frames = AnimationLoop::start(move |_| {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if !std::mem::take(&mut s.dirty) {
					return;
				}
				let t = transform.get_untracked();
				selection.with_untracked(|sel| {
					render::render(&s.layout, &s.data, color_by, &t, sel, s.brush.as_ref(), &ctx);
				});
			}
		});

		handles.set_value(Some(PanelHandles {
			_frames: frames,
			_resize: resize,
		}));
	});

	let state_dirty = state.clone();
	Effect::new(move |_| {
		transform.track();
		selection.track();
		if let Some(ref mut s) = *state_dirty.borrow_mut() {
			s.dirty = true;
		}
	});

	on_cleanup(move || {
		handles.try_update_value(|h| h.take());
	});

	let pointer = move |ev: &MouseEvent| {
		canvas_ref
			.get()
			.map(|c| local_point(&c, ev.client_x(), ev.client_y()))
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let Some(p) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut s) = *state_md.borrow_mut() {
			s.brush = Some(Brush::at(p));
		}
		hover.set(None);
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if let Some(brush) = s.brush.as_mut() {
				brush.end = p;
				s.dirty = true;
				return;
			}
			let next = s
				.layout
				.nearest(&transform.get_untracked(), p)
				.map(|index| HoverInfo {
					index,
					client_x: ev.client_x(),
					client_y: ev.client_y(),
				});
			if hover.get_untracked() != next {
				hover.set(next);
			}
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |_: MouseEvent| {
		let mut guard = state_mu.borrow_mut();
		let Some(s) = guard.as_mut() else {
			return;
		};
		let Some(brush) = s.brush.take() else {
			return;
		};
		s.dirty = true;
		let t = transform.get_untracked();
		match mode.get_untracked() {
			InteractionMode::Select if brush.is_click() => selection.set(BTreeSet::new()),
			InteractionMode::Select => {
				let picked = s.layout.select(&t, &brush);
				debug!("brushed {} points", picked.len());
				selection.set(picked);
			}
			InteractionMode::Zoom => {
				if let Some(next) = s.layout.box_zoom(&t, &brush, max_scale) {
					on_zoom.run(next);
				}
			}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			if s.brush.take().is_some() {
				s.dirty = true;
			}
		}
		hover.set(None);
	};

	let on_dblclick = move |_: MouseEvent| {
		if mode.get_untracked() == InteractionMode::Zoom {
			on_zoom.run(ViewTransform::IDENTITY);
		}
	};

	let cursor = move || match mode.get() {
		InteractionMode::Select => "crosshair",
		InteractionMode::Zoom => "zoom-in",
	};

	view! {
		<div class="scatter-panel">
			<canvas
				node_ref=canvas_ref
				class="scatter-panel__canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:dblclick=on_dblclick
				style=move || format!("display: block; width: 100%; height: 100%; cursor: {};", cursor())
			/>
			<div class="scatter-panel__legend">
				<h4>{color_by.title()}</h4>
				<ul>
					{color_by
						.legend()
						.into_iter()
						.map(|(label, color)| {
							view! {
								<li>
									<span class="swatch" style:background-color=color></span>
									{label}
								</li>
							}
						})
						.collect_view()}
				</ul>
			</div>
			<Show when=move || data.with(|d| d.as_ref().is_none_or(Vec::is_empty))>
				<div class="chart-placeholder">
					{move || if data.with(Option::is_none) { "Loading product map..." } else { "No products to map." }}
				</div>
			</Show>
		</div>
	}
}
