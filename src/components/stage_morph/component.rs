use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use web_sys::{HtmlCanvasElement, MouseEvent};

use super::render;
use super::state::MorphState;
use crate::config::AppConfig;
use crate::data::{Grade, ProductRecord};
use crate::dom::{AnimationLoop, WindowListener, context_2d, local_point, parent_size, resize_canvas};

struct StoryCard {
	title: &'static str,
	body: &'static str,
	accent: &'static str,
}

static STORY: [StoryCard; 3] = [
	StoryCard {
		title: "Nutri-Score Cluster",
		body: "Grade A aligns with whole foods, while Grade E clusters around processed foods.",
		accent: "#10b981",
	},
	StoryCard {
		title: "Category Flows",
		body: "Unrolling the radial view into a Sankey diagram. Every product flows out of its grade.",
		accent: "#0ea5e9",
	},
	StoryCard {
		title: "Corner Turn",
		body: "We slide and rotate 90 degrees. The grades rotate away into the background, while the \
		       parallel coordinates swing out to face the viewer.",
		accent: "#f59e0b",
	},
];

/// Owned browser resources, dropped on unmount.
struct MorphHandles {
	_frames: AnimationLoop,
	_resize: Option<WindowListener>,
}

/// Scroll-driven radial → Sankey → parallel-coordinates morph.
///
/// `progress` is story progress in [0, 1]; the component stretches it over
/// its stages. `on_complete` fires once when the last stage is reached.
#[component]
pub fn StageMorph(
	#[prop(into)] products: Signal<Option<Vec<ProductRecord>>>,
	#[prop(into)] progress: Signal<f64>,
	#[prop(optional)] on_complete: Option<Callback<()>>,
) -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default().morph;
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<MorphState>>> = Rc::new(RefCell::new(None));
	let handles = StoredValue::new_local(None::<MorphHandles>);
	let stage = RwSignal::new(0usize);
	let hovered = RwSignal::new(None::<ProductRecord>);

	let state_init = state.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(records) = products.get().filter(|r| !r.is_empty()) else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h) = parent_size(&canvas, (800.0, 600.0));
		resize_canvas(&canvas, w, h);
		let Some(ctx) = context_2d(&canvas) else {
			warn!("stage morph: no 2d context");
			return;
		};

		let mut morph = MorphState::new(records, config.clone(), w, h);
		morph.set_progress(progress.get_untracked());
		stage.set(morph.stage());
		info!("stage morph ready with {} nodes", morph.layout.nodes().len());
		*state_init.borrow_mut() = Some(morph);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		let resize = WindowListener::new("resize", move || {
			let (nw, nh) = parent_size(&canvas_resize, (800.0, 600.0));
			resize_canvas(&canvas_resize, nw, nh);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		});

		let state_anim = state_init.clone();
		let frames = AnimationLoop::start(move |_| {
			if let Some(ref s) = *state_anim.borrow() {
				render::render(s, &ctx);
			}
		});

		handles.set_value(Some(MorphHandles {
			_frames: frames,
			_resize: resize,
		}));
	});

	let state_progress = state.clone();
	Effect::new(move |_| {
		let p = progress.get();
		let mut completed = false;
		if let Some(ref mut s) = *state_progress.borrow_mut() {
			completed = s.set_progress(p);
			stage.set(s.stage());
		}
		if completed {
			info!("stage morph complete");
			if let Some(cb) = on_complete {
				cb.run(());
			}
		}
	});

	on_cleanup(move || {
		handles.try_update_value(|h| h.take());
	});

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas, ev.client_x(), ev.client_y());
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			if s.pointer_move(p) {
				hovered.set(s.hovered_product().cloned());
			}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			if s.clear_hover() {
				hovered.set(None);
			}
		}
	};

	let product_count = move || products.with(|p| p.as_ref().map_or(0, Vec::len));
	let card = move || &STORY[stage.get().min(STORY.len() - 1)];

	view! {
		<div class="stage-morph">
			<div class="stage-morph__chart">
				<div class="stage-morph__legend">
					<h2>"Food Quality ecosystem"</h2>
					<ul>
						{Grade::ALL
							.iter()
							.map(|g| {
								view! {
									<li>
										<span class="swatch" style:background-color=g.color()></span>
										{g.letter()}
									</li>
								}
							})
							.collect_view()}
					</ul>
				</div>
				<canvas
					node_ref=canvas_ref
					class="stage-morph__canvas"
					on:mousemove=on_mousemove
					on:mouseleave=on_mouseleave
					style="display: block; width: 100%; height: 100%;"
				/>
				<Show when=move || products.with(|p| p.as_ref().is_none_or(Vec::is_empty))>
					<div class="chart-placeholder">
						{move || {
							if products.with(Option::is_none) { "Loading products..." } else { "No products to show." }
						}}
					</div>
				</Show>
			</div>
			<aside class="stage-morph__story">
				<div class="story-card" style:border-left-color=move || card().accent>
					<h3>{move || card().title}</h3>
					<p>
						{move || {
							if stage.get() == 0 {
								format!("The ecosystem of {} products. {}", product_count(), card().body)
							} else {
								card().body.to_string()
							}
						}}
					</p>
					<footer>
						<span>{move || format!("Stage {} / 3", (stage.get() + 1).min(3))}</span>
						<span>"Scroll"</span>
					</footer>
				</div>
				{move || hovered.get().map(|p| view! { <ProductCard product=p /> })}
			</aside>
		</div>
	}
}

#[component]
fn ProductCard(product: ProductRecord) -> impl IntoView {
	let color = product.grade.map_or("#64748b", Grade::color);
	let grade = product.grade.map_or("?", Grade::letter);
	view! {
		<div class="product-card" style:border-left-color=color>
			<h4>{product.full_name()}</h4>
			<dl>
				<dt>"Grade"</dt>
				<dd>{grade}</dd>
				<dt>"Category"</dt>
				<dd>{product.category_label().to_string()}</dd>
				<dt>"Energy"</dt>
				<dd>{format!("{} kcal", product.energy)}</dd>
				<dt>"Protein"</dt>
				<dd>{format!("{:.1}g", product.protein)}</dd>
				<dt>"Sugar"</dt>
				<dd>{format!("{:.1}g", product.sugar)}</dd>
				<dt>"Fat"</dt>
				<dd>{format!("{:.1}g", product.fat)}</dd>
				<dt>"Sat. Fat"</dt>
				<dd>{format!("{:.1}g", product.saturated_fat)}</dd>
				<dt>"Carbs"</dt>
				<dd>{format!("{:.1}g", product.carbohydrates)}</dd>
				<dt>"Fiber"</dt>
				<dd>{format!("{:.1}g", product.fiber)}</dd>
				<dt>"Sodium"</dt>
				<dd>{format!("{:.2}g", product.sodium)}</dd>
				<dt>"Additives"</dt>
				<dd>{product.additives.to_string()}</dd>
			</dl>
		</div>
	}
}
