use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{info, warn};
use web_sys::{HtmlCanvasElement, MouseEvent, WheelEvent};

use super::boxplot::{self, BoxPlotStyle, nova_color};
use super::render::{self, grade_fill};
use super::state::{NetworkState, PointerRelease, SelectionSummary};
use super::types::{AdditiveNode, BrandOption, ViewMode};
use crate::config::AppConfig;
use crate::data::NetworkDataset;
use crate::dom::{
	AnimationLoop, WindowListener, context_2d, local_point, now_ms, parent_size, resize_canvas,
	viewport_width,
};

/// One row of the search dropdown.
#[derive(Clone, Debug, PartialEq)]
struct SearchHit {
	index: usize,
	id: String,
	name: String,
}

/// Owned browser resources, dropped on unmount. Dropping also stops the
/// simulation.
struct NetworkHandles {
	state: Rc<RefCell<Option<NetworkState>>>,
	_frames: AnimationLoop,
	_resize: Option<WindowListener>,
}

impl Drop for NetworkHandles {
	fn drop(&mut self) {
		if let Some(ref mut s) = *self.state.borrow_mut() {
			s.sim.dispose();
		}
	}
}

/// Reactive mirror of what the overlays show.
#[derive(Clone, Copy)]
struct Panels {
	summary: RwSignal<Option<SelectionSummary>>,
	selected: RwSignal<Option<AdditiveNode>>,
	popup: RwSignal<Option<AdditiveNode>>,
}

impl Panels {
	fn new() -> Self {
		Self {
			summary: RwSignal::new(None),
			selected: RwSignal::new(None),
			popup: RwSignal::new(None),
		}
	}

	fn sync(&self, s: &NetworkState) {
		let summary = s.selection_summary();
		let selected = summary
			.as_ref()
			.and_then(|sum| sum.primary)
			.and_then(|i| s.graph.nodes.get(i).cloned());
		self.selected.set(selected);
		self.summary.set(summary);
		self.popup.set(s.popup.and_then(|i| s.graph.nodes.get(i).cloned()));
	}
}

/// Additive co-occurrence explorer: a pinned force layout with pan/zoom,
/// level-of-detail box plots, a selection panel and a detail popup.
#[component]
pub fn AdditiveNetwork(#[prop(into)] data: Signal<Option<NetworkDataset>>) -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let state: Rc<RefCell<Option<NetworkState>>> = Rc::new(RefCell::new(None));
	let handles = StoredValue::new_local(None::<NetworkHandles>);
	let mode = RwSignal::new(ViewMode::default());
	let brands = RwSignal::new(Vec::<BrandOption>::new());
	let brand = RwSignal::new(String::new());
	let scroll_zoom = RwSignal::new(false);
	let query = RwSignal::new(String::new());
	let hits = RwSignal::new(Vec::<SearchHit>::new());
	let picked = RwSignal::new(None::<usize>);
	let panels = Panels::new();
	let clear_search = move || {
		query.set(String::new());
		hits.set(Vec::new());
	};

	let state_init = state.clone();
	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(dataset) = data.get().filter(|d| !d.is_empty()) else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let (w, h) = parent_size(&canvas, (1200.0, 800.0));
		resize_canvas(&canvas, w, h);
		let Some(ctx) = context_2d(&canvas) else {
			warn!("additive network: no 2d context");
			return;
		};

		handles.update_value(|h| *h = None);
		let mut network = NetworkState::new(dataset, &config, w, h, mode.get_untracked());
		network.zoom.set_scroll_zoom(scroll_zoom.get_untracked());
		brands.set(network.brands().to_vec());
		brand.set(String::new());
		clear_search();
		panels.sync(&network);
		info!("additive network mounted at {w}x{h}");
		*state_init.borrow_mut() = Some(network);

		let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
		let resize = WindowListener::new("resize", move || {
			let (nw, nh) = parent_size(&canvas_resize, (1200.0, 800.0));
			resize_canvas(&canvas_resize, nw, nh);
			if let Some(ref mut s) = *state_resize.borrow_mut() {
				s.resize(nw, nh);
			}
		});

		let state_anim = state_init.clone();
		let frames = AnimationLoop::start(move |now| {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				s.frame(now);
				render::render(s, &ctx);
			}
		});

		handles.set_value(Some(NetworkHandles {
			state: state_init.clone(),
			_frames: frames,
			_resize: resize,
		}));
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
			s.pointer_down(p);
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(p) = pointer(&ev) else {
			return;
		};
		if let Some(ref mut s) = *state_mm.borrow_mut() {
			s.pointer_move(p);
		}
	};

	let state_mu = state.clone();
	let on_mouseup = move |ev: MouseEvent| {
		let toggle = ev.ctrl_key() || ev.meta_key();
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			if let PointerRelease::Clicked(_) = s.pointer_up(toggle, now_ms(), viewport_width()) {
				panels.sync(s);
			}
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.pointer_leave();
		}
	};

	let state_dc = state.clone();
	let on_dblclick = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_dc.borrow_mut() {
			s.reset_view(now_ms());
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let p = local_point(&canvas, ev.client_x(), ev.client_y());
		if let Some(ref mut s) = *state_wh.borrow_mut() {
			if s.wheel(p, ev.delta_y()) {
				ev.prevent_default();
			}
		}
	};

	let state_mode = state.clone();
	let set_mode = move |next: ViewMode| {
		if let Some(ref mut s) = *state_mode.borrow_mut() {
			s.set_mode(next);
		}
		mode.set(next);
	};
	let set_cluster = set_mode.clone();
	let set_grade = set_mode;

	let state_brand = state.clone();
	let on_brand = move |ev: leptos::ev::Event| {
		let value = event_target_value(&ev);
		if let Some(ref mut s) = *state_brand.borrow_mut() {
			if s.set_brand((!value.is_empty()).then_some(value.as_str())) {
				panels.sync(s);
			}
		}
		brand.set(value);
		clear_search();
	};

	let state_search = state.clone();
	let on_search = move |ev: leptos::ev::Event| {
		let value = event_target_value(&ev);
		if let Some(ref s) = *state_search.borrow() {
			let found = s
				.search(&value)
				.into_iter()
				.filter_map(|index| {
					let node = s.graph.nodes.get(index)?;
					Some(SearchHit {
						index,
						id: node.id().to_string(),
						name: node.name().to_string(),
					})
				})
				.collect();
			hits.set(found);
		}
		query.set(value);
	};

	let state_pick = state.clone();
	Effect::new(move |_| {
		let Some(index) = picked.get() else {
			return;
		};
		if let Some(ref mut s) = *state_pick.borrow_mut() {
			s.click(index, false, now_ms(), viewport_width());
			panels.sync(s);
		}
		picked.set(None);
		clear_search();
	});

	let state_reset = state.clone();
	let on_reset = move |_| {
		if let Some(ref mut s) = *state_reset.borrow_mut() {
			s.reset_view(now_ms());
		}
	};

	let state_scroll = state.clone();
	let on_scroll_zoom = move |_| {
		let next = !scroll_zoom.get_untracked();
		if let Some(ref mut s) = *state_scroll.borrow_mut() {
			s.zoom.set_scroll_zoom(next);
		}
		scroll_zoom.set(next);
	};

	let state_close = state.clone();
	let on_close_panel = move |_| {
		if let Some(ref mut s) = *state_close.borrow_mut() {
			s.close_selection();
			panels.sync(s);
		}
	};

	let state_popup = state.clone();
	let on_close_popup = move |_| {
		if let Some(ref mut s) = *state_popup.borrow_mut() {
			s.close_popup();
			panels.sync(s);
		}
	};

	let shown = |visible: bool| if visible { "" } else { "none" };

	view! {
		<div class="additive-network">
			<header class="additive-network__header">
				<div>
					<h2>"Additive Network Analysis"</h2>
					<p>"Visualizing Co-occurrence in Processed Foods"</p>
				</div>
				<div class="additive-network__controls">
					<button
						class:active=move || mode.get() == ViewMode::Cluster
						on:click=move |_| set_cluster(ViewMode::Cluster)
					>
						{ViewMode::Cluster.label()}
					</button>
					<button
						class:active=move || mode.get() == ViewMode::Grade
						on:click=move |_| set_grade(ViewMode::Grade)
					>
						{ViewMode::Grade.label()}
					</button>
					<div class="additive-network__search">
						<input
							type="text"
							placeholder="Find additive..."
							prop:value=move || query.get()
							on:input=on_search
						/>
						<button
							class="clear"
							style:display=move || shown(query.with(|q| !q.is_empty()))
							on:click=move |_| clear_search()
						>
							"×"
						</button>
						<ul class="search-results" style:display=move || shown(hits.with(|h| !h.is_empty()))>
							{move || {
								hits.get()
									.into_iter()
									.map(|SearchHit { index, id, name }| {
										view! {
											<li>
												<button on:click=move |_| picked.set(Some(index))>
													<span class="badge">{id}</span>
													<span class="muted">{name}</span>
												</button>
											</li>
										}
									})
									.collect_view()
							}}
						</ul>
					</div>
					<select
						class="additive-network__brands"
						style:display=move || shown(mode.get() == ViewMode::Grade)
						prop:value=move || brand.get()
						on:change=on_brand
					>
						<option value="">"All brands"</option>
						{move || {
							brands
								.get()
								.into_iter()
								.map(|b| {
									view! {
										<option value=b.id.clone()>{format!("{} ({})", b.label, b.count)}</option>
									}
								})
								.collect_view()
						}}
					</select>
					<button on:click=on_reset>"Reset View"</button>
					<button class:active=move || scroll_zoom.get() on:click=on_scroll_zoom>
						{move || if scroll_zoom.get() { "Scroll Zoom: ON" } else { "Scroll Zoom: OFF" }}
					</button>
				</div>
			</header>
			<div class="additive-network__stage">
				<canvas
					node_ref=canvas_ref
					class="additive-network__canvas"
					on:mousedown=on_mousedown
					on:mousemove=on_mousemove
					on:mouseup=on_mouseup
					on:mouseleave=on_mouseleave
					on:dblclick=on_dblclick
					on:wheel=on_wheel
					style="display: block; width: 100%; height: 100%; cursor: grab;"
				/>
				<div
					class="chart-placeholder"
					style:display=move || shown(data.with(|d| d.as_ref().is_none_or(NetworkDataset::is_empty)))
				>
					{move || {
						if data.with(Option::is_none) { "Loading additive network data..." } else { "No additives to show." }
					}}
				</div>
				<div
					class="additive-network__popup"
					style:display=move || shown(panels.popup.with(Option::is_some))
				>
					<button class="close" on:click=on_close_popup>
						"×"
					</button>
					{move || panels.popup.get().map(|node| view! { <PopupBoxPlot node=node /> })}
				</div>
				<aside
					class="additive-network__panel"
					style:display=move || shown(panels.summary.with(Option::is_some))
				>
					<button class="close" on:click=on_close_panel>
						"×"
					</button>
					{move || {
						panels
							.summary
							.get()
							.map(|summary| view! { <SelectionPanel summary=summary selected=panels.selected.get() /> })
					}}
				</aside>
			</div>
		</div>
	}
}

#[component]
fn SelectionPanel(summary: SelectionSummary, selected: Option<AdditiveNode>) -> impl IntoView {
	let heading = match &selected {
		Some(node) => {
			let grade = node.grade;
			view! {
				<div class="panel-heading">
					<div class="badges">
						<span class="badge">{node.id().to_string()}</span>
						<span class="badge" style:background-color=node.record.group.color()>
							{node.record.group.label()}
						</span>
						<span class="badge" style:background-color=grade_fill(grade)>
							{format!("Grade: {}", grade.letter())}
						</span>
					</div>
					<h3>{node.name().to_string()}</h3>
					<p>{node.description()}</p>
					<p class="muted">{format!("Frequency: {}", node.record.freq)}</p>
				</div>
			}
			.into_any()
		}
		None => view! {
			<div class="panel-heading">
				<span class="badge">{format!("{} SELECTED", summary.count)}</span>
				<h3>"Custom Cocktail"</h3>
				<p class="muted">{summary.names.join(", ")}</p>
			</div>
		}
		.into_any(),
	};

	let pairings = (!summary.pairings.is_empty()).then(|| {
		view! {
			<section>
				<h4>"Industrial Pairings"</h4>
				<ul class="pairings">
					{summary.pairings.iter().map(|p| view! { <li>{p.clone()}</li> }).collect_view()}
				</ul>
			</section>
		}
	});

	view! {
		{heading}
		<section>
			<h4>
				"Found In Products" <span class="muted">{format!("{} total", summary.product_total)}</span>
			</h4>
			<ul class="products">
				{summary.products.iter().map(|p| view! { <li>{p.clone()}</li> }).collect_view()}
			</ul>
		</section>
		{pairings}
	}
}

/// Large box plot of one additive's Nutri-Score spread per NOVA group.
#[component]
fn PopupBoxPlot(node: AdditiveNode) -> impl IntoView {
	let (w, h) = boxplot::POPUP_SIZE;
	let geometry = boxplot::layout(&node.boxes, boxplot::popup_frame(), &BoxPlotStyle::POPUP);

	let chart = match geometry {
		Some(g) => {
			let plot = g.plot;
			let grid = g
				.ticks
				.iter()
				.map(|&(value, y)| {
					view! {
						<line x1=plot.x x2={plot.right()} y1=y y2=y stroke="#e2e8f0" stroke-width="1" />
						<text x={plot.x - 8.0} y={y + 4.0} text-anchor="end" font-size="11" fill="#64748b">
							{value.to_string()}
						</text>
					}
				})
				.collect_view();
			let legend = g
				.boxes
				.iter()
				.enumerate()
				.map(|(i, b)| {
					let y = plot.y + i as f64 * 18.0;
					view! {
						<rect x={plot.right() + 10.0} y=y width="10" height="10" fill=b.color />
						<text x={plot.right() + 24.0} y={y + 9.0} font-size="10" fill="#475569">
							{format!("N{}", b.nova)}
						</text>
					}
				})
				.collect_view();
			let boxes = g
				.boxes
				.into_iter()
				.map(|b| {
					let outliers = b
						.outlier_ys
						.iter()
						.map(|&y| view! { <circle cx=b.center_x cy=y r="3" fill=b.color stroke="#1e293b" stroke-width="0.8" /> })
						.collect_view();
					view! {
						<line
							x1=b.center_x
							x2=b.center_x
							y1=b.whisker.0
							y2=b.whisker.1
							stroke=b.color
							stroke-width="2.5"
						/>
						<rect
							x=b.x
							y=b.box_top
							width=b.width
							height=b.box_height
							fill=b.color
							fill-opacity="0.7"
							stroke="#1e293b"
							stroke-width="1.5"
						/>
						<line x1=b.x x2={b.x + b.width} y1=b.median_y y2=b.median_y stroke="#1e293b" stroke-width="2.5" />
						{outliers}
						<text x=b.center_x y={plot.bottom() + 18.0} text-anchor="middle" font-size="11" fill=nova_color(b.nova)>
							{format!("NOVA {}", b.nova)}
						</text>
					}
				})
				.collect_view();
			view! {
				<svg width=w height=h viewBox=format!("0 0 {w} {h}")>
					{grid}
					{boxes}
					{legend}
					<text x={plot.x + plot.width / 2.0} y={h - 10.0} text-anchor="middle" font-size="12" font-weight="600">
						"Nova Group"
					</text>
					<text
						transform=format!("translate(14, {}) rotate(-90)", plot.y + plot.height / 2.0)
						text-anchor="middle"
						font-size="12"
						font-weight="600"
					>
						"Nutri-Score"
					</text>
				</svg>
			}
			.into_any()
		}
		None => view! {
			<p class="muted">{format!("No box plot data for {}", boxplot::fallback_name(node.name()))}</p>
		}
		.into_any(),
	};

	view! {
		<h3>{node.name().to_string()}</h3>
		<span class="badge">{node.id().to_string()}</span>
		{chart}
	}
}
