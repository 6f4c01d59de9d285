use leptos::prelude::*;
use leptos::task::spawn_local;
use log::info;

use crate::components::additive_network::AdditiveNetwork;
use crate::components::linked_scatter::LinkedScatter;
use crate::components::stage_morph::StageMorph;
use crate::config::AppConfig;
use crate::data::load::{load_network, load_products, load_scatter};
use crate::data::{NetworkDataset, ProductRecord, ScatterPoint};
use crate::scroll::ScrollTracker;

/// Scroll markers driving the morph, one per segment.
const MARKER_IDS: [&str; 5] = ["morph-step-1", "morph-step-2", "morph-step-3", "morph-step-4", "morph-step-5"];

/// The story: hero, scroll-driven morph, additive network, product map.
#[component]
pub fn Home() -> impl IntoView {
	let config = use_context::<AppConfig>().unwrap_or_default();
	let products = RwSignal::new(None::<Vec<ProductRecord>>);
	let network = RwSignal::new(None::<NetworkDataset>);
	let scatter = RwSignal::new(None::<Vec<ScatterPoint>>);
	let progress = RwSignal::new(0.0);
	let morph_done = RwSignal::new(false);

	let urls = config.data.clone();
	spawn_local(async move {
		if let Some(p) = load_products(&urls.products_url).await {
			products.set(Some(p));
		}
	});
	let urls = config.data.clone();
	spawn_local(async move {
		if let Some(n) = load_network(&urls.additives_url).await {
			network.set(Some(n));
		}
	});
	let urls = config.data;
	spawn_local(async move {
		if let Some(s) = load_scatter(&urls.scatter_url).await {
			scatter.set(Some(s));
		}
	});

	let tracker = StoredValue::new_local(None::<ScrollTracker>);
	let segments = config.morph.segments;
	Effect::new(move |_| {
		let ids = MARKER_IDS.iter().map(|id| id.to_string()).collect();
		let attached = ScrollTracker::attach(ids, segments.clone(), move |p| progress.set(p));
		tracker.set_value(Some(attached));
	});
	on_cleanup(move || {
		tracker.try_update_value(|t| {
			if let Some(t) = t.as_mut() {
				t.dispose();
			}
		});
	});

	let on_complete = Callback::new(move |_| {
		info!("story reached the parallel coordinates");
		morph_done.set(true);
	});

	view! {
		<main class="story">
			<section class="hero">
				<div class="hero__text">
					<h1>"The Hidden Shape of Food"</h1>
					<p>
						"We walk the aisles every week, trusting the labels on the front of the box. \
						 But what if we could see the mathematical reality of what we eat?"
					</p>
					<p>
						"Using machine learning to analyze over 30,000 products, we mapped the hidden \
						 connections between ingredients, processing, and health."
					</p>
				</div>
			</section>

			<section class="scrolly">
				<div class="scrolly__sticky">
					<StageMorph products=products progress=progress on_complete=on_complete />
				</div>
				<div class="scrolly__steps">
					{MARKER_IDS.iter().map(|id| view! { <div class="scrolly__step" id=*id></div> }).collect_view()}
				</div>
				<p class="scrolly__next" class:visible=move || morph_done.get()>
					"Every product is now a line across its nutrients. Next: what holds them together."
				</p>
			</section>

			<section class="network-section">
				<AdditiveNetwork data=network />
			</section>

			<section class="scatter-section">
				<LinkedScatter data=scatter />
			</section>

			<footer class="story__footer">
				<p>"Data source: OpenFoodFacts."</p>
			</footer>
		</main>
	}
}
