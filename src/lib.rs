//! Leptos client-side app wiring and routes.

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

// Modules
mod components;
mod config;
mod data;
mod dom;
mod error;
mod geometry;
mod pages;
mod scroll;
mod viewport;

use crate::config::{AppConfig, CONFIG_URL, load_config};
// Top-Level pages
use crate::pages::home::Home;
use crate::pages::not_found::NotFound;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Loads the configuration, then renders the router under it.
#[component]
pub fn App() -> impl IntoView {
	// Provides context that manages stylesheets, titles, meta tags, etc.
	provide_meta_context();

	let config = RwSignal::new(None::<AppConfig>);
	spawn_local(async move {
		config.set(Some(load_config(CONFIG_URL).await));
	});

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="light" />

		// sets the document title
		<Title text="The Hidden Shape of Food" />

		// injects metadata in the <head> of the page
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		{move || match config.get() {
			Some(config) => view! { <Routed config=config /> }.into_any(),
			None => view! { <div class="chart-placeholder">"Loading..."</div> }.into_any(),
		}}
	}
}

/// An app router which renders the story page and handles 404's
#[component]
fn Routed(config: AppConfig) -> impl IntoView {
	provide_context(config);

	view! {
		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=Home />
			</Routes>
		</Router>
	}
}
