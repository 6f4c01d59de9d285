use leptos::prelude::*;

/// 404 Not Found Page
#[component]
pub fn NotFound() -> impl IntoView {
	view! {
		<section class="not-found">
			<h1>"Nothing on this shelf"</h1>
			<p>"The page you asked for does not exist."</p>
			<a href="/">"Back to the story"</a>
		</section>
	}
}
