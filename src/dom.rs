//! Browser plumbing shared by the canvas components: an owned
//! `requestAnimationFrame` loop, owned window listeners and canvas setup.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use log::debug;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement};

use crate::geometry::Point;

struct LoopInner {
	frame: RefCell<Option<Closure<dyn FnMut(f64)>>>,
	handle: Cell<Option<i32>>,
}

impl LoopInner {
	fn request(&self) {
		let Some(window) = web_sys::window() else {
			return;
		};
		if let Some(cb) = self.frame.borrow().as_ref() {
			if let Ok(id) = window.request_animation_frame(cb.as_ref().unchecked_ref()) {
				self.handle.set(Some(id));
			}
		}
	}
}

/// A frame callback that reschedules itself until stopped or dropped. The
/// callback gets the frame timestamp in ms.
pub struct AnimationLoop {
	inner: Rc<LoopInner>,
}

impl AnimationLoop {
	pub fn start(mut on_frame: impl FnMut(f64) + 'static) -> Self {
		let inner = Rc::new(LoopInner {
			frame: RefCell::new(None),
			handle: Cell::new(None),
		});
		let weak = Rc::downgrade(&inner);
		*inner.frame.borrow_mut() = Some(Closure::new(move |now: f64| {
			on_frame(now);
			if let Some(inner) = weak.upgrade() {
				inner.request();
			}
		}));
		inner.request();
		Self { inner }
	}

	pub fn stop(&self) {
		if let (Some(id), Some(window)) = (self.inner.handle.take(), web_sys::window()) {
			let _ = window.cancel_animation_frame(id);
		}
		if self.inner.frame.borrow_mut().take().is_some() {
			debug!("animation loop stopped");
		}
	}
}

impl Drop for AnimationLoop {
	fn drop(&mut self) {
		self.stop();
	}
}

/// A window event listener removed on drop.
pub struct WindowListener {
	event: &'static str,
	callback: Closure<dyn FnMut()>,
}

impl WindowListener {
	pub fn new(event: &'static str, callback: impl FnMut() + 'static) -> Option<Self> {
		let window = web_sys::window()?;
		let callback = Closure::<dyn FnMut()>::new(callback);
		window
			.add_event_listener_with_callback(event, callback.as_ref().unchecked_ref())
			.ok()?;
		Some(Self { event, callback })
	}
}

impl Drop for WindowListener {
	fn drop(&mut self) {
		if let Some(window) = web_sys::window() {
			let _ = window
				.remove_event_listener_with_callback(self.event, self.callback.as_ref().unchecked_ref());
		}
	}
}

pub fn context_2d(canvas: &HtmlCanvasElement) -> Option<CanvasRenderingContext2d> {
	canvas.get_context("2d").ok()??.dyn_into().ok()
}

/// Client size of the canvas's parent, or `fallback`.
pub fn parent_size(canvas: &HtmlCanvasElement, fallback: (f64, f64)) -> (f64, f64) {
	canvas
		.parent_element()
		.map(|p| (p.client_width() as f64, p.client_height() as f64))
		.filter(|(w, h)| *w > 0.0 && *h > 0.0)
		.unwrap_or(fallback)
}

/// Sizes the backing store to `width` x `height` CSS px.
pub fn resize_canvas(canvas: &HtmlCanvasElement, width: f64, height: f64) {
	canvas.set_width(width.max(1.0) as u32);
	canvas.set_height(height.max(1.0) as u32);
}

/// Pointer position relative to the element's top-left corner.
pub fn local_point(canvas: &HtmlCanvasElement, client_x: i32, client_y: i32) -> Point {
	let rect = canvas.get_bounding_client_rect();
	Point::new(client_x as f64 - rect.left(), client_y as f64 - rect.top())
}

pub fn viewport_width() -> f64 {
	web_sys::window()
		.and_then(|w| w.inner_width().ok())
		.and_then(|v| v.as_f64())
		.unwrap_or(1024.0)
}

pub fn now_ms() -> f64 {
	js_sys::Date::now()
}
