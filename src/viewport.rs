//! Pan/zoom state shared by the interactive charts.
//!
//! A chart's world coordinates are mapped to the screen as
//! `origin + (x * k + tx, y * k + ty)`, where `origin` is fixed per chart (the
//! canvas center for the network, the top-left corner for scatter panels).

use crate::config::{PanelLayout, ZoomConfig};
use crate::geometry::{Point, ease_cubic_out, lerp};

/// Content is fitted with a 5% margin.
const FIT_MARGIN: f64 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

impl Default for ViewTransform {
	fn default() -> Self {
		Self::IDENTITY
	}
}

impl ViewTransform {
	pub const IDENTITY: ViewTransform = ViewTransform { x: 0.0, y: 0.0, k: 1.0 };

	pub fn scaled(k: f64) -> Self {
		Self { x: 0.0, y: 0.0, k }
	}

	pub fn apply(&self, p: Point) -> Point {
		Point::new(p.x * self.k + self.x, p.y * self.k + self.y)
	}

	pub fn invert(&self, p: Point) -> Point {
		Point::new((p.x - self.x) / self.k, (p.y - self.y) / self.k)
	}

	/// New scale `k`, keeping the world point under `anchor` (in transform
	/// space) fixed.
	pub fn zoom_about(&self, k: f64, anchor: Point) -> Self {
		let ratio = k / self.k;
		Self {
			x: anchor.x - (anchor.x - self.x) * ratio,
			y: anchor.y - (anchor.y - self.y) * ratio,
			k,
		}
	}

	pub fn interpolate(&self, to: &ViewTransform, t: f64) -> Self {
		Self {
			x: lerp(self.x, to.x, t),
			y: lerp(self.y, to.y, t),
			k: lerp(self.k, to.k, t),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Viewport {
	pub width: f64,
	pub height: f64,
}

impl Viewport {
	pub fn center(&self) -> Point {
		Point::new(self.width / 2.0, self.height / 2.0)
	}
}

/// Smallest scale at which a `content_width` x `content_height` layout fits.
pub fn fit_scale(viewport: Viewport, content_width: f64, content_height: f64) -> f64 {
	if content_width <= 0.0 || content_height <= 0.0 {
		return 1.0;
	}
	(viewport.width / content_width).min(viewport.height / content_height) * FIT_MARGIN
}

/// Uniform scale-to-fit with the content centered on both axes.
pub fn letterbox(viewport: Viewport, content_width: f64, content_height: f64) -> ViewTransform {
	let k = fit_scale(viewport, content_width, content_height) / FIT_MARGIN;
	ViewTransform {
		x: (viewport.width - content_width * k) / 2.0,
		y: (viewport.height - content_height * k) / 2.0,
		k,
	}
}

#[derive(Clone, Copy, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Copy, Debug)]
struct Transition {
	from: ViewTransform,
	to: ViewTransform,
	start_ms: f64,
	duration_ms: f64,
}

pub struct ZoomController {
	transform: ViewTransform,
	min_scale: f64,
	max_scale: f64,
	origin: Point,
	viewport: Viewport,
	scroll_zoom: bool,
	transition: Option<Transition>,
	pan: PanState,
	dirty: bool,
}

impl ZoomController {
	/// Starts at the fit-to-viewport scale.
	pub fn new(viewport: Viewport, origin: Point, min_scale: f64, max_scale: f64) -> Self {
		let min_scale = min_scale.min(max_scale);
		Self {
			transform: ViewTransform::scaled(min_scale),
			min_scale,
			max_scale,
			origin,
			viewport,
			scroll_zoom: false,
			transition: None,
			pan: PanState::default(),
			dirty: true,
		}
	}

	pub fn transform(&self) -> ViewTransform {
		self.transform
	}

	pub fn min_scale(&self) -> f64 {
		self.min_scale
	}

	pub fn max_scale(&self) -> f64 {
		self.max_scale
	}

	pub fn origin(&self) -> Point {
		self.origin
	}

	pub fn viewport(&self) -> Viewport {
		self.viewport
	}

	pub fn resize(&mut self, viewport: Viewport, origin: Point) {
		self.viewport = viewport;
		self.origin = origin;
		self.dirty = true;
	}

	fn clamp_scale(&self, k: f64) -> f64 {
		k.clamp(self.min_scale, self.max_scale)
	}

	/// Replaces the transform (scale clamped) and cancels any running
	/// transition.
	pub fn set_transform(&mut self, t: ViewTransform) {
		self.transition = None;
		self.apply_transform(t);
	}

	fn apply_transform(&mut self, t: ViewTransform) {
		let k = self.clamp_scale(t.k);
		self.transform = ViewTransform { k, ..t };
		self.dirty = true;
	}

	pub fn to_screen(&self, world: Point) -> Point {
		let p = self.transform.apply(world);
		Point::new(self.origin.x + p.x, self.origin.y + p.y)
	}

	pub fn to_world(&self, screen: Point) -> Point {
		self.transform
			.invert(Point::new(screen.x - self.origin.x, screen.y - self.origin.y))
	}

	/// Returns and clears the "transform changed" flag.
	pub fn take_dirty(&mut self) -> bool {
		std::mem::take(&mut self.dirty)
	}

	pub fn scroll_zoom_enabled(&self) -> bool {
		self.scroll_zoom
	}

	pub fn set_scroll_zoom(&mut self, enabled: bool) {
		self.scroll_zoom = enabled;
	}

	pub fn begin_pan(&mut self, screen: Point) {
		self.transition = None;
		self.pan = PanState {
			active: true,
			start_x: screen.x,
			start_y: screen.y,
			transform_start_x: self.transform.x,
			transform_start_y: self.transform.y,
		};
	}

	pub fn is_panning(&self) -> bool {
		self.pan.active
	}

	pub fn pan_to(&mut self, screen: Point) {
		if !self.pan.active {
			return;
		}
		let t = ViewTransform {
			x: self.pan.transform_start_x + (screen.x - self.pan.start_x),
			y: self.pan.transform_start_y + (screen.y - self.pan.start_y),
			k: self.transform.k,
		};
		self.apply_transform(t);
	}

	pub fn end_pan(&mut self) {
		self.pan.active = false;
	}

	/// Wheel zoom about the pointer. Returns `false` (event not consumed) while
	/// scroll zoom is switched off so the page keeps scrolling.
	pub fn wheel(&mut self, screen: Point, delta_y: f64) -> bool {
		if !self.scroll_zoom {
			return false;
		}
		self.transition = None;
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let k = self.clamp_scale(self.transform.k * factor);
		let anchor = Point::new(screen.x - self.origin.x, screen.y - self.origin.y);
		let t = self.transform.zoom_about(k, anchor);
		self.apply_transform(t);
		true
	}

	/// Transform that zooms in on `world` and parks it horizontally between
	/// the side panels, vertically centered.
	pub fn center_target(
		&self,
		world: Point,
		zoom: &ZoomConfig,
		panels: &PanelLayout,
		viewport_width: f64,
	) -> ViewTransform {
		let k = self.clamp_scale(
			zoom.min_click_zoom
				.max(self.transform.k * zoom.click_zoom_factor),
		);
		let target_x = panels.center_x(self.viewport.width, viewport_width);
		let target_y = self.viewport.height / 2.0;
		ViewTransform {
			x: target_x - self.origin.x - world.x * k,
			y: target_y - self.origin.y - world.y * k,
			k,
		}
	}

	pub fn animate_to(&mut self, to: ViewTransform, now_ms: f64, duration_ms: f64) {
		let to = ViewTransform {
			k: self.clamp_scale(to.k),
			..to
		};
		self.transition = Some(Transition {
			from: self.transform,
			to,
			start_ms: now_ms,
			duration_ms: duration_ms.max(1.0),
		});
	}

	pub fn center_on(&mut self, world: Point, zoom: &ZoomConfig, viewport_width: f64, now_ms: f64) {
		let target = self.center_target(world, zoom, &zoom.panels, viewport_width);
		self.animate_to(target, now_ms, zoom.transition_ms);
	}

	/// Back to the natural fit scale.
	pub fn reset(&mut self, now_ms: f64, duration_ms: f64) {
		self.animate_to(ViewTransform::scaled(self.min_scale), now_ms, duration_ms);
	}

	pub fn is_animating(&self) -> bool {
		self.transition.is_some()
	}

	/// Steps a running transition with cubic-out easing. Returns whether the
	/// transform changed.
	pub fn advance(&mut self, now_ms: f64) -> bool {
		let Some(tr) = self.transition else {
			return false;
		};
		let t = ((now_ms - tr.start_ms) / tr.duration_ms).clamp(0.0, 1.0);
		let next = if t >= 1.0 {
			self.transition = None;
			tr.to
		} else {
			tr.from.interpolate(&tr.to, ease_cubic_out(t))
		};
		self.apply_transform(next);
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn controller() -> ZoomController {
		let viewport = Viewport {
			width: 1600.0,
			height: 900.0,
		};
		let min = fit_scale(viewport, 1600.0, 900.0);
		ZoomController::new(viewport, viewport.center(), min, 8.0)
	}

	#[test]
	fn fit_scale_uses_tighter_axis() {
		let viewport = Viewport {
			width: 1000.0,
			height: 500.0,
		};
		assert!((fit_scale(viewport, 2000.0, 500.0) - 0.475).abs() < 1e-12);
	}

	#[test]
	fn letterbox_centers_the_short_axis() {
		let viewport = Viewport {
			width: 1000.0,
			height: 800.0,
		};
		let t = letterbox(viewport, 2000.0, 880.0);
		assert!((t.k - 0.5).abs() < 1e-12);
		assert!(t.x.abs() < 1e-9);
		assert!((t.y - 180.0).abs() < 1e-9);
	}

	#[test]
	fn world_screen_round_trip() {
		let mut zoom = controller();
		zoom.set_transform(ViewTransform { x: 30.0, y: -10.0, k: 2.0 });
		let screen = zoom.to_screen(Point::new(5.0, 5.0));
		assert_eq!(screen, Point::new(800.0 + 40.0, 450.0));
		assert_eq!(zoom.to_world(screen), Point::new(5.0, 5.0));
	}

	#[test]
	fn wheel_is_ignored_until_enabled() {
		let mut zoom = controller();
		let before = zoom.transform();
		assert!(!zoom.wheel(Point::new(100.0, 100.0), -1.0));
		assert_eq!(zoom.transform(), before);

		zoom.set_scroll_zoom(true);
		assert!(zoom.wheel(Point::new(100.0, 100.0), -1.0));
		assert!(zoom.transform().k > before.k);
	}

	#[test]
	fn wheel_keeps_pointer_fixed() {
		let mut zoom = controller();
		zoom.set_scroll_zoom(true);
		let pointer = Point::new(1200.0, 300.0);
		let world = zoom.to_world(pointer);
		zoom.wheel(pointer, -1.0);
		let after = zoom.to_screen(world);
		assert!((after.x - pointer.x).abs() < 1e-9);
		assert!((after.y - pointer.y).abs() < 1e-9);
	}

	#[test]
	fn pan_moves_by_pointer_delta() {
		let mut zoom = controller();
		let start = zoom.transform();
		zoom.begin_pan(Point::new(10.0, 10.0));
		zoom.pan_to(Point::new(60.0, -15.0));
		zoom.end_pan();
		zoom.pan_to(Point::new(500.0, 500.0));
		assert_eq!(zoom.transform().x, start.x + 50.0);
		assert_eq!(zoom.transform().y, start.y - 25.0);
	}

	#[test]
	fn center_on_lands_between_panels() {
		let mut zoom = controller();
		let zoom_cfg = ZoomConfig::default();
		let node = Point::new(-220.0, 140.0);
		let before = zoom.transform().k;

		zoom.center_on(node, &zoom_cfg, 1600.0, 0.0);
		assert!(zoom.is_animating());
		zoom.advance(375.0);
		assert!(zoom.is_animating());
		zoom.advance(750.0);
		assert!(!zoom.is_animating());

		let expected_x = zoom_cfg.panels.center_x(1600.0, 1600.0);
		let screen = zoom.to_screen(node);
		assert!((screen.x - expected_x).abs() < 1e-6);
		assert!((screen.y - 450.0).abs() < 1e-6);
		assert!(zoom.transform().k > before);
		assert_eq!(zoom.transform().k, 5.0);
	}

	#[test]
	fn repeated_clicks_keep_zooming_in_until_max() {
		let mut zoom = controller();
		let zoom_cfg = ZoomConfig::default();
		zoom.set_transform(ViewTransform::scaled(3.0));
		let target = zoom.center_target(Point::new(0.0, 0.0), &zoom_cfg, &zoom_cfg.panels, 1600.0);
		// 2.5 * 3 = 7.5 beats the 5x floor
		assert_eq!(target.k, 7.5);

		zoom.set_transform(ViewTransform::scaled(6.0));
		let target = zoom.center_target(Point::new(0.0, 0.0), &zoom_cfg, &zoom_cfg.panels, 1600.0);
		assert_eq!(target.k, 8.0);
	}

	#[test]
	fn reset_returns_to_fit() {
		let mut zoom = controller();
		zoom.set_transform(ViewTransform { x: 200.0, y: 50.0, k: 4.0 });
		zoom.reset(1000.0, 750.0);
		zoom.advance(2000.0);
		assert_eq!(zoom.transform(), ViewTransform::scaled(zoom.min_scale()));
	}

	#[test]
	fn dirty_flag_tracks_changes() {
		let mut zoom = controller();
		assert!(zoom.take_dirty());
		assert!(!zoom.take_dirty());
		zoom.begin_pan(Point::new(0.0, 0.0));
		zoom.pan_to(Point::new(1.0, 0.0));
		assert!(zoom.take_dirty());
	}

	proptest! {
		#[test]
		fn scale_always_within_extent(
			ops in proptest::collection::vec((0u8..4, -3000f64..3000.0, -3000f64..3000.0, 0.01f64..50.0), 1..40)
		) {
			let mut zoom = controller();
			zoom.set_scroll_zoom(true);
			let cfg = ZoomConfig::default();
			let mut now = 0.0;
			for (op, a, b, k) in ops {
				match op {
					0 => { zoom.wheel(Point::new(a, b), if k > 1.0 { 1.0 } else { -1.0 }); }
					1 => zoom.set_transform(ViewTransform { x: a, y: b, k }),
					2 => zoom.center_on(Point::new(a, b), &cfg, 1600.0, now),
					_ => { zoom.begin_pan(Point::new(0.0, 0.0)); zoom.pan_to(Point::new(a, b)); zoom.end_pan(); }
				}
				now += 100.0;
				zoom.advance(now);
				let k = zoom.transform().k;
				prop_assert!(k >= zoom.min_scale() - 1e-12 && k <= zoom.max_scale() + 1e-12);
			}
		}
	}
}
