//! Maps page scroll to a single story progress value.
//!
//! The page carries a sequence of invisible marker elements. Each marker owns
//! a contiguous slice of [0, 1]; while it travels from the bottom of the
//! viewport to fully above the top, progress sweeps through that slice.

use std::rc::Rc;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::dom::WindowListener;

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Segment {
	pub start: f64,
	pub end: f64,
}

impl Segment {
	pub const fn new(start: f64, end: f64) -> Self {
		Self { start, end }
	}
}

pub const DEFAULT_SEGMENTS: [Segment; 5] = [
	Segment::new(0.0, 0.15),
	Segment::new(0.15, 0.35),
	Segment::new(0.35, 0.55),
	Segment::new(0.55, 0.75),
	Segment::new(0.75, 1.0),
];

/// Viewport-relative box of a marker element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MarkerRect {
	pub top: f64,
	pub height: f64,
}

/// 0 when the marker's top touches the bottom of the viewport, 1 when its
/// bottom leaves the top. Not clamped.
pub fn marker_progress(rect: MarkerRect, viewport_height: f64) -> f64 {
	let span = viewport_height + rect.height;
	if span <= 0.0 {
		return 0.0;
	}
	(viewport_height - rect.top) / span
}

/// Walks markers in order. Passed markers contribute their `end`, the first
/// marker still on screen is interpolated into its slice, and anything after
/// it is ignored. Missing markers are skipped.
pub fn derive_progress(segments: &[Segment], markers: &[Option<MarkerRect>], viewport_height: f64) -> f64 {
	let mut progress = 0.0;
	for (segment, marker) in segments.iter().zip(markers) {
		let Some(rect) = marker else {
			continue;
		};
		let raw = marker_progress(*rect, viewport_height);
		if raw < 0.0 {
			break;
		} else if raw <= 1.0 {
			progress = segment.start + raw * (segment.end - segment.start);
			break;
		} else {
			progress = segment.end;
		}
	}
	progress
}

/// Stretches [0, 1] story progress over a multi-stage animation range.
pub fn staged(progress: f64, stages: f64) -> f64 {
	progress.clamp(0.0, 1.0) * stages
}

fn measure(marker_ids: &[String], segments: &[Segment]) -> Option<f64> {
	let window = web_sys::window()?;
	let document = window.document()?;
	let viewport_height = window.inner_height().ok()?.as_f64()?;
	let markers: Vec<Option<MarkerRect>> = marker_ids
		.iter()
		.map(|id| {
			document.get_element_by_id(id).map(|el| {
				let rect = el.get_bounding_client_rect();
				MarkerRect {
					top: rect.top(),
					height: rect.height(),
				}
			})
		})
		.collect();
	Some(derive_progress(segments, &markers, viewport_height))
}

/// Owns the window `scroll`/`resize` listeners that feed
/// [`derive_progress`]. Listeners are removed on [`ScrollTracker::dispose`]
/// or drop.
pub struct ScrollTracker {
	listeners: Vec<WindowListener>,
}

impl ScrollTracker {
	pub fn attach(
		marker_ids: Vec<String>,
		segments: Vec<Segment>,
		on_progress: impl Fn(f64) + 'static,
	) -> Self {
		let update = Rc::new(move || {
			if let Some(progress) = measure(&marker_ids, &segments) {
				on_progress(progress);
			}
		});

		let listeners: Vec<WindowListener> = ["scroll", "resize"]
			.into_iter()
			.filter_map(|event| {
				let update = update.clone();
				WindowListener::new(event, move || update())
			})
			.collect();
		debug!("scroll tracker attached ({} listeners)", listeners.len());
		update();

		Self { listeners }
	}

	pub fn dispose(&mut self) {
		if !self.listeners.is_empty() {
			self.listeners.clear();
			debug!("scroll tracker detached");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	/// Markers laid out down the page at `doc_tops`, seen at scroll offset `y`.
	fn at_scroll(doc_tops: &[f64], height: f64, y: f64) -> Vec<Option<MarkerRect>> {
		doc_tops
			.iter()
			.map(|top| Some(MarkerRect { top: top - y, height }))
			.collect()
	}

	#[test]
	fn untouched_markers_give_zero() {
		let markers = at_scroll(&[2000.0, 3000.0, 4000.0, 5000.0, 6000.0], 500.0, 0.0);
		assert_eq!(derive_progress(&DEFAULT_SEGMENTS, &markers, 800.0), 0.0);
	}

	#[test]
	fn halfway_through_second_marker() {
		let markers = vec![
			Some(MarkerRect { top: -900.0, height: 500.0 }),
			Some(MarkerRect { top: 150.0, height: 500.0 }),
			Some(MarkerRect { top: 2000.0, height: 500.0 }),
		];
		// raw = (800 - 150) / 1300 = 0.5
		let p = derive_progress(&DEFAULT_SEGMENTS[..3], &markers, 800.0);
		assert!((p - 0.25).abs() < 1e-12);
	}

	#[test]
	fn fully_scrolled_markers_report_their_end() {
		let markers = at_scroll(&[0.0, 1000.0, 2000.0, 3000.0, 4000.0], 500.0, 3700.0);
		// first three are past; the fourth is at raw (800 - (-700)) / 1300 > 1
		// and the fifth at (800 - 300) / 1300
		let p = derive_progress(&DEFAULT_SEGMENTS, &markers, 800.0);
		let expected = 0.75 + (500.0 / 1300.0) * 0.25;
		assert!((p - expected).abs() < 1e-12);

		let markers = at_scroll(&[0.0, 1000.0, 2000.0, 3000.0, 4000.0], 500.0, 10_000.0);
		assert_eq!(derive_progress(&DEFAULT_SEGMENTS, &markers, 800.0), 1.0);
	}

	#[test]
	fn missing_markers_are_skipped() {
		let markers = vec![None, Some(MarkerRect { top: 800.0, height: 100.0 })];
		assert_eq!(derive_progress(&DEFAULT_SEGMENTS[..2], &markers, 800.0), 0.15);
	}

	#[test]
	fn staged_clamps_before_scaling() {
		assert!((staged(0.4, 2.5) - 1.0).abs() < 1e-12);
		assert_eq!(staged(1.7, 2.5), 2.5);
		assert_eq!(staged(-0.2, 2.5), 0.0);
	}

	proptest! {
		#[test]
		fn progress_never_decreases_with_scroll(
			gaps in proptest::collection::vec(0f64..1500.0, 5),
			height in 50f64..1200.0,
			viewport in 300f64..1400.0,
		) {
			let mut tops = Vec::new();
			let mut cursor = viewport;
			for gap in gaps {
				cursor += gap;
				tops.push(cursor);
				cursor += height;
			}
			let mut last = 0.0;
			let mut y = 0.0;
			while y < cursor + viewport + 100.0 {
				let p = derive_progress(&DEFAULT_SEGMENTS, &at_scroll(&tops, height, y), viewport);
				prop_assert!(p + 1e-12 >= last, "progress fell from {} to {} at {}", last, p, y);
				prop_assert!((0.0..=1.0).contains(&p));
				last = p;
				y += 25.0;
			}
			prop_assert_eq!(last, 1.0);
		}
	}
}
