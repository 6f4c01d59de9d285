use std::collections::HashSet;

use log::debug;

use crate::config::NetworkConfig;
use crate::geometry::Point;
use crate::viewport::{ViewTransform, Viewport};

use super::types::NodeForm;

const ZOOMED_EDGE_OPACITY: f64 = 0.05;

/// The `count` nodes whose screen positions are nearest the viewport center.
/// World coordinates are centered: screen = `w/2 + x*k + tx`.
pub fn select_detail_nodes(
	positions: &[Point],
	transform: &ViewTransform,
	viewport: Viewport,
	count: usize,
) -> HashSet<usize> {
	let center = viewport.center();
	let mut by_distance: Vec<(f64, usize)> = positions
		.iter()
		.enumerate()
		.map(|(i, p)| {
			let screen = transform.apply(*p);
			let screen = Point::new(center.x + screen.x, center.y + screen.y);
			let d = screen.distance(center);
			(if d.is_finite() { d } else { f64::INFINITY }, i)
		})
		.collect();
	by_distance.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.cmp(&b.1)));
	by_distance.into_iter().take(count).map(|(_, i)| i).collect()
}

/// Node forms and edge fade for one transform.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LevelOfDetail {
	zoomed: bool,
	detail: HashSet<usize>,
}

impl LevelOfDetail {
	pub fn compute(
		positions: &[Point],
		transform: &ViewTransform,
		viewport: Viewport,
		config: &NetworkConfig,
	) -> Self {
		if transform.k <= config.lod_threshold {
			return Self::default();
		}
		Self {
			zoomed: true,
			detail: select_detail_nodes(positions, transform, viewport, config.detail_count),
		}
	}

	pub fn is_zoomed(&self) -> bool {
		self.zoomed
	}

	pub fn detail(&self) -> &HashSet<usize> {
		&self.detail
	}

	pub fn form(&self, idx: usize) -> NodeForm {
		match (self.zoomed, self.detail.contains(&idx)) {
			(false, _) => NodeForm::Macro,
			(true, true) => NodeForm::Micro,
			(true, false) => NodeForm::Simplified,
		}
	}

	pub fn edge_opacity(&self) -> f64 {
		if self.zoomed { ZOOMED_EDGE_OPACITY } else { 1.0 }
	}

	/// Replaces `self`, logging when the zoom level or detail set changed.
	pub fn update(&mut self, next: LevelOfDetail) -> bool {
		if *self == next {
			return false;
		}
		debug!(
			"lod: zoomed={} detail={:?}",
			next.zoomed,
			next.detail.iter().collect::<Vec<_>>()
		);
		*self = next;
		true
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	fn viewport() -> Viewport {
		Viewport {
			width: 1000.0,
			height: 800.0,
		}
	}

	fn grid() -> Vec<Point> {
		(0..25)
			.map(|i| Point::new((i % 5) as f64 * 100.0 - 200.0, (i / 5) as f64 * 100.0 - 200.0))
			.collect()
	}

	#[test]
	fn zoomed_out_shows_macro_everywhere() {
		let lod = LevelOfDetail::compute(&grid(), &ViewTransform::scaled(1.5), viewport(), &NetworkConfig::default());
		assert!(!lod.is_zoomed());
		assert!((0..25).all(|i| lod.form(i) == NodeForm::Macro));
		assert_eq!(lod.edge_opacity(), 1.0);
	}

	#[test]
	fn zoomed_in_details_nearest_five() {
		let t = ViewTransform::scaled(2.0);
		let lod = LevelOfDetail::compute(&grid(), &t, viewport(), &NetworkConfig::default());
		assert!(lod.is_zoomed());
		// center node plus its four direct neighbours
		let expected = HashSet::from([12, 7, 11, 13, 17]);
		assert_eq!(lod.detail(), &expected);
		assert_eq!(lod.form(12), NodeForm::Micro);
		assert_eq!(lod.form(0), NodeForm::Simplified);
		assert_eq!(lod.edge_opacity(), 0.05);
	}

	#[test]
	fn panning_moves_the_detail_set() {
		// shift the view so world (200, 200) sits at the center
		let t = ViewTransform { x: -400.0, y: -400.0, k: 2.0 };
		let detail = select_detail_nodes(&grid(), &t, viewport(), 1);
		assert_eq!(detail, HashSet::from([24]));
	}

	#[test]
	fn update_reports_changes() {
		let mut lod = LevelOfDetail::default();
		assert!(!lod.update(LevelOfDetail::default()));
		let next = LevelOfDetail::compute(&grid(), &ViewTransform::scaled(3.0), viewport(), &NetworkConfig::default());
		assert!(lod.update(next));
	}

	proptest! {
		#[test]
		fn detail_nodes_are_the_nearest(
			points in proptest::collection::vec((-500f64..500.0, -500f64..500.0), 0..40),
			tx in -300f64..300.0,
			ty in -300f64..300.0,
			k in 1.6f64..8.0,
			count in 0usize..8,
		) {
			let positions: Vec<Point> = points.iter().map(|&(x, y)| Point::new(x, y)).collect();
			let t = ViewTransform { x: tx, y: ty, k };
			let detail = select_detail_nodes(&positions, &t, viewport(), count);
			prop_assert_eq!(detail.len(), count.min(positions.len()));

			let dist = |i: usize| t.apply(positions[i]).distance(Point::new(0.0, 0.0));
			let farthest_in = detail.iter().map(|&i| dist(i)).fold(0.0, f64::max);
			for i in (0..positions.len()).filter(|i| !detail.contains(i)) {
				prop_assert!(dist(i) + 1e-9 >= farthest_in);
			}
		}
	}
}
