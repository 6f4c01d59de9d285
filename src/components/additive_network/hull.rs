use geo::{Centroid, ConvexHull, MultiPoint};

use crate::data::ClusterGroup;
use crate::geometry::Point;

/// Outline of one cluster with its label anchor.
#[derive(Clone, Debug, PartialEq)]
pub struct ClusterHull {
	pub group: ClusterGroup,
	/// Hull vertices, ring not closed.
	pub points: Vec<Point>,
	pub centroid: Point,
}

/// One convex hull per cluster that has at least three nodes. `groups[i]` is
/// the cluster of the node at `positions[i]`.
pub fn cluster_hulls(groups: &[ClusterGroup], positions: &[Point]) -> Vec<ClusterHull> {
	ClusterGroup::ALL
		.iter()
		.filter_map(|&group| {
			let members: MultiPoint<f64> = groups
				.iter()
				.zip(positions)
				.filter(|(g, _)| **g == group)
				.map(|(_, p)| (p.x, p.y))
				.collect();
			if members.0.len() < 3 {
				return None;
			}
			let hull = members.convex_hull();
			let mut points: Vec<Point> = hull.exterior().points().map(|p| Point::new(p.x(), p.y())).collect();
			if points.len() > 1 && points.first() == points.last() {
				points.pop();
			}
			if points.len() < 3 {
				return None;
			}
			let centroid = hull.centroid().map(|c| Point::new(c.x(), c.y()))?;
			Some(ClusterHull {
				group,
				points,
				centroid,
			})
		})
		.collect()
}
