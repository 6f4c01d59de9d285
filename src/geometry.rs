//! Planar math shared by every chart: polar placement, interpolation, easing
//! and the pseudo-3D perspective used to swing axes in and out of view.

use std::f64::consts::PI;

/// Perspective divisor for [`project_3d`]. Large enough that the nine
/// parallel-coordinate axes stay on screen once rotated toward the viewer.
pub const PERSPECTIVE: f64 = 4000.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub const fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}

	pub fn distance(self, other: Point) -> f64 {
		let (dx, dy) = (self.x - other.x, self.y - other.y);
		(dx * dx + dy * dy).sqrt()
	}
}

/// Result of [`project_3d`]: the screen point, the perspective scale applied
/// to it and the rotated depth.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projected {
	pub x: f64,
	pub y: f64,
	pub scale: f64,
	pub z: f64,
}

impl Projected {
	pub fn point(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// Angle 0 points up, angles grow clockwise on screen.
pub fn polar_to_cartesian(cx: f64, cy: f64, radius: f64, angle_deg: f64) -> Point {
	let rad = (angle_deg - 90.0) * PI / 180.0;
	Point::new(cx + radius * rad.cos(), cy + radius * rad.sin())
}

/// Unclamped, so `t` slightly outside [0, 1] overshoots.
pub fn lerp(a: f64, b: f64, t: f64) -> f64 {
	a * (1.0 - t) + b * t
}

pub fn lerp_point(a: Point, b: Point, t: f64) -> Point {
	Point::new(lerp(a.x, b.x, t), lerp(a.y, b.y, t))
}

pub fn ease_cubic_in_out(t: f64) -> f64 {
	if t < 0.5 {
		4.0 * t * t * t
	} else {
		1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
	}
}

pub fn ease_cubic_out(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

/// Rotates `(x, z)` about the vertical axis through `pivot_x` and projects
/// with a perspective divisor. `y` is not rotated, only pulled toward
/// `pivot_y` by the same scale.
pub fn project_3d(x: f64, y: f64, z: f64, angle_deg: f64, pivot_x: f64, pivot_y: f64) -> Projected {
	let rad = angle_deg * PI / 180.0;
	let (sin, cos) = rad.sin_cos();
	let rot_x = x * cos - z * sin;
	let rot_z = z * cos + x * sin;
	let scale = PERSPECTIVE / (PERSPECTIVE + rot_z);

	Projected {
		x: pivot_x + rot_x * scale,
		y: pivot_y + (y - pivot_y) * scale,
		scale,
		z: rot_z,
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	const EPS: f64 = 1e-9;

	fn close(a: f64, b: f64) -> bool {
		(a - b).abs() < EPS * (1.0 + a.abs().max(b.abs()))
	}

	#[test]
	fn polar_zero_points_up() {
		let p = polar_to_cartesian(100.0, 100.0, 50.0, 0.0);
		assert!(close(p.x, 100.0));
		assert!(close(p.y, 50.0));

		let p = polar_to_cartesian(100.0, 100.0, 50.0, 90.0);
		assert!(close(p.x, 150.0));
		assert!(close(p.y, 100.0));
	}

	#[test]
	fn ease_fixed_points() {
		assert_eq!(ease_cubic_in_out(0.0), 0.0);
		assert_eq!(ease_cubic_in_out(1.0), 1.0);
		assert_eq!(ease_cubic_in_out(0.5), 0.5);
		assert_eq!(ease_cubic_out(0.0), 0.0);
		assert_eq!(ease_cubic_out(1.0), 1.0);
	}

	#[test]
	fn ease_is_symmetric() {
		for i in 0..=20 {
			let t = i as f64 / 20.0;
			assert!(close(ease_cubic_in_out(t) + ease_cubic_in_out(1.0 - t), 1.0));
		}
	}

	#[test]
	fn quarter_turn_moves_depth_onto_x() {
		// z = 400 swung by -90 degrees lands 400 to the right of the pivot, at depth 0
		let p = project_3d(0.0, 10.0, 400.0, -90.0, 300.0, 0.0);
		assert!(close(p.scale, 1.0));
		assert!((p.x - 700.0).abs() < 1e-6);
		assert!((p.y - 10.0).abs() < 1e-9);
	}

	#[test]
	fn depth_shrinks_toward_pivot_y() {
		let p = project_3d(0.0, 200.0, PERSPECTIVE, 0.0, 0.0, 100.0);
		assert!(close(p.scale, 0.5));
		assert!(close(p.y, 150.0));
	}

	proptest! {
		#[test]
		fn lerp_hits_endpoints(a in -1e6f64..1e6, b in -1e6f64..1e6) {
			prop_assert_eq!(lerp(a, b, 0.0), a);
			prop_assert_eq!(lerp(a, b, 1.0), b);
		}

		#[test]
		fn zero_rotation_is_identity(
			x in -5000f64..5000.0,
			y in -5000f64..5000.0,
			px in -5000f64..5000.0,
			py in -5000f64..5000.0,
		) {
			let p = project_3d(x, y, 0.0, 0.0, px, py);
			prop_assert_eq!(p.scale, 1.0);
			prop_assert!(close(p.x, px + x));
			prop_assert!(close(p.y, py + (y - py)));
		}

		#[test]
		fn ease_stays_in_unit_range(t in 0f64..=1.0) {
			let e = ease_cubic_in_out(t);
			prop_assert!((0.0..=1.0).contains(&e));
		}
	}
}
