//! Velocity-level forces layered over the charge/spring base physics. Each
//! force nudges `vx`/`vy`; [`integrate`] applies friction and moves bodies.

use crate::geometry::Point;

/// Fraction of velocity lost per tick.
pub const VELOCITY_DECAY: f64 = 0.4;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Body {
	pub x: f64,
	pub y: f64,
	pub vx: f64,
	pub vy: f64,
	pub radius: f64,
	/// Fixed position; a pinned body ignores every force.
	pub pin: Option<Point>,
}

impl Body {
	pub fn at(p: Point, radius: f64) -> Self {
		Self {
			x: p.x,
			y: p.y,
			radius,
			..Default::default()
		}
	}

	pub fn position(&self) -> Point {
		Point::new(self.x, self.y)
	}
}

/// A link constraint between two bodies.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Spring {
	pub source: usize,
	pub target: usize,
	pub distance: f64,
	pub strength: f64,
	/// Share of the correction taken by the target; the better connected end
	/// moves less.
	pub bias: f64,
}

/// `links` are `(source, target, distance, strength)`; biases come from the
/// endpoint degrees.
pub fn springs(node_count: usize, links: impl IntoIterator<Item = (usize, usize, f64, f64)>) -> Vec<Spring> {
	let links: Vec<_> = links
		.into_iter()
		.filter(|(s, t, ..)| *s < node_count && *t < node_count)
		.collect();
	let mut degree = vec![0usize; node_count];
	for (s, t, ..) in &links {
		degree[*s] += 1;
		degree[*t] += 1;
	}
	links
		.into_iter()
		.map(|(source, target, distance, strength)| Spring {
			source,
			target,
			distance,
			strength,
			bias: degree[source] as f64 / (degree[source] + degree[target]) as f64,
		})
		.collect()
}

/// Tiny deterministic offset that separates coincident bodies.
fn jiggle(i: usize, j: usize) -> f64 {
	if i < j { 1e-6 } else { -1e-6 }
}

pub fn apply_springs(bodies: &mut [Body], springs: &[Spring], alpha: f64) {
	for s in springs {
		let (src, tgt) = (bodies[s.source], bodies[s.target]);
		let mut x = tgt.x + tgt.vx - src.x - src.vx;
		let mut y = tgt.y + tgt.vy - src.y - src.vy;
		if x == 0.0 {
			x = jiggle(s.source, s.target);
		}
		if y == 0.0 {
			y = jiggle(s.source, s.target);
		}
		let len = (x * x + y * y).sqrt();
		let l = (len - s.distance) / len * alpha * s.strength;
		let (x, y) = (x * l, y * l);

		let t = &mut bodies[s.target];
		t.vx -= x * s.bias;
		t.vy -= y * s.bias;
		let src = &mut bodies[s.source];
		src.vx += x * (1.0 - s.bias);
		src.vy += y * (1.0 - s.bias);
	}
}

/// Pushes overlapping bodies apart. The collision radius is the body radius
/// plus `padding`; the smaller body moves more.
pub fn apply_collide(bodies: &mut [Body], padding: f64, strength: f64) {
	let n = bodies.len();
	for i in 0..n {
		let ri = bodies[i].radius + padding;
		let ri2 = ri * ri;
		let xi = bodies[i].x + bodies[i].vx;
		let yi = bodies[i].y + bodies[i].vy;
		for j in (i + 1)..n {
			let rj = bodies[j].radius + padding;
			let r = ri + rj;
			let mut x = xi - (bodies[j].x + bodies[j].vx);
			let mut y = yi - (bodies[j].y + bodies[j].vy);
			let mut l = x * x + y * y;
			if l >= r * r {
				continue;
			}
			if x == 0.0 {
				x = jiggle(i, j);
				l += x * x;
			}
			if y == 0.0 {
				y = jiggle(i, j);
				l += y * y;
			}
			let len = l.sqrt();
			let push = (r - len) / len * strength;
			let (x, y) = (x * push, y * push);
			let rj2 = rj * rj;
			let share = rj2 / (ri2 + rj2);

			bodies[i].vx += x * share;
			bodies[i].vy += y * share;
			bodies[j].vx -= x * (1.0 - share);
			bodies[j].vy -= y * (1.0 - share);
		}
	}
}

/// Pulls each body toward its own target along one axis.
pub fn apply_position_x(bodies: &mut [Body], target: impl Fn(usize) -> f64, strength: f64, alpha: f64) {
	for (i, b) in bodies.iter_mut().enumerate() {
		b.vx += (target(i) - b.x) * strength * alpha;
	}
}

pub fn apply_position_y(bodies: &mut [Body], target: impl Fn(usize) -> f64, strength: f64, alpha: f64) {
	for (i, b) in bodies.iter_mut().enumerate() {
		b.vy += (target(i) - b.y) * strength * alpha;
	}
}

/// Applies friction and moves free bodies; pinned bodies snap to their pin.
pub fn integrate(bodies: &mut [Body]) {
	for b in bodies {
		match b.pin {
			Some(p) => {
				b.x = p.x;
				b.y = p.y;
				b.vx = 0.0;
				b.vy = 0.0;
			}
			None => {
				b.vx *= 1.0 - VELOCITY_DECAY;
				b.vy *= 1.0 - VELOCITY_DECAY;
				b.x += b.vx;
				b.y += b.vy;
			}
		}
	}
}

/// Axis-aligned box a body's center must stay in.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
	pub min_x: f64,
	pub max_x: f64,
	pub min_y: f64,
	pub max_y: f64,
}

impl Bounds {
	/// Shrinks by `r` on every side. A box narrower than `2r` collapses onto
	/// its min edge.
	pub fn clamp(&self, p: Point, r: f64) -> Point {
		Point::new(
			(self.min_x + r).max((self.max_x - r).min(p.x)),
			(self.min_y + r).max((self.max_y - r).min(p.y)),
		)
	}
}
