use super::types::{Grade, Nutrient, ProductRecord};

/// Deterministic pseudo-random value in [0, 1) so the sampled products are
/// stable across reloads.
fn rand_simple(seed: usize) -> f64 {
	let x = ((seed + 1) * 9301 + 49297) % 233280;
	(x as f64) / 233280.0
}

fn shuffle<T>(items: &mut [T], salt: usize) {
	for i in (1..items.len()).rev() {
		let j = (rand_simple(i + salt) * (i + 1) as f64) as usize;
		items.swap(i, j.min(i));
	}
}

/// Picks at most `max_total` graded products, spread evenly over the grades
/// present (`ceil(max_total / grades)` each). The result is ordered by grade.
pub fn sample_products(records: &[ProductRecord], max_total: usize) -> Vec<ProductRecord> {
	let mut by_grade: [Vec<&ProductRecord>; 5] = Default::default();
	for record in records {
		if let Some(grade) = record.grade {
			by_grade[grade.index()].push(record);
		}
	}

	let present = by_grade.iter().filter(|g| !g.is_empty()).count();
	if present == 0 || max_total == 0 {
		return Vec::new();
	}
	let per_grade = max_total.div_ceil(present);

	let mut sampled: Vec<&ProductRecord> = Vec::new();
	for (i, group) in by_grade.iter_mut().enumerate() {
		if group.len() > per_grade {
			shuffle(group, i * 7919);
			group.truncate(per_grade);
		}
		sampled.extend(group.iter().copied());
	}

	if sampled.len() > max_total {
		shuffle(&mut sampled, 104_729);
		sampled.truncate(max_total);
		sampled.sort_by_key(|p| p.grade);
	}
	sampled.into_iter().cloned().collect()
}

pub fn grade_counts(records: &[ProductRecord]) -> [usize; 5] {
	let mut counts = [0; 5];
	for grade in records.iter().filter_map(|r| r.grade) {
		counts[grade.index()] += 1;
	}
	counts
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Range {
	pub min: f64,
	pub max: f64,
}

/// Observed per-nutrient ranges over the full dataset, not just the sample.
/// Zero values are treated as "not reported" and ignored.
#[derive(Clone, Debug, PartialEq)]
pub struct NutrientRanges {
	ranges: [Range; 9],
}

impl NutrientRanges {
	pub fn from_records(records: &[ProductRecord]) -> Self {
		let ranges = Nutrient::ALL.map(|key| {
			let mut range: Option<Range> = None;
			for value in records.iter().map(|r| r.nutrient(key)).filter(|v| *v > 0.0) {
				range = Some(match range {
					Some(r) => Range {
						min: r.min.min(value),
						max: r.max.max(value),
					},
					None => Range {
						min: value,
						max: value,
					},
				});
			}
			range.unwrap_or(Range { min: 0.0, max: 1.0 })
		});
		Self { ranges }
	}

	pub fn get(&self, key: Nutrient) -> Range {
		self.ranges[key as usize]
	}

	/// Position of `value` in [0, 1] with 5% padding on both ends. A
	/// degenerate range maps everything to the middle.
	pub fn normalize(&self, key: Nutrient, value: f64) -> f64 {
		let Range { min, max } = self.get(key);
		if max <= min {
			return 0.5;
		}
		let padding = (max - min) * 0.05;
		((value - min + padding) / (max - min + 2.0 * padding)).clamp(0.0, 1.0)
	}
}

pub fn grade_label(grade: Grade) -> String {
	format!("Grade {}", grade.letter())
}

#[cfg(test)]
mod tests {
	use super::*;

	fn product(id: usize, grade: Grade) -> ProductRecord {
		ProductRecord {
			id: id.to_string(),
			grade: Some(grade),
			..Default::default()
		}
	}

	#[test]
	fn sample_caps_each_grade() {
		let mut records = Vec::new();
		for i in 0..100 {
			records.push(product(i, Grade::A));
		}
		for i in 100..103 {
			records.push(product(i, Grade::E));
		}
		let sampled = sample_products(&records, 10);
		// two grades present, five per grade at most, E only has three
		assert_eq!(sampled.len(), 8);
		assert_eq!(sampled.iter().filter(|p| p.grade == Some(Grade::A)).count(), 5);
		assert!(sampled.windows(2).all(|w| w[0].grade <= w[1].grade));
	}

	#[test]
	fn sample_never_exceeds_total() {
		let records: Vec<_> = (0..500).map(|i| product(i, Grade::ALL[i % 5])).collect();
		let sampled = sample_products(&records, 80);
		assert_eq!(sampled.len(), 80);

		let records: Vec<_> = (0..500).map(|i| product(i, Grade::ALL[i % 3])).collect();
		assert_eq!(sample_products(&records, 80).len(), 80);
	}

	#[test]
	fn sample_is_stable() {
		let records: Vec<_> = (0..300).map(|i| product(i, Grade::ALL[i % 5])).collect();
		let a: Vec<_> = sample_products(&records, 40).into_iter().map(|p| p.id).collect();
		let b: Vec<_> = sample_products(&records, 40).into_iter().map(|p| p.id).collect();
		assert_eq!(a, b);
	}

	#[test]
	fn ungraded_products_are_skipped() {
		let records = vec![ProductRecord::default(), product(1, Grade::C)];
		assert_eq!(sample_products(&records, 80).len(), 1);
		assert_eq!(grade_counts(&records), [0, 0, 1, 0, 0]);
	}

	#[test]
	fn ranges_ignore_zeroes_and_pad() {
		let mut a = product(1, Grade::A);
		a.sugar = 10.0;
		let mut b = product(2, Grade::B);
		b.sugar = 30.0;
		let c = product(3, Grade::C);
		let ranges = NutrientRanges::from_records(&[a, b, c]);

		assert_eq!(ranges.get(Nutrient::Sugar), Range { min: 10.0, max: 30.0 });
		assert_eq!(ranges.get(Nutrient::Fat), Range { min: 0.0, max: 1.0 });
		// padding is 1.0 on each side of a 20-wide range
		assert!((ranges.normalize(Nutrient::Sugar, 10.0) - 1.0 / 22.0).abs() < 1e-12);
		assert!((ranges.normalize(Nutrient::Sugar, 30.0) - 21.0 / 22.0).abs() < 1e-12);
		assert_eq!(ranges.normalize(Nutrient::Sugar, 500.0), 1.0);
		assert_eq!(ranges.normalize(Nutrient::Sugar, -50.0), 0.0);
	}

	#[test]
	fn degenerate_range_maps_to_middle() {
		let mut a = product(1, Grade::A);
		a.fiber = 3.0;
		let ranges = NutrientRanges::from_records(&[a]);
		assert_eq!(ranges.normalize(Nutrient::Fiber, 3.0), 0.5);
	}
}
