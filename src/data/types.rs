use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Nutri-Score letter.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Grade {
	A,
	B,
	C,
	D,
	E,
}

impl Grade {
	pub const ALL: [Grade; 5] = [Grade::A, Grade::B, Grade::C, Grade::D, Grade::E];

	pub fn from_letter(s: &str) -> Option<Self> {
		match s.trim().to_ascii_uppercase().as_str() {
			"A" => Some(Grade::A),
			"B" => Some(Grade::B),
			"C" => Some(Grade::C),
			"D" => Some(Grade::D),
			"E" => Some(Grade::E),
			_ => None,
		}
	}

	pub fn index(self) -> usize {
		self as usize
	}

	pub fn letter(self) -> &'static str {
		match self {
			Grade::A => "A",
			Grade::B => "B",
			Grade::C => "C",
			Grade::D => "D",
			Grade::E => "E",
		}
	}

	/// Official Nutri-Score palette.
	pub fn color(self) -> &'static str {
		match self {
			Grade::A => "#038141",
			Grade::B => "#85BB2F",
			Grade::C => "#FECB02",
			Grade::D => "#EE8100",
			Grade::E => "#E63E11",
		}
	}
}

/// The nine numeric attributes plotted on the parallel-coordinate axes, in
/// axis order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Nutrient {
	Additives,
	Energy,
	Protein,
	Sugar,
	Fat,
	SaturatedFat,
	Carbohydrates,
	Fiber,
	Sodium,
}

impl Nutrient {
	pub const ALL: [Nutrient; 9] = [
		Nutrient::Additives,
		Nutrient::Energy,
		Nutrient::Protein,
		Nutrient::Sugar,
		Nutrient::Fat,
		Nutrient::SaturatedFat,
		Nutrient::Carbohydrates,
		Nutrient::Fiber,
		Nutrient::Sodium,
	];

	pub fn label(self) -> &'static str {
		match self {
			Nutrient::Additives => "Additives",
			Nutrient::Energy => "Energy (kcal)",
			Nutrient::Protein => "Protein (g)",
			Nutrient::Sugar => "Sugar (g)",
			Nutrient::Fat => "Fat (g)",
			Nutrient::SaturatedFat => "Sat. Fat (g)",
			Nutrient::Carbohydrates => "Carbs (g)",
			Nutrient::Fiber => "Fiber (g)",
			Nutrient::Sodium => "Sodium (g)",
		}
	}
}

/// One food product as shipped in `products.json`. Missing or malformed
/// numbers decode as zero.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProductRecord {
	#[serde(deserialize_with = "lenient_string")]
	pub id: String,
	#[serde(deserialize_with = "lenient_opt_string")]
	pub product_name: Option<String>,
	#[serde(deserialize_with = "lenient_opt_string")]
	pub short_name: Option<String>,
	#[serde(deserialize_with = "lenient_string")]
	pub category: String,
	#[serde(deserialize_with = "lenient_grade")]
	pub grade: Option<Grade>,
	#[serde(deserialize_with = "lenient_f64")]
	pub additives: f64,
	#[serde(deserialize_with = "lenient_f64")]
	pub energy: f64,
	#[serde(alias = "proteins", deserialize_with = "lenient_f64")]
	pub protein: f64,
	#[serde(alias = "sugars", deserialize_with = "lenient_f64")]
	pub sugar: f64,
	#[serde(deserialize_with = "lenient_f64")]
	pub fat: f64,
	#[serde(alias = "saturated_fat", deserialize_with = "lenient_f64")]
	pub saturated_fat: f64,
	#[serde(deserialize_with = "lenient_f64")]
	pub carbohydrates: f64,
	#[serde(deserialize_with = "lenient_f64")]
	pub fiber: f64,
	#[serde(deserialize_with = "lenient_f64")]
	pub sodium: f64,
}

impl ProductRecord {
	pub fn nutrient(&self, key: Nutrient) -> f64 {
		match key {
			Nutrient::Additives => self.additives,
			Nutrient::Energy => self.energy,
			Nutrient::Protein => self.protein,
			Nutrient::Sugar => self.sugar,
			Nutrient::Fat => self.fat,
			Nutrient::SaturatedFat => self.saturated_fat,
			Nutrient::Carbohydrates => self.carbohydrates,
			Nutrient::Fiber => self.fiber,
			Nutrient::Sodium => self.sodium,
		}
	}

	pub fn full_name(&self) -> String {
		match &self.product_name {
			Some(name) if !name.is_empty() => name.clone(),
			_ => format!("Product {}", self.id),
		}
	}

	/// Up to 20 characters; longer names keep 17 and get an ellipsis.
	pub fn short_label(&self) -> String {
		if let Some(short) = self.short_name.as_ref().filter(|s| !s.is_empty()) {
			return short.clone();
		}
		let full = self.full_name();
		if full.chars().count() > 20 {
			let head: String = full.chars().take(17).collect();
			format!("{head}...")
		} else {
			full
		}
	}

	pub fn category_label(&self) -> &str {
		if self.category.is_empty() {
			"Unknown"
		} else {
			&self.category
		}
	}
}

/// The five additive families used for cluster anchors and hull colors.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ClusterGroup {
	#[default]
	Preservatives,
	MeatProcessors,
	TextureFillers,
	Colors,
	Sweeteners,
}

impl ClusterGroup {
	pub const ALL: [ClusterGroup; 5] = [
		ClusterGroup::Preservatives,
		ClusterGroup::MeatProcessors,
		ClusterGroup::TextureFillers,
		ClusterGroup::Colors,
		ClusterGroup::Sweeteners,
	];

	/// Dataset tags are `GENERAL`, `MEAT`, `TEXTURE`, `COLORS`, `SWEETENERS`;
	/// anything else lands in the general preservatives family.
	pub fn from_key(key: &str) -> Self {
		match key.trim().to_ascii_uppercase().as_str() {
			"MEAT" => ClusterGroup::MeatProcessors,
			"TEXTURE" => ClusterGroup::TextureFillers,
			"COLORS" => ClusterGroup::Colors,
			"SWEETENERS" => ClusterGroup::Sweeteners,
			_ => ClusterGroup::Preservatives,
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			ClusterGroup::Preservatives => "Preservatives",
			ClusterGroup::MeatProcessors => "Meat Processors",
			ClusterGroup::TextureFillers => "Texture/Fillers",
			ClusterGroup::Colors => "Colors",
			ClusterGroup::Sweeteners => "Sweeteners",
		}
	}

	pub fn color(self) -> &'static str {
		match self {
			ClusterGroup::Preservatives => "#22c55e",
			ClusterGroup::MeatProcessors => "#ef4444",
			ClusterGroup::TextureFillers => "#f59e0b",
			ClusterGroup::Colors => "#a855f7",
			ClusterGroup::Sweeteners => "#3b82f6",
		}
	}

	/// Unit-square anchor; multiplied by the cluster spread of the canvas.
	pub fn anchor(self) -> (f64, f64) {
		match self {
			ClusterGroup::Preservatives => (0.5, -0.5),
			ClusterGroup::MeatProcessors => (-0.5, -0.5),
			ClusterGroup::TextureFillers => (-0.5, 0.5),
			ClusterGroup::Colors => (0.0, 0.0),
			ClusterGroup::Sweeteners => (0.5, 0.5),
		}
	}
}

/// Nutri-Score points distribution of the products containing an additive,
/// for one NOVA group. Any missing quartile disables the box.
#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BoxPlotRecord {
	#[serde(deserialize_with = "lenient_u8")]
	pub nova: u8,
	#[serde(deserialize_with = "lenient_opt_f64")]
	pub min: Option<f64>,
	#[serde(deserialize_with = "lenient_opt_f64")]
	pub q1: Option<f64>,
	#[serde(deserialize_with = "lenient_opt_f64")]
	pub median: Option<f64>,
	#[serde(deserialize_with = "lenient_opt_f64")]
	pub q3: Option<f64>,
	#[serde(deserialize_with = "lenient_opt_f64")]
	pub max: Option<f64>,
	#[serde(deserialize_with = "lenient_f64_list")]
	pub outliers: Vec<f64>,
}

/// Complete five-number summary, only constructed when every statistic is
/// present.
#[derive(Clone, Debug, PartialEq)]
pub struct BoxStats {
	pub nova: u8,
	pub min: f64,
	pub q1: f64,
	pub median: f64,
	pub q3: f64,
	pub max: f64,
	pub outliers: Vec<f64>,
}

impl BoxPlotRecord {
	pub fn complete(&self) -> Option<BoxStats> {
		Some(BoxStats {
			nova: self.nova,
			min: self.min?,
			q1: self.q1?,
			median: self.median?,
			q3: self.q3?,
			max: self.max?,
			outliers: self.outliers.clone(),
		})
	}
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AdditiveRecord {
	#[serde(deserialize_with = "lenient_string")]
	pub id: String,
	#[serde(deserialize_with = "lenient_string")]
	pub name: String,
	#[serde(deserialize_with = "lenient_group")]
	pub group: ClusterGroup,
	#[serde(deserialize_with = "lenient_grade")]
	pub score: Option<Grade>,
	#[serde(deserialize_with = "lenient_f64")]
	pub freq: f64,
	#[serde(deserialize_with = "lenient_string_list")]
	pub products: Vec<String>,
	#[serde(deserialize_with = "lenient_string_list")]
	pub brands: Vec<String>,
	#[serde(deserialize_with = "null_as_default")]
	pub box_plot_data: Vec<BoxPlotRecord>,
	#[serde(deserialize_with = "lenient_opt_string")]
	pub desc: Option<String>,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct LinkRecord {
	#[serde(deserialize_with = "lenient_string")]
	pub source: String,
	#[serde(deserialize_with = "lenient_string")]
	pub target: String,
	#[serde(deserialize_with = "lenient_f64")]
	pub weight: f64,
}

impl LinkRecord {
	/// Zero or missing weights count as a single co-occurrence.
	pub fn effective_weight(&self) -> f64 {
		if self.weight > 0.0 { self.weight } else { 1.0 }
	}
}

#[derive(Clone, Debug, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct BrandRecord {
	#[serde(deserialize_with = "lenient_string")]
	pub id: String,
	#[serde(deserialize_with = "lenient_string")]
	pub label: String,
	#[serde(deserialize_with = "null_as_default")]
	pub count: usize,
}

/// Contents of `additives.json`.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct NetworkDataset {
	#[serde(deserialize_with = "null_as_default")]
	pub nodes: Vec<AdditiveRecord>,
	#[serde(deserialize_with = "null_as_default")]
	pub links: Vec<LinkRecord>,
	pub brands: Option<Vec<BrandRecord>>,
}

impl NetworkDataset {
	/// No nodes, so nothing to lay out. Links alone do not count.
	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty()
	}
}

/// A product in the 2D embedding shown by the linked scatter panels.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default)]
pub struct ScatterPoint {
	#[serde(deserialize_with = "null_as_default")]
	pub position: [f64; 2],
	#[serde(deserialize_with = "lenient_string")]
	pub name: String,
	#[serde(deserialize_with = "lenient_string")]
	pub brand: String,
	#[serde(deserialize_with = "lenient_string")]
	pub category: String,
	#[serde(deserialize_with = "lenient_grade")]
	pub nutriscore: Option<Grade>,
	#[serde(deserialize_with = "lenient_string")]
	pub nova: String,
}

impl ScatterPoint {
	pub fn nova_group(&self) -> Option<u8> {
		self.nova.trim().parse().ok().filter(|n| (1..=4).contains(n))
	}
}

fn value_to_f64(value: &Value) -> f64 {
	let n = match value {
		Value::Number(n) => n.as_f64().unwrap_or(0.0),
		Value::String(s) => s.trim().parse().unwrap_or(0.0),
		Value::Bool(true) => 1.0,
		_ => 0.0,
	};
	if n.is_finite() { n } else { 0.0 }
}

fn value_to_string(value: Value) -> String {
	match value {
		Value::String(s) => s,
		Value::Number(n) => n.to_string(),
		Value::Bool(b) => b.to_string(),
		_ => String::new(),
	}
}

fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: Default + Deserialize<'de>,
{
	Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

fn lenient_f64<'de, D: Deserializer<'de>>(d: D) -> Result<f64, D::Error> {
	Ok(Option::<Value>::deserialize(d)?
		.map(|v| value_to_f64(&v))
		.unwrap_or(0.0))
}

fn lenient_opt_f64<'de, D: Deserializer<'de>>(d: D) -> Result<Option<f64>, D::Error> {
	Ok(match Option::<Value>::deserialize(d)? {
		None | Some(Value::Null) => None,
		Some(v) => Some(value_to_f64(&v)),
	})
}

fn lenient_u8<'de, D: Deserializer<'de>>(d: D) -> Result<u8, D::Error> {
	let n = lenient_f64(d)?;
	Ok(n.clamp(0.0, u8::MAX as f64) as u8)
}

fn lenient_f64_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<f64>, D::Error> {
	Ok(match Option::<Value>::deserialize(d)? {
		Some(Value::Array(items)) => items.iter().map(value_to_f64).collect(),
		_ => Vec::new(),
	})
}

fn lenient_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
	Ok(Option::<Value>::deserialize(d)?
		.map(value_to_string)
		.unwrap_or_default())
}

fn lenient_opt_string<'de, D: Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
	Ok(Option::<Value>::deserialize(d)?
		.map(value_to_string)
		.filter(|s| !s.is_empty()))
}

fn lenient_string_list<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
	Ok(match Option::<Value>::deserialize(d)? {
		Some(Value::Array(items)) => items
			.into_iter()
			.map(value_to_string)
			.filter(|s| !s.trim().is_empty())
			.collect(),
		_ => Vec::new(),
	})
}

fn lenient_grade<'de, D: Deserializer<'de>>(d: D) -> Result<Option<Grade>, D::Error> {
	Ok(Option::<Value>::deserialize(d)?
		.map(value_to_string)
		.and_then(|s| Grade::from_letter(&s)))
}

fn lenient_group<'de, D: Deserializer<'de>>(d: D) -> Result<ClusterGroup, D::Error> {
	Ok(Option::<Value>::deserialize(d)?
		.map(value_to_string)
		.map(|s| ClusterGroup::from_key(&s))
		.unwrap_or_default())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn malformed_numbers_become_zero() {
		let json = r#"{"id": 7, "productName": "Oat bar", "grade": "b",
			"energy": "n/a", "proteins": "4.5", "sugar": null, "saturated_fat": 1.25}"#;
		let p: ProductRecord = serde_json::from_str(json).unwrap();
		assert_eq!(p.id, "7");
		assert_eq!(p.grade, Some(Grade::B));
		assert_eq!(p.energy, 0.0);
		assert_eq!(p.protein, 4.5);
		assert_eq!(p.sugar, 0.0);
		assert_eq!(p.saturated_fat, 1.25);
		assert_eq!(p.fiber, 0.0);
		assert_eq!(p.category_label(), "Unknown");
	}

	#[test]
	fn short_label_truncates_long_names() {
		let p = ProductRecord {
			id: "1".into(),
			product_name: Some("Extra crunchy chocolate hazelnut cereal".into()),
			..Default::default()
		};
		assert_eq!(p.short_label(), "Extra crunchy cho...");
		assert_eq!(p.short_label().chars().count(), 20);

		let unnamed = ProductRecord {
			id: "42".into(),
			..Default::default()
		};
		assert_eq!(unnamed.short_label(), "Product 42");
	}

	#[test]
	fn incomplete_box_is_rejected() {
		let json = r#"{"nova": 4, "min": -3, "q1": 2, "median": null, "q3": 11, "max": 20}"#;
		let bp: BoxPlotRecord = serde_json::from_str(json).unwrap();
		assert!(bp.complete().is_none());

		let json = r#"{"nova": "3", "min": -3, "q1": 2, "median": 5, "q3": 11, "max": 20, "outliers": [30, "x"]}"#;
		let bp: BoxPlotRecord = serde_json::from_str(json).unwrap();
		let stats = bp.complete().unwrap();
		assert_eq!(stats.nova, 3);
		assert_eq!(stats.outliers, vec![30.0, 0.0]);
	}

	#[test]
	fn additive_defaults() {
		let json = r#"{"nodes": [{"id": "E250", "group": "MEAT", "freq": "120"},
			{"id": "E330", "group": "mystery", "brands": ["Acme", "", null]}],
			"links": [{"source": "E250", "target": "E330"}]}"#;
		let data: NetworkDataset = serde_json::from_str(json).unwrap();
		assert_eq!(data.nodes[0].group, ClusterGroup::MeatProcessors);
		assert_eq!(data.nodes[0].freq, 120.0);
		assert_eq!(data.nodes[1].group, ClusterGroup::Preservatives);
		assert_eq!(data.nodes[1].brands, vec!["Acme".to_string()]);
		assert_eq!(data.links[0].effective_weight(), 1.0);
		assert!(data.brands.is_none());
	}

	#[test]
	fn scatter_nova_parses() {
		let json = r#"{"position": [1.5, -2], "name": "Soup", "nutriscore": "c", "nova": "4"}"#;
		let p: ScatterPoint = serde_json::from_str(json).unwrap();
		assert_eq!(p.position, [1.5, -2.0]);
		assert_eq!(p.nutriscore, Some(Grade::C));
		assert_eq!(p.nova_group(), Some(4));
	}

	#[test]
	fn network_without_nodes_is_empty() {
		let empty: NetworkDataset = serde_json::from_str(r#"{"nodes": [], "links": [{"source": "E1", "target": "E2"}]}"#).unwrap();
		assert!(empty.is_empty());
		let null_nodes: NetworkDataset = serde_json::from_str(r#"{"nodes": null}"#).unwrap();
		assert!(null_nodes.is_empty());
		let one: NetworkDataset = serde_json::from_str(r#"{"nodes": [{"id": "E100"}]}"#).unwrap();
		assert!(!one.is_empty());
	}
}
