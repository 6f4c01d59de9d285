use crate::data::{Grade, ProductRecord};

/// Something drawn by the morph. Grade buckets come first in the layout,
/// followed by the sampled products.
#[derive(Clone, Debug)]
pub enum MorphNode {
	Grade {
		grade: Grade,
		/// Products of this grade in the full dataset.
		count: usize,
	},
	Product {
		record: ProductRecord,
		grade: Grade,
		label: String,
	},
}

impl MorphNode {
	pub fn product(record: ProductRecord) -> Option<Self> {
		let grade = record.grade?;
		let label = record.short_label();
		Some(MorphNode::Product {
			record,
			grade,
			label,
		})
	}

	pub fn grade(&self) -> Grade {
		match self {
			MorphNode::Grade { grade, .. } | MorphNode::Product { grade, .. } => *grade,
		}
	}

	pub fn color(&self) -> &'static str {
		self.grade().color()
	}

	pub fn is_grade(&self) -> bool {
		matches!(self, MorphNode::Grade { .. })
	}
}

/// Canonical placement in one of the three layouts.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutPosition {
	pub x: f64,
	pub y: f64,
	pub r: f64,
	pub opacity: f64,
}

/// A node as drawn for one progress value.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeFrame {
	pub x: f64,
	pub y: f64,
	pub r: f64,
	pub opacity: f64,
	/// Perspective scale of the projection the node went through.
	pub scale: f64,
}

impl NodeFrame {
	/// Below this the node is not drawn.
	pub const MIN_VISIBLE: f64 = 0.05;

	pub fn is_visible(&self) -> bool {
		self.opacity >= Self::MIN_VISIBLE
	}
}

/// What the pointer is over.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Hover {
	#[default]
	None,
	/// Index into the layout's node list.
	Node(usize),
	/// Parallel-coordinates trace of the product at this node index.
	Trace(usize),
}
