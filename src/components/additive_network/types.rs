use crate::data::{AdditiveRecord, BoxStats, Grade};

/// Which force layout the user asked for.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ViewMode {
	#[default]
	Cluster,
	Grade,
}

impl ViewMode {
	pub fn label(self) -> &'static str {
		match self {
			ViewMode::Cluster => "Cluster View",
			ViewMode::Grade => "Grade View",
		}
	}

	pub fn toggled(self) -> Self {
		match self {
			ViewMode::Cluster => ViewMode::Grade,
			ViewMode::Grade => ViewMode::Cluster,
		}
	}
}

/// How a node is drawn at the current zoom. Exactly one form is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum NodeForm {
	/// Circle sized by frequency with its E-number.
	Macro,
	/// In-node box plot.
	Micro,
	/// E-number text only.
	Simplified,
}

/// An additive with the derived values the network needs.
#[derive(Clone, Debug)]
pub struct AdditiveNode {
	pub record: AdditiveRecord,
	pub radius: f64,
	/// Nutri-Score of the additive, C when unknown.
	pub grade: Grade,
	/// NOVA groups with a complete five-number summary, in dataset order.
	pub boxes: Vec<BoxStats>,
}

impl AdditiveNode {
	pub fn id(&self) -> &str {
		&self.record.id
	}

	pub fn name(&self) -> &str {
		if self.record.name.is_empty() {
			&self.record.id
		} else {
			&self.record.name
		}
	}

	pub fn description(&self) -> String {
		match &self.record.desc {
			Some(desc) => desc.clone(),
			None => format!("Found in {} products.", self.record.freq),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AdditiveLink {
	pub source: usize,
	pub target: usize,
	pub weight: f64,
}

/// An entry of the brand filter menu.
#[derive(Clone, Debug, PartialEq)]
pub struct BrandOption {
	pub id: String,
	pub label: String,
	pub count: usize,
}
