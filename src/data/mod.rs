//! Dataset records and the small amount of preprocessing the charts need.

pub mod load;
pub mod sample;
pub mod types;

pub use sample::{NutrientRanges, grade_counts, sample_products};
pub use types::{
	AdditiveRecord, BoxPlotRecord, BoxStats, BrandRecord, ClusterGroup, Grade, LinkRecord,
	NetworkDataset, Nutrient, ProductRecord, ScatterPoint,
};
