mod boxplot;
mod component;
mod forces;
mod graph;
mod hull;
mod lod;
mod render;
mod simulation;
mod state;
mod types;

pub use component::AdditiveNetwork;
pub use lod::select_detail_nodes;
pub use types::ViewMode;
