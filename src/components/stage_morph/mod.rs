mod component;
mod flows;
mod layout;
mod render;
mod state;
mod types;

pub use component::StageMorph;
