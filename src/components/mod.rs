pub mod additive_network;
pub mod linked_scatter;
pub mod stage_morph;
