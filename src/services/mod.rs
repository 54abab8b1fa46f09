// Settlement core
pub mod settlement;
