pub mod math;
pub mod matrix;
