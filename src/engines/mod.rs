pub mod evaluation;
pub mod optimization;
