pub mod traits;
pub mod array;
pub mod optimizer;
pub mod manager;

pub use manager::{ConfigManager, ObjectiveSpec, RunConfig};
pub use array::ArraySection;
pub use optimizer::OptimizerParams;
pub use traits::ConfigSection;
