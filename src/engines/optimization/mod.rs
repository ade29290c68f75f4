pub mod archive;
pub mod engine;
pub mod nsga;
pub mod progress;
pub mod quality;

pub use archive::ParetoArchive;
pub use engine::{MappingOptimizer, ProgressCallback, RunResult};
pub use nsga::Direction;
pub use progress::{
    ChannelProgress, ConsoleProgress, GenerationReport, ObjectiveRange, SilentProgress,
};
pub use quality::QualityTracker;
