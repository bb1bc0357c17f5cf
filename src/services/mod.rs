pub mod assembly;
pub mod providers;
pub mod ranking;

pub use assembly::{assemble_course, AssemblyOptions};
pub use ranking::{pick_best_image_candidate, ScoringWeights};
