//! Small per-page trackers: reading progress, reactions, reader interactions, slide annotations.

mod annotations;
mod interactions;
mod progress;
mod reactions;

pub use annotations::AnnotationBoard;
pub use interactions::InteractionTracker;
pub use progress::{PeriodicFlush, ProgressMeter};
pub use reactions::ReactionCounter;
