//! Observer-driven area tracking and per-tick work budgeting

pub mod area;
pub mod budget;
pub mod change;

pub use area::AreaTracker;
pub use budget::WorkBudget;
pub use change::ChangeDetector;
