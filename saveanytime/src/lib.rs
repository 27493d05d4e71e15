pub mod locator;
pub mod outcome;
pub mod patcher;
pub mod patches;

pub mod scanner {
    pub use saveanytime_scanner::*;
}

pub use locator::{LocateError, LocatorConfig, Target};
pub use outcome::Outcome;
pub use patcher::PatchError;
pub use patches::{Direction, PatchSite};

/// Whether an answer to a yes/no prompt accepts. Only `y` and `yes` do, ignoring case and
/// surrounding whitespace.
pub fn is_affirmative(answer: &str) -> bool {
    matches!(answer.trim().to_lowercase().as_str(), "y" | "yes")
}
