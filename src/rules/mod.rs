//! Transformation rules: the record model, the priority-ordered rule set,
//! and first-match resolution against the entity table.

pub mod model;
pub mod resolver;
pub mod store;

pub use model::{Guard, Pattern, Rule, RuleOrigin};
pub use resolver::{GuardMiss, Resolution, effective_capabilities};
pub use store::{RuleLoad, RuleSet};
