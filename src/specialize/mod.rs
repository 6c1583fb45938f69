//! Self-specializing execution sites.

mod shape;
mod site;

pub use shape::{KeyShape, Operand, OperandShape, ShapePair, classify};
pub use site::{
    DEFAULT_POLYMORPHISM_LIMIT, ExecutionSite, SiteArena, SiteId, SiteState, Specialization,
};
