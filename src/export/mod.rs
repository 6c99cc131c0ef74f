//! Edit-plan export

pub mod json;

pub use json::{build_plan, write_edit_plan, EditPlanJson};
