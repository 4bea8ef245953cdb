//! Layout parameters derived from UI controls, and the leaf-spacing pass.

pub mod controls;
pub mod spacing;

pub use controls::{Controls, LayoutParams};
pub use spacing::annotate_leaf_spacing;
