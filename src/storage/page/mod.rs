//! Page type and layout.
//!
//! [`Page`] is the raw 4KB data container moved between disk and frames.
//! Interpretation of the bytes belongs to the layer above (see
//! [`heap`](crate::heap)).

#[allow(clippy::module_inception)]
mod page;

pub use page::Page;
