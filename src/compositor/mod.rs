//! Virtual-to-physical resolution reconciliation.
//!
//! [`ResolutionCompositor`] owns an offscreen target of a fixed virtual
//! size; scene code draws into it between `begin_frame` and `end_frame`,
//! and the compositor scales the result onto the physical output under a
//! [`ResizePolicy`].

mod policy;
mod renderer;

pub use policy::{ResizePolicy, ScaleState};
pub use renderer::ResolutionCompositor;
