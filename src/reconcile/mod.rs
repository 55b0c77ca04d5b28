pub mod reconciler;
pub mod surface;

pub use reconciler::*;
pub use surface::*;
