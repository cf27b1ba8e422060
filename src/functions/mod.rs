pub mod primitives;
pub mod registry;
pub mod traits;

pub use registry::{EphemeralConstant, PrimitiveSet};
pub use traits::{InfixForm, Primitive};
