//! Game world: the set of objects updated and rendered each frame.

mod object;
mod registry;

pub use object::{GameObject, ObjectId};
pub use registry::{World, WorldError};
