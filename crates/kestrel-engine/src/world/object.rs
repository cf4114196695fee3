use crate::batch::Batcher;
use crate::time::FrameTime;

/// Stable handle to an object in a [`World`](super::World).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct ObjectId(pub(crate) u32);

impl ObjectId {
    #[inline]
    pub fn index(self) -> u32 {
        self.0
    }
}

/// Anything the world updates and draws.
pub trait GameObject {
    /// Called once per frame before rendering.
    fn update(&mut self, time: &FrameTime) {
        let _ = time;
    }

    /// Records this object's sprites.
    fn render(&self, batcher: &mut Batcher);
}
