use std::collections::BTreeMap;
use std::fmt;

use crate::batch::Batcher;
use crate::time::FrameTime;

use super::object::{GameObject, ObjectId};

/// Error returned by [`World::new`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorldError {
    InvalidMapSize { width: i32, height: i32 },
}

impl fmt::Display for WorldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorldError::InvalidMapSize { width, height } => {
                write!(f, "invalid world map size {width}x{height}")
            }
        }
    }
}

impl std::error::Error for WorldError {}

/// Game objects keyed by id, plus the map bounds they live in.
///
/// Objects are updated and rendered in id (insertion) order.
pub struct World {
    objects: BTreeMap<ObjectId, Box<dyn GameObject>>,
    next_id: u32,
    map_width: i32,
    map_height: i32,
}

impl World {
    /// Creates an empty world; both map dimensions must be positive.
    pub fn new(map_width: i32, map_height: i32) -> Result<Self, WorldError> {
        if map_width <= 0 || map_height <= 0 {
            return Err(WorldError::InvalidMapSize {
                width: map_width,
                height: map_height,
            });
        }

        Ok(Self {
            objects: BTreeMap::new(),
            next_id: 0,
            map_width,
            map_height,
        })
    }

    pub fn add_object(&mut self, object: Box<dyn GameObject>) -> ObjectId {
        let id = ObjectId(self.next_id);
        self.next_id += 1;
        self.objects.insert(id, object);
        log::trace!("world: object {} added", id.0);
        id
    }

    pub fn remove_object(&mut self, id: ObjectId) -> Option<Box<dyn GameObject>> {
        self.objects.remove(&id)
    }

    pub fn get(&self, id: ObjectId) -> Option<&dyn GameObject> {
        self.objects.get(&id).map(|o| o.as_ref())
    }

    pub fn get_mut(&mut self, id: ObjectId) -> Option<&mut (dyn GameObject + 'static)> {
        self.objects.get_mut(&id).map(|o| o.as_mut())
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }

    #[inline]
    pub fn map_width(&self) -> i32 {
        self.map_width
    }

    #[inline]
    pub fn map_height(&self) -> i32 {
        self.map_height
    }

    pub fn set_map_width(&mut self, width: i32) {
        self.map_width = width;
    }

    pub fn set_map_height(&mut self, height: i32) {
        self.map_height = height;
    }

    pub fn update(&mut self, time: &FrameTime) {
        for object in self.objects.values_mut() {
            object.update(time);
        }
    }

    pub fn render(&self, batcher: &mut Batcher) {
        for object in self.objects.values() {
            object.render(batcher);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use super::*;
    use crate::coords::Vec4;
    use crate::paint::Color;
    use crate::time::Timer;

    struct Dot {
        x: f32,
        updates: Rc<Cell<u32>>,
    }

    impl GameObject for Dot {
        fn update(&mut self, time: &FrameTime) {
            self.x += time.dt;
            self.updates.set(self.updates.get() + 1);
        }

        fn render(&self, batcher: &mut Batcher) {
            batcher.add_colored(Vec4::new(self.x, 0.0, 0.0, 1.0), 1.0, 1.0, Color::WHITE);
        }
    }

    fn dot(x: f32, updates: &Rc<Cell<u32>>) -> Box<dyn GameObject> {
        Box::new(Dot { x, updates: Rc::clone(updates) })
    }

    #[test]
    fn non_positive_map_size_is_rejected() {
        assert!(World::new(0, 10).is_err());
        assert_eq!(
            World::new(10, -1).err(),
            Some(WorldError::InvalidMapSize { width: 10, height: -1 })
        );
    }

    #[test]
    fn ids_are_unique_and_not_reused() {
        let counter = Rc::new(Cell::new(0));
        let mut world = World::new(64, 64).unwrap();

        let a = world.add_object(dot(0.0, &counter));
        world.remove_object(a);
        let b = world.add_object(dot(0.0, &counter));

        assert_ne!(a, b);
        assert!(world.get(a).is_none());
        assert!(world.get(b).is_some());
        assert_eq!(world.len(), 1);
    }

    #[test]
    fn update_and_render_visit_objects_in_insertion_order() {
        let counter = Rc::new(Cell::new(0));
        let mut world = World::new(64, 64).unwrap();
        world.add_object(dot(1.0, &counter));
        world.add_object(dot(2.0, &counter));
        world.add_object(dot(3.0, &counter));

        let mut timer = Timer::new();
        let ft = timer.single_step();
        world.update(&ft);
        assert_eq!(counter.get(), 3);

        let mut batcher = Batcher::default();
        world.render(&mut batcher);
        let xs: Vec<f32> = batcher.take_batches()[0]
            .positions()
            .iter()
            .map(|p| p[0])
            .collect();

        let step = ft.dt;
        assert_eq!(xs, vec![1.0 + step, 2.0 + step, 3.0 + step]);
    }

    #[test]
    fn map_size_is_adjustable() {
        let mut world = World::new(10, 20).unwrap();
        world.set_map_width(30);
        world.set_map_height(40);
        assert_eq!((world.map_width(), world.map_height()), (30, 40));
    }
}
