pub mod geometry;
pub mod quadtree;

pub use geometry::{Coord, Rect};
pub use quadtree::{
    FinalTree, Point, QuadtreeBuilder, QuadtreeError, QueryIter,
};
