//! Map representation and ownership state.
//!
//! Contains the static graph of sites and rivers, the mine distance table,
//! move types, and the mutable river ownership.

pub mod distance;
pub mod graph;
pub mod moves;
pub mod ownership;

pub use distance::DistanceIndex;
pub use graph::{EdgeId, GraphError, GraphModel, River, Site, SiteId};
pub use moves::{Move, PlayerId};
pub use ownership::{EdgeChange, MoveError, OwnershipState};
