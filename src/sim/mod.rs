//! Simulation module
//!
//! Everything that touches the shared world lives here:
//! - Fixed timestep only, driven by `tick`
//! - One `Simulation` context per client, passed explicitly
//! - Entity ids are typed; wire labels are only parsed at the edge
//! - No rendering or platform dependencies

pub mod body;
pub mod factory;
pub mod filter;
pub mod geometry;
pub mod graph;
pub mod ids;
pub mod input;
pub mod level;
pub mod physics;
pub mod pins;
pub mod snapshot;
pub mod state;
pub mod tick;
pub mod world;

pub use body::{Body, BodyRole, Material, Shape};
pub use factory::{Created, Origin, create_body, draw, install_shape};
pub use filter::{CategoryAllocator, CollisionFilter, DEFAULT_CATEGORY, LEVEL_ASSEMBLY_CATEGORY};
pub use geometry::{Bounds, simplify_path};
pub use graph::{EraseOutcome, erase};
pub use ids::{EntityId, EntityKind, IdGenerator};
pub use level::{LevelLayout, build_level};
pub use pins::PinRegistry;
pub use snapshot::Snapshot;
pub use state::{RemoteCursor, Simulation, Tool};
pub use tick::{FrameClock, tick};
pub use world::{Constraint, ConstraintHandle, World};
