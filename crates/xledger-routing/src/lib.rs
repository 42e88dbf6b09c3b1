//! xledger routing: the path finder boundary.
//!
//! Path discovery itself lives outside this workspace. This crate defines the
//! [`IPathFinder`] interface the sender consumes and two implementations of
//! it:
//! - [`StaticPathFinder`]: replays a path quoted ahead of time.
//! - [`ConnectorQuoteFinder`]: asks a connector's quote endpoint for a hop.

pub mod connector;
pub mod error;
pub mod pathfinder;

pub use connector::ConnectorQuoteFinder;
pub use error::RoutingError;
pub use pathfinder::{IPathFinder, PathQuery, StaticPathFinder};
