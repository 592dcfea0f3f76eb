//! Board representation and game-state types.
//!
//! Contains the variant map, provinces, units, orders, and the position
//! snapshot the adjudicator works on.

pub mod border;
pub mod map;
pub mod order;
pub mod province;
pub mod state;
pub mod unit;

pub use border::Border;
pub use map::{AdjacencyEntry, MapError, WorldMap};
pub use order::{Location, Order, OrderKind, OrderUnit};
pub use province::{Coast, PowerId, PowerInfo, ProvinceId, ProvinceInfo, ProvinceType};
pub use state::{DislodgedUnit, Phase, PhaseKind, Position, Season};
pub use unit::{Unit, UnitType};
