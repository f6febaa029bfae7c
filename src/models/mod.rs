pub mod coordinates;
pub mod geocode;
pub mod region;
pub mod route;

pub use coordinates::Coordinates;
pub use geocode::{GeocodeCandidate, GeocodeResult, GeocodeSource};
pub use region::RegionBounds;
pub use route::{Directions, GenerateRouteRequest, RouteCandidate, RouteRequest, RouteShape};
