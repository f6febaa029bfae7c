pub mod directions;
pub mod geocoding;
pub mod route_generator;
