pub mod algorithms;
pub use algorithms::{DistanceMetric, EARTH_RADIUS_KM, distance_km, haversine_km};
