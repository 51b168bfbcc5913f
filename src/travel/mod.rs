//! Travel position drivers: autoplay along the corridor and free navigation

pub mod driver;

pub use driver::{Travel, TravelConfig, TravelMode};
