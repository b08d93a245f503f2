//! Persistent and in-memory caching of built navigation data

pub mod disk_io;
pub mod key;
pub mod store;

pub use disk_io::{load_navdata, save_navdata};
pub use key::CacheKey;
pub use store::{CacheSource, NavDataCache};
