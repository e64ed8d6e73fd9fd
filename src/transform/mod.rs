//! Pure transforms between raw source rows and storable records

pub mod field_map;
pub mod merge;
pub mod teams;
