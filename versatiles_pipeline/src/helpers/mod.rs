#[cfg(test)]
mod arrange_tiles;
mod container_registry;
mod csv;
pub mod dummy_image_source;
pub mod dummy_vector_source;

#[cfg(test)]
pub use arrange_tiles::*;
pub use container_registry::*;
pub use csv::*;
