pub mod cache;
pub mod loader;
pub mod set;
pub mod slicer;
pub mod source;

// Re-exports for convenience
pub use loader::TileLoader;
pub use set::ViewportTileSet;
pub use source::{DirectoryTileStore, TileStore};
