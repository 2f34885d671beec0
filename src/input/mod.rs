pub mod events;
pub mod gestures;

// Re-export the essential types
pub use events::MapEvent;
pub use gestures::ZoomGesture;
