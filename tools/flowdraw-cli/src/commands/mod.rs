pub mod draw;
pub mod progress;
