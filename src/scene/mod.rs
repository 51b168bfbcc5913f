//! Scene collaborator interface and headless scene bookkeeping

pub mod sink;
pub mod manager;

pub use sink::SceneSink;
pub use manager::{SceneManager, SceneObject};
