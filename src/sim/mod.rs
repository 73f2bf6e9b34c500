pub mod diagnostics;
pub mod event;
pub mod level;
pub mod step;
pub mod world;
