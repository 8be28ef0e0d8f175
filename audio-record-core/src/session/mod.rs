pub mod recorder;
pub mod recording;
pub mod wait;
