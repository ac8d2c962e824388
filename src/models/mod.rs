pub mod aspect_ratio;
pub mod job;
pub mod upload;
