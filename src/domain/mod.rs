pub mod icon;
pub mod progress;
pub mod repository;
pub mod task;
