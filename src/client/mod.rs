pub mod api;
pub mod controller;
pub mod datetime_local;
pub mod state;
