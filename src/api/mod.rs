pub mod dashboard;
pub mod general;
pub mod hooks;
pub mod resource;
