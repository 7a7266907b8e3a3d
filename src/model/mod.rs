pub mod expense;
pub mod notification;
pub mod project;
pub mod resource;
pub mod role;
pub mod user;

pub use resource::Resource;
