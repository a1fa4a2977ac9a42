pub mod admin;
pub mod health;
pub mod members;
pub mod notes;
pub mod session;
