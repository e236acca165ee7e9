pub mod classify;
pub mod health;
pub mod model;
