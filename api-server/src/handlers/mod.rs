//! HTTP handlers

pub mod admin;
pub mod chat;
pub mod feedback;
pub mod health;
pub mod model;
pub mod predict;
pub mod schema;
