//! HTTP inbound adapter exposing REST endpoints.

pub mod analytics;
pub mod auth;
pub mod error;
pub mod generation;
pub mod health;
pub mod lessons;
mod lessons_dto;
pub mod lms;
pub mod schemas;
pub mod session;
pub mod session_config;
pub mod shares;
pub mod state;
#[cfg(test)]
pub mod test_utils;
pub mod users;
pub mod validation;

pub use error::ApiResult;
