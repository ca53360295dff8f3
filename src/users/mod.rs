pub mod dto;
pub mod handlers;
pub mod repo;
mod repo_types;
pub mod seed;
pub mod validate;
