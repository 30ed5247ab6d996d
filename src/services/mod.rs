pub mod access;
pub mod cache;
pub mod identity;
pub mod listing;
pub mod roles;
