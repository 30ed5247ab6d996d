pub mod roles;
pub mod session;
