pub mod license;
pub mod user;
