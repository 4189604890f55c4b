pub mod prelude;

pub mod licenses;
pub mod users;
