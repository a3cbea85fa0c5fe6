pub mod prelude;

pub mod stories;
