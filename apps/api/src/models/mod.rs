pub mod candidate;
pub mod schema;
