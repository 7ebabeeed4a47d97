pub mod models;
pub mod speakers;
pub mod token;
