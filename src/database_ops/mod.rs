pub mod db;
pub mod schema;
pub mod walkover;
