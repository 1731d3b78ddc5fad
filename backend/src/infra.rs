pub mod db;
pub mod repository;
