pub mod movement;
pub mod validate;
