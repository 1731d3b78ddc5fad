pub mod category;
pub mod movement;

pub use category::PgCategoryRepository;
pub use movement::PgMovementRepository;
