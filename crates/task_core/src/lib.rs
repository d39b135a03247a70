pub mod config;
pub mod datetime;
pub mod error;
pub mod model;
pub mod repository;
pub mod storage;

pub use error::AppError;
pub use repository::TaskRepository;
