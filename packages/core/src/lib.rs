pub mod analytics;
pub mod error;
pub mod eta;
pub mod loyalty;
pub mod order;
pub mod pricing;

pub use error::DomainError;
pub use stringline_types;
