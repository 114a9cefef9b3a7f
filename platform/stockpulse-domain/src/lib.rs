pub mod entities;
pub mod error;
pub mod repositories;
pub mod services;
pub mod value_objects;

pub use error::DomainError;

#[cfg(test)]
pub(crate) mod test_support;
