pub mod documents;
pub mod records;
pub mod school;
pub mod services;
