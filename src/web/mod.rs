pub mod admin;
pub mod auth;
pub mod landing;
pub mod responses;
pub mod router;
pub mod state;
pub mod storage;
pub mod templates;
pub mod uploads;

#[cfg(test)]
pub mod testing;

pub use state::AppState;
