//! Google Cloud Vision API によるOCR

mod auth;
mod client;

pub use auth::{load_credentials, ServiceAccountCredentials, CREDENTIALS_ENV};
pub use client::VisionClient;
