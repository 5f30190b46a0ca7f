pub mod axum_http;
pub mod collaborators;
pub mod postgres;
