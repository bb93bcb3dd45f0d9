//! HTTP Layer - RESTful API
//!
//! 转换服务的入站适配器

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use error::ApiError;
pub use routes::create_routes;
pub use server::{HttpServer, HttpServerConfig};
pub use state::AppState;
