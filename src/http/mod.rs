//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum setup, HTTP/1.1 + h2c)
//!     → request.rs (request ID)
//!     → server.rs handlers (validate → token → mailer)
//!     → response.rs (errors as JSON)
//!     → Send to client
//! ```

pub mod request;
pub mod response;
pub mod server;

pub use request::{MakeRequestUuid, X_REQUEST_ID};
pub use response::{AppError, ErrorBody};
pub use server::{AppState, HttpServer};
