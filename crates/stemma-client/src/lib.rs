//! # Stemma Client
//!
//! Client for the remote genealogical web API: token-based authentication
//! with proactive and reactive refresh, transaction submission with
//! background-job polling, chunked media transfer, and export download.
//!
//! All remote state lives in a caller-owned [`Session`]; the client borrows
//! it for its lifetime, so there is no process-wide singleton.

pub mod client;
pub mod error;
pub mod jwt;
pub mod session;
pub mod transfer;
pub mod version;

// Re-export commonly used types
pub use client::{ApiClient, MediaRecord};
pub use error::{ClientError, ClientResult};
pub use jwt::TokenClaims;
pub use session::{AccessToken, ServerMetadata, Session};
pub use transfer::{ExportDownload, UploadOutcome};
