//! Session state and authenticated HTTP access to the Iris backend.

pub mod client;
mod endpoints;
pub mod error;
pub mod session;
pub mod store;
pub mod token;
pub mod transport;
pub mod types;

pub use client::{ApiClient, ApiResponse, RequestOptions, REFRESH_PATH};
pub use error::{ApiError, Result};
pub use session::Session;
pub use store::{data_dir, FileStore, MemoryStore, SessionStore, StoredAuth, STORAGE_KEY};
pub use token::{decode_token_claims, parse_token_expiry, TokenClaims};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Method, ReqwestTransport};
pub use types::{
    AuthTokens, Entity, EntityCreate, Model, ModelCreate, ModelUpdate, ModelVersion, Page,
    PaginatedResponse, Relationship, RelationshipCreate, User,
};
