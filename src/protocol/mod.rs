//! PostgreSQL wire protocol implementation.
//!
//! # Structure
//!
//! - `frontend`: Client → Server messages (decoding)
//! - `backend`: Server → Client messages (encoding)
//! - `codec`: Low-level encoding/decoding primitives
//! - `types`: Common protocol types (FormatCode, Oid, FieldDescription)

pub mod backend;
pub mod codec;
pub mod frontend;
pub mod types;

// Re-export commonly used types
pub use frontend::{Decode, FrontendDecoder, FrontendMessage};
pub use types::{FieldDescription, FormatCode, Oid, TransactionStatus};
