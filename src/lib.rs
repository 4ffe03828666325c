//! Serve an in-memory record collection as a PostgreSQL table.
//!
//! wiretable speaks the server side of the PostgreSQL v3 wire protocol:
//! startup negotiation, the simple query flow, and the extended
//! Parse/Bind/Describe/Execute flow, with binary encodings for
//! `int2`/`int4`/`int8`/`float8`/`numeric` columns and canonical text for
//! everything else. Any stock PostgreSQL driver can connect and `SELECT`
//! from the virtual table an adapter exposes.
//!
//! # Features
//!
//! - **Sans-I/O core**: decoding, encoding and the connection state machine
//!   are pure functions over byte buffers, driven by a thin tokio transport
//! - **Zero-copy decoding**: frontend messages borrow from the read buffer
//! - **Pluggable rows**: implement [`Table`] or use the built-in
//!   [`MemoryTable`] over a fixed dataset
//!
//! # Example
//!
//! ```no_run
//! use wiretable::{FieldDescription, MemoryTable, Server, ServerOpts, Value};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> wiretable::Result<()> {
//!     let table = MemoryTable::new(
//!         vec![FieldDescription::text("id"), FieldDescription::text("name")],
//!         vec![
//!             vec![Value::I32(1), Value::from("John")],
//!             vec![Value::I32(2), Value::from("Jane")],
//!         ],
//!     )?
//!     .with_name("users");
//!
//!     let server = Server::bind(table, ServerOpts::default()).await?;
//!     server.run().await
//! }
//! ```

// private
mod error;
mod opts;

// pub
pub mod conversion;
pub mod protocol;
pub mod server;
pub mod session;
pub mod table;
pub mod value;

pub use error::{Error, Result, sqlstate};
pub use opts::ServerOpts;
pub use protocol::types::{FieldDescription, FormatCode};
pub use server::Server;
pub use session::{Flow, Session};
pub use table::{MemoryTable, Row, Table};
pub use value::{Numeric, Value};
