//! Beacon Newsletter: update sync and structured queries for newsletters.
//!
//! Sits between a binary message-tree transport and application commands:
//! - `codec` / `executor`: `w:mex` structured queries and error normalization
//! - `updates`: message and update fetches, with concurrent per-message decryption
//! - `metadata`: projection of newsletter metadata payloads
//! - `client`: follow, mute, rename, fetch history and friends
//! - `auto_follow`: best-effort startup follow task

pub mod auto_follow;
pub mod client;
pub mod codec;
pub mod coerce;
pub mod config;
pub mod error;
pub mod executor;
pub mod ids;
pub mod metadata;
pub mod plaintext;
pub mod transport;
pub mod updates;

#[cfg(test)]
mod testing;

// Re-export key types for convenience.
pub use auto_follow::AutoFollow;
pub use client::{MessageLookup, NewsletterClient, ViewRole, WireNumber};
pub use codec::{IqType, QueryKind};
pub use config::NewsletterConfig;
pub use error::{DecryptionError, NewsletterError, QueryError, Result, TransportError};
pub use executor::{check_errors, execute, execute_as, send_query, unwrap_result};
pub use metadata::{MetadataSource, project};
pub use plaintext::PlaintextDecryptor;
pub use transport::{
    Identity, MediaHostResolver, MessageDecryptor, PictureEncoder, Transport, UrlResolver,
};
pub use updates::{DecryptFailurePolicy, FetchMode, parse_updates};
