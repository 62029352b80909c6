//! Transaction decoding, encoding and inspection.
//!
//! # Data Flow
//! ```text
//! raw bytes / tagged base64 batch
//!     → decode.rs (msgpack → DecodedTransaction, signed envelopes unwrapped)
//!     → group.rs (unsigned entries partitioned by sender)
//!     → signing reconciler (see crate::signing)
//! ```

pub mod address;
pub mod batch;
pub mod decode;
pub mod encode;
pub mod group;
pub mod types;

pub use address::Address;
pub use batch::{EncodedBatch, EncodedTxn, TxnEncoding};
pub use decode::{decode_any, decode_encoded, decode_transaction, log_encoded_transaction};
pub use encode::{attach_signature, build_group, compute_group_id, TransactionBuilder};
pub use group::{group_by_sender, SenderGroups, TxnInfo};
pub use types::{DecodedTransaction, TxnKind};
