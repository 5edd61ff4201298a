//! # Nomad Decode
//!
//! Declarative decoding of Nomad API JSON into typed records.
//!
//! A record type declares, once, which upstream keys it understands and the
//! [`Codec`] that turns each raw value into a field. One generic routine,
//! [`decode`], walks any payload against that table:
//!
//! - `null` decodes to `None`;
//! - every declared field starts out null or empty;
//! - each input key the schema declares is loaded through its codec;
//! - keys the schema does not declare are ignored.
//!
//! Records dump back to their source-keyed JSON with
//! [`Record::to_structural_form`], which `decode` accepts again.
//!
//! ```
//! use nomad_decode::{decode, record, ArrayOfStrings, Record, StringAsNil};
//!
//! record! {
//!     pub struct Member {
//!         name: Option<String> = "Name" => StringAsNil,
//!         port: Option<i64> = "Port",
//!         tags: Vec<String> = "Tags" => ArrayOfStrings,
//!     }
//! }
//!
//! let json = serde_json::json!({"Name": "server-1", "Port": 4648, "Extra": true});
//! let member: Member = decode(&json).unwrap().unwrap();
//! assert_eq!(member.name.as_deref(), Some("server-1"));
//! assert!(member.tags.is_empty());
//!
//! let again: Member = decode(&member.to_structural_form()).unwrap().unwrap();
//! assert_eq!(again, member);
//! ```

mod codec;
mod error;
mod keys;
mod schema;

pub use codec::{
    stringify_keys, ArrayOfStrings, Codec, DateAsTimestamp, NanosecondsAsDuration,
    NanosecondsAsTimestamp, Nested, NilAsArray, Plain, RecordMap, Records, SizeInMegabits,
    SizeInMegabytes, StringAsNil, StringifyKeys,
};
pub use error::{json_kind, DecodeError, Result};
pub use keys::normalize_key;
pub use schema::{decode, decode_list, DumpFn, FieldSpec, LoadFn, Record, Schema};

#[doc(hidden)]
pub mod __private {
    pub use serde_json::Value;
}
