//! # ev-codec: tagged value wire codec
//!
//! Encodes an [`EValue`] into the buffer handed across the native runtime
//! boundary, and decodes such buffers back for verification.
//!
//! ## Layout
//!
//! ```text
//! ┌─────────┬──────────────────────────────────────────────┐
//! │ byte 0  │ bytes 1..                                    │
//! ├─────────┼──────────────────────────────────────────────┤
//! │ tag     │ payload, fixed width per kind                │
//! │  0 none │  (empty)                                     │
//! │  2 str  │  u32 byte length, then UTF-8 bytes           │
//! │  3 f64  │  8 bytes IEEE-754                            │
//! │  4 int  │  4 bytes two's complement (i32 range only)   │
//! │  5 bool │  1 byte, 0x00 or 0x01                        │
//! │  1 tsr  │  no layout: UnsupportedKind                  │
//! └─────────┴──────────────────────────────────────────────┘
//! ```
//!
//! Multi-byte payloads use the configured [`ByteOrder`]. The default is
//! big-endian, so `EValue::from_int(1)` encodes to `04 00 00 00 01`.
//!
//! Integers outside the 4-byte payload width are rejected with
//! [`CodecError::PayloadOverflow`]; they are never truncated.

#![forbid(unsafe_code)]

pub mod buffer;
pub mod config;
pub mod error;
pub mod marshal;

pub use buffer::EncodedValue;
pub use config::{ByteOrder, CodecConfig};
pub use error::CodecError;
pub use ev_core::{EValue, Tag};
pub use marshal::{Codec, decode, encode, encoded_len};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reexports_cover_the_round_trip() {
        let value = EValue::from(1_i32);
        let buf = encode(&value).unwrap();
        assert_eq!(buf.to_hex(), "04 00 00 00 01");
        assert_eq!(decode(buf.as_bytes()).unwrap(), value);
    }

    #[test]
    fn codec_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Codec>();
        assert_send_sync::<EncodedValue>();
        assert_send_sync::<CodecError>();
    }

    #[test]
    fn codec_test_log_schema_contract() {
        let fixture_id =
            ev_test_utils::fixture_id_from_json(&("codec", "int", 1_i64)).expect("digest");
        let log = ev_test_utils::TestLogV1::new(
            ev_test_utils::test_id(module_path!(), "codec_test_log_schema_contract"),
            fixture_id,
            ev_test_utils::TestKind::Unit,
            ev_test_utils::TestResult::Pass,
        );
        assert_eq!(log.schema_version, ev_test_utils::TEST_LOG_SCHEMA_VERSION);
        ev_test_utils::emit_test_log(&log).expect("test log written");
    }
}
