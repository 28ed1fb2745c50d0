//! EValue ↔ byte buffer marshalling.
//!
//! Every buffer starts with the kind's tag byte; the payload that follows has
//! a fixed width per kind (strings carry a length prefix instead).

use std::cmp::Ordering;

use ev_core::{EValue, Tag};

use crate::buffer::EncodedValue;
use crate::config::CodecConfig;
use crate::error::CodecError;

pub const TAG_BYTES: usize = 1;
pub const INT_PAYLOAD_BYTES: usize = 4;
pub const DOUBLE_PAYLOAD_BYTES: usize = 8;
pub const BOOL_PAYLOAD_BYTES: usize = 1;
pub const STRING_LEN_PREFIX_BYTES: usize = 4;

/// Encoder/decoder bound to one [`CodecConfig`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Codec {
    config: CodecConfig,
}

impl Codec {
    #[must_use]
    pub fn new(config: CodecConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &CodecConfig {
        &self.config
    }

    /// Exact length `encode` would produce, failing the same way it would.
    pub fn encoded_len(&self, value: &EValue) -> Result<usize, CodecError> {
        let payload = match value {
            EValue::None => 0,
            EValue::Int(v) => {
                int_payload(*v)?;
                INT_PAYLOAD_BYTES
            }
            EValue::Double(_) => DOUBLE_PAYLOAD_BYTES,
            EValue::Bool(_) => BOOL_PAYLOAD_BYTES,
            EValue::String(s) => {
                string_len_prefix(s)?;
                STRING_LEN_PREFIX_BYTES + s.len()
            }
            EValue::Tensor(_) => return Err(CodecError::UnsupportedKind { tag: Tag::Tensor }),
        };
        Ok(TAG_BYTES + payload)
    }

    /// Marshal `value` into an owned tag-prefixed buffer.
    pub fn encode(&self, value: &EValue) -> Result<EncodedValue, CodecError> {
        let tag = value.tag();
        let order = self.config.byte_order;
        let mut data = Vec::with_capacity(self.encoded_len(value)?);
        data.push(tag.as_byte());

        match value {
            EValue::None => {}
            EValue::Int(v) => data.extend_from_slice(&order.i32_bytes(int_payload(*v)?)),
            EValue::Double(v) => data.extend_from_slice(&order.f64_bytes(*v)),
            EValue::Bool(v) => data.push(u8::from(*v)),
            EValue::String(s) => {
                data.extend_from_slice(&order.u32_bytes(string_len_prefix(s)?));
                data.extend_from_slice(s.as_bytes());
            }
            EValue::Tensor(_) => return Err(CodecError::UnsupportedKind { tag }),
        }

        Ok(EncodedValue::new(tag, data))
    }

    /// Unmarshal one complete buffer back into an `EValue`.
    pub fn decode(&self, bytes: &[u8]) -> Result<EValue, CodecError> {
        let (&tag_byte, payload) = bytes.split_first().ok_or(CodecError::Empty)?;
        let tag = Tag::from_byte(tag_byte).ok_or(CodecError::UnknownTag { byte: tag_byte })?;
        let order = self.config.byte_order;

        match tag {
            Tag::None => {
                check_payload_len(tag, payload.len(), 0)?;
                Ok(EValue::None)
            }
            Tag::Int => {
                let raw = fixed_payload::<INT_PAYLOAD_BYTES>(tag, payload)?;
                Ok(EValue::Int(i64::from(order.read_i32(raw))))
            }
            Tag::Double => {
                let raw = fixed_payload::<DOUBLE_PAYLOAD_BYTES>(tag, payload)?;
                Ok(EValue::Double(order.read_f64(raw)))
            }
            Tag::Bool => {
                let [byte] = fixed_payload::<BOOL_PAYLOAD_BYTES>(tag, payload)?;
                match byte {
                    0 => Ok(EValue::Bool(false)),
                    1 => Ok(EValue::Bool(true)),
                    _ => Err(CodecError::InvalidBool { byte }),
                }
            }
            Tag::String => {
                if payload.len() < STRING_LEN_PREFIX_BYTES {
                    return Err(CodecError::Truncated {
                        tag,
                        expected_bytes: STRING_LEN_PREFIX_BYTES,
                        actual_bytes: payload.len(),
                    });
                }
                let (prefix, body) = payload.split_at(STRING_LEN_PREFIX_BYTES);
                let prefix: [u8; STRING_LEN_PREFIX_BYTES] =
                    prefix.try_into().map_err(|_| CodecError::Truncated {
                        tag,
                        expected_bytes: STRING_LEN_PREFIX_BYTES,
                        actual_bytes: payload.len(),
                    })?;
                let len = order.read_u32(prefix) as usize;
                check_payload_len(tag, payload.len(), STRING_LEN_PREFIX_BYTES.saturating_add(len))?;
                let text = String::from_utf8(body.to_vec()).map_err(|err| {
                    CodecError::InvalidUtf8 {
                        valid_up_to: err.utf8_error().valid_up_to(),
                    }
                })?;
                Ok(EValue::String(text))
            }
            Tag::Tensor => Err(CodecError::UnsupportedKind { tag }),
        }
    }
}

/// Encode with the default configuration.
pub fn encode(value: &EValue) -> Result<EncodedValue, CodecError> {
    Codec::default().encode(value)
}

/// Decode with the default configuration.
pub fn decode(bytes: &[u8]) -> Result<EValue, CodecError> {
    Codec::default().decode(bytes)
}

/// Encoded size under the default configuration.
pub fn encoded_len(value: &EValue) -> Result<usize, CodecError> {
    Codec::default().encoded_len(value)
}

fn int_payload(value: i64) -> Result<i32, CodecError> {
    i32::try_from(value).map_err(|_| CodecError::PayloadOverflow {
        tag: Tag::Int,
        value: i128::from(value),
        width_bytes: INT_PAYLOAD_BYTES,
    })
}

fn string_len_prefix(value: &str) -> Result<u32, CodecError> {
    u32::try_from(value.len()).map_err(|_| CodecError::PayloadOverflow {
        tag: Tag::String,
        value: value.len() as i128,
        width_bytes: STRING_LEN_PREFIX_BYTES,
    })
}

fn check_payload_len(tag: Tag, actual: usize, expected: usize) -> Result<(), CodecError> {
    match actual.cmp(&expected) {
        Ordering::Less => Err(CodecError::Truncated {
            tag,
            expected_bytes: expected,
            actual_bytes: actual,
        }),
        Ordering::Greater => Err(CodecError::TrailingBytes {
            tag,
            extra: actual - expected,
        }),
        Ordering::Equal => Ok(()),
    }
}

fn fixed_payload<const N: usize>(tag: Tag, payload: &[u8]) -> Result<[u8; N], CodecError> {
    check_payload_len(tag, payload.len(), N)?;
    payload.try_into().map_err(|_| CodecError::Truncated {
        tag,
        expected_bytes: N,
        actual_bytes: payload.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ByteOrder;
    use ev_core::TensorValue;
    use proptest::prelude::*;

    fn little() -> Codec {
        Codec::new(CodecConfig::with_byte_order(ByteOrder::Little))
    }

    #[test]
    fn int_one_matches_reference_buffer() {
        let buf = encode(&EValue::from_int(1)).unwrap();
        assert_eq!(buf.as_bytes(), &[4, 0, 0, 0, 1]);
        assert_eq!(buf.tag(), Tag::Int);
    }

    #[test]
    fn int_one_little_endian() {
        let buf = little().encode(&EValue::from_int(1)).unwrap();
        assert_eq!(buf.as_bytes(), &[4, 1, 0, 0, 0]);
    }

    #[test]
    fn negative_int_is_twos_complement() {
        let buf = encode(&EValue::from_int(-1)).unwrap();
        assert_eq!(buf.as_bytes(), &[4, 0xff, 0xff, 0xff, 0xff]);
    }

    #[test]
    fn none_is_tag_only() {
        let buf = encode(&EValue::none()).unwrap();
        assert_eq!(buf.as_bytes(), &[0]);
        assert_eq!(decode(&[0]).unwrap(), EValue::None);
    }

    #[test]
    fn bool_layout() {
        assert_eq!(encode(&EValue::from_bool(true)).unwrap().as_bytes(), &[5, 1]);
        assert_eq!(encode(&EValue::from_bool(false)).unwrap().as_bytes(), &[5, 0]);
    }

    #[test]
    fn double_layout() {
        let buf = encode(&EValue::from_double(1.0)).unwrap();
        assert_eq!(buf.as_bytes(), &[3, 0x3f, 0xf0, 0, 0, 0, 0, 0, 0]);
        let buf = little().encode(&EValue::from_double(1.0)).unwrap();
        assert_eq!(buf.as_bytes(), &[3, 0, 0, 0, 0, 0, 0, 0xf0, 0x3f]);
    }

    #[test]
    fn string_layout_has_length_prefix() {
        let buf = encode(&EValue::from_string("hi")).unwrap();
        assert_eq!(buf.as_bytes(), &[2, 0, 0, 0, 2, b'h', b'i']);
        assert_eq!(decode(buf.as_bytes()).unwrap(), EValue::from_string("hi"));
    }

    #[test]
    fn empty_string_round_trips() {
        let buf = encode(&EValue::from_string("")).unwrap();
        assert_eq!(buf.size(), 5);
        assert_eq!(decode(buf.as_bytes()).unwrap(), EValue::from_string(""));
    }

    #[test]
    fn tensor_is_unsupported() {
        let tensor = TensorValue::from_f32s(&[1.0], &[1]).unwrap();
        let value = EValue::from_tensor(tensor);
        assert_eq!(
            encode(&value).unwrap_err(),
            CodecError::UnsupportedKind { tag: Tag::Tensor }
        );
        assert_eq!(
            encoded_len(&value).unwrap_err(),
            CodecError::UnsupportedKind { tag: Tag::Tensor }
        );
        assert_eq!(
            decode(&[1]).unwrap_err(),
            CodecError::UnsupportedKind { tag: Tag::Tensor }
        );
    }

    #[test]
    fn int_bounds_encode() {
        for n in [i64::from(i32::MIN), i64::from(i32::MAX), 0] {
            let buf = encode(&EValue::from_int(n)).unwrap();
            assert_eq!(decode(buf.as_bytes()).unwrap(), EValue::from_int(n));
        }
    }

    #[test]
    fn int_just_past_bounds_overflows() {
        for n in [i64::from(i32::MAX) + 1, i64::from(i32::MIN) - 1] {
            let err = encode(&EValue::from_int(n)).unwrap_err();
            assert_eq!(
                err,
                CodecError::PayloadOverflow {
                    tag: Tag::Int,
                    value: i128::from(n),
                    width_bytes: INT_PAYLOAD_BYTES,
                }
            );
        }
    }

    #[test]
    fn encoded_len_matches_encode() {
        let values = [
            EValue::none(),
            EValue::from_int(9),
            EValue::from_double(-3.25),
            EValue::from_bool(true),
            EValue::from_string("héllo"),
        ];
        for value in &values {
            assert_eq!(encoded_len(value).unwrap(), encode(value).unwrap().size());
        }
    }

    #[test]
    fn decode_empty_fails() {
        assert_eq!(decode(&[]).unwrap_err(), CodecError::Empty);
    }

    #[test]
    fn decode_unknown_tag_fails() {
        assert_eq!(
            decode(&[6, 0]).unwrap_err(),
            CodecError::UnknownTag { byte: 6 }
        );
    }

    #[test]
    fn decode_truncated_int_fails() {
        assert_eq!(
            decode(&[4, 0, 0]).unwrap_err(),
            CodecError::Truncated {
                tag: Tag::Int,
                expected_bytes: 4,
                actual_bytes: 2,
            }
        );
    }

    #[test]
    fn decode_trailing_bytes_fails() {
        assert_eq!(
            decode(&[4, 0, 0, 0, 1, 9]).unwrap_err(),
            CodecError::TrailingBytes {
                tag: Tag::Int,
                extra: 1,
            }
        );
        assert_eq!(
            decode(&[0, 0]).unwrap_err(),
            CodecError::TrailingBytes {
                tag: Tag::None,
                extra: 1,
            }
        );
    }

    #[test]
    fn decode_invalid_bool_fails() {
        assert_eq!(
            decode(&[5, 2]).unwrap_err(),
            CodecError::InvalidBool { byte: 2 }
        );
    }

    #[test]
    fn decode_string_checks_prefix_and_body() {
        assert!(matches!(
            decode(&[2, 0, 0]).unwrap_err(),
            CodecError::Truncated {
                tag: Tag::String,
                expected_bytes: 4,
                ..
            }
        ));
        assert_eq!(
            decode(&[2, 0, 0, 0, 3, b'a']).unwrap_err(),
            CodecError::Truncated {
                tag: Tag::String,
                expected_bytes: 7,
                actual_bytes: 5,
            }
        );
        assert_eq!(
            decode(&[2, 0, 0, 0, 1, 0xff]).unwrap_err(),
            CodecError::InvalidUtf8 { valid_up_to: 0 }
        );
    }

    #[test]
    fn byte_orders_disagree_on_multibyte_payloads() {
        let buf = encode(&EValue::from_int(1)).unwrap();
        assert_eq!(
            little().decode(buf.as_bytes()).unwrap(),
            EValue::from_int(16_777_216)
        );
    }

    #[test]
    fn codec_exposes_config() {
        assert_eq!(little().config().byte_order, ByteOrder::Little);
        assert_eq!(Codec::default().config(), &CodecConfig::default());
    }

    fn arb_byte_order() -> impl Strategy<Value = ByteOrder> {
        prop_oneof![Just(ByteOrder::Big), Just(ByteOrder::Little)]
    }

    fn arb_encodable() -> impl Strategy<Value = EValue> {
        prop_oneof![
            Just(EValue::None),
            (i32::MIN..=i32::MAX).prop_map(|n| EValue::from_int(i64::from(n))),
            any::<f64>().prop_map(EValue::from_double),
            any::<bool>().prop_map(EValue::from_bool),
            ".{0,64}".prop_map(EValue::String),
        ]
    }

    proptest! {
        #[test]
        fn prop_round_trip(value in arb_encodable(), order in arb_byte_order()) {
            let codec = Codec::new(CodecConfig::with_byte_order(order));
            let buf = codec.encode(&value).unwrap();
            prop_assert_eq!(buf.as_bytes()[0], value.tag().as_byte());
            prop_assert_eq!(codec.decode(buf.as_bytes()).unwrap(), value);
        }

        #[test]
        fn prop_encode_is_deterministic(value in arb_encodable()) {
            let a = encode(&value).unwrap();
            let b = encode(&value.clone()).unwrap();
            prop_assert_eq!(a, b);
        }

        #[test]
        fn prop_int_outside_width_overflows(
            n in prop_oneof![
                (i64::from(i32::MAX) + 1)..=i64::MAX,
                i64::MIN..=(i64::from(i32::MIN) - 1),
            ]
        ) {
            let err = encode(&EValue::from_int(n)).unwrap_err();
            let is_overflow = matches!(err, CodecError::PayloadOverflow { tag: Tag::Int, .. });
            prop_assert!(is_overflow);
        }

        #[test]
        fn prop_truncated_buffers_never_decode(value in arb_encodable(), cut in 1usize..16) {
            let bytes = encode(&value).unwrap().into_bytes();
            if cut < bytes.len() {
                prop_assert!(decode(&bytes[..bytes.len() - cut]).is_err());
            }
        }
    }
}
