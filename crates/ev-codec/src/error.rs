//! Errors raised while encoding or decoding tagged values.

use ev_core::Tag;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// The kind has no wire layout (tensors, for now).
    UnsupportedKind { tag: Tag },
    /// The payload does not fit the fixed width reserved for its kind.
    PayloadOverflow {
        tag: Tag,
        value: i128,
        width_bytes: usize,
    },
    /// Zero-length input: not even a tag byte.
    Empty,
    UnknownTag { byte: u8 },
    /// Fewer payload bytes than the kind's layout requires.
    Truncated {
        tag: Tag,
        expected_bytes: usize,
        actual_bytes: usize,
    },
    TrailingBytes { tag: Tag, extra: usize },
    InvalidBool { byte: u8 },
    InvalidUtf8 { valid_up_to: usize },
    InvalidConfig { message: String },
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedKind { tag } => {
                write!(f, "no wire layout is defined for kind {tag}")
            }
            Self::PayloadOverflow {
                tag,
                value,
                width_bytes,
            } => {
                write!(
                    f,
                    "payload {value} for kind {tag} does not fit in {width_bytes} bytes"
                )
            }
            Self::Empty => write!(f, "cannot decode an empty buffer: missing tag byte"),
            Self::UnknownTag { byte } => {
                write!(f, "unknown tag byte {byte:#04x}")
            }
            Self::Truncated {
                tag,
                expected_bytes,
                actual_bytes,
            } => {
                write!(
                    f,
                    "truncated {tag} payload: expected {expected_bytes} bytes, got {actual_bytes}"
                )
            }
            Self::TrailingBytes { tag, extra } => {
                write!(f, "{extra} trailing bytes after {tag} payload")
            }
            Self::InvalidBool { byte } => {
                write!(f, "invalid bool payload byte {byte:#04x}: expected 0x00 or 0x01")
            }
            Self::InvalidUtf8 { valid_up_to } => {
                write!(f, "string payload is not UTF-8 (valid up to byte {valid_up_to})")
            }
            Self::InvalidConfig { message } => {
                write!(f, "invalid codec config: {message}")
            }
        }
    }
}

impl std::error::Error for CodecError {}

#[cfg(test)]
mod tests {
    use super::CodecError;
    use ev_core::Tag;

    #[test]
    fn overflow_message_names_value_and_width() {
        let err = CodecError::PayloadOverflow {
            tag: Tag::Int,
            value: 2_147_483_648,
            width_bytes: 4,
        };
        let msg = err.to_string();
        assert!(msg.contains("2147483648"));
        assert!(msg.contains("int(4)"));
        assert!(msg.contains("4 bytes"));
    }

    #[test]
    fn unsupported_kind_message_names_tensor() {
        let msg = CodecError::UnsupportedKind { tag: Tag::Tensor }.to_string();
        assert!(msg.contains("tensor(1)"));
    }

    #[test]
    fn decode_messages_are_actionable() {
        let msg = CodecError::Truncated {
            tag: Tag::Double,
            expected_bytes: 8,
            actual_bytes: 3,
        }
        .to_string();
        assert!(msg.contains('8'));
        assert!(msg.contains('3'));

        assert_eq!(
            CodecError::UnknownTag { byte: 0x2a }.to_string(),
            "unknown tag byte 0x2a"
        );
        assert!(CodecError::InvalidBool { byte: 7 }.to_string().contains("0x07"));
    }
}
