//! # Transaction Extra Field
//!
//! Parses the tagged extra field of a CryptoNote-style transaction into a
//! closed set of variants and extracts the payment id from it.
//!
//! ## Layout
//!
//! | Tag | Variant | Payload |
//! |-----|---------|---------|
//! | `0x00` | Padding | zero bytes up to the end of the field |
//! | `0x01` | Public key | 32 bytes |
//! | `0x02` | Nonce | 1-byte length + data |
//! | `0x03` | Merge mining | varint length + (varint depth, 32-byte root) |
//! | `0x04` | Message | varint length + data |
//! | `0x05` | TTL | varint length + varint ttl |
//!
//! A nonce whose first byte is `0x00` followed by 32 bytes carries a
//! payment id.

use crate::entities::{Hash, PaymentId, PublicKey};
use crate::errors::ExtraError;

pub const TX_EXTRA_TAG_PADDING: u8 = 0x00;
pub const TX_EXTRA_TAG_PUBKEY: u8 = 0x01;
pub const TX_EXTRA_NONCE: u8 = 0x02;
pub const TX_EXTRA_MERGE_MINING_TAG: u8 = 0x03;
pub const TX_EXTRA_MESSAGE_TAG: u8 = 0x04;
pub const TX_EXTRA_TTL: u8 = 0x05;

/// First nonce byte marking an embedded payment id.
pub const TX_EXTRA_NONCE_PAYMENT_ID: u8 = 0x00;

/// Maximum total size of a padding field, tag included.
pub const TX_EXTRA_PADDING_MAX_COUNT: usize = 255;

/// Maximum size of a nonce payload.
pub const TX_EXTRA_NONCE_MAX_COUNT: usize = 255;

/// One parsed extra-field entry.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExtraField {
    /// Trailing zero padding of the given total size.
    Padding { size: usize },
    /// Transaction public key.
    PublicKey(PublicKey),
    /// Arbitrary nonce, possibly carrying a payment id.
    Nonce(Vec<u8>),
    /// Merge-mining commitment.
    MergeMining { depth: u64, merkle_root: Hash },
    /// Encrypted message blob.
    Message(Vec<u8>),
    /// Mempool time-to-live.
    Ttl(u64),
}

impl ExtraField {
    /// Payment id carried by this field, if it is a payment-id nonce.
    pub fn payment_id(&self) -> Option<PaymentId> {
        match self {
            Self::Nonce(nonce) => payment_id_from_nonce(nonce),
            _ => None,
        }
    }
}

struct ExtraReader<'a> {
    bytes: &'a [u8],
    offset: usize,
}

impl<'a> ExtraReader<'a> {
    fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, offset: 0 }
    }

    fn next_tag(&mut self) -> Option<u8> {
        let byte = *self.bytes.get(self.offset)?;
        self.offset += 1;
        Some(byte)
    }

    fn remaining(&self) -> &'a [u8] {
        &self.bytes[self.offset..]
    }

    fn take(&mut self, len: usize, tag: u8) -> Result<&'a [u8], ExtraError> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.bytes.len())
            .ok_or(ExtraError::Truncated {
                tag,
                offset: self.offset,
            })?;
        let slice = &self.bytes[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    fn take_array<const N: usize>(&mut self, tag: u8) -> Result<[u8; N], ExtraError> {
        let slice = self.take(N, tag)?;
        let mut out = [0u8; N];
        out.copy_from_slice(slice);
        Ok(out)
    }

    fn byte(&mut self, tag: u8) -> Result<u8, ExtraError> {
        Ok(self.take(1, tag)?[0])
    }

    fn varint(&mut self, tag: u8) -> Result<u64, ExtraError> {
        let start = self.offset;
        let mut value: u64 = 0;
        let mut shift = 0u32;
        loop {
            let byte = self.byte(tag)?;
            if shift >= 64 || (shift == 63 && byte > 1) {
                return Err(ExtraError::VarintOverflow { offset: start });
            }
            value |= u64::from(byte & 0x7f) << shift;
            if byte & 0x80 == 0 {
                return Ok(value);
            }
            shift += 7;
        }
    }

    fn sized_payload(&mut self, tag: u8) -> Result<&'a [u8], ExtraError> {
        let len = self.varint(tag)?;
        let len = usize::try_from(len).map_err(|_| ExtraError::Truncated {
            tag,
            offset: self.offset,
        })?;
        self.take(len, tag)
    }
}

/// Parses every field of `extra`, in order.
pub fn parse_extra(extra: &[u8]) -> Result<Vec<ExtraField>, ExtraError> {
    let mut fields = Vec::new();
    let mut reader = ExtraReader::new(extra);

    while let Some(tag) = reader.next_tag() {
        let tag_offset = reader.offset - 1;
        match tag {
            TX_EXTRA_TAG_PADDING => {
                let rest = reader.remaining();
                let size = rest.len() + 1;
                if size > TX_EXTRA_PADDING_MAX_COUNT || rest.iter().any(|b| *b != 0) {
                    return Err(ExtraError::InvalidPadding { offset: tag_offset });
                }
                reader.offset = extra.len();
                fields.push(ExtraField::Padding { size });
            }
            TX_EXTRA_TAG_PUBKEY => {
                fields.push(ExtraField::PublicKey(reader.take_array::<32>(tag)?));
            }
            TX_EXTRA_NONCE => {
                let len = usize::from(reader.byte(tag)?);
                fields.push(ExtraField::Nonce(reader.take(len, tag)?.to_vec()));
            }
            TX_EXTRA_MERGE_MINING_TAG => {
                let payload = reader.sized_payload(tag)?;
                let mut inner = ExtraReader::new(payload);
                let malformed = |_: ExtraError| ExtraError::Malformed {
                    field: "merge mining",
                };
                let depth = inner.varint(tag).map_err(malformed)?;
                let merkle_root = inner.take_array::<32>(tag).map_err(malformed)?;
                fields.push(ExtraField::MergeMining { depth, merkle_root });
            }
            TX_EXTRA_MESSAGE_TAG => {
                fields.push(ExtraField::Message(reader.sized_payload(tag)?.to_vec()));
            }
            TX_EXTRA_TTL => {
                let payload = reader.sized_payload(tag)?;
                let ttl = ExtraReader::new(payload)
                    .varint(tag)
                    .map_err(|_| ExtraError::Malformed { field: "ttl" })?;
                fields.push(ExtraField::Ttl(ttl));
            }
            other => {
                return Err(ExtraError::UnknownTag {
                    tag: other,
                    offset: tag_offset,
                })
            }
        }
    }

    Ok(fields)
}

/// Payment id carried by a nonce, if the nonce has the payment-id shape.
pub fn payment_id_from_nonce(nonce: &[u8]) -> Option<PaymentId> {
    match nonce.split_first() {
        Some((&TX_EXTRA_NONCE_PAYMENT_ID, rest)) if rest.len() == 32 => {
            let mut id = [0u8; 32];
            id.copy_from_slice(rest);
            Some(id)
        }
        _ => None,
    }
}

/// First payment id found in `extra`. Unparseable extras carry none.
pub fn payment_id_from_extra(extra: &[u8]) -> Option<PaymentId> {
    parse_extra(extra)
        .ok()?
        .iter()
        .find_map(ExtraField::payment_id)
}

/// Appends a transaction public key field.
pub fn append_public_key(extra: &mut Vec<u8>, key: &PublicKey) {
    extra.push(TX_EXTRA_TAG_PUBKEY);
    extra.extend_from_slice(key);
}

/// Appends a nonce field carrying `payment_id`.
pub fn append_payment_id(extra: &mut Vec<u8>, payment_id: &PaymentId) {
    extra.push(TX_EXTRA_NONCE);
    extra.push(33);
    extra.push(TX_EXTRA_NONCE_PAYMENT_ID);
    extra.extend_from_slice(payment_id);
}
