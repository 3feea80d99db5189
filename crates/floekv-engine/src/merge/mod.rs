
use thiserror::Error as ThisError;

///
/// MergeError
///

#[derive(Debug, ThisError)]
pub enum MergeError {
    #[error("merge operand length mismatch: {len} bytes (expected {expected})")]
    OperandLength { len: usize, expected: usize },
}

///
/// MergeOperator
///
/// Resolves a merge entry against the existing value of its key at apply
/// time. `existing` is `None` when the key has no current value.
///

pub trait MergeOperator {
    fn name(&self) -> &'static str;

    fn full_merge(&self, existing: Option<&[u8]>, operand: &[u8]) -> Result<Vec<u8>, MergeError>;
}

///
/// Uint64AddOperator
///
/// Associative merge operator over 8-byte little-endian u64 counters:
/// the merged value is the wrapping sum of the existing value and the
/// operand. A missing existing value counts as zero.
///

#[derive(Clone, Copy, Debug, Default)]
pub struct Uint64AddOperator;

impl MergeOperator for Uint64AddOperator {
    fn name(&self) -> &'static str {
        "uint64add"
    }

    fn full_merge(&self, existing: Option<&[u8]>, operand: &[u8]) -> Result<Vec<u8>, MergeError> {
        let base = match existing {
            Some(bytes) => decode_u64(bytes)?,
            None => 0,
        };
        let add = decode_u64(operand)?;

        Ok(base.wrapping_add(add).to_le_bytes().to_vec())
    }
}

fn decode_u64(bytes: &[u8]) -> Result<u64, MergeError> {
    let Ok(array) = <[u8; 8]>::try_from(bytes) else {
        return Err(MergeError::OperandLength {
            len: bytes.len(),
            expected: 8,
        });
    };

    Ok(u64::from_le_bytes(array))
}
