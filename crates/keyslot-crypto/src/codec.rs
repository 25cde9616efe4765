//! Byte and integer codec
//!
//! Pure, stateless conversions shared by the DH and session key modules:
//! fixed-length unsigned big integers, big-endian `u32` fields, hex strings
//! and the MPI encoding fed into the session key KDF.

use num_bigint::BigUint;
use subtle::ConstantTimeEq;
use thiserror::Error;

/// Size of the big-endian length prefix of an MPI.
pub const MPI_LENGTH_PREFIX: usize = 4;

/// Errors from codec operations
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    /// Value or field does not fit in the space available for it
    #[error("length exceeded: at most {max} bytes available, need {actual}")]
    LengthExceeded {
        /// Bytes available
        max: usize,
        /// Bytes required
        actual: usize,
    },

    /// Input could not be decoded
    #[error("malformed input: {reason}")]
    MalformedInput {
        /// What was wrong with the input
        reason: String,
    },
}

/// Minimal unsigned big-endian encoding of `value`.
///
/// Never carries a leading zero byte. Zero encodes as the empty string.
pub fn big_int_to_unsigned_bytes(value: &BigUint) -> Vec<u8> {
    if value.bits() == 0 {
        return Vec::new();
    }
    value.to_bytes_be()
}

/// Decode an unsigned big-endian byte string. The empty string is zero.
pub fn big_int_from_unsigned_bytes(bytes: &[u8]) -> BigUint {
    BigUint::from_bytes_be(bytes)
}

/// Encode `value` as exactly `length` bytes, big-endian, left-zero-padded.
///
/// # Errors
///
/// - `LengthExceeded` if the minimal encoding is longer than `length`
pub fn big_int_to_fixed_bytes(value: &BigUint, length: usize) -> Result<Vec<u8>, CodecError> {
    let mut out = vec![0u8; length];
    big_int_into_slice(value, &mut out, 0, length)?;
    Ok(out)
}

/// Write `value` right-aligned into `dst[offset..offset + length]`.
///
/// Leading bytes of the window are zeroed; bytes outside it are untouched.
pub fn big_int_into_slice(
    value: &BigUint,
    dst: &mut [u8],
    offset: usize,
    length: usize,
) -> Result<(), CodecError> {
    let available = dst.len().saturating_sub(offset);
    let window = offset
        .checked_add(length)
        .and_then(|end| dst.get_mut(offset..end))
        .ok_or(CodecError::LengthExceeded { max: available, actual: length })?;

    let bytes = big_int_to_unsigned_bytes(value);
    if bytes.len() > length {
        return Err(CodecError::LengthExceeded { max: length, actual: bytes.len() });
    }

    let pad = length - bytes.len();
    window[..pad].fill(0);
    window[pad..].copy_from_slice(&bytes);
    Ok(())
}

/// Write `value` as 4 big-endian bytes at `dst[index..index + 4]`.
pub fn write_u32_be(dst: &mut [u8], index: usize, value: u32) -> Result<(), CodecError> {
    let available = dst.len().saturating_sub(index);
    let window = index
        .checked_add(4)
        .and_then(|end| dst.get_mut(index..end))
        .ok_or(CodecError::LengthExceeded { max: available, actual: 4 })?;

    window.copy_from_slice(&value.to_be_bytes());
    Ok(())
}

/// Read 4 big-endian bytes at `src[index..index + 4]`.
pub fn read_u32_be(src: &[u8], index: usize) -> Result<u32, CodecError> {
    let window = index
        .checked_add(4)
        .and_then(|end| src.get(index..end))
        .ok_or(CodecError::LengthExceeded { max: src.len().saturating_sub(index), actual: 4 })?;

    let mut buf = [0u8; 4];
    buf.copy_from_slice(window);
    Ok(u32::from_be_bytes(buf))
}

/// Uppercase hex encoding.
pub fn hex_encode(bytes: &[u8]) -> String {
    hex::encode_upper(bytes)
}

/// Decode a hex string. Upper and lower case digits are both accepted.
///
/// # Errors
///
/// - `MalformedInput` on odd-length input or a non-hex character
pub fn hex_decode(input: &str) -> Result<Vec<u8>, CodecError> {
    hex::decode(input).map_err(|e| CodecError::MalformedInput { reason: e.to_string() })
}

/// Equality over optional byte strings.
///
/// Absent inputs and length mismatches compare unequal. For equal lengths the
/// comparison time does not depend on where the contents differ.
pub fn constant_time_eq(a: Option<&[u8]>, b: Option<&[u8]>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => a.len() == b.len() && bool::from(a.ct_eq(b)),
        _ => false,
    }
}

/// Append the MPI encoding of `value` to `out`: a 4-byte big-endian length
/// followed by the minimal unsigned encoding.
pub fn write_mpi(out: &mut Vec<u8>, value: &BigUint) -> Result<(), CodecError> {
    let bytes = big_int_to_unsigned_bytes(value);
    let len = u32::try_from(bytes.len())
        .map_err(|_| CodecError::LengthExceeded { max: u32::MAX as usize, actual: bytes.len() })?;

    out.reserve(MPI_LENGTH_PREFIX + bytes.len());
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(&bytes);
    Ok(())
}

/// MPI encoding of `value` as a fresh buffer.
pub fn mpi_encode(value: &BigUint) -> Result<Vec<u8>, CodecError> {
    let mut out = Vec::new();
    write_mpi(&mut out, value)?;
    Ok(out)
}

/// Read one MPI from the front of `src`, returning the value and the rest.
pub fn read_mpi(src: &[u8]) -> Result<(BigUint, &[u8]), CodecError> {
    let len = read_u32_be(src, 0).map_err(|_| CodecError::MalformedInput {
        reason: format!("MPI length prefix needs 4 bytes, got {}", src.len()),
    })? as usize;

    let body = &src[MPI_LENGTH_PREFIX..];
    if body.len() < len {
        return Err(CodecError::MalformedInput {
            reason: format!("MPI declares {len} bytes, only {} remain", body.len()),
        });
    }

    let (value, rest) = body.split_at(len);
    Ok((big_int_from_unsigned_bytes(value), rest))
}
