//! Fuzz target for the integer and MPI codec
//!
//! Feeds arbitrary bytes and window parameters to every decoder and to the
//! fixed-length writer.
//!
//! # Invariants
//!
//! - Decoders never panic; malformed input is an error
//! - A decoded MPI re-encodes to the exact bytes it consumed, when minimal
//! - Fixed-length writes touch only their window
//! - Hex decoding of an encoded buffer returns the buffer

#![no_main]

use arbitrary::Arbitrary;
use keyslot_crypto::codec::{
    big_int_from_unsigned_bytes, big_int_into_slice, big_int_to_unsigned_bytes, hex_decode,
    hex_encode, mpi_encode, read_mpi, read_u32_be,
};
use libfuzzer_sys::fuzz_target;

#[derive(Debug, Arbitrary)]
struct CodecInput {
    data: Vec<u8>,
    value: Vec<u8>,
    offset: u8,
    length: u8,
    text: String,
}

fuzz_target!(|input: CodecInput| {
    // INVARIANT 1: MPI parsing never panics and canonical MPIs round trip
    if let Ok((value, rest)) = read_mpi(&input.data) {
        let consumed = &input.data[..input.data.len() - rest.len()];
        let minimal = consumed.get(4).is_none_or(|&b| b != 0);
        if minimal {
            assert_eq!(mpi_encode(&value).unwrap(), consumed, "canonical MPI must round trip");
        }
    }

    let _ = read_u32_be(&input.data, usize::from(input.offset));
    let _ = hex_decode(&input.text);

    // INVARIANT 2: Fixed-length writes stay inside their window
    let value = big_int_from_unsigned_bytes(&input.value);
    let mut dst = input.data.clone();
    let offset = usize::from(input.offset);
    let length = usize::from(input.length);
    if big_int_into_slice(&value, &mut dst, offset, length).is_ok() {
        let end = offset + length;
        assert_eq!(dst[..offset], input.data[..offset], "bytes before window changed");
        assert_eq!(dst[end..], input.data[end..], "bytes after window changed");
        assert_eq!(big_int_from_unsigned_bytes(&dst[offset..end]), value);
    } else {
        assert_eq!(dst, input.data, "failed write must not modify the buffer");
    }

    // INVARIANT 3: Hex round trip
    let minimal = big_int_to_unsigned_bytes(&value);
    assert_eq!(hex_decode(&hex_encode(&minimal)).unwrap(), minimal);
});
