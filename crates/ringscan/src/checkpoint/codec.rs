//! CBOR encoding of checkpoint records.

use crate::{
    checkpoint::{MAX_CHECKPOINT_BYTES, ScanCursorState},
    error::InternalError,
};
use serde_cbor::{from_slice, to_vec};
use std::{
    fmt,
    panic::{AssertUnwindSafe, catch_unwind},
};

pub(super) fn encode_state(id: &str, state: &ScanCursorState) -> Result<Vec<u8>, InternalError> {
    to_vec(state).map_err(|err| {
        InternalError::serialize_internal(format!("could not encode scan state '{id}': {err}"))
    })
}

/// Decode one checkpoint record.
///
/// Payloads over [`MAX_CHECKPOINT_BYTES`] are rejected before decoding, and a
/// decoder panic is reported as corruption instead of unwinding into the scan.
pub(super) fn decode_state(id: &str, bytes: &[u8]) -> Result<ScanCursorState, InternalError> {
    if bytes.len() > MAX_CHECKPOINT_BYTES {
        return Err(corrupt(
            id,
            format_args!(
                "{} bytes exceeds the {MAX_CHECKPOINT_BYTES} byte limit",
                bytes.len()
            ),
        ));
    }

    match catch_unwind(AssertUnwindSafe(|| from_slice::<ScanCursorState>(bytes))) {
        Ok(Ok(state)) => Ok(state),
        Ok(Err(err)) => Err(corrupt(id, err)),
        Err(_) => Err(corrupt(id, "decoder panicked")),
    }
}

fn corrupt(id: &str, reason: impl fmt::Display) -> InternalError {
    InternalError::checkpoint_corruption(format!("could not decode scan state '{id}': {reason}"))
}
