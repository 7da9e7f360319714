//! Frame codec
//!
//! Stateless encode of a payload and unescape of a received frame body.

use bytes::{BufMut, BytesMut};

use crate::error::{KfdError, Result};
use super::FrameConstants;

/// Encode a payload into a delimited, escaped frame
///
/// Format: HEADER + escaped payload + FOOTER
pub fn encode(constants: &FrameConstants, payload: &[u8]) -> Vec<u8> {
    // Worst case every byte is escaped
    let mut out = BytesMut::with_capacity(payload.len() * 2 + 2);
    out.put_u8(constants.header);

    for &byte in payload {
        match constants.placeholder_for(byte) {
            Some(placeholder) => {
                out.put_u8(constants.escape);
                out.put_u8(placeholder);
            }
            None => out.put_u8(byte),
        }
    }

    out.put_u8(constants.footer);
    out.to_vec()
}

/// Undo byte stuffing on a frame body (delimiters already stripped)
///
/// Single forward pass into a fresh buffer; `raw` is never modified.
pub fn unescape(constants: &FrameConstants, raw: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(raw.len());
    let mut bytes = raw.iter().copied();

    while let Some(byte) = bytes.next() {
        if byte != constants.escape {
            out.push(byte);
            continue;
        }

        let placeholder = bytes.next().ok_or_else(|| {
            KfdError::Framing("frame ends with a dangling escape byte".to_string())
        })?;

        let symbol = constants.symbol_for(placeholder).ok_or_else(|| {
            KfdError::Framing(format!(
                "invalid placeholder 0x{:02x} after escape",
                placeholder
            ))
        })?;
        out.push(symbol);
    }

    Ok(out)
}
