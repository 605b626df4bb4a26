//! BLE GATT constants and payload codec for the bathroom scale
//!
//! The scale exposes a single readable characteristic holding the current
//! weight as a little-endian unsigned integer in tenths of a kilogram.

/// Weight Characteristic UUID (read)
pub const WEIGHT_CHAR_UUID: &str = "0000f0a0-0000-1000-8000-00805f9b34fb";

/// Substrings looked for (case-insensitively) in advertised names, in order
pub const DEFAULT_NAME_HINTS: &[&str] = &["SCALE", "LYE", "ELINK", "AILINK"];

/// Raw units per kilogram
pub const UNITS_PER_KG: f64 = 10.0;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("characteristic returned no data")]
    Empty,
    #[error("characteristic returned {0} bytes, expected at most 8")]
    TooLong(usize),
}

/// Decode a weight characteristic value into kilograms.
///
/// There is no checksum or range check, a payload of `[0, 0]` decodes to 0 kg.
pub fn decode_weight(data: &[u8]) -> Result<f64, DecodeError> {
    if data.is_empty() {
        return Err(DecodeError::Empty);
    }
    if data.len() > 8 {
        return Err(DecodeError::TooLong(data.len()));
    }

    let mut buf = [0u8; 8];
    buf[..data.len()].copy_from_slice(data);
    let raw = u64::from_le_bytes(buf);

    Ok(raw as f64 / UNITS_PER_KG)
}

/// Does an advertised name contain any of the hints?
pub fn name_matches<S: AsRef<str>>(name: &str, hints: &[S]) -> bool {
    let name = name.to_uppercase();
    hints.iter().any(|h| {
        let h: &str = h.as_ref();
        !h.is_empty() && name.contains(&h.to_uppercase())
    })
}
