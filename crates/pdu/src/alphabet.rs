//! GSM 7-bit default alphabet (3GPP TS 23.038 §6.2.1) and septet packing.

use crate::{PduError, Result};

/// Escape to the single-shift extension table.
pub const ESCAPE: u8 = 0x1B;

#[rustfmt::skip]
const DEFAULT_TABLE: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å',
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', ' ', 'Æ', 'æ', 'ß', 'É',
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/',
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?',
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O',
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§',
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o',
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à',
];

/// Character for a septet in the default table.
pub fn default_char(septet: u8) -> char {
    DEFAULT_TABLE[usize::from(septet & 0x7F)]
}

/// Character for a septet following [`ESCAPE`], if the extension table
/// defines one.
pub fn extension_char(septet: u8) -> Option<char> {
    match septet {
        0x0A => Some('\u{0C}'),
        0x14 => Some('^'),
        0x28 => Some('{'),
        0x29 => Some('}'),
        0x2F => Some('\\'),
        0x3C => Some('['),
        0x3D => Some('~'),
        0x3E => Some(']'),
        0x40 => Some('|'),
        0x65 => Some('€'),
        _ => None,
    }
}

/// Unpack `count` septets from `data`, skipping `fill_bits` leading bits.
pub fn unpack_septets(data: &[u8], count: usize, fill_bits: usize) -> Result<Vec<u8>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let needed = (fill_bits + count * 7).div_ceil(8);
    if data.len() < needed {
        return Err(PduError::Truncated {
            field: "packed septets",
            needed,
            available: data.len(),
        });
    }

    let octet = |index: usize| u16::from(data.get(index).copied().unwrap_or(0));
    let septets = (0..count)
        .map(|i| {
            let bit = fill_bits + i * 7;
            let (index, shift) = (bit / 8, bit % 8);
            let window = octet(index) | (octet(index + 1) << 8);
            ((window >> shift) & 0x7F) as u8
        })
        .collect();
    Ok(septets)
}

/// Map septets to text. `ESC ESC` renders as a space; an escape followed by
/// a code with no extension character falls back to the default table.
pub fn septets_to_string(septets: &[u8]) -> String {
    let mut text = String::with_capacity(septets.len());
    let mut escaped = false;
    for &septet in septets {
        if escaped {
            escaped = false;
            if septet == ESCAPE {
                text.push(' ');
            } else {
                text.push(extension_char(septet).unwrap_or_else(|| default_char(septet)));
            }
        } else if septet == ESCAPE {
            escaped = true;
        } else {
            text.push(default_char(septet));
        }
    }
    text
}

/// Unpack and decode GSM 7-bit packed text.
pub fn unpack_to_string(data: &[u8], count: usize, fill_bits: usize) -> Result<String> {
    unpack_septets(data, count, fill_bits).map(|septets| septets_to_string(&septets))
}
