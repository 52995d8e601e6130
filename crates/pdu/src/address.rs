//! Address fields (3GPP TS 23.040 §9.1.2.5).

use crate::{Result, alphabet, reader::PduReader};

const TON_INTERNATIONAL: u8 = 0b001;
const TON_ALPHANUMERIC: u8 = 0b101;

fn type_of_number(type_of_address: u8) -> u8 {
    (type_of_address >> 4) & 0x07
}

fn nibble_char(nibble: u8) -> Option<char> {
    match nibble {
        0..=9 => Some(char::from(b'0' + nibble)),
        0xA => Some('*'),
        0xB => Some('#'),
        0xC => Some('a'),
        0xD => Some('b'),
        0xE => Some('c'),
        _ => None,
    }
}

/// Swapped-nibble BCD digits, stopping at the `0xF` filler or `max_digits`.
pub(crate) fn bcd_digits(octets: &[u8], max_digits: usize) -> String {
    octets
        .iter()
        .flat_map(|octet| [octet & 0x0F, octet >> 4])
        .take(max_digits)
        .map_while(nibble_char)
        .collect()
}

fn with_prefix(type_of_address: u8, digits: String) -> String {
    if type_of_number(type_of_address) == TON_INTERNATIONAL && !digits.is_empty() {
        format!("+{digits}")
    } else {
        digits
    }
}

/// TP-OA: length in semi-octets, type of address, value.
pub(crate) fn read_originating(reader: &mut PduReader<'_>) -> Result<String> {
    let semi_octets = usize::from(reader.read_u8("originating address length")?);
    let type_of_address = reader.read_u8("originating address type")?;
    let value = reader.take(semi_octets.div_ceil(2), "originating address")?;

    if type_of_number(type_of_address) == TON_ALPHANUMERIC {
        return alphabet::unpack_to_string(value, semi_octets * 4 / 7, 0);
    }
    Ok(with_prefix(type_of_address, bcd_digits(value, semi_octets)))
}

/// SMSC address prefix: length in octets (type byte included), zero when the
/// radio layer omitted it.
pub(crate) fn read_service_center(reader: &mut PduReader<'_>) -> Result<Option<String>> {
    let octets = usize::from(reader.read_u8("service centre address length")?);
    if octets == 0 {
        return Ok(None);
    }
    let type_of_address = reader.read_u8("service centre address type")?;
    let value = reader.take(octets - 1, "service centre address")?;
    let digits = bcd_digits(value, value.len() * 2);
    Ok(Some(with_prefix(type_of_address, digits)))
}
