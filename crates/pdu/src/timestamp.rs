//! TP-SCTS service centre time stamp (3GPP TS 23.040 §9.2.3.11).

use chrono::{DateTime, FixedOffset, NaiveDate, TimeZone};

/// Swapped-nibble BCD octet; nibbles above nine count as zero.
fn bcd_byte(octet: u8) -> u32 {
    let tens = u32::from(octet & 0x0F);
    let units = u32::from(octet >> 4);
    (if tens <= 9 { tens } else { 0 }) * 10 + if units <= 9 { units } else { 0 }
}

/// Decode the seven timestamp octets. Returns `None` for dates the calendar
/// cannot represent instead of failing the whole PDU.
pub(crate) fn parse(octets: &[u8]) -> Option<DateTime<FixedOffset>> {
    let &[year, month, day, hour, minute, second, zone] = octets else {
        return None;
    };

    let year = bcd_byte(year) as i32;
    let year = if year >= 90 { 1900 + year } else { 2000 + year };
    let naive = NaiveDate::from_ymd_opt(year, bcd_byte(month), bcd_byte(day))?.and_hms_opt(
        bcd_byte(hour),
        bcd_byte(minute),
        bcd_byte(second),
    )?;

    let quarters = bcd_byte(zone & !0x08) as i32;
    let quarters = if zone & 0x08 != 0 { -quarters } else { quarters };
    let offset = FixedOffset::east_opt(quarters * 15 * 60)?;
    offset.from_local_datetime(&naive).single()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_offset() {
        let ts = parse(&[0x42, 0x30, 0x51, 0x21, 0x03, 0x54, 0x80]).unwrap();
        assert_eq!(ts.to_rfc3339(), "2024-03-15T12:30:45+02:00");
    }

    #[test]
    fn negative_offset_and_last_century() {
        let ts = parse(&[0x99, 0x21, 0x13, 0x32, 0x95, 0x95, 0x0A]).unwrap();
        assert_eq!(ts.to_rfc3339(), "1999-12-31T23:59:59-05:00");
    }

    #[test]
    fn impossible_date_is_none() {
        // February 30th.
        assert_eq!(parse(&[0x42, 0x20, 0x03, 0x00, 0x00, 0x00, 0x00]), None);
    }

    #[test]
    fn wrong_length_is_none() {
        assert_eq!(parse(&[0x42, 0x30]), None);
    }
}
