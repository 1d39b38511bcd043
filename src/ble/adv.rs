//! Raw advertisement (AD structure) parsing for scan results.
//!
//! Advertisement data is a sequence of `[len, type, data...]` records,
//! where `len` counts the type byte and the data. A zero length or a
//! record running past the buffer ends parsing.

use core::fmt::Write;

use heapless::String;

const AD_INCOMPLETE_UUID16: u8 = 0x02;
const AD_COMPLETE_UUID16: u8 = 0x03;
const AD_SHORT_NAME: u8 = 0x08;
const AD_COMPLETE_NAME: u8 = 0x09;
const AD_TX_POWER: u8 = 0x0A;

/// Iterate over `(ad_type, data)` records.
fn structures(data: &[u8]) -> impl Iterator<Item = (u8, &[u8])> {
    let mut i = 0;
    core::iter::from_fn(move || {
        let len = *data.get(i)? as usize;
        if len == 0 || i + len >= data.len() {
            return None;
        }
        let ad_type = data[i + 1];
        let body = &data[i + 2..i + 1 + len];
        i += len + 1;
        Some((ad_type, body))
    })
}

/// Complete or shortened local name, truncated to 32 bytes.
pub fn local_name(data: &[u8]) -> Option<String<32>> {
    let (_, name_bytes) = structures(data)
        .find(|(t, _)| *t == AD_COMPLETE_NAME || *t == AD_SHORT_NAME)?;

    let mut name = String::new();
    match core::str::from_utf8(name_bytes) {
        Ok(text) => {
            for c in text.chars() {
                if name.push(c).is_err() {
                    break;
                }
            }
        }
        // Not UTF-8: keep the raw bytes as Latin-1 characters.
        Err(_) => {
            for &b in name_bytes {
                if name.push(b as char).is_err() {
                    break;
                }
            }
        }
    }
    Some(name)
}

/// First 16-bit service UUID listed, complete or incomplete list.
pub fn service_uuid16(data: &[u8]) -> Option<u16> {
    structures(data)
        .filter(|(t, _)| *t == AD_COMPLETE_UUID16 || *t == AD_INCOMPLETE_UUID16)
        .find_map(|(_, uuids)| {
            uuids
                .chunks_exact(2)
                .next()
                .map(|c| u16::from_le_bytes([c[0], c[1]]))
        })
}

/// `0x180f` style text for a 16-bit UUID.
pub fn format_uuid16(uuid: u16) -> String<6> {
    let mut s = String::new();
    let _ = write!(s, "0x{:04x}", uuid);
    s
}

/// Advertised TX power level (dBm).
pub fn tx_power(data: &[u8]) -> Option<i8> {
    structures(data)
        .find(|(t, body)| *t == AD_TX_POWER && !body.is_empty())
        .map(|(_, body)| body[0] as i8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn service_uuid_in_advertisement() {
        // len=3, type=0x03 (Complete 16-bit UUIDs), UUID=0x1812
        let ad_data = [0x03, 0x03, 0x12, 0x18];
        assert_eq!(service_uuid16(&ad_data), Some(0x1812));
    }

    #[test]
    fn first_uuid_among_multiple() {
        // 0x180F (Battery), 0x1812 (HID), 0x1801 (GATT)
        let ad_data = [
            0x07, 0x03, // len=7, type=0x03
            0x0F, 0x18, //
            0x12, 0x18, //
            0x01, 0x18,
        ];
        assert_eq!(service_uuid16(&ad_data), Some(0x180F));
    }

    #[test]
    fn incomplete_uuid_list() {
        let ad_data = [0x03, 0x02, 0x0F, 0x18];
        assert_eq!(service_uuid16(&ad_data), Some(0x180F));
    }

    #[test]
    fn empty_advertisement_data() {
        assert_eq!(service_uuid16(&[]), None);
        assert_eq!(local_name(&[]), None);
        assert_eq!(tx_power(&[]), None);
    }

    #[test]
    fn malformed_ad_length_zero() {
        assert_eq!(service_uuid16(&[0x00, 0x03, 0x12, 0x18]), None);
    }

    #[test]
    fn record_past_end_stops_parsing() {
        // Claims 9 bytes, only 3 present.
        assert_eq!(local_name(&[0x09, 0x09, b'K', b'e']), None);
    }

    #[test]
    fn complete_local_name() {
        let ad_data = [
            0x09, 0x09, // len=9, type=0x09
            b'K', b'e', b'y', b'b', b'o', b'a', b'r', b'd',
        ];
        assert_eq!(local_name(&ad_data).unwrap().as_str(), "Keyboard");
    }

    #[test]
    fn shortened_local_name_after_flags() {
        let ad_data = [
            0x02, 0x01, 0x06, // Flags
            0x05, 0x08, b'B', b'T', b' ', b'K',
        ];
        assert_eq!(local_name(&ad_data).unwrap().as_str(), "BT K");
    }

    #[test]
    fn no_name_in_advertisement() {
        let ad_data = [0x02, 0x01, 0x06];
        assert_eq!(local_name(&ad_data), None);
    }

    #[test]
    fn name_truncated_to_32_chars() {
        let mut ad_data = [0u8; 40];
        ad_data[0] = 35;
        ad_data[1] = 0x09;
        for b in &mut ad_data[2..37] {
            *b = b'X';
        }
        assert_eq!(local_name(&ad_data).unwrap().len(), 32);
    }

    #[test]
    fn non_utf8_name_keeps_its_bytes() {
        let ad_data = [0x04, 0x09, b'K', 0xE9, b'y'];
        assert_eq!(local_name(&ad_data).unwrap().as_str(), "K\u{e9}y");
    }

    #[test]
    fn tx_power_is_signed() {
        let ad_data = [0x02, 0x0A, 0xF4]; // -12 dBm
        assert_eq!(tx_power(&ad_data), Some(-12));
    }

    #[test]
    fn uuid_text() {
        assert_eq!(format_uuid16(0x180F).as_str(), "0x180f");
    }
}
