/// ATC / PVVX custom firmware advertisement decoding
use crate::errors::DecodeError;
use crate::models::Reading;

/// Smallest service-data payload carrying every field we read.
pub const MIN_PAYLOAD_LEN: usize = 14;

/// Decode the PVVX custom format service data into a [`Reading`]
///
/// The payload is the service data attached to the Environmental Sensing
/// UUID (0x181A), not the full advertisement. All fields are little-endian:
/// - Bytes 0-5: MAC address (not used here, we get it from BLE)
/// - Bytes 6-7: Temperature (signed 16-bit, 0.01°C resolution)
/// - Bytes 8-9: Humidity (signed 16-bit, 0.01% resolution)
/// - Bytes 10-11: Battery voltage (unsigned 16-bit, millivolts)
/// - Byte 12: Battery level (percent)
/// - Byte 13: Measurement counter, wraps at 255
/// - Bytes 14+: Flags (not used here)
///
/// # Arguments
/// * `data` - Raw service data bytes
/// * `rssi` - Signal strength reported alongside the advertisement
///
/// # Returns
/// The decoded reading, or `DecodeError::Truncated` for short payloads
pub fn decode_atc_data(data: &[u8], rssi: i16) -> Result<Reading, DecodeError> {
    if data.len() < MIN_PAYLOAD_LEN {
        return Err(DecodeError::Truncated {
            len: data.len(),
            min: MIN_PAYLOAD_LEN,
        });
    }

    let temperature = i16::from_le_bytes([data[6], data[7]]);
    let humidity = i16::from_le_bytes([data[8], data[9]]);
    let battery_mv = u16::from_le_bytes([data[10], data[11]]);

    Ok(Reading {
        temperature_c: temperature as f32 / 100.0,
        humidity_pct: humidity as f32 / 100.0,
        battery_v: battery_mv as f32 / 1000.0,
        battery_pct: data[12],
        sequence: data[13],
        rssi,
    })
}
