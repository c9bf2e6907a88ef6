//! Adler-32 checksum (RFC 1950 Section 8.2)

const MOD_ADLER: u32 = 65521;

/// Largest block that cannot overflow the u32 sums before the modulo
const BLOCK: usize = 5552;

pub fn adler32(data: &[u8]) -> u32 {
    let mut low: u32 = 1;
    let mut high: u32 = 0;

    for block in data.chunks(BLOCK) {
        for &byte in block {
            low += u32::from(byte);
            high += low;
        }
        low %= MOD_ADLER;
        high %= MOD_ADLER;
    }

    (high << 16) | low
}
