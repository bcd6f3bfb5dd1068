//! Base58 and Base58Check (Bitcoin alphabet)

use super::sha256::double_sha256;
use super::CodecError;

const ALPHABET: &[u8; 58] = b"123456789ABCDEFGHJKLMNPQRSTUVWXYZabcdefghijkmnopqrstuvwxyz";
const CHECKSUM_LEN: usize = 4;

/// Reverse lookup table, `0xFF` marks characters outside the alphabet
static DECODE_MAP: [u8; 128] = build_decode_map();

const fn build_decode_map() -> [u8; 128] {
    let mut map = [0xFFu8; 128];
    let mut i = 0;
    while i < ALPHABET.len() {
        map[ALPHABET[i] as usize] = i as u8;
        i += 1;
    }
    map
}

/// Decoded Base58Check value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Base58Check {
    pub version: u8,
    pub payload: Vec<u8>,
}

/// Decode a Base58 string into bytes.
///
/// Each leading `'1'` becomes one leading zero byte.
pub fn base58_decode(s: &str) -> Result<Vec<u8>, CodecError> {
    // Little-endian base-256 accumulator
    let mut bytes: Vec<u8> = Vec::with_capacity(s.len());
    let mut leading_zeros = 0;
    let mut in_prefix = true;

    for (index, ch) in s.chars().enumerate() {
        let digit = if ch.is_ascii() {
            DECODE_MAP[ch as usize]
        } else {
            0xFF
        };
        if digit == 0xFF {
            return Err(CodecError::InvalidCharacter { ch, index });
        }

        if in_prefix && digit == 0 {
            leading_zeros += 1;
            continue;
        }
        in_prefix = false;

        let mut carry = digit as u32;
        for byte in bytes.iter_mut() {
            carry += (*byte as u32) * 58;
            *byte = (carry & 0xFF) as u8;
            carry >>= 8;
        }
        while carry > 0 {
            bytes.push((carry & 0xFF) as u8);
            carry >>= 8;
        }
    }

    let mut out = vec![0u8; leading_zeros];
    out.extend(bytes.iter().rev());
    Ok(out)
}

/// Encode bytes as Base58; each leading zero byte becomes a `'1'`
pub fn base58_encode(data: &[u8]) -> String {
    let leading_zeros = data.iter().take_while(|&&b| b == 0).count();

    // Little-endian base-58 accumulator
    let mut digits: Vec<u8> = Vec::with_capacity(data.len() * 138 / 100 + 1);
    for &byte in &data[leading_zeros..] {
        let mut carry = byte as u32;
        for digit in digits.iter_mut() {
            carry += (*digit as u32) << 8;
            *digit = (carry % 58) as u8;
            carry /= 58;
        }
        while carry > 0 {
            digits.push((carry % 58) as u8);
            carry /= 58;
        }
    }

    let mut out = String::with_capacity(leading_zeros + digits.len());
    out.extend(std::iter::repeat('1').take(leading_zeros));
    out.extend(digits.iter().rev().map(|&d| ALPHABET[d as usize] as char));
    out
}

/// Decode and verify a Base58Check string.
///
/// The last four bytes must equal the first four bytes of
/// `sha256(sha256(body))`.
pub fn base58check_decode(s: &str) -> Result<Base58Check, CodecError> {
    let raw = base58_decode(s)?;
    if raw.len() < CHECKSUM_LEN + 2 {
        return Err(CodecError::TooShort(raw.len()));
    }

    let (body, checksum) = raw.split_at(raw.len() - CHECKSUM_LEN);
    let expected = double_sha256(body);
    if expected[..CHECKSUM_LEN] != *checksum {
        return Err(CodecError::ChecksumMismatch);
    }

    Ok(Base58Check {
        version: body[0],
        payload: body[1..].to_vec(),
    })
}
