//! Shannon entropy estimators

use std::collections::HashMap;

/// Shannon entropy in bits per character
pub fn shannon_entropy(s: &str) -> f64 {
    let mut counts: HashMap<char, usize> = HashMap::new();
    let mut total = 0usize;
    for ch in s.chars() {
        *counts.entry(ch).or_insert(0) += 1;
        total += 1;
    }
    if total == 0 {
        return 0.0;
    }

    let total = total as f64;
    counts
        .values()
        .map(|&count| {
            let p = count as f64 / total;
            -p * p.log2()
        })
        .sum()
}

/// Entropy of the lowercase hex rendering of `bytes` (max 4.0)
pub fn hex_entropy(bytes: &[u8]) -> f64 {
    shannon_entropy(&hex::encode(bytes))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_and_uniform() {
        assert_eq!(shannon_entropy(""), 0.0);
        assert_eq!(shannon_entropy("aaaaaaaa"), 0.0);
    }

    #[test]
    fn test_two_symbols_is_one_bit() {
        assert!((shannon_entropy("abababab") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_hex_digits_is_four_bits() {
        assert!((shannon_entropy("0123456789abcdef") - 4.0).abs() < 1e-9);
    }

    #[test]
    fn test_counts_chars_not_bytes() {
        // two distinct multi-byte chars
        assert!((shannon_entropy("的一") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_hex_entropy_of_zero_bytes() {
        assert_eq!(hex_entropy(&[0u8; 32]), 0.0);
    }
}
