//! Luhn (mod 10) checksum for payment card numbers

const MIN_DIGITS: usize = 13;
const MAX_DIGITS: usize = 19;

/// Validate a card number with the Luhn algorithm.
///
/// Spaces and dashes are accepted as separators. Anything else, or a digit
/// count outside 13..=19, is rejected.
pub fn luhn_check(digits: &str) -> bool {
    let cleaned: Vec<u32> = match digits
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .map(|c| c.to_digit(10))
        .collect::<Option<Vec<_>>>()
    {
        Some(d) => d,
        None => return false,
    };

    if cleaned.len() < MIN_DIGITS || cleaned.len() > MAX_DIGITS {
        return false;
    }

    let sum: u32 = cleaned
        .iter()
        .rev()
        .enumerate()
        .map(|(i, &d)| {
            if i % 2 == 1 {
                let doubled = d * 2;
                if doubled > 9 {
                    doubled - 9
                } else {
                    doubled
                }
            } else {
                d
            }
        })
        .sum();

    sum % 10 == 0
}

/// Mask every digit except the last four, keeping separators in place
pub fn mask_card(digits: &str) -> String {
    let total = digits.chars().filter(|c| c.is_ascii_digit()).count();
    let keep_from = total.saturating_sub(4);

    let mut seen = 0;
    digits
        .chars()
        .map(|c| {
            if c.is_ascii_digit() {
                seen += 1;
                if seen > keep_from {
                    c
                } else {
                    '*'
                }
            } else {
                c
            }
        })
        .collect()
}
