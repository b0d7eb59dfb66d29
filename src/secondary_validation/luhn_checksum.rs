use crate::secondary_validation::{get_previous_digit, Validator};

pub struct LuhnChecksum;

impl Validator for LuhnChecksum {
    fn is_valid_match(&self, input: &str) -> bool {
        validate_checksum(input)
    }
}

/// Luhn sum of `digits` modulo 10. Positions are counted from the rightmost
/// digit (index 0) and every odd position is doubled, minus 9 when the result
/// exceeds 9. The empty string sums to 0.
///
/// Non-digit characters are skipped and do not occupy a position.
pub fn compute_checksum(digits: &str) -> u32 {
    let mut input_iter = digits.chars();
    let mut sum: u32 = 0;
    let mut is_doubled = false;
    while let Some(digit) = get_previous_digit(&mut input_iter) {
        if !is_doubled {
            sum += digit
        } else if digit > 4 {
            sum += digit * 2 - 9;
        } else {
            sum += digit * 2
        }
        is_doubled = !is_doubled;
    }
    sum % 10
}

pub fn validate_checksum(digits: &str) -> bool {
    compute_checksum(digits) == 0
}

/// Appends the check digit that makes `prefix` pass [validate_checksum].
///
/// The check digit is derived from the checksum of `prefix` followed by a
/// placeholder `0`, which puts every prefix digit at the position it will
/// occupy once the real check digit is in place.
pub fn complete_checksum(prefix: &str) -> String {
    let check_digit = (10 - compute_checksum(&format!("{prefix}0"))) % 10;
    format!("{prefix}{check_digit}")
}
