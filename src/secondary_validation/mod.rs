mod luhn_checksum;

pub use crate::secondary_validation::luhn_checksum::{
    complete_checksum, compute_checksum, validate_checksum, LuhnChecksum,
};
use std::str::Chars;

pub trait Validator: Send + Sync {
    fn is_valid_match(&self, input: &str) -> bool;
}

/// Keeps the ASCII digits of `text`, in order. Everything else is dropped,
/// including non-ASCII numerals.
pub fn extract_digits(text: &str) -> String {
    text.chars().filter(char::is_ascii_digit).collect()
}

fn get_previous_digit(chars: &mut Chars<'_>) -> Option<u32> {
    while let Some(char) = chars.next_back() {
        if char.is_ascii_digit() {
            return char.to_digit(10);
        }
    }
    None
}
