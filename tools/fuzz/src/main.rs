use afl::fuzz;
use sn_lookup::{extract_digits, parse_identifier, validate_checksum, IDENTIFIER_LENGTH};

#[cfg(not(feature = "manual_test"))]
fn main() {
    fuzz!(|data: &[u8]| {
        run_raw_fuzz(data);
    });
}

#[cfg(feature = "manual_test")]
fn main() {
    use std::io::{stdin, Read};

    let mut input = vec![];
    stdin().read_to_end(&mut input).unwrap();
    run_raw_fuzz(&input);
}

fn run_raw_fuzz(bytes: &[u8]) -> Option<()> {
    let input = std::str::from_utf8(bytes).ok()?;
    run_fuzz(input);
    Some(())
}

fn run_fuzz(input: &str) {
    let digits = extract_digits(input);
    let result = parse_identifier(input);

    #[cfg(feature = "manual_test")]
    {
        println!("Input: {:?}", input);
        println!("Digits: {:?}", digits);
        println!("Result: {:?}", result);
    }

    match result {
        Ok(identifier) => {
            assert_eq!(digits.len(), IDENTIFIER_LENGTH);
            assert!(validate_checksum(&digits));
            assert_eq!(identifier.digits(), digits);
            // accepted output must parse back to itself
            assert_eq!(parse_identifier(identifier.as_str()).as_ref(), Ok(&identifier));
        }
        Err(_) => {
            assert!(digits.len() != IDENTIFIER_LENGTH || !validate_checksum(&digits));
        }
    }
}
