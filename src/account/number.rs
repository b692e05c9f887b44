//! Account numbers and time zones

use chrono::{FixedOffset, Offset, Utc};
use rand::Rng;

use crate::domain::DomainError;

/// Digits in a generated account number
pub const ACCOUNT_NUMBER_LEN: usize = 16;

/// Random 16-digit account number with a non-zero leading digit
pub fn generate_account_number() -> String {
    let mut rng = rand::thread_rng();
    let mut number = String::with_capacity(ACCOUNT_NUMBER_LEN);

    number.push(char::from(b'0' + rng.gen_range(1..=9u8)));
    for _ in 1..ACCOUNT_NUMBER_LEN {
        number.push(char::from(b'0' + rng.gen_range(0..=9u8)));
    }

    number
}

/// Parse a time zone given as `UTC`, `Z`, or a `+HH:MM` / `-HH:MM` offset.
pub fn parse_time_zone(input: &str) -> Result<FixedOffset, DomainError> {
    let trimmed = input.trim();
    let invalid = || DomainError::InvalidTimeZone(input.to_string());

    if trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(utc());
    }

    let (sign, rest) = match trimmed.as_bytes().first() {
        Some(b'+') => (1, &trimmed[1..]),
        Some(b'-') => (-1, &trimmed[1..]),
        _ => return Err(invalid()),
    };

    let (hours, minutes) = rest.split_once(':').ok_or_else(invalid)?;
    let two_digits = |field: &str| field.len() == 2 && field.bytes().all(|b| b.is_ascii_digit());
    if !two_digits(hours) || !two_digits(minutes) {
        return Err(invalid());
    }

    let hours: i32 = hours.parse().map_err(|_| invalid())?;
    let minutes: i32 = minutes.parse().map_err(|_| invalid())?;
    if hours > 23 || minutes > 59 {
        return Err(invalid());
    }

    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60)).ok_or_else(invalid)
}

/// Render an offset the way `parse_time_zone` accepts it
pub fn format_time_zone(offset: &FixedOffset) -> String {
    let seconds = offset.local_minus_utc();
    if seconds == 0 {
        return "UTC".to_string();
    }

    let sign = if seconds < 0 { '-' } else { '+' };
    let minutes = seconds.abs() / 60;
    format!("{}{:02}:{:02}", sign, minutes / 60, minutes % 60)
}

pub(crate) fn utc() -> FixedOffset {
    Utc.fix()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_numbers() {
        for _ in 0..200 {
            let number = generate_account_number();
            assert_eq!(number.len(), ACCOUNT_NUMBER_LEN);
            assert!(number.chars().all(|c| c.is_ascii_digit()));
            assert_ne!(number.as_bytes()[0], b'0');
        }
    }

    #[test]
    fn test_parse_time_zone() {
        assert_eq!(parse_time_zone("UTC").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_time_zone("Z").unwrap().local_minus_utc(), 0);
        assert_eq!(parse_time_zone("-05:00").unwrap().local_minus_utc(), -5 * 3600);
        assert_eq!(parse_time_zone("+05:30").unwrap().local_minus_utc(), 5 * 3600 + 1800);

        for bad in [
            "", "EST", "+5:00", "+24:00", "05:00", "+05:60", "+0500", "+-1:00", "+00:-5", "-+1:00",
            "+1 :00",
        ] {
            assert!(
                matches!(parse_time_zone(bad), Err(DomainError::InvalidTimeZone(_))),
                "{:?} should be rejected",
                bad
            );
        }
    }

    #[test]
    fn test_format_time_zone() {
        for zone in ["UTC", "-05:00", "+05:30", "+14:00"] {
            let offset = parse_time_zone(zone).unwrap();
            assert_eq!(format_time_zone(&offset), zone);
        }
    }
}
