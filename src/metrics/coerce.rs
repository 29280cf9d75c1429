//! Forgiving conversion of raw attribute text into metric values.

use crate::directory::DirectoryEntry;
use chrono::NaiveDateTime;

/// Generalized time as the server reports it, e.g. `20240311094512Z`.
pub const TIMESTAMP_FORMAT: &str = "%Y%m%d%H%M%SZ";

/// Format of `starttime`/`currenttime` on `cn=monitor`.
pub const MONITOR_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S GMT";

/// Parses a numeric attribute value; anything that is not a number is 0.
/// Surrounding blanks make the value malformed.
pub fn number(text: &str) -> f64 {
    text.parse::<f64>().unwrap_or(0.0)
}

/// First value of `attribute` as a number, 0 when absent or malformed.
pub fn attr(entry: &DirectoryEntry, attribute: &str) -> f64 {
    number(entry.first(attribute))
}

/// LDAP boolean syntax: only the exact value `TRUE` is true.
pub fn boolean(text: &str) -> bool {
    text == "TRUE"
}

/// Unix seconds for a generalized-time value, or `None` if it does not parse.
pub fn timestamp(text: &str) -> Option<i64> {
    timestamp_as(text, TIMESTAMP_FORMAT)
}

pub fn timestamp_as(text: &str, format: &str) -> Option<i64> {
    NaiveDateTime::parse_from_str(text, format)
        .ok()
        .map(|t| t.and_utc().timestamp())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn numbers() {
        assert_eq!(number("42"), 42.0);
        assert_eq!(number("3.5"), 3.5);
        assert_eq!(number("-2"), -2.0);
    }

    #[test]
    fn non_numbers_are_zero() {
        for text in ["", "N/A", "12abc", "TRUE", "0x1f", "1,000", " 7 ", "7\n"] {
            assert_eq!(number(text), 0.0, "input {:?}", text);
        }
    }

    #[test]
    fn attr_reads_first_value() {
        let entry = DirectoryEntry::new("cn=monitor")
            .with_attribute("entriessent", "1500")
            .with_attribute("currentconnections", "bogus");
        assert_eq!(attr(&entry, "entriessent"), 1500.0);
        assert_eq!(attr(&entry, "currentconnections"), 0.0);
        assert_eq!(attr(&entry, "missing"), 0.0);
    }

    #[test]
    fn booleans() {
        assert!(boolean("TRUE"));
        assert!(!boolean("FALSE"));
        for text in ["true", "True", "YES", "ON", "1", " TRUE"] {
            assert!(!boolean(text), "input {:?}", text);
        }
        assert!(!boolean(""));
        assert!(!boolean("maybe"));
    }

    #[test]
    fn timestamps() {
        assert_eq!(timestamp("20240101000000Z"), Some(1_704_067_200));
        assert_eq!(timestamp("19700101000010Z"), Some(10));
    }

    #[test]
    fn monitor_timestamps() {
        assert_eq!(timestamp_as("2024-01-01 00:00:00 GMT", MONITOR_TIME_FORMAT), Some(1_704_067_200));
        assert_eq!(timestamp_as("20240101000000Z", MONITOR_TIME_FORMAT), None);
    }

    #[test]
    fn malformed_timestamps_are_absent() {
        for text in ["", "N/A", "2024-01-01 00:00:00", "20241301000000Z", "20240101000000"] {
            assert_eq!(timestamp(text), None, "input {:?}", text);
        }
    }
}
