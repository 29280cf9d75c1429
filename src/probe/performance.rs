//! Parser for `ibm-replicationPerformance` values.
//!
//! Each value describes one sender/receiver channel of an agreement:
//!
//! ```text
//! [c=0,l=10,op=3056,q=438,d=7,ws=0,s=438,ds=7,wd=0,wr=0,r=438,e=16,ss=1,rs=1]
//! ```
//!
//! Fields are read by position against the fixed layout `[c=N,l=N,...]`.
//! Keys and separators must match exactly. Each number is the longest numeric
//! prefix at its position (`l=10abc` yields 10 and then fails on `abc`).
//! Scanning stops at the first mismatch, and every field after it keeps its
//! zero default.

/// Keys of the numeric fields following the channel index `c`, in wire order.
pub const VALUE_KEYS: [&str; 13] = [
    "l", "op", "q", "d", "ws", "s", "ds", "wd", "wr", "r", "e", "ss", "rs",
];

const FIELD_COUNT: usize = VALUE_KEYS.len() + 1;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PerformanceRecord {
    /// Channel index `c`.
    pub connection: i64,
    /// Values for [`VALUE_KEYS`], same order.
    pub values: [f64; 13],
    scanned: usize,
}

impl PerformanceRecord {
    pub fn parse(text: &str) -> Self {
        let mut record = Self::default();
        let mut rest = text;

        for position in 0..FIELD_COUNT {
            let literal = match position {
                0 => "[c=".to_string(),
                n => format!(",{}=", VALUE_KEYS[n - 1]),
            };
            let Some(after) = rest.strip_prefix(literal.as_str()) else {
                break;
            };
            let after = after.trim_start();
            let len = numeric_prefix(after, position > 0);
            if len == 0 {
                break;
            }
            let (digits, tail) = after.split_at(len);
            if position == 0 {
                match digits.parse::<i64>() {
                    Ok(index) => record.connection = index,
                    Err(_) => break,
                }
            } else {
                match digits.parse::<f64>() {
                    Ok(value) => record.values[position - 1] = value,
                    Err(_) => break,
                }
            }
            record.scanned += 1;
            rest = tail;
        }
        record
    }

    /// Number of leading fields (channel index included) that were recovered.
    pub fn scanned(&self) -> usize {
        self.scanned
    }

    pub fn is_complete(&self) -> bool {
        self.scanned == FIELD_COUNT
    }

    /// Whether field `key` came from the input rather than the zero default.
    pub fn is_present(&self, key: &str) -> bool {
        if key == "c" {
            return self.scanned > 0;
        }
        VALUE_KEYS
            .iter()
            .position(|k| *k == key)
            .is_some_and(|i| i + 1 < self.scanned)
    }

    pub fn value(&self, key: &str) -> Option<f64> {
        VALUE_KEYS
            .iter()
            .position(|k| *k == key)
            .map(|i| self.values[i])
    }

    pub fn fields(&self) -> impl Iterator<Item = (&'static str, f64)> + '_ {
        VALUE_KEYS.iter().copied().zip(self.values.iter().copied())
    }
}

/// Byte length of the number at the start of `text`, 0 if there is none.
fn numeric_prefix(text: &str, float: bool) -> usize {
    let bytes = text.as_bytes();
    let mut i = 0;
    if matches!(bytes.first(), Some(b'+' | b'-')) {
        i += 1;
    }

    if float {
        for word in ["infinity", "inf", "nan"] {
            let end = i + word.len();
            if bytes.len() >= end && bytes[i..end].eq_ignore_ascii_case(word.as_bytes()) {
                return end;
            }
        }
    }

    let digits = |from: usize| bytes[from..].iter().take_while(|b| b.is_ascii_digit()).count();

    let mut mantissa = digits(i);
    i += mantissa;
    if !float {
        return if mantissa == 0 { 0 } else { i };
    }

    if bytes.get(i) == Some(&b'.') {
        let fraction = digits(i + 1);
        mantissa += fraction;
        if mantissa > 0 {
            i += 1 + fraction;
        }
    }
    if mantissa == 0 {
        return 0;
    }

    if matches!(bytes.get(i), Some(b'e' | b'E')) {
        let mut j = i + 1;
        if matches!(bytes.get(j), Some(b'+' | b'-')) {
            j += 1;
        }
        let exponent = digits(j);
        if exponent > 0 {
            i = j + exponent;
        }
    }
    i
}
