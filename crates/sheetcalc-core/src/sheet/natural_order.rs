//! Natural ("human") ordering of display values.
//!
//! Runs of digits compare by numeric value, so `"2" < "10"` and
//! `"item9" < "item10"`. Leading spaces and zeros are skipped before each
//! run; when two strings compare equal that way, the one with more leading
//! zeros sorts later, then the longer one, then plain string order.

use std::cmp::Ordering;

use sheetcalc_engine::engine::{format_number, parse_number};

/// Compare two display values for sorting. Empty values sort last.
pub fn compare_values(a: &str, b: &str) -> Ordering {
    match (a.is_empty(), b.is_empty()) {
        (true, true) => Ordering::Equal,
        (true, false) => Ordering::Greater,
        (false, true) => Ordering::Less,
        (false, false) => natural_cmp(&sort_key(a), &sort_key(b)),
    }
}

/// Decimal values compare rounded to three places.
fn sort_key(value: &str) -> String {
    if !value.contains('.') {
        return value.to_string();
    }
    match parse_number(value) {
        Some(n) => format_number((n * 1000.0).round() / 1000.0),
        None => value.to_string(),
    }
}

fn at(s: &[char], i: usize) -> char {
    s.get(i).copied().unwrap_or('\0')
}

/// Compare two digit runs aligned at their first digit: the longer run wins,
/// otherwise the first differing digit decides.
fn compare_digit_runs(a: &[char], b: &[char]) -> Ordering {
    let mut bias = Ordering::Equal;
    let mut i = 0;
    loop {
        let ca = at(a, i);
        let cb = at(b, i);
        match (ca.is_ascii_digit(), cb.is_ascii_digit()) {
            (false, false) => return bias,
            (false, true) => return Ordering::Less,
            (true, false) => return Ordering::Greater,
            (true, true) => {
                if bias == Ordering::Equal {
                    bias = ca.cmp(&cb);
                }
            }
        }
        i += 1;
    }
}

pub fn natural_cmp(a: &str, b: &str) -> Ordering {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let (mut ia, mut ib) = (0, 0);

    loop {
        let mut zeros_a = 0usize;
        let mut zeros_b = 0usize;

        let mut ca = at(&a, ia);
        while ca == ' ' || ca == '0' {
            zeros_a = if ca == '0' { zeros_a + 1 } else { 0 };
            ia += 1;
            ca = at(&a, ia);
        }
        let mut cb = at(&b, ib);
        while cb == ' ' || cb == '0' {
            zeros_b = if cb == '0' { zeros_b + 1 } else { 0 };
            ib += 1;
            cb = at(&b, ib);
        }

        if ca.is_ascii_digit() && cb.is_ascii_digit() {
            let run = compare_digit_runs(&a[ia..], &b[ib..]);
            if run != Ordering::Equal {
                return run;
            }
        }

        if ca == '\0' && cb == '\0' {
            return zeros_a
                .cmp(&zeros_b)
                .then(a.len().cmp(&b.len()))
                .then_with(|| a.cmp(&b));
        }
        match ca.cmp(&cb) {
            Ordering::Equal => {}
            other => return other,
        }

        ia += 1;
        ib += 1;
    }
}
