//! 🔍 The Record Parser — one line in, one verdict out.
//!
//! A raw CSV line either becomes a [`Record`] or a [`Rejection`]. No I/O, no
//! state, no panics, no drama. Same line in, same verdict out, every time,
//! like a vending machine that actually works.
//!
//! ⚠️ Known limitation: splitting is naive. A comma inside a field is a field
//! separator as far as we're concerned, so `"Smith, Jr."` turns one row into a
//! seven-field row and it gets rejected (or, with bad enough luck, misparsed).
//! Quoting support is not a thing here. Do not add it quietly.
//!
//! 🔢 Ids are stricter than "is it a number": a finite fractional id like `1.5`
//! is rejected, because a record id is an integer and truncating it would
//! quietly merge two different ids into one.

use std::fmt;

use crate::common::Record;

/// 📐 Columns per row: id, firstname, lastname, email, email2, profession.
pub const FIELD_COUNT: usize = 6;

/// 📏 The field separator. A comma. It was always going to be a comma.
pub const DELIMITER: char = ',';

/// 🙅 Why a line didn't make the cut. A value, not an error: the pipeline
/// counts these and moves on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rejection {
    /// Wrong number of comma-separated fields.
    FieldCount { found: usize },
    /// First field isn't a finite whole number that fits in an `i64`.
    InvalidId { raw: String },
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::FieldCount { found } => {
                write!(f, "expected {FIELD_COUNT} fields, found {found}")
            }
            Rejection::InvalidId { raw } => write!(f, "id '{raw}' is not a finite number"),
        }
    }
}

/// 🎯 Parse one data line into a [`Record`].
///
/// The line is trimmed, split on commas, and must yield exactly
/// [`FIELD_COUNT`] fields. The first field must parse as a finite number with
/// no fractional part. Every field is trimmed on the way into the record.
///
/// ```
/// use rvx::parser::{parse_line, Rejection};
///
/// let record = parse_line("42, Ada ,Lovelace,ada@x.io,ada2@x.io,maths").unwrap();
/// assert_eq!(record.id, 42);
/// assert_eq!(record.firstname, "Ada");
///
/// assert_eq!(parse_line("a,b,c"), Err(Rejection::FieldCount { found: 3 }));
/// ```
pub fn parse_line(line: &str) -> Result<Record, Rejection> {
    let fields: Vec<&str> = line.trim().split(DELIMITER).collect();

    let &[id, firstname, lastname, email, email2, profession] = fields.as_slice() else {
        return Err(Rejection::FieldCount {
            found: fields.len(),
        });
    };

    let id = parse_id(id).ok_or_else(|| Rejection::InvalidId {
        raw: id.to_string(),
    })?;

    Ok(Record {
        id,
        firstname: firstname.trim().to_string(),
        lastname: lastname.trim().to_string(),
        email: email.trim().to_string(),
        email2: email2.trim().to_string(),
        profession: profession.trim().to_string(),
    })
}

// 🔢 "12", "12.0", "1e3" all pass. "", "abc", "NaN", "inf", "1.5" do not.
// -- plain integers go straight to i64 so nothing above 2^53 gets rounded on the way.
// -- the f64 upper bound is exclusive because i64::MAX as f64 rounds up to 2^63, which doesn't fit.
fn parse_id(raw: &str) -> Option<i64> {
    let raw = raw.trim();
    if let Ok(id) = raw.parse::<i64>() {
        return Some(id);
    }
    let value: f64 = raw.parse().ok()?;
    if !value.is_finite() || value.fract() != 0.0 {
        return None;
    }
    if value < i64::MIN as f64 || value >= i64::MAX as f64 {
        return None;
    }
    Some(value as i64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn the_one_where_a_clean_line_becomes_a_trimmed_record() {
        let record = parse_line("  7 ,  Grace , Hopper ,grace@navy.mil , g@h.io,  admiral  \r")
            .expect("💀 a perfectly good line got rejected");

        assert_eq!(
            record,
            Record {
                id: 7,
                firstname: "Grace".into(),
                lastname: "Hopper".into(),
                email: "grace@navy.mil".into(),
                email2: "g@h.io".into(),
                profession: "admiral".into(),
            }
        );
    }

    #[test]
    fn the_one_where_five_and_seven_fields_both_get_bounced() {
        assert_eq!(
            parse_line("1,a,b,c,d"),
            Err(Rejection::FieldCount { found: 5 })
        );
        assert_eq!(
            parse_line("1,a,b,c,d,e,f"),
            Err(Rejection::FieldCount { found: 7 })
        );
        assert_eq!(parse_line(""), Err(Rejection::FieldCount { found: 1 }));
    }

    #[test]
    fn the_one_where_the_id_has_to_be_a_real_number() {
        for bad in ["abc", "", "NaN", "inf", "-infinity", "1.5", "12abc", "1e300"] {
            let line = format!("{bad},a,b,c,d,e");
            assert_eq!(
                parse_line(&line),
                Err(Rejection::InvalidId {
                    raw: bad.to_string()
                }),
                "💀 '{bad}' should not have passed as an id"
            );
        }
    }

    #[test]
    fn the_one_where_numeric_spellings_of_whole_numbers_are_fine() {
        assert_eq!(parse_line("12.0,a,b,c,d,e").map(|r| r.id), Ok(12));
        assert_eq!(parse_line("1e3,a,b,c,d,e").map(|r| r.id), Ok(1000));
        assert_eq!(parse_line("-4,a,b,c,d,e").map(|r| r.id), Ok(-4));
        assert_eq!(parse_line("+9,a,b,c,d,e").map(|r| r.id), Ok(9));
    }

    #[test]
    fn the_one_where_big_ids_survive_without_float_rounding() {
        assert_eq!(
            parse_line("9007199254740993,a,b,c,d,e").map(|r| r.id),
            Ok(9_007_199_254_740_993)
        );
        assert_eq!(
            parse_line(&format!("{},a,b,c,d,e", i64::MAX)).map(|r| r.id),
            Ok(i64::MAX)
        );
        assert_eq!(
            parse_line(&format!("{},a,b,c,d,e", i64::MIN)).map(|r| r.id),
            Ok(i64::MIN)
        );
        // -- one past the top is not an i64, and as a float it rounds to 2^63, which isn't either
        assert!(parse_line("9223372036854775808,a,b,c,d,e").is_err());
    }

    #[test]
    fn the_one_where_embedded_commas_are_not_our_problem() {
        // -- 🐛 "Smith, Jr." is two fields to us. Seven total. Rejected. As documented.
        assert_eq!(
            parse_line("1,John,Smith, Jr.,j@x.io,j2@x.io,plumber"),
            Err(Rejection::FieldCount { found: 7 })
        );
    }

    #[test]
    fn the_one_where_the_same_line_always_gets_the_same_verdict() {
        let lines = ["1,a,b,c,d,e", "x,a,b,c,d,e", "1,a,b"];
        let first: Vec<_> = lines.iter().map(|l| parse_line(l)).collect();
        let second: Vec<_> = lines.iter().rev().map(|l| parse_line(l)).collect();
        assert_eq!(first, second.into_iter().rev().collect::<Vec<_>>());
    }

    #[test]
    fn the_one_where_rejections_explain_themselves() {
        assert_eq!(
            Rejection::FieldCount { found: 5 }.to_string(),
            "expected 6 fields, found 5"
        );
        assert_eq!(
            Rejection::InvalidId { raw: "abc".into() }.to_string(),
            "id 'abc' is not a finite number"
        );
    }
}
