//! Locale-aware number and date parsing shared by the instrument parsers.
//!
//! Instrument software writes numbers with the decimal separator of the host
//! locale. A file produced on a European workstation carries `0,125` where a US
//! one carries `0.125`; both must end up as the same `f64`.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Decimal separator used by a source file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecimalSeparator {
    /// `1.5` (US locale)
    #[default]
    Dot,
    /// `1,5` (most European locales)
    Comma,
}

impl DecimalSeparator {
    /// Infer the separator from a sample numeric token.
    ///
    /// A token containing a comma is taken as comma-decimal. Anything else,
    /// including integers, reads as dot-decimal.
    pub fn detect(sample: &str) -> Self {
        if sample.contains(',') {
            Self::Comma
        } else {
            Self::Dot
        }
    }

    /// Parse one numeric field written with this separator.
    ///
    /// Returns `None` for empty or non-numeric fields.
    pub fn parse(self, field: &str) -> Option<f64> {
        let field = field.trim();
        if field.is_empty() {
            return None;
        }
        match self {
            Self::Dot => field.parse().ok(),
            Self::Comma => field.replace(',', ".").parse().ok(),
        }
    }
}

/// Build a timestamp from the date and time fields of an instrument header.
///
/// Dot-decimal files write `MM/DD/YYYY`, comma-decimal files `DD/MM/YYYY`. When
/// the month field exceeds 12 the two fields are swapped. Fractional seconds are
/// truncated.
pub fn parse_date_time(date: &str, time: &str, separator: DecimalSeparator) -> Option<NaiveDateTime> {
    let fields: Vec<u32> = date
        .trim()
        .split(['/', '-', '.'])
        .map(|f| f.trim().parse().ok())
        .collect::<Option<_>>()?;
    if fields.len() != 3 {
        return None;
    }

    let (mut month, mut day) = match separator {
        DecimalSeparator::Dot => (fields[0], fields[1]),
        DecimalSeparator::Comma => (fields[1], fields[0]),
    };
    if month > 12 {
        std::mem::swap(&mut month, &mut day);
    }
    let year = i32::try_from(fields[2]).ok()?;
    let date = NaiveDate::from_ymd_opt(year, month, day)?;

    let clock: Vec<u32> = time
        .trim()
        .split(':')
        .map(|f| {
            let whole = f.split(['.', ',']).next().unwrap_or(f);
            whole.trim().parse().ok()
        })
        .collect::<Option<_>>()?;
    let time = match clock.as_slice() {
        [h, m, s] => NaiveTime::from_hms_opt(*h, *m, *s)?,
        [h, m] => NaiveTime::from_hms_opt(*h, *m, 0)?,
        _ => return None,
    };

    Some(NaiveDateTime::new(date, time))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Datelike, Timelike};

    #[test]
    fn test_comma_and_dot_parse_identically() {
        let dot = DecimalSeparator::Dot.parse("-1.23456E-003");
        let comma = DecimalSeparator::Comma.parse("-1,23456E-003");
        assert_eq!(dot, comma);
        assert_eq!(dot, Some(-1.23456e-3));
    }

    #[test]
    fn test_detect() {
        assert_eq!(DecimalSeparator::detect("0,5"), DecimalSeparator::Comma);
        assert_eq!(DecimalSeparator::detect("0.5"), DecimalSeparator::Dot);
        assert_eq!(DecimalSeparator::detect("12"), DecimalSeparator::Dot);
    }

    #[test]
    fn test_empty_field_is_none() {
        assert_eq!(DecimalSeparator::Dot.parse("  "), None);
        assert_eq!(DecimalSeparator::Comma.parse("abc"), None);
    }

    #[test]
    fn test_date_order_follows_locale() {
        let us = parse_date_time("03/04/2022", "13:00:00", DecimalSeparator::Dot).unwrap();
        assert_eq!((us.month(), us.day()), (3, 4));

        let eu = parse_date_time("03/04/2022", "13:00:00", DecimalSeparator::Comma).unwrap();
        assert_eq!((eu.month(), eu.day()), (4, 3));
    }

    #[test]
    fn test_date_swap_when_month_out_of_range() {
        let ts = parse_date_time("12/25/2022", "08:15:30.750", DecimalSeparator::Comma).unwrap();
        assert_eq!((ts.month(), ts.day()), (12, 25));
        assert_eq!(ts.second(), 30);
    }

    #[test]
    fn test_invalid_date() {
        assert!(parse_date_time("2022", "13:00:00", DecimalSeparator::Dot).is_none());
        assert!(parse_date_time("13/13/2022", "13:00:00", DecimalSeparator::Dot).is_none());
    }
}
