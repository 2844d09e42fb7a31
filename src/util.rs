use chrono::{DateTime, Datelike, NaiveDate, Utc};
use crate::error::{GhmapError, Result};

pub const MONTH_NAMES: [&str; 12] = [
    "Jan", "Feb", "Mar", "Apr", "May", "Jun", "Jul", "Aug", "Sep", "Oct", "Nov", "Dec",
];

pub fn current_year() -> i32 {
    Utc::now().year()
}

pub fn year_of(timestamp: &DateTime<Utc>) -> i32 {
    timestamp.year()
}

pub fn month_name(month: u32) -> &'static str {
    month
        .checked_sub(1)
        .and_then(|idx| MONTH_NAMES.get(idx as usize))
        .copied()
        .unwrap_or("???")
}

pub fn first_day_of_year(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 1, 1)
        .ok_or_else(|| GhmapError::InvalidDate(format!("Year out of range: {year}")))
}

pub fn last_day_of_year(year: i32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, 12, 31)
        .ok_or_else(|| GhmapError::InvalidDate(format!("Year out of range: {year}")))
}

/// Parse a `YYYY` command-line argument.
pub fn parse_year(input: &str) -> std::result::Result<i32, String> {
    let year: i32 = input
        .trim()
        .parse()
        .map_err(|_| format!("'{input}' is not a year"))?;
    if !(1970..=9999).contains(&year) {
        return Err(format!("year {year} is out of range"));
    }
    Ok(year)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_years() {
        assert_eq!(parse_year("2023"), Ok(2023));
        assert!(parse_year("23x").is_err());
        assert!(parse_year("1800").is_err());
    }

    #[test]
    fn month_names_are_one_based() {
        assert_eq!(month_name(1), "Jan");
        assert_eq!(month_name(12), "Dec");
        assert_eq!(month_name(0), "???");
        assert_eq!(month_name(13), "???");
    }
}
