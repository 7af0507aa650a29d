// src/common/dates.rs

use chrono::{Datelike, NaiveDate};

use crate::common::error::AppError;

/// Primeiro dia do mês de `date`.
pub fn month_start(date: NaiveDate) -> NaiveDate {
    date.with_day(1).unwrap_or(date)
}

/// Primeiro dia do mês seguinte.
pub fn next_month(date: NaiveDate) -> NaiveDate {
    let (year, month) = if date.month() == 12 {
        (date.year() + 1, 1)
    } else {
        (date.year(), date.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1).unwrap_or(date)
}

/// Último dia do mês de `date`.
pub fn month_end(date: NaiveDate) -> NaiveDate {
    next_month(date).pred_opt().unwrap_or(date)
}

/// Converte "YYYY-MM" no primeiro dia do mês.
pub fn parse_month(value: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(&format!("{}-01", value.trim()), "%Y-%m-%d")
        .map_err(|_| AppError::InvalidParameter(format!("mês '{}' (esperado YYYY-MM)", value)))
}

/// Meses de `from` até `until` (inclusive), sempre no dia 1.
pub fn months_between(from: NaiveDate, until: NaiveDate) -> Vec<NaiveDate> {
    let mut months = Vec::new();
    let mut current = month_start(from);
    let last = month_start(until);
    while current <= last {
        months.push(current);
        current = next_month(current);
    }
    months
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_arithmetic_crosses_year() {
        assert_eq!(next_month(d(2024, 12, 15)), d(2025, 1, 1));
        assert_eq!(month_end(d(2024, 2, 10)), d(2024, 2, 29));
        assert_eq!(month_start(d(2024, 7, 31)), d(2024, 7, 1));
    }

    #[test]
    fn parses_year_month() {
        assert_eq!(parse_month("2025-03").unwrap(), d(2025, 3, 1));
        assert!(parse_month("03/2025").is_err());
    }

    #[test]
    fn lists_months_inclusive() {
        let months = months_between(d(2024, 11, 20), d(2025, 2, 3));
        assert_eq!(months, vec![d(2024, 11, 1), d(2024, 12, 1), d(2025, 1, 1), d(2025, 2, 1)]);
        assert!(months_between(d(2025, 2, 1), d(2025, 1, 1)).is_empty());
    }
}
