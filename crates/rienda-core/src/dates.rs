//! Calendar math for billing and schedule generation
//!
//! All helpers take a 1-12 month number and panic on anything else; month
//! numbers flowing in from the store or from `chrono` are always in range.

use chrono::{Datelike, Duration, NaiveDate};

/// Last calendar day of a month
pub fn last_day_of_month(anio: i32, mes: u32) -> NaiveDate {
    first_day_of_next_month(anio, mes) - Duration::days(1)
}

/// First calendar day of a month
pub fn first_day_of_month(anio: i32, mes: u32) -> NaiveDate {
    assert!((1..=12).contains(&mes), "month out of range: {}", mes);
    NaiveDate::from_ymd_opt(anio, mes, 1).expect("day 1 always exists")
}

/// First calendar day of the month after (anio, mes)
pub fn first_day_of_next_month(anio: i32, mes: u32) -> NaiveDate {
    let (anio, mes) = next_month(anio, mes);
    first_day_of_month(anio, mes)
}

/// The month following (anio, mes), as (anio, mes)
pub fn next_month(anio: i32, mes: u32) -> (i32, u32) {
    assert!((1..=12).contains(&mes), "month out of range: {}", mes);
    if mes == 12 {
        (anio + 1, 1)
    } else {
        (anio, mes + 1)
    }
}

/// Month and year of a date, as (anio, mes)
pub fn month_of(date: NaiveDate) -> (i32, u32) {
    (date.year(), date.month())
}

/// N-th business day of a month, counting Monday-Friday from day 1.
///
/// Due dates for monthly invoices use n = 10. Strict counting: a month that
/// opens on a Saturday has its first business day on the 3rd.
pub fn nth_business_day(anio: i32, mes: u32, n: u32) -> NaiveDate {
    assert!(n >= 1, "n must be at least 1");
    let mut date = first_day_of_month(anio, mes);
    let mut business_days = 0;
    loop {
        // Monday=1 .. Friday=5 in ISO numbering
        if date.weekday().number_from_monday() <= 5 {
            business_days += 1;
            if business_days == n {
                return date;
            }
        }
        date += Duration::days(1);
    }
}

/// Every date in a month falling on a weekday (0=Sunday .. 6=Saturday).
///
/// Walks forward from day 1 until the weekday matches, then steps by seven
/// days until past month end. The recurring-schedule generator relies on
/// this exact enumeration, so no n-th-weekday shortcut here.
pub fn weekday_dates_in_month(anio: i32, mes: u32, dia_semana: u8) -> Vec<NaiveDate> {
    assert!(dia_semana <= 6, "weekday out of range: {}", dia_semana);
    let last = last_day_of_month(anio, mes);
    let mut date = first_day_of_month(anio, mes);
    while date.weekday().num_days_from_sunday() != u32::from(dia_semana) {
        date += Duration::days(1);
    }

    let mut dates = Vec::new();
    while date <= last {
        dates.push(date);
        date += Duration::days(7);
    }
    dates
}
