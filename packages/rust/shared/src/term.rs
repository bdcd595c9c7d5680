//! Academic term arithmetic.
//!
//! A term is identified by a `YYYY-NN` code: `YYYY` is the calendar year the
//! quarter is held in and `NN` the quarter suffix. Codes are fixed-width, so
//! string order and chronological order agree.
//!
//! An academic year is named by the calendar year its Fall quarter starts in
//! and runs from 1 July to 30 June: academic year 2026 is Fall `2026-92`,
//! Winter `2027-03` and Spring `2027-14`.
//!
//! A quarter is in session during fixed months of its calendar year: Fall
//! September–December, Winter January–March, Spring April–June. July and
//! August belong to no quarter.

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};

use crate::error::RegfetchError;

/// First month (1-based) of an academic year.
const ACADEMIC_YEAR_START_MONTH: u32 = 7;

const FALL_SUFFIX: u8 = 92;
const WINTER_SUFFIX: u8 = 3;
const SPRING_SUFFIX: u8 = 14;

/// Summer session suffixes: session 1, 10-week session, session 2.
const SUMMER_SUFFIXES: [u8; 3] = [25, 39, 76];

/// One of the three academic quarters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quarter {
    Fall,
    Winter,
    Spring,
}

impl Quarter {
    fn initial(self) -> char {
        match self {
            Self::Fall => 'F',
            Self::Winter => 'W',
            Self::Spring => 'S',
        }
    }

    /// Calendar months (1-based) the quarter is in session.
    fn months(self) -> RangeInclusive<u32> {
        match self {
            Self::Fall => 9..=12,
            Self::Winter => 1..=3,
            Self::Spring => 4..=6,
        }
    }
}

/// A term identifier. Ordering is chronological.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Term {
    year: i32,
    suffix: u8,
}

impl Term {
    /// The code as understood by the remote service, e.g. `2026-92`.
    pub fn code(&self) -> String {
        self.to_string()
    }

    /// Calendar year the quarter is held in.
    pub fn calendar_year(&self) -> i32 {
        self.year
    }

    /// The academic quarter, or `None` for a summer session.
    pub fn quarter(&self) -> Option<Quarter> {
        match self.suffix {
            FALL_SUFFIX => Some(Quarter::Fall),
            WINTER_SUFFIX => Some(Quarter::Winter),
            SPRING_SUFFIX => Some(Quarter::Spring),
            _ => None,
        }
    }

    /// Academic year this quarter belongs to. Summer sessions belong to none.
    pub fn academic_year(&self) -> Option<i32> {
        match self.quarter()? {
            Quarter::Fall => Some(self.year),
            Quarter::Winter | Quarter::Spring => Some(self.year - 1),
        }
    }

    /// The academic quarter immediately before this term.
    pub fn previous(&self) -> Term {
        match self.quarter() {
            Some(Quarter::Fall) => Term::new(self.year, SPRING_SUFFIX),
            Some(Quarter::Spring) => Term::new(self.year, WINTER_SUFFIX),
            Some(Quarter::Winter) => Term::new(self.year - 1, FALL_SUFFIX),
            // Summer sessions follow the Spring quarter of the same year.
            None => Term::new(self.year, SPRING_SUFFIX),
        }
    }

    /// Compact progress label: `F26`, `W27`, `S27` (`U26` for summer).
    pub fn short_label(&self) -> String {
        let initial = self.quarter().map(Quarter::initial).unwrap_or('U');
        format!("{initial}{:02}", self.year.rem_euclid(100))
    }

    fn new(year: i32, suffix: u8) -> Self {
        Self { year, suffix }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.suffix)
    }
}

impl FromStr for Term {
    type Err = RegfetchError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let invalid = || RegfetchError::validation(format!("invalid term code `{s}`"));

        let (year, suffix) = s.trim().split_once('-').ok_or_else(invalid)?;
        if year.len() != 4 || suffix.len() != 2 {
            return Err(invalid());
        }
        let year: i32 = year.parse().map_err(|_| invalid())?;
        let suffix: u8 = suffix.parse().map_err(|_| invalid())?;

        let known = matches!(suffix, FALL_SUFFIX | WINTER_SUFFIX | SPRING_SUFFIX)
            || SUMMER_SUFFIXES.contains(&suffix);
        if !known {
            return Err(invalid());
        }
        Ok(Term::new(year, suffix))
    }
}

// ---------------------------------------------------------------------------
// Constructors and classifiers
// ---------------------------------------------------------------------------

/// Academic year in session on `date`.
pub fn academic_year_at(date: NaiveDate) -> i32 {
    if date.month() >= ACADEMIC_YEAR_START_MONTH {
        date.year()
    } else {
        date.year() - 1
    }
}

/// Academic year in session today (local time).
pub fn current_academic_year() -> i32 {
    academic_year_at(Local::now().date_naive())
}

/// Fall quarter of academic year `year`.
pub fn fall_term(year: i32) -> Term {
    Term::new(year, FALL_SUFFIX)
}

/// Winter quarter of academic year `year`.
pub fn winter_term(year: i32) -> Term {
    Term::new(year + 1, WINTER_SUFFIX)
}

/// Spring quarter of academic year `year`.
pub fn spring_term(year: i32) -> Term {
    Term::new(year + 1, SPRING_SUFFIX)
}

pub fn is_fall(term: &Term) -> bool {
    term.quarter() == Some(Quarter::Fall)
}

pub fn is_winter(term: &Term) -> bool {
    term.quarter() == Some(Quarter::Winter)
}

pub fn is_spring(term: &Term) -> bool {
    term.quarter() == Some(Quarter::Spring)
}

/// Whether `term` is the quarter in session on `date`.
pub fn is_academic_term_at(term: &Term, date: NaiveDate) -> bool {
    term.quarter().is_some_and(|quarter| {
        term.calendar_year() == date.year() && quarter.months().contains(&date.month())
    })
}

/// Whether `term` is the quarter in session today.
pub fn is_academic_term_now(term: &Term) -> bool {
    is_academic_term_at(term, Local::now().date_naive())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    fn term(code: &str) -> Term {
        code.parse().expect("valid term code")
    }

    #[test]
    fn constructors_produce_service_codes() {
        assert_eq!(fall_term(2026).code(), "2026-92");
        assert_eq!(winter_term(2026).code(), "2027-03");
        assert_eq!(spring_term(2026).code(), "2027-14");
    }

    #[test]
    fn quarters_order_within_and_across_years() {
        for y in 1990..2060 {
            let (f, w, s) = (fall_term(y), winter_term(y), spring_term(y));
            assert!(f < w, "{f} < {w}");
            assert!(w < s, "{w} < {s}");
            assert!(s < fall_term(y + 1), "{s} < next fall");
            assert!(spring_term(y - 1) < f);
            // String comparison agrees with Ord.
            assert!(f.code() < w.code() && w.code() < s.code());
            assert!(s.code() < fall_term(y + 1).code());
        }
    }

    #[test]
    fn classifiers() {
        assert!(is_fall(&fall_term(2020)));
        assert!(is_winter(&winter_term(2020)));
        assert!(is_spring(&spring_term(2020)));
        assert!(!is_fall(&spring_term(2020)));

        let summer = term("2021-39");
        assert!(!is_fall(&summer) && !is_winter(&summer) && !is_spring(&summer));
        assert_eq!(summer.academic_year(), None);
    }

    #[test]
    fn academic_year_boundary_is_july() {
        assert_eq!(academic_year_at(date(2026, 6, 30)), 2025);
        assert_eq!(academic_year_at(date(2026, 7, 1)), 2026);
        assert_eq!(academic_year_at(date(2027, 1, 15)), 2026);
    }

    #[test]
    fn academic_year_round_trips_through_constructors() {
        for y in 2000..2030 {
            assert_eq!(fall_term(y).academic_year(), Some(y));
            assert_eq!(winter_term(y).academic_year(), Some(y));
            assert_eq!(spring_term(y).academic_year(), Some(y));
        }
    }

    #[test]
    fn only_the_running_quarter_is_in_session() {
        let today = date(2026, 10, 18);
        assert!(is_academic_term_at(&fall_term(2026), today));

        // Later quarters of the same academic year have not started.
        assert!(!is_academic_term_at(&winter_term(2026), today));
        assert!(!is_academic_term_at(&spring_term(2026), today));

        assert!(!is_academic_term_at(&spring_term(2025), today));
        assert!(!is_academic_term_at(&fall_term(1999), today));
        assert!(!is_academic_term_at(&fall_term(2027), today));
        assert!(!is_academic_term_at(&term("2026-76"), today));
    }

    #[test]
    fn quarter_session_windows() {
        assert!(is_academic_term_at(&winter_term(2026), date(2027, 1, 5)));
        assert!(is_academic_term_at(&winter_term(2026), date(2027, 3, 31)));
        assert!(!is_academic_term_at(&winter_term(2026), date(2027, 4, 1)));
        assert!(is_academic_term_at(&spring_term(2026), date(2027, 4, 1)));
        assert!(is_academic_term_at(&spring_term(2026), date(2027, 6, 30)));
        assert!(is_academic_term_at(&fall_term(2026), date(2026, 9, 1)));
        assert!(is_academic_term_at(&fall_term(2026), date(2026, 12, 31)));
        assert!(!is_academic_term_at(&fall_term(2026), date(2026, 8, 31)));
    }

    #[test]
    fn summer_break_has_no_quarter_in_session() {
        for day in [date(2026, 7, 1), date(2026, 7, 5), date(2026, 8, 31)] {
            for year in 2024..2028 {
                for t in [fall_term(year), winter_term(year), spring_term(year)] {
                    assert!(!is_academic_term_at(&t, day), "{t} on {day}");
                }
            }
            assert!(!is_academic_term_at(&term("2026-25"), day));
        }
    }

    #[test]
    fn now_variants_follow_the_local_clock() {
        let today = Local::now().date_naive();
        assert_eq!(current_academic_year(), academic_year_at(today));

        let running = [
            fall_term(academic_year_at(today)),
            winter_term(academic_year_at(today)),
            spring_term(academic_year_at(today)),
        ];
        for t in &running {
            assert_eq!(is_academic_term_now(t), is_academic_term_at(t, today));
        }
    }

    #[test]
    fn previous_walks_one_quarter_back() {
        assert_eq!(fall_term(2026).previous(), spring_term(2025));
        assert_eq!(spring_term(2025).previous(), winter_term(2025));
        assert_eq!(winter_term(2025).previous(), fall_term(2025));
        assert_eq!(term("2026-25").previous(), term("2026-14"));
    }

    #[test]
    fn short_labels() {
        assert_eq!(fall_term(2026).short_label(), "F26");
        assert_eq!(winter_term(2026).short_label(), "W27");
        assert_eq!(spring_term(2026).short_label(), "S27");
        assert_eq!(term("2005-25").short_label(), "U05");
    }

    #[test]
    fn parse_rejects_malformed_codes() {
        assert!("2026-92".parse::<Term>().is_ok());
        assert!(" 2026-03 ".parse::<Term>().is_ok());
        for bad in ["", "2026", "2026-9", "26-92", "2026-50", "abcd-92", "2026_92"] {
            assert!(bad.parse::<Term>().is_err(), "{bad:?} should not parse");
        }
    }
}
