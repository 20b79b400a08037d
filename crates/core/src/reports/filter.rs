//! Report selection: which report, which period, which rows.

use std::str::FromStr;

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::error::ReportError;
use crate::finance::{DepositType, ExpenseStatus};
use crate::sales::{PaymentMethod, PaymentStatus};

/// Longest period a single report may cover, in days (inclusive).
pub const MAX_RANGE_DAYS: i64 = 366;

/// Default number of entries in top-N lists.
pub const DEFAULT_TOP_N: usize = 10;

/// Largest accepted top-N value.
pub const MAX_TOP_N: usize = 50;

/// The available reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    /// Sales totals, payment breakdowns, top products.
    Sales,
    /// Expense totals by category and status.
    Expenses,
    /// Stock levels and movements.
    Inventory,
    /// Cash flow from the transaction log and deposits.
    Financial,
    /// All of the above summarized, with net profit.
    General,
}

impl ReportKind {
    /// URL segment of the report.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Expenses => "expenses",
            Self::Inventory => "inventory",
            Self::Financial => "financial",
            Self::General => "general",
        }
    }

    /// Title printed on the report.
    #[must_use]
    pub const fn title(&self) -> &'static str {
        match self {
            Self::Sales => "Sales Report",
            Self::Expenses => "Expense Report",
            Self::Inventory => "Inventory Report",
            Self::Financial => "Financial Report",
            Self::General => "General Business Report",
        }
    }

    /// Whether `categoryId` has a single meaning for this report. Sales and
    /// inventory read it as a product category, expenses as an expense
    /// category; the others would apply one id to both.
    #[must_use]
    pub const fn accepts_category(&self) -> bool {
        matches!(self, Self::Sales | Self::Expenses | Self::Inventory)
    }
}

impl FromStr for ReportKind {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "sales" => Ok(Self::Sales),
            "expenses" => Ok(Self::Expenses),
            "inventory" => Ok(Self::Inventory),
            "financial" => Ok(Self::Financial),
            "general" => Ok(Self::General),
            other => Err(ReportError::UnknownKind(other.to_string())),
        }
    }
}

impl std::fmt::Display for ReportKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Report parameters as sent by the client; every field is optional.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuery {
    /// First day of the period.
    pub start_date: Option<NaiveDate>,
    /// Last day of the period.
    pub end_date: Option<NaiveDate>,
    /// Restrict to one product or expense category.
    pub category_id: Option<Uuid>,
    /// Restrict to one product.
    pub product_id: Option<Uuid>,
    /// Restrict sales to one payment status.
    pub payment_status: Option<PaymentStatus>,
    /// Restrict sales to one payment method.
    pub payment_method: Option<PaymentMethod>,
    /// Restrict expenses to one status.
    pub expense_status: Option<ExpenseStatus>,
    /// Restrict deposits to one type.
    pub deposit_type: Option<DepositType>,
    /// Length of top-N lists.
    pub top_n: Option<u32>,
}

impl ReportQuery {
    /// Like [`resolve`](Self::resolve), after checking that every
    /// restriction applies to `kind`.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::CategoryNotSupported` for a category on a
    /// financial or general report, otherwise as [`resolve`](Self::resolve).
    pub fn resolve_for(
        self,
        kind: ReportKind,
        today: NaiveDate,
    ) -> Result<ReportFilter, ReportError> {
        if self.category_id.is_some() && !kind.accepts_category() {
            return Err(ReportError::CategoryNotSupported(kind.as_str()));
        }
        self.resolve(today)
    }

    /// Fills in defaults relative to `today` and validates the result.
    ///
    /// The period defaults to the first day of the current month through
    /// today; a lone start date runs to today and a lone end date starts on
    /// the first day of that end date's month.
    ///
    /// # Errors
    ///
    /// Returns the validation error of [`ReportFilter::validate`].
    pub fn resolve(self, today: NaiveDate) -> Result<ReportFilter, ReportError> {
        let end_date = self.end_date.unwrap_or(today);
        let start_date = self
            .start_date
            .unwrap_or_else(|| end_date.with_day(1).unwrap_or(end_date));

        let top_n = self
            .top_n
            .map_or(DEFAULT_TOP_N, |n| usize::try_from(n).unwrap_or(MAX_TOP_N))
            .clamp(1, MAX_TOP_N);

        let filter = ReportFilter {
            start_date,
            end_date,
            category_id: self.category_id,
            product_id: self.product_id,
            payment_status: self.payment_status,
            payment_method: self.payment_method,
            expense_status: self.expense_status,
            deposit_type: self.deposit_type,
            top_n,
        };
        filter.validate()?;
        Ok(filter)
    }
}

/// Resolved report parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportFilter {
    /// First day of the period (inclusive).
    pub start_date: NaiveDate,
    /// Last day of the period (inclusive).
    pub end_date: NaiveDate,
    /// Category restriction.
    pub category_id: Option<Uuid>,
    /// Product restriction.
    pub product_id: Option<Uuid>,
    /// Sale payment status restriction.
    pub payment_status: Option<PaymentStatus>,
    /// Sale payment method restriction.
    pub payment_method: Option<PaymentMethod>,
    /// Expense status restriction.
    pub expense_status: Option<ExpenseStatus>,
    /// Deposit type restriction.
    pub deposit_type: Option<DepositType>,
    /// Length of top-N lists.
    pub top_n: usize,
}

impl ReportFilter {
    /// A filter covering `start..=end` with no other restriction.
    #[must_use]
    pub const fn for_period(start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            start_date,
            end_date,
            category_id: None,
            product_id: None,
            payment_status: None,
            payment_method: None,
            expense_status: None,
            deposit_type: None,
            top_n: DEFAULT_TOP_N,
        }
    }

    /// Number of days covered, both ends included.
    #[must_use]
    pub fn days(&self) -> i64 {
        (self.end_date - self.start_date).num_days() + 1
    }

    /// Returns true if the date falls inside the period.
    #[must_use]
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start_date && date <= self.end_date
    }

    /// Checks the period.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::InvalidDateRange` when the start is after the
    /// end and `ReportError::RangeTooLong` for periods over 366 days.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.start_date > self.end_date {
            return Err(ReportError::InvalidDateRange {
                start: self.start_date,
                end: self.end_date,
            });
        }
        let days = self.days();
        if days > MAX_RANGE_DAYS {
            return Err(ReportError::RangeTooLong {
                days,
                max: MAX_RANGE_DAYS,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_defaults_to_month_to_date() {
        let filter = ReportQuery::default().resolve(date(2025, 3, 18)).unwrap();

        assert_eq!(filter.start_date, date(2025, 3, 1));
        assert_eq!(filter.end_date, date(2025, 3, 18));
        assert_eq!(filter.top_n, DEFAULT_TOP_N);
        assert_eq!(filter.days(), 18);
    }

    #[test]
    fn test_lone_end_date_starts_at_its_month() {
        let query = ReportQuery {
            end_date: Some(date(2025, 1, 20)),
            ..ReportQuery::default()
        };
        let filter = query.resolve(date(2025, 3, 18)).unwrap();
        assert_eq!(filter.start_date, date(2025, 1, 1));
    }

    #[rstest]
    #[case(Some(0), 1)]
    #[case(Some(5), 5)]
    #[case(Some(500), MAX_TOP_N)]
    #[case(None, DEFAULT_TOP_N)]
    fn test_top_n_is_clamped(#[case] requested: Option<u32>, #[case] expected: usize) {
        let query = ReportQuery {
            top_n: requested,
            ..ReportQuery::default()
        };
        assert_eq!(query.resolve(date(2025, 3, 18)).unwrap().top_n, expected);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let query = ReportQuery {
            start_date: Some(date(2025, 3, 10)),
            end_date: Some(date(2025, 3, 9)),
            ..ReportQuery::default()
        };
        assert!(matches!(
            query.resolve(date(2025, 3, 18)),
            Err(ReportError::InvalidDateRange { .. })
        ));
    }

    #[rstest]
    #[case(date(2024, 1, 1), date(2024, 12, 31), true)]
    #[case(date(2024, 1, 1), date(2025, 1, 1), false)]
    #[case(date(2025, 5, 5), date(2025, 5, 5), true)]
    fn test_range_limit(#[case] start: NaiveDate, #[case] end: NaiveDate, #[case] ok: bool) {
        let filter = ReportFilter::for_period(start, end);
        assert_eq!(filter.validate().is_ok(), ok);
    }

    #[test]
    fn test_contains_is_inclusive() {
        let filter = ReportFilter::for_period(date(2025, 2, 1), date(2025, 2, 28));
        assert!(filter.contains(date(2025, 2, 1)));
        assert!(filter.contains(date(2025, 2, 28)));
        assert!(!filter.contains(date(2025, 3, 1)));
    }

    #[test]
    fn test_kind_from_url_segment() {
        assert_eq!("financial".parse::<ReportKind>().unwrap(), ReportKind::Financial);
        assert!(matches!(
            "payroll".parse::<ReportKind>(),
            Err(ReportError::UnknownKind(kind)) if kind == "payroll"
        ));
    }

    #[rstest]
    #[case(ReportKind::Sales, true)]
    #[case(ReportKind::Expenses, true)]
    #[case(ReportKind::Inventory, true)]
    #[case(ReportKind::Financial, false)]
    #[case(ReportKind::General, false)]
    fn test_category_only_for_single_category_reports(
        #[case] kind: ReportKind,
        #[case] accepted: bool,
    ) {
        let query = ReportQuery {
            category_id: Some(Uuid::new_v4()),
            ..ReportQuery::default()
        };
        let result = query.resolve_for(kind, date(2025, 3, 18));
        assert_eq!(result.is_ok(), accepted);
        if !accepted {
            assert!(matches!(result, Err(ReportError::CategoryNotSupported(_))));
        }
    }

    #[test]
    fn test_general_report_without_category_resolves() {
        let filter = ReportQuery::default()
            .resolve_for(ReportKind::General, date(2025, 3, 18))
            .unwrap();
        assert_eq!(filter.category_id, None);
    }
}
