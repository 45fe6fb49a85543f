//! CSV export of referrals.
//!
//! Two layouts: the admin report covering every referral, and an
//! affiliate's own earnings. Every field is quoted; embedded quotes are
//! doubled.

use chrono::{DateTime, NaiveDate, Utc};

use crate::ledger::Referral;

const ADMIN_HEADER: [&str; 7] = [
    "Date",
    "Affiliate ID",
    "Customer Email",
    "Product",
    "Product Value",
    "Commission",
    "Status",
];

const EARNINGS_HEADER: [&str; 7] = [
    "Date",
    "Product",
    "Customer",
    "Product Value",
    "Commission",
    "Status",
    "Paid Date",
];

/// Which export to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportKind {
    /// Program-wide report for admins.
    Admin,
    /// One affiliate's earnings.
    Earnings,
}

impl ReportKind {
    /// Download name for an export made on `date`.
    pub fn file_name(self, date: NaiveDate) -> String {
        let stem = match self {
            Self::Admin => "affiliate-report",
            Self::Earnings => "earnings",
        };
        format!("{stem}-{}.csv", date.format("%Y-%m-%d"))
    }
}

/// `M/D/YYYY`, the short US date used throughout the dashboard.
pub fn short_date(at: DateTime<Utc>) -> String {
    at.format("%-m/%-d/%Y").to_string()
}

fn quote(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

fn row<I, S>(fields: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    fields
        .into_iter()
        .map(|f| quote(f.as_ref()))
        .collect::<Vec<_>>()
        .join(",")
}

/// Render `referrals` in the given layout: a header row, then one row each.
pub fn export_csv<'a, I>(kind: ReportKind, referrals: I) -> String
where
    I: IntoIterator<Item = &'a Referral>,
{
    let header = match kind {
        ReportKind::Admin => ADMIN_HEADER,
        ReportKind::Earnings => EARNINGS_HEADER,
    };
    let mut lines = vec![row(header)];
    for r in referrals {
        let fields = match kind {
            ReportKind::Admin => [
                short_date(r.created_at),
                r.affiliate_id.clone(),
                r.customer_email.clone(),
                r.product_name.clone(),
                r.product_value.normalize().to_string(),
                r.commission.normalize().to_string(),
                r.status.to_string(),
            ],
            ReportKind::Earnings => [
                short_date(r.created_at),
                r.product_name.clone(),
                r.customer_email.clone(),
                r.product_value.normalize().to_string(),
                r.commission.normalize().to_string(),
                r.status.to_string(),
                r.paid_at.map_or_else(|| "N/A".to_string(), short_date),
            ],
        };
        lines.push(row(fields));
    }
    lines.join("\n")
}

#[cfg(test)]
#[allow(clippy::panic, clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::seed;

    #[test]
    fn admin_report_quotes_every_field() {
        let csv = export_csv(ReportKind::Admin, &seed::referrals());
        let lines: Vec<_> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(
            lines[0],
            r#""Date","Affiliate ID","Customer Email","Product","Product Value","Commission","Status""#
        );
        assert_eq!(
            lines[1],
            r#""1/15/2024","2","customer1@example.com","Premium Course","299","89.7","approved""#
        );
    }

    #[test]
    fn earnings_report_marks_unpaid() {
        let csv = export_csv(ReportKind::Earnings, &seed::referrals());
        let second = csv.lines().nth(2).unwrap();
        assert!(second.starts_with(r#""1/18/2024","Starter Package","customer2@example.com""#));
        assert!(second.ends_with(r#""pending","N/A""#));
    }

    #[test]
    fn empty_export_is_header_only() {
        let csv = export_csv(ReportKind::Earnings, std::iter::empty());
        assert_eq!(csv.lines().count(), 1);
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        let mut referrals = seed::referrals();
        referrals[0].product_name = "The \"Big\" Course".into();
        let csv = export_csv(ReportKind::Admin, &referrals[..1]);
        assert!(csv.contains(r#""The ""Big"" Course""#));
    }

    #[test]
    fn file_names_carry_the_date() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(
            ReportKind::Admin.file_name(date),
            "affiliate-report-2024-03-09.csv"
        );
        assert_eq!(ReportKind::Earnings.file_name(date), "earnings-2024-03-09.csv");
    }
}
