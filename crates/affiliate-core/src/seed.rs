//! Mock dataset every session starts from.

use chrono::{DateTime, TimeZone, Utc};
use rust_decimal_macros::dec;

use crate::identity::{Role, User};
use crate::ledger::{AffiliateLink, Referral, ReferralStatus};

/// Password accepted for every directory user.
pub const MOCK_PASSWORD: &str = "password";

fn at(year: i32, month: u32, day: u32, hour: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(year, month, day, hour, min, 0)
        .single()
        .unwrap_or_default()
}

/// The built-in admin and affiliate accounts.
pub fn users() -> Vec<User> {
    vec![
        User {
            id: "1".to_string(),
            email: "admin@example.com".to_string(),
            role: Role::Admin,
            full_name: "Admin User".to_string(),
            created_at: at(2024, 1, 1, 0, 0),
            paypal_email: None,
            slug: None,
        },
        User {
            id: "2".to_string(),
            email: "affiliate@example.com".to_string(),
            role: Role::Affiliate,
            full_name: "John Affiliate".to_string(),
            created_at: at(2024, 1, 1, 0, 0),
            paypal_email: Some("affiliate@paypal.com".to_string()),
            slug: Some("john-affiliate".to_string()),
        },
    ]
}

pub fn referrals() -> Vec<Referral> {
    vec![
        Referral {
            id: "1".to_string(),
            affiliate_id: "2".to_string(),
            customer_email: "customer1@example.com".to_string(),
            product_name: "Premium Course".to_string(),
            product_value: dec!(299),
            commission: dec!(89.70),
            status: ReferralStatus::Approved,
            created_at: at(2024, 1, 15, 10, 30),
            paid_at: None,
        },
        Referral {
            id: "2".to_string(),
            affiliate_id: "2".to_string(),
            customer_email: "customer2@example.com".to_string(),
            product_name: "Starter Package".to_string(),
            product_value: dec!(99),
            commission: dec!(29.70),
            status: ReferralStatus::Pending,
            created_at: at(2024, 1, 18, 14, 20),
            paid_at: None,
        },
    ]
}

/// Tracking links; the URL is rendered against `base_url`.
pub fn links(base_url: &str) -> Vec<AffiliateLink> {
    vec![AffiliateLink {
        id: "1".to_string(),
        affiliate_id: "2".to_string(),
        url: crate::ledger::link_url(base_url, "john-affiliate"),
        clicks: 145,
        conversions: 12,
        created_at: at(2024, 1, 1, 0, 0),
    }]
}
