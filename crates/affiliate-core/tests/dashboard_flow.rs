#![allow(clippy::unwrap_used)] // Integration tests use unwrap for brevity

//! End-to-end walk through both dashboards.
//!
//! Wires an identity provider, a seeded ledger and a toaster together the way
//! a front-end does, and checks that:
//! - the role guard keeps each viewer on their own dashboard
//! - admin approvals and payouts flow through to the affiliate's numbers
//! - toasts published along the way reach subscribers and then expire

use std::sync::{Arc, Mutex};
use std::time::Duration;

use affiliate_core::config::ProgramConfig;
use affiliate_core::identity::{Access, MemorySessionStore, authorize, require_role};
use affiliate_core::ledger::{ReferralFilter, StatusUpdate};
use affiliate_core::report::{ReportKind, export_csv};
use affiliate_core::{Error, IdentityProvider, Ledger, ReferralStatus, Role, Toaster};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

#[tokio::test(start_paused = true)]
async fn admin_payout_shows_up_for_affiliate() {
    let store = MemorySessionStore::default();
    let mut identity = IdentityProvider::new(Box::new(store.clone()));
    let mut ledger = Ledger::seeded(ProgramConfig::default());
    let toaster = Toaster::new(Duration::from_millis(5000));

    let seen = Arc::new(Mutex::new(Vec::<usize>::new()));
    let sink = Arc::clone(&seen);
    let _sub = toaster.subscribe(move |toasts| sink.lock().unwrap().push(toasts.len()));

    // Admin approves the pending referral, then pays both.
    identity.login("admin@example.com", "password").unwrap();
    let admin = require_role(identity.current_user(), Role::Admin).unwrap();
    assert_eq!(admin.id, "1");

    let pending = ledger.search_referrals(&ReferralFilter {
        status: Some(ReferralStatus::Pending),
        ..Default::default()
    });
    let pending_id = pending[0].id.clone();

    for (id, status) in [
        (pending_id.as_str(), ReferralStatus::Approved),
        ("1", ReferralStatus::Paid),
        (pending_id.as_str(), ReferralStatus::Paid),
    ] {
        if let StatusUpdate::Updated { to, .. } = ledger.update_referral_status(id, status).unwrap()
        {
            toaster.success(format!("Commission {to} successfully"));
        }
    }
    assert_eq!(toaster.visible().len(), 3);
    assert_eq!(ledger.program_totals().paid_commissions, dec!(119.40));

    // Affiliate signs in after a reload and sees the payout.
    identity.logout();
    let mut identity = IdentityProvider::new(Box::new(store));
    assert!(identity.restore().is_none());
    identity.login("affiliate@example.com", "password").unwrap();
    let john = identity.current_user().unwrap();

    assert_eq!(authorize(Some(john), Some(Role::Admin)), Access::Redirect("/affiliate"));
    let stats = ledger.affiliate_stats(&john.id);
    assert_eq!(stats.total_earnings, dec!(119.40));
    assert_eq!(stats.pending_earnings, Decimal::ZERO);
    assert_eq!(
        ledger.generate_affiliate_link(&john.id, Some(john)),
        "https://mysite.com/?ref=john-affiliate"
    );

    let earnings = export_csv(ReportKind::Earnings, ledger.referrals_for(&john.id));
    assert_eq!(earnings.lines().count(), 3);
    assert!(!earnings.contains("N/A"));

    // All three toasts expire together.
    tokio::time::sleep(Duration::from_secs(6)).await;
    assert!(toaster.visible().is_empty());
    assert_eq!(seen.lock().unwrap().last(), Some(&0));
}

#[test]
fn affiliate_cannot_use_admin_actions() {
    let mut identity = IdentityProvider::new(Box::new(MemorySessionStore::default()));
    identity.login("affiliate@example.com", "password").unwrap();

    let err = require_role(identity.current_user(), Role::Admin).unwrap_err();
    assert!(matches!(err, Error::Forbidden { required: Role::Admin }));
}

#[test]
fn new_affiliate_starts_from_zero() {
    let mut identity = IdentityProvider::new(Box::new(MemorySessionStore::default()));
    let mut ledger = Ledger::seeded(ProgramConfig::default());

    let jane = identity
        .register("jane@example.com", "secret", "Jane Doe", Role::Affiliate)
        .unwrap()
        .clone();
    assert_eq!(jane.slug.as_deref(), Some("jane-doe"));

    let stats = ledger.affiliate_stats(&jane.id);
    assert_eq!(stats.total_referrals, 0);
    assert!(stats.conversion_rate.abs() < f64::EPSILON);

    ledger
        .record_sale(&jane.id, "buyer@example.com", "Premium Course", dec!(299))
        .unwrap();
    let stats = ledger.affiliate_stats(&jane.id);
    assert_eq!(stats.pending_earnings, dec!(89.70));
    assert_eq!(
        ledger.generate_affiliate_link(&jane.id, Some(&jane)),
        "https://mysite.com/?ref=jane-doe"
    );
}
