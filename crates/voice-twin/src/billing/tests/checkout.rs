use super::common::*;
use crate::billing::checkout::{
    BillingEvent, CountOutcome, DownloadDenial, DownloadOutcome, DownloadToken, InvoiceState,
    PurchaseRepository, RecordedOutcome, SubscriptionState, DEFAULT_MAX_DOWNLOADS,
};
use chrono::Duration;

#[test]
fn checkout_event_creates_one_purchase_with_quota() {
    let (recorder, purchases, notifier) = build_recorder();

    let outcome = recorder
        .record_at(checkout_event("cs_test_1"), epoch())
        .expect("store reachable");

    assert_eq!(outcome, RecordedOutcome::PurchaseRecorded);
    assert_eq!(purchases.purchase_count(), 1);

    let purchase = recorder
        .purchase_for_session("cs_test_1")
        .expect("store reachable")
        .expect("purchase exists");
    assert_eq!(purchase.download_count, 0);
    assert_eq!(purchase.max_downloads, DEFAULT_MAX_DOWNLOADS);
    assert_eq!(purchase.expires_at, epoch() + Duration::days(7));
    assert!(!purchase.download_token.0.is_empty());

    let sent = notifier.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].template, "purchase_receipt");
    assert_eq!(sent[0].email, "buyer@example.com");
    assert_eq!(sent[0].download_token, purchase.download_token);
}

#[test]
fn replayed_checkout_event_is_idempotent() {
    let (recorder, purchases, notifier) = build_recorder();

    let first = recorder
        .record_at(checkout_event("cs_test_dup"), epoch())
        .expect("store reachable");
    let second = recorder
        .record_at(checkout_event("cs_test_dup"), epoch())
        .expect("store reachable");

    assert_eq!(first, RecordedOutcome::PurchaseRecorded);
    assert_eq!(second, RecordedOutcome::DuplicateIgnored);
    assert_eq!(purchases.purchase_count(), 1);
    assert_eq!(notifier.sent().len(), 1, "receipt sent once");
}

#[test]
fn subscription_events_are_mirrored_verbatim() {
    let (recorder, purchases, _) = build_recorder();

    let outcome = recorder
        .record_at(
            BillingEvent::SubscriptionCreated(SubscriptionState {
                subscription_id: "sub_1".to_string(),
                email: "buyer@example.com".to_string(),
                status: "trialing".to_string(),
                plan: Some("monthly".to_string()),
                current_period_end: Some(epoch() + Duration::days(30)),
            }),
            epoch(),
        )
        .expect("store reachable");
    assert_eq!(outcome, RecordedOutcome::SubscriptionMirrored);

    recorder
        .record_at(
            BillingEvent::SubscriptionUpdated(SubscriptionState {
                subscription_id: "sub_1".to_string(),
                email: "buyer@example.com".to_string(),
                status: "active".to_string(),
                plan: Some("monthly".to_string()),
                current_period_end: Some(epoch() + Duration::days(30)),
            }),
            epoch(),
        )
        .expect("store reachable");

    let record = purchases
        .subscription("sub_1")
        .expect("store reachable")
        .expect("mirrored");
    assert_eq!(record.status, "active");
    assert_eq!(record.plan.as_deref(), Some("monthly"));
}

#[test]
fn invoice_events_keep_the_last_known_plan() {
    let (recorder, purchases, _) = build_recorder();

    recorder
        .record_at(
            BillingEvent::SubscriptionCreated(SubscriptionState {
                subscription_id: "sub_2".to_string(),
                email: "buyer@example.com".to_string(),
                status: "active".to_string(),
                plan: Some("annual".to_string()),
                current_period_end: None,
            }),
            epoch(),
        )
        .expect("store reachable");

    recorder
        .record_at(
            BillingEvent::InvoicePaymentFailed(InvoiceState {
                subscription_id: "sub_2".to_string(),
                email: "buyer@example.com".to_string(),
                status: "past_due".to_string(),
            }),
            epoch(),
        )
        .expect("store reachable");

    let record = purchases
        .subscription("sub_2")
        .expect("store reachable")
        .expect("mirrored");
    assert_eq!(record.status, "past_due");
    assert_eq!(record.plan.as_deref(), Some("annual"));
}

#[test]
fn download_redemption_counts_and_caps() {
    let (recorder, purchases, _) = build_recorder();
    recorder
        .record_at(checkout_event("cs_dl"), epoch())
        .expect("store reachable");
    let token = purchases.token_for_session("cs_dl").expect("token issued");

    for expected in 1..=DEFAULT_MAX_DOWNLOADS {
        let outcome = recorder
            .redeem_download(&token, epoch())
            .expect("store reachable");
        match outcome {
            DownloadOutcome::Granted(grant) => assert_eq!(grant.download_count, expected),
            DownloadOutcome::Denied(denial) => panic!("unexpected denial: {denial:?}"),
        }
    }

    let exhausted = recorder
        .redeem_download(&token, epoch())
        .expect("store reachable");
    assert!(matches!(
        exhausted,
        DownloadOutcome::Denied(DownloadDenial::QuotaExhausted { .. })
    ));
}

#[test]
fn store_counter_never_passes_the_quota() {
    let (recorder, purchases, _) = build_recorder();
    recorder
        .record_at(checkout_event("cs_race"), epoch())
        .expect("store reachable");
    let token = purchases.token_for_session("cs_race").expect("token issued");

    // Drive the guarded counter directly; the store itself must stop
    // at the quota regardless of any caller-side check.
    for expected in 1..=DEFAULT_MAX_DOWNLOADS {
        assert_eq!(
            purchases.count_download(&token).expect("store reachable"),
            CountOutcome::Counted(expected)
        );
    }
    assert_eq!(
        purchases.count_download(&token).expect("store reachable"),
        CountOutcome::QuotaExhausted {
            max_downloads: DEFAULT_MAX_DOWNLOADS
        }
    );

    let purchase = recorder
        .purchase_for_session("cs_race")
        .expect("store reachable")
        .expect("purchase exists");
    assert_eq!(purchase.download_count, DEFAULT_MAX_DOWNLOADS);
}

#[test]
fn expired_token_is_denied() {
    let (recorder, purchases, _) = build_recorder();
    recorder
        .record_at(checkout_event("cs_exp"), epoch())
        .expect("store reachable");
    let token = purchases.token_for_session("cs_exp").expect("token issued");

    let late = epoch() + Duration::days(8);
    let outcome = recorder.redeem_download(&token, late).expect("store reachable");
    assert!(matches!(
        outcome,
        DownloadOutcome::Denied(DownloadDenial::Expired { .. })
    ));
}

#[test]
fn unknown_token_is_denied() {
    let (recorder, _, _) = build_recorder();
    let outcome = recorder
        .redeem_download(&DownloadToken("missing".to_string()), epoch())
        .expect("store reachable");
    assert_eq!(
        outcome,
        DownloadOutcome::Denied(DownloadDenial::UnknownToken)
    );
}

#[test]
fn billing_events_deserialize_from_processor_payloads() {
    let payload = serde_json::json!({
        "type": "checkout.session.completed",
        "session_id": "cs_wire",
        "email": "buyer@example.com",
        "product": "voice-twin",
        "amount_cents": 24_900,
    });

    let event: BillingEvent = serde_json::from_value(payload).expect("deserializes");
    match event {
        BillingEvent::CheckoutCompleted(session) => {
            assert_eq!(session.session_id, "cs_wire");
            assert_eq!(session.amount_cents, Some(24_900));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}
