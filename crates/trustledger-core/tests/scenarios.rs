use trustledger_canonical::{
    AccountId, Canonicalizer, DomainId, MessageId, ProductId, Timestamp, TransactionId,
};
use trustledger_core::{
    BroadcastRequest, GatewayConfig, GatewayError, InMemoryGateway, LedgerError, MessagingGateway,
    Notification, OutboundMessage, Role, ScoreSnapshot, TrustLedger, TrustScore, TxContext,
};

const T0: Timestamp = Timestamp(1_700_000_000);

fn admin() -> AccountId {
    AccountId::from_bytes([0xA0; 20])
}

fn vendor() -> AccountId {
    AccountId::from_bytes([0x01; 20])
}

fn r1() -> AccountId {
    AccountId::from_bytes([0x11; 20])
}

fn r2() -> AccountId {
    AccountId::from_bytes([0x12; 20])
}

fn p1() -> ProductId {
    ProductId::from_label("P1")
}

fn tx(label: &str) -> TransactionId {
    TransactionId::from_label(label)
}

fn at(caller: AccountId, offset: u64) -> TxContext {
    TxContext::new(caller, Timestamp(T0.0 + offset))
}

fn request() -> BroadcastRequest {
    BroadcastRequest {
        destination_domain: DomainId(16015286601757825753),
        destination_address: AccountId::from_bytes([0xBB; 20]),
        gas_budget: 200_000,
        fee_token: AccountId::ZERO,
        fee_amount: 0,
    }
}

/// Ledger after scenario A.
fn registered() -> TrustLedger {
    let mut ledger = TrustLedger::new(admin());
    ledger.add_product(at(admin(), 0), p1(), vendor()).unwrap();
    ledger
}

/// Ledger after scenario B.
fn reviewed_once() -> TrustLedger {
    let mut ledger = registered();
    ledger.post_review(at(r1(), 10), p1(), tx("T1"), 80).unwrap();
    ledger
}

#[test]
fn scenario_a_registration_seeds_zero_score() {
    let ledger = registered();
    assert!(ledger.product_exists(p1()));
    assert_eq!(
        ledger.trust_score(p1()).unwrap(),
        TrustScore {
            total_reviews: 0,
            average_rating: 0,
            last_updated: T0,
        }
    );
    let product = ledger.product(p1()).unwrap();
    assert!(product.is_active);
    assert_eq!(product.vendor, vendor());
    assert_eq!(product.total_reviews, 0);
    assert_eq!(product.sum_of_ratings, 0);
}

#[test]
fn scenario_b_first_review() {
    let mut ledger = registered();
    let review_id = ledger.post_review(at(r1(), 10), p1(), tx("T1"), 80).unwrap();
    assert_eq!(review_id, 0);

    let score = ledger.trust_score(p1()).unwrap();
    assert_eq!(score.total_reviews, 1);
    assert_eq!(score.average_rating, 8000);
    assert_eq!(score.last_updated, Timestamp(T0.0 + 10));

    let review = ledger.review(0).unwrap();
    assert_eq!(review.reviewer, r1());
    assert_eq!(review.rating, 80);
    assert_eq!(review.transaction_id, tx("T1"));

    let usage = ledger.transaction_usage(tx("T1"));
    assert!(usage.spent);
    assert_eq!(usage.review_id, 0);
}

#[test]
fn scenario_c_reused_proof_changes_nothing() {
    let mut ledger = reviewed_once();
    let score_before = ledger.trust_score(p1()).unwrap();
    let product_before = ledger.product(p1()).unwrap().clone();
    let queued_before = ledger.notifications().len();

    let err = ledger
        .post_review(at(r2(), 20), p1(), tx("T1"), 50)
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::AlreadyUsed {
            transaction_id: tx("T1"),
            review_id: 0,
        }
    );
    assert_eq!(ledger.trust_score(p1()).unwrap(), score_before);
    assert_eq!(ledger.product(p1()).unwrap(), &product_before);
    assert_eq!(ledger.review_count(), 1);
    assert_eq!(ledger.notifications().len(), queued_before);
}

#[test]
fn scenario_d_second_review_averages() {
    let mut ledger = reviewed_once();
    let review_id = ledger.post_review(at(r2(), 20), p1(), tx("T2"), 60).unwrap();
    assert_eq!(review_id, 1);
    let score = ledger.trust_score(p1()).unwrap();
    assert_eq!(score.total_reviews, 2);
    assert_eq!(score.average_rating, 7000);
    assert_eq!(ledger.reviews_for_product(p1()), &[0, 1]);
}

#[test]
fn scenario_e_broadcast_requires_reviews() {
    let mut gateway = InMemoryGateway::new(GatewayConfig::default());

    let mut ledger = registered();
    let err = ledger
        .broadcast(at(admin(), 5), &mut gateway, p1(), request())
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
    assert!(gateway.sent().is_empty());

    ledger.post_review(at(r1(), 10), p1(), tx("T1"), 80).unwrap();
    ledger.drain_notifications();
    let message_id = ledger
        .broadcast(at(admin(), 30), &mut gateway, p1(), request())
        .unwrap();

    assert_eq!(gateway.sent().len(), 1);
    assert_eq!(gateway.sent()[0].0, message_id);

    let snapshot =
        ScoreSnapshot::decode(&gateway.sent()[0].1.payload, &Canonicalizer::ledger()).unwrap();
    assert_eq!(snapshot.product_id, p1());
    assert_eq!(snapshot.average_rating, 8000);
    assert_eq!(snapshot.total_reviews, 1);

    match ledger.drain_notifications().as_slice() {
        [Notification::TrustScoreBroadcast {
            message_id: emitted,
            average_rating,
            total_reviews,
            destination_domain,
            ..
        }] => {
            assert_eq!(*emitted, message_id);
            assert_eq!(*average_rating, 8000);
            assert_eq!(*total_reviews, 1);
            assert_eq!(*destination_domain, request().destination_domain);
        }
        other => panic!("unexpected notifications: {:?}", other),
    }
}

#[test]
fn scenario_f_vendor_cannot_review() {
    let mut ledger = reviewed_once();
    let err = ledger
        .post_review(at(vendor(), 20), p1(), tx("T3"), 90)
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));
    assert!(!ledger.transaction_usage(tx("T3")).spent);
    assert_eq!(ledger.review_count(), 1);
}

#[test]
fn post_review_rejections_follow_check_order() {
    let mut ledger = registered();

    // Unknown product wins over every argument problem.
    let err = ledger
        .post_review(at(vendor(), 1), ProductId::from_label("nope"), TransactionId::ZERO, 0)
        .unwrap_err();
    assert!(matches!(err, LedgerError::NotFound { entity: "product", .. }));

    // Zero proof before rating.
    let err = ledger
        .post_review(at(r1(), 1), p1(), TransactionId::ZERO, 0)
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    // Rating before vendor check.
    let err = ledger.post_review(at(vendor(), 1), p1(), tx("T9"), 101).unwrap_err();
    assert!(matches!(err, LedgerError::OutOfRange { rating: 101, .. }));

    ledger.set_product_active(at(admin(), 2), p1(), false).unwrap();
    let err = ledger.post_review(at(r1(), 3), p1(), tx("T9"), 50).unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));
}

#[test]
fn inactive_product_keeps_history_and_reopens() {
    let mut ledger = reviewed_once();
    ledger.set_product_active(at(admin(), 20), p1(), false).unwrap();

    assert_eq!(ledger.trust_score(p1()).unwrap().average_rating, 8000);
    assert!(ledger.review(0).is_ok());

    let mut gateway = InMemoryGateway::default();
    let err = ledger
        .broadcast(at(admin(), 21), &mut gateway, p1(), request())
        .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidInput(_)));

    ledger.set_product_active(at(admin(), 22), p1(), true).unwrap();
    assert_eq!(ledger.post_review(at(r2(), 23), p1(), tx("T2"), 100).unwrap(), 1);
    assert_eq!(ledger.trust_score(p1()).unwrap().average_rating, 9000);
}

#[test]
fn add_product_rejects_duplicates_and_zero_ids() {
    let mut ledger = registered();
    assert_eq!(
        ledger.add_product(at(admin(), 1), p1(), r1()).unwrap_err(),
        LedgerError::AlreadyExists(p1())
    );
    assert!(matches!(
        ledger.add_product(at(admin(), 1), ProductId::ZERO, vendor()),
        Err(LedgerError::InvalidInput(_))
    ));
    assert!(matches!(
        ledger.add_product(at(admin(), 1), ProductId::from_label("P2"), AccountId::ZERO),
        Err(LedgerError::InvalidInput(_))
    ));
    assert!(!ledger.product_exists(ProductId::from_label("P2")));
}

#[test]
fn unknown_lookups() {
    let ledger = registered();
    let unknown = ProductId::from_label("ghost");
    assert!(!ledger.product_exists(unknown));
    assert!(matches!(
        ledger.product(unknown),
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(
        ledger.trust_score(unknown),
        Err(LedgerError::NotFound { .. })
    ));
    assert!(matches!(ledger.review(0), Err(LedgerError::NotFound { .. })));
    assert!(!ledger.transaction_usage(tx("never")).spent);
    assert!(ledger.reviews_for_product(unknown).is_empty());
}

#[test]
fn unknown_product_cannot_be_broadcast_or_toggled() {
    let mut ledger = reviewed_once();
    let mut gateway = InMemoryGateway::default();
    let ghost = ProductId::from_label("ghost");
    let before = ledger.notifications().len();

    let err = ledger
        .broadcast(at(admin(), 20), &mut gateway, ghost, request())
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::NotFound {
            entity: "product",
            ..
        }
    ));
    assert!(gateway.sent().is_empty());

    let err = ledger
        .set_product_active(at(admin(), 21), ghost, false)
        .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::NotFound {
            entity: "product",
            ..
        }
    ));
    assert!(!ledger.product_exists(ghost));
    assert_eq!(ledger.notifications().len(), before);
}

#[test]
fn batch_scores_default_unknown_ids() {
    let ledger = reviewed_once();
    let scores = ledger.trust_scores(&[p1(), ProductId::from_label("ghost")]);
    assert_eq!(scores.len(), 2);
    assert_eq!(scores[0].average_rating, 8000);
    assert_eq!(scores[1], TrustScore::default());
    assert!(ledger.trust_scores(&[]).is_empty());
}

#[test]
fn roles_gate_management_and_broadcast() {
    let mut ledger = TrustLedger::new(admin());
    let manager = AccountId::from_bytes([0x55; 20]);

    let err = ledger
        .add_product(at(manager, 0), p1(), vendor())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));

    assert!(ledger
        .grant_role(at(admin(), 1), Role::ProductManager, manager)
        .unwrap());
    assert!(!ledger
        .grant_role(at(admin(), 1), Role::ProductManager, manager)
        .unwrap());
    ledger.add_product(at(manager, 2), p1(), vendor()).unwrap();
    ledger.post_review(at(r1(), 3), p1(), tx("T1"), 70).unwrap();

    let mut gateway = InMemoryGateway::default();
    let err = ledger
        .broadcast(at(manager, 4), &mut gateway, p1(), request())
        .unwrap_err();
    assert!(matches!(err, LedgerError::Unauthorized(_)));

    assert!(matches!(
        ledger.grant_role(at(manager, 5), Role::Broadcaster, manager),
        Err(LedgerError::Unauthorized(_))
    ));
    assert!(ledger
        .revoke_role(at(admin(), 6), Role::ProductManager, manager)
        .unwrap());
    assert!(!ledger.has_role(Role::ProductManager, manager));
    assert!(matches!(
        ledger.revoke_role(at(admin(), 7), Role::Admin, admin()),
        Err(LedgerError::InvalidInput(_))
    ));
}

#[test]
fn pause_blocks_mutations_not_reads() {
    let mut ledger = reviewed_once();
    ledger.pause(at(admin(), 20)).unwrap();
    assert!(ledger.is_paused());
    assert_eq!(ledger.pause(at(admin(), 21)).unwrap_err(), LedgerError::PausedState);

    assert_eq!(
        ledger.post_review(at(r2(), 22), p1(), tx("T2"), 60).unwrap_err(),
        LedgerError::PausedState
    );
    assert_eq!(
        ledger
            .add_product(at(admin(), 22), ProductId::from_label("P2"), vendor())
            .unwrap_err(),
        LedgerError::PausedState
    );
    assert_eq!(
        ledger.set_product_active(at(admin(), 22), p1(), false).unwrap_err(),
        LedgerError::PausedState
    );
    let mut gateway = InMemoryGateway::default();
    assert_eq!(
        ledger
            .broadcast(at(admin(), 22), &mut gateway, p1(), request())
            .unwrap_err(),
        LedgerError::PausedState
    );
    assert_eq!(ledger.trust_score(p1()).unwrap().average_rating, 8000);

    assert!(matches!(
        ledger.unpause(at(r1(), 23)),
        Err(LedgerError::Unauthorized(_))
    ));
    ledger.unpause(at(admin(), 24)).unwrap();
    assert_eq!(ledger.post_review(at(r2(), 25), p1(), tx("T2"), 60).unwrap(), 1);
}

struct RefusingGateway;

impl MessagingGateway for RefusingGateway {
    fn send(&mut self, _message: &OutboundMessage) -> Result<MessageId, GatewayError> {
        Err(GatewayError::Rejected("relayer offline".to_string()))
    }
}

#[test]
fn gateway_refusal_is_remote_send_failure_without_notification() {
    let mut ledger = reviewed_once();
    ledger.drain_notifications();

    let err = ledger
        .broadcast(at(admin(), 20), &mut RefusingGateway, p1(), request())
        .unwrap_err();
    assert_eq!(
        err,
        LedgerError::RemoteSendFailure(GatewayError::Rejected("relayer offline".to_string()))
    );
    assert!(ledger.notifications().is_empty());

    let mut picky = InMemoryGateway::new(GatewayConfig {
        min_fee: 1_000,
        ..GatewayConfig::default()
    });
    let err = ledger
        .broadcast(at(admin(), 21), &mut picky, p1(), request())
        .unwrap_err();
    assert_eq!(err.code(), "REMOTE_SEND_FAILURE");
    assert!(picky.sent().is_empty());
}

#[test]
fn broadcast_rejects_zero_routing() {
    let mut ledger = reviewed_once();
    let mut gateway = InMemoryGateway::default();

    let mut no_domain = request();
    no_domain.destination_domain = DomainId::ZERO;
    assert!(matches!(
        ledger.broadcast(at(admin(), 20), &mut gateway, p1(), no_domain),
        Err(LedgerError::InvalidInput(_))
    ));

    let mut no_address = request();
    no_address.destination_address = AccountId::ZERO;
    assert!(matches!(
        ledger.broadcast(at(admin(), 20), &mut gateway, p1(), no_address),
        Err(LedgerError::InvalidInput(_))
    ));
    assert!(gateway.sent().is_empty());
}

#[test]
fn dyn_gateway_is_accepted() {
    let mut ledger = reviewed_once();
    let mut boxed: Box<dyn MessagingGateway> = Box::new(InMemoryGateway::default());
    assert!(ledger
        .broadcast(at(admin(), 20), boxed.as_mut(), p1(), request())
        .is_ok());
}

#[test]
fn notifications_carry_post_transition_values() {
    let mut ledger = registered();
    ledger.post_review(at(r1(), 10), p1(), tx("T1"), 80).unwrap();
    ledger.post_review(at(r2(), 20), p1(), tx("T2"), 60).unwrap();

    let kinds: Vec<_> = ledger.notifications().iter().map(|n| n.kind()).collect();
    assert_eq!(
        kinds,
        [
            "product_created",
            "review_posted",
            "trust_score_updated",
            "review_posted",
            "trust_score_updated",
        ]
    );
    match &ledger.notifications()[4] {
        Notification::TrustScoreUpdated {
            average_rating,
            total_reviews,
            ..
        } => {
            assert_eq!(*average_rating, 7000);
            assert_eq!(*total_reviews, 2);
        }
        other => panic!("unexpected {:?}", other),
    }

    assert_eq!(ledger.drain_notifications().len(), 5);
    assert!(ledger.notifications().is_empty());
}
