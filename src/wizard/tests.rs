//! Wizard Test Suite
//!
//! Step gating, downstream clearing, review/cancel, submission failure and
//! every terminal branch.

use super::*;
use crate::api::{SettingsApi, TransactionApi};
use crate::error::{ErrorCode, IcashError, IcashResult};
use crate::history::HistoryQuery;
use crate::types::*;
use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::time::Duration;

fn platform(id: &str) -> Platform {
    Platform {
        id: id.into(),
        name: format!("Plateforme {}", id),
        image: None,
        enable: true,
        minimun_deposit: 1000,
        max_deposit: 50000,
        minimun_with: 2000,
        max_win: 100000,
        city: None,
        street: None,
        deposit_tuto_link: None,
        withdrawal_tuto_link: None,
        why_withdrawal_fail: None,
    }
}

fn network(id: u64, name: &str, mode: Option<&str>) -> Network {
    Network {
        id,
        name: name.into(),
        public_name: name.into(),
        image: None,
        country_code: Some("229".into()),
        active_for_deposit: true,
        active_for_with: true,
        deposit_api: mode.map(String::from),
        payment_by_link: false,
        deposit_message: Some("Validez le paiement sur votre téléphone".into()),
        withdrawal_message: None,
    }
}

fn bet_id() -> UserAppId {
    UserAppId {
        id: 3,
        user_app_id: "778899".into(),
        app: "1xbet".into(),
    }
}

fn phone(network: u64) -> UserPhone {
    UserPhone {
        id: 5,
        phone: "+229 97 00 00 00".into(),
        network,
    }
}

struct FakeApi {
    answer: IcashResult<TransactionResponse>,
    settings: IcashResult<Settings>,
    settings_calls: Cell<u32>,
    requests: RefCell<Vec<(TransactionKind, TransactionRequest)>>,
}

impl FakeApi {
    fn answering(answer: IcashResult<TransactionResponse>) -> Self {
        let mut merchant_phones = BTreeMap::new();
        merchant_phones.insert(
            "moov".to_string(),
            [("229".to_string(), "22960000001".to_string())].into_iter().collect(),
        );
        Self {
            answer,
            settings: Ok(Settings {
                referral_bonus: false,
                merchant_phones,
                fee_basis_points: None,
            }),
            settings_calls: Cell::new(0),
            requests: RefCell::new(Vec::new()),
        }
    }

    fn without_settings(mut self) -> Self {
        self.settings = Err(IcashError::network("Serveur injoignable"));
        self
    }

    fn response(id: u64, link: Option<&str>, ussd: Option<&str>) -> Self {
        Self::answering(Ok(TransactionResponse {
            id,
            transaction_link: link.map(String::from),
            ussd_code: ussd.map(String::from),
        }))
    }
}

impl TransactionApi for FakeApi {
    fn create_deposit(&self, request: &TransactionRequest) -> IcashResult<TransactionResponse> {
        self.requests
            .borrow_mut()
            .push((TransactionKind::Deposit, request.clone()));
        self.answer.clone()
    }

    fn create_withdrawal(&self, request: &TransactionRequest) -> IcashResult<TransactionResponse> {
        self.requests
            .borrow_mut()
            .push((TransactionKind::Withdrawal, request.clone()));
        self.answer.clone()
    }

    fn history(&self, _query: &HistoryQuery) -> IcashResult<Page<Transaction>> {
        Ok(Page {
            count: 0,
            next: None,
            previous: None,
            results: vec![],
        })
    }

    fn transaction(&self, id: u64) -> IcashResult<Transaction> {
        Err(IcashError::not_found(format!("transaction {}", id)))
    }
}

impl SettingsApi for FakeApi {
    fn settings(&self) -> IcashResult<Settings> {
        self.settings_calls.set(self.settings_calls.get() + 1);
        self.settings.clone()
    }
}

fn wizard(kind: TransactionKind) -> Wizard<RecordingScheduler> {
    Wizard::new(kind, WizardOptions::default(), RecordingScheduler::default())
}

/// Wizard at step 5 with a Moov connect network
fn filled(kind: TransactionKind, mode: Option<&str>) -> Wizard<RecordingScheduler> {
    let mut w = wizard(kind);
    w.commit(Selection::Platform(platform("1xbet"))).unwrap();
    w.commit(Selection::BetId(bet_id())).unwrap();
    w.commit(Selection::Network(network(2, "MOOV BENIN", mode))).unwrap();
    w.commit(Selection::Phone(phone(2))).unwrap();
    w
}

fn confirming(amount: Amount, mode: Option<&str>) -> Wizard<RecordingScheduler> {
    let mut w = filled(TransactionKind::Deposit, mode);
    w.set_amount(amount).unwrap();
    w.advance().unwrap();
    assert_eq!(w.phase(), Phase::Confirming);
    w
}

// =============================================================================
// Step gating
// =============================================================================

#[test]
fn test_cannot_advance_without_selection() {
    let mut w = wizard(TransactionKind::Deposit);
    for step in Step::ALL {
        assert!(!can_advance(w.state(), step));
    }
    let err = w.advance().unwrap_err();
    assert_eq!(err.code, ErrorCode::Validation);
    assert_eq!(w.phase(), Phase::Editing(Step::Platform));
}

#[test]
fn test_commit_auto_advances_after_delay() {
    let w = filled(TransactionKind::Deposit, None);
    assert_eq!(w.phase(), Phase::Editing(Step::Amount));
    assert_eq!(w.scheduler().delays, vec![Duration::from_secs(1); 4]);
}

#[test]
fn test_commit_for_wrong_step_rejected() {
    let mut w = wizard(TransactionKind::Deposit);
    let err = w.commit(Selection::BetId(bet_id())).unwrap_err();
    assert_eq!(err.code, ErrorCode::InvalidState);
    assert!(w.state().bet_id.is_none());
}

#[test]
fn test_amount_bounds_are_inclusive() {
    let mut w = filled(TransactionKind::Deposit, None);
    for (amount, ok) in [(0, false), (999, false), (1000, true), (50000, true), (50001, false)] {
        w.set_amount(amount).unwrap();
        assert_eq!(can_advance(w.state(), Step::Amount), ok, "amount {}", amount);
    }
    w.set_amount(999).unwrap();
    assert_eq!(w.current_error(), Some(StepError::BelowMinimum(1000)));
}

#[test]
fn test_withdrawal_needs_code() {
    let mut w = filled(TransactionKind::Withdrawal, None);
    w.set_amount(5000).unwrap();
    assert_eq!(w.current_error(), Some(StepError::WithdrawalCodeTooShort));
    w.set_withdrawal_code("12").unwrap();
    assert!(w.advance().is_err());
    w.set_withdrawal_code("1234").unwrap();
    w.advance().unwrap();
    assert_eq!(w.phase(), Phase::Confirming);
}

#[test]
fn test_deposit_rejects_withdrawal_code() {
    let mut w = filled(TransactionKind::Deposit, None);
    assert!(w.set_withdrawal_code("1234").is_err());
}

#[test]
fn test_back_never_below_first_step() {
    let mut w = wizard(TransactionKind::Deposit);
    assert_eq!(w.back().unwrap(), Step::Platform);
    w.commit(Selection::Platform(platform("1xbet"))).unwrap();
    assert_eq!(w.back().unwrap(), Step::Platform);
    assert!(w.state().platform.is_some());
}

#[test]
fn test_new_platform_clears_bet_id() {
    let mut w = filled(TransactionKind::Deposit, None);
    for _ in 0..4 {
        w.back().unwrap();
    }
    w.commit(Selection::Platform(platform("1xbet"))).unwrap();
    assert!(w.state().bet_id.is_some());

    w.back().unwrap();
    w.commit(Selection::Platform(platform("betwinner"))).unwrap();
    assert!(w.state().bet_id.is_none());
    assert!(w.state().phone.is_some());
}

#[test]
fn test_new_network_clears_phone() {
    let mut w = filled(TransactionKind::Deposit, None);
    w.back().unwrap();
    w.back().unwrap();
    w.commit(Selection::Network(network(7, "MTN", None))).unwrap();
    assert!(w.state().phone.is_none());
    assert!(w.advance().is_err());
}

// =============================================================================
// Review
// =============================================================================

#[test]
fn test_review_and_cancel_keep_selections() {
    let mut w = confirming(10_000, None);
    let review = w.review().unwrap();
    assert_eq!(review.bet_id, "778899");
    assert_eq!(review.amount, 10_000);
    assert!(review.network_message.is_some());

    let before = w.state().clone();
    w.cancel_review().unwrap();
    assert_eq!(w.phase(), Phase::Editing(Step::Amount));
    assert_eq!(w.state().platform, before.platform);
    assert_eq!(w.state().amount, Some(10_000));
}

// =============================================================================
// Submission
// =============================================================================

#[test]
fn test_request_is_flattened_and_normalized() {
    let mut w = confirming(10_000, None);
    let api = FakeApi::response(41, None, None);
    w.submit(&api, &mut NoticeLog::default()).unwrap();

    let requests = api.requests.borrow();
    let (kind, request) = &requests[0];
    assert_eq!(*kind, TransactionKind::Deposit);
    assert_eq!(request.phone_number, "22997000000");
    assert_eq!(request.app, "1xbet");
    assert_eq!(request.user_app_id, "778899");
    assert_eq!(request.network, 2);
    assert_eq!(request.source, "web");
    assert_eq!(request.withdriwal_code, None);
}

#[test]
fn test_failure_keeps_state_and_notifies() {
    let mut w = confirming(10_000, None);
    let before = w.state().clone();
    let api = FakeApi::answering(Err(IcashError::rate_limited("1 minute(s) 20 seconde(s)")));
    let mut notices = NoticeLog::default();

    let err = w.submit(&api, &mut notices).unwrap_err();
    assert_eq!(err.code, ErrorCode::RateLimited);
    assert_eq!(w.phase(), Phase::Confirming);
    assert_eq!(w.state(), &before);
    assert_eq!(notices.errors().collect::<Vec<_>>(), vec!["1 minute(s) 20 seconde(s)"]);

    // retry without re-entering anything
    assert!(w.submit(&FakeApi::response(1, None, None), &mut notices).is_ok());
}

#[test]
fn test_ussd_answer_dials_then_detail() {
    let mut w = confirming(10_000, Some("connect"));
    let api = FakeApi::response(12, Some("https://pay.example/abc"), Some(" *155*1*99# "));
    let action = w.submit(&api, &mut NoticeLog::default()).unwrap();

    assert_eq!(
        action,
        TerminalAction::Dial {
            tel_uri: "tel:*155*1*99#".into(),
            dial_after: Duration::from_millis(300),
            then: Route::TransactionDetail { id: 12 },
            route_after: Duration::from_millis(800),
        }
    );
    assert_eq!(w.phase(), Phase::Completed);
}

#[test]
fn test_link_answer_opens_then_detail() {
    let mut w = confirming(10_000, Some("connect"));
    let api = FakeApi::response(13, Some("https://pay.example/abc"), Some("  "));
    let action = w.submit(&api, &mut NoticeLog::default()).unwrap();
    assert_eq!(
        action,
        TerminalAction::OpenLink {
            url: "https://pay.example/abc".into(),
            then: Route::TransactionDetail { id: 13 },
        }
    );
}

#[test]
fn test_moov_connect_prompts_with_net_amount() {
    let mut w = confirming(10_000, Some("connect"));
    let action = w
        .submit(&FakeApi::response(14, None, None), &mut NoticeLog::default())
        .unwrap();

    let prompt = match action {
        TerminalAction::Prompt(prompt) => prompt,
        other => panic!("expected prompt, got {:?}", other),
    };
    assert_eq!(prompt.ussd.code, "*155*2*1*22960000001*9900#");

    let timing = TerminalTiming::default();
    assert_eq!(
        prompt.resolve(PromptChoice::Close, &timing),
        TerminalAction::Navigate(Route::Dashboard)
    );
    assert_eq!(
        prompt.resolve(PromptChoice::Dial, &timing).route(),
        Some(&Route::TransactionDetail { id: 14 })
    );
}

#[test]
fn test_plain_success_goes_to_dashboard() {
    let mut w = confirming(10_000, None);
    let action = w
        .submit(&FakeApi::response(15, None, None), &mut NoticeLog::default())
        .unwrap();
    assert_eq!(action, TerminalAction::Navigate(Route::Dashboard));
}

#[test]
fn test_link_or_detail_policy_never_prompts() {
    let options = WizardOptions::default().with_policy(TerminalPolicy::LinkOrDetail);
    let mut w = Wizard::new(TransactionKind::Deposit, options, RecordingScheduler::default());
    w.commit(Selection::Platform(platform("1xbet"))).unwrap();
    w.commit(Selection::BetId(bet_id())).unwrap();
    w.commit(Selection::Network(network(2, "Moov", Some("connect")))).unwrap();
    w.commit(Selection::Phone(phone(2))).unwrap();
    w.set_amount(10_000).unwrap();
    w.advance().unwrap();

    let action = w
        .submit(&FakeApi::response(16, None, None), &mut NoticeLog::default())
        .unwrap();
    assert_eq!(action, TerminalAction::Navigate(Route::TransactionDetail { id: 16 }));
}

#[test]
fn test_withdrawal_sends_code() {
    let mut w = filled(TransactionKind::Withdrawal, None);
    w.set_amount(5000).unwrap();
    w.set_withdrawal_code(" 4821 ").unwrap();
    w.advance().unwrap();

    let api = FakeApi::response(17, None, None);
    w.submit(&api, &mut NoticeLog::default()).unwrap();
    let requests = api.requests.borrow();
    assert_eq!(requests[0].0, TransactionKind::Withdrawal);
    assert_eq!(requests[0].1.withdriwal_code.as_deref(), Some("4821"));
}

#[test]
fn test_withdrawal_never_prompts_provider_ussd() {
    let mut w = filled(TransactionKind::Withdrawal, Some("connect"));
    w.set_amount(10_000).unwrap();
    w.set_withdrawal_code("4821").unwrap();
    w.advance().unwrap();

    let api = FakeApi::response(18, None, None);
    let action = w.submit(&api, &mut NoticeLog::default()).unwrap();
    assert_eq!(action, TerminalAction::Navigate(Route::Dashboard));
    assert_eq!(api.settings_calls.get(), 0);
    assert_eq!(w.phase(), Phase::Completed);
}

#[test]
fn test_settings_failure_still_completes_on_dashboard() {
    let mut w = confirming(10_000, Some("connect"));
    let api = FakeApi::response(19, None, None).without_settings();
    let mut notices = NoticeLog::default();

    let action = w.submit(&api, &mut notices);
    assert_eq!(action, Ok(TerminalAction::Navigate(Route::Dashboard)));
    assert_eq!(api.settings_calls.get(), 1);
    assert_eq!(w.phase(), Phase::Completed);
    assert_eq!(notices.errors().count(), 0);
}

// =============================================================================
// Effects
// =============================================================================

#[derive(Default)]
struct RecordingNavigator {
    events: Vec<String>,
    fail_dial: bool,
}

impl Navigator for RecordingNavigator {
    fn dial(&mut self, tel_uri: &str) -> IcashResult<()> {
        self.events.push(format!("dial {}", tel_uri));
        if self.fail_dial {
            Err(IcashError::internal("no dialer"))
        } else {
            Ok(())
        }
    }

    fn open_external(&mut self, url: &str) -> IcashResult<()> {
        self.events.push(format!("open {}", url));
        Ok(())
    }

    fn go(&mut self, route: &Route) {
        self.events.push(format!("go {}", route));
    }
}

#[test]
fn test_failed_dial_still_reaches_detail() {
    let action = TerminalAction::Dial {
        tel_uri: "tel:*155#".into(),
        dial_after: Duration::from_millis(300),
        then: Route::TransactionDetail { id: 8 },
        route_after: Duration::from_millis(800),
    };
    let mut scheduler = RecordingScheduler::default();
    let mut navigator = RecordingNavigator {
        fail_dial: true,
        ..Default::default()
    };
    execute(&action, &mut scheduler, &mut navigator);

    assert_eq!(
        navigator.events,
        vec!["dial tel:*155#", "go /dashboardv3/history/detail?id=8"]
    );
    assert_eq!(
        scheduler.delays,
        vec![Duration::from_millis(300), Duration::from_millis(500)]
    );
}
