use std::time::Duration as StdDuration;

use chrono::{Duration, Utc};

use helpdesk_api::domain::password::generate_reset_code;
use helpdesk_api::domain::types::PasswordResetToken;
use helpdesk_api::error::HelpdeskError;
use helpdesk_api::usecase::password_reset::{
    ConfirmPasswordResetInput, ConfirmPasswordResetUseCase, RequestPasswordResetUseCase,
};
use helpdesk_domain::user::UserRole;

use crate::helpers::{MemoryDb, RecordingMailer, code_from_mail, fast_hasher, wait_for_mail};

fn request(
    db: &MemoryDb,
    mailer: &RecordingMailer,
) -> RequestPasswordResetUseCase<MemoryDb, MemoryDb, RecordingMailer> {
    RequestPasswordResetUseCase {
        users: db.clone(),
        resets: db.clone(),
        mailer: mailer.clone(),
    }
}

fn confirm(db: &MemoryDb) -> ConfirmPasswordResetUseCase<MemoryDb, MemoryDb> {
    ConfirmPasswordResetUseCase {
        users: db.clone(),
        resets: db.clone(),
        hasher: fast_hasher(),
    }
}

fn confirm_input(email: &str, code: &str, new_password: &str) -> ConfirmPasswordResetInput {
    ConfirmPasswordResetInput {
        email: email.into(),
        code: code.into(),
        new_password: new_password.into(),
    }
}

// ── code generation ─────────────────────────────────────────────────────────

#[test]
fn should_generate_six_ascii_digits() {
    for _ in 0..1_000 {
        let code = generate_reset_code();
        assert_eq!(code.len(), 6, "{code}");
        assert!(code.bytes().all(|b| b.is_ascii_digit()), "{code}");
    }
}

#[test]
fn should_spread_codes_uniformly_over_leading_and_trailing_digit() {
    const SAMPLES: usize = 100_000;
    // chi-square critical value for 9 degrees of freedom at p = 0.0001
    const CRITICAL: f64 = 33.72;

    let mut leading = [0usize; 10];
    let mut trailing = [0usize; 10];
    for _ in 0..SAMPLES {
        let code = generate_reset_code().into_bytes();
        leading[usize::from(code[0] - b'0')] += 1;
        trailing[usize::from(code[5] - b'0')] += 1;
    }

    let expected = SAMPLES as f64 / 10.0;
    for buckets in [leading, trailing] {
        let chi2: f64 = buckets
            .iter()
            .map(|&observed| {
                let d = observed as f64 - expected;
                d * d / expected
            })
            .sum();
        assert!(chi2 < CRITICAL, "chi-square {chi2:.2} over {buckets:?}");
    }
}

// ── request ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_code_and_mail_it_to_registered_user() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "old", UserRole::Client);
    let mailer = RecordingMailer::default();

    request(&db, &mailer)
        .execute(" Alice@Example.com ")
        .await
        .unwrap();

    let sent = wait_for_mail(&mailer, 1).await;
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "alice@example.com");
    let code = code_from_mail(&sent[0]);

    let tokens = db.resets_for("alice@example.com");
    assert_eq!(tokens.len(), 1);
    assert_eq!(tokens[0].code, code);
    assert!(!tokens[0].used);
    let ttl = tokens[0].expires_at - tokens[0].created_at;
    assert_eq!(ttl, Duration::minutes(15));
}

#[tokio::test]
async fn should_answer_unknown_email_exactly_like_known_email() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "old", UserRole::Client);
    let mailer = RecordingMailer::default();
    let uc = request(&db, &mailer);

    let known = uc.execute("alice@example.com").await;
    let unknown = uc.execute("mallory@example.com").await;

    assert!(matches!(known, Ok(())));
    assert!(matches!(unknown, Ok(())));
    assert_eq!(wait_for_mail(&mailer, 1).await.len(), 1);
    assert!(db.resets_for("mallory@example.com").is_empty());
}

#[tokio::test]
async fn should_not_issue_code_for_inactive_user() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "old", UserRole::Client);
    db.deactivate(alice.id);
    let mailer = RecordingMailer::default();

    request(&db, &mailer)
        .execute("alice@example.com")
        .await
        .unwrap();

    assert!(mailer.sent().is_empty());
    assert!(db.resets_for("alice@example.com").is_empty());
}

#[tokio::test]
async fn should_reject_malformed_email_on_request() {
    let db = MemoryDb::new();
    let result = request(&db, &RecordingMailer::default())
        .execute("alice-at-example")
        .await;
    assert!(matches!(result, Err(HelpdeskError::InvalidEmail)));
}

#[tokio::test]
async fn should_succeed_and_keep_code_when_mail_delivery_fails() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "old", UserRole::Client);
    let mailer = RecordingMailer::failing();

    let result = request(&db, &mailer).execute("alice@example.com").await;
    assert!(matches!(result, Ok(())), "got {result:?}");

    let tokens = db.resets_for("alice@example.com");
    assert_eq!(tokens.len(), 1);
    assert!(!tokens[0].used);
}

#[tokio::test]
async fn should_answer_without_waiting_for_mail_delivery() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "old", UserRole::Client);
    let mailer = RecordingMailer::slow(StdDuration::from_millis(400));
    let uc = request(&db, &mailer);

    // A 400ms relay must not show up in the response time of a known account.
    let known = tokio::time::timeout(
        StdDuration::from_millis(200),
        uc.execute("alice@example.com"),
    )
    .await
    .expect("request waited for the mail relay");
    assert!(matches!(known, Ok(())));
    assert!(mailer.sent().is_empty());

    let sent = wait_for_mail(&mailer, 1).await;
    assert_eq!(sent[0].to, "alice@example.com");
    assert_eq!(code_from_mail(&sent[0]), db.resets_for("alice@example.com")[0].code);
}

#[tokio::test]
async fn should_invalidate_previous_code_on_new_request() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "old", UserRole::Client);
    let mailer = RecordingMailer::default();
    let uc = request(&db, &mailer);

    uc.execute("alice@example.com").await.unwrap();
    uc.execute("alice@example.com").await.unwrap();

    let tokens = db.resets_for("alice@example.com");
    assert_eq!(tokens.len(), 2);
    assert_eq!(tokens.iter().filter(|t| !t.used).count(), 1);
    let (first, second) = (tokens[0].code.clone(), tokens[1].code.clone());
    assert!(!tokens[1].used);

    let mailed: Vec<String> = wait_for_mail(&mailer, 2)
        .await
        .iter()
        .map(code_from_mail)
        .collect();
    assert!(mailed.contains(&first) && mailed.contains(&second));

    if first != second {
        let stale = confirm(&db)
            .execute(confirm_input("alice@example.com", &first, "new-secret"))
            .await;
        assert!(matches!(stale, Err(HelpdeskError::InvalidOrExpiredCode)));
    }
    confirm(&db)
        .execute(confirm_input("alice@example.com", &second, "new-secret"))
        .await
        .unwrap();
}

// ── confirm ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_reset_password_exactly_once() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "old-secret", UserRole::Client);
    let mailer = RecordingMailer::default();
    request(&db, &mailer)
        .execute("alice@example.com")
        .await
        .unwrap();
    let code = code_from_mail(&wait_for_mail(&mailer, 1).await[0]);

    confirm(&db)
        .execute(confirm_input("alice@example.com", &code, "new-secret"))
        .await
        .unwrap();

    let stored = db.user(alice.id);
    assert!(fast_hasher().verify_blocking("new-secret", &stored.password_hash));
    assert!(!fast_hasher().verify_blocking("old-secret", &stored.password_hash));
    assert!(db.resets_for("alice@example.com").iter().all(|t| t.used));

    let replay = confirm(&db)
        .execute(confirm_input("alice@example.com", &code, "third-secret"))
        .await;
    assert!(
        matches!(replay, Err(HelpdeskError::InvalidOrExpiredCode)),
        "expected InvalidOrExpiredCode, got {replay:?}"
    );
    assert!(fast_hasher().verify_blocking("new-secret", &db.user(alice.id).password_hash));
}

#[tokio::test]
async fn should_reject_expired_code() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "old", UserRole::Client);
    let issued_at = Utc::now() - Duration::minutes(16);
    db.tables
        .lock()
        .unwrap()
        .resets
        .push(PasswordResetToken::issue(
            "alice@example.com",
            "123456".into(),
            issued_at,
        ));

    let result = confirm(&db)
        .execute(confirm_input("alice@example.com", "123456", "new-secret"))
        .await;
    assert!(matches!(result, Err(HelpdeskError::InvalidOrExpiredCode)));
}

#[tokio::test]
async fn should_collapse_every_confirm_failure_into_one_error() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "old", UserRole::Client);
    db.tables
        .lock()
        .unwrap()
        .resets
        .push(PasswordResetToken::issue(
            "alice@example.com",
            "123456".into(),
            Utc::now(),
        ));
    let uc = confirm(&db);

    for (email, code) in [
        ("alice@example.com", "654321"),
        ("alice@example.com", "12345"),
        ("alice@example.com", "abcdef"),
        ("bob@example.com", "123456"),
    ] {
        let result = uc.execute(confirm_input(email, code, "new-secret")).await;
        assert!(
            matches!(result, Err(HelpdeskError::InvalidOrExpiredCode)),
            "{email}/{code}: got {result:?}"
        );
    }
    assert!(!db.resets_for("alice@example.com")[0].used);
}

#[tokio::test]
async fn should_reject_new_password_before_touching_code() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "old", UserRole::Client);
    db.tables
        .lock()
        .unwrap()
        .resets
        .push(PasswordResetToken::issue(
            "alice@example.com",
            "123456".into(),
            Utc::now(),
        ));

    let result = confirm(&db)
        .execute(confirm_input("alice@example.com", "123456", ""))
        .await;
    assert!(matches!(result, Err(HelpdeskError::InvalidPassword)));
    assert!(!db.resets_for("alice@example.com")[0].used);
}

#[tokio::test]
async fn should_refuse_code_once_user_is_deactivated() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "old", UserRole::Client);
    let mailer = RecordingMailer::default();
    request(&db, &mailer)
        .execute("alice@example.com")
        .await
        .unwrap();
    let code = code_from_mail(&wait_for_mail(&mailer, 1).await[0]);
    db.deactivate(alice.id);

    let result = confirm(&db)
        .execute(confirm_input("alice@example.com", &code, "new-secret"))
        .await;
    assert!(matches!(result, Err(HelpdeskError::InvalidOrExpiredCode)));
    assert!(fast_hasher().verify_blocking("old", &db.user(alice.id).password_hash));
}

#[tokio::test]
async fn should_leave_code_unused_when_password_update_fails() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "old", UserRole::Client);
    db.tables
        .lock()
        .unwrap()
        .resets
        .push(PasswordResetToken::issue(
            "alice@example.com",
            "123456".into(),
            Utc::now(),
        ));
    db.tables.lock().unwrap().fail_password_writes = true;

    let result = confirm(&db)
        .execute(confirm_input("alice@example.com", "123456", "new-secret"))
        .await;
    assert!(matches!(result, Err(HelpdeskError::Internal(_))), "got {result:?}");
    assert!(!db.resets_for("alice@example.com")[0].used);
    assert!(fast_hasher().verify_blocking("old", &db.user(alice.id).password_hash));

    // Nothing was consumed, so the same code works once the store recovers.
    db.tables.lock().unwrap().fail_password_writes = false;
    confirm(&db)
        .execute(confirm_input("alice@example.com", "123456", "new-secret"))
        .await
        .unwrap();
    assert!(fast_hasher().verify_blocking("new-secret", &db.user(alice.id).password_hash));
}

#[tokio::test]
async fn should_reject_code_that_expires_while_password_is_hashed() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "old", UserRole::Client);
    db.tables
        .lock()
        .unwrap()
        .resets
        .push(PasswordResetToken::issue(
            "alice@example.com",
            "123456".into(),
            Utc::now(),
        ));
    db.tables.lock().unwrap().expire_on_find = true;

    let result = confirm(&db)
        .execute(confirm_input("alice@example.com", "123456", "new-secret"))
        .await;
    assert!(matches!(result, Err(HelpdeskError::InvalidOrExpiredCode)), "got {result:?}");
    assert!(!db.resets_for("alice@example.com")[0].used);
    assert!(fast_hasher().verify_blocking("old", &db.user(alice.id).password_hash));
}
