use std::time::{Duration, Instant};

use argon2::Params;
use helpdesk_api::domain::password::CredentialHasher;
use helpdesk_api::error::HelpdeskError;
use helpdesk_api::usecase::account::{
    AuthenticateUseCase, ChangePasswordInput, ChangePasswordUseCase, LoginInput, LoginUseCase,
    RegisterInput, RegisterUseCase, UpdateProfileInput, UpdateProfileUseCase,
};
use helpdesk_api::usecase::user::{
    ListUsersUseCase, UpdateUserAccessInput, UpdateUserAccessUseCase,
};
use helpdesk_domain::pagination::PageRequest;
use helpdesk_domain::user::UserRole;
use helpdesk_testing::auth::TestAuth;
use uuid::Uuid;

use crate::helpers::{MemoryDb, fast_hasher, test_signer};

fn register(db: &MemoryDb) -> RegisterUseCase<MemoryDb> {
    RegisterUseCase {
        users: db.clone(),
        hasher: fast_hasher(),
    }
}

fn login(db: &MemoryDb) -> LoginUseCase<MemoryDb> {
    LoginUseCase {
        users: db.clone(),
        hasher: fast_hasher(),
        tokens: test_signer(),
    }
}

fn authenticate(db: &MemoryDb) -> AuthenticateUseCase<MemoryDb> {
    AuthenticateUseCase {
        users: db.clone(),
        tokens: test_signer(),
    }
}

fn credentials(email: &str, password: &str) -> LoginInput {
    LoginInput {
        email: email.into(),
        password: password.into(),
    }
}

// ── register ────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_register_active_client_with_normalized_email() {
    let db = MemoryDb::new();
    let user = register(&db)
        .execute(RegisterInput {
            email: "  Alice@Example.COM ".into(),
            password: "hunter22".into(),
            full_name: " Alice Liddell ".into(),
        })
        .await
        .unwrap();

    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.full_name, "Alice Liddell");
    assert_eq!(user.role, UserRole::Client);
    assert!(user.is_active);
    assert_ne!(user.password_hash, "hunter22");
    assert!(fast_hasher().verify_blocking("hunter22", &user.password_hash));
}

#[tokio::test]
async fn should_reject_duplicate_email_regardless_of_case() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "pw-one", UserRole::Client);

    let result = register(&db)
        .execute(RegisterInput {
            email: "ALICE@example.com".into(),
            password: "pw-two".into(),
            full_name: "Alice Again".into(),
        })
        .await;
    assert!(
        matches!(result, Err(HelpdeskError::EmailAlreadyRegistered)),
        "expected EmailAlreadyRegistered, got {result:?}"
    );
    assert_eq!(db.tables.lock().unwrap().users.len(), 1);
}

#[tokio::test]
async fn should_validate_registration_fields_in_order() {
    let db = MemoryDb::new();
    let uc = register(&db);

    let bad_email = uc
        .execute(RegisterInput {
            email: "not-an-email".into(),
            password: "".into(),
            full_name: "".into(),
        })
        .await;
    assert!(matches!(bad_email, Err(HelpdeskError::InvalidEmail)));

    let bad_password = uc
        .execute(RegisterInput {
            email: "bob@example.com".into(),
            password: "".into(),
            full_name: "".into(),
        })
        .await;
    assert!(matches!(bad_password, Err(HelpdeskError::InvalidPassword)));

    let bad_name = uc
        .execute(RegisterInput {
            email: "bob@example.com".into(),
            password: "secret".into(),
            full_name: "   ".into(),
        })
        .await;
    assert!(matches!(bad_name, Err(HelpdeskError::InvalidName)));
    assert!(db.tables.lock().unwrap().users.is_empty());
}

// ── login ───────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_issue_token_carrying_user_and_role() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "wonderland", UserRole::Helpdesk);

    let out = login(&db)
        .execute(credentials("Alice@Example.com", "wonderland"))
        .await
        .unwrap();

    assert_eq!(out.user.id, alice.id);
    let info = test_signer().verify(&out.token.token).unwrap();
    assert_eq!(info.user_id, alice.id);
    assert_eq!(info.role, UserRole::Helpdesk);
    assert_eq!(info.expires_at, out.token.expires_at);
}

#[tokio::test]
async fn should_answer_unknown_email_and_wrong_password_alike() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "wonderland", UserRole::Client);

    let wrong_password = login(&db)
        .execute(credentials("alice@example.com", "looking-glass"))
        .await;
    assert!(
        matches!(wrong_password, Err(HelpdeskError::InvalidCredentials)),
        "expected InvalidCredentials, got {:?}",
        wrong_password.err()
    );

    let unknown = login(&db)
        .execute(credentials("nobody@example.com", "wonderland"))
        .await;
    assert!(
        matches!(unknown, Err(HelpdeskError::InvalidCredentials)),
        "expected InvalidCredentials, got {:?}",
        unknown.err()
    );
}

#[tokio::test]
async fn should_spend_hashing_work_on_unknown_email() {
    let hasher = CredentialHasher::new(Params::new(2 * 1024, 2, 1, None).unwrap());
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "wonderland", UserRole::Client);
    db.tables.lock().unwrap().users[0].password_hash =
        hasher.hash_blocking("wonderland").unwrap();
    let uc = LoginUseCase {
        users: db.clone(),
        hasher,
        tokens: test_signer(),
    };

    // First miss also builds the dummy hash.
    let _ = uc.execute(credentials("nobody@example.com", "x")).await;

    let mut wrong_password = Duration::ZERO;
    let mut unknown = Duration::ZERO;
    for _ in 0..3 {
        let started = Instant::now();
        let result = uc
            .execute(credentials("alice@example.com", "looking-glass"))
            .await;
        wrong_password += started.elapsed();
        assert!(matches!(result, Err(HelpdeskError::InvalidCredentials)));

        let started = Instant::now();
        let result = uc
            .execute(credentials("nobody@example.com", "looking-glass"))
            .await;
        unknown += started.elapsed();
        assert!(matches!(result, Err(HelpdeskError::InvalidCredentials)));
    }
    assert!(
        unknown * 3 >= wrong_password,
        "unknown email took {unknown:?}, wrong password took {wrong_password:?}"
    );
}

#[tokio::test]
async fn should_reject_inactive_user_only_after_password_check() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "wonderland", UserRole::Client);
    db.deactivate(alice.id);

    let right = login(&db)
        .execute(credentials("alice@example.com", "wonderland"))
        .await;
    assert!(matches!(right, Err(HelpdeskError::InactiveUser)));

    let wrong = login(&db)
        .execute(credentials("alice@example.com", "guess"))
        .await;
    assert!(matches!(wrong, Err(HelpdeskError::InvalidCredentials)));
}

// ── authenticate ────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_resolve_current_user_from_valid_token() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let token = TestAuth::default().token(alice.id, UserRole::Client);

    let user = authenticate(&db).execute(Some(&token)).await.unwrap();
    assert_eq!(user.id, alice.id);
}

#[tokio::test]
async fn should_take_role_from_store_not_from_token() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let token = TestAuth::default().token(alice.id, UserRole::Admin);

    let user = authenticate(&db).execute(Some(&token)).await.unwrap();
    assert_eq!(user.actor().role, UserRole::Client);
}

#[tokio::test]
async fn should_distinguish_missing_expired_and_invalid_tokens() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let auth = TestAuth::default();
    let uc = authenticate(&db);

    let missing = uc.execute(None).await;
    assert!(matches!(missing, Err(HelpdeskError::MissingToken)));

    let expired = uc
        .execute(Some(&auth.expired_token(alice.id, UserRole::Client)))
        .await;
    assert!(
        matches!(expired, Err(HelpdeskError::TokenExpired)),
        "expected TokenExpired, got {expired:?}"
    );

    let garbage = uc.execute(Some("definitely.not.ajwt")).await;
    assert!(matches!(garbage, Err(HelpdeskError::InvalidToken)));

    let forged = TestAuth::new("some-other-secret").token(alice.id, UserRole::Client);
    let forged = uc.execute(Some(&forged)).await;
    assert!(matches!(forged, Err(HelpdeskError::InvalidToken)));
}

#[tokio::test]
async fn should_reject_token_for_unknown_or_inactive_user() {
    let db = MemoryDb::new();
    let auth = TestAuth::default();
    let uc = authenticate(&db);

    let ghost = uc
        .execute(Some(&auth.token(Uuid::new_v4(), UserRole::Client)))
        .await;
    assert!(matches!(ghost, Err(HelpdeskError::InvalidToken)));

    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let token = auth.token(alice.id, UserRole::Client);
    db.deactivate(alice.id);
    let inactive = uc.execute(Some(&token)).await;
    assert!(
        matches!(inactive, Err(HelpdeskError::InactiveUser)),
        "expected InactiveUser, got {inactive:?}"
    );
}

// ── profile ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_update_own_full_name_and_bump_updated_at() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);

    let uc = UpdateProfileUseCase { users: db.clone() };
    let updated = uc
        .execute(
            alice.id,
            UpdateProfileInput {
                full_name: Some("  Alice L. ".into()),
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.full_name, "Alice L.");
    assert!(updated.updated_at > alice.updated_at);

    let empty = uc
        .execute(alice.id, UpdateProfileInput { full_name: None })
        .await;
    assert!(matches!(empty, Err(HelpdeskError::MissingData)));
}

#[tokio::test]
async fn should_change_password_only_with_current_password() {
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "old-secret", UserRole::Client);
    let uc = ChangePasswordUseCase {
        users: db.clone(),
        hasher: fast_hasher(),
    };

    let wrong = uc
        .execute(
            alice.id,
            ChangePasswordInput {
                current_password: "not-it".into(),
                new_password: "new-secret".into(),
            },
        )
        .await;
    assert!(matches!(wrong, Err(HelpdeskError::InvalidCredentials)));

    uc.execute(
        alice.id,
        ChangePasswordInput {
            current_password: "old-secret".into(),
            new_password: "new-secret".into(),
        },
    )
    .await
    .unwrap();

    assert!(
        login(&db)
            .execute(credentials("alice@example.com", "new-secret"))
            .await
            .is_ok()
    );
    let old = login(&db)
        .execute(credentials("alice@example.com", "old-secret"))
        .await;
    assert!(matches!(old, Err(HelpdeskError::InvalidCredentials)));
}

// ── user administration ─────────────────────────────────────────────────────

#[tokio::test]
async fn should_reserve_user_listing_for_admin() {
    let db = MemoryDb::new();
    let admin = db.seed_user("root@example.com", "pw", UserRole::Admin);
    let agent = db.seed_user("agent@example.com", "pw", UserRole::Helpdesk);
    let uc = ListUsersUseCase { users: db.clone() };

    let users = uc
        .execute(&admin.actor(), PageRequest::default())
        .await
        .unwrap();
    assert_eq!(users.len(), 2);

    let denied = uc.execute(&agent.actor(), PageRequest::default()).await;
    assert!(matches!(denied, Err(HelpdeskError::Forbidden)));
}

#[tokio::test]
async fn should_let_admin_promote_and_deactivate_users() {
    let db = MemoryDb::new();
    let admin = db.seed_user("root@example.com", "pw", UserRole::Admin);
    let bob = db.seed_user("bob@example.com", "pw", UserRole::Client);
    let uc = UpdateUserAccessUseCase { users: db.clone() };

    let promoted = uc
        .execute(
            &admin.actor(),
            bob.id,
            UpdateUserAccessInput {
                full_name: None,
                role: Some("helpdesk".into()),
                is_active: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(promoted.role, UserRole::Helpdesk);
    assert!(promoted.is_active);

    let deactivated = uc
        .execute(
            &admin.actor(),
            bob.id,
            UpdateUserAccessInput {
                full_name: None,
                role: None,
                is_active: Some(false),
            },
        )
        .await
        .unwrap();
    assert!(!deactivated.is_active);
    assert_eq!(db.user(bob.id).role, UserRole::Helpdesk);
}

#[tokio::test]
async fn should_reject_user_access_changes_from_non_admin_or_with_bad_role() {
    let db = MemoryDb::new();
    let admin = db.seed_user("root@example.com", "pw", UserRole::Admin);
    let agent = db.seed_user("agent@example.com", "pw", UserRole::Helpdesk);
    let uc = UpdateUserAccessUseCase { users: db.clone() };

    let escalate = uc
        .execute(
            &agent.actor(),
            agent.id,
            UpdateUserAccessInput {
                full_name: None,
                role: Some("admin".into()),
                is_active: None,
            },
        )
        .await;
    assert!(matches!(escalate, Err(HelpdeskError::Forbidden)));
    assert_eq!(db.user(agent.id).role, UserRole::Helpdesk);

    let bad_role = uc
        .execute(
            &admin.actor(),
            agent.id,
            UpdateUserAccessInput {
                full_name: None,
                role: Some("superuser".into()),
                is_active: None,
            },
        )
        .await;
    assert!(matches!(bad_role, Err(HelpdeskError::InvalidRole)));

    let missing = uc
        .execute(
            &admin.actor(),
            Uuid::new_v4(),
            UpdateUserAccessInput {
                full_name: None,
                role: Some("client".into()),
                is_active: None,
            },
        )
        .await;
    assert!(matches!(missing, Err(HelpdeskError::UserNotFound)));
}
