use helpdesk_api::error::HelpdeskError;
use helpdesk_api::usecase::account::{
    AuthenticateUseCase, LoginInput, LoginUseCase, RegisterInput, RegisterUseCase,
};
use helpdesk_api::usecase::comment::AddCommentUseCase;
use helpdesk_api::usecase::password_reset::RequestPasswordResetUseCase;
use helpdesk_api::usecase::ticket::{
    CreateTicketInput, CreateTicketUseCase, GetTicketUseCase, UpdateTicketInput,
    UpdateTicketUseCase,
};
use helpdesk_domain::ticket::TicketStatus;
use helpdesk_domain::user::UserRole;

use crate::helpers::{MemoryDb, RecordingMailer, fast_hasher, test_signer, wait_for_mail};

#[tokio::test]
async fn should_walk_ticket_from_creation_through_staff_handling() {
    let db = MemoryDb::new();
    let bob = db.seed_user("bob@example.com", "staff-pw", UserRole::Helpdesk);

    // Alice signs up and logs in; every later call acts as the user her token resolves to.
    RegisterUseCase {
        users: db.clone(),
        hasher: fast_hasher(),
    }
    .execute(RegisterInput {
        email: "alice@example.com".into(),
        password: "pw1".into(),
        full_name: "Alice".into(),
    })
    .await
    .unwrap();
    let session = LoginUseCase {
        users: db.clone(),
        hasher: fast_hasher(),
        tokens: test_signer(),
    }
    .execute(LoginInput {
        email: "alice@example.com".into(),
        password: "pw1".into(),
    })
    .await
    .unwrap();
    let alice = AuthenticateUseCase {
        users: db.clone(),
        tokens: test_signer(),
    }
    .execute(Some(&session.token.token))
    .await
    .unwrap();

    let ticket = CreateTicketUseCase {
        tickets: db.clone(),
        categories: db.clone(),
        priorities: db.clone(),
    }
    .execute(
        &alice.actor(),
        CreateTicketInput {
            title: "printer broken".into(),
            description: "It makes a grinding noise".into(),
            category_id: None,
            priority_id: None,
        },
    )
    .await
    .unwrap();
    assert_eq!(ticket.status, TicketStatus::Open);
    assert_eq!(ticket.created_by, alice.id);

    let update = UpdateTicketUseCase {
        tickets: db.clone(),
        users: db.clone(),
    };
    let taken = update
        .execute(
            &bob.actor(),
            ticket.id,
            UpdateTicketInput {
                status: Some("in_progress".into()),
                assigned_to: Some(bob.id),
            },
        )
        .await
        .unwrap();
    assert_eq!(taken.status, TicketStatus::InProgress);
    assert_eq!(taken.assigned_to, Some(bob.id));
    assert!(taken.updated_at > ticket.updated_at);

    let note = AddCommentUseCase {
        tickets: db.clone(),
        comments: db.clone(),
    }
    .execute(&alice.actor(), ticket.id, "still broken".into())
    .await
    .unwrap();
    assert_eq!(note.author_id, alice.id);

    let detail = GetTicketUseCase {
        tickets: db.clone(),
        comments: db.clone(),
    }
    .execute(&alice.actor(), ticket.id)
    .await
    .unwrap();
    assert_eq!(detail.comments.len(), 1);
    assert_eq!(detail.comments[0].content, "still broken");
    assert_eq!(detail.comments[0].author_id, alice.id);
    assert!(detail.ticket.updated_at > taken.updated_at);

    let grab = update
        .execute(
            &alice.actor(),
            ticket.id,
            UpdateTicketInput {
                status: None,
                assigned_to: Some(alice.id),
            },
        )
        .await;
    assert!(
        matches!(grab, Err(HelpdeskError::Forbidden)),
        "expected Forbidden, got {grab:?}"
    );
    assert_eq!(HelpdeskError::Forbidden.status().as_u16(), 403);
    assert_eq!(db.ticket(ticket.id).assigned_to, Some(bob.id));
}

#[tokio::test]
async fn should_not_reveal_whether_reset_email_is_registered() {
    let db = MemoryDb::new();
    db.seed_user("alice@example.com", "pw1", UserRole::Client);
    let mailer = RecordingMailer::default();
    let uc = RequestPasswordResetUseCase {
        users: db.clone(),
        resets: db.clone(),
        mailer: mailer.clone(),
    };

    let existing = uc.execute("alice@example.com").await;
    let missing = uc.execute("ghost@example.com").await;

    assert_eq!(
        format!("{existing:?}"),
        format!("{missing:?}"),
        "outcomes must be indistinguishable"
    );
    assert_eq!(wait_for_mail(&mailer, 1).await.len(), 1);
}
