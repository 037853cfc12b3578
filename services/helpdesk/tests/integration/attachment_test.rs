use bytes::Bytes;
use tempfile::TempDir;
use uuid::Uuid;

use helpdesk_api::domain::repository::AttachmentStore;
use helpdesk_api::error::HelpdeskError;
use helpdesk_api::infra::storage::LocalAttachmentStore;
use helpdesk_api::usecase::attachment::{
    DeleteAttachmentUseCase, DownloadAttachmentUseCase, ListAttachmentsUseCase, UploadedFile,
    UploadAttachmentsUseCase,
};
use helpdesk_domain::user::UserRole;

use crate::helpers::{FlakyStore, MemoryDb};

fn file(name: &str, body: &'static [u8]) -> UploadedFile {
    UploadedFile {
        filename: name.into(),
        content_type: Some("text/plain".into()),
        bytes: Bytes::from_static(body),
    }
}

fn upload(
    db: &MemoryDb,
    store: &LocalAttachmentStore,
) -> UploadAttachmentsUseCase<MemoryDb, MemoryDb, LocalAttachmentStore> {
    UploadAttachmentsUseCase {
        tickets: db.clone(),
        attachments: db.clone(),
        store: store.clone(),
    }
}

fn on_disk(dir: &TempDir, ticket_id: Uuid, name: &str) -> bool {
    dir.path().join(ticket_id.to_string()).join(name).exists()
}

// ── LocalAttachmentStore ────────────────────────────────────────────────────

#[tokio::test]
async fn should_store_and_retrieve_bytes_under_ticket_directory() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let ticket_id = Uuid::new_v4();

    let path = store
        .store(ticket_id, "log.txt", Bytes::from_static(b"boot failed"), "text/plain")
        .await
        .unwrap();
    assert_eq!(path, format!("{ticket_id}/log.txt"));
    assert!(on_disk(&dir, ticket_id, "log.txt"));

    let bytes = store.retrieve(&path).await.unwrap();
    assert_eq!(&bytes[..], b"boot failed");
}

#[tokio::test]
async fn should_refuse_to_overwrite_existing_file() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let ticket_id = Uuid::new_v4();

    store
        .store(ticket_id, "log.txt", Bytes::from_static(b"first"), "text/plain")
        .await
        .unwrap();
    let again = store
        .store(ticket_id, "log.txt", Bytes::from_static(b"second"), "text/plain")
        .await;
    assert!(matches!(again, Err(HelpdeskError::DuplicateFilename)));

    let kept = store.retrieve(&format!("{ticket_id}/log.txt")).await.unwrap();
    assert_eq!(&kept[..], b"first");
}

#[tokio::test]
async fn should_reject_paths_outside_ticket_namespace() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());

    let traversal = store
        .store(Uuid::new_v4(), "../escape.txt", Bytes::new(), "text/plain")
        .await;
    assert!(matches!(traversal, Err(HelpdeskError::InvalidFilename)));

    for bad in ["../../etc/passwd", "not-a-uuid/file.txt", "just-a-name"] {
        let result = store.retrieve(bad).await;
        assert!(
            matches!(result, Err(HelpdeskError::Internal(_))),
            "{bad}: got {result:?}"
        );
    }
}

#[tokio::test]
async fn should_treat_missing_file_as_not_found_on_read_and_ok_on_delete() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let path = format!("{}/gone.txt", Uuid::new_v4());

    assert!(matches!(
        store.retrieve(&path).await,
        Err(HelpdeskError::AttachmentNotFound)
    ));
    store.delete(&path).await.unwrap();
}

// ── upload ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_upload_batch_and_serve_it_back() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let ticket = db.seed_ticket(&alice, "Printer");

    let rows = upload(&db, &store)
        .execute(
            &alice.actor(),
            ticket.id,
            vec![
                file("a.txt", b"alpha"),
                UploadedFile {
                    filename: "b.bin".into(),
                    content_type: None,
                    bytes: Bytes::from_static(b"\x00\x01"),
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[1].content_type, "application/octet-stream");

    let listed = ListAttachmentsUseCase {
        tickets: db.clone(),
        attachments: db.clone(),
    }
    .execute(&alice.actor(), ticket.id)
    .await
    .unwrap();
    assert_eq!(listed.len(), 2);

    let (meta, bytes) = DownloadAttachmentUseCase {
        tickets: db.clone(),
        attachments: db.clone(),
        store: store.clone(),
    }
    .execute(&alice.actor(), rows[0].id)
    .await
    .unwrap();
    assert_eq!(meta.filename, "a.txt");
    assert_eq!(&bytes[..], b"alpha");
}

#[tokio::test]
async fn should_reject_repeated_name_within_one_upload() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let ticket = db.seed_ticket(&alice, "Printer");

    let result = upload(&db, &store)
        .execute(
            &alice.actor(),
            ticket.id,
            vec![file("a.txt", b"one"), file("a.txt", b"two")],
        )
        .await;
    assert!(matches!(result, Err(HelpdeskError::DuplicateFilename)));
    assert!(!on_disk(&dir, ticket.id, "a.txt"));
}

#[tokio::test]
async fn should_roll_back_batch_when_a_name_is_already_taken() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let ticket = db.seed_ticket(&alice, "Printer");
    let uc = upload(&db, &store);

    uc.execute(&alice.actor(), ticket.id, vec![file("taken.txt", b"v1")])
        .await
        .unwrap();

    let result = uc
        .execute(
            &alice.actor(),
            ticket.id,
            vec![file("fresh.txt", b"new"), file("taken.txt", b"v2")],
        )
        .await;
    assert!(
        matches!(result, Err(HelpdeskError::DuplicateFilename)),
        "got {result:?}"
    );
    assert!(!on_disk(&dir, ticket.id, "fresh.txt"));
    assert_eq!(db.tables.lock().unwrap().attachments.len(), 1);

    let kept = store
        .retrieve(&format!("{}/taken.txt", ticket.id))
        .await
        .unwrap();
    assert_eq!(&kept[..], b"v1");
}

#[tokio::test]
async fn should_remove_written_files_when_rows_cannot_be_inserted() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let ticket = db.seed_ticket(&alice, "Printer");
    let uc = upload(&db, &store);

    // Row survives but its file has gone missing.
    let rows = uc
        .execute(&alice.actor(), ticket.id, vec![file("report.pdf", b"v1")])
        .await
        .unwrap();
    store.delete(&rows[0].storage_path).await.unwrap();

    let result = uc
        .execute(
            &alice.actor(),
            ticket.id,
            vec![file("notes.txt", b"n"), file("report.pdf", b"v2")],
        )
        .await;
    assert!(matches!(result, Err(HelpdeskError::DuplicateFilename)));
    assert!(!on_disk(&dir, ticket.id, "notes.txt"));
    assert!(!on_disk(&dir, ticket.id, "report.pdf"));
}

#[tokio::test]
async fn should_remove_written_files_when_store_fails_midway() {
    let dir = TempDir::new().unwrap();
    let store = FlakyStore::new(LocalAttachmentStore::new(dir.path()), 1);
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let ticket = db.seed_ticket(&alice, "Printer");

    let result = UploadAttachmentsUseCase {
        tickets: db.clone(),
        attachments: db.clone(),
        store,
    }
    .execute(
        &alice.actor(),
        ticket.id,
        vec![file("a.txt", b"a"), file("b.txt", b"b"), file("c.txt", b"c")],
    )
    .await;
    assert!(matches!(result, Err(HelpdeskError::Internal(_))));
    assert!(!on_disk(&dir, ticket.id, "a.txt"));
    assert!(!on_disk(&dir, ticket.id, "c.txt"));
    assert!(db.tables.lock().unwrap().attachments.is_empty());
}

#[tokio::test]
async fn should_validate_upload_before_touching_storage() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let bob = db.seed_user("bob@example.com", "pw", UserRole::Client);
    let ticket = db.seed_ticket(&bob, "Bob's printer");
    let uc = upload(&db, &store);

    let empty = uc.execute(&bob.actor(), ticket.id, vec![]).await;
    assert!(matches!(empty, Err(HelpdeskError::MissingData)));

    let bad_name = uc
        .execute(&bob.actor(), ticket.id, vec![file("a/b.txt", b"x")])
        .await;
    assert!(matches!(bad_name, Err(HelpdeskError::InvalidFilename)));

    let foreign = uc
        .execute(&alice.actor(), ticket.id, vec![file("a.txt", b"x")])
        .await;
    assert!(matches!(foreign, Err(HelpdeskError::Forbidden)));

    let missing = uc
        .execute(&bob.actor(), Uuid::new_v4(), vec![file("a.txt", b"x")])
        .await;
    assert!(matches!(missing, Err(HelpdeskError::TicketNotFound)));
    assert!(!dir.path().join(ticket.id.to_string()).exists());
}

// ── delete ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn should_delete_row_and_file_for_authorized_actor_only() {
    let dir = TempDir::new().unwrap();
    let store = LocalAttachmentStore::new(dir.path());
    let db = MemoryDb::new();
    let alice = db.seed_user("alice@example.com", "pw", UserRole::Client);
    let bob = db.seed_user("bob@example.com", "pw", UserRole::Client);
    let agent = db.seed_user("agent@example.com", "pw", UserRole::Helpdesk);
    let ticket = db.seed_ticket(&alice, "Printer");

    let rows = upload(&db, &store)
        .execute(&alice.actor(), ticket.id, vec![file("a.txt", b"a")])
        .await
        .unwrap();
    let uc = DeleteAttachmentUseCase {
        tickets: db.clone(),
        attachments: db.clone(),
        store: store.clone(),
    };

    let denied = uc.execute(&bob.actor(), rows[0].id).await;
    assert!(matches!(denied, Err(HelpdeskError::Forbidden)));
    assert!(on_disk(&dir, ticket.id, "a.txt"));

    uc.execute(&agent.actor(), rows[0].id).await.unwrap();
    assert!(!on_disk(&dir, ticket.id, "a.txt"));
    assert!(db.tables.lock().unwrap().attachments.is_empty());

    let again = uc.execute(&agent.actor(), rows[0].id).await;
    assert!(matches!(again, Err(HelpdeskError::AttachmentNotFound)));
}
