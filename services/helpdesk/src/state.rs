use sea_orm::DatabaseConnection;

use helpdesk_auth_types::token::TokenSigner;

use crate::domain::password::CredentialHasher;
use crate::infra::db::{
    DbAttachmentRepository, DbCategoryRepository, DbCommentRepository,
    DbPasswordResetRepository, DbPriorityRepository, DbTicketRepository, DbUserRepository,
};
use crate::infra::mail::AppMailer;
use crate::infra::storage::LocalAttachmentStore;

/// Shared application state passed to every handler via axum `State`.
#[derive(Clone)]
pub struct AppState {
    pub db: DatabaseConnection,
    pub tokens: TokenSigner,
    pub hasher: CredentialHasher,
    pub mailer: AppMailer,
    pub storage: LocalAttachmentStore,
    /// Body limit for the attachment upload route.
    pub max_upload_bytes: usize,
}

impl AppState {
    pub fn user_repo(&self) -> DbUserRepository {
        DbUserRepository {
            db: self.db.clone(),
        }
    }

    pub fn reset_repo(&self) -> DbPasswordResetRepository {
        DbPasswordResetRepository {
            db: self.db.clone(),
        }
    }

    pub fn ticket_repo(&self) -> DbTicketRepository {
        DbTicketRepository {
            db: self.db.clone(),
        }
    }

    pub fn comment_repo(&self) -> DbCommentRepository {
        DbCommentRepository {
            db: self.db.clone(),
        }
    }

    pub fn attachment_repo(&self) -> DbAttachmentRepository {
        DbAttachmentRepository {
            db: self.db.clone(),
        }
    }

    pub fn category_repo(&self) -> DbCategoryRepository {
        DbCategoryRepository {
            db: self.db.clone(),
        }
    }

    pub fn priority_repo(&self) -> DbPriorityRepository {
        DbPriorityRepository {
            db: self.db.clone(),
        }
    }
}
