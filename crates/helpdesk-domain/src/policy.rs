//! Authorization policy.
//!
//! [`can_act`] is a pure decision over (actor, action, resource). Use cases call it before
//! every mutation and before returning ticket data. Anything not granted by the table below
//! is denied.
//!
//! | Action | client | helpdesk | admin |
//! |--------|--------|----------|-------|
//! | read / comment / attach on own ticket | yes | yes | yes |
//! | read / comment / attach on others' ticket | no | yes | yes |
//! | create ticket | yes | yes | yes |
//! | set status on own ticket | `closed` only | any | any |
//! | set status on others' ticket | no | any | any |
//! | reassign | no | yes | yes |
//! | manage categories / priorities | no | no | yes |
//! | manage other users | no | no | yes |

use uuid::Uuid;

use crate::ticket::TicketStatus;
use crate::user::UserRole;

/// The authenticated identity performing a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Actor {
    pub id: Uuid,
    pub role: UserRole,
}

impl Actor {
    pub fn new(id: Uuid, role: UserRole) -> Self {
        Self { id, role }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    ReadTicket,
    CreateTicket,
    SetStatus(TicketStatus),
    Reassign,
    Comment,
    AttachFile,
    DeleteAttachment,
    ManageCatalog,
    ManageUsers,
}

/// What an action targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    /// An existing ticket, identified for ownership purposes by its creator.
    Ticket { created_by: Uuid },
    /// Anything not owned by a single user (ticket creation, catalog, user management).
    System,
}

pub fn can_act(actor: &Actor, action: Action, resource: &Resource) -> bool {
    let on_ticket = matches!(resource, Resource::Ticket { .. });
    let owns = matches!(resource, Resource::Ticket { created_by } if *created_by == actor.id);

    match (actor.role, action) {
        (_, Action::CreateTicket) => true,
        (UserRole::Admin, Action::ManageCatalog | Action::ManageUsers) => true,
        (UserRole::Client | UserRole::Helpdesk, Action::ManageCatalog | Action::ManageUsers) => {
            false
        }
        (UserRole::Helpdesk | UserRole::Admin, _) => on_ticket,
        (
            UserRole::Client,
            Action::ReadTicket | Action::Comment | Action::AttachFile | Action::DeleteAttachment,
        ) => owns,
        (UserRole::Client, Action::SetStatus(status)) => owns && status == TicketStatus::Closed,
        (UserRole::Client, Action::Reassign) => false,
    }
}
