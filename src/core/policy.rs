//! Authorization policy for tickets and responses.
//!
//! One pure decision function per (resource, action) pair. Each takes the
//! acting user and a snapshot of the resource state it depends on, and
//! returns allow/deny as a plain bool. No I/O happens here: the caller loads
//! the resource first (so "not found" always wins over "forbidden") and the
//! actor arrives with its role names already resolved.
//!
//! Visibility of *listings* is not decided here. `view_any` is deliberately
//! permissive; the application service scopes list queries to the owner for
//! non-staff actors before they reach the store.

use uuid::Uuid;

use crate::core::middleware::AuthenticatedUser;
use crate::core::shared::enums::TicketStatus;
use crate::directory::roles::{ROLE_ADMIN, ROLE_AGENT, ROLE_CLIENT};

/// The ticket state a policy decision depends on.
#[derive(Debug, Clone, Copy)]
pub struct TicketSnapshot {
    pub owner_id: Uuid,
    pub status: TicketStatus,
}

/// The response state a policy decision depends on.
///
/// No current rule consults the author: response rights are role-scoped.
#[derive(Debug, Clone, Copy)]
pub struct ResponseSnapshot {
    pub author_id: Uuid,
    pub ticket_id: Uuid,
}

pub struct TicketPolicy;

impl TicketPolicy {
    /// Any authenticated user may list tickets (scoping happens in the query).
    pub fn view_any(_actor: &AuthenticatedUser) -> bool {
        true
    }

    /// The owning client sees their own ticket; staff see every ticket.
    pub fn view(actor: &AuthenticatedUser, ticket: &TicketSnapshot) -> bool {
        actor.user_id == ticket.owner_id || actor.has_any_role(&[ROLE_AGENT, ROLE_ADMIN])
    }

    /// Only clients file tickets.
    pub fn create(actor: &AuthenticatedUser) -> bool {
        actor.has_role(ROLE_CLIENT)
    }

    /// Staff drive tickets to resolution; the filing client never edits one.
    pub fn update(actor: &AuthenticatedUser, _ticket: &TicketSnapshot) -> bool {
        actor.has_any_role(&[ROLE_AGENT, ROLE_ADMIN])
    }

    /// Admin-only.
    pub fn delete(actor: &AuthenticatedUser, _ticket: &TicketSnapshot) -> bool {
        actor.has_role(ROLE_ADMIN)
    }

    pub fn change_status(actor: &AuthenticatedUser, _ticket: &TicketSnapshot) -> bool {
        actor.has_any_role(&[ROLE_AGENT, ROLE_ADMIN])
    }
}

pub struct ResponsePolicy;

impl ResponsePolicy {
    pub fn view_any(_actor: &AuthenticatedUser) -> bool {
        true
    }

    pub fn view(_actor: &AuthenticatedUser, _response: &ResponseSnapshot) -> bool {
        true
    }

    /// Clients and agents may reply, but never on a closed ticket.
    pub fn create(actor: &AuthenticatedUser, parent: &TicketSnapshot) -> bool {
        actor.has_any_role(&[ROLE_CLIENT, ROLE_AGENT]) && parent.status.accepts_responses()
    }

    pub fn update(actor: &AuthenticatedUser, _response: &ResponseSnapshot) -> bool {
        actor.has_any_role(&[ROLE_AGENT, ROLE_ADMIN])
    }

    /// Admin-only, including for the response's own author.
    pub fn delete(actor: &AuthenticatedUser, _response: &ResponseSnapshot) -> bool {
        actor.has_role(ROLE_ADMIN)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor(roles: &[&str]) -> AuthenticatedUser {
        AuthenticatedUser {
            user_id: Uuid::new_v4(),
            email: "actor@example.com".to_string(),
            name: "Actor".to_string(),
            roles: roles.iter().map(|r| r.to_string()).collect(),
        }
    }

    fn ticket_of(owner_id: Uuid, status: TicketStatus) -> TicketSnapshot {
        TicketSnapshot { owner_id, status }
    }

    fn response_on(ticket_id: Uuid, author_id: Uuid) -> ResponseSnapshot {
        ResponseSnapshot {
            author_id,
            ticket_id,
        }
    }

    #[test]
    fn test_anyone_authenticated_may_list_tickets() {
        for roles in [&[][..], &[ROLE_CLIENT][..], &[ROLE_AGENT][..], &[ROLE_ADMIN][..]] {
            assert!(TicketPolicy::view_any(&actor(roles)));
        }
    }

    #[test]
    fn test_ticket_view_is_owner_or_staff() {
        let client = actor(&[ROLE_CLIENT]);
        let own = ticket_of(client.user_id, TicketStatus::Open);
        let foreign = ticket_of(Uuid::new_v4(), TicketStatus::Open);

        assert!(TicketPolicy::view(&client, &own));
        assert!(!TicketPolicy::view(&client, &foreign));
        assert!(TicketPolicy::view(&actor(&[ROLE_AGENT]), &foreign));
        assert!(TicketPolicy::view(&actor(&[ROLE_ADMIN]), &foreign));
    }

    #[test]
    fn test_only_clients_create_tickets() {
        assert!(TicketPolicy::create(&actor(&[ROLE_CLIENT])));
        assert!(!TicketPolicy::create(&actor(&[ROLE_AGENT])));
        assert!(!TicketPolicy::create(&actor(&[ROLE_ADMIN])));
        assert!(!TicketPolicy::create(&actor(&[])));
    }

    #[test]
    fn test_ticket_update_is_staff_only_even_for_owner() {
        let client = actor(&[ROLE_CLIENT]);
        let own = ticket_of(client.user_id, TicketStatus::Open);

        assert!(!TicketPolicy::update(&client, &own));
        assert!(TicketPolicy::update(&actor(&[ROLE_AGENT]), &own));
        assert!(TicketPolicy::update(&actor(&[ROLE_ADMIN]), &own));
    }

    #[test]
    fn test_ticket_delete_is_admin_only() {
        let client = actor(&[ROLE_CLIENT]);
        let own = ticket_of(client.user_id, TicketStatus::Open);

        assert!(!TicketPolicy::delete(&client, &own));
        assert!(!TicketPolicy::delete(&actor(&[ROLE_AGENT]), &own));
        assert!(TicketPolicy::delete(&actor(&[ROLE_ADMIN]), &own));
    }

    #[test]
    fn test_status_changes_are_staff_only() {
        let ticket = ticket_of(Uuid::new_v4(), TicketStatus::Open);

        assert!(!TicketPolicy::change_status(&actor(&[ROLE_CLIENT]), &ticket));
        assert!(TicketPolicy::change_status(&actor(&[ROLE_AGENT]), &ticket));
        assert!(TicketPolicy::change_status(&actor(&[ROLE_ADMIN]), &ticket));
    }

    #[test]
    fn test_responses_are_visible_to_any_authenticated_user() {
        let response = response_on(Uuid::new_v4(), Uuid::new_v4());
        for roles in [&[][..], &[ROLE_CLIENT][..], &[ROLE_AGENT][..], &[ROLE_ADMIN][..]] {
            assert!(ResponsePolicy::view_any(&actor(roles)));
            assert!(ResponsePolicy::view(&actor(roles), &response));
        }
    }

    #[test]
    fn test_response_create_requires_client_or_agent() {
        let open = ticket_of(Uuid::new_v4(), TicketStatus::Open);

        assert!(ResponsePolicy::create(&actor(&[ROLE_CLIENT]), &open));
        assert!(ResponsePolicy::create(&actor(&[ROLE_AGENT]), &open));
        assert!(!ResponsePolicy::create(&actor(&[ROLE_ADMIN]), &open));
        assert!(!ResponsePolicy::create(&actor(&[]), &open));
    }

    #[test]
    fn test_response_create_allowed_while_open_or_pending() {
        let client = actor(&[ROLE_CLIENT]);
        assert!(ResponsePolicy::create(
            &client,
            &ticket_of(Uuid::new_v4(), TicketStatus::Open)
        ));
        assert!(ResponsePolicy::create(
            &client,
            &ticket_of(Uuid::new_v4(), TicketStatus::Pending)
        ));
    }

    #[test]
    fn test_response_create_always_denied_on_closed_ticket() {
        let closed = ticket_of(Uuid::new_v4(), TicketStatus::Closed);
        for roles in [&[][..], &[ROLE_CLIENT][..], &[ROLE_AGENT][..], &[ROLE_ADMIN][..]] {
            assert!(!ResponsePolicy::create(&actor(roles), &closed));
        }
    }

    #[test]
    fn test_response_update_is_staff_only() {
        let author = actor(&[ROLE_CLIENT]);
        let own = response_on(Uuid::new_v4(), author.user_id);

        assert!(!ResponsePolicy::update(&author, &own));
        assert!(ResponsePolicy::update(&actor(&[ROLE_AGENT]), &own));
        assert!(ResponsePolicy::update(&actor(&[ROLE_ADMIN]), &own));
    }

    #[test]
    fn test_response_delete_denied_to_non_admin_author() {
        // The author keeps no deletion right unless they are an admin.
        let client_author = actor(&[ROLE_CLIENT]);
        let agent_author = actor(&[ROLE_AGENT]);

        assert!(!ResponsePolicy::delete(
            &client_author,
            &response_on(Uuid::new_v4(), client_author.user_id)
        ));
        assert!(!ResponsePolicy::delete(
            &agent_author,
            &response_on(Uuid::new_v4(), agent_author.user_id)
        ));
        assert!(ResponsePolicy::delete(
            &actor(&[ROLE_ADMIN]),
            &response_on(Uuid::new_v4(), Uuid::new_v4())
        ));
    }

    #[test]
    fn test_owner_without_client_role_still_views_own_ticket() {
        // View is ownership-or-staff, not ownership-and-client-role.
        let owner = actor(&[]);
        let own = ticket_of(owner.user_id, TicketStatus::Pending);
        assert!(TicketPolicy::view(&owner, &own));
    }

    #[test]
    fn test_multi_role_user_combines_rights() {
        let hybrid = actor(&[ROLE_CLIENT, ROLE_AGENT]);
        let ticket = ticket_of(Uuid::new_v4(), TicketStatus::Open);

        assert!(TicketPolicy::create(&hybrid));
        assert!(TicketPolicy::update(&hybrid, &ticket));
        assert!(TicketPolicy::view(&hybrid, &ticket));
        assert!(!TicketPolicy::delete(&hybrid, &ticket));
    }
}
