//! Roles held by the signed-in identity.

use std::collections::BTreeSet;
use std::sync::Arc;

use tokio::sync::watch;

use crate::error::{AayojanaError, AayojanaResult};
use crate::hooks::{Generation, Refresh};
use crate::identity::{AuthContext, UserId};
use crate::model::{NewUserRole, Role, UserRole};
use crate::remote::{self, Query, RemoteStore, Table};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolesState {
    pub roles: BTreeSet<Role>,
    pub loading: bool,
}

impl Default for RolesState {
    fn default() -> Self {
        RolesState {
            roles: BTreeSet::new(),
            loading: true,
        }
    }
}

/// Loads and caches the roles of the current identity.
///
/// A failed fetch leaves the identity with no roles, so "has no roles" and
/// "could not load roles" look the same from here.
pub struct RoleResolver<S: RemoteStore> {
    store: Arc<S>,
    auth: AuthContext,
    state: watch::Sender<RolesState>,
    generation: Generation,
}

impl<S: RemoteStore> RoleResolver<S> {
    pub fn new(store: Arc<S>, auth: AuthContext) -> Self {
        let (state, _) = watch::channel(RolesState::default());
        RoleResolver {
            store,
            auth,
            state,
            generation: Generation::default(),
        }
    }

    pub fn state(&self) -> RolesState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<RolesState> {
        self.state.subscribe()
    }

    pub fn roles(&self) -> BTreeSet<Role> {
        self.state.borrow().roles.clone()
    }

    pub fn loading(&self) -> bool {
        self.state.borrow().loading
    }

    /// Checks the last fetched set. Never fetches.
    pub fn has_role(&self, role: Role) -> bool {
        self.state.borrow().roles.contains(&role)
    }

    pub fn require_role(&self, role: Role) -> AayojanaResult<()> {
        if self.has_role(role) {
            Ok(())
        } else {
            Err(AayojanaError::RoleRequired(role))
        }
    }

    pub async fn refresh_roles(&self) {
        self.reload().await;
    }

    /// Fetch and publish the role set. Returns what this call fetched, which
    /// is not published if a newer fetch started in the meantime.
    async fn reload(&self) -> BTreeSet<Role> {
        let ticket = self.generation.next();

        let Some(user) = self.auth.current() else {
            self.publish(ticket, BTreeSet::new());
            return BTreeSet::new();
        };

        self.state.send_modify(|s| s.loading = true);

        let roles = match self.fetch_roles(&user).await {
            Ok(roles) => roles,
            Err(e) => {
                tracing::warn!(user = %user, error = %e, "Failed to load user roles");
                BTreeSet::new()
            }
        };

        self.publish(ticket, roles.clone());
        roles
    }

    /// Grant `role` to the current identity, then reload the role set.
    ///
    /// Returns the roles as fetched right after the insert. On a failed
    /// insert nothing local changes.
    pub async fn add_role(&self, role: Role) -> AayojanaResult<BTreeSet<Role>> {
        let user = self.auth.current().ok_or(AayojanaError::AuthRequired)?;

        let insert = Query::insert(
            Table::UserRoles,
            NewUserRole {
                user_id: user.clone(),
                role,
            },
        )?;
        remote::mutate(self.store.as_ref(), &insert).await?;
        tracing::debug!(user = %user, role = %role, "Granted role");

        Ok(self.reload().await)
    }

    async fn fetch_roles(&self, user: &UserId) -> AayojanaResult<BTreeSet<Role>> {
        let query = Query::from(Table::UserRoles).eq("user_id", user.as_str());
        let rows: Vec<UserRole> = remote::fetch(self.store.as_ref(), &query).await?;

        Ok(rows.into_iter().map(|r| r.role).collect())
    }

    fn publish(&self, ticket: u64, roles: BTreeSet<Role>) {
        if !self.generation.is_current(ticket) {
            tracing::debug!("Discarding stale roles response");
            return;
        }

        self.state.send_replace(RolesState {
            roles,
            loading: false,
        });
    }
}

impl<S: RemoteStore> Refresh for RoleResolver<S> {
    async fn refresh(&self) {
        self.refresh_roles().await
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use serde_json::json;

    use super::*;
    use crate::remote::{MemoryStore, RemoteError};

    fn resolver(store: &MemoryStore, auth: &AuthContext) -> RoleResolver<MemoryStore> {
        RoleResolver::new(Arc::new(store.clone()), auth.clone())
    }

    fn signed_in(user: &str) -> AuthContext {
        AuthContext::new(Some(UserId::from(user)))
    }

    #[tokio::test]
    async fn loads_roles_for_current_user_only() {
        let store = MemoryStore::new();
        store.seed(
            Table::UserRoles,
            [
                json!({"id": "1", "user_id": "u1", "role": "organizer"}),
                json!({"id": "2", "user_id": "u1", "role": "attendee"}),
                json!({"id": "3", "user_id": "u2", "role": "admin"}),
            ],
        );
        let roles = resolver(&store, &signed_in("u1"));
        assert!(roles.loading());

        roles.refresh_roles().await;

        assert!(!roles.loading());
        assert!(roles.has_role(Role::Organizer));
        assert!(roles.has_role(Role::Attendee));
        assert!(!roles.has_role(Role::Admin));
        assert!(roles.require_role(Role::Organizer).is_ok());
        assert!(matches!(
            roles.require_role(Role::Admin),
            Err(AayojanaError::RoleRequired(Role::Admin))
        ));
    }

    #[tokio::test]
    async fn user_without_rows_has_no_roles() {
        let store = MemoryStore::new();
        let roles = resolver(&store, &signed_in("u1"));

        roles.refresh_roles().await;

        assert!(!roles.loading());
        assert!(Role::ALL.iter().all(|r| !roles.has_role(*r)));
    }

    #[tokio::test]
    async fn anonymous_clears_roles_without_a_query() {
        let store = MemoryStore::new();
        store.seed(Table::UserRoles, [json!({"id": "1", "user_id": "u1", "role": "admin"})]);
        let auth = signed_in("u1");
        let roles = resolver(&store, &auth);

        roles.refresh_roles().await;
        assert!(roles.has_role(Role::Admin));

        auth.sign_out();
        roles.refresh_roles().await;

        assert!(roles.roles().is_empty());
        assert!(!roles.loading());
        assert_eq!(store.calls(Table::UserRoles), 1);
    }

    #[tokio::test]
    async fn fetch_failure_degrades_to_no_roles() {
        let store = MemoryStore::new();
        store.seed(Table::UserRoles, [json!({"id": "1", "user_id": "u1", "role": "admin"})]);
        let roles = resolver(&store, &signed_in("u1"));
        roles.refresh_roles().await;

        store.fail(Table::UserRoles, RemoteError::new("connection reset"));
        roles.refresh_roles().await;

        assert!(roles.roles().is_empty());
        assert!(!roles.loading());
    }

    #[tokio::test]
    async fn add_role_requires_identity() {
        let store = MemoryStore::new();
        store.seed(Table::UserRoles, [json!({"id": "1", "user_id": "u1", "role": "attendee"})]);
        let auth = signed_in("u1");
        let roles = resolver(&store, &auth);
        roles.refresh_roles().await;

        auth.sign_out();
        let result = roles.add_role(Role::Organizer).await;

        assert!(matches!(result, Err(AayojanaError::AuthRequired)));
        assert_eq!(roles.roles(), BTreeSet::from([Role::Attendee]));
        assert_eq!(store.rows(Table::UserRoles).len(), 1);
    }

    #[tokio::test]
    async fn add_role_inserts_then_refreshes() {
        let store = MemoryStore::new();
        let roles = resolver(&store, &signed_in("u1"));
        roles.refresh_roles().await;

        let granted = roles.add_role(Role::Organizer).await.unwrap();

        assert_eq!(granted, BTreeSet::from([Role::Organizer]));
        assert!(roles.has_role(Role::Organizer));
        assert_eq!(store.rows(Table::UserRoles)[0]["user_id"], "u1");
    }

    #[tokio::test]
    async fn failed_insert_keeps_existing_roles() {
        let store = MemoryStore::new();
        store.add_unique_constraint(Table::UserRoles, &["user_id", "role"]);
        store.seed(Table::UserRoles, [json!({"id": "1", "user_id": "u1", "role": "attendee"})]);
        let roles = resolver(&store, &signed_in("u1"));
        roles.refresh_roles().await;

        let result = roles.add_role(Role::Attendee).await;

        assert!(matches!(
            result,
            Err(AayojanaError::RemoteMutation { table: Table::UserRoles, .. })
        ));
        assert_eq!(roles.roles(), BTreeSet::from([Role::Attendee]));
    }

    #[tokio::test]
    async fn follows_sign_in_and_sign_out() {
        let store = MemoryStore::new();
        store.seed(Table::UserRoles, [json!({"id": "1", "user_id": "u1", "role": "admin"})]);
        let auth = AuthContext::anonymous();
        let roles = Arc::new(resolver(&store, &auth));
        let mut state = roles.subscribe();

        let task = crate::hooks::follow_identity(roles.clone(), &auth);
        state.wait_for(|s| !s.loading).await.unwrap();
        assert!(roles.roles().is_empty());

        auth.sign_in(UserId::from("u1"));
        state.wait_for(|s| s.roles.contains(&Role::Admin)).await.unwrap();

        auth.sign_out();
        state.wait_for(|s| s.roles.is_empty()).await.unwrap();

        task.abort();
    }

    #[tokio::test]
    async fn stale_response_does_not_overwrite_newer_identity() {
        let store = MemoryStore::new();
        store.seed(
            Table::UserRoles,
            [
                json!({"id": "1", "user_id": "slow", "role": "admin"}),
                json!({"id": "2", "user_id": "fast", "role": "attendee"}),
            ],
        );
        store.set_latency(Table::UserRoles, Duration::from_millis(50));
        let auth = signed_in("slow");
        let roles = Arc::new(resolver(&store, &auth));

        let slow = {
            let roles = roles.clone();
            tokio::spawn(async move { roles.refresh_roles().await })
        };
        tokio::time::sleep(Duration::from_millis(10)).await;

        store.set_latency(Table::UserRoles, Duration::ZERO);
        auth.sign_in(UserId::from("fast"));
        roles.refresh_roles().await;
        slow.await.unwrap();

        assert_eq!(roles.roles(), BTreeSet::from([Role::Attendee]));
    }
}
