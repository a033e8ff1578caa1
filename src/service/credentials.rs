// Credvault - Credential Service
//
// Composes normalization, the permission guard, the credential store and the
// sharing ledger into the operations callers use. Collaborators arrive
// through the constructor; the service holds no other state.

use chrono::{SubsecRound, Utc};
use uuid::Uuid;

use crate::access::{authorize, Actor};
use crate::credential::{
    normalize, Credential, CredentialError, CredentialInput, CredentialSummary, Page, SharingGrant,
};
use crate::store::{CredentialStore, PageRequest, Scope, SharingLedger};

/// Page size applied when a request asks for zero rows.
pub const DEFAULT_PAGE_SIZE: u32 = 10;

pub struct CredentialService<S, L> {
    store: S,
    ledger: L,
    default_page_size: u32,
}

impl<S, L> CredentialService<S, L>
where
    S: CredentialStore,
    L: SharingLedger,
{
    pub fn new(store: S, ledger: L) -> Self {
        Self {
            store,
            ledger,
            default_page_size: DEFAULT_PAGE_SIZE,
        }
    }

    pub fn with_default_page_size(mut self, page_size: u32) -> Self {
        self.default_page_size = page_size.max(1);
        self
    }

    /// Every credential the actor may see. No pagination.
    pub fn list_all(&self, actor: &Actor) -> Result<Vec<Credential>, CredentialError> {
        let scope = self.scope_for(actor)?;
        Ok(self.store.find_all(&scope)?)
    }

    /// Store a new credential owned by the actor.
    pub fn create(&self, actor: &Actor, input: &CredentialInput) -> Result<Credential, CredentialError> {
        let secret = normalize(&input.fields)?;

        let credential = Credential {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            owner: actor.id.clone(),
            secret,
            // Storage keeps microseconds; return exactly what was stored.
            created: Utc::now().trunc_subsecs(6),
        };
        self.store.create(&credential)?;

        Ok(credential)
    }

    /// One page of secret-free summaries visible to the actor.
    pub fn page(&self, actor: &Actor, request: PageRequest) -> Result<Page<CredentialSummary>, CredentialError> {
        let scope = self.scope_for(actor)?;
        let query = request.into_query(scope, self.default_page_size);
        Ok(self.store.find_page(&query)?)
    }

    /// Re-normalize and replace a credential's name and secret fields.
    ///
    /// An empty `name` keeps the stored name. Owner and creation time are
    /// never touched.
    pub fn update_by_id(&self, actor: &Actor, id: &Uuid, input: &CredentialInput) -> Result<(), CredentialError> {
        let existing = self.resolve(id)?;
        authorize(actor, &existing.owner)?;

        let secret = normalize(&input.fields)?;
        let name = if input.name.is_empty() {
            existing.name.as_str()
        } else {
            input.name.as_str()
        };

        if !self.store.update_by_id(id, name, &secret)? {
            return Err(CredentialError::not_found(id));
        }

        Ok(())
    }

    /// Delete each id of a comma-separated list, purging its grants.
    ///
    /// Ids are processed in order and processing stops at the first failure.
    /// Each credential goes together with its grants or not at all; earlier
    /// ids stay deleted when a later one fails.
    pub fn delete_by_ids(&self, actor: &Actor, ids: &str) -> Result<Vec<Uuid>, CredentialError> {
        let mut deleted = Vec::new();

        for raw in ids.split(',').map(str::trim).filter(|s| !s.is_empty()) {
            match self.delete_one(actor, raw) {
                Ok(id) => deleted.push(id),
                Err(err) if deleted.is_empty() => return Err(err),
                Err(err) => {
                    tracing::warn!(
                        actor = %actor.id,
                        failed = %raw,
                        deleted = deleted.len(),
                        "Bulk credential delete aborted"
                    );
                    return Err(CredentialError::PartialDelete {
                        deleted,
                        failed: raw.to_string(),
                        source: Box::new(err),
                    });
                }
            }
        }

        Ok(deleted)
    }

    fn delete_one(&self, actor: &Actor, raw: &str) -> Result<Uuid, CredentialError> {
        let id = Uuid::parse_str(raw).map_err(|_| CredentialError::not_found(raw))?;

        self.store.atomically(|| {
            let existing = self.resolve(&id)?;
            authorize(actor, &existing.owner)?;

            if !self.store.delete_by_id(&id)? {
                return Err(CredentialError::not_found(id));
            }
            self.ledger.delete_by_credential(&id)?;
            Ok(())
        })?;

        Ok(id)
    }

    /// Fetch a credential with its raw secret fields.
    pub fn get_by_id(&self, actor: &Actor, id: &Uuid) -> Result<Credential, CredentialError> {
        let credential = self.resolve(id)?;
        authorize(actor, &credential.owner)?;
        Ok(credential)
    }

    /// Hand a credential to another account. Only `owner` changes.
    /// A blank owner is rejected.
    pub fn change_owner(&self, actor: &Actor, id: &Uuid, new_owner: &str) -> Result<(), CredentialError> {
        let new_owner = account_name("owner", new_owner)?;
        let existing = self.resolve(id)?;
        authorize(actor, &existing.owner)?;

        if !self.store.update_owner(id, new_owner)? {
            return Err(CredentialError::not_found(id));
        }

        Ok(())
    }

    /// Let `grantee` use a credential it does not own.
    pub fn share(&self, actor: &Actor, id: &Uuid, grantee: &str) -> Result<bool, CredentialError> {
        let grantee = account_name("grantee", grantee)?;
        let existing = self.resolve(id)?;
        authorize(actor, &existing.owner)?;
        Ok(self.ledger.grant(id, grantee)?)
    }

    /// Grants currently attached to a credential.
    pub fn grants(&self, actor: &Actor, id: &Uuid) -> Result<Vec<SharingGrant>, CredentialError> {
        let existing = self.resolve(id)?;
        authorize(actor, &existing.owner)?;
        Ok(self.ledger.grants_for(id)?)
    }

    fn resolve(&self, id: &Uuid) -> Result<Credential, CredentialError> {
        self.store
            .find_by_id(id)?
            .ok_or_else(|| CredentialError::not_found(id))
    }

    fn scope_for(&self, actor: &Actor) -> Result<Scope, CredentialError> {
        if actor.is_privileged() {
            return Ok(Scope::All);
        }

        Ok(Scope::Accessible {
            account: actor.id.clone(),
            shared: self.ledger.shared_with(&actor.id)?,
        })
    }
}

/// Trimmed account name, or `InvalidArgument` if nothing is left.
fn account_name<'a>(what: &str, raw: &'a str) -> Result<&'a str, CredentialError> {
    match raw.trim() {
        "" => Err(CredentialError::InvalidArgument(format!("{} must not be blank", what))),
        name => Ok(name),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credential::{CredentialFields, CredentialSecret};
    use crate::store::{Database, SqliteCredentialStore, SqliteSharingLedger};
    use pretty_assertions::assert_eq;

    type SqliteService<'a> = CredentialService<SqliteCredentialStore<'a>, SqliteSharingLedger<'a>>;

    fn service(db: &Database) -> SqliteService<'_> {
        CredentialService::new(SqliteCredentialStore::new(db), SqliteSharingLedger::new(db))
    }

    fn input(name: &str, kind: &str, username: &str, password: &str, private_key: &str, passphrase: &str) -> CredentialInput {
        CredentialInput::new(
            name,
            CredentialFields {
                kind: kind.to_string(),
                username: username.to_string(),
                password: password.to_string(),
                private_key: private_key.to_string(),
                passphrase: passphrase.to_string(),
            },
        )
    }

    fn stored_fields(db: &Database, id: &Uuid) -> (String, String, String, String) {
        db.conn()
            .query_row(
                "SELECT username, password, private_key, passphrase FROM credentials WHERE id = ?1",
                [id.to_string()],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
            )
            .unwrap()
    }

    fn count(db: &Database, table: &str) -> i64 {
        db.conn()
            .query_row(&format!("SELECT count(*) FROM {table}"), [], |row| row.get(0))
            .unwrap()
    }

    #[test]
    fn test_create_custom_with_empty_fields_stores_sentinels() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);

        let cred = svc.create(&Actor::user("alice"), &input("web", "custom", "", "", "", "")).unwrap();

        assert_eq!(cred.owner, "alice");
        assert_eq!(
            stored_fields(&db, &cred.id),
            ("-".to_string(), "-".to_string(), "-".to_string(), "-".to_string())
        );
    }

    #[test]
    fn test_create_private_key_keeps_only_the_key() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);

        let cred = svc
            .create(&Actor::user("alice"), &input("git", "private-key", "", "", "key123", ""))
            .unwrap();

        assert_eq!(
            stored_fields(&db, &cred.id),
            ("-".to_string(), "-".to_string(), "key123".to_string(), "-".to_string())
        );
    }

    #[test]
    fn test_create_with_bogus_type_persists_nothing() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);

        let err = svc
            .create(&Actor::user("alice"), &input("x", "bogus", "u", "p", "", ""))
            .unwrap_err();

        assert!(matches!(err, CredentialError::InvalidCredentialType(ref t) if t == "bogus"));
        assert_eq!(count(&db, "credentials"), 0);
    }

    #[test]
    fn test_stranger_cannot_get_by_id() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let cred = svc.create(&Actor::user("alice"), &input("web", "custom", "u", "p", "", "")).unwrap();

        let err = svc.get_by_id(&Actor::user("bob"), &cred.id).unwrap_err();
        assert!(matches!(err, CredentialError::PermissionDenied(_)));

        let err = svc.get_by_id(&Actor::user("bob"), &Uuid::new_v4()).unwrap_err();
        assert!(matches!(err, CredentialError::NotFound(_)));
    }

    #[test]
    fn test_admin_gets_raw_values() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let cred = svc
            .create(&Actor::user("alice"), &input("web", "custom", "root", "toor", "", ""))
            .unwrap();

        let fetched = svc.get_by_id(&Actor::admin("root"), &cred.id).unwrap();
        assert_eq!(
            fetched.secret,
            CredentialSecret::Custom {
                username: Some("root".to_string()),
                password: Some("toor".to_string()),
            }
        );
    }

    #[test]
    fn test_update_checks_existence_then_permission_then_type() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let cred = svc.create(&alice, &input("web", "custom", "u", "p", "", "")).unwrap();
        let bogus = input("web", "bogus", "", "", "", "");

        let err = svc.update_by_id(&alice, &Uuid::new_v4(), &bogus).unwrap_err();
        assert!(matches!(err, CredentialError::NotFound(_)));

        let err = svc.update_by_id(&Actor::user("bob"), &cred.id, &bogus).unwrap_err();
        assert!(matches!(err, CredentialError::PermissionDenied(_)));

        let err = svc.update_by_id(&alice, &cred.id, &bogus).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidCredentialType(_)));

        let unchanged = svc.get_by_id(&alice, &cred.id).unwrap();
        assert_eq!(unchanged, cred);
    }

    #[test]
    fn test_update_switches_type_and_keeps_name_when_blank() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let cred = svc.create(&alice, &input("web", "custom", "u", "p", "", "")).unwrap();

        svc.update_by_id(&alice, &cred.id, &input("", "private-key", "deploy", "p", "KEY", ""))
            .unwrap();

        let updated = svc.get_by_id(&alice, &cred.id).unwrap();
        assert_eq!(updated.name, "web");
        assert_eq!(updated.owner, "alice");
        assert_eq!(updated.created, cred.created);
        assert_eq!(
            stored_fields(&db, &cred.id),
            ("deploy".to_string(), "-".to_string(), "KEY".to_string(), "-".to_string())
        );
    }

    #[test]
    fn test_delete_purges_all_grants() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let cred = svc.create(&alice, &input("web", "custom", "u", "p", "", "")).unwrap();
        for grantee in ["bob", "carol", "dave"] {
            svc.share(&alice, &cred.id, grantee).unwrap();
        }
        assert_eq!(count(&db, "sharing_grants"), 3);

        let deleted = svc.delete_by_ids(&alice, &cred.id.to_string()).unwrap();

        assert_eq!(deleted, vec![cred.id]);
        assert_eq!(count(&db, "credentials"), 0);
        assert_eq!(count(&db, "sharing_grants"), 0);
    }

    #[test]
    fn test_bulk_delete_stops_at_missing_id() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let first = svc.create(&alice, &input("a", "custom", "u", "p", "", "")).unwrap();
        let third = svc.create(&alice, &input("c", "custom", "u", "p", "", "")).unwrap();
        svc.share(&alice, &first.id, "bob").unwrap();
        let missing = Uuid::new_v4();

        let ids = format!("{}, {},{}", first.id, missing, third.id);
        let err = svc.delete_by_ids(&alice, &ids).unwrap_err();

        match &err {
            CredentialError::PartialDelete { deleted, failed, .. } => {
                assert_eq!(deleted, &vec![first.id]);
                assert_eq!(failed, &missing.to_string());
            }
            other => panic!("Expected PartialDelete, got {other:?}"),
        }
        assert!(matches!(err.root_cause(), CredentialError::NotFound(_)));

        assert!(svc.get_by_id(&alice, &first.id).is_err());
        assert!(svc.get_by_id(&alice, &third.id).is_ok(), "Ids after the failure are untouched");
        assert_eq!(count(&db, "sharing_grants"), 0);
    }

    #[test]
    fn test_delete_failing_on_first_id_returns_plain_error() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let cred = svc.create(&Actor::user("alice"), &input("a", "custom", "u", "p", "", "")).unwrap();

        let err = svc.delete_by_ids(&Actor::user("bob"), &cred.id.to_string()).unwrap_err();
        assert!(matches!(err, CredentialError::PermissionDenied(_)));

        let err = svc.delete_by_ids(&Actor::user("alice"), "not-a-uuid").unwrap_err();
        assert!(matches!(err, CredentialError::NotFound(ref id) if id == "not-a-uuid"));
    }

    #[test]
    fn test_change_owner_transfers_authority() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let bob = Actor::user("bob");
        let cred = svc.create(&alice, &input("web", "custom", "u", "p", "", "")).unwrap();

        let err = svc.change_owner(&bob, &cred.id, "bob").unwrap_err();
        assert!(matches!(err, CredentialError::PermissionDenied(_)));

        svc.change_owner(&alice, &cred.id, "bob").unwrap();

        let moved = svc.get_by_id(&bob, &cred.id).unwrap();
        assert_eq!(moved.owner, "bob");
        assert_eq!(moved.secret, cred.secret);
        assert!(matches!(
            svc.get_by_id(&alice, &cred.id).unwrap_err(),
            CredentialError::PermissionDenied(_)
        ));
    }

    #[rstest::rstest]
    #[case("")]
    #[case("   ")]
    fn test_change_owner_rejects_blank_owner(#[case] owner: &str) {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let cred = svc.create(&alice, &input("web", "custom", "u", "p", "", "")).unwrap();

        let err = svc.change_owner(&alice, &cred.id, owner).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidArgument(_)));

        assert_eq!(svc.get_by_id(&alice, &cred.id).unwrap().owner, "alice");
        assert_eq!(svc.list_all(&alice).unwrap().len(), 1);
    }

    #[test]
    fn test_change_owner_trims_new_owner() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let cred = svc.create(&alice, &input("web", "custom", "u", "p", "", "")).unwrap();

        svc.change_owner(&alice, &cred.id, "  bob ").unwrap();
        assert_eq!(svc.get_by_id(&Actor::user("bob"), &cred.id).unwrap().owner, "bob");
    }

    #[rstest::rstest]
    #[case("")]
    #[case("\t ")]
    fn test_share_rejects_blank_grantee(#[case] grantee: &str) {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let cred = svc.create(&alice, &input("web", "custom", "u", "p", "", "")).unwrap();

        let err = svc.share(&alice, &cred.id, grantee).unwrap_err();
        assert!(matches!(err, CredentialError::InvalidArgument(_)));
        assert_eq!(count(&db, "sharing_grants"), 0);
    }

    #[test]
    fn test_listing_includes_shared_credentials() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db);
        let alice = Actor::user("alice");
        let bob = Actor::user("bob");
        let shared = svc.create(&alice, &input("shared", "custom", "u", "p", "", "")).unwrap();
        svc.create(&alice, &input("private", "custom", "u", "p", "", "")).unwrap();
        svc.create(&bob, &input("own", "custom", "u", "p", "", "")).unwrap();
        svc.share(&alice, &shared.id, "bob").unwrap();

        let names: Vec<String> = svc.list_all(&bob).unwrap().into_iter().map(|c| c.name).collect();
        assert_eq!(names, vec!["shared", "own"]);

        let page = svc.page(&bob, PageRequest::from_params("", "", "", "", "")).unwrap();
        assert_eq!(page.total, 2);

        assert_eq!(svc.list_all(&Actor::admin("root")).unwrap().len(), 3);

        // Sharing grants visibility, not authority.
        assert!(matches!(
            svc.get_by_id(&bob, &shared.id).unwrap_err(),
            CredentialError::PermissionDenied(_)
        ));
    }

    #[test]
    fn test_page_uses_configured_default_size() {
        let db = Database::open_in_memory().unwrap();
        let svc = service(&db).with_default_page_size(2);
        let alice = Actor::user("alice");
        for name in ["a", "b", "c"] {
            svc.create(&alice, &input(name, "custom", "", "", "", "")).unwrap();
        }

        let page = svc.page(&alice, PageRequest::from_params("x", "", "", "", "")).unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.items.len(), 2);
    }
}
