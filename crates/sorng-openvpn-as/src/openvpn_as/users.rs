//! User account management: lookup, provisioning with rollback, deletion,
//! client records and connection profiles.
//!
//! Every method is an independent sequence of `sacli` round trips; nothing
//! is cached between calls. Intermediate states are visible to other
//! administrators while a workflow runs.

use crate::openvpn_as::error::{AccessServerError, AccessServerResult};
use crate::openvpn_as::fault::translate_fault;
use crate::openvpn_as::groups::require_group;
use crate::openvpn_as::password::legacy_password_digest;
use crate::openvpn_as::profile::{GroupRef, ProfileProperties, UserProfile, UserRef};
use crate::openvpn_as::sacli::{fetch_one, is_group_type, RemoteSacli};
use crate::openvpn_as::types::*;
use log::{debug, error, info, warn};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Creation request
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Parameters of [`UserOperations::create_new_user`].
#[derive(Clone)]
pub struct NewUserRequest {
    /// Local password; must satisfy the server's complexity rules.
    pub password: Option<String>,
    /// Connection group to join. Must exist.
    pub group: Option<GroupRef>,
    /// Generate a certificate and client record. Without one the user
    /// cannot connect.
    pub generate_client: bool,
    pub options: UserOptions,
}

impl Default for NewUserRequest {
    fn default() -> Self {
        Self {
            password: None,
            group: None,
            generate_client: true,
            options: UserOptions::default(),
        }
    }
}

impl fmt::Debug for NewUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewUserRequest")
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("group", &self.group.as_ref().map(GroupRef::group_name))
            .field("generate_client", &self.generate_client)
            .field("options", &self.options)
            .finish()
    }
}

impl NewUserRequest {
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn with_group(mut self, group: impl Into<GroupRef>) -> Self {
        self.group = Some(group.into());
        self
    }

    pub fn with_options(mut self, options: UserOptions) -> Self {
        self.options = options;
        self
    }

    pub fn without_client(mut self) -> Self {
        self.generate_client = false;
        self
    }

    /// Build a request from a loosely-typed object with the keys
    /// `password`, `group`, `generate_client` and the `prop_*` flags.
    pub fn from_json(map: &Map<String, Value>) -> AccessServerResult<Self> {
        let mut request = Self {
            options: UserOptions::from_json(map)?,
            ..Default::default()
        };
        match map.get("password") {
            None | Some(Value::Null) => {}
            Some(Value::String(p)) => request.password = Some(p.clone()),
            Some(other) => {
                return Err(AccessServerError::InvalidArgument(format!(
                    "expected str for 'password', got {}",
                    json_kind(other)
                )))
            }
        }
        match map.get("group") {
            None | Some(Value::Null) => {}
            Some(v) => request.group = Some(GroupRef::from_json(v)?),
        }
        match map.get("generate_client") {
            None | Some(Value::Null) => {}
            Some(Value::Bool(b)) => request.generate_client = *b,
            Some(other) => {
                return Err(AccessServerError::InvalidArgument(format!(
                    "expected bool for 'generate_client', got {}",
                    json_kind(other)
                )))
            }
        }
        Ok(request)
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Operations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The operations we can perform on users of one Access Server.
#[derive(Clone)]
pub struct UserOperations {
    sacli: Arc<dyn RemoteSacli>,
}

impl UserOperations {
    pub fn new(sacli: Arc<dyn RemoteSacli>) -> Self {
        Self { sacli }
    }

    /// Fetch a user.
    ///
    /// `ProfileNotFound` when nothing exists under the name, `ProfileExists`
    /// when the name belongs to a group.
    pub async fn get_user(&self, user: impl Into<UserRef>) -> AccessServerResult<UserProfile> {
        let user = user.into();
        let username = user.username();
        debug!("get_user({})", username);

        let properties = fetch_one(self.sacli.as_ref(), username)
            .await?
            .ok_or_else(|| {
                AccessServerError::ProfileNotFound(format!(
                    "Could not find profile for \"{}\"",
                    username
                ))
            })?;
        if is_group_type(&properties) {
            return Err(AccessServerError::ProfileExists(format!(
                "\"{}\" is the name of a group, not a user",
                username
            )));
        }
        UserProfile::new(username, properties)
    }

    /// Create a user with a local password.
    ///
    /// All checks run before the first write. Writes then happen one
    /// property at a time; if any of them (or the password or client
    /// generation) fails, every property of the half-built user is deleted
    /// and the cause is returned inside `ProfileCreate`. Properties of a
    /// supplied [`UserProfile`] are applied first and may be overridden by
    /// the request's group and options. The returned profile is re-read
    /// from the server.
    pub async fn create_new_user(
        &self,
        user: impl Into<UserRef>,
        request: NewUserRequest,
    ) -> AccessServerResult<UserProfile> {
        let user = user.into();
        let username = user.username().to_string();
        debug!("create_new_user({}, {:?})", username, request);

        if !self.sacli.local_auth_enabled().await? {
            return Err(AccessServerError::Config(
                "Creating a user with local password requires local auth to be enabled on the server"
                    .into(),
            ));
        }

        if fetch_one(self.sacli.as_ref(), &username).await?.is_some() {
            return Err(AccessServerError::ProfileExists(format!(
                "Profile for \"{}\" already exists on the server",
                username
            )));
        }

        let mut pending: Vec<(&'static str, String)> = Vec::new();
        if let Some(group) = &request.group {
            let group_name = group.group_name();
            require_group(self.sacli.as_ref(), group_name).await?;
            debug!("Got group \"{}\"", group_name);
            pending.push((PROP_CONN_GROUP, group_name.to_string()));
        }
        pending.extend(request.options.to_properties());

        info!("Creating user \"{}\"", username);
        let applied = self
            .apply_new_user(
                &user,
                &username,
                &pending,
                request.password.as_deref(),
                request.generate_client,
            )
            .await;
        if let Err(cause) = applied {
            error!(
                "Could not create profile \"{}\" ({}), aborting and deleting profile...",
                username, cause
            );
            if let Err(e) = self.sacli.user_prop_del_all(&username).await {
                warn!(
                    "Rollback of \"{}\" failed: {}",
                    username,
                    translate_fault(e)
                );
            }
            return Err(AccessServerError::create_failed(&username, cause));
        }

        debug!("Fetching created profile \"{}\" for return", username);
        let properties = fetch_one(self.sacli.as_ref(), &username)
            .await?
            .ok_or_else(|| {
                AccessServerError::create_failed(
                    &username,
                    AccessServerError::ProfileNotFound(format!(
                        "\"{}\" missing right after creation",
                        username
                    )),
                )
            })?;
        UserProfile::new(username, properties)
    }

    async fn apply_new_user(
        &self,
        user: &UserRef,
        username: &str,
        pending: &[(&'static str, String)],
        password: Option<&str>,
        generate_client: bool,
    ) -> AccessServerResult<()> {
        self.sacli
            .user_prop_put(username, PROP_TYPE, Value::from(ProfileType::UserConnect.as_str()))
            .await?;

        if let UserRef::Profile(profile) = user {
            for (key, value) in profile.properties() {
                debug!("Setting property \"{}\" on profile \"{}\"", key, username);
                self.sacli
                    .user_prop_put(username, key, value.clone())
                    .await?;
            }
        }

        for (key, value) in pending {
            debug!("Setting property \"{}\" on profile \"{}\"", key, username);
            self.sacli
                .user_prop_put(username, key, Value::from(value.as_str()))
                .await?;
        }

        if let Some(password) = password {
            debug!("Setting password on profile \"{}\"", username);
            self.set_password(username, password).await?;
        }

        if generate_client {
            self.create_client_for_user(username).await?;
        }
        Ok(())
    }

    /// `SetLocalPassword`, or the digest property on servers without it.
    async fn set_password(&self, username: &str, password: &str) -> AccessServerResult<()> {
        let err = match self.sacli.set_local_password(username, password, "").await {
            Ok(()) => return Ok(()),
            Err(e) => translate_fault(e),
        };
        if !matches!(err, AccessServerError::Parameter) {
            return Err(err);
        }

        warn!("Server does not use SetLocalPassword, setting password manually using SHA256 hash");
        if !self.sacli.is_password_complex(password) {
            return Err(AccessServerError::PasswordComplexity(format!(
                "password for \"{}\" rejected by local complexity check",
                username
            )));
        }
        self.sacli
            .user_prop_put(
                username,
                PROP_PASSWORD_DIGEST,
                Value::from(legacy_password_digest(password)),
            )
            .await?;
        Ok(())
    }

    /// Generate a client record (certificate + connection profile).
    ///
    /// `ClientExists` without touching the server if one is already there.
    /// A generation call that reports success but leaves no client behind
    /// is a `ClientCreate` error.
    pub async fn create_client_for_user(&self, user: impl Into<UserRef>) -> AccessServerResult<()> {
        let user = user.into();
        let username = user.username();
        debug!("create_client_for_user({})", username);

        self.get_user(username).await?;

        if self.sacli.enum_clients().await?.contains(username) {
            return Err(AccessServerError::ClientExists(format!(
                "Client record already exists for \"{}\"",
                username
            )));
        }

        self.sacli.auto_generate_on_behalf_of(username).await?;
        if !self.sacli.enum_clients().await?.contains(username) {
            return Err(AccessServerError::ClientCreate(format!(
                "Creation of client record for \"{}\" failed for an unknown reason. \
                 New client not present on server despite no returned error",
                username
            )));
        }
        info!("Generated client record for \"{}\"", username);
        Ok(())
    }

    /// Revoke the user's certificates and delete all of its properties,
    /// then confirm the profile is gone.
    pub async fn delete_user(&self, user: impl Into<UserRef>) -> AccessServerResult<()> {
        let user = user.into();
        let username = user.username();
        debug!("delete_user({})", username);

        match fetch_one(self.sacli.as_ref(), username).await? {
            None => {
                return Err(AccessServerError::ProfileNotFound(format!(
                    "User \"{}\" does not exist",
                    username
                )))
            }
            Some(properties) if is_group_type(&properties) => {
                return Err(AccessServerError::ProfileExists(format!(
                    "Profile \"{}\" is a group, not a user",
                    username
                )))
            }
            Some(_) => {}
        }

        self.sacli.revoke_user(username).await?;
        self.sacli.user_prop_del_all(username).await?;

        if fetch_one(self.sacli.as_ref(), username).await?.is_some() {
            return Err(AccessServerError::ProfileDelete(format!(
                "Could not delete profile \"{}\" for an unknown reason",
                username
            )));
        }
        info!("Deleted user \"{}\"", username);
        Ok(())
    }

    /// The user-login `.ovpn` profile. Uses the read-only `Get1`, so a
    /// missing profile is reported instead of being generated.
    pub async fn get_user_login_ovpn_config(
        &self,
        user: impl Into<UserRef>,
    ) -> AccessServerResult<String> {
        let user = user.into();
        let username = user.username();
        debug!("get_user_login_ovpn_config({})", username);

        self.get_user(username).await?;

        match self.sacli.get1(username).await? {
            Some(profile) if !profile.content.is_empty() => Ok(profile.content),
            _ => Err(AccessServerError::ProfileNotFound(format!(
                "Connection profile for user \"{}\" could not be found on the server.",
                username
            ))),
        }
    }

    /// Revoke all certificates for the user. The result is not re-checked.
    pub async fn revoke_user_certificates(&self, user: impl Into<UserRef>) -> AccessServerResult<()> {
        let user = user.into();
        let username = user.username();
        debug!("revoke_user_certificates({})", username);

        self.get_user(username).await?;
        self.sacli.revoke_user(username).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::openvpn_as::fault::Fault;
    use crate::openvpn_as::sacli::{SacliCall, SimulatedSacli};
    use serde_json::json;
    use std::error::Error as _;

    fn ops(sim: &Arc<SimulatedSacli>) -> UserOperations {
        UserOperations::new(sim.clone())
    }

    fn props(v: Value) -> PropertyMap {
        serde_json::from_value(v).unwrap()
    }

    fn puts_for(journal: &[SacliCall], user: &str) -> Vec<(String, Value)> {
        journal
            .iter()
            .filter_map(|c| match c {
                SacliCall::UserPropPut { name, key, value } if name == user => {
                    Some((key.clone(), value.clone()))
                }
                _ => None,
            })
            .collect()
    }

    // ── get_user ─────────────────────────────────────────────────

    #[tokio::test]
    async fn get_user_not_found() {
        let sim = SimulatedSacli::new();
        assert!(matches!(
            ops(&sim).get_user("alice").await,
            Err(AccessServerError::ProfileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn get_user_on_group_is_wrong_kind() {
        let sim = SimulatedSacli::new();
        sim.insert_group("alice").await;
        assert!(matches!(
            ops(&sim).get_user("alice").await,
            Err(AccessServerError::ProfileExists(_))
        ));
    }

    #[tokio::test]
    async fn get_user_accepts_profile_reference() {
        let sim = SimulatedSacli::new();
        sim.insert_user("alice").await;
        let first = ops(&sim).get_user("alice").await.unwrap();
        let again = ops(&sim).get_user(&first).await.unwrap();
        assert_eq!(first, again);
    }

    #[tokio::test]
    async fn get_user_translates_faults() {
        let sim = SimulatedSacli::new();
        sim.fail_method("UserPropGet", Fault::new(9007, "denied")).await;
        assert!(matches!(
            ops(&sim).get_user("alice").await,
            Err(AccessServerError::Auth)
        ));
    }

    // ── create_new_user ──────────────────────────────────────────

    #[tokio::test]
    async fn create_requires_local_auth() {
        let sim = SimulatedSacli::new();
        sim.set_local_auth(false).await;
        let err = ops(&sim)
            .create_new_user("bob", NewUserRequest::default().with_password("Str0ng!Pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessServerError::Config(_)));
        assert!(!sim.journal().await.iter().any(SacliCall::is_mutation));
    }

    #[tokio::test]
    async fn create_rejects_existing_user_or_group() {
        let sim = SimulatedSacli::new();
        sim.insert_user("bob").await;
        sim.insert_group("sales").await;
        for name in ["bob", "sales"] {
            let err = ops(&sim)
                .create_new_user(name, NewUserRequest::default())
                .await
                .unwrap_err();
            assert!(matches!(err, AccessServerError::ProfileExists(_)), "{name}");
        }
        assert!(!sim.journal().await.iter().any(SacliCall::is_mutation));
    }

    #[tokio::test]
    async fn create_with_missing_group_mutates_nothing() {
        let sim = SimulatedSacli::new();
        let err = ops(&sim)
            .create_new_user("bob", NewUserRequest::default().with_group("sales"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessServerError::ProfileNotFound(_)));
        assert!(!sim.journal().await.iter().any(SacliCall::is_mutation));
        assert!(sim.profile("bob").await.is_none());
    }

    #[tokio::test]
    async fn create_with_user_as_group_is_wrong_kind() {
        let sim = SimulatedSacli::new();
        sim.insert_user("carol").await;
        let err = ops(&sim)
            .create_new_user("bob", NewUserRequest::default().with_group("carol"))
            .await
            .unwrap_err();
        assert!(matches!(err, AccessServerError::ProfileExists(_)));
        assert!(!sim.journal().await.iter().any(SacliCall::is_mutation));
    }

    #[tokio::test]
    async fn create_applies_properties_in_order() {
        let sim = SimulatedSacli::new();
        sim.insert_group("sales").await;
        let request = NewUserRequest::default()
            .with_group("sales")
            .with_options(UserOptions {
                superuser: Some(true),
                pwd_strength: Some(false),
                ..Default::default()
            })
            .without_client();

        let user = ops(&sim).create_new_user("bob", request).await.unwrap();

        let puts = puts_for(&sim.journal().await, "bob");
        assert_eq!(
            puts,
            vec![
                ("type".to_string(), json!("user_connect")),
                ("conn_group".to_string(), json!("sales")),
                ("prop_superuser".to_string(), json!("true")),
                ("prop_pwd_strength".to_string(), json!("false")),
            ]
        );
        assert_eq!(user.username, "bob");
        assert!(user.is_admin().unwrap());
        assert!(!user.will_check_password_strength().unwrap());
        assert!(!sim.has_client("bob").await);
    }

    #[tokio::test]
    async fn create_from_profile_applies_its_properties() {
        let sim = SimulatedSacli::new();
        let template = UserProfile::new(
            "dave",
            props(json!({ "type": "user_connect_hidden", "prop_autologin": "true" })),
        )
        .unwrap();
        let user = ops(&sim)
            .create_new_user(template, NewUserRequest::default().without_client())
            .await
            .unwrap();
        assert_eq!(user.profile_type(), ProfileType::UserConnectHidden);
        assert!(user.can_autologin().unwrap());
        let puts = puts_for(&sim.journal().await, "dave");
        assert_eq!(puts[0], ("type".to_string(), json!("user_connect")));
    }

    #[tokio::test]
    async fn create_sets_password_and_client() {
        let sim = SimulatedSacli::new();
        let user = ops(&sim)
            .create_new_user("bob", NewUserRequest::default().with_password("Str0ng!Pass"))
            .await
            .unwrap();
        assert_eq!(user.username, "bob");
        assert_eq!(sim.password_of("bob").await.as_deref(), Some("Str0ng!Pass"));
        assert!(sim.has_client("bob").await);
        assert!(user.get_prop(PROP_PASSWORD_DIGEST).is_err());
    }

    #[tokio::test]
    async fn create_falls_back_to_digest_on_legacy_server() {
        let sim = SimulatedSacli::new();
        sim.set_legacy_password(true).await;
        let user = ops(&sim)
            .create_new_user(
                "bob",
                NewUserRequest::default()
                    .with_password("Str0ng!Pass")
                    .without_client(),
            )
            .await
            .unwrap();
        assert_eq!(
            user.prop_str(PROP_PASSWORD_DIGEST).unwrap(),
            Some(legacy_password_digest("Str0ng!Pass").as_str())
        );
    }

    #[tokio::test]
    async fn legacy_weak_password_rolls_back() {
        let sim = SimulatedSacli::new();
        sim.set_legacy_password(true).await;
        let err = ops(&sim)
            .create_new_user("bob", NewUserRequest::default().with_password("weak"))
            .await
            .unwrap_err();
        match err {
            AccessServerError::ProfileCreate { source, .. } => {
                assert!(matches!(*source, AccessServerError::PasswordComplexity(_)))
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(sim.profile("bob").await.is_none());
    }

    #[tokio::test]
    async fn other_password_faults_are_not_retried() {
        let sim = SimulatedSacli::new();
        sim.fail_method(
            "SetLocalPassword",
            Fault::new(9000, "XMLRPCRelay: exceptions.ValueError: too short"),
        )
        .await;
        let err = ops(&sim)
            .create_new_user("bob", NewUserRequest::default().with_password("x"))
            .await
            .unwrap_err();
        let source = err.source().unwrap().to_string();
        assert!(source.contains("too short"));
        assert!(!puts_for(&sim.journal().await, "bob")
            .iter()
            .any(|(k, _)| k == PROP_PASSWORD_DIGEST));
        assert!(sim.profile("bob").await.is_none());
    }

    #[tokio::test]
    async fn failure_mid_create_rolls_back() {
        let sim = SimulatedSacli::new();
        sim.insert_group("sales").await;
        sim.fail_nth_put(3, Fault::new(9000, "XMLRPC: internal error")).await;
        let request = NewUserRequest::default()
            .with_group("sales")
            .with_options(UserOptions {
                deny: Some(false),
                autologin: Some(true),
                ..Default::default()
            });

        let err = ops(&sim).create_new_user("bob", request).await.unwrap_err();

        match &err {
            AccessServerError::ProfileCreate { username, source } => {
                assert_eq!(username, "bob");
                assert!(matches!(**source, AccessServerError::Internal));
            }
            other => panic!("unexpected: {other:?}"),
        }
        let journal = sim.journal().await;
        assert!(journal.contains(&SacliCall::UserPropDelAll("bob".into())));
        assert!(!journal.contains(&SacliCall::AutoGenerateOnBehalfOf("bob".into())));
        assert!(sim.profile("bob").await.is_none());
    }

    #[tokio::test]
    async fn silent_client_failure_rolls_back() {
        let sim = SimulatedSacli::new();
        sim.set_silent_generate(true).await;
        let err = ops(&sim)
            .create_new_user("bob", NewUserRequest::default())
            .await
            .unwrap_err();
        match err {
            AccessServerError::ProfileCreate { source, .. } => {
                assert!(matches!(*source, AccessServerError::ClientCreate(_)))
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(sim.profile("bob").await.is_none());
    }

    #[tokio::test]
    async fn stale_client_record_rolls_back() {
        let sim = SimulatedSacli::new();
        sim.insert_client("bob").await;
        let err = ops(&sim)
            .create_new_user("bob", NewUserRequest::default())
            .await
            .unwrap_err();
        match err {
            AccessServerError::ProfileCreate { source, .. } => {
                assert!(matches!(*source, AccessServerError::ClientExists(_)))
            }
            other => panic!("unexpected: {other:?}"),
        }
        assert!(sim
            .journal()
            .await
            .contains(&SacliCall::UserPropDelAll("bob".into())));
    }

    #[test]
    fn request_from_json_validates_types() {
        let ok = NewUserRequest::from_json(
            json!({
                "password": "Str0ng!Pass",
                "group": "sales",
                "generate_client": false,
                "prop_deny": true
            })
            .as_object()
            .unwrap(),
        )
        .unwrap();
        assert_eq!(ok.password.as_deref(), Some("Str0ng!Pass"));
        assert_eq!(ok.group.as_ref().map(GroupRef::group_name), Some("sales"));
        assert!(!ok.generate_client);
        assert_eq!(ok.options.deny, Some(true));

        for bad in [
            json!({ "group": 5 }),
            json!({ "prop_superuser": "yes" }),
            json!({ "generate_client": "true" }),
            json!({ "password": 1234 }),
        ] {
            assert!(matches!(
                NewUserRequest::from_json(bad.as_object().unwrap()),
                Err(AccessServerError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn request_debug_redacts_password() {
        let r = NewUserRequest::default().with_password("hunter2");
        let s = format!("{:?}", r);
        assert!(!s.contains("hunter2"));
        assert!(s.contains("<redacted>"));
    }

    // ── create_client_for_user ───────────────────────────────────

    #[tokio::test]
    async fn existing_client_blocks_generation() {
        let sim = SimulatedSacli::new();
        sim.insert_user("bob").await;
        sim.insert_client("bob").await;
        let err = ops(&sim).create_client_for_user("bob").await.unwrap_err();
        assert!(matches!(err, AccessServerError::ClientExists(_)));
        assert!(!sim
            .journal()
            .await
            .contains(&SacliCall::AutoGenerateOnBehalfOf("bob".into())));
    }

    #[tokio::test]
    async fn client_for_missing_user_is_not_found() {
        let sim = SimulatedSacli::new();
        assert!(matches!(
            ops(&sim).create_client_for_user("ghost").await,
            Err(AccessServerError::ProfileNotFound(_))
        ));
    }

    #[tokio::test]
    async fn silent_generation_failure_detected() {
        let sim = SimulatedSacli::new();
        sim.insert_user("bob").await;
        sim.set_silent_generate(true).await;
        assert!(matches!(
            ops(&sim).create_client_for_user("bob").await,
            Err(AccessServerError::ClientCreate(_))
        ));
    }

    // ── delete_user ──────────────────────────────────────────────

    #[tokio::test]
    async fn delete_revokes_then_removes() {
        let sim = SimulatedSacli::new();
        sim.insert_user("bob").await;
        sim.insert_client("bob").await;
        sim.clear_journal().await;

        ops(&sim).delete_user("bob").await.unwrap();

        let journal = sim.journal().await;
        let revoke = journal
            .iter()
            .position(|c| c == &SacliCall::RevokeUser("bob".into()))
            .unwrap();
        let del = journal
            .iter()
            .position(|c| c == &SacliCall::UserPropDelAll("bob".into()))
            .unwrap();
        assert!(revoke < del);
        assert!(sim.profile("bob").await.is_none());
        assert!(!sim.has_client("bob").await);
    }

    #[tokio::test]
    async fn delete_verifies_postcondition() {
        let sim = SimulatedSacli::new();
        sim.insert_user("bob").await;
        sim.set_silent_delete(true).await;
        assert!(matches!(
            ops(&sim).delete_user("bob").await,
            Err(AccessServerError::ProfileDelete(_))
        ));
    }

    #[tokio::test]
    async fn delete_refuses_groups_and_missing() {
        let sim = SimulatedSacli::new();
        sim.insert_group("sales").await;
        assert!(matches!(
            ops(&sim).delete_user("sales").await,
            Err(AccessServerError::ProfileExists(_))
        ));
        assert!(matches!(
            ops(&sim).delete_user("ghost").await,
            Err(AccessServerError::ProfileNotFound(_))
        ));
        assert!(!sim.journal().await.iter().any(SacliCall::is_mutation));
    }

    // ── get_user_login_ovpn_config ───────────────────────────────

    #[tokio::test]
    async fn ovpn_config_missing_is_not_found_and_not_created() {
        let sim = SimulatedSacli::new();
        sim.insert_user("bob").await;
        let err = ops(&sim).get_user_login_ovpn_config("bob").await.unwrap_err();
        assert!(matches!(err, AccessServerError::ProfileNotFound(_)));
        let journal = sim.journal().await;
        assert!(journal.contains(&SacliCall::Get1("bob".into())));
        assert!(!journal.iter().any(SacliCall::is_mutation));
        assert!(!sim.has_client("bob").await);
    }

    #[tokio::test]
    async fn ovpn_config_returns_content() {
        let sim = SimulatedSacli::new();
        sim.insert_user("bob").await;
        sim.insert_client("bob").await;
        let cfg = ops(&sim).get_user_login_ovpn_config("bob").await.unwrap();
        assert!(cfg.contains("auth-user-pass"));
    }

    // ── revoke_user_certificates ─────────────────────────────────

    #[tokio::test]
    async fn revoke_does_not_reverify() {
        let sim = SimulatedSacli::new();
        sim.insert_user("bob").await;
        sim.insert_client("bob").await;
        sim.clear_journal().await;
        ops(&sim).revoke_user_certificates("bob").await.unwrap();
        let journal = sim.journal().await;
        assert_eq!(journal.last(), Some(&SacliCall::RevokeUser("bob".into())));
        assert!(!journal.contains(&SacliCall::EnumClients));
        assert!(!sim.has_client("bob").await);
    }

    #[tokio::test]
    async fn revoke_on_group_is_wrong_kind() {
        let sim = SimulatedSacli::new();
        sim.insert_group("sales").await;
        assert!(matches!(
            ops(&sim).revoke_user_certificates("sales").await,
            Err(AccessServerError::ProfileExists(_))
        ));
    }
}
