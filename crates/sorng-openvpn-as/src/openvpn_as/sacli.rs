//! Remote `sacli` abstraction.
//!
//! The Access Server exposes its administration surface as XML-RPC methods
//! relayed to `sacli`. The orchestration in `users`/`groups` only needs the
//! call/return contract below, so the transport is injected through the
//! `RemoteSacli` trait. Method names in the docs are the wire names.

use crate::openvpn_as::error::AccessServerResult;
use crate::openvpn_as::fault::{Fault, RpcResult, FAULT_PARAMETER};
use crate::openvpn_as::password;
use crate::openvpn_as::types::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::Arc;
use tokio::sync::Mutex;

/// Result of `Get1`: profile metadata plus the `.ovpn` text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionProfile {
    pub metadata: Value,
    pub content: String,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Remote trait
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The subset of the `sacli` XML-RPC interface used for profile management.
///
/// Implementations must be `Send + Sync` so they can be shared behind an
/// `Arc`. Failures are returned untranslated; callers run them through
/// [`translate_fault`](crate::openvpn_as::fault::translate_fault).
#[async_trait::async_trait]
pub trait RemoteSacli: Send + Sync {
    /// `UserPropGet(pfilt)`. Names without a profile are absent from the map.
    async fn user_prop_get(&self, pfilt: &[String]) -> RpcResult<HashMap<String, PropertyMap>>;

    /// `UserPropPut(name, key, value)`.
    async fn user_prop_put(&self, name: &str, key: &str, value: Value) -> RpcResult<()>;

    /// `UserPropDelAll(name)`.
    async fn user_prop_del_all(&self, name: &str) -> RpcResult<()>;

    /// `RevokeUser(name)`: revoke every certificate issued to the user.
    async fn revoke_user(&self, name: &str) -> RpcResult<()>;

    /// `EnumClients()`: usernames holding a client record.
    async fn enum_clients(&self) -> RpcResult<BTreeSet<String>>;

    /// `AutoGenerateOnBehalfOf(name)`.
    async fn auto_generate_on_behalf_of(&self, name: &str) -> RpcResult<()>;

    /// `SetLocalPassword(name, new, old)`. Servers predating the call answer
    /// with a parameter fault.
    async fn set_local_password(
        &self,
        name: &str,
        new_password: &str,
        old_password: &str,
    ) -> RpcResult<()>;

    /// `Get1(name)`: read-only fetch of the user-login profile. Never
    /// creates one.
    async fn get1(&self, name: &str) -> RpcResult<Option<ConnectionProfile>>;

    /// `LocalAuthEnabled()`.
    async fn local_auth_enabled(&self) -> RpcResult<bool>;

    /// Complexity check used on the legacy password path.
    fn is_password_complex(&self, password: &str) -> bool {
        password::is_password_complex(password)
    }
}

/// `UserPropGet` for a single name; `None` when the server has no profile.
pub(crate) async fn fetch_one(
    sacli: &dyn RemoteSacli,
    name: &str,
) -> AccessServerResult<Option<PropertyMap>> {
    let mut found = sacli.user_prop_get(&[name.to_string()]).await?;
    Ok(found.remove(name))
}

/// Whether a raw property map carries `type == "group"`.
pub(crate) fn is_group_type(properties: &PropertyMap) -> bool {
    properties.get(PROP_TYPE).and_then(Value::as_str) == Some(ProfileType::Group.as_str())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Simulated backend (for testing & offline use)
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One recorded call against [`SimulatedSacli`]. Passwords are not kept.
#[derive(Debug, Clone, PartialEq)]
pub enum SacliCall {
    UserPropGet(Vec<String>),
    UserPropPut { name: String, key: String, value: Value },
    UserPropDelAll(String),
    RevokeUser(String),
    EnumClients,
    AutoGenerateOnBehalfOf(String),
    SetLocalPassword(String),
    Get1(String),
    LocalAuthEnabled,
}

impl SacliCall {
    /// Whether the call changes server state.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Self::UserPropPut { .. }
                | Self::UserPropDelAll(_)
                | Self::RevokeUser(_)
                | Self::AutoGenerateOnBehalfOf(_)
                | Self::SetLocalPassword(_)
        )
    }
}

#[derive(Default)]
struct SimState {
    profiles: BTreeMap<String, PropertyMap>,
    clients: BTreeSet<String>,
    passwords: HashMap<String, String>,
    local_auth: bool,
    journal: Vec<SacliCall>,
    put_count: usize,
    fail_put_at: Option<(usize, Fault)>,
    method_faults: HashMap<&'static str, Fault>,
    legacy_password: bool,
    silent_generate: bool,
    silent_delete: bool,
}

impl SimState {
    fn check(&self, method: &'static str) -> RpcResult<()> {
        match self.method_faults.get(method) {
            Some(fault) => Err(fault.clone().into()),
            None => Ok(()),
        }
    }
}

/// A fully in-memory Access Server useful for unit tests and demos.
///
/// Local auth starts enabled. Faults can be injected per method or on the
/// Nth `UserPropPut`, and every call is journalled.
pub struct SimulatedSacli {
    state: Mutex<SimState>,
}

impl SimulatedSacli {
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            state: Mutex::new(SimState {
                local_auth: true,
                ..Default::default()
            }),
        })
    }

    /// Seed a raw profile, bypassing the journal.
    pub async fn insert_profile(&self, name: &str, properties: PropertyMap) {
        self.state
            .lock()
            .await
            .profiles
            .insert(name.to_string(), properties);
    }

    pub async fn insert_user(&self, name: &str) {
        let mut props = PropertyMap::new();
        props.insert(PROP_TYPE.into(), Value::from(ProfileType::UserConnect.as_str()));
        self.insert_profile(name, props).await;
    }

    pub async fn insert_group(&self, name: &str) {
        let mut props = PropertyMap::new();
        props.insert(PROP_TYPE.into(), Value::from(ProfileType::Group.as_str()));
        props.insert(PROP_GROUP_DECLARE.into(), Value::from("true"));
        self.insert_profile(name, props).await;
    }

    /// Seed a client record, bypassing the journal.
    pub async fn insert_client(&self, name: &str) {
        self.state.lock().await.clients.insert(name.to_string());
    }

    pub async fn set_local_auth(&self, enabled: bool) {
        self.state.lock().await.local_auth = enabled;
    }

    /// Make the `n`th `UserPropPut` (1-based) fail with `fault`.
    pub async fn fail_nth_put(&self, n: usize, fault: Fault) {
        self.state.lock().await.fail_put_at = Some((n, fault));
    }

    /// Make every call to `method` (wire name) fail with `fault`.
    pub async fn fail_method(&self, method: &'static str, fault: Fault) {
        self.state.lock().await.method_faults.insert(method, fault);
    }

    /// Behave like a server without `SetLocalPassword`.
    pub async fn set_legacy_password(&self, legacy: bool) {
        self.state.lock().await.legacy_password = legacy;
    }

    /// `AutoGenerateOnBehalfOf` reports success without creating a client.
    pub async fn set_silent_generate(&self, silent: bool) {
        self.state.lock().await.silent_generate = silent;
    }

    /// `UserPropDelAll` reports success without deleting anything.
    pub async fn set_silent_delete(&self, silent: bool) {
        self.state.lock().await.silent_delete = silent;
    }

    pub async fn journal(&self) -> Vec<SacliCall> {
        self.state.lock().await.journal.clone()
    }

    pub async fn clear_journal(&self) {
        self.state.lock().await.journal.clear();
    }

    pub async fn profile(&self, name: &str) -> Option<PropertyMap> {
        self.state.lock().await.profiles.get(name).cloned()
    }

    pub async fn has_client(&self, name: &str) -> bool {
        self.state.lock().await.clients.contains(name)
    }

    pub async fn password_of(&self, name: &str) -> Option<String> {
        self.state.lock().await.passwords.get(name).cloned()
    }

    fn render_profile(name: &str) -> String {
        format!(
            "# OpenVPN client profile for {name}\nclient\ndev tun\nauth-user-pass\n<ca>\n-----BEGIN CERTIFICATE-----\n-----END CERTIFICATE-----\n</ca>\n"
        )
    }
}

#[async_trait::async_trait]
impl RemoteSacli for SimulatedSacli {
    async fn user_prop_get(&self, pfilt: &[String]) -> RpcResult<HashMap<String, PropertyMap>> {
        let mut st = self.state.lock().await;
        st.journal.push(SacliCall::UserPropGet(pfilt.to_vec()));
        st.check("UserPropGet")?;
        let found = st
            .profiles
            .iter()
            .filter(|(name, _)| pfilt.is_empty() || pfilt.contains(*name))
            .map(|(name, props)| (name.clone(), props.clone()))
            .collect();
        Ok(found)
    }

    async fn user_prop_put(&self, name: &str, key: &str, value: Value) -> RpcResult<()> {
        let mut st = self.state.lock().await;
        st.journal.push(SacliCall::UserPropPut {
            name: name.to_string(),
            key: key.to_string(),
            value: value.clone(),
        });
        st.check("UserPropPut")?;
        st.put_count += 1;
        if let Some((n, fault)) = &st.fail_put_at {
            if *n == st.put_count {
                return Err(fault.clone().into());
            }
        }
        st.profiles
            .entry(name.to_string())
            .or_default()
            .insert(key.to_string(), value);
        Ok(())
    }

    async fn user_prop_del_all(&self, name: &str) -> RpcResult<()> {
        let mut st = self.state.lock().await;
        st.journal.push(SacliCall::UserPropDelAll(name.to_string()));
        st.check("UserPropDelAll")?;
        if !st.silent_delete {
            st.profiles.remove(name);
            st.passwords.remove(name);
        }
        Ok(())
    }

    async fn revoke_user(&self, name: &str) -> RpcResult<()> {
        let mut st = self.state.lock().await;
        st.journal.push(SacliCall::RevokeUser(name.to_string()));
        st.check("RevokeUser")?;
        st.clients.remove(name);
        Ok(())
    }

    async fn enum_clients(&self) -> RpcResult<BTreeSet<String>> {
        let mut st = self.state.lock().await;
        st.journal.push(SacliCall::EnumClients);
        st.check("EnumClients")?;
        Ok(st.clients.clone())
    }

    async fn auto_generate_on_behalf_of(&self, name: &str) -> RpcResult<()> {
        let mut st = self.state.lock().await;
        st.journal
            .push(SacliCall::AutoGenerateOnBehalfOf(name.to_string()));
        st.check("AutoGenerateOnBehalfOf")?;
        if !st.silent_generate {
            st.clients.insert(name.to_string());
        }
        Ok(())
    }

    async fn set_local_password(
        &self,
        name: &str,
        new_password: &str,
        _old_password: &str,
    ) -> RpcResult<()> {
        let mut st = self.state.lock().await;
        st.journal.push(SacliCall::SetLocalPassword(name.to_string()));
        st.check("SetLocalPassword")?;
        if st.legacy_password {
            return Err(Fault::new(FAULT_PARAMETER, "SetLocalPassword takes 2 arguments").into());
        }
        st.passwords
            .insert(name.to_string(), new_password.to_string());
        Ok(())
    }

    async fn get1(&self, name: &str) -> RpcResult<Option<ConnectionProfile>> {
        let mut st = self.state.lock().await;
        st.journal.push(SacliCall::Get1(name.to_string()));
        st.check("Get1")?;
        if !st.clients.contains(name) {
            return Ok(None);
        }
        Ok(Some(ConnectionProfile {
            metadata: serde_json::json!({ "user": name, "autologin": false }),
            content: Self::render_profile(name),
        }))
    }

    async fn local_auth_enabled(&self) -> RpcResult<bool> {
        let mut st = self.state.lock().await;
        st.journal.push(SacliCall::LocalAuthEnabled);
        st.check("LocalAuthEnabled")?;
        Ok(st.local_auth)
    }
}
