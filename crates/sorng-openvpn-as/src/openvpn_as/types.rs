//! Shared enums, property keys, request types and configuration.

use crate::openvpn_as::error::{AccessServerError, AccessServerResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Property keys
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Raw property dump of a single profile as returned by `UserPropGet`.
pub type PropertyMap = BTreeMap<String, Value>;

pub const PROP_TYPE: &str = "type";
pub const PROP_GROUP_DECLARE: &str = "group_declare";
pub const PROP_CONN_GROUP: &str = "conn_group";
pub const PROP_SUPERUSER: &str = "prop_superuser";
pub const PROP_AUTOLOGIN: &str = "prop_autologin";
pub const PROP_DENY: &str = "prop_deny";
pub const PROP_PWD_CHANGE: &str = "prop_pwd_change";
pub const PROP_PWD_STRENGTH: &str = "prop_pwd_strength";
pub const PROP_AUTOGENERATE: &str = "prop_autogenerate";
/// Property holding the SHA-256 digest on servers without `SetLocalPassword`.
pub const PROP_PASSWORD_DIGEST: &str = "pvt_password_digest";

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Profile type
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Value of the `type` property of a userprop profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfileType {
    /// Evaluated only when the user connects.
    UserConnect,
    /// Same as `UserConnect` but hidden from the admin UI.
    UserConnectHidden,
    /// Evaluated on iptables compile and on connect.
    UserCompile,
    /// The `__DEFAULT__` record.
    UserDefault,
    Group,
}

impl ProfileType {
    pub const ALL: [ProfileType; 5] = [
        ProfileType::UserConnect,
        ProfileType::UserConnectHidden,
        ProfileType::UserCompile,
        ProfileType::UserDefault,
        ProfileType::Group,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UserConnect => "user_connect",
            Self::UserConnectHidden => "user_connect_hidden",
            Self::UserCompile => "user_compile",
            Self::UserDefault => "user_default",
            Self::Group => "group",
        }
    }

    /// Whether a profile of this type may back a [`UserProfile`](crate::openvpn_as::UserProfile).
    pub fn is_user_type(&self) -> bool {
        matches!(
            self,
            Self::UserConnect | Self::UserConnectHidden | Self::UserCompile
        )
    }
}

impl fmt::Display for ProfileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProfileType {
    type Err = AccessServerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                AccessServerError::ProfileIntegrity(format!(
                    "value of property 'type' must be one of {}, got '{}'",
                    type_list(&Self::ALL),
                    s
                ))
            })
    }
}

pub(crate) fn type_list(types: &[ProfileType]) -> String {
    types
        .iter()
        .map(|t| t.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  User creation options
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Optional boolean properties applied to a new user. `None` leaves the
/// server default (or the group's value) in effect.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserOptions {
    pub superuser: Option<bool>,
    pub autologin: Option<bool>,
    pub deny: Option<bool>,
    pub pwd_change: Option<bool>,
    pub pwd_strength: Option<bool>,
    pub autogenerate: Option<bool>,
}

impl UserOptions {
    /// Property keys in the order they are applied.
    pub const KEYS: [&'static str; 6] = [
        PROP_SUPERUSER,
        PROP_AUTOLOGIN,
        PROP_DENY,
        PROP_PWD_CHANGE,
        PROP_PWD_STRENGTH,
        PROP_AUTOGENERATE,
    ];

    fn values(&self) -> [Option<bool>; 6] {
        [
            self.superuser,
            self.autologin,
            self.deny,
            self.pwd_change,
            self.pwd_strength,
            self.autogenerate,
        ]
    }

    fn slot(&mut self, key: &str) -> Option<&mut Option<bool>> {
        match key {
            PROP_SUPERUSER => Some(&mut self.superuser),
            PROP_AUTOLOGIN => Some(&mut self.autologin),
            PROP_DENY => Some(&mut self.deny),
            PROP_PWD_CHANGE => Some(&mut self.pwd_change),
            PROP_PWD_STRENGTH => Some(&mut self.pwd_strength),
            PROP_AUTOGENERATE => Some(&mut self.autogenerate),
            _ => None,
        }
    }

    /// Serialised `(key, "true"|"false")` pairs for every flag that is set.
    pub fn to_properties(&self) -> Vec<(&'static str, String)> {
        Self::KEYS
            .iter()
            .zip(self.values())
            .filter_map(|(key, value)| value.map(|v| (*key, bool_prop(v))))
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.values().iter().all(Option::is_none)
    }

    /// Read the recognised `prop_*` flags out of a loosely-typed object.
    ///
    /// `null` counts as absent, unknown keys are ignored, anything other
    /// than a JSON boolean is rejected.
    pub fn from_json(map: &Map<String, Value>) -> AccessServerResult<Self> {
        let mut opts = Self::default();
        for key in Self::KEYS {
            let value = match map.get(key) {
                None | Some(Value::Null) => continue,
                Some(v) => v,
            };
            let flag = value.as_bool().ok_or_else(|| {
                AccessServerError::InvalidArgument(format!(
                    "expected bool for '{}', got {}",
                    key,
                    json_kind(value)
                ))
            })?;
            if let Some(slot) = opts.slot(key) {
                *slot = Some(flag);
            }
        }
        Ok(opts)
    }
}

pub(crate) fn bool_prop(value: bool) -> String {
    if value { "true" } else { "false" }.to_string()
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Configuration
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

fn default_verify_tls() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    30
}

/// Connection settings for an Access Server XML-RPC endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessServerConfig {
    pub server_url: String,
    pub username: String,
    #[serde(default, skip_serializing)]
    pub password: String,
    #[serde(default = "default_verify_tls")]
    pub verify_tls: bool,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl AccessServerConfig {
    pub fn new(
        server_url: impl Into<String>,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        Self {
            server_url: server_url.into(),
            username: username.into(),
            password: password.into(),
            verify_tls: default_verify_tls(),
            timeout_secs: default_timeout_secs(),
        }
    }

    pub fn from_json(raw: &str) -> AccessServerResult<Self> {
        let config: Self = serde_json::from_str(raw)
            .map_err(|e| AccessServerError::Config(format!("invalid configuration: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> AccessServerResult<()> {
        if self.server_url.trim().is_empty() {
            return Err(AccessServerError::Config("server_url is empty".into()));
        }
        if self.username.trim().is_empty() {
            return Err(AccessServerError::Config("username is empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(AccessServerError::Config(
                "timeout_secs must be greater than zero".into(),
            ));
        }
        Ok(())
    }

    /// Endpoint URL with a scheme and without trailing slashes.
    pub fn normalized_url(&self) -> String {
        let url = self.server_url.trim().trim_end_matches('/');
        if url.starts_with("http://") || url.starts_with("https://") {
            url.to_string()
        } else {
            format!("https://{}", url)
        }
    }
}

/// A connected session tracked by the service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AsSession {
    pub id: String,
    pub server_url: String,
    pub username: String,
    pub connected_at: chrono::DateTime<chrono::Utc>,
}
