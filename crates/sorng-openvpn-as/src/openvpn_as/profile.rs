//! Validated snapshots of userprop profiles.
//!
//! A profile is whatever `UserPropGet` returned for one name at one point
//! in time. Construction is the only validation point: the `type` tag must
//! belong to the allowed set for the wrapper being built. Nothing here
//! talks to the server; mutation goes through [`UserOperations`](crate::openvpn_as::UserOperations).
//!
//! Note that a group is not declared by `type` alone, the server also
//! expects `group_declare` to be `true`.

use crate::openvpn_as::error::{AccessServerError, AccessServerResult};
use crate::openvpn_as::types::*;
use serde::Serialize;
use serde_json::Value;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Shared property logic
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Derived flags and raw access shared by every profile kind.
///
/// Each flag reads one string property, compares it case-insensitively to
/// `"true"`, and falls back to a fixed default when the property is absent.
/// A present but non-string value is an integrity error.
pub trait ProfileProperties {
    fn properties(&self) -> &PropertyMap;

    fn profile_type(&self) -> ProfileType;

    /// Type name used in attribute lookup errors.
    fn kind_name(&self) -> &'static str;

    /// `prop_deny`, default false.
    fn is_banned(&self) -> AccessServerResult<bool> {
        flag(self.properties(), PROP_DENY, false)
    }

    /// `prop_superuser`, default false.
    fn is_admin(&self) -> AccessServerResult<bool> {
        flag(self.properties(), PROP_SUPERUSER, false)
    }

    /// `group_declare`, default false.
    fn is_group(&self) -> AccessServerResult<bool> {
        flag(self.properties(), PROP_GROUP_DECLARE, false)
    }

    /// `prop_pwd_change`, default false.
    fn can_change_password(&self) -> AccessServerResult<bool> {
        flag(self.properties(), PROP_PWD_CHANGE, false)
    }

    /// `prop_autologin`, default false.
    fn can_autologin(&self) -> AccessServerResult<bool> {
        flag(self.properties(), PROP_AUTOLOGIN, false)
    }

    /// `prop_pwd_strength`, default true.
    fn will_check_password_strength(&self) -> AccessServerResult<bool> {
        flag(self.properties(), PROP_PWD_STRENGTH, true)
    }

    /// `prop_autogenerate`, default true. When set the server regenerates
    /// a missing client record the next time the user asks for it.
    fn will_autogenerate_client(&self) -> AccessServerResult<bool> {
        flag(self.properties(), PROP_AUTOGENERATE, true)
    }

    /// Raw property by key.
    fn get_prop(&self, key: &str) -> AccessServerResult<&Value> {
        self.properties()
            .get(key)
            .ok_or_else(|| AccessServerError::PropertyNotFound(key.to_string()))
    }

    /// Fallback lookup treating a property as an attribute of the profile.
    fn attr(&self, name: &str) -> AccessServerResult<&Value> {
        self.properties()
            .get(name)
            .ok_or_else(|| AccessServerError::AttributeNotFound {
                kind: self.kind_name(),
                attribute: name.to_string(),
            })
    }

    /// Typed access to a string property; `None` when absent.
    fn prop_str(&self, key: &str) -> AccessServerResult<Option<&str>> {
        match self.properties().get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(not_a_string(key, other)),
        }
    }
}

fn flag(props: &PropertyMap, key: &str, default: bool) -> AccessServerResult<bool> {
    match props.get(key) {
        None => Ok(default),
        Some(Value::String(s)) => Ok(s.eq_ignore_ascii_case("true")),
        Some(other) => Err(not_a_string(key, other)),
    }
}

fn not_a_string(key: &str, value: &Value) -> AccessServerError {
    AccessServerError::ProfileIntegrity(format!(
        "type of {} must be str, not {}",
        key,
        json_kind(value)
    ))
}

fn raw_type(props: &PropertyMap) -> Option<&str> {
    props.get(PROP_TYPE).and_then(Value::as_str)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Profile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A profile of any type, not bound to a name.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Profile {
    #[serde(skip)]
    profile_type: ProfileType,
    properties: PropertyMap,
}

impl Profile {
    pub fn new(properties: PropertyMap) -> AccessServerResult<Self> {
        let profile_type = match properties.get(PROP_TYPE) {
            Some(Value::String(s)) => s.parse::<ProfileType>()?,
            Some(other) => return Err(not_a_string(PROP_TYPE, other)),
            None => {
                return Err(AccessServerError::ProfileIntegrity(format!(
                    "value of property 'type' must be one of {}",
                    type_list(&ProfileType::ALL)
                )))
            }
        };
        Ok(Self {
            profile_type,
            properties,
        })
    }

    pub fn into_properties(self) -> PropertyMap {
        self.properties
    }
}

impl ProfileProperties for Profile {
    fn properties(&self) -> &PropertyMap {
        &self.properties
    }

    fn profile_type(&self) -> ProfileType {
        self.profile_type
    }

    fn kind_name(&self) -> &'static str {
        "Profile"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  UserProfile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A user's profile. The `type` must be one of the user-connect tags.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserProfile {
    pub username: String,
    #[serde(flatten)]
    profile: Profile,
}

impl UserProfile {
    pub fn new(username: impl Into<String>, properties: PropertyMap) -> AccessServerResult<Self> {
        let is_user = raw_type(&properties)
            .and_then(|t| t.parse::<ProfileType>().ok())
            .map(|t| t.is_user_type())
            .unwrap_or(false);
        if !is_user {
            let user_types: Vec<_> = ProfileType::ALL
                .into_iter()
                .filter(ProfileType::is_user_type)
                .collect();
            return Err(AccessServerError::ProfileIntegrity(format!(
                "value of type property must be one of {} for a user profile",
                type_list(&user_types)
            )));
        }
        Ok(Self {
            username: username.into(),
            profile: Profile::new(properties)?,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }
}

impl ProfileProperties for UserProfile {
    fn properties(&self) -> &PropertyMap {
        self.profile.properties()
    }

    fn profile_type(&self) -> ProfileType {
        self.profile.profile_type()
    }

    fn kind_name(&self) -> &'static str {
        "UserProfile"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GroupProfile
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A group's profile: `type` is `group` and `group_declare` is exactly
/// `"true"`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupProfile {
    pub group_name: String,
    #[serde(flatten)]
    profile: Profile,
}

impl GroupProfile {
    pub fn new(group_name: impl Into<String>, properties: PropertyMap) -> AccessServerResult<Self> {
        if raw_type(&properties) != Some(ProfileType::Group.as_str()) {
            return Err(AccessServerError::ProfileIntegrity(format!(
                "value of type for a group must be '{}'",
                ProfileType::Group
            )));
        }
        // Exact match, unlike the case-insensitive `is_group` flag.
        if properties.get(PROP_GROUP_DECLARE).and_then(Value::as_str) != Some("true") {
            return Err(AccessServerError::ProfileIntegrity(
                "value of group_declare must be true for a group".into(),
            ));
        }
        Ok(Self {
            group_name: group_name.into(),
            profile: Profile::new(properties)?,
        })
    }

    pub fn profile(&self) -> &Profile {
        &self.profile
    }
}

impl ProfileProperties for GroupProfile {
    fn properties(&self) -> &PropertyMap {
        self.profile.properties()
    }

    fn profile_type(&self) -> ProfileType {
        self.profile.profile_type()
    }

    fn kind_name(&self) -> &'static str {
        "GroupProfile"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Named profile of either kind
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A named profile resolved to its kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessServerProfile {
    User(UserProfile),
    Group(GroupProfile),
}

impl AccessServerProfile {
    /// Pick the wrapper from the raw `type` tag and validate it.
    pub fn from_properties(name: &str, properties: PropertyMap) -> AccessServerResult<Self> {
        if raw_type(&properties) == Some(ProfileType::Group.as_str()) {
            GroupProfile::new(name, properties).map(Self::Group)
        } else {
            UserProfile::new(name, properties).map(Self::User)
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::User(u) => &u.username,
            Self::Group(g) => &g.group_name,
        }
    }
}

impl ProfileProperties for AccessServerProfile {
    fn properties(&self) -> &PropertyMap {
        match self {
            Self::User(u) => u.properties(),
            Self::Group(g) => g.properties(),
        }
    }

    fn profile_type(&self) -> ProfileType {
        match self {
            Self::User(u) => u.profile_type(),
            Self::Group(g) => g.profile_type(),
        }
    }

    fn kind_name(&self) -> &'static str {
        match self {
            Self::User(u) => u.kind_name(),
            Self::Group(g) => g.kind_name(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  Name-or-profile references
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// A user given either by name or by a profile snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum UserRef {
    Name(String),
    Profile(UserProfile),
}

impl UserRef {
    pub fn username(&self) -> &str {
        match self {
            Self::Name(n) => n,
            Self::Profile(p) => &p.username,
        }
    }
}

impl From<&str> for UserRef {
    fn from(s: &str) -> Self {
        UserRef::Name(s.to_string())
    }
}

impl From<String> for UserRef {
    fn from(s: String) -> Self {
        UserRef::Name(s)
    }
}

impl From<&String> for UserRef {
    fn from(s: &String) -> Self {
        UserRef::Name(s.clone())
    }
}

impl From<UserProfile> for UserRef {
    fn from(p: UserProfile) -> Self {
        UserRef::Profile(p)
    }
}

impl From<&UserProfile> for UserRef {
    fn from(p: &UserProfile) -> Self {
        UserRef::Profile(p.clone())
    }
}

/// A group given either by name or by a profile snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum GroupRef {
    Name(String),
    Profile(GroupProfile),
}

impl GroupRef {
    pub fn group_name(&self) -> &str {
        match self {
            Self::Name(n) => n,
            Self::Profile(p) => &p.group_name,
        }
    }

    /// Accept a group reference from a loosely-typed value; only strings
    /// are valid.
    pub fn from_json(value: &Value) -> AccessServerResult<Self> {
        value
            .as_str()
            .map(|s| GroupRef::Name(s.to_string()))
            .ok_or_else(|| {
                AccessServerError::InvalidArgument(format!(
                    "expected str for 'group', got {}",
                    json_kind(value)
                ))
            })
    }
}

impl From<&str> for GroupRef {
    fn from(s: &str) -> Self {
        GroupRef::Name(s.to_string())
    }
}

impl From<String> for GroupRef {
    fn from(s: String) -> Self {
        GroupRef::Name(s)
    }
}

impl From<GroupProfile> for GroupRef {
    fn from(p: GroupProfile) -> Self {
        GroupRef::Profile(p)
    }
}

impl From<&GroupProfile> for GroupRef {
    fn from(p: &GroupProfile) -> Self {
        GroupRef::Profile(p.clone())
    }
}
