//! Group lookup.

use crate::openvpn_as::error::{AccessServerError, AccessServerResult};
use crate::openvpn_as::profile::{AccessServerProfile, GroupProfile, GroupRef};
use crate::openvpn_as::sacli::{fetch_one, is_group_type, RemoteSacli};
use crate::openvpn_as::types::PropertyMap;
use log::debug;
use std::sync::Arc;

/// Read-only operations on group profiles.
#[derive(Clone)]
pub struct GroupOperations {
    sacli: Arc<dyn RemoteSacli>,
}

impl GroupOperations {
    pub fn new(sacli: Arc<dyn RemoteSacli>) -> Self {
        Self { sacli }
    }

    /// Fetch a group. `ProfileExists` when the name belongs to a user.
    pub async fn get_group(&self, group: impl Into<GroupRef>) -> AccessServerResult<GroupProfile> {
        let group = group.into();
        let name = group.group_name();
        debug!("get_group({})", name);
        let properties = require_group(self.sacli.as_ref(), name).await?;
        GroupProfile::new(name, properties)
    }

    /// Fetch any named profile and resolve it to its kind.
    pub async fn get_profile(&self, name: &str) -> AccessServerResult<AccessServerProfile> {
        debug!("get_profile({})", name);
        let properties = fetch_one(self.sacli.as_ref(), name)
            .await?
            .ok_or_else(|| {
                AccessServerError::ProfileNotFound(format!("Could not find profile for \"{}\"", name))
            })?;
        AccessServerProfile::from_properties(name, properties)
    }
}

/// Raw properties of an existing group; only the `type` tag is checked.
pub(crate) async fn require_group(
    sacli: &dyn RemoteSacli,
    name: &str,
) -> AccessServerResult<PropertyMap> {
    let properties = fetch_one(sacli, name).await?.ok_or_else(|| {
        AccessServerError::ProfileNotFound(format!("Group \"{}\" does not exist", name))
    })?;
    if !is_group_type(&properties) {
        return Err(AccessServerError::ProfileExists(format!(
            "Profile \"{}\" is not a group",
            name
        )));
    }
    Ok(properties)
}
