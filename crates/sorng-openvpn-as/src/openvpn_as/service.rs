//! Session registry. Each session pairs a validated endpoint config with the
//! `sacli` backend used to reach it and hands out operation handles.

use crate::openvpn_as::error::{AccessServerError, AccessServerResult};
use crate::openvpn_as::groups::GroupOperations;
use crate::openvpn_as::sacli::RemoteSacli;
use crate::openvpn_as::types::*;
use crate::openvpn_as::users::UserOperations;
use log::info;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Shared service handle.
pub type AccessServerServiceState = Arc<Mutex<AccessServerService>>;

pub struct AccessServerService {
    /// Active sessions keyed by session id.
    sessions: HashMap<String, (AsSession, Arc<dyn RemoteSacli>)>,
}

impl AccessServerService {
    pub fn new() -> AccessServerServiceState {
        Arc::new(Mutex::new(AccessServerService {
            sessions: HashMap::new(),
        }))
    }

    // ─── Connection lifecycle ────────────────────────────────────

    /// Register a backend for `config`. The config is validated; the
    /// backend is trusted to already be bound to that endpoint.
    pub fn connect(
        &mut self,
        config: &AccessServerConfig,
        backend: Arc<dyn RemoteSacli>,
    ) -> AccessServerResult<AsSession> {
        config.validate()?;
        let server_url = config.normalized_url();
        info!("Access Server connecting to {} as {}", server_url, config.username);

        let session = AsSession {
            id: uuid::Uuid::new_v4().to_string(),
            server_url,
            username: config.username.clone(),
            connected_at: chrono::Utc::now(),
        };
        self.sessions
            .insert(session.id.clone(), (session.clone(), backend));

        info!(
            "Access Server session {} established for {}",
            session.id, session.server_url
        );
        Ok(session)
    }

    pub fn disconnect(&mut self, session_id: &str) -> AccessServerResult<()> {
        if self.sessions.remove(session_id).is_some() {
            info!("Access Server session {} disconnected", session_id);
            Ok(())
        } else {
            Err(AccessServerError::SessionNotFound(session_id.to_string()))
        }
    }

    pub fn disconnect_all(&mut self) {
        let count = self.sessions.len();
        self.sessions.clear();
        info!("Access Server: disconnected {} session(s)", count);
    }

    pub fn get_session_info(&self, session_id: &str) -> AccessServerResult<AsSession> {
        self.backend(session_id).map(|(s, _)| s.clone())
    }

    pub fn list_sessions(&self) -> Vec<AsSession> {
        self.sessions.values().map(|(s, _)| s.clone()).collect()
    }

    // ─── Operation handles ───────────────────────────────────────

    pub fn users(&self, session_id: &str) -> AccessServerResult<UserOperations> {
        let (_, sacli) = self.backend(session_id)?;
        Ok(UserOperations::new(sacli.clone()))
    }

    pub fn groups(&self, session_id: &str) -> AccessServerResult<GroupOperations> {
        let (_, sacli) = self.backend(session_id)?;
        Ok(GroupOperations::new(sacli.clone()))
    }

    fn backend(&self, session_id: &str) -> AccessServerResult<&(AsSession, Arc<dyn RemoteSacli>)> {
        self.sessions
            .get(session_id)
            .ok_or_else(|| AccessServerError::SessionNotFound(session_id.to_string()))
    }
}
