//! Access Server error types.
//!
//! Three families share one enum:
//!
//! - **translated faults**: produced only by [`translate_fault`](crate::openvpn_as::fault::translate_fault)
//! - **profile integrity**: raised while constructing profile snapshots
//! - **workflow**: logical failures detected by the user/group operations

use thiserror::Error;

/// Unified error type for all Access Server operations.
#[derive(Debug, Error)]
pub enum AccessServerError {
    // ── Translated XML-RPC faults ───────────────────────────────────
    /// Fault 8002: wrong number of parameters for the called method.
    #[error("Number of parameters is incorrect")]
    Parameter,
    /// Fault 9007: bad credentials or insufficient permission.
    #[error("Either your credentials are wrong or your permissions are not correct to run the given method")]
    Auth,
    /// Fault 9000 relaying a server-side `ValueError`.
    #[error("ValueError from server: {0}")]
    Value(String),
    /// Fault 9000 `XMLRPC: internal error`.
    #[error("Something unknown went wrong with that call that the server did not like")]
    Internal,
    /// Fault 9000 `XMLRPCRelay: XMLRPC: function not found`.
    #[error("Function not found on given server")]
    FunctionNotFound,
    /// Any fault not covered above, kept verbatim for diagnosis.
    #[error("Unexpected fault from server (code {code}): \"{message}\"")]
    Unexpected { code: i32, message: String },
    /// Non-fault failure reported by the transport.
    #[error("Transport error: {0}")]
    Transport(String),
    /// Password rejected by the local complexity rules.
    #[error("Password does not meet complexity requirements: {0}")]
    PasswordComplexity(String),

    // ── Profile integrity ───────────────────────────────────────────
    #[error("Profile integrity error: {0}")]
    ProfileIntegrity(String),
    #[error("No value for key '{0}' defined")]
    PropertyNotFound(String),
    #[error("'{kind}' object has no attribute '{attribute}'")]
    AttributeNotFound { kind: &'static str, attribute: String },

    // ── Workflow ────────────────────────────────────────────────────
    #[error("Profile not found: {0}")]
    ProfileNotFound(String),
    /// The profile already exists, or the name denotes the wrong kind.
    #[error("Profile exists: {0}")]
    ProfileExists(String),
    #[error("Encountered an issue when setting properties on new user \"{username}\": {source}")]
    ProfileCreate {
        username: String,
        #[source]
        source: Box<AccessServerError>,
    },
    #[error("Could not delete profile: {0}")]
    ProfileDelete(String),
    #[error("Client record exists: {0}")]
    ClientExists(String),
    #[error("Client record creation failed: {0}")]
    ClientCreate(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Session '{0}' not found")]
    SessionNotFound(String),
}

impl AccessServerError {
    /// Whether the error came back from the remote `sacli` endpoint.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Parameter
                | Self::Auth
                | Self::Value(_)
                | Self::Internal
                | Self::FunctionNotFound
                | Self::Unexpected { .. }
                | Self::Transport(_)
                | Self::PasswordComplexity(_)
        )
    }

    pub(crate) fn create_failed(username: &str, cause: AccessServerError) -> Self {
        Self::ProfileCreate {
            username: username.to_string(),
            source: Box::new(cause),
        }
    }
}

/// Convenience Result alias.
pub type AccessServerResult<T> = Result<T, AccessServerError>;

/// Convert AccessServerError to a String for command-style returns.
impl From<AccessServerError> for String {
    fn from(e: AccessServerError) -> Self {
        e.to_string()
    }
}
