//! OpenVPN Access Server module root – re-exports public API surface.
//!
//! Data flows one way: `users`/`groups` call the injected [`RemoteSacli`],
//! wrap the returned property maps into [`profile`] snapshots, and any
//! remote fault is passed through [`fault::translate_fault`] before it
//! reaches the caller.

pub mod types;
pub mod error;
pub mod fault;
pub mod profile;
pub mod password;
pub mod sacli;
pub mod users;
pub mod groups;
pub mod service;

pub use types::*;
pub use error::{AccessServerError, AccessServerResult};
pub use fault::{translate_fault, Fault, RpcError, RpcResult};
pub use profile::{
    AccessServerProfile, GroupProfile, GroupRef, Profile, ProfileProperties, UserProfile, UserRef,
};
pub use sacli::{ConnectionProfile, RemoteSacli, SacliCall, SimulatedSacli};
pub use users::{NewUserRequest, UserOperations};
pub use groups::GroupOperations;
pub use service::{AccessServerService, AccessServerServiceState};
