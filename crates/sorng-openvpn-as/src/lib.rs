//! # sorng-openvpn-as
//!
//! Administration layer for OpenVPN Access Server, driven through the
//! `sacli` XML-RPC interface.
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | **types** | Profile-type tags, property keys, request/option types, config |
//! | **error** | Crate-wide error taxonomy |
//! | **fault** | XML-RPC fault → typed error translation |
//! | **profile** | Validated user/group profile snapshots |
//! | **password** | Complexity rules and legacy digest |
//! | **sacli** | Remote `sacli` trait and in-memory simulated backend |
//! | **users** | User lookup, provisioning with rollback, deletion, clients |
//! | **groups** | Group lookup |
//! | **service** | Session orchestrator owning configured backends |

pub mod openvpn_as;
