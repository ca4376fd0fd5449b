//! Envelope-encryption key management.
//!
//! Keys form a three-tier hierarchy: a root key held by an external source,
//! a per-table master key persisted only in root-key-wrapped form, and the
//! caller's per-request data keys, which this service wraps and unwraps
//! without the caller ever touching the higher tiers.

pub mod access;
pub mod error;
pub mod logging;
pub mod logic;
pub mod repository;
pub mod rootkey;
pub mod router;
