//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (Base64, constant-time compare, random bytes)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Generic key-value cache with per-entry TTL
//! - Client IP extraction helpers

pub mod cache;
pub mod client;
pub mod crypto;
pub mod password;
