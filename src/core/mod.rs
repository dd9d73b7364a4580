//! Core library components.
//!
//! Everything activation needs: sealed bundles and the recipient policy,
//! materialization of secrets onto disk, shell integration, and the
//! pipeline that ties them together.

pub mod activation;
pub mod atomic;
pub mod bundle;
pub mod cipher;
pub mod config;
pub mod constants;
pub mod domain;
pub mod links;
pub mod materialize;
pub mod policy;
pub mod shell;
pub mod tools;
pub mod types;
pub mod validation;
