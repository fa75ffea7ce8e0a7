//! Error types for the property depot.
//!
//! Structural errors (duplicate or unknown names, staging against a
//! dependant) surface synchronously at the call that caused them and never
//! defer to a later commit. `commit` itself can only fail with
//! [`DepotError::CyclicDependency`].

use thiserror::Error;

/// Errors produced by depot operations.
#[derive(Debug, Error)]
pub enum DepotError {
    /// A property with this name is already registered in the depot.
    /// Sources and dependants share a single namespace.
    #[error("property name `{0}` is already registered")]
    DuplicateName(String),

    /// A dependency name did not resolve to any registered property.
    /// Raised eagerly at dependant construction, before anything is
    /// registered.
    #[error("unknown property `{0}`")]
    UnknownProperty(String),

    /// A dependant's value was read before its first completed commit.
    #[error("property `{0}` has no committed value yet")]
    UnsetValue(String),

    /// A staged update targeted a dependant; only sources accept external
    /// mutation.
    #[error("property `{0}` is not a source")]
    NotASource(String),

    /// Propagation encountered a dependency cycle through the named
    /// property. The graph must be a DAG.
    #[error("cyclic dependency through property `{0}`")]
    CyclicDependency(String),
}
