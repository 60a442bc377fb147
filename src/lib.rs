//! Pod mutation engine for a Kubernetes mutating admission webhook
//!
//! Applies an ordered chain of default-injection rules to an incoming pod and
//! emits the change as an RFC 6902 JSON Patch, ready to be attached to an
//! `AdmissionReview` response.
//!
//! # Architecture
//!
//! - Each rule implements [`PodMutator`] and returns a new pod; the input is
//!   never changed in place.
//! - The [`Mutator`] owns the rule chain, runs it on a private copy of the pod
//!   and diffs the serialized original against the serialized result.
//! - The HTTP/TLS server that receives admission reviews lives outside this
//!   crate; [`admission`] is the glue it calls.
//!
//! # Modules
//!
//! - [`mutation`] - Rule trait, orchestrator and the built-in rules
//! - [`admission`] - `AdmissionRequest<Pod>` to `AdmissionResponse` adapter
//! - [`config`] - Rule configuration (env injection, conflict policy)
//! - [`telemetry`] - Tracing subscriber setup
//! - [`error`] - Error types for the mutation pipeline

#![deny(missing_docs)]

pub mod admission;
pub mod config;
pub mod error;
pub mod mutation;
pub mod telemetry;

pub use config::{EnvConflictPolicy, EnvInjectionConfig, MutatorConfig};
pub use error::Error;
pub use mutation::{InjectEnv, InjectSecurityContext, Mutator, PodMutator};

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

// =============================================================================
// Default Security Constants
// =============================================================================

/// UID applied to pods that carry no pod-level security context
pub const DEFAULT_RUN_AS_USER: i64 = 1000;

/// GID applied to pods that carry no pod-level security context
pub const DEFAULT_RUN_AS_GROUP: i64 = 1000;

/// Capability dropped from containers that carry no security context
pub const DROP_ALL_CAPABILITIES: &str = "ALL";

/// Default environment variable injected into every container
pub const DEFAULT_ENV_NAME: &str = "KUBE";

/// Default value of the injected environment variable
pub const DEFAULT_ENV_VALUE: &str = "true";
