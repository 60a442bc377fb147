//! Pod mutation pipeline
//!
//! A [`Mutator`] holds an ordered chain of [`PodMutator`] rules. For each
//! admission request it:
//! 1. Serializes the original pod as the diff baseline
//! 2. Runs every rule, in registration order, on its own copy of the pod
//! 3. Serializes the result and diffs it against the baseline
//! 4. Returns the JSON Patch operations as bytes
//!
//! Later rules observe the changes made by earlier ones. The chain is fixed at
//! construction, so one `Mutator` can serve concurrent requests behind an
//! `Arc` without locking.

mod env;
mod security_context;

use k8s_openapi::api::core::v1::Pod;
use tracing::{debug, warn};

use crate::{EnvInjectionConfig, Error, MutatorConfig, Result};

pub use env::InjectEnv;
pub use security_context::{is_pod_security_context_empty, InjectSecurityContext};

/// A single, stateless pod mutation rule
///
/// `mutate` must depend only on its input and the rule's fixed settings. It
/// returns a new pod and never changes the one it is given; on error no pod is
/// returned, so a failing rule can't leave half-applied changes behind.
#[cfg_attr(test, mockall::automock)]
pub trait PodMutator: Send + Sync {
    /// Short rule name used in diagnostics
    fn name(&self) -> &'static str;

    /// Return a mutated copy of `pod`
    fn mutate(&self, pod: &Pod) -> Result<Pod>;
}

/// Ordered mutation chain that produces JSON Patches
pub struct Mutator {
    mutators: Vec<Box<dyn PodMutator>>,
}

impl Mutator {
    /// Create the default chain: env injection, then security context defaults
    ///
    /// Fails with [`Error::Config`] if `config` does not validate.
    pub fn new(config: &MutatorConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::default_chain(config.env.clone()))
    }

    fn default_chain(env: EnvInjectionConfig) -> Self {
        Self::with_mutators(vec![
            Box::new(InjectEnv::new(env)),
            Box::new(InjectSecurityContext),
        ])
    }

    /// Create a chain from explicitly ordered rules
    pub fn with_mutators(mutators: Vec<Box<dyn PodMutator>>) -> Self {
        Self { mutators }
    }

    /// Registered rule names in application order
    pub fn names(&self) -> Vec<&'static str> {
        self.mutators.iter().map(|m| m.name()).collect()
    }

    /// Apply every rule in order to a copy of `pod`
    ///
    /// Stops at the first failing rule and returns its error.
    pub fn mutate_pod(&self, pod: &Pod) -> Result<Pod> {
        let mut mpod = pod.clone();

        for mutator in &self.mutators {
            mpod = mutator.mutate(&mpod).map_err(|e| {
                warn!(
                    mutation = mutator.name(),
                    pod = ?pod.metadata.name,
                    error = %e,
                    "Mutation failed, aborting chain"
                );
                e
            })?;
            debug!(mutation = mutator.name(), pod = ?pod.metadata.name, "Mutation applied");
        }

        Ok(mpod)
    }

    /// Compute the JSON Patch that turns `pod` into its mutated form
    ///
    /// The patch is checked against the baseline before it is returned; a
    /// patch that does not reproduce the mutated document is an error.
    pub fn patch(&self, pod: &Pod) -> Result<json_patch::Patch> {
        let original = serde_json::to_value(pod)?;
        let mpod = self.mutate_pod(pod)?;
        let mutated = serde_json::to_value(&mpod)?;

        let patch = json_patch::diff(&original, &mutated);

        let mut replay = original;
        json_patch::patch(&mut replay, &patch.0)
            .map_err(|e| Error::diff(format!("patch does not apply to original pod: {}", e)))?;
        if replay != mutated {
            return Err(Error::diff("patch does not reproduce the mutated pod"));
        }

        debug!(
            pod = ?pod.metadata.name,
            patch_ops = patch.0.len(),
            "Computed pod patch"
        );

        Ok(patch)
    }

    /// Compute the JSON Patch for `pod` and serialize it to bytes
    ///
    /// The output is a JSON array of `{"op", "path", "value"}` objects, ready
    /// to be embedded in an `AdmissionReview` response.
    pub fn mutate_pod_patch(&self, pod: &Pod) -> Result<Vec<u8>> {
        let patch = self.patch(pod)?;
        Ok(serde_json::to_vec(&patch)?)
    }
}

impl Default for Mutator {
    fn default() -> Self {
        Self::default_chain(EnvInjectionConfig::default())
    }
}

impl std::fmt::Debug for Mutator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mutator")
            .field("mutators", &self.names())
            .finish()
    }
}
