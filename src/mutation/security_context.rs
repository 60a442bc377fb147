//! Security context defaulting
//!
//! Injects a hardened security floor where nothing has been configured:
//! - Pod level: only when the pod security context is *empty* (absent, or
//!   every field unset). A single configured field keeps the whole context.
//! - Container level: only when the container has *no* security context at
//!   all. Any existing context, however partial, is kept as-is.

use k8s_openapi::api::core::v1::{
    Capabilities, Container, Pod, PodSecurityContext, SecurityContext,
};
use tracing::debug;

use super::PodMutator;
use crate::{Error, Result, DEFAULT_RUN_AS_GROUP, DEFAULT_RUN_AS_USER, DROP_ALL_CAPABILITIES};

const NAME: &str = "inj_sec_context";

/// Mutation injecting default pod and container security contexts
#[derive(Debug, Clone, Copy, Default)]
pub struct InjectSecurityContext;

impl InjectSecurityContext {
    /// Pod-level context applied when none is configured
    pub fn default_pod_security_context() -> PodSecurityContext {
        PodSecurityContext {
            run_as_user: Some(DEFAULT_RUN_AS_USER),
            run_as_group: Some(DEFAULT_RUN_AS_GROUP),
            run_as_non_root: Some(true),
            ..Default::default()
        }
    }

    /// Container-level context applied to containers without one
    pub fn default_container_security_context() -> SecurityContext {
        SecurityContext {
            read_only_root_filesystem: Some(true),
            allow_privilege_escalation: Some(false),
            run_as_non_root: Some(true),
            capabilities: Some(Capabilities {
                drop: Some(vec![DROP_ALL_CAPABILITIES.to_string()]),
                ..Default::default()
            }),
            ..Default::default()
        }
    }
}

fn default_missing_container_contexts(containers: &mut [Container]) {
    for container in containers.iter_mut() {
        if container.security_context.is_none() {
            container.security_context =
                Some(InjectSecurityContext::default_container_security_context());
        }
    }
}

impl PodMutator for InjectSecurityContext {
    fn name(&self) -> &'static str {
        NAME
    }

    fn mutate(&self, pod: &Pod) -> Result<Pod> {
        let mut mpod = pod.clone();
        let spec = mpod
            .spec
            .as_mut()
            .ok_or_else(|| Error::rule(NAME, "pod has no spec"))?;

        debug!(
            mutation = NAME,
            p_sc_before = ?spec.security_context,
            c_sc_before = ?spec.containers.first().and_then(|c| c.security_context.as_ref()),
            "Security context before mutation"
        );

        if is_pod_security_context_empty(spec.security_context.as_ref()) {
            spec.security_context = Some(Self::default_pod_security_context());
        }

        default_missing_container_contexts(&mut spec.containers);
        if let Some(init_containers) = spec.init_containers.as_mut() {
            default_missing_container_contexts(init_containers);
        }

        debug!(
            mutation = NAME,
            p_sc_after = ?spec.security_context,
            c_sc_after = ?spec.containers.first().and_then(|c| c.security_context.as_ref()),
            "Security context after mutation"
        );

        Ok(mpod)
    }
}

/// Whether a pod security context carries no configuration at all
///
/// Absent contexts are empty. Empty `supplementalGroups` and `sysctls` lists
/// count as unset; every other field counts as soon as it is present.
pub fn is_pod_security_context_empty(psc: Option<&PodSecurityContext>) -> bool {
    let Some(psc) = psc else {
        return true;
    };

    let mut normalized = psc.clone();
    if normalized
        .supplemental_groups
        .as_ref()
        .is_some_and(Vec::is_empty)
    {
        normalized.supplemental_groups = None;
    }
    if normalized.sysctls.as_ref().is_some_and(Vec::is_empty) {
        normalized.sysctls = None;
    }

    normalized == PodSecurityContext::default()
}
