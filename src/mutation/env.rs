//! Environment variable injection
//!
//! Adds one fixed variable to every container and init container. What
//! happens when the name is already taken is decided by
//! [`EnvConflictPolicy`].

use k8s_openapi::api::core::v1::{Container, EnvVar, Pod};
use tracing::debug;

use super::PodMutator;
use crate::{EnvConflictPolicy, EnvInjectionConfig, Error, Result};

const NAME: &str = "inj_env";

/// Mutation injecting a fixed environment variable into all containers
#[derive(Debug, Clone, Default)]
pub struct InjectEnv {
    config: EnvInjectionConfig,
}

impl InjectEnv {
    /// Create the rule from its configuration
    pub fn new(config: EnvInjectionConfig) -> Self {
        Self { config }
    }

    fn env_var(&self) -> EnvVar {
        EnvVar {
            name: self.config.name.clone(),
            value: Some(self.config.value.clone()),
            value_from: None,
        }
    }

    /// Apply the variable to one container, returning whether it changed
    fn inject(&self, container: &mut Container) -> bool {
        let env = container.env.get_or_insert_with(Vec::new);

        match env.iter_mut().find(|e| e.name == self.config.name) {
            None => {
                env.push(self.env_var());
                true
            }
            Some(_) if self.config.on_conflict == EnvConflictPolicy::Skip => false,
            Some(existing) => {
                let wanted = self.env_var();
                if *existing == wanted {
                    return false;
                }
                *existing = wanted;
                true
            }
        }
    }
}

impl PodMutator for InjectEnv {
    fn name(&self) -> &'static str {
        NAME
    }

    fn mutate(&self, pod: &Pod) -> Result<Pod> {
        let mut mpod = pod.clone();
        let spec = mpod
            .spec
            .as_mut()
            .ok_or_else(|| Error::rule(NAME, "pod has no spec"))?;

        let containers = spec
            .containers
            .iter_mut()
            .chain(spec.init_containers.iter_mut().flatten());

        for container in containers {
            let changed = self.inject(container);
            debug!(
                mutation = NAME,
                container = %container.name,
                env = %self.config.name,
                changed,
                "Environment injection"
            );
        }

        Ok(mpod)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::test_fixtures::*;
    use k8s_openapi::api::core::v1::{EnvVarSource, ObjectFieldSelector};
    use pretty_assertions::assert_eq;

    fn literal(name: &str, value: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value: Some(value.to_string()),
            value_from: None,
        }
    }

    fn from_field(name: &str) -> EnvVar {
        EnvVar {
            name: name.to_string(),
            value: None,
            value_from: Some(EnvVarSource {
                field_ref: Some(ObjectFieldSelector {
                    field_path: "metadata.namespace".to_string(),
                    ..Default::default()
                }),
                ..Default::default()
            }),
        }
    }

    fn overwrite() -> InjectEnv {
        InjectEnv::new(EnvInjectionConfig {
            on_conflict: EnvConflictPolicy::Overwrite,
            ..Default::default()
        })
    }

    fn envs(pod: &Pod) -> Vec<Option<Vec<EnvVar>>> {
        let spec = pod.spec.as_ref().expect("spec");
        spec.containers
            .iter()
            .chain(spec.init_containers.iter().flatten())
            .map(|c| c.env.clone())
            .collect()
    }

    #[test]
    fn test_injects_into_containers_and_init_containers() {
        let got = InjectEnv::default()
            .mutate(&bare_pod("test"))
            .expect("mutation should succeed");

        assert_eq!(
            envs(&got),
            vec![
                Some(vec![literal("KUBE", "true")]),
                Some(vec![literal("KUBE", "true")])
            ]
        );
    }

    #[test]
    fn test_appends_after_existing_entries() {
        let mut pod = bare_pod("test");
        pod.spec.as_mut().expect("spec").containers[0].env =
            Some(vec![literal("A", "1"), literal("B", "2")]);

        let got = InjectEnv::default().mutate(&pod).expect("should succeed");

        assert_eq!(
            envs(&got)[0],
            Some(vec![literal("A", "1"), literal("B", "2"), literal("KUBE", "true")])
        );
    }

    #[test]
    fn test_skip_policy_leaves_conflicting_variable() {
        let mut pod = bare_pod("test");
        pod.spec.as_mut().expect("spec").containers[0].env = Some(vec![literal("KUBE", "false")]);

        let got = InjectEnv::default().mutate(&pod).expect("should succeed");

        assert_eq!(envs(&got)[0], Some(vec![literal("KUBE", "false")]));
        // The init container had no conflict
        assert_eq!(envs(&got)[1], Some(vec![literal("KUBE", "true")]));
    }

    #[test]
    fn test_overwrite_policy_replaces_value_in_place() {
        let mut pod = bare_pod("test");
        pod.spec.as_mut().expect("spec").containers[0].env = Some(vec![
            literal("A", "1"),
            from_field("KUBE"),
            literal("B", "2"),
        ]);

        let got = overwrite().mutate(&pod).expect("should succeed");

        assert_eq!(
            envs(&got)[0],
            Some(vec![literal("A", "1"), literal("KUBE", "true"), literal("B", "2")])
        );
    }

    #[test]
    fn test_custom_variable() {
        let rule = InjectEnv::new(EnvInjectionConfig {
            name: "CLUSTER".to_string(),
            value: "prod".to_string(),
            on_conflict: EnvConflictPolicy::Skip,
        });

        let got = rule.mutate(&bare_pod("test")).expect("should succeed");
        assert_eq!(envs(&got)[0], Some(vec![literal("CLUSTER", "prod")]));
    }

    #[test]
    fn test_is_idempotent_under_both_policies() {
        for rule in [InjectEnv::default(), overwrite()] {
            let once = rule.mutate(&bare_pod("test")).expect("should succeed");
            let twice = rule.mutate(&once).expect("should succeed");
            assert_eq!(once, twice);
        }
    }

    #[test]
    fn test_does_not_touch_security_context_or_order() {
        let mut pod = bare_pod("test");
        pod.spec.as_mut().expect("spec").containers.push(container("sidecar"));

        let got = InjectEnv::default().mutate(&pod).expect("should succeed");
        let spec = got.spec.expect("spec");

        let names: Vec<&str> = spec.containers.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["test", "sidecar"]);
        assert!(spec.security_context.is_none());
        assert!(spec.containers.iter().all(|c| c.security_context.is_none()));
    }

    #[test]
    fn test_pod_without_spec_fails() {
        let err = InjectEnv::default().mutate(&Pod::default()).unwrap_err();
        assert!(matches!(err, Error::Rule { mutation: NAME, .. }));
    }
}
