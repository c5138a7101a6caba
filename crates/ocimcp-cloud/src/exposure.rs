//! Instances reachable from the internet through a public IP.
//!
//! Separate from the posture evaluator: this reports addresses, not rules.

use crate::error::Result;
use crate::model::{PublicInstance, Scope};
use crate::provider::InventorySource;

/// Every (instance, public IP) pair in `scope`. An instance with several
/// public VNICs appears once per address. Terminated instances are skipped.
pub fn public_instances<S>(source: &S, scope: &Scope) -> Result<Vec<PublicInstance>>
where
    S: InventorySource + ?Sized,
{
    let mut out = Vec::new();
    for instance in source.list_instances(scope)? {
        if instance.lifecycle_state.eq_ignore_ascii_case("TERMINATED") {
            continue;
        }
        for vnic in source.list_instance_vnics(scope, &instance.id)? {
            if let Some(ip) = vnic.public_ip.filter(|ip| !ip.is_empty()) {
                out.push(PublicInstance {
                    instance_id: instance.id.clone(),
                    name: instance.display_name.clone(),
                    public_ip: ip,
                });
            }
        }
    }
    tracing::debug!(scope = %scope, count = out.len(), "public instance scan complete");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CloudError;
    use crate::fake::{instance, vnic, FakeCloud};

    const SCOPE: &str = "ocid1.compartment.oc1..app";

    #[test]
    fn test_reports_each_public_vnic() {
        let cloud = FakeCloud::new()
            .with_instance(
                SCOPE,
                instance("i1", "web", SCOPE, "RUNNING"),
                vec![vnic("v1", Some("203.0.113.7")), vnic("v2", Some("203.0.113.8"))],
            )
            .with_instance(SCOPE, instance("i2", "db", SCOPE, "RUNNING"), vec![vnic("v3", None)]);

        let found = public_instances(&cloud, &Scope::new(SCOPE)).unwrap();
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|p| p.instance_id == "i1" && p.name == "web"));
        assert_eq!(found[1].public_ip, "203.0.113.8");
    }

    #[test]
    fn test_terminated_instances_are_not_queried() {
        let cloud = FakeCloud::new().with_instance(
            SCOPE,
            instance("i9", "gone", SCOPE, "TERMINATED"),
            vec![vnic("v9", Some("198.51.100.1"))],
        );
        assert!(public_instances(&cloud, &Scope::new(SCOPE)).unwrap().is_empty());
        assert!(!cloud.calls().iter().any(|c| c.starts_with("list_instance_vnics")));
    }

    #[test]
    fn test_vnic_failure_propagates() {
        let cloud = FakeCloud::new()
            .with_instance(SCOPE, instance("i1", "web", SCOPE, "RUNNING"), vec![])
            .fail("list_instance_vnics", CloudError::Authorization("denied".into()));
        let err = public_instances(&cloud, &Scope::new(SCOPE)).unwrap_err();
        assert_eq!(err.kind(), "AuthorizationError");
    }
}
