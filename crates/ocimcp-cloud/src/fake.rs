//! In-memory backend serving a fixed snapshot, for tests.

use std::cell::RefCell;
use std::collections::BTreeMap;

use crate::error::{CloudError, Result};
use crate::model::{
    ActionReceipt, AutonomousDatabase, Bucket, Compartment, CostItem, CostQuery, Direction,
    Instance, InstanceAction, InstanceDetails, PortRange, Protocol, RuleGroup, RuleGroupKind,
    Scope, SecurityRule, Tenancy, Vnic,
};
use crate::provider::{InstanceActions, InventorySource, RuleGroupSource};

/// Snapshot keyed by compartment id (or instance id for VNICs).
///
/// Every call is recorded as `"<operation> <argument>"`; a failure registered
/// with [`FakeCloud::fail`] is returned instead of data for that operation.
#[derive(Debug, Default)]
pub struct FakeCloud {
    pub stateless: BTreeMap<String, Vec<RuleGroup>>,
    pub stateful: BTreeMap<String, Vec<RuleGroup>>,
    pub compartments: Vec<Compartment>,
    pub instances: BTreeMap<String, Vec<Instance>>,
    pub vnics: BTreeMap<String, Vec<Vnic>>,
    pub databases: BTreeMap<String, Vec<AutonomousDatabase>>,
    pub buckets: BTreeMap<String, Vec<Bucket>>,
    pub tenancy: Option<Tenancy>,
    pub costs: Vec<CostItem>,
    failures: BTreeMap<&'static str, CloudError>,
    calls: RefCell<Vec<String>>,
}

impl FakeCloud {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stateless(mut self, scope: &str, groups: Vec<RuleGroup>) -> Self {
        self.stateless.insert(scope.to_string(), groups);
        self
    }

    pub fn with_stateful(mut self, scope: &str, groups: Vec<RuleGroup>) -> Self {
        self.stateful.insert(scope.to_string(), groups);
        self
    }

    pub fn with_compartment(mut self, id: &str, name: &str) -> Self {
        self.compartments.push(Compartment {
            id: id.to_string(),
            name: name.to_string(),
            lifecycle_state: "ACTIVE".to_string(),
            is_accessible: Some(true),
        });
        self
    }

    pub fn with_instance(mut self, scope: &str, instance: Instance, vnics: Vec<Vnic>) -> Self {
        self.vnics.insert(instance.id.clone(), vnics);
        self.instances
            .entry(scope.to_string())
            .or_default()
            .push(instance);
        self
    }

    /// Make `operation` (a trait method name) fail with `err`.
    pub fn fail(mut self, operation: &'static str, err: CloudError) -> Self {
        self.failures.insert(operation, err);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }

    fn enter(&self, operation: &'static str, arg: &str) -> Result<()> {
        self.calls.borrow_mut().push(format!("{} {}", operation, arg));
        match self.failures.get(operation) {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

/// A TCP rule; `port` of `None` means all ports.
pub fn rule(source: &str, direction: Direction, port: Option<u16>) -> SecurityRule {
    SecurityRule {
        source: source.to_string(),
        protocol: Protocol::Tcp,
        ports: port.map(PortRange::single),
        direction,
        group_id: String::new(),
        group_kind: RuleGroupKind::Stateless,
        description: None,
    }
}

/// A group owning `rules`; each rule's owning-group fields are filled in.
pub fn group(id: &str, name: &str, kind: RuleGroupKind, rules: Vec<SecurityRule>) -> RuleGroup {
    let rules = rules
        .into_iter()
        .map(|mut r| {
            r.group_id = id.to_string();
            r.group_kind = kind;
            r
        })
        .collect();
    RuleGroup {
        id: id.to_string(),
        display_name: name.to_string(),
        kind,
        vcn_name: Some("vcn-main".to_string()),
        rules,
    }
}

pub fn instance(id: &str, name: &str, scope: &str, state: &str) -> Instance {
    Instance {
        id: id.to_string(),
        display_name: name.to_string(),
        shape: "VM.Standard.E4.Flex".to_string(),
        lifecycle_state: state.to_string(),
        time_created: Some("2026-01-05T08:00:00Z".to_string()),
        compartment_id: scope.to_string(),
        availability_domain: Some("AD-1".to_string()),
    }
}

pub fn vnic(id: &str, public_ip: Option<&str>) -> Vnic {
    Vnic {
        id: id.to_string(),
        display_name: Some(id.to_string()),
        hostname_label: None,
        private_ip: Some("10.0.0.2".to_string()),
        public_ip: public_ip.map(str::to_string),
        subnet_id: Some("ocid1.subnet.oc1..s".to_string()),
        is_primary: Some(true),
    }
}

impl RuleGroupSource for FakeCloud {
    fn list_stateless_rule_groups(&self, scope: &Scope) -> Result<Vec<RuleGroup>> {
        self.enter("list_stateless_rule_groups", scope.as_str())?;
        Ok(self.stateless.get(scope.as_str()).cloned().unwrap_or_default())
    }

    fn list_stateful_rule_groups(&self, scope: &Scope) -> Result<Vec<RuleGroup>> {
        self.enter("list_stateful_rule_groups", scope.as_str())?;
        Ok(self.stateful.get(scope.as_str()).cloned().unwrap_or_default())
    }
}

impl InventorySource for FakeCloud {
    fn list_compartments(&self) -> Result<Vec<Compartment>> {
        self.enter("list_compartments", "")?;
        Ok(self.compartments.clone())
    }

    fn list_instances(&self, scope: &Scope) -> Result<Vec<Instance>> {
        self.enter("list_instances", scope.as_str())?;
        Ok(self.instances.get(scope.as_str()).cloned().unwrap_or_default())
    }

    fn get_instance(&self, instance_id: &str) -> Result<InstanceDetails> {
        self.enter("get_instance", instance_id)?;
        let instance = self
            .instances
            .values()
            .flatten()
            .find(|i| i.id == instance_id)
            .cloned()
            .ok_or_else(|| CloudError::ScopeNotFound(instance_id.to_string()))?;
        Ok(InstanceDetails {
            instance,
            metadata: BTreeMap::new(),
            extended_metadata: serde_json::Value::Null,
            vnics: self.vnics.get(instance_id).cloned().unwrap_or_default(),
        })
    }

    fn list_instance_vnics(&self, _scope: &Scope, instance_id: &str) -> Result<Vec<Vnic>> {
        self.enter("list_instance_vnics", instance_id)?;
        Ok(self.vnics.get(instance_id).cloned().unwrap_or_default())
    }

    fn list_autonomous_databases(&self, scope: &Scope) -> Result<Vec<AutonomousDatabase>> {
        self.enter("list_autonomous_databases", scope.as_str())?;
        Ok(self.databases.get(scope.as_str()).cloned().unwrap_or_default())
    }

    fn list_buckets(&self, scope: &Scope) -> Result<Vec<Bucket>> {
        self.enter("list_buckets", scope.as_str())?;
        Ok(self.buckets.get(scope.as_str()).cloned().unwrap_or_default())
    }

    fn get_tenancy(&self) -> Result<Tenancy> {
        self.enter("get_tenancy", "")?;
        self.tenancy
            .clone()
            .ok_or_else(|| CloudError::ScopeNotFound("tenancy".to_string()))
    }

    fn summarize_costs(&self, query: &CostQuery) -> Result<Vec<CostItem>> {
        self.enter("summarize_costs", query.granularity.as_str())?;
        Ok(self.costs.clone())
    }
}

impl InstanceActions for FakeCloud {
    fn instance_action(&self, instance_id: &str, action: InstanceAction) -> Result<ActionReceipt> {
        self.enter("instance_action", &format!("{} {}", instance_id, action.as_str()))?;
        let lifecycle_state = match action {
            InstanceAction::Start => "STARTING",
            InstanceAction::Stop | InstanceAction::SoftStop => "STOPPING",
            InstanceAction::Reset | InstanceAction::SoftReset => "RUNNING",
        };
        Ok(ActionReceipt {
            instance_id: instance_id.to_string(),
            action,
            lifecycle_state: lifecycle_state.to_string(),
        })
    }
}
