//! Seams between the tools and the cloud.
//!
//! Implementations must be idempotent and side-effect-free for every read
//! method. Only [`InstanceActions`] changes cloud state.

use crate::error::Result;
use crate::model::{
    ActionReceipt, AutonomousDatabase, Bucket, Compartment, CostItem, CostQuery, Instance,
    InstanceAction, InstanceDetails, RuleGroup, Scope, Tenancy, Vnic,
};

/// Enumerates network rule groups of both kinds within one compartment.
pub trait RuleGroupSource {
    /// VCN security lists (stateless, packet-filter style).
    fn list_stateless_rule_groups(&self, scope: &Scope) -> Result<Vec<RuleGroup>>;

    /// Network security groups (stateful), with their rules loaded.
    fn list_stateful_rule_groups(&self, scope: &Scope) -> Result<Vec<RuleGroup>>;
}

/// Read-only inventory queries behind the pass-through tools.
pub trait InventorySource {
    /// Every accessible compartment in the tenancy subtree.
    fn list_compartments(&self) -> Result<Vec<Compartment>>;

    fn list_instances(&self, scope: &Scope) -> Result<Vec<Instance>>;

    fn get_instance(&self, instance_id: &str) -> Result<InstanceDetails>;

    /// VNICs attached to one instance.
    fn list_instance_vnics(&self, scope: &Scope, instance_id: &str) -> Result<Vec<Vnic>>;

    fn list_autonomous_databases(&self, scope: &Scope) -> Result<Vec<AutonomousDatabase>>;

    fn list_buckets(&self, scope: &Scope) -> Result<Vec<Bucket>>;

    fn get_tenancy(&self) -> Result<Tenancy>;

    fn summarize_costs(&self, query: &CostQuery) -> Result<Vec<CostItem>>;
}

/// Compute lifecycle transitions.
pub trait InstanceActions {
    fn instance_action(&self, instance_id: &str, action: InstanceAction) -> Result<ActionReceipt>;
}

/// Everything the MCP server needs from one backend.
pub trait CloudBackend: RuleGroupSource + InventorySource + InstanceActions {}

impl<T> CloudBackend for T where T: RuleGroupSource + InventorySource + InstanceActions {}
