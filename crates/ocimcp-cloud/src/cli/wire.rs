//! JSON records exactly as the `oci` CLI prints them (kebab-case keys).
//!
//! Each record is deserialized once and converted into a `model` type;
//! missing required fields surface as `UnexpectedUpstream`.

use std::collections::{BTreeMap, HashMap};

use serde::de::DeserializeOwned;
use serde::Deserialize;

use crate::error::{CloudError, Result};
use crate::model::{
    AutonomousDatabase, Bucket, Compartment, CostItem, Direction, Instance, PortRange, Protocol,
    RuleGroup, RuleGroupKind, SecurityRule, Tenancy, Vnic,
};

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

/// `{"data": ...}` from a get/action call.
pub fn parse_data<T: DeserializeOwned>(operation: &str, stdout: &str) -> Result<T> {
    serde_json::from_str::<Envelope<T>>(stdout.trim())
        .map(|e| e.data)
        .map_err(|e| CloudError::UnexpectedUpstream(format!("{}: {}", operation, e)))
}

/// `{"data": [...]}` from a list call. The CLI prints nothing for an empty
/// listing, which is an empty list, not an error.
pub fn parse_list<T: DeserializeOwned>(operation: &str, stdout: &str) -> Result<Vec<T>> {
    if stdout.trim().is_empty() {
        return Ok(Vec::new());
    }
    parse_data(operation, stdout)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireCompartment {
    pub id: String,
    pub name: String,
    pub lifecycle_state: String,
    #[serde(default)]
    pub is_accessible: Option<bool>,
}

impl From<WireCompartment> for Compartment {
    fn from(w: WireCompartment) -> Self {
        Compartment {
            id: w.id,
            name: w.name,
            lifecycle_state: w.lifecycle_state,
            is_accessible: w.is_accessible,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireVcn {
    pub id: String,
    pub display_name: String,
}

/// VCN id → display name, for labelling rule groups.
pub fn vcn_names(vcns: Vec<WireVcn>) -> HashMap<String, String> {
    vcns.into_iter().map(|v| (v.id, v.display_name)).collect()
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WirePortRange {
    pub min: u16,
    pub max: u16,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WirePortOptions {
    #[serde(default)]
    pub destination_port_range: Option<WirePortRange>,
}

fn port_range(tcp: &Option<WirePortOptions>, udp: &Option<WirePortOptions>) -> Option<PortRange> {
    tcp.as_ref()
        .or(udp.as_ref())
        .and_then(|o| o.destination_port_range.as_ref())
        .map(|r| PortRange { min: r.min, max: r.max })
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireIngressRule {
    pub source: String,
    pub protocol: String,
    #[serde(default)]
    pub tcp_options: Option<WirePortOptions>,
    #[serde(default)]
    pub udp_options: Option<WirePortOptions>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireEgressRule {
    pub destination: String,
    pub protocol: String,
    #[serde(default)]
    pub tcp_options: Option<WirePortOptions>,
    #[serde(default)]
    pub udp_options: Option<WirePortOptions>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireSecurityList {
    pub id: String,
    pub display_name: String,
    pub vcn_id: String,
    #[serde(default)]
    pub ingress_security_rules: Vec<WireIngressRule>,
    #[serde(default)]
    pub egress_security_rules: Vec<WireEgressRule>,
}

impl WireSecurityList {
    pub fn into_group(self, vcns: &HashMap<String, String>) -> RuleGroup {
        let kind = RuleGroupKind::Stateless;
        let mut rules = Vec::with_capacity(
            self.ingress_security_rules.len() + self.egress_security_rules.len(),
        );
        for r in self.ingress_security_rules {
            rules.push(SecurityRule {
                ports: port_range(&r.tcp_options, &r.udp_options),
                source: r.source,
                protocol: Protocol::from_oci(&r.protocol),
                direction: Direction::Ingress,
                group_id: self.id.clone(),
                group_kind: kind,
                description: r.description,
            });
        }
        for r in self.egress_security_rules {
            rules.push(SecurityRule {
                ports: port_range(&r.tcp_options, &r.udp_options),
                source: r.destination,
                protocol: Protocol::from_oci(&r.protocol),
                direction: Direction::Egress,
                group_id: self.id.clone(),
                group_kind: kind,
                description: r.description,
            });
        }
        RuleGroup {
            vcn_name: vcns.get(&self.vcn_id).cloned(),
            id: self.id,
            display_name: self.display_name,
            kind,
            rules,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireNsg {
    pub id: String,
    pub display_name: String,
    pub vcn_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireNsgRule {
    pub direction: String,
    pub protocol: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub destination: Option<String>,
    #[serde(default)]
    pub tcp_options: Option<WirePortOptions>,
    #[serde(default)]
    pub udp_options: Option<WirePortOptions>,
    #[serde(default)]
    pub description: Option<String>,
}

impl WireNsg {
    pub fn into_group(
        self,
        wire_rules: Vec<WireNsgRule>,
        vcns: &HashMap<String, String>,
    ) -> Result<RuleGroup> {
        let kind = RuleGroupKind::Stateful;
        let mut rules = Vec::with_capacity(wire_rules.len());
        for r in wire_rules {
            let direction = match r.direction.as_str() {
                "INGRESS" => Direction::Ingress,
                "EGRESS" => Direction::Egress,
                other => {
                    return Err(CloudError::UnexpectedUpstream(format!(
                        "NSG {} rule has unknown direction '{}'",
                        self.id, other
                    )))
                }
            };
            let peer = match direction {
                Direction::Ingress => r.source,
                Direction::Egress => r.destination,
            };
            rules.push(SecurityRule {
                ports: port_range(&r.tcp_options, &r.udp_options),
                source: peer.unwrap_or_default(),
                protocol: Protocol::from_oci(&r.protocol),
                direction,
                group_id: self.id.clone(),
                group_kind: kind,
                description: r.description,
            });
        }
        Ok(RuleGroup {
            vcn_name: vcns.get(&self.vcn_id).cloned(),
            id: self.id,
            display_name: self.display_name,
            kind,
            rules,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireInstance {
    pub id: String,
    pub display_name: String,
    pub shape: String,
    pub lifecycle_state: String,
    #[serde(default)]
    pub time_created: Option<String>,
    pub compartment_id: String,
    #[serde(default)]
    pub availability_domain: Option<String>,
    #[serde(default)]
    pub metadata: Option<BTreeMap<String, String>>,
    #[serde(default)]
    pub extended_metadata: Option<serde_json::Value>,
}

impl WireInstance {
    pub fn split(self) -> (Instance, BTreeMap<String, String>, serde_json::Value) {
        let instance = Instance {
            id: self.id,
            display_name: self.display_name,
            shape: self.shape,
            lifecycle_state: self.lifecycle_state,
            time_created: self.time_created,
            compartment_id: self.compartment_id,
            availability_domain: self.availability_domain,
        };
        (
            instance,
            self.metadata.unwrap_or_default(),
            self.extended_metadata.unwrap_or(serde_json::Value::Null),
        )
    }
}

impl From<WireInstance> for Instance {
    fn from(w: WireInstance) -> Self {
        w.split().0
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireVnicAttachment {
    /// Absent while the attachment is still being created or was detached.
    #[serde(default)]
    pub vnic_id: Option<String>,
    pub lifecycle_state: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireVnic {
    pub id: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub hostname_label: Option<String>,
    #[serde(default)]
    pub private_ip: Option<String>,
    #[serde(default)]
    pub public_ip: Option<String>,
    #[serde(default)]
    pub subnet_id: Option<String>,
    #[serde(default)]
    pub is_primary: Option<bool>,
}

impl From<WireVnic> for Vnic {
    fn from(w: WireVnic) -> Self {
        Vnic {
            id: w.id,
            display_name: w.display_name,
            hostname_label: w.hostname_label,
            private_ip: w.private_ip,
            public_ip: w.public_ip,
            subnet_id: w.subnet_id,
            is_primary: w.is_primary,
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireAutonomousDatabase {
    pub id: String,
    #[serde(default)]
    pub db_name: Option<String>,
    pub display_name: String,
    pub lifecycle_state: String,
    #[serde(default)]
    pub db_workload: Option<String>,
    #[serde(default)]
    pub cpu_core_count: Option<f64>,
    #[serde(default)]
    pub data_storage_size_in_tbs: Option<f64>,
    #[serde(default)]
    pub is_auto_scaling_enabled: Option<bool>,
    #[serde(default)]
    pub connection_strings: Option<serde_json::Value>,
}

impl From<WireAutonomousDatabase> for AutonomousDatabase {
    fn from(w: WireAutonomousDatabase) -> Self {
        AutonomousDatabase {
            id: w.id,
            db_name: w.db_name,
            display_name: w.display_name,
            lifecycle_state: w.lifecycle_state,
            db_workload: w.db_workload,
            cpu_core_count: w.cpu_core_count,
            data_storage_size_in_tbs: w.data_storage_size_in_tbs,
            is_auto_scaling_enabled: w.is_auto_scaling_enabled,
            connection_strings: w.connection_strings.unwrap_or(serde_json::Value::Null),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireBucket {
    pub name: String,
    #[serde(default)]
    pub time_created: Option<String>,
}

impl WireBucket {
    pub fn into_bucket(self, namespace: &str) -> Bucket {
        Bucket {
            name: self.name,
            created: self.time_created,
            namespace: namespace.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireTenancy {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub home_region_key: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

impl From<WireTenancy> for Tenancy {
    fn from(w: WireTenancy) -> Self {
        Tenancy {
            id: w.id,
            name: w.name,
            home_region_key: w.home_region_key,
            description: w.description,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct WireUsageCollection {
    #[serde(default)]
    pub items: Vec<WireUsageItem>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct WireUsageItem {
    #[serde(default)]
    pub service: Option<String>,
    #[serde(default)]
    pub computed_amount: Option<f64>,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub time_usage_started: Option<String>,
    #[serde(default)]
    pub time_usage_ended: Option<String>,
}

impl From<WireUsageItem> for CostItem {
    fn from(w: WireUsageItem) -> Self {
        CostItem {
            service: w.service,
            computed_amount: w.computed_amount.unwrap_or(0.0),
            currency: w.currency,
            time_usage_started: w.time_usage_started,
            time_usage_ended: w.time_usage_ended,
        }
    }
}
