//! Typed records for everything read from or sent to OCI.
//!
//! Upstream JSON is converted into these once, at the boundary (see
//! `cli::wire`); nothing past that point touches untyped responses.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Datelike, Days, Duration, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use serde::{Serialize, Serializer};

use crate::error::{CloudError, Result};

/// Compartment OCID selecting the resources to inspect.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Scope(String);

impl Scope {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Tool arguments arrive as optional strings; blank means absent.
    pub fn from_optional(raw: Option<&str>) -> Option<Self> {
        raw.map(str::trim).filter(|s| !s.is_empty()).map(Self::new)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    Ingress,
    Egress,
}

/// IP protocol of a rule. OCI encodes it as `all` or an IANA number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Protocol {
    All,
    Icmp,
    Tcp,
    Udp,
    IcmpV6,
    Other(String),
}

impl Protocol {
    pub fn from_oci(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Protocol::All,
            "1" => Protocol::Icmp,
            "6" => Protocol::Tcp,
            "17" => Protocol::Udp,
            "58" => Protocol::IcmpV6,
            other => Protocol::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::All => f.write_str("all"),
            Protocol::Icmp => f.write_str("icmp"),
            Protocol::Tcp => f.write_str("tcp"),
            Protocol::Udp => f.write_str("udp"),
            Protocol::IcmpV6 => f.write_str("icmpv6"),
            Protocol::Other(n) => write!(f, "proto-{}", n),
        }
    }
}

impl Serialize for Protocol {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Inclusive destination port range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PortRange {
    pub min: u16,
    pub max: u16,
}

impl PortRange {
    pub fn single(port: u16) -> Self {
        Self { min: port, max: port }
    }
}

impl fmt::Display for PortRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}-{}", self.min, self.max)
        }
    }
}

/// The two rule-group kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum RuleGroupKind {
    /// VCN security lists: packet-filter style, attached to subnets.
    #[serde(rename = "security_list")]
    Stateless,
    /// Network security groups: connection-tracking, attached to VNICs.
    #[serde(rename = "network_security_group")]
    Stateful,
}

impl RuleGroupKind {
    pub fn label(&self) -> &'static str {
        match self {
            RuleGroupKind::Stateless => "security list",
            RuleGroupKind::Stateful => "network security group",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityRule {
    /// Peer range: the source of an ingress rule, the destination of an
    /// egress rule. Usually a CIDR; NSG rules may name an NSG or service.
    pub source: String,
    pub protocol: Protocol,
    /// `None` means every port.
    pub ports: Option<PortRange>,
    pub direction: Direction,
    pub group_id: String,
    pub group_kind: RuleGroupKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecurityRule {
    pub fn ports_label(&self) -> String {
        match self.ports {
            Some(range) => format!("port {}", range),
            None => "all ports".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleGroup {
    pub id: String,
    pub display_name: String,
    pub kind: RuleGroupKind,
    pub vcn_name: Option<String>,
    pub rules: Vec<SecurityRule>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Compartment {
    pub id: String,
    pub name: String,
    pub lifecycle_state: String,
    pub is_accessible: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Instance {
    pub id: String,
    pub display_name: String,
    pub shape: String,
    pub lifecycle_state: String,
    pub time_created: Option<String>,
    pub compartment_id: String,
    pub availability_domain: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InstanceDetails {
    #[serde(flatten)]
    pub instance: Instance,
    pub metadata: BTreeMap<String, String>,
    pub extended_metadata: serde_json::Value,
    pub vnics: Vec<Vnic>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Vnic {
    pub id: String,
    pub display_name: Option<String>,
    pub hostname_label: Option<String>,
    pub private_ip: Option<String>,
    pub public_ip: Option<String>,
    pub subnet_id: Option<String>,
    pub is_primary: Option<bool>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicInstance {
    pub instance_id: String,
    pub name: String,
    pub public_ip: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AutonomousDatabase {
    pub id: String,
    pub db_name: Option<String>,
    pub display_name: String,
    pub lifecycle_state: String,
    pub db_workload: Option<String>,
    pub cpu_core_count: Option<f64>,
    pub data_storage_size_in_tbs: Option<f64>,
    pub is_auto_scaling_enabled: Option<bool>,
    pub connection_strings: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Bucket {
    pub name: String,
    pub created: Option<String>,
    pub namespace: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tenancy {
    pub id: String,
    pub name: String,
    pub home_region_key: Option<String>,
    pub description: Option<String>,
}

/// Compute state transitions exposed to the assistant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InstanceAction {
    Start,
    Stop,
    Reset,
    SoftReset,
    SoftStop,
}

impl InstanceAction {
    pub const ALL: [InstanceAction; 5] = [
        InstanceAction::Reset,
        InstanceAction::SoftReset,
        InstanceAction::SoftStop,
        InstanceAction::Start,
        InstanceAction::Stop,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InstanceAction::Start => "START",
            InstanceAction::Stop => "STOP",
            InstanceAction::Reset => "RESET",
            InstanceAction::SoftReset => "SOFTRESET",
            InstanceAction::SoftStop => "SOFTSTOP",
        }
    }
}

impl FromStr for InstanceAction {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        InstanceAction::ALL
            .into_iter()
            .find(|a| a.as_str() == upper)
            .ok_or_else(|| {
                let allowed: Vec<&str> = InstanceAction::ALL.iter().map(|a| a.as_str()).collect();
                CloudError::InvalidArgument(format!(
                    "invalid action '{}'; allowed: {}",
                    upper,
                    allowed.join(", ")
                ))
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActionReceipt {
    pub instance_id: String,
    pub action: InstanceAction,
    pub lifecycle_state: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Granularity {
    Daily,
    Monthly,
}

impl Granularity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Granularity::Daily => "DAILY",
            Granularity::Monthly => "MONTHLY",
        }
    }
}

impl FromStr for Granularity {
    type Err = CloudError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "DAILY" => Ok(Granularity::Daily),
            "MONTHLY" => Ok(Granularity::Monthly),
            other => Err(CloudError::InvalidArgument(format!(
                "invalid granularity '{}'; allowed: DAILY, MONTHLY",
                other
            ))),
        }
    }
}

/// A validated Usage API query window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CostQuery {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub granularity: Granularity,
}

impl CostQuery {
    /// Build from optional ISO-8601 strings: end defaults to `now`, start to
    /// seven days before end. The Usage API wants both on a granularity
    /// boundary (midnight, or the first of the month), so start is rounded
    /// down and end up; the window never shrinks below what was asked for.
    pub fn from_iso(
        start: Option<&str>,
        end: Option<&str>,
        granularity: Option<&str>,
        now: DateTime<Utc>,
    ) -> Result<Self> {
        let granularity = match granularity.map(str::trim).filter(|s| !s.is_empty()) {
            Some(g) => g.parse()?,
            None => Granularity::Daily,
        };
        let end = match end.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse_iso(s)?,
            None => now,
        };
        let start = match start.map(str::trim).filter(|s| !s.is_empty()) {
            Some(s) => parse_iso(s)?,
            None => end - Duration::days(7),
        };
        if start >= end {
            return Err(CloudError::InvalidArgument(format!(
                "start {} must be before end {}",
                start.to_rfc3339(),
                end.to_rfc3339()
            )));
        }
        Ok(Self {
            start: floor(start, granularity),
            end: ceil(end, granularity),
            granularity,
        })
    }
}

/// Accepts RFC 3339, naive `YYYY-MM-DDTHH:MM:SS` (taken as UTC), or a bare date.
pub fn parse_iso(s: &str) -> Result<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f") {
        return Ok(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        if let Some(naive) = date.and_hms_opt(0, 0, 0) {
            return Ok(Utc.from_utc_datetime(&naive));
        }
    }
    Err(CloudError::InvalidArgument(format!(
        "'{}' is not an ISO-8601 timestamp",
        s
    )))
}

fn floor(ts: DateTime<Utc>, granularity: Granularity) -> DateTime<Utc> {
    let date = match granularity {
        Granularity::Daily => ts.date_naive(),
        Granularity::Monthly => ts.date_naive().with_day(1).unwrap_or(ts.date_naive()),
    };
    date.and_hms_opt(0, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or(ts)
}

fn ceil(ts: DateTime<Utc>, granularity: Granularity) -> DateTime<Utc> {
    let down = floor(ts, granularity);
    if down == ts {
        return ts;
    }
    let next = match granularity {
        Granularity::Daily => down.checked_add_days(Days::new(1)),
        Granularity::Monthly => down.checked_add_months(Months::new(1)),
    };
    next.unwrap_or(ts)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostItem {
    pub service: Option<String>,
    pub computed_amount: f64,
    pub currency: Option<String>,
    pub time_usage_started: Option<String>,
    pub time_usage_ended: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CostSummary {
    pub start: String,
    pub end: String,
    pub granularity: Granularity,
    pub total_computed_amount: f64,
    pub items: Vec<CostItem>,
}

impl CostSummary {
    pub fn from_items(query: &CostQuery, items: Vec<CostItem>) -> Self {
        let total_computed_amount = items.iter().map(|i| i.computed_amount).sum();
        Self {
            start: query.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            end: query.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true),
            granularity: query.granularity,
            total_computed_amount,
            items,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 15, 13, 45, 10).unwrap()
    }

    #[test]
    fn test_scope_blank_is_absent() {
        assert_eq!(Scope::from_optional(None), None);
        assert_eq!(Scope::from_optional(Some("   ")), None);
        assert_eq!(
            Scope::from_optional(Some(" ocid1.compartment.oc1..x ")),
            Some(Scope::new("ocid1.compartment.oc1..x"))
        );
    }

    #[test]
    fn test_protocol_labels() {
        assert_eq!(Protocol::from_oci("6").to_string(), "tcp");
        assert_eq!(Protocol::from_oci("ALL"), Protocol::All);
        assert_eq!(Protocol::from_oci("47").to_string(), "proto-47");
    }

    #[test]
    fn test_instance_action_parse_is_case_insensitive() {
        assert_eq!("softstop".parse::<InstanceAction>().unwrap(), InstanceAction::SoftStop);
        let err = "terminate".parse::<InstanceAction>().unwrap_err();
        assert_eq!(err.kind(), "InvalidArgumentError");
        assert!(err.to_string().contains("TERMINATE"));
    }

    #[test]
    fn test_cost_query_defaults_to_last_seven_days() {
        let q = CostQuery::from_iso(None, None, None, now()).unwrap();
        assert_eq!(q.granularity, Granularity::Daily);
        assert_eq!(q.end, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap());
        assert_eq!(q.start, Utc.with_ymd_and_hms(2026, 3, 8, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_cost_query_default_monthly_covers_current_month() {
        let q = CostQuery::from_iso(None, None, Some("MONTHLY"), now()).unwrap();
        assert_eq!(q.start, Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap());
        assert_eq!(q.end, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());
        assert!(q.start <= now() && now() < q.end);
    }

    #[test]
    fn test_cost_query_same_day_window() {
        let q = CostQuery::from_iso(
            Some("2026-03-15T01:00:00Z"),
            Some("2026-03-15T05:30:00Z"),
            Some("DAILY"),
            now(),
        )
        .unwrap();
        assert_eq!(q.start, Utc.with_ymd_and_hms(2026, 3, 15, 0, 0, 0).unwrap());
        assert_eq!(q.end, Utc.with_ymd_and_hms(2026, 3, 16, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_cost_query_keeps_boundary_end() {
        let q = CostQuery::from_iso(Some("2026-03-01"), Some("2026-03-10"), None, now()).unwrap();
        assert_eq!(q.end, Utc.with_ymd_and_hms(2026, 3, 10, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_cost_query_monthly_and_formats() {
        let q = CostQuery::from_iso(
            Some("2026-01-20"),
            Some("2026-03-02T10:00:00Z"),
            Some("monthly"),
            now(),
        )
        .unwrap();
        assert_eq!(q.start, Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap());
        assert_eq!(q.end, Utc.with_ymd_and_hms(2026, 4, 1, 0, 0, 0).unwrap());
    }

    #[test]
    fn test_cost_query_rejects_bad_input() {
        assert!(CostQuery::from_iso(Some("yesterday"), None, None, now()).is_err());
        assert!(CostQuery::from_iso(None, None, Some("HOURLY"), now()).is_err());
        assert!(CostQuery::from_iso(Some("2026-03-10"), Some("2026-03-01"), None, now()).is_err());
    }

    #[test]
    fn test_cost_summary_totals() {
        let q = CostQuery::from_iso(None, None, None, now()).unwrap();
        let item = |amount| CostItem {
            service: Some("COMPUTE".into()),
            computed_amount: amount,
            currency: Some("USD".into()),
            time_usage_started: None,
            time_usage_ended: None,
        };
        let s = CostSummary::from_items(&q, vec![item(1.5), item(2.25)]);
        assert!((s.total_computed_amount - 3.75).abs() < f64::EPSILON);
        assert_eq!(s.start, "2026-03-08T00:00:00Z");
    }
}
