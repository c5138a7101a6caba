//! Backend that drives the official `oci` command-line client.
//!
//! Authentication, request signing, pagination (`--all`) and retries are the
//! CLI's job. This module only builds argument lists, bounds each call with
//! the configured timeout, and converts the JSON it prints into model types.

mod classify;
mod runner;
mod wire;

use std::collections::HashMap;

use ocimcp_core::config::{Credentials, OciSettings};

use crate::error::{CloudError, Result};
use crate::model::{
    ActionReceipt, AutonomousDatabase, Bucket, Compartment, CostItem, CostQuery, Instance,
    InstanceAction, InstanceDetails, RuleGroup, Scope, Tenancy, Vnic,
};
use crate::provider::{InstanceActions, InventorySource, RuleGroupSource};

pub use classify::classify_failure;
pub use runner::{wait_with_timeout, CommandRunner, Invocation, ProcessOutput, ProcessRunner};

use wire::{
    parse_data, parse_list, vcn_names, WireAutonomousDatabase, WireBucket, WireCompartment,
    WireInstance, WireNsg, WireNsgRule, WireSecurityList, WireTenancy, WireUsageCollection,
    WireVcn, WireVnic, WireVnicAttachment,
};

pub struct OciCli<R = ProcessRunner> {
    settings: OciSettings,
    runner: R,
}

impl OciCli<ProcessRunner> {
    pub fn new(settings: OciSettings) -> Self {
        Self::with_runner(settings, ProcessRunner)
    }
}

impl<R: CommandRunner> OciCli<R> {
    pub fn with_runner(settings: OciSettings, runner: R) -> Self {
        Self { settings, runner }
    }

    pub fn settings(&self) -> &OciSettings {
        &self.settings
    }

    /// Global options; they must precede the service subcommand.
    fn global_args(&self) -> Vec<String> {
        let mut args = vec!["--output".to_string(), "json".to_string()];
        match &self.settings.credentials {
            Credentials::ConfigFile { path, profile } => {
                args.push("--config-file".into());
                args.push(path.to_string_lossy().to_string());
                args.push("--profile".into());
                args.push(profile.clone());
            }
            Credentials::Environment { .. } => {}
            Credentials::ResourcePrincipal => {
                args.push("--auth".into());
                args.push("resource_principal".into());
                if let Some(region) = &self.settings.region {
                    args.push("--region".into());
                    args.push(region.clone());
                }
            }
        }
        args
    }

    fn envs(&self) -> Vec<(String, String)> {
        let mut envs = vec![(
            "OCI_CLI_SUPPRESS_FILE_PERMISSIONS_WARNING".to_string(),
            "True".to_string(),
        )];
        if let Credentials::Environment {
            user,
            fingerprint,
            tenancy,
            region,
            key_file,
        } = &self.settings.credentials
        {
            envs.push(("OCI_CLI_USER".into(), user.clone()));
            envs.push(("OCI_CLI_FINGERPRINT".into(), fingerprint.clone()));
            envs.push(("OCI_CLI_TENANCY".into(), tenancy.clone()));
            envs.push(("OCI_CLI_REGION".into(), region.clone()));
            envs.push(("OCI_CLI_KEY_FILE".into(), key_file.clone()));
        }
        envs
    }

    /// Run `oci <command...> <params...>` and return stdout of a successful call.
    fn call(&self, command: &[&str], params: &[(&str, &str)], all: bool) -> Result<String> {
        let operation = command.join(" ");
        let mut args = self.global_args();
        args.extend(command.iter().map(|s| s.to_string()));
        for (flag, value) in params {
            args.push(format!("--{}", flag));
            args.push(value.to_string());
        }
        if all {
            args.push("--all".into());
        }
        let envs = self.envs();

        tracing::debug!(operation = %operation, "calling oci");
        let output = self.runner.run(&Invocation {
            program: &self.settings.client.cli_path,
            args: &args,
            envs: &envs,
            timeout: self.settings.client.timeout,
            operation: &operation,
        })?;
        if !output.success() {
            let err = classify_failure(&operation, output.exit_code, &output.stderr);
            tracing::warn!(operation = %operation, kind = err.kind(), "oci call failed: {}", err);
            return Err(err);
        }
        Ok(output.stdout)
    }

    fn list<T: serde::de::DeserializeOwned>(
        &self,
        command: &[&str],
        params: &[(&str, &str)],
    ) -> Result<Vec<T>> {
        let stdout = self.call(command, params, true)?;
        parse_list(&command.join(" "), &stdout)
    }

    fn get<T: serde::de::DeserializeOwned>(
        &self,
        command: &[&str],
        params: &[(&str, &str)],
    ) -> Result<T> {
        let stdout = self.call(command, params, false)?;
        parse_data(&command.join(" "), &stdout)
    }

    fn tenancy_id(&self) -> Result<&str> {
        self.settings.tenancy.as_deref().ok_or_else(|| {
            CloudError::ClientUnavailable(
                "tenancy OCID unknown; set it in the OCI config profile or OCI_TENANCY_OCID"
                    .to_string(),
            )
        })
    }

    fn vcn_names(&self, scope: &Scope) -> Result<HashMap<String, String>> {
        let vcns: Vec<WireVcn> =
            self.list(&["network", "vcn", "list"], &[("compartment-id", scope.as_str())])?;
        Ok(vcn_names(vcns))
    }

    fn vnics_for(&self, compartment_id: &str, instance_id: &str) -> Result<Vec<Vnic>> {
        let attachments: Vec<WireVnicAttachment> = self.list(
            &["compute", "vnic-attachment", "list"],
            &[("compartment-id", compartment_id), ("instance-id", instance_id)],
        )?;
        let mut vnics = Vec::new();
        for att in attachments {
            if att.lifecycle_state != "ATTACHED" {
                continue;
            }
            let Some(vnic_id) = att.vnic_id else {
                continue;
            };
            let vnic: WireVnic = self.get(&["network", "vnic", "get"], &[("vnic-id", vnic_id.as_str())])?;
            vnics.push(vnic.into());
        }
        Ok(vnics)
    }
}

impl<R: CommandRunner> RuleGroupSource for OciCli<R> {
    fn list_stateless_rule_groups(&self, scope: &Scope) -> Result<Vec<RuleGroup>> {
        let vcns = self.vcn_names(scope)?;
        let lists: Vec<WireSecurityList> = self.list(
            &["network", "security-list", "list"],
            &[("compartment-id", scope.as_str())],
        )?;
        Ok(lists.into_iter().map(|l| l.into_group(&vcns)).collect())
    }

    fn list_stateful_rule_groups(&self, scope: &Scope) -> Result<Vec<RuleGroup>> {
        let vcns = self.vcn_names(scope)?;
        let nsgs: Vec<WireNsg> =
            self.list(&["network", "nsg", "list"], &[("compartment-id", scope.as_str())])?;
        let mut groups = Vec::with_capacity(nsgs.len());
        for nsg in nsgs {
            let rules: Vec<WireNsgRule> =
                self.list(&["network", "nsg", "rules", "list"], &[("nsg-id", nsg.id.as_str())])?;
            groups.push(nsg.into_group(rules, &vcns)?);
        }
        Ok(groups)
    }
}

impl<R: CommandRunner> InventorySource for OciCli<R> {
    fn list_compartments(&self) -> Result<Vec<Compartment>> {
        let tenancy = self.tenancy_id()?;
        let items: Vec<WireCompartment> = self.list(
            &["iam", "compartment", "list"],
            &[
                ("compartment-id", tenancy),
                ("compartment-id-in-subtree", "true"),
                ("access-level", "ACCESSIBLE"),
            ],
        )?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    fn list_instances(&self, scope: &Scope) -> Result<Vec<Instance>> {
        let items: Vec<WireInstance> =
            self.list(&["compute", "instance", "list"], &[("compartment-id", scope.as_str())])?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    fn get_instance(&self, instance_id: &str) -> Result<InstanceDetails> {
        let wire: WireInstance =
            self.get(&["compute", "instance", "get"], &[("instance-id", instance_id)])?;
        let (instance, metadata, extended_metadata) = wire.split();
        let vnics = self.vnics_for(&instance.compartment_id, &instance.id)?;
        Ok(InstanceDetails {
            instance,
            metadata,
            extended_metadata,
            vnics,
        })
    }

    fn list_instance_vnics(&self, scope: &Scope, instance_id: &str) -> Result<Vec<Vnic>> {
        self.vnics_for(scope.as_str(), instance_id)
    }

    fn list_autonomous_databases(&self, scope: &Scope) -> Result<Vec<AutonomousDatabase>> {
        let items: Vec<WireAutonomousDatabase> = self.list(
            &["db", "autonomous-database", "list"],
            &[("compartment-id", scope.as_str())],
        )?;
        Ok(items.into_iter().map(Into::into).collect())
    }

    fn list_buckets(&self, scope: &Scope) -> Result<Vec<Bucket>> {
        let namespace: String = self.get(&["os", "ns", "get"], &[])?;
        let items: Vec<WireBucket> = self.list(
            &["os", "bucket", "list"],
            &[("compartment-id", scope.as_str()), ("namespace-name", namespace.as_str())],
        )?;
        Ok(items.into_iter().map(|b| b.into_bucket(&namespace)).collect())
    }

    fn get_tenancy(&self) -> Result<Tenancy> {
        let tenancy = self.tenancy_id()?;
        let wire: WireTenancy = self.get(&["iam", "tenancy", "get"], &[("tenancy-id", tenancy)])?;
        Ok(wire.into())
    }

    fn summarize_costs(&self, query: &CostQuery) -> Result<Vec<CostItem>> {
        let tenancy = self.tenancy_id()?;
        let start = query.start.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let end = query.end.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
        let collection: WireUsageCollection = self.get(
            &["usage-api", "usage-summary", "request-summarized-usages"],
            &[
                ("tenant-id", tenancy),
                ("time-usage-started", start.as_str()),
                ("time-usage-ended", end.as_str()),
                ("granularity", query.granularity.as_str()),
                ("query-type", "COST"),
                ("group-by", r#"["service"]"#),
            ],
        )?;
        Ok(collection.items.into_iter().map(Into::into).collect())
    }
}

impl<R: CommandRunner> InstanceActions for OciCli<R> {
    fn instance_action(&self, instance_id: &str, action: InstanceAction) -> Result<ActionReceipt> {
        let wire: WireInstance = self.get(
            &["compute", "instance", "action"],
            &[("instance-id", instance_id), ("action", action.as_str())],
        )?;
        Ok(ActionReceipt {
            instance_id: instance_id.to_string(),
            action,
            lifecycle_state: wire.lifecycle_state,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::time::Duration;

    use ocimcp_core::config::ClientConfig;

    use crate::assess::{AssessConfig, PostureEvaluator};

    /// Replies by operation name; records every argument list.
    #[derive(Default)]
    struct CannedRunner {
        replies: HashMap<String, ProcessOutput>,
        seen: RefCell<Vec<(String, Vec<String>, Vec<(String, String)>)>>,
    }

    impl CannedRunner {
        fn ok(mut self, operation: &str, stdout: &str) -> Self {
            self.replies.insert(
                operation.to_string(),
                ProcessOutput {
                    stdout: stdout.to_string(),
                    stderr: String::new(),
                    exit_code: 0,
                },
            );
            self
        }

        fn fail(mut self, operation: &str, stderr: &str) -> Self {
            self.replies.insert(
                operation.to_string(),
                ProcessOutput {
                    stdout: String::new(),
                    stderr: stderr.to_string(),
                    exit_code: 1,
                },
            );
            self
        }
    }

    impl CommandRunner for CannedRunner {
        fn run(&self, invocation: &Invocation<'_>) -> Result<ProcessOutput> {
            self.seen.borrow_mut().push((
                invocation.operation.to_string(),
                invocation.args.to_vec(),
                invocation.envs.to_vec(),
            ));
            self.replies
                .get(invocation.operation)
                .cloned()
                .ok_or_else(|| CloudError::UnexpectedUpstream(format!("no reply for {}", invocation.operation)))
        }
    }

    fn settings(credentials: Credentials) -> OciSettings {
        OciSettings {
            credentials,
            tenancy: Some("ocid1.tenancy.oc1..root".into()),
            region: Some("ap-melbourne-1".into()),
            default_compartment: Some("ocid1.compartment.oc1..app".into()),
            assess_all_compartments: false,
            client: ClientConfig {
                cli_path: PathBuf::from("oci"),
                timeout: Duration::from_secs(5),
            },
        }
    }

    fn config_file_settings() -> OciSettings {
        settings(Credentials::ConfigFile {
            path: PathBuf::from("/home/u/.oci/config"),
            profile: "DEFAULT".into(),
        })
    }

    const VCNS: &str = r#"{"data": [{"id": "ocid1.vcn.oc1..v1", "display-name": "vcn-main"}]}"#;
    const LISTS: &str = r#"{"data": [{"id": "sl1", "display-name": "public-sl", "vcn-id": "ocid1.vcn.oc1..v1",
        "ingress-security-rules": [
          {"source": "0.0.0.0/0", "protocol": "6", "tcp-options": {"destination-port-range": {"min": 22, "max": 22}}},
          {"source": "10.0.0.0/8", "protocol": "6", "tcp-options": {"destination-port-range": {"min": 443, "max": 443}}}
        ],
        "egress-security-rules": [{"destination": "0.0.0.0/0", "protocol": "all"}]}]}"#;
    const NSGS: &str = r#"{"data": [{"id": "nsg1", "display-name": "web-nsg", "vcn-id": "ocid1.vcn.oc1..v1"}]}"#;
    const NSG_RULES: &str = r#"{"data": [{"direction": "INGRESS", "protocol": "6", "source": "0.0.0.0/0",
        "tcp-options": {"destination-port-range": {"min": 443, "max": 443}}}]}"#;

    #[test]
    fn test_global_args_precede_command_and_list_uses_all() {
        let runner = CannedRunner::default().ok("network vcn list", VCNS);
        let cli = OciCli::with_runner(config_file_settings(), runner);
        cli.vcn_names(&Scope::new("ocid1.compartment.oc1..app")).unwrap();

        let seen = cli.runner.seen.borrow();
        let (_, args, envs) = &seen[0];
        assert_eq!(
            args,
            &vec![
                "--output", "json", "--config-file", "/home/u/.oci/config", "--profile", "DEFAULT",
                "network", "vcn", "list", "--compartment-id", "ocid1.compartment.oc1..app", "--all",
            ]
            .into_iter()
            .map(String::from)
            .collect::<Vec<_>>()
        );
        assert!(envs.iter().all(|(k, _)| !k.starts_with("OCI_CLI_USER")));
    }

    #[test]
    fn test_environment_credentials_forwarded_as_env() {
        let runner = CannedRunner::default().ok("iam tenancy get", r#"{"data": {"id": "t", "name": "acme", "home-region-key": "MEL"}}"#);
        let cli = OciCli::with_runner(
            settings(Credentials::Environment {
                user: "ocid1.user.oc1..u".into(),
                fingerprint: "aa:bb".into(),
                tenancy: "ocid1.tenancy.oc1..root".into(),
                region: "ap-melbourne-1".into(),
                key_file: "/k.pem".into(),
            }),
            runner,
        );
        let tenancy = cli.get_tenancy().unwrap();
        assert_eq!(tenancy.name, "acme");
        assert_eq!(tenancy.home_region_key.as_deref(), Some("MEL"));

        let seen = cli.runner.seen.borrow();
        let (_, args, envs) = &seen[0];
        assert!(!args.contains(&"--config-file".to_string()));
        assert!(envs.contains(&("OCI_CLI_KEY_FILE".to_string(), "/k.pem".to_string())));
    }

    #[test]
    fn test_resource_principal_args() {
        let cli = OciCli::with_runner(settings(Credentials::ResourcePrincipal), CannedRunner::default());
        let args = cli.global_args();
        assert_eq!(
            args,
            vec!["--output", "json", "--auth", "resource_principal", "--region", "ap-melbourne-1"]
        );
    }

    #[test]
    fn test_evaluator_over_cli_backend() {
        let runner = CannedRunner::default()
            .ok("network vcn list", VCNS)
            .ok("network security-list list", LISTS)
            .ok("network nsg list", NSGS)
            .ok("network nsg rules list", NSG_RULES);
        let cli = OciCli::with_runner(config_file_settings(), runner);
        let config = AssessConfig::from_settings(cli.settings());
        let findings = PostureEvaluator::new(&cli, config).assess(None).unwrap();

        assert_eq!(findings.len(), 2);
        assert_eq!(findings[0].group_name, "public-sl");
        assert!(findings[0].description.contains("port 22"));
        assert_eq!(findings[1].group_name, "web-nsg");
        assert_eq!(findings[1].vcn_name.as_deref(), Some("vcn-main"));
    }

    #[test]
    fn test_nsg_rule_failure_fails_whole_call() {
        let runner = CannedRunner::default()
            .ok("network vcn list", VCNS)
            .ok("network security-list list", LISTS)
            .ok("network nsg list", NSGS)
            .fail(
                "network nsg rules list",
                "ServiceError:\n{\"code\": \"NotAuthorizedOrNotFound\", \"status\": 404, \"message\": \"nope\"}",
            );
        let cli = OciCli::with_runner(config_file_settings(), runner);
        let err = PostureEvaluator::new(&cli, AssessConfig::default())
            .assess(Some(Scope::new("ocid1.compartment.oc1..app")))
            .unwrap_err();
        assert_eq!(err.kind(), "ScopeNotFoundError");
    }

    #[test]
    fn test_instance_details_skips_detached_vnics() {
        let runner = CannedRunner::default()
            .ok(
                "compute instance get",
                r#"{"data": {"id": "i1", "display-name": "web", "shape": "VM.Standard.E4.Flex",
                    "lifecycle-state": "RUNNING", "compartment-id": "c1",
                    "metadata": {"ssh_authorized_keys": "ssh-rsa AAA"}}}"#,
            )
            .ok(
                "compute vnic-attachment list",
                r#"{"data": [{"vnic-id": "vn1", "lifecycle-state": "ATTACHED"},
                             {"vnic-id": "vn2", "lifecycle-state": "DETACHED"},
                             {"lifecycle-state": "ATTACHING"}]}"#,
            )
            .ok(
                "network vnic get",
                r#"{"data": {"id": "vn1", "public-ip": "203.0.113.7", "private-ip": "10.0.0.5", "is-primary": true}}"#,
            );
        let cli = OciCli::with_runner(config_file_settings(), runner);
        let details = cli.get_instance("i1").unwrap();
        assert_eq!(details.vnics.len(), 1);
        assert_eq!(details.vnics[0].public_ip.as_deref(), Some("203.0.113.7"));
        assert_eq!(details.metadata.get("ssh_authorized_keys").map(String::as_str), Some("ssh-rsa AAA"));
        let vnic_calls = cli
            .runner
            .seen
            .borrow()
            .iter()
            .filter(|(op, _, _)| op == "network vnic get")
            .count();
        assert_eq!(vnic_calls, 1);
    }

    #[test]
    fn test_buckets_use_namespace() {
        let runner = CannedRunner::default()
            .ok("os ns get", r#"{"data": "acmens"}"#)
            .ok("os bucket list", r#"{"data": [{"name": "logs", "time-created": "2026-01-01T00:00:00+00:00"}]}"#);
        let cli = OciCli::with_runner(config_file_settings(), runner);
        let buckets = cli.list_buckets(&Scope::new("c1")).unwrap();
        assert_eq!(buckets[0].namespace, "acmens");
        let seen = cli.runner.seen.borrow();
        let (_, args, _) = &seen[1];
        assert!(args.windows(2).any(|w| w[0] == "--namespace-name" && w[1] == "acmens"));
    }

    #[test]
    fn test_instance_action_returns_lifecycle_state() {
        let runner = CannedRunner::default().ok(
            "compute instance action",
            r#"{"data": {"id": "i1", "display-name": "web", "shape": "s", "lifecycle-state": "STOPPING", "compartment-id": "c1"}, "etag": "x"}"#,
        );
        let cli = OciCli::with_runner(config_file_settings(), runner);
        let receipt = cli.instance_action("i1", InstanceAction::Stop).unwrap();
        assert_eq!(receipt.lifecycle_state, "STOPPING");
        let seen = cli.runner.seen.borrow();
        assert!(seen[0].1.windows(2).any(|w| w[0] == "--action" && w[1] == "STOP"));
        assert!(!seen[0].1.contains(&"--all".to_string()));
    }

    #[test]
    fn test_compartments_require_tenancy() {
        let mut s = config_file_settings();
        s.tenancy = None;
        let cli = OciCli::with_runner(s, CannedRunner::default());
        assert_eq!(cli.list_compartments().unwrap_err().kind(), "ClientUnavailableError");
    }
}
