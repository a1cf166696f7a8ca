use clap::Args;
use tzinject_core::{InjectionDefaults, Strategy};

/// Flags overriding the `defaults` section of the configuration file.
#[derive(Args, Clone, Debug, Default)]
pub struct DefaultsArgs {
    #[arg(
        short = 't',
        long = "timezone",
        help = "Timezone injected when a workload does not request one (e.g. Asia/Shanghai)."
    )]
    pub timezone: Option<String>,

    #[arg(
        short = 's',
        long = "strategy",
        help = "Strategy used when a workload does not request one, either hostPath or configmap."
    )]
    pub strategy: Option<Strategy>,

    #[arg(
        long = "inject-by-default",
        num_args = 0..=1,
        require_equals = true,
        default_missing_value = "true",
        help = "Inject workloads that carry no inject annotation. Use \
                --inject-by-default=false to require an explicit opt-in."
    )]
    pub inject_by_default: Option<bool>,

    #[arg(
        long = "host-path-prefix",
        help = "Directory holding the TZif files on the node, used by the hostPath strategy."
    )]
    pub host_path_prefix: Option<String>,

    #[arg(
        short = 'm',
        long = "mount-path",
        help = "Path the timezone file is mounted at inside containers."
    )]
    pub mount_path: Option<String>,

    #[arg(
        long = "configmap",
        help = "Name of the ConfigMap holding the TZif files, used by the configmap strategy."
    )]
    pub config_map_name: Option<String>,
}

impl DefaultsArgs {
    /// Overwrites every field of `defaults` that was given on the command line.
    pub fn apply(self, defaults: &mut InjectionDefaults) {
        let Self {
            timezone,
            strategy,
            inject_by_default,
            host_path_prefix,
            mount_path,
            config_map_name,
        } = self;

        if let Some(timezone) = timezone {
            defaults.timezone = timezone;
        }
        if let Some(strategy) = strategy {
            defaults.strategy = strategy.to_string();
        }
        if let Some(inject_by_default) = inject_by_default {
            defaults.inject_by_default = inject_by_default;
        }
        if let Some(host_path_prefix) = host_path_prefix {
            defaults.host_path_prefix = host_path_prefix;
        }
        if let Some(mount_path) = mount_path {
            defaults.mount_path = mount_path;
        }
        if let Some(config_map_name) = config_map_name {
            defaults.config_map_name = config_map_name;
        }
    }
}

#[cfg(test)]
mod tests {
    use clap::Parser;

    use super::*;

    #[derive(Parser)]
    struct Harness {
        #[command(flatten)]
        defaults: DefaultsArgs,
    }

    fn parse(args: &[&str]) -> DefaultsArgs {
        Harness::try_parse_from(std::iter::once("tzinject").chain(args.iter().copied()))
            .unwrap()
            .defaults
    }

    #[test]
    fn test_no_flags_keep_defaults() {
        let mut defaults = InjectionDefaults::default();
        parse(&[]).apply(&mut defaults);
        assert_eq!(defaults, InjectionDefaults::default());
    }

    #[test]
    fn test_flags_override_defaults() {
        let mut defaults = InjectionDefaults::default();
        parse(&[
            "-t",
            "Europe/Berlin",
            "--strategy",
            "hostPath",
            "--inject-by-default=false",
            "--host-path-prefix",
            "/opt/zoneinfo",
            "-m",
            "/etc/tz",
            "--configmap",
            "zones",
        ])
        .apply(&mut defaults);

        assert_eq!(defaults.timezone, "Europe/Berlin");
        assert_eq!(defaults.strategy, "hostPath");
        assert!(!defaults.inject_by_default);
        assert_eq!(defaults.host_path_prefix, "/opt/zoneinfo");
        assert_eq!(defaults.mount_path, "/etc/tz");
        assert_eq!(defaults.config_map_name, "zones");
    }

    #[test]
    fn test_bare_inject_by_default_means_true() {
        let mut defaults =
            InjectionDefaults { inject_by_default: false, ..InjectionDefaults::default() };
        parse(&["--inject-by-default"]).apply(&mut defaults);
        assert!(defaults.inject_by_default);
    }

    #[test]
    fn test_reject_unknown_strategy() {
        let args = ["tzinject", "--strategy", "initContainer"];
        assert!(Harness::try_parse_from(args).is_err());
    }
}
