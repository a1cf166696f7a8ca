pub mod k8s {
    pub mod labels {
        pub const MANAGED_BY: &str = "app.kubernetes.io/managed-by";
    }

    pub mod annotations {
        //! Annotation keys read from and written to workloads and namespaces.
        //!
        //! All keys live under the `timezone.tzinject.io/` domain.

        use std::sync::LazyLock;

        use crate::PROJECT_NAME;

        pub static DOMAIN: LazyLock<String> =
            LazyLock::new(|| format!("timezone.{PROJECT_NAME}.io"));

        /// Idempotence marker, written after a successful injection. Only its
        /// presence matters.
        pub static INJECTED: LazyLock<String> = LazyLock::new(|| format!("{}/injected", *DOMAIN));

        /// Requested timezone, also written back with the resolved value.
        pub static TIMEZONE: LazyLock<String> = LazyLock::new(|| format!("{}/timezone", *DOMAIN));

        pub static STRATEGY: LazyLock<String> = LazyLock::new(|| format!("{}/strategy", *DOMAIN));

        /// Opt-in/opt-out switch. `"false"` opts out, any other value opts in.
        pub static INJECT: LazyLock<String> = LazyLock::new(|| format!("{}/inject", *DOMAIN));
    }

    pub mod namespaces {
        pub const KUBE_SYSTEM: &str = "kube-system";
        pub const KUBE_PUBLIC: &str = "kube-public";
        pub const DEFAULT: &str = "default";
    }
}

pub const DEFAULT_TIMEZONE: &str = "Asia/Shanghai";
pub const DEFAULT_STRATEGY: &str = "configmap";
pub const DEFAULT_HOST_PATH_PREFIX: &str = "/usr/share/zoneinfo";
pub const DEFAULT_MOUNT_PATH: &str = "/etc/localtime";
pub const DEFAULT_CONFIG_MAP_NAME: &str = "tzinject-zoneinfo";
pub const DEFAULT_ZONEINFO_DIRECTORY: &str = "./zoneinfo";

pub const HOST_PATH_VOLUME_NAME: &str = "zoneinfo-hostpath";
pub const CONFIG_MAP_VOLUME_NAME: &str = "zoneinfo-configmap";

pub const TIMEZONE_ENV_VAR: &str = "TZ";
pub const INJECTED_MARKER_VALUE: &str = "true";
pub const OPT_OUT_VALUE: &str = "false";

pub const DEFAULT_WEBHOOK_PORT: u16 = 8443;
pub const DEFAULT_TLS_CERT_FILE: &str = "/run/secrets/tls/tls.crt";
pub const DEFAULT_TLS_KEY_FILE: &str = "/run/secrets/tls/tls.key";
