use std::{fmt, str::FromStr};

use snafu::Snafu;

/// How timezone data is made available inside a container.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strategy {
    /// Mount the TZif files already present on the node.
    HostPath,
    /// Mount the TZif files from a ConfigMap seeded in the namespace.
    ConfigMap,
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let val = match self {
            Self::HostPath => "hostPath",
            Self::ConfigMap => "configmap",
        };
        f.write_str(val)
    }
}

impl FromStr for Strategy {
    type Err = ParseStrategyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "hostPath" => Ok(Self::HostPath),
            "configmap" => Ok(Self::ConfigMap),
            _ => Err(ParseStrategyError::Invalid { value: value.to_string() }),
        }
    }
}

#[derive(Debug, Snafu)]
pub enum ParseStrategyError {
    #[snafu(display("'{value}' is not a valid injection strategy"))]
    Invalid { value: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_known_strategies() {
        assert_eq!("hostPath".parse::<Strategy>().unwrap(), Strategy::HostPath);
        assert_eq!("configmap".parse::<Strategy>().unwrap(), Strategy::ConfigMap);
    }

    #[test]
    fn test_display_round_trips_through_parse() {
        for strategy in [Strategy::HostPath, Strategy::ConfigMap] {
            assert_eq!(strategy.to_string().parse::<Strategy>().unwrap(), strategy);
        }
    }

    #[test]
    fn test_reject_unknown_strategy() {
        let err = "initContainer".parse::<Strategy>().unwrap_err();
        assert!(matches!(
            err,
            ParseStrategyError::Invalid { ref value } if value == "initContainer"
        ));
    }
}
