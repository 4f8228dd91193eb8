use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// Variable naming the environment, unset means [`Environment::Dev`].
const ENVIRONMENT_VAR: &str = "APP_ENVIRONMENT";

/// Runtime environment of the demo.
///
/// Picks the configuration file layered over `base` and the log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Dev,
    Prod,
}

/// `APP_ENVIRONMENT` held a name other than `dev` or `prod`.
#[derive(Debug, Error)]
#[error("unknown environment `{0}`, expected `dev` or `prod`")]
pub struct UnknownEnvironment(String);

impl Environment {
    /// Reads `APP_ENVIRONMENT`.
    pub fn load() -> Result<Self, UnknownEnvironment> {
        match std::env::var(ENVIRONMENT_VAR) {
            Ok(name) => name.parse(),
            Err(_) => Ok(Self::default()),
        }
    }

    /// Name used for the matching configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dev => "dev",
            Self::Prod => "prod",
        }
    }
}

impl FromStr for Environment {
    type Err = UnknownEnvironment;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        let name = name.trim();
        [Self::Dev, Self::Prod]
            .into_iter()
            .find(|environment| environment.as_str().eq_ignore_ascii_case(name))
            .ok_or_else(|| UnknownEnvironment(name.to_owned()))
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_match_case_insensitively() {
        assert_eq!(" DEV ".parse::<Environment>().unwrap(), Environment::Dev);
        assert_eq!("Prod".parse::<Environment>().unwrap(), Environment::Prod);
        assert_eq!(Environment::Prod.to_string(), "prod");
    }

    #[test]
    fn unknown_names_are_rejected() {
        let err = "staging".parse::<Environment>().unwrap_err();
        assert_eq!(
            err.to_string(),
            "unknown environment `staging`, expected `dev` or `prod`"
        );
    }
}
