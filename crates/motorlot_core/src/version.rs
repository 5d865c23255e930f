use std::fmt;

use serde::{Deserialize, Serialize};

use crate::{MotorlotError, MotorlotResult};

/// Timestamp-derived migration version token, ordered byte-wise (`2019-01` < `2020-03`,
/// `20190101000000` < `20200301000000`).
#[derive(Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Version(String);

impl Version {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn parse(value: &str) -> MotorlotResult<Self> {
        let version = Self::new(value.trim());
        version.validate()?;
        Ok(version)
    }

    pub fn validate(&self) -> MotorlotResult<()> {
        if self.0.is_empty() {
            return Err(MotorlotError::invalid("migration version is empty"));
        }
        if !self
            .0
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
        {
            return Err(MotorlotError::invalid(format!(
                "migration version '{}' contains characters outside [A-Za-z0-9._-]",
                self.0
            )));
        }
        Ok(())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Version {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

#[cfg(test)]
mod tests {
    use super::Version;

    #[test]
    fn orders_timestamp_tokens() {
        assert!(Version::new("2019-01") < Version::new("2020-03"));
        assert!(Version::new("20190101000000") < Version::new("20200301000000"));
    }

    #[test]
    fn parse_rejects_empty_and_spaces() {
        assert!(Version::parse("").is_err());
        assert!(Version::parse("2019 01").is_err());
        assert_eq!(Version::parse(" 2019-01 ").unwrap().as_str(), "2019-01");
    }
}
