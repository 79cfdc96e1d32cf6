use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::core::error::{HarvestError, HarvestResult};

/// An exact Maven coordinate: `groupId:artifactId:version`.
///
/// Equality is plain triple equality. There is no range or wildcard matching,
/// and the version is kept verbatim (unresolved `${...}` properties included).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coordinate {
    group_id: String,
    artifact_id: String,
    version: String,
}

impl Coordinate {
    pub fn new(
        group_id: impl Into<String>,
        artifact_id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            group_id: group_id.into(),
            artifact_id: artifact_id.into(),
            version: version.into(),
        }
    }

    /// Parse a `groupId:artifactId:version` string.
    ///
    /// # Examples
    /// ```
    /// use pom_harvest::core::maven::Coordinate;
    /// let c = Coordinate::parse("org.greenrobot:eventbus:3.0.0").unwrap();
    /// assert_eq!(c.group_id(), "org.greenrobot");
    /// ```
    pub fn parse(coord: &str) -> HarvestResult<Self> {
        let parts: Vec<&str> = coord.trim().split(':').map(str::trim).collect();

        match parts.as_slice() {
            [group, artifact, version]
                if !group.is_empty() && !artifact.is_empty() && !version.is_empty() =>
            {
                let c = Self::new(*group, *artifact, *version);
                if c.is_path_safe() {
                    Ok(c)
                } else {
                    Err(HarvestError::InvalidCoordinate(coord.to_string()))
                }
            }
            _ => Err(HarvestError::InvalidCoordinate(coord.to_string())),
        }
    }

    pub fn group_id(&self) -> &str {
        &self.group_id
    }

    pub fn artifact_id(&self) -> &str {
        &self.artifact_id
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Whether every field can be used as a single URL and file name segment:
    /// no `/` or `\`, and not `.` or `..`.
    pub fn is_path_safe(&self) -> bool {
        [&self.group_id, &self.artifact_id, &self.version]
            .iter()
            .all(|field| is_safe_segment(field))
    }

    /// Group path portion (`com/android/support`).
    pub fn group_path(&self) -> String {
        self.group_id.replace('.', "/")
    }

    /// `artifactId-version`
    pub fn file_stem(&self) -> String {
        format!("{}-{}", self.artifact_id, self.version)
    }

    /// `artifactId-version.ext`
    pub fn file_name(&self, extension: &str) -> String {
        format!("{}.{}", self.file_stem(), extension)
    }

    /// Full URL of the `extension` file for this coordinate under `repo_base`.
    ///
    /// Template:
    /// `<repo>/<group_path>/<artifact_id>/<version>/<artifact_id>-<version>.<ext>`
    pub fn url(&self, repo_base: &str, extension: &str) -> String {
        let base = repo_base.trim_end_matches('/');
        format!(
            "{}/{}/{}/{}/{}",
            base,
            self.group_path(),
            self.artifact_id,
            self.version,
            self.file_name(extension)
        )
    }

    /// URL of the POM descriptor under `repo_base`.
    pub fn pom_url(&self, repo_base: &str) -> String {
        self.url(repo_base, "pom")
    }
}

fn is_safe_segment(field: &str) -> bool {
    !field.contains(['/', '\\']) && field != "." && field != ".."
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

impl FromStr for Coordinate {
    type Err = HarvestError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for Coordinate {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Coordinate {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(serde::de::Error::custom)
    }
}
