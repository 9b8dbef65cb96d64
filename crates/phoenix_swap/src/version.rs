//! Library version parsing and capability detection.
//!
//! The wrapped library reports a version string such as `"4.3.11.Final"`.
//! Only the major and minor components decide which rebuild path applies;
//! the rest is parsed for diagnostics.

use core::fmt;
use core::str::FromStr;

/// Reports the version of the wrapped library.
///
/// Queried once per refresh cycle. Closures returning a `String` implement
/// this trait, which is handy in tests and demos.
pub trait VersionProbe: Send + Sync {
    /// Returns the raw version string, e.g. `"4.3.11.Final"`.
    fn version_string(&self) -> String;
}

impl<F> VersionProbe for F
where
    F: Fn() -> String + Send + Sync,
{
    fn version_string(&self) -> String {
        self()
    }
}

/// Why a version string could not be read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VersionParseError {
    /// Fewer than two dot-separated components.
    #[error("version '{raw}' has {found} component(s), expected at least major.minor")]
    TooFewComponents {
        /// The string as reported.
        raw: String,
        /// Components found.
        found: usize,
    },

    /// The major or minor component is not a number.
    #[error("version '{raw}': {part} component '{component}' is not a number")]
    NonNumeric {
        /// The string as reported.
        raw: String,
        /// `"major"` or `"minor"`.
        part: &'static str,
        /// The offending component.
        component: String,
    },
}

/// A parsed library version.
///
/// Numeric components are signed 32-bit integers; a component outside that
/// range does not parse.
///
/// ```
/// use phoenix_swap::LibraryVersion;
///
/// let version: LibraryVersion = "4.3.11.Final".parse().unwrap();
/// assert_eq!((version.major, version.minor), (4, 3));
/// assert_eq!(version.patch, Some(11));
/// assert_eq!(version.qualifier.as_deref(), Some("Final"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LibraryVersion {
    /// First component.
    pub major: i32,
    /// Second component.
    pub minor: i32,
    /// Third component, when numeric.
    pub patch: Option<i32>,
    /// Whatever follows the numeric components, e.g. `Final`.
    pub qualifier: Option<String>,
}

impl LibraryVersion {
    /// Parses a dot-separated version string.
    ///
    /// Major and minor must be plain numbers. A non-numeric third component
    /// is treated as the start of the qualifier.
    ///
    /// # Errors
    ///
    /// - [`VersionParseError::NonNumeric`] if major or minor is not a number
    /// - [`VersionParseError::TooFewComponents`] if there is no minor component
    pub fn parse(raw: &str) -> Result<Self, VersionParseError> {
        let components: Vec<&str> = raw.split('.').collect();

        let number = |part: &'static str, component: &str| {
            component
                .parse::<i32>()
                .map_err(|_| VersionParseError::NonNumeric {
                    raw: raw.to_owned(),
                    part,
                    component: component.to_owned(),
                })
        };

        let major = number("major", components[0])?;
        let Some(minor) = components.get(1) else {
            return Err(VersionParseError::TooFewComponents {
                raw: raw.to_owned(),
                found: components.len(),
            });
        };
        let minor = number("minor", minor)?;

        let mut rest = &components[2..];
        let patch = rest.first().and_then(|c| c.parse::<i32>().ok());
        if patch.is_some() {
            rest = &rest[1..];
        }
        let qualifier = (!rest.is_empty()).then(|| rest.join("."));

        Ok(Self {
            major,
            minor,
            patch,
            qualifier,
        })
    }
}

impl FromStr for LibraryVersion {
    type Err = VersionParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for LibraryVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.major, self.minor)?;
        if let Some(patch) = self.patch {
            write!(f, ".{patch}")?;
        }
        if let Some(qualifier) = &self.qualifier {
            write!(f, ".{qualifier}")?;
        }
        Ok(())
    }
}

/// Which generation of the library's construction API is available.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Configuration-object API with an internal registry that needs cleanup.
    Legacy,
    /// Factory and builder API.
    Modern,
}

impl Capability {
    /// Selects the capability for a parsed version.
    ///
    /// Modern requires `major >= 4` **and** `minor >= 3`, so `5.0` and `6.1`
    /// select Legacy.
    ///
    /// ```
    /// use phoenix_swap::{Capability, LibraryVersion};
    ///
    /// let pick = |raw: &str| Capability::for_version(&raw.parse::<LibraryVersion>().unwrap());
    /// assert_eq!(pick("4.3.0"), Capability::Modern);
    /// assert_eq!(pick("4.2.9"), Capability::Legacy);
    /// assert_eq!(pick("5.0.0"), Capability::Legacy);
    /// ```
    #[must_use]
    pub fn for_version(version: &LibraryVersion) -> Self {
        if version.major >= 4 && version.minor >= 3 {
            Self::Modern
        } else {
            Self::Legacy
        }
    }

    /// Asks `probe` for the library version and selects a capability.
    ///
    /// An unreadable version is logged and falls back to [`Capability::Legacy`].
    pub fn detect(probe: &dyn VersionProbe) -> Self {
        let raw = probe.version_string();
        match LibraryVersion::parse(&raw) {
            Ok(version) => {
                let capability = Self::for_version(&version);
                tracing::debug!(%version, ?capability, "detected library capability");
                capability
            }
            Err(err) => {
                tracing::warn!(
                    version = %raw,
                    error = %err,
                    "unable to read library version, falling back to legacy rebuilds"
                );
                Self::Legacy
            }
        }
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Legacy => "legacy",
            Self::Modern => "modern",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capability_of(raw: &str) -> Capability {
        let raw = raw.to_owned();
        Capability::detect(&move || raw.clone())
    }

    #[test]
    fn selection_table() {
        assert_eq!(capability_of("3.6.1"), Capability::Legacy);
        assert_eq!(capability_of("4.2.9"), Capability::Legacy);
        assert_eq!(capability_of("4.3.0"), Capability::Modern);
        assert_eq!(capability_of("5.0.0"), Capability::Legacy);
    }

    #[test]
    fn rule_is_conjunctive() {
        assert_eq!(capability_of("4.4.2.Final"), Capability::Modern);
        assert_eq!(capability_of("5.3.1"), Capability::Modern);
        assert_eq!(capability_of("6.1.0"), Capability::Legacy);
        assert_eq!(capability_of("3.9"), Capability::Legacy);
    }

    #[test]
    fn malformed_versions_fall_back_to_legacy() {
        assert_eq!(capability_of("unknown"), Capability::Legacy);
        assert_eq!(capability_of(""), Capability::Legacy);
        assert_eq!(capability_of("4"), Capability::Legacy);
        assert_eq!(capability_of("4.x.1"), Capability::Legacy);
    }

    #[test]
    fn components_beyond_i32_do_not_parse() {
        assert_eq!(capability_of("3000000000.5"), Capability::Legacy);
        assert_eq!(capability_of("4.3000000000"), Capability::Legacy);
        assert_eq!(capability_of("2147483647.5"), Capability::Modern);
        assert!(matches!(
            LibraryVersion::parse("3000000000.5"),
            Err(VersionParseError::NonNumeric { part: "major", .. })
        ));

        let version = LibraryVersion::parse("4.3.3000000000").unwrap();
        assert_eq!(version.patch, None);
        assert_eq!(version.qualifier.as_deref(), Some("3000000000"));
    }

    #[test]
    fn parses_qualified_versions() {
        let version = LibraryVersion::parse("4.3.11.Final").unwrap();
        assert_eq!(
            version,
            LibraryVersion {
                major: 4,
                minor: 3,
                patch: Some(11),
                qualifier: Some("Final".into()),
            }
        );
        assert_eq!(version.to_string(), "4.3.11.Final");
    }

    #[test]
    fn non_numeric_third_component_is_qualifier() {
        let version = LibraryVersion::parse("3.6.GA").unwrap();
        assert_eq!(version.patch, None);
        assert_eq!(version.qualifier.as_deref(), Some("GA"));

        let version = LibraryVersion::parse("4.3").unwrap();
        assert_eq!(version.patch, None);
        assert_eq!(version.qualifier, None);
        assert_eq!(version.to_string(), "4.3");
    }

    #[test]
    fn parse_errors_describe_the_problem() {
        assert_eq!(
            LibraryVersion::parse("unknown"),
            Err(VersionParseError::NonNumeric {
                raw: "unknown".into(),
                part: "major",
                component: "unknown".into(),
            })
        );
        assert_eq!(
            LibraryVersion::parse("4"),
            Err(VersionParseError::TooFewComponents {
                raw: "4".into(),
                found: 1,
            })
        );
        assert!(matches!(
            LibraryVersion::parse("4.beta"),
            Err(VersionParseError::NonNumeric { part: "minor", .. })
        ));
        // Components are not trimmed.
        assert!(LibraryVersion::parse(" 4.3").is_err());
    }
}
