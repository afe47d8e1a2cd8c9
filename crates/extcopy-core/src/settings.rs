//! Build invocation settings as the host pipeline hands them to plugins.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;

/// Target platform of a build.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    /// Server-side Node.js runtime.
    Node,
    #[default]
    Browser,
    Neutral,
}

impl Platform {
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Node => "node",
            Self::Browser => "browser",
            Self::Neutral => "neutral",
        }
    }

    /// Whether externals are resolved from a deployed `node_modules` at runtime.
    #[must_use]
    pub fn is_server(&self) -> bool {
        matches!(self, Self::Node)
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Platform {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "node" => Ok(Self::Node),
            "browser" => Ok(Self::Browser),
            "neutral" => Ok(Self::Neutral),
            other => Err(format!(
                "unknown platform '{other}' (expected node, browser or neutral)"
            )),
        }
    }
}

/// Settings of one bundling invocation.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuildSettings {
    /// Whether dependencies are bundled at all.
    pub bundle: bool,
    /// Single output file.
    pub outfile: Option<PathBuf>,
    /// Output directory.
    pub outdir: Option<PathBuf>,
    /// Target platform.
    pub platform: Platform,
}

impl BuildSettings {
    /// Bundled build for Node writing into `outdir`.
    #[must_use]
    pub fn node_bundle(outdir: impl Into<PathBuf>) -> Self {
        Self {
            bundle: true,
            outfile: None,
            outdir: Some(outdir.into()),
            platform: Platform::Node,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_platform_round_trip_str() {
        for p in [Platform::Node, Platform::Browser, Platform::Neutral] {
            assert_eq!(p.as_str().parse::<Platform>().unwrap(), p);
        }
        assert!("deno".parse::<Platform>().is_err());
    }

    #[test]
    fn test_only_node_is_server() {
        assert!(Platform::Node.is_server());
        assert!(!Platform::Browser.is_server());
        assert!(!Platform::Neutral.is_server());
    }

    #[test]
    fn test_default_settings_not_bundling() {
        let settings = BuildSettings::default();
        assert!(!settings.bundle);
        assert_eq!(settings.platform, Platform::Browser);
    }
}
