use std::fmt;

/// Which namespace a loaded unit lives in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExtensionKind {
    Cog,
    Feature,
    /// Compiled into the binary and loaded before anything on disk.
    Internal,
}

impl ExtensionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExtensionKind::Cog => "cog",
            ExtensionKind::Feature => "feature",
            ExtensionKind::Internal => "internal",
        }
    }

    /// Parse the `type` field of a package descriptor. Only installable kinds are accepted.
    pub fn from_package_type(value: &str) -> Option<Self> {
        match value {
            "cog" => Some(ExtensionKind::Cog),
            "feature" => Some(ExtensionKind::Feature),
            _ => None,
        }
    }
}

impl fmt::Display for ExtensionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An installed, loaded handler unit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionRecord {
    pub raw_name: String,
    pub kind: ExtensionKind,
    pub helper_files: Vec<String>,
}

/// Outcome of a successful install
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub name: String,
    pub author: String,
    pub installed_helpers: Vec<String>,
    pub installed_entry: String,
}

impl InstallReport {
    pub fn summary(&self) -> String {
        let mut info = "Helpers:\n".to_string();
        for helper in &self.installed_helpers {
            info.push_str(&format!("- {}\n", helper));
        }
        info.push_str(&format!("\nCog/Feature:\n- {}", self.installed_entry));

        format!(
            "Installed '{}' By '{}'\n\nInstall information:\n{}",
            self.name, self.author, info
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_package_type_parsing() {
        assert_eq!(ExtensionKind::from_package_type("cog"), Some(ExtensionKind::Cog));
        assert_eq!(ExtensionKind::from_package_type("feature"), Some(ExtensionKind::Feature));
        assert_eq!(ExtensionKind::from_package_type("internal"), None);
        assert_eq!(ExtensionKind::from_package_type("Cog"), None);
    }

    #[test]
    fn test_report_summary() {
        let report = InstallReport {
            name: "Greeter".to_string(),
            author: "zach".to_string(),
            installed_helpers: vec!["util".to_string()],
            installed_entry: "greet".to_string(),
        };
        let summary = report.summary();
        assert!(summary.starts_with("Installed 'Greeter' By 'zach'"));
        assert!(summary.contains("- util\n"));
        assert!(summary.ends_with("Cog/Feature:\n- greet"));
    }
}
