//! Result shape shared by every checker.

use migcheck_common::Error;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Validation category. Declaration order is the reporting order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Connectivity,
    Compatibility,
    Dependency,
    Permission,
}

impl Category {
    pub const ALL: [Category; 4] = [
        Category::Connectivity,
        Category::Compatibility,
        Category::Dependency,
        Category::Permission,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Connectivity => "connectivity",
            Category::Compatibility => "compatibility",
            Category::Dependency => "dependency",
            Category::Permission => "permission",
        }
    }

    /// Capitalised name for headings.
    pub fn title(&self) -> &'static str {
        match self {
            Category::Connectivity => "Connectivity",
            Category::Compatibility => "Compatibility",
            Category::Dependency => "Dependency",
            Category::Permission => "Permission",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "connectivity" => Ok(Category::Connectivity),
            "compatibility" => Ok(Category::Compatibility),
            "dependency" | "dependencies" => Ok(Category::Dependency),
            "permission" | "permissions" => Ok(Category::Permission),
            _ => Err(Error::unknown("category", s)),
        }
    }
}

/// Status enum of one category.
pub trait CheckStatus:
    Copy + Eq + fmt::Debug + Serialize + Send + Sync + 'static
{
    /// Category whose checker emits this status.
    const CATEGORY: Category;

    /// Every variant, for table-driven code.
    fn all() -> &'static [Self];

    fn as_str(&self) -> &'static str;
}

macro_rules! status_enum {
    (
        $(#[$meta:meta])*
        $name:ident => $category:expr, { $($variant:ident => $label:literal),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl CheckStatus for $name {
            const CATEGORY: Category = $category;

            fn all() -> &'static [Self] {
                &[$($name::$variant),+]
            }

            fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $label),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }
    };
}

status_enum! {
    /// Outcome of a reachability or login probe.
    ConnectivityStatus => Category::Connectivity, {
        Success => "success",
        Failed => "failed",
        Warning => "warning",
        Skipped => "skipped",
    }
}

status_enum! {
    /// Outcome of comparing source and destination.
    CompatibilityStatus => Category::Compatibility, {
        Compatible => "compatible",
        Incompatible => "incompatible",
        Warning => "warning",
        RequiresConversion => "requires_conversion",
    }
}

status_enum! {
    /// Outcome of looking up a tool or package.
    DependencyStatus => Category::Dependency, {
        Available => "available",
        Missing => "missing",
        WrongVersion => "wrong_version",
        Optional => "optional",
    }
}

status_enum! {
    /// Outcome of a filesystem or database privilege probe.
    PermissionStatus => Category::Permission, {
        Granted => "granted",
        Denied => "denied",
        Partial => "partial",
        Unknown => "unknown",
    }
}

/// What kind of dependency a [`DependencyResult`] describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DependencyKind {
    PythonPackage,
    SystemTool,
}

impl DependencyKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DependencyKind::PythonPackage => "python_package",
            DependencyKind::SystemTool => "system_tool",
        }
    }
}

/// One check outcome.
///
/// `required` only changes severity for dependency and permission results;
/// connectivity and compatibility are classified by status alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckResult<S> {
    pub name: String,
    pub status: S,
    pub message: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub details: BTreeMap<String, Value>,
    #[serde(default)]
    pub remediation: Option<String>,
    #[serde(default = "required_by_default")]
    pub required: bool,
}

fn required_by_default() -> bool {
    true
}

impl<S: CheckStatus> CheckResult<S> {
    pub fn new(name: impl Into<String>, status: S, message: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            status,
            message: message.into(),
            details: BTreeMap::new(),
            remediation: None,
            required: true,
        }
    }

    pub fn with_detail(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.details.insert(key.to_string(), value.into());
        self
    }

    pub fn with_remediation(mut self, remediation: impl Into<String>) -> Self {
        self.remediation = Some(remediation.into());
        self
    }

    pub fn with_required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    pub fn category(&self) -> Category {
        S::CATEGORY
    }

    /// String detail lookup.
    pub fn detail_str(&self, key: &str) -> Option<&str> {
        self.details.get(key).and_then(|v| v.as_str())
    }
}

pub type ConnectivityResult = CheckResult<ConnectivityStatus>;
pub type CompatibilityResult = CheckResult<CompatibilityStatus>;
pub type DependencyResult = CheckResult<DependencyStatus>;
pub type PermissionResult = CheckResult<PermissionStatus>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_order_and_parse() {
        let mut shuffled = vec![
            Category::Permission,
            Category::Connectivity,
            Category::Dependency,
            Category::Compatibility,
        ];
        shuffled.sort();
        assert_eq!(shuffled, Category::ALL.to_vec());
        assert_eq!(Category::from_str("Permissions").unwrap(), Category::Permission);
        assert!(Category::from_str("latency").is_err());
    }

    #[test]
    fn test_status_tables() {
        assert_eq!(ConnectivityStatus::all().len(), 4);
        assert_eq!(DependencyStatus::WrongVersion.as_str(), "wrong_version");
        assert_eq!(
            serde_json::to_string(&CompatibilityStatus::RequiresConversion).unwrap(),
            "\"requires_conversion\""
        );
        assert_eq!(PermissionStatus::CATEGORY, Category::Permission);
    }

    #[test]
    fn test_builder() {
        let result = DependencyResult::new("rsync", DependencyStatus::Missing, "rsync not found")
            .with_detail("kind", DependencyKind::SystemTool.as_str())
            .with_remediation("sudo apt-get install -y rsync")
            .with_required(false);

        assert_eq!(result.category(), Category::Dependency);
        assert_eq!(result.detail_str("kind"), Some("system_tool"));
        assert!(!result.required);
        assert_eq!(result.remediation.as_deref(), Some("sudo apt-get install -y rsync"));
    }

    #[test]
    fn test_required_defaults_true_when_deserializing() {
        let result: PermissionResult = serde_json::from_str(
            r#"{"name": "Source root", "status": "denied", "message": "no access"}"#,
        )
        .unwrap();
        assert!(result.required);
        assert!(result.details.is_empty());
    }
}
