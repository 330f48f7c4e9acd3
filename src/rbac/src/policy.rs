//! Policy table definition and loading
//!
//! The table is static configuration: a role → landing path mapping, the
//! dashboard sections with the roles each accepts, and the fixed routes the
//! guards navigate to. It is built once (from the builtin definition or a
//! TOML file) and never mutated afterwards.

use crate::error::{RbacError, Result};
use crate::types::{Path, RequiredRoleSet, RoleLabel, ROOT_PATH};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use tracing::{debug, warn};

/// Role → landing path pair
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyEntry {
    /// Role label
    pub role: RoleLabel,

    /// Landing path for identities holding this role
    pub path: Path,
}

impl PolicyEntry {
    pub fn new(role: impl Into<RoleLabel>, path: impl Into<Path>) -> Self {
        Self {
            role: role.into(),
            path: path.into(),
        }
    }
}

/// Protected dashboard section (module)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Section {
    /// Section name (e.g., "store", "accounts")
    pub name: String,

    /// Roles accepted by this section (empty = any authenticated identity)
    #[serde(default)]
    pub required: RequiredRoleSet,

    /// Where denied identities are sent (falls back to `routes.unauthorized`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deny_path: Option<Path>,
}

impl Section {
    /// Create a new section
    pub fn new(name: impl Into<String>, required: RequiredRoleSet) -> Self {
        Self {
            name: name.into(),
            required,
            deny_path: None,
        }
    }

    /// Override the access-denied destination for this section
    pub fn with_deny_path(mut self, path: impl Into<Path>) -> Self {
        self.deny_path = Some(path.into());
        self
    }
}

/// Fixed navigation destinations
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Routes {
    /// Default landing path
    #[serde(default = "default_root")]
    pub root: Path,

    /// Where unauthenticated identities are sent
    #[serde(default = "default_login")]
    pub login: Path,

    /// Default access-denied page
    #[serde(default = "default_unauthorized")]
    pub unauthorized: Path,
}

fn default_root() -> Path {
    ROOT_PATH.to_string()
}

fn default_login() -> Path {
    "/login".to_string()
}

fn default_unauthorized() -> Path {
    "/unauthorized".to_string()
}

impl Default for Routes {
    fn default() -> Self {
        Self {
            root: default_root(),
            login: default_login(),
            unauthorized: default_unauthorized(),
        }
    }
}

/// On-disk form of the policy table
///
/// ```toml
/// [routes]
/// login = "/login"
///
/// [[landing]]
/// role = "Store"
/// path = "/store/dashboard"
///
/// [[sections]]
/// name = "store"
/// required = ["Store", "StoreKeeper"]
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PolicyTableConfig {
    #[serde(default)]
    pub landing: Vec<PolicyEntry>,

    #[serde(default)]
    pub sections: Vec<Section>,

    #[serde(default)]
    pub routes: Routes,
}

/// Immutable policy table
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "PolicyTableConfig")]
pub struct PolicyTable {
    landing: Vec<PolicyEntry>,
    sections: Vec<Section>,
    routes: Routes,

    #[serde(skip)]
    landing_index: HashMap<RoleLabel, usize>,
}

impl PolicyTable {
    /// Build and validate a policy table
    pub fn new(landing: Vec<PolicyEntry>, sections: Vec<Section>, routes: Routes) -> Result<Self> {
        let mut landing_index = HashMap::with_capacity(landing.len());
        for (i, entry) in landing.iter().enumerate() {
            if landing_index.insert(entry.role.clone(), i).is_some() {
                return Err(RbacError::InvalidPolicy(format!(
                    "duplicate landing entry for role '{}'",
                    entry.role
                )));
            }
        }

        let table = Self {
            landing,
            sections,
            routes,
            landing_index,
        };
        table.validate()?;

        for role in table.unmapped_required_roles() {
            warn!(
                "Role '{}' guards a section but has no landing path, it will land on '{}'",
                role, table.routes.root
            );
        }

        debug!(
            "Policy table ready: {} landing entries, {} sections",
            table.landing.len(),
            table.sections.len()
        );

        Ok(table)
    }

    /// The table shipped with the dashboard
    pub fn builtin() -> Self {
        let landing = vec![
            PolicyEntry::new("Merchandiser", "/merchandising/dashboard"),
            PolicyEntry::new("Store", "/store/dashboard"),
            PolicyEntry::new("StoreKeeper", "/store/dashboard"),
            PolicyEntry::new("Cutting", "/cutting/dashboard"),
            PolicyEntry::new("Sewing", "/sewing/dashboard"),
            PolicyEntry::new("Finishing", "/finishing/dashboard"),
            PolicyEntry::new("Accounts", "/accounts/dashboard"),
            PolicyEntry::new("HR", "/hr/dashboard"),
            PolicyEntry::new("Commercial", "/commercial/dashboard"),
        ];

        let sections = vec![
            Section::new("admin", RequiredRoleSet::new(["Admin"])),
            Section::new("merchandising", RequiredRoleSet::new(["Merchandiser"])),
            Section::new("store", RequiredRoleSet::new(["Store", "StoreKeeper"])),
            Section::new("cutting", RequiredRoleSet::new(["Cutting"])),
            Section::new("sewing", RequiredRoleSet::new(["Sewing"])),
            Section::new("finishing", RequiredRoleSet::new(["Finishing"])),
            Section::new("accounts", RequiredRoleSet::new(["Accounts"])),
            Section::new("hr", RequiredRoleSet::new(["HR"])),
            Section::new("commercial", RequiredRoleSet::new(["Commercial"])),
            Section::new("profile", RequiredRoleSet::unrestricted()),
        ];

        let landing_index = landing
            .iter()
            .enumerate()
            .map(|(i, entry)| (entry.role.clone(), i))
            .collect();

        Self {
            landing,
            sections,
            routes: Routes::default(),
            landing_index,
        }
    }

    /// Parse a policy table from TOML text
    pub fn from_toml_str(source: &str) -> Result<Self> {
        let config: PolicyTableConfig = toml::from_str(source)?;
        Self::try_from(config)
    }

    /// Load a policy table from a TOML file
    pub fn load(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!("Loading policy table from {}", path.display());
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Check paths, labels and section names
    pub fn validate(&self) -> Result<()> {
        for (what, path) in [
            ("root", &self.routes.root),
            ("login", &self.routes.login),
            ("unauthorized", &self.routes.unauthorized),
        ] {
            check_path(path, &format!("route '{}'", what))?;
        }

        for entry in &self.landing {
            check_label(&entry.role, "landing entry")?;
            check_path(&entry.path, &format!("landing path for '{}'", entry.role))?;
        }

        let mut names = HashSet::new();
        for section in &self.sections {
            if section.name.is_empty() {
                return Err(RbacError::InvalidPolicy(
                    "section name cannot be empty".to_string(),
                ));
            }
            if !names.insert(section.name.as_str()) {
                return Err(RbacError::InvalidPolicy(format!(
                    "duplicate section '{}'",
                    section.name
                )));
            }
            for role in section.required.iter() {
                check_label(role, &format!("section '{}'", section.name))?;
            }
            if let Some(deny_path) = &section.deny_path {
                check_path(deny_path, &format!("deny path of section '{}'", section.name))?;
            }
        }

        Ok(())
    }

    /// Landing path for a single role
    pub fn resolve(&self, role: &RoleLabel) -> Option<&str> {
        self.landing_index
            .get(role)
            .map(|&i| self.landing[i].path.as_str())
    }

    /// Look up a section by name
    pub fn section(&self, name: &str) -> Option<&Section> {
        self.sections.iter().find(|s| s.name == name)
    }

    /// Roles accepted by a section
    pub fn required_roles(&self, name: &str) -> Option<&RequiredRoleSet> {
        self.section(name).map(|s| &s.required)
    }

    /// Deny destination for a section, with the table default applied
    pub fn deny_path(&self, section: &Section) -> Path {
        section
            .deny_path
            .clone()
            .unwrap_or_else(|| self.routes.unauthorized.clone())
    }

    pub fn routes(&self) -> &Routes {
        &self.routes
    }

    pub fn landing_entries(&self) -> &[PolicyEntry] {
        &self.landing
    }

    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    /// Roles guarding some section that have no landing entry
    ///
    /// Identities holding only such a role land on the root path. Privileged
    /// labels are skipped since they always land on root anyway.
    pub fn unmapped_required_roles(&self) -> Vec<RoleLabel> {
        let mut seen = HashSet::new();
        let mut unmapped = Vec::new();

        for section in &self.sections {
            for role in section.required.iter() {
                if role.is_privileged() || self.landing_index.contains_key(role) {
                    continue;
                }
                if seen.insert(role.clone()) {
                    unmapped.push(role.clone());
                }
            }
        }

        unmapped
    }
}

impl Default for PolicyTable {
    fn default() -> Self {
        Self::builtin()
    }
}

impl TryFrom<PolicyTableConfig> for PolicyTable {
    type Error = RbacError;

    fn try_from(config: PolicyTableConfig) -> Result<Self> {
        Self::new(config.landing, config.sections, config.routes)
    }
}

fn check_path(path: &str, what: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(RbacError::InvalidPolicy(format!(
            "{} must start with '/', got '{}'",
            what, path
        )));
    }
    Ok(())
}

fn check_label(role: &RoleLabel, what: &str) -> Result<()> {
    if role.as_str().is_empty() {
        return Err(RbacError::InvalidPolicy(format!(
            "{} has an empty role label",
            what
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtin_lookup() {
        let table = PolicyTable::builtin();

        assert_eq!(table.resolve(&"Store".into()), Some("/store/dashboard"));
        assert_eq!(table.resolve(&"StoreKeeper".into()), Some("/store/dashboard"));
        assert_eq!(table.resolve(&"Cutting".into()), Some("/cutting/dashboard"));
        assert_eq!(table.resolve(&"Unknown".into()), None);
        assert_eq!(table.resolve(&"store".into()), None);
    }

    #[test]
    fn test_builtin_is_valid() {
        let table = PolicyTable::builtin();
        assert!(table.validate().is_ok());
        assert!(table.unmapped_required_roles().is_empty());
    }

    #[test]
    fn test_sections() {
        let table = PolicyTable::builtin();

        let store = table.required_roles("store").unwrap();
        assert!(store.contains("Store"));
        assert!(store.contains("StoreKeeper"));

        assert!(table.required_roles("profile").unwrap().is_empty());
        assert!(table.section("payroll").is_none());
    }

    #[test]
    fn test_deny_path_override() {
        let section = Section::new("hr", RequiredRoleSet::new(["HR"])).with_deny_path("/hr/denied");
        let table = PolicyTable::new(vec![], vec![section], Routes::default()).unwrap();

        let hr = table.section("hr").unwrap();
        assert_eq!(table.deny_path(hr), "/hr/denied");

        let builtin = PolicyTable::builtin();
        let store = builtin.section("store").unwrap();
        assert_eq!(builtin.deny_path(store), "/unauthorized");
    }

    #[test]
    fn test_duplicate_landing_rejected() {
        let result = PolicyTable::new(
            vec![
                PolicyEntry::new("Store", "/store/dashboard"),
                PolicyEntry::new("Store", "/store/other"),
            ],
            vec![],
            Routes::default(),
        );

        assert!(matches!(result, Err(RbacError::InvalidPolicy(_))));
    }

    #[test]
    fn test_relative_path_rejected() {
        let result = PolicyTable::new(
            vec![PolicyEntry::new("Store", "store/dashboard")],
            vec![],
            Routes::default(),
        );

        assert!(matches!(result, Err(RbacError::InvalidPolicy(_))));
    }

    #[test]
    fn test_unmapped_required_roles() {
        let table = PolicyTable::new(
            vec![PolicyEntry::new("Store", "/store/dashboard")],
            vec![
                Section::new("store", RequiredRoleSet::new(["Store", "Admin"])),
                Section::new("qa", RequiredRoleSet::new(["Quality"])),
                Section::new("qa-reports", RequiredRoleSet::new(["Quality"])),
            ],
            Routes::default(),
        )
        .unwrap();

        assert_eq!(table.unmapped_required_roles(), vec![RoleLabel::new("Quality")]);
    }

    #[test]
    fn test_from_toml() {
        let source = r#"
            [routes]
            login = "/auth/login"

            [[landing]]
            role = "Cutting"
            path = "/cutting/dashboard"

            [[sections]]
            name = "cutting"
            required = ["Cutting"]
            deny_path = "/cutting/denied"

            [[sections]]
            name = "profile"
        "#;

        let table = PolicyTable::from_toml_str(source).unwrap();
        assert_eq!(table.routes().login, "/auth/login");
        assert_eq!(table.routes().unauthorized, "/unauthorized");
        assert_eq!(table.resolve(&"Cutting".into()), Some("/cutting/dashboard"));
        assert!(table.required_roles("profile").unwrap().is_empty());
        assert_eq!(
            table.section("cutting").unwrap().deny_path.as_deref(),
            Some("/cutting/denied")
        );
    }

    #[test]
    fn test_from_toml_malformed() {
        let result = PolicyTable::from_toml_str("[[landing]]\nrole = 3");
        assert!(matches!(result, Err(RbacError::Config(_))));
    }
}
