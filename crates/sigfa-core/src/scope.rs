//! # Principal Scope
//!
//! The identity layer hands over a list of opaque role tags. They are parsed
//! here, once per request, into a closed [`RoleTag`] type and folded into a
//! [`Scope`]:
//!
//! - geographic tags: department codes, or the nationwide wildcard;
//! - mandates: one per sensitive [`Category`];
//! - capabilities: [`Elevation`]s that let an administrative principal look
//!   beyond their normal scope.
//!
//! Unknown tags are ignored. A scope is immutable; elevating it produces a
//! new value and leaves the original untouched.

use std::collections::BTreeSet;

use crate::category::Category;
use crate::identity::{DepartmentCode, Footprint};

/// Role tag for the nationwide wildcard.
pub const NATIONWIDE_TAG: &str = "France entière";

/// An elevated capability. Holding it permits, but never forces, a wider view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Elevation {
    /// Evaluate as if the principal had nationwide jurisdiction.
    IgnoreJurisdiction,
    /// Evaluate as if the principal held every mandate.
    IgnoreMandate,
}

impl Elevation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IgnoreJurisdiction => "override:jurisdiction",
            Self::IgnoreMandate => "override:mandate",
        }
    }
}

impl std::fmt::Display for Elevation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parsed role tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RoleTag {
    Department(DepartmentCode),
    Nationwide,
    Mandate(Category),
    Capability(Elevation),
}

impl RoleTag {
    /// Parse one raw tag. Returns `None` for tags this service does not use.
    pub fn parse(raw: &str) -> Option<Self> {
        let tag = raw.trim();
        match tag {
            NATIONWIDE_TAG | "national" => return Some(Self::Nationwide),
            "override:jurisdiction" => return Some(Self::Capability(Elevation::IgnoreJurisdiction)),
            "override:mandate" => return Some(Self::Capability(Elevation::IgnoreMandate)),
            _ => {}
        }
        if let Some(category) = Category::from_tag(tag) {
            return Some(Self::Mandate(category));
        }
        DepartmentCode::new(tag).ok().map(Self::Department)
    }
}

/// Geographic part of a scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GeoScope {
    /// Matches every department.
    Nationwide,
    Departments(BTreeSet<DepartmentCode>),
}

impl GeoScope {
    pub fn contains(&self, code: &DepartmentCode) -> bool {
        match self {
            Self::Nationwide => true,
            Self::Departments(set) => set.contains(code),
        }
    }

    /// Whether any department of `footprint` falls in this scope.
    ///
    /// The wildcard intersects every footprint, including an empty one.
    pub fn intersects(&self, footprint: &Footprint) -> bool {
        match self {
            Self::Nationwide => true,
            Self::Departments(set) => footprint.iter().any(|d| set.contains(d)),
        }
    }

    /// Department codes for a source-side filter; `None` means unrestricted.
    pub fn departments(&self) -> Option<&BTreeSet<DepartmentCode>> {
        match self {
            Self::Nationwide => None,
            Self::Departments(set) => Some(set),
        }
    }
}

/// A principal's authorization, derived once per request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scope {
    geo: GeoScope,
    mandates: BTreeSet<Category>,
    capabilities: BTreeSet<Elevation>,
}

impl Scope {
    pub fn new(tags: impl IntoIterator<Item = RoleTag>) -> Self {
        let mut nationwide = false;
        let mut departments = BTreeSet::new();
        let mut mandates = BTreeSet::new();
        let mut capabilities = BTreeSet::new();
        for tag in tags {
            match tag {
                RoleTag::Nationwide => nationwide = true,
                RoleTag::Department(code) => {
                    departments.insert(code);
                }
                RoleTag::Mandate(category) => {
                    mandates.insert(category);
                }
                RoleTag::Capability(elevation) => {
                    capabilities.insert(elevation);
                }
            }
        }
        let geo = if nationwide {
            GeoScope::Nationwide
        } else {
            GeoScope::Departments(departments)
        };
        Self {
            geo,
            mandates,
            capabilities,
        }
    }

    /// Parse raw role tags, skipping the ones that mean nothing here.
    pub fn from_tags<I, S>(raw: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::new(raw.into_iter().filter_map(|tag| {
            let tag = tag.as_ref();
            let parsed = RoleTag::parse(tag);
            if parsed.is_none() {
                tracing::debug!(tag, "ignoring unrecognised role tag");
            }
            parsed
        }))
    }

    pub fn geo(&self) -> &GeoScope {
        &self.geo
    }

    pub fn holds(&self, category: Category) -> bool {
        self.mandates.contains(&category)
    }

    pub fn mandates(&self) -> impl Iterator<Item = Category> + '_ {
        self.mandates.iter().copied()
    }

    pub fn has_capability(&self, elevation: Elevation) -> bool {
        self.capabilities.contains(&elevation)
    }

    /// A widened copy of this scope, or `None` when the capability is not held.
    pub fn elevated(&self, elevation: Elevation) -> Option<Scope> {
        if !self.has_capability(elevation) {
            return None;
        }
        let mut wider = self.clone();
        match elevation {
            Elevation::IgnoreJurisdiction => wider.geo = GeoScope::Nationwide,
            Elevation::IgnoreMandate => wider.mandates = Category::ALL.into_iter().collect(),
        }
        Some(wider)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dept(code: &str) -> DepartmentCode {
        DepartmentCode::new(code).unwrap()
    }

    #[test]
    fn parse_recognises_every_kind() {
        assert_eq!(RoleTag::parse("75"), Some(RoleTag::Department(dept("75"))));
        assert_eq!(RoleTag::parse("France entière"), Some(RoleTag::Nationwide));
        assert_eq!(
            RoleTag::parse("urssaf"),
            Some(RoleTag::Mandate(Category::TaxDebt))
        );
        assert_eq!(
            RoleTag::parse("override:mandate"),
            Some(RoleTag::Capability(Elevation::IgnoreMandate))
        );
        assert_eq!(RoleTag::parse("wekan"), None);
    }

    #[test]
    fn from_tags_partitions() {
        let scope = Scope::from_tags(["01", "02", "score", "dgefp", "unknown"]);
        assert!(scope.geo().contains(&dept("01")));
        assert!(!scope.geo().contains(&dept("03")));
        assert!(scope.holds(Category::Score));
        assert!(scope.holds(Category::Furlough));
        assert!(!scope.holds(Category::TaxDebt));
    }

    #[test]
    fn wildcard_wins_over_departments() {
        let scope = Scope::from_tags(["01", "France entière"]);
        assert_eq!(scope.geo(), &GeoScope::Nationwide);
        assert!(scope.geo().intersects(&Footprint::new()));
    }

    #[test]
    fn departments_never_intersect_empty_footprint() {
        let scope = Scope::from_tags(["01"]);
        assert!(!scope.geo().intersects(&Footprint::new()));
    }

    #[test]
    fn intersects_is_footprint_wide() {
        let scope = Scope::from_tags(["02"]);
        let fp = Footprint::try_from_codes(["01", "02", "03"]).unwrap();
        assert!(scope.geo().intersects(&fp));
    }

    #[test]
    fn elevation_requires_capability() {
        let scope = Scope::from_tags(["01", "score"]);
        assert!(scope.elevated(Elevation::IgnoreJurisdiction).is_none());
        assert!(scope.elevated(Elevation::IgnoreMandate).is_none());
    }

    #[test]
    fn elevation_widens_copy_only() {
        let scope = Scope::from_tags(["01", "score", "override:jurisdiction", "override:mandate"]);
        let wide = scope.elevated(Elevation::IgnoreJurisdiction).unwrap();
        assert_eq!(wide.geo(), &GeoScope::Nationwide);
        assert!(matches!(scope.geo(), GeoScope::Departments(_)));

        let all = scope.elevated(Elevation::IgnoreMandate).unwrap();
        assert!(Category::ALL.iter().all(|c| all.holds(*c)));
        assert!(!scope.holds(Category::Financial));
    }
}
