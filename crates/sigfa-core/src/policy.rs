//! # Disclosure Policy
//!
//! [`evaluate`] maps a principal's [`Scope`] and the disclosure facts of one
//! entity to a [`PermissionSet`]:
//!
//! ```text
//! visible   = geo ∩ footprint ≠ ∅          (wildcard: always)
//! in_zone   = department ∈ geo
//! flag[c]   = c ∈ mandates ∧ (followed ∨ (visible ∧ alert))
//! ```
//!
//! `visible` is a coarse claim on the enterprise as a whole; `in_zone` only
//! frames one site for display and never grants disclosure. Jurisdiction and
//! mandate together are not enough: without an alert history or a follow
//! relation every category stays withheld. Following any site of an
//! enterprise unlocks the principal's mandated categories on every site of
//! it, even outside their jurisdiction.
//!
//! The function is total and has no side effects. Every read path calls it.

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::category::Category;
use crate::identity::{DepartmentCode, Footprint};
use crate::scope::Scope;

/// One disclosure flag per sensitive category.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CategoryFlags {
    pub score: bool,
    pub tax_debt: bool,
    pub furlough: bool,
    pub financial: bool,
    pub loan_guarantee: bool,
}

impl CategoryFlags {
    pub fn get(&self, category: Category) -> bool {
        match category {
            Category::Score => self.score,
            Category::TaxDebt => self.tax_debt,
            Category::Furlough => self.furlough,
            Category::Financial => self.financial,
            Category::LoanGuarantee => self.loan_guarantee,
        }
    }

    pub fn set(&mut self, category: Category, value: bool) {
        let slot = match category {
            Category::Score => &mut self.score,
            Category::TaxDebt => &mut self.tax_debt,
            Category::Furlough => &mut self.furlough,
            Category::Financial => &mut self.financial,
            Category::LoanGuarantee => &mut self.loan_guarantee,
        };
        *slot = value;
    }

    pub fn any(&self) -> bool {
        Category::ALL.iter().any(|c| self.get(*c))
    }
}

/// What a principal may see about one entity. Recomputed per request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct PermissionSet {
    /// The principal has a jurisdictional claim on the enterprise.
    pub visible: bool,
    /// This specific site is inside the principal's area.
    pub in_zone: bool,
    pub categories: CategoryFlags,
}

impl PermissionSet {
    /// Nothing visible, nothing disclosed. The value records start with.
    pub const DENIED: PermissionSet = PermissionSet {
        visible: false,
        in_zone: false,
        categories: CategoryFlags {
            score: false,
            tax_debt: false,
            furlough: false,
            financial: false,
            loan_guarantee: false,
        },
    };

    pub fn discloses(&self, category: Category) -> bool {
        self.categories.get(category)
    }
}

/// Disclosure facts about one entity, as seen by one principal.
#[derive(Debug, Clone, Copy)]
pub struct DisclosureSubject<'a> {
    /// Departments of the owning enterprise.
    pub footprint: &'a Footprint,
    /// The entity's own department (head office for an enterprise).
    pub department: Option<&'a DepartmentCode>,
    /// Alert history; absent means no known history.
    pub alert: Option<bool>,
    /// The principal follows the owning enterprise through any of its sites.
    pub followed: bool,
}

/// Compute the permission set for one (scope, entity) pair.
pub fn evaluate(scope: &Scope, subject: &DisclosureSubject<'_>) -> PermissionSet {
    let visible = scope.geo().intersects(subject.footprint);
    let in_zone = subject
        .department
        .map_or(false, |dept| scope.geo().contains(dept));
    let unlocked = subject.followed || (visible && subject.alert.unwrap_or(false));

    let mut categories = CategoryFlags::default();
    for category in Category::ALL {
        categories.set(category, unlocked && scope.holds(category));
    }

    PermissionSet {
        visible,
        in_zone,
        categories,
    }
}
