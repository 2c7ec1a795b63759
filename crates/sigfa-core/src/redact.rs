//! # Redactor
//!
//! Applies a record's own [`PermissionSet`](crate::PermissionSet) to its
//! sensitive groups. A withheld category is cleared as a unit: every series
//! of the group is emptied together, scalar groups are dropped. Groups that
//! were never present stay absent. Redacting twice changes nothing.
//!
//! Visibility is not handled here. Listings drop invisible records before
//! counting and single fetches turn them into not-found; the redactor only
//! sees records that are allowed to exist in a response.

use crate::category::Category;
use crate::model::{Enterprise, Establishment};
use crate::summary::Summary;

/// Clear every sensitive group the record's permission set does not disclose.
pub trait Redact {
    fn redact(&mut self);

    /// Owned variant for iterator pipelines.
    fn redacted(mut self) -> Self
    where
        Self: Sized,
    {
        self.redact();
        self
    }
}

/// Empty a present group in place, keeping absent ones absent.
fn withhold<T: Default>(group: &mut Option<T>) {
    if let Some(value) = group.as_mut() {
        *value = T::default();
    }
}

impl Redact for Establishment {
    fn redact(&mut self) {
        let perms = self.permissions;
        if !perms.discloses(Category::Score) {
            withhold(&mut self.scores);
        }
        if !perms.discloses(Category::TaxDebt) {
            withhold(&mut self.tax_debt);
        }
        if !perms.discloses(Category::Furlough) {
            withhold(&mut self.furlough);
        }
    }
}

impl Redact for Enterprise {
    fn redact(&mut self) {
        let perms = self.permissions;
        if !perms.discloses(Category::Financial) {
            withhold(&mut self.financials);
        }
        if !perms.discloses(Category::LoanGuarantee) {
            self.loan_guarantee = None;
        }
    }
}

impl Redact for Summary {
    fn redact(&mut self) {
        let perms = self.permissions;
        if !perms.discloses(Category::Score) {
            self.score = None;
        }
        if !perms.discloses(Category::TaxDebt) {
            self.tax_debt = None;
        }
        if !perms.discloses(Category::Furlough) {
            self.furlough = None;
        }
        if !perms.discloses(Category::Financial) {
            self.financial = None;
        }
        if !perms.discloses(Category::LoanGuarantee) {
            self.loan_guarantee = None;
        }
    }
}
