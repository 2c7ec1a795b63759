//! # sigfa-core: Disclosure-Control Core
//!
//! Types and pure functions shared by every read path of the weak-signals
//! monitor. Nothing in this crate performs I/O: rows come in from the
//! catalog layer, records go out to the HTTP layer.
//!
//! ## Design Principles
//!
//! 1. **Closed role tags.** A principal's authorization is parsed once into a
//!    [`Scope`] made of typed [`RoleTag`]s. Geographic membership and mandates
//!    are checked with set operations, never with string matching.
//!
//! 2. **One policy.** [`evaluate`] is the only function that decides what a
//!    principal may see about an entity. Every view calls it the same way.
//!
//! 3. **Category-atomic redaction.** Sensitive data is grouped per
//!    [`Category`]; the [`Redact`] implementations clear a whole group or
//!    nothing. Parallel series enforce equal-length columns by construction.

pub mod category;
pub mod error;
pub mod identity;
pub mod model;
pub mod policy;
pub mod redact;
pub mod scope;
pub mod summary;

pub use category::Category;
pub use error::ValidationError;
pub use identity::{DepartmentCode, Footprint, Siren, Siret};
pub use model::{
    Activity, AdministrativeState, AlertLevel, Enterprise, Establishment, FinancialHistory,
    FinancialStatement, FurloughConsumption, FurloughHistory, FurloughRequest, PaymentBehaviour,
    PaymentDelay, Procedure, ProcedureState, Score, TaxDebtHistory, TaxDebtPeriod, TaxDebtSeries,
};
pub use policy::{evaluate, CategoryFlags, DisclosureSubject, PermissionSet};
pub use redact::Redact;
pub use scope::{Elevation, GeoScope, RoleTag, Scope};
pub use summary::{
    FinancialIndicators, FurloughIndicators, ScoreIndicators, Summary, TaxDebtIndicators,
};
