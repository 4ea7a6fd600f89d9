//! Status enums shared by the staging tables.
//!
//! Both enums are stored as short strings so the staging tables stay readable
//! from any SQL client.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Outcome of validating a staged record
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ValidationStatus {
    /// Not yet looked at by the reconciler
    #[sea_orm(string_value = "pending")]
    Pending,
    /// Passed validation and was merged into production
    #[sea_orm(string_value = "success")]
    Success,
    /// Rejected; see `error_details`
    #[sea_orm(string_value = "failed")]
    Failed,
}

/// Lifecycle of a staged record inside the reconciler
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(16))")]
pub enum ProcessingStatus {
    /// Freshly staged, eligible for reconciliation
    #[sea_orm(string_value = "new")]
    New,
    /// Reconciled into production
    #[sea_orm(string_value = "processed")]
    Processed,
    /// Reconciliation gave up on this record
    #[sea_orm(string_value = "failed")]
    Failed,
}
