//! Request/response types shared by the server and its clients.
//!
//! Monetary amounts cross the wire as integer minor units (`amount_minor`,
//! cents). Percentages are integers scaled by 10^4 (`percent_e4`, so
//! `333333` means `33.3333%`). Clients are expected to send values already
//! quantized at those scales.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// How an expense is divided among its participants.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SplitStrategy {
    Amount,
    Percentage,
}

/// Registered user vs. external friend.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParticipantKind {
    User,
    Friend,
}

pub mod common {
    use super::*;

    /// Pagination envelope for list responses.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct PageMeta {
        pub total: u64,
        pub page: u64,
        pub limit: u64,
    }
}

pub mod health {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct Health {
        pub status: String,
    }
}

pub mod friend {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FriendNew {
        pub name: String,
        pub notes: Option<String>,
    }

    /// Deserialize a present field (including explicit `null`) into
    /// `Some`, leaving an absent field as `None`. Required for
    /// `Option<Option<T>>` to distinguish absent from `null`, which serde's
    /// default `Option` deserialization otherwise collapses together.
    fn double_option<'de, D, T>(de: D) -> Result<Option<Option<T>>, D::Error>
    where
        D: serde::Deserializer<'de>,
        T: Deserialize<'de>,
    {
        Deserialize::deserialize(de).map(Some)
    }

    /// Partial update. Omitted fields are unchanged; `notes: null` clears.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FriendUpdate {
        pub name: Option<String>,
        #[serde(
            default,
            deserialize_with = "double_option",
            skip_serializing_if = "Option::is_none"
        )]
        pub notes: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FriendView {
        pub id: Uuid,
        pub name: String,
        pub notes: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct FriendListQuery {
        pub page: Option<u64>,
        pub limit: Option<u64>,
        pub name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct FriendListResponse {
        pub friends: Vec<FriendView>,
        pub meta: common::PageMeta,
    }
}

pub mod category {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryNew {
        pub name: String,
        pub color: Option<String>,
    }

    /// Partial update. Omitted fields are unchanged; `color: null` clears.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryUpdate {
        pub name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub color: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryView {
        pub id: Uuid,
        pub name: String,
        pub color: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct CategoryListQuery {
        pub page: Option<u64>,
        pub limit: Option<u64>,
        pub name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct CategoryListResponse {
        pub categories: Vec<CategoryView>,
        pub meta: common::PageMeta,
    }
}

pub mod group {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupNew {
        pub name: String,
        pub description: Option<String>,
    }

    /// Partial update. Omitted fields are unchanged; `description: null`
    /// clears.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GroupUpdate {
        pub name: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub description: Option<Option<String>>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupView {
        pub id: Uuid,
        pub name: String,
        pub description: Option<String>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct GroupListQuery {
        pub page: Option<u64>,
        pub limit: Option<u64>,
        pub name: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct GroupListResponse {
        pub groups: Vec<GroupView>,
        pub meta: common::PageMeta,
    }
}

pub mod expense {
    use super::*;

    /// One participant's proposed share.
    ///
    /// Exactly one of `user_id`/`friend_id` must be set, matching
    /// `participant_kind`. `amount_minor` is required for amount splits,
    /// `percent_e4` for percentage splits.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct SplitLinePayload {
        pub participant_kind: ParticipantKind,
        pub user_id: Option<Uuid>,
        pub friend_id: Option<Uuid>,
        pub amount_minor: Option<i64>,
        pub percent_e4: Option<i64>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseNew {
        pub description: String,
        pub amount_minor: i64,
        /// ISO 4217 code; server default is `BRL`.
        pub currency: Option<String>,
        /// Defaults to today (UTC) when omitted.
        pub date: Option<NaiveDate>,
        pub category_id: Option<Uuid>,
        pub group_id: Option<Uuid>,
        pub split_strategy: SplitStrategy,
        pub splits: Vec<SplitLinePayload>,
    }

    /// Partial update. Omitted fields are unchanged; `category_id: null` /
    /// `group_id: null` clear the reference. Supplying `splits` replaces the
    /// whole split set after re-validation.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseUpdate {
        pub description: Option<String>,
        pub amount_minor: Option<i64>,
        pub currency: Option<String>,
        pub date: Option<NaiveDate>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub category_id: Option<Option<Uuid>>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub group_id: Option<Option<Uuid>>,
        pub split_strategy: Option<SplitStrategy>,
        pub splits: Option<Vec<SplitLinePayload>>,
    }

    /// One persisted share of an expense.
    #[derive(Debug, Serialize, Deserialize)]
    pub struct ShareView {
        pub id: Uuid,
        pub participant_kind: ParticipantKind,
        pub user_id: Option<Uuid>,
        pub friend_id: Option<Uuid>,
        pub amount_minor: i64,
        /// Present only for percentage splits.
        pub percent_e4: Option<i64>,
        pub created_at: DateTime<Utc>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseView {
        pub id: Uuid,
        pub owner_id: Uuid,
        pub description: String,
        pub amount_minor: i64,
        pub currency: String,
        pub date: NaiveDate,
        pub category_id: Option<Uuid>,
        pub group_id: Option<Uuid>,
        pub split_strategy: SplitStrategy,
        pub created_at: DateTime<Utc>,
        /// In split order; for percentage splits the last share carries the
        /// rounding residual.
        pub splits: Vec<ShareView>,
    }

    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct ExpenseListQuery {
        pub page: Option<u64>,
        pub limit: Option<u64>,
        pub date_from: Option<NaiveDate>,
        pub date_to: Option<NaiveDate>,
        pub category_id: Option<Uuid>,
        pub group_id: Option<Uuid>,
        /// Description substring filter.
        pub q: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct ExpenseListResponse {
        pub expenses: Vec<ExpenseView>,
        pub meta: common::PageMeta,
    }
}
