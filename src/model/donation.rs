//! Donor record schema
//!
//! The platform returns donor rows as loosely-keyed JSON. The fields below are
//! the ones the platform has served consistently; anything else lands in the
//! `extra` map so schema drift shows up as detectable surplus keys instead of
//! silently ragged output tables.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::collections::BTreeMap;

/// One donation row from a campaign's donor list
#[derive(Debug, Clone, Deserialize)]
pub struct Donation {
    #[serde(default)]
    pub id: Option<i64>,

    #[serde(default)]
    pub user: Option<DonorUser>,

    #[serde(default)]
    pub is_anonymous: Option<bool>,

    /// Donation amount in the platform's currency minor unit
    #[serde(default)]
    pub amount: Option<i64>,

    /// Donation timestamp, unix seconds
    #[serde(default)]
    pub created: Option<i64>,

    /// Fields present in the payload but not part of the known schema
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl Donation {
    /// The `created` unix timestamp converted to UTC, if present and valid
    pub fn created_utc(&self) -> Option<DateTime<Utc>> {
        self.created.and_then(|secs| DateTime::from_timestamp(secs, 0))
    }

    /// Donor display name, if the platform included one
    pub fn donor_name(&self) -> Option<&str> {
        self.user.as_ref().and_then(|u| u.name.as_deref())
    }

    /// True when the payload carried keys outside the known schema
    pub fn has_drift(&self) -> bool {
        !self.extra.is_empty()
    }
}

/// Nested donor identity object on a donation row
#[derive(Debug, Clone, Deserialize)]
pub struct DonorUser {
    /// The platform serves the display name under the key "string"
    #[serde(rename = "string", default)]
    pub name: Option<String>,
}
