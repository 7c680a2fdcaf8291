//! Column encoding shared by the SQLite repositories
//!
//! Timestamps are stored as RFC 3339 text in UTC, status enums as their
//! lowercase names and nested collections as JSON.

use std::str::FromStr;

use chrono::{DateTime, SecondsFormat, SubsecRound, Utc};
use matsync_domain::MatSyncError;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::errors::InfraError;

/// Current time at the precision the columns keep.
pub(crate) fn now() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

pub(crate) fn encode_time(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn decode_time(raw: &str) -> Result<DateTime<Utc>, InfraError> {
    DateTime::parse_from_rfc3339(raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|err| corrupt(format!("invalid timestamp '{raw}': {err}")))
}

pub(crate) fn decode_uuid(raw: &str) -> Result<Uuid, InfraError> {
    Uuid::parse_str(raw).map_err(|err| corrupt(format!("invalid uuid '{raw}': {err}")))
}

pub(crate) fn decode_enum<T>(raw: &str) -> Result<T, InfraError>
where
    T: FromStr<Err = String>,
{
    raw.parse::<T>().map_err(corrupt)
}

pub(crate) fn encode_json<T: Serialize + ?Sized>(value: &T) -> Result<String, InfraError> {
    Ok(serde_json::to_string(value)?)
}

pub(crate) fn decode_json<T: DeserializeOwned>(raw: &str) -> Result<T, InfraError> {
    Ok(serde_json::from_str(raw)?)
}

fn corrupt(message: String) -> InfraError {
    InfraError(MatSyncError::Database(format!("corrupt row: {message}")))
}
