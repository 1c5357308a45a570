//! Session record layout
//!
//! The record is stored under four fixed keys:
//! `{ whitelist: [string], isActive: bool, endTime: int64 | null, killSwitchUuid: string }`

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;

use crate::{Store, StoreError, StoreResult};

/// Keys of the persisted session record
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RecordKey {
    Whitelist,
    IsActive,
    EndTime,
    KillSwitchUuid,
}

impl RecordKey {
    pub const ALL: [RecordKey; 4] = [
        RecordKey::Whitelist,
        RecordKey::IsActive,
        RecordKey::EndTime,
        RecordKey::KillSwitchUuid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            RecordKey::Whitelist => "whitelist",
            RecordKey::IsActive => "isActive",
            RecordKey::EndTime => "endTime",
            RecordKey::KillSwitchUuid => "killSwitchUuid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == s)
    }
}

/// A partial record: some keys with JSON values
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordPatch {
    values: BTreeMap<RecordKey, Value>,
}

impl RecordPatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, key: RecordKey, value: impl Serialize) -> StoreResult<Self> {
        self.insert(key, value)?;
        Ok(self)
    }

    pub fn insert(&mut self, key: RecordKey, value: impl Serialize) -> StoreResult<()> {
        self.values.insert(key, serde_json::to_value(value)?);
        Ok(())
    }

    pub fn insert_raw(&mut self, key: RecordKey, value: Value) {
        self.values.insert(key, value);
    }

    /// Typed read of one key; `None` if absent
    pub fn get<T: DeserializeOwned>(&self, key: RecordKey) -> StoreResult<Option<T>> {
        match self.values.get(&key) {
            None => Ok(None),
            Some(v) => serde_json::from_value(v.clone())
                .map(Some)
                .map_err(|e| StoreError::InvalidValue {
                    key: key.as_str().to_string(),
                    message: e.to_string(),
                }),
        }
    }

    pub fn contains(&self, key: RecordKey) -> bool {
        self.values.contains_key(&key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&RecordKey, &Value)> {
        self.values.iter()
    }
}

/// The complete session record as persisted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionRecord {
    pub whitelist: Vec<String>,
    pub is_active: bool,
    /// Epoch milliseconds
    pub end_time: Option<i64>,
    pub kill_switch_uuid: String,
}

impl SessionRecord {
    /// The record written at install time
    pub fn initial() -> Self {
        Self {
            whitelist: Vec::new(),
            is_active: false,
            end_time: None,
            kill_switch_uuid: String::new(),
        }
    }

    /// Load the record; `None` if it was never installed
    pub fn load(store: &dyn Store) -> StoreResult<Option<Self>> {
        let patch = store.get(&RecordKey::ALL)?;
        let Some(is_active) = patch.get::<bool>(RecordKey::IsActive)? else {
            return Ok(None);
        };

        Ok(Some(Self {
            whitelist: patch.get(RecordKey::Whitelist)?.unwrap_or_default(),
            is_active,
            end_time: patch.get::<Option<i64>>(RecordKey::EndTime)?.flatten(),
            kill_switch_uuid: patch.get(RecordKey::KillSwitchUuid)?.unwrap_or_default(),
        }))
    }

    /// Write all four keys
    pub fn save(&self, store: &dyn Store) -> StoreResult<()> {
        store.set(&self.to_patch()?)
    }

    pub fn to_patch(&self) -> StoreResult<RecordPatch> {
        RecordPatch::new()
            .with(RecordKey::Whitelist, &self.whitelist)?
            .with(RecordKey::IsActive, self.is_active)?
            .with(RecordKey::EndTime, self.end_time)?
            .with(RecordKey::KillSwitchUuid, &self.kill_switch_uuid)
    }
}

/// Write only the allow-list key
pub fn save_whitelist(store: &dyn Store, whitelist: &[String]) -> StoreResult<()> {
    store.set(&RecordPatch::new().with(RecordKey::Whitelist, whitelist)?)
}
