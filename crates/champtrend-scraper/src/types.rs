//! Upstream response types for Data Dragon and the Bilibili search API.
//!
//! ## Observed shape: Data Dragon `champion.json`
//!
//! `data` is an object keyed by the champion's internal id (`"Aatrox"`), each
//! value carrying a localized `name`, an `info` block with `difficulty`
//! (0–10) and a `tags` array (`["Fighter", "Tank"]`). Entries are kept as raw
//! [`serde_json::Value`] here and parsed one by one, so a single malformed
//! entry cannot fail the whole document.
//!
//! ## Observed shape: Bilibili `x/web-interface/search/type`
//!
//! Envelope `{ code, message, data }`. `code` is `0` on success; negative
//! values (`-412` request banned, `-400` bad request) arrive with HTTP 200.
//! `data.result` is absent when the search has no hits.
//!
//! ### `play`
//! Usually a JSON number, sometimes a numeric string (`"123456"`), and on some
//! result kinds a placeholder such as `"--"`. Older result shapes omit `play`
//! and expose `stat.view` instead.

use std::collections::BTreeMap;

use serde::Deserialize;
use serde_json::Value;

/// Top-level `champion.json` document.
#[derive(Debug, Deserialize)]
pub struct ChampionDocument {
    pub data: BTreeMap<String, Value>,
}

/// One entry of `champion.json`'s `data` map.
#[derive(Debug, Deserialize)]
pub struct ChampionEntry {
    /// Localized display name (e.g., `"暗裔剑魔"` for `zh_CN`).
    pub name: String,
    pub info: ChampionInfo,
    #[serde(default)]
    pub tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct ChampionInfo {
    pub difficulty: i64,
}

/// Bilibili API envelope.
#[derive(Debug, Deserialize)]
pub struct SearchEnvelope {
    pub code: i64,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub data: Option<SearchData>,
}

#[derive(Debug, Deserialize)]
pub struct SearchData {
    /// Video results, kept raw so that `play` can be inspected per item.
    #[serde(default)]
    pub result: Option<Vec<Value>>,
}
