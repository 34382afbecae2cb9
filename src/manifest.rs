//! Build manifest: the metadata entry of a package.
//!
//! Every package carries one `collection.json` describing its contents to the
//! headset runtime. Wire names are PascalCase and dates are ISO-8601, the
//! format the runtime has consumed since the first package release — the
//! serialized shape is a compatibility contract, not a style choice.
//!
//! The identifier is derived, not stored by the author:
//! `lowercase(author + "-" + name)`, sanitized so it is always safe as a file
//! name and as a zip entry name. Two collections by the same author with the
//! same name share an identifier; nothing beyond author+name is enforced.

use crate::types::AssetCollection;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Metadata describing one built package.
///
/// `addressable_names` is ordered like the filtered asset list and its names
/// are unique within one manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct BuildManifest {
    pub identifier: String,
    pub name: String,
    pub author: String,
    pub creation_date: DateTime<Utc>,
    pub addressable_names: Vec<String>,
}

impl BuildManifest {
    pub fn new(collection: &AssetCollection, addressable_names: Vec<String>) -> Self {
        Self {
            identifier: identifier(&collection.author, &collection.name),
            name: collection.name.clone(),
            author: collection.author.clone(),
            creation_date: collection.created,
            addressable_names,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

/// Derive a package identifier from author and collection name.
///
/// Lowercased `author-name` with every character outside `[a-z0-9._-]`
/// replaced by `-`, so the result is usable verbatim as a file stem and a
/// zip entry name.
pub fn identifier(author: &str, name: &str) -> String {
    format!("{author}-{name}")
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '-',
        })
        .collect()
}
