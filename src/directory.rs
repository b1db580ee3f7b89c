//! Client credential directory.
//!
//! Maps an opaque client identifier to the (assistant identifier, API key)
//! pair used to talk to the hosted assistants API on that client's behalf.
//! The directory is loaded once at startup from a CSV file and is read-only
//! for the lifetime of the process.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, bail};

/// A single client's credentials.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientRecord {
    /// Opaque client identifier (unique key).
    pub client_id: String,
    /// Assistant to run queries against.
    pub assistant_id: String,
    /// API key used for all gateway calls on behalf of this client.
    pub api_key: String,
}

/// Read-only lookup table from client id to [`ClientRecord`].
#[derive(Debug)]
pub struct CredentialDirectory {
    records: HashMap<String, ClientRecord>,
}

impl CredentialDirectory {
    /// Load the directory from a CSV file with a
    /// `client_id,assistant_id,api_key` header row.
    ///
    /// A missing file, missing or misnamed header, or a row with fewer than
    /// three fields is a startup-fatal error. Duplicate client ids are not
    /// validated; the last row wins.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is malformed.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read credentials file '{}'", path.display()))?;
        let directory = Self::parse(&raw)
            .with_context(|| format!("malformed credentials file '{}'", path.display()))?;

        tracing::info!(
            name: "credentials.loaded",
            path = %path.display(),
            clients = directory.len(),
            "Credential directory loaded"
        );

        Ok(directory)
    }

    /// Parse CSV content into a directory.
    ///
    /// # Errors
    ///
    /// Returns an error on a missing/invalid header or a short row.
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let mut lines = raw.lines().enumerate();

        let header = loop {
            match lines.next() {
                Some((_, line)) if line.trim().is_empty() => {}
                Some((_, line)) => break line,
                None => bail!("credentials file is empty"),
            }
        };

        let header_fields: Vec<&str> = header.split(',').map(str::trim).collect();
        if header_fields != ["client_id", "assistant_id", "api_key"] {
            bail!("expected header 'client_id,assistant_id,api_key', got '{header}'");
        }

        let mut records = HashMap::new();
        for (idx, line) in lines {
            if line.trim().is_empty() {
                continue;
            }
            let mut fields = line.splitn(3, ',').map(str::trim);
            let (Some(client_id), Some(assistant_id), Some(api_key)) =
                (fields.next(), fields.next(), fields.next())
            else {
                bail!("row {} has fewer than three fields", idx + 1);
            };
            if client_id.is_empty() {
                bail!("row {} has an empty client_id", idx + 1);
            }
            records.insert(
                client_id.to_string(),
                ClientRecord {
                    client_id: client_id.to_string(),
                    assistant_id: assistant_id.to_string(),
                    api_key: api_key.to_string(),
                },
            );
        }

        Ok(Self { records })
    }

    /// Look up a client's credentials.
    #[must_use]
    pub fn lookup(&self, client_id: &str) -> Option<&ClientRecord> {
        self.records.get(client_id)
    }

    /// Number of known clients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check whether the directory is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}
