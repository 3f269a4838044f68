use std::collections::HashSet;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

const CSV_HEADER: [&str; 4] = ["address", "chain", "category", "source_url"];

/// Address lookup used by the scam-interaction rule.
pub trait ScamLookup: Send + Sync {
    /// Case-insensitive membership check.
    fn is_scam(&self, address: &str) -> bool;
}

/// Known scam addresses, backed by a CSV file and cached in memory.
///
/// Addresses are stored lowercased. The cache is reloaded from disk when it is
/// empty or older than the configured TTL; callers decide when to check.
pub struct ScamDatabase {
    path: Option<PathBuf>,
    ttl: Duration,
    addresses: HashSet<String>,
    loaded_at: Option<Instant>,
}

impl ScamDatabase {
    /// A store bound to `path`. Nothing is read until the first reload.
    pub fn new(path: impl Into<PathBuf>, ttl: Duration) -> Self {
        Self {
            path: Some(path.into()),
            ttl,
            addresses: HashSet::new(),
            loaded_at: None,
        }
    }

    /// An in-memory store with no backing file.
    pub fn from_addresses<I, S>(addresses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            path: None,
            ttl: Duration::MAX,
            addresses: addresses
                .into_iter()
                .map(|a| a.as_ref().trim().to_lowercase())
                .filter(|a| !a.is_empty())
                .collect(),
            loaded_at: Some(Instant::now()),
        }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn is_stale(&self, now: Instant) -> bool {
        if self.path.is_none() {
            return false;
        }
        match self.loaded_at {
            None => true,
            Some(at) => self.addresses.is_empty() || now.saturating_duration_since(at) > self.ttl,
        }
    }

    /// Reload from disk if the cache is stale. Returns true if a reload happened.
    pub fn reload_if_stale(&mut self) -> bool {
        self.reload_if_stale_at(Instant::now())
    }

    pub fn reload_if_stale_at(&mut self, now: Instant) -> bool {
        if !self.is_stale(now) {
            return false;
        }
        match self.load(now) {
            Ok(count) => {
                tracing::debug!(entries = count, "Scam database loaded");
                true
            }
            Err(e) => {
                // Keep whatever was cached before.
                tracing::error!(error = %e, "Failed to load scam database");
                false
            }
        }
    }

    /// Read the backing CSV into memory, creating an empty file if none exists.
    pub fn load(&mut self, now: Instant) -> eyre::Result<usize> {
        let Some(path) = self.path.clone() else {
            return Ok(self.addresses.len());
        };

        if !path.exists() {
            tracing::warn!(path = %path.display(), "Scam database file not found, creating an empty one");
            create_with_header(&path)?;
            self.addresses.clear();
            self.loaded_at = Some(now);
            return Ok(0);
        }

        let addresses = parse_scam_csv(&path)?;
        tracing::info!(entries = addresses.len(), path = %path.display(), "Loaded scam database");
        self.addresses = addresses;
        self.loaded_at = Some(now);
        Ok(self.addresses.len())
    }

    /// Append an entry to the backing file and the in-memory set.
    /// Returns false if the write fails.
    pub fn add_entry(&mut self, address: &str, chain: &str, category: &str, source_url: &str) -> bool {
        let address = address.trim();
        if address.is_empty() {
            tracing::warn!("Refusing to add empty scam address");
            return false;
        }

        if let Some(path) = &self.path {
            if let Err(e) = append_entry(path, [address, chain, category, source_url]) {
                tracing::error!(address, error = %e, "Error adding scam entry");
                return false;
            }
        }

        self.addresses.insert(address.to_lowercase());
        tracing::info!(address, chain, category, "Added scam entry");
        true
    }
}

impl ScamLookup for ScamDatabase {
    fn is_scam(&self, address: &str) -> bool {
        self.addresses.contains(&address.trim().to_lowercase())
    }
}

/// Parse the `address` column of a scam CSV. Rows without an address are skipped.
pub fn parse_scam_csv(path: &Path) -> eyre::Result<HashSet<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)
        .map_err(|e| eyre::eyre!("Failed to open scam CSV '{}': {}", path.display(), e))?;

    let column = reader
        .headers()?
        .iter()
        .position(|h| h.trim().eq_ignore_ascii_case("address"))
        .unwrap_or(0);

    let mut addresses = HashSet::new();
    for result in reader.records() {
        let record = result?;
        let address = record.get(column).unwrap_or("").trim();
        if !address.is_empty() {
            addresses.insert(address.to_lowercase());
        }
    }

    Ok(addresses)
}

fn create_with_header(path: &Path) -> eyre::Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .map_err(|e| eyre::eyre!("Failed to create data directory '{}': {}", dir.display(), e))?;
        }
    }
    let mut writer = csv::Writer::from_path(path)?;
    writer.write_record(CSV_HEADER)?;
    writer.flush()?;
    Ok(())
}

fn append_entry(path: &Path, record: [&str; 4]) -> eyre::Result<()> {
    if !path.exists() {
        create_with_header(path)?;
    }
    let file = OpenOptions::new().append(true).open(path)?;
    let mut writer = csv::Writer::from_writer(file);
    writer.write_record(record)?;
    writer.flush()?;
    Ok(())
}
