//! Persistent, de-duplicated list of searched cities.
//!
//! The whole list lives in one pretty-printed JSON array. Every mutation is a
//! read → modify → write cycle under the store's mutex, and the write goes to
//! a sibling temp file that is renamed over the target, so readers only ever
//! observe a complete document.

use std::{
    io::ErrorKind as IoErrorKind,
    path::{Path, PathBuf},
};

use chrono::Utc;
use tokio::{fs, io::AsyncWriteExt, sync::Mutex};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::{error::WeatherError, model::City};

#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    write_lock: Mutex<()>,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into(), write_lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All cities in insertion order, oldest first.
    ///
    /// Never fails: unreadable storage is logged and reported as empty.
    pub async fn list(&self) -> Vec<City> {
        match self.read_entries().await {
            Ok(cities) => cities,
            Err(err) => {
                warn!(error = %err, "Treating unreadable history as empty");
                Vec::new()
            }
        }
    }

    /// Display order used by the dashboard: most recent search first.
    pub async fn list_newest_first(&self) -> Vec<City> {
        let mut cities = self.list().await;
        cities.reverse();
        cities
    }

    /// Add a city, or return the existing record if the name is already
    /// present (compared case-insensitively).
    pub async fn add(&self, name: &str) -> Result<City, WeatherError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(WeatherError::Validation("City name cannot be blank".to_string()));
        }

        let _guard = self.write_lock.lock().await;
        let mut cities = self.read_for_update().await?;

        let wanted = name.to_lowercase();
        if let Some(existing) = cities.iter().find(|c| c.name.to_lowercase() == wanted) {
            debug!(name = %existing.name, id = %existing.id, "City already in history");
            return Ok(existing.clone());
        }

        let city = City { name: name.to_string(), id: Uuid::new_v4().to_string() };
        cities.push(city.clone());
        self.write_entries(&cities).await?;

        info!(name = %city.name, id = %city.id, "Added city to history");
        Ok(city)
    }

    /// Remove the city with the given id.
    pub async fn remove(&self, id: &str) -> Result<(), WeatherError> {
        let id = id.trim();
        if id.is_empty() {
            return Err(WeatherError::Validation("City ID is required".to_string()));
        }

        let _guard = self.write_lock.lock().await;
        let mut cities = self.read_for_update().await?;

        let Some(pos) = cities.iter().position(|c| c.id == id) else {
            return Err(WeatherError::NotFound(format!("No city in history with id {id}")));
        };

        let removed = cities.remove(pos);
        self.write_entries(&cities).await?;

        info!(name = %removed.name, id = %removed.id, "Removed city from history");
        Ok(())
    }

    /// Read for display: a corrupt document is logged and reported as empty.
    async fn read_entries(&self) -> Result<Vec<City>, WeatherError> {
        match self.read_stored().await? {
            Stored::Cities(cities) => Ok(cities),
            Stored::Corrupt(err) => {
                warn!(path = %self.path.display(), error = %err, "History file is corrupt, treating as empty");
                Ok(Vec::new())
            }
        }
    }

    /// Read ahead of a write. A corrupt document is moved aside first so the
    /// write that follows does not destroy it.
    async fn read_for_update(&self) -> Result<Vec<City>, WeatherError> {
        match self.read_stored().await? {
            Stored::Cities(cities) => Ok(cities),
            Stored::Corrupt(err) => {
                let backup = self.corrupt_backup_path();
                fs::rename(&self.path, &backup)
                    .await
                    .map_err(|e| WeatherError::storage("back up corrupt", &self.path, e))?;
                error!(
                    path = %self.path.display(),
                    backup = %backup.display(),
                    error = %err,
                    "History file is corrupt; moved aside and starting a new list"
                );
                Ok(Vec::new())
            }
        }
    }

    async fn read_stored(&self) -> Result<Stored, WeatherError> {
        let contents = match fs::read_to_string(&self.path).await {
            Ok(contents) => contents,
            Err(err) if err.kind() == IoErrorKind::NotFound => return Ok(Stored::Cities(Vec::new())),
            Err(err) => return Err(WeatherError::storage("read", &self.path, err)),
        };

        if contents.trim().is_empty() {
            return Ok(Stored::Cities(Vec::new()));
        }

        Ok(match serde_json::from_str(&contents) {
            Ok(cities) => Stored::Cities(cities),
            Err(err) => Stored::Corrupt(err),
        })
    }

    async fn write_entries(&self, cities: &[City]) -> Result<(), WeatherError> {
        let json = serde_json::to_string_pretty(cities)
            .map_err(|e| WeatherError::storage("serialize", &self.path, e))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| WeatherError::storage("create directory for", &self.path, e))?;
        }

        let tmp = self.temp_path();
        if let Err(err) = write_and_sync(&tmp, json.as_bytes()).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(WeatherError::storage("write", &tmp, err));
        }

        if let Err(err) = fs::rename(&tmp, &self.path).await {
            let _ = fs::remove_file(&tmp).await;
            return Err(WeatherError::storage("replace", &self.path, err));
        }

        sync_parent_dir(&self.path)
            .await
            .map_err(|e| WeatherError::storage("sync directory of", &self.path, e))
    }

    fn temp_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "history.json".to_string());

        self.path.with_file_name(format!(".{file_name}.{}.tmp", Uuid::new_v4().simple()))
    }

    fn corrupt_backup_path(&self) -> PathBuf {
        let file_name = self
            .path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "history.json".to_string());
        let stamp = Utc::now().format("%Y%m%dT%H%M%S");

        self.path.with_file_name(format!("{file_name}.corrupt-{stamp}-{}", Uuid::new_v4().simple()))
    }
}

enum Stored {
    Cities(Vec<City>),
    Corrupt(serde_json::Error),
}

async fn write_and_sync(path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = fs::File::create(path).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    Ok(())
}

/// Make the rename itself durable.
#[cfg(unix)]
async fn sync_parent_dir(path: &Path) -> std::io::Result<()> {
    match path.parent().filter(|p| !p.as_os_str().is_empty()) {
        Some(dir) => fs::File::open(dir).await?.sync_all().await,
        None => fs::File::open(".").await?.sync_all().await,
    }
}

#[cfg(not(unix))]
async fn sync_parent_dir(_path: &Path) -> std::io::Result<()> {
    Ok(())
}
