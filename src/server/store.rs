// src/server/store.rs
use crate::core::constants::NEW_SCRIPT_TEMPLATE;
use crate::core::prelude::*;
use crate::server::utils::natural_sort::sort_naturally;
use crate::server::utils::validation::{validate_folder_name, validate_script_name};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScriptEntry {
    pub name: String,
    pub content: String,
}

impl AsRef<str> for ScriptEntry {
    fn as_ref(&self) -> &str {
        &self.name
    }
}

/// Folders of scripts below one root directory. Every name is validated
/// before it touches the filesystem.
pub struct ScriptStore {
    root: PathBuf,
    extension: String,
}

impl ScriptStore {
    pub async fn open<P: AsRef<Path>>(root: P, extension: &str) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        tokio::fs::create_dir_all(&root).await?;
        Ok(Self {
            root,
            extension: extension.to_string(),
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }

    fn folder_path(&self, folder: &str) -> Result<PathBuf> {
        validate_folder_name(folder)?;
        Ok(self.root.join(folder))
    }

    fn script_path(&self, folder: &str, name: &str) -> Result<PathBuf> {
        let folder_path = self.folder_path(folder)?;
        validate_script_name(name, &self.extension)?;
        Ok(folder_path.join(name))
    }

    pub async fn list_folders(&self) -> Result<Vec<String>> {
        let mut folders = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }
            if let Ok(name) = entry.file_name().into_string() {
                if !name.starts_with('.') {
                    folders.push(name);
                }
            }
        }
        sort_naturally(&mut folders);
        Ok(folders)
    }

    /// Missing folder lists as empty.
    pub async fn list_scripts(&self, folder: &str) -> Result<Vec<ScriptEntry>> {
        let folder_path = self.folder_path(folder)?;
        let mut entries = match tokio::fs::read_dir(&folder_path).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(AppError::Io(e)),
        };

        let mut scripts = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_file() {
                continue;
            }
            let Ok(name) = entry.file_name().into_string() else {
                continue;
            };
            if validate_script_name(&name, &self.extension).is_err() {
                continue;
            }
            let content = tokio::fs::read_to_string(entry.path()).await?;
            scripts.push(ScriptEntry { name, content });
        }
        sort_naturally(&mut scripts);
        Ok(scripts)
    }

    pub async fn read_script(&self, folder: &str, name: &str) -> Result<Option<String>> {
        let path = self.script_path(folder, name)?;
        match tokio::fs::read_to_string(&path).await {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    pub async fn save_script(&self, folder: &str, name: &str, content: &str) -> Result<()> {
        let path = self.script_path(folder, name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(&path, content).await?;
        log::info!("Saved script {}/{} ({} bytes)", folder, name, content.len());
        Ok(())
    }

    /// `false` when there was nothing to delete.
    pub async fn delete_script(&self, folder: &str, name: &str) -> Result<bool> {
        let path = self.script_path(folder, name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                log::info!("Deleted script {}/{}", folder, name);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        }
    }

    pub async fn create_folder(&self, name: &str) -> Result<()> {
        let path = self.folder_path(name)?;
        tokio::fs::create_dir_all(&path).await?;
        log::info!("Created folder {}", name);
        Ok(())
    }

    /// Never overwrites an existing script. Returns whether a file was created.
    pub async fn create_script(&self, folder: &str, name: &str) -> Result<bool> {
        let path = self.script_path(folder, name)?;
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let created = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await;
        match created {
            Ok(mut file) => {
                use tokio::io::AsyncWriteExt;
                file.write_all(NEW_SCRIPT_TEMPLATE.as_bytes()).await?;
                file.flush().await?;
                log::info!("Created script {}/{}", folder, name);
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
            Err(e) => Err(AppError::Io(e)),
        }
    }
}
