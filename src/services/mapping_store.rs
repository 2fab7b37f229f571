use async_trait::async_trait;
use chrono::Utc;
use indexmap::IndexMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::errors::{CoreError, CoreResult};
use crate::mapping::{Mapping, MappingFilter, MappingPatch, NewMapping};

/// Persistence for mappings. Updates replace whole fields; there is no
/// merging, so the last save wins.
#[async_trait]
pub trait MappingStore: Send + Sync {
    async fn list(&self, filter: &MappingFilter) -> CoreResult<Vec<Mapping>>;

    async fn get_by_id(&self, id: &str) -> CoreResult<Mapping>;

    async fn create(&self, new_mapping: NewMapping) -> CoreResult<Mapping>;

    async fn update(&self, id: &str, patch: MappingPatch) -> CoreResult<Mapping>;

    /// Deletes a mapping owned by `user_id`.
    async fn delete(&self, id: &str, user_id: &str) -> CoreResult<()>;
}

fn materialize(new_mapping: NewMapping) -> Mapping {
    let now = Utc::now();
    Mapping {
        id: Uuid::new_v4().to_string(),
        project_id: new_mapping.project_id,
        user_id: new_mapping.user_id,
        name: new_mapping.name,
        description: new_mapping.description,
        mapping_type: new_mapping.mapping_type,
        config: new_mapping.config,
        data: new_mapping.data,
        created_at: now,
        updated_at: now,
    }
}

fn ensure_owner(mapping: &Mapping, user_id: &str) -> CoreResult<()> {
    if mapping.user_id != user_id {
        return Err(CoreError::forbidden(format!(
            "Mapping {} belongs to another user",
            mapping.id
        )));
    }
    Ok(())
}

fn sort_for_listing(mappings: &mut [Mapping]) {
    mappings.sort_by(|a, b| b.updated_at.cmp(&a.updated_at).then(a.id.cmp(&b.id)));
}

#[derive(Default)]
pub struct InMemoryMappingStore {
    mappings: RwLock<IndexMap<String, Mapping>>,
}

impl InMemoryMappingStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MappingStore for InMemoryMappingStore {
    async fn list(&self, filter: &MappingFilter) -> CoreResult<Vec<Mapping>> {
        let mut mappings: Vec<Mapping> = self
            .mappings
            .read()
            .await
            .values()
            .filter(|m| filter.matches(m))
            .cloned()
            .collect();
        sort_for_listing(&mut mappings);
        Ok(mappings)
    }

    async fn get_by_id(&self, id: &str) -> CoreResult<Mapping> {
        self.mappings
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Mapping", id))
    }

    async fn create(&self, new_mapping: NewMapping) -> CoreResult<Mapping> {
        let mapping = materialize(new_mapping);
        self.mappings
            .write()
            .await
            .insert(mapping.id.clone(), mapping.clone());
        Ok(mapping)
    }

    async fn update(&self, id: &str, patch: MappingPatch) -> CoreResult<Mapping> {
        let mut mappings = self.mappings.write().await;
        let mapping = mappings
            .get_mut(id)
            .ok_or_else(|| CoreError::not_found("Mapping", id))?;
        patch.apply_to(mapping);
        Ok(mapping.clone())
    }

    async fn delete(&self, id: &str, user_id: &str) -> CoreResult<()> {
        let mut mappings = self.mappings.write().await;
        let mapping = mappings
            .get(id)
            .ok_or_else(|| CoreError::not_found("Mapping", id))?;
        ensure_owner(mapping, user_id)?;
        mappings.shift_remove(id);
        Ok(())
    }
}

/// One pretty-printed `<id>.json` file per mapping.
pub struct JsonFileMappingStore {
    root: PathBuf,
    lock: RwLock<()>,
}

impl JsonFileMappingStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lock: RwLock::new(()),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, id: &str) -> CoreResult<PathBuf> {
        if id.is_empty() || id.contains(['/', '\\']) || id.contains("..") {
            return Err(CoreError::not_found("Mapping", id));
        }
        Ok(self.root.join(format!("{}.json", id)))
    }

    async fn read(&self, id: &str) -> CoreResult<Mapping> {
        let path = self.path_for(id)?;
        let content = match tokio::fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                return Err(CoreError::not_found("Mapping", id));
            }
            Err(err) => {
                return Err(
                    CoreError::unavailable(format!("Failed to read mapping {}", id))
                        .with_source(err),
                )
            }
        };
        serde_json::from_str(&content).map_err(|err| {
            CoreError::internal(format!("Mapping file {} is corrupt", path.display()))
                .with_source(err)
        })
    }

    async fn write(&self, mapping: &Mapping) -> CoreResult<()> {
        let path = self.path_for(&mapping.id)?;
        let content = serde_json::to_string_pretty(mapping).map_err(|err| {
            CoreError::internal("Failed to serialize mapping").with_source(err)
        })?;
        tokio::fs::create_dir_all(&self.root).await.map_err(|err| {
            CoreError::unavailable("Failed to create mapping directory").with_source(err)
        })?;
        tokio::fs::write(&path, content).await.map_err(|err| {
            CoreError::unavailable(format!("Failed to write mapping {}", mapping.id))
                .with_source(err)
        })?;
        debug!("Wrote mapping {} to {}", mapping.id, path.display());
        Ok(())
    }
}

#[async_trait]
impl MappingStore for JsonFileMappingStore {
    async fn list(&self, filter: &MappingFilter) -> CoreResult<Vec<Mapping>> {
        let _guard = self.lock.read().await;
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => {
                return Err(CoreError::unavailable("Failed to list mappings").with_source(err))
            }
        };

        let mut mappings = Vec::new();
        loop {
            let entry = entries.next_entry().await.map_err(|err| {
                CoreError::unavailable("Failed to list mappings").with_source(err)
            })?;
            let Some(entry) = entry else { break };
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            let Some(id) = path.file_stem().and_then(|s| s.to_str()) else {
                continue;
            };
            match self.read(id).await {
                Ok(mapping) if filter.matches(&mapping) => mappings.push(mapping),
                Ok(_) => {}
                Err(err) => warn!("Skipping unreadable mapping {}: {}", path.display(), err),
            }
        }
        sort_for_listing(&mut mappings);
        Ok(mappings)
    }

    async fn get_by_id(&self, id: &str) -> CoreResult<Mapping> {
        let _guard = self.lock.read().await;
        self.read(id).await
    }

    async fn create(&self, new_mapping: NewMapping) -> CoreResult<Mapping> {
        let _guard = self.lock.write().await;
        let mapping = materialize(new_mapping);
        self.write(&mapping).await?;
        Ok(mapping)
    }

    async fn update(&self, id: &str, patch: MappingPatch) -> CoreResult<Mapping> {
        let _guard = self.lock.write().await;
        let mut mapping = self.read(id).await?;
        patch.apply_to(&mut mapping);
        self.write(&mapping).await?;
        Ok(mapping)
    }

    async fn delete(&self, id: &str, user_id: &str) -> CoreResult<()> {
        let _guard = self.lock.write().await;
        let mapping = self.read(id).await?;
        ensure_owner(&mapping, user_id)?;
        tokio::fs::remove_file(self.path_for(id)?)
            .await
            .map_err(|err| {
                CoreError::unavailable(format!("Failed to delete mapping {}", id)).with_source(err)
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::CoreErrorKind;
    use crate::mapping::{initial_data, HemicicloLayout, MappingConfig, MappingType};

    fn new_mapping(project: &str, user: &str, name: &str) -> NewMapping {
        let layout = HemicicloLayout::from_rows(vec![2, 3]).unwrap();
        NewMapping {
            project_id: project.into(),
            user_id: user.into(),
            name: name.into(),
            description: None,
            mapping_type: MappingType::Hemicycle,
            data: initial_data(&layout),
            config: MappingConfig {
                layout,
                data_source: None,
            },
        }
    }

    async fn exercise(store: &dyn MappingStore) {
        let a = store.create(new_mapping("p1", "u1", "A")).await.unwrap();
        let b = store.create(new_mapping("p2", "u1", "B")).await.unwrap();

        let listed = store.list(&MappingFilter::for_project("p1")).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, a.id);

        let updated = store
            .update(
                &b.id,
                MappingPatch {
                    name: Some("B2".into()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.name, "B2");
        assert_eq!(store.get_by_id(&b.id).await.unwrap().name, "B2");

        let err = store.delete(&a.id, "intruder").await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::Forbidden);

        store.delete(&a.id, "u1").await.unwrap();
        let err = store.get_by_id(&a.id).await.unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);

        let err = store
            .update("missing", MappingPatch::default())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), CoreErrorKind::NotFound);
    }

    #[tokio::test]
    async fn in_memory_store_behaves() {
        exercise(&InMemoryMappingStore::new()).await;
    }

    #[tokio::test]
    async fn json_file_store_behaves() {
        let dir = tempfile::tempdir().unwrap();
        exercise(&JsonFileMappingStore::new(dir.path().join("mappings"))).await;
    }

    #[tokio::test]
    async fn json_file_store_round_trips_snapshot() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileMappingStore::new(dir.path());
        let created = store.create(new_mapping("p1", "u1", "A")).await.unwrap();

        let reopened = JsonFileMappingStore::new(dir.path());
        let loaded = reopened.get_by_id(&created.id).await.unwrap();
        assert_eq!(loaded, created);
    }

    #[tokio::test]
    async fn json_file_store_lists_nothing_for_missing_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileMappingStore::new(dir.path().join("absent"));
        assert!(store.list(&MappingFilter::default()).await.unwrap().is_empty());
    }
}
