use chrono::Utc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::error::DispatchError;
use crate::models::{ConfigValue, CreateConfigRequest, SystemConfig, UpdateConfigRequest};
use crate::store::SharedStore;

/// Runtime key/value settings
#[derive(Clone)]
pub struct ConfigService {
    store: SharedStore,
}

impl ConfigService {
    /// Create new config service instance
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, request: CreateConfigRequest) -> Result<SystemConfig, DispatchError> {
        request.value.validate()?;
        let now = Utc::now();
        let entry = SystemConfig {
            id: Uuid::new_v4(),
            key: request.key.trim().to_string(),
            value: request.value,
            remark: request.remark,
            created_at: now,
            updated_at: now,
        };
        if entry.key.is_empty() {
            return Err(DispatchError::Validation("config key is required".into()));
        }

        let key = entry.key.clone();
        let created = self
            .store
            .insert_config(entry)
            .await?
            .ok_or_else(|| DispatchError::Conflict(format!("config key '{key}' already exists")))?;

        info!(key = %created.key, value_type = ?created.value.value_type(), "config created");
        Ok(created)
    }

    pub async fn get(&self, key: &str) -> Result<SystemConfig, DispatchError> {
        self.store
            .get_config(key)
            .await?
            .ok_or_else(|| DispatchError::not_found("config", key))
    }

    pub async fn list(&self) -> Result<Vec<SystemConfig>, DispatchError> {
        Ok(self.store.list_configs().await?)
    }

    /// Replace the value (and optionally the remark) of an existing key
    pub async fn update(
        &self,
        key: &str,
        request: UpdateConfigRequest,
    ) -> Result<SystemConfig, DispatchError> {
        request.value.validate()?;
        let current = self.get(key).await?;

        let entry = SystemConfig {
            value: request.value,
            remark: request.remark.unwrap_or(current.remark),
            updated_at: Utc::now(),
            ..current
        };
        let updated = self
            .store
            .update_config(entry)
            .await?
            .ok_or_else(|| DispatchError::not_found("config", key))?;

        info!(%key, "config updated");
        Ok(updated)
    }

    pub async fn delete(&self, key: &str) -> Result<(), DispatchError> {
        if !self.store.delete_config(key).await? {
            return Err(DispatchError::not_found("config", key));
        }
        info!(%key, "config deleted");
        Ok(())
    }

    pub async fn get_value(&self, key: &str) -> Result<ConfigValue, DispatchError> {
        Ok(self.get(key).await?.value)
    }

    /// Set the value from raw text, keeping the key's type and remark.
    pub async fn update_value(&self, key: &str, raw: &str) -> Result<ConfigValue, DispatchError> {
        let current = self.get(key).await?;
        let value = ConfigValue::decode(current.value.value_type(), raw)?;
        value.validate()?;

        let entry = SystemConfig {
            value,
            updated_at: Utc::now(),
            ..current
        };
        let updated = self
            .store
            .update_config(entry)
            .await?
            .ok_or_else(|| DispatchError::not_found("config", key))?;

        info!(%key, "config value updated");
        Ok(updated.value)
    }

    /// Numeric setting, or `default` when the key is unset or not a number.
    pub async fn number_or(&self, key: &str, default: f64) -> Result<f64, DispatchError> {
        let Some(entry) = self.store.get_config(key).await? else {
            return Ok(default);
        };
        match entry.value.as_f64() {
            Some(value) => Ok(value),
            None => {
                warn!(%key, value_type = ?entry.value.value_type(), "config is not a number; using default");
                Ok(default)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::store::MemoryStore;

    fn request(key: &str, value: ConfigValue) -> CreateConfigRequest {
        CreateConfigRequest {
            key: key.into(),
            value,
            remark: String::new(),
        }
    }

    #[tokio::test]
    async fn duplicate_keys_conflict() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()));
        service
            .create(request("dispatch.search_radius_meters", ConfigValue::Number(800.0)))
            .await
            .unwrap();

        assert!(matches!(
            service
                .create(request("dispatch.search_radius_meters", ConfigValue::Number(1.0)))
                .await,
            Err(DispatchError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn number_or_falls_back() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()));
        assert_eq!(service.number_or("missing", 5_000.0).await.unwrap(), 5_000.0);

        service
            .create(request("motd", ConfigValue::String("stay safe".into())))
            .await
            .unwrap();
        assert_eq!(service.number_or("motd", 7.0).await.unwrap(), 7.0);

        service
            .create(request("radius", ConfigValue::Number(1_200.0)))
            .await
            .unwrap();
        assert_eq!(service.number_or("radius", 7.0).await.unwrap(), 1_200.0);
    }

    #[tokio::test]
    async fn raw_value_is_read_as_the_existing_type() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()));
        let mut create = request("dispatch.search_radius_meters", ConfigValue::Number(800.0));
        create.remark = "metres".into();
        service.create(create).await.unwrap();

        let value = service
            .update_value("dispatch.search_radius_meters", "1500")
            .await
            .unwrap();
        assert_eq!(value, ConfigValue::Number(1_500.0));
        assert_eq!(
            service.get_value("dispatch.search_radius_meters").await.unwrap(),
            ConfigValue::Number(1_500.0)
        );
        assert_eq!(
            service.get("dispatch.search_radius_meters").await.unwrap().remark,
            "metres"
        );

        assert!(matches!(
            service
                .update_value("dispatch.search_radius_meters", "far")
                .await,
            Err(DispatchError::Validation(_))
        ));
        assert!(matches!(
            service.update_value("missing", "1").await,
            Err(DispatchError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn update_keeps_remark_unless_given() {
        let service = ConfigService::new(Arc::new(MemoryStore::new()));
        let mut create = request("feature.ratings", ConfigValue::Boolean(true));
        create.remark = "ratings on".into();
        service.create(create).await.unwrap();

        let updated = service
            .update(
                "feature.ratings",
                UpdateConfigRequest {
                    value: ConfigValue::Boolean(false),
                    remark: None,
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.value, ConfigValue::Boolean(false));
        assert_eq!(updated.remark, "ratings on");

        service.delete("feature.ratings").await.unwrap();
        assert!(matches!(
            service.get("feature.ratings").await,
            Err(DispatchError::NotFound { .. })
        ));
    }
}
