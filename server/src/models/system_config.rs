use serde::{Deserialize, Serialize};
use sqlx::types::chrono::{DateTime, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::error::DispatchError;

/// Storage tag for a config value
#[derive(Debug, Serialize, Deserialize, sqlx::Type, Clone, Copy, PartialEq, Eq)]
#[sqlx(type_name = "config_value_type", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ConfigValueType {
    String,
    Number,
    Boolean,
    Json,
}

/// Typed runtime setting, validated at the boundary.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(tag = "type", content = "value", rename_all = "lowercase")]
pub enum ConfigValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Json(serde_json::Value),
}

impl ConfigValue {
    pub fn value_type(&self) -> ConfigValueType {
        match self {
            Self::String(_) => ConfigValueType::String,
            Self::Number(_) => ConfigValueType::Number,
            Self::Boolean(_) => ConfigValueType::Boolean,
            Self::Json(_) => ConfigValueType::Json,
        }
    }

    /// Text form persisted alongside the type tag.
    pub fn encode(&self) -> String {
        match self {
            Self::String(s) => s.clone(),
            Self::Number(n) => n.to_string(),
            Self::Boolean(b) => b.to_string(),
            Self::Json(v) => v.to_string(),
        }
    }

    pub fn decode(value_type: ConfigValueType, raw: &str) -> Result<Self, DispatchError> {
        let invalid = |detail: String| DispatchError::Validation(format!("invalid {value_type:?} value: {detail}"));
        match value_type {
            ConfigValueType::String => Ok(Self::String(raw.to_string())),
            ConfigValueType::Number => raw
                .trim()
                .parse::<f64>()
                .map_err(|e| invalid(e.to_string()))
                .and_then(|n| {
                    if n.is_finite() {
                        Ok(Self::Number(n))
                    } else {
                        Err(invalid("not finite".to_string()))
                    }
                }),
            ConfigValueType::Boolean => raw
                .trim()
                .parse::<bool>()
                .map(Self::Boolean)
                .map_err(|e| invalid(e.to_string())),
            ConfigValueType::Json => serde_json::from_str(raw)
                .map(Self::Json)
                .map_err(|e| invalid(e.to_string())),
        }
    }

    pub fn validate(&self) -> Result<(), DispatchError> {
        if let Self::Number(n) = self {
            if !n.is_finite() {
                return Err(DispatchError::Validation("number must be finite".to_string()));
            }
        }
        Ok(())
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            _ => None,
        }
    }
}

/// Key/value setting
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SystemConfig {
    pub id: Uuid,
    pub key: String,
    pub value: ConfigValue,
    pub remark: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Request DTO for creating a setting
#[derive(Debug, Deserialize, Validate)]
pub struct CreateConfigRequest {
    #[validate(length(min = 1, max = 50))]
    pub key: String,
    pub value: ConfigValue,
    #[serde(default)]
    #[validate(length(max = 200))]
    pub remark: String,
}

/// Request DTO for replacing a setting's value
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateConfigRequest {
    pub value: ConfigValue,
    #[validate(length(max = 200))]
    pub remark: Option<String>,
}

/// Request DTO for `PUT /configs/:key/value`: raw text, read as the key's
/// existing type.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateConfigValueRequest {
    #[validate(length(max = 4000))]
    pub value: String,
}
