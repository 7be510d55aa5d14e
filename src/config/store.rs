//! Record store configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Record store configuration (redis)
#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    /// Redis connection URL
    pub redis_url: String,
}

impl StoreConfig {
    /// Validate store configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.redis_url.is_empty() {
            return Err(ValidationError::MissingRequired("REDIS_URL"));
        }
        if !self.redis_url.starts_with("redis://") && !self.redis_url.starts_with("rediss://") {
            return Err(ValidationError::InvalidRedisUrl);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_redis_urls() {
        let config = StoreConfig {
            redis_url: "redis://localhost:6379".to_string(),
        };
        assert!(config.validate().is_ok());

        let tls = StoreConfig {
            redis_url: "rediss://cache.internal:6380".to_string(),
        };
        assert!(tls.validate().is_ok());
    }

    #[test]
    fn rejects_other_schemes() {
        let config = StoreConfig {
            redis_url: "postgres://localhost".to_string(),
        };
        assert!(config.validate().is_err());
    }
}
