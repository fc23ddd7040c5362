use crate::client::connector::EntityServerClient;
use crate::core::config::{normalize_base_url, ClientConfig};
use crate::core::errors::EntityError;
use crate::core::kernel::{
    HmacSigner, HttpTransport, PacketCodec, ReqwestTransport, RequestExecutor, RestClientConfig,
};
use std::sync::Arc;

/// Builder for [`EntityServerClient`]
pub struct EntityServerBuilder {
    config: ClientConfig,
    user_agent: Option<String>,
}

impl EntityServerBuilder {
    pub fn new(mut config: ClientConfig) -> Self {
        config.base_url = normalize_base_url(config.base_url);
        Self {
            config,
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: String) -> Self {
        self.user_agent = Some(user_agent);
        self
    }

    /// Build a client backed by reqwest
    pub fn build(self) -> Result<EntityServerClient<ReqwestTransport>, EntityError> {
        self.config.validate()?;

        let mut rest_config = RestClientConfig::new(self.config.base_url.clone())
            .with_timeout_ms(self.config.timeout_ms);
        if let Some(user_agent) = &self.user_agent {
            rest_config = rest_config.with_user_agent(user_agent.clone());
        }

        let transport = ReqwestTransport::new(&rest_config)?;
        self.build_with_transport(transport)
    }

    /// Build a client on top of any transport
    pub fn build_with_transport<T: HttpTransport>(
        self,
        transport: T,
    ) -> Result<EntityServerClient<T>, EntityError> {
        self.config.validate()?;

        let signer = Arc::new(HmacSigner::new(
            self.config.api_key().to_string(),
            self.config.hmac_secret().to_string(),
        ));
        let codec = PacketCodec::new(self.config.hmac_secret(), self.config.magic_len);
        let executor = RequestExecutor::new(self.config.base_url.clone(), transport, signer, codec);

        Ok(EntityServerClient::new(executor))
    }
}

impl EntityServerClient<ReqwestTransport> {
    /// Create a client from explicit configuration
    pub fn from_config(config: ClientConfig) -> Result<Self, EntityError> {
        EntityServerBuilder::new(config).build()
    }

    /// Create a client from `ENTITY_SERVER_*` environment variables
    pub fn from_env() -> Result<Self, EntityError> {
        Self::from_config(ClientConfig::from_env()?)
    }

    /// Create a client from a `.env` file plus the environment
    #[cfg(feature = "env-file")]
    pub fn from_env_file(env_file_path: &str) -> Result<Self, EntityError> {
        Self::from_config(ClientConfig::from_env_file(env_file_path)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ClientConfig {
        ClientConfig::new("http://x/".to_string(), "k".to_string(), "s".to_string())
    }

    #[test]
    fn test_build_reqwest_client() {
        let client = EntityServerBuilder::new(config())
            .with_user_agent("tests/1.0".to_string())
            .build()
            .unwrap();
        assert_eq!(client.base_url(), "http://x");
        assert!(client.active_transaction().is_none());
    }

    #[test]
    fn test_from_config() {
        let client = EntityServerClient::from_config(config().with_magic_len(8)).unwrap();
        assert_eq!(client.base_url(), "http://x");
    }

    #[test]
    fn test_build_rejects_invalid_config() {
        let result = EntityServerBuilder::new(config().with_timeout_ms(0)).build();
        assert!(matches!(result, Err(EntityError::ConfigError(_))));
    }

    #[test]
    fn test_struct_literal_config_is_normalized() {
        let config = ClientConfig {
            base_url: "http://x/".to_string(),
            api_key: secrecy::Secret::new("k".to_string()),
            hmac_secret: secrecy::Secret::new("s".to_string()),
            timeout_ms: 1_000,
            magic_len: 4,
        };
        let client = EntityServerBuilder::new(config).build().unwrap();
        assert_eq!(client.base_url(), "http://x");
    }
}
