use std::net::SocketAddr;

use anyhow::Context;

#[derive(Debug, Clone)]
pub struct GrpcConfig {
    pub host: String,
    pub port: u16,
}

impl GrpcConfig {
    /// Socket address the gRPC server binds to.
    pub fn address(&self) -> anyhow::Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("invalid grpc address {}:{}", self.host, self.port))
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub db_max_connections: u32,
    pub grpc: GrpcConfig,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the config from any key/value source; unset keys take defaults.
    pub fn from_lookup(var: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let database_url = var("DATABASE_URL").context("DATABASE_URL is not set")?;
        let db_max_connections = match var("DB_MAX_CONNECTIONS") {
            Some(v) => {
                let n = v
                    .parse::<u32>()
                    .with_context(|| format!("DB_MAX_CONNECTIONS is not a number: {v}"))?;
                if n == 0 {
                    anyhow::bail!("DB_MAX_CONNECTIONS must be greater than 0");
                }
                n
            }
            None => 10,
        };
        let grpc = GrpcConfig {
            host: var("GRPC_HOST").unwrap_or_else(|| "0.0.0.0".into()),
            port: match var("GRPC_PORT") {
                Some(v) => v
                    .parse::<u16>()
                    .with_context(|| format!("GRPC_PORT is not a valid port: {v}"))?,
                None => 50051,
            },
        };
        Ok(Self {
            database_url,
            db_max_connections,
            grpc,
        })
    }
}
