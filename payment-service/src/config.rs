use crate::plans::PlanCatalog;
use anyhow::{bail, Context};
use std::{env, net::{IpAddr, SocketAddr}};

const DEFAULT_ALLOWED_ORIGINS: &[&str] = &[
    "http://localhost:3000",
    "http://localhost:3001",
    "http://localhost:5173",
];

#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub host: IpAddr,
    pub port: u16,
    /// Till / paybill name every confirmation message must name.
    pub recipient_label: String,
    pub plans: PlanCatalog,
    pub allowed_origins: Vec<String>,
}

impl ServiceConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let host: IpAddr = lookup("HOST")
            .unwrap_or_else(|| "0.0.0.0".to_string())
            .parse()
            .context("HOST must be an IP address")?;
        let port: u16 = lookup("PORT")
            .unwrap_or_else(|| "8086".to_string())
            .parse()
            .context("PORT must be a valid port number")?;

        let recipient_label = lookup("MPESA_RECIPIENT_LABEL")
            .context("MPESA_RECIPIENT_LABEL must be set")?
            .trim()
            .to_string();
        if recipient_label.is_empty() {
            bail!("MPESA_RECIPIENT_LABEL must not be blank");
        }

        let plans = match lookup("PLAN_CATALOG") {
            Some(raw) => PlanCatalog::from_json(&raw).context("PLAN_CATALOG is invalid")?,
            None => PlanCatalog::default(),
        };

        let allowed_origins = match lookup("ALLOWED_ORIGINS") {
            Some(raw) => raw
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
            None => DEFAULT_ALLOWED_ORIGINS.iter().map(|s| s.to_string()).collect(),
        };

        Ok(Self { host, port, recipient_label, plans, allowed_origins })
    }

    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
