use std::net::SocketAddr;
use std::path::PathBuf;

use serde::Deserialize;
use tally_core::error::{Result, TallyError};
use tally_core::RATE_WINDOW_SECS;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TallyConfig {
    pub version: u32,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub state: StateSection,
}

impl TallyConfig {
    pub fn validate(&self) -> Result<()> {
        if self.version != 1 {
            return Err(TallyError::BadConfig(format!(
                "unsupported config version: {}",
                self.version
            )));
        }

        self.server.validate()?;
        self.state.validate()?;

        Ok(())
    }
}

impl Default for TallyConfig {
    fn default() -> Self {
        Self {
            version: 1,
            server: ServerSection::default(),
            state: StateSection::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    #[serde(default = "default_listen")]
    pub listen: String,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            listen: default_listen(),
        }
    }
}

impl ServerSection {
    pub fn validate(&self) -> Result<()> {
        self.listen_addr().map(|_| ())
    }

    pub fn listen_addr(&self) -> Result<SocketAddr> {
        self.listen
            .parse()
            .map_err(|e| TallyError::BadConfig(format!("server.listen must be a socket address: {e}")))
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StateSection {
    /// Snapshot file location.
    #[serde(default = "default_state_path")]
    pub path: PathBuf,

    /// Try to resume from the snapshot at startup.
    #[serde(default = "default_recover_on_start")]
    pub recover_on_start: bool,

    #[serde(default = "default_reset_interval_secs")]
    pub reset_interval_secs: u64,
}

impl Default for StateSection {
    fn default() -> Self {
        Self {
            path: default_state_path(),
            recover_on_start: default_recover_on_start(),
            reset_interval_secs: default_reset_interval_secs(),
        }
    }
}

impl StateSection {
    pub fn validate(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Err(TallyError::BadConfig("state.path must not be empty".into()));
        }
        if !(1..=3600).contains(&self.reset_interval_secs) {
            return Err(TallyError::BadConfig(
                "state.reset_interval_secs must be between 1 and 3600".into(),
            ));
        }
        Ok(())
    }
}

fn default_listen() -> String {
    "0.0.0.0:8080".into()
}
fn default_state_path() -> PathBuf {
    PathBuf::from("state.json")
}
fn default_recover_on_start() -> bool {
    true
}
fn default_reset_interval_secs() -> u64 {
    RATE_WINDOW_SECS
}
