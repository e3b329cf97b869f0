//! Configuration loading for the navigation bridge

use crate::error::{NavError, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Clone, Debug, Deserialize)]
pub struct NodeConfig {
    pub engine: EngineConfig,
    #[serde(default)]
    pub nav: NavConfig,
    #[serde(default)]
    pub frames: FrameConfig,
    #[serde(default)]
    pub topics: TopicConfig,
    #[serde(default)]
    pub transport: TransportConfig,
}

/// External engine settings
#[derive(Clone, Debug, Deserialize)]
pub struct EngineConfig {
    /// Path to the engine configuration file (TOML). Mandatory: the node
    /// refuses to construct without it.
    pub cfg_file: String,

    /// Enable the engine's own navigation log output (default: false)
    #[serde(default)]
    pub save_nav_log: bool,
}

/// Control-loop settings
#[derive(Clone, Debug, Deserialize)]
pub struct NavConfig {
    /// Allowed arrival distance for goals in meters (default: 0.40)
    #[serde(default = "default_target_allowed_distance")]
    pub target_allowed_distance: f64,

    /// Navigation step period in seconds (default: 0.100)
    #[serde(default = "default_nav_period")]
    pub nav_period_secs: f64,

    /// How long to wait for an initial robot shape at startup when a
    /// shape topic is configured, in seconds (default: 3.0)
    #[serde(default = "default_shape_wait")]
    pub shape_wait_secs: f64,
}

/// Coordinate frame names
#[derive(Clone, Debug, Deserialize)]
pub struct FrameConfig {
    /// Fixed world/map frame goals and obstacles are reconciled into
    #[serde(default = "default_frame_reference")]
    pub reference: String,

    /// Frame attached to the moving robot body
    #[serde(default = "default_frame_robot")]
    pub robot: String,
}

/// Channel names for inbound and outbound messages
#[derive(Clone, Debug, Deserialize)]
pub struct TopicConfig {
    /// Goal pose channel
    #[serde(default = "default_topic_goal")]
    pub goal: String,

    /// Local obstacle point-set channel
    #[serde(default = "default_topic_obstacles")]
    pub obstacles: String,

    /// Optional robot-shape channel; empty string disables runtime
    /// shape updates
    #[serde(default)]
    pub robot_shape: String,

    /// Outbound velocity-command channel
    #[serde(default = "default_topic_cmd_vel")]
    pub cmd_vel: String,

    /// Frame-transform channel feeding the transform cache
    #[serde(default = "default_topic_tf")]
    pub tf: String,
}

/// UDP transport endpoints
#[derive(Clone, Debug, Deserialize)]
pub struct TransportConfig {
    /// Bind address for inbound messages (default: 0.0.0.0:7600)
    #[serde(default = "default_listen_address")]
    pub listen_address: String,

    /// Destination address for velocity commands (default: 127.0.0.1:7601)
    #[serde(default = "default_cmd_vel_address")]
    pub cmd_vel_address: String,
}

// Default value functions
fn default_target_allowed_distance() -> f64 {
    0.40
}
fn default_nav_period() -> f64 {
    0.100
}
fn default_shape_wait() -> f64 {
    3.0
}
fn default_frame_reference() -> String {
    "map".to_string()
}
fn default_frame_robot() -> String {
    "base_link".to_string()
}
fn default_topic_goal() -> String {
    "reactive_nav_goal".to_string()
}
fn default_topic_obstacles() -> String {
    "local_map_pointcloud".to_string()
}
fn default_topic_cmd_vel() -> String {
    "cmd_vel".to_string()
}
fn default_topic_tf() -> String {
    "tf".to_string()
}
fn default_listen_address() -> String {
    "0.0.0.0:7600".to_string()
}
fn default_cmd_vel_address() -> String {
    "127.0.0.1:7601".to_string()
}

impl Default for NavConfig {
    fn default() -> Self {
        Self {
            target_allowed_distance: default_target_allowed_distance(),
            nav_period_secs: default_nav_period(),
            shape_wait_secs: default_shape_wait(),
        }
    }
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            reference: default_frame_reference(),
            robot: default_frame_robot(),
        }
    }
}

impl Default for TopicConfig {
    fn default() -> Self {
        Self {
            goal: default_topic_goal(),
            obstacles: default_topic_obstacles(),
            robot_shape: String::new(),
            cmd_vel: default_topic_cmd_vel(),
            tf: default_topic_tf(),
        }
    }
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            listen_address: default_listen_address(),
            cmd_vel_address: default_cmd_vel_address(),
        }
    }
}

impl NodeConfig {
    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| NavError::Config(format!("Failed to read config file: {}", e)))?;
        let config: NodeConfig = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Check startup invariants. A missing or unreadable engine config is
    /// fatal: the node must not come up without one.
    pub fn validate(&self) -> Result<()> {
        if self.engine.cfg_file.is_empty() {
            return Err(NavError::Config(
                "Mandatory option 'engine.cfg_file' is missing".to_string(),
            ));
        }
        if !Path::new(&self.engine.cfg_file).exists() {
            return Err(NavError::Config(format!(
                "Engine config file not found: '{}'",
                self.engine.cfg_file
            )));
        }
        if self.nav.nav_period_secs <= 0.0 {
            return Err(NavError::Config(format!(
                "nav_period_secs must be positive, got {}",
                self.nav.nav_period_secs
            )));
        }
        Ok(())
    }

    /// Whether runtime shape updates are enabled.
    pub fn shape_topic_enabled(&self) -> bool {
        !self.topics.robot_shape.is_empty()
    }
}
