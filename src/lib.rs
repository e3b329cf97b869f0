//! Control-loop bridge between a mobile robot's sensing/command
//! channels and an external reactive 2D navigation engine.
//!
//! The engine (behind [`engine::ReactiveEngine`]) is driven on a fixed
//! period and pulls pose, obstacles and footprint through
//! [`interface::RobotInterface`] while pushing velocity decisions to
//! the actuation sink — without ever seeing the transport layer.
//!
//! ## Concurrency
//!
//! Two independent lock domains:
//!
//! - **Obstacle domain** ([`obstacles::ObstacleBuffer`]): short-held,
//!   guards only the latest obstacle sample.
//! - **Engine domain** ([`nav_loop::NavigationLoop`]): serializes every
//!   engine entry point (initialize, step, navigate, shape change)
//!   against the periodic timer and all concurrent producers.

pub mod config;
pub mod engine;
pub mod error;
pub mod footprint;
pub mod interface;
pub mod nav_loop;
pub mod node;
pub mod obstacles;
pub mod pose;
pub mod tf;
pub mod transport;
pub mod utils;

pub use config::NodeConfig;
pub use engine::{NavigationParams, PursuitEngine, ReactiveEngine};
pub use error::{NavError, Result, TransformError};
pub use footprint::FootprintPolygon;
pub use interface::{NavEvent, NodeInterface, RobotInterface, VelocitySink};
pub use nav_loop::{LoopState, NavigationLoop};
pub use node::{InboundMsg, NavNode, NodeHandles};
pub use obstacles::ObstacleBuffer;
pub use pose::{Point2D, Pose2D, Pose3D, Twist2D};
pub use tf::{FrameTransform, PoseSource, TransformCache};
