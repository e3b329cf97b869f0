//! reactive-nav2d - control-loop bridge for reactive 2D navigation
//!
//! Connects a robot's sensing and command channels to a reactive
//! navigation engine: stages inbound goals, obstacles and shape
//! updates, drives the engine on a fixed period, and publishes its
//! velocity decisions.
//!
//! ## Threads
//!
//! - **nav-loop**: drives the engine step at the configured period
//!   (default 100 ms) under the engine-domain lock
//! - **dispatch**: routes inbound messages to the staging components
//! - **udp-sub**: decodes datagrams into inbound messages and feeds the
//!   transform cache

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;
use tracing::{error, info};

use reactive_nav2d::error::Result;
use reactive_nav2d::transport::{spawn_subscriber, UdpVelocitySink};
use reactive_nav2d::{NavNode, NodeConfig, PursuitEngine, TransformCache};

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("reactive_nav2d=info".parse().unwrap()),
        )
        .init();

    // Config path from argv, falling back to the conventional name.
    let args: Vec<String> = std::env::args().collect();
    let config_path = args
        .get(1)
        .map(String::as_str)
        .unwrap_or("reactive-nav2d.toml");

    info!("Loading configuration from {:?}", config_path);
    let config = NodeConfig::load(Path::new(config_path))?;

    info!("reactive-nav2d v{}", env!("CARGO_PKG_VERSION"));
    info!(
        "Reference frame '{}', robot frame '{}', step period {}s",
        config.frames.reference, config.frames.robot, config.nav.nav_period_secs
    );

    let tf_cache = Arc::new(TransformCache::new());
    let sink = UdpVelocitySink::new(
        config.transport.cmd_vel_address.clone(),
        config.topics.cmd_vel.clone(),
    )?;

    let node = NavNode::new(
        config.clone(),
        PursuitEngine::new(),
        Arc::clone(&tf_cache) as Arc<dyn reactive_nav2d::FrameTransform>,
        Box::new(sink),
        Vec::new(),
    )?;

    // Inbound bus: subscriber produces, the node's dispatch thread
    // consumes. Bounded so a stalled consumer applies backpressure
    // instead of growing memory.
    let (tx, rx) = crossbeam_channel::bounded(64);

    let sub_shutdown = Arc::new(AtomicBool::new(false));
    let sub_handle = spawn_subscriber(&config, tx, tf_cache, Arc::clone(&sub_shutdown))?;

    let handles = node.spawn(rx)?;

    // Block until SIGINT/SIGTERM.
    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    if let Some(sig) = signals.forever().next() {
        info!("Received signal {}, shutting down", sig);
    }

    handles.join();
    sub_shutdown.store(true, Ordering::Release);
    if sub_handle.join().is_err() {
        error!("subscriber thread panicked");
    }

    info!("reactive-nav2d finished");
    Ok(())
}
