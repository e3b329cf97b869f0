//! Node-level tests: fail-fast construction, inbound dispatch routing,
//! and the bounded startup wait for an initial robot shape.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use reactive_nav2d::engine::{NavigationParams, ReactiveEngine};
use reactive_nav2d::error::{Result, TransformError};
use reactive_nav2d::footprint::FootprintPolygon;
use reactive_nav2d::interface::{RobotInterface, VelocitySink};
use reactive_nav2d::node::{InboundMsg, NavNode};
use reactive_nav2d::pose::{Point2D, Pose2D, Pose3D, Twist2D};
use reactive_nav2d::tf::FrameTransform;
use reactive_nav2d::NodeConfig;

static CFG_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Write a throwaway engine config file and return its path.
fn temp_engine_cfg() -> String {
    let path = std::env::temp_dir().join(format!(
        "reactive-nav2d-test-engine-{}-{}.toml",
        std::process::id(),
        CFG_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::write(&path, "max_linear_vel = 0.25\n").unwrap();
    path.to_string_lossy().into_owned()
}

fn node_config(engine_cfg: &str, shape_topic: &str, shape_wait_secs: f64) -> NodeConfig {
    let src = format!(
        "[engine]\ncfg_file = \"{}\"\n\
         [nav]\nshape_wait_secs = {}\n\
         [topics]\nrobot_shape = \"{}\"\n",
        engine_cfg, shape_wait_secs, shape_topic
    );
    toml::from_str(&src).unwrap()
}

#[derive(Debug, Clone, PartialEq)]
enum Seen {
    Configured,
    Navigate(Pose2D),
    Shape(usize),
}

struct SpyEngine(Arc<Mutex<Vec<Seen>>>);

impl ReactiveEngine for SpyEngine {
    fn configure(&mut self, cfg: &toml::Value) -> Result<()> {
        assert!(cfg.get("max_linear_vel").is_some());
        self.0.lock().push(Seen::Configured);
        Ok(())
    }

    fn initialize(&mut self, _shape: &FootprintPolygon, _io: &dyn RobotInterface) -> Result<()> {
        Ok(())
    }

    fn navigate(&mut self, params: &NavigationParams) {
        self.0.lock().push(Seen::Navigate(params.target));
    }

    fn navigation_step(&mut self, _io: &dyn RobotInterface) -> Result<()> {
        Ok(())
    }

    fn change_robot_shape(&mut self, shape: &FootprintPolygon) {
        self.0.lock().push(Seen::Shape(shape.vertices().len()));
    }
}

struct IdentityTf;

impl FrameTransform for IdentityTf {
    fn lookup(&self, target: &str, source: &str) -> std::result::Result<Pose3D, TransformError> {
        if target == source {
            Ok(Pose3D::default())
        } else {
            Err(TransformError::new(target, source, "unknown frame"))
        }
    }
}

struct NullSink;

impl VelocitySink for NullSink {
    fn publish(&self, _cmd: Twist2D) {}
}

fn make_node(config: NodeConfig, seen: Arc<Mutex<Vec<Seen>>>) -> NavNode<SpyEngine> {
    NavNode::new(
        config,
        SpyEngine(seen),
        Arc::new(IdentityTf),
        Box::new(NullSink),
        Vec::new(),
    )
    .unwrap()
}

#[test]
fn construction_configures_engine_from_mandatory_cfg_file() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let config = node_config(&temp_engine_cfg(), "", 3.0);
    make_node(config, Arc::clone(&seen));
    assert_eq!(seen.lock().as_slice(), &[Seen::Configured]);
}

#[test]
fn construction_fails_fast_without_engine_cfg() {
    let config = node_config("/no/such/engine.toml", "", 3.0);
    let result = NavNode::new(
        config,
        SpyEngine(Arc::new(Mutex::new(Vec::new()))),
        Arc::new(IdentityTf),
        Box::new(NullSink),
        Vec::new(),
    );
    assert!(result.is_err());
}

#[test]
fn dispatch_routes_messages_to_staging_components() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let config = node_config(&temp_engine_cfg(), "robot_shape", 3.0);
    let node = make_node(config, Arc::clone(&seen));

    node.dispatch(InboundMsg::Obstacles(vec![Point2D::new(1.0, 1.0)]));
    assert_eq!(node.obstacles().snapshot().len(), 1);

    node.dispatch(InboundMsg::Goal {
        frame_id: "map".to_string(),
        pose: Pose3D::new(2.0, 3.0, 0.0, 0.0, 0.0, 0.0),
    });

    node.dispatch(InboundMsg::Shape(vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(0.2, 0.0),
        Point2D::new(0.0, 0.2),
    ]));

    let seen = seen.lock();
    assert!(seen.contains(&Seen::Navigate(Pose2D::new(2.0, 3.0, 0.0))));
    assert!(seen.contains(&Seen::Shape(3)));
}

#[test]
fn degenerate_shape_message_keeps_previous_footprint() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let config = node_config(&temp_engine_cfg(), "robot_shape", 3.0);
    let node = make_node(config, Arc::clone(&seen));

    let before = node.nav().current_shape();
    node.dispatch(InboundMsg::Shape(vec![Point2D::new(0.0, 0.0)]));
    assert_eq!(node.nav().current_shape(), before);
    assert!(!seen.lock().contains(&Seen::Shape(1)));
}

#[test]
fn shape_grace_period_expires_without_blocking() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let config = node_config(&temp_engine_cfg(), "robot_shape", 0.2);
    let node = make_node(config, seen);

    let (_tx, rx) = crossbeam_channel::bounded::<InboundMsg>(4);
    let start = Instant::now();
    let got_shape = node.wait_for_initial_shape(&rx, Duration::from_millis(200));
    assert!(!got_shape);
    // Bounded: returns around the grace period, never hangs.
    assert!(start.elapsed() < Duration::from_secs(1));
    assert_eq!(node.nav().current_shape(), FootprintPolygon::default());
}

#[test]
fn shape_arriving_during_grace_period_is_installed() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let config = node_config(&temp_engine_cfg(), "robot_shape", 1.0);
    let node = make_node(config, Arc::clone(&seen));

    let (tx, rx) = crossbeam_channel::bounded::<InboundMsg>(4);
    // Another channel's message arriving first is dispatched, not lost.
    tx.send(InboundMsg::Obstacles(vec![Point2D::new(0.5, 0.5)]))
        .unwrap();
    tx.send(InboundMsg::Shape(vec![
        Point2D::new(0.0, 0.0),
        Point2D::new(0.4, 0.0),
        Point2D::new(0.4, 0.4),
        Point2D::new(0.0, 0.4),
    ]))
    .unwrap();

    let got_shape = node.wait_for_initial_shape(&rx, Duration::from_secs(1));
    assert!(got_shape);
    assert_eq!(node.obstacles().snapshot().len(), 1);
    assert_eq!(node.nav().current_shape().vertices().len(), 4);
    assert!(seen.lock().contains(&Seen::Shape(4)));
}
