//! The navigation control loop and its engine-domain lock.
//!
//! The engine is one shared mutable resource with several concurrent
//! producers around it: the periodic timer, goal events and shape
//! updates. Everything that touches the engine — initialize, step,
//! navigate, shape change — funnels through the single mutex owned
//! here, so at most one engine-domain operation runs at a time and a
//! goal or shape request can never interleave with a partially-computed
//! step. No raw engine handle ever escapes the lock.

use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use tracing::{error, info, warn};

use crate::engine::{NavigationParams, ReactiveEngine};
use crate::error::Result;
use crate::footprint::FootprintPolygon;
use crate::interface::NodeInterface;
use crate::pose::{Point2D, Pose2D, Pose3D};

/// Loop lifecycle. Transitions Uninitialized → Running exactly once, on
/// the first successful engine initialization; Running is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopState {
    Uninitialized,
    Running,
}

/// Everything guarded by the engine-domain lock.
struct EngineCore<E> {
    engine: E,
    shape: FootprintPolygon,
    state: LoopState,
}

/// Owns the engine, its lock, and the periodic step driver.
pub struct NavigationLoop<E: ReactiveEngine> {
    core: Mutex<EngineCore<E>>,
    io: NodeInterface,
    target_allowed_distance: f64,
    period: Duration,
}

impl<E: ReactiveEngine> NavigationLoop<E> {
    pub fn new(
        engine: E,
        io: NodeInterface,
        initial_shape: FootprintPolygon,
        target_allowed_distance: f64,
        period: Duration,
    ) -> Self {
        Self {
            core: Mutex::new(EngineCore {
                engine,
                shape: initial_shape,
                state: LoopState::Uninitialized,
            }),
            io,
            target_allowed_distance,
            period,
        }
    }

    /// One timer tick: first-use engine initialization, then one
    /// navigation step, all inside the engine-domain lock.
    ///
    /// Per-step failures are contained here: a failed step is "no
    /// command this cycle", logged and forgotten. The next tick starts
    /// clean — no backoff, no cross-step failure memory.
    pub fn tick(&self) {
        let mut core = self.core.lock();

        if core.state == LoopState::Uninitialized {
            info!("initializing navigation engine");
            let EngineCore { engine, shape, .. } = &mut *core;
            match engine.initialize(shape, &self.io) {
                Ok(()) => {
                    core.state = LoopState::Running;
                    info!("navigation engine initialized");
                }
                Err(e) => {
                    // Stay Uninitialized; the next tick retries.
                    error!("engine initialization failed: {}", e);
                    return;
                }
            }
        }

        if let Err(e) = core.engine.navigation_step(&self.io) {
            warn!("navigation step skipped: {}", e);
        }
    }

    /// Issue a navigation goal in the reference frame. Callable from any
    /// thread; serialized against ticks by the engine-domain lock.
    ///
    /// A goal arriving before the first tick is handed to the engine
    /// regardless; queueing or rejecting it then is the engine's own
    /// contract, not special-cased here.
    pub fn navigate_to(&self, target: Pose2D) {
        info!(x = target.x, y = target.y, "starting navigation to target");
        let params = NavigationParams {
            target,
            target_allowed_distance: self.target_allowed_distance,
            target_is_relative: false,
        };
        self.core.lock().engine.navigate(&params);
    }

    /// Goal ingestion: reconcile a goal from an arbitrary frame into the
    /// reference frame, then navigate.
    ///
    /// A goal whose transform fails is dropped with an error log —
    /// navigating toward a possibly-wrong-frame target is worse than not
    /// navigating at all.
    pub fn on_goal(&self, frame_id: &str, pose: Pose3D) {
        let planar = Pose2D::from(pose);
        let source = self.io.pose_source();
        info!(
            x = planar.x,
            y = planar.y,
            frame = frame_id,
            "navigation target received"
        );

        let target = if frame_id == source.frame_reference() {
            planar
        } else {
            match source.to_reference_frame(frame_id, planar) {
                Ok(p) => p,
                Err(e) => {
                    error!("dropping goal, frame reconciliation failed: {}", e);
                    return;
                }
            }
        };

        self.navigate_to(target);
    }

    /// Swap the robot footprint. A degenerate polygon is rejected and the
    /// previous shape kept; a valid one is installed and pushed to the
    /// engine under the engine-domain lock, since changing the footprint
    /// mid-step would invalidate in-flight clearance work.
    pub fn set_robot_shape(&self, vertices: Vec<Point2D>) -> Result<()> {
        let shape = FootprintPolygon::from_vertices(vertices)?;
        info!(
            vertices = shape.vertices().len(),
            "robot shape update received"
        );
        let mut core = self.core.lock();
        core.engine.change_robot_shape(&shape);
        core.shape = shape;
        Ok(())
    }

    /// Read the currently configured footprint.
    pub fn current_shape(&self) -> FootprintPolygon {
        self.core.lock().shape.clone()
    }

    /// Current loop lifecycle state.
    pub fn state(&self) -> LoopState {
        self.core.lock().state
    }

    /// The step period this loop was configured with.
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Access to the host interface (listener registration happens
    /// before construction; this is for goal reconciliation and tests).
    pub fn interface(&self) -> &NodeInterface {
        &self.io
    }

    /// Drive `tick` at the fixed period until `shutdown` is set.
    ///
    /// Instant-based pacing: a slow step eats into the following sleep
    /// instead of shifting the schedule.
    pub fn run(&self, shutdown: &AtomicBool) {
        info!(period_ms = self.period.as_millis() as u64, "navigation loop started");
        while !shutdown.load(Ordering::Acquire) {
            let cycle_start = Instant::now();

            self.tick();

            let elapsed = cycle_start.elapsed();
            if elapsed < self.period {
                std::thread::sleep(self.period - elapsed);
            }
        }
        info!("navigation loop stopped");
    }
}
