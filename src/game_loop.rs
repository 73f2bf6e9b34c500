/// Fixed-timestep game loop on its own thread.
///
/// ## Lifecycle
///
///   Stopped → `start()` → Running → `stop()` → Stopped
///
/// `start()` spawns the simulation thread. `stop()` clears the running flag
/// and joins; the in-flight iteration always completes. The loop can also
/// end itself (quit action, severe diagnostic); `join()` waits for that.
///
/// ## One iteration
///
///   1. Measure elapsed wall time, feed it to the `FixedStep` accumulator
///   2. Poll input; handle quit / debug toggle
///   3. Run one simulation tick per whole step accumulated
///   4. Render + present once, only if at least one tick ran
///   5. Sleep briefly
///   6. Every report interval, log "<ticks> ticks, <frames> frames"

use std::io;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::config::TimingConfig;
use crate::sim::diagnostics::Diagnostics;
use crate::sim::event::GameEvent;
use crate::sim::world::World;
use crate::ui::input::{Action, InputSource};
use crate::ui::renderer::{FrameBuffer, Renderer};

/// Fractional tick accumulator.
#[derive(Clone, Debug)]
pub struct FixedStep {
    step: Duration,
    accumulated: Duration,
}

impl FixedStep {
    pub fn new(step: Duration) -> Self {
        FixedStep {
            step: step.max(Duration::from_nanos(1)),
            accumulated: Duration::ZERO,
        }
    }

    /// Add elapsed time; returns how many whole steps are now due.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.accumulated += elapsed;
        let due = (self.accumulated.as_nanos() / self.step.as_nanos()) as u32;
        self.accumulated -= self.step * due;
        due
    }

    /// Leftover time in step units, always in `[0, 1)`.
    #[cfg(test)]
    pub fn residual(&self) -> f64 {
        self.accumulated.as_secs_f64() / self.step.as_secs_f64()
    }
}

/// Where finished frames go.
pub trait Presenter {
    fn present(&mut self, frame: &FrameBuffer) -> io::Result<()>;

    /// Map a pointer cell reported by the input source to frame pixels.
    fn frame_point(&self, _col: u16, _row: u16) -> Option<(i32, i32)> {
        None
    }
}

/// Everything the loop thread owns.
pub struct Simulation<I, P> {
    pub world: World,
    pub renderer: Renderer,
    pub input: I,
    pub presenter: P,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum LoopState {
    Stopped,
    Running,
}

/// Lifetime totals, readable from the controlling thread.
#[derive(Debug, Default)]
pub struct LoopStats {
    ticks: AtomicU64,
    frames: AtomicU64,
}

impl LoopStats {
    pub fn ticks(&self) -> u64 {
        self.ticks.load(Ordering::Relaxed)
    }

    pub fn frames(&self) -> u64 {
        self.frames.load(Ordering::Relaxed)
    }
}

pub struct GameLoop {
    timing: TimingConfig,
    running: Arc<AtomicBool>,
    stats: Arc<LoopStats>,
    handle: Option<JoinHandle<()>>,
}

impl GameLoop {
    pub fn new(timing: TimingConfig) -> Self {
        GameLoop {
            timing,
            running: Arc::new(AtomicBool::new(false)),
            stats: Arc::new(LoopStats::default()),
            handle: None,
        }
    }

    /// Spawn the simulation thread. `build` runs on that thread, so device
    /// handles that cannot cross threads are created where they are used.
    pub fn start<I, P, F>(&mut self, build: F) -> io::Result<()>
    where
        I: InputSource + 'static,
        P: Presenter + 'static,
        F: FnOnce() -> Simulation<I, P> + Send + 'static,
    {
        if self.state() == LoopState::Running {
            log::warn!("game loop already running");
            return Ok(());
        }
        // reap a thread that ended on its own
        self.join();

        self.running.store(true, Ordering::SeqCst);
        let running = self.running.clone();
        let stats = self.stats.clone();
        let timing = self.timing.clone();
        let spawned = thread::Builder::new()
            .name("simulation".into())
            .spawn(move || run(build(), running, stats, timing));
        match spawned {
            Ok(handle) => {
                self.handle = Some(handle);
                Ok(())
            }
            Err(e) => {
                self.running.store(false, Ordering::SeqCst);
                Err(e)
            }
        }
    }

    /// Signal the loop to exit and wait for the thread.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        self.join();
    }

    /// Wait for the loop to end on its own.
    pub fn join(&mut self) {
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                log::error!("simulation thread panicked");
            }
            self.running.store(false, Ordering::SeqCst);
        }
    }

    pub fn state(&self) -> LoopState {
        let alive = self.handle.as_ref().is_some_and(|h| !h.is_finished());
        if alive && self.running.load(Ordering::SeqCst) {
            LoopState::Running
        } else {
            LoopState::Stopped
        }
    }

    pub fn stats(&self) -> &LoopStats {
        &self.stats
    }
}

impl Drop for GameLoop {
    fn drop(&mut self) {
        self.stop();
    }
}

fn run<I: InputSource, P: Presenter>(
    mut sim: Simulation<I, P>,
    running: Arc<AtomicBool>,
    stats: Arc<LoopStats>,
    timing: TimingConfig,
) {
    let diag = Diagnostics::new(running.clone());
    let mut clock = FixedStep::new(timing.step());
    let mut last = Instant::now();
    let mut report_at = last + timing.report_interval();
    let mut ticks: u32 = 0;
    let mut frames: u32 = 0;

    diag.info("simulation started");

    while running.load(Ordering::SeqCst) {
        let now = Instant::now();
        let due = clock.advance(now - last);
        last = now;
        if due > timing.ticks_per_second {
            diag.warning(&format!("running behind, {due} ticks due at once"));
        }

        sim.input.poll();
        if sim.input.was_pressed(Action::Quit) {
            diag.info("quit requested");
            break;
        }
        if sim.input.was_pressed(Action::ToggleDebug) {
            sim.renderer.toggle_debug();
        }

        for _ in 0..due {
            let events = sim.world.tick(sim.input.frame_input());
            log_events(&diag, &events);
            ticks += 1;
            stats.ticks.fetch_add(1, Ordering::Relaxed);
        }

        if due > 0 {
            let pointer = sim
                .input
                .pointer()
                .and_then(|(col, row)| sim.presenter.frame_point(col, row));
            let frame = sim.renderer.render(&sim.world, pointer);
            if let Err(e) = sim.presenter.present(frame) {
                diag.severe(&format!("presenting frame failed: {e}"));
            }
            frames += 1;
            stats.frames.fetch_add(1, Ordering::Relaxed);
        }

        thread::sleep(timing.idle_sleep());

        if Instant::now() >= report_at {
            diag.info(&format!("{ticks} ticks, {frames} frames"));
            ticks = 0;
            frames = 0;
            report_at += timing.report_interval();
        }
    }

    running.store(false, Ordering::SeqCst);
    diag.info("simulation stopped");
}

fn log_events(diag: &Diagnostics, events: &[GameEvent]) {
    for event in events {
        match event {
            GameEvent::CoinCollected { value, total } => {
                diag.info(&format!("coin worth {value} collected, money = {total}"));
            }
            GameEvent::PlayerKilled { by } => {
                diag.info(&format!("player killed by {by:?}"));
            }
            GameEvent::Spawned { tag } => log::debug!("spawned {tag:?}"),
            GameEvent::Reaped { count } => log::debug!("reaped {count} entities"),
            GameEvent::FireballBurnedOut => log::debug!("fireball burned out"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GameConfig;
    use crate::sim::level::fixtures::{level_from, setup};
    use crate::ui::atlas::fixtures::numbered_sheet;
    use crate::ui::atlas::AtlasSet;
    use std::sync::Mutex;

    const STEP: Duration = Duration::from_nanos(16_666_667);

    // ── FixedStep ──

    #[test]
    fn ticks_equal_floor_of_accumulated() {
        let inputs_ms = [0u64, 1, 5, 16, 17, 33, 100, 3, 250, 7, 16, 1000];
        let mut clock = FixedStep::new(STEP);
        let mut total = Duration::ZERO;
        let mut ran: u128 = 0;
        for ms in inputs_ms {
            let elapsed = Duration::from_millis(ms);
            total += elapsed;
            ran += clock.advance(elapsed) as u128;
            assert_eq!(ran, total.as_nanos() / STEP.as_nanos());
            let r = clock.residual();
            assert!((0.0..1.0).contains(&r), "residual {r}");
        }
    }

    #[test]
    fn short_frames_accumulate() {
        let mut clock = FixedStep::new(STEP);
        assert_eq!(clock.advance(Duration::from_millis(10)), 0);
        assert_eq!(clock.advance(Duration::from_millis(10)), 1);
        assert!((clock.residual() - 0.2).abs() < 1e-3);
    }

    // ── GameLoop ──

    #[derive(Default)]
    struct Script {
        quit: bool,
    }

    impl InputSource for Script {
        fn poll(&mut self) {}
        fn is_held(&self, action: Action) -> bool {
            action == Action::Right
        }
        fn was_pressed(&self, action: Action) -> bool {
            self.quit && action == Action::Quit
        }
    }

    /// Counts frames; fails once `fail_after` frames were shown.
    struct Headless {
        shown: Arc<Mutex<u32>>,
        fail_after: Option<u32>,
    }

    impl Presenter for Headless {
        fn present(&mut self, frame: &FrameBuffer) -> io::Result<()> {
            assert_eq!((frame.width(), frame.height()), (32, 16));
            let mut shown = self.shown.lock().unwrap();
            if self.fail_after.is_some_and(|n| *shown >= n) {
                return Err(io::Error::new(io::ErrorKind::BrokenPipe, "gone"));
            }
            *shown += 1;
            Ok(())
        }
    }

    fn build(input: Script, presenter: Headless) -> impl FnOnce() -> Simulation<Script, Headless> + Send {
        move || {
            let mut level = level_from(&["........", "........"], setup(8, 8));
            level.add_player(0, 0);
            let mut atlases = AtlasSet::default();
            let tiles = atlases.push(numbered_sheet("tiles", 19, 20, 4));
            let mut display = GameConfig::default().display;
            display.width = 32;
            display.height = 16;
            Simulation {
                world: World::new(level, 32, 16),
                renderer: Renderer::new(atlases, tiles, &display),
                input,
                presenter,
            }
        }
    }

    fn timing() -> TimingConfig {
        TimingConfig { ticks_per_second: 60, idle_sleep_ms: 1, report_interval_ms: 50 }
    }

    #[test]
    fn start_then_stop() {
        let shown = Arc::new(Mutex::new(0));
        let mut game = GameLoop::new(timing());
        assert_eq!(game.state(), LoopState::Stopped);

        game.start(build(Script::default(), Headless { shown: shown.clone(), fail_after: None }))
            .unwrap();
        assert_eq!(game.state(), LoopState::Running);
        thread::sleep(Duration::from_millis(200));
        game.stop();

        assert_eq!(game.state(), LoopState::Stopped);
        assert!(game.stats().ticks() > 0);
        assert!(game.stats().frames() > 0);
        assert!(game.stats().frames() <= game.stats().ticks());
        assert_eq!(*shown.lock().unwrap() as u64, game.stats().frames());

        // nothing runs after stop
        let ticks = game.stats().ticks();
        thread::sleep(Duration::from_millis(50));
        assert_eq!(game.stats().ticks(), ticks);
    }

    #[test]
    fn quit_action_ends_loop() {
        let shown = Arc::new(Mutex::new(0));
        let mut game = GameLoop::new(timing());
        game.start(build(Script { quit: true }, Headless { shown, fail_after: None }))
            .unwrap();
        game.join();
        assert_eq!(game.state(), LoopState::Stopped);
        assert_eq!(game.stats().ticks(), 0);
    }

    #[test]
    fn present_failure_is_severe_and_stops() {
        let shown = Arc::new(Mutex::new(0));
        let mut game = GameLoop::new(timing());
        game.start(build(Script::default(), Headless { shown: shown.clone(), fail_after: Some(2) }))
            .unwrap();
        game.join();
        assert_eq!(game.state(), LoopState::Stopped);
        assert_eq!(*shown.lock().unwrap(), 2);
    }
}
