//! Keyframe interpolation engine

// ------------------------------------------------------------------------------------------------
// IMPORTS
// ------------------------------------------------------------------------------------------------

use log::{debug, info, trace, warn};
use plen_if::{motion::MotionFile, JointId, NUM_JOINTS};
use std::{
    path::Path,
    sync::{
        atomic::{AtomicBool, AtomicU8, Ordering},
        Arc,
    },
    time::Duration,
};
use util::time::millis_to_duration;

use super::{Clock, MonotonicClock, MotionError, CONTROL_INTERVAL_MS};
use crate::{joint_ctrl::JointCtrl, servo_ctrl::ActuatorPort};

// ------------------------------------------------------------------------------------------------
// STRUCTS
// ------------------------------------------------------------------------------------------------

/// Plays a single motion.
///
/// A player is used for one `play` call only. It can be stopped from any thread through a
/// [`StopHandle`].
pub struct MotionPlayer<C: Clock = MonotonicClock> {
    clock: C,

    shared: Arc<Shared>,
}

/// Requests cancellation of a running playback.
#[derive(Debug, Clone)]
pub struct StopHandle {
    shared: Arc<Shared>,
}

/// Summary of a `play` call.
#[derive(Debug, Clone)]
pub struct PlaybackReport {
    pub outcome: PlaybackOutcome,

    /// Number of frames which reached their targets
    pub frames_played: usize,

    /// Number of interpolation steps executed
    pub steps: usize,

    /// Number of joint commands which the actuator port rejected
    pub dispatch_faults: usize,

    /// Deviation from home of every joint when playback ended
    pub deviation: [f64; NUM_JOINTS],
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,

    cancel: AtomicBool,
}

// ------------------------------------------------------------------------------------------------
// ENUMS
// ------------------------------------------------------------------------------------------------

/// Lifecycle of a [`MotionPlayer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum PlayerState {
    Idle = 0,
    Playing = 1,
    Completed = 2,
    Cancelled = 3,
    Failed = 4,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackOutcome {
    /// Every frame was played
    Completed,

    /// Playback was stopped, joints hold their last commanded deviation
    Cancelled,
}

// ------------------------------------------------------------------------------------------------
// IMPLS
// ------------------------------------------------------------------------------------------------

impl MotionPlayer<MonotonicClock> {
    /// Create a player paced by the system clock.
    pub fn new() -> Self {
        Self::with_clock(MonotonicClock)
    }
}

impl Default for MotionPlayer<MonotonicClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: Clock> MotionPlayer<C> {
    /// Create a player paced by the given clock.
    pub fn with_clock(clock: C) -> Self {
        Self {
            clock,
            shared: Arc::new(Shared {
                state: AtomicU8::new(PlayerState::Idle as u8),
                cancel: AtomicBool::new(false),
            }),
        }
    }

    pub fn state(&self) -> PlayerState {
        self.shared.state()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            shared: self.shared.clone(),
        }
    }

    /// Request cancellation, see [`StopHandle::stop`].
    pub fn stop(&self) {
        self.shared.stop()
    }

    /// Load the motion file at `path` and play it.
    ///
    /// If the file cannot be loaded no joint is moved.
    pub fn play_file<P: ActuatorPort, Q: AsRef<Path>>(
        &mut self,
        ctrl: &mut JointCtrl<P>,
        path: Q,
        speed: f64,
    ) -> Result<PlaybackReport, MotionError> {
        if self.state() != PlayerState::Idle {
            return Err(MotionError::PlayerUsed(self.state()));
        }

        let motion = match MotionFile::load(path.as_ref()) {
            Ok(m) => m,
            Err(e) => {
                self.shared.set_state(PlayerState::Failed);
                return Err(e.into());
            }
        };

        self.play(ctrl, &motion, speed)
    }

    /// Play a motion, blocking until it completes or is stopped.
    ///
    /// Every joint starts from its home (zero deviation). `speed` scales playback rate, values
    /// which are not strictly positive are treated as 1.
    pub fn play<P: ActuatorPort>(
        &mut self,
        ctrl: &mut JointCtrl<P>,
        motion: &MotionFile,
        speed: f64,
    ) -> Result<PlaybackReport, MotionError> {
        if self.state() != PlayerState::Idle {
            return Err(MotionError::PlayerUsed(self.state()));
        }
        self.shared.set_state(PlayerState::Playing);

        let speed = effective_speed(speed);
        let interval = millis_to_duration(CONTROL_INTERVAL_MS);

        info!(
            "Playing motion \"{}\" ({} frames) at {}x speed",
            motion.name,
            motion.frames.len(),
            speed
        );

        let mut report = PlaybackReport {
            outcome: PlaybackOutcome::Completed,
            frames_played: 0,
            steps: 0,
            dispatch_faults: 0,
            deviation: [0.0; NUM_JOINTS],
        };

        'frames: for (frame_idx, frame) in motion.frames.iter().enumerate() {
            if self.shared.cancel_requested() {
                report.outcome = PlaybackOutcome::Cancelled;
                break;
            }

            let num_steps = step_count(frame.transition_time_ms, speed);

            let mut target = report.deviation;
            for (id, value) in frame.targets() {
                target[id.index()] = value;
            }

            let mut delta = [0.0; NUM_JOINTS];
            for i in 0..NUM_JOINTS {
                delta[i] = (target[i] - report.deviation[i]) / num_steps as f64;
            }

            debug!(
                "Frame {}: {} ms in {} steps",
                frame_idx, frame.transition_time_ms, num_steps
            );

            for step in 0..num_steps {
                if self.shared.cancel_requested() {
                    report.outcome = PlaybackOutcome::Cancelled;
                    break 'frames;
                }

                let step_start = self.clock.now();

                for (dev, d) in report.deviation.iter_mut().zip(delta.iter()) {
                    *dev += d;
                }
                report.dispatch_faults += dispatch(ctrl, &report.deviation);
                report.steps += 1;

                // Sleep for what remains of the interval once dispatch latency is accounted for
                let elapsed = self.clock.now().saturating_duration_since(step_start);
                match interval.checked_sub(elapsed) {
                    Some(d) if d > Duration::from_secs(0) => self.clock.sleep(d),
                    Some(_) => (),
                    None => trace!(
                        "Step {} overran by {:.3} ms",
                        step,
                        (elapsed - interval).as_secs_f64() * 1000.0
                    ),
                }
            }

            if self.shared.cancel_requested() {
                report.outcome = PlaybackOutcome::Cancelled;
                break;
            }

            // Land exactly on the target
            report.deviation = target;
            report.dispatch_faults += dispatch(ctrl, &report.deviation);
            report.frames_played += 1;
        }

        match report.outcome {
            PlaybackOutcome::Completed => {
                self.shared.set_state(PlayerState::Completed);
                info!(
                    "Motion \"{}\" complete ({} steps)",
                    motion.name, report.steps
                );
            }
            PlaybackOutcome::Cancelled => {
                self.shared.set_state(PlayerState::Cancelled);
                info!(
                    "Motion \"{}\" stopped after {} of {} frames",
                    motion.name,
                    report.frames_played,
                    motion.frames.len()
                );
            }
        }

        if report.dispatch_faults > 0 {
            warn!(
                "{} joint commands failed during playback",
                report.dispatch_faults
            );
        }

        Ok(report)
    }
}

impl StopHandle {
    /// Request cancellation of the running playback.
    ///
    /// Checked once per step. Has no effect if playback has not started or has already finished.
    pub fn stop(&self) {
        self.shared.stop()
    }
}

impl Shared {
    fn state(&self) -> PlayerState {
        match self.state.load(Ordering::Acquire) {
            0 => PlayerState::Idle,
            1 => PlayerState::Playing,
            2 => PlayerState::Completed,
            3 => PlayerState::Cancelled,
            _ => PlayerState::Failed,
        }
    }

    fn set_state(&self, state: PlayerState) {
        self.state.store(state as u8, Ordering::Release)
    }

    fn stop(&self) {
        if self.state() == PlayerState::Playing {
            self.cancel.store(true, Ordering::Release);
        }
    }

    fn cancel_requested(&self) -> bool {
        self.cancel.load(Ordering::Acquire)
    }
}

impl PlaybackReport {
    /// Deviation of one joint when playback ended.
    pub fn deviation(&self, id: JointId) -> f64 {
        self.deviation[id.index()]
    }
}

// ------------------------------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ------------------------------------------------------------------------------------------------

/// Number of control steps needed to cover a transition at the given speed, at least 1.
pub fn step_count(transition_time_ms: f64, speed: f64) -> usize {
    let steps = (transition_time_ms / effective_speed(speed) / CONTROL_INTERVAL_MS).round();

    if steps.is_finite() && steps >= 1.0 {
        steps as usize
    } else {
        1
    }
}

// ------------------------------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ------------------------------------------------------------------------------------------------

fn effective_speed(speed: f64) -> f64 {
    if speed.is_finite() && speed > 0.0 {
        speed
    } else {
        warn!("Invalid playback speed {}, using 1.0", speed);
        1.0
    }
}

/// Send every joint's deviation in ascending id order, returning the number of failures.
fn dispatch<P: ActuatorPort>(ctrl: &mut JointCtrl<P>, deviation: &[f64; NUM_JOINTS]) -> usize {
    let mut faults = 0;

    for id in JointId::all() {
        if let Err(e) = ctrl.set_angle_by_deviation(id, deviation[id.index()].round() as i32) {
            warn!("{}", e);
            faults += 1;
        }
    }

    faults
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::joint_ctrl::{angle_to_tick, JointRegistry};
    use crate::servo_ctrl::ServoError;
    use plen_if::motion::{Frame, Output};
    use std::{
        cell::{Cell, RefCell},
        rc::Rc,
        thread,
        time::Instant,
    };

    // ---- FIXTURES ----

    /// Clock which advances only when slept, or when a port charges latency to it.
    #[derive(Clone)]
    struct FakeClock {
        inner: Rc<FakeInner>,
    }

    struct FakeInner {
        base: Instant,
        offset: Cell<Duration>,
        sleeps: Cell<usize>,
        stop_after_sleep: RefCell<Option<(usize, StopHandle)>>,
    }

    impl FakeClock {
        fn new() -> Self {
            Self {
                inner: Rc::new(FakeInner {
                    base: Instant::now(),
                    offset: Cell::new(Duration::from_secs(0)),
                    sleeps: Cell::new(0),
                    stop_after_sleep: RefCell::new(None),
                }),
            }
        }

        fn advance(&self, d: Duration) {
            self.inner.offset.set(self.inner.offset.get() + d);
        }

        fn elapsed(&self) -> Duration {
            self.inner.offset.get()
        }

        fn sleeps(&self) -> usize {
            self.inner.sleeps.get()
        }

        /// Stop playback once the `n`th sleep has finished.
        fn stop_after_sleep(&self, n: usize, handle: StopHandle) {
            *self.inner.stop_after_sleep.borrow_mut() = Some((n, handle));
        }
    }

    impl Clock for FakeClock {
        fn now(&self) -> Instant {
            self.inner.base + self.inner.offset.get()
        }

        fn sleep(&self, duration: Duration) {
            self.advance(duration);
            self.inner.sleeps.set(self.inner.sleeps.get() + 1);

            if let Some((n, handle)) = &*self.inner.stop_after_sleep.borrow() {
                if *n == self.inner.sleeps.get() {
                    handle.stop();
                }
            }
        }
    }

    /// Port recording every write, optionally charging latency to a fake clock.
    #[derive(Default)]
    struct RecordingPort {
        writes: Vec<(u8, u16)>,
        latency: Option<(FakeClock, Duration)>,
        bad_channel: Option<u8>,
    }

    impl ActuatorPort for RecordingPort {
        fn set_channel_tick(&mut self, channel: u8, tick: u16) -> Result<(), ServoError> {
            if let Some((clock, d)) = &self.latency {
                clock.advance(*d);
            }
            if self.bad_channel == Some(channel) {
                return Err(ServoError::I2c);
            }
            self.writes.push((channel, tick));
            Ok(())
        }
    }

    fn ctrl(port: RecordingPort) -> JointCtrl<RecordingPort> {
        JointCtrl::new(JointRegistry::new(), port)
    }

    fn frame(transition_time_ms: f64, outputs: &[(&str, f64)]) -> Frame {
        Frame {
            transition_time_ms,
            outputs: outputs
                .iter()
                .map(|(d, v)| Output {
                    device: d.to_string(),
                    value: *v,
                })
                .collect(),
        }
    }

    fn motion(frames: Vec<Frame>) -> MotionFile {
        MotionFile {
            name: String::from("test"),
            frames,
        }
    }

    fn knee() -> JointId {
        JointId::from_device("left_knee_pitch").unwrap()
    }

    /// Channel 2 drives the left knee, collect the ticks it was sent.
    fn knee_ticks(port: &RecordingPort) -> Vec<u16> {
        port.writes
            .iter()
            .filter(|(c, _)| *c == 2)
            .map(|(_, t)| *t)
            .collect()
    }

    // ---- TESTS ----

    #[test]
    fn test_step_count() {
        assert_eq!(step_count(200.0, 1.0), 5);
        assert_eq!(step_count(400.0, 1.0), 10);
        assert_eq!(step_count(400.0, 2.0), 5);
        assert_eq!(step_count(10.0, 1.0), 1);
        assert_eq!(step_count(0.0, 1.0), 1);
        assert_eq!(step_count(-100.0, 1.0), 1);
        assert_eq!(step_count(200.0, 0.0), 5);
        assert_eq!(step_count(200.0, -3.0), 5);
        assert_eq!(step_count(200.0, f64::NAN), 5);
        // Rounded, not truncated
        assert_eq!(step_count(60.0, 1.0), 2);
    }

    #[test]
    fn test_single_frame_example() {
        let clock = FakeClock::new();
        let mut ctrl = ctrl(RecordingPort::default());
        let mut player = MotionPlayer::with_clock(clock.clone());

        let m = motion(vec![frame(200.0, &[("left_knee_pitch", 100.0)])]);
        let report = player.play(&mut ctrl, &m, 1.0).unwrap();

        assert_eq!(report.outcome, PlaybackOutcome::Completed);
        assert_eq!(report.steps, 5);
        assert_eq!(report.frames_played, 1);
        assert_eq!(report.deviation(knee()), 100.0);
        assert_eq!(player.state(), PlayerState::Completed);

        // 20 per step from home (445), then the snap
        let expected: Vec<u16> = [465, 485, 505, 525, 545, 545]
            .iter()
            .map(|a| angle_to_tick(*a))
            .collect();
        assert_eq!(knee_ticks(ctrl.port()), expected);

        // Every wired joint is sent on every step and on the snap
        assert_eq!(ctrl.port().writes.len(), 16 * 6);
        assert_eq!(clock.elapsed(), Duration::from_millis(200));
    }

    #[test]
    fn test_exact_arrival_with_uneven_steps() {
        let clock = FakeClock::new();
        let mut ctrl = ctrl(RecordingPort::default());
        let mut player = MotionPlayer::with_clock(clock);

        // 7 and 3 steps, neither divides the distance
        let m = motion(vec![
            frame(280.0, &[("left_knee_pitch", 100.0), ("right_thigh_roll", -33.0)]),
            frame(120.0, &[("left_knee_pitch", -1.0)]),
        ]);
        let report = player.play(&mut ctrl, &m, 1.0).unwrap();

        assert_eq!(report.steps, 10);
        assert_eq!(report.frames_played, 2);
        assert_eq!(report.deviation(knee()), -1.0);
        // Untouched by the second frame, carried over from the first
        assert_eq!(
            report.deviation(JointId::from_device("right_thigh_roll").unwrap()),
            -33.0
        );
        for (i, dev) in report.deviation.iter().enumerate() {
            if i != knee().index() && i != 16 {
                assert_eq!(*dev, 0.0);
            }
        }
    }

    #[test]
    fn test_speed_halves_duration() {
        let slow_clock = FakeClock::new();
        let fast_clock = FakeClock::new();
        let m = motion(vec![frame(400.0, &[("left_knee_pitch", 50.0)])]);

        let mut slow_ctrl = ctrl(RecordingPort::default());
        let slow = MotionPlayer::with_clock(slow_clock.clone())
            .play(&mut slow_ctrl, &m, 1.0)
            .unwrap();

        let mut fast_ctrl = ctrl(RecordingPort::default());
        let fast = MotionPlayer::with_clock(fast_clock.clone())
            .play(&mut fast_ctrl, &m, 2.0)
            .unwrap();

        assert_eq!(slow.steps, 10);
        assert_eq!(fast.steps, 5);
        assert_eq!(slow_clock.elapsed(), Duration::from_millis(400));
        assert_eq!(fast_clock.elapsed(), Duration::from_millis(200));
        assert_eq!(slow.deviation(knee()), fast.deviation(knee()));
    }

    #[test]
    fn test_latency_is_compensated() {
        let clock = FakeClock::new();
        let port = RecordingPort {
            latency: Some((clock.clone(), Duration::from_millis(1))),
            ..Default::default()
        };
        let mut ctrl = ctrl(port);
        let mut player = MotionPlayer::with_clock(clock.clone());

        let m = motion(vec![frame(200.0, &[("left_knee_pitch", 100.0)])]);
        player.play(&mut ctrl, &m, 1.0).unwrap();

        // 16 ms of writes per step, the sleeps absorb it. The snap adds one more batch.
        assert_eq!(clock.sleeps(), 5);
        assert_eq!(clock.elapsed(), Duration::from_millis(5 * 40 + 16));
    }

    #[test]
    fn test_overrun_skips_sleep() {
        let clock = FakeClock::new();
        let port = RecordingPort {
            latency: Some((clock.clone(), Duration::from_millis(3))),
            ..Default::default()
        };
        let mut ctrl = ctrl(port);
        let mut player = MotionPlayer::with_clock(clock.clone());

        let m = motion(vec![frame(120.0, &[("left_knee_pitch", 30.0)])]);
        let report = player.play(&mut ctrl, &m, 1.0).unwrap();

        // 48 ms of writes per step is longer than the interval
        assert_eq!(report.steps, 3);
        assert_eq!(clock.sleeps(), 0);
        assert_eq!(report.deviation(knee()), 30.0);
    }

    #[test]
    fn test_stop_mid_frame() {
        let clock = FakeClock::new();
        let mut ctrl = ctrl(RecordingPort::default());
        let mut player = MotionPlayer::with_clock(clock.clone());
        clock.stop_after_sleep(2, player.stop_handle());

        let m = motion(vec![
            frame(200.0, &[("left_knee_pitch", 100.0)]),
            frame(200.0, &[("right_knee_pitch", 100.0)]),
        ]);
        let report = player.play(&mut ctrl, &m, 1.0).unwrap();

        assert_eq!(report.outcome, PlaybackOutcome::Cancelled);
        assert_eq!(player.state(), PlayerState::Cancelled);
        assert_eq!(report.steps, 2);
        assert_eq!(report.frames_played, 0);
        // Held at the step 2 value, not snapped and not returned home
        assert_eq!(report.deviation(knee()), 40.0);
        assert_eq!(
            report.deviation(JointId::from_device("right_knee_pitch").unwrap()),
            0.0
        );
        assert_eq!(knee_ticks(ctrl.port()), vec![angle_to_tick(465), angle_to_tick(485)]);
    }

    #[test]
    fn test_stop_between_frames() {
        let clock = FakeClock::new();
        let mut ctrl = ctrl(RecordingPort::default());
        let mut player = MotionPlayer::with_clock(clock.clone());
        clock.stop_after_sleep(5, player.stop_handle());

        let m = motion(vec![
            frame(200.0, &[("left_knee_pitch", 100.0)]),
            frame(200.0, &[("left_knee_pitch", 0.0)]),
        ]);
        let report = player.play(&mut ctrl, &m, 1.0).unwrap();

        // Stopped during the last step of the first frame, before the snap
        assert_eq!(report.outcome, PlaybackOutcome::Cancelled);
        assert_eq!(report.steps, 5);
        assert_eq!(report.frames_played, 0);
        assert!((report.deviation(knee()) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_stop_outside_playback_has_no_effect() {
        let mut ctrl = ctrl(RecordingPort::default());
        let mut player = MotionPlayer::with_clock(FakeClock::new());
        let handle = player.stop_handle();

        // Before playback
        handle.stop();
        player.stop();

        let m = motion(vec![frame(80.0, &[("left_knee_pitch", 10.0)])]);
        let report = player.play(&mut ctrl, &m, 1.0).unwrap();
        assert_eq!(report.outcome, PlaybackOutcome::Completed);

        // After playback
        handle.stop();
        assert_eq!(player.state(), PlayerState::Completed);
    }

    #[test]
    fn test_player_single_use() {
        let mut ctrl = ctrl(RecordingPort::default());
        let mut player = MotionPlayer::with_clock(FakeClock::new());
        let m = motion(vec![frame(40.0, &[])]);

        player.play(&mut ctrl, &m, 1.0).unwrap();
        assert!(matches!(
            player.play(&mut ctrl, &m, 1.0),
            Err(MotionError::PlayerUsed(PlayerState::Completed))
        ));
    }

    #[test]
    fn test_each_play_starts_from_home() {
        let mut ctrl = ctrl(RecordingPort::default());
        let m = motion(vec![frame(80.0, &[("left_knee_pitch", 40.0)])]);

        MotionPlayer::with_clock(FakeClock::new())
            .play(&mut ctrl, &m, 1.0)
            .unwrap();
        let second = MotionPlayer::with_clock(FakeClock::new())
            .play(&mut ctrl, &m, 1.0)
            .unwrap();

        // The second run interpolates from 0 again: 20 then 40
        let ticks = knee_ticks(ctrl.port());
        assert_eq!(&ticks[3..], &[angle_to_tick(465), angle_to_tick(485), angle_to_tick(485)]);
        assert_eq!(second.deviation(knee()), 40.0);
    }

    #[test]
    fn test_bad_file_moves_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.json");
        std::fs::write(&path, r#"{"name": "no frames"}"#).unwrap();

        let mut ctrl = ctrl(RecordingPort::default());
        let mut player = MotionPlayer::with_clock(FakeClock::new());

        assert!(matches!(
            player.play_file(&mut ctrl, &path, 1.0),
            Err(MotionError::Load(_))
        ));
        assert_eq!(player.state(), PlayerState::Failed);
        assert!(ctrl.port().writes.is_empty());

        let mut player = MotionPlayer::with_clock(FakeClock::new());
        assert!(player
            .play_file(&mut ctrl, dir.path().join("missing.json"), 1.0)
            .is_err());
        assert!(ctrl.port().writes.is_empty());
    }

    #[test]
    fn test_play_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bow.json");
        std::fs::write(
            &path,
            r#"{"name": "bow", "frames": [
                {"transition_time_ms": 80, "outputs": [{"device": "left_knee_pitch", "value": 10}]}
            ]}"#,
        )
        .unwrap();

        let mut ctrl = ctrl(RecordingPort::default());
        let report = MotionPlayer::with_clock(FakeClock::new())
            .play_file(&mut ctrl, &path, 1.0)
            .unwrap();

        assert_eq!(report.steps, 2);
        assert_eq!(report.deviation(knee()), 10.0);
    }

    #[test]
    fn test_unknown_devices_and_faults_do_not_abort() {
        let port = RecordingPort {
            bad_channel: Some(2),
            ..Default::default()
        };
        let mut ctrl = ctrl(port);
        let mut player = MotionPlayer::with_clock(FakeClock::new());

        let m = motion(vec![frame(
            80.0,
            &[("left_knee_pitch", 10.0), ("jet_pack", 5.0), ("left_foot_roll", 8.0)],
        )]);
        let report = player.play(&mut ctrl, &m, 1.0).unwrap();

        assert_eq!(report.outcome, PlaybackOutcome::Completed);
        // Channel 2 fails on both steps and the snap
        assert_eq!(report.dispatch_faults, 3);
        assert_eq!(report.deviation(knee()), 10.0);
        assert_eq!(
            report.deviation(JointId::from_device("left_foot_roll").unwrap()),
            8.0
        );
        assert_eq!(ctrl.port().writes.len(), 15 * 3);
    }

    #[test]
    fn test_dispatch_order() {
        let mut ctrl = ctrl(RecordingPort::default());
        let mut player = MotionPlayer::with_clock(FakeClock::new());

        player
            .play(&mut ctrl, &motion(vec![frame(40.0, &[])]), 1.0)
            .unwrap();

        // Ascending joint id: joints 1..=8 on channels 7..=0, joints 13..=20 on 8..=15
        let channels: Vec<u8> = ctrl.port().writes[..16].iter().map(|(c, _)| *c).collect();
        let expected: Vec<u8> = (0..8).rev().chain(8..16).collect();
        assert_eq!(channels, expected);
        assert_eq!(&ctrl.port().writes[16..32], &ctrl.port().writes[..16]);
    }

    #[test]
    fn test_stop_from_another_thread() {
        let mut ctrl = JointCtrl::new(JointRegistry::new(), crate::servo_ctrl::SimPort::new());
        let mut player = MotionPlayer::new();
        let handle = player.stop_handle();

        let stopper = thread::spawn(move || {
            thread::sleep(Duration::from_millis(150));
            handle.stop();
        });

        let m = motion(vec![
            frame(2000.0, &[("left_knee_pitch", 100.0)]),
            frame(2000.0, &[("left_knee_pitch", -100.0)]),
        ]);
        let report = player.play(&mut ctrl, &m, 1.0).unwrap();
        stopper.join().unwrap();

        assert_eq!(report.outcome, PlaybackOutcome::Cancelled);
        assert_eq!(report.frames_played, 0);
        assert!(report.steps < 50);
        assert!(report.deviation(knee()) < 100.0);
    }
}
