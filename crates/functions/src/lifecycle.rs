//! State shared by every capture function and its run thread.
//!
//! A function moves forward only: `Idle → Started → Finished`. A test
//! capture may run while idle and is tracked by a separate flag. The run
//! loop owns an `Arc<Lifecycle>`, so status readers and the loop see the
//! same state.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError};
use std::thread;
use std::time::{Duration, Instant};

use camctl_camera::{CameraHandle, ShotLocation};
use camctl_protocol::{LifecycleState, TimingStats};

use crate::FunctionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Idle,
    Started,
    Finished,
}

#[derive(Debug)]
struct State {
    phase: Phase,
    testing: bool,
}

impl State {
    fn is_operating(&self) -> bool {
        self.phase == Phase::Started || self.testing
    }
}

#[derive(Debug, Default)]
struct Record {
    stats: TimingStats,
    last_shot: Option<ShotLocation>,
}

/// Cooperative abort flag with an interruptible timed wait.
#[derive(Debug, Default)]
pub(crate) struct AbortSignal {
    raised: AtomicBool,
    lock: Mutex<()>,
    wake: Condvar,
}

impl AbortSignal {
    pub(crate) fn raise(&self) {
        self.raised.store(true, Ordering::SeqCst);
        let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        self.wake.notify_all();
    }

    pub(crate) fn is_raised(&self) -> bool {
        self.raised.load(Ordering::SeqCst)
    }

    /// Sleeps until `deadline` or until raised; returns `true` if raised.
    pub(crate) fn wait_until(&self, deadline: Instant) -> bool {
        let mut guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
        loop {
            if self.is_raised() {
                return true;
            }
            let now = Instant::now();
            if now >= deadline {
                return false;
            }
            guard = self
                .wake
                .wait_timeout(guard, deadline - now)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }
}

/// Lifecycle, abort signal, statistics and camera access of one function.
#[derive(Debug)]
pub struct Lifecycle {
    camera: CameraHandle,
    download_folder: PathBuf,
    state: Mutex<State>,
    changed: Condvar,
    abort: AbortSignal,
    download_after_exposure: AtomicBool,
    record: Mutex<Record>,
}

/// Marks the function finished when the run thread exits, even by panic.
struct FinishOnDrop<'a>(&'a Lifecycle);

impl Drop for FinishOnDrop<'_> {
    fn drop(&mut self) {
        self.0.set_phase(Phase::Finished);
    }
}

/// Clears the testing flag when the test capture thread exits.
struct EndTestOnDrop<'a>(&'a Lifecycle);

impl Drop for EndTestOnDrop<'_> {
    fn drop(&mut self) {
        self.0.end_test();
    }
}

impl Lifecycle {
    pub(crate) fn new(camera: CameraHandle, download_folder: PathBuf) -> Arc<Self> {
        Arc::new(Self {
            camera,
            download_folder,
            state: Mutex::new(State {
                phase: Phase::Idle,
                testing: false,
            }),
            changed: Condvar::new(),
            abort: AbortSignal::default(),
            download_after_exposure: AtomicBool::new(false),
            record: Mutex::new(Record::default()),
        })
    }

    fn state(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self) -> MutexGuard<'_, Record> {
        self.record.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_phase(&self, phase: Phase) {
        self.state().phase = phase;
        self.changed.notify_all();
    }

    fn end_test(&self) {
        self.state().testing = false;
        self.changed.notify_all();
    }

    /// `Ok(true)` when idle, `Ok(false)` when already started.
    fn check_startable(&self) -> Result<bool, FunctionError> {
        let state = self.state();
        if state.testing {
            return Err(FunctionError::TestInProgress);
        }
        match state.phase {
            Phase::Idle => Ok(true),
            Phase::Started => Ok(false),
            Phase::Finished => Err(FunctionError::AlreadyFinished),
        }
    }

    /// Brings the camera up and launches `run` on a thread named `name`.
    ///
    /// Starting a started function does nothing. The camera check runs
    /// without the state lock held, so the state is checked again before
    /// committing to `Started`.
    pub(crate) fn start<F>(self: &Arc<Self>, name: &'static str, run: F) -> Result<(), FunctionError>
    where
        F: FnOnce(&Lifecycle) + Send + 'static,
    {
        if !self.check_startable()? {
            return Ok(());
        }

        self.camera.ensure_ready()?;

        {
            let mut state = self.state();
            if state.testing {
                return Err(FunctionError::TestInProgress);
            }
            match state.phase {
                Phase::Idle => state.phase = Phase::Started,
                Phase::Started => return Ok(()),
                Phase::Finished => return Err(FunctionError::AlreadyFinished),
            }
        }
        self.changed.notify_all();

        let core = Arc::clone(self);
        let spawned = thread::Builder::new().name(name.into()).spawn(move || {
            let core: &Lifecycle = &core;
            let _finish = FinishOnDrop(core);
            run(core);
        });

        if let Err(source) = spawned {
            self.set_phase(Phase::Idle);
            return Err(FunctionError::Spawn { name, source });
        }
        tracing::info!(thread = name, "function started");
        Ok(())
    }

    /// Asks the run loop to stop after the current shot.
    pub fn abort(&self) {
        if self.state().phase == Phase::Started {
            tracing::info!("aborting function");
            self.abort.raise();
        }
    }

    pub(crate) fn abort_signal(&self) -> &AbortSignal {
        &self.abort
    }

    pub fn is_started(&self) -> bool {
        self.state().phase != Phase::Idle
    }

    pub fn is_finished(&self) -> bool {
        self.state().phase == Phase::Finished
    }

    pub fn is_testing(&self) -> bool {
        self.state().testing
    }

    /// Running a sequence or a test capture.
    pub fn is_operating(&self) -> bool {
        self.state().is_operating()
    }

    pub fn lifecycle_state(&self) -> LifecycleState {
        let state = self.state();
        if state.testing {
            return LifecycleState::Testing;
        }
        match state.phase {
            Phase::Idle => LifecycleState::Idle,
            Phase::Started => LifecycleState::Started,
            Phase::Finished => LifecycleState::Finished,
        }
    }

    /// Blocks until the run loop has finished; `false` on timeout.
    pub fn wait_finished(&self, timeout: Duration) -> bool {
        let (state, _) = self
            .changed
            .wait_timeout_while(self.state(), timeout, |s| s.phase != Phase::Finished)
            .unwrap_or_else(PoisonError::into_inner);
        state.phase == Phase::Finished
    }

    /// Blocks until no test capture is running; `false` on timeout.
    pub fn wait_test_done(&self, timeout: Duration) -> bool {
        let (state, _) = self
            .changed
            .wait_timeout_while(self.state(), timeout, |s| s.testing)
            .unwrap_or_else(PoisonError::into_inner);
        !state.testing
    }

    pub fn set_download_after_exposure(&self, download: bool) {
        self.download_after_exposure.store(download, Ordering::SeqCst);
    }

    pub fn download_after_exposure(&self) -> bool {
        self.download_after_exposure.load(Ordering::SeqCst)
    }

    pub fn download_folder(&self) -> &Path {
        &self.download_folder
    }

    pub fn stats(&self) -> TimingStats {
        self.record().stats
    }

    pub fn last_shot(&self) -> Option<ShotLocation> {
        self.record().last_shot.clone()
    }

    /// Downloads the most recent picture of this function into `folder`.
    pub fn download_last_picture(&self, folder: &Path) -> Result<(), FunctionError> {
        let shot = self.last_shot().ok_or(FunctionError::NoShotYet)?;
        self.camera.download(&shot, folder)?;
        Ok(())
    }

    /// Takes one exposure outside of any sequence.
    ///
    /// Refused while operating. The camera is checked before returning;
    /// the capture itself runs on a detached thread and leaves the
    /// statistics alone.
    pub(crate) fn test_capture(self: &Arc<Self>, exposure_us: u32) -> Result<(), FunctionError> {
        {
            let mut state = self.state();
            if state.is_operating() {
                tracing::warn!("cannot test while operating");
                return Err(FunctionError::Operating);
            }
            state.testing = true;
        }
        self.changed.notify_all();

        if let Err(e) = self.camera.ensure_ready() {
            tracing::error!(error = %e, "cannot test capture, camera not ready");
            self.end_test();
            return Err(e.into());
        }

        tracing::info!("test capture...");
        let core = Arc::clone(self);
        let spawned = thread::Builder::new()
            .name("camctl-test-capture".into())
            .spawn(move || {
                let _end = EndTestOnDrop(&*core);
                let folder = core
                    .download_after_exposure()
                    .then(|| core.download_folder.clone());
                match core.camera.shoot(exposure_us, folder.as_deref()) {
                    Ok(shot) => tracing::info!(%shot, "test capture done"),
                    Err(e) => tracing::error!(error = %e, "test capture failed"),
                }
            });

        if let Err(source) = spawned {
            self.end_test();
            return Err(FunctionError::Spawn {
                name: "camctl-test-capture",
                source,
            });
        }
        Ok(())
    }

    /// One exposure for the run loop.
    pub(crate) fn shoot(&self, exposure_us: u32) -> Result<ShotLocation, FunctionError> {
        let shot = self.camera.shoot(exposure_us, None)?;
        self.record().last_shot = Some(shot.clone());
        Ok(shot)
    }

    /// Downloads the shot just taken, if downloads are enabled.
    ///
    /// A failed download is logged and does not end the sequence.
    pub(crate) fn download_if_enabled(&self) {
        if !self.download_after_exposure() {
            return;
        }
        let started = Instant::now();
        match self.download_last_picture(&self.download_folder) {
            Ok(()) => tracing::debug!(
                duration_ms = started.elapsed().as_millis() as u64,
                "download complete"
            ),
            Err(e) => tracing::warn!(error = %e, "download failed"),
        }
    }

    /// Adds one timing sample and returns the updated aggregate.
    pub(crate) fn record_sample(&self, sample_us: i64) -> TimingStats {
        let mut record = self.record();
        record.stats.record(sample_us);
        record.stats
    }
}

/// `to - from` in microseconds, negative when `to` is earlier.
pub(crate) fn signed_micros(to: Instant, from: Instant) -> i64 {
    if to >= from {
        i64::try_from((to - from).as_micros()).unwrap_or(i64::MAX)
    } else {
        -i64::try_from((from - to).as_micros()).unwrap_or(i64::MAX)
    }
}

pub(crate) fn micros(duration: Duration) -> i64 {
    i64::try_from(duration.as_micros()).unwrap_or(i64::MAX)
}
