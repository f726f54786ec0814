use std::io::{self, BufRead};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, SyncSender, TryRecvError, TrySendError};
use std::sync::Arc;
use std::thread;

use crate::models::state::{CoordinatorState, StopReason};

/// Process-wide "a termination signal arrived" flag.
///
/// Raised from a signal handler, polled by the coordinator.
#[derive(Debug, Clone, Default)]
pub struct SignalFlag(Arc<AtomicBool>);

impl SignalFlag {
    pub fn raise(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_raised(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// The underlying atomic, for handlers that can only store to one.
    pub fn as_atomic(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.0)
    }
}

/// Sending half of the single-slot end-user stop channel.
#[derive(Debug, Clone)]
pub struct StopTrigger(SyncSender<()>);

impl StopTrigger {
    /// Request a clean stop. Returns `false` if a request is already pending
    /// or the coordinator is gone.
    pub fn request(&self) -> bool {
        match self.0.try_send(()) {
            Ok(()) => true,
            Err(TrySendError::Full(())) | Err(TrySendError::Disconnected(())) => false,
        }
    }
}

/// Decides when the capture loop stops.
///
/// Polls, once per tick and without blocking, the signal flag and the
/// end-user stop channel. A raised signal wins over a pending user stop when
/// both are ready.
#[derive(Debug)]
pub struct ShutdownCoordinator {
    state: CoordinatorState,
    reason: Option<StopReason>,
    user_stop: Receiver<()>,
    trigger: StopTrigger,
    signal: SignalFlag,
}

impl ShutdownCoordinator {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::sync_channel(1);
        Self {
            state: CoordinatorState::Capturing,
            reason: None,
            user_stop: rx,
            trigger: StopTrigger(tx),
            signal: SignalFlag::default(),
        }
    }

    /// A handle for the line watcher (or anything else) to request a clean stop.
    pub fn stop_trigger(&self) -> StopTrigger {
        self.trigger.clone()
    }

    /// The flag a signal handler should raise.
    pub fn signal_flag(&self) -> SignalFlag {
        self.signal.clone()
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    /// The stop reason, once one has been observed.
    pub fn stop_reason(&self) -> Option<StopReason> {
        self.reason
    }

    /// Check for a stop request without blocking.
    pub fn poll(&mut self) -> Option<StopReason> {
        if let Some(reason) = self.reason {
            return Some(reason);
        }

        let reason = if self.signal.is_raised() {
            StopReason::Signal
        } else {
            match self.user_stop.try_recv() {
                Ok(()) => StopReason::UserRequest,
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => return None,
            }
        };

        self.reason = Some(reason);
        self.state = CoordinatorState::from(reason);
        log::info!("stop requested ({:?})", reason);
        Some(reason)
    }

    /// Run `tick` until a stop is requested.
    ///
    /// An in-flight tick always completes; stop requests are honored between
    /// ticks.
    pub fn run(&mut self, mut tick: impl FnMut()) -> StopReason {
        loop {
            if let Some(reason) = self.poll() {
                return reason;
            }
            tick();
        }
    }

    /// Mark teardown complete.
    pub fn finish(&mut self) {
        self.state = CoordinatorState::Done;
    }
}

impl Default for ShutdownCoordinator {
    fn default() -> Self {
        Self::new()
    }
}

/// Spawn a background thread that requests a clean stop for every complete
/// line read from `input`.
///
/// Lines are raw bytes; their content, encoding included, is ignored. End of
/// input does not request a stop.
pub fn spawn_line_watcher<R>(input: R, trigger: StopTrigger) -> io::Result<thread::JoinHandle<()>>
where
    R: BufRead + Send + 'static,
{
    thread::Builder::new()
        .name("stop-line-watcher".into())
        .spawn(move || {
            for line in input.split(b'\n') {
                match line {
                    Ok(_) => {
                        if trigger.request() {
                            log::debug!("stop line received");
                        }
                    }
                    Err(e) => {
                        log::warn!("stopped watching for stop lines: {}", e);
                        return;
                    }
                }
            }
            log::debug!("stop input closed");
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    #[test]
    fn idle_poll_returns_none() {
        let mut coordinator = ShutdownCoordinator::new();
        assert_eq!(coordinator.poll(), None);
        assert!(coordinator.state().is_capturing());
    }

    #[test]
    fn user_stop_transitions_to_clean() {
        let mut coordinator = ShutdownCoordinator::new();
        assert!(coordinator.stop_trigger().request());

        assert_eq!(coordinator.poll(), Some(StopReason::UserRequest));
        assert_eq!(coordinator.state(), CoordinatorState::StoppingClean);
        // sticky
        assert_eq!(coordinator.poll(), Some(StopReason::UserRequest));
    }

    #[test]
    fn single_slot_drops_redundant_requests() {
        let coordinator = ShutdownCoordinator::new();
        let trigger = coordinator.stop_trigger();
        assert!(trigger.request());
        assert!(!trigger.request());
        assert!(!trigger.request());
    }

    #[test]
    fn signal_wins_when_both_ready() {
        let mut coordinator = ShutdownCoordinator::new();
        coordinator.stop_trigger().request();
        coordinator.signal_flag().raise();

        assert_eq!(coordinator.poll(), Some(StopReason::Signal));
        assert_eq!(coordinator.state(), CoordinatorState::StoppingSignal);
    }

    #[test]
    fn run_ticks_until_stop() {
        let mut coordinator = ShutdownCoordinator::new();
        let trigger = coordinator.stop_trigger();
        let mut ticks = 0;

        let reason = coordinator.run(|| {
            ticks += 1;
            if ticks == 5 {
                trigger.request();
            }
        });

        assert_eq!(reason, StopReason::UserRequest);
        assert_eq!(ticks, 5);
    }

    #[test]
    fn run_returns_immediately_when_already_stopped() {
        let mut coordinator = ShutdownCoordinator::new();
        coordinator.signal_flag().raise();
        let mut ticks = 0;

        assert_eq!(coordinator.run(|| ticks += 1), StopReason::Signal);
        assert_eq!(ticks, 0);

        coordinator.finish();
        assert!(coordinator.state().is_terminal());
        assert_eq!(coordinator.stop_reason(), Some(StopReason::Signal));
    }

    #[test]
    fn line_watcher_requests_stop_per_line() {
        let mut coordinator = ShutdownCoordinator::new();
        let handle =
            spawn_line_watcher(Cursor::new(b"\nagain\n".to_vec()), coordinator.stop_trigger()).unwrap();
        handle.join().unwrap();

        assert_eq!(coordinator.poll(), Some(StopReason::UserRequest));
    }

    #[test]
    fn line_watcher_eof_without_lines_does_not_stop() {
        let mut coordinator = ShutdownCoordinator::new();
        let handle = spawn_line_watcher(Cursor::new(Vec::new()), coordinator.stop_trigger()).unwrap();
        handle.join().unwrap();

        assert_eq!(coordinator.poll(), None);
    }

    #[test]
    fn line_watcher_accepts_non_utf8_line() {
        let mut coordinator = ShutdownCoordinator::new();
        let handle =
            spawn_line_watcher(Cursor::new(vec![0xff, 0xfe, b'\n']), coordinator.stop_trigger()).unwrap();
        handle.join().unwrap();

        assert_eq!(coordinator.poll(), Some(StopReason::UserRequest));
    }

    /// Yields its bytes, then fails every read and records that it did.
    struct FailingAfter {
        data: Cursor<Vec<u8>>,
        exhausted: Arc<AtomicBool>,
    }

    impl Read for FailingAfter {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.data.read(buf)? {
                0 => {
                    self.exhausted.store(true, Ordering::SeqCst);
                    Err(io::Error::other("terminal went away"))
                }
                n => Ok(n),
            }
        }
    }

    #[test]
    fn line_watcher_keeps_reading_past_invalid_bytes() {
        let mut coordinator = ShutdownCoordinator::new();
        let exhausted = Arc::new(AtomicBool::new(false));
        let input = io::BufReader::new(FailingAfter {
            data: Cursor::new(vec![0xc3, b'\n', b'\n']),
            exhausted: Arc::clone(&exhausted),
        });
        let handle = spawn_line_watcher(input, coordinator.stop_trigger()).unwrap();
        handle.join().unwrap();

        // the watcher only gave up at the read error, after every line
        assert!(exhausted.load(Ordering::SeqCst));
        assert_eq!(coordinator.poll(), Some(StopReason::UserRequest));
    }
}
