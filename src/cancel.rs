// Cooperative pause/stop control shared between the UI and worker threads.
// - Workers check the token between units and while waiting on a child process.
// - Pause blocks on a condvar instead of polling; stop always wakes waiters.
use std::{
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::{Duration, Instant},
};

#[derive(Debug, Default)]
struct Flags {
    stopped: bool,
    paused: bool,
}

#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    inner: Arc<(Mutex<Flags>, Condvar)>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stop(&self) {
        let (_, condvar) = &*self.inner;
        self.flags().stopped = true;
        condvar.notify_all();
    }

    pub fn pause(&self) {
        self.flags().paused = true;
    }

    pub fn resume(&self) {
        let (_, condvar) = &*self.inner;
        self.flags().paused = false;
        condvar.notify_all();
    }

    pub fn is_stopped(&self) -> bool {
        self.flags().stopped
    }

    pub fn is_paused(&self) -> bool {
        self.flags().paused
    }

    /// Blocks while paused. Returns false when the token was stopped.
    pub fn wait_while_paused(&self) -> bool {
        let (_, condvar) = &*self.inner;
        let mut flags = self.flags();
        while flags.paused && !flags.stopped {
            flags = condvar.wait(flags).unwrap_or_else(PoisonError::into_inner);
        }
        !flags.stopped
    }

    /// Sleeps up to `duration`. Returns false as soon as the token is stopped.
    pub fn sleep(&self, duration: Duration) -> bool {
        let (_, condvar) = &*self.inner;
        let deadline = Instant::now() + duration;
        let mut flags = self.flags();
        while !flags.stopped {
            let now = Instant::now();
            if now >= deadline {
                return true;
            }
            flags = condvar
                .wait_timeout(flags, deadline - now)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|err| err.into_inner().0);
        }
        false
    }

    fn flags(&self) -> MutexGuard<'_, Flags> {
        self.inner.0.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn stop_wakes_paused_worker() {
        let token = CancelToken::new();
        token.pause();

        let worker = {
            let token = token.clone();
            thread::spawn(move || token.wait_while_paused())
        };
        thread::sleep(Duration::from_millis(30));
        token.stop();

        assert!(!worker.join().expect("join"));
    }

    #[test]
    fn resume_releases_paused_worker() {
        let token = CancelToken::new();
        token.pause();

        let worker = {
            let token = token.clone();
            thread::spawn(move || token.wait_while_paused())
        };
        thread::sleep(Duration::from_millis(30));
        token.resume();

        assert!(worker.join().expect("join"));
    }

    #[test]
    fn sleep_is_cut_short_by_stop() {
        let token = CancelToken::new();
        let started = Instant::now();
        let sleeper = {
            let token = token.clone();
            thread::spawn(move || token.sleep(Duration::from_secs(10)))
        };
        thread::sleep(Duration::from_millis(30));
        token.stop();

        assert!(!sleeper.join().expect("join"));
        assert!(started.elapsed() < Duration::from_secs(5));
    }

    #[test]
    fn sleep_completes_without_stop() {
        assert!(CancelToken::new().sleep(Duration::from_millis(5)));
    }
}
