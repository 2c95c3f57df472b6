//! Cooperative stop signal shared by a fleet and all of its drivers.
//!
//! Drivers check the signal before every backend call and race it against
//! every sleep, so a stop request ends a trip within one step. Backend calls
//! already in flight are allowed to finish.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::watch;

/// Returned by a wait or check that observed a stop request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("stop requested")]
pub struct Stopped;

/// Sending half; owned by whoever decides when the fleet shuts down.
#[derive(Debug)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

/// Receiving half; cheap to clone, one per driver.
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

pub fn stop_channel() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }

    pub fn signal(&self) -> StopSignal {
        StopSignal {
            rx: self.tx.subscribe(),
        }
    }
}

impl StopSignal {
    /// A signal that never fires.
    pub fn never() -> Self {
        let (_tx, rx) = watch::channel(false);
        Self { rx }
    }

    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    pub fn check(&self) -> Result<(), Stopped> {
        if self.is_stopped() {
            Err(Stopped)
        } else {
            Ok(())
        }
    }

    /// Resolves once a stop is requested. Pends forever if the handle is
    /// dropped without stopping.
    pub async fn stopped(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|stopped| *stopped).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleep for `duration` unless a stop arrives first.
    pub async fn sleep(&self, duration: Duration) -> Result<(), Stopped> {
        self.check()?;
        tokio::select! {
            _ = tokio::time::sleep(duration) => Ok(()),
            _ = self.stopped() => Err(Stopped),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn sleep_completes_without_stop() {
        let (_handle, signal) = stop_channel();
        let start = tokio::time::Instant::now();
        assert_eq!(signal.sleep(Duration::from_secs(30)).await, Ok(()));
        assert_eq!(start.elapsed(), Duration::from_secs(30));
    }

    #[tokio::test(start_paused = true)]
    async fn stop_interrupts_sleep() {
        let (handle, signal) = stop_channel();
        let sleeper = tokio::spawn({
            let signal = signal.clone();
            async move { signal.sleep(Duration::from_secs(300)).await }
        });
        tokio::time::sleep(Duration::from_secs(5)).await;
        handle.stop();
        assert_eq!(sleeper.await.expect("join"), Err(Stopped));
        assert_eq!(signal.check(), Err(Stopped));
    }

    #[tokio::test(start_paused = true)]
    async fn never_signal_outlives_its_handle() {
        let signal = StopSignal::never();
        assert!(!signal.is_stopped());
        assert_eq!(signal.sleep(Duration::from_secs(1)).await, Ok(()));
    }

    #[test]
    fn subscribed_signal_sees_earlier_stop() {
        let (handle, _signal) = stop_channel();
        handle.stop();
        assert!(handle.signal().is_stopped());
    }
}
