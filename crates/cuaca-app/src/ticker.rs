//! One-second local clock for the displayed weather card.
//!
//! At most one ticker runs at a time. Starting a new one cancels the previous;
//! [`ClockTicker::stop`] cancels without replacement.

use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio_util::sync::CancellationToken;

use cuaca_weather::local_clock_tick;

const TICK: Duration = Duration::from_secs(1);

#[derive(Debug, Default)]
pub struct ClockTicker {
    active: Mutex<Option<(CancellationToken, watch::Receiver<String>)>>,
}

impl ClockTicker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start ticking for an observation. Must be called within a tokio runtime.
    pub fn start(&self, observed_at_unix: i64, offset_seconds: i32) -> watch::Receiver<String> {
        let token = CancellationToken::new();
        let (tx, rx) = watch::channel(local_clock_tick(observed_at_unix, offset_seconds));

        if let Some((previous, _)) = self.active.lock().replace((token.clone(), rx.clone())) {
            previous.cancel();
        }

        tokio::spawn(async move {
            let mut interval = tokio::time::interval(TICK);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately; the initial value is already sent
            interval.tick().await;

            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => {
                        if tx.send(local_clock_tick(observed_at_unix, offset_seconds)).is_err() {
                            break;
                        }
                    }
                }
            }
            tracing::trace!("Clock ticker stopped");
        });

        rx
    }

    pub fn stop(&self) {
        if let Some((token, _)) = self.active.lock().take() {
            token.cancel();
        }
    }

    pub fn is_running(&self) -> bool {
        self.active
            .lock()
            .as_ref()
            .is_some_and(|(token, _)| !token.is_cancelled())
    }

    /// Receiver for the running ticker, if any
    pub fn subscribe(&self) -> Option<watch::Receiver<String>> {
        self.active.lock().as_ref().map(|(_, rx)| rx.clone())
    }
}

impl Drop for ClockTicker {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
    use super::*;

    // 2024-10-14T05:30:15Z
    const OBSERVED: i64 = 1_728_883_815;

    #[tokio::test]
    async fn test_start_sends_initial_value() {
        let ticker = ClockTicker::new();
        let rx = ticker.start(OBSERVED, 25200);
        assert_eq!(rx.borrow().len(), 8);
        assert!(ticker.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_ticks_every_second() {
        let ticker = ClockTicker::new();
        let mut rx = ticker.start(OBSERVED, 25200);
        rx.borrow_and_update();

        tokio::time::advance(Duration::from_millis(1100)).await;
        tokio::time::timeout(Duration::from_secs(5), rx.changed())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_cancels_previous() {
        let ticker = ClockTicker::new();
        let mut first = ticker.start(OBSERVED, 25200);
        let _second = ticker.start(OBSERVED, 28800);

        // The first ticker's task exits and drops its sender
        tokio::time::advance(Duration::from_secs(2)).await;
        loop {
            match tokio::time::timeout(Duration::from_secs(5), first.changed()).await {
                Ok(Ok(())) => continue,
                Ok(Err(_)) => break,
                Err(_) => panic!("previous ticker still running"),
            }
        }
        assert!(ticker.is_running());
    }

    #[tokio::test]
    async fn test_stop() {
        let ticker = ClockTicker::new();
        ticker.start(OBSERVED, 25200);
        ticker.stop();
        assert!(!ticker.is_running());
        assert!(ticker.subscribe().is_none());
    }
}
