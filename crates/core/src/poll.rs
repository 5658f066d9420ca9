use std::future::Future;
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

/// A periodic task with explicit start/stop/pause transitions, replacing the
/// old visibility-tied browser timers. At most one task runs per poller: any
/// previous handle is aborted before a new one is spawned.
#[derive(Debug)]
pub struct Poller {
    name: &'static str,
    period: Duration,
    visible: watch::Sender<bool>,
    handle: Option<JoinHandle<()>>,
}

impl Poller {
    pub fn new(name: &'static str, period: Duration) -> Self {
        let (visible, _) = watch::channel(true);
        Self {
            name,
            period,
            visible,
            handle: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.as_ref().map(|h| !h.is_finished()).unwrap_or(false)
    }

    /// Spawns the poll loop. Ticks are skipped while hidden; a tick error is
    /// logged and the loop keeps going (the next poll overwrites whatever
    /// the failed one left behind).
    pub fn start<F, Fut>(&mut self, mut tick: F)
    where
        F: FnMut() -> Fut + Send + 'static,
        Fut: Future<Output = anyhow::Result<()>> + Send,
    {
        self.stop();

        let name = self.name;
        let period = self.period;
        let mut rx = self.visible.subscribe();

        self.handle = Some(tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                interval.tick().await;

                if !*rx.borrow() {
                    // Hidden: park until resumed instead of burning ticks.
                    if rx.wait_for(|v| *v).await.is_err() {
                        break;
                    }
                    interval.reset();
                }

                if let Err(err) = tick().await {
                    tracing::warn!(poller = name, error = %err, "poll tick failed");
                }
            }
        }));
    }

    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
        }
    }

    pub fn pause(&mut self) {
        self.visible.send_replace(false);
    }

    pub fn resume(&mut self) {
        self.visible.send_replace(true);
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible.send_replace(visible);
    }
}

impl Drop for Poller {
    fn drop(&mut self) {
        self.stop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test(start_paused = true)]
    async fn ticks_while_visible() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new("test", Duration::from_secs(1));

        let c = count.clone();
        poller.start(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert!(count.load(Ordering::SeqCst) >= 3);

        poller.stop();
        assert!(!poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn pause_gates_ticks_until_resume() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new("test", Duration::from_secs(1));
        poller.pause();

        let c = count.clone();
        poller.start(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        poller.resume();
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert!(count.load(Ordering::SeqCst) >= 1);
    }

    #[tokio::test(start_paused = true)]
    async fn restart_replaces_previous_task() {
        let first = Arc::new(AtomicUsize::new(0));
        let second = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new("test", Duration::from_secs(1));

        let c = first.clone();
        poller.start(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });
        tokio::time::sleep(Duration::from_millis(1500)).await;

        let c = second.clone();
        poller.start(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }
        });

        let frozen = first.load(Ordering::SeqCst);
        tokio::time::sleep(Duration::from_secs(3)).await;
        assert_eq!(first.load(Ordering::SeqCst), frozen);
        assert!(second.load(Ordering::SeqCst) >= 2);
    }

    #[tokio::test(start_paused = true)]
    async fn tick_errors_do_not_stop_the_loop() {
        let count = Arc::new(AtomicUsize::new(0));
        let mut poller = Poller::new("test", Duration::from_secs(1));

        let c = count.clone();
        poller.start(move || {
            let c = c.clone();
            async move {
                c.fetch_add(1, Ordering::SeqCst);
                anyhow::bail!("gateway down")
            }
        });

        tokio::time::sleep(Duration::from_millis(3500)).await;
        assert!(count.load(Ordering::SeqCst) >= 3);
    }
}
