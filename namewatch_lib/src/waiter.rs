//! Waiting for pages to settle and elements to appear.

use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use crate::config::{Jitter, Pacing, Timeouts};
use crate::session::RenderSession;

/// A bounded wait ran out of time.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("timed out after {:.1}s waiting for {what}", .waited.as_secs_f64())]
pub struct WaitTimeout {
    pub what: String,
    pub waited: Duration,
}

impl WaitTimeout {
    pub fn new(what: impl Into<String>, waited: Duration) -> Self {
        Self {
            what: what.into(),
            waited,
        }
    }
}

/// Polls a session until it is ready, then dwells like a reader would.
#[derive(Debug, Clone)]
pub struct Waiter {
    settle_timeout: Duration,
    poll: Duration,
    dwell: Jitter,
    scroll_pause: Jitter,
    scroll: bool,
}

impl Waiter {
    pub fn new(timeouts: &Timeouts, pacing: &Pacing) -> Self {
        Self {
            settle_timeout: timeouts.settle,
            poll: timeouts.poll,
            dwell: pacing.settle_dwell,
            scroll_pause: pacing.scroll_pause,
            scroll: pacing.scroll,
        }
    }

    /// Waits for `document.readyState == "complete"`, then idles a random
    /// dwell. Many pages keep loading content after the ready signal, so the
    /// dwell is applied even when readiness timed out.
    pub async fn await_settled<S>(&self, session: &S) -> Result<(), WaitTimeout>
    where
        S: RenderSession + ?Sized,
    {
        let start = Instant::now();
        let ready = loop {
            match session.run_script("document.readyState").await {
                Ok(state) if state.as_str() == Some("complete") => break true,
                Ok(_) => {}
                Err(e) => debug!("readyState probe failed: {}", e),
            }
            if start.elapsed() >= self.settle_timeout {
                break false;
            }
            tokio::time::sleep(self.poll).await;
        };
        self.dwell.pause().await;
        if ready {
            Ok(())
        } else {
            Err(WaitTimeout::new("document ready", start.elapsed()))
        }
    }

    /// Settles (soft) and then scrolls through the page.
    pub async fn browse<S>(&self, session: &S)
    where
        S: RenderSession + ?Sized,
    {
        if let Err(e) = self.await_settled(session).await {
            warn!("Page load wait timed out: {}", e);
        }
        self.scroll_page(session).await;
    }

    /// Polls until `selector` matches or `timeout` elapses. Probe failures
    /// count as "not there yet".
    pub async fn wait_for_element<S>(
        &self,
        session: &S,
        selector: &str,
        timeout: Duration,
    ) -> Result<(), WaitTimeout>
    where
        S: RenderSession + ?Sized,
    {
        let start = Instant::now();
        loop {
            match session.element_exists(selector).await {
                Ok(true) => return Ok(()),
                Ok(false) => {}
                Err(e) => debug!("probe for {} failed: {}", selector, e),
            }
            if start.elapsed() >= timeout {
                return Err(WaitTimeout::new(selector, start.elapsed()));
            }
            tokio::time::sleep(self.poll).await;
        }
    }

    /// Scrolls to the bottom in random 100-300px steps.
    pub async fn scroll_page<S>(&self, session: &S)
    where
        S: RenderSession + ?Sized,
    {
        if !self.scroll {
            return;
        }
        let height = match session.run_script("document.body.scrollHeight").await {
            Ok(v) => v.as_u64().unwrap_or(0),
            Err(e) => {
                debug!("could not read scroll height: {}", e);
                return;
            }
        };
        let step = {
            use rand::Rng;
            rand::thread_rng().gen_range(100..=300u64)
        };
        let mut y = 1;
        while y < height {
            if let Err(e) = session.run_script(&format!("window.scrollTo(0, {});", y)).await {
                debug!("scroll interrupted: {}", e);
                return;
            }
            self.scroll_pause.pause().await;
            y += step;
        }
    }
}
