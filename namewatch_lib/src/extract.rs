//! One extraction pass over the name-change grid, restarting the browser
//! session when the server breaks it.

use tracing::{error, info, warn};

use crate::config::RunConfig;
use crate::error::NameWatchError;
use crate::error_page::is_error_page;
use crate::form::FormDriver;
use crate::pagination::{PaginationOutcome, Paginator};
use crate::rows::RowExtractor;
use crate::session::{RenderSession, SessionFactory};
use crate::waiter::Waiter;

pub struct BseExtractor<F> {
    factory: F,
    url: String,
    max_sessions: usize,
    waiter: Waiter,
    form: FormDriver,
    paginator: Paginator,
}

impl<F: SessionFactory> BseExtractor<F> {
    pub fn new(factory: F, config: &RunConfig) -> Self {
        let waiter = Waiter::new(&config.timeouts, &config.pacing);
        let rows = RowExtractor::new(config.selectors.clone(), config.timeouts, waiter.clone());
        let form = FormDriver::new(
            config.selectors.clone(),
            config.timeouts,
            config.pacing,
            waiter.clone(),
        );
        let paginator = Paginator::new(
            config.selectors.clone(),
            config.pacing,
            config.retry,
            waiter.clone(),
            rows,
        );
        Self {
            factory,
            url: config.bse_url.clone(),
            max_sessions: config.max_session_attempts.max(1),
            waiter,
            form,
            paginator,
        }
    }

    /// Extracts every name change listed for `year`.
    ///
    /// Interstitials and table-load timeouts discard the session and start
    /// over with a fresh one, at most `max_session_attempts` sessions in
    /// total. Every opened session is closed before this returns.
    pub async fn run(&self, year: i32) -> Result<PaginationOutcome, NameWatchError> {
        let mut attempt = 0usize;
        loop {
            attempt += 1;
            info!("Opening browser session {}/{}", attempt, self.max_sessions);
            let session = self.factory.open().await?;
            let result = self.run_session(&session, year).await;
            session.close().await;

            match result {
                Ok(outcome) => return Ok(outcome),
                Err(e) if e.is_restartable() && attempt < self.max_sessions => {
                    warn!("Session {} failed ({}), restarting", attempt, e);
                }
                Err(e) => {
                    error!("Extraction failed after {} session(s): {}", attempt, e);
                    return Err(e);
                }
            }
        }
    }

    async fn run_session<S>(&self, session: &S, year: i32) -> Result<PaginationOutcome, NameWatchError>
    where
        S: RenderSession + ?Sized,
    {
        session.navigate(&self.url).await?;
        self.waiter.browse(session).await;
        if is_error_page(session).await {
            warn!("Landing page is the server error page");
            return Err(NameWatchError::ServerInterstitial);
        }
        self.form.submit(session, year).await?;
        Ok(self.paginator.collect(session).await)
    }
}
