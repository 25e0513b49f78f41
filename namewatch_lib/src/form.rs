//! Drives the year selector and submit button of the name-change form.

use tracing::{debug, info, warn};

use crate::config::{BseSelectors, Pacing, Timeouts};
use crate::error::{FormError, NameWatchError};
use crate::error_page::is_error_page;
use crate::session::{RenderSession, SessionError};
use crate::waiter::Waiter;

/// Progress through one form submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormState {
    Start,
    YearSelectorFound,
    YearSelected,
    SubmitClicked,
    TablePresent,
}

#[derive(Debug, Clone)]
pub struct FormDriver {
    selectors: BseSelectors,
    timeouts: Timeouts,
    pacing: Pacing,
    waiter: Waiter,
}

impl FormDriver {
    pub fn new(selectors: BseSelectors, timeouts: Timeouts, pacing: Pacing, waiter: Waiter) -> Self {
        Self {
            selectors,
            timeouts,
            pacing,
            waiter,
        }
    }

    /// Submits the form for `year` and waits for the results table.
    ///
    /// Errors: `ServerInterstitial` when the server answers with its error
    /// page at any step, `FatalForm` when a control is missing or the year is
    /// not offered, `TableLoadTimeout` when the grid never renders.
    pub async fn submit<S>(&self, session: &S, year: i32) -> Result<FormState, NameWatchError>
    where
        S: RenderSession + ?Sized,
    {
        let mut state = FormState::Start;
        debug!(?state, year, "submitting name-change form");

        if self
            .waiter
            .wait_for_element(session, &self.selectors.year_select, self.timeouts.form)
            .await
            .is_err()
        {
            let missing = FormError::ElementNotFound(self.selectors.year_select.clone());
            return Err(self.interstitial_or(session, missing.into()).await);
        }
        state = FormState::YearSelectorFound;
        debug!(?state);

        let offered = session
            .select_option(&self.selectors.year_select, &year.to_string())
            .await
            .map_err(|e| self.form_error(e))?;
        if !offered {
            return Err(FormError::UnsupportedYear(year).into());
        }
        state = FormState::YearSelected;
        debug!(?state);

        self.pacing.form_pause.pause().await;
        self.waiter
            .wait_for_element(session, &self.selectors.submit, self.timeouts.form)
            .await
            .map_err(|_| FormError::ElementNotFound(self.selectors.submit.clone()))?;
        session
            .click(&self.selectors.submit)
            .await
            .map_err(|e| self.form_error(e))?;
        state = FormState::SubmitClicked;
        debug!(?state);

        self.pacing.postback.pause().await;
        if let Err(e) = self.waiter.await_settled(session).await {
            warn!("Postback settle timed out: {}", e);
        }
        if is_error_page(session).await {
            warn!("Server returned its error page after submit");
            return Err(NameWatchError::ServerInterstitial);
        }

        if self
            .waiter
            .wait_for_element(session, &self.selectors.table, self.timeouts.table)
            .await
            .is_err()
        {
            return Err(self.interstitial_or(session, NameWatchError::TableLoadTimeout).await);
        }
        state = FormState::TablePresent;
        info!("Results table loaded for {}", year);
        Ok(state)
    }

    async fn interstitial_or<S>(&self, session: &S, otherwise: NameWatchError) -> NameWatchError
    where
        S: RenderSession + ?Sized,
    {
        if is_error_page(session).await {
            NameWatchError::ServerInterstitial
        } else {
            otherwise
        }
    }

    fn form_error(&self, e: SessionError) -> NameWatchError {
        match e {
            SessionError::ElementNotFound(sel) => FormError::ElementNotFound(sel).into(),
            other => other.into(),
        }
    }
}
