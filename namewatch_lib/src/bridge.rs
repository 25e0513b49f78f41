//! Borrows a browser session's cookies and user agent for plain HTTP
//! symbol lookups against NSE.

use nse_api::types::SessionCredentials;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::config::RunConfig;
use crate::error::NameWatchError;
use crate::record::{LookupOutcome, Record, SymbolLookup};
use crate::session::{RenderSession, SessionFactory};
use crate::waiter::Waiter;

pub struct SessionBridge<F> {
    factory: F,
    client: nse_api::Client,
    landing_url: String,
    waiter: Waiter,
    refresh_probability: f64,
}

impl<F: SessionFactory> SessionBridge<F> {
    pub fn new(factory: F, config: &RunConfig) -> Self {
        let client = nse_api::Client::with_base_url(&config.nse_url)
            .with_search_path(&config.nse_search_path);
        Self {
            factory,
            client,
            landing_url: config.nse_url.clone(),
            waiter: Waiter::new(&config.timeouts, &config.pacing),
            refresh_probability: refresh_chance(config.refresh_probability),
        }
    }

    /// Looks up the new name of every record, one request at a time.
    ///
    /// Fails only when the browser session cannot be established; a failed
    /// lookup yields [`LookupOutcome::Failed`] for that record and the loop
    /// moves on. The session is closed on every path.
    pub async fn resolve_all(&self, records: &[Record]) -> Result<Vec<SymbolLookup>, NameWatchError> {
        let session = self.factory.open().await?;
        let result = self.resolve_with(&session, records).await;
        session.close().await;
        result
    }

    async fn resolve_with<S>(
        &self,
        session: &S,
        records: &[Record],
    ) -> Result<Vec<SymbolLookup>, NameWatchError>
    where
        S: RenderSession + ?Sized,
    {
        let mut credentials = self.harvest(session).await?;
        let mut lookups = Vec::with_capacity(records.len());

        for record in records {
            let outcome = match self.client.find_symbol(&record.new_name, &credentials).await {
                Ok(Some(symbol)) => {
                    info!("{} -> {}", record.new_name, symbol);
                    LookupOutcome::Resolved(symbol)
                }
                Ok(None) => {
                    info!("No exact match for {}", record.new_name);
                    LookupOutcome::NoMatch
                }
                Err(e) => {
                    warn!("Lookup for {} failed: {}", record.new_name, NameWatchError::from(e));
                    LookupOutcome::Failed
                }
            };
            lookups.push(SymbolLookup {
                security_code: record.security_code.clone(),
                outcome,
            });

            let refresh = rand::thread_rng().gen_bool(self.refresh_probability);
            if refresh {
                debug!("Refreshing NSE session");
                match self.harvest(session).await {
                    Ok(fresh) => credentials = fresh,
                    Err(e) => warn!("Session refresh failed, keeping previous credentials: {}", e),
                }
            }
        }
        Ok(lookups)
    }

    /// Visits the landing page and captures what the search API checks.
    async fn harvest<S>(&self, session: &S) -> Result<SessionCredentials, NameWatchError>
    where
        S: RenderSession + ?Sized,
    {
        session.navigate(&self.landing_url).await?;
        if let Err(e) = self.waiter.await_settled(session).await {
            warn!("NSE landing page settle timed out: {}", e);
        }
        let cookies = session.cookies().await?;
        let user_agent = session.current_user_agent().await?;
        info!("Captured {} NSE cookie(s)", cookies.len());
        Ok(SessionCredentials::new(cookies, user_agent))
    }
}

/// A usable `gen_bool` probability; non-finite input disables refreshes.
fn refresh_chance(p: f64) -> f64 {
    if p.is_finite() {
        p.clamp(0.0, 1.0)
    } else {
        0.0
    }
}
