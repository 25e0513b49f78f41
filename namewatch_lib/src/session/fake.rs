//! Scripted in-memory session for exercising the state machines.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Datelike;
use nse_api::types::SessionCookie;

use super::{PagerCell, RenderSession, RowRead, SessionError, SessionFactory};
use crate::config::{Pacing, RunConfig, Timeouts};
use crate::error_page::ERROR_MARKER;
use crate::retry::RetryPolicy;

/// How a [`FakeSession`] behaves.
#[derive(Debug, Clone)]
pub(crate) struct FakeScript {
    pub has_form: bool,
    pub year_options: Vec<String>,
    pub error_on_load: bool,
    pub error_after_submit: bool,
    pub body_unreadable: bool,
    pub never_ready: bool,
    pub table_appears: bool,
    pub pages: Vec<Vec<RowRead>>,
    pub caption: Option<String>,
    pub reverse_links: bool,
    /// 1-based page on which clicking "next" fails.
    pub fail_click_on_page: Option<usize>,
    /// Number of row reads that fail before reads succeed.
    pub row_failures: usize,
    pub cookies: Vec<SessionCookie>,
    pub user_agent: String,
}

impl Default for FakeScript {
    fn default() -> Self {
        let year = chrono::Local::now().year();
        Self {
            has_form: true,
            year_options: vec![(year - 1).to_string(), year.to_string()],
            error_on_load: false,
            error_after_submit: false,
            body_unreadable: false,
            never_ready: false,
            table_appears: true,
            pages: vec![Vec::new()],
            caption: None,
            reverse_links: false,
            fail_click_on_page: None,
            row_failures: 0,
            cookies: vec![SessionCookie::new("nsit", "fake")],
            user_agent: "FakeAgent/1.0".to_string(),
        }
    }
}

#[derive(Debug, Default)]
pub(crate) struct FakeState {
    pub submitted: bool,
    /// 0-based page index.
    pub current: usize,
    pub row_reads: Vec<usize>,
    pub next_clicks: usize,
    pub navigations: Vec<String>,
    pub selected: Vec<String>,
    pub closed: bool,
    row_failures_left: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct FakeSession {
    script: Arc<FakeScript>,
    state: Arc<Mutex<FakeState>>,
}

impl FakeSession {
    pub fn new(script: FakeScript) -> Self {
        let state = FakeState {
            row_reads: vec![0; script.pages.len().max(1)],
            row_failures_left: script.row_failures,
            ..FakeState::default()
        };
        Self {
            script: Arc::new(script),
            state: Arc::new(Mutex::new(state)),
        }
    }

    /// A session already showing the results grid.
    pub fn on_results(script: FakeScript) -> Self {
        let session = Self::new(script);
        session.state().submitted = true;
        session
    }

    pub fn state(&self) -> MutexGuard<'_, FakeState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn table_visible(&self, state: &FakeState) -> bool {
        state.submitted && self.script.table_appears && !self.script.error_after_submit
    }

    fn page_count(&self) -> usize {
        self.script.pages.len()
    }

    fn link_labels(&self, current: usize) -> Vec<String> {
        let mut labels: Vec<String> = (1..=self.page_count())
            .filter(|p| *p != current + 1)
            .map(|p| p.to_string())
            .collect();
        if self.script.reverse_links {
            labels.reverse();
        }
        labels
    }
}

#[async_trait]
impl RenderSession for FakeSession {
    async fn navigate(&self, url: &str) -> Result<(), SessionError> {
        let mut state = self.state();
        state.navigations.push(url.to_string());
        Ok(())
    }

    async fn run_script(&self, script: &str) -> Result<serde_json::Value, SessionError> {
        if script.contains("readyState") {
            let state = if self.script.never_ready { "loading" } else { "complete" };
            return Ok(serde_json::Value::from(state));
        }
        if script.contains("scrollHeight") {
            return Ok(serde_json::Value::from(0));
        }
        Ok(serde_json::Value::Null)
    }

    async fn cookies(&self) -> Result<Vec<SessionCookie>, SessionError> {
        Ok(self.script.cookies.clone())
    }

    async fn current_user_agent(&self) -> Result<String, SessionError> {
        Ok(self.script.user_agent.clone())
    }

    async fn element_exists(&self, selector: &str) -> Result<bool, SessionError> {
        let state = self.state();
        let form_visible = self.script.has_form && !self.script.error_on_load;
        Ok(if selector.contains("ddlYear") || selector.contains("btnSubmit") {
            form_visible
        } else if selector.contains("gvData") {
            self.table_visible(&state)
        } else {
            false
        })
    }

    async fn element_text(&self, selector: &str) -> Result<Option<String>, SessionError> {
        let state = self.state();
        if selector.contains("tr.pgr") && self.table_visible(&state) {
            return Ok(self.script.caption.clone());
        }
        Ok(None)
    }

    async fn body_text(&self) -> Result<String, SessionError> {
        if self.script.body_unreadable {
            return Err(SessionError::Script("Execution context was destroyed".into()));
        }
        let state = self.state();
        if self.script.error_on_load || (state.submitted && self.script.error_after_submit) {
            Ok(format!("Error\n{}.\nPlease try again.", ERROR_MARKER))
        } else {
            Ok("Corporates\nCompany Name Change".to_string())
        }
    }

    async fn select_option(&self, selector: &str, value: &str) -> Result<bool, SessionError> {
        if !self.script.has_form {
            return Err(SessionError::ElementNotFound(selector.to_string()));
        }
        let mut state = self.state();
        state.selected.push(value.to_string());
        Ok(self.script.year_options.iter().any(|y| y == value))
    }

    async fn click(&self, selector: &str) -> Result<(), SessionError> {
        if selector.contains("btnSubmit") && self.script.has_form {
            self.state().submitted = true;
            return Ok(());
        }
        Err(SessionError::ElementNotFound(selector.to_string()))
    }

    async fn table_rows(&self, _table_selector: &str) -> Result<Vec<RowRead>, SessionError> {
        let mut state = self.state();
        if !self.table_visible(&state) {
            return Ok(Vec::new());
        }
        if state.row_failures_left > 0 {
            state.row_failures_left -= 1;
            return Err(SessionError::Script("table node detached".into()));
        }
        let current = state.current;
        state.row_reads[current] += 1;
        Ok(self.script.pages.get(current).cloned().unwrap_or_default())
    }

    async fn pager_cells(&self, _selector: &str) -> Result<Vec<PagerCell>, SessionError> {
        let state = self.state();
        if !self.table_visible(&state) || self.page_count() <= 1 {
            return Ok(Vec::new());
        }
        let current_label = (state.current + 1).to_string();
        let mut cells: Vec<PagerCell> = self
            .link_labels(state.current)
            .into_iter()
            .map(PagerCell::Link)
            .collect();
        // The current page's label sits at its natural position.
        let pos = if self.script.reverse_links {
            self.page_count() - 1 - state.current
        } else {
            state.current
        };
        cells.insert(pos, PagerCell::Current(current_label));
        Ok(cells)
    }

    async fn click_pager_link(&self, selector: &str, index: usize) -> Result<(), SessionError> {
        let mut state = self.state();
        if self.script.fail_click_on_page == Some(state.current + 1) {
            return Err(SessionError::StaleElement(format!("{} link {}", selector, index)));
        }
        let labels = self.link_labels(state.current);
        let label = labels
            .get(index)
            .ok_or_else(|| SessionError::ElementNotFound(format!("{} link {}", selector, index)))?;
        let page: usize = label
            .parse()
            .map_err(|_| SessionError::Script(format!("bad label {}", label)))?;
        state.current = page - 1;
        state.next_clicks += 1;
        Ok(())
    }

    async fn close(&self) {
        self.state().closed = true;
    }
}

/// Hands out pre-scripted sessions in order.
pub(crate) struct FakeFactory {
    sessions: Mutex<VecDeque<FakeSession>>,
    opened: AtomicUsize,
}

impl FakeFactory {
    pub fn new(sessions: Vec<FakeSession>) -> Self {
        Self {
            sessions: Mutex::new(sessions.into()),
            opened: AtomicUsize::new(0),
        }
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SessionFactory for FakeFactory {
    type Session = FakeSession;

    async fn open(&self) -> Result<FakeSession, SessionError> {
        let next = self
            .sessions
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front();
        match next {
            Some(session) => {
                self.opened.fetch_add(1, Ordering::SeqCst);
                Ok(session)
            }
            None => Err(SessionError::Launch("no scripted session left".into())),
        }
    }
}

/// Rows for a synthetic results page: header, data rows, pager.
pub(crate) fn results_page(rows: &[[&str; 4]]) -> Vec<RowRead> {
    let mut page = vec![RowRead::cells(
        "TTHeader",
        &["Security Code", "Old Name", "New Name", "Date"],
    )];
    for row in rows {
        page.push(RowRead::cells("", row));
    }
    page.push(RowRead::cells("pgr", &["1 2 3"]));
    page
}

/// Production config with every pause removed and short timeouts.
pub(crate) fn quick_config() -> RunConfig {
    RunConfig {
        timeouts: Timeouts {
            settle: Duration::from_millis(20),
            form: Duration::from_millis(20),
            table: Duration::from_millis(20),
            page_table: Duration::from_millis(20),
            poll: Duration::from_millis(1),
        },
        pacing: Pacing::none(),
        retry: RetryPolicy::immediate(3),
        ..RunConfig::default()
    }
}
