//! Run configuration, read from `NAMEWATCH_*` environment variables with
//! production defaults.

use std::path::PathBuf;
use std::time::Duration;

use rand::Rng;

use crate::retry::RetryPolicy;

/// Company name-change form on BSE.
pub const DEFAULT_BSE_URL: &str = "https://www.bseindia.com/corporates/Comp_Name.aspx";
/// NSE landing page; visiting it issues the cookies the search API wants.
pub const DEFAULT_NSE_URL: &str = "https://www.nseindia.com";
pub const DEFAULT_OUTPUT: &str = "bse_name_changes.json";

/// A randomized pause drawn uniformly from `[min, max]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Jitter {
    pub min: Duration,
    pub max: Duration,
}

impl Jitter {
    pub const fn new(min: Duration, max: Duration) -> Self {
        Self { min, max }
    }

    pub const fn secs(min: u64, max: u64) -> Self {
        Self::new(Duration::from_secs(min), Duration::from_secs(max))
    }

    pub const fn millis(min: u64, max: u64) -> Self {
        Self::new(Duration::from_millis(min), Duration::from_millis(max))
    }

    pub const fn none() -> Self {
        Self::new(Duration::ZERO, Duration::ZERO)
    }

    pub fn sample(&self) -> Duration {
        if self.max <= self.min {
            return self.min;
        }
        let secs = rand::thread_rng().gen_range(self.min.as_secs_f64()..=self.max.as_secs_f64());
        Duration::from_secs_f64(secs)
    }

    pub async fn pause(&self) {
        let dur = self.sample();
        if !dur.is_zero() {
            tokio::time::sleep(dur).await;
        }
    }
}

/// Browser launch options.
#[derive(Debug, Clone)]
pub struct BrowserSettings {
    pub headless: bool,
    /// Chrome binary; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    pub window_width: u32,
    pub window_height: u32,
}

impl Default for BrowserSettings {
    fn default() -> Self {
        Self {
            headless: true,
            chrome_path: None,
            window_width: 1920,
            window_height: 1080,
        }
    }
}

/// Structural markers of the BSE form and results grid.
#[derive(Debug, Clone)]
pub struct BseSelectors {
    pub year_select: String,
    pub submit: String,
    pub table: String,
    pub pager_cells: String,
    pub pager_caption: String,
    pub header_class: String,
    pub pager_class: String,
}

impl Default for BseSelectors {
    fn default() -> Self {
        Self {
            year_select: "#ContentPlaceHolder1_ddlYear".to_string(),
            submit: "#ContentPlaceHolder1_btnSubmit".to_string(),
            table: "#ContentPlaceHolder1_gvData".to_string(),
            pager_cells: "#ContentPlaceHolder1_gvData tr.pgr td table tr td".to_string(),
            pager_caption: "#ContentPlaceHolder1_gvData tr.pgr".to_string(),
            header_class: "TTHeader".to_string(),
            pager_class: "pgr".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Timeouts {
    /// Readiness polling after a navigation.
    pub settle: Duration,
    /// Year selector and submit control.
    pub form: Duration,
    /// Results table after the postback.
    pub table: Duration,
    /// Results table on an already-loaded page.
    pub page_table: Duration,
    pub poll: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            settle: Duration::from_secs(30),
            form: Duration::from_secs(30),
            table: Duration::from_secs(60),
            page_table: Duration::from_secs(30),
            poll: Duration::from_millis(500),
        }
    }
}

/// Human-looking dwell times between actions.
#[derive(Debug, Clone, Copy)]
pub struct Pacing {
    /// Idle after the document reports ready.
    pub settle_dwell: Jitter,
    /// Between choosing the year and submitting.
    pub form_pause: Jitter,
    /// After submitting, before checking for the table.
    pub postback: Jitter,
    /// After clicking a pager link.
    pub page_turn: Jitter,
    /// Between scroll steps; scrolling is skipped when `scroll` is false.
    pub scroll_pause: Jitter,
    pub scroll: bool,
}

impl Default for Pacing {
    fn default() -> Self {
        Self {
            settle_dwell: Jitter::secs(3, 6),
            form_pause: Jitter::secs(2, 4),
            postback: Jitter::secs(8, 12),
            page_turn: Jitter::secs(4, 7),
            scroll_pause: Jitter::millis(100, 300),
            scroll: true,
        }
    }
}

impl Pacing {
    /// No pauses and no scrolling.
    pub fn none() -> Self {
        Self {
            settle_dwell: Jitter::none(),
            form_pause: Jitter::none(),
            postback: Jitter::none(),
            page_turn: Jitter::none(),
            scroll_pause: Jitter::none(),
            scroll: false,
        }
    }
}

/// Everything one invocation needs.
#[derive(Debug, Clone)]
pub struct RunConfig {
    pub bse_url: String,
    pub nse_url: String,
    pub nse_search_path: String,
    pub output_path: PathBuf,
    pub browser: BrowserSettings,
    pub selectors: BseSelectors,
    pub timeouts: Timeouts,
    pub pacing: Pacing,
    /// Applied to single-page row extraction.
    pub retry: RetryPolicy,
    /// Fresh browser sessions allowed for one extraction.
    pub max_session_attempts: usize,
    /// Chance of re-visiting the NSE landing page after each lookup.
    pub refresh_probability: f64,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            bse_url: DEFAULT_BSE_URL.to_string(),
            nse_url: DEFAULT_NSE_URL.to_string(),
            nse_search_path: nse_api::DEFAULT_SEARCH_PATH.to_string(),
            output_path: PathBuf::from(DEFAULT_OUTPUT),
            browser: BrowserSettings::default(),
            selectors: BseSelectors::default(),
            timeouts: Timeouts::default(),
            pacing: Pacing::default(),
            retry: RetryPolicy::default(),
            max_session_attempts: 3,
            refresh_probability: 0.2,
        }
    }
}

impl RunConfig {
    /// Defaults overridden by any `NAMEWATCH_*` variables that are set and
    /// parse.
    pub fn from_env() -> Self {
        let d = Self::default();
        let timeouts = Timeouts {
            settle: env_secs("NAMEWATCH_SETTLE_TIMEOUT_SECS", d.timeouts.settle),
            form: env_secs("NAMEWATCH_FORM_TIMEOUT_SECS", d.timeouts.form),
            table: env_secs("NAMEWATCH_TABLE_TIMEOUT_SECS", d.timeouts.table),
            ..d.timeouts
        };
        let pacing = Pacing {
            settle_dwell: env_jitter("NAMEWATCH_SETTLE_DWELL_MS", d.pacing.settle_dwell),
            form_pause: env_jitter("NAMEWATCH_FORM_PAUSE_MS", d.pacing.form_pause),
            postback: env_jitter("NAMEWATCH_POSTBACK_MS", d.pacing.postback),
            page_turn: env_jitter("NAMEWATCH_PAGE_TURN_MS", d.pacing.page_turn),
            scroll: env_bool("NAMEWATCH_SCROLL", d.pacing.scroll),
            ..d.pacing
        };
        Self {
            bse_url: env_string("NAMEWATCH_BSE_URL", &d.bse_url),
            nse_url: env_string("NAMEWATCH_NSE_URL", &d.nse_url),
            nse_search_path: env_string("NAMEWATCH_NSE_SEARCH_PATH", &d.nse_search_path),
            output_path: std::env::var("NAMEWATCH_OUTPUT")
                .map(PathBuf::from)
                .unwrap_or(d.output_path),
            browser: BrowserSettings {
                headless: env_bool("NAMEWATCH_HEADLESS", d.browser.headless),
                chrome_path: std::env::var("NAMEWATCH_CHROME").ok().map(PathBuf::from),
                ..d.browser
            },
            selectors: d.selectors,
            timeouts,
            pacing,
            retry: RetryPolicy {
                max_attempts: env_usize("NAMEWATCH_RETRY_MAX", d.retry.max_attempts),
                delay: Duration::from_millis(env_u64(
                    "NAMEWATCH_RETRY_DELAY_MS",
                    d.retry.delay.as_millis() as u64,
                )),
            },
            max_session_attempts: env_usize("NAMEWATCH_SESSION_ATTEMPTS", d.max_session_attempts),
            refresh_probability: env_f64("NAMEWATCH_REFRESH_PROBABILITY", d.refresh_probability)
                .clamp(0.0, 1.0),
        }
    }
}

fn env_string(key: &str, default: &str) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .unwrap_or_else(|| default.to_string())
}

fn env_u64(key: &str, default: u64) -> u64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<u64>().ok())
        .unwrap_or(default)
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<usize>().ok())
        .unwrap_or(default)
}

fn env_f64(key: &str, default: f64) -> f64 {
    std::env::var(key)
        .ok()
        .and_then(|val| val.parse::<f64>().ok())
        .filter(|v| v.is_finite())
        .unwrap_or(default)
}

fn env_secs(key: &str, default: Duration) -> Duration {
    Duration::from_secs(env_u64(key, default.as_secs()))
}

/// Parses `MIN-MAX` in milliseconds, e.g. `8000-12000`.
fn env_jitter(key: &str, default: Jitter) -> Jitter {
    std::env::var(key)
        .ok()
        .and_then(|val| parse_jitter_ms(&val))
        .unwrap_or(default)
}

fn parse_jitter_ms(val: &str) -> Option<Jitter> {
    let (min, max) = val.split_once('-')?;
    let min = min.trim().parse::<u64>().ok()?;
    let max = max.trim().parse::<u64>().ok()?;
    (min <= max).then_some(Jitter::millis(min, max))
}

fn env_bool(key: &str, default: bool) -> bool {
    match std::env::var(key).ok().as_deref().map(str::trim) {
        Some("1") | Some("true") | Some("yes") | Some("on") => true,
        Some("0") | Some("false") | Some("no") | Some("off") => false,
        _ => default,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn jitter_within_bounds() {
        let j = Jitter::millis(100, 300);
        for _ in 0..50 {
            let d = j.sample();
            assert!(d >= Duration::from_millis(100) && d <= Duration::from_millis(300));
        }
    }

    #[test]
    fn jitter_degenerate_range() {
        assert_eq!(Jitter::none().sample(), Duration::ZERO);
        let j = Jitter::secs(5, 2);
        assert_eq!(j.sample(), Duration::from_secs(5));
    }

    #[test]
    fn defaults_match_source_markers() {
        let cfg = RunConfig::default();
        assert_eq!(cfg.selectors.year_select, "#ContentPlaceHolder1_ddlYear");
        assert_eq!(cfg.retry.max_attempts, 3);
        assert_eq!(cfg.retry.delay, Duration::from_secs(5));
        assert_eq!(cfg.output_path, PathBuf::from("bse_name_changes.json"));
        assert!(cfg.timeouts.table > cfg.timeouts.form);
    }

    #[test]
    fn jitter_ranges() {
        assert_eq!(parse_jitter_ms("8000-12000"), Some(Jitter::secs(8, 12)));
        assert_eq!(parse_jitter_ms(" 0 - 0 "), Some(Jitter::none()));
        assert_eq!(parse_jitter_ms("5-1"), None);
        assert_eq!(parse_jitter_ms("fast"), None);
    }

    #[test]
    fn non_finite_floats_fall_back() {
        std::env::set_var("NAMEWATCH_TEST_F64_NAN", "NaN");
        std::env::set_var("NAMEWATCH_TEST_F64_INF", "inf");
        std::env::set_var("NAMEWATCH_TEST_F64_OK", "0.5");
        assert_eq!(env_f64("NAMEWATCH_TEST_F64_NAN", 0.2), 0.2);
        assert_eq!(env_f64("NAMEWATCH_TEST_F64_INF", 0.2), 0.2);
        assert_eq!(env_f64("NAMEWATCH_TEST_F64_OK", 0.2), 0.5);
    }

    #[test]
    fn env_bool_parsing() {
        std::env::set_var("NAMEWATCH_TEST_BOOL_ON", "yes");
        std::env::set_var("NAMEWATCH_TEST_BOOL_OFF", "0");
        std::env::set_var("NAMEWATCH_TEST_BOOL_JUNK", "maybe");
        assert!(env_bool("NAMEWATCH_TEST_BOOL_ON", false));
        assert!(!env_bool("NAMEWATCH_TEST_BOOL_OFF", true));
        assert!(env_bool("NAMEWATCH_TEST_BOOL_JUNK", true));
        assert!(!env_bool("NAMEWATCH_TEST_BOOL_UNSET", false));
    }
}
