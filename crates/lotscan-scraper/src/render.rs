//! Headless-browser page rendering, behind the `render` feature.
//!
//! Some dealership listing pages populate their inventory grid from script,
//! so a plain HTTP fetch returns an empty shell. This module drives a
//! headless Chromium instance to get the post-script markup. All calls are
//! blocking; callers run them on a blocking task.

use std::time::Duration;

use headless_chrome::{Browser, LaunchOptions};

use crate::error::ScrapeError;

/// Renders `url` in a headless browser and returns the settled page markup.
///
/// Waits for navigation, sleeps `settle_ms` for script-driven content, and
/// optionally waits for `wait_selector` to appear (a missing selector is not
/// fatal; the settle delay already bounded the wait).
///
/// # Errors
///
/// Returns [`ScrapeError::Render`] when the browser cannot launch, the tab
/// cannot be opened, navigation fails, or the content cannot be read.
pub(crate) fn render_page(
    url: &str,
    timeout_secs: u64,
    settle_ms: u64,
    wait_selector: Option<&str>,
) -> Result<String, ScrapeError> {
    let render_err = |reason: String| ScrapeError::Render {
        url: url.to_owned(),
        reason,
    };

    let options = LaunchOptions::default_builder()
        .headless(true)
        .idle_browser_timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| render_err(format!("launch options: {e}")))?;

    let browser = Browser::new(options).map_err(|e| render_err(format!("launch: {e}")))?;
    let tab = browser
        .new_tab()
        .map_err(|e| render_err(format!("new tab: {e}")))?;
    tab.set_default_timeout(Duration::from_secs(timeout_secs));

    tab.navigate_to(url)
        .map_err(|e| render_err(format!("navigate: {e}")))?;
    tab.wait_until_navigated()
        .map_err(|e| render_err(format!("navigation wait: {e}")))?;

    std::thread::sleep(Duration::from_millis(settle_ms));

    if let Some(selector) = wait_selector {
        if let Err(error) = tab.wait_for_element(selector) {
            tracing::debug!(url, selector, %error, "wait selector never appeared");
        }
    }

    tab.get_content()
        .map_err(|e| render_err(format!("read content: {e}")))
}
