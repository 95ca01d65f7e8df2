use anyhow::{Context, Result, anyhow};
use base64::{Engine as _, engine::general_purpose};
use headless_chrome::protocol::cdp::{Emulation, Network, Page, types::Event};
use headless_chrome::{Browser, LaunchOptions, Tab};
use parking_lot::Mutex;
use std::collections::HashSet;
use std::ffi::OsStr;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::sleep;
use std::time::{Duration, Instant};

/// How long a page must stay quiet before it counts as network idle.
#[derive(Debug, Clone, Copy)]
pub struct IdleWait {
    pub quiet: Duration,
    pub timeout: Option<Duration>,
}

impl Default for IdleWait {
    fn default() -> Self {
        Self {
            quiet: Duration::from_millis(500),
            timeout: None,
        }
    }
}

/// Starts one browser process with one page in it.
pub trait BrowserLauncher: Send + Sync {
    fn launch(&self) -> Result<Box<dyn PageSession>>;
}

/// A single page owned by a single request.
pub trait PageSession {
    fn set_viewport(&mut self, width: u32, height: u32) -> Result<()>;
    fn set_content(&mut self, html: &str) -> Result<()>;
    fn navigate(&mut self, url: &str) -> Result<()>;
    fn evaluate(&mut self, script: &str) -> Result<()>;
    fn wait_for_network_idle(&mut self, wait: IdleWait) -> Result<()>;
    fn print_pdf(&mut self) -> Result<Vec<u8>>;
    fn screenshot_full_page(&mut self) -> Result<Vec<u8>>;
    /// Releases the page and its browser. Must be safe to call once per session.
    fn close(&mut self);
}

/// Requests the page has started but not yet finished, fed by CDP
/// network events.
#[derive(Debug)]
pub struct NetworkTracker {
    state: Mutex<TrackerState>,
}

#[derive(Debug)]
struct TrackerState {
    in_flight: HashSet<String>,
    last_change: Instant,
}

impl Default for NetworkTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl NetworkTracker {
    pub fn new() -> Self {
        Self {
            state: Mutex::new(TrackerState {
                in_flight: HashSet::new(),
                last_change: Instant::now(),
            }),
        }
    }

    pub fn request_started(&self, request_id: &str) {
        let mut state = self.state.lock();
        // redirects reuse the id
        state.in_flight.insert(request_id.to_string());
        state.last_change = Instant::now();
    }

    pub fn request_done(&self, request_id: &str) {
        let mut state = self.state.lock();
        if state.in_flight.remove(request_id) {
            state.last_change = Instant::now();
        }
    }

    pub fn in_flight(&self) -> usize {
        self.state.lock().in_flight.len()
    }

    /// True when nothing is in flight and nothing changed during the last
    /// `quiet`, counting from no earlier than `since`.
    pub fn idle_since(&self, since: Instant, quiet: Duration) -> bool {
        let state = self.state.lock();
        state.in_flight.is_empty() && state.last_change.max(since).elapsed() >= quiet
    }

    fn on_event(&self, event: &Event) {
        match event {
            Event::NetworkRequestWillBeSent(ev) => self.request_started(&ev.params.request_id),
            Event::NetworkLoadingFinished(ev) => self.request_done(&ev.params.request_id),
            Event::NetworkLoadingFailed(ev) => self.request_done(&ev.params.request_id),
            _ => {}
        }
    }
}

pub struct ChromeLauncher {
    launch_options: LaunchOptions<'static>,
}

impl ChromeLauncher {
    pub fn new(chrome_path: Option<PathBuf>) -> Result<Self> {
        let launch_options = LaunchOptions::default_builder()
            .headless(true)
            .sandbox(false)
            .path(chrome_path)
            .args(vec![
                OsStr::new("--no-sandbox"),
                OsStr::new("--disable-setuid-sandbox"),
                OsStr::new("--disable-dev-shm-usage"),
                OsStr::new("--disable-gpu"),
                OsStr::new("--disable-software-rasterizer"),
                OsStr::new("--disable-extensions"),
                OsStr::new("--disable-background-networking"),
                OsStr::new("--disable-sync"),
                OsStr::new("--metrics-recording-only"),
                OsStr::new("--mute-audio"),
                OsStr::new("--no-first-run"),
                OsStr::new("--disable-default-apps"),
            ])
            .build()
            .map_err(|_| anyhow!("Could not find Chrome/Chromium binary"))?;

        Ok(Self { launch_options })
    }
}

impl BrowserLauncher for ChromeLauncher {
    fn launch(&self) -> Result<Box<dyn PageSession>> {
        let browser =
            Browser::new(self.launch_options.clone()).context("failed to launch browser")?;
        // dropping `browser` on error kills the process
        let tab = browser.new_tab().context("failed to open page")?;

        tab.call_method(Network::Enable {
            max_total_buffer_size: None,
            max_resource_buffer_size: None,
            max_post_data_size: None,
            report_direct_socket_traffic: None,
            enable_durable_messages: None,
        })?;
        let network = Arc::new(NetworkTracker::new());
        let listener = Arc::clone(&network);
        tab.add_event_listener(Arc::new(move |event: &Event| listener.on_event(event)))?;

        Ok(Box::new(ChromeSession {
            browser: Some(browser),
            tab,
            network,
            viewport: None,
        }))
    }
}

struct ChromeSession {
    browser: Option<Browser>,
    tab: Arc<Tab>,
    network: Arc<NetworkTracker>,
    viewport: Option<(u32, u32)>,
}

impl ChromeSession {
    fn override_metrics(&self, width: u32, height: u32) -> Result<()> {
        self.tab.call_method(Emulation::SetDeviceMetricsOverride {
            width,
            height,
            device_scale_factor: 1.0,
            mobile: false,
            scale: None,
            screen_width: Some(width),
            screen_height: Some(height),
            position_x: Some(0),
            position_y: Some(0),
            dont_set_visible_size: None,
            screen_orientation: None,
            viewport: None,
            display_feature: None,
            device_posture: None,
        })?;
        Ok(())
    }

    fn evaluate_json(&self, expression: &str) -> Result<serde_json::Value> {
        let raw = self
            .tab
            .evaluate(&format!("JSON.stringify({})", expression), false)?
            .value
            .and_then(|v| v.as_str().map(String::from))
            .ok_or_else(|| anyhow!("page returned no value for {}", expression))?;
        Ok(serde_json::from_str(&raw)?)
    }
}

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(50);

const CONTENT_SIZE_SCRIPT: &str = "[
    Math.max(document.documentElement.scrollWidth, document.body ? document.body.scrollWidth : 0),
    Math.max(document.documentElement.scrollHeight, document.body ? document.body.scrollHeight : 0),
    window.innerWidth,
    window.innerHeight
]";

impl PageSession for ChromeSession {
    fn set_viewport(&mut self, width: u32, height: u32) -> Result<()> {
        self.override_metrics(width, height)?;
        self.viewport = Some((width, height));
        Ok(())
    }

    fn set_content(&mut self, html: &str) -> Result<()> {
        let data_url = format!(
            "data:text/html;base64,{}",
            general_purpose::STANDARD.encode(html)
        );
        self.tab.navigate_to(&data_url)?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn navigate(&mut self, url: &str) -> Result<()> {
        self.tab
            .navigate_to(url)
            .with_context(|| format!("failed to navigate to {}", url))?;
        self.tab.wait_until_navigated()?;
        Ok(())
    }

    fn evaluate(&mut self, script: &str) -> Result<()> {
        self.tab
            .evaluate(script, true)
            .context("script evaluation failed")?;
        Ok(())
    }

    fn wait_for_network_idle(&mut self, wait: IdleWait) -> Result<()> {
        let started = Instant::now();

        loop {
            if self.network.idle_since(started, wait.quiet) {
                tracing::debug!("Network idle after {:?}", started.elapsed());
                return Ok(());
            }

            if let Some(timeout) = wait.timeout {
                if started.elapsed() >= timeout {
                    return Err(anyhow!(
                        "Timeout waiting for network idle after {:?} ({} requests in flight)",
                        timeout,
                        self.network.in_flight()
                    ));
                }
            }

            sleep(IDLE_POLL_INTERVAL);
        }
    }

    fn print_pdf(&mut self) -> Result<Vec<u8>> {
        self.tab.print_to_pdf(None).context("print to PDF failed")
    }

    fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
        let size = self.evaluate_json(CONTENT_SIZE_SCRIPT)?;
        let dimension = |i: usize| size[i].as_f64().unwrap_or(0.0).ceil() as u32;

        let (view_width, view_height) = self
            .viewport
            .unwrap_or((dimension(2), dimension(3)));
        let width = view_width.max(dimension(0)).max(1);
        let height = view_height.max(dimension(1)).max(1);

        self.override_metrics(width, height)?;
        self.tab
            .capture_screenshot(Page::CaptureScreenshotFormatOption::Png, None, None, true)
            .context("screenshot failed")
    }

    fn close(&mut self) {
        if let Err(e) = self.tab.close(true) {
            tracing::warn!("Failed to close tab during cleanup: {}", e);
        }
        // the browser process is killed when the handle drops
        if self.browser.take().is_some() {
            tracing::debug!("Browser closed successfully");
        }
    }
}
