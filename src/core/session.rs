use anyhow::Result;

use crate::core::browser::{BrowserLauncher, PageSession};

/// One browser instance and one page, held for the length of a request.
/// The page and browser are closed when the session is dropped.
pub struct RenderSession {
    page: Box<dyn PageSession>,
}

impl RenderSession {
    pub fn open(launcher: &dyn BrowserLauncher) -> Result<Self> {
        let page = launcher.launch()?;
        tracing::debug!("Render session opened");
        Ok(Self { page })
    }

    pub fn page(&mut self) -> &mut dyn PageSession {
        self.page.as_mut()
    }
}

impl Drop for RenderSession {
    fn drop(&mut self) {
        self.page.close();
        tracing::debug!("Render session released");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::browser::IdleWait;
    use anyhow::anyhow;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingLauncher {
        closed: Arc<AtomicUsize>,
    }

    struct CountingPage {
        closed: Arc<AtomicUsize>,
    }

    impl BrowserLauncher for CountingLauncher {
        fn launch(&self) -> Result<Box<dyn PageSession>> {
            Ok(Box::new(CountingPage {
                closed: self.closed.clone(),
            }))
        }
    }

    impl PageSession for CountingPage {
        fn set_viewport(&mut self, _width: u32, _height: u32) -> Result<()> {
            Ok(())
        }
        fn set_content(&mut self, _html: &str) -> Result<()> {
            Ok(())
        }
        fn navigate(&mut self, url: &str) -> Result<()> {
            Err(anyhow!("net::ERR_NAME_NOT_RESOLVED at {}", url))
        }
        fn evaluate(&mut self, _script: &str) -> Result<()> {
            Ok(())
        }
        fn wait_for_network_idle(&mut self, _wait: IdleWait) -> Result<()> {
            Ok(())
        }
        fn print_pdf(&mut self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn screenshot_full_page(&mut self) -> Result<Vec<u8>> {
            Ok(Vec::new())
        }
        fn close(&mut self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn navigate_in_session(launcher: &CountingLauncher, url: &str) -> Result<()> {
        let mut session = RenderSession::open(launcher)?;
        session.page().navigate(url)?;
        Ok(())
    }

    #[test]
    fn drop_closes_exactly_once() {
        let closed = Arc::new(AtomicUsize::new(0));
        let launcher = CountingLauncher {
            closed: closed.clone(),
        };

        {
            let mut session = RenderSession::open(&launcher).unwrap();
            session.page().set_content("<p>x</p>").unwrap();
        }

        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn failed_step_still_closes() {
        let closed = Arc::new(AtomicUsize::new(0));
        let launcher = CountingLauncher {
            closed: closed.clone(),
        };

        assert!(navigate_in_session(&launcher, "https://unreachable.invalid").is_err());
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }
}
