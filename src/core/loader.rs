use anyhow::Result;

use crate::core::browser::{IdleWait, PageSession};

/// What to put in the page before export.
#[derive(Debug, Clone)]
pub enum Content {
    /// Literal markup set as the document.
    Html(String),
    /// Remote page, optionally followed by a script run in its context.
    Url { url: String, script: Option<String> },
}

/// Removes literal `\n` escape sequences callers leave in scripts.
pub fn strip_escaped_newlines(script: &str) -> String {
    script.replace("\\n", "")
}

pub fn load(
    page: &mut dyn PageSession,
    content: &Content,
    viewport: Option<(u32, u32)>,
    idle: IdleWait,
) -> Result<()> {
    if let Some((width, height)) = viewport {
        page.set_viewport(width, height)?;
    }

    match content {
        Content::Html(text) => {
            page.set_content(text)?;
            page.wait_for_network_idle(idle)?;
        }
        Content::Url { url, script } => {
            page.navigate(url)?;
            page.wait_for_network_idle(idle)?;

            if let Some(script) = script {
                page.evaluate(&strip_escaped_newlines(script))?;
                page.wait_for_network_idle(idle)?;
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escaped_newlines_are_removed() {
        assert_eq!(
            strip_escaped_newlines("document.title = 'x';\\nwindow.scrollTo(0, 0);"),
            "document.title = 'x';window.scrollTo(0, 0);"
        );
        assert_eq!(strip_escaped_newlines("a\nb"), "a\nb");
    }
}
