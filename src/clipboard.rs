//! Clipboard access, best effort.

use tracing::info;

use crate::error::Error;
use crate::Result;

/// Read/write plain text on a clipboard.
pub trait Clipboard {
    fn read_text(&mut self) -> Result<String>;
    fn write_text(&mut self, text: &str) -> Result<()>;
}

/// Native system clipboard backed by arboard.
pub struct SystemClipboard {
    inner: arboard::Clipboard,
}

impl SystemClipboard {
    pub fn new() -> Result<Self> {
        let inner = arboard::Clipboard::new().map_err(|e| Error::Clipboard(e.to_string()))?;
        Ok(Self { inner })
    }
}

impl Clipboard for SystemClipboard {
    fn read_text(&mut self) -> Result<String> {
        self.inner
            .get_text()
            .map_err(|e| Error::Clipboard(e.to_string()))
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.inner
            .set_text(text)
            .map_err(|e| Error::Clipboard(e.to_string()))?;
        info!("Copied {} chars to clipboard", text.len());
        Ok(())
    }
}

/// In-process clipboard for tests and headless sessions
#[derive(Debug, Default)]
pub struct MemoryClipboard {
    pub contents: Option<String>,
}

impl Clipboard for MemoryClipboard {
    fn read_text(&mut self) -> Result<String> {
        self.contents
            .clone()
            .ok_or_else(|| Error::Clipboard("Clipboard is empty".to_string()))
    }

    fn write_text(&mut self, text: &str) -> Result<()> {
        self.contents = Some(text.to_string());
        Ok(())
    }
}
