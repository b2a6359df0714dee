use crate::webdav::WebdavClient;
use log::{debug, trace, warn};
use std::fmt;
use std::io::{self, Write};
use std::sync::Arc;
use vfs_core::OutputStream;

/// Output stream that buffers everything in memory and uploads it with a
/// single PUT when closed.
///
/// Closing twice uploads once. Dropping an unclosed stream closes it; a
/// failure at that point can only be logged.
pub struct WebdavOutputStream {
    client: Arc<dyn WebdavClient>,
    url: String,
    display_url: String,
    buffer: Vec<u8>,
    closed: bool,
}

impl WebdavOutputStream {
    /// `url` is the upload target; `display_url` is used in logs and errors
    /// and must not carry credentials.
    pub fn new(client: Arc<dyn WebdavClient>, url: String, display_url: String) -> Self {
        Self {
            client,
            url,
            display_url,
            buffer: Vec::new(),
            closed: false,
        }
    }
}

impl fmt::Debug for WebdavOutputStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebdavOutputStream")
            .field("url", &self.display_url)
            .field("buffered", &self.buffer.len())
            .field("closed", &self.closed)
            .finish()
    }
}

impl Write for WebdavOutputStream {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.closed {
            return Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                format!("output stream for {} is closed", self.display_url),
            ));
        }
        self.buffer.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl OutputStream for WebdavOutputStream {
    fn close(&mut self) -> io::Result<()> {
        if self.closed {
            return Ok(());
        }
        // Marked first so a failed upload is not retried by a later close or drop.
        self.closed = true;

        let content = std::mem::take(&mut self.buffer);
        let len = content.len();
        trace!("PUT {} ({} bytes)", self.display_url, len);
        self.client
            .put(&self.url, content)
            .map_err(|e| io::Error::other(format!("upload to {} failed: {}", self.display_url, e)))?;
        debug!("Committed {} bytes to {}", len, self.display_url);
        Ok(())
    }
}

impl Drop for WebdavOutputStream {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("Failed to close output stream: {}", e);
        }
    }
}
