//! Unix domain socket listener for the service side.
//!
//! # Example
//!
//! ```no_run
//! use hwc_service::transport::SocketListener;
//!
//! # async fn run() -> hwc_service::error::Result<()> {
//! let listener = SocketListener::bind("/tmp/hwc-service.sock").await?;
//! let stream = listener.accept().await?;
//! # drop(stream);
//! # Ok(())
//! # }
//! ```

use std::io::{self, ErrorKind};
use std::os::unix::fs::FileTypeExt;
use std::path::{Path, PathBuf};

use tokio::net::{UnixListener, UnixStream};
use tracing::debug;

use crate::error::Result;

/// Socket file name used when no path is configured.
const DEFAULT_SOCKET_NAME: &str = "hwc-service.sock";

/// Default socket path: `hwc-service.sock` in the system temp directory.
pub fn default_socket_path() -> PathBuf {
    std::env::temp_dir().join(DEFAULT_SOCKET_NAME)
}

/// Listener bound to a socket path.
///
/// The socket file is removed when the listener is dropped.
#[derive(Debug)]
pub struct SocketListener {
    listener: UnixListener,
    path: PathBuf,
}

impl SocketListener {
    /// Bind to a Unix socket path.
    ///
    /// Removes a stale socket file at the path before binding. Any other
    /// kind of file at the path is left alone and the bind fails.
    pub async fn bind(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        remove_stale_socket(path)?;

        let listener = UnixListener::bind(path)?;
        debug!(path = %path.display(), "listening");

        Ok(Self {
            listener,
            path: path.to_path_buf(),
        })
    }

    /// Accept a single connection.
    pub async fn accept(&self) -> Result<UnixStream> {
        let (stream, _addr) = self.listener.accept().await?;
        Ok(stream)
    }

    /// Get the socket path.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn remove_stale_socket(path: &Path) -> Result<()> {
    let metadata = match std::fs::symlink_metadata(path) {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e.into()),
    };

    if !metadata.file_type().is_socket() {
        return Err(io::Error::new(
            ErrorKind::AddrInUse,
            format!("{} exists and is not a socket", path.display()),
        )
        .into());
    }

    debug!(path = %path.display(), "removing stale socket");
    std::fs::remove_file(path)?;
    Ok(())
}

impl Drop for SocketListener {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_socket_path() {
        let path = default_socket_path();
        assert!(path.ends_with(DEFAULT_SOCKET_NAME));
        assert!(path.starts_with(std::env::temp_dir()));
    }

    #[tokio::test]
    async fn test_bind_replaces_stale_socket_and_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hwc.sock");
        drop(std::os::unix::net::UnixListener::bind(&path).unwrap());
        assert!(path.exists());

        let listener = SocketListener::bind(&path).await.unwrap();
        assert_eq!(listener.path(), path.as_path());
        assert!(path.exists());

        drop(listener);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_bind_refuses_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hwc.sock");
        std::fs::write(&path, b"not a socket").unwrap();

        let err = SocketListener::bind(&path).await.unwrap_err();
        match err {
            crate::error::HwcError::Io(e) => assert_eq!(e.kind(), ErrorKind::AddrInUse),
            other => panic!("unexpected error {other:?}"),
        }
        assert_eq!(std::fs::read(&path).unwrap(), b"not a socket");
    }

    #[tokio::test]
    async fn test_accept_connection() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hwc.sock");
        let listener = SocketListener::bind(&path).await.unwrap();

        let connect = tokio::spawn({
            let path = path.clone();
            async move { UnixStream::connect(path).await }
        });

        let accepted = listener.accept().await;
        assert!(accepted.is_ok());
        assert!(connect.await.unwrap().is_ok());
    }
}
