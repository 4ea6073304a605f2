//! Process-wide HTTP transport.
//!
//! One `reqwest::Client` is built on first use and shared read-only by every
//! [`BlossomClient`](crate::BlossomClient) and every call. It holds no
//! per-call state and is never torn down.

use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Duration;

use crate::error::Error;

/// Time allowed to establish a TCP/TLS connection.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

const USER_AGENT: &str = concat!("blossom-client/", env!("CARGO_PKG_VERSION"));

static HTTP_CLIENT: OnceLock<reqwest::Client> = OnceLock::new();

// Serializes first-time construction; a failed build leaves the cell empty.
static INIT: Mutex<()> = Mutex::new(());

#[cfg(test)]
static BUILDS: std::sync::atomic::AtomicUsize = std::sync::atomic::AtomicUsize::new(0);

/// Returns the shared client, building it exactly once on first use.
///
/// A builder error is returned to the caller and the next call retries.
pub(crate) fn shared_client() -> Result<&'static reqwest::Client, Error> {
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client);
    }

    let _init = INIT.lock().unwrap_or_else(PoisonError::into_inner);
    if let Some(client) = HTTP_CLIENT.get() {
        return Ok(client);
    }

    let client = reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .user_agent(USER_AGENT)
        .build()?;

    #[cfg(test)]
    BUILDS.fetch_add(1, std::sync::atomic::Ordering::SeqCst);

    Ok(HTTP_CLIENT.get_or_init(|| client))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shared_client_is_built_once() {
        let a = shared_client().unwrap();
        let b = shared_client().unwrap();
        assert!(std::ptr::eq(a, b));
    }

    #[test]
    fn concurrent_init_yields_one_client() {
        let handles: Vec<_> = (0..8)
            .map(|_| std::thread::spawn(|| shared_client().unwrap() as *const reqwest::Client as usize))
            .collect();
        let addrs: Vec<usize> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(addrs.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(BUILDS.load(std::sync::atomic::Ordering::SeqCst), 1);
    }
}
