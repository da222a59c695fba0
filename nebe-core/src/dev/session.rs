//! Remote bundle (resize session) lifecycle: create, wait until ready,
//! delete.

use crate::contract::{BoxError, DevstackApi};
use crate::model::{Bundle, BundleStatus, NewBundle};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub poll_interval: Duration,
    pub max_polls: u32,
    pub teardown_timeout: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_secs(1),
            max_polls: 60,
            teardown_timeout: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to create remote bundle: {0}")]
    Create(BoxError),
    #[error("failed to poll remote bundle {id}: {source}")]
    Poll { id: String, source: BoxError },
    #[error("remote bundle {id} failed: {message}")]
    Failed { id: String, message: String },
    #[error("remote bundle {id} not ready after {polls} checks")]
    Timeout { id: String, polls: u32 },
    #[error("failed to delete remote bundle {id}: {source}")]
    Teardown { id: String, source: BoxError },
    #[error("deleting remote bundle {id} timed out")]
    TeardownTimeout { id: String },
}

/// A ready remote bundle.
pub struct RemoteSession {
    devstack: Arc<dyn DevstackApi>,
    bundle: Bundle,
    config: SessionConfig,
}

impl RemoteSession {
    /// Creates the bundle and polls it until it is ready. A bundle that
    /// fails or never gets ready is deleted before returning the error.
    pub async fn start(
        devstack: Arc<dyn DevstackApi>,
        request: &NewBundle,
        config: SessionConfig,
    ) -> Result<Self, SessionError> {
        let mut bundle = devstack
            .create_bundle(request)
            .await
            .map_err(SessionError::Create)?;
        info!(id = %bundle.id, sizes = ?request.sizes, "Remote bundle created");

        let mut polls = 0;
        loop {
            let status = bundle.status;
            match status {
                BundleStatus::Ready => break,
                BundleStatus::Failed => {
                    let err = SessionError::Failed {
                        id: bundle.id.clone(),
                        message: bundle.message.clone().unwrap_or_default(),
                    };
                    discard(devstack.as_ref(), &bundle.id).await;
                    return Err(err);
                }
                BundleStatus::Pending if polls >= config.max_polls => {
                    discard(devstack.as_ref(), &bundle.id).await;
                    return Err(SessionError::Timeout {
                        id: bundle.id.clone(),
                        polls,
                    });
                }
                BundleStatus::Pending => {
                    tokio::time::sleep(config.poll_interval).await;
                    polls += 1;
                    debug!(id = %bundle.id, polls, "Polling remote bundle");
                    bundle = match devstack.bundle(&bundle.id).await {
                        Ok(bundle) => bundle,
                        Err(source) => {
                            let id = bundle.id.clone();
                            discard(devstack.as_ref(), &id).await;
                            return Err(SessionError::Poll { id, source });
                        }
                    };
                }
            }
        }

        info!(id = %bundle.id, polls, "Remote bundle ready");
        Ok(Self {
            devstack,
            bundle,
            config,
        })
    }

    pub fn bundle(&self) -> &Bundle {
        &self.bundle
    }

    pub fn devstack(&self) -> Arc<dyn DevstackApi> {
        Arc::clone(&self.devstack)
    }

    /// Deletes the bundle, bounded by the teardown timeout.
    pub async fn teardown(self) -> Result<(), SessionError> {
        let id = self.bundle.id.clone();
        match tokio::time::timeout(
            self.config.teardown_timeout,
            self.devstack.delete_bundle(&id),
        )
        .await
        {
            Ok(Ok(())) => {
                info!(id = %id, "Remote bundle deleted");
                Ok(())
            }
            Ok(Err(source)) => Err(SessionError::Teardown { id, source }),
            Err(_) => Err(SessionError::TeardownTimeout { id }),
        }
    }
}

async fn discard(devstack: &dyn DevstackApi, id: &str) {
    if let Err(e) = devstack.delete_bundle(id).await {
        warn!(id, error = %e, "Could not delete unusable remote bundle");
    }
}
