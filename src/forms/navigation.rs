//! Delayed navigation after a successful submission.
//!
//! The delay lets the success message render before the user is moved on. A
//! scheduled navigation belongs to whoever holds its handle: dropping the
//! handle (the form going away) cancels a navigation that has not fired yet.
//!
//! Embedders driving an [`AuthForm`](super::AuthForm) in-process get a handle
//! from `AuthForm::schedule_navigation`. The HTTP surface hands the same
//! [`Navigation`] to the browser instead, as a `Refresh` header or the JSON
//! `navigation` object, so no server-side timer outlives a request.

use serde::Serialize;
use std::{sync::Arc, time::Duration};
use tokio::{task::JoinHandle, time::sleep};
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationMode {
    /// Client-side route transition, optionally re-fetching server-rendered state.
    ClientRoute { refresh: bool },
    /// Full page load, discarding all client state.
    FullReload,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Navigation {
    pub target: String,
    pub delay: Duration,
    pub mode: NavigationMode,
}

impl Navigation {
    /// `Refresh` header value (`<seconds>; url=<target>`).
    #[must_use]
    pub fn refresh_header(&self) -> String {
        format!("{}; url={}", self.delay.as_secs_f64(), self.target)
    }
}

/// Performs a navigation once its delay has elapsed.
pub trait Navigator: Send + Sync {
    fn navigate(&self, navigation: &Navigation);
}

/// Handle to a scheduled navigation. Dropping it cancels a pending one.
#[derive(Debug)]
pub struct DeferredNavigation {
    task: JoinHandle<()>,
}

impl DeferredNavigation {
    /// Run `navigator` after `navigation.delay`. Requires a tokio runtime.
    #[must_use]
    pub fn schedule(navigation: Navigation, navigator: Arc<dyn Navigator>) -> Self {
        let task = tokio::spawn(async move {
            sleep(navigation.delay).await;
            debug!(target_path = %navigation.target, "navigating");
            navigator.navigate(&navigation);
        });

        Self { task }
    }

    /// Cancel the navigation if it has not fired yet.
    pub fn cancel(self) {
        self.task.abort();
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }
}

impl Drop for DeferredNavigation {
    fn drop(&mut self) {
        self.task.abort();
    }
}
