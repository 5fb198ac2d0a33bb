//! Loading/error/value tracking for asynchronous operations.

use std::fmt::Display;
use std::future::Future;

/// State of an asynchronous operation that produces a `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AsyncState<T> {
    is_loading: bool,
    error: Option<String>,
    value: Option<T>,
}

impl<T> AsyncState<T> {
    /// State for an operation that runs as soon as it is created.
    pub fn immediate() -> Self {
        Self {
            is_loading: true,
            error: None,
            value: None,
        }
    }

    /// State for an operation that runs only when triggered.
    pub fn deferred() -> Self {
        Self {
            is_loading: false,
            error: None,
            value: None,
        }
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut T> {
        self.value.as_mut()
    }

    /// Run `operation`, recording its outcome.
    ///
    /// On success the value is stored and the error cleared; on failure the
    /// value is cleared and the error message stored. The outcome is returned
    /// to the caller either way.
    pub async fn execute<F, E>(&mut self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        T: Clone,
        E: Display,
    {
        self.is_loading = true;
        let result = operation.await;
        self.is_loading = false;

        match &result {
            Ok(value) => {
                self.value = Some(value.clone());
                self.error = None;
            }
            Err(e) => {
                self.value = None;
                self.error = Some(e.to_string());
            }
        }
        result
    }
}

impl<T> Default for AsyncState<T> {
    fn default() -> Self {
        Self::deferred()
    }
}

/// Loading flag and error slot for a single user action (reply, edit, ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionStatus {
    pub loading: bool,
    pub error: Option<String>,
}

impl ActionStatus {
    /// Run `operation` with `loading` set, storing its error message on
    /// failure and clearing it on success.
    pub async fn track<F, T, E>(&mut self, operation: F) -> Result<T, E>
    where
        F: Future<Output = Result<T, E>>,
        E: Display,
    {
        self.loading = true;
        let result = operation.await;
        self.loading = false;
        self.error = result.as_ref().err().map(|e| e.to_string());
        result
    }
}
