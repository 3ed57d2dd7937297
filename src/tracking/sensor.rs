//! Geolocation sensor seam.
//!
//! [`GeoSensor`] abstracts over whatever positioning hardware the deployment
//! has. [`acquire_position`] implements the standard acquisition strategy:
//! one high-accuracy attempt, then a single low-accuracy retry with a longer
//! timeout before giving up.

use async_trait::async_trait;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::warn;

/// A single position fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub latitude: f64,
    pub longitude: f64,
}

/// Acquisition parameters for a one-shot position read.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PositionOptions {
    pub high_accuracy: bool,
    pub timeout: Duration,
    /// Oldest acceptable cached fix
    pub max_age: Duration,
}

impl PositionOptions {
    /// First attempt: fresh high-accuracy fix, short timeout.
    pub fn high_accuracy() -> Self {
        Self {
            high_accuracy: true,
            timeout: Duration::from_secs(5),
            max_age: Duration::ZERO,
        }
    }

    /// Retry attempt: low accuracy, long timeout, cached fixes allowed.
    pub fn low_accuracy_retry() -> Self {
        Self {
            high_accuracy: false,
            timeout: Duration::from_secs(15),
            max_age: Duration::from_secs(10),
        }
    }
}

/// Failure modes of a position read, with the message shown to the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum GeoError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable")]
    Unavailable,
    #[error("position acquisition timed out")]
    Timeout,
    #[error("no positioning capability on this device")]
    Unsupported,
}

impl GeoError {
    /// Message surfaced in the UI for each failure mode.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PermissionDenied => "Izin lokasi ditolak",
            Self::Unavailable => "Sinyal GPS lemah / tidak tersedia",
            Self::Timeout => "Waktu habis (Timeout)",
            Self::Unsupported => "GPS tidak didukung",
        }
    }
}

/// Positioning hardware seam.
#[async_trait]
pub trait GeoSensor: Send + Sync {
    /// One-shot position read under the given acquisition parameters.
    async fn current_position(&self, options: PositionOptions) -> Result<Position, GeoError>;

    /// Continuous position stream. Each element is one sample or one
    /// sampling error; the stream ends when the sender side is dropped.
    async fn watch(&self) -> Result<mpsc::Receiver<Result<Position, GeoError>>, GeoError>;
}

/// Acquire a position with the standard retry strategy.
///
/// High-accuracy first; on failure retry once with relaxed parameters.
/// Permission denial and missing hardware are not retried.
pub async fn acquire_position<S: GeoSensor + ?Sized>(sensor: &S) -> Result<Position, GeoError> {
    match sensor.current_position(PositionOptions::high_accuracy()).await {
        Ok(position) => Ok(position),
        Err(err @ (GeoError::PermissionDenied | GeoError::Unsupported)) => Err(err),
        Err(err) => {
            warn!(error = %err, "high-accuracy fix failed, retrying low accuracy");
            sensor
                .current_position(PositionOptions::low_accuracy_retry())
                .await
        }
    }
}

#[derive(Debug, Default)]
struct ScriptedInner {
    fixes: VecDeque<Result<Position, GeoError>>,
    watch_streams: VecDeque<mpsc::Receiver<Result<Position, GeoError>>>,
    requests: Vec<PositionOptions>,
}

/// Test sensor that replays scripted fixes and watch streams.
#[derive(Debug, Default)]
pub struct ScriptedSensor {
    inner: Mutex<ScriptedInner>,
}

impl ScriptedSensor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue the result of the next one-shot read.
    pub fn push_fix(&self, fix: Result<Position, GeoError>) {
        self.inner.lock().fixes.push_back(fix);
    }

    /// Stage a watch stream and return its sender end.
    pub fn stage_watch(&self) -> mpsc::Sender<Result<Position, GeoError>> {
        let (tx, rx) = mpsc::channel(16);
        self.inner.lock().watch_streams.push_back(rx);
        tx
    }

    /// Acquisition parameters of every one-shot read so far.
    pub fn requests(&self) -> Vec<PositionOptions> {
        self.inner.lock().requests.clone()
    }
}

#[async_trait]
impl GeoSensor for ScriptedSensor {
    async fn current_position(&self, options: PositionOptions) -> Result<Position, GeoError> {
        let mut inner = self.inner.lock();
        inner.requests.push(options);
        inner.fixes.pop_front().unwrap_or(Err(GeoError::Unavailable))
    }

    async fn watch(&self) -> Result<mpsc::Receiver<Result<Position, GeoError>>, GeoError> {
        self.inner
            .lock()
            .watch_streams
            .pop_front()
            .ok_or(GeoError::Unsupported)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIX: Position = Position {
        latitude: -6.2,
        longitude: 106.8,
    };

    #[tokio::test]
    async fn test_first_fix_wins() {
        let sensor = ScriptedSensor::new();
        sensor.push_fix(Ok(FIX));

        let position = acquire_position(&sensor).await.unwrap();
        assert_eq!(position, FIX);

        let requests = sensor.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].high_accuracy);
        assert_eq!(requests[0].timeout, Duration::from_secs(5));
    }

    #[tokio::test]
    async fn test_timeout_retries_low_accuracy_once() {
        let sensor = ScriptedSensor::new();
        sensor.push_fix(Err(GeoError::Timeout));
        sensor.push_fix(Ok(FIX));

        let position = acquire_position(&sensor).await.unwrap();
        assert_eq!(position, FIX);

        let requests = sensor.requests();
        assert_eq!(requests.len(), 2);
        assert!(!requests[1].high_accuracy);
        assert_eq!(requests[1].timeout, Duration::from_secs(15));
        assert_eq!(requests[1].max_age, Duration::from_secs(10));
    }

    #[tokio::test]
    async fn test_permission_denied_is_not_retried() {
        let sensor = ScriptedSensor::new();
        sensor.push_fix(Err(GeoError::PermissionDenied));
        sensor.push_fix(Ok(FIX));

        let err = acquire_position(&sensor).await.unwrap_err();
        assert_eq!(err, GeoError::PermissionDenied);
        assert_eq!(sensor.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_retry_failure_propagates() {
        let sensor = ScriptedSensor::new();
        sensor.push_fix(Err(GeoError::Timeout));
        sensor.push_fix(Err(GeoError::Unavailable));

        let err = acquire_position(&sensor).await.unwrap_err();
        assert_eq!(err, GeoError::Unavailable);
        assert_eq!(sensor.requests().len(), 2);
    }

    #[test]
    fn test_user_messages() {
        assert_eq!(GeoError::PermissionDenied.user_message(), "Izin lokasi ditolak");
        assert_eq!(
            GeoError::Unavailable.user_message(),
            "Sinyal GPS lemah / tidak tersedia"
        );
        assert_eq!(GeoError::Timeout.user_message(), "Waktu habis (Timeout)");
        assert_eq!(GeoError::Unsupported.user_message(), "GPS tidak didukung");
    }
}
