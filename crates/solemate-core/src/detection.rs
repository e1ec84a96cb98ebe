//! Obstacle detection.
//!
//! [`ObjectDetector`] is the capability a real camera or ML pipeline would
//! implement. [`DetectionSession`] adds the screen-level rules on top: a shoe
//! must be connected, the latest detections are kept until stopped, and the
//! history is capped.

use std::collections::VecDeque;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;
use utoipa::ToSchema;

/// Number of detections kept in history.
pub const HISTORY_LIMIT: usize = 20;

/// Errors from running detection.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DetectionError {
    /// No smart shoe is connected.
    #[error("Please connect your SoleMate device first")]
    DeviceNotConnected,

    /// The detector itself failed.
    #[error("Object detection failed: {0}")]
    DetectorFailed(String),
}

/// Result type for detection operations.
pub type DetectionResult<T> = std::result::Result<T, DetectionError>;

/// Where an object is relative to the walking direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    /// To the left.
    Left,
    /// Straight ahead.
    Center,
    /// To the right.
    Right,
}

/// How dangerous an object is to walk into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Risk {
    /// Harmless.
    Low,
    /// Worth a warning.
    Medium,
    /// Requires immediate attention (steps, drops).
    High,
}

/// A detected obstacle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct DetectedObject {
    /// What the object is.
    #[schema(example = "Chair")]
    pub label: String,
    /// Detector confidence in `0.0..=1.0`.
    #[schema(example = 0.95)]
    pub confidence: f32,
    /// Estimated distance in meters.
    #[schema(example = 2.0)]
    pub distance_m: f32,
    /// Relative direction.
    pub direction: Direction,
    /// Risk classification.
    pub risk: Risk,
    /// When the object was detected.
    pub detected_at: DateTime<Utc>,
}

impl DetectedObject {
    /// Confidence as a whole percentage.
    #[must_use]
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    pub fn confidence_percent(&self) -> u8 {
        // Clamped to 0..=100 before the cast.
        (self.confidence.clamp(0.0, 1.0) * 100.0).round() as u8
    }

    /// The line read out by voice guidance, e.g. `"Steps, center, 4.0 m (78%)"`.
    #[must_use]
    pub fn announcement(&self) -> String {
        let direction = match self.direction {
            Direction::Left => "left",
            Direction::Center => "center",
            Direction::Right => "right",
        };
        format!(
            "{}, {direction}, {:.1} m ({}%)",
            self.label,
            self.distance_m,
            self.confidence_percent()
        )
    }
}

/// Produces obstacle detections from the current camera frame.
#[async_trait]
pub trait ObjectDetector: Send + Sync {
    /// Detects objects in view.
    async fn detect(&mut self) -> DetectionResult<Vec<DetectedObject>>;
}

const SAMPLES: &[(&str, f32, f32, Direction, Risk)] = &[
    ("Chair", 0.95, 2.0, Direction::Center, Risk::Low),
    ("Table", 0.87, 3.0, Direction::Right, Risk::Medium),
    ("Person", 0.92, 5.0, Direction::Center, Risk::Low),
    ("Door", 0.89, 1.0, Direction::Left, Risk::Low),
    ("Steps", 0.78, 4.0, Direction::Center, Risk::High),
];

/// A detector that cycles through a fixed set of sample obstacles.
#[derive(Debug, Clone, Default)]
pub struct MockObjectDetector {
    round: usize,
}

impl MockObjectDetector {
    /// Creates a detector starting at the first sample.
    #[must_use]
    pub const fn new() -> Self {
        Self { round: 0 }
    }
}

#[async_trait]
impl ObjectDetector for MockObjectDetector {
    async fn detect(&mut self) -> DetectionResult<Vec<DetectedObject>> {
        let count = self.round % 4 + 1;
        let start = self.round % SAMPLES.len();
        self.round += 1;

        let now = Utc::now();
        Ok((0..count)
            .map(|i| {
                let (label, confidence, distance_m, direction, risk) =
                    SAMPLES[(start + i) % SAMPLES.len()];
                DetectedObject {
                    label: label.to_string(),
                    confidence,
                    distance_m,
                    direction,
                    risk,
                    detected_at: now,
                }
            })
            .collect())
    }
}

/// Latest detections and capped history for the detection screen.
pub struct DetectionSession {
    detector: Box<dyn ObjectDetector>,
    latest: Vec<DetectedObject>,
    history: VecDeque<DetectedObject>,
}

impl DetectionSession {
    /// Creates a session over `detector`.
    #[must_use]
    pub fn new(detector: Box<dyn ObjectDetector>) -> Self {
        Self {
            detector,
            latest: Vec::new(),
            history: VecDeque::with_capacity(HISTORY_LIMIT),
        }
    }

    /// Runs one detection pass.
    ///
    /// # Errors
    ///
    /// Returns [`DetectionError::DeviceNotConnected`] if `device_connected`
    /// is false, or the detector's error.
    pub async fn run(&mut self, device_connected: bool) -> DetectionResult<&[DetectedObject]> {
        if !device_connected {
            return Err(DetectionError::DeviceNotConnected);
        }

        let found = self.detector.detect().await?;
        for object in found.iter().rev() {
            self.history.push_front(object.clone());
        }
        self.history.truncate(HISTORY_LIMIT);

        let labels: Vec<&str> = found.iter().map(|o| o.label.as_str()).collect();
        info!(count = found.len(), objects = %labels.join(", "), "Objects detected");
        self.latest = found;
        Ok(&self.latest)
    }

    /// Stops detection and clears the latest results. History is kept.
    pub fn stop(&mut self) {
        self.latest.clear();
    }

    /// Latest detections.
    #[must_use]
    pub fn latest(&self) -> &[DetectedObject] {
        &self.latest
    }

    /// History, newest first.
    #[must_use]
    pub fn history(&self) -> Vec<DetectedObject> {
        self.history.iter().cloned().collect()
    }

    /// Forgets all past detections.
    pub fn clear_history(&mut self) {
        self.history.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingDetector;

    #[async_trait]
    impl ObjectDetector for FailingDetector {
        async fn detect(&mut self) -> DetectionResult<Vec<DetectedObject>> {
            Err(DetectionError::DetectorFailed("camera unavailable".into()))
        }
    }

    #[tokio::test]
    async fn test_mock_detector_returns_one_to_four_objects() {
        let mut detector = MockObjectDetector::new();
        for _ in 0..12 {
            let found = detector.detect().await.unwrap();
            assert!((1..=4).contains(&found.len()));
        }
    }

    #[test]
    fn test_confidence_percent() {
        let object = DetectedObject {
            label: "Steps".into(),
            confidence: 0.784,
            distance_m: 4.0,
            direction: Direction::Center,
            risk: Risk::High,
            detected_at: Utc::now(),
        };
        assert_eq!(object.confidence_percent(), 78);
        assert_eq!(object.announcement(), "Steps, center, 4.0 m (78%)");
    }

    #[tokio::test]
    async fn test_run_requires_connected_device() {
        let mut session = DetectionSession::new(Box::new(MockObjectDetector::new()));
        assert_eq!(
            session.run(false).await.map(<[_]>::len),
            Err(DetectionError::DeviceNotConnected)
        );
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_history_is_capped_newest_first() {
        let mut session = DetectionSession::new(Box::new(MockObjectDetector::new()));
        for _ in 0..15 {
            session.run(true).await.unwrap();
        }
        let history = session.history();
        assert_eq!(history.len(), HISTORY_LIMIT);
        assert_eq!(history[0], session.latest()[0]);
    }

    #[tokio::test]
    async fn test_stop_keeps_history() {
        let mut session = DetectionSession::new(Box::new(MockObjectDetector::new()));
        session.run(true).await.unwrap();
        session.stop();
        assert!(session.latest().is_empty());
        assert!(!session.history().is_empty());

        session.clear_history();
        assert!(session.history().is_empty());
    }

    #[tokio::test]
    async fn test_detector_failure_propagates() {
        let mut session = DetectionSession::new(Box::new(FailingDetector));
        assert!(matches!(
            session.run(true).await,
            Err(DetectionError::DetectorFailed(_))
        ));
    }
}
