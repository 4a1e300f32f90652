//! Generic `Camera` trait and the [`Frame`] type it produces.

use proctor_types::ProctorError;
use tracing::debug;

/// A single captured video frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// Capture attempt counter, starting at 0 for the first attempt.
    pub seq: u64,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Encoded image bytes as delivered by the driver.
    pub data: Vec<u8>,
}

/// A video capture device.
///
/// The session orchestrator owns exactly one camera for its whole lifetime.
pub trait Camera {
    /// Stable identifier for this camera, e.g. `"webcam0"`.
    fn id(&self) -> &str;

    /// `false` when the device could not be opened at all.
    fn is_opened(&self) -> bool;

    /// Capture and return the next available frame.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::CaptureFailed`] when no frame is available
    /// this tick. This is transient, not end-of-stream.
    fn capture(&mut self) -> Result<Frame, ProctorError>;

    /// Capture a frame, folding a transient failure into `None`.
    fn next_frame(&mut self) -> Option<Frame> {
        match self.capture() {
            Ok(frame) => Some(frame),
            Err(e) => {
                debug!(camera = self.id(), error = %e, "no frame this tick");
                None
            }
        }
    }

    /// Check that the device is usable before a session starts.
    ///
    /// # Errors
    ///
    /// Returns [`ProctorError::DeviceUnavailable`] when [`Camera::is_opened`]
    /// is `false`.
    fn ensure_opened(&self) -> Result<(), ProctorError> {
        if self.is_opened() {
            Ok(())
        } else {
            Err(ProctorError::DeviceUnavailable {
                device: self.id().to_string(),
                details: "cannot open camera".to_string(),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FlakyCamera {
        id: String,
        attempts: u64,
    }

    impl Camera for FlakyCamera {
        fn id(&self) -> &str {
            &self.id
        }

        fn is_opened(&self) -> bool {
            true
        }

        fn capture(&mut self) -> Result<Frame, ProctorError> {
            let seq = self.attempts;
            self.attempts += 1;
            if seq % 2 == 1 {
                return Err(ProctorError::CaptureFailed {
                    device: self.id.clone(),
                    details: "buffer empty".to_string(),
                });
            }
            Ok(Frame {
                seq,
                width: 2,
                height: 2,
                data: vec![0u8; 4 * 3],
            })
        }
    }

    #[test]
    fn next_frame_maps_capture_failure_to_none() {
        let mut cam = FlakyCamera {
            id: "webcam0".to_string(),
            attempts: 0,
        };
        assert_eq!(cam.id(), "webcam0");
        assert!(cam.next_frame().is_some());
        assert!(cam.next_frame().is_none());
        let frame = cam.next_frame().expect("third attempt succeeds");
        assert_eq!(frame.seq, 2);
        assert_eq!(frame.data.len(), 12);
    }

    #[test]
    fn ensure_opened_succeeds_for_open_device() {
        let cam = FlakyCamera {
            id: "webcam0".to_string(),
            attempts: 0,
        };
        assert!(cam.ensure_opened().is_ok());
    }
}
