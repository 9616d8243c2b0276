/// Mock implementations for testing
mod failing_stage;
mod manual_clock;
mod mock_progress_reporter;
mod recording_transport;

pub use failing_stage::FailingStage;
pub use manual_clock::ManualClock;
pub use mock_progress_reporter::MockProgressReporter;
pub use recording_transport::RecordingTransport;
