/// Inbound ports (Driving ports) - Use case interfaces
///
/// These ports define the interfaces that external adapters (CLI, scheduler)
/// use to interact with the application core.
pub mod scan_executor;

pub use scan_executor::{ScanExecutor, ScanRequest};
