/// Use cases module containing application business logic orchestration
mod execute_scan;

pub use execute_scan::ScanEngine;
