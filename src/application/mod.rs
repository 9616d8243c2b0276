/// Application layer - Use cases, long-running services and DTOs
///
/// This layer contains the application logic that orchestrates
/// domain services and coordinates with infrastructure through ports.
pub mod dto;
pub mod factories;
pub mod services;
pub mod stages;
pub mod use_cases;
