/// Exploit harness adapters deciding attempt outcomes
mod fixture_harness;
mod severity_weighted_harness;

pub use fixture_harness::FixtureHarness;
pub use severity_weighted_harness::SeverityWeightedHarness;
