pub mod cron;
pub mod next_run;
pub mod risk_policy;

pub use cron::CronSchedule;
pub use next_run::NextRunPolicy;
pub use risk_policy::{clamp_score, RiskPolicy};
