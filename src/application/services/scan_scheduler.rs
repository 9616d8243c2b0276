use crate::application::services::EventQueue;
use crate::ports::inbound::{ScanExecutor, ScanRequest};
use crate::ports::outbound::{Clock, EventPublisher, Repository};
use crate::scan_orchestration::domain::target::validate_request;
use crate::scan_orchestration::domain::{
    ScanConfig, ScanTarget, ScanType, ScheduleConfig, ScheduledScan, WebhookEvent,
};
use crate::scan_orchestration::policies::NextRunPolicy;
use crate::shared::error::ScanError;
use crate::shared::id::generate_id;
use crate::shared::Result;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{watch, Mutex};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Default number of due schedules executed at the same time within one tick
pub const DEFAULT_MAX_CONCURRENT_SCANS: usize = 4;

/// ScanScheduler - owns every `ScheduledScan` and fires them when due
///
/// The scheduler is the only component that mutates scheduled-scan state. Each
/// schedule has its own run lock, so a schedule whose previous run is still in
/// flight is skipped by later ticks instead of being executed twice. Due schedules
/// within one tick run concurrently, bounded by `max_concurrent`.
pub struct ScanScheduler {
    schedules: DashMap<String, ScheduledScan>,
    run_locks: DashMap<String, Arc<Mutex<()>>>,
    executor: Arc<dyn ScanExecutor>,
    repository: Arc<dyn Repository<ScheduledScan>>,
    clock: Arc<dyn Clock>,
    events: Option<EventQueue>,
    max_concurrent: usize,
    shutdown: watch::Sender<bool>,
}

impl ScanScheduler {
    pub fn new(
        executor: Arc<dyn ScanExecutor>,
        repository: Arc<dyn Repository<ScheduledScan>>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (shutdown, _) = watch::channel(false);
        Self {
            schedules: DashMap::new(),
            run_locks: DashMap::new(),
            executor,
            repository,
            clock,
            events: None,
            max_concurrent: DEFAULT_MAX_CONCURRENT_SCANS,
            shutdown,
        }
    }

    pub fn with_events(mut self, events: Arc<dyn EventPublisher>) -> Self {
        self.events = Some(EventQueue::new(events));
        self
    }

    /// Waits for queued schedule events to be delivered
    pub async fn flush_events(&self) {
        if let Some(events) = &self.events {
            events.flush().await;
        }
    }

    pub fn with_max_concurrent(mut self, max_concurrent: usize) -> Self {
        self.max_concurrent = max_concurrent.max(1);
        self
    }

    /// Loads persisted schedules into the registry
    ///
    /// Returns the number of schedules loaded.
    pub async fn init(&self) -> Result<usize> {
        let stored = self.repository.load_all().await?;
        let count = stored.len();
        for schedule in stored {
            self.schedules.insert(schedule.id.clone(), schedule);
        }
        info!(count, "scheduled scans loaded");
        Ok(count)
    }

    /// Registers a new recurring scan
    ///
    /// # Errors
    /// `ScanError::Validation` for a malformed target, scan config or schedule.
    /// Storage errors from the repository are propagated.
    pub async fn create(
        &self,
        target: &str,
        scan_type: ScanType,
        config: ScanConfig,
        schedule: ScheduleConfig,
    ) -> Result<ScheduledScan> {
        let target = ScanTarget::parse(target, scan_type)?;
        validate_request(&config, None)?;
        schedule.validate()?;

        let now = self.clock.now();
        let next_run = NextRunPolicy::calculate_next_run(&schedule, now)?;
        let scheduled = ScheduledScan {
            id: generate_id("scheduled"),
            target: target.as_str().to_string(),
            scan_type,
            config,
            schedule,
            enabled: true,
            last_run: None,
            next_run,
            run_count: 0,
            created_at: now,
        };

        self.repository.save(&scheduled).await?;
        self.schedules.insert(scheduled.id.clone(), scheduled.clone());
        info!(schedule_id = %scheduled.id, next_run = %scheduled.next_run, "scan scheduled");

        self.publish(
            WebhookEvent::ScanScheduled,
            json!({
                "scheduledScanId": scheduled.id,
                "target": scheduled.target,
                "type": scheduled.scan_type,
                "nextRun": scheduled.next_run,
            }),
        )
        .await;

        Ok(scheduled)
    }

    pub fn get(&self, id: &str) -> Option<ScheduledScan> {
        self.schedules.get(id).map(|entry| entry.clone())
    }

    /// All schedules, soonest first
    pub fn list(&self) -> Vec<ScheduledScan> {
        let mut schedules: Vec<ScheduledScan> =
            self.schedules.iter().map(|entry| entry.clone()).collect();
        schedules.sort_by(|a, b| a.next_run.cmp(&b.next_run).then_with(|| a.id.cmp(&b.id)));
        schedules
    }

    /// Removes a schedule; returns whether it existed
    pub async fn delete(&self, id: &str) -> Result<bool> {
        let removed = self.schedules.remove(id).is_some();
        self.run_locks.remove(id);
        if removed {
            self.repository.delete(id).await?;
            info!(schedule_id = id, "scheduled scan deleted");
        }
        Ok(removed)
    }

    /// Suspends or resumes a schedule without deleting it
    ///
    /// Re-enabling recomputes `next_run` from the current time, so a schedule that
    /// was disabled for a while does not fire immediately for missed occurrences.
    pub async fn set_enabled(&self, id: &str, enabled: bool) -> Result<ScheduledScan> {
        let now = self.clock.now();
        let updated = {
            let mut entry = self
                .schedules
                .get_mut(id)
                .ok_or_else(|| ScanError::not_found("Scheduled scan", id))?;
            if enabled && !entry.enabled {
                entry.next_run = NextRunPolicy::calculate_next_run(&entry.schedule, now)?;
            }
            entry.enabled = enabled;
            entry.clone()
        };

        self.repository.save(&updated).await?;
        info!(schedule_id = id, enabled, "scheduled scan updated");
        Ok(updated)
    }

    /// Runs every enabled schedule whose `next_run` has passed
    ///
    /// Returns the number of schedules that were executed. Schedules whose
    /// previous run is still in flight are skipped.
    pub async fn tick(&self) -> usize {
        let now = self.clock.now();
        let due: Vec<String> = self
            .schedules
            .iter()
            .filter(|entry| entry.is_due(now))
            .map(|entry| entry.id.clone())
            .collect();

        if due.is_empty() {
            return 0;
        }
        debug!(count = due.len(), "scheduled scans due");

        stream::iter(due)
            .map(|id| async move { self.run_scheduled(&id).await })
            .buffer_unordered(self.max_concurrent)
            .filter(|executed| futures::future::ready(*executed))
            .count()
            .await
    }

    /// Executes one schedule under its run lock and advances its state
    async fn run_scheduled(&self, id: &str) -> bool {
        let lock = self
            .run_locks
            .entry(id.to_string())
            .or_insert_with(|| Arc::new(Mutex::new(())))
            .clone();
        let Ok(_guard) = lock.try_lock() else {
            debug!(schedule_id = id, "previous run still in flight, skipping");
            return false;
        };

        // state may have changed between collecting due ids and taking the lock
        let Some(scheduled) = self.get(id).filter(|s| s.is_due(self.clock.now())) else {
            return false;
        };

        info!(schedule_id = id, target = %scheduled.target, "running scheduled scan");
        let request = ScanRequest::new(
            scheduled.target.clone(),
            scheduled.scan_type,
            scheduled.config.clone(),
        );

        match self.executor.execute_scan(request).await {
            Ok(result) => {
                info!(
                    schedule_id = id,
                    scan_id = %result.id,
                    status = ?result.status,
                    "scheduled scan finished"
                );
            }
            Err(e) => {
                let error = ScanError::Scheduling {
                    schedule_id: id.to_string(),
                    details: e.to_string(),
                };
                warn!(schedule_id = id, error = %error, "scheduled scan failed");
                self.publish(
                    WebhookEvent::ScanFailed,
                    json!({ "scheduledScanId": id, "error": error.to_string() }),
                )
                .await;
            }
        }

        self.advance(id).await;
        true
    }

    /// Records a finished run and computes the next occurrence
    async fn advance(&self, id: &str) {
        let now = self.clock.now();
        let updated = {
            let Some(mut entry) = self.schedules.get_mut(id) else {
                // deleted while running
                return;
            };
            entry.last_run = Some(now);
            entry.run_count += 1;
            match NextRunPolicy::calculate_next_run(&entry.schedule, now) {
                Ok(next_run) => entry.next_run = next_run,
                Err(e) => {
                    warn!(
                        schedule_id = id,
                        error = %e,
                        "cannot compute next run, disabling schedule"
                    );
                    entry.enabled = false;
                }
            }
            entry.clone()
        };

        if let Err(e) = self.repository.save(&updated).await {
            warn!(schedule_id = id, error = %e, "failed to persist scheduled scan");
        }
    }

    /// Starts the periodic check on the current tokio runtime
    ///
    /// Every tick runs in its own task, so a long scan never delays the next
    /// check. The loop ends after `shutdown`.
    pub fn start(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let scheduler = Arc::clone(self);
        let mut shutdown = self.shutdown.subscribe();
        info!(interval_secs = interval.as_secs(), "scheduler started");

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let scheduler = Arc::clone(&scheduler);
                        tokio::spawn(async move {
                            scheduler.tick().await;
                        });
                    }
                    _ = shutdown.changed() => break,
                }
            }
            info!("scheduler stopped");
        })
    }

    /// Stops the periodic check; runs already in flight finish on their own
    pub fn shutdown(&self) {
        self.shutdown.send_replace(true);
    }

    async fn publish(&self, event: WebhookEvent, data: serde_json::Value) {
        if let Some(events) = &self.events {
            events.publish(event, data).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::outbound::memory::InMemoryRepository;
    use crate::scan_orchestration::domain::{Frequency, ScanResult};
    use async_trait::async_trait;
    use chrono::{DateTime, Duration as ChronoDuration, TimeZone, Utc};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;

    struct ManualClock {
        now: StdMutex<DateTime<Utc>>,
    }

    impl ManualClock {
        fn at(now: DateTime<Utc>) -> Self {
            Self {
                now: StdMutex::new(now),
            }
        }

        fn advance(&self, by: ChronoDuration) {
            let mut now = self.now.lock().unwrap();
            *now += by;
        }
    }

    impl Clock for ManualClock {
        fn now(&self) -> DateTime<Utc> {
            *self.now.lock().unwrap()
        }
    }

    /// Executor that counts calls, optionally sleeping or failing
    struct MockExecutor {
        calls: AtomicUsize,
        delay: Option<Duration>,
        fail: bool,
    }

    impl MockExecutor {
        fn new() -> Self {
            Self {
                calls: AtomicUsize::new(0),
                delay: None,
                fail: false,
            }
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl ScanExecutor for MockExecutor {
        async fn execute_scan(&self, request: ScanRequest) -> Result<ScanResult> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if let Some(delay) = self.delay {
                tokio::time::sleep(delay).await;
            }
            if self.fail {
                anyhow::bail!("engine unavailable");
            }
            Ok(ScanResult::started(
                "scan-1".to_string(),
                request.target,
                request.scan_type,
                request.config,
                Utc::now(),
            ))
        }
    }

    #[derive(Default)]
    struct RecordingPublisher {
        events: StdMutex<Vec<(WebhookEvent, serde_json::Value)>>,
    }

    #[async_trait]
    impl EventPublisher for RecordingPublisher {
        async fn publish(&self, event: WebhookEvent, data: serde_json::Value) {
            self.events.lock().unwrap().push((event, data));
        }
    }

    fn start_time() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, 10, 0, 0).unwrap()
    }

    struct Fixture {
        scheduler: ScanScheduler,
        executor: Arc<MockExecutor>,
        repository: Arc<InMemoryRepository<ScheduledScan>>,
        clock: Arc<ManualClock>,
        publisher: Arc<RecordingPublisher>,
    }

    fn fixture(executor: MockExecutor) -> Fixture {
        let executor = Arc::new(executor);
        let repository = Arc::new(InMemoryRepository::new());
        let clock = Arc::new(ManualClock::at(start_time()));
        let publisher = Arc::new(RecordingPublisher::default());
        let scheduler = ScanScheduler::new(executor.clone(), repository.clone(), clock.clone())
            .with_events(publisher.clone());
        Fixture {
            scheduler,
            executor,
            repository,
            clock,
            publisher,
        }
    }

    async fn create_daily(scheduler: &ScanScheduler) -> ScheduledScan {
        scheduler
            .create(
                "https://example.com",
                ScanType::Url,
                ScanConfig::default(),
                ScheduleConfig::daily_at("09:00"),
            )
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_create_computes_next_run_and_persists() {
        let f = fixture(MockExecutor::new());
        let scheduled = create_daily(&f.scheduler).await;

        assert!(scheduled.id.starts_with("scheduled-"));
        assert!(scheduled.enabled);
        assert_eq!(scheduled.run_count, 0);
        assert_eq!(
            scheduled.next_run,
            Utc.with_ymd_and_hms(2024, 1, 2, 9, 0, 0).unwrap()
        );
        assert!(f.repository.load(&scheduled.id).await.unwrap().is_some());
        assert_eq!(f.scheduler.get(&scheduled.id), Some(scheduled.clone()));

        f.scheduler.flush_events().await;
        let events = f.publisher.events.lock().unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].0, WebhookEvent::ScanScheduled);
        assert_eq!(events[0].1["scheduledScanId"], scheduled.id.as_str());
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_input() {
        let f = fixture(MockExecutor::new());

        let custom_without_cron = f
            .scheduler
            .create(
                "https://example.com",
                ScanType::Url,
                ScanConfig::default(),
                ScheduleConfig::new(Frequency::Custom),
            )
            .await;
        assert!(custom_without_cron.is_err());

        let bad_target = f
            .scheduler
            .create(
                "ftp://example.com",
                ScanType::Url,
                ScanConfig::default(),
                ScheduleConfig::new(Frequency::Daily),
            )
            .await;
        let err = bad_target.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScanError>(),
            Some(ScanError::Validation { .. })
        ));

        assert!(f.scheduler.list().is_empty());
        assert!(f.repository.is_empty());
    }

    #[tokio::test]
    async fn test_tick_runs_only_due_schedules() {
        let f = fixture(MockExecutor::new());
        let scheduled = create_daily(&f.scheduler).await;

        assert_eq!(f.scheduler.tick().await, 0);
        assert_eq!(f.executor.calls(), 0);

        f.clock.advance(ChronoDuration::days(1));
        assert_eq!(f.scheduler.tick().await, 1);
        assert_eq!(f.executor.calls(), 1);

        let after = f.scheduler.get(&scheduled.id).unwrap();
        assert_eq!(after.run_count, 1);
        assert_eq!(after.last_run, Some(f.clock.now()));
        assert!(after.next_run > f.clock.now());
        assert_eq!(
            after.next_run,
            Utc.with_ymd_and_hms(2024, 1, 3, 9, 0, 0).unwrap()
        );

        let stored = f.repository.load(&scheduled.id).await.unwrap().unwrap();
        assert_eq!(stored.run_count, 1);

        // same instant again: nothing due any more
        assert_eq!(f.scheduler.tick().await, 0);
    }

    #[tokio::test]
    async fn test_disabled_schedule_is_not_run() {
        let f = fixture(MockExecutor::new());
        let scheduled = create_daily(&f.scheduler).await;
        let disabled = f.scheduler.set_enabled(&scheduled.id, false).await.unwrap();
        assert!(!disabled.enabled);

        f.clock.advance(ChronoDuration::days(3));
        assert_eq!(f.scheduler.tick().await, 0);
        assert_eq!(f.executor.calls(), 0);

        // resuming skips the missed occurrences
        let resumed = f.scheduler.set_enabled(&scheduled.id, true).await.unwrap();
        assert!(resumed.next_run > f.clock.now());
        assert_eq!(f.scheduler.tick().await, 0);
    }

    #[tokio::test]
    async fn test_set_enabled_unknown_id() {
        let f = fixture(MockExecutor::new());
        let err = f.scheduler.set_enabled("missing", true).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ScanError>(),
            Some(ScanError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_executor_error_emits_scan_failed_and_advances() {
        let f = fixture(MockExecutor {
            fail: true,
            ..MockExecutor::new()
        });
        let scheduled = create_daily(&f.scheduler).await;

        f.clock.advance(ChronoDuration::days(1));
        assert_eq!(f.scheduler.tick().await, 1);

        let after = f.scheduler.get(&scheduled.id).unwrap();
        assert_eq!(after.run_count, 1);
        assert!(after.next_run > f.clock.now());

        f.scheduler.flush_events().await;
        let events = f.publisher.events.lock().unwrap();
        let failed: Vec<_> = events
            .iter()
            .filter(|(event, _)| *event == WebhookEvent::ScanFailed)
            .collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].1["scheduledScanId"], scheduled.id.as_str());
    }

    #[tokio::test]
    async fn test_overlapping_ticks_run_schedule_once() {
        let f = fixture(MockExecutor {
            delay: Some(Duration::from_millis(100)),
            ..MockExecutor::new()
        });
        create_daily(&f.scheduler).await;
        f.clock.advance(ChronoDuration::days(1));

        let (first, second) = tokio::join!(f.scheduler.tick(), f.scheduler.tick());
        assert_eq!(first + second, 1);
        assert_eq!(f.executor.calls(), 1);
    }

    #[tokio::test]
    async fn test_due_schedules_run_concurrently() {
        let f = fixture(MockExecutor::new());
        for _ in 0..3 {
            create_daily(&f.scheduler).await;
        }
        f.clock.advance(ChronoDuration::days(1));

        assert_eq!(f.scheduler.tick().await, 3);
        assert!(f.scheduler.list().iter().all(|s| s.run_count == 1));
    }

    #[tokio::test]
    async fn test_delete_removes_from_registry_and_storage() {
        let f = fixture(MockExecutor::new());
        let scheduled = create_daily(&f.scheduler).await;

        assert!(f.scheduler.delete(&scheduled.id).await.unwrap());
        assert!(!f.scheduler.delete(&scheduled.id).await.unwrap());
        assert!(f.scheduler.get(&scheduled.id).is_none());
        assert!(f.repository.is_empty());
    }

    #[tokio::test]
    async fn test_init_loads_persisted_schedules() {
        let f = fixture(MockExecutor::new());
        let scheduled = create_daily(&f.scheduler).await;

        let restarted = ScanScheduler::new(
            f.executor.clone(),
            f.repository.clone(),
            f.clock.clone(),
        );
        assert_eq!(restarted.init().await.unwrap(), 1);
        assert_eq!(restarted.get(&scheduled.id), Some(scheduled));
    }

    #[tokio::test]
    async fn test_start_and_shutdown() {
        let f = fixture(MockExecutor::new());
        create_daily(&f.scheduler).await;
        f.clock.advance(ChronoDuration::days(1));

        let scheduler = Arc::new(f.scheduler);
        let handle = scheduler.start(Duration::from_millis(10));
        tokio::time::sleep(Duration::from_millis(80)).await;
        scheduler.shutdown();
        handle.await.unwrap();

        // the clock stands still, so the schedule fired exactly once
        assert_eq!(f.executor.calls(), 1);
        assert_eq!(scheduler.list()[0].run_count, 1);
    }
}
