use std::{sync::Arc, time::Duration};

use bon::Builder;
use tokio::{
    task::{JoinSet, spawn_blocking},
    time::{MissedTickBehavior, interval},
};

use crate::{
    api::frank_energie::ApiError,
    core::{coordinator::Coordinator, sensor::Sensor, snapshot::Snapshot},
    prelude::*,
};

/// Run a blocking client call on the blocking thread pool.
pub async fn unblock<T, F>(f: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
{
    Ok(spawn_blocking(f).await.context("the blocking task has failed")??)
}

/// Refresh the coordinator off the async runtime.
pub async fn refresh(coordinator: &Arc<Coordinator>) -> Result<Arc<Snapshot>> {
    let coordinator = Arc::clone(coordinator);
    unblock(move || coordinator.refresh()).await
}

/// Periodically refreshes the coordinators, one task per coordinator.
#[derive(Builder)]
pub struct Poller {
    coordinators: Vec<Arc<Coordinator>>,

    #[builder(into)]
    interval: Duration,
}

impl Poller {
    /// Refresh all the coordinators once, failing on the first error.
    #[instrument(skip_all)]
    pub async fn first_refresh(&self) -> Result {
        for coordinator in &self.coordinators {
            refresh(coordinator).await.with_context(|| {
                format!("failed to fetch the initial data of `{}`", coordinator.device_id())
            })?;
            log_readings(coordinator);
        }
        Ok(())
    }

    /// Poll forever. Failed ticks are logged, and the last good snapshot stays in place.
    pub async fn run(self) -> Result {
        info!(n_coordinators = self.coordinators.len(), interval = ?self.interval, "polling…");
        let mut tasks = JoinSet::new();
        for coordinator in self.coordinators {
            tasks.spawn(poll(coordinator, self.interval));
        }
        while let Some(result) = tasks.join_next().await {
            result.context("a polling task has failed")?;
        }
        Ok(())
    }
}

#[instrument(skip_all, fields(device_id = %coordinator.device_id()))]
async fn poll(coordinator: Arc<Coordinator>, period: Duration) {
    let mut interval = interval(period);
    interval.reset_after(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;
        tick(&coordinator).await;
    }
}

/// Refresh once, logging the failure instead of returning it.
async fn tick(coordinator: &Arc<Coordinator>) {
    match refresh(coordinator).await {
        Ok(_) => log_readings(coordinator),
        Err(error) if error.downcast_ref::<ApiError>().is_some_and(ApiError::is_authentication) => {
            error!("the session is no longer valid, restart to log in again: {error:#}");
        }
        Err(error) => warn!("failed to refresh, keeping the last known data: {error:#}"),
    }
}

fn log_readings(coordinator: &Coordinator) {
    let snapshot = coordinator.snapshot();
    if let Some(snapshot) = &snapshot {
        debug!(refreshed_at = %snapshot.refreshed_at, diagnostics = ?snapshot.diagnostics);
    }
    for sensor in Sensor::for_device(coordinator.device_id()) {
        let reading = sensor.read(snapshot.as_deref());
        info!(
            sensor = %reading.unique_id,
            state = %reading.state,
            attributes = %serde_json::Value::Object(reading.attributes),
        );
    }
}
