use std::sync::Arc;

use clap::Parser;
use itertools::Itertools;

use crate::{
    api::frank_energie::discover_device_ids,
    cli::FrankEnergieArgs,
    core::{Coordinator, Poller, Sensor, poller::unblock},
    prelude::*,
    tables::build_readings_table,
};

#[derive(Parser)]
pub struct WatchArgs {
    #[clap(flatten)]
    frank_energie: FrankEnergieArgs,

    #[clap(long, env = "POLLING_INTERVAL", default_value = "15min")]
    polling_interval: humantime::Duration,
}

impl WatchArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let client = self.frank_energie.login().await?;

        let device_ids = {
            let client = Arc::clone(&client);
            unblock(move || discover_device_ids(&client.list_smart_batteries()?))
                .await
                .context("failed to discover the smart batteries")?
        };
        if device_ids.is_empty() {
            warn!("no smart batteries found for the account");
            return Ok(());
        }
        info!(n_batteries = device_ids.len(), "discovered");

        let coordinators = device_ids
            .into_iter()
            .map(|device_id| Arc::new(Coordinator::new(Arc::clone(&client), device_id)))
            .collect_vec();
        let poller = Poller::builder()
            .coordinators(coordinators.clone())
            .interval(self.polling_interval)
            .build();
        poller.first_refresh().await?;

        let readings = coordinators
            .iter()
            .flat_map(|coordinator| {
                let snapshot = coordinator.snapshot();
                Sensor::for_device(coordinator.device_id())
                    .map(|sensor| sensor.read(snapshot.as_deref()))
            })
            .collect_vec();
        println!("{}", build_readings_table(&readings));

        tokio::select! {
            result = poller.run() => result,
            () = shutdown_signal() => {
                info!("shutting down…");
                Ok(())
            }
        }
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(error) = tokio::signal::ctrl_c().await {
            error!("failed to listen for Ctrl+C: {error:#}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(error) => {
                error!("failed to install the signal handler: {error:#}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }
}
