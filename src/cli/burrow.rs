use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use clap::{Parser, Subcommand};

use crate::{
    api::frank_energie::{
        ApiError,
        Client,
        DeviceId,
        RawResponse,
        SessionWindow,
        SmartBattery,
        Summary,
        discover_device_ids,
    },
    cli::FrankEnergieArgs,
    core::poller::unblock,
    prelude::*,
    tables::build_sessions_table,
};

#[derive(Parser)]
pub struct BurrowArgs {
    #[clap(flatten)]
    frank_energie: FrankEnergieArgs,

    #[command(subcommand)]
    command: BurrowCommand,
}

#[derive(Subcommand)]
enum BurrowCommand {
    /// List the smart batteries on the account.
    Batteries,

    /// Get the battery status summary.
    Summary(DeviceArgs),

    /// Get the battery details and settings.
    Battery(DeviceArgs),

    /// Get the trading sessions.
    Sessions(SessionsArgs),
}

#[derive(Parser)]
struct DeviceArgs {
    #[clap(long = "device-id", env = "FRANK_ENERGIE_DEVICE_ID")]
    device_id: String,
}

#[derive(Parser)]
struct SessionsArgs {
    #[clap(flatten)]
    device: DeviceArgs,

    /// Number of days to look back.
    #[clap(long, default_value = "7", value_parser = clap::value_parser!(u32).range(1..=366))]
    days: u32,
}

impl BurrowArgs {
    #[instrument(skip_all)]
    pub async fn run(self) -> Result {
        let client = self.frank_energie.login().await?;

        match self.command {
            BurrowCommand::Batteries => {
                let response = call(&client, Client::list_smart_batteries).await?;
                for device_id in discover_device_ids(&response)? {
                    println!("{device_id}");
                }
            }
            BurrowCommand::Summary(args) => {
                let device_id = DeviceId::from(args.device_id);
                let response = call(&client, move |client| client.get_summary(&device_id)).await?;
                let summary = response
                    .node::<Summary>("smartBatterySummary")?
                    .context("the backend returned no summary")?;
                info!(
                    status = ?summary.status,
                    state_of_charge = ?summary.state_of_charge,
                    last_update = ?summary.last_update,
                    total_result = ?summary.total_result,
                    "gotcha",
                );
            }
            BurrowCommand::Battery(args) => {
                let device_id = DeviceId::from(args.device_id);
                let response =
                    call(&client, move |client| client.get_smart_battery(&device_id)).await?;
                let battery = response
                    .node::<SmartBattery>("smartBattery")?
                    .context("the backend returned no battery")?;
                info!(id = ?battery.id, brand = ?battery.brand, capacity = ?battery.capacity, "gotcha");
                if let Some(settings) = battery.settings {
                    info!(
                        battery_mode = ?settings.battery_mode,
                        imbalance_trading_strategy = ?settings.imbalance_trading_strategy,
                        self_consumption_trading_allowed = ?settings.self_consumption_trading_allowed,
                        "settings",
                    );
                }
            }
            BurrowCommand::Sessions(args) => {
                let device_id = DeviceId::from(args.device.device_id);
                let end = Utc::now();
                let start = end
                    .checked_sub_signed(TimeDelta::days(i64::from(args.days)))
                    .context("the look-back period is out of range")?;
                let response = call(&client, move |client| {
                    client.get_sessions(&device_id, start.date_naive(), end.date_naive())
                })
                .await?;
                let window = response
                    .node::<SessionWindow>("smartBatterySessions")?
                    .context("the backend returned no sessions")?;
                info!(
                    device_id = ?window.device_id,
                    fair_use_policy_verified = ?window.fair_use_policy_verified,
                    period_start_date = ?window.period_start_date,
                    period_end_date = ?window.period_end_date,
                    period_epex_result = ?window.period_epex_result,
                    period_frank_slim = ?window.period_frank_slim,
                    period_imbalance_result = ?window.period_imbalance_result,
                    "gotcha",
                );
                println!("{}", build_sessions_table(&window));
            }
        }

        Ok(())
    }
}

async fn call<F>(client: &Arc<Client>, f: F) -> Result<RawResponse>
where
    F: FnOnce(&Client) -> Result<RawResponse, ApiError> + Send + 'static,
{
    let client = Arc::clone(client);
    unblock(move || f(&client)).await
}
