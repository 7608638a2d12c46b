use std::sync::Arc;

use clap::Parser;
use url::Url;

use crate::{
    api::frank_energie::{self, Client},
    core::poller::unblock,
    prelude::*,
};

#[derive(Parser)]
pub struct FrankEnergieArgs {
    #[clap(long = "username", env = "FRANK_ENERGIE_USERNAME")]
    username: String,

    #[clap(long = "password", env = "FRANK_ENERGIE_PASSWORD", hide_env_values = true)]
    password: String,

    #[clap(
        long = "graphql-url",
        env = "FRANK_ENERGIE_GRAPHQL_URL",
        default_value = frank_energie::DEFAULT_URL
    )]
    url: Url,
}

impl FrankEnergieArgs {
    /// Build the client and log in.
    pub async fn login(&self) -> Result<Arc<Client>> {
        let client = Arc::new(Client::new(self.url.clone()));
        let (username, password) = (self.username.clone(), self.password.clone());
        unblock({
            let client = Arc::clone(&client);
            move || client.login(&username, &password)
        })
        .await
        .context("failed to log in")?;
        ensure!(client.is_authenticated(), "the backend returned an empty token");
        Ok(client)
    }
}
