use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use oidc_test_client::cli::{healthcheck, Cli, Command, DeviceArgs, ServerArgs};
use oidc_test_client::core::ReqwestHttpTransport;
use oidc_test_client::flows::{DeviceCodeRequest, DeviceDriver, FlowDriver};
use oidc_test_client::server::{router, serve, AppState};
use oidc_test_client::session::SessionKey;
use oidc_test_client::OidcTestClient;

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    cli.logging()
        .init()
        .context("failed to install log subscriber")?;

    match cli.command {
        None | Some(Command::Serve) => run_server(&cli.server).await?,
        Some(Command::Device(ref args)) => run_device(args).await?,
        Some(Command::Healthcheck) => {
            let transport = ReqwestHttpTransport::new()?;
            if !healthcheck(&transport, &cli.server.health_url()).await {
                return Ok(ExitCode::FAILURE);
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

async fn run_server(args: &ServerArgs) -> anyhow::Result<()> {
    let config = args.client_config().context("invalid configuration")?;
    tracing::info!(
        provider = %config.provider_url,
        root_url = %config.root_url,
        "discovering provider"
    );

    let client = OidcTestClient::connect(config)
        .await
        .context("provider discovery failed")?;
    let state = AppState::new(&client, SessionKey::generate());

    serve(router(state, &args.static_dir), &args.bind)
        .await
        .with_context(|| format!("server on {} failed", args.bind))
}

async fn run_device(args: &DeviceArgs) -> anyhow::Result<()> {
    let driver = DeviceDriver::new(
        args.device_url.clone(),
        args.token_url.clone(),
        args.client_id.clone(),
        Arc::new(ReqwestHttpTransport::new()?),
    );

    let code = driver
        .initiate(DeviceCodeRequest {
            scopes: args.scopes.clone(),
        })
        .await
        .context("device authorization request failed")?;

    println!("User code: {}", code.user_code);
    println!("Verification URI: {}", code.verification_uri);
    if let Some(complete) = &code.verification_uri_complete {
        println!("Or open: {}", complete);
    }

    let tokens = driver.finalize(code).await.context("device flow failed")?;
    println!("Access token: {}", tokens.access_token);
    Ok(())
}
