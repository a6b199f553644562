// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Preview deployment controller binary.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use preview_server::jobs::{HealthReportJob, IdleReaperJob};
use preview_server::{create_alerter, create_app_state, create_router, SystemClock};
use preview_server_jobs::{JobScheduler, RunHistory};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod version;

/// Preview server - webhook-driven PR preview environments.
#[derive(Parser, Debug)]
#[command(
	name = "preview-server",
	about = "PR preview deployment controller",
	version
)]
struct Args {
	/// TOML configuration file (default /etc/preview/server.toml)
	#[arg(long, env = "PREVIEW_SERVER_CONFIG")]
	config: Option<PathBuf>,

	#[command(subcommand)]
	command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
	/// Show version and build information
	Version,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
	let args = Args::parse();

	if let Some(Command::Version) = args.command {
		println!("{}", version::format_version_info());
		return Ok(());
	}

	dotenvy::dotenv().ok();

	let config = match &args.config {
		Some(path) => preview_server_config::load_config_with_file(path)?,
		None => preview_server_config::load_config()?,
	};

	tracing_subscriber::registry()
		.with(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| config.logging.level.clone().into()),
		)
		.with(tracing_subscriber::fmt::layer())
		.init();

	tracing::info!(
		host = %config.http.host,
		port = config.http.port,
		route_prefix = %config.http.route_prefix,
		"starting preview-server"
	);

	tokio::fs::create_dir_all(&config.paths.servers_dir).await?;

	let alerter = create_alerter(&config.notify)?;
	tracing::info!(notifier = alerter.notifier_name(), "Alerting configured");

	let mut state = create_app_state(config.clone(), alerter.clone());

	let mut scheduler = JobScheduler::new(Arc::new(RunHistory::new()));

	if config.jobs.idle_reaper_enabled {
		let interval = Duration::from_secs(config.jobs.idle_reaper_interval_secs);
		let threshold = Duration::from_secs(config.jobs.idle_threshold_secs);
		scheduler.register_periodic(
			Arc::new(
				IdleReaperJob::new(
					Arc::clone(&state.store),
					Arc::new(SystemClock),
					Arc::clone(&state.launcher),
					Arc::clone(&state.router),
					alerter.clone(),
					threshold,
				)
				.with_launch_options(state.launch_options.clone()),
			),
			interval,
		);
		tracing::info!(
			interval = %humantime::format_duration(interval),
			threshold = %humantime::format_duration(threshold),
			"Idle reaper registered"
		);
	}

	if config.jobs.health_report_enabled {
		let interval = Duration::from_secs(config.jobs.health_report_interval_secs);
		scheduler.register_periodic(
			Arc::new(HealthReportJob::new(
				Arc::clone(&state.store),
				Arc::clone(&state.details),
				state.extractor.clone(),
				alerter.clone(),
				config.jobs.health_tail_lines,
			)),
			interval,
		);
		tracing::info!(
			interval = %humantime::format_duration(interval),
			tail_lines = config.jobs.health_tail_lines,
			"Health report registered"
		);
	}

	let scheduler = Arc::new(scheduler);
	scheduler.start().await;
	state.scheduler = Some(Arc::clone(&scheduler));

	let app = create_router(state).layer(TraceLayer::new_for_http());

	let addr = config.socket_addr();
	let listener = tokio::net::TcpListener::bind(&addr).await?;
	tracing::info!(addr = %addr, "preview-server listening");

	tokio::select! {
		result = axum::serve(listener, app) => {
			if let Err(e) = result {
				tracing::error!(error = %e, "server error");
			}
		}
		_ = tokio::signal::ctrl_c() => {
			tracing::info!("received shutdown signal");
		}
	}

	scheduler.shutdown().await;
	tracing::info!("preview-server stopped");

	Ok(())
}
