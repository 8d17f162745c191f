// ABOUTME: Server binary: loads configuration, opens the store, loads the classifier, serves HTTP
// ABOUTME: Command-line flags override the matching environment settings
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 GlucoWise Contributors

//! # GlucoWise Server Binary
//!
//! Starts the GlucoWise HTTP API with Firebase authentication, the document store and
//! the diabetes risk classifier.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use glucowise_intelligence::{ForestModel, MetricsConfig};
use glucowise_server::{
    auth::{FirebaseAuth, FirebaseIdentityClient},
    config::ServerConfig,
    llm::GeminiProvider,
    logging::{self, AppLogger},
    resources::{ExternalServices, ServerResources},
    server,
    store::create_store,
    vision::ClarifaiRecognizer,
};
use tracing::info;

/// Timeout for outbound calls to hosted services
const HTTP_CLIENT_TIMEOUT_SECS: u64 = 60;

#[derive(Parser)]
#[command(name = "glucowise-server")]
#[command(about = "GlucoWise API - health profiles, body metrics, diabetes risk and diet assistant")]
pub struct Args {
    /// Override HTTP port
    #[arg(long)]
    http_port: Option<u16>,

    /// Override the classifier artifact path
    #[arg(long)]
    model_path: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = ServerConfig::from_env()?;
    if let Some(http_port) = args.http_port {
        config.http_port = http_port;
    }
    if let Some(model_path) = args.model_path {
        config.classifier.model_path = model_path;
    }

    logging::init_from_env()?;
    config.validate()?;

    info!("Starting GlucoWise API");
    info!("{}", config.summary());

    let root_logger = AppLogger::new("glucowise");

    let store = create_store(&config.database_url, root_logger.child("store")).await?;
    info!("Document store ready: {}", config.database_url);

    let model = ForestModel::load(&config.classifier.model_path).with_context(|| {
        format!(
            "Failed to load diabetes classifier from {}",
            config.classifier.model_path.display()
        )
    })?;
    info!(
        "Diabetes classifier loaded from {}",
        config.classifier.model_path.display()
    );

    let http_client = reqwest::Client::builder()
        .timeout(Duration::from_secs(HTTP_CLIENT_TIMEOUT_SECS))
        .build()
        .context("Failed to build HTTP client")?;

    let web_api_key = config
        .firebase
        .web_api_key
        .clone()
        .context("FIREBASE_WEB_API_KEY is required")?;
    let gemini_key = config
        .gemini
        .api_key
        .clone()
        .context("GEMINI_API_KEY is required")?;
    let clarifai_pat = config
        .clarifai
        .pat
        .clone()
        .context("CLARIFAI_PAT is required")?;

    let external = ExternalServices {
        verifier: Arc::new(FirebaseAuth::new(
            config.firebase.clone(),
            http_client.clone(),
            root_logger.child("firebase_auth"),
        )),
        identity: Arc::new(FirebaseIdentityClient::new(
            web_api_key,
            http_client.clone(),
            root_logger.child("identity"),
        )),
        llm: Arc::new(GeminiProvider::new(
            gemini_key,
            config.gemini.model.clone(),
            http_client.clone(),
            root_logger.child("gemini"),
        )),
        vision: Arc::new(ClarifaiRecognizer::new(
            clarifai_pat,
            &config.clarifai.model_url,
            http_client,
            root_logger.child("clarifai"),
        )?),
    };

    let resources = Arc::new(ServerResources::new(
        Arc::new(config),
        store,
        external,
        Arc::new(model),
        MetricsConfig::default(),
        &root_logger,
    ));

    server::serve(resources).await
}
