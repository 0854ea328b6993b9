// SPDX-FileCopyrightText: 2026 EZShop Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `ezshop ask`: one turn through the full pipeline, reply printed as JSON.

use std::path::PathBuf;
use std::time::Duration;

use ezshop::{Runtime, init_tracing};
use ezshop_agent::TurnRequest;
use ezshop_config::EzshopConfig;
use ezshop_core::EzshopError;

pub struct AskArgs {
    pub user: String,
    pub conversation: Option<String>,
    pub image: Option<PathBuf>,
    pub text: Option<String>,
}

pub async fn run_ask(config: EzshopConfig, args: AskArgs) -> Result<(), EzshopError> {
    init_tracing(&config.agent.log_level);

    let image = match &args.image {
        Some(path) => Some(tokio::fs::read(path).await.map_err(|e| {
            EzshopError::InvalidArgument(format!("cannot read image {}: {e}", path.display()))
        })?),
        None => None,
    };

    let runtime = Runtime::build(&config).await?;
    let result = runtime
        .orchestrator
        .handle(TurnRequest {
            user_id: args.user,
            conversation_id: args.conversation,
            text: args.text,
            image,
        })
        .await;

    // Writes finish before exit so the next `ask` sees this turn.
    runtime.shutdown(Duration::from_secs(30)).await;

    let reply = result.map_err(|failure| failure.into_error())?;
    let json = serde_json::to_string_pretty(&reply)
        .map_err(|e| EzshopError::Internal(format!("failed to render reply: {e}")))?;
    println!("{json}");
    Ok(())
}
