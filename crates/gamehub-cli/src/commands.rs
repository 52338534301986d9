//! Subcommand implementations.

use std::sync::Arc;
use std::time::Duration;

use gamehub_broadcast::application::watch_link::watch_link;
use gamehub_client::{ApiClient, HttpLeaderboardClient, HttpScoreSink, HttpTokenIssuer};
use gamehub_core::clock::SystemClock;
use gamehub_core::ids::GameId;
use gamehub_core::scheduler::IntervalTickScheduler;
use gamehub_core::token::{ParticipantRole, TokenIssuer, TokenRequest};
use gamehub_session::application::controller::{
    ConfirmOutcome, ExitDecision, ExitReport, SessionController,
};
use gamehub_session::application::query_handlers::get_leaderboard;
use gamehub_session::domain::game::GameRef;
use gamehub_session::domain::navigation::UnloadEvent;
use tracing::{info, warn};

use crate::cli::PlayArgs;
use crate::config::Config;
use crate::error::CliError;

/// How often the running score is logged.
const SCORE_LOG_INTERVAL: Duration = Duration::from_secs(5);

/// Plays until Ctrl-C or the optional deadline, then leaves through the
/// exit flow, confirming automatically.
pub async fn play(config: &Config, args: PlayArgs) -> Result<(), CliError> {
    let api = ApiClient::new(&config.api_url, config.http_timeout)?;
    let sink = Arc::new(HttpScoreSink::new(api, config.auth_token.clone()));
    let controller = SessionController::new(
        Arc::new(SystemClock),
        Arc::new(IntervalTickScheduler::new(config.tick_interval)),
        sink,
    );

    let game_id = GameId::new(args.game_id.as_str());
    let play_for = args.duration_secs.map(Duration::from_secs);
    let session_id = controller.start(&GameRef::new(args.game_id, args.name, args.url))?;
    info!(
        %session_id,
        watch_link = %watch_link(&config.origin, &game_id),
        "playing, press Ctrl-C to leave"
    );

    let deadline = async move {
        match play_for {
            Some(duration) => tokio::time::sleep(duration).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline);
    let mut score_log = tokio::time::interval(SCORE_LOG_INTERVAL);

    loop {
        tokio::select! {
            signal = tokio::signal::ctrl_c() => {
                signal?;
                break;
            }
            () = &mut deadline => break,
            _ = score_log.tick() => info!(score = controller.score(), "playing"),
        }
    }

    let mut unload = UnloadEvent::new();
    if controller.on_before_unload(&mut unload) {
        warn!(message = unload.return_value(), "leaving with unsaved progress");
    }

    let report = match controller.request_exit().await? {
        ExitDecision::Exited(report) => Some(report),
        ExitDecision::ConfirmationRequired(prompt) => {
            info!(message = %prompt.message, "confirming exit");
            match controller.confirm_exit().await? {
                ConfirmOutcome::Completed(report) => Some(report),
                ConfirmOutcome::AlreadySaving => None,
            }
        }
    };

    if let Some(banner) = controller.banner() {
        warn!(%banner, "session ended with a warning");
    }
    if let Some(report) = report {
        println!("{}", render_report(&report)?);
    }
    Ok(())
}

fn render_report(report: &ExitReport) -> Result<String, serde_json::Error> {
    serde_json::to_string(&serde_json::json!({
        "gameId": report.game_id.as_str(),
        "finalScore": report.final_score,
        "saved": report.saved,
    }))
}

/// Prints the leaderboard of `game_id`; an unavailable board prints empty.
pub async fn leaderboard(config: &Config, game_id: &str) -> Result<(), CliError> {
    let api = ApiClient::new(&config.api_url, config.http_timeout)?;
    let client = HttpLeaderboardClient::new(api);
    let view = get_leaderboard(&GameId::new(game_id), &client).await;
    println!("{}", serde_json::to_string_pretty(&view)?);
    Ok(())
}

/// Requests a fresh room credential for `game_id` and renders it as JSON
/// for a relay client to join with.
pub async fn issue_token(
    config: &Config,
    game_id: &str,
    role: ParticipantRole,
) -> Result<String, CliError> {
    let api = ApiClient::new(&config.api_url, config.http_timeout)?;
    let issuer = HttpTokenIssuer::new(api);
    let request = TokenRequest::fresh(&GameId::new(game_id), role);
    let token = issuer.issue_token(&request).await?;
    info!(game_id, %role, identity = %request.identity, "room credential issued");

    Ok(serde_json::to_string_pretty(&serde_json::json!({
        "roomName": request.room.as_str(),
        "identity": request.identity,
        "role": role,
        "token": token.expose(),
    }))?)
}

/// Prints the watch link of `game_id`.
pub fn print_watch_link(config: &Config, game_id: &str) {
    println!("{}", watch_link(&config.origin, &GameId::new(game_id)));
}
