use axum::extract::{Path, Query, State};
use axum::Json;
use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::state::AppState;
use crate::api::{ApiError, Pagination, PaginationMeta};
use crate::calculate::{aggregate_with, classify, find_winner};
use crate::feed::{scoreboard_rows, ScoreboardRow, SnapshotUpdate};
use crate::models::{
    joined_tournaments, Match, MatchResult, MissingOfficials, StatColumn, Tournament,
    TournamentId, UserId,
};

async fn latest(state: &AppState, id: &str) -> Result<SnapshotUpdate, ApiError> {
    state
        .hub
        .latest(&TournamentId::from(id))
        .await
        .ok_or_else(|| ApiError::NotFound(format!("Tournament {id} not found")))
}

// ── List ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ListTournamentsParams {
    pub page: Option<u32>,
    pub page_size: Option<u32>,
    /// Only tournaments this user has joined
    pub player: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TournamentSummary {
    pub id: String,
    pub name: String,
    pub start_date: String,
    pub end_date: String,
    pub location: String,
    pub max_players: u32,
    pub player_count: usize,
    pub is_full: bool,
    pub has_started: bool,
    pub is_cancelled: bool,
    pub all_matches_played: bool,
    pub winner: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TournamentListResponse {
    pub tournaments: Vec<TournamentSummary>,
    pub pagination: PaginationMeta,
}

pub async fn list_tournaments(
    State(state): State<AppState>,
    Query(params): Query<ListTournamentsParams>,
) -> Result<Json<TournamentListResponse>, ApiError> {
    let snapshots: Vec<Tournament> = state
        .hub
        .all()
        .await
        .into_iter()
        .map(|u| (*u.tournament).clone())
        .collect();

    if snapshots.is_empty() {
        return Err(ApiError::NotFound("No tournaments found".to_string()));
    }

    let mut tournaments: Vec<&Tournament> = match params.player {
        Some(ref player) => joined_tournaments(&snapshots, &UserId::from(player.as_str())),
        None => snapshots.iter().collect(),
    };
    tournaments.sort_by(|a, b| {
        b.start_date
            .cmp(&a.start_date)
            .then_with(|| a.name.cmp(&b.name))
    });

    let pagination = Pagination::new(params.page, params.page_size);
    let meta = PaginationMeta::new(&pagination, tournaments.len() as u32);

    let now = Utc::now();
    let summaries = pagination
        .slice(&tournaments)
        .iter()
        .map(|t| {
            // A finished tournament whose snapshot does not add up still
            // gets listed, just without a winner.
            let winner = find_winner(t, &state.rules)
                .ok()
                .flatten()
                .map(|id| t.player_name(&id));

            TournamentSummary {
                id: t.id.to_string(),
                name: t.name.clone(),
                start_date: t.start_date.to_rfc3339(),
                end_date: t.end_date.to_rfc3339(),
                location: t.location.clone(),
                max_players: t.max_players,
                player_count: t.players.len(),
                is_full: t.is_full(),
                has_started: t.has_started(now),
                is_cancelled: t.is_cancelled(now),
                all_matches_played: t.all_matches_played(),
                winner,
            }
        })
        .collect();

    Ok(Json(TournamentListResponse {
        tournaments: summaries,
        pagination: meta,
    }))
}

// ── Snapshot ─────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct SnapshotResponse {
    pub revision: u64,
    pub tournament: Tournament,
}

pub async fn get_tournament(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SnapshotResponse>, ApiError> {
    let update = latest(&state, &id).await?;
    Ok(Json(SnapshotResponse {
        revision: update.revision,
        tournament: (*update.tournament).clone(),
    }))
}

#[derive(Debug, Serialize)]
pub struct PushResponse {
    pub revision: u64,
    pub changed: bool,
}

/// Accept a full snapshot pushed by the backend. The snapshot must derive
/// cleanly before it replaces the current one.
pub async fn push_snapshot(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(tournament): Json<Tournament>,
) -> Result<Json<PushResponse>, ApiError> {
    if tournament.id.as_str() != id {
        return Err(ApiError::BadRequest(format!(
            "Snapshot id {} does not match path id {id}",
            tournament.id
        )));
    }

    classify(&tournament.match_schedule)?;
    aggregate_with(&tournament, &state.rules)?;

    let tournament_id = tournament.id.clone();
    let response = match state.hub.publish_if_changed(tournament).await {
        Some(revision) => {
            info!(tournament = %tournament_id, revision, "Snapshot pushed");
            PushResponse {
                revision,
                changed: true,
            }
        }
        None => {
            // An unchanged snapshot means one is already stored.
            let current = state.hub.latest(&tournament_id).await.ok_or_else(|| {
                ApiError::Internal(format!("Snapshot for {tournament_id} disappeared"))
            })?;
            PushResponse {
                revision: current.revision,
                changed: false,
            }
        }
    };

    Ok(Json(response))
}

// ── Scoreboard ───────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct ScoreboardResponse {
    pub tournament_id: String,
    pub revision: u64,
    pub columns: Vec<&'static str>,
    pub same_names: bool,
    pub rows: Vec<ScoreboardRow>,
    pub winner: Option<String>,
}

pub async fn scoreboard(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ScoreboardResponse>, ApiError> {
    let update = latest(&state, &id).await?;
    let tournament = &update.tournament;

    let standings = aggregate_with(tournament, &state.rules)?;
    let same_names = tournament.has_same_names();
    let winner = find_winner(tournament, &state.rules)?.map(|id| tournament.player_name(&id));

    Ok(Json(ScoreboardResponse {
        tournament_id: tournament.id.to_string(),
        revision: update.revision,
        columns: StatColumn::ALL.iter().map(StatColumn::label).collect(),
        same_names,
        rows: scoreboard_rows(&standings, same_names),
        winner,
    }))
}

// ── Matches ──────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct MatchCard {
    pub id: String,
    pub players: Vec<String>,
    /// Only shown once a winner has been declared
    pub score: Option<String>,
    pub winner: Option<String>,
    pub elapsed_time: f64,
    pub match_time: f64,
    pub is_playoff: bool,
    /// Only reported while the clock has not run
    pub missing_officials: Option<MissingOfficials>,
    /// Byes have no match page to open
    pub navigable: bool,
}

impl MatchCard {
    fn new(m: &Match, tournament: &Tournament, same_names: bool) -> Self {
        Self {
            id: m.id.to_string(),
            players: m
                .players
                .iter()
                .map(|p| p.display_name(same_names))
                .collect(),
            score: m.winner.as_ref().map(|_| m.score_line()),
            winner: m.winner.as_ref().map(|id| tournament.player_name(id)),
            elapsed_time: m.elapsed_time,
            match_time: m.match_time,
            is_playoff: m.is_playoff(),
            missing_officials: (m.elapsed_time <= 0.0).then(|| m.missing_officials()),
            navigable: !m.is_bye(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MatchesResponse {
    pub tournament_id: String,
    pub revision: u64,
    pub ongoing: Vec<MatchCard>,
    pub upcoming: Vec<MatchCard>,
    pub past: Vec<MatchCard>,
}

pub async fn matches(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MatchesResponse>, ApiError> {
    let update = latest(&state, &id).await?;
    let tournament = &update.tournament;

    let buckets = classify(&tournament.match_schedule)?;
    let same_names = tournament.has_same_names();
    let cards = |matches: &[Match]| -> Vec<MatchCard> {
        matches
            .iter()
            .map(|m| MatchCard::new(m, tournament, same_names))
            .collect()
    };

    Ok(Json(MatchesResponse {
        tournament_id: tournament.id.to_string(),
        revision: update.revision,
        ongoing: cards(&buckets.ongoing),
        upcoming: cards(&buckets.upcoming),
        past: cards(&buckets.past),
    }))
}

// ── Player matches ───────────────────────────────────────────────

#[derive(Debug, Serialize)]
pub struct PlayerMatchEntry {
    pub match_id: String,
    /// `None` for a bye
    pub opponent: Option<String>,
    pub score: String,
    pub result: MatchResult,
}

#[derive(Debug, Serialize)]
pub struct PlayerMatchesResponse {
    pub player_id: String,
    pub player_name: String,
    pub matches: Vec<PlayerMatchEntry>,
}

pub async fn player_matches(
    State(state): State<AppState>,
    Path((id, player_id)): Path<(String, String)>,
) -> Result<Json<PlayerMatchesResponse>, ApiError> {
    let update = latest(&state, &id).await?;
    let tournament = &update.tournament;
    let player_id = UserId::from(player_id.as_str());

    if !tournament.has_player(&player_id) {
        return Err(ApiError::NotFound(format!(
            "Player {player_id} is not registered in tournament {id}"
        )));
    }

    let same_names = tournament.has_same_names();
    let entries = tournament
        .player_matches(&player_id)
        .into_iter()
        .map(|m| PlayerMatchEntry {
            match_id: m.id.to_string(),
            opponent: m
                .players
                .iter()
                .find(|p| p.id != player_id)
                .map(|p| p.display_name(same_names)),
            score: m.score_line(),
            result: m.result_for(&player_id).unwrap_or(MatchResult::Pending),
        })
        .collect();

    Ok(Json(PlayerMatchesResponse {
        player_name: tournament.player_name(&player_id),
        player_id: player_id.to_string(),
        matches: entries,
    }))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use serde_json::Value;
    use tower::util::ServiceExt;

    use crate::api::build_router;
    use crate::api::state::AppState;
    use crate::feed::SnapshotHub;
    use crate::models::fixtures::*;
    use crate::models::{ScoringRules, Tournament};

    fn app(hub: Arc<SnapshotHub>) -> axum::Router {
        build_router(AppState {
            hub,
            rules: ScoringRules::default(),
        })
    }

    async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    async fn put_json(app: axum::Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let resp = app
            .oneshot(
                Request::builder()
                    .method("PUT")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = resp.status();
        let body = axum::body::to_bytes(resp.into_body(), usize::MAX)
            .await
            .unwrap();
        let json: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
        (status, json)
    }

    /// Alice beat Bob, Alice v Carol is running, Bob v Carol has not
    /// started and Carol has a bye.
    fn round_robin() -> Tournament {
        let a = user("1", "Alice", "Aoki");
        let b = user("2", "Bob", "Baba");
        let c = user("3", "Carol", "Chiba");

        let mut played = bout("m1", &a, &b, 300.0, 300.0);
        played.player1_score = 2;
        played.player2_score = 1;
        played.winner = Some(a.id.clone());
        played.end_timestamp = ended();

        let running = bout("m2", &a, &c, 45.0, 300.0);

        let mut waiting = bout("m3", &b, &c, 0.0, 300.0);
        waiting.time_keeper = Some(a.id.clone());

        let mut bye = bout("m4", &c, &c, 0.0, 300.0);
        bye.players.pop();

        tournament(vec![a, b, c], vec![played, running, waiting, bye])
    }

    async fn seeded() -> Arc<SnapshotHub> {
        let hub = Arc::new(SnapshotHub::default());
        hub.publish(round_robin()).await;
        hub
    }

    #[tokio::test]
    async fn test_health() {
        let (status, json) = get_json(app(seeded().await), "/api/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["status"], "ok");
        assert_eq!(json["tournaments"], 1);
    }

    #[tokio::test]
    async fn test_list_empty_is_not_found() {
        let hub = Arc::new(SnapshotHub::default());
        let (status, json) = get_json(app(hub), "/api/tournaments").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(json["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_list_newest_first_and_player_filter() {
        let hub = seeded().await;
        let mut older = tournament(vec![user("9", "Dan", "Doi")], vec![]);
        older.id = "t0".into();
        older.name = "Winter Cup".to_string();
        older.start_date = older.start_date - chrono::Duration::days(90);
        hub.publish(older).await;

        let (status, json) = get_json(app(hub.clone()), "/api/tournaments").await;
        assert_eq!(status, StatusCode::OK);
        let list = json["tournaments"].as_array().unwrap();
        assert_eq!(list.len(), 2);
        assert_eq!(list[0]["id"], "t1");
        assert_eq!(list[0]["player_count"], 3);
        assert_eq!(list[0]["has_started"], true);
        assert_eq!(list[0]["all_matches_played"], false);
        assert_eq!(list[1]["is_cancelled"], true);
        assert_eq!(json["pagination"]["total_items"], 2);

        let (_, json) = get_json(app(hub), "/api/tournaments?player=9").await;
        let list = json["tournaments"].as_array().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0]["name"], "Winter Cup");
    }

    #[tokio::test]
    async fn test_get_unknown_tournament() {
        let (status, _) = get_json(app(seeded().await), "/api/tournaments/nope").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_get_tournament_uses_wire_names() {
        let (status, json) = get_json(app(seeded().await), "/api/tournaments/t1").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["revision"], 1);
        assert_eq!(json["tournament"]["maxPlayers"], 8);
        assert_eq!(
            json["tournament"]["matchSchedule"][0]["player1Score"],
            2
        );
    }

    #[tokio::test]
    async fn test_scoreboard() {
        let (status, json) = get_json(app(seeded().await), "/api/tournaments/t1/scoreboard").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            json["columns"],
            serde_json::json!(["Points", "Ippons", "Wins", "Losses", "Ties"])
        );
        assert_eq!(json["same_names"], false);
        assert!(json["winner"].is_null());

        let rows = json["rows"].as_array().unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0]["name"], "Alice Aoki");
        assert_eq!(rows[0]["rank"], 1);
        assert_eq!(rows[0]["stats"][0]["value"], 3);
        assert_eq!(rows[0]["stats"][1]["value"], 2);
    }

    #[tokio::test]
    async fn test_matches_bucketed() {
        let (status, json) = get_json(app(seeded().await), "/api/tournaments/t1/matches").await;
        assert_eq!(status, StatusCode::OK);

        let past = json["past"].as_array().unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0]["score"], "2 - 1");
        assert_eq!(past[0]["winner"], "Alice Aoki");
        assert!(past[0]["missing_officials"].is_null());

        let ongoing = json["ongoing"].as_array().unwrap();
        assert_eq!(ongoing.len(), 1);
        assert_eq!(ongoing[0]["id"], "m2");
        assert!(ongoing[0]["score"].is_null());

        let upcoming = json["upcoming"].as_array().unwrap();
        assert_eq!(upcoming.len(), 2);
        assert_eq!(upcoming[0]["missing_officials"], "point_maker");
        assert_eq!(upcoming[1]["navigable"], false);
        assert_eq!(upcoming[1]["players"], serde_json::json!(["Carol Chiba"]));
    }

    #[tokio::test]
    async fn test_missing_officials_for_match_closed_before_clock_ran() {
        let a = user("1", "Alice", "Aoki");
        let b = user("2", "Bob", "Baba");
        let mut walkover = bout("m1", &a, &b, 0.0, 300.0);
        walkover.end_timestamp = ended();
        walkover.point_maker = Some(a.id.clone());

        let hub = Arc::new(SnapshotHub::default());
        hub.publish(tournament(vec![a, b], vec![walkover])).await;

        let (status, json) = get_json(app(hub), "/api/tournaments/t1/matches").await;
        assert_eq!(status, StatusCode::OK);
        let past = json["past"].as_array().unwrap();
        assert_eq!(past.len(), 1);
        assert_eq!(past[0]["missing_officials"], "time_keeper");
    }

    #[tokio::test]
    async fn test_player_matches() {
        let (status, json) =
            get_json(app(seeded().await), "/api/tournaments/t1/players/2/matches").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["player_name"], "Bob Baba");

        let matches = json["matches"].as_array().unwrap();
        assert_eq!(matches.len(), 2);
        assert_eq!(matches[0]["opponent"], "Alice Aoki");
        assert_eq!(matches[0]["result"], "lost");
        assert_eq!(matches[1]["result"], "pending");
    }

    #[tokio::test]
    async fn test_player_matches_unknown_player() {
        let (status, _) =
            get_json(app(seeded().await), "/api/tournaments/t1/players/42/matches").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_push_publishes_new_revision() {
        let hub = seeded().await;
        let mut next = round_robin();
        next.match_schedule[1].elapsed_time = 120.0;
        let body = serde_json::to_string(&next).unwrap();

        let (status, json) = put_json(app(hub.clone()), "/api/tournaments/t1", &body).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(json["revision"], 2);
        assert_eq!(json["changed"], true);

        let (_, json) = put_json(app(hub.clone()), "/api/tournaments/t1", &body).await;
        assert_eq!(json["revision"], 2);
        assert_eq!(json["changed"], false);

        let latest = hub.latest(&"t1".into()).await.unwrap();
        assert_eq!(latest.tournament.match_schedule[1].elapsed_time, 120.0);
    }

    #[tokio::test]
    async fn test_push_rejects_mismatched_id() {
        let body = serde_json::to_string(&round_robin()).unwrap();
        let (status, json) = put_json(app(seeded().await), "/api/tournaments/t2", &body).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(json["error"]["code"], "BAD_REQUEST");
    }

    #[tokio::test]
    async fn test_push_rejects_inconsistent_snapshot() {
        let hub = seeded().await;
        let mut broken = round_robin();
        // Carol is still scheduled but no longer registered
        broken.players.pop();
        let body = serde_json::to_string(&broken).unwrap();

        let (status, json) = put_json(app(hub.clone()), "/api/tournaments/t1", &body).await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(json["error"]["code"], "INCONSISTENT_SNAPSHOT");
        assert_eq!(hub.latest(&"t1".into()).await.unwrap().revision, 1);
    }

    #[tokio::test]
    async fn test_push_rejects_missing_fields() {
        let (status, _) = put_json(
            app(seeded().await),
            "/api/tournaments/t1",
            r#"{"id":"t1","name":"Spring Open"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    }
}
