//! Public score listing of a leaderboard.
//!
//! Scores are readable without a credential, so failures here are reported
//! to the caller and never touch the session.

use tracing::debug;

use crate::error::ScoresError;
use crate::model::{LeaderboardId, Score};
use crate::sync::SCORES_PATH;
use crate::transport::{fetch_json, ApiRequest, Transport};

/// Fetch the scores recorded on a leaderboard, in server order.
pub async fn fetch_scores(
    transport: &dyn Transport,
    leaderboard: &LeaderboardId,
) -> Result<Vec<Score>, ScoresError> {
    if leaderboard.as_str().is_empty() {
        return Err(ScoresError::EmptyIdentifier);
    }
    let request = ApiRequest::get(SCORES_PATH).with_segment(leaderboard.as_str());
    let scores: Vec<Score> = fetch_json(transport, request).await?;
    debug!(leaderboard = %leaderboard, count = scores.len(), "Scores loaded");
    Ok(scores)
}

/// Best score of a listing, if any.
pub fn best_score(scores: &[Score]) -> Option<&Score> {
    scores.iter().max_by(|a, b| a.score.total_cmp(&b.score))
}
