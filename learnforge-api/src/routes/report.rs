//! Report REST Routes

use axum::{
    extract::{Path, Query, State},
    Json,
};
use chrono::{Days, NaiveDate, Utc};
use learnforge_core::GenerationResult;
use serde::Deserialize;

use crate::constants::{DEFAULT_TOPIC_LIMIT, MAX_TOPIC_LIMIT};
use crate::error::{ApiError, ApiResult};
use crate::services::DailySummary;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct DailyQuery {
    /// `YYYY-MM-DD`; yesterday (UTC) when absent.
    pub date: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TopicQuery {
    pub limit: Option<usize>,
}

fn parse_date(raw: Option<&str>) -> ApiResult<NaiveDate> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map_err(|_| ApiError::invalid_argument("invalid date format (use YYYY-MM-DD)")),
        None => {
            let today = Utc::now().date_naive();
            Ok(today.checked_sub_days(Days::new(1)).unwrap_or(today))
        }
    }
}

/// GET /v1/reports/daily?date=YYYY-MM-DD
pub async fn daily_summary(
    State(state): State<AppState>,
    Query(query): Query<DailyQuery>,
) -> ApiResult<Json<DailySummary>> {
    let date = parse_date(query.date.as_deref())?;
    Ok(Json(state.reports.daily_summary(date).await?))
}

/// GET /v1/reports/topics/:topic?limit=N
pub async fn recent_by_topic(
    State(state): State<AppState>,
    Path(topic): Path<String>,
    Query(query): Query<TopicQuery>,
) -> ApiResult<Json<Vec<GenerationResult>>> {
    let limit = query.limit.unwrap_or(DEFAULT_TOPIC_LIMIT).clamp(1, MAX_TOPIC_LIMIT);
    Ok(Json(state.reports.recent_by_topic(&topic, limit).await?))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date(Some("2025-02-28")).unwrap(),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert!(parse_date(Some("28/02/2025")).is_err());
        assert!(parse_date(Some("2025-02-30")).is_err());
    }

    #[test]
    fn test_missing_date_means_yesterday() {
        let yesterday = Utc::now().date_naive().pred_opt().unwrap();
        let parsed = parse_date(None).unwrap();
        // Tolerate a midnight rollover between the two reads.
        assert!(parsed == yesterday || parsed == yesterday.succ_opt().unwrap());
        assert_eq!(parse_date(Some("  ")).unwrap(), parsed);
    }
}
