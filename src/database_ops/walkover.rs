//! Walkover (WO) correction pass.
//!
//! A walkover match is one where a participant did not appear; the rules
//! award a fixed 1-0 win to the participant who did. Rows flagged
//! `home_absent` or `away_absent` must read back as:
//!
//!   home_absent -> homeScore=0, awayScore=1, winner = away player
//!   away_absent -> homeScore=1, awayScore=0, winner = home player
//!
//! with status 'completed' in both cases. This module loads every flagged
//! row, rewrites the ones that deviate, and commits once at the end.

use anyhow::Result;
use sqlx::Row;
use tracing::{info, warn};

use crate::database_ops::db::Db;

/// Which participant failed to appear. Only the two actionable tags parse;
/// everything else (including 'none') is left alone upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AbsentStatus {
    HomeAbsent,
    AwayAbsent,
}

impl AbsentStatus {
    pub fn parse(tag: &str) -> Option<Self> {
        match tag {
            "home_absent" => Some(Self::HomeAbsent),
            "away_absent" => Some(Self::AwayAbsent),
            _ => None,
        }
    }
}

/// One row of the `matches` table, as fetched for correction.
#[derive(Debug, Clone)]
pub struct WoMatch {
    pub id: String,
    pub home_player_id: String,
    pub away_player_id: String,
    pub home_score: Option<i32>,
    pub away_score: Option<i32>,
    pub winner_id: Option<String>,
    pub absent_status: String,
    pub status: String,
}

/// The canonical outcome a walkover row must carry (status is always
/// 'completed', so it is not a field here).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalResult {
    pub home_score: i32,
    pub away_score: i32,
    pub winner_id: String,
    pub winner_side: &'static str,
}

impl WoMatch {
    /// Canonical result keyed solely on absentStatus; None for tags the
    /// rule does not cover.
    pub fn canonical(&self) -> Option<CanonicalResult> {
        match AbsentStatus::parse(&self.absent_status)? {
            AbsentStatus::HomeAbsent => Some(CanonicalResult {
                home_score: 0,
                away_score: 1,
                winner_id: self.away_player_id.clone(),
                winner_side: "Away Player",
            }),
            AbsentStatus::AwayAbsent => Some(CanonicalResult {
                home_score: 1,
                away_score: 0,
                winner_id: self.home_player_id.clone(),
                winner_side: "Home Player",
            }),
        }
    }

    /// True when any of the four persisted fields deviates from canon.
    /// NULL scores/winner always deviate.
    pub fn needs_update(&self, canon: &CanonicalResult) -> bool {
        self.home_score != Some(canon.home_score)
            || self.away_score != Some(canon.away_score)
            || self.winner_id.as_deref() != Some(canon.winner_id.as_str())
            || self.status != "completed"
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CorrectionSummary {
    pub total: usize,
    pub updated: usize,
    pub already_correct: usize,
    pub skipped_unknown: usize,
}

pub async fn load_wo_matches(db: &Db) -> Result<Vec<WoMatch>> {
    let rows = sqlx::query(
        "SELECT id, \"homePlayerId\", \"awayPlayerId\", \"homeScore\", \"awayScore\", \
                \"winnerId\", \"absentStatus\", status \
         FROM matches \
         WHERE \"absentStatus\" IN ('home_absent', 'away_absent')",
    )
    .persistent(false)
    .fetch_all(&db.pool)
    .await?;

    Ok(rows
        .into_iter()
        .map(|r| WoMatch {
            id: r.get("id"),
            home_player_id: r.get("homePlayerId"),
            away_player_id: r.get("awayPlayerId"),
            home_score: r.get::<Option<i32>, _>("homeScore"),
            away_score: r.get::<Option<i32>, _>("awayScore"),
            winner_id: r.get::<Option<String>, _>("winnerId"),
            absent_status: r.get("absentStatus"),
            status: r.get("status"),
        })
        .collect())
}

/// Scan every flagged row, rewrite deviating ones, commit once at the end.
/// With `dry_run` the full diff report is printed but nothing is written.
/// Updates issued before a mid-run failure die with the dropped transaction.
pub async fn fix_walkover_matches(db: &Db, dry_run: bool) -> Result<CorrectionSummary> {
    let matches = load_wo_matches(db).await?;
    let mut summary = CorrectionSummary {
        total: matches.len(),
        ..Default::default()
    };
    if matches.is_empty() {
        return Ok(summary);
    }

    println!("Found {} WO matches to update:\n", matches.len());

    let mut tx = if dry_run {
        None
    } else {
        Some(db.pool.begin().await?)
    };

    for m in &matches {
        let canon = match m.canonical() {
            Some(c) => c,
            None => {
                // cannot occur given the SQL filter
                warn!(match_id = %m.id, tag = %m.absent_status, "unexpected absentStatus; skipping");
                summary.skipped_unknown += 1;
                continue;
            }
        };

        if !m.needs_update(&canon) {
            println!(
                "Match {}... [{}] - Already correct, skipping\n",
                short_id(&m.id),
                m.absent_status
            );
            summary.already_correct += 1;
            continue;
        }

        println!("Match {}... [{}]", short_id(&m.id), m.absent_status);
        println!(
            "  Before: {}-{}, Winner: {}..., Status: {}",
            fmt_score(m.home_score),
            fmt_score(m.away_score),
            m.winner_id.as_deref().map(short_id).unwrap_or("None"),
            m.status
        );
        println!(
            "  After:  {}-{}, Winner: {}... ({}), Status: completed",
            canon.home_score,
            canon.away_score,
            short_id(&canon.winner_id),
            canon.winner_side
        );

        if let Some(tx) = tx.as_mut() {
            sqlx::query(
                "UPDATE matches \
                 SET \"homeScore\" = $1, \"awayScore\" = $2, \"winnerId\" = $3, \
                     status = 'completed' \
                 WHERE id = $4",
            )
            .persistent(false)
            .bind(canon.home_score)
            .bind(canon.away_score)
            .bind(&canon.winner_id)
            .bind(&m.id)
            .execute(&mut **tx)
            .await?;
            println!("  ✓ Updated!\n");
        } else {
            println!("  ✓ Would update (dry run)\n");
        }
        summary.updated += 1;
    }

    if let Some(tx) = tx {
        if summary.updated > 0 {
            tx.commit().await?;
        }
    }

    info!(
        total = summary.total,
        updated = summary.updated,
        already_correct = summary.already_correct,
        dry_run,
        "walkover correction pass finished"
    );
    Ok(summary)
}

fn fmt_score(score: Option<i32>) -> String {
    score.map(|s| s.to_string()).unwrap_or_else(|| "NULL".into())
}

/// First 8 chars of an opaque id for report lines; short ids print whole.
fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wo(absent_status: &str) -> WoMatch {
        WoMatch {
            id: "m1".into(),
            home_player_id: "player-home".into(),
            away_player_id: "player-away".into(),
            home_score: None,
            away_score: None,
            winner_id: None,
            absent_status: absent_status.into(),
            status: "scheduled".into(),
        }
    }

    fn apply(m: &mut WoMatch, canon: &CanonicalResult) {
        m.home_score = Some(canon.home_score);
        m.away_score = Some(canon.away_score);
        m.winner_id = Some(canon.winner_id.clone());
        m.status = "completed".into();
    }

    #[test]
    fn home_absent_awards_away() {
        let canon = wo("home_absent").canonical().unwrap();
        assert_eq!(canon.home_score, 0);
        assert_eq!(canon.away_score, 1);
        assert_eq!(canon.winner_id, "player-away");
        assert_eq!(canon.winner_side, "Away Player");
    }

    #[test]
    fn away_absent_awards_home() {
        let canon = wo("away_absent").canonical().unwrap();
        assert_eq!(canon.home_score, 1);
        assert_eq!(canon.away_score, 0);
        assert_eq!(canon.winner_id, "player-home");
        assert_eq!(canon.winner_side, "Home Player");
    }

    #[test]
    fn other_tags_are_not_corrected() {
        assert!(wo("none").canonical().is_none());
        assert!(wo("").canonical().is_none());
        assert!(wo("HOME_ABSENT").canonical().is_none());
    }

    #[test]
    fn fresh_scheduled_row_needs_update() {
        // scenario: 0-0, no winner, still scheduled
        let mut m = wo("away_absent");
        m.home_score = Some(0);
        m.away_score = Some(0);
        let canon = m.canonical().unwrap();
        assert!(m.needs_update(&canon));
    }

    #[test]
    fn null_scores_need_update() {
        let m = wo("home_absent");
        let canon = m.canonical().unwrap();
        assert!(m.needs_update(&canon));
    }

    #[test]
    fn canonical_row_is_left_alone() {
        let mut m = wo("away_absent");
        let canon = m.canonical().unwrap();
        apply(&mut m, &canon);
        assert!(!m.needs_update(&canon));
    }

    #[test]
    fn second_pass_is_a_noop() {
        let mut m = wo("home_absent");
        let canon = m.canonical().unwrap();
        assert!(m.needs_update(&canon));
        apply(&mut m, &canon);
        // same rule applied again must find nothing to change
        let canon2 = m.canonical().unwrap();
        assert_eq!(canon, canon2);
        assert!(!m.needs_update(&canon2));
    }

    #[test]
    fn each_field_triggers_independently() {
        let base = {
            let mut m = wo("away_absent");
            let canon = m.canonical().unwrap();
            apply(&mut m, &canon);
            m
        };
        let canon = base.canonical().unwrap();

        let mut m = base.clone();
        m.home_score = Some(3);
        assert!(m.needs_update(&canon));

        let mut m = base.clone();
        m.away_score = Some(2);
        assert!(m.needs_update(&canon));

        let mut m = base.clone();
        m.winner_id = Some("player-away".into());
        assert!(m.needs_update(&canon));

        let mut m = base.clone();
        m.winner_id = None;
        assert!(m.needs_update(&canon));

        let mut m = base;
        m.status = "in_progress".into();
        assert!(m.needs_update(&canon));
    }

    #[test]
    fn short_id_truncates_and_tolerates_short_input() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("m1"), "m1");
    }
}
