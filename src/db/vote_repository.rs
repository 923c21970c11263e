use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::db::models::{HelpfulVote, RevisionId};
use crate::error::AppError;

/// Repository trait for helpfulness votes.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait VoteRepository: Send + Sync {
    /// Count "helpful" votes per revision among `revision_ids`, for votes
    /// created in `since..=until`. Revisions without votes are absent.
    async fn helpful_counts(
        &self,
        revision_ids: &[RevisionId],
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<HashMap<RevisionId, u64>, AppError>;
}

/// Tally helpful votes the same way every implementation must.
pub fn tally_helpful<'a, I>(
    votes: I,
    revision_ids: &[RevisionId],
    since: DateTime<Utc>,
    until: DateTime<Utc>,
) -> HashMap<RevisionId, u64>
where
    I: IntoIterator<Item = &'a HelpfulVote>,
{
    let mut counts = HashMap::new();
    for vote in votes {
        if vote.helpful
            && vote.created >= since
            && vote.created <= until
            && revision_ids.contains(&vote.revision_id)
        {
            *counts.entry(vote.revision_id).or_insert(0) += 1;
        }
    }
    counts
}

/// MongoDB implementation of the VoteRepository.
#[cfg(feature = "server")]
pub struct MongoVoteRepository {
    collection: mongodb::Collection<HelpfulVote>,
}

#[cfg(feature = "server")]
impl MongoVoteRepository {
    pub fn new(db: &mongodb::Database) -> Self {
        Self {
            collection: db.collection("helpful_votes"),
        }
    }

    pub async fn insert(&self, vote: &HelpfulVote) -> Result<(), AppError> {
        self.collection.insert_one(vote).await?;
        Ok(())
    }
}

#[cfg(feature = "server")]
#[async_trait]
impl VoteRepository for MongoVoteRepository {
    async fn helpful_counts(
        &self,
        revision_ids: &[RevisionId],
        since: DateTime<Utc>,
        until: DateTime<Utc>,
    ) -> Result<HashMap<RevisionId, u64>, AppError> {
        use futures::TryStreamExt;
        use mongodb::bson::{doc, DateTime as BsonDateTime};

        if revision_ids.is_empty() {
            return Ok(HashMap::new());
        }

        // Bounded range on both sides so the index on "created" is used.
        let pipeline = vec![
            doc! { "$match": {
                "revision_id": { "$in": revision_ids.to_vec() },
                "helpful": true,
                "created": {
                    "$gte": BsonDateTime::from_chrono(since),
                    "$lte": BsonDateTime::from_chrono(until),
                },
            }},
            doc! { "$group": { "_id": "$revision_id", "count": { "$sum": 1 } } },
        ];

        let mut cursor = self.collection.aggregate(pipeline).await?;
        let mut counts = HashMap::new();
        while let Some(row) = cursor
            .try_next()
            .await
            .map_err(|e| AppError::Database(e.to_string()))?
        {
            let revision_id = row
                .get_i64("_id")
                .map_err(|e| AppError::Database(format!("Malformed vote group: {e}")))?;
            let count = match row.get("count") {
                Some(mongodb::bson::Bson::Int32(n)) => *n as u64,
                Some(mongodb::bson::Bson::Int64(n)) => *n as u64,
                other => {
                    return Err(AppError::Database(format!(
                        "Malformed vote count: {other:?}"
                    )))
                }
            };
            counts.insert(revision_id, count);
        }

        Ok(counts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn vote(id: i64, revision_id: RevisionId, helpful: bool, created: DateTime<Utc>) -> HelpfulVote {
        HelpfulVote {
            id,
            revision_id,
            helpful,
            created,
        }
    }

    #[test]
    fn test_tally_helpful() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let since = now - chrono::Duration::days(30);
        let votes = vec![
            vote(1, 10, true, now - chrono::Duration::days(1)),
            vote(2, 10, true, now - chrono::Duration::days(2)),
            vote(3, 10, false, now - chrono::Duration::days(2)),
            vote(4, 10, true, now - chrono::Duration::days(31)),
            vote(5, 20, true, now),
            vote(6, 30, true, now - chrono::Duration::days(3)),
        ];

        let counts = tally_helpful(&votes, &[10, 20], since, now);
        assert_eq!(counts.get(&10), Some(&2));
        assert_eq!(counts.get(&20), Some(&1));
        assert_eq!(counts.get(&30), None);
    }

    #[test]
    fn test_tally_window_is_inclusive() {
        let now = Utc.with_ymd_and_hms(2024, 6, 30, 0, 0, 0).unwrap();
        let since = now - chrono::Duration::days(30);
        let votes = vec![vote(1, 10, true, since), vote(2, 10, true, now)];
        assert_eq!(tally_helpful(&votes, &[10], since, now).get(&10), Some(&2));
    }
}
