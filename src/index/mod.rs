//! The persistent dial index: incremental sync from a contact source,
//! crash recovery, and ranked prefix lookups.

pub mod source;

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use sqlx::SqlitePool;
use tokio::sync::Mutex;

use crate::charmap::CharacterMap;
use crate::config::{AppConfig, IndexerConfig, MatcherConfig};
use crate::db::{self, schema};
use crate::index::source::ContactSource;
use crate::matching::{
    compare_candidates, NamePrefixGenerator, NameQueryMatcher, PhoneNumberTokenizer,
};
use crate::metrics;
use crate::models::{CandidateRow, Contact, LookupHit};

pub struct MatchIndex {
    pool: SqlitePool,
    matcher: MatcherConfig,
    indexer: IndexerConfig,
    map: Arc<dyn CharacterMap>,
    /// Serializes syncs; lookups proceed concurrently against WAL.
    rebuild_lock: Mutex<()>,
}

#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub indexed: usize,
    pub skipped: usize,
    pub removed: usize,
    pub purged: usize,
    pub duration: Duration,
}

#[derive(Debug, Clone)]
pub struct ProgressUpdate {
    pub processed: usize,
    pub total: usize,
    pub percent: f64,
    pub eta_secs: u64,
    pub mem_used_mb: u64,
    pub mem_avail_mb: u64,
}

/// Everything to write for one contact, computed off the database.
struct IndexPlan {
    contact: Contact,
    prefixes: BTreeSet<String>,
}

fn build_plan(
    contact: &Contact,
    generator: &NamePrefixGenerator,
    tokenizer: &PhoneNumberTokenizer,
) -> IndexPlan {
    let mut prefixes = match contact.display_name.as_deref() {
        Some(name) => generator.prefixes(name),
        None => BTreeSet::new(),
    };
    for number in &contact.numbers {
        prefixes.extend(tokenizer.tokens_for_indexing(number));
    }
    IndexPlan {
        contact: contact.clone(),
        prefixes,
    }
}

fn progress_update(processed: usize, total: usize, started: Instant) -> ProgressUpdate {
    let elapsed = started.elapsed().as_secs_f64();
    let percent = processed as f64 / total.max(1) as f64 * 100.0;
    let eta_secs = (elapsed / processed.max(1) as f64 * (total - processed) as f64) as u64;
    let mem = metrics::memory_stats_mb();
    ProgressUpdate {
        processed,
        total,
        percent,
        eta_secs,
        mem_used_mb: mem.used_mb,
        mem_avail_mb: mem.avail_mb,
    }
}

impl MatchIndex {
    pub async fn open(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let pool = db::make_pool(&config.database).await?;
        schema::ensure_schema(&pool).await?;
        Ok(Self {
            pool,
            map: config.matcher.script.character_map(),
            matcher: config.matcher.clone(),
            indexer: config.indexer.clone(),
            rebuild_lock: Mutex::new(()),
        })
    }

    /// Replaces one contact's rows outside a sync. Rows are stamped with
    /// the committed sync watermark so the interrupted-sync purge never
    /// mistakes them for leftovers.
    pub async fn reindex(&self, contact: &Contact) -> Result<()> {
        let stamp = schema::last_sync_millis(&self.pool).await?;
        let generator = NamePrefixGenerator::new(Arc::clone(&self.map));
        let tokenizer = PhoneNumberTokenizer::new(Arc::clone(&self.map), self.matcher.nanp);
        let plan = build_plan(contact, &generator, &tokenizer);
        self.apply_plan(&plan, stamp).await
    }

    pub async fn remove_contact(&self, contact_id: i64) -> Result<()> {
        let mut txn = self
            .pool
            .begin()
            .await
            .context("failed to begin removal transaction")?;
        sqlx::query("DELETE FROM candidate WHERE contact_id = ?")
            .bind(contact_id)
            .execute(&mut *txn)
            .await?;
        sqlx::query("DELETE FROM prefix WHERE contact_id = ?")
            .bind(contact_id)
            .execute(&mut *txn)
            .await?;
        txn.commit()
            .await
            .with_context(|| format!("failed to remove contact {contact_id}"))?;
        Ok(())
    }

    /// Ranked lookup for a dialpad query. The prefix table narrows the
    /// candidate set; every candidate is re-validated against the query
    /// before it can appear in the result.
    pub async fn lookup(&self, query: &str, limit: usize) -> Result<Vec<LookupHit>> {
        let matcher = NameQueryMatcher::new(query, &self.matcher);
        if matcher.is_empty() && !self.matcher.match_empty_query {
            return Ok(Vec::new());
        }
        let rows: Vec<CandidateRow> = sqlx::query_as(
            "SELECT contact_id, display_name, number, lookup_key, photo_id, starred, \
                    is_super_primary, is_primary, in_visible_group, last_time_used, \
                    times_used, indexed_at \
             FROM candidate \
             WHERE contact_id IN \
                   (SELECT DISTINCT contact_id FROM prefix WHERE prefix LIKE ? || '%') \
             ORDER BY contact_id, row_id",
        )
        .bind(matcher.digits())
        .fetch_all(&self.pool)
        .await
        .context("candidate query failed")?;

        let now = Utc::now().timestamp_millis();
        let mut hits: Vec<(CandidateRow, LookupHit)> = Vec::new();
        let mut matched_contact: Option<i64> = None;
        for row in rows {
            // First row of a contact that survives validation wins.
            if matched_contact == Some(row.contact_id) {
                continue;
            }
            let name_positions = matcher.match_name(row.display_name.as_deref().unwrap_or(""));
            let number_position = row.number.as_deref().and_then(|n| matcher.match_number(n));
            if name_positions.is_none() && number_position.is_none() {
                continue;
            }
            matched_contact = Some(row.contact_id);
            let matched_number = if number_position.is_some() {
                row.number.clone()
            } else {
                None
            };
            let hit = LookupHit {
                contact_id: row.contact_id,
                display_name: row.display_name.clone(),
                matched_number,
                lookup_key: row.lookup_key.clone(),
                photo_id: row.photo_id,
                name_positions: name_positions.unwrap_or_default(),
                number_position,
            };
            hits.push((row, hit));
        }

        hits.sort_by(|a, b| compare_candidates(&a.0, &b.0, now));
        Ok(hits.into_iter().take(limit).map(|(_, hit)| hit).collect())
    }

    pub async fn start_update(
        &self,
        source: &dyn ContactSource,
        force_full: bool,
    ) -> Result<SyncSummary> {
        self.start_update_with_progress(source, force_full, |_| {})
            .await
    }

    /// Pulls updated and deleted contacts from `source` and brings the
    /// index up to date. Each contact commits atomically; the sync
    /// watermark moves only after every write has committed, so a crash
    /// at any point leaves at most fully indexed contacts ahead of the
    /// watermark, and those are purged and re-fed on the next run.
    pub async fn start_update_with_progress<F>(
        &self,
        source: &dyn ContactSource,
        force_full: bool,
        mut progress: F,
    ) -> Result<SyncSummary>
    where
        F: FnMut(&ProgressUpdate),
    {
        let _guard = self.rebuild_lock.lock().await;
        let started = Instant::now();
        let now = Utc::now().timestamp_millis();

        let last_sync = if force_full {
            0
        } else {
            schema::last_sync_millis(&self.pool).await?
        };

        let purged = if force_full {
            self.wipe_all().await?;
            0
        } else {
            self.purge_interrupted(last_sync).await?
        };

        let contacts = source.updated_since(last_sync).await?;
        let total = contacts.len();
        log::info!(
            "syncing {total} updated contacts (last sync {last_sync}, force_full={force_full})"
        );

        let generator = NamePrefixGenerator::new(Arc::clone(&self.map));
        let tokenizer = PhoneNumberTokenizer::new(Arc::clone(&self.map), self.matcher.nanp);
        let plans: Vec<IndexPlan> = contacts
            .par_iter()
            .map(|contact| build_plan(contact, &generator, &tokenizer))
            .collect();

        let mut indexed = 0usize;
        let mut skipped = 0usize;
        for (done, plan) in plans.iter().enumerate() {
            if plan.prefixes.is_empty() {
                log::debug!("contact {} has nothing to index", plan.contact.id);
                skipped += 1;
            } else {
                indexed += 1;
            }
            // Still applied when empty: the contact may have lost its
            // name and numbers and must drop out of the index.
            self.apply_plan(plan, now).await?;

            let processed = done + 1;
            if processed % self.indexer.progress_every == 0 && processed < total {
                let update = progress_update(processed, total, started);
                log::info!(
                    "indexed {processed}/{total} contacts ({:.1}%), eta {}s, mem {}MB used / {}MB free",
                    update.percent,
                    update.eta_secs,
                    update.mem_used_mb,
                    update.mem_avail_mb
                );
                progress(&update);
            }
        }

        let mut removed = 0usize;
        for contact_id in source.deleted_since(last_sync).await? {
            self.remove_contact(contact_id).await?;
            removed += 1;
        }

        schema::set_property(&self.pool, schema::PROP_LAST_SYNC, &now.to_string()).await?;

        let summary = SyncSummary {
            indexed,
            skipped,
            removed,
            purged,
            duration: started.elapsed(),
        };
        log::info!(
            "sync complete: {} indexed, {} skipped, {} removed, {} purged in {:.2}s",
            summary.indexed,
            summary.skipped,
            summary.removed,
            summary.purged,
            summary.duration.as_secs_f64()
        );
        Ok(summary)
    }

    /// Writes one contact's rows in a single transaction, replacing any
    /// previous rows for that contact.
    async fn apply_plan(&self, plan: &IndexPlan, stamp: i64) -> Result<()> {
        let contact = &plan.contact;
        let mut txn = self
            .pool
            .begin()
            .await
            .context("failed to begin index transaction")?;
        sqlx::query("DELETE FROM candidate WHERE contact_id = ?")
            .bind(contact.id)
            .execute(&mut *txn)
            .await?;
        sqlx::query("DELETE FROM prefix WHERE contact_id = ?")
            .bind(contact.id)
            .execute(&mut *txn)
            .await?;

        if !plan.prefixes.is_empty() {
            let numbers: Vec<Option<&str>> = if contact.numbers.is_empty() {
                vec![None]
            } else {
                contact.numbers.iter().map(|n| Some(n.as_str())).collect()
            };
            for number in numbers {
                sqlx::query(
                    "INSERT INTO candidate (contact_id, display_name, number, lookup_key, \
                     photo_id, starred, is_super_primary, is_primary, in_visible_group, \
                     last_time_used, times_used, indexed_at) \
                     VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
                )
                .bind(contact.id)
                .bind(&contact.display_name)
                .bind(number)
                .bind(&contact.lookup_key)
                .bind(contact.photo_id)
                .bind(contact.starred)
                .bind(contact.is_super_primary)
                .bind(contact.is_primary)
                .bind(contact.in_visible_group)
                .bind(contact.last_time_used)
                .bind(contact.times_used)
                .bind(stamp)
                .execute(&mut *txn)
                .await?;
            }
            for prefix in &plan.prefixes {
                sqlx::query("INSERT INTO prefix (contact_id, prefix) VALUES (?, ?)")
                    .bind(contact.id)
                    .bind(prefix)
                    .execute(&mut *txn)
                    .await?;
            }
        }

        txn.commit()
            .await
            .with_context(|| format!("failed to commit index rows for contact {}", contact.id))?;
        Ok(())
    }

    /// Removes contacts whose rows were stamped after the last committed
    /// sync. Those belong to a sync that never finished; the source will
    /// feed them again.
    async fn purge_interrupted(&self, last_sync: i64) -> Result<usize> {
        let ids: Vec<(i64,)> =
            sqlx::query_as("SELECT DISTINCT contact_id FROM candidate WHERE indexed_at > ?")
                .bind(last_sync)
                .fetch_all(&self.pool)
                .await
                .context("interrupted-sync scan failed")?;
        if ids.is_empty() {
            return Ok(0);
        }
        log::warn!("purging {} contacts left by an interrupted sync", ids.len());
        let mut txn = self.pool.begin().await?;
        for &(contact_id,) in &ids {
            sqlx::query("DELETE FROM candidate WHERE contact_id = ?")
                .bind(contact_id)
                .execute(&mut *txn)
                .await?;
            sqlx::query("DELETE FROM prefix WHERE contact_id = ?")
                .bind(contact_id)
                .execute(&mut *txn)
                .await?;
        }
        txn.commit().await.context("purge commit failed")?;
        Ok(ids.len())
    }

    async fn wipe_all(&self) -> Result<()> {
        let mut txn = self.pool.begin().await?;
        sqlx::query("DELETE FROM candidate").execute(&mut *txn).await?;
        sqlx::query("DELETE FROM prefix").execute(&mut *txn).await?;
        txn.commit().await.context("full wipe failed")?;
        Ok(())
    }
}
