//! Catalog cache with an explicit staleness window.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::collaborators::CatalogSource;
use crate::error::{DomainError, DomainResult};
use crate::models::{GeoActivity, Workout};

/// Default time a fetched catalog stays fresh.
pub const DEFAULT_STALENESS: Duration = Duration::from_secs(300);

struct Slot<T> {
    entry: RwLock<Option<(Instant, Arc<Vec<T>>)>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            entry: RwLock::new(None),
        }
    }

    async fn get<F, Fut>(&self, staleness: Duration, force: bool, fetch: F) -> DomainResult<Arc<Vec<T>>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = DomainResult<Vec<T>>>,
    {
        if !force {
            if let Some((at, items)) = self.entry.read().await.as_ref() {
                if at.elapsed() < staleness {
                    return Ok(items.clone());
                }
            }
        }

        let mut entry = self.entry.write().await;
        // Another caller may have refreshed while we waited for the lock.
        if !force {
            if let Some((at, items)) = entry.as_ref() {
                if at.elapsed() < staleness {
                    return Ok(items.clone());
                }
            }
        }

        let items = Arc::new(fetch().await?);
        *entry = Some((Instant::now(), items.clone()));
        Ok(items)
    }
}

/// Injected cache over a [`CatalogSource`].
pub struct CatalogCache {
    source: Arc<dyn CatalogSource>,
    staleness: Duration,
    workouts: Slot<Workout>,
    geo_activities: Slot<GeoActivity>,
}

impl CatalogCache {
    pub fn new(source: Arc<dyn CatalogSource>, staleness: Duration) -> Self {
        Self {
            source,
            staleness,
            workouts: Slot::new(),
            geo_activities: Slot::new(),
        }
    }

    pub fn staleness(&self) -> Duration {
        self.staleness
    }

    pub async fn workouts(&self, force_refresh: bool) -> DomainResult<Arc<Vec<Workout>>> {
        self.workouts
            .get(self.staleness, force_refresh, || self.source.workouts())
            .await
    }

    pub async fn geo_activities(&self, force_refresh: bool) -> DomainResult<Arc<Vec<GeoActivity>>> {
        self.geo_activities
            .get(self.staleness, force_refresh, || self.source.geo_activities())
            .await
    }

    /// Fails with a validation error if any id is not in the catalog.
    ///
    /// A miss against cached data triggers one forced refresh before failing.
    pub async fn ensure_known(&self, workout_ids: &[Uuid], geo_ids: &[Uuid]) -> DomainResult<()> {
        if !workout_ids.is_empty() {
            let mut known = self.workouts(false).await?;
            if first_unknown(workout_ids, &known, |w| w.id).is_some() {
                known = self.workouts(true).await?;
            }
            if let Some(id) = first_unknown(workout_ids, &known, |w| w.id) {
                return Err(DomainError::Validation(format!("Unknown workout: {}", id)));
            }
        }
        if !geo_ids.is_empty() {
            let mut known = self.geo_activities(false).await?;
            if first_unknown(geo_ids, &known, |g| g.id).is_some() {
                known = self.geo_activities(true).await?;
            }
            if let Some(id) = first_unknown(geo_ids, &known, |g| g.id) {
                return Err(DomainError::Validation(format!(
                    "Unknown geo activity: {}",
                    id
                )));
            }
        }
        Ok(())
    }
}

fn first_unknown<T>(ids: &[Uuid], known: &[T], id_of: impl Fn(&T) -> Uuid) -> Option<Uuid> {
    ids.iter()
        .copied()
        .find(|id| !known.iter().any(|item| id_of(item) == *id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::memory::InMemoryCatalog;

    fn workout(name: &str) -> Workout {
        Workout {
            id: Uuid::new_v4(),
            name: name.to_string(),
            category: Some("strength".to_string()),
        }
    }

    #[tokio::test]
    async fn test_fresh_entries_are_served_from_cache() {
        let source = Arc::new(InMemoryCatalog::new(vec![workout("Squat")], vec![]));
        let cache = CatalogCache::new(source.clone(), DEFAULT_STALENESS);

        assert_eq!(cache.workouts(false).await.unwrap().len(), 1);
        assert_eq!(cache.workouts(false).await.unwrap().len(), 1);
        assert_eq!(source.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_force_refresh_bypasses_cache() {
        let source = Arc::new(InMemoryCatalog::new(vec![workout("Squat")], vec![]));
        let cache = CatalogCache::new(source.clone(), DEFAULT_STALENESS);
        cache.workouts(false).await.unwrap();

        source.push_workout(workout("Lunge")).await;
        assert_eq!(cache.workouts(false).await.unwrap().len(), 1);
        assert_eq!(cache.workouts(true).await.unwrap().len(), 2);
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_stale_entries_are_refetched() {
        let source = Arc::new(InMemoryCatalog::new(vec![], vec![]));
        let cache = CatalogCache::new(source.clone(), Duration::ZERO);
        cache.geo_activities(false).await.unwrap();
        cache.geo_activities(false).await.unwrap();
        assert_eq!(source.fetch_count(), 2);
    }

    #[tokio::test]
    async fn test_ensure_known_refreshes_once_on_miss() {
        let squat = workout("Squat");
        let source = Arc::new(InMemoryCatalog::new(vec![squat.clone()], vec![]));
        let cache = CatalogCache::new(source.clone(), DEFAULT_STALENESS);

        cache.ensure_known(&[squat.id], &[]).await.unwrap();

        let lunge = workout("Lunge");
        source.push_workout(lunge.clone()).await;
        cache.ensure_known(&[lunge.id], &[]).await.unwrap();

        let err = cache.ensure_known(&[Uuid::new_v4()], &[]).await.unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));

        let err = cache.ensure_known(&[], &[Uuid::new_v4()]).await.unwrap_err();
        assert!(err.to_string().contains("geo activity"));
    }

    #[tokio::test]
    async fn test_ensure_known_without_refs_skips_fetch() {
        let source = Arc::new(InMemoryCatalog::new(vec![], vec![]));
        let cache = CatalogCache::new(source.clone(), DEFAULT_STALENESS);
        cache.ensure_known(&[], &[]).await.unwrap();
        assert_eq!(source.fetch_count(), 0);
    }
}
