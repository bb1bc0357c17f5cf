use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::Rng;
use regex::Regex;

use crate::{
    config::{CategoryProfile, Config},
    error::{AppError, AppResult},
    models::{Candidate, CategoryQuery, Course},
    services::providers::PlaceSearcher,
};

pub const DEFAULT_TOP_N: usize = 5;
pub const DEFAULT_SEARCH_TIMEOUT: Duration = Duration::from_secs(5);

/// Name filters for one category
#[derive(Debug, Clone, Default)]
pub struct CategoryFilter {
    /// Keep only names matching this
    pub include: Option<Regex>,
    /// Drop names matching this
    pub exclude: Option<Regex>,
}

impl CategoryFilter {
    fn accepts(&self, candidate: &Candidate) -> bool {
        let name = candidate.name.as_deref().unwrap_or_default();
        self.include.as_ref().map_or(true, |re| re.is_match(name))
            && !self.exclude.as_ref().is_some_and(|re| re.is_match(name))
    }
}

/// Knobs of course assembly
#[derive(Debug, Clone)]
pub struct AssemblyOptions {
    /// Candidates whose name matches are never picked, in any category
    pub deny_name_pattern: Option<Regex>,
    /// Keyed by category
    pub category_filters: HashMap<String, CategoryFilter>,
    /// A step is sampled uniformly from this many leading results
    pub top_n: usize,
    /// Time bound of each category search
    pub search_timeout: Duration,
}

impl Default for AssemblyOptions {
    fn default() -> Self {
        Self {
            deny_name_pattern: None,
            category_filters: HashMap::new(),
            top_n: DEFAULT_TOP_N,
            search_timeout: DEFAULT_SEARCH_TIMEOUT,
        }
    }
}

fn compile(pattern: &str) -> AppResult<Regex> {
    Regex::new(pattern)
        .map_err(|e| AppError::Configuration(format!("Invalid name pattern {:?}: {}", pattern, e)))
}

impl AssemblyOptions {
    /// Options built from configuration and a category profile
    pub fn from_config(config: &Config, profile: &[CategoryProfile]) -> AppResult<Self> {
        let mut options = Self::default()
            .with_top_n(config.course_top_n)
            .with_search_timeout(Duration::from_millis(config.search_timeout_ms));

        if !config.deny_name_pattern.trim().is_empty() {
            options = options.with_deny_name_pattern(&config.deny_name_pattern)?;
        }

        for entry in profile {
            options = options.with_category_filter(
                &entry.category,
                entry.include_pattern.as_deref(),
                entry.exclude_pattern.as_deref(),
            )?;
        }

        Ok(options)
    }

    /// Values below 1 are raised to 1
    pub fn with_top_n(mut self, top_n: usize) -> Self {
        self.top_n = top_n.max(1);
        self
    }

    pub fn with_search_timeout(mut self, timeout: Duration) -> Self {
        self.search_timeout = timeout;
        self
    }

    pub fn with_deny_name_pattern(mut self, pattern: &str) -> AppResult<Self> {
        self.deny_name_pattern = Some(compile(pattern)?);
        Ok(self)
    }

    pub fn with_category_filter(
        mut self,
        category: &str,
        include: Option<&str>,
        exclude: Option<&str>,
    ) -> AppResult<Self> {
        if include.is_none() && exclude.is_none() {
            return Ok(self);
        }

        let filter = CategoryFilter {
            include: include.map(compile).transpose()?,
            exclude: exclude.map(compile).transpose()?,
        };
        self.category_filters.insert(category.to_string(), filter);
        Ok(self)
    }
}

/// Runs every category search concurrently and returns one pool per query,
/// in query order.
///
/// A search that fails or outlives `timeout` yields an empty pool. Only fatal
/// errors (see [`AppError::is_fatal`]) are returned, and searches still
/// running at that point are aborted.
pub async fn gather_pools(
    queries: &[CategoryQuery],
    searcher: Arc<dyn PlaceSearcher>,
    timeout: Duration,
) -> AppResult<Vec<Vec<Candidate>>> {
    let mut tasks = Vec::with_capacity(queries.len());

    for query in queries {
        let searcher = Arc::clone(&searcher);
        let keyword = query.keyword.clone();
        let task = tokio::spawn(async move {
            tokio::time::timeout(timeout, searcher.search_places(&keyword)).await
        });
        tasks.push(task);
    }

    let mut pools = Vec::with_capacity(queries.len());

    for (i, query) in queries.iter().enumerate() {
        let pool = match (&mut tasks[i]).await {
            Ok(Ok(Ok(candidates))) => candidates,
            Ok(Ok(Err(e))) if e.is_fatal() => {
                tracing::error!(
                    category = %query.category,
                    error = %e,
                    "Category search failed fatally"
                );
                // Cancel searches still in flight
                for task in &tasks[i + 1..] {
                    task.abort();
                }
                return Err(e);
            }
            Ok(Ok(Err(e))) => {
                tracing::warn!(
                    category = %query.category,
                    keyword = %query.keyword,
                    error = %e,
                    "Category search failed, treating as no results"
                );
                Vec::new()
            }
            Ok(Err(_elapsed)) => {
                tracing::warn!(
                    category = %query.category,
                    keyword = %query.keyword,
                    timeout_ms = timeout.as_millis(),
                    "Category search timed out, treating as no results"
                );
                Vec::new()
            }
            Err(e) => {
                tracing::error!(category = %query.category, error = %e, "Task join error");
                Vec::new()
            }
        };
        pools.push(pool);
    }

    Ok(pools)
}

/// Narrows one category's pool: places already in the course and denied
/// names go first, then the category filter unless it would leave nothing.
fn filter_pool(
    category: &str,
    pool: Vec<Candidate>,
    used: &HashSet<String>,
    options: &AssemblyOptions,
) -> Vec<Candidate> {
    let allowed: Vec<Candidate> = pool
        .into_iter()
        .filter(|c| !used.contains(&c.id))
        .filter(|c| {
            !options
                .deny_name_pattern
                .as_ref()
                .is_some_and(|deny| c.name.as_deref().is_some_and(|name| deny.is_match(name)))
        })
        .collect();

    let Some(filter) = options.category_filters.get(category) else {
        return allowed;
    };

    let narrowed: Vec<Candidate> = allowed.iter().filter(|c| filter.accepts(c)).cloned().collect();
    if narrowed.is_empty() && !allowed.is_empty() {
        tracing::debug!(
            category = %category,
            pool = allowed.len(),
            "Category filter matched nothing, keeping unfiltered pool"
        );
        return allowed;
    }
    narrowed
}

/// Builds a course from already fetched pools, one per query.
///
/// Categories whose pool ends up empty are skipped; remaining steps are
/// numbered consecutively from 1. A place already used by an earlier step is
/// not used again, and is excluded before the category filter decides
/// whether to fall back.
pub fn assemble_from_pools<R: Rng + ?Sized>(
    queries: &[CategoryQuery],
    pools: Vec<Vec<Candidate>>,
    options: &AssemblyOptions,
    rng: &mut R,
) -> Course {
    let mut course = Course::default();
    let mut used: HashSet<String> = HashSet::new();

    for (query, pool) in queries.iter().zip(pools) {
        let mut pool = filter_pool(&query.category, pool, &used, options);

        if pool.is_empty() {
            tracing::debug!(category = %query.category, "No eligible candidates, skipping step");
            continue;
        }

        let window = options.top_n.max(1).min(pool.len());
        let candidate = pool.swap_remove(rng.gen_range(0..window));

        tracing::debug!(
            category = %query.category,
            order = course.len() + 1,
            place = %candidate.display_name(),
            window,
            "Course step chosen"
        );

        used.insert(candidate.id.clone());
        course.push_step(query.category.clone(), candidate);
    }

    course
}

/// Assembles a multi-step course from per-category place searches.
///
/// Searches run concurrently (see [`gather_pools`]); selection happens after
/// all of them are joined. Fewer steps than queries, including none, is a
/// normal outcome.
pub async fn assemble_course<R: Rng + ?Sized>(
    queries: &[CategoryQuery],
    searcher: Arc<dyn PlaceSearcher>,
    options: &AssemblyOptions,
    rng: &mut R,
) -> AppResult<Course> {
    let start = Instant::now();

    tracing::info!(
        categories = queries.len(),
        provider = searcher.name(),
        top_n = options.top_n,
        "Starting course assembly"
    );

    let pools = gather_pools(queries, searcher, options.search_timeout).await?;
    let course = assemble_from_pools(queries, pools, options, rng);

    tracing::info!(
        steps = course.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Course assembly completed"
    );

    Ok(course)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::providers::MockPlaceSearcher;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::atomic::{AtomicBool, Ordering};

    fn place(id: &str, name: &str) -> Candidate {
        Candidate::new(id, Some(name.to_string()), format!("http://place.map.kakao.com/{id}"))
    }

    fn queries(pairs: &[(&str, &str)]) -> Vec<CategoryQuery> {
        pairs
            .iter()
            .map(|(category, keyword)| CategoryQuery::new(*category, *keyword))
            .collect()
    }

    fn mock_searcher(results: Vec<(&'static str, AppResult<Vec<Candidate>>)>) -> Arc<dyn PlaceSearcher> {
        let results: HashMap<&'static str, AppResult<Vec<Candidate>>> = results.into_iter().collect();
        let mut mock = MockPlaceSearcher::new();
        mock.expect_name().return_const("mock");
        mock.expect_search_places().returning(move |keyword: &str| {
            match results.get(keyword) {
                Some(Ok(places)) => Ok(places.clone()),
                Some(Err(AppError::Configuration(msg))) => Err(AppError::Configuration(msg.clone())),
                Some(Err(e)) => Err(AppError::ExternalApi(e.to_string())),
                None => Ok(Vec::new()),
            }
        });
        Arc::new(mock)
    }

    fn ids(course: &Course) -> Vec<&str> {
        course.steps.iter().map(|s| s.candidate.id.as_str()).collect()
    }

    #[tokio::test]
    async fn test_hongdae_scenario_skips_study_room_and_empty_food() {
        let searcher = mock_searcher(vec![
            (
                "홍대 카페",
                Ok(vec![
                    place("1", "홍대 스터디카페"),
                    place("2", "카페 온도"),
                    place("3", "커피 한약방"),
                ]),
            ),
            ("홍대 맛집", Ok(vec![])),
        ]);
        let options = AssemblyOptions::default()
            .with_deny_name_pattern("스터디|독서실")
            .unwrap();
        let queries = queries(&[("cafe", "홍대 카페"), ("food", "홍대 맛집")]);

        for seed in 0..20 {
            let mut rng = StdRng::seed_from_u64(seed);
            let course = assemble_course(&queries, searcher.clone(), &options, &mut rng)
                .await
                .unwrap();

            assert_eq!(course.steps.len(), 1);
            assert_eq!(course.steps[0].category, "cafe");
            assert_eq!(course.steps[0].order, 1);
            assert!(["2", "3"].contains(&course.steps[0].candidate.id.as_str()));
        }
    }

    #[tokio::test]
    async fn test_steps_are_renumbered_when_a_category_is_empty() {
        let searcher = mock_searcher(vec![
            ("c", Ok(vec![place("c1", "카페 A")])),
            ("f", Ok(vec![])),
            ("a", Ok(vec![place("a1", "한강 공원")])),
        ]);
        let queries = queries(&[("cafe", "c"), ("food", "f"), ("activity", "a")]);
        let mut rng = StdRng::seed_from_u64(7);

        let course = assemble_course(&queries, searcher, &AssemblyOptions::default(), &mut rng)
            .await
            .unwrap();

        assert_eq!(course.steps.len(), 2);
        assert_eq!(course.steps[0].category, "cafe");
        assert_eq!(course.steps[0].order, 1);
        assert_eq!(course.steps[1].category, "activity");
        assert_eq!(course.steps[1].order, 2);
    }

    #[tokio::test]
    async fn test_failed_category_does_not_abort_others() {
        let searcher = mock_searcher(vec![
            ("c", Err(AppError::ExternalApi("502 Bad Gateway".to_string()))),
            ("a", Ok(vec![place("a1", "한강 공원")])),
        ]);
        let queries = queries(&[("cafe", "c"), ("activity", "a")]);
        let mut rng = StdRng::seed_from_u64(1);

        let course = assemble_course(&queries, searcher, &AssemblyOptions::default(), &mut rng)
            .await
            .unwrap();

        assert_eq!(ids(&course), vec!["a1"]);
        assert_eq!(course.steps[0].order, 1);
    }

    #[tokio::test]
    async fn test_configuration_error_propagates() {
        let searcher = mock_searcher(vec![(
            "c",
            Err(AppError::Configuration("KAKAO_REST_API_KEY is not set".to_string())),
        )]);
        let queries = queries(&[("cafe", "c")]);
        let mut rng = StdRng::seed_from_u64(1);

        let err = assemble_course(&queries, searcher, &AssemblyOptions::default(), &mut rng)
            .await
            .unwrap_err();
        assert!(err.is_fatal());
    }

    struct SlowSearcher;

    #[async_trait::async_trait]
    impl PlaceSearcher for SlowSearcher {
        async fn search_places(&self, keyword: &str) -> AppResult<Vec<Candidate>> {
            if keyword == "slow" {
                tokio::time::sleep(Duration::from_secs(5)).await;
            }
            Ok(vec![place(keyword, keyword)])
        }

        fn name(&self) -> &'static str {
            "slow"
        }
    }

    struct RecordingSearcher {
        finished: Arc<AtomicBool>,
    }

    #[async_trait::async_trait]
    impl PlaceSearcher for RecordingSearcher {
        async fn search_places(&self, keyword: &str) -> AppResult<Vec<Candidate>> {
            if keyword == "no-key" {
                return Err(AppError::Configuration("KAKAO_REST_API_KEY is not set".to_string()));
            }
            tokio::time::sleep(Duration::from_millis(100)).await;
            self.finished.store(true, Ordering::SeqCst);
            Ok(vec![place(keyword, keyword)])
        }

        fn name(&self) -> &'static str {
            "recording"
        }
    }

    #[tokio::test]
    async fn test_fatal_error_cancels_remaining_searches() {
        let finished = Arc::new(AtomicBool::new(false));
        let searcher = Arc::new(RecordingSearcher {
            finished: finished.clone(),
        });
        let queries = queries(&[("cafe", "no-key"), ("food", "slow")]);

        let err = gather_pools(&queries, searcher, Duration::from_secs(5))
            .await
            .unwrap_err();
        assert!(err.is_fatal());

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert!(!finished.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_timed_out_category_is_treated_as_empty() {
        let queries = queries(&[("cafe", "slow"), ("food", "fast")]);
        let options = AssemblyOptions::default().with_search_timeout(Duration::from_millis(50));
        let mut rng = StdRng::seed_from_u64(3);

        let course = assemble_course(&queries, Arc::new(SlowSearcher), &options, &mut rng)
            .await
            .unwrap();

        assert_eq!(ids(&course), vec!["fast"]);
        assert_eq!(course.steps[0].category, "food");
        assert_eq!(course.steps[0].order, 1);
    }

    #[test]
    fn test_include_pattern_that_empties_pool_is_ignored() {
        let options = AssemblyOptions::default()
            .with_category_filter("cafe", Some("커피|카페"), None)
            .unwrap();
        let queries = queries(&[("cafe", "k")]);
        let pools = vec![vec![place("1", "빵집 A"), place("2", "빵집 B")]];
        let mut rng = StdRng::seed_from_u64(11);

        let course = assemble_from_pools(&queries, pools, &options, &mut rng);

        assert_eq!(course.steps.len(), 1);
        assert!(["1", "2"].contains(&course.steps[0].candidate.id.as_str()));
    }

    #[test]
    fn test_fallback_keeps_deny_name_filtering() {
        let options = AssemblyOptions::default()
            .with_deny_name_pattern("스터디")
            .unwrap()
            .with_category_filter("cafe", Some("커피"), None)
            .unwrap();
        let queries = queries(&[("cafe", "k")]);
        let pools = vec![vec![place("1", "스터디룸"), place("2", "빵집")]];

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let course = assemble_from_pools(&queries, pools.clone(), &options, &mut rng);
            assert_eq!(ids(&course), vec!["2"]);
        }
    }

    #[test]
    fn test_include_and_exclude_patterns_apply() {
        let options = AssemblyOptions::default()
            .with_category_filter("cafe", Some("카페"), None)
            .unwrap()
            .with_category_filter("food", None, Some("카페|디저트"))
            .unwrap();
        let queries = queries(&[("cafe", "c"), ("food", "f")]);
        let pools = vec![
            vec![place("c1", "국밥집"), place("c2", "카페 B")],
            vec![place("f1", "디저트 카페"), place("f2", "파스타 바")],
        ];

        for seed in 0..10 {
            let mut rng = StdRng::seed_from_u64(seed);
            let course = assemble_from_pools(&queries, pools.clone(), &options, &mut rng);
            assert_eq!(ids(&course), vec!["c2", "f2"]);
        }
    }

    #[test]
    fn test_selection_stays_within_top_n() {
        let options = AssemblyOptions::default().with_top_n(2);
        let queries = queries(&[("cafe", "c")]);
        let pool: Vec<Candidate> = (0..10).map(|i| place(&i.to_string(), "카페")).collect();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let course = assemble_from_pools(&queries, vec![pool.clone()], &options, &mut rng);
            assert!(["0", "1"].contains(&course.steps[0].candidate.id.as_str()));
        }
    }

    #[test]
    fn test_top_n_larger_than_pool_is_clamped() {
        let options = AssemblyOptions::default().with_top_n(5);
        let queries = queries(&[("cafe", "c")]);
        let pool = vec![place("a", "카페 A"), place("b", "카페 B")];

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let course = assemble_from_pools(&queries, vec![pool.clone()], &options, &mut rng);
            assert!(["a", "b"].contains(&course.steps[0].candidate.id.as_str()));
        }
    }

    #[test]
    fn test_zero_top_n_is_raised_to_one() {
        let options = AssemblyOptions::default().with_top_n(0);
        assert_eq!(options.top_n, 1);

        let queries = queries(&[("cafe", "c")]);
        let pool = vec![place("a", "카페 A"), place("b", "카페 B")];
        let mut rng = StdRng::seed_from_u64(99);
        let course = assemble_from_pools(&queries, vec![pool], &options, &mut rng);
        assert_eq!(ids(&course), vec!["a"]);
    }

    #[test]
    fn test_same_seed_same_course() {
        let queries = queries(&[("cafe", "c"), ("food", "f")]);
        let pools = vec![
            (0..8).map(|i| place(&format!("c{i}"), "카페")).collect::<Vec<_>>(),
            (0..8).map(|i| place(&format!("f{i}"), "식당")).collect::<Vec<_>>(),
        ];
        let options = AssemblyOptions::default();

        let first = assemble_from_pools(&queries, pools.clone(), &options, &mut StdRng::seed_from_u64(42));
        let second = assemble_from_pools(&queries, pools, &options, &mut StdRng::seed_from_u64(42));
        assert_eq!(first, second);
    }

    #[test]
    fn test_place_is_not_reused_across_steps() {
        let options = AssemblyOptions::default().with_top_n(1);
        let queries = queries(&[("cafe", "c"), ("activity", "a")]);
        let pools = vec![
            vec![place("same", "한강 카페")],
            vec![place("same", "한강 카페"), place("other", "한강 공원")],
        ];
        let mut rng = StdRng::seed_from_u64(0);

        let course = assemble_from_pools(&queries, pools, &options, &mut rng);
        assert_eq!(ids(&course), vec!["same", "other"]);
    }

    #[test]
    fn test_category_filter_falls_back_when_its_only_match_is_already_used() {
        let options = AssemblyOptions::default()
            .with_top_n(1)
            .with_category_filter("food", Some("식당"), None)
            .unwrap();
        let queries = queries(&[("cafe", "c"), ("food", "f")]);
        let pools = vec![
            vec![place("a", "A 식당")],
            vec![place("a", "A 식당"), place("b", "B 주점")],
        ];
        let mut rng = StdRng::seed_from_u64(0);

        let course = assemble_from_pools(&queries, pools, &options, &mut rng);

        assert_eq!(course.steps.len(), 2);
        assert_eq!(ids(&course), vec!["a", "b"]);
        assert_eq!(course.steps[1].category, "food");
        assert_eq!(course.steps[1].order, 2);
    }

    #[test]
    fn test_category_with_only_used_places_is_skipped() {
        let queries = queries(&[("cafe", "c"), ("food", "f"), ("activity", "a")]);
        let pools = vec![
            vec![place("a", "카페 A")],
            vec![place("a", "카페 A")],
            vec![place("p", "공원")],
        ];
        let mut rng = StdRng::seed_from_u64(0);

        let course = assemble_from_pools(&queries, pools, &AssemblyOptions::default(), &mut rng);

        assert_eq!(ids(&course), vec!["a", "p"]);
        assert_eq!(course.steps[1].order, 2);
    }

    #[test]
    fn test_unnamed_candidates_remain_eligible() {
        let options = AssemblyOptions::default().with_deny_name_pattern("스터디").unwrap();
        let queries = queries(&[("activity", "a")]);
        let pools = vec![vec![Candidate::new("x", None, "")]];
        let mut rng = StdRng::seed_from_u64(0);

        let course = assemble_from_pools(&queries, pools, &options, &mut rng);
        assert_eq!(course.steps[0].candidate.display_name(), "unknown");
    }

    #[test]
    fn test_invalid_pattern_is_a_configuration_error() {
        let err = AssemblyOptions::default()
            .with_deny_name_pattern("(unclosed")
            .unwrap_err();
        assert!(matches!(err, AppError::Configuration(_)));
    }

    #[test]
    fn test_options_from_config() {
        let config: Config = envy::from_iter(vec![
            ("COURSE_TOP_N".to_string(), "3".to_string()),
            ("SEARCH_TIMEOUT_MS".to_string(), "1500".to_string()),
        ])
        .unwrap();

        let options =
            AssemblyOptions::from_config(&config, &crate::config::default_course_profile()).unwrap();

        assert_eq!(options.top_n, 3);
        assert_eq!(options.search_timeout, Duration::from_millis(1500));
        assert!(options.deny_name_pattern.as_ref().unwrap().is_match("24시 스터디카페"));
        assert!(options.category_filters.contains_key("cafe"));
        assert!(options.category_filters.contains_key("food"));
        assert!(!options.category_filters.contains_key("activity"));
    }
}
