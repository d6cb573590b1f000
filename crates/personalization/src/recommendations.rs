//! Similar-product recommendations: substring matching over the product
//! summary table, ranked by a plural-suffix partition and then popularity.

use chrono::{DateTime, Utc};
use retail_core::{normalize, ProductSummary, SummaryTable};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;
use uuid::Uuid;

/// Re-ordering applied to a result list after ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    Popularity,
    PriceAscending,
    PriceDescending,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationRequest {
    pub query: String,
    /// Maximum number of results; callers validate it is at least 1.
    pub limit: usize,
    #[serde(default)]
    pub sort: Option<SortOrder>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationResponse {
    pub request_id: Uuid,
    pub query: String,
    pub sort: Option<SortOrder>,
    pub items: Vec<ProductSummary>,
    pub generated_at: DateTime<Utc>,
}

/// Which half of the ranking a candidate falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SuffixGroup {
    Primary,
    Secondary,
}

/// Plural-suffix partition: a candidate is primary when it agrees with the
/// query on ending in "s". Both inputs are normalized.
///
/// This groups singular and plural name variants; it knows nothing about
/// how similar two products actually are.
fn suffix_group(query: &str, description: &str) -> SuffixGroup {
    if query.ends_with('s') == description.ends_with('s') {
        SuffixGroup::Primary
    } else {
        SuffixGroup::Secondary
    }
}

/// Products whose description contains `query`, excluding the product whose
/// description is exactly `query`, ranked and truncated to `n`.
///
/// Primary-group candidates (see [`suffix_group`]) come first, then the
/// secondary group; each group is ordered by descending quantity sold with
/// ties kept in table order. Pure and deterministic.
pub fn recommend(query: &str, summary: &SummaryTable, n: usize) -> Vec<ProductSummary> {
    let q = normalize(query);

    let mut primary: Vec<&ProductSummary> = Vec::new();
    let mut secondary: Vec<&ProductSummary> = Vec::new();

    for entry in summary {
        let description = entry.normalized_description();
        if !description.contains(&q) || description == q {
            continue;
        }
        match suffix_group(&q, &description) {
            SuffixGroup::Primary => primary.push(entry),
            SuffixGroup::Secondary => secondary.push(entry),
        }
    }

    primary.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));
    secondary.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity));

    primary
        .into_iter()
        .chain(secondary)
        .take(n)
        .cloned()
        .collect()
}

/// Re-order a result list in place. Stable, so equal keys keep their
/// recommendation rank.
pub fn sort_results(items: &mut [ProductSummary], order: SortOrder) {
    match order {
        SortOrder::Popularity => items.sort_by(|a, b| b.total_quantity.cmp(&a.total_quantity)),
        SortOrder::PriceAscending => items.sort_by(|a, b| {
            a.unit_price
                .partial_cmp(&b.unit_price)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
        SortOrder::PriceDescending => items.sort_by(|a, b| {
            b.unit_price
                .partial_cmp(&a.unit_price)
                .unwrap_or(std::cmp::Ordering::Equal)
        }),
    }
}

/// Serves recommendation requests against a summary table built once at
/// startup. The table is shared read-only, so the engine is cheap to clone
/// and safe to call from several places at once.
#[derive(Debug, Clone, Default)]
pub struct RecommendationEngine {
    summary: Arc<SummaryTable>,
}

impl RecommendationEngine {
    pub fn new(summary: SummaryTable) -> Self {
        Self {
            summary: Arc::new(summary),
        }
    }

    pub fn from_shared(summary: Arc<SummaryTable>) -> Self {
        Self { summary }
    }

    pub fn summary(&self) -> &SummaryTable {
        &self.summary
    }

    /// Product details for one description (case-insensitive).
    pub fn product(&self, description: &str) -> Option<&ProductSummary> {
        self.summary.get(description)
    }

    pub fn recommend(&self, request: &RecommendationRequest) -> RecommendationResponse {
        metrics::counter!("recommendations.requests").increment(1);

        let mut items = recommend(&request.query, &self.summary, request.limit);
        if let Some(order) = request.sort {
            sort_results(&mut items, order);
        }

        if items.is_empty() {
            metrics::counter!("recommendations.empty").increment(1);
        }
        debug!(
            query = %request.query,
            limit = request.limit,
            matched = items.len(),
            "Recommendations resolved"
        );

        RecommendationResponse {
            request_id: Uuid::new_v4(),
            query: request.query.clone(),
            sort: request.sort,
            items,
            generated_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn product(description: &str, unit_price: f64, total_quantity: i64) -> ProductSummary {
        ProductSummary {
            description: description.to_string(),
            unit_price,
            total_quantity,
        }
    }

    fn mugs() -> SummaryTable {
        SummaryTable::from_entries(vec![
            product("Red Mug", 2.5, 10),
            product("Blue Mugs", 3.0, 20),
            product("Red Mugs", 1.5, 5),
        ])
    }

    fn names(items: &[ProductSummary]) -> Vec<&str> {
        items.iter().map(|p| p.description.as_str()).collect()
    }

    #[test]
    fn test_singular_query_ranks_singular_first() {
        let items = recommend("mug", &mugs(), 5);
        assert_eq!(names(&items), vec!["Red Mug", "Blue Mugs", "Red Mugs"]);
    }

    #[test]
    fn test_plural_query_ranks_plural_first() {
        let table = SummaryTable::from_entries(vec![
            product("Red Mug", 2.5, 100),
            product("Blue Mugs", 3.0, 20),
            product("Red Mugs", 1.5, 5),
            product("Mugs", 1.0, 500),
        ]);
        // "mugs" itself is excluded; "red mug" does not contain "mugs".
        let items = recommend("Mugs", &table, 5);
        assert_eq!(names(&items), vec!["Blue Mugs", "Red Mugs"]);
    }

    #[test]
    fn test_plural_query_puts_singular_suffix_last() {
        let table = SummaryTable::from_entries(vec![
            product("Mugs Holder", 4.0, 900),
            product("Blue Mugs", 3.0, 20),
            product("Red Mugs", 1.5, 5),
        ]);
        let items = recommend("mugs", &table, 5);
        assert_eq!(names(&items), vec!["Blue Mugs", "Red Mugs", "Mugs Holder"]);

        let items = recommend("mugs", &table, 2);
        assert_eq!(names(&items), vec!["Blue Mugs", "Red Mugs"]);
    }

    #[test]
    fn test_suffix_outranks_popularity() {
        let table = SummaryTable::from_entries(vec![
            product("Glass Jars", 1.0, 900),
            product("Glass Jar", 1.0, 1),
            product("Glass Jar Lid", 1.0, 50),
        ]);
        let items = recommend("jar", &table, 5);
        assert_eq!(
            names(&items),
            vec!["Glass Jar Lid", "Glass Jar", "Glass Jars"]
        );
    }

    #[test]
    fn test_exact_match_excluded() {
        let table = SummaryTable::from_entries(vec![
            product("Red Mug", 2.5, 10),
            product("Red Mugs", 1.5, 5),
        ]);
        let items = recommend("Red Mug", &table, 5);
        assert_eq!(names(&items), vec!["Red Mugs"]);

        let items = recommend("  RED MUG  ", &table, 5);
        assert_eq!(names(&items), vec!["Red Mugs"]);
    }

    #[test]
    fn test_no_candidates_is_empty() {
        assert!(recommend("teapot", &mugs(), 5).is_empty());
        assert!(recommend("mug", &SummaryTable::default(), 5).is_empty());
    }

    #[test]
    fn test_bounded_by_n() {
        let items = recommend("mug", &mugs(), 2);
        assert_eq!(names(&items), vec!["Red Mug", "Blue Mugs"]);
        assert_eq!(recommend("mug", &mugs(), 1).len(), 1);
    }

    #[test]
    fn test_results_contain_query_and_never_equal_it() {
        let table = SummaryTable::from_entries(vec![
            product("Heart", 1.0, 1),
            product("White Hanging Heart", 2.55, 300),
            product("Hearts Garland", 4.0, 20),
            product("Heart Of Wicker Small", 1.65, 80),
            product("Candle", 1.0, 3),
        ]);
        for query in ["heart", "HEART ", "hearts", "art", "e"] {
            let q = normalize(query);
            let items = recommend(query, &table, 10);
            assert!(items.len() <= 10);
            for item in &items {
                let description = item.normalized_description();
                assert!(description.contains(&q), "{query}: {description}");
                assert_ne!(description, q);
            }
        }
    }

    #[test]
    fn test_idempotent() {
        let table = mugs();
        assert_eq!(recommend("mug", &table, 5), recommend("mug", &table, 5));
    }

    #[test]
    fn test_equal_quantities_keep_table_order() {
        let table = SummaryTable::from_entries(vec![
            product("Tin A", 1.0, 7),
            product("Tin B", 1.0, 7),
            product("Tin C", 1.0, 7),
        ]);
        assert_eq!(
            names(&recommend("tin", &table, 5)),
            vec!["Tin A", "Tin B", "Tin C"]
        );
    }

    #[test]
    fn test_sort_results() {
        let mut items = recommend("mug", &mugs(), 5);

        sort_results(&mut items, SortOrder::PriceAscending);
        assert_eq!(names(&items), vec!["Red Mugs", "Red Mug", "Blue Mugs"]);

        sort_results(&mut items, SortOrder::PriceDescending);
        assert_eq!(names(&items), vec!["Blue Mugs", "Red Mug", "Red Mugs"]);

        sort_results(&mut items, SortOrder::Popularity);
        assert_eq!(names(&items), vec!["Blue Mugs", "Red Mug", "Red Mugs"]);
    }

    #[test]
    fn test_engine_recommend() {
        let engine = RecommendationEngine::new(mugs());
        let req = RecommendationRequest {
            query: "mug".to_string(),
            limit: 5,
            sort: None,
        };
        let resp = engine.recommend(&req);
        assert_eq!(names(&resp.items), vec!["Red Mug", "Blue Mugs", "Red Mugs"]);
        assert_eq!(resp.query, "mug");
        assert!(resp.sort.is_none());

        let sorted = engine.recommend(&RecommendationRequest {
            sort: Some(SortOrder::PriceAscending),
            ..req
        });
        assert_eq!(sorted.items[0].description, "Red Mugs");
        assert_ne!(resp.request_id, sorted.request_id);
    }

    #[test]
    fn test_engine_product_details() {
        let engine = RecommendationEngine::new(mugs());
        let details = engine.product("blue mugs").unwrap();
        assert_eq!(details.unit_price, 3.0);
        assert_eq!(details.total_quantity, 20);
        assert!(engine.product("teapot").is_none());
    }

    #[test]
    fn test_engines_share_one_table() {
        let table = Arc::new(mugs());
        let a = RecommendationEngine::from_shared(Arc::clone(&table));
        let b = a.clone();
        assert_eq!(Arc::strong_count(&table), 3);
        assert_eq!(a.summary().len(), b.summary().len());
    }

    #[test]
    fn test_default_engine_is_empty() {
        let engine = RecommendationEngine::default();
        let resp = engine.recommend(&RecommendationRequest {
            query: "mug".to_string(),
            limit: 5,
            sort: None,
        });
        assert!(resp.items.is_empty());
        assert!(engine.summary().is_empty());
    }

    #[test]
    fn test_request_deserializes_without_sort() {
        let req: RecommendationRequest =
            serde_json::from_str(r#"{"query": "mug", "limit": 3}"#).unwrap();
        assert_eq!(req.limit, 3);
        assert!(req.sort.is_none());
    }
}
