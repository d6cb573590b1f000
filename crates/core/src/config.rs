use serde::Deserialize;

/// Root application configuration. Loaded from an optional
/// `retail-recommender.toml` and environment variables with the prefix
/// `RETAIL_RECOMMENDER__`.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub dataset: DatasetConfig,
    #[serde(default)]
    pub ranking: RankingConfig,
    #[serde(default)]
    pub recommendation: RecommendationConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatasetConfig {
    #[serde(default = "default_dataset_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RankingConfig {
    #[serde(default = "default_global_top")]
    pub global_top: usize,
    #[serde(default = "default_country_top")]
    pub country_top: usize,
    #[serde(default = "default_month_top")]
    pub month_top: usize,
    #[serde(default = "default_trend_products")]
    pub trend_products: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RecommendationConfig {
    #[serde(default = "default_recommendation_count")]
    pub default_count: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_filter")]
    pub filter: String,
    #[serde(default)]
    pub json: bool,
}

// Default functions
fn default_dataset_path() -> String {
    "online_retail.jsonl".to_string()
}
fn default_global_top() -> usize {
    10
}
fn default_country_top() -> usize {
    3
}
fn default_month_top() -> usize {
    3
}
fn default_trend_products() -> usize {
    5
}
fn default_recommendation_count() -> usize {
    5
}
fn default_log_filter() -> String {
    "retail_recommender=info,retail_core=info,retail_reporting=info,retail_personalization=info"
        .to_string()
}

impl Default for DatasetConfig {
    fn default() -> Self {
        Self {
            path: default_dataset_path(),
        }
    }
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            global_top: default_global_top(),
            country_top: default_country_top(),
            month_top: default_month_top(),
            trend_products: default_trend_products(),
        }
    }
}

impl Default for RecommendationConfig {
    fn default() -> Self {
        Self {
            default_count: default_recommendation_count(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
            json: false,
        }
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            dataset: DatasetConfig::default(),
            ranking: RankingConfig::default(),
            recommendation: RecommendationConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the optional config file and environment
    /// variables. Environment wins over the file.
    pub fn load() -> Result<Self, config::ConfigError> {
        let builder = config::Config::builder()
            .add_source(config::File::with_name("retail-recommender").required(false))
            .add_source(
                config::Environment::with_prefix("RETAIL_RECOMMENDER")
                    .separator("__")
                    .try_parsing(true),
            );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Reject values the aggregation and recommendation layers cannot use.
    pub fn validate(&self) -> crate::RetailResult<()> {
        let counts = [
            ("ranking.global_top", self.ranking.global_top),
            ("ranking.country_top", self.ranking.country_top),
            ("ranking.month_top", self.ranking.month_top),
            ("ranking.trend_products", self.ranking.trend_products),
            (
                "recommendation.default_count",
                self.recommendation.default_count,
            ),
        ];
        for (name, value) in counts {
            if value == 0 {
                return Err(crate::RetailError::Config(format!(
                    "{name} must be at least 1"
                )));
            }
        }
        if self.dataset.path.trim().is_empty() {
            return Err(crate::RetailError::Config(
                "dataset.path must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}
