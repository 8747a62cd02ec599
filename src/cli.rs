//! Command-line interface definitions.
//!
//! A run selects one source and one news type; an optional interval turns
//! the single run into a periodic job with an immediate first run.

use crate::models::NewsCategory;
use clap::{Parser, ValueEnum};

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # One hot-news run against Sina
/// newsgrab --source sina --news-type hot_news
///
/// # Re-harvest the Tencent hot list every 30 minutes
/// newsgrab -s tencent -n hot_news --interval 30
///
/// # Explicit configuration file
/// newsgrab -s weibo -n hot_news -c ./config.yaml
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// News source to harvest (sina, tencent, weibo, sztv, ...)
    #[arg(short, long)]
    pub source: String,

    /// News type to harvest
    #[arg(short, long, value_enum, default_value = "hot_news")]
    pub news_type: NewsType,

    /// Re-run every N minutes (immediate first run); omit to run once
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Path to the YAML configuration file
    #[arg(short, long)]
    pub config: Option<String>,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum NewsType {
    #[value(name = "hot_news")]
    HotNews,
    #[value(name = "latest_china_news")]
    LatestChinaNews,
}

impl NewsType {
    pub fn category(self) -> NewsCategory {
        match self {
            NewsType::HotNews => NewsCategory::Hot,
            NewsType::LatestChinaNews => NewsCategory::LatestChina,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::parse_from(["newsgrab", "--source", "sina", "--news-type", "hot_news"]);
        assert_eq!(cli.source, "sina");
        assert_eq!(cli.news_type, NewsType::HotNews);
        assert!(cli.interval.is_none());
    }

    #[test]
    fn test_cli_short_flags_and_interval() {
        let cli = Cli::parse_from([
            "newsgrab",
            "-s",
            "tencent",
            "-n",
            "latest_china_news",
            "-i",
            "30",
        ]);
        assert_eq!(cli.source, "tencent");
        assert_eq!(cli.news_type, NewsType::LatestChinaNews);
        assert_eq!(cli.interval, Some(30));
    }

    #[test]
    fn test_news_type_defaults_to_hot() {
        let cli = Cli::parse_from(["newsgrab", "-s", "weibo"]);
        assert_eq!(cli.news_type.category(), NewsCategory::Hot);
    }
}
