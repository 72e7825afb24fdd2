use std::time::Duration;

use anyhow::{Result, ensure};
use clap::Parser;

use crate::api::PollIntervals;
use crate::graph::CanvasSize;

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Base URL of the knowledge API.
    #[arg(long, env = "BRAINVAULT_API_URL", default_value = "http://localhost:8080")]
    api_url: String,

    #[arg(long, default_value_t = 5)]
    graph_interval_secs: u64,

    #[arg(long, default_value_t = 5)]
    stats_interval_secs: u64,

    #[arg(long, default_value_t = 10)]
    documents_interval_secs: u64,

    #[arg(long, default_value_t = 10)]
    request_timeout_secs: u64,

    /// Logical canvas size; node positions are expressed in these units.
    #[arg(long, default_value_t = 600.0)]
    canvas_width: f32,

    #[arg(long, default_value_t = 400.0)]
    canvas_height: f32,

    #[arg(long, default_value_t = 40.0)]
    canvas_padding: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub api_url: String,
    pub intervals: PollIntervals,
    pub request_timeout: Duration,
    pub canvas: CanvasSize,
    pub canvas_padding: f32,
}

impl TryFrom<Args> for Config {
    type Error = anyhow::Error;

    fn try_from(args: Args) -> Result<Self> {
        let api_url = args.api_url.trim().trim_end_matches('/').to_owned();
        ensure!(
            api_url.starts_with("http://") || api_url.starts_with("https://"),
            "api url must start with http:// or https://, got {api_url:?}"
        );
        ensure!(
            args.graph_interval_secs > 0
                && args.stats_interval_secs > 0
                && args.documents_interval_secs > 0,
            "poll intervals must be at least one second"
        );
        ensure!(
            args.request_timeout_secs > 0,
            "request timeout must be positive"
        );
        ensure!(
            args.canvas_width > 0.0 && args.canvas_height > 0.0,
            "canvas size must be positive, got {}x{}",
            args.canvas_width,
            args.canvas_height
        );
        ensure!(
            args.canvas_padding >= 0.0
                && args.canvas_padding * 2.0 < args.canvas_width.min(args.canvas_height),
            "canvas padding {} leaves no room for nodes",
            args.canvas_padding
        );

        Ok(Self {
            api_url,
            intervals: PollIntervals {
                graph: Duration::from_secs(args.graph_interval_secs),
                stats: Duration::from_secs(args.stats_interval_secs),
                documents: Duration::from_secs(args.documents_interval_secs),
            },
            request_timeout: Duration::from_secs(args.request_timeout_secs),
            canvas: CanvasSize::new(args.canvas_width, args.canvas_height),
            canvas_padding: args.canvas_padding,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(extra: &[&str]) -> Result<Config> {
        let argv = ["brainvault-graph", "--api-url", "http://localhost:8080"]
            .into_iter()
            .chain(extra.iter().copied());
        Config::try_from(Args::try_parse_from(argv)?)
    }

    #[test]
    fn defaults_match_api_cadence() {
        let config = parse(&[]).expect("valid config");
        assert_eq!(config.api_url, "http://localhost:8080");
        assert_eq!(config.intervals, PollIntervals::default());
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.canvas, CanvasSize::new(600.0, 400.0));
        assert_eq!(config.canvas_padding, 40.0);
    }

    #[test]
    fn overrides_are_applied() {
        let config = parse(&["--graph-interval-secs", "2", "--canvas-width", "800"])
            .expect("valid config");
        assert_eq!(config.intervals.graph, Duration::from_secs(2));
        assert_eq!(config.canvas.width, 800.0);
    }

    #[test]
    fn rejects_non_http_urls() {
        let args = Args::try_parse_from(["brainvault-graph", "--api-url", "localhost:8080"])
            .expect("parses");
        assert!(Config::try_from(args).is_err());
    }

    #[test]
    fn rejects_padding_that_swallows_the_canvas() {
        assert!(parse(&["--canvas-padding", "200"]).is_err());
    }

    #[test]
    fn rejects_zero_intervals() {
        assert!(parse(&["--stats-interval-secs", "0"]).is_err());
    }
}
