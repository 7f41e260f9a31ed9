use clap::Parser;
use newshelf::config::{CrawlConfig, OutputFormat};
use newshelf::crawler::Crawler;
use newshelf::http_client::{HttpFetcher, build_client};
use newshelf::post::PostDraft;
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("newshelf=info")),
        )
        .init();

    let config = CrawlConfig::parse();
    info!(base_url = %config.base_url, throttle = config.throttle, "starting newshelf");

    let client = build_client(config.timeout())?;
    let fetcher = HttpFetcher::new(client, config.throttle_delay());
    let crawler = Crawler::new(fetcher, config.crawl_options())?;

    let target = config.date.unwrap_or_else(|| crawler.today());
    let report = crawler.run(target).await?;

    let output = match config.format {
        OutputFormat::Json => serde_json::to_string_pretty(&report.titles)?,
        OutputFormat::Posts => {
            let base_url = &crawler.options().base_url;
            let drafts: Vec<_> = report
                .titles
                .iter()
                .map(|t| PostDraft::from_title(t, base_url))
                .collect();
            serde_json::to_string_pretty(&drafts)?
        }
    };
    println!("{}", output);

    Ok(())
}
