use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use videoindex_common::Config;
use videoindex_pipeline::embedder::LocalEmbedder;
use videoindex_pipeline::store::ParquetStore;
use videoindex_pipeline::transcript_source::YtTranscriptSource;
use videoindex_pipeline::Pipeline;
use youtube_client::YouTubeClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("videoindex=info".parse()?))
        .init();

    info!(
        "Starting data pipeline at {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("----------------------------------------------");

    let config = Config::from_env();

    let store = ParquetStore::new(&config.data_dir);

    let mut search = YouTubeClient::new(config.youtube_api_key.clone());
    if let Some(base_url) = &config.youtube_base_url {
        search = search.with_base_url(base_url);
    }

    let transcripts = YtTranscriptSource::new()?;
    let embedder = LocalEmbedder::new(config.data_dir.join(".fastembed_cache"));

    let pipeline = Pipeline::new(
        config.channel_id.clone(),
        &store,
        &search,
        &transcripts,
        &embedder,
    );
    let stats = pipeline.run().await?;

    info!("Pipeline run complete. {stats}");
    Ok(())
}
