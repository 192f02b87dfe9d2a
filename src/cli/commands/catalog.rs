//! Catalog sync, statistics, and picking commands.

use tokio::runtime::Runtime;

use super::{Cli, connect, load_config};
use crate::stats;

/// Discover artists and list albums of new ones
pub fn cmd_sync(rt: &Runtime, cli: &Cli) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = connect(load_config(cli)).await?;

        println!("Discovering artists from your playlists...");
        let artists = session.sync.sync_user_artists().await?;
        println!("New artists: {}", artists.saved.len());
        if !artists.is_clean() {
            eprintln!("{} artists could not be saved:", artists.failures.len());
            for failure in &artists.failures {
                eprintln!("  {}: {}", failure.id, failure.error);
            }
        }

        println!("Listing albums...");
        let albums = session.sync.sync_all_artists().await?;
        println!("Albums in catalog: {}", albums.len());
        Ok(())
    })
}

/// Show catalog statistics
pub fn cmd_stats(rt: &Runtime, cli: &Cli) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = connect(load_config(cli)).await?;
        let stats =
            stats::catalog_statistics(&session.sync, &session.config.estimator).await?;
        let estimate = stats.estimate;

        println!("Catalog Statistics");
        println!("==================");
        println!("Artists:         {}", stats.artists);
        println!("Albums:          {}", estimate.albums);
        println!("  not listed:    {}", estimate.unlisted_albums);
        println!("Tracks (approx): {}", estimate.total_tracks);
        println!("Rated:           {}", stats.rated_tracks);
        println!("Rated today:     {}", stats.rated_today);
        println!(
            "Unrated (approx): {} (~{})",
            estimate.unrated_tracks,
            stats::format_duration(estimate.unrated_duration_ms)
        );
        Ok(())
    })
}

/// Print random unrated tracks
pub fn cmd_pick(rt: &Runtime, cli: &Cli, count: usize) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = connect(load_config(cli)).await?;
        session.sync.sync_all_artists().await?;

        let tracks = session.selector.select_random_unrated_tracks(count).await?;
        if tracks.is_empty() {
            println!("No unrated tracks found.");
        }
        for track in tracks {
            println!("{}  {}", track.id, track.name);
        }
        Ok(())
    })
}
