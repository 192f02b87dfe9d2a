//! Playback, queueing, and rating commands.

use std::io::Write;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::runtime::Runtime;
use tracing::warn;

use super::{Cli, Session, connect, load_config, open_store};
use crate::db;
use crate::model::{Rating, UserRating};
use crate::playback;
use crate::rating;

/// Play one random unrated track
pub fn cmd_play(rt: &Runtime, cli: &Cli) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = connect(load_config(cli)).await?;
        session.sync.sync_all_artists().await?;

        match playback::play_unrated_track(&session.pool, &session.selector, &session.controller)
            .await?
        {
            Some(track) => println!("Playing: {} ({})", track.name, track.id),
            None => println!("No unrated tracks found."),
        }
        Ok(())
    })
}

/// Queue unrated tracks and skip ahead to the first one
pub fn cmd_queue(rt: &Runtime, cli: &Cli, count: usize) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = connect(load_config(cli)).await?;
        session.sync.sync_all_artists().await?;

        let tracks = session.selector.select_random_unrated_tracks(count).await?;
        let Some((first, rest)) = tracks.split_first() else {
            println!("No unrated tracks found.");
            return Ok(());
        };

        let reached = session
            .controller
            .enqueue_and_skip_to(&first.id, &first.uri)
            .await?;
        if reached {
            db::set_track_played(&session.pool, &first.id, Utc::now().timestamp_millis()).await?;
            println!("Playing: {} ({})", first.name, first.id);
        } else {
            println!(
                "Queued: {} ({}), but could not skip to it ({})",
                first.name,
                first.id,
                session.controller.state()
            );
        }

        for track in rest {
            session.controller.enqueue(&track.id, &track.uri).await?;
            println!("Queued: {} ({})", track.name, track.id);
        }
        Ok(())
    })
}

/// Rate a track
pub fn cmd_rate(rt: &Runtime, cli: &Cli, track_id: &str, label: &str) -> anyhow::Result<()> {
    let rating: Rating = label.parse()?;
    rt.block_on(async {
        let pool = open_store(&load_config(cli)).await?;
        let track = rating::rate_track(&pool, track_id, rating).await?;
        println!("Rated \"{}\" as {}", track.name, track.rating);
        Ok(())
    })
}

/// List recently played unrated tracks
pub fn cmd_recent(rt: &Runtime, cli: &Cli) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_store(&load_config(cli)).await?;
        let tracks = playback::recently_played_unrated(&pool).await?;
        if tracks.is_empty() {
            println!("Nothing played in the last 30 minutes is waiting for a rating.");
        }

        let now = Utc::now().timestamp_millis();
        for entry in tracks {
            let minutes = entry
                .track
                .played_timestamp
                .map(|played| (now - played) / 60_000)
                .unwrap_or_default();
            println!(
                "{}  {} - {} ({} min ago)",
                entry.track.id, entry.artist_name, entry.track.name, minutes
            );
        }
        Ok(())
    })
}

/// What the user typed at the rating prompt.
#[derive(Debug, PartialEq, Eq)]
enum Answer {
    Rate(Rating),
    Skip,
    Quit,
    Unknown,
}

/// `1`-`5` pick from [`UserRating::ALL`]; labels and keys also work.
fn parse_answer(input: &str) -> Answer {
    let input = input.trim();
    match input {
        "q" | "quit" => return Answer::Quit,
        "" | "s" | "skip" => return Answer::Skip,
        _ => {}
    }

    if let Ok(n) = input.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| UserRating::ALL.get(i))
            .map(|r| Answer::Rate(Rating::User(*r)))
            .unwrap_or(Answer::Unknown);
    }
    match input.parse::<Rating>() {
        Ok(Rating::User(r)) => Answer::Rate(Rating::User(r)),
        _ => Answer::Unknown,
    }
}

fn prompt() -> String {
    let options: Vec<String> = UserRating::ALL
        .iter()
        .enumerate()
        .map(|(i, r)| format!("{} {}", i + 1, r.label()))
        .collect();
    format!("[{}  s skip  q quit] > ", options.join("  "))
}

/// Interactive play-and-rate loop
pub fn cmd_session(rt: &Runtime, cli: &Cli) -> anyhow::Result<()> {
    rt.block_on(async {
        let session = connect(load_config(cli)).await?;
        session.sync.sync_all_artists().await?;

        tokio::select! {
            result = session_loop(&session) => result,
            _ = tokio::signal::ctrl_c() => {
                println!();
                Ok(())
            }
        }
    })
}

async fn session_loop(session: &Session) -> anyhow::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        let Some(track) =
            playback::play_unrated_track(&session.pool, &session.selector, &session.controller)
                .await?
        else {
            println!("Nothing left to rate.");
            return Ok(());
        };
        println!("\nNow playing: {}", track.name);

        loop {
            print!("{}", prompt());
            std::io::stdout().flush()?;
            let Some(line) = lines.next_line().await? else {
                return Ok(());
            };

            match parse_answer(&line) {
                Answer::Quit => return Ok(()),
                Answer::Skip => break,
                Answer::Unknown => println!("Unknown answer: {}", line.trim()),
                Answer::Rate(rating) => {
                    if let Err(e) = rating::rate_track(&session.pool, &track.id, rating).await {
                        warn!("Failed to rate {}: {}", track.id, e);
                        println!("Could not save the rating, try again.");
                        continue;
                    }
                    if !rating.advances_immediately() {
                        println!("Letting it finish...");
                        session.controller.wait_for_track_end(&track.id).await;
                    }
                    break;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_answer_numbers_follow_prompt_order() {
        assert_eq!(parse_answer("1"), Answer::Rate(Rating::User(UserRating::Nope)));
        assert_eq!(
            parse_answer("3"),
            Answer::Rate(Rating::User(UserRating::Absolutely))
        );
        assert_eq!(parse_answer("6"), Answer::Unknown);
        assert_eq!(parse_answer("0"), Answer::Unknown);
    }

    #[test]
    fn test_parse_answer_words() {
        assert_eq!(parse_answer(" good \n"), Answer::Rate(Rating::User(UserRating::Good)));
        assert_eq!(parse_answer("q"), Answer::Quit);
        assert_eq!(parse_answer(""), Answer::Skip);
        // System ratings are not offered to the user
        assert_eq!(parse_answer("automaticallyOmitted"), Answer::Unknown);
        assert_eq!(parse_answer("unrated"), Answer::Unknown);
    }

    #[test]
    fn test_prompt_lists_every_label() {
        let prompt = prompt();
        for rating in UserRating::ALL {
            assert!(prompt.contains(rating.label()));
        }
    }
}
