pub mod cache;
pub mod cli;
pub mod config;
pub mod database;
pub mod errors;
pub mod rating;
pub mod scoring;
pub mod services;

use std::io;

use anyhow::{Result, anyhow, bail};
use clap::{CommandFactory, Parser};
use clap_complete::Shell;
use colored::Colorize;

use crate::cli::Cli;
use crate::config::AppConfig;
use crate::database::{DbConn, MatchWithNames, Player};
use crate::scoring::{LiveMatch, MatchEvent, MatchMode, MatchSettings, PlayerSide};
use crate::services::records;
use crate::services::session::MatchSession;

pub fn interpret() -> cli::Command {
    let cli = Cli::parse();
    cli.command
}

pub fn handle_add_player(name: &str) -> Result<()> {
    let name = name.trim();
    if name.is_empty() {
        bail!("Player name cannot be empty");
    }

    let config = AppConfig::new();
    let mut conn = open_database(&config)?;

    if database::players::find_by_name(&mut conn, name)?.is_some() {
        bail!("Player '{name}' already exists");
    }

    let player =
        database::players::insert_player(&mut conn, name, None, config.rating.starter_rating)?;
    println!(
        "Added {} with a starting rating of {}",
        player.name.bold(),
        player.elo_rating
    );
    Ok(())
}

pub fn handle_players() -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;

    let players = database::players::list_all(&mut conn)?;
    if players.is_empty() {
        println!("No players yet. Add one with 'courtscore add-player <name>'.");
        return Ok(());
    }

    println!(
        "{:<20} {:>6}  {:>7}  {:>4}-{:<4} {:>6}",
        "Player".bold(),
        "Rating",
        "Matches",
        "W",
        "L",
        "Win%"
    );
    for player in players {
        let stats = records::player_stats(&mut conn, player.id)?;
        println!(
            "{:<20} {:>6}  {:>7}  {:>4}-{:<4} {:>5.1}%",
            player.name,
            player.elo_rating,
            stats.matches_played,
            stats.wins,
            stats.losses,
            stats.win_rate()
        );
    }
    Ok(())
}

pub fn handle_delete_player(name: &str) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;

    let player = require_player(&mut conn, name)?;
    database::players::delete_player(&mut conn, player.id)?;
    println!(
        "Removed {}. Their recorded matches stay in the history.",
        player.name.bold()
    );
    Ok(())
}

pub fn handle_start(
    player_a: &str,
    player_b: &str,
    best_of: u8,
    target: i32,
    no_win_by_two: bool,
    tie_break: bool,
) -> Result<()> {
    let settings = build_settings(best_of, target, no_win_by_two, tie_break)?;

    let config = AppConfig::new();
    let mut conn = open_database(&config)?;
    let a = require_player(&mut conn, player_a)?;
    let b = require_player(&mut conn, player_b)?;

    let mut session = MatchSession::new(config)?;
    session.start(&a, &b, settings)?;

    println!(
        "Match on: {} vs {} ({})",
        a.name.bold(),
        b.name.bold(),
        settings.match_mode.label()
    );
    if let Some(m) = session.active() {
        print_scoreboard(m);
    }
    Ok(())
}

pub fn handle_point(side: &str) -> Result<()> {
    let side = parse_side(side)?;

    let config = AppConfig::new();
    let mut session = MatchSession::new(config)?;
    let events = session.subscribe();

    session.score_point(side)?;

    for event in events.try_iter() {
        match event {
            MatchEvent::SetCompleted {
                set_number,
                winner,
                score_a,
                score_b,
            } => {
                let name = session
                    .active()
                    .map(|m| m.player_name(winner).to_string())
                    .unwrap_or_else(|| winner.as_str().to_string());
                println!(
                    "{}",
                    format!("Set {set_number} to {name}, {score_a}-{score_b}")
                        .yellow()
                        .bold()
                );
            }
            MatchEvent::MatchCompleted { winner } => {
                let name = session
                    .active()
                    .map(|m| m.player_name(winner).to_string())
                    .unwrap_or_else(|| winner.as_str().to_string());
                println!(
                    "{}",
                    format!("{name} wins the match! Run 'finish' to save it, or 'rematch'.")
                        .green()
                        .bold()
                );
            }
            _ => {}
        }
    }

    if let Some(m) = session.active() {
        print_scoreboard(m);
    }
    Ok(())
}

pub fn handle_undo() -> Result<()> {
    let config = AppConfig::new();
    let mut session = MatchSession::new(config)?;

    session.undo()?;
    if let Some(m) = session.active() {
        print_scoreboard(m);
    }
    Ok(())
}

pub fn handle_status() -> Result<()> {
    let config = AppConfig::new();
    let session = MatchSession::new(config)?;

    match session.active() {
        Some(m) => {
            print_scoreboard(m);
            let elapsed = (chrono::Utc::now() - m.start_date).num_seconds().max(0);
            println!("{}", format!("elapsed {}", format_duration(elapsed)).dimmed());
        }
        None => println!("No match in progress."),
    }
    Ok(())
}

pub fn handle_finish(notes: Option<&str>) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;
    let mut session = MatchSession::new(config)?;

    let record = session.finish(&mut conn, notes)?;
    print_record_summary(&mut conn, &record)?;
    Ok(())
}

pub fn handle_abandon(reason: Option<&str>) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;
    let mut session = MatchSession::new(config)?;

    let record = session.abandon(&mut conn, reason)?;
    println!(
        "Match abandoned{}; no rating changes.",
        record
            .abandon_reason
            .as_deref()
            .map(|r| format!(" ({r})"))
            .unwrap_or_default()
    );
    Ok(())
}

pub fn handle_rematch() -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;
    let mut session = MatchSession::new(config)?;

    let next = session.rematch()?;
    let record = session.finish(&mut conn, None)?;
    print_record_summary(&mut conn, &record)?;

    session.adopt(next)?;
    println!("\nRematch on!");
    if let Some(m) = session.active() {
        print_scoreboard(m);
    }
    Ok(())
}

pub fn handle_history(player: Option<&str>) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;

    let rows = match player {
        Some(name) => {
            let player = require_player(&mut conn, name)?;
            database::matches::list_by_player(&mut conn, player.id)?
        }
        None => database::matches::list_all(&mut conn)?,
    };

    if rows.is_empty() {
        println!("No matches recorded yet.");
        return Ok(());
    }

    for row in rows {
        print_history_row(&row);
    }
    Ok(())
}

pub fn handle_record(
    player_a: &str,
    player_b: &str,
    score_a: i32,
    score_b: i32,
    notes: Option<&str>,
) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;
    let a = require_player(&mut conn, player_a)?;
    let b = require_player(&mut conn, player_b)?;

    let record = records::record_manual_match(
        &mut conn,
        &config.rating,
        a.id,
        b.id,
        score_a,
        score_b,
        chrono::Utc::now().naive_utc(),
        notes,
    )?;
    print_record_summary(&mut conn, &record)?;
    Ok(())
}

pub fn handle_delete_match(id: i32) -> Result<()> {
    let config = AppConfig::new();
    let mut conn = open_database(&config)?;

    if records::delete_match(&mut conn, id)? {
        println!("Deleted match {id}. Ratings are unchanged.");
    } else {
        println!("No match with id {id}.");
    }
    Ok(())
}

pub fn handle_completions(shell: Shell) -> Result<()> {
    clap_complete::generate(shell, &mut Cli::command(), "courtscore", &mut io::stdout());
    Ok(())
}

fn open_database(config: &AppConfig) -> Result<DbConn> {
    let pool = database::create_pool(&config.storage.database_path)?;
    let mut conn = database::get_connection(&pool)?;
    database::setup::init_database(&mut conn)?;
    Ok(conn)
}

fn require_player(conn: &mut DbConn, name: &str) -> Result<Player> {
    database::players::find_by_name(conn, name.trim())?
        .ok_or_else(|| anyhow!("Unknown player '{name}'. Register them with 'add-player' first."))
}

fn build_settings(
    best_of: u8,
    target: i32,
    no_win_by_two: bool,
    tie_break: bool,
) -> Result<MatchSettings> {
    let match_mode = match best_of {
        1 => MatchMode::BestOf1,
        3 => MatchMode::BestOf3,
        5 => MatchMode::BestOf5,
        other => bail!("--best-of must be 1, 3 or 5 (got {other})"),
    };
    if target <= 0 {
        bail!("--target must be a positive score");
    }

    Ok(MatchSettings {
        match_mode,
        target_score: target,
        win_by_two: !no_win_by_two,
        tie_break_mode: tie_break,
    })
}

fn parse_side(side: &str) -> Result<PlayerSide> {
    match side.to_ascii_lowercase().as_str() {
        "a" => Ok(PlayerSide::A),
        "b" => Ok(PlayerSide::B),
        other => bail!("Side must be 'a' or 'b' (got '{other}')"),
    }
}

fn print_scoreboard(m: &LiveMatch) {
    let rules = format!(
        "{} · first to {}{}",
        m.settings.match_mode.label(),
        m.settings.effective_target(),
        if m.settings.win_by_two {
            ", win by two"
        } else {
            ""
        }
    );
    println!("{}", rules.dimmed());

    match m.match_winner() {
        Some(winner) => println!(
            "{} {} {}-{}",
            "Decided:".green().bold(),
            m.player_name(winner).bold(),
            m.sets_won(winner),
            m.sets_won(winner.opponent())
        ),
        None => println!(
            "Set {} of {}",
            m.current_set_number,
            m.settings.match_mode.total_sets()
        ),
    }

    println!(
        "  {:<16} {:>3}   sets {}",
        m.player_a_name.bold(),
        m.score_a,
        m.sets_won_a
    );
    println!(
        "  {:<16} {:>3}   sets {}",
        m.player_b_name.bold(),
        m.score_b,
        m.sets_won_b
    );

    if !m.completed_sets.is_empty() {
        let summary = m
            .completed_sets
            .iter()
            .map(|s| format!("{}-{}", s.score_a, s.score_b))
            .collect::<Vec<_>>()
            .join(", ");
        println!("{}", format!("  sets so far: {summary}").dimmed());
    }
}

fn print_record_summary(conn: &mut DbConn, record: &database::MatchRecord) -> Result<()> {
    let name_a = database::players::find_by_id(conn, record.player_a_id)?
        .map(|p| p.name)
        .unwrap_or_else(|| format!("player {}", record.player_a_id));
    let name_b = database::players::find_by_id(conn, record.player_b_id)?
        .map(|p| p.name)
        .unwrap_or_else(|| format!("player {}", record.player_b_id));

    println!(
        "Saved: {} {} - {} {}",
        name_a.bold(),
        record.score_a,
        record.score_b,
        name_b.bold()
    );
    println!(
        "  {} {}   {} {}",
        name_a,
        format_elo_change(record.elo_change_a),
        name_b,
        format_elo_change(record.elo_change_b)
    );
    Ok(())
}

fn format_elo_change(change: i32) -> String {
    if change >= 0 {
        format!("+{change}").green().to_string()
    } else {
        change.to_string().red().to_string()
    }
}

fn print_history_row(row: &MatchWithNames) {
    let record = &row.record;
    let mut line = format!(
        "#{:<4} {}  {} {} - {} {}  [{}]",
        record.id,
        record.date.format("%Y-%m-%d %H:%M"),
        row.player_a_name,
        record.score_a,
        record.score_b,
        row.player_b_name,
        record.match_mode.label()
    );

    if !record.set_scores.is_empty() {
        let sets = record
            .set_scores
            .iter()
            .map(|s| format!("{}-{}", s.score_a, s.score_b))
            .collect::<Vec<_>>()
            .join(", ");
        line.push_str(&format!("  sets: {sets}"));
    }
    if record.duration_secs > 0 {
        line.push_str(&format!("  {}", format_duration(record.duration_secs)));
    }

    if record.abandoned {
        line.push_str(&format!("  {}", "abandoned".red()));
        if let Some(reason) = &record.abandon_reason {
            line.push_str(&format!(" ({reason})"));
        }
    } else {
        line.push_str(&format!(
            "  elo {} / {}",
            format_elo_change(record.elo_change_a),
            format_elo_change(record.elo_change_b)
        ));
    }

    println!("{line}");
    if let Some(notes) = &record.notes {
        println!("      {}", notes.dimmed());
    }
}

fn format_duration(total_secs: i64) -> String {
    let minutes = total_secs / 60;
    let seconds = total_secs % 60;
    format!("{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_settings_maps_flags() {
        let settings = build_settings(3, 9, true, false).unwrap();
        assert_eq!(settings.match_mode, MatchMode::BestOf3);
        assert_eq!(settings.target_score, 9);
        assert!(!settings.win_by_two);
        assert!(!settings.tie_break_mode);

        assert!(build_settings(2, 11, false, false).is_err());
        assert!(build_settings(1, 0, false, false).is_err());
    }

    #[test]
    fn side_parsing_is_case_insensitive() {
        assert_eq!(parse_side("a").unwrap(), PlayerSide::A);
        assert_eq!(parse_side("B").unwrap(), PlayerSide::B);
        assert!(parse_side("c").is_err());
    }

    #[test]
    fn durations_format_as_minutes_and_seconds() {
        assert_eq!(format_duration(0), "00:00");
        assert_eq!(format_duration(65), "01:05");
        assert_eq!(format_duration(600), "10:00");
    }
}
