use anyhow::Result;

use courtscore::cli::Command;
use courtscore::{
    handle_abandon, handle_add_player, handle_completions, handle_delete_match,
    handle_delete_player, handle_finish, handle_history, handle_players, handle_point,
    handle_record, handle_rematch, handle_start, handle_status, handle_undo, interpret,
};

fn main() {
    setup_logging();
    parse_and_execute().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        std::process::exit(1);
    });
}

fn setup_logging() {
    sensible_env_logger::init!();
}

fn parse_and_execute() -> Result<()> {
    let command = interpret();
    execute_command(&command)
}

fn execute_command(command: &Command) -> Result<()> {
    match command {
        Command::AddPlayer { name } => handle_add_player(name),
        Command::Players => handle_players(),
        Command::DeletePlayer { name } => handle_delete_player(name),
        Command::Start {
            player_a,
            player_b,
            best_of,
            target,
            no_win_by_two,
            tie_break,
        } => handle_start(
            player_a,
            player_b,
            *best_of,
            *target,
            *no_win_by_two,
            *tie_break,
        ),
        Command::Point { side } => handle_point(side),
        Command::Undo => handle_undo(),
        Command::Status => handle_status(),
        Command::Finish { notes } => handle_finish(notes.as_deref()),
        Command::Abandon { reason } => handle_abandon(reason.as_deref()),
        Command::Rematch => handle_rematch(),
        Command::History { player } => handle_history(player.as_deref()),
        Command::Record {
            player_a,
            player_b,
            score_a,
            score_b,
            notes,
        } => handle_record(player_a, player_b, *score_a, *score_b, notes.as_deref()),
        Command::DeleteMatch { id } => handle_delete_match(*id),
        Command::Completions { shell } => handle_completions(*shell),
    }
}
