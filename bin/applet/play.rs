use anyhow::Error as Anyhow;
use clap::Parser;
use derive_more::{Display, Error};
use lib::chess::{Color, Move};
use lib::game::{Config, Game};
use lib::magic::{Dice, Item, Rng, Spell, Target};
use std::io::{stdin, stdout, BufRead, Write};
use std::str::FromStr;
use tracing::{info, instrument, warn};

/// Plays a game of chess with magic, reading commands from the standard input.
#[derive(Debug, Default, Parser)]
#[clap(disable_help_flag = true, disable_version_flag = true)]
pub struct Play {
    /// Seed for the dice, drawn from entropy if omitted.
    #[clap(short, long)]
    seed: Option<u64>,

    /// Game configuration in RON.
    #[clap(short, long, default_value_t)]
    config: Config,
}

impl Play {
    #[instrument(level = "trace", skip(self), err)]
    pub fn execute(self) -> Result<(), Anyhow> {
        let dice = match self.seed {
            Some(seed) => Rng::seeded(seed),
            None => Rng::default(),
        };

        let game = Game::new(self.config, dice);
        Session::new(game, stdin().lock(), stdout().lock()).run()
    }
}

/// A command typed by a player.
#[derive(Debug, Clone, Eq, PartialEq)]
enum Command {
    Move(Move),
    Spell(Spell),
    Item(Item),
    Roll,
    Resolve(Target),
    Cancel,
    Skip,
    Forfeit,
    Show,
    Reset,
    Quit,
}

/// The reason why parsing [`Command`] failed.
#[derive(Debug, Display, Clone, Eq, PartialEq, Error)]
#[display("unknown command `{_0}`")]
struct ParseCommandError(#[error(not(source))] String);

impl FromStr for Command {
    type Err = ParseCommandError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (verb, arg) = s.split_once(' ').unwrap_or((s, ""));
        let arg = arg.trim();
        let fail = || ParseCommandError(s.to_string());

        match (verb, arg) {
            ("move", m) => Ok(Command::Move(m.parse().map_err(|_| fail())?)),
            ("spell", e) => Ok(Command::Spell(e.parse().map_err(|_| fail())?)),
            ("item", e) => Ok(Command::Item(e.parse().map_err(|_| fail())?)),
            ("roll", "") => Ok(Command::Roll),
            ("resolve", "") => Ok(Command::Resolve(Target::None)),
            ("resolve", t) => Ok(Command::Resolve(t.parse().map_err(|_| fail())?)),
            ("cancel", "") => Ok(Command::Cancel),
            ("skip", "") => Ok(Command::Skip),
            ("forfeit", "") => Ok(Command::Forfeit),
            ("show", "") => Ok(Command::Show),
            ("reset", "") => Ok(Command::Reset),
            ("quit", "") => Ok(Command::Quit),
            _ => Err(fail()),
        }
    }
}

/// Runs commands against a [`Game`] and prints their outcome.
struct Session<D: Dice, I: BufRead, O: Write> {
    game: Game<D>,
    input: I,
    output: O,
}

impl<D: Dice, I: BufRead, O: Write> Session<D, I, O> {
    fn new(game: Game<D>, input: I, output: O) -> Self {
        Session {
            game,
            input,
            output,
        }
    }

    fn run(mut self) -> Result<(), Anyhow> {
        self.show()?;

        let mut line = String::new();
        while {
            line.clear();
            self.input.read_line(&mut line)? > 0
        } {
            if line.trim().is_empty() {
                continue;
            }

            match line.parse() {
                Ok(Command::Quit) => break,
                Ok(cmd) => self.execute(cmd)?,
                Err(e) => {
                    warn!("{e}");
                    writeln!(self.output, "error: {e}")?;
                }
            }
        }

        Ok(())
    }

    fn execute(&mut self, cmd: Command) -> Result<(), Anyhow> {
        let outcome = match cmd {
            Command::Move(m) => self
                .game
                .attempt_move(m)
                .map(|_| None)
                .map_err(|e| (e.to_string(), e.kind())),
            Command::Spell(s) => self
                .game
                .select_spell(s)
                .map(|_| None)
                .map_err(|e| (e.to_string(), e.kind())),
            Command::Item(i) => self
                .game
                .select_item(i)
                .map(|_| None)
                .map_err(|e| (e.to_string(), e.kind())),
            Command::Roll => self
                .game
                .roll_dice()
                .map(|r| Some(format!("rolled {r}")))
                .map_err(|e| (e.to_string(), e.kind())),
            Command::Resolve(t) => self
                .game
                .resolve(t)
                .map(|r| Some(r.to_string()))
                .map_err(|e| (e.to_string(), e.kind())),
            Command::Skip => self
                .game
                .end_turn()
                .map(|r| Some(r.to_string()))
                .map_err(|e| (e.to_string(), e.kind())),
            Command::Cancel => Ok(self.game.deselect().map(|e| format!("cancelled {e}"))),
            Command::Forfeit => Ok(Some(self.game.forfeit().to_string())),
            Command::Reset => {
                self.game.reset();
                Ok(None)
            }
            Command::Show | Command::Quit => Ok(None),
        };

        match outcome {
            Ok(Some(msg)) => writeln!(self.output, "{msg}")?,
            Ok(None) => {}
            Err((msg, kind)) => {
                info!(%kind, "{msg}");
                writeln!(self.output, "error ({kind}): {msg}")?;
                return Ok(());
            }
        }

        self.show()
    }

    fn show(&mut self) -> Result<(), Anyhow> {
        let snapshot = self.game.snapshot();
        let turn = &snapshot.turn;
        writeln!(self.output, "{}", snapshot.board())?;

        let player = snapshot.current_player();
        writeln!(
            self.output,
            "turn {} round {}, {player} to play, {}, {}",
            turn.number, turn.round, snapshot.status, turn.phase,
        )?;

        if let Some(e) = turn.selection {
            writeln!(self.output, "selected {e}")?;
        }

        for side in [Color::White, Color::Black] {
            let graveyard = snapshot.graveyard(side);
            if !graveyard.is_empty() {
                let pieces: String = graveyard.iter().map(|p| p.to_string()).collect();
                writeln!(self.output, "{side} lost {pieces}")?;
            }
        }

        Ok(self.output.flush()?)
    }
}
