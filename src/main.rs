#[cfg(not(feature = "std"))]
fn main() {}

#[cfg(feature = "std")]
use armada::{
    default_fleet, init_logging, run_match, ActionQueue, Board, Difficulty, EraRules, Game,
    GameMode, GamePhase, HeadlessPacer, Pacer, Pacing, Player, PlayerId, PlayerSummary, Strategy,
    TargetingMachine, TokioPacer, DEFAULT_BOARD_SIZE,
};

#[cfg(feature = "std")]
use clap::{Parser, ValueEnum};
#[cfg(feature = "std")]
use rand::Rng;
#[cfg(feature = "std")]
use std::time::Duration;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[cfg(feature = "std")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[cfg(feature = "std")]
enum StrategyArg {
    Random,
    Sparse,
    Radial,
    Density,
}

#[cfg(feature = "std")]
impl From<StrategyArg> for Strategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Random => Strategy::Random,
            StrategyArg::Sparse => {
                let shortest = default_fleet().iter().map(|s| s.length).min().unwrap_or(2);
                Strategy::sparse_for(shortest)
            }
            StrategyArg::Radial => Strategy::radial(),
            StrategyArg::Density => Strategy::Density,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
#[cfg(feature = "std")]
enum EraArg {
    Classic,
    Salvo,
    Modern,
}

#[cfg(feature = "std")]
impl From<EraArg> for EraRules {
    fn from(arg: EraArg) -> Self {
        match arg {
            EraArg::Classic => EraRules::classic(),
            EraArg::Salvo => EraRules::salvo(),
            EraArg::Modern => EraRules::modern(),
        }
    }
}

#[derive(Parser)]
#[cfg(feature = "std")]
enum Commands {
    /// Run a match between AI players and print the final statistics as JSON.
    Simulate {
        #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(2..=8))]
        players: u8,
        #[arg(long, help = "Number of alliances (defaults to one per player)")]
        alliances: Option<u8>,
        #[arg(long, value_enum, default_value_t = StrategyArg::Density)]
        strategy: StrategyArg,
        #[arg(long, value_enum, default_value_t = EraArg::Classic)]
        era: EraArg,
        #[arg(long, default_value_t = DEFAULT_BOARD_SIZE)]
        size: usize,
        #[arg(long, help = "Fix RNG seed for reproducible games (e.g., --seed 12345)")]
        seed: Option<u64>,
        #[arg(long, default_value_t = 0, help = "Presentation delay around each AI move")]
        delay_ms: u64,
        #[arg(long, default_value_t = 10_000)]
        max_actions: usize,
        #[arg(long, help = "Chance in [0, 1] of probing around each sunk ship")]
        clustering: Option<f64>,
    },
    /// Validate an era-rules JSON file and print the resolved rules.
    Rules {
        #[arg(long)]
        file: std::path::PathBuf,
    },
}

#[derive(serde::Serialize)]
#[cfg(feature = "std")]
struct SimulationReport {
    era: String,
    seed: u64,
    actions: usize,
    turns: u32,
    finished: bool,
    winner: Option<PlayerId>,
    players: Vec<PlayerSummary>,
}

#[cfg(feature = "std")]
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Simulate {
            players,
            alliances,
            strategy,
            era,
            size,
            seed,
            delay_ms,
            max_actions,
            clustering,
        } => {
            let alliances = alliances.unwrap_or(players);
            if alliances < 2 || alliances > players {
                anyhow::bail!("--alliances must be between 2 and the number of players");
            }
            if let Some(chance) = clustering {
                if !(0.0..=1.0).contains(&chance) {
                    anyhow::bail!("--clustering must be within [0, 1]");
                }
            }
            let seed = seed.unwrap_or_else(|| rand::rng().random());
            let mode = match players {
                2 => GameMode::Classic,
                3 | 4 => GameMode::Skirmish,
                _ => GameMode::Alliance,
            };

            let mut game = Game::with_rules(era.into(), mode).with_seed(seed);
            for a in 0..alliances {
                game.create_alliance(&format!("Fleet {}", a + 1))?;
            }
            for i in 0..players {
                let name = format!("AI {}", i + 1);
                let alliance = format!("Fleet {}", i % alliances + 1);
                let mut machine = TargetingMachine::new(strategy.into());
                if let Some(chance) = clustering {
                    machine = machine.with_clustering(chance);
                }
                game.add_player(Player::ai_with(&name, Difficulty::Normal, machine), &alliance)?;
            }
            game.set_board(Board::square(size))?;
            game.start_game()?;

            let queue = ActionQueue::new();
            let (mut pacer, pacing): (Box<dyn Pacer>, Pacing) = if delay_ms > 0 {
                let d = Duration::from_millis(delay_ms);
                (
                    Box::new(TokioPacer),
                    Pacing {
                        before_resolve: d,
                        after_resolve: d,
                    },
                )
            } else {
                (Box::new(HeadlessPacer::default()), Pacing::headless())
            };
            let actions = run_match(&mut game, &queue, pacer.as_mut(), &pacing, max_actions).await?;

            let report = SimulationReport {
                era: game.rules().name.clone(),
                seed,
                actions,
                turns: game.turn(),
                finished: game.phase() == GamePhase::Finished,
                winner: game.winner(),
                players: game.summary(),
            };
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Rules { file } => {
            let json = std::fs::read_to_string(&file)?;
            let rules = EraRules::from_json(&json)?;
            println!("{}", serde_json::to_string_pretty(&rules)?);
        }
    }
    Ok(())
}
