use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use armada::{
    run_match, ActionQueue, Board, Coord, Difficulty, EraRules, Game, GameMode, GamePhase,
    HeadlessPacer, Orientation, Outcome, Pacing, Player, QueuedAction, ShipId, ShipSpec, Step,
    Strategy, TokioPacer,
};

fn ai_duel(seed: u64) -> Game {
    let mut game = Game::with_rules(EraRules::classic(), GameMode::Classic).with_seed(seed);
    game.create_alliance("north").unwrap();
    game.create_alliance("south").unwrap();
    game.add_player(Player::ai("One", Difficulty::Hard, Strategy::Density), "north")
        .unwrap();
    game.add_player(Player::ai("Two", Difficulty::Hard, Strategy::radial()), "south")
        .unwrap();
    game.set_board(Board::square(10)).unwrap();
    game.start_game().unwrap();
    game
}

fn log_step(log: &Arc<Mutex<Vec<String>>>, entry: &str) -> Step {
    let log = log.clone();
    let entry = entry.to_string();
    Step::Custom(Box::new(move |_game: &mut Game| log.lock().unwrap().push(entry)))
}

#[tokio::test]
async fn test_actions_run_in_fifo_order() -> anyhow::Result<()> {
    let mut game = ai_duel(1);
    let mut pacer = HeadlessPacer::default();
    let queue = ActionQueue::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    for name in ["first", "second", "third"] {
        let done = log.clone();
        let label = name.to_string();
        queue.push(
            QueuedAction::new(name)
                .step(log_step(&log, &format!("{} start", name)))
                .step(Step::Delay(Duration::from_millis(5)))
                .step(log_step(&log, &format!("{} end", name)))
                .on_complete(move |report| {
                    assert_eq!(report.label, label);
                    done.lock().unwrap().push(format!("{} done", label));
                }),
        )?;
    }
    assert_eq!(queue.len(), 3);
    assert!(!queue.is_idle());

    let reports = queue.drain(&mut game, &mut pacer).await?;
    assert_eq!(reports.len(), 3);
    assert!(queue.is_idle());
    let expected: Vec<String> = ["first", "second", "third"]
        .iter()
        .flat_map(|n| vec![format!("{} start", n), format!("{} end", n), format!("{} done", n)])
        .collect();
    assert_eq!(*log.lock().unwrap(), expected);
    assert_eq!(pacer.requested, vec![Duration::from_millis(5); 3]);
    Ok(())
}

#[tokio::test]
async fn test_follow_up_actions_wait_their_turn() -> anyhow::Result<()> {
    let mut game = ai_duel(2);
    let mut pacer = HeadlessPacer::default();
    let queue = ActionQueue::new();
    let log = Arc::new(Mutex::new(Vec::new()));

    let handle = queue.clone();
    let follow_log = log.clone();
    queue.push(
        QueuedAction::new("leader")
            .step(log_step(&log, "leader"))
            .on_complete(move |_| {
                let step = log_step(&follow_log, "follower");
                handle.push(QueuedAction::new("follower").step(step)).unwrap();
            }),
    )?;
    queue.push(QueuedAction::new("second").step(log_step(&log, "second")))?;

    queue.drain(&mut game, &mut pacer).await?;
    assert_eq!(*log.lock().unwrap(), vec!["leader", "second", "follower"]);
    Ok(())
}

#[tokio::test]
async fn test_ai_turn_is_paced_around_the_shot() -> anyhow::Result<()> {
    let mut game = ai_duel(3);
    let mut pacer = HeadlessPacer::default();
    let queue = ActionQueue::new();
    let pacing = Pacing::default();

    queue.push(QueuedAction::ai_turn(&pacing))?;
    let report = queue.run_next(&mut game, &mut pacer).await?.unwrap();
    assert_eq!(report.results.len(), 1);
    assert_eq!(report.announcements.len(), 1);
    assert_eq!(pacer.announced, report.announcements);
    assert_eq!(
        pacer.requested,
        vec![pacing.before_resolve, pacing.after_resolve]
    );
    assert_eq!(game.player(report.results[0].player).unwrap().stats().shots, 1);
    assert!(queue.run_next(&mut game, &mut pacer).await?.is_none());
    Ok(())
}

#[tokio::test]
async fn test_attack_step_fires_for_the_current_player() -> anyhow::Result<()> {
    let mut game = Game::with_rules(EraRules::classic(), GameMode::Classic).with_seed(4);
    game.create_alliance("north").unwrap();
    game.create_alliance("south").unwrap();
    let patrol = [ShipSpec::new("Patrol", 2)];
    let ann = game.add_player_with_fleet(Player::human("Ann"), "north", &patrol)?;
    let ben = game.add_player_with_fleet(Player::human("Ben"), "south", &patrol)?;
    game.set_board(Board::square(8))?;
    game.place_ship(ann, ShipId(0), Coord::new(0, 0), Orientation::Horizontal)?;
    game.place_ship(ben, ShipId(1), Coord::new(5, 5), Orientation::Vertical)?;
    game.start_game()?;

    let queue = ActionQueue::new();
    queue.push(
        QueuedAction::new("volley")
            .step(Step::Attack(Coord::new(5, 5)))
            .step(Step::Attack(Coord::new(6, 5)))
            .step(Step::Attack(Coord::new(7, 7))),
    )?;
    let report = queue
        .run_next(&mut game, &mut HeadlessPacer::default())
        .await?
        .unwrap();
    // The game ends on the second shot; the third step is skipped.
    let outcomes: Vec<Outcome> = report.results.iter().map(|s| s.result.outcome).collect();
    assert_eq!(outcomes, vec![Outcome::Hit, Outcome::Destroyed]);
    assert!(report.results.iter().all(|s| s.player == ann));
    assert_eq!(game.phase(), GamePhase::Finished);
    Ok(())
}

#[tokio::test]
async fn test_run_match_plays_to_the_end() -> anyhow::Result<()> {
    let mut game = ai_duel(5);
    let queue = ActionQueue::new();
    let mut pacer = HeadlessPacer::default();
    let actions = run_match(&mut game, &queue, &mut pacer, &Pacing::headless(), 1_000).await?;

    assert_eq!(game.phase(), GamePhase::Finished);
    assert!(game.winner().is_some());
    assert!(actions > 0 && actions <= 200);
    assert!(pacer.requested.iter().all(|d| d.is_zero()));
    assert!(queue.is_idle());
    Ok(())
}

#[tokio::test]
async fn test_run_match_respects_the_action_limit() -> anyhow::Result<()> {
    let mut game = ai_duel(6);
    let queue = ActionQueue::new();
    let actions = run_match(
        &mut game,
        &queue,
        &mut HeadlessPacer::default(),
        &Pacing::headless(),
        3,
    )
    .await?;
    assert_eq!(actions, 3);
    assert_eq!(game.phase(), GamePhase::Playing);
    Ok(())
}

#[tokio::test]
async fn test_run_match_stops_for_human_input() {
    let mut game = Game::with_rules(EraRules::classic(), GameMode::Classic).with_seed(4);
    game.create_alliance("north").unwrap();
    game.create_alliance("south").unwrap();
    let ann = game
        .add_player_with_fleet(Player::human("Ann"), "north", &[ShipSpec::new("Patrol", 2)])
        .unwrap();
    game.add_player(Player::ai("Bot", Difficulty::Easy, Strategy::Random), "south")
        .unwrap();
    game.set_board(Board::square(8)).unwrap();
    game.place_ship(ann, ShipId(0), Coord::new(0, 0), Orientation::Horizontal)
        .unwrap();
    game.start_game().unwrap();

    let queue = ActionQueue::new();
    let err = run_match(
        &mut game,
        &queue,
        &mut HeadlessPacer::default(),
        &Pacing::headless(),
        10,
    )
    .await
    .unwrap_err();
    assert!(err.to_string().contains("Ann"));
}

#[tokio::test]
async fn test_tokio_pacer_really_waits() -> anyhow::Result<()> {
    let mut game = ai_duel(7);
    let queue = ActionQueue::new();
    let pacing = Pacing {
        before_resolve: Duration::from_millis(10),
        after_resolve: Duration::from_millis(10),
    };
    queue.push(QueuedAction::ai_turn(&pacing))?;
    let started = Instant::now();
    queue.drain(&mut game, &mut TokioPacer).await?;
    assert!(started.elapsed() >= Duration::from_millis(20));
    Ok(())
}
