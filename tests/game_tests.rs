use std::sync::{Arc, Mutex};

use armada::{
    evaluate_end, Alliances, Board, Controller, Coord, Diagnostic, Difficulty, EndCheck, EraRules,
    EraRulesConfig, Game, GameError, GameMode, GameObserver, GamePhase, Marking, Orientation,
    Outcome, PlacementError, Player, PlayerAction, PlayerId, Role, ScriptedController, ShipId,
    ShipSpec, Strategy, TargetingMachine,
};
use rand::rngs::SmallRng;

fn attack(row: usize, col: usize) -> PlayerAction {
    PlayerAction::Attack { row, col }
}

fn ai(name: &str, strategy: Strategy) -> Player {
    Player::ai(name, Difficulty::Normal, strategy)
}

fn two_teams(rules: EraRules) -> Game {
    let mut game = Game::with_rules(rules, GameMode::Classic).with_seed(21);
    game.create_alliance("north").unwrap();
    game.create_alliance("south").unwrap();
    game
}

#[test]
fn test_missing_rules_fail_construction() {
    let cfg = EraRulesConfig {
        continue_on_hit: Some(true),
        continue_on_miss: Some(false),
        ..EraRulesConfig::default()
    };
    let err = Game::new(cfg, GameMode::Classic).err().unwrap();
    assert_eq!(err, GameError::MissingRule("turn_required"));
}

#[test]
fn test_roster_validation() {
    let mut game = two_teams(EraRules::classic());
    assert_eq!(
        game.add_player(Player::human("Ann"), "east").unwrap_err(),
        GameError::UnknownAlliance("east".to_string())
    );
    assert_eq!(
        game.create_alliance("north").unwrap_err(),
        GameError::DuplicateAlliance("north".to_string())
    );
    assert!(matches!(
        game.add_player_with_fleet(Player::human("Ann"), "north", &[]),
        Err(GameError::EmptyFleet(_))
    ));

    let a = game.add_player(Player::human("Ann"), "north").unwrap();
    let b = game.add_player(Player::human("Ben"), "south").unwrap();
    assert_ne!(a, b);
    assert_eq!(game.player(a).unwrap().fleet().len(), 5);
    assert_eq!(
        game.add_player(Player::human("Cid"), "south").unwrap_err(),
        GameError::PlayerCapExceeded { cap: 2 }
    );
}

#[test]
fn test_start_requires_board_and_opponent() {
    let mut game = two_teams(EraRules::classic());
    game.add_player(ai("One", Strategy::Random), "north").unwrap();
    assert_eq!(game.start_game().unwrap_err(), GameError::NoBoard);
    game.set_board(Board::square(10)).unwrap();
    assert_eq!(game.phase(), GamePhase::Placement);
    assert_eq!(
        game.start_game().unwrap_err(),
        GameError::NotEnoughPlayers { have: 1 }
    );
    assert_eq!(game.phase(), GamePhase::Placement);
}

#[test]
fn test_unplaced_human_fleet_blocks_start() {
    let mut game = two_teams(EraRules::classic());
    let human = game.add_player(Player::human("Ann"), "north").unwrap();
    game.add_player(ai("Bot", Strategy::Density), "south").unwrap();
    game.set_board(Board::square(10)).unwrap();
    assert_eq!(game.start_game().unwrap_err(), GameError::UnplacedFleet(human));
    assert_eq!(game.phase(), GamePhase::Placement);
}

#[test]
fn test_placement_failure_leaves_state_untouched() {
    let mut game = two_teams(EraRules::classic());
    let small = game
        .add_player_with_fleet(ai("Small", Strategy::Random), "north", &[ShipSpec::new("Dinghy", 1)])
        .unwrap();
    game.add_player_with_fleet(ai("Big", Strategy::Random), "south", &[ShipSpec::new("Carrier", 5)])
        .unwrap();
    game.set_board(Board::square(3)).unwrap();

    let err = game.start_game().unwrap_err();
    assert!(matches!(
        err,
        GameError::Placement(PlacementError::UnableToPlaceShip { .. })
    ));
    assert_eq!(game.phase(), GamePhase::Placement);
    let small = game.player(small).unwrap();
    assert!(!small.fleet().all_placed());
    assert_eq!(small.placements().count(), 0);
}

#[test]
fn test_manual_placement_rules() {
    let mut game = two_teams(EraRules::classic());
    let ann = game
        .add_player_with_fleet(
            Player::human("Ann"),
            "north",
            &[ShipSpec::new("Cruiser", 3), ShipSpec::new("Destroyer", 2)],
        )
        .unwrap();
    let ben = game
        .add_player_with_fleet(Player::human("Ben"), "south", &[ShipSpec::new("Cruiser", 3)])
        .unwrap();
    let board = Board::from_ascii(
        "
        .....
        .....
        ..#..
        .....
        .....
        ",
    )
    .unwrap();
    game.set_board(board).unwrap();

    let place = |game: &mut Game, p, s, r, c, o| game.place_ship(p, ShipId(s), Coord::new(r, c), o);
    assert_eq!(
        place(&mut game, ann, 0, 2, 0, Orientation::Horizontal).unwrap_err(),
        GameError::Placement(PlacementError::Land)
    );
    assert_eq!(
        place(&mut game, ann, 0, 0, 3, Orientation::Horizontal).unwrap_err(),
        GameError::Placement(PlacementError::OutOfBounds)
    );
    place(&mut game, ann, 0, 0, 0, Orientation::Horizontal).unwrap();
    assert_eq!(
        place(&mut game, ann, 1, 0, 1, Orientation::Vertical).unwrap_err(),
        GameError::Placement(PlacementError::Overlaps)
    );
    assert_eq!(
        place(&mut game, ann, 0, 4, 0, Orientation::Horizontal).unwrap_err(),
        GameError::Placement(PlacementError::AlreadyPlaced)
    );
    assert_eq!(
        place(&mut game, ann, 9, 4, 0, Orientation::Horizontal).unwrap_err(),
        GameError::Placement(PlacementError::UnknownShip(ShipId(9)))
    );
    // Different fleets may share water.
    place(&mut game, ben, 2, 0, 0, Orientation::Vertical).unwrap();
    assert_eq!(
        place(&mut game, PlayerId(99), 0, 0, 0, Orientation::Vertical).unwrap_err(),
        GameError::UnknownPlayer(PlayerId(99))
    );
}

#[test]
fn test_actions_require_play() {
    let mut game = two_teams(EraRules::classic());
    let err = game.process_player_action(attack(0, 0)).unwrap_err();
    assert_eq!(
        err,
        GameError::WrongPhase {
            expected: GamePhase::Playing,
            actual: GamePhase::Setup
        }
    );

    game.add_player(ai("One", Strategy::Random), "north").unwrap();
    game.add_player(ai("Two", Strategy::Random), "south").unwrap();
    game.set_board(Board::square(10)).unwrap();
    game.start_game().unwrap();
    assert_eq!(
        game.process_player_action(attack(10, 0)).unwrap_err(),
        GameError::OutOfBounds(Coord::new(10, 0))
    );
    assert!(matches!(
        game.add_player(ai("Late", Strategy::Random), "north"),
        Err(GameError::WrongPhase { .. })
    ));
}

fn find_miss(game: &Game) -> Coord {
    let board = game.board().unwrap();
    board
        .cells()
        .find(|&c| game.players().iter().all(|p| p.occupant(c).is_none()))
        .unwrap()
}

fn find_enemy_cell(game: &Game, enemy: PlayerId) -> Coord {
    game.player(enemy)
        .unwrap()
        .placements()
        .next()
        .map(|(c, _)| *c)
        .unwrap()
}

fn started(rules: EraRules) -> (Game, PlayerId, PlayerId) {
    let mut game = two_teams(rules);
    let a = game.add_player(ai("One", Strategy::Random), "north").unwrap();
    let b = game.add_player(ai("Two", Strategy::Random), "south").unwrap();
    game.set_board(Board::square(10)).unwrap();
    game.start_game().unwrap();
    (game, a, b)
}

#[test]
fn test_turn_continues_on_hit_in_classic() {
    let (mut game, a, b) = started(EraRules::classic());
    assert_eq!(game.turn(), 1);
    let target = find_enemy_cell(&game, b);
    let result = game.process_player_action(attack(target.row, target.col)).unwrap();
    assert!(result.outcome.is_hit());
    assert_eq!(game.current_player().unwrap().id(), a);
    assert_eq!(game.turn(), 1);

    let empty = find_miss(&game);
    game.process_player_action(attack(empty.row, empty.col)).unwrap();
    assert_eq!(game.current_player().unwrap().id(), b);
    assert_eq!(game.turn(), 2);
}

#[test]
fn test_salvo_always_alternates() {
    let (mut game, _, b) = started(EraRules::salvo());
    let target = find_enemy_cell(&game, b);
    game.process_player_action(attack(target.row, target.col)).unwrap();
    assert_eq!(game.current_player().unwrap().id(), b);
}

#[test]
fn test_continue_on_miss_keeps_the_shooter() {
    let rules = EraRules {
        continue_on_hit: false,
        continue_on_miss: true,
        ..EraRules::classic()
    };
    let (mut game, a, b) = started(rules);
    let empty = find_miss(&game);
    assert_eq!(
        game.process_player_action(attack(empty.row, empty.col)).unwrap().outcome,
        Outcome::Miss
    );
    assert_eq!(game.current_player().unwrap().id(), a);
    let target = find_enemy_cell(&game, b);
    game.process_player_action(attack(target.row, target.col)).unwrap();
    assert_eq!(game.current_player().unwrap().id(), b);
}

#[test]
fn test_turns_not_required_never_continue() {
    let rules = EraRules {
        turn_required: false,
        continue_on_hit: true,
        continue_on_miss: true,
        ..EraRules::classic()
    };
    let (mut game, _, b) = started(rules);
    let empty = find_miss(&game);
    game.process_player_action(attack(empty.row, empty.col)).unwrap();
    assert_eq!(game.current_player().unwrap().id(), b);
}

#[test]
fn test_board_records_markings() {
    let (mut game, _, b) = started(EraRules::classic());
    let empty = find_miss(&game);
    let target = find_enemy_cell(&game, b);
    game.process_player_action(attack(target.row, target.col)).unwrap();
    game.process_player_action(attack(empty.row, empty.col)).unwrap();
    let board = game.board().unwrap();
    assert_eq!(board.marking(empty), Some(Marking::Miss));
    assert_eq!(board.marking(target), Some(Marking::Destroyed));
}

#[test]
fn test_ai_duel_converges() {
    for seed in 0..5 {
        let mut game = Game::with_rules(EraRules::classic(), GameMode::Classic).with_seed(seed);
        game.create_alliance("north").unwrap();
        game.create_alliance("south").unwrap();
        game.add_player(ai("Density", Strategy::Density), "north").unwrap();
        game.add_player(ai("Sparse", Strategy::checkerboard()), "south").unwrap();
        game.set_board(Board::square(10)).unwrap();
        game.start_game().unwrap();

        let mut shots = 0;
        while game.phase() == GamePhase::Playing {
            let shot = game.play_ai_turn().unwrap().expect("automated players always fire");
            assert_ne!(shot.result.outcome, Outcome::AllDestroyed);
            assert_ne!(shot.result.outcome, Outcome::Invalid);
            shots += 1;
            assert!(shots <= 200, "seed {} did not converge", seed);
        }
        let winner = game.winner().unwrap();
        assert!(!game.player(winner).unwrap().is_defeated());
        assert!(game.players().iter().any(|p| p.is_defeated()));
        assert!(game.diagnostics().is_empty());
        assert!(game.play_ai_turn().is_err());
    }
}

#[test]
fn test_alliance_match_converges() {
    let mut game = Game::with_rules(EraRules::classic(), GameMode::Alliance).with_seed(77);
    game.create_alliance("red").unwrap();
    game.create_alliance("blue").unwrap();
    let strategies = [
        Strategy::Density,
        Strategy::radial(),
        Strategy::checkerboard(),
        Strategy::Random,
    ];
    for (i, s) in strategies.iter().enumerate() {
        let team = if i % 2 == 0 { "red" } else { "blue" };
        game.add_player(ai(&format!("P{}", i), *s), team).unwrap();
    }
    game.set_board(Board::square(12)).unwrap();
    game.start_game().unwrap();

    let mut shots = 0;
    while game.phase() == GamePhase::Playing {
        game.play_ai_turn().unwrap().expect("automated players always fire");
        shots += 1;
        assert!(shots <= 4 * 144);
    }
    let winner = game.winner().unwrap();
    let team = game.alliances().alliance_of(winner).unwrap().name.clone();
    for p in game.players() {
        let member_team = &game.alliances().alliance_of(p.id()).unwrap().name;
        if *member_team != team {
            assert!(p.is_defeated());
        }
    }
    let summary = game.summary();
    assert_eq!(summary.len(), 4);
    assert!(summary.iter().all(|s| s.alliance.is_some()));
}

#[test]
fn test_evaluate_end_outcomes() {
    let (game, _, _) = started(EraRules::classic());
    assert_eq!(evaluate_end(game.players(), game.alliances()), EndCheck::Continue);

    // Players without ships are defeated; nobody is left.
    let mut alliances = Alliances::new();
    alliances.create("a").unwrap();
    alliances.create("b").unwrap();
    alliances.join("a", PlayerId(0)).unwrap();
    let wrecked = [Player::human("x"), Player::human("y")];
    assert_eq!(evaluate_end(&wrecked, &alliances), EndCheck::Over { winner: None });
}

#[test]
fn test_human_turn_waits_for_host() {
    let mut game = two_teams(EraRules::classic());
    let ann = game
        .add_player_with_fleet(Player::human("Ann"), "north", &[ShipSpec::new("Patrol", 2)])
        .unwrap();
    game.add_player(ai("Bot", Strategy::Random), "south").unwrap();
    game.set_board(Board::square(10)).unwrap();
    game.place_ship(ann, ShipId(0), Coord::new(0, 0), Orientation::Horizontal).unwrap();
    game.start_game().unwrap();
    assert!(game.play_ai_turn().unwrap().is_none());
    assert_eq!(game.current_player().unwrap().id(), ann);
}

#[test]
fn test_scripted_player_follows_its_script() {
    let mut game = two_teams(EraRules::salvo());
    let script = vec![Coord::new(9, 9), Coord::new(20, 20), Coord::new(8, 8)];
    let scripted = Player::with_controller(
        "Script",
        Role::Ai(Difficulty::Normal),
        Box::new(ScriptedController::new(script)),
    );
    let s = game.add_player(scripted, "north").unwrap();
    game.add_player(ai("Bot", Strategy::Random), "south").unwrap();
    game.set_board(Board::square(10)).unwrap();
    game.start_game().unwrap();

    let first = game.play_ai_turn().unwrap().unwrap();
    assert_eq!((first.player, first.coord), (s, Coord::new(9, 9)));
    game.play_ai_turn().unwrap().unwrap();
    let third = game.play_ai_turn().unwrap().unwrap();
    // (20, 20) is off the board and skipped.
    assert_eq!(third.coord, Coord::new(8, 8));
}

/// Proposes the same cell every turn, legal or not.
struct Stubborn(Coord);

impl Controller for Stubborn {
    fn select_target(
        &mut self,
        _rng: &mut SmallRng,
        _legal: &[Coord],
        _rows: usize,
        _cols: usize,
    ) -> Option<Coord> {
        Some(self.0)
    }

    fn is_automated(&self) -> bool {
        true
    }
}

struct DiagnosticLog(Arc<Mutex<Vec<Coord>>>);

impl GameObserver for DiagnosticLog {
    fn on_diagnostic(&mut self, event: &Diagnostic) {
        self.0.lock().unwrap().push(event.coord);
    }
}

#[test]
fn test_illegal_proposals_are_replaced_and_reported() {
    let mut game = two_teams(EraRules::salvo());
    let corner = Coord::new(9, 9);
    let stubborn = Player::with_controller(
        "Mule",
        Role::Ai(Difficulty::Normal),
        Box::new(Stubborn(corner)),
    );
    let mule = game.add_player(stubborn, "north").unwrap();
    game.add_player(ai("Bot", Strategy::Random), "south").unwrap();
    game.set_board(Board::square(10)).unwrap();
    let seen = Arc::new(Mutex::new(Vec::new()));
    game.add_observer(Box::new(DiagnosticLog(seen.clone())));
    game.start_game().unwrap();

    let mut mule_shots = Vec::new();
    for _ in 0..4 {
        let shot = game.play_ai_turn().unwrap().unwrap();
        if shot.player == mule {
            mule_shots.push(shot.coord);
        }
    }

    assert_eq!(mule_shots.len(), 2);
    assert_eq!(mule_shots[0], corner);
    assert_ne!(mule_shots[1], corner);
    let stats = game.player(mule).unwrap().stats();
    assert_eq!(stats.shots, 2);
    assert_eq!(game.diagnostics().len(), 1);
    let diagnostic = &game.diagnostics()[0];
    assert_eq!((diagnostic.player, diagnostic.coord), (mule, corner));
    assert_eq!(diagnostic.outcome, Outcome::Invalid);
    assert_eq!(*seen.lock().unwrap(), vec![corner]);
}

#[test]
fn test_tuned_ai_plays_a_full_match() {
    let mut game = two_teams(EraRules::classic());
    let machine = TargetingMachine::new(Strategy::sparse_for(2)).with_clustering(0.5);
    game.add_player(Player::ai_with("Tuned", Difficulty::Hard, machine), "north")
        .unwrap();
    game.add_player(ai("Bot", Strategy::Density), "south").unwrap();
    game.set_board(Board::square(10)).unwrap();
    game.start_game().unwrap();

    let mut shots = 0;
    while game.phase() == GamePhase::Playing {
        game.play_ai_turn().unwrap().unwrap();
        shots += 1;
        assert!(shots <= 200);
    }
    assert!(game.winner().is_some());
    assert!(game.diagnostics().is_empty());
}

#[test]
fn test_reset_restores_fleets() {
    let rules = EraRules {
        capture_chance: 1.0,
        ..EraRules::modern()
    };
    let mut game = two_teams(rules);
    let a = game.add_player(ai("One", Strategy::Density), "north").unwrap();
    let b = game.add_player(ai("Two", Strategy::Density), "south").unwrap();
    game.set_board(Board::square(10)).unwrap();
    game.start_game().unwrap();
    let mut shots = 0;
    while game.phase() == GamePhase::Playing && shots < 2_000 {
        game.play_ai_turn().unwrap().unwrap();
        shots += 1;
    }

    game.reset();
    assert_eq!(game.phase(), GamePhase::Placement);
    assert_eq!(game.turn(), 0);
    assert_eq!(game.winner(), None);
    assert_eq!(game.alliances().len(), 2);
    for id in [a, b] {
        let p = game.player(id).unwrap();
        assert_eq!(p.fleet().len(), 5);
        assert!(!p.is_defeated());
        assert!(!p.fleet().all_placed());
        assert!(p.forbidden().is_empty());
        assert_eq!(p.stats().shots, 0);
    }
    let board = game.board().unwrap();
    assert!(board.cells().all(|c| board.marking(c).is_none()));

    game.start_game().unwrap();
    assert_eq!(game.phase(), GamePhase::Playing);
}
