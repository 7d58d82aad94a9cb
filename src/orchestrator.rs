#![cfg(feature = "std")]

//! FIFO action queue that paces moves for presentation.
//!
//! Each [`QueuedAction`] is an ordered list of [`Step`]s. The queue runs one
//! action at a time: the next action is not started until every step of the
//! current one, and its completion callback, has finished. Delays go through a
//! [`Pacer`], so a headless host can skip them without changing outcomes.

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use anyhow::{anyhow, bail};
use log::{debug, info, warn};

use crate::config::Pacing;
use crate::coord::Coord;
use crate::game::{Game, GamePhase, PlayerAction, Shot};

/// One sub-step of a queued action.
pub enum Step {
    /// Tell the host what is about to happen.
    Announce(String),
    Delay(Duration),
    /// Fire for the current player at a fixed coordinate.
    Attack(Coord),
    /// Let the current player's controller pick and fire.
    AiMove,
    Custom(Box<dyn FnOnce(&mut Game) + Send>),
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Announce(msg) => f.debug_tuple("Announce").field(msg).finish(),
            Step::Delay(d) => f.debug_tuple("Delay").field(d).finish(),
            Step::Attack(c) => f.debug_tuple("Attack").field(c).finish(),
            Step::AiMove => f.write_str("AiMove"),
            Step::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// What a finished action did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ActionReport {
    pub label: String,
    pub announcements: Vec<String>,
    pub results: Vec<Shot>,
}

type Completion = Box<dyn FnOnce(&ActionReport) + Send>;

pub struct QueuedAction {
    label: String,
    steps: Vec<Step>,
    on_complete: Option<Completion>,
}

impl QueuedAction {
    pub fn new(label: &str) -> Self {
        Self {
            label: label.to_string(),
            steps: Vec::new(),
            on_complete: None,
        }
    }

    pub fn step(mut self, step: Step) -> Self {
        self.steps.push(step);
        self
    }

    /// Callback run once, after the last step.
    pub fn on_complete(mut self, f: impl FnOnce(&ActionReport) + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(f));
        self
    }

    /// announce, delay, resolve, delay.
    pub fn ai_turn(pacing: &Pacing) -> Self {
        Self::new("ai-turn")
            .step(Step::Announce("opponent is aiming".to_string()))
            .step(Step::Delay(pacing.before_resolve))
            .step(Step::AiMove)
            .step(Step::Delay(pacing.after_resolve))
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }
}

impl fmt::Debug for QueuedAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueuedAction")
            .field("label", &self.label)
            .field("steps", &self.steps)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

/// Inserts the timed gaps between steps.
#[async_trait::async_trait]
pub trait Pacer: Send {
    async fn pause(&mut self, duration: Duration);

    async fn announce(&mut self, message: &str) {
        debug!("{}", message);
    }
}

/// Sleeps on the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioPacer;

#[async_trait::async_trait]
impl Pacer for TokioPacer {
    async fn pause(&mut self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}

/// Never sleeps; remembers what it was asked to wait for.
#[derive(Debug, Default, Clone)]
pub struct HeadlessPacer {
    pub requested: Vec<Duration>,
    pub announced: Vec<String>,
}

#[async_trait::async_trait]
impl Pacer for HeadlessPacer {
    async fn pause(&mut self, duration: Duration) {
        self.requested.push(duration);
    }

    async fn announce(&mut self, message: &str) {
        self.announced.push(message.to_string());
    }
}

#[derive(Default)]
struct QueueState {
    pending: VecDeque<QueuedAction>,
    in_flight: bool,
}

/// Shared handle to a FIFO of queued actions. Clones refer to the same queue,
/// so steps and completion callbacks may push follow-up actions.
#[derive(Clone, Default)]
pub struct ActionQueue {
    inner: Arc<Mutex<QueueState>>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> anyhow::Result<MutexGuard<'_, QueueState>> {
        self.inner
            .lock()
            .map_err(|_| anyhow!("action queue lock poisoned"))
    }

    pub fn push(&self, action: QueuedAction) -> anyhow::Result<()> {
        debug!("queued action {}", action.label);
        self.state()?.pending.push_back(action);
        Ok(())
    }

    /// Actions waiting to run, not counting the one in flight.
    pub fn len(&self) -> usize {
        self.state().map(|s| s.pending.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// No action is running and none is waiting.
    pub fn is_idle(&self) -> bool {
        self.state()
            .map(|s| !s.in_flight && s.pending.is_empty())
            .unwrap_or(false)
    }

    /// Run the oldest pending action to completion. Returns `None` when the
    /// queue is empty.
    pub async fn run_next<P: Pacer + ?Sized>(
        &self,
        game: &mut Game,
        pacer: &mut P,
    ) -> anyhow::Result<Option<ActionReport>> {
        let action = {
            let mut state = self.state()?;
            if state.in_flight {
                bail!("an action is already in flight");
            }
            let Some(action) = state.pending.pop_front() else {
                return Ok(None);
            };
            state.in_flight = true;
            action
        };

        let report = execute(action, game, pacer).await;
        self.state()?.in_flight = false;
        Ok(Some(report))
    }

    /// Run actions until the queue is empty, including any pushed while
    /// draining.
    pub async fn drain<P: Pacer + ?Sized>(
        &self,
        game: &mut Game,
        pacer: &mut P,
    ) -> anyhow::Result<Vec<ActionReport>> {
        let mut reports = Vec::new();
        while let Some(report) = self.run_next(game, pacer).await? {
            reports.push(report);
        }
        Ok(reports)
    }
}

impl fmt::Debug for ActionQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ActionQueue")
            .field("pending", &self.len())
            .field("idle", &self.is_idle())
            .finish()
    }
}

async fn execute<P: Pacer + ?Sized>(action: QueuedAction, game: &mut Game, pacer: &mut P) -> ActionReport {
    let QueuedAction {
        label,
        steps,
        on_complete,
    } = action;
    let mut report = ActionReport {
        label,
        ..ActionReport::default()
    };

    for step in steps {
        match step {
            Step::Announce(msg) => {
                pacer.announce(&msg).await;
                report.announcements.push(msg);
            }
            Step::Delay(d) => pacer.pause(d).await,
            Step::Attack(at) => {
                let Some(player) = game.current_player().map(|p| p.id()) else {
                    warn!("{}: attack at {} outside of play", report.label, at);
                    continue;
                };
                let action = PlayerAction::Attack {
                    row: at.row,
                    col: at.col,
                };
                match game.process_player_action(action) {
                    Ok(result) => report.results.push(Shot {
                        player,
                        coord: at,
                        result,
                    }),
                    Err(e) => warn!("{}: {}", report.label, e),
                }
            }
            Step::AiMove => match game.play_ai_turn() {
                Ok(Some(shot)) => report.results.push(shot),
                Ok(None) => debug!("{}: no move made", report.label),
                Err(e) => warn!("{}: {}", report.label, e),
            },
            Step::Custom(f) => f(game),
        }
    }

    if let Some(done) = on_complete {
        done(&report);
    }
    report
}

/// Drive a match between automated players through `queue` until it ends or
/// `max_actions` actions have run. Returns the number of actions run.
pub async fn run_match<P: Pacer + ?Sized>(
    game: &mut Game,
    queue: &ActionQueue,
    pacer: &mut P,
    pacing: &Pacing,
    max_actions: usize,
) -> anyhow::Result<usize> {
    let mut actions = 0;
    while game.phase() == GamePhase::Playing && actions < max_actions {
        if queue.is_idle() {
            let Some(player) = game.current_player() else {
                break;
            };
            if !player.is_automated() {
                bail!("{} needs host input", player.name());
            }
            queue.push(QueuedAction::ai_turn(pacing))?;
        }
        let Some(report) = queue.run_next(game, pacer).await? else {
            break;
        };
        actions += 1;
        if report.label == "ai-turn" && report.results.is_empty() && game.phase() == GamePhase::Playing {
            let name = game.current_player().map(|p| p.name().to_string()).unwrap_or_default();
            bail!("{} could not select a target", name);
        }
    }

    match game.phase() {
        GamePhase::Finished => info!("match finished after {} actions", actions),
        _ => warn!("match stopped after {} actions without a result", actions),
    }
    Ok(actions)
}
