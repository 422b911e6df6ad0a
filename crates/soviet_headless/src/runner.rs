//! Headless runner implementation.
//!
//! [`HeadlessRunner`] owns one [`Simulation`] and answers protocol commands
//! read line by line. [`play`] drives a simulation to completion without a
//! controller, for the `run` and `batch` subcommands.

use std::io::{self, BufRead, Write};
use std::ops::ControlFlow;

use soviet_core::buildings::{BuildingId, BuildingKind};
use soviet_core::simulation::Simulation;
use tracing::{debug, info, warn};

use crate::metrics::{GameMetrics, MetricsCollector};
use crate::protocol::{Command, Response, StateSnapshot};

/// Headless runner configuration.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeadlessConfig {
    /// Output a state snapshot after every `tick` command.
    pub auto_state_output: bool,
}

/// Headless runner for controller-driven play.
#[derive(Debug)]
pub struct HeadlessRunner {
    sim: Simulation,
    config: HeadlessConfig,
    game_over_sent: bool,
}

impl HeadlessRunner {
    /// Create a runner around a simulation with default config.
    pub fn new(sim: Simulation) -> Self {
        Self::with_config(sim, HeadlessConfig::default())
    }

    /// Create a runner with custom configuration.
    pub fn with_config(sim: Simulation, config: HeadlessConfig) -> Self {
        let game_over_sent = sim.is_ended();
        Self {
            sim,
            config,
            game_over_sent,
        }
    }

    /// The simulation being driven.
    pub fn simulation(&self) -> &Simulation {
        &self.sim
    }

    /// Run the command loop until `quit` or end of input.
    ///
    /// Writes the ready line first, then one or more response lines per
    /// command. Malformed lines produce an error response and are skipped.
    pub fn run<R: BufRead, W: Write>(&mut self, input: R, mut output: W) -> io::Result<()> {
        write_response(&mut output, &Response::ready(self.sim.total_ticks()))?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (responses, flow) = self.handle_line(line);
            for response in &responses {
                write_response(&mut output, response)?;
            }
            if flow.is_break() {
                return Ok(());
            }
        }

        debug!("Input closed without quit");
        write_response(&mut output, &Response::Bye)
    }

    /// Parse and handle one input line.
    pub fn handle_line(&mut self, line: &str) -> (Vec<Response>, ControlFlow<()>) {
        match Command::from_json(line) {
            Ok(cmd) => self.handle(cmd),
            Err(e) => (
                vec![Response::error(format!("Parse error: {e}"), None)],
                ControlFlow::Continue(()),
            ),
        }
    }

    /// Handle one command.
    pub fn handle(&mut self, cmd: Command) -> (Vec<Response>, ControlFlow<()>) {
        let cmd_name = cmd.name();
        let mut responses = Vec::new();

        match cmd {
            Command::Tick { count } => {
                if self.sim.is_ended() {
                    responses.push(Response::error("Game is over", Some(cmd_name)));
                } else {
                    self.tick(count, &mut responses);
                }
            }
            Command::State => {
                responses.push(Response::State(StateSnapshot::capture(&self.sim)));
            }
            Command::Build { kind } => responses.push(self.build(&kind, cmd_name)),
            Command::Demolish { id } => match self.sim.demolish(BuildingId(id)) {
                Ok(building) => responses.push(Response::Demolished {
                    id,
                    kind: building.kind.to_string(),
                }),
                Err(e) => responses.push(Response::error(e.to_string(), Some(cmd_name))),
            },
            Command::Save { path } => responses.push(self.save(path, cmd_name)),
            Command::Load { path } => responses.push(self.load(path, cmd_name)),
            Command::Hash => responses.push(Response::StateHash {
                tick: self.sim.total_ticks(),
                hash: self.sim.state_hash(),
            }),
            Command::Quit => {
                info!("Quit requested at tick {}", self.sim.total_ticks());
                responses.push(Response::Bye);
                return (responses, ControlFlow::Break(()));
            }
        }

        (responses, ControlFlow::Continue(()))
    }

    fn tick(&mut self, count: u32, responses: &mut Vec<Response>) {
        let ran = self.sim.run(u64::from(count));
        debug!("Advanced {} of {} requested ticks", ran, count);

        responses.push(Response::Events {
            tick: self.sim.total_ticks(),
            events: self.sim.drain_events(),
        });
        if self.config.auto_state_output {
            responses.push(Response::State(StateSnapshot::capture(&self.sim)));
        }
        if let Some(outcome) = self.sim.outcome() {
            if !self.game_over_sent {
                self.game_over_sent = true;
                responses.push(Response::GameOver {
                    victory: outcome.victory,
                    reason: outcome.reason.clone(),
                    tick: outcome.tick,
                });
            }
        }
    }

    fn build(&mut self, kind: &str, cmd_name: &str) -> Response {
        let kind = match kind.parse::<BuildingKind>() {
            Ok(kind) => kind,
            Err(e) => return Response::error(e.to_string(), Some(cmd_name)),
        };
        match self.sim.build(kind) {
            Ok(id) => Response::Built {
                id: id.0,
                kind: kind.to_string(),
            },
            Err(e) => Response::error(e.to_string(), Some(cmd_name)),
        }
    }

    fn save(&self, path: String, cmd_name: &str) -> Response {
        let result = self
            .sim
            .serialize()
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                std::fs::write(&path, &bytes)
                    .map(|()| bytes.len())
                    .map_err(|e| e.to_string())
            });
        match result {
            Ok(bytes) => Response::Saved { path, bytes },
            Err(message) => Response::error(message, Some(cmd_name)),
        }
    }

    fn load(&mut self, path: String, cmd_name: &str) -> Response {
        let result = std::fs::read(&path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| Simulation::deserialize(&bytes).map_err(|e| e.to_string()));
        match result {
            Ok(sim) => {
                info!("Loaded save from {} at tick {}", path, sim.total_ticks());
                self.game_over_sent = sim.is_ended();
                self.sim = sim;
                Response::Loaded {
                    path,
                    tick: self.sim.total_ticks(),
                }
            }
            Err(message) => {
                warn!("Failed to load {}: {}", path, message);
                Response::error(message, Some(cmd_name))
            }
        }
    }
}

fn write_response<W: Write>(output: &mut W, response: &Response) -> io::Result<()> {
    output.write_all(response.to_json_line().as_bytes())?;
    output.flush()
}

// ============================================================================
// Unattended play
// ============================================================================

/// Identity of an unattended game, for its metrics.
#[derive(Debug, Clone)]
pub struct GameLabel {
    /// Unique game identifier.
    pub game_id: String,
    /// Scenario name.
    pub scenario: String,
    /// Seed, if the run is reproducible.
    pub seed: Option<u64>,
}

/// Play `sim` for up to `max_ticks` ticks or until the game ends.
///
/// When `events` is given, every drained event is written to it as a JSON
/// line. Returns the finished game's metrics.
pub fn play(
    mut sim: Simulation,
    max_ticks: u64,
    label: &GameLabel,
    mut events: Option<&mut dyn Write>,
) -> io::Result<GameMetrics> {
    let mut collector = MetricsCollector::new(&label.game_id, &label.scenario, label.seed);

    for _ in 0..max_ticks {
        if sim.is_ended() {
            break;
        }
        let report = sim.tick();
        let drained = sim.drain_events();
        if let Some(out) = events.as_deref_mut() {
            for event in &drained {
                let line = serde_json::to_string(event).map_err(io::Error::other)?;
                writeln!(out, "{line}")?;
            }
        }
        collector.observe(&sim, &report, &drained);
    }

    let metrics = collector.finalize(&sim);
    debug!(
        "Game {} finished at tick {} (ended: {})",
        metrics.game_id, metrics.duration_ticks, metrics.ended
    );
    Ok(metrics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use soviet_test_utils::fixtures::{ghost_town, village};

    fn send(runner: &mut HeadlessRunner, line: &str) -> Vec<Response> {
        runner.handle_line(line).0
    }

    #[test]
    fn test_session_over_buffers() {
        let input = concat!(
            r#"{"cmd":"tick","count":3}"#,
            "\n\n",
            r#"{"cmd":"hash"}"#,
            "\n",
            r#"{"cmd":"quit"}"#,
            "\n",
            r#"{"cmd":"tick"}"#,
            "\n",
        );
        let mut output = Vec::new();
        let mut runner = HeadlessRunner::new(village(1));
        runner.run(input.as_bytes(), &mut output).unwrap();

        let text = String::from_utf8(output).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains(r#""type":"ready""#));
        assert!(lines[1].contains(r#""type":"events""#));
        assert!(lines[2].contains(r#""type":"state_hash""#));
        assert!(lines[3].contains(r#""type":"bye""#));
        assert_eq!(runner.simulation().total_ticks(), 3);
    }

    #[test]
    fn test_tick_reports_events() {
        let mut runner = HeadlessRunner::new(village(2));
        let responses = send(&mut runner, r#"{"cmd":"tick","count":5}"#);
        match &responses[0] {
            Response::Events { tick, events } => {
                assert_eq!(*tick, 5);
                assert!(events.len() >= 5);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_auto_state_output() {
        let config = HeadlessConfig {
            auto_state_output: true,
        };
        let mut runner = HeadlessRunner::with_config(village(2), config);
        let responses = send(&mut runner, r#"{"cmd":"tick"}"#);
        assert!(matches!(responses[1], Response::State(ref s) if s.tick == 1));
    }

    #[test]
    fn test_bad_json_is_an_error_not_a_quit() {
        let mut runner = HeadlessRunner::new(village(2));
        let (responses, flow) = runner.handle_line("{oops");
        assert!(matches!(responses[0], Response::Error { cmd: None, .. }));
        assert!(flow.is_continue());
    }

    #[test]
    fn test_build_and_demolish() {
        let mut runner = HeadlessRunner::new(village(4));
        let before = runner.simulation().world().buildings.len();

        let responses = send(&mut runner, r#"{"cmd":"build","kind":"collective_farm"}"#);
        let Response::Built { id, ref kind } = responses[0] else {
            panic!("unexpected {:?}", responses[0]);
        };
        assert_eq!(kind, "collective_farm");
        assert_eq!(runner.simulation().world().buildings.len(), before + 1);

        let responses = send(&mut runner, &format!(r#"{{"cmd":"demolish","id":{id}}}"#));
        assert!(matches!(responses[0], Response::Demolished { .. }));
        assert_eq!(runner.simulation().world().buildings.len(), before);
    }

    #[test]
    fn test_build_unknown_kind() {
        let mut runner = HeadlessRunner::new(village(4));
        let responses = send(&mut runner, r#"{"cmd":"build","kind":"space_elevator"}"#);
        assert!(matches!(
            responses[0],
            Response::Error { ref cmd, .. } if cmd.as_deref() == Some("build")
        ));
    }

    #[test]
    fn test_demolish_missing_building() {
        let mut runner = HeadlessRunner::new(village(4));
        let responses = send(&mut runner, r#"{"cmd":"demolish","id":9999}"#);
        assert!(matches!(responses[0], Response::Error { .. }));
    }

    #[test]
    fn test_game_over_reported_once() {
        let mut runner = HeadlessRunner::new(ghost_town(1));
        let responses = send(&mut runner, r#"{"cmd":"tick","count":1000}"#);
        let game_overs = responses
            .iter()
            .filter(|r| matches!(r, Response::GameOver { victory: false, .. }))
            .count();
        assert_eq!(game_overs, 1);

        let responses = send(&mut runner, r#"{"cmd":"tick"}"#);
        assert!(matches!(responses[0], Response::Error { .. }));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("save.bin");
        let path_str = path.display().to_string();

        let mut runner = HeadlessRunner::new(village(8));
        send(&mut runner, r#"{"cmd":"tick","count":40}"#);
        let hash = runner.simulation().state_hash();

        let save = serde_json::json!({"cmd": "save", "path": path_str}).to_string();
        assert!(matches!(send(&mut runner, &save)[0], Response::Saved { bytes, .. } if bytes > 0));

        send(&mut runner, r#"{"cmd":"tick","count":40}"#);
        let load = serde_json::json!({"cmd": "load", "path": path_str}).to_string();
        assert!(matches!(send(&mut runner, &load)[0], Response::Loaded { tick: 40, .. }));
        assert_eq!(runner.simulation().state_hash(), hash);
    }

    #[test]
    fn test_load_missing_file() {
        let mut runner = HeadlessRunner::new(village(8));
        let responses = send(&mut runner, r#"{"cmd":"load","path":"/nonexistent/save.bin"}"#);
        assert!(matches!(responses[0], Response::Error { .. }));
        assert_eq!(runner.simulation().total_ticks(), 0);
    }

    #[test]
    fn test_play_writes_events_and_stops_at_end() {
        let label = GameLabel {
            game_id: "ghost".to_string(),
            scenario: "ghost".to_string(),
            seed: Some(1),
        };
        let mut out = Vec::new();
        let metrics = play(ghost_town(1), 10_000, &label, Some(&mut out)).unwrap();

        assert!(metrics.ended);
        assert!(metrics.duration_ticks < 10_000);
        let text = String::from_utf8(out).unwrap();
        let last = text.lines().last().unwrap();
        assert!(last.contains(r#""event":"game_over""#));
    }

    #[test]
    fn test_play_is_deterministic() {
        let label = GameLabel {
            game_id: "v".to_string(),
            scenario: "village".to_string(),
            seed: Some(9),
        };
        let a = play(village(9), 300, &label, None).unwrap();
        let b = play(village(9), 300, &label, None).unwrap();
        assert_eq!(a, b);
    }
}
