//! Per-frame episode driver
//!
//! An episode moves through `AwaitingFirstFrame -> Running -> Terminated`.
//! Every frame records the agent's position, samples the sensor window,
//! runs the candidate's network, decodes its outputs into actions and
//! checks for the exit. Termination is requested through a flag so the
//! caller can end the frame cleanly; the episode is only classified when
//! [`EpisodeRunner::finish`] is called.

use serde::{Deserialize, Serialize};

use super::actions::{ActionDecoder, ActionFlags, DecoderConfig, Facing};
use super::sensors::{GridSensor, SensorConfig};
use super::visits::{FrameActivity, TrackerConfig, VisitTracker};
use crate::error::SetupError;
use crate::level::{Position, Tile};
use crate::traits::{Candidate, DecisionNetwork, Environment};

/// How an episode ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RunStatus {
    /// Reached the exit within the time budget
    Won,
    /// Used the whole budget without stalling
    Explored,
    /// Stood still for the idle time
    Idle,
    /// Looped over a small set of positions
    Repeated,
    /// None of the above; the environment ended the episode early
    Died,
}

impl RunStatus {
    /// Classify an episode; the first matching rule wins
    pub fn resolve(
        elapsed: f32,
        budget: f32,
        winner: bool,
        stalled: bool,
        repeated_states: bool,
    ) -> Self {
        if elapsed < budget && winner {
            Self::Won
        } else if elapsed >= budget && !stalled {
            Self::Explored
        } else if stalled {
            Self::Idle
        } else if repeated_states {
            Self::Repeated
        } else {
            Self::Died
        }
    }
}

/// Lifecycle phase of the current episode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EpisodePhase {
    AwaitingFirstFrame,
    Running,
    Terminated(RunStatus),
}

/// Mutable per-episode state, reset on the first frame of every episode
#[derive(Debug, Clone)]
pub struct EpisodeState {
    pub start: Position,
    pub tracker: VisitTracker,
    pub facing: Facing,
    pub actions: ActionFlags,
    /// Set when the driver should end the episode
    pub should_terminate: bool,
    /// Set once the agent stood still for the idle time
    pub stalled: bool,
    pub frames: u64,
}

impl EpisodeState {
    fn new(tracker: TrackerConfig) -> Self {
        Self {
            start: Position::new(0, 0),
            tracker: VisitTracker::new(tracker),
            facing: Facing::default(),
            actions: ActionFlags::default(),
            should_terminate: false,
            stalled: false,
            frames: 0,
        }
    }

    fn reset(&mut self, start: Position) {
        self.start = start;
        self.tracker.reset();
        self.facing = Facing::default();
        self.actions = ActionFlags::default();
        self.should_terminate = false;
        self.stalled = false;
        self.frames = 0;
    }
}

/// What the driver reads back after each frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameOutcome {
    pub actions: ActionFlags,
    pub facing: Facing,
    /// The frame was flagged idle
    pub idle: bool,
    /// The agent stands on the exit
    pub reached_exit: bool,
    pub should_terminate: bool,
}

/// Inputs to fitness scoring, captured when an episode ends
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EpisodeSummary {
    pub status: RunStatus,
    pub start: Position,
    pub end: Position,
    pub states_visited: usize,
    pub elapsed: f32,
    pub time_budget: f32,
    pub winner: bool,
}

/// Runs the frames of one candidate's episode
#[derive(Debug, Clone)]
pub struct EpisodeRunner {
    sensor: GridSensor,
    decoder: ActionDecoder,
    state: EpisodeState,
    phase: EpisodePhase,
}

impl EpisodeRunner {
    pub fn new(
        sensor: &SensorConfig,
        decoder: DecoderConfig,
        tracker: TrackerConfig,
    ) -> Result<Self, SetupError> {
        if tracker.max_idle_time.is_nan() || tracker.max_idle_time <= 0.0 {
            return Err(SetupError::InvalidParameter {
                name: "max_idle_time",
                reason: format!("must be positive, got {}", tracker.max_idle_time),
            });
        }

        Ok(Self {
            sensor: GridSensor::new(sensor)?,
            decoder: ActionDecoder::new(decoder)?,
            state: EpisodeState::new(tracker),
            phase: EpisodePhase::AwaitingFirstFrame,
        })
    }

    pub fn sensor(&self) -> &GridSensor {
        &self.sensor
    }

    pub fn state(&self) -> &EpisodeState {
        &self.state
    }

    pub fn phase(&self) -> EpisodePhase {
        self.phase
    }

    /// Re-arm for the next episode; state is reset on its first frame
    pub fn restart(&mut self) {
        self.phase = EpisodePhase::AwaitingFirstFrame;
    }

    /// Advance one frame for `candidate`
    ///
    /// Frames after the episode was classified are ignored and only repeat
    /// the termination request.
    pub fn step<E, C>(&mut self, env: &E, candidate: &mut C) -> FrameOutcome
    where
        E: Environment,
        C: Candidate,
    {
        match self.phase {
            EpisodePhase::Terminated(_) => {
                return FrameOutcome {
                    facing: self.state.facing,
                    should_terminate: true,
                    ..Default::default()
                };
            }
            EpisodePhase::AwaitingFirstFrame => {
                self.state.reset(env.player_position());
                candidate.set_winner(false);
                self.phase = EpisodePhase::Running;
            }
            EpisodePhase::Running => {}
        }

        let pos = env.player_position();
        let now = env.elapsed_episode_time();
        self.state.frames += 1;

        let activity = self.state.tracker.record_frame(pos, now);
        let idle = activity.is_idle();
        if idle {
            self.state.should_terminate = true;
        }
        if activity == FrameActivity::Stalled {
            self.state.stalled = true;
        }

        let inputs = self.sensor.sense(env, pos);
        let network = candidate.network_mut();
        network.load_sensors(&inputs);
        network.activate();
        let actions = self.decoder.decode(&network.outputs());

        self.state.actions = actions;
        self.state.facing = self.state.facing.after(&actions);

        let reached_exit = Tile::classify(env.tile_at(pos.x, pos.y)) == Tile::Exit;
        if reached_exit {
            candidate.set_winner(true);
            self.state.should_terminate = true;
        }

        FrameOutcome {
            actions,
            facing: self.state.facing,
            idle,
            reached_exit,
            should_terminate: self.state.should_terminate,
        }
    }

    /// Classify the episode and capture what fitness scoring needs
    ///
    /// An episode ended before its first frame starts and ends at the
    /// current position, and clears the candidate's winner flag.
    pub fn finish<E, C>(&mut self, env: &E, candidate: &mut C) -> EpisodeSummary
    where
        E: Environment,
        C: Candidate,
    {
        let end = env.player_position();
        if self.phase == EpisodePhase::AwaitingFirstFrame {
            self.state.reset(end);
            candidate.set_winner(false);
        }

        let elapsed = env.elapsed_episode_time();
        let time_budget = env.episode_time_budget();
        let winner = candidate.is_winner();
        let status = RunStatus::resolve(
            elapsed,
            time_budget,
            winner,
            self.state.stalled,
            self.state.tracker.has_repeated_states(),
        );
        self.phase = EpisodePhase::Terminated(status);

        EpisodeSummary {
            status,
            start: self.state.start,
            end,
            states_visited: self.state.tracker.states_visited(),
            elapsed,
            time_budget,
            winner,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::episode::MAX_SENSOR_RADIUS;
    use crate::level::TileMap;

    /// Network that always emits the same outputs and remembers its last inputs
    struct FixedNetwork {
        outputs: Vec<f32>,
        last_inputs: Vec<f32>,
        activations: usize,
    }

    impl DecisionNetwork for FixedNetwork {
        fn input_len(&self) -> usize {
            26
        }
        fn output_len(&self) -> usize {
            self.outputs.len()
        }
        fn load_sensors(&mut self, values: &[f32]) {
            self.last_inputs = values.to_vec();
        }
        fn activate(&mut self) {
            self.activations += 1;
        }
        fn outputs(&self) -> Vec<f32> {
            self.outputs.clone()
        }
    }

    struct TestCandidate {
        network: FixedNetwork,
        fitness: f32,
        winner: bool,
    }

    impl TestCandidate {
        fn new(outputs: Vec<f32>) -> Self {
            Self {
                network: FixedNetwork {
                    outputs,
                    last_inputs: Vec::new(),
                    activations: 0,
                },
                fitness: 0.0,
                winner: false,
            }
        }
    }

    impl Candidate for TestCandidate {
        type Network = FixedNetwork;
        fn network(&self) -> &FixedNetwork {
            &self.network
        }
        fn network_mut(&mut self) -> &mut FixedNetwork {
            &mut self.network
        }
        fn fitness(&self) -> f32 {
            self.fitness
        }
        fn set_fitness(&mut self, fitness: f32) {
            self.fitness = fitness;
        }
        fn is_winner(&self) -> bool {
            self.winner
        }
        fn set_winner(&mut self, winner: bool) {
            self.winner = winner;
        }
    }

    struct ScriptedEnv {
        map: TileMap,
        pos: Position,
        time: f32,
        budget: f32,
    }

    impl Environment for ScriptedEnv {
        fn tile_at(&self, x: i32, y: i32) -> i32 {
            self.map.tile_at(x, y)
        }
        fn player_position(&self) -> Position {
            self.pos
        }
        fn elapsed_episode_time(&self) -> f32 {
            self.time
        }
        fn episode_time_budget(&self) -> f32 {
            self.budget
        }
    }

    fn env() -> ScriptedEnv {
        ScriptedEnv {
            map: TileMap::parse(
                "
########
#S....X#
########
",
            )
            .unwrap(),
            pos: Position::new(1, 1),
            time: 0.0,
            budget: 10.0,
        }
    }

    fn runner() -> EpisodeRunner {
        EpisodeRunner::new(
            &SensorConfig::default(),
            DecoderConfig::default(),
            TrackerConfig {
                max_idle_time: 2.0,
                max_state_visits: 3,
            },
        )
        .unwrap()
    }

    #[test]
    fn test_status_precedence() {
        assert_eq!(RunStatus::resolve(5.0, 10.0, true, true, true), RunStatus::Won);
        assert_eq!(RunStatus::resolve(10.0, 10.0, true, false, true), RunStatus::Explored);
        assert_eq!(RunStatus::resolve(10.0, 10.0, false, true, false), RunStatus::Idle);
        assert_eq!(RunStatus::resolve(4.0, 10.0, false, true, true), RunStatus::Idle);
        assert_eq!(RunStatus::resolve(4.0, 10.0, false, false, true), RunStatus::Repeated);
        assert_eq!(RunStatus::resolve(4.0, 10.0, false, false, false), RunStatus::Died);
    }

    #[test]
    fn test_first_frame_resets_state() {
        let mut runner = runner();
        let mut env = env();
        let mut candidate = TestCandidate::new(vec![0.8, 0.0, 0.0]);
        candidate.winner = true;

        assert_eq!(runner.phase(), EpisodePhase::AwaitingFirstFrame);
        runner.step(&env, &mut candidate);
        assert_eq!(runner.phase(), EpisodePhase::Running);
        assert_eq!(runner.state().start, Position::new(1, 1));
        assert!(!candidate.winner);

        env.pos = Position::new(2, 1);
        env.time = 0.5;
        runner.step(&env, &mut candidate);
        assert_eq!(runner.state().tracker.states_visited(), 2);
        assert_eq!(runner.state().start, Position::new(1, 1));

        // A new episode starts from a clean slate
        runner.finish(&env, &mut candidate);
        runner.restart();
        env.pos = Position::new(4, 1);
        env.time = 0.0;
        runner.step(&env, &mut candidate);
        assert_eq!(runner.state().start, Position::new(4, 1));
        assert_eq!(runner.state().tracker.states_visited(), 1);
        assert_eq!(runner.state().frames, 1);
    }

    #[test]
    fn test_frame_feeds_network_and_decodes() {
        let mut runner = runner();
        let env = env();
        let mut candidate = TestCandidate::new(vec![0.1, 0.9, 0.0]);

        let outcome = runner.step(&env, &mut candidate);
        assert!(outcome.actions.move_left);
        assert!(outcome.actions.jump);
        assert!(!outcome.actions.look_up);
        assert_eq!(outcome.facing, Facing::Left);
        assert_eq!(candidate.network.activations, 1);
        assert_eq!(candidate.network.last_inputs.len(), runner.sensor().input_len());
        assert!(!outcome.should_terminate);
    }

    #[test]
    fn test_facing_persists_without_movement() {
        let mut runner = runner();
        let env = env();
        let mut candidate = TestCandidate::new(vec![0.1, 0.0, 0.0]);
        runner.step(&env, &mut candidate);
        candidate.network.outputs = vec![0.5, 0.0, 0.0];
        let outcome = runner.step(&env, &mut candidate);
        assert_eq!(outcome.facing, Facing::Left);
        assert!(!outcome.actions.move_left && !outcome.actions.move_right);
    }

    #[test]
    fn test_exit_marks_winner() {
        let mut runner = runner();
        let mut env = env();
        let mut candidate = TestCandidate::new(vec![0.8, 0.0, 0.0]);
        runner.step(&env, &mut candidate);

        env.pos = Position::new(6, 1);
        env.time = 3.0;
        let outcome = runner.step(&env, &mut candidate);
        assert!(outcome.reached_exit);
        assert!(outcome.should_terminate);
        assert!(candidate.winner);

        let summary = runner.finish(&env, &mut candidate);
        assert_eq!(summary.status, RunStatus::Won);
        assert_eq!(summary.start, Position::new(1, 1));
        assert_eq!(summary.end, Position::new(6, 1));
        assert_eq!(runner.phase(), EpisodePhase::Terminated(RunStatus::Won));
    }

    #[test]
    fn test_idle_requests_termination() {
        let mut runner = runner();
        let mut env = env();
        let mut candidate = TestCandidate::new(vec![0.5, 0.0, 0.0]);

        for time in [0.0, 0.5, 1.0, 1.5] {
            env.time = time;
            assert!(!runner.step(&env, &mut candidate).should_terminate);
        }
        env.time = 2.0;
        let outcome = runner.step(&env, &mut candidate);
        assert!(outcome.idle);
        assert!(outcome.should_terminate);

        let summary = runner.finish(&env, &mut candidate);
        assert_eq!(summary.status, RunStatus::Idle);
        assert_eq!(summary.states_visited, 1);
    }

    #[test]
    fn test_budget_exhausted_is_explored() {
        let mut runner = runner();
        let mut env = env();
        let mut candidate = TestCandidate::new(vec![0.8, 0.0, 0.0]);
        for x in 1..5 {
            env.pos = Position::new(x, 1);
            env.time = x as f32 * 2.5;
            runner.step(&env, &mut candidate);
        }
        let summary = runner.finish(&env, &mut candidate);
        assert_eq!(summary.elapsed, 10.0);
        assert_eq!(summary.status, RunStatus::Explored);
    }

    #[test]
    fn test_early_end_without_stall_is_died() {
        let mut runner = runner();
        let mut env = env();
        let mut candidate = TestCandidate::new(vec![0.8, 0.0, 0.0]);
        runner.step(&env, &mut candidate);
        env.pos = Position::new(2, 1);
        env.time = 1.0;
        runner.step(&env, &mut candidate);

        let summary = runner.finish(&env, &mut candidate);
        assert_eq!(summary.status, RunStatus::Died);
    }

    #[test]
    fn test_steps_after_finish_are_ignored() {
        let mut runner = runner();
        let env = env();
        let mut candidate = TestCandidate::new(vec![0.8, 0.0, 0.0]);
        runner.step(&env, &mut candidate);
        runner.finish(&env, &mut candidate);

        let outcome = runner.step(&env, &mut candidate);
        assert!(outcome.should_terminate);
        assert_eq!(outcome.actions, ActionFlags::default());
        assert_eq!(candidate.network.activations, 1);
    }

    #[test]
    fn test_looping_agent_is_repeated() {
        let mut runner = runner();
        let mut env = env();
        let mut candidate = TestCandidate::new(vec![0.8, 0.0, 0.0]);

        let mut outcome = FrameOutcome::default();
        for frame in 0..7 {
            env.pos = Position::new(1 + frame % 2, 1);
            env.time = frame as f32 * 0.1;
            outcome = runner.step(&env, &mut candidate);
            if outcome.should_terminate {
                break;
            }
        }
        // Seventh frame is the fourth visit to (1, 1)
        assert!(outcome.idle);
        assert!(outcome.should_terminate);
        assert!(!runner.state().stalled);

        let summary = runner.finish(&env, &mut candidate);
        assert_eq!(summary.status, RunStatus::Repeated);
        assert_eq!(summary.states_visited, 2);
    }

    #[test]
    fn test_stall_after_looping_is_idle() {
        let mut runner = runner();
        let mut env = env();
        let mut candidate = TestCandidate::new(vec![0.5, 0.0, 0.0]);

        for frame in 0..6 {
            env.pos = Position::new(1 + frame % 2, 1);
            env.time = frame as f32 * 0.1;
            runner.step(&env, &mut candidate);
        }
        env.time = 3.0;
        assert!(runner.step(&env, &mut candidate).idle);

        let summary = runner.finish(&env, &mut candidate);
        assert_eq!(summary.status, RunStatus::Idle);
    }

    #[test]
    fn test_finish_without_frames_clears_stale_winner() {
        let mut runner = runner();
        let mut env = env();
        env.pos = Position::new(3, 1);
        env.time = 1.0;
        let mut candidate = TestCandidate::new(vec![0.8, 0.0, 0.0]);
        candidate.winner = true;

        let summary = runner.finish(&env, &mut candidate);
        assert!(!candidate.winner);
        assert!(!summary.winner);
        assert_eq!(summary.status, RunStatus::Died);
        assert_eq!(summary.start, summary.end);
        assert_eq!(candidate.network.activations, 0);
    }

    #[test]
    fn test_oversized_radius_rejected() {
        let result = EpisodeRunner::new(
            &SensorConfig {
                radius: MAX_SENSOR_RADIUS + 1,
                ..Default::default()
            },
            DecoderConfig::default(),
            TrackerConfig::default(),
        );
        assert!(matches!(
            result,
            Err(SetupError::InvalidParameter { name: "radius", .. })
        ));
    }

    #[test]
    fn test_non_positive_idle_time_rejected() {
        let result = EpisodeRunner::new(
            &SensorConfig::default(),
            DecoderConfig::default(),
            TrackerConfig {
                max_idle_time: 0.0,
                max_state_visits: 3,
            },
        );
        assert!(matches!(
            result,
            Err(SetupError::InvalidParameter {
                name: "max_idle_time",
                ..
            })
        ));
    }
}
