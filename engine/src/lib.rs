pub mod audio;
pub mod graphics;
pub mod pixels_renderer;

/// Frame-by-frame state history with rewind/forward and branch-on-record.
///
/// A physics game records a state per animation frame, so the history can be capped with
/// [`TimeMachine::with_capacity_limit`]; the oldest frames are dropped first.
#[derive(Debug)]
pub struct TimeMachine<State> {
    states: Vec<State>,
    frame: usize,
    dropped: usize,
    capacity_limit: Option<usize>,
}

impl<State> TimeMachine<State> {
    pub fn new(initial_state: State) -> Self {
        Self {
            states: vec![initial_state],
            frame: 0,
            dropped: 0,
            capacity_limit: None,
        }
    }

    pub fn with_capacity_limit(mut self, limit: usize) -> Self {
        self.capacity_limit = Some(limit.max(1));
        self.enforce_capacity();
        self
    }

    /// Index of the current state within the retained history.
    pub fn frame(&self) -> usize {
        self.frame
    }

    /// Absolute frame number, counting frames that fell off the front of a capped history.
    pub fn absolute_frame(&self) -> usize {
        self.dropped + self.frame
    }

    pub fn len(&self) -> usize {
        self.states.len()
    }

    pub fn is_empty(&self) -> bool {
        self.states.is_empty()
    }

    pub fn state(&self) -> &State {
        &self.states[self.frame]
    }

    pub fn state_at(&self, frame: usize) -> Option<&State> {
        self.states.get(frame)
    }

    pub fn history(&self) -> &[State] {
        &self.states
    }

    pub fn can_rewind(&self) -> bool {
        self.frame > 0
    }

    pub fn can_forward(&self) -> bool {
        self.frame + 1 < self.states.len()
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.frame = self.frame.saturating_sub(frames);
        self.frame
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        let max_frame = self.states.len().saturating_sub(1);
        self.frame = (self.frame + frames).min(max_frame);
        self.frame
    }

    pub fn record(&mut self, state: State) -> usize {
        if self.frame + 1 < self.states.len() {
            self.states.truncate(self.frame + 1);
        }
        self.states.push(state);
        self.frame += 1;
        self.enforce_capacity();
        self.frame
    }

    fn enforce_capacity(&mut self) {
        let Some(limit) = self.capacity_limit else {
            return;
        };
        if self.states.len() <= limit {
            return;
        }
        let excess = self.states.len() - limit;
        self.states.drain(..excess);
        self.dropped += excess;
        self.frame = self.frame.saturating_sub(excess);
    }
}

pub trait GameLogic {
    type State;
    type Input;

    fn initial_state(&self) -> Self::State;
    fn step(&self, state: &Self::State, input: Self::Input) -> Self::State;
}

#[derive(Debug)]
pub struct HeadlessRunner<G: GameLogic> {
    game: G,
    timemachine: TimeMachine<G::State>,
}

impl<G: GameLogic> HeadlessRunner<G> {
    pub fn new(game: G) -> Self {
        let initial_state = game.initial_state();
        Self {
            game,
            timemachine: TimeMachine::new(initial_state),
        }
    }

    pub fn with_history_limit(game: G, limit: usize) -> Self {
        let initial_state = game.initial_state();
        Self {
            game,
            timemachine: TimeMachine::new(initial_state).with_capacity_limit(limit),
        }
    }

    pub fn game(&self) -> &G {
        &self.game
    }

    pub fn frame(&self) -> usize {
        self.timemachine.frame()
    }

    pub fn state(&self) -> &G::State {
        self.timemachine.state()
    }

    pub fn history(&self) -> &[G::State] {
        self.timemachine.history()
    }

    pub fn timemachine(&self) -> &TimeMachine<G::State> {
        &self.timemachine
    }

    pub fn step(&mut self, input: G::Input) -> usize {
        let next_state = self.game.step(self.timemachine.state(), input);
        self.timemachine.record(next_state)
    }

    pub fn run<I>(&mut self, inputs: I) -> usize
    where
        I: IntoIterator<Item = G::Input>,
    {
        let mut last_frame = self.frame();
        for input in inputs {
            last_frame = self.step(input);
        }
        last_frame
    }

    /// Steps until `done` returns true for the current state or `max_steps` inputs have been fed.
    pub fn run_until<F>(&mut self, mut next_input: impl FnMut(usize) -> G::Input, max_steps: usize, done: F) -> usize
    where
        F: Fn(&G::State) -> bool,
    {
        for i in 0..max_steps {
            if done(self.state()) {
                break;
            }
            self.step(next_input(i));
        }
        self.frame()
    }

    pub fn rewind(&mut self, frames: usize) -> usize {
        self.timemachine.rewind(frames)
    }

    pub fn forward(&mut self, frames: usize) -> usize {
        self.timemachine.forward(frames)
    }
}
