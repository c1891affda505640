// Between the TUI and the transport: turns input events into transport calls,
// keeps the pattern being typed and the message line, and builds the
// DisplayState the TUI draws each frame.

use std::time::{Duration, Instant};

use crate::config::Config;
use crate::error::ClaveError;
use crate::playback::VolumeChannel;
use crate::scheduler::{AudioClock, SoundSink};
use crate::sequence::{describe_bases, SequenceModel};
use crate::shared::{
    DisplayState, InputEvent, MAX_PATTERN_CHARS, MAX_SUBDIVISION, TEMPO_MAX, TEMPO_MIN,
    TEMPO_STEP, UNIFORM_DEMO_STEPS, VOLUME_MAX, VOLUME_MIN, VOLUME_STEP,
};
use crate::transport::{TransportController, TransportEvent};
use crate::tui::steps::StepView;

pub struct Middle<C, S> {
    transport: TransportController<C, S, StepView>,
    pattern_text: String,
    selected_volume: VolumeChannel,
    message: Option<String>,
}

impl<C: AudioClock, S: SoundSink> Middle<C, S> {
    pub fn new(clock: C, sink: S, config: &Config) -> Result<Self, ClaveError> {
        let model = SequenceModel::new(config.subdivision)?;
        let transport = TransportController::new(
            clock,
            sink,
            StepView::default(),
            model,
            config.playback_settings(),
            config.scheduler_config(),
        );
        let mut middle = Self {
            transport,
            pattern_text: config.pattern.clone(),
            selected_volume: VolumeChannel::Master,
            message: None,
        };
        if !middle.pattern_text.trim().is_empty() {
            middle.generate();
        }
        Ok(middle)
    }

    pub fn handle_input(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::EntryChar(c) => {
                if self.pattern_text.chars().count() < MAX_PATTERN_CHARS {
                    self.pattern_text.push(c);
                }
            }
            InputEvent::EntryBackspace => {
                self.pattern_text.pop();
            }
            InputEvent::Submit => self.generate(),
            InputEvent::GenerateUniform => {
                let result = self.transport.generate_uniform(UNIFORM_DEMO_STEPS);
                self.report(result);
            }
            InputEvent::PlayPress => {
                let result = self.transport.toggle(now);
                self.report(result);
            }
            InputEvent::ToggleLoop => {
                let looping = self.transport.settings().looping;
                self.transport.set_loop(!looping);
            }
            InputEvent::ToggleMute => {
                let muted = self.transport.settings().metronome_muted;
                self.transport.set_metronome_muted(!muted);
            }
            InputEvent::SubdivisionDown => self.step_subdivision(-1),
            InputEvent::SubdivisionUp => self.step_subdivision(1),
            InputEvent::TempoDown => self.step_tempo(-TEMPO_STEP),
            InputEvent::TempoUp => self.step_tempo(TEMPO_STEP),
            InputEvent::SelectVolume(channel) => self.selected_volume = channel,
            InputEvent::VolumeDown => self.step_volume(-VOLUME_STEP),
            InputEvent::VolumeUp => self.step_volume(VOLUME_STEP),
            InputEvent::Quit => self.transport.stop(),
        }
    }

    /// Give the scheduler its wake-up. Called once per UI loop iteration.
    pub fn tick(&mut self, now: Instant) {
        match self.transport.poll(now) {
            Some(TransportEvent::Halted(e)) => self.message = Some(user_message(&e)),
            Some(TransportEvent::Finished) | None => {}
        }
    }

    pub fn time_until_wake(&self, now: Instant) -> Option<Duration> {
        self.transport.time_until_wake(now)
    }

    pub fn display_state(&self) -> DisplayState {
        let settings = self.transport.settings();
        DisplayState {
            pattern_text: self.pattern_text.clone(),
            playing: self.transport.is_playing(),
            tempo: settings.tempo,
            subdivision: self.transport.model().subdivision(),
            looping: settings.looping,
            metronome_muted: settings.metronome_muted,
            volumes: settings.volumes,
            selected_volume: self.selected_volume,
            bases_text: describe_bases(&self.transport.possible_bases()),
            message: self.message.clone(),
            steps: self.transport.visualizer().clone(),
        }
    }

    fn generate(&mut self) {
        let result = self.transport.regenerate(&self.pattern_text);
        self.report(result);
    }

    // success clears the message line, failure replaces it
    fn report(&mut self, result: Result<(), ClaveError>) {
        self.message = result.err().map(|e| user_message(&e));
    }

    fn step_subdivision(&mut self, delta: isize) {
        let current = self.transport.model().subdivision();
        let next = current.saturating_add_signed(delta).clamp(1, MAX_SUBDIVISION);
        if next != current {
            let result = self.transport.set_subdivision(next);
            self.report(result);
        }
    }

    fn step_tempo(&mut self, delta: f64) {
        let next = (self.transport.settings().tempo + delta).clamp(TEMPO_MIN, TEMPO_MAX);
        let result = self.transport.set_tempo(next);
        self.report(result);
    }

    fn step_volume(&mut self, delta: f32) {
        let channel = self.selected_volume;
        let current = self.transport.settings().volumes.get(channel);
        // snap to hundredths so repeated steps don't drift
        let next = (((current + delta) * 100.0).round() / 100.0).clamp(VOLUME_MIN, VOLUME_MAX);
        let result = self.transport.set_volume(channel, next);
        self.report(result);
    }
}

fn user_message(e: &ClaveError) -> String {
    match e {
        ClaveError::EmptySequence => "Generate a clave first".to_string(),
        other => format!("Error: {other}"),
    }
}
