//! Start/stop/loop/tempo state machine around one `Scheduler`.
//!
//! ```text
//! Idle --start--> Playing --stop | ran out without loop | halted--> Idle
//! ```
//!
//! The controller owns every piece of state the scheduler reads (sequence,
//! tempo, volumes, flags) and hands it over by reference on each wake.

use std::time::{Duration, Instant};

use crate::error::ClaveError;
use crate::playback::{seconds_per_subdivision, PlaybackSettings, VolumeChannel};
use crate::scheduler::{AudioClock, Scheduler, SchedulerConfig, SoundSink, Visualizer, WakeOutcome};
use crate::sequence::{generate_uniform, parse_sequence, Base, SequenceModel, StepSequence};
use crate::timer::{CancelToken, RecurringTask};

enum TransportState {
    Idle,
    Playing {
        scheduler: Scheduler,
        task: RecurringTask,
    },
}

/// Something the UI should hear about that it did not ask for.
#[derive(Clone, Debug, PartialEq)]
pub enum TransportEvent {
    Finished,
    Halted(ClaveError),
}

pub struct TransportController<C, S, V> {
    clock: C,
    sink: S,
    visualizer: V,
    model: SequenceModel,
    settings: PlaybackSettings,
    config: SchedulerConfig,
    state: TransportState,
}

impl<C, S, V> TransportController<C, S, V>
where
    C: AudioClock,
    S: SoundSink,
    V: Visualizer,
{
    pub fn new(
        clock: C,
        sink: S,
        visualizer: V,
        model: SequenceModel,
        settings: PlaybackSettings,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            clock,
            sink,
            visualizer,
            model,
            settings,
            config,
            state: TransportState::Idle,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, TransportState::Playing { .. })
    }

    /// Next step to be scheduled; 0 when idle.
    pub fn cursor(&self) -> usize {
        match &self.state {
            TransportState::Playing { scheduler, .. } => scheduler.cursor(),
            TransportState::Idle => 0,
        }
    }

    pub fn model(&self) -> &SequenceModel {
        &self.model
    }

    pub fn settings(&self) -> &PlaybackSettings {
        &self.settings
    }

    /// Raw access for writing several settings at once. Values are validated
    /// when the next step is scheduled.
    pub fn settings_mut(&mut self) -> &mut PlaybackSettings {
        &mut self.settings
    }

    pub fn visualizer(&self) -> &V {
        &self.visualizer
    }

    pub fn possible_bases(&self) -> Vec<Base> {
        self.model.possible_bases()
    }

    pub fn start(&mut self, now: Instant) -> Result<(), ClaveError> {
        if self.is_playing() {
            return Ok(());
        }
        if self.model.is_empty() {
            return Err(ClaveError::EmptySequence);
        }
        seconds_per_subdivision(self.settings.tempo)?;

        if let Err(e) = self.sink.resume() {
            log::warn!("audio resume failed, starting anyway: {e}");
        }

        let token = CancelToken::new();
        let scheduler = Scheduler::new(self.clock.now(), &self.config, token.clone());
        let task = RecurringTask::new(self.config.wake_interval, now, token);
        self.state = TransportState::Playing { scheduler, task };
        log::info!(
            "playback started: {} steps at {} BPM, loop {}",
            self.model.len(),
            self.settings.tempo,
            self.settings.looping
        );
        Ok(())
    }

    /// Cancel the wake-up, drop committed-but-unplayed triggers, clear the highlight.
    pub fn stop(&mut self) {
        if self.halt() {
            self.sink.cancel_pending();
            log::info!("playback stopped");
        }
    }

    pub fn toggle(&mut self, now: Instant) -> Result<(), ClaveError> {
        if self.is_playing() {
            self.stop();
            Ok(())
        } else {
            self.start(now)
        }
    }

    /// Run the scheduler if its wake-up is due. Call this from the host loop
    /// at least as often as `wake_interval`.
    pub fn poll(&mut self, now: Instant) -> Option<TransportEvent> {
        let TransportState::Playing { scheduler, task } = &mut self.state else {
            return None;
        };
        if !task.due(now) {
            return None;
        }

        match scheduler.wake(&self.model, &self.settings, &self.clock, &self.sink, &mut self.visualizer) {
            WakeOutcome::Pending | WakeOutcome::Cancelled => None,
            WakeOutcome::Finished => {
                // the tail is already committed, let it play out
                self.halt();
                log::info!("playback finished");
                Some(TransportEvent::Finished)
            }
            WakeOutcome::Halted(e) => {
                self.stop();
                log::warn!("playback halted: {e}");
                Some(TransportEvent::Halted(e))
            }
        }
    }

    /// How long the host may sleep before `poll` has work.
    pub fn time_until_wake(&self, now: Instant) -> Option<Duration> {
        match &self.state {
            TransportState::Playing { task, .. } => Some(task.time_until_due(now)),
            TransportState::Idle => None,
        }
    }

    /// Parse `text` into a new clave. Stops playback on success; on error the
    /// current sequence stays.
    pub fn regenerate(&mut self, text: &str) -> Result<(), ClaveError> {
        let clave = parse_sequence(text)?;
        self.replace_sequence(clave)
    }

    pub fn generate_uniform(&mut self, length: usize) -> Result<(), ClaveError> {
        let clave = generate_uniform(length)?;
        self.replace_sequence(clave)
    }

    fn replace_sequence(&mut self, clave: StepSequence) -> Result<(), ClaveError> {
        let mut model = self.model.clone();
        model.regenerate(clave)?;
        // never leave a scheduler running against the old sequence
        self.stop();
        self.model = model;
        self.render_idle();
        log::info!("new sequence: {} steps [{}]", self.model.len(), self.model.clave());
        Ok(())
    }

    /// Re-derive the metronome. Playback carries on; the length is unchanged.
    pub fn set_subdivision(&mut self, subdivision: usize) -> Result<(), ClaveError> {
        self.model.set_subdivision(subdivision)?;
        if !self.is_playing() {
            self.render_idle();
        }
        Ok(())
    }

    pub fn set_tempo(&mut self, bpm: f64) -> Result<(), ClaveError> {
        seconds_per_subdivision(bpm)?;
        self.settings.tempo = bpm;
        Ok(())
    }

    pub fn set_loop(&mut self, looping: bool) {
        self.settings.looping = looping;
    }

    pub fn set_metronome_muted(&mut self, muted: bool) {
        self.settings.metronome_muted = muted;
    }

    pub fn set_volume(&mut self, channel: VolumeChannel, value: f32) -> Result<(), ClaveError> {
        self.settings.volumes.set(channel, value)
    }

    /// Push the current sequences to the visualizer with nothing highlighted.
    pub fn render_idle(&mut self) {
        self.visualizer
            .render(self.model.clave(), self.model.metronome(), None);
    }

    // Back to Idle. Returns whether we were playing.
    fn halt(&mut self) -> bool {
        let TransportState::Playing { task, .. } = &self.state else {
            return false;
        };
        task.cancel();
        self.state = TransportState::Idle;
        self.render_idle();
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_api::Sound;
    use crate::scheduler::testing::{FakeClock, RecordingSink, RecordingView};

    type Controller = TransportController<FakeClock, RecordingSink, RecordingView>;

    const WAKE: Duration = Duration::from_millis(25);

    fn controller() -> Controller {
        TransportController::new(
            FakeClock::default(),
            RecordingSink::default(),
            RecordingView::default(),
            SequenceModel::new(4).unwrap(),
            PlaybackSettings::default(),
            SchedulerConfig::default(),
        )
    }

    /// Drive the host loop: advance both clocks by one wake interval per call.
    fn pump(c: &mut Controller, t: &mut Instant, wakes: usize) -> Option<TransportEvent> {
        for _ in 0..wakes {
            if let Some(ev) = c.poll(*t) {
                return Some(ev);
            }
            *t += WAKE;
            c.clock.advance(WAKE.as_secs_f64());
        }
        None
    }

    #[test]
    fn start_rejects_empty_sequence() {
        let mut c = controller();
        assert_eq!(c.start(Instant::now()), Err(ClaveError::EmptySequence));
        assert!(!c.is_playing());
        assert_eq!(c.sink.resumes.get(), 0);
    }

    #[test]
    fn start_rejects_invalid_tempo() {
        let mut c = controller();
        c.regenerate("3 2").unwrap();
        c.settings_mut().tempo = -1.0;
        assert!(matches!(c.start(Instant::now()), Err(ClaveError::Validation(_))));
        assert!(!c.is_playing());
    }

    #[test]
    fn start_resumes_backend_and_schedules_immediately() {
        let mut c = controller();
        c.regenerate("3 2").unwrap();
        let mut t = Instant::now();
        c.start(t).unwrap();
        assert!(c.is_playing());
        assert_eq!(c.sink.resumes.get(), 1);

        assert_eq!(pump(&mut c, &mut t, 1), None);
        let notes = c.sink.fired(Sound::Note);
        assert_eq!(notes.len(), 1);
        assert!((notes[0].when - 0.05).abs() < 1e-9);
        assert_eq!(c.cursor(), 1);
    }

    #[test]
    fn refused_resume_does_not_block_start() {
        let mut c = controller();
        c.regenerate("2").unwrap();
        c.sink.refuse_resume.set(true);
        assert!(c.start(Instant::now()).is_ok());
        assert!(c.is_playing());
    }

    #[test]
    fn runs_to_the_end_without_loop() {
        let mut c = controller();
        c.regenerate("3 2").unwrap();
        c.set_loop(false);
        let mut t = Instant::now();
        c.start(t).unwrap();

        assert_eq!(pump(&mut c, &mut t, 10_000), Some(TransportEvent::Finished));
        assert!(!c.is_playing());
        assert_eq!(c.cursor(), 0);
        assert_eq!(c.visualizer().last(), Some((12, None)));
        assert_eq!(c.visualizer().highlights(), (0..12).collect::<Vec<_>>());
        // natural end keeps the committed tail
        assert_eq!(c.sink.cancels.get(), 0);
        // "3 2" has 5 onsets
        assert_eq!(c.sink.fired(Sound::Note).len(), 5);
    }

    #[test]
    fn stop_cancels_and_clears_highlight() {
        let mut c = controller();
        c.regenerate("3 3 2").unwrap();
        let mut t = Instant::now();
        c.start(t).unwrap();
        pump(&mut c, &mut t, 20);
        let fired = c.sink.fired.borrow().len();

        c.stop();
        assert!(!c.is_playing());
        assert_eq!(c.cursor(), 0);
        assert_eq!(c.sink.cancels.get(), 1);
        assert_eq!(c.visualizer().last(), Some((19, None)));

        // a late wake after stop schedules nothing
        assert_eq!(pump(&mut c, &mut t, 20), None);
        assert_eq!(c.sink.fired.borrow().len(), fired);

        c.stop();
        assert_eq!(c.sink.cancels.get(), 1);
    }

    #[test]
    fn restart_begins_at_step_zero() {
        let mut c = controller();
        c.regenerate("3 3 2").unwrap();
        let mut t = Instant::now();
        c.start(t).unwrap();
        pump(&mut c, &mut t, 30);
        c.toggle(t).unwrap();
        c.toggle(t).unwrap();
        pump(&mut c, &mut t, 1);

        assert!(c.is_playing());
        assert_eq!(c.visualizer().highlights().last(), Some(&0));
    }

    #[test]
    fn regenerate_while_playing_stops() {
        let mut c = controller();
        c.regenerate("3 2").unwrap();
        let mut t = Instant::now();
        c.start(t).unwrap();
        pump(&mut c, &mut t, 5);

        c.regenerate("2 2").unwrap();
        assert!(!c.is_playing());
        assert_eq!(c.model().len(), 10);
        assert_eq!(c.model().metronome().len(), 10);
        assert_eq!(c.visualizer().last(), Some((10, None)));
    }

    #[test]
    fn failed_regenerate_changes_nothing() {
        let mut c = controller();
        c.regenerate("3 2").unwrap();
        let mut t = Instant::now();
        c.start(t).unwrap();
        pump(&mut c, &mut t, 5);

        assert!(c.regenerate("3 oops").is_err());
        assert!(c.generate_uniform(usize::MAX).is_err());
        assert!(c.is_playing());
        assert_eq!(c.model().len(), 12);
    }

    #[test]
    fn invalid_tempo_mid_playback_halts() {
        let mut c = controller();
        c.regenerate("3 3 2").unwrap();
        let mut t = Instant::now();
        c.start(t).unwrap();
        pump(&mut c, &mut t, 3);
        let fired = c.sink.fired.borrow().len();

        c.settings_mut().tempo = 0.0;
        let event = pump(&mut c, &mut t, 100);

        assert!(matches!(event, Some(TransportEvent::Halted(ClaveError::Validation(_)))));
        assert!(!c.is_playing());
        assert_eq!(c.sink.fired.borrow().len(), fired);
    }

    #[test]
    fn validated_setters_reject_bad_values() {
        let mut c = controller();
        assert!(c.set_tempo(0.0).is_err());
        assert!(c.set_tempo(f64::NAN).is_err());
        assert_eq!(c.settings().tempo, 120.0);
        c.set_tempo(90.0).unwrap();
        assert_eq!(c.settings().tempo, 90.0);

        assert!(c.set_volume(VolumeChannel::Master, -0.1).is_err());
        c.set_volume(VolumeChannel::Metronome, 0.3).unwrap();
        assert_eq!(c.settings().volumes.metronome, 0.3);

        assert!(c.set_subdivision(0).is_err());
        assert_eq!(c.model().subdivision(), 4);
    }

    #[test]
    fn subdivision_change_keeps_playing() {
        let mut c = controller();
        c.regenerate("3 3 2").unwrap();
        let mut t = Instant::now();
        c.start(t).unwrap();
        pump(&mut c, &mut t, 5);

        c.set_subdivision(2).unwrap();
        assert!(c.is_playing());
        assert!(c.model().metronome().is_on(2));
    }

    #[test]
    fn mute_applies_to_next_step() {
        let mut c = controller();
        c.generate_uniform(16).unwrap();
        c.set_subdivision(1).unwrap();
        c.set_metronome_muted(true);
        let mut t = Instant::now();
        c.start(t).unwrap();
        pump(&mut c, &mut t, 400);
        assert!(c.sink.fired(Sound::Kick).is_empty());
        assert!(!c.sink.fired(Sound::Note).is_empty());
    }

    #[test]
    fn reports_wake_deadline_only_while_playing() {
        let mut c = controller();
        let t = Instant::now();
        assert_eq!(c.time_until_wake(t), None);
        c.regenerate("2").unwrap();
        c.start(t).unwrap();
        assert_eq!(c.time_until_wake(t), Some(Duration::ZERO));
        c.poll(t);
        assert_eq!(c.time_until_wake(t), Some(WAKE));
    }
}
