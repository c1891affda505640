//! Lookahead step scheduler.
//!
//! The UI loop wakes us every ~25 ms, give or take whatever else it was busy
//! with. Sounds are never started "now"; each wake commits every step whose
//! start time falls inside `now + schedule_ahead` to the audio thread with an
//! absolute device-clock timestamp. Wake-up jitter then only has to stay
//! below the lookahead window to be inaudible.

use std::ops::ControlFlow;
use std::time::Duration;

use crate::audio_api::Sound;
use crate::error::ClaveError;
use crate::playback::{seconds_per_subdivision, PlaybackSettings};
use crate::sequence::{MetronomeSequence, SequenceModel, StepSequence};
use crate::timer::CancelToken;

/// Monotonic audio-domain clock, in seconds.
pub trait AudioClock {
    fn now(&self) -> f64;
}

/// Where scheduled sounds go.
pub trait SoundSink {
    /// Wake the backend up if it is suspended. Must be idempotent.
    fn resume(&self) -> Result<(), ClaveError>;

    /// Start `sound` at absolute clock time `when`. Fire and forget.
    fn trigger(&self, sound: Sound, gain: f32, when: f64);

    /// Drop triggers that were committed but have not started sounding.
    fn cancel_pending(&self);
}

pub trait Visualizer {
    fn render(
        &mut self,
        clave: &StepSequence,
        metronome: &MetronomeSequence,
        highlight: Option<usize>,
    );
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SchedulerConfig {
    /// Seconds of audio committed ahead of the clock.
    pub schedule_ahead: f64,
    /// How often the scheduler wants to be woken.
    pub wake_interval: Duration,
    /// Delay between pressing play and the first step.
    pub start_lead: f64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            schedule_ahead: 0.100,
            wake_interval: Duration::from_millis(25),
            start_lead: 0.050,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum WakeOutcome {
    /// Horizon filled; wake again later.
    Pending,
    /// Ran off the end without looping.
    Finished,
    /// Could not schedule the next step.
    Halted(ClaveError),
    /// Stopped before this wake ran.
    Cancelled,
}

pub struct Scheduler {
    cursor: usize,
    next_event_time: f64,
    schedule_ahead: f64,
    token: CancelToken,
}

impl Scheduler {
    pub fn new(now: f64, config: &SchedulerConfig, token: CancelToken) -> Self {
        Self {
            cursor: 0,
            next_event_time: now + config.start_lead,
            schedule_ahead: config.schedule_ahead,
            token,
        }
    }

    /// Index of the next step to schedule.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn next_event_time(&self) -> f64 {
        self.next_event_time
    }

    /// One wake-up: schedule everything that starts before the horizon.
    pub fn wake(
        &mut self,
        model: &SequenceModel,
        settings: &PlaybackSettings,
        clock: &impl AudioClock,
        sink: &impl SoundSink,
        visualizer: &mut impl Visualizer,
    ) -> WakeOutcome {
        if self.token.is_cancelled() {
            return WakeOutcome::Cancelled;
        }

        while self.next_event_time < clock.now() + self.schedule_ahead {
            if let ControlFlow::Break(outcome) = self.schedule_step(model, settings, sink, visualizer)
            {
                return outcome;
            }
        }
        WakeOutcome::Pending
    }

    fn schedule_step(
        &mut self,
        model: &SequenceModel,
        settings: &PlaybackSettings,
        sink: &impl SoundSink,
        visualizer: &mut impl Visualizer,
    ) -> ControlFlow<WakeOutcome> {
        let len = model.len();
        if self.cursor >= len {
            if !settings.looping || len == 0 {
                return ControlFlow::Break(WakeOutcome::Finished);
            }
            self.cursor = 0;
        }

        // one copy per step: settings written between steps apply whole
        let settings = *settings;
        let interval = match seconds_per_subdivision(settings.tempo) {
            Ok(interval) => interval,
            Err(e) => return ControlFlow::Break(WakeOutcome::Halted(e)),
        };

        let when = self.next_event_time;
        if model.clave().is_on(self.cursor) {
            sink.trigger(Sound::Note, settings.volumes.clave_gain(), when);
        }
        if model.metronome().is_on(self.cursor) && !settings.metronome_muted {
            sink.trigger(Sound::Kick, settings.volumes.metronome_gain(), when);
        }

        // highlight follows scheduling time, up to `schedule_ahead` early
        visualizer.render(model.clave(), model.metronome(), Some(self.cursor));

        self.next_event_time += interval;
        self.cursor += 1;
        ControlFlow::Continue(())
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use crate::sequence::parse_sequence;

    const WAKE: f64 = 0.025;

    fn model(steps: Vec<bool>, subdivision: usize) -> SequenceModel {
        let mut model = SequenceModel::new(subdivision).unwrap();
        model.regenerate(StepSequence::from_steps(steps)).unwrap();
        model
    }

    fn settings(tempo: f64, looping: bool) -> PlaybackSettings {
        PlaybackSettings {
            tempo,
            looping,
            ..PlaybackSettings::default()
        }
    }

    fn run_until_done(
        scheduler: &mut Scheduler,
        model: &SequenceModel,
        settings: &PlaybackSettings,
        clock: &FakeClock,
        sink: &RecordingSink,
        view: &mut RecordingView,
        max_wakes: usize,
    ) -> WakeOutcome {
        for _ in 0..max_wakes {
            let outcome = scheduler.wake(model, settings, clock, sink, view);
            if outcome != WakeOutcome::Pending {
                return outcome;
            }
            clock.advance(WAKE);
        }
        WakeOutcome::Pending
    }

    #[test]
    fn first_step_lands_after_start_lead() {
        let clock = FakeClock::default();
        clock.0.set(3.0);
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let model = model(vec![true; 8], 4);
        let mut scheduler = Scheduler::new(clock.now(), &SchedulerConfig::default(), CancelToken::new());

        let outcome = scheduler.wake(&model, &settings(120.0, false), &clock, &sink, &mut view);

        assert_eq!(outcome, WakeOutcome::Pending);
        let notes = sink.fired(Sound::Note);
        // only 3.05 is inside the 100ms window
        assert_eq!(notes.len(), 1);
        assert!((notes[0].when - 3.05).abs() < 1e-9);
        assert_eq!(scheduler.cursor(), 1);
        assert!((scheduler.next_event_time() - 3.30).abs() < 1e-9);
    }

    #[test]
    fn plays_each_step_once_then_finishes() {
        let clock = FakeClock::default();
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let n = 13;
        let model = model(vec![true; n], 1);
        let mut scheduler = Scheduler::new(0.0, &SchedulerConfig::default(), CancelToken::new());

        let outcome = run_until_done(
            &mut scheduler,
            &model,
            &settings(120.0, false),
            &clock,
            &sink,
            &mut view,
            10_000,
        );

        assert_eq!(outcome, WakeOutcome::Finished);
        assert_eq!(view.highlights(), (0..n).collect::<Vec<_>>());
        let notes = sink.fired(Sound::Note);
        assert_eq!(notes.len(), n);
        assert_eq!(sink.fired(Sound::Kick).len(), n);
        for pair in notes.windows(2) {
            assert!((pair[1].when - pair[0].when - 0.25).abs() < 1e-9);
        }
    }

    #[test]
    fn silent_steps_still_advance() {
        let clock = FakeClock::default();
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let model = model(vec![true, false, false, true], 16);
        let mut scheduler = Scheduler::new(0.0, &SchedulerConfig::default(), CancelToken::new());

        run_until_done(
            &mut scheduler,
            &model,
            &settings(60.0, false),
            &clock,
            &sink,
            &mut view,
            10_000,
        );

        let notes = sink.fired(Sound::Note);
        assert_eq!(notes.len(), 2);
        assert!((notes[1].when - notes[0].when - 1.5).abs() < 1e-9);
        assert_eq!(sink.fired(Sound::Kick).len(), 1);
        assert_eq!(view.highlights(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn looping_cursor_has_period_n() {
        let clock = FakeClock::default();
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let model = model(parse_sequence("3 2").unwrap().steps().to_vec(), 4);
        let n = model.len();
        let mut scheduler = Scheduler::new(0.0, &SchedulerConfig::default(), CancelToken::new());

        let outcome = run_until_done(
            &mut scheduler,
            &model,
            &settings(240.0, true),
            &clock,
            &sink,
            &mut view,
            2_000,
        );

        assert_eq!(outcome, WakeOutcome::Pending);
        let highlights = view.highlights();
        assert!(highlights.len() > 5 * n);
        for (i, h) in highlights.iter().enumerate() {
            assert_eq!(*h, i % n);
        }
        let kicks = sink.fired(Sound::Kick);
        for pair in kicks.windows(2) {
            assert!(pair[1].when > pair[0].when);
        }
    }

    #[test]
    fn tempo_change_applies_to_next_unscheduled_step() {
        let clock = FakeClock::default();
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let model = model(vec![true; 64], 1);
        let mut live = settings(120.0, false);
        let mut scheduler = Scheduler::new(0.0, &SchedulerConfig::default(), CancelToken::new());

        for _ in 0..40 {
            scheduler.wake(&model, &live, &clock, &sink, &mut view);
            clock.advance(WAKE);
        }
        let before = sink.fired(Sound::Note);
        live.tempo = 60.0;
        for _ in 0..200 {
            scheduler.wake(&model, &live, &clock, &sink, &mut view);
            clock.advance(WAKE);
        }
        let after = sink.fired(Sound::Note);

        // already committed events keep their times
        assert_eq!(&after[..before.len()], &before[..]);
        let k = before.len();
        assert!((after[k].when - after[k - 1].when - 0.25).abs() < 1e-9);
        assert!((after[k + 1].when - after[k].when - 0.5).abs() < 1e-9);
    }

    #[test]
    fn invalid_tempo_halts_without_triggering() {
        let clock = FakeClock::default();
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let model = model(vec![true; 4], 1);
        let mut scheduler = Scheduler::new(0.0, &SchedulerConfig::default(), CancelToken::new());

        let outcome = scheduler.wake(&model, &settings(0.0, true), &clock, &sink, &mut view);

        assert!(matches!(outcome, WakeOutcome::Halted(ClaveError::Validation(_))));
        assert!(sink.fired.borrow().is_empty());
        assert!(view.frames.is_empty());
    }

    #[test]
    fn cancelled_scheduler_does_nothing() {
        let clock = FakeClock::default();
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let model = model(vec![true; 4], 1);
        let token = CancelToken::new();
        let mut scheduler = Scheduler::new(0.0, &SchedulerConfig::default(), token.clone());

        token.cancel();
        let outcome = scheduler.wake(&model, &settings(120.0, true), &clock, &sink, &mut view);

        assert_eq!(outcome, WakeOutcome::Cancelled);
        assert!(sink.fired.borrow().is_empty());
        assert_eq!(scheduler.cursor(), 0);
    }

    #[test]
    fn muted_metronome_and_gains() {
        let clock = FakeClock::default();
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let model = model(vec![true; 4], 1);
        let mut live = settings(120.0, false);
        live.volumes.master = 0.5;
        live.volumes.clave = 0.5;
        live.metronome_muted = true;
        let mut scheduler = Scheduler::new(0.0, &SchedulerConfig::default(), CancelToken::new());

        run_until_done(&mut scheduler, &model, &live, &clock, &sink, &mut view, 1_000);

        assert!(sink.fired(Sound::Kick).is_empty());
        let notes = sink.fired(Sound::Note);
        assert_eq!(notes.len(), 4);
        assert!(notes.iter().all(|f| (f.gain - 0.25).abs() < f32::EPSILON));
    }

    #[test]
    fn empty_sequence_finishes_even_when_looping() {
        let clock = FakeClock::default();
        let sink = RecordingSink::default();
        let mut view = RecordingView::default();
        let model = SequenceModel::new(4).unwrap();
        let mut scheduler = Scheduler::new(0.0, &SchedulerConfig::default(), CancelToken::new());

        let outcome = scheduler.wake(&model, &settings(120.0, true), &clock, &sink, &mut view);
        assert_eq!(outcome, WakeOutcome::Finished);
    }
}
