// Types shared between the TUI and the middle layer.
//
// Keys (resolved by the TUI depending on focus):
//
//   Pattern entry focused:
//     0-9, space      //  EntryChar(c)
//     Backspace       //  EntryBackspace
//     Enter           //  Submit
//
//   Transport focused:
//     Space           //  PlayPress
//     l / m           //  ToggleLoop / ToggleMute
//     [ / ]           //  SubdivisionDown / SubdivisionUp
//     - / =           //  TempoDown / TempoUp
//     1 / 2 / 3       //  SelectVolume(Master | Clave | Metronome)
//     , / .           //  VolumeDown / VolumeUp
//     u               //  GenerateUniform
//     Enter           //  Submit
//
//   Anywhere:
//     Tab             //  switch focus (TUI only)
//     Esc             //  Quit
//
// The middle layer owns all playback state; every frame the TUI asks it for a
// `DisplayState` and draws exactly that.

use crate::playback::{VolumeChannel, VolumeState};
use crate::tui::steps::StepView;

pub const MAX_STEPS: usize = 4096;
pub const MAX_SUBDIVISION: usize = 16;

pub const TEMPO_MIN: f64 = 20.0;
pub const TEMPO_MAX: f64 = 400.0;
pub const TEMPO_STEP: f64 = 1.0;

pub const VOLUME_MIN: f32 = 0.0;
pub const VOLUME_MAX: f32 = 1.0;
pub const VOLUME_STEP: f32 = 0.05;

pub const UNIFORM_DEMO_STEPS: usize = 16;
pub const MAX_PATTERN_CHARS: usize = 64;

#[derive(Clone, Debug, PartialEq)]
pub enum InputEvent {
    // pattern entry field
    EntryChar(char),
    EntryBackspace,
    Submit,

    // transport
    PlayPress,
    ToggleLoop,
    ToggleMute,
    SubdivisionDown,
    SubdivisionUp,
    TempoDown,
    TempoUp,
    SelectVolume(VolumeChannel),
    VolumeDown,
    VolumeUp,
    GenerateUniform,

    Quit,
}

#[derive(Clone, Debug)]
pub struct DisplayState {
    pub pattern_text: String,
    pub playing: bool,
    pub tempo: f64,
    pub subdivision: usize,
    pub looping: bool,
    pub metronome_muted: bool,
    pub volumes: VolumeState,
    pub selected_volume: VolumeChannel,
    pub bases_text: String,
    pub message: Option<String>,
    pub steps: StepView,
}
