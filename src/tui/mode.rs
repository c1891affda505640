// state local to the tui: which widget keys go to. The middle layer never
// sees raw keys, only the resolved InputEvents.

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Focus {
    #[default]
    Entry,
    Transport,
}

impl Focus {
    pub fn next(self) -> Self {
        match self {
            Focus::Entry => Focus::Transport,
            Focus::Transport => Focus::Entry,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct TuiState {
    pub focus: Focus,
}
