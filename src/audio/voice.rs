use super::frame::StereoFrame;
use super::sample_buffer::SampleBuffer;

/// One playing instance of a registered sample.
#[derive(Clone, Copy, Debug)]
pub struct Voice {
    pub slot: usize, // index into the engine's sample table
    pub gain: f32,
    pub active: bool,
    pos: usize,
    delay: usize, // frames to wait inside the first block
}

impl Voice {
    pub const IDLE: Voice = Voice {
        slot: 0,
        gain: 0.0,
        active: false,
        pos: 0,
        delay: 0,
    };

    pub fn new(slot: usize, gain: f32, delay: usize) -> Self {
        Self {
            slot,
            gain,
            active: true,
            pos: 0,
            delay,
        }
    }

    pub fn render_into(&mut self, buffer: &SampleBuffer, out: &mut [StereoFrame]) {
        if !self.active {
            return;
        }
        let skip = self.delay.min(out.len());
        self.delay -= skip;

        for frame in &mut out[skip..] {
            let Some(sample) = buffer.data.get(self.pos) else {
                self.active = false;
                return;
            };
            frame.mix_in(*sample, self.gain);
            self.pos += 1;
        }
        if self.pos >= buffer.data.len() {
            self.active = false;
        }
    }
}
