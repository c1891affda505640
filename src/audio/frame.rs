// One stereo frame, the unit the engine mixes in
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StereoFrame {
    pub left: f32,
    pub right: f32,
}

impl StereoFrame {
    pub fn mono(x: f32) -> Self {
        Self { left: x, right: x }
    }

    #[inline]
    pub fn mix_in(&mut self, other: StereoFrame, gain: f32) {
        self.left += other.left * gain;
        self.right += other.right * gain;
    }

    /// Write into an interleaved device buffer of any channel count.
    #[inline]
    pub fn write_interleaved(self, out: &mut [f32]) {
        match out {
            [mono] => *mono = 0.5 * (self.left + self.right),
            [l, r, rest @ ..] => {
                *l = self.left;
                *r = self.right;
                rest.fill(0.0);
            }
            [] => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mixes_with_gain() {
        let mut acc = StereoFrame::default();
        acc.mix_in(StereoFrame { left: 1.0, right: -1.0 }, 0.5);
        acc.mix_in(StereoFrame::mono(1.0), 0.25);
        assert_eq!(acc, StereoFrame { left: 0.75, right: -0.25 });
    }

    #[test]
    fn interleaves_for_any_layout() {
        let f = StereoFrame { left: 0.2, right: 0.4 };
        let mut mono = [1.0];
        f.write_interleaved(&mut mono);
        assert!((mono[0] - 0.3).abs() < 1e-6);

        let mut quad = [1.0; 4];
        f.write_interleaved(&mut quad);
        assert_eq!(quad, [0.2, 0.4, 0.0, 0.0]);
    }
}
