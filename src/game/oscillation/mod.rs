//! Shared oscillation clock.
//!
//! A level-wide table of periodic counters advanced exactly once per
//! simulation tick, before any object runs. Objects never own private timers
//! for periodic motion; they read this table at fixed byte offsets so that
//! unrelated platforms stay phase-locked.
//!
//! Channels are packed big-endian into a flat byte image in declaration order:
//! a word channel takes two bytes (high byte first), a byte channel one.
//! [`OscillationTable::read_byte`] and [`OscillationTable::read_word`] read that
//! image.

use bevy::prelude::*;

/// Storage width of a channel, which is also its wrap-around modulus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelWidth {
    /// Wraps at 2^8.
    Byte,
    /// Wraps at 2^16.
    Word,
}

impl ChannelWidth {
    pub const fn bytes(self) -> usize {
        match self {
            ChannelWidth::Byte => 1,
            ChannelWidth::Word => 2,
        }
    }
}

/// How a channel moves each tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelKind {
    /// Monotonic wrapping counter: `value += increment`.
    Phase { increment: u16 },
    /// Bounded value/rate oscillator. The rate accelerates by `speed` toward
    /// the `limit` (compared against the value's high byte) and reverses once
    /// the limit is crossed, giving a smooth swing around `limit`.
    Swing { speed: u16, limit: u8 },
}

/// Declaration of one channel.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChannelSpec {
    pub width: ChannelWidth,
    pub kind: ChannelKind,
    pub initial: u16,
}

impl ChannelSpec {
    pub const fn phase_byte(increment: u8, initial: u8) -> Self {
        Self {
            width: ChannelWidth::Byte,
            kind: ChannelKind::Phase { increment: increment as u16 },
            initial: initial as u16,
        }
    }

    pub const fn phase_word(increment: u16, initial: u16) -> Self {
        Self {
            width: ChannelWidth::Word,
            kind: ChannelKind::Phase { increment },
            initial,
        }
    }

    pub const fn swing(speed: u16, limit: u8) -> Self {
        Self {
            width: ChannelWidth::Word,
            kind: ChannelKind::Swing { speed, limit },
            initial: 0x0080,
        }
    }
}

/// Phase counters, offsets `0x00..=0x0F`.
const STANDARD_WORD_PHASES: [u16; 8] = [0x0100, 0x0200, 0x0080, 0x0300, 0x0200, 0x0400, 0x0180, 0x0100];
/// Phase counters, offsets `0x10..=0x17`.
const STANDARD_BYTE_PHASES: [u8; 8] = [1, 2, 3, 4, 1, 2, 4, 8];
/// `(speed, limit)` swings, offsets `0x18..=0x27`.
const STANDARD_SWINGS: [(u16, u8); 8] = [
    (2, 0x10),
    (2, 0x18),
    (2, 0x20),
    (2, 0x30),
    (4, 0x20),
    (8, 0x08),
    (8, 0x40),
    (4, 0x40),
];

#[derive(Clone, Copy, Debug)]
struct Channel {
    spec: ChannelSpec,
    value: u16,
    rate: u16,
    descending: bool,
}

impl Channel {
    fn new(spec: ChannelSpec) -> Self {
        let mut channel = Self { spec, value: 0, rate: 0, descending: false };
        channel.restore();
        channel
    }

    fn restore(&mut self) {
        self.value = match self.spec.width {
            ChannelWidth::Byte => self.spec.initial & 0xFF,
            ChannelWidth::Word => self.spec.initial,
        };
        self.rate = 0;
        self.descending = false;
    }

    fn step(&mut self) {
        match self.spec.kind {
            ChannelKind::Phase { increment } => {
                self.value = match self.spec.width {
                    ChannelWidth::Byte => (self.value.wrapping_add(increment)) & 0xFF,
                    ChannelWidth::Word => self.value.wrapping_add(increment),
                };
            }
            ChannelKind::Swing { speed, limit } => {
                if self.descending {
                    self.rate = self.rate.wrapping_sub(speed);
                    self.value = self.value.wrapping_add(self.rate);
                    if self.high_byte() < limit {
                        self.descending = false;
                    }
                } else {
                    self.rate = self.rate.wrapping_add(speed);
                    self.value = self.value.wrapping_add(self.rate);
                    if self.high_byte() >= limit {
                        self.descending = true;
                    }
                }
            }
        }
    }

    fn high_byte(&self) -> u8 {
        (self.value >> 8) as u8
    }

    fn byte(&self, index: usize) -> u8 {
        match (self.spec.width, index) {
            (ChannelWidth::Byte, _) => self.value as u8,
            (ChannelWidth::Word, 0) => self.high_byte(),
            (ChannelWidth::Word, _) => self.value as u8,
        }
    }
}

/// Level-wide oscillation clock.
///
/// Lifecycle: [`init`](Self::init) at level load, [`advance`](Self::advance)
/// once per tick, [`reset`](Self::reset) at teardown. Only the oscillation
/// system mutates it; objects receive it read-only.
#[derive(Resource, Debug, Clone)]
pub struct OscillationTable {
    channels: Vec<Channel>,
    /// `(channel, byte within channel)` for every byte of the image.
    layout: Vec<(usize, usize)>,
    last_tick: Option<u64>,
}

impl Default for OscillationTable {
    fn default() -> Self {
        Self::standard()
    }
}

impl OscillationTable {
    pub fn with_channels(specs: &[ChannelSpec]) -> Self {
        let channels: Vec<Channel> = specs.iter().copied().map(Channel::new).collect();
        let layout = channels
            .iter()
            .enumerate()
            .flat_map(|(i, c)| (0..c.spec.width.bytes()).map(move |b| (i, b)))
            .collect();
        Self { channels, layout, last_tick: None }
    }

    /// Eight word phases, eight byte phases and eight swings (0x28 bytes).
    pub fn standard() -> Self {
        let words = STANDARD_WORD_PHASES.iter().map(|&inc| ChannelSpec::phase_word(inc, 0));
        let bytes = STANDARD_BYTE_PHASES.iter().map(|&inc| ChannelSpec::phase_byte(inc, 0));
        let swings = STANDARD_SWINGS.iter().map(|&(speed, limit)| ChannelSpec::swing(speed, limit));
        let specs: Vec<ChannelSpec> = words.chain(bytes).chain(swings).collect();
        Self::with_channels(&specs)
    }

    /// Restore every channel to its declared initial value (level load).
    pub fn init(&mut self) {
        self.restore_all();
        info!("Oscillation table initialised: {} channels, {} bytes", self.channels.len(), self.len());
    }

    /// Forget tick bookkeeping and restore initial values (level teardown).
    pub fn reset(&mut self) {
        self.restore_all();
        debug!("Oscillation table reset");
    }

    fn restore_all(&mut self) {
        self.channels.iter_mut().for_each(Channel::restore);
        self.last_tick = None;
    }

    /// Advance every channel once for `tick`. Returns `false` (and changes
    /// nothing) if this tick was already applied.
    pub fn advance(&mut self, tick: u64) -> bool {
        if self.last_tick == Some(tick) {
            warn!("Oscillation table advanced twice for tick {}; ignoring", tick);
            return false;
        }
        self.channels.iter_mut().for_each(Channel::step);
        self.last_tick = Some(tick);
        true
    }

    pub fn last_tick(&self) -> Option<u64> {
        self.last_tick
    }

    /// Size of the byte image.
    pub fn len(&self) -> usize {
        self.layout.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layout.is_empty()
    }

    /// Byte at `offset`; offsets past the end read the last byte.
    pub fn read_byte(&self, offset: usize) -> u8 {
        let Some(last) = self.layout.len().checked_sub(1) else {
            return 0;
        };
        let (channel, index) = self.layout[offset.min(last)];
        self.channels[channel].byte(index)
    }

    /// Big-endian word starting at `offset`, each byte clamped like [`read_byte`](Self::read_byte).
    pub fn read_word(&self, offset: usize) -> u16 {
        (u16::from(self.read_byte(offset)) << 8) | u16::from(self.read_byte(offset.saturating_add(1)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn standard_layout_packs_words_then_bytes_then_swings() {
        let table = OscillationTable::standard();
        assert_eq!(table.len(), 8 * 2 + 8 + 8 * 2);
        assert_eq!(table.read_word(0x18), 0x0080);
    }

    #[test]
    fn word_phase_wraps_at_two_to_the_sixteen() {
        let mut table = OscillationTable::with_channels(&[ChannelSpec::phase_word(0x4000, 0xC000)]);
        table.advance(1);
        assert_eq!(table.read_word(0), 0x0000);
        table.advance(2);
        assert_eq!(table.read_word(0), 0x4000);
        assert_eq!(table.read_byte(0), 0x40);
        assert_eq!(table.read_byte(1), 0x00);
    }

    #[test]
    fn byte_phase_wraps_at_two_to_the_eight() {
        let mut table = OscillationTable::with_channels(&[ChannelSpec::phase_byte(0x90, 0x80)]);
        table.advance(1);
        assert_eq!(table.read_byte(0), 0x10);
    }

    #[test]
    fn advance_is_applied_once_per_tick() {
        let mut table = OscillationTable::standard();
        assert!(table.advance(7));
        let snapshot = table.read_word(0x08);
        assert!(!table.advance(7));
        assert_eq!(table.read_word(0x08), snapshot);
        assert!(table.advance(8));
        assert_ne!(table.read_word(0x08), snapshot);
    }

    #[test]
    fn offsets_past_the_end_clamp_to_the_last_byte() {
        let table = OscillationTable::with_channels(&[ChannelSpec::phase_word(1, 0x1234)]);
        assert_eq!(table.read_byte(1), 0x34);
        assert_eq!(table.read_byte(500), 0x34);
        assert_eq!(table.read_word(1), 0x3434);

        let empty = OscillationTable::with_channels(&[]);
        assert_eq!(empty.read_word(3), 0);
    }

    #[test]
    fn swing_reverses_around_its_limit() {
        let mut table = OscillationTable::with_channels(&[ChannelSpec::swing(2, 0x10)]);
        let mut min = u8::MAX;
        let mut max = u8::MIN;
        let mut reversals = 0;
        let mut previous = table.read_byte(0);
        let mut rising = true;
        for tick in 1..=2000u64 {
            table.advance(tick);
            let current = table.read_byte(0);
            min = min.min(current);
            max = max.max(current);
            if rising && current < previous {
                rising = false;
                reversals += 1;
            } else if !rising && current > previous {
                rising = true;
                reversals += 1;
            }
            previous = current;
        }
        assert!(max <= 0x20 && max >= 0x10, "max {max:#x}");
        assert!(min < 0x10, "min {min:#x}");
        assert!(reversals >= 4);
    }

    #[test]
    fn init_and_reset_restore_initial_values() {
        let mut table = OscillationTable::standard();
        for tick in 1..=37 {
            table.advance(tick);
        }
        assert_ne!(table.read_word(0x02), 0);
        table.reset();
        assert_eq!(table.read_word(0x02), 0);
        assert_eq!(table.last_tick(), None);
        assert!(table.advance(1));

        table.init();
        assert_eq!(table.read_word(0x02), 0);
    }
}
