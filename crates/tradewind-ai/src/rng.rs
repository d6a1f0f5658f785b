//! Per-player deterministic random numbers.
//!
//! Each autonomous player owns one [`AiRng`], a xoshiro256++ generator.
//! Its full state prints as 64 hex digits, so a saved game restores the
//! exact sequence of decisions the player would have made. When no
//! state was saved, the seed is derived from the game's master seed and
//! the player id, so the same game setup always yields the same AI.

use std::fmt;
use std::str::FromStr;

use rand::RngCore;
use tradewind_protocol::PlayerId;

/// xoshiro256++ with splitmix64 seeding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AiRng {
    s: [u64; 4],
}

impl AiRng {
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Generator for `player` in a game with `master_seed`.
    pub fn for_player(master_seed: u64, player: &PlayerId) -> Self {
        Self::new(seed_for(master_seed, player))
    }

    fn step(&mut self) -> u64 {
        let result = self.s[0]
            .wrapping_add(self.s[3])
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }
}

impl RngCore for AiRng {
    fn next_u32(&mut self) -> u32 {
        (self.step() >> 32) as u32
    }

    fn next_u64(&mut self) -> u64 {
        self.step()
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.step().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

/// Saved form: the four state words as 16 hex digits each.
impl fmt::Display for AiRng {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for word in self.s {
            write!(f, "{word:016x}")?;
        }
        Ok(())
    }
}

/// A saved random state that cannot be restored.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RandomStateError {
    #[error("expected 64 hex digits, got {0} characters")]
    Length(usize),
    #[error("not a hex number: {0}")]
    Digits(String),
    #[error("the all-zero state is not a valid generator state")]
    AllZero,
}

impl FromStr for AiRng {
    type Err = RandomStateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() != 64 || !s.is_ascii() {
            return Err(RandomStateError::Length(s.chars().count()));
        }
        let mut words = [0u64; 4];
        for (i, word) in words.iter_mut().enumerate() {
            let digits = &s[i * 16..(i + 1) * 16];
            *word = u64::from_str_radix(digits, 16)
                .map_err(|_| RandomStateError::Digits(digits.to_string()))?;
        }
        if words == [0; 4] {
            return Err(RandomStateError::AllZero);
        }
        Ok(Self { s: words })
    }
}

/// Derives the seed for one player: FNV-1a over `"Seed for <id>"`,
/// mixed with the master seed.
pub fn seed_for(master_seed: u64, player: &PlayerId) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

    let label = format!("Seed for {player}");
    let hash = label
        .bytes()
        .fold(FNV_OFFSET, |h, b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME));
    let mut mixed = master_seed ^ hash;
    splitmix64(&mut mixed)
}

fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
