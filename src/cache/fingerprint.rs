use xxhash_rust::xxh3::Xxh3;

use crate::config::settings::Settings;
use crate::foundation::core::DocumentIdentity;
use crate::script::model::SlideEntry;

const XXH3_SEED: u64 = 0x5d1d_e4ee_1c0f_fee5;

/// Bumped whenever the clip layout changes so old cache entries stop matching.
const FINGERPRINT_VERSION: u32 = 1;

/// Content key for one slide's rendered clip.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(u128);

impl Fingerprint {
    /// Length of the hex form.
    pub const HEX_LEN: usize = 32;

    /// Lowercase, zero-padded hex form embedded in cache file names.
    pub fn to_hex(self) -> String {
        format!("{:032x}", self.0)
    }

    /// Parse the form produced by [`Fingerprint::to_hex`].
    pub fn from_hex(s: &str) -> Option<Self> {
        if s.len() != Self::HEX_LEN || !s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
        {
            return None;
        }
        u128::from_str_radix(s, 16).ok().map(Self)
    }
}

impl std::fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:032x}", self.0)
    }
}

/// Compute the cache key for `slide` rendered with `settings` from document `doc`.
///
/// Voice and rate are hashed after resolving per-slide overrides, so an explicit override equal
/// to the global value yields the same key as no override. `index` and `note` are not hashed.
pub fn fingerprint(slide: &SlideEntry, settings: &Settings, doc: DocumentIdentity) -> Fingerprint {
    let mut h = StableHasher::new();
    h.write_u32(FINGERPRINT_VERSION);
    h.write_u32(slide.page);
    h.write_str(&slide.text);
    h.write_str(slide.effective_voice(settings));
    h.write_str(slide.effective_rate(settings));
    h.write_f64(settings.inline_pause);
    h.write_f64(settings.slide_pause);
    h.write_i128(doc.modified_ns);
    h.write_u64(doc.size);
    h.write_u32(settings.image_dpi);
    h.write_u32(settings.video_fps);
    h.write_str(&settings.video_codec);
    h.write_str(&settings.audio_codec);
    h.finish()
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u32(&mut self, v: u32) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_i128(&mut self, v: i128) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn write_f64(&mut self, v: f64) {
        self.write_u64(v.to_bits());
    }

    // Length prefix keeps adjacent strings from running into each other.
    fn write_str(&mut self, s: &str) {
        self.write_u64(s.len() as u64);
        self.write_bytes(s.as_bytes());
    }

    fn finish(self) -> Fingerprint {
        Fingerprint(self.inner.digest128())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/fingerprint.rs"]
mod tests;
