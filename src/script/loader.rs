use crate::config::settings::{Settings, SettingsOverrides};
use crate::foundation::error::{SlidereelError, SlidereelResult};
use crate::script::model::{Script, SlideEntry};

/// Turns script text into settings and an ordered slide list.
pub trait ScriptLoader: Send + Sync {
    /// Parse `source`. Implementations must assign `SlideEntry::index` from list position.
    fn parse(&self, source: &str) -> SlidereelResult<Script>;
}

/// YAML script loader (JSON scripts parse too).
#[derive(Clone, Copy, Debug, Default)]
pub struct YamlScriptLoader;

#[derive(serde::Deserialize)]
struct RawScript {
    #[serde(default)]
    global_settings: Option<SettingsOverrides>,
    #[serde(default)]
    slides: Vec<RawSlide>,
}

#[derive(serde::Deserialize)]
struct RawSlide {
    page: u32,
    text: String,
    #[serde(default)]
    voice: Option<String>,
    #[serde(default)]
    rate: Option<String>,
    #[serde(default)]
    note: Option<String>,
}

impl ScriptLoader for YamlScriptLoader {
    fn parse(&self, source: &str) -> SlidereelResult<Script> {
        // An empty document deserializes as unit, not as a map.
        if source.trim().is_empty() {
            return Ok(Script {
                settings: Settings::default(),
                slides: Vec::new(),
            });
        }
        let raw: RawScript = serde_yaml::from_str(source)
            .map_err(|e| SlidereelError::serde(format!("invalid script: {e}")))?;

        let settings = match &raw.global_settings {
            Some(o) => Settings::default().overlay(o),
            None => Settings::default(),
        };
        let slides = raw
            .slides
            .into_iter()
            .enumerate()
            .map(|(index, s)| SlideEntry {
                index,
                page: s.page,
                text: s.text,
                voice: s.voice,
                rate: s.rate,
                note: s.note,
            })
            .collect();

        Ok(Script { settings, slides })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/loader.rs"]
mod tests;
