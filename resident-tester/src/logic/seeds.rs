use anyhow::{Result, bail};
use resident_game::{SeedPreset, daily_seed, generate_seed_name, random_seed, seed_from_url};
use std::collections::HashSet;

/// Where a seed token came from, for report labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedSource {
    Numeric,
    Preset(SeedPreset),
    Daily,
    Random,
    Url,
}

#[derive(Debug, Clone)]
pub struct SeedInfo {
    pub seed: i64,
    pub name: String,
    pub source: SeedSource,
}

impl SeedInfo {
    #[must_use]
    pub fn new(seed: i64, source: SeedSource) -> Self {
        Self {
            seed,
            name: generate_seed_name(seed),
            source,
        }
    }

    #[must_use]
    pub fn label(&self) -> String {
        match self.source {
            SeedSource::Preset(preset) => {
                format!("{} {} ({})", preset.label(), self.seed, self.name)
            }
            SeedSource::Daily => format!("daily {} ({})", self.seed, self.name),
            _ => format!("{} ({})", self.seed, self.name),
        }
    }
}

/// Resolve CLI seed tokens into seeds.
///
/// Accepts integers, preset names, `daily`, `random`, `presets` (every
/// preset), and URLs carrying a `seed` query parameter. Duplicates keep the
/// first occurrence.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();

    for token in tokens {
        if token.is_empty() {
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::new(value, SeedSource::Numeric));
            continue;
        }

        if let Some(preset) = SeedPreset::from_name(token) {
            pending.push(SeedInfo::new(preset.seed(), SeedSource::Preset(preset)));
            continue;
        }

        if token.eq_ignore_ascii_case("presets") {
            pending.extend(
                SeedPreset::ALL
                    .into_iter()
                    .map(|preset| SeedInfo::new(preset.seed(), SeedSource::Preset(preset))),
            );
            continue;
        }

        if token.eq_ignore_ascii_case("daily") {
            pending.push(SeedInfo::new(daily_seed(), SeedSource::Daily));
            continue;
        }

        if token.eq_ignore_ascii_case("random") {
            pending.push(SeedInfo::new(random_seed(), SeedSource::Random));
            continue;
        }

        if let Some(seed) = seed_from_url(token) {
            pending.push(SeedInfo::new(seed, SeedSource::Url));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    let mut seen = HashSet::new();
    pending.retain(|info| seen.insert(info.seed));

    if pending.is_empty() {
        let preset = SeedPreset::Standard;
        pending.push(SeedInfo::new(preset.seed(), SeedSource::Preset(preset)));
    }

    Ok(pending)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(raw: &[&str]) -> Vec<String> {
        raw.iter().map(ToString::to_string).collect()
    }

    #[test]
    fn resolves_numbers_presets_and_urls() {
        let seeds = resolve_seed_inputs(&tokens(&[
            "42",
            "-7",
            "tutorial",
            "https://play.example/?seed=900&x=1",
        ]))
        .unwrap();
        assert_eq!(
            seeds.iter().map(|s| s.seed).collect::<Vec<_>>(),
            vec![42, -7, 23456, 900]
        );
        assert_eq!(seeds[2].source, SeedSource::Preset(SeedPreset::Tutorial));
        assert!(seeds[2].label().starts_with("TUTORIAL 23456"));
        assert_eq!(seeds[3].source, SeedSource::Url);
    }

    #[test]
    fn duplicates_collapse_and_empty_defaults_to_standard() {
        let seeds = resolve_seed_inputs(&tokens(&["12345", "standard", "presets"])).unwrap();
        assert_eq!(seeds.len(), 3);
        assert_eq!(seeds[0].source, SeedSource::Numeric);

        let fallback = resolve_seed_inputs(&[]).unwrap();
        assert_eq!(fallback.len(), 1);
        assert_eq!(fallback[0].seed, 12345);
    }

    #[test]
    fn unknown_tokens_fail() {
        let err = resolve_seed_inputs(&tokens(&["banana"])).unwrap_err();
        assert!(err.to_string().contains("banana"));
    }

    #[test]
    fn daily_and_random_resolve() {
        let seeds = resolve_seed_inputs(&tokens(&["daily", "random"])).unwrap();
        assert_eq!(seeds[0].source, SeedSource::Daily);
        assert!(seeds.iter().all(|s| !s.name.is_empty()));
    }
}
