use anyhow::{Context, Result, bail};
use caravan_game::decode_to_seed;
use std::collections::HashMap;

/// Seed metadata carried through a sweep.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedInfo {
    pub seed: u64,
    pub code: Option<String>,
}

impl SeedInfo {
    #[must_use]
    pub fn from_numeric(seed: u64) -> Self {
        Self { seed, code: None }
    }

    #[must_use]
    pub fn from_share_code(seed: u64, code: String) -> Self {
        Self {
            seed,
            code: Some(code),
        }
    }

    /// Share code to print next to this seed; numeric seeds get their canonical code.
    #[must_use]
    pub fn share_code(&self) -> String {
        self.code
            .clone()
            .unwrap_or_else(|| caravan_game::encode_friendly(self.seed))
    }
}

/// Resolve a list of CLI seed arguments into canonical seed metadata.
///
/// Supports literal integers, share codes, and the special keywords
/// `all` / `available` which expand to every share-code seed.
pub fn resolve_seed_inputs(tokens: &[String]) -> Result<Vec<SeedInfo>> {
    let mut pending: Vec<SeedInfo> = Vec::new();
    let mut request_all = false;

    for token in tokens.iter().map(|token| token.trim()) {
        if token.is_empty() {
            continue;
        }

        if token.eq_ignore_ascii_case("all") || token.eq_ignore_ascii_case("available") {
            request_all = true;
            continue;
        }

        if let Ok(value) = token.parse::<i64>() {
            pending.push(SeedInfo::from_numeric(value.unsigned_abs()));
            continue;
        }

        if let Ok(value) = token.parse::<u64>() {
            pending.push(SeedInfo::from_numeric(value));
            continue;
        }

        if let Some(seed) = decode_to_seed(token) {
            pending.push(SeedInfo::from_share_code(seed, token.to_uppercase()));
            continue;
        }

        bail!("Unrecognized seed token: {token}");
    }

    if request_all {
        pending.extend(generate_all_share_code_seeds()?);
    }

    let mut deduped: Vec<SeedInfo> = Vec::new();
    let mut index: HashMap<u64, usize> = HashMap::new();

    for info in pending {
        if let Some(&existing) = index.get(&info.seed) {
            if let Some(entry) = deduped.get_mut(existing)
                && entry.code.is_none()
                && info.code.is_some()
            {
                *entry = info;
            }
        } else {
            index.insert(info.seed, deduped.len());
            deduped.push(info);
        }
    }

    if deduped.is_empty() {
        deduped.push(SeedInfo::from_numeric(1337));
    }

    Ok(deduped)
}

fn generate_all_share_code_seeds() -> Result<Vec<SeedInfo>> {
    use caravan_game::seed::{CODE_PREFIX, WORD_LIST};

    let mut seeds = Vec::with_capacity(WORD_LIST.len() * 100);
    for word in WORD_LIST {
        for suffix in 0..100 {
            let code = format!("{CODE_PREFIX}-{word}{suffix:02}");
            let seed = decode_to_seed(&code)
                .with_context(|| format!("failed to parse share code: {code}"))?;
            seeds.push(SeedInfo::from_share_code(seed, code));
        }
    }
    Ok(seeds)
}
