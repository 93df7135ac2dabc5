//! Reversible share-code scheme for spawn seeds.
//! Code format: CV-<WORD><NN>, e.g., CV-CAMEL07, CV-OASIS42

fn fnv1a64(bytes: &[u8]) -> u64 {
    const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
    const FNV_PRIME: u64 = 0x0100_0000_01b3;
    let mut hash = FNV_OFFSET;
    for b in bytes {
        hash = (hash ^ u64::from(*b)).wrapping_mul(FNV_PRIME);
    }
    hash
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

pub const CODE_PREFIX: &str = "CV";

// Word list for share codes
pub const WORD_LIST: [&str; 64] = [
    "CAMEL", "OASIS", "DUNE", "SPICE", "SILK", "AMBER", "LANTERN", "WAGON", "SADDLE", "COMPASS",
    "NOMAD", "BAZAAR", "CINDER", "MIRAGE", "CANYON", "MESA", "GOLEM", "RELIC", "BANKER", "HERBAL",
    "ENVOY", "BANDIT", "TOLL", "CART", "HAVEN", "WAYSTN", "GUARD", "SCHOLAR", "MERCHNT", "COOK",
    "COIN", "GOLD", "RATION", "BREAD", "SALT", "HONEY", "FIG", "DATE", "OLIVE", "SAFFRON", "CEDAR",
    "WELL", "ROAD", "MILE", "BANNER", "TORCH", "EMBER", "STAR", "MOON", "SUNSET", "DAWN", "WIND",
    "SAND", "STONE", "BRIDGE", "FERRY", "RIVER", "HARBOR", "MARKET", "LEDGER", "RUNE", "MAP",
    "SCROLL", "JOURNEY",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x01FF, ((packed >> 9) & 0x7F) as u8)
}

fn compose_seed(word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    // Domain-separated FNV input
    let mut buf = [0u8; 9];
    buf[..6].copy_from_slice(b"CARAVN");
    buf[6] = (packed & 0xFF) as u8;
    buf[7] = (packed >> 8) as u8;
    buf[8] = 0xA5;
    let h = fnv1a64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

#[must_use]
pub fn encode_friendly(seed: u64) -> String {
    let packed = (seed & 0xFFFF) as u16;
    let (wi, mut nn) = unpack(packed);
    let word = WORD_LIST
        .get(usize::from(wi) % WORD_LIST.len())
        .copied()
        .unwrap_or("CAMEL");
    if nn > 99 {
        nn %= 100;
    }
    format!("{CODE_PREFIX}-{word}{nn:02}")
}

#[must_use]
pub fn decode_to_seed(code: &str) -> Option<u64> {
    let s = code.trim();
    let (prefix, rest) = s.split_once('-')?;
    if !prefix.eq_ignore_ascii_case(CODE_PREFIX) || rest.len() < 3 {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some(compose_seed(wi, nn))
}

#[must_use]
pub fn generate_code_from_entropy(entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = ((entropy >> 17) % 100) as u8;
    encode_friendly(compose_seed(wi, nn))
}

/// Accept either a share code or a raw decimal seed.
#[must_use]
pub fn parse_seed_input(input: &str) -> Option<u64> {
    let trimmed = input.trim();
    trimmed
        .parse::<u64>()
        .ok()
        .or_else(|| decode_to_seed(trimmed))
}
