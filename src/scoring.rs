//! Point-additive lead quality model. Absence of an attribute simply
//! withholds its bonus; nothing subtracts below the clamp floor.

/// The attribute set the scorer looks at. Built by the harvester once
/// all enrichment steps have resolved.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScoreInput {
    /// Best email's domain has a mail-exchange record.
    pub verified_email: bool,
    /// At least one email regardless of verification.
    pub any_email: bool,
    pub personal_email: bool,
    pub website: bool,
    pub phone: bool,
    pub registry_match: bool,
    pub officer_name: bool,
    pub social_presence: bool,
}

const BASE: u32 = 20;
const BONUS_VERIFIED_EMAIL: u32 = 25;
const BONUS_ANY_EMAIL: u32 = 10;
const BONUS_PERSONAL_EMAIL: u32 = 10;
const BONUS_WEBSITE: u32 = 15;
const BONUS_PHONE: u32 = 10;
const BONUS_REGISTRY: u32 = 15;
const BONUS_OFFICER: u32 = 5;
const BONUS_SOCIAL: u32 = 5;

/// Pure function: identical input always yields the identical score,
/// clamped to [0, 100].
pub fn quality_score(input: &ScoreInput) -> u8 {
    let mut score = BASE;
    if input.verified_email {
        score += BONUS_VERIFIED_EMAIL;
    } else if input.any_email {
        score += BONUS_ANY_EMAIL;
    }
    if input.any_email && input.personal_email {
        score += BONUS_PERSONAL_EMAIL;
    }
    if input.website {
        score += BONUS_WEBSITE;
    }
    if input.phone {
        score += BONUS_PHONE;
    }
    if input.registry_match {
        score += BONUS_REGISTRY;
    }
    if input.officer_name {
        score += BONUS_OFFICER;
    }
    if input.social_presence {
        score += BONUS_SOCIAL;
    }
    score.min(100) as u8
}
