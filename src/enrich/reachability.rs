use async_trait::async_trait;
use hickory_resolver::TokioAsyncResolver;
use tracing::debug;

use crate::models::{EmailKind, EmailStatus, Result};

/// Mail-exchange lookup collaborator. The DNS implementation is the
/// default; tests inject stubs.
#[async_trait]
pub trait MxLookup: Send + Sync {
    /// True when the domain publishes at least one MX record. A
    /// lookup failure is reported as false: the signal is absent
    /// either way.
    async fn has_mx(&self, domain: &str) -> bool;
}

pub struct DnsMxLookup {
    resolver: TokioAsyncResolver,
}

impl DnsMxLookup {
    pub fn new() -> Result<Self> {
        let resolver = TokioAsyncResolver::tokio_from_system_conf()?;
        Ok(Self { resolver })
    }
}

#[async_trait]
impl MxLookup for DnsMxLookup {
    async fn has_mx(&self, domain: &str) -> bool {
        match self.resolver.mx_lookup(domain).await {
            Ok(lookup) => lookup.iter().next().is_some(),
            Err(e) => {
                debug!("📪 MX lookup failed for {}: {}", domain, e);
                false
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Reachability {
    pub has_mail_exchange: bool,
}

pub struct ReachabilityValidator<'a> {
    mx: &'a dyn MxLookup,
}

impl<'a> ReachabilityValidator<'a> {
    pub fn new(mx: &'a dyn MxLookup) -> Self {
        Self { mx }
    }

    pub async fn validate(&self, domain: &str) -> Reachability {
        Reachability {
            has_mail_exchange: self.mx.has_mx(domain).await,
        }
    }
}

/// Status mapping: an MX record makes the best email Valid, its
/// absence makes it Risky. Unknown is reserved for leads with no
/// email at all. This never escalates to Invalid: plenty of domains
/// relay mail without MX records, and bounce evidence is the only
/// thing that would justify Invalid.
pub fn status_for(reachability: Option<Reachability>) -> EmailStatus {
    match reachability {
        None => EmailStatus::Unknown,
        Some(r) if r.has_mail_exchange => EmailStatus::Valid,
        Some(_) => EmailStatus::Risky,
    }
}

/// Per-candidate confidence: deliverability signal dominates, the
/// address style and an explicit mailto link add the rest.
pub fn email_confidence(has_mx: bool, kind: EmailKind, from_mailto: bool) -> u8 {
    let mut confidence: u32 = if has_mx { 60 } else { 20 };
    confidence += match kind {
        EmailKind::Generic => 20,
        EmailKind::Personal => 30,
    };
    if from_mailto {
        confidence += 10;
    }
    confidence.min(100) as u8
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn no_email_at_all_is_unknown_not_risky() {
        assert_eq!(status_for(None), EmailStatus::Unknown);
    }

    #[test]
    fn mx_presence_maps_to_valid_and_absence_to_risky() {
        assert_eq!(
            status_for(Some(Reachability {
                has_mail_exchange: true
            })),
            EmailStatus::Valid
        );
        assert_eq!(
            status_for(Some(Reachability {
                has_mail_exchange: false
            })),
            EmailStatus::Risky
        );
    }

    #[test]
    fn confidence_ranks_mailto_personal_verified_highest() {
        let top = email_confidence(true, EmailKind::Personal, true);
        assert_eq!(top, 100);
        assert!(top > email_confidence(true, EmailKind::Generic, false));
        assert!(
            email_confidence(false, EmailKind::Personal, false)
                < email_confidence(true, EmailKind::Personal, false)
        );
    }
}
