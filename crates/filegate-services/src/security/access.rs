use async_trait::async_trait;
use filegate_core::AccessAction;

/// Decides whether an identified caller may act on a file.
///
/// The orchestrator rejects anonymous callers before consulting the policy,
/// so implementations only see non-blank user ids.
#[async_trait]
pub trait AccessPolicy: Send + Sync {
    async fn is_allowed(&self, file_id: &str, user_id: &str, action: AccessAction) -> bool;
}

/// Grants every action to any authenticated caller.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuthenticatedUserPolicy;

#[async_trait]
impl AccessPolicy for AuthenticatedUserPolicy {
    async fn is_allowed(&self, _file_id: &str, user_id: &str, _action: AccessAction) -> bool {
        !user_id.trim().is_empty()
    }
}
