/// The only error the access-control layer reports.
///
/// The precise cause of a denial stays inside the trust boundary: it is
/// logged, never returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum AclError {
    /// The request does not satisfy the resource's policy, or could not be
    /// evaluated at all.
    #[error("Access denied")]
    AccessDenied,
}
